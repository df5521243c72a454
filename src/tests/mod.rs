//! rtcm lib test modules
