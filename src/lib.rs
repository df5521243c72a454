#![doc(html_logo_url = "https://raw.githubusercontent.com/georust/meta/master/logo/logo.png")]
#![cfg_attr(docrs, feature(doc_cfg))]

//! RTCM: decoding and encoding of RTCM3 (and legacy RTCM2)
//! GNSS correction streams.
//!
//! The [Session] is the heart of this library. It is fed one byte at a time,
//! synchronizes on frames, verifies their integrity and decodes them into
//! long lived records (observations, ephemerides, SSR corrections and
//! station metadata). The same [Session] can then be serialized back into
//! RTCM frames.
//! ```
//! use rtcm::prelude::{Session, Status};
//!
//! let mut session = Session::default();
//!
//! // header only frame (filler)
//! for byte in [0xD3, 0x00, 0x00, 0x47, 0xEA, 0x4B] {
//!     match session.input_rtcm3(byte) {
//!         Status::Incomplete => {},
//!         Status::Decoded { msg_type, .. } => assert_eq!(msg_type, 0),
//!         status => panic!("unexpected status: {:?}", status),
//!     }
//! }
//! ```
use thiserror::Error;

#[macro_use]
extern crate num_derive;

#[macro_use]
extern crate lazy_static;

mod bits;
mod config;
mod constants;
mod decoder;
mod encoder;
mod navigation;
mod observation;
mod rtcm2;
mod rtcm3;
mod sat;
mod session;
mod ssr;
mod station;
mod time;

pub mod checksum;
pub mod utils;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::checksum::{Crc24q, Rtcm2Parity};
    pub use crate::config::{Config, MessageFamily};
    pub use crate::decoder::{Decoder, Protocol};
    pub use crate::encoder::Encoder;
    pub use crate::navigation::{Ephemeris, GlonassEphemeris, Navigation};
    pub use crate::observation::{
        LliFlags, LockState, LockTracker, ObsCode, Observation, ObservationEpoch,
        SignalObservation,
    };
    pub use crate::rtcm2::DgpsCorrection;
    pub use crate::rtcm3::{MessageID, MsmKind, SsrKind, State};
    pub use crate::sat::Sat;
    pub use crate::session::{Message, Session, Statistics, Status};
    pub use crate::ssr::{PhaseBias, SsrCategory, SsrCorrection, SsrEpoch};
    pub use crate::station::Station;
    pub use crate::utils::Utils;
    pub use crate::Error;
    // re-export
    pub use gnss_rs::prelude::{Constellation, SV};
    pub use hifitime::{Duration, Epoch, TimeScale};
}

pub use session::Session;

#[derive(Error, Debug)]
pub enum Error {
    #[error("i/o error")]
    IoError(#[from] std::io::Error),
    #[error("buffer capacity ({0} bytes) cannot hold a complete frame")]
    BufferTooSmall(usize),
    #[error("crc24q checksum mismatch")]
    BadCrc,
    #[error("rtcm2 word parity error")]
    BadParity,
    #[error("declared payload length ({0} bytes) exceeds frame capacity")]
    FrameTooLong(usize),
    #[error("message is truncated")]
    NotEnoughBits,
    #[error("inconsistent msm satellite/signal/cell masks")]
    MsmMaskInconsistency,
    #[error("invalid satellite")]
    InvalidSatellite,
    #[error("invalid observation code")]
    InvalidObsCode,
    #[error("station id {received} does not match {expected}")]
    StationIdMismatch { expected: u16, received: u16 },
    #[error("rtcm2 modified z-count out of range")]
    InvalidZCount,
    #[error("no reference time to resolve message epoch")]
    NoReferenceTime,
    #[error("no data available to encode message {0}")]
    NoData(u16),
    #[error("non supported message {0}")]
    NonSupportedMessage(u16),
    #[error("non supported message subtype {0}")]
    NonSupportedSubtype(u16),
    #[error("invalid option \"{0}\"")]
    InvalidOption(String),
}

impl Error {
    /// Negative status code, as returned by [Status::code](crate::prelude::Status::code).
    ///   - -1: integrity failure
    ///   - -2: frame header rejection
    ///   - -3: structural decoding error
    pub fn code(&self) -> i32 {
        match self {
            Self::BadCrc | Self::BadParity => -1,
            Self::FrameTooLong(_) => -2,
            _ => -3,
        }
    }
    /// True when this [Error] results from a frame integrity check
    pub fn is_integrity(&self) -> bool {
        matches!(self, Self::BadCrc | Self::BadParity)
    }
}
