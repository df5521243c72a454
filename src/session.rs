//! Stream session: frame assembly, dispatch and long lived records
use std::collections::HashMap;

use gnss_rs::prelude::Constellation;
use hifitime::{Epoch, TimeScale};
use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::Config,
    constants::Constants,
    navigation::Navigation,
    observation::{LockTracker, ObsCode, ObservationEpoch},
    rtcm2::{self, DgpsCorrection},
    rtcm3,
    sat::Sat,
    ssr::SsrCorrection,
    station::Station,
    Error,
};

/// Kind of record that a decoded frame made available
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Message {
    /// Empty RTCM3 frame
    Filler,
    /// Observations were stored in [Session::obs].
    /// `complete` is false while more messages of the same epoch are expected.
    Observation { complete: bool },
    /// Ephemeris of this satellite was received.
    /// `updated` is false when it duplicated the stored record.
    Ephemeris { sat: Sat, updated: bool },
    /// [Session::station] was updated
    Station,
    /// [Session::ssr] was updated
    Ssr,
    /// [Session::text] was updated
    Text,
    /// RTCM2 differential corrections were stored in [Session::dgps]
    Dgps,
    /// RTCM2 GPS time of week was received
    Time,
}

/// [Status] of a [Session] after each input byte
#[derive(Debug)]
pub enum Status {
    /// More bytes are needed
    Incomplete,
    /// A frame was verified and decoded
    Decoded { msg_type: u16, message: Message },
    /// A frame was verified but is not interpreted
    Unhandled { msg_type: u16, len: usize },
    /// A frame was rejected
    Rejected(Error),
}

impl Status {
    /// Numerical status code:
    ///   - 0: incomplete or unhandled frame
    ///   - >0: decoded message type
    ///   - <0: rejected frame, see [Error::code]
    pub fn code(&self) -> i32 {
        match self {
            Self::Incomplete | Self::Unhandled { .. } => 0,
            Self::Decoded { msg_type, .. } => *msg_type as i32,
            Self::Rejected(e) => e.code(),
        }
    }

    /// True once a frame was processed, whatever its outcome
    pub fn is_complete(&self) -> bool {
        !matches!(self, Self::Incomplete)
    }
}

/// Decoding statistics
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Statistics {
    /// Number of verified frames, per message type
    pub messages: HashMap<u16, u64>,
    /// Number of frames that failed the integrity check
    pub crc_failures: u64,
    /// Number of frames rejected at header or decoding time
    pub decode_failures: u64,
    /// Number of verified frames that were not interpreted
    pub unhandled: u64,
    /// Last verified message type
    pub last_msg_type: u16,
    /// Last verified payload length [bytes]
    pub last_len: usize,
}

impl Statistics {
    /// Number of verified frames of this message type
    pub fn count(&self, msg_type: u16) -> u64 {
        self.messages.get(&msg_type).copied().unwrap_or(0)
    }

    pub(crate) fn record(&mut self, msg_type: u16, len: usize) {
        *self.messages.entry(msg_type).or_insert(0) += 1;
        self.last_msg_type = msg_type;
        self.last_len = len;
    }
}

/// [Session] decodes one RTCM stream, byte per byte, and holds all
/// records that were gathered. It may also serialize these records.
/// Each stream requires its own [Session].
/// ```
/// use rtcm::prelude::{Session, Status, Message};
///
/// // RTCM 1005: station coordinates
/// let bytes = [
///     0xD3, 0x00, 0x13, 0x3E, 0xD7, 0xD3, 0x02, 0x02, 0x98, 0x0E, 0xDE, 0xEF, 0x34, 0xB4,
///     0xBD, 0x62, 0xAC, 0x09, 0x41, 0x98, 0x6F, 0x33, 0x36, 0x0B, 0x98,
/// ];
///
/// let mut session = Session::default();
/// for byte in bytes {
///     if let Status::Decoded { msg_type, message } = session.input_rtcm3(byte) {
///         assert_eq!(msg_type, 1005);
///         assert_eq!(message, Message::Station);
///     }
/// }
///
/// assert_eq!(session.station.station_id, 2003);
/// assert!((session.station.position[0] - 1114104.5999).abs() < 1.0E-6);
///
/// // serialize it back
/// let frame = session.encode_rtcm3(1005, 0, false).unwrap();
/// assert_eq!(frame, bytes);
/// ```
#[derive(Debug)]
pub struct Session {
    /// Options
    pub config: Config,
    /// Current reference station
    pub station_id: u16,
    /// RTCM2 reference station health
    pub station_health: u8,
    /// RTCM2 sequence number
    pub seqno: u8,
    /// Time of the last decoded message, used to resolve truncated
    /// time fields. May be set prior to decoding.
    pub time: Option<Epoch>,
    /// Time the session was started, if known
    pub time_start: Option<Epoch>,
    /// Latest observation epoch
    pub obs: ObservationEpoch,
    /// True when the last observation message closed its epoch
    pub obs_complete: bool,
    /// Broadcast ephemerides
    pub nav: Navigation,
    /// Reference station description
    pub station: Station,
    /// SSR corrections, indexed by [Sat::index] - 1
    pub ssr: Vec<SsrCorrection>,
    /// RTCM2 differential GPS corrections, indexed by PRN - 1
    pub dgps: Vec<Option<DgpsCorrection>>,
    /// Latest text message
    pub text: String,
    /// Signals of the latest MSM, per constellation
    pub msm_signals: HashMap<Constellation, Vec<ObsCode>>,
    /// Satellite of the latest ephemeris, ephemeris encoding target
    pub eph_sat: Option<Sat>,
    /// Data set of the latest ephemeris (Galileo: 0 I/NAV, 1 F/NAV)
    pub eph_set: usize,
    /// Statistics
    pub stats: Statistics,
    pub(crate) lock: LockTracker,
    /// Legacy carrier phase continuity [cycles], per satellite and frequency
    pub(crate) carrier: Vec<[Option<f64>; Constants::NFREQ]>,
    rtcm3: rtcm3::Assembler,
    rtcm2: rtcm2::Assembler,
}

impl Default for Session {
    fn default() -> Self {
        Self::build(Config::default(), rtcm3::Assembler::default())
    }
}

impl Session {
    fn build(config: Config, rtcm3: rtcm3::Assembler) -> Self {
        Self {
            config,
            station_id: 0,
            station_health: 0,
            seqno: 0,
            time: None,
            time_start: None,
            obs: ObservationEpoch::default(),
            obs_complete: false,
            nav: Navigation::default(),
            station: Station::default(),
            ssr: vec![SsrCorrection::default(); Sat::MAX],
            dgps: vec![None; 32],
            text: String::new(),
            msm_signals: HashMap::new(),
            eph_sat: None,
            eph_set: 0,
            stats: Statistics::default(),
            lock: LockTracker::default(),
            carrier: vec![[None; Constants::NFREQ]; Sat::MAX],
            rtcm3,
            rtcm2: rtcm2::Assembler::default(),
        }
    }

    /// Creates a new [Session] with these options
    pub fn new(config: Config) -> Self {
        Self::build(config, rtcm3::Assembler::default())
    }

    /// Creates a new [Session] with a frame buffer of `capacity` bytes.
    /// The buffer must be able to hold the largest RTCM3 frame.
    pub fn with_capacity(config: Config, capacity: usize) -> Result<Self, Error> {
        let rtcm3 = rtcm3::Assembler::with_capacity(capacity)?;
        Ok(Self::build(config, rtcm3))
    }

    /// Sets the reference time, used to resolve truncated time fields
    pub fn with_time(mut self, t: Epoch) -> Self {
        let t = t.to_time_scale(TimeScale::GPST);
        self.time = Some(t);
        self.time_start = Some(t);
        self
    }

    /// Current RTCM3 assembler [rtcm3::State]
    pub fn state(&self) -> rtcm3::State {
        self.rtcm3.state()
    }

    /// Phase lock continuity tracker
    pub fn lock_tracker(&self) -> &LockTracker {
        &self.lock
    }

    /// Forgets all records, statistics and partial frames.
    /// Options and buffer capacity are preserved.
    pub fn reset(&mut self) {
        let config = self.config.clone();
        let mut rtcm3 = std::mem::take(&mut self.rtcm3);
        rtcm3.reset();
        *self = Self::build(config, rtcm3);
    }

    /// Consumes one RTCM3 byte
    pub fn input_rtcm3(&mut self, byte: u8) -> Status {
        match self.rtcm3.input(byte) {
            None => Status::Incomplete,
            Some(Err(e)) => {
                if e.is_integrity() {
                    self.stats.crc_failures += 1;
                } else {
                    self.stats.decode_failures += 1;
                }
                warn!("rtcm3 frame rejected: {}", e);
                Status::Rejected(e)
            },
            Some(Ok(len)) => {
                let frame = self.rtcm3.take_frame();
                let status = self.decode_rtcm3(&frame, len);
                self.rtcm3.restore_frame(frame);
                status
            },
        }
    }

    /// Consumes one RTCM2 byte (6 of 8 encoding)
    pub fn input_rtcm2(&mut self, byte: u8) -> Status {
        match self.rtcm2.input(byte) {
            None => Status::Incomplete,
            Some(Err(e)) => {
                self.stats.crc_failures += 1;
                Status::Rejected(e)
            },
            Some(Ok(frame)) => self.decode_rtcm2(&frame),
        }
    }

    /// Time of the last decoded message, or system time.
    pub(crate) fn reference_time(&self) -> Result<Epoch, Error> {
        match self.time {
            Some(t) => Ok(t),
            None => Epoch::now()
                .map(|t| t.to_time_scale(TimeScale::GPST))
                .map_err(|_| Error::NoReferenceTime),
        }
    }

    /// Updates the session time with a newly decoded epoch
    pub(crate) fn set_time(&mut self, t: Epoch) {
        self.time = Some(t);
        if self.time_start.is_none() {
            self.time_start = Some(t);
        }
    }

    /// Verifies the station of a newly received message.
    /// Returns Ok(false) when the message is filtered out by options.
    pub(crate) fn check_station(&mut self, station_id: u16) -> Result<bool, Error> {
        if let Some(filter) = self.config.station_filter {
            if filter != station_id {
                return Ok(false);
            }
        }
        if self.station_id == 0 || self.obs_complete {
            self.station_id = station_id;
            Ok(true)
        } else if self.station_id != station_id {
            let expected = self.station_id;
            warn!("station id changed from {} to {}", expected, station_id);
            self.station_id = 0;
            Err(Error::StationIdMismatch {
                expected,
                received: station_id,
            })
        } else {
            Ok(true)
        }
    }
}
