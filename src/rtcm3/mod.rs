//! RTCM3 framing and message dispatch
use gnss_rs::prelude::Constellation;
use log::{debug, error};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod ephemeris;
mod legacy;
mod msm;
mod ssr;
mod station;

use crate::{
    bits::{BitReader, BitWriter},
    checksum::Crc24q,
    config::MessageFamily,
    constants::Constants,
    session::{Message, Session, Status},
    utils::Utils,
    Error,
};

/// RTCM3 assembler state
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum State {
    /// Scanning for the preamble
    #[default]
    Synchronizing,
    /// Gathering the 3 byte header
    ReadingHeader,
    /// Gathering payload and CRC
    ReadingPayload,
}

/// Gathers RTCM3 frames, one byte at a time
#[derive(Debug)]
pub(crate) struct Assembler {
    state: State,
    buf: Vec<u8>,
    nbyte: usize,
    len: usize,
}

impl Default for Assembler {
    fn default() -> Self {
        Self {
            state: State::default(),
            buf: vec![0; Constants::DEFAULT_CAPACITY],
            nbyte: 0,
            len: 0,
        }
    }
}

impl Assembler {
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        if capacity < Constants::RTCM3_MAX_FRAME {
            return Err(Error::BufferTooSmall(capacity));
        }
        Ok(Self {
            buf: vec![0; capacity],
            ..Default::default()
        })
    }

    pub fn state(&self) -> State {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = State::Synchronizing;
        self.nbyte = 0;
        self.len = 0;
    }

    /// Consumes one byte. Returns the payload length once a complete
    /// frame passed the integrity check, and an [Error] if it did not.
    pub fn input(&mut self, byte: u8) -> Option<Result<usize, Error>> {
        match self.state {
            State::Synchronizing => {
                if byte == Constants::RTCM3_PREAMBLE {
                    self.buf[0] = byte;
                    self.nbyte = 1;
                    self.state = State::ReadingHeader;
                }
                None
            },
            State::ReadingHeader => {
                self.buf[self.nbyte] = byte;
                self.nbyte += 1;
                if self.nbyte < Constants::RTCM3_HEADER_SIZE {
                    return None;
                }
                // 6 reserved bits + 10 bit length: reserved bits set
                // exceed the maximal length
                let len = Utils::get_bitu(&self.buf, 8, 16) as usize;
                if len > Constants::RTCM3_MAX_PAYLOAD {
                    self.reset();
                    return Some(Err(Error::FrameTooLong(len)));
                }
                self.len = len;
                self.state = State::ReadingPayload;
                None
            },
            State::ReadingPayload => {
                self.buf[self.nbyte] = byte;
                self.nbyte += 1;
                let size = Constants::RTCM3_HEADER_SIZE + self.len;
                if self.nbyte < size + Constants::RTCM3_CRC_SIZE {
                    return None;
                }
                let len = self.len;
                self.reset();
                let crc = Utils::get_bitu(&self.buf, size * 8, 24);
                if Crc24q::calc(&self.buf[..size]) != crc {
                    Some(Err(Error::BadCrc))
                } else {
                    Some(Ok(len))
                }
            },
        }
    }

    /// Lends the frame buffer
    pub fn take_frame(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.buf)
    }

    /// Returns the lent frame buffer
    pub fn restore_frame(&mut self, buf: Vec<u8>) {
        self.buf = buf;
    }
}

/// Wraps a payload into a complete RTCM3 frame
pub(crate) fn frame(payload: &[u8]) -> Result<Vec<u8>, Error> {
    let len = payload.len();
    if len > Constants::RTCM3_MAX_PAYLOAD {
        return Err(Error::FrameTooLong(len));
    }
    let mut frame = Vec::with_capacity(len + 6);
    frame.push(Constants::RTCM3_PREAMBLE);
    frame.push((len >> 8) as u8 & 0x03);
    frame.push(len as u8);
    frame.extend_from_slice(payload);
    let crc = Crc24q::calc(&frame);
    frame.extend_from_slice(&[(crc >> 16) as u8, (crc >> 8) as u8, crc as u8]);
    Ok(frame)
}

/// Multiple Signal Message variants
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MsmKind {
    Msm1 = 1,
    Msm2 = 2,
    Msm3 = 3,
    Msm4 = 4,
    Msm5 = 5,
    Msm6 = 6,
    Msm7 = 7,
}

impl MsmKind {
    fn from_u16(n: u16) -> Option<Self> {
        match n {
            1 => Some(Self::Msm1),
            2 => Some(Self::Msm2),
            3 => Some(Self::Msm3),
            4 => Some(Self::Msm4),
            5 => Some(Self::Msm5),
            6 => Some(Self::Msm6),
            7 => Some(Self::Msm7),
            _ => None,
        }
    }
    /// Carries pseudo ranges
    pub(crate) fn has_pseudorange(&self) -> bool {
        !matches!(self, Self::Msm2)
    }
    /// Carries phase ranges
    pub(crate) fn has_phase(&self) -> bool {
        !matches!(self, Self::Msm1)
    }
    /// Carries integer milliseconds
    pub(crate) fn has_integer_ms(&self) -> bool {
        *self as u8 >= 4
    }
    /// Carries extended info and range rates
    pub(crate) fn has_rates(&self) -> bool {
        matches!(self, Self::Msm5 | Self::Msm7)
    }
    /// Carries CNR
    pub(crate) fn has_cnr(&self) -> bool {
        *self as u8 >= 4
    }
    /// High resolution variant
    pub(crate) fn is_extended(&self) -> bool {
        matches!(self, Self::Msm6 | Self::Msm7)
    }
}

/// SSR message variants
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SsrKind {
    Orbit,
    Clock,
    CodeBias,
    /// Orbit and clock
    Combined,
    Ura,
    HighRateClock,
    PhaseBias,
}

impl SsrKind {
    const SEQUENCE: [Self; 6] = [
        Self::Orbit,
        Self::Clock,
        Self::CodeBias,
        Self::Combined,
        Self::Ura,
        Self::HighRateClock,
    ];
}

const MSM_BASES: [(Constellation, u16); 5] = [
    (Constellation::GPS, 1070),
    (Constellation::Glonass, 1080),
    (Constellation::Galileo, 1090),
    (Constellation::QZSS, 1110),
    (Constellation::BeiDou, 1120),
];

/// (constellation, first SSR message, phase bias message)
const SSR_BASES: [(Constellation, u16, u16); 5] = [
    (Constellation::GPS, 1057, 1265),
    (Constellation::Glonass, 1063, 1266),
    (Constellation::Galileo, 1240, 1267),
    (Constellation::QZSS, 1246, 1268),
    (Constellation::BeiDou, 1258, 1270),
];

/// RTCM3 message identification
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MessageID {
    /// Legacy RTK observations (1001-1004, 1009-1012),
    /// with variant number 1 to 4
    LegacyObservation(Constellation, u8),
    /// Multiple Signal Messages
    Msm(Constellation, MsmKind),
    /// 1019
    GpsEphemeris,
    /// 1020
    GlonassEphemeris,
    /// 1042
    BeiDouEphemeris,
    /// 1044
    QzssEphemeris,
    /// 1045
    GalileoFNavEphemeris,
    /// 1046
    GalileoINavEphemeris,
    /// 1005
    StationCoordinates,
    /// 1006
    StationCoordinatesHeight,
    /// 1007
    AntennaDescriptor,
    /// 1008
    AntennaSerial,
    /// 1033
    ReceiverAntennaDescriptor,
    /// 1230
    GlonassBiases,
    /// 1029
    Text,
    /// State Space Representation
    Ssr(SsrKind, Constellation),
    Unknown(u16),
}

impl From<u16> for MessageID {
    fn from(msg_type: u16) -> Self {
        match msg_type {
            1001..=1004 => Self::LegacyObservation(Constellation::GPS, (msg_type - 1000) as u8),
            1009..=1012 => {
                Self::LegacyObservation(Constellation::Glonass, (msg_type - 1008) as u8)
            },
            1019 => Self::GpsEphemeris,
            1020 => Self::GlonassEphemeris,
            1042 => Self::BeiDouEphemeris,
            1044 => Self::QzssEphemeris,
            1045 => Self::GalileoFNavEphemeris,
            1046 => Self::GalileoINavEphemeris,
            1005 => Self::StationCoordinates,
            1006 => Self::StationCoordinatesHeight,
            1007 => Self::AntennaDescriptor,
            1008 => Self::AntennaSerial,
            1033 => Self::ReceiverAntennaDescriptor,
            1230 => Self::GlonassBiases,
            1029 => Self::Text,
            _ => {
                for (constellation, base) in MSM_BASES {
                    if msg_type > base && msg_type <= base + 7 {
                        if let Some(kind) = MsmKind::from_u16(msg_type - base) {
                            return Self::Msm(constellation, kind);
                        }
                    }
                }
                for (constellation, base, phase_bias) in SSR_BASES {
                    if msg_type >= base && msg_type < base + 6 {
                        let kind = SsrKind::SEQUENCE[(msg_type - base) as usize];
                        return Self::Ssr(kind, constellation);
                    }
                    if msg_type == phase_bias {
                        return Self::Ssr(SsrKind::PhaseBias, constellation);
                    }
                }
                Self::Unknown(msg_type)
            },
        }
    }
}

impl From<MessageID> for u16 {
    fn from(id: MessageID) -> u16 {
        match id {
            MessageID::LegacyObservation(Constellation::Glonass, n) => 1008 + n as u16,
            MessageID::LegacyObservation(_, n) => 1000 + n as u16,
            MessageID::Msm(constellation, kind) => {
                let base = MSM_BASES
                    .iter()
                    .find(|(c, _)| *c == constellation)
                    .map(|(_, base)| *base)
                    .unwrap_or(1070);
                base + kind as u16
            },
            MessageID::GpsEphemeris => 1019,
            MessageID::GlonassEphemeris => 1020,
            MessageID::BeiDouEphemeris => 1042,
            MessageID::QzssEphemeris => 1044,
            MessageID::GalileoFNavEphemeris => 1045,
            MessageID::GalileoINavEphemeris => 1046,
            MessageID::StationCoordinates => 1005,
            MessageID::StationCoordinatesHeight => 1006,
            MessageID::AntennaDescriptor => 1007,
            MessageID::AntennaSerial => 1008,
            MessageID::ReceiverAntennaDescriptor => 1033,
            MessageID::GlonassBiases => 1230,
            MessageID::Text => 1029,
            MessageID::Ssr(kind, constellation) => {
                let (base, phase_bias) = SSR_BASES
                    .iter()
                    .find(|(c, _, _)| *c == constellation)
                    .map(|(_, base, pb)| (*base, *pb))
                    .unwrap_or((1057, 1265));
                match kind {
                    SsrKind::PhaseBias => phase_bias,
                    kind => {
                        let offset = SsrKind::SEQUENCE
                            .iter()
                            .position(|k| *k == kind)
                            .unwrap_or(0);
                        base + offset as u16
                    },
                }
            },
            MessageID::Unknown(msg_type) => msg_type,
        }
    }
}

impl MessageID {
    /// [MessageFamily] of this message
    pub fn family(&self) -> MessageFamily {
        match self {
            Self::LegacyObservation(..) | Self::Msm(..) => MessageFamily::OBSERVATION,
            Self::GpsEphemeris
            | Self::GlonassEphemeris
            | Self::BeiDouEphemeris
            | Self::QzssEphemeris
            | Self::GalileoFNavEphemeris
            | Self::GalileoINavEphemeris => MessageFamily::EPHEMERIS,
            Self::StationCoordinates
            | Self::StationCoordinatesHeight
            | Self::AntennaDescriptor
            | Self::AntennaSerial
            | Self::ReceiverAntennaDescriptor
            | Self::GlonassBiases => MessageFamily::STATION,
            Self::Text => MessageFamily::TEXT,
            Self::Ssr(..) => MessageFamily::SSR,
            Self::Unknown(_) => MessageFamily::empty(),
        }
    }
}

impl Session {
    /// Decodes a verified frame of `len` payload bytes
    pub(crate) fn decode_rtcm3(&mut self, frame: &[u8], len: usize) -> Status {
        if len == 0 {
            self.stats.record(0, 0);
            debug!("rtcm3 filler frame");
            return Status::Decoded {
                msg_type: 0,
                message: Message::Filler,
            };
        }

        let mut reader = BitReader::rtcm3(frame, len);
        let msg_type = match reader.u(12) {
            Ok(msg_type) => msg_type as u16,
            Err(e) => {
                self.stats.decode_failures += 1;
                error!("rtcm3 frame too short: {} bytes", len);
                return Status::Rejected(e);
            },
        };

        self.stats.record(msg_type, len);

        let id = MessageID::from(msg_type);
        if !self.config.families.intersects(id.family()) {
            self.stats.unhandled += 1;
            debug!("rtcm3 {}: not handled ({} bytes)", msg_type, len);
            return Status::Unhandled { msg_type, len };
        }

        let reader = &mut reader;
        let result = match id {
            MessageID::LegacyObservation(constellation, n) => {
                self.decode_legacy(reader, constellation, n)
            },
            MessageID::Msm(constellation, kind) => self.decode_msm(reader, constellation, kind),
            MessageID::GpsEphemeris => self.decode_gps_ephemeris(reader),
            MessageID::GlonassEphemeris => self.decode_glonass_ephemeris(reader),
            MessageID::BeiDouEphemeris => self.decode_beidou_ephemeris(reader),
            MessageID::QzssEphemeris => self.decode_qzss_ephemeris(reader),
            MessageID::GalileoFNavEphemeris => self.decode_galileo_ephemeris(reader, false),
            MessageID::GalileoINavEphemeris => self.decode_galileo_ephemeris(reader, true),
            MessageID::StationCoordinates => self.decode_station_coordinates(reader, false),
            MessageID::StationCoordinatesHeight => self.decode_station_coordinates(reader, true),
            MessageID::AntennaDescriptor => self.decode_antenna_descriptor(reader, false),
            MessageID::AntennaSerial => self.decode_antenna_descriptor(reader, true),
            MessageID::ReceiverAntennaDescriptor => self.decode_receiver_descriptor(reader),
            MessageID::GlonassBiases => self.decode_glonass_biases(reader),
            MessageID::Text => self.decode_text(reader),
            MessageID::Ssr(kind, constellation) => self.decode_ssr(reader, kind, constellation),
            MessageID::Unknown(_) => Ok(None),
        };

        match result {
            Ok(Some(message)) => {
                debug!("rtcm3 {}: {:?}", msg_type, message);
                Status::Decoded { msg_type, message }
            },
            Ok(None) => {
                self.stats.unhandled += 1;
                debug!("rtcm3 {}: not handled ({} bytes)", msg_type, len);
                Status::Unhandled { msg_type, len }
            },
            Err(e) => {
                self.stats.decode_failures += 1;
                error!("rtcm3 {}: {}", msg_type, e);
                Status::Rejected(e)
            },
        }
    }

    /// Serializes session records into one RTCM3 frame.
    ///   - `msg_type`: RTCM3 message number
    ///   - `subtype`: proprietary message subtype, none supported (use 0)
    ///   - `sync`: multiple message bit, set when more messages of
    ///     the same epoch will follow
    pub fn encode_rtcm3(&self, msg_type: u16, subtype: u16, sync: bool) -> Result<Vec<u8>, Error> {
        if subtype != 0 {
            return Err(Error::NonSupportedSubtype(subtype));
        }
        let mut w = BitWriter::new();
        w.u(12, msg_type as u32);
        let w_ref = &mut w;
        match MessageID::from(msg_type) {
            MessageID::LegacyObservation(constellation, n) => {
                self.encode_legacy(w_ref, constellation, n, sync)?
            },
            MessageID::Msm(constellation, kind) => {
                self.encode_msm(w_ref, constellation, kind, sync)?
            },
            MessageID::GpsEphemeris => self.encode_gps_ephemeris(w_ref)?,
            MessageID::GlonassEphemeris => self.encode_glonass_ephemeris(w_ref)?,
            MessageID::BeiDouEphemeris => self.encode_beidou_ephemeris(w_ref)?,
            MessageID::QzssEphemeris => self.encode_qzss_ephemeris(w_ref)?,
            MessageID::GalileoFNavEphemeris => self.encode_galileo_ephemeris(w_ref, false)?,
            MessageID::GalileoINavEphemeris => self.encode_galileo_ephemeris(w_ref, true)?,
            MessageID::StationCoordinates => self.encode_station_coordinates(w_ref, false),
            MessageID::StationCoordinatesHeight => self.encode_station_coordinates(w_ref, true),
            MessageID::AntennaDescriptor => self.encode_antenna_descriptor(w_ref, false),
            MessageID::AntennaSerial => self.encode_antenna_descriptor(w_ref, true),
            MessageID::ReceiverAntennaDescriptor => self.encode_receiver_descriptor(w_ref),
            MessageID::GlonassBiases => self.encode_glonass_biases(w_ref),
            MessageID::Text => self.encode_text(w_ref)?,
            MessageID::Ssr(kind, constellation) => {
                self.encode_ssr(w_ref, kind, constellation, sync)?
            },
            MessageID::Unknown(msg_type) => return Err(Error::NonSupportedMessage(msg_type)),
        }
        frame(&w.into_bytes())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn message_identification() {
        for (msg_type, id) in [
            (1001, MessageID::LegacyObservation(Constellation::GPS, 1)),
            (1004, MessageID::LegacyObservation(Constellation::GPS, 4)),
            (1012, MessageID::LegacyObservation(Constellation::Glonass, 4)),
            (1071, MessageID::Msm(Constellation::GPS, MsmKind::Msm1)),
            (1087, MessageID::Msm(Constellation::Glonass, MsmKind::Msm7)),
            (1094, MessageID::Msm(Constellation::Galileo, MsmKind::Msm4)),
            (1115, MessageID::Msm(Constellation::QZSS, MsmKind::Msm5)),
            (1127, MessageID::Msm(Constellation::BeiDou, MsmKind::Msm7)),
            (1019, MessageID::GpsEphemeris),
            (1046, MessageID::GalileoINavEphemeris),
            (1033, MessageID::ReceiverAntennaDescriptor),
            (1057, MessageID::Ssr(SsrKind::Orbit, Constellation::GPS)),
            (1060, MessageID::Ssr(SsrKind::Combined, Constellation::GPS)),
            (1068, MessageID::Ssr(SsrKind::HighRateClock, Constellation::Glonass)),
            (1243, MessageID::Ssr(SsrKind::Combined, Constellation::Galileo)),
            (1250, MessageID::Ssr(SsrKind::Ura, Constellation::QZSS)),
            (1259, MessageID::Ssr(SsrKind::Clock, Constellation::BeiDou)),
            (1265, MessageID::Ssr(SsrKind::PhaseBias, Constellation::GPS)),
            (1270, MessageID::Ssr(SsrKind::PhaseBias, Constellation::BeiDou)),
            (1070, MessageID::Unknown(1070)),
            (1078, MessageID::Unknown(1078)),
            (1269, MessageID::Unknown(1269)),
            (4094, MessageID::Unknown(4094)),
        ] {
            assert_eq!(MessageID::from(msg_type), id, "failed for {}", msg_type);
            assert_eq!(u16::from(id), msg_type);
        }
    }

    #[test]
    fn message_families() {
        assert_eq!(
            MessageID::from(1077).family(),
            MessageFamily::OBSERVATION
        );
        assert_eq!(MessageID::from(1020).family(), MessageFamily::EPHEMERIS);
        assert_eq!(MessageID::from(1230).family(), MessageFamily::STATION);
        assert_eq!(MessageID::from(1029).family(), MessageFamily::TEXT);
        assert_eq!(MessageID::from(1267).family(), MessageFamily::SSR);
        assert!(MessageID::from(4094).family().is_empty());
    }

    #[test]
    fn framing() {
        let frame = frame(&[]).unwrap();
        assert_eq!(frame, [0xD3, 0x00, 0x00, 0x47, 0xEA, 0x4B]);

        let payload = vec![0xAA; Constants::RTCM3_MAX_PAYLOAD];
        let frame = super::frame(&payload).unwrap();
        assert_eq!(frame.len(), Constants::RTCM3_MAX_FRAME);
        assert_eq!(frame[1], 0x03);
        assert_eq!(frame[2], 0xff);

        let payload = vec![0xAA; Constants::RTCM3_MAX_PAYLOAD + 1];
        assert!(matches!(super::frame(&payload), Err(Error::FrameTooLong(1024))));
    }

    #[test]
    fn assembler() {
        let mut assembler = Assembler::default();
        let frame = frame(&[0x12, 0x34]).unwrap();
        // garbage is skipped
        for byte in [0x00, 0x12, 0xff] {
            assert!(assembler.input(byte).is_none());
            assert_eq!(assembler.state(), State::Synchronizing);
        }
        for (i, byte) in frame.iter().enumerate() {
            let ret = assembler.input(*byte);
            if i < frame.len() - 1 {
                assert!(ret.is_none());
            } else {
                assert_eq!(ret.unwrap().unwrap(), 2);
            }
        }
        assert_eq!(assembler.state(), State::Synchronizing);

        // reserved bits set
        assert!(assembler.input(0xD3).is_none());
        assert!(assembler.input(0x04).is_none());
        assert!(matches!(
            assembler.input(0x00),
            Some(Err(Error::FrameTooLong(1024)))
        ));
        assert_eq!(assembler.state(), State::Synchronizing);

        // corrupt crc
        let mut frame = frame;
        frame[3] ^= 0x01;
        let mut last = None;
        for byte in frame {
            last = assembler.input(byte);
        }
        assert!(matches!(last, Some(Err(Error::BadCrc))));
    }
}
