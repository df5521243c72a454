//! Legacy RTCM2: 6 of 8 byte packing, 30 bit parity words,
//! and the handful of messages a DGPS reference station emits.
use gnss_rs::prelude::Constellation;
use hifitime::Epoch;
use log::{debug, error, warn};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    bits::{round_i32, BitReader, BitWriter},
    checksum::Rtcm2Parity,
    constants::Constants,
    sat::Sat,
    session::{Message, Session, Status},
    time, Error,
};

/// Header size (2 words of 3 bytes)
const HEADER_SIZE: usize = 6;

/// Maximal number of characters of a type 16 message
const MAX_TEXT_CHARS: usize = 90;

/// Differential GPS correction of one satellite (types 1 and 9)
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DgpsCorrection {
    pub sat: Sat,
    /// Reference epoch
    pub t0: Epoch,
    /// Pseudo range correction [m]
    pub prc: f64,
    /// Range rate correction [m/s]
    pub rrc: f64,
    /// Issue of data
    pub iod: u8,
    /// User differential range error indicator
    pub udre: u8,
}

/// Gathers RTCM2 frames out of 6 of 8 encoded bytes
#[derive(Debug, Default)]
pub(crate) struct Assembler {
    /// Previous D29*, D30* and current word
    word: u32,
    buf: Vec<u8>,
    nbyte: usize,
    nbit: usize,
    len: usize,
}

impl Assembler {
    /// Consumes one byte. Returns the data bytes of a frame once all
    /// its words passed the parity check, and an [Error] when one did not.
    pub fn input(&mut self, byte: u8) -> Option<Result<Vec<u8>, Error>> {
        if byte & 0xC0 != 0x40 {
            return None;
        }
        let mut data = byte;
        let mut failure = None;
        for _ in 0..6 {
            self.word = (self.word << 1) + (data & 0x01) as u32;
            data >>= 1;

            if self.nbyte == 0 {
                let mut preamble = (self.word >> 22) as u8;
                if self.word & 0x40000000 != 0 {
                    preamble ^= 0xFF;
                }
                if preamble != Constants::RTCM2_PREAMBLE {
                    continue;
                }
                if let Some(bytes) = Rtcm2Parity::decode_word(self.word) {
                    self.buf.clear();
                    self.buf.extend_from_slice(&bytes);
                    self.nbyte = 3;
                    self.nbit = 0;
                }
                continue;
            }

            self.nbit += 1;
            if self.nbit < 30 {
                continue;
            }
            self.nbit = 0;

            let Some(bytes) = Rtcm2Parity::decode_word(self.word) else {
                warn!("rtcm2 parity error after {} bytes", self.nbyte);
                self.nbyte = 0;
                self.word &= 0x03;
                failure = Some(Error::BadParity);
                continue;
            };
            self.buf.extend_from_slice(&bytes);
            self.nbyte += 3;
            if self.nbyte == HEADER_SIZE {
                self.len = (self.buf[5] >> 3) as usize * 3 + HEADER_SIZE;
            }
            if self.nbyte < self.len {
                continue;
            }
            self.nbyte = 0;
            self.word &= 0x03;
            return Some(Ok(std::mem::take(&mut self.buf)));
        }
        failure.map(Err)
    }
}

/// Packs 24 bit data words into a 6 of 8 encoded frame. The last two
/// data bits of the last word are set so that its D29 and D30 parity
/// bits are zero: the next frame may then be encoded on its own.
fn pack(words: &[u32]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(words.len() * 5);
    let mut previous = 0_u32;
    for (n, data) in words.iter().enumerate() {
        let word = if n == words.len() - 1 {
            (0..4)
                .map(|t| Rtcm2Parity::encode_word(previous, (data & !0x03) | t))
                .find(|word| word & 0x03 == 0)
                .unwrap_or_else(|| Rtcm2Parity::encode_word(previous, *data))
        } else {
            Rtcm2Parity::encode_word(previous, *data)
        };
        for k in 0..5 {
            let bits = ((word >> (24 - 6 * k)) & 0x3f) as u8;
            bytes.push(0x40 | (bits.reverse_bits() >> 2));
        }
        previous = word;
    }
    bytes
}

impl Session {
    /// Decodes a frame gathered by the RTCM2 assembler
    pub(crate) fn decode_rtcm2(&mut self, frame: &[u8]) -> Status {
        let len = frame.len();
        let mut r = BitReader::new(frame, 8, len * 8);
        let result = self.decode_rtcm2_frame(&mut r, len);
        let msg_type = frame.get(1).map(|b| (b >> 2) as u16).unwrap_or(0);
        match result {
            Ok(Some(message)) => {
                debug!("rtcm2 {}: {:?}", msg_type, message);
                Status::Decoded { msg_type, message }
            },
            Ok(None) => {
                self.stats.unhandled += 1;
                debug!("rtcm2 {}: not handled ({} bytes)", msg_type, len);
                Status::Unhandled { msg_type, len }
            },
            Err(e) => {
                self.stats.decode_failures += 1;
                error!("rtcm2 {}: {}", msg_type, e);
                Status::Rejected(e)
            },
        }
    }

    fn decode_rtcm2_frame(
        &mut self,
        r: &mut BitReader,
        len: usize,
    ) -> Result<Option<Message>, Error> {
        let msg_type = r.u(6)? as u16;
        let station_id = r.u(10)? as u16;
        let raw_zcount = r.u(13)? as f64 * 0.6;
        let seqno = r.u(3)? as u8;
        let _nwords = r.u(5)?;
        let health = r.u(3)? as u8;

        self.stats.record(msg_type, len);
        if raw_zcount >= 3600.0 {
            return Err(Error::InvalidZCount);
        }

        // resolve the hour
        let (week, tow) = time::gpst_week_tow(self.reference_time()?);
        let hour = (tow / 3600.0).floor();
        let sec = tow - hour * 3600.0;
        let zcount = if raw_zcount < sec - 1800.0 {
            raw_zcount + 3600.0
        } else if raw_zcount > sec + 1800.0 {
            raw_zcount - 3600.0
        } else {
            raw_zcount
        };
        self.set_time(time::gpst(week, hour * 3600.0 + zcount));

        if seqno != (self.seqno + 1) % 8 {
            debug!("rtcm2 sequence gap: {} -> {}", self.seqno, seqno);
        }
        self.seqno = seqno;
        self.station_health = health;

        if !self.check_station(station_id)? {
            return Ok(None);
        }

        match msg_type {
            1 | 9 => self.decode_rtcm2_dgps(r).map(Some),
            3 => {
                let x = r.s(32)? as f64 * 0.01;
                let y = r.s(32)? as f64 * 0.01;
                let z = r.s(32)? as f64 * 0.01;
                self.station.station_id = station_id;
                self.station.position = [x, y, z];
                Ok(Some(Message::Station))
            },
            14 => {
                let week = r.u(10)?;
                let hour = r.u(8)? as f64;
                let leap_seconds = r.u(6)?;
                let (ref_week, _) = time::gpst_week_tow(self.reference_time()?);
                let week = time::adjust_week(week, 10, ref_week);
                debug!("rtcm2 gps time: week {} hour {} (leap {}s)", week, hour, leap_seconds);
                self.set_time(time::gpst(week, hour * 3600.0 + raw_zcount));
                Ok(Some(Message::Time))
            },
            16 => {
                let mut bytes = Vec::with_capacity(MAX_TEXT_CHARS);
                while r.remaining() >= 8 && bytes.len() < MAX_TEXT_CHARS {
                    bytes.push(r.u(8)? as u8);
                }
                let text = String::from_utf8_lossy(&bytes);
                self.text = text.trim_end_matches(|c: char| c.is_control()).to_string();
                Ok(Some(Message::Text))
            },
            _ => Ok(None),
        }
    }

    /// Differential corrections: only stored once all satellites were read
    fn decode_rtcm2_dgps(&mut self, r: &mut BitReader) -> Result<Message, Error> {
        let t0 = self.reference_time()?;
        let mut corrections = Vec::new();
        while r.remaining() >= 40 {
            let fact = r.flag()?;
            let udre = r.u(2)? as u8;
            let prn = match r.u(5)? as u8 {
                0 => 32,
                prn => prn,
            };
            let prc = r.s(16)?;
            let rrc = r.s(8)?;
            let iod = r.u(8)? as u8;
            let Some(sat) = Sat::new(Constellation::GPS, prn) else {
                continue;
            };
            let correction = if prc == -32768 || rrc == -128 {
                None
            } else {
                let (prc_scale, rrc_scale) = if fact { (0.32, 0.032) } else { (0.02, 0.002) };
                Some(DgpsCorrection {
                    sat,
                    t0,
                    prc: prc as f64 * prc_scale,
                    rrc: rrc as f64 * rrc_scale,
                    iod,
                    udre,
                })
            };
            corrections.push((prn, correction));
        }
        for (prn, correction) in corrections {
            if let Some(entry) = self.dgps.get_mut(prn as usize - 1) {
                *entry = correction;
            }
        }
        Ok(Message::Dgps)
    }

    /// Serializes session records into one RTCM2 frame (types 3, 14 and 16).
    ///
    /// The frame is dated with the session time, and carries the session
    /// station id, sequence number and station health. Each frame leaves
    /// the parity chain in its initial state, so consecutive frames may be
    /// concatenated.
    pub fn encode_rtcm2(&self, msg_type: u8) -> Result<Vec<u8>, Error> {
        let t = self.reference_time()?;
        let (week, tow) = time::gpst_week_tow(t);

        let mut w = BitWriter::new();
        match msg_type {
            3 => {
                if !self.station.has_position() {
                    return Err(Error::NoData(msg_type as u16));
                }
                for v in self.station.position {
                    w.s(32, round_i32(v / 0.01));
                }
            },
            14 => {
                let leap_seconds = t
                    .leap_seconds(true)
                    .map(|tai_utc| (tai_utc - 19.0).max(0.0) as u32)
                    .unwrap_or(0);
                w.u(10, week % 1024);
                w.u(8, (tow / 3600.0).floor() as u32);
                w.u(6, leap_seconds);
            },
            16 => {
                let text = self
                    .text
                    .bytes()
                    .filter(|b| b.is_ascii())
                    .take(MAX_TEXT_CHARS)
                    .collect::<Vec<_>>();
                if text.is_empty() {
                    return Err(Error::NoData(msg_type as u16));
                }
                w.bytes(&text);
            },
            _ => return Err(Error::NonSupportedMessage(msg_type as u16)),
        }

        // payload words, ending with at least two (zero) fill bits
        let mut payload = w.into_bytes();
        let free = (3 - payload.len() % 3) % 3;
        payload.extend((0..free).map(|_| 0_u8));
        let mut words = payload
            .chunks(3)
            .map(|c| ((c[0] as u32) << 16) | ((c[1] as u32) << 8) | c[2] as u32)
            .collect::<Vec<_>>();
        if free == 0 {
            words.push(0);
        }

        let zcount = ((tow % 3600.0) / 0.6).floor() as u32;
        let header = [
            ((Constants::RTCM2_PREAMBLE as u32) << 16)
                | ((msg_type as u32 & 0x3f) << 10)
                | (self.station_id as u32 & 0x3ff),
            ((zcount % 6000) << 11)
                | ((self.seqno as u32 & 0x07) << 8)
                | ((words.len() as u32 & 0x1f) << 3)
                | (self.station_health as u32 & 0x07),
        ];
        let words = header.into_iter().chain(words).collect::<Vec<_>>();
        Ok(pack(&words))
    }
}
