//! Observation (signal & tracking mode) codes
use gnss_rs::prelude::Constellation;
use num_traits::FromPrimitive;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    constants::{Constants, Frequencies},
    Error,
};

/// Observation code, identifying a signal and its tracking mode.
/// Uses the RINEX "band + attribute" naming.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, FromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum ObsCode {
    L1C = 1,
    L1P = 2,
    L1W = 3,
    L1Y = 4,
    L1M = 5,
    L1N = 6,
    L1S = 7,
    L1L = 8,
    L1E = 9,
    L1A = 10,
    L1B = 11,
    L1X = 12,
    L1Z = 13,
    L2C = 14,
    L2D = 15,
    L2S = 16,
    L2L = 17,
    L2X = 18,
    L2P = 19,
    L2W = 20,
    L2Y = 21,
    L2M = 22,
    L2N = 23,
    L5I = 24,
    L5Q = 25,
    L5X = 26,
    L7I = 27,
    L7Q = 28,
    L7X = 29,
    L6A = 30,
    L6B = 31,
    L6C = 32,
    L6X = 33,
    L6Z = 34,
    L6S = 35,
    L6L = 36,
    L8I = 37,
    L8Q = 38,
    L8X = 39,
    L2I = 40,
    L2Q = 41,
    L6I = 42,
    L6Q = 43,
    L3I = 44,
    L3Q = 45,
    L3X = 46,
    L1I = 47,
    L1Q = 48,
    L5A = 49,
    L5B = 50,
    L5C = 51,
    L9A = 52,
    L9B = 53,
    L9C = 54,
    L9X = 55,
    L1D = 56,
    L5D = 57,
    L5P = 58,
    L5Z = 59,
    L6E = 60,
    L7D = 61,
    L7P = 62,
    L7Z = 63,
    L8D = 64,
    L8P = 65,
    L4A = 66,
    L4B = 67,
    L4X = 68,
}

const CODES: [&str; 69] = [
    "", "1C", "1P", "1W", "1Y", "1M", "1N", "1S", "1L", "1E", "1A", "1B", "1X", "1Z", "2C", "2D",
    "2S", "2L", "2X", "2P", "2W", "2Y", "2M", "2N", "5I", "5Q", "5X", "7I", "7Q", "7X", "6A", "6B",
    "6C", "6X", "6Z", "6S", "6L", "8I", "8Q", "8X", "2I", "2Q", "6I", "6Q", "3I", "3Q", "3X", "1I",
    "1Q", "5A", "5B", "5C", "9A", "9B", "9C", "9X", "1D", "5D", "5P", "5Z", "6E", "7D", "7P", "7Z",
    "8D", "8P", "4A", "4B", "4X",
];

impl ObsCode {
    /// Number of defined codes
    pub const MAX: usize = 68;

    /// Builds [ObsCode] from its numerical identifier (1..=68)
    pub fn from_id(id: u8) -> Option<Self> {
        Self::from_u8(id)
    }

    /// Numerical identifier (1..=68)
    pub fn id(&self) -> u8 {
        *self as u8
    }

    /// Two character descriptor, like "1C"
    pub fn as_str(&self) -> &'static str {
        CODES[self.id() as usize]
    }

    /// Frequency band digit
    pub fn band(&self) -> char {
        self.as_str().chars().next().unwrap_or('0')
    }

    /// Carrier frequency [Hz] of this signal, for this [Constellation].
    /// GLONASS FDMA signals require the frequency channel number.
    pub fn frequency(&self, constellation: Constellation, fcn: Option<i8>) -> Option<f64> {
        match (constellation, self.band()) {
            (Constellation::GPS | Constellation::QZSS, '1') => Some(Frequencies::L1),
            (Constellation::GPS | Constellation::QZSS, '2') => Some(Frequencies::L2),
            (Constellation::GPS | Constellation::QZSS, '5') => Some(Frequencies::L5),
            (Constellation::QZSS, '6') => Some(Frequencies::L6),
            (Constellation::Glonass, '1') => {
                fcn.map(|k| Frequencies::G1 + Frequencies::G1_STEP * k as f64)
            },
            (Constellation::Glonass, '2') => {
                fcn.map(|k| Frequencies::G2 + Frequencies::G2_STEP * k as f64)
            },
            (Constellation::Glonass, '3') => Some(Frequencies::G3),
            (Constellation::Glonass, '4') => Some(Frequencies::G1A),
            (Constellation::Glonass, '6') => Some(Frequencies::G2A),
            (Constellation::Galileo, '1') => Some(Frequencies::L1),
            (Constellation::Galileo, '5') => Some(Frequencies::L5),
            (Constellation::Galileo, '6') => Some(Frequencies::L6),
            (Constellation::Galileo, '7') => Some(Frequencies::E7),
            (Constellation::Galileo, '8') => Some(Frequencies::E8),
            (Constellation::BeiDou, '1') => Some(Frequencies::L1),
            (Constellation::BeiDou, '2') => Some(Frequencies::B1I),
            (Constellation::BeiDou, '5') => Some(Frequencies::L5),
            (Constellation::BeiDou, '6') => Some(Frequencies::B3),
            (Constellation::BeiDou, '7') => Some(Frequencies::E7),
            (Constellation::BeiDou, '8') => Some(Frequencies::E8),
            _ => None,
        }
    }

    /// Carrier wavelength [m]
    pub fn wavelength(&self, constellation: Constellation, fcn: Option<i8>) -> Option<f64> {
        self.frequency(constellation, fcn)
            .map(|f| Constants::SPEED_OF_LIGHT / f)
    }

    /// Frequency slot (0..NFREQ) this signal is stored in
    pub fn slot(&self, constellation: Constellation) -> Option<usize> {
        match (constellation, self.band()) {
            (Constellation::GPS, '1') => Some(0),
            (Constellation::GPS, '2') => Some(1),
            (Constellation::GPS, '5') => Some(2),
            (Constellation::Glonass, '1' | '4') => Some(0),
            (Constellation::Glonass, '2' | '6') => Some(1),
            (Constellation::Glonass, '3') => Some(2),
            (Constellation::Galileo, '1') => Some(0),
            (Constellation::Galileo, '7') => Some(1),
            (Constellation::Galileo, '5') => Some(2),
            (Constellation::Galileo, '6') => Some(3),
            (Constellation::Galileo, '8') => Some(4),
            (Constellation::QZSS, '1') => Some(0),
            (Constellation::QZSS, '2') => Some(1),
            (Constellation::QZSS, '5') => Some(2),
            (Constellation::QZSS, '6') => Some(3),
            (Constellation::BeiDou, '2') => Some(0),
            (Constellation::BeiDou, '7') => Some(1),
            (Constellation::BeiDou, '6') => Some(2),
            (Constellation::BeiDou, '1') => Some(3),
            (Constellation::BeiDou, '5' | '8') => Some(4),
            _ => None,
        }
    }
}

impl std::fmt::Display for ObsCode {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ObsCode {
    type Err = Error;
    /// Parses "1C" or "L1C" descriptors
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let s = s.strip_prefix('L').unwrap_or(s);
        CODES
            .iter()
            .position(|code| !code.is_empty() && *code == s)
            .and_then(|id| Self::from_id(id as u8))
            .ok_or(Error::InvalidObsCode)
    }
}
