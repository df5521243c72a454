//! Dense satellite index
use gnss_rs::prelude::{Constellation, SV};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Error;

/// (Constellation, first PRN, number of satellites)
const RANGES: [(Constellation, u8, u8); 5] = [
    (Constellation::GPS, 1, 32),
    (Constellation::Glonass, 1, 27),
    (Constellation::Galileo, 1, 40),
    (Constellation::QZSS, 193, 10),
    (Constellation::BeiDou, 1, 63),
];

/// [Sat] is a 1-based dense satellite index, spanning all supported
/// constellations. It is used to address all per satellite tables of
/// the [Session](crate::prelude::Session).
/// ```
/// use rtcm::prelude::{Constellation, Sat, SV};
///
/// let sat = Sat::new(Constellation::Galileo, 11).unwrap();
/// assert_eq!(sat.constellation(), Constellation::Galileo);
/// assert_eq!(sat.prn(), 11);
///
/// // QZSS uses the 193-202 PRN range
/// let sat = Sat::new(Constellation::QZSS, 193).unwrap();
/// assert_eq!(sat.sv(), SV::new(Constellation::QZSS, 1));
///
/// assert!(Sat::new(Constellation::GPS, 33).is_none());
/// assert!(Sat::from_index(0).is_none());
/// ```
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Sat(u8);

impl Sat {
    /// Total number of satellites
    pub const MAX: usize = 172;

    /// Builds a [Sat] from constellation and PRN (RTCM numbering).
    /// Returns None for out of range PRN and non supported constellations.
    pub fn new(constellation: Constellation, prn: u8) -> Option<Self> {
        let mut offset = 0_u8;
        for (c, first, count) in RANGES {
            if c == constellation {
                if prn < first || prn - first >= count {
                    return None;
                }
                return Some(Self(offset + (prn - first) + 1));
            }
            offset += count;
        }
        None
    }

    /// Builds a [Sat] from its 1-based dense index
    pub fn from_index(index: usize) -> Option<Self> {
        if index == 0 || index > Self::MAX {
            None
        } else {
            Some(Self(index as u8))
        }
    }

    /// 1-based dense index
    pub fn index(&self) -> usize {
        self.0 as usize
    }

    fn locate(&self) -> (Constellation, u8) {
        let mut offset = 0_u8;
        for (c, first, count) in RANGES {
            if self.0 <= offset + count {
                return (c, first + (self.0 - offset - 1));
            }
            offset += count;
        }
        // unreachable for a valid index
        (Constellation::BeiDou, self.0.saturating_sub(offset))
    }

    pub fn constellation(&self) -> Constellation {
        self.locate().0
    }

    /// PRN, using RTCM numbering (QZSS starts at 193)
    pub fn prn(&self) -> u8 {
        self.locate().1
    }

    /// Converts to [SV]
    pub fn sv(&self) -> SV {
        let (constellation, prn) = self.locate();
        match constellation {
            Constellation::QZSS => SV::new(constellation, prn - 192),
            _ => SV::new(constellation, prn),
        }
    }
}

impl From<Sat> for SV {
    fn from(sat: Sat) -> SV {
        sat.sv()
    }
}

impl TryFrom<SV> for Sat {
    type Error = Error;
    fn try_from(sv: SV) -> Result<Self, Self::Error> {
        let prn = match sv.constellation {
            Constellation::QZSS => sv.prn.checked_add(192).ok_or(Error::InvalidSatellite)?,
            _ => sv.prn,
        };
        Self::new(sv.constellation, prn).ok_or(Error::InvalidSatellite)
    }
}

impl std::fmt::Display for Sat {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.sv())
    }
}
