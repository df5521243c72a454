//! State Space Representation (SSR) corrections
use std::collections::BTreeMap;

use hifitime::{Duration, Epoch};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{constants::Constants, observation::ObsCode};

/// Correction categories, each one has its own epoch
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum SsrCategory {
    Orbit = 0,
    Clock = 1,
    HighRateClock = 2,
    Ura = 3,
    CodeBias = 4,
    PhaseBias = 5,
}

impl SsrCategory {
    pub const ALL: [Self; 6] = [
        Self::Orbit,
        Self::Clock,
        Self::HighRateClock,
        Self::Ura,
        Self::CodeBias,
        Self::PhaseBias,
    ];
}

/// Timing of one correction category
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SsrEpoch {
    /// Reference epoch, expressed in GPST
    pub epoch: Epoch,
    /// Update interval index (0..=15)
    pub udi: u8,
    /// IOD SSR
    pub iod: u8,
}

impl SsrEpoch {
    /// Update interval as [Duration]
    pub fn update_interval(&self) -> Duration {
        let udi = Constants::SSR_UPDATE_INTERVALS[(self.udi & 0x0f) as usize];
        Duration::from_seconds(udi)
    }
}

/// Phase bias of one signal
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PhaseBias {
    /// Bias [m]
    pub bias: f64,
    /// Signal integer property
    pub integer: bool,
    /// Signal wide lane integer indicator (0..=3)
    pub wide_lane: u8,
    /// Signal discontinuity counter (0..=15)
    pub discontinuity: u8,
}

/// SSR corrections of one satellite.
/// Every message only updates the categories it carries.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SsrCorrection {
    /// Epoch of each category, indexed by [SsrCategory]
    pub epochs: [Option<SsrEpoch>; 6],
    pub provider_id: u16,
    pub solution_id: u8,
    /// Issue of data of the broadcast ephemeris the corrections apply to
    pub iode: u16,
    /// CRC of the broadcast ephemeris (BeiDou only)
    pub iodcrc: u32,
    /// URA class and value indicator
    pub ura: u8,
    /// Orbit corrections are expressed in the regional datum
    pub reference_datum: bool,
    /// Orbit corrections (radial, along track, cross track) [m]
    pub orbit: [f64; 3],
    /// Orbit correction rates [m/s]
    pub orbit_rate: [f64; 3],
    /// Clock polynomial (C0 [m], C1 [m/s], C2 [m/s²])
    pub clock: [f64; 3],
    /// High rate clock correction [m]
    pub high_rate_clock: f64,
    /// Code biases [m]
    pub code_biases: BTreeMap<ObsCode, f64>,
    /// Phase biases
    pub phase_biases: BTreeMap<ObsCode, PhaseBias>,
    /// Dispersive bias consistency indicator
    pub dispersive_bias: bool,
    /// Melbourne-Wubbena consistency indicator
    pub mw_consistency: bool,
    /// Yaw angle [deg]
    pub yaw_angle: f64,
    /// Yaw rate [deg/s]
    pub yaw_rate: f64,
    /// Set whenever a message updated this record
    pub updated: bool,
}

impl SsrCorrection {
    /// Returns [SsrEpoch] of this category
    pub fn epoch(&self, category: SsrCategory) -> Option<&SsrEpoch> {
        self.epochs[category as usize].as_ref()
    }

    /// Sets [SsrEpoch] of this category
    pub fn set_epoch(&mut self, category: SsrCategory, epoch: SsrEpoch) {
        self.epochs[category as usize] = Some(epoch);
    }

    /// True if this category was ever received
    pub fn has(&self, category: SsrCategory) -> bool {
        self.epochs[category as usize].is_some()
    }
}
