//! GLONASS broadcast ephemeris (state vector)
use hifitime::{Duration, Epoch};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{navigation::max_toe_age, sat::Sat};

/// GLONASS broadcast ephemeris, expressed as a state vector in PZ-90.
/// Epochs are expressed in GPST.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GlonassEphemeris {
    pub sat: Sat,
    /// Issue of data: tb index (15' intervals within the day)
    pub iode: u8,
    /// Frequency channel number (-7..=13)
    pub freq_channel: i8,
    /// Bn health flag
    pub sv_health: u8,
    /// Accuracy index (FT)
    pub sva: u8,
    /// Age of operation information (En) [days]
    pub age_op_days: u8,
    /// Reference epoch of the state vector
    pub toe: Epoch,
    /// Frame time
    pub tof: Epoch,
    /// Position [m]
    pub position_m: [f64; 3],
    /// Velocity [m/s]
    pub velocity_m_s: [f64; 3],
    /// Acceleration (luni-solar) [m/s²]
    pub acceleration_m_s2: [f64; 3],
    /// -tau_n: clock offset [s]
    pub clock_offset: f64,
    /// gamma_n: relative frequency bias
    pub clock_rel_freq_bias: f64,
    /// delta tau_n: L1/L2 group delay [s]
    pub l1_l2_gd: f64,
}

impl GlonassEphemeris {
    /// Creates an empty [GlonassEphemeris] for this satellite
    pub fn new(sat: Sat) -> Self {
        let t0 = Epoch::from_gpst_seconds(0.0);
        Self {
            sat,
            iode: 0,
            freq_channel: 0,
            sv_health: 0,
            sva: 0,
            age_op_days: 0,
            toe: t0,
            tof: t0,
            position_m: [0.0; 3],
            velocity_m_s: [0.0; 3],
            acceleration_m_s2: [0.0; 3],
            clock_offset: 0.0,
            clock_rel_freq_bias: 0.0,
            l1_l2_gd: 0.0,
        }
    }

    /// Maximal distance to [Self::toe] for this ephemeris to be used
    pub fn max_age(&self) -> Duration {
        Duration::from_seconds(max_toe_age(self.sat.constellation()))
    }

    /// True if this ephemeris may be used at `t`
    pub fn is_valid(&self, t: Epoch) -> bool {
        (t - self.toe).abs() <= self.max_age()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss_rs::prelude::Constellation;
    #[test]
    fn validity() {
        let sat = Sat::new(Constellation::Glonass, 3).unwrap();
        let mut geph = GlonassEphemeris::new(sat);
        geph.toe = Epoch::from_gpst_seconds(1.0E6);
        assert!(geph.is_valid(geph.toe + Duration::from_seconds(1800.0)));
        assert!(!geph.is_valid(geph.toe - Duration::from_seconds(1801.0)));
    }
}
