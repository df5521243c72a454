//! Keplerian broadcast ephemeris (GPS, Galileo, QZSS, BeiDou)
use hifitime::{Duration, Epoch};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{navigation::max_toe_age, sat::Sat};

/// Keplerian broadcast [Ephemeris].
/// Angles are expressed in radians, epochs in GPST.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Ephemeris {
    pub sat: Sat,
    /// IODE (GPS/QZSS), IODnav (Galileo) or AODE (BeiDou)
    pub iode: u16,
    /// IODC (GPS/QZSS) or AODC (BeiDou)
    pub iodc: u16,
    /// URA index (GPS/QZSS/BeiDou) or SISA index (Galileo)
    pub sva: u8,
    // SV health code
    pub sv_health: u16,
    /// Week counter: GPS week (GPS/QZSS), GST week (Galileo), BDT week (BeiDou)
    pub week: u32,
    /// L2 codes (GPS/QZSS) or data sources (Galileo)
    pub code: u16,
    /// L2P data flag (GPS/QZSS)
    pub flag: u8,
    /// Time of ephemeris
    pub toe: Epoch,
    /// Time of clock
    pub toc: Epoch,
    /// Time of ephemeris, in seconds of week
    pub toe_s: f64,
    /// Fit interval [h]
    pub fit_hours: f64,
    /// Square root of semi-major axis [m^1/2]
    pub sqrt_a: f64,
    /// Eccentricity
    pub e: f64,
    /// inclination at reference time [rad]
    pub i0_rad: f64,
    /// longitude of ascending node [rad]
    pub omega_0_rad: f64,
    /// argument of perigee [rad]
    pub omega_rad: f64,
    /// Mean anomaly at reference time [rad]
    pub m0_rad: f64,
    /// Delta n [rad/s]
    pub delta_n_rad_s: f64,
    /// rate of right ascention [rad/s]
    pub omega_dot_rad_s: f64,
    /// rate of inclination [rad/s]
    pub i_dot_rad_s: f64,
    pub crc: f64,
    pub crs: f64,
    pub cuc: f64,
    pub cus: f64,
    pub cic: f64,
    pub cis: f64,
    /// Clock offset [s]
    pub clock_offset: f64,
    /// Clock drift [s/s]
    pub clock_drift: f64,
    /// Clock drift rate [s/s²]
    pub clock_drift_rate: f64,
    /// Group delays [s]: TGD (GPS/QZSS), BGD E5a/E1 and E5b/E1 (Galileo),
    /// TGD1 and TGD2 (BeiDou)
    pub tgd: [f64; 2],
}

impl Ephemeris {
    /// Creates an empty [Ephemeris] for this satellite
    pub fn new(sat: Sat) -> Self {
        let t0 = Epoch::from_gpst_seconds(0.0);
        Self {
            sat,
            iode: 0,
            iodc: 0,
            sva: 0,
            sv_health: 0,
            week: 0,
            code: 0,
            flag: 0,
            toe: t0,
            toc: t0,
            toe_s: 0.0,
            fit_hours: 0.0,
            sqrt_a: 0.0,
            e: 0.0,
            i0_rad: 0.0,
            omega_0_rad: 0.0,
            omega_rad: 0.0,
            m0_rad: 0.0,
            delta_n_rad_s: 0.0,
            omega_dot_rad_s: 0.0,
            i_dot_rad_s: 0.0,
            crc: 0.0,
            crs: 0.0,
            cuc: 0.0,
            cus: 0.0,
            cic: 0.0,
            cis: 0.0,
            clock_offset: 0.0,
            clock_drift: 0.0,
            clock_drift_rate: 0.0,
            tgd: [0.0; 2],
        }
    }

    /// Returns onboard clock (bias [s], drift [s/s], drift rate [s/s²]).
    pub fn sv_clock(&self) -> (f64, f64, f64) {
        (self.clock_offset, self.clock_drift, self.clock_drift_rate)
    }

    /// Returns first group delay as [Duration]
    pub fn tgd(&self) -> Duration {
        Duration::from_seconds(self.tgd[0])
    }

    /// Maximal distance to [Self::toe] for this [Ephemeris] to be used
    pub fn max_age(&self) -> Duration {
        Duration::from_seconds(max_toe_age(self.sat.constellation()))
    }

    /// True if this [Ephemeris] may be used at `t`
    pub fn is_valid(&self, t: Epoch) -> bool {
        (t - self.toe).abs() <= self.max_age()
    }

    /// True if both [Ephemeris] share the same issue of data
    pub(crate) fn same_issue(&self, rhs: &Self) -> bool {
        self.iode == rhs.iode && self.iodc == rhs.iodc
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss_rs::prelude::Constellation;
    #[test]
    fn validity() {
        for (constellation, prn, max_age) in [
            (Constellation::GPS, 1, 7200.0),
            (Constellation::QZSS, 193, 7200.0),
            (Constellation::Galileo, 1, 14400.0),
            (Constellation::BeiDou, 1, 21600.0),
        ] {
            let sat = Sat::new(constellation, prn).unwrap();
            let mut eph = Ephemeris::new(sat);
            eph.toe = Epoch::from_gpst_seconds(1.0E6);
            assert!(eph.is_valid(eph.toe));
            assert!(eph.is_valid(eph.toe + Duration::from_seconds(max_age)));
            assert!(eph.is_valid(eph.toe - Duration::from_seconds(max_age)));
            assert!(!eph.is_valid(eph.toe + Duration::from_seconds(max_age + 1.0)));
        }
    }
}
