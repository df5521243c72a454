//! Broadcast navigation records
use gnss_rs::prelude::Constellation;
use hifitime::Epoch;
use log::warn;

mod ephemeris;
mod glonass;

pub use ephemeris::Ephemeris;
pub use glonass::GlonassEphemeris;

use crate::{constants::Constants, sat::Sat};

/// Number of GLONASS slots
const GLONASS_SLOTS: usize = 27;

/// Maximal distance to ToE [s], per constellation
pub(crate) fn max_toe_age(constellation: Constellation) -> f64 {
    match constellation {
        Constellation::Galileo => 14400.0,
        Constellation::BeiDou => 21600.0,
        Constellation::Glonass => 1800.0,
        _ => 7200.0,
    }
}

/// [Navigation] holds the current broadcast ephemeris of each satellite.
/// Keplerian ephemerides are stored per data set: Galileo I/NAV
/// uses set 0, F/NAV uses set 1. All other constellations use set 0.
#[derive(Debug, Clone)]
pub struct Navigation {
    ephemerides: Vec<[Option<Ephemeris>; 2]>,
    glonass: Vec<Option<GlonassEphemeris>>,
    channels: [Option<i8>; GLONASS_SLOTS],
}

impl Default for Navigation {
    fn default() -> Self {
        Self {
            ephemerides: vec![[None, None]; Sat::MAX],
            glonass: vec![None; GLONASS_SLOTS],
            channels: [None; GLONASS_SLOTS],
        }
    }
}

impl Navigation {
    /// Returns current [Ephemeris] of this satellite, in this data set
    pub fn ephemeris(&self, sat: Sat, set: usize) -> Option<&Ephemeris> {
        self.ephemerides
            .get(sat.index() - 1)
            .and_then(|sets| sets.get(set))
            .and_then(|eph| eph.as_ref())
    }

    /// Returns the [Ephemeris] of this satellite that may be used at `t`,
    /// preferring the one closest to its ToE.
    pub fn ephemeris_at(&self, sat: Sat, t: Epoch) -> Option<&Ephemeris> {
        self.ephemerides
            .get(sat.index() - 1)?
            .iter()
            .flatten()
            .filter(|eph| eph.is_valid(t))
            .min_by(|a, b| {
                let (da, db) = ((t - a.toe).abs(), (t - b.toe).abs());
                da.cmp(&db)
            })
    }

    /// Returns current [GlonassEphemeris] of this satellite
    pub fn glonass_ephemeris(&self, sat: Sat) -> Option<&GlonassEphemeris> {
        if sat.constellation() != Constellation::Glonass {
            return None;
        }
        self.glonass
            .get(sat.prn() as usize - 1)
            .and_then(|geph| geph.as_ref())
    }

    /// Returns frequency channel number of this GLONASS slot,
    /// learned from ephemeris or observation messages.
    pub fn glonass_channel(&self, slot: u8) -> Option<i8> {
        let index = (slot as usize).checked_sub(1)?;
        self.channels.get(index).copied().flatten()
    }

    /// Frequency channel number of this satellite, if it is GLONASS
    pub(crate) fn channel(&self, sat: Sat) -> Option<i8> {
        match sat.constellation() {
            Constellation::Glonass => self.glonass_channel(sat.prn()),
            _ => None,
        }
    }

    /// Declares frequency channel number of this GLONASS slot.
    /// Channels outside -7..=6 are ignored.
    pub fn set_glonass_channel(&mut self, slot: u8, fcn: i8) {
        if !Constants::GLONASS_CHANNELS.contains(&fcn) {
            warn!("R{:02}: invalid frequency channel {}", slot, fcn);
            return;
        }
        if let Some(index) = (slot as usize).checked_sub(1) {
            if let Some(channel) = self.channels.get_mut(index) {
                *channel = Some(fcn);
            }
        }
    }

    /// Stores a new [Ephemeris]. Returns false when an ephemeris with the
    /// same issue of data is already stored, unless `force` is set.
    pub fn update_ephemeris(&mut self, eph: Ephemeris, set: usize, force: bool) -> bool {
        let Some(stored) = self
            .ephemerides
            .get_mut(eph.sat.index() - 1)
            .and_then(|sets| sets.get_mut(set))
        else {
            return false;
        };
        if !force {
            if let Some(prev) = stored {
                if prev.same_issue(&eph) {
                    return false;
                }
            }
        }
        *stored = Some(eph);
        true
    }

    /// Stores a new [GlonassEphemeris]. Returns false when an ephemeris
    /// with the same issue of data is already stored, unless `force` is set,
    /// or when its frequency channel is not within -7..=6.
    pub fn update_glonass(&mut self, geph: GlonassEphemeris, force: bool) -> bool {
        if geph.sat.constellation() != Constellation::Glonass {
            return false;
        }
        if !Constants::GLONASS_CHANNELS.contains(&geph.freq_channel) {
            warn!("{}: invalid frequency channel {}", geph.sat, geph.freq_channel);
            return false;
        }
        let slot = geph.sat.prn();
        self.set_glonass_channel(slot, geph.freq_channel);
        let Some(stored) = self.glonass.get_mut(slot as usize - 1) else {
            return false;
        };
        if !force {
            if let Some(prev) = stored {
                if prev.iode == geph.iode {
                    return false;
                }
            }
        }
        *stored = Some(geph);
        true
    }

    /// Forgets all records
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
