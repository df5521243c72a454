//! Observation records
use hifitime::{Duration, Epoch};
use log::warn;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

mod code;
mod lli;
mod lock;

pub use code::ObsCode;
pub use lli::LliFlags;
pub use lock::{LockState, LockTracker};

pub(crate) use lock::{
    legacy_lock_indicator, legacy_lock_ms, msm_ext_lock_indicator, msm_ext_lock_ms,
    msm_lock_indicator, msm_lock_ms,
};

use crate::{constants::Constants, sat::Sat};

/// Measurements of one signal
#[derive(Debug, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SignalObservation {
    /// Signal and tracking mode
    pub code: ObsCode,
    /// Pseudo range [m]
    pub pseudorange: Option<f64>,
    /// Carrier phase [cycles]
    pub phase: Option<f64>,
    /// Doppler shift [Hz]
    pub doppler: Option<f64>,
    /// Carrier to noise ratio [dB-Hz]
    pub snr: Option<f64>,
    /// Loss of lock indication
    pub lli: LliFlags,
    /// Minimum lock time
    pub lock_time: Duration,
}

impl SignalObservation {
    /// Creates an empty [SignalObservation] for this code
    pub fn new(code: ObsCode) -> Self {
        Self {
            code,
            pseudorange: None,
            phase: None,
            doppler: None,
            snr: None,
            lli: LliFlags::default(),
            lock_time: Duration::ZERO,
        }
    }
    pub fn with_pseudorange(&self, pseudorange: f64) -> Self {
        let mut s = *self;
        s.pseudorange = Some(pseudorange);
        s
    }
    pub fn with_phase(&self, phase: f64) -> Self {
        let mut s = *self;
        s.phase = Some(phase);
        s
    }
    pub fn with_doppler(&self, doppler: f64) -> Self {
        let mut s = *self;
        s.doppler = Some(doppler);
        s
    }
    pub fn with_snr(&self, snr: f64) -> Self {
        let mut s = *self;
        s.snr = Some(snr);
        s
    }
    pub fn with_lock_time(&self, lock_time: Duration) -> Self {
        let mut s = *self;
        s.lock_time = lock_time;
        s
    }
    /// Minimum lock time [ms]
    pub(crate) fn lock_ms(&self) -> u64 {
        let ms = self.lock_time.total_nanoseconds() / 1_000_000;
        ms.max(0) as u64
    }
}

/// Measurements of one satellite at one epoch.
/// Signals are stored in frequency slots (see [ObsCode::slot]),
/// followed by extended slots for signals sharing a frequency.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Observation {
    pub sat: Sat,
    pub signals: [Option<SignalObservation>; Constants::MAX_SIGNALS],
}

impl Observation {
    pub fn new(sat: Sat) -> Self {
        Self {
            sat,
            signals: [None; Constants::MAX_SIGNALS],
        }
    }

    /// Slot this signal would be stored in, if any remains
    pub(crate) fn free_slot(&self, code: ObsCode) -> Option<usize> {
        let slot = code.slot(self.sat.constellation())?;
        if self.signals[slot].is_none() {
            return Some(slot);
        }
        (Constants::NFREQ..Constants::MAX_SIGNALS).find(|i| self.signals[*i].is_none())
    }

    /// Stores a new signal, returns the slot it was stored in.
    /// Returns None when no slot remains.
    pub fn insert(&mut self, signal: SignalObservation) -> Option<usize> {
        if let Some(slot) = self.slot_of(signal.code) {
            self.signals[slot] = Some(signal);
            return Some(slot);
        }
        let slot = self.free_slot(signal.code)?;
        self.signals[slot] = Some(signal);
        Some(slot)
    }

    /// Slot in which this code is currently stored
    pub fn slot_of(&self, code: ObsCode) -> Option<usize> {
        self.signals
            .iter()
            .position(|s| s.map(|s| s.code == code).unwrap_or(false))
    }

    /// Returns [SignalObservation] for this code
    pub fn signal(&self, code: ObsCode) -> Option<&SignalObservation> {
        self.signals
            .iter()
            .flatten()
            .find(|signal| signal.code == code)
    }

    /// Iterates over all stored signals, in slot order
    pub fn signals(&self) -> impl Iterator<Item = &SignalObservation> + '_ {
        self.signals.iter().flatten()
    }

    pub fn is_empty(&self) -> bool {
        self.signals.iter().all(|s| s.is_none())
    }
}

/// [ObservationEpoch] gathers all [Observation]s sharing a timestamp.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObservationEpoch {
    /// Sampling instant, expressed in GPST
    pub epoch: Epoch,
    /// Reference station that produced these observations
    pub station_id: u16,
    /// Records, at most [Constants::MAX_OBS]
    pub records: Vec<Observation>,
}

impl Default for ObservationEpoch {
    fn default() -> Self {
        Self {
            epoch: Epoch::from_gpst_seconds(0.0),
            station_id: 0,
            records: Vec::with_capacity(Constants::MAX_OBS),
        }
    }
}

impl ObservationEpoch {
    /// Starts a new epoch, all records are dropped
    pub(crate) fn restart(&mut self, epoch: Epoch, station_id: u16) {
        self.epoch = epoch;
        self.station_id = station_id;
        self.records.clear();
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns [Observation] of this satellite
    pub fn get(&self, sat: Sat) -> Option<&Observation> {
        self.records.iter().find(|obs| obs.sat == sat)
    }

    /// Returns mutable [Observation] of this satellite, creating it when needed.
    /// Returns None once [Constants::MAX_OBS] records are stored.
    pub(crate) fn get_or_insert(&mut self, sat: Sat) -> Option<&mut Observation> {
        match self.records.iter().position(|obs| obs.sat == sat) {
            Some(index) => self.records.get_mut(index),
            None => {
                if self.records.len() >= Constants::MAX_OBS {
                    warn!("{}: observation epoch is full, {} dropped", self.epoch, sat);
                    return None;
                }
                self.records.push(Observation::new(sat));
                self.records.last_mut()
            },
        }
    }

    /// Iterates over all observations of one constellation
    pub fn constellation(
        &self,
        constellation: gnss_rs::prelude::Constellation,
    ) -> impl Iterator<Item = &Observation> + '_ {
        self.records
            .iter()
            .filter(move |obs| obs.sat.constellation() == constellation)
    }
}
