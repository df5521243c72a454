//! Phase lock continuity tracking
use hifitime::Epoch;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{constants::Constants, sat::Sat};

/// Lock continuity of one (satellite, signal slot) pair
#[derive(Debug, Default, Copy, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LockState {
    /// Last reported minimum lock time [ms]
    pub lock_ms: u64,
    /// Number of loss of lock events
    pub losses: u32,
    /// Last time this pair was observed
    pub last_update: Option<Epoch>,
    /// Last time a loss of lock was declared
    pub last_slip: Option<Epoch>,
}

/// [LockTracker] correlates successive observations of each
/// satellite and signal slot, to detect loss of lock.
/// The table is allocated once and survives across frames.
#[derive(Debug, Clone)]
pub struct LockTracker {
    states: Vec<LockState>,
}

impl Default for LockTracker {
    fn default() -> Self {
        Self {
            states: vec![LockState::default(); Sat::MAX * Constants::MAX_SIGNALS],
        }
    }
}

impl LockTracker {
    fn offset(sat: Sat, slot: usize) -> Option<usize> {
        if slot < Constants::MAX_SIGNALS {
            Some((sat.index() - 1) * Constants::MAX_SIGNALS + slot)
        } else {
            None
        }
    }

    /// Returns [LockState] of this (satellite, signal slot) pair
    pub fn state(&self, sat: Sat, slot: usize) -> Option<&LockState> {
        Self::offset(sat, slot).and_then(|offset| self.states.get(offset))
    }

    /// Number of loss of lock events, for this (satellite, signal slot) pair
    pub fn losses(&self, sat: Sat, slot: usize) -> u32 {
        self.state(sat, slot).map(|st| st.losses).unwrap_or(0)
    }

    /// Updates the tracker with a new minimum lock time [ms].
    /// Returns true when loss of lock is declared: the lock time decreased,
    /// or remained null.
    pub fn update(&mut self, sat: Sat, slot: usize, lock_ms: u64, t: Epoch) -> bool {
        let Some(state) = Self::offset(sat, slot).and_then(|offset| self.states.get_mut(offset))
        else {
            return false;
        };
        let slip = lock_ms < state.lock_ms || (lock_ms == 0 && state.lock_ms == 0);
        if slip {
            state.losses = state.losses.saturating_add(1);
            state.last_slip = Some(t);
        }
        state.lock_ms = lock_ms;
        state.last_update = Some(t);
        slip
    }

    /// Forgets all states
    pub fn reset(&mut self) {
        for state in self.states.iter_mut() {
            *state = LockState::default();
        }
    }
}

/// Decodes the 4 bit MSM lock time indicator (DF402) into [ms]
pub(crate) fn msm_lock_ms(indicator: u32) -> u64 {
    match indicator {
        0 => 0,
        i => 1_u64 << (i.min(15) + 4),
    }
}

/// Encodes a lock time [ms] into the 4 bit MSM indicator (DF402)
pub(crate) fn msm_lock_indicator(lock_ms: u64) -> u32 {
    if lock_ms < 32 {
        0
    } else {
        (lock_ms.ilog2() - 4).min(15)
    }
}

/// Decodes the 10 bit extended MSM lock time indicator (DF407) into [ms]
pub(crate) fn msm_ext_lock_ms(indicator: u32) -> u64 {
    let i = indicator.min(704) as u64;
    if i < 64 {
        i
    } else {
        let b = i / 32 - 1;
        (i << b) - (b << (b + 5))
    }
}

/// Encodes a lock time [ms] into the 10 bit extended MSM indicator (DF407)
pub(crate) fn msm_ext_lock_indicator(lock_ms: u64) -> u32 {
    if lock_ms < 64 {
        return lock_ms as u32;
    }
    let b = lock_ms.ilog2() as u64 - 5;
    if b >= 21 {
        704
    } else {
        ((lock_ms + (b << (b + 5))) >> b) as u32
    }
}

/// Decodes the 7 bit legacy lock time indicator (DF013) into [ms]
pub(crate) fn legacy_lock_ms(indicator: u32) -> u64 {
    let i = indicator as u64;
    let seconds = match i {
        0..=23 => i,
        24..=47 => 2 * i - 24,
        48..=71 => 4 * i - 120,
        72..=95 => 8 * i - 408,
        96..=119 => 16 * i - 1176,
        120..=126 => 32 * i - 3096,
        _ => 937,
    };
    seconds * 1000
}

/// Encodes a lock time [ms] into the 7 bit legacy indicator (DF013)
pub(crate) fn legacy_lock_indicator(lock_ms: u64) -> u32 {
    let t = lock_ms / 1000;
    let indicator = match t {
        0..=23 => t,
        24..=71 => (t + 24) / 2,
        72..=167 => (t + 120) / 4,
        168..=359 => (t + 408) / 8,
        360..=743 => (t + 1176) / 16,
        744..=936 => (t + 3096) / 32,
        _ => 127,
    };
    indicator as u32
}

#[cfg(test)]
mod test {
    use super::*;
    use gnss_rs::prelude::Constellation;
    #[test]
    fn msm_indicators() {
        for (indicator, ms) in [(0, 0), (1, 32), (2, 64), (10, 16384), (15, 524288)] {
            assert_eq!(msm_lock_ms(indicator), ms);
            assert_eq!(msm_lock_indicator(ms), indicator);
        }
        assert_eq!(msm_lock_indicator(31), 0);
        assert_eq!(msm_lock_indicator(100), 2);
        assert_eq!(msm_lock_indicator(1 << 30), 15);
    }

    #[test]
    fn extended_msm_indicators() {
        for (indicator, ms) in [(0, 0), (63, 63), (64, 64), (96, 128), (704, 67108864)] {
            assert_eq!(msm_ext_lock_ms(indicator), ms);
            assert_eq!(msm_ext_lock_indicator(ms), indicator);
        }
        for indicator in 0..=704 {
            let ms = msm_ext_lock_ms(indicator);
            assert_eq!(msm_ext_lock_indicator(ms), indicator);
        }
        assert_eq!(msm_ext_lock_indicator(1 << 40), 704);
    }

    #[test]
    fn legacy_indicators() {
        for (indicator, seconds) in [(0, 0), (23, 23), (24, 24), (48, 72), (127, 937)] {
            assert_eq!(legacy_lock_ms(indicator), seconds * 1000);
            assert_eq!(legacy_lock_indicator(seconds * 1000), indicator);
        }
        for indicator in 0..=127 {
            let ms = legacy_lock_ms(indicator);
            assert_eq!(legacy_lock_indicator(ms), indicator);
        }
    }

    #[test]
    fn loss_of_lock() {
        let mut tracker = LockTracker::default();
        let sat = Sat::new(Constellation::GPS, 5).unwrap();
        let t0 = Epoch::from_gpst_seconds(0.0);

        assert!(!tracker.update(sat, 0, 32, t0));
        assert!(!tracker.update(sat, 0, 64, t0));
        assert!(!tracker.update(sat, 0, 64, t0));
        assert_eq!(tracker.losses(sat, 0), 0);

        // decreasing lock time
        assert!(tracker.update(sat, 0, 32, t0));
        assert_eq!(tracker.losses(sat, 0), 1);
        assert_eq!(tracker.state(sat, 0).unwrap().last_slip, Some(t0));

        // null lock time, twice
        assert!(tracker.update(sat, 0, 0, t0));
        assert!(tracker.update(sat, 0, 0, t0));
        assert_eq!(tracker.losses(sat, 0), 3);

        // other slots are independent
        assert_eq!(tracker.losses(sat, 1), 0);
        assert!(tracker.state(sat, Constants::MAX_SIGNALS).is_none());

        tracker.reset();
        assert_eq!(tracker.losses(sat, 0), 0);
    }
}
