//! Multiple Signal Messages (MSM1 to MSM7)
use gnss_rs::prelude::Constellation;
use hifitime::{Duration, Epoch};
use itertools::Itertools;
use log::warn;

use crate::{
    bits::{round_i32, round_u32, BitReader, BitWriter},
    constants::{Constants, P2_10, P2_24, P2_29, P2_31},
    observation::{
        msm_ext_lock_indicator, msm_ext_lock_ms, msm_lock_indicator, msm_lock_ms, LliFlags,
        ObsCode, SignalObservation,
    },
    rtcm3::MsmKind,
    sat::Sat,
    session::{Message, Session},
    time, Error,
};

/// Signal ID (1..=32) to observation code, per constellation
const GPS_SIGNALS: [&str; 32] = [
    "", "1C", "1P", "1W", "", "", "", "2C", "2P", "2W", "", "", "", "", "2S", "2L", "2X", "", "",
    "", "", "5I", "5Q", "5X", "", "", "", "", "", "1S", "1L", "1X",
];

const GLONASS_SIGNALS: [&str; 32] = [
    "", "1C", "1P", "", "", "", "", "2C", "2P", "", "", "", "", "", "", "", "", "", "", "", "", "",
    "", "", "", "", "", "", "", "", "", "",
];

const GALILEO_SIGNALS: [&str; 32] = [
    "", "1C", "1A", "1B", "1X", "1Z", "", "6C", "6A", "6B", "6X", "6Z", "", "7I", "7Q", "7X", "",
    "8I", "8Q", "8X", "", "5I", "5Q", "5X", "", "", "", "", "", "", "", "",
];

const QZSS_SIGNALS: [&str; 32] = [
    "", "1C", "", "", "", "", "", "", "6S", "6L", "6X", "", "", "", "2S", "2L", "2X", "", "", "",
    "", "5I", "5Q", "5X", "", "", "", "", "", "1S", "1L", "1X",
];

const BEIDOU_SIGNALS: [&str; 32] = [
    "", "2I", "2Q", "2X", "", "", "", "6I", "6Q", "6X", "", "", "", "7I", "7Q", "7X", "", "", "",
    "", "", "5D", "5P", "5X", "7D", "", "", "", "", "1D", "1P", "1X",
];

fn signal_table(constellation: Constellation) -> Option<&'static [&'static str; 32]> {
    match constellation {
        Constellation::GPS => Some(&GPS_SIGNALS),
        Constellation::Glonass => Some(&GLONASS_SIGNALS),
        Constellation::Galileo => Some(&GALILEO_SIGNALS),
        Constellation::QZSS => Some(&QZSS_SIGNALS),
        Constellation::BeiDou => Some(&BEIDOU_SIGNALS),
        _ => None,
    }
}

/// Observation code of this MSM signal ID (1..=32)
pub(crate) fn signal_code(constellation: Constellation, id: u8) -> Option<ObsCode> {
    let table = signal_table(constellation)?;
    let code = table.get((id as usize).checked_sub(1)?)?;
    code.parse::<ObsCode>().ok()
}

/// MSM signal ID (1..=32) of this observation code
pub(crate) fn signal_id(constellation: Constellation, code: ObsCode) -> Option<u8> {
    let table = signal_table(constellation)?;
    table
        .iter()
        .position(|s| *s == code.as_str())
        .map(|index| index as u8 + 1)
}

/// PRN (RTCM numbering) to satellite mask position (1..=64)
fn mask_position(sat: Sat) -> u8 {
    match sat.constellation() {
        Constellation::QZSS => sat.prn() - 192,
        _ => sat.prn(),
    }
}

fn mask_satellite(constellation: Constellation, position: u8) -> Option<Sat> {
    match constellation {
        Constellation::QZSS => Sat::new(constellation, position.checked_add(192)?),
        _ => Sat::new(constellation, position),
    }
}

/// One decoded cell, prior to commit
pub(super) struct Cell {
    pub sat: Sat,
    pub slot: usize,
    pub signal: SignalObservation,
    pub lock_ms: Option<u64>,
}

/// Assigns a storage slot to each signal of the message:
/// first signal of a frequency takes the frequency slot,
/// others take the extended slots.
fn signal_slots(constellation: Constellation, codes: &[Option<ObsCode>]) -> Vec<Option<usize>> {
    let mut used = [false; Constants::MAX_SIGNALS];
    codes
        .iter()
        .map(|code| {
            let code = (*code)?;
            let slot = match code.slot(constellation) {
                Some(slot) if !used[slot] => Some(slot),
                _ => (Constants::NFREQ..Constants::MAX_SIGNALS).find(|i| !used[*i]),
            };
            match slot {
                Some(slot) => {
                    used[slot] = true;
                    Some(slot)
                },
                None => {
                    warn!("msm: no slot left for {} {}", constellation, code);
                    None
                },
            }
        })
        .collect()
}

impl Session {
    /// Decodes MSM1 to MSM7 messages
    pub(crate) fn decode_msm(
        &mut self,
        r: &mut BitReader,
        constellation: Constellation,
        kind: MsmKind,
    ) -> Result<Option<Message>, Error> {
        let station_id = r.u(12)? as u16;
        let reference = self.reference_time()?;

        let epoch = match constellation {
            Constellation::Glonass => {
                let _dow = r.u(3)?;
                let tod = r.u(27)? as f64 * 0.001;
                time::adjust_glonass_tod(reference, tod)
            },
            Constellation::BeiDou => {
                let tow = r.u(30)? as f64 * 0.001 + Constants::BDT_GPST_OFFSET;
                time::adjust_tow(reference, tow)
            },
            _ => {
                let tow = r.u(30)? as f64 * 0.001;
                time::adjust_tow(reference, tow)
            },
        };

        let sync = r.flag()?;
        let _iods = r.u(3)?;
        r.skip(7)?;
        let _clock_steering = r.u(2)?;
        let _external_clock = r.u(2)?;
        let _smoothing = r.flag()?;
        let _smoothing_interval = r.u(3)?;

        let mut sats = Vec::with_capacity(64);
        for position in 1..=64_u8 {
            if r.flag()? {
                sats.push(position);
            }
        }
        let mut signals = Vec::with_capacity(32);
        for id in 1..=32_u8 {
            if r.flag()? {
                signals.push(id);
            }
        }

        let (nsat, nsig) = (sats.len(), signals.len());
        if nsat * nsig > 64 || r.ensure(nsat * nsig).is_err() {
            return Err(Error::MsmMaskInconsistency);
        }
        let mut cells = Vec::with_capacity(nsat * nsig);
        for _ in 0..nsat * nsig {
            cells.push(r.flag()?);
        }
        let ncell = cells.iter().filter(|c| **c).count();

        // satellite data
        let mut int_ms = vec![None; nsat];
        let mut ext_info = vec![None; nsat];
        let mut rough = vec![None; nsat];
        let mut rough_rate = vec![None; nsat];

        if kind.has_integer_ms() {
            for value in int_ms.iter_mut() {
                *value = match r.u(8)? {
                    255 => None,
                    ms => Some(ms),
                };
            }
        }
        if kind.has_rates() {
            for value in ext_info.iter_mut() {
                *value = Some(r.u(4)?);
            }
        }
        for (i, value) in rough.iter_mut().enumerate() {
            let modulo = r.u(10)? as f64 * P2_10;
            *value = if kind.has_integer_ms() {
                int_ms[i].map(|ms| ms as f64 + modulo)
            } else {
                Some(modulo)
            };
        }
        if kind.has_rates() {
            for value in rough_rate.iter_mut() {
                *value = match r.s(14)? {
                    -8192 => None,
                    rate => Some(rate as f64),
                };
            }
        }

        // signal data
        let mut fine_pr = vec![None; ncell];
        let mut fine_cp = vec![None; ncell];
        let mut lock = vec![None; ncell];
        let mut half = vec![false; ncell];
        let mut cnr = vec![None; ncell];
        let mut fine_rate = vec![None; ncell];

        if kind.has_pseudorange() {
            for value in fine_pr.iter_mut() {
                *value = if kind.is_extended() {
                    match r.s(20)? {
                        -524288 => None,
                        pr => Some(pr as f64 * P2_29),
                    }
                } else {
                    match r.s(15)? {
                        -16384 => None,
                        pr => Some(pr as f64 * P2_24),
                    }
                };
            }
        }
        if kind.has_phase() {
            for value in fine_cp.iter_mut() {
                *value = if kind.is_extended() {
                    match r.s(24)? {
                        -8388608 => None,
                        cp => Some(cp as f64 * P2_31),
                    }
                } else {
                    match r.s(22)? {
                        -2097152 => None,
                        cp => Some(cp as f64 * P2_29),
                    }
                };
            }
            for value in lock.iter_mut() {
                *value = if kind.is_extended() {
                    Some(msm_ext_lock_ms(r.u(10)?))
                } else {
                    Some(msm_lock_ms(r.u(4)?))
                };
            }
            for value in half.iter_mut() {
                *value = r.flag()?;
            }
        }
        if kind.has_cnr() {
            for value in cnr.iter_mut() {
                let snr = if kind.is_extended() {
                    r.u(10)? as f64 * 0.0625
                } else {
                    r.u(6)? as f64
                };
                *value = if snr > 0.0 { Some(snr) } else { None };
            }
        }
        if kind.has_rates() {
            for value in fine_rate.iter_mut() {
                *value = match r.s(15)? {
                    -16384 => None,
                    rate => Some(rate as f64 * 0.0001),
                };
            }
        }

        let codes = signals
            .iter()
            .map(|id| signal_code(constellation, *id))
            .collect::<Vec<_>>();
        let slots = signal_slots(constellation, &codes);

        // reconstruct
        let mut decoded = Vec::<Cell>::with_capacity(ncell);
        let mut channels = Vec::<(u8, i8)>::new();
        let mut j = 0;
        for (i, position) in sats.iter().enumerate() {
            let sat = mask_satellite(constellation, *position);
            let fcn = match sat {
                Some(sat) if constellation == Constellation::Glonass => {
                    match ext_info[i] {
                        Some(ext) if ext <= 13 => {
                            let fcn = ext as i8 - 7;
                            channels.push((sat.prn(), fcn));
                            Some(fcn)
                        },
                        _ => self.nav.channel(sat),
                    }
                },
                _ => None,
            };
            for k in 0..nsig {
                if !cells[i * nsig + k] {
                    continue;
                }
                let cell = j;
                j += 1;
                let (Some(sat), Some(code), Some(slot)) = (sat, codes[k], slots[k]) else {
                    continue;
                };
                let lambda = code.wavelength(constellation, fcn);
                let mut signal = SignalObservation::new(code);
                if let (Some(rough), Some(fine)) = (rough[i], fine_pr[cell]) {
                    signal.pseudorange = Some((rough + fine) * Constants::RANGE_MS);
                }
                if let (Some(rough), Some(fine), Some(lambda)) = (rough[i], fine_cp[cell], lambda)
                {
                    signal.phase = Some((rough + fine) * Constants::RANGE_MS / lambda);
                }
                if let (Some(rate), Some(fine), Some(lambda)) =
                    (rough_rate[i], fine_rate[cell], lambda)
                {
                    signal.doppler = Some(-(rate + fine) / lambda);
                }
                signal.snr = cnr[cell];
                if let Some(lock_ms) = lock[cell] {
                    signal.lock_time = Duration::from_milliseconds(lock_ms as f64);
                }
                if half[cell] {
                    signal.lli |= LliFlags::HALF_CYCLE_SLIP;
                }
                decoded.push(Cell {
                    sat,
                    slot,
                    signal,
                    lock_ms: lock[cell],
                });
            }
        }

        if !self.check_station(station_id)? {
            return Ok(None);
        }

        // commit
        self.commit_observations(epoch, station_id, sync, decoded);
        for (slot, fcn) in channels {
            self.nav.set_glonass_channel(slot, fcn);
        }
        self.msm_signals
            .insert(constellation, codes.into_iter().flatten().collect());

        Ok(Some(Message::Observation { complete: !sync }))
    }

    /// Stores a validated set of observations
    pub(super) fn commit_observations(
        &mut self,
        epoch: Epoch,
        station_id: u16,
        sync: bool,
        cells: Vec<Cell>,
    ) {
        if self.obs_complete || self.obs.epoch != epoch {
            self.obs.restart(epoch, station_id);
        }
        self.obs_complete = false;
        self.set_time(epoch);
        for mut cell in cells {
            if let Some(lock_ms) = cell.lock_ms {
                if self.lock.update(cell.sat, cell.slot, lock_ms, epoch) {
                    cell.signal.lli |= LliFlags::LOCK_LOSS;
                }
            }
            if let Some(obs) = self.obs.get_or_insert(cell.sat) {
                obs.signals[cell.slot] = Some(cell.signal);
            }
        }
        self.obs_complete = !sync;
    }

    /// Encodes MSM1 to MSM7 messages, from the current observation epoch
    pub(crate) fn encode_msm(
        &self,
        w: &mut BitWriter,
        constellation: Constellation,
        kind: MsmKind,
        sync: bool,
    ) -> Result<(), Error> {
        let msg_type = u16::from(super::MessageID::Msm(constellation, kind));

        let records = self
            .obs
            .constellation(constellation)
            .filter(|obs| (1..=64).contains(&mask_position(obs.sat)))
            .map(|obs| {
                let signals = obs
                    .signals()
                    .filter_map(|s| signal_id(constellation, s.code).map(|id| (id, s)))
                    .collect::<Vec<_>>();
                (mask_position(obs.sat), obs.sat, signals)
            })
            .filter(|(_, _, signals)| !signals.is_empty())
            .sorted_by_key(|(position, _, _)| *position)
            .dedup_by(|a, b| a.0 == b.0)
            .collect::<Vec<_>>();

        let signals = records
            .iter()
            .flat_map(|(_, _, signals)| signals.iter().map(|(id, _)| *id))
            .sorted()
            .dedup()
            .collect::<Vec<_>>();

        let nsig = signals.len();
        if records.is_empty() || nsig == 0 {
            return Err(Error::NoData(msg_type));
        }

        let mut records = records;
        if records.len() * nsig > 64 {
            warn!("msm {}: too many cells, satellites dropped", msg_type);
            records.truncate(64 / nsig);
        }

        // header
        let epoch = self.obs.epoch;
        w.u(12, self.station_id as u32);
        match constellation {
            Constellation::Glonass => {
                let tod = round_u32(time::glonass_tod(epoch) * 1.0E3) % 86_400_000;
                w.u(3, time::glonass_dow(epoch));
                w.u(27, tod);
            },
            Constellation::BeiDou => {
                let (_, tow) = time::bdt_week_tow(epoch);
                w.u(30, round_u32(tow * 1.0E3) % 604_800_000);
            },
            _ => {
                let (_, tow) = time::gpst_week_tow(epoch);
                w.u(30, round_u32(tow * 1.0E3) % 604_800_000);
            },
        }
        w.flag(sync);
        w.u(3, 0); // iods
        w.u(7, 0);
        w.u(2, 0); // clock steering
        w.u(2, 0); // external clock
        w.flag(false); // smoothing
        w.u(3, 0); // smoothing interval

        for position in 1..=64_u8 {
            w.flag(records.iter().any(|(p, _, _)| *p == position));
        }
        for id in 1..=32_u8 {
            w.flag(signals.contains(&id));
        }
        for (_, _, sat_signals) in records.iter() {
            for id in signals.iter() {
                w.flag(sat_signals.iter().any(|(sid, _)| sid == id));
            }
        }

        // satellite data
        struct SatData {
            units: Option<u32>,
            rate: Option<i32>,
            fcn: Option<i8>,
        }

        let sat_data = records
            .iter()
            .map(|(_, sat, sat_signals)| {
                let fcn = self.nav.channel(*sat);
                let units = sat_signals
                    .iter()
                    .find_map(|(_, s)| s.pseudorange)
                    .map(|pr| round_u32(pr / Constants::RANGE_MS / P2_10));
                let rate = sat_signals.iter().find_map(|(_, s)| {
                    let lambda = s.code.wavelength(constellation, fcn)?;
                    s.doppler.map(|d| round_i32(-d * lambda))
                });
                SatData {
                    units: units.filter(|u| !kind.has_integer_ms() || *u >> 10 < 255),
                    rate: rate.filter(|r| r.abs() <= 8191),
                    fcn,
                }
            })
            .collect::<Vec<_>>();

        if kind.has_integer_ms() {
            for data in sat_data.iter() {
                let int_ms = data.units.map(|u| u >> 10).filter(|ms| *ms < 255);
                w.u(8, int_ms.unwrap_or(255));
            }
        }
        if kind.has_rates() {
            for data in sat_data.iter() {
                let info = match constellation {
                    Constellation::Glonass => {
                        data.fcn.map(|k| (i32::from(k) + 7) as u32).unwrap_or(15)
                    },
                    _ => 0,
                };
                w.u(4, info);
            }
        }
        for data in sat_data.iter() {
            w.u(10, data.units.map(|u| u & 0x3ff).unwrap_or(0));
        }
        if kind.has_rates() {
            for data in sat_data.iter() {
                w.s(14, data.rate.unwrap_or(-8192));
            }
        }

        // signal data
        let mut cells = Vec::with_capacity(64);
        for (i, (_, _, sat_signals)) in records.iter().enumerate() {
            for id in signals.iter() {
                if let Some((_, signal)) = sat_signals.iter().find(|(sid, _)| sid == id) {
                    cells.push((i, *signal));
                }
            }
        }

        let rough_m = |i: usize| -> Option<f64> {
            let units = sat_data[i].units?;
            Some(units as f64 * P2_10 * Constants::RANGE_MS)
        };

        if kind.has_pseudorange() {
            for (i, signal) in cells.iter() {
                let fine = match (rough_m(*i), signal.pseudorange) {
                    (Some(rough), Some(pr)) => Some((pr - rough) / Constants::RANGE_MS),
                    _ => None,
                };
                if kind.is_extended() {
                    let value = fine.map(|ms| round_i32(ms / P2_29)).filter(|v| v.abs() < 524288);
                    w.s(20, value.unwrap_or(-524288));
                } else {
                    let value = fine.map(|ms| round_i32(ms / P2_24)).filter(|v| v.abs() < 16384);
                    w.s(15, value.unwrap_or(-16384));
                }
            }
        }
        if kind.has_phase() {
            for (i, signal) in cells.iter() {
                let fcn = sat_data[*i].fcn;
                let lambda = signal.code.wavelength(constellation, fcn);
                let fine = match (rough_m(*i), signal.phase, lambda) {
                    (Some(rough), Some(cp), Some(lambda)) => {
                        Some((cp * lambda - rough) / Constants::RANGE_MS)
                    },
                    _ => None,
                };
                if kind.is_extended() {
                    let value = fine.map(|ms| round_i32(ms / P2_31)).filter(|v| v.abs() < 8388608);
                    w.s(24, value.unwrap_or(-8388608));
                } else {
                    let value = fine.map(|ms| round_i32(ms / P2_29)).filter(|v| v.abs() < 2097152);
                    w.s(22, value.unwrap_or(-2097152));
                }
            }
            for (_, signal) in cells.iter() {
                if kind.is_extended() {
                    w.u(10, msm_ext_lock_indicator(signal.lock_ms()));
                } else {
                    w.u(4, msm_lock_indicator(signal.lock_ms()));
                }
            }
            for (_, signal) in cells.iter() {
                w.flag(signal.lli.intersects(LliFlags::HALF_CYCLE_SLIP));
            }
        }
        if kind.has_cnr() {
            for (_, signal) in cells.iter() {
                let snr = signal.snr.unwrap_or(0.0).max(0.0);
                if kind.is_extended() {
                    w.u(10, round_u32(snr / 0.0625).min(1023));
                } else {
                    w.u(6, round_u32(snr).min(63));
                }
            }
        }
        if kind.has_rates() {
            for (i, signal) in cells.iter() {
                let fcn = sat_data[*i].fcn;
                let lambda = signal.code.wavelength(constellation, fcn);
                let value = match (sat_data[*i].rate, signal.doppler, lambda) {
                    (Some(rate), Some(doppler), Some(lambda)) => {
                        Some(round_i32((-doppler * lambda - rate as f64) / 0.0001))
                    },
                    _ => None,
                };
                w.s(15, value.filter(|v| v.abs() < 16384).unwrap_or(-16384));
            }
        }
        Ok(())
    }
}
