//! Legacy RTK observations: GPS 1001-1004, GLONASS 1009-1012
use gnss_rs::prelude::Constellation;
use hifitime::Duration;
use itertools::Itertools;

use crate::{
    bits::{round_i32, round_u32, BitReader, BitWriter},
    constants::Constants,
    observation::{legacy_lock_indicator, legacy_lock_ms, ObsCode, SignalObservation},
    rtcm3::{msm::Cell, MessageID},
    sat::Sat,
    session::{Message, Session},
    time, Error,
};

const INVALID_PHASE_RANGE: i32 = -524288;
const INVALID_L2_RANGE: i32 = -8192;

/// GPS L2 code indicator
const GPS_L2_CODES: [ObsCode; 4] = [ObsCode::L2X, ObsCode::L2P, ObsCode::L2D, ObsCode::L2W];

/// Raw fields of one satellite
#[derive(Default)]
struct LegacyRecord {
    prn: u8,
    code1: u32,
    fcn: Option<i8>,
    pr1: u32,
    ppr1: i32,
    lock1: u32,
    amb: u32,
    cnr1: u32,
    l2: Option<(u32, i32, i32, u32)>,
    cnr2: u32,
}

fn has_ambiguity(n: u8) -> bool {
    n == 2 || n == 4
}

fn has_l2(n: u8) -> bool {
    n >= 3
}

/// Phase range minus pseudo range [cycles], folded into ±1500 cycles
fn phase_minus_range(phase: f64, range_cycles: f64) -> f64 {
    let mut x = (phase - range_cycles + 1500.0) % 3000.0;
    if x < 0.0 {
        x += 3000.0;
    }
    x - 1500.0
}

impl Session {
    /// Resolves the phase range ambiguity against the previous value
    fn adjust_carrier(&mut self, sat: Sat, freq: usize, cycles: f64) -> f64 {
        let Some(previous) = self
            .carrier
            .get_mut(sat.index() - 1)
            .and_then(|table| table.get_mut(freq))
        else {
            return cycles;
        };
        let cycles = match *previous {
            Some(prev) if cycles < prev - 750.0 => cycles + 1500.0,
            Some(prev) if cycles > prev + 750.0 => cycles - 1500.0,
            _ => cycles,
        };
        *previous = Some(cycles);
        cycles
    }

    /// Decodes legacy RTK observations, `n` being the variant (1 to 4)
    pub(crate) fn decode_legacy(
        &mut self,
        r: &mut BitReader,
        constellation: Constellation,
        n: u8,
    ) -> Result<Option<Message>, Error> {
        let glonass = constellation == Constellation::Glonass;
        let station_id = r.u(12)? as u16;
        let reference = self.reference_time()?;

        let epoch = if glonass {
            let tod = r.u(27)? as f64 * 0.001;
            time::adjust_glonass_tod(reference, tod)
        } else {
            let tow = r.u(30)? as f64 * 0.001;
            time::adjust_tow(reference, tow)
        };
        let sync = r.flag()?;
        let nsat = r.u(5)? as usize;
        let _smoothing = r.flag()?;
        let _smoothing_interval = r.u(3)?;

        let mut records = Vec::with_capacity(nsat);
        for _ in 0..nsat {
            let mut rec = LegacyRecord {
                prn: r.u(6)? as u8,
                code1: r.u(1)?,
                ..Default::default()
            };
            if glonass {
                rec.fcn = Some(r.u(5)? as i8 - 7);
                rec.pr1 = r.u(25)?;
            } else {
                rec.pr1 = r.u(24)?;
            }
            rec.ppr1 = r.s(20)?;
            rec.lock1 = r.u(7)?;
            if has_ambiguity(n) {
                rec.amb = r.u(if glonass { 7 } else { 8 })?;
                rec.cnr1 = r.u(8)?;
            }
            if has_l2(n) {
                let code2 = r.u(2)?;
                let pr21 = r.s(14)?;
                let ppr2 = r.s(20)?;
                let lock2 = r.u(7)?;
                rec.l2 = Some((code2, pr21, ppr2, lock2));
                if n == 4 {
                    rec.cnr2 = r.u(8)?;
                }
            }
            records.push(rec);
        }

        if !self.check_station(station_id)? {
            return Ok(None);
        }

        let unit = if glonass {
            Constants::PRUNIT_GLO
        } else {
            Constants::PRUNIT_GPS
        };

        let mut cells = Vec::with_capacity(2 * nsat);
        let mut channels = Vec::new();
        for rec in records {
            let Some(sat) = Sat::new(constellation, rec.prn) else {
                continue;
            };
            if let Some(fcn) = rec.fcn {
                channels.push((rec.prn, fcn));
            }

            let code1 = if rec.code1 == 0 {
                ObsCode::L1C
            } else {
                ObsCode::L1P
            };
            let pr1 = rec.pr1 as f64 * 0.02 + rec.amb as f64 * unit;

            let mut l1 = SignalObservation::new(code1).with_pseudorange(pr1);
            if let Some(lambda) = code1.wavelength(constellation, rec.fcn) {
                if rec.ppr1 != INVALID_PHASE_RANGE {
                    let cycles = self.adjust_carrier(sat, 0, rec.ppr1 as f64 * 0.0005 / lambda);
                    l1.phase = Some(pr1 / lambda + cycles);
                }
            }
            if rec.cnr1 > 0 {
                l1.snr = Some(rec.cnr1 as f64 * 0.25);
            }
            let lock1 = legacy_lock_ms(rec.lock1);
            l1.lock_time = Duration::from_milliseconds(lock1 as f64);
            cells.push(Cell {
                sat,
                slot: 0,
                signal: l1,
                lock_ms: Some(lock1),
            });

            if let Some((code2, pr21, ppr2, lock2)) = rec.l2 {
                let code2 = if glonass {
                    if code2 == 0 {
                        ObsCode::L2C
                    } else {
                        ObsCode::L2P
                    }
                } else {
                    GPS_L2_CODES[(code2 & 0x03) as usize]
                };
                let mut l2 = SignalObservation::new(code2);
                if pr21 != INVALID_L2_RANGE {
                    l2.pseudorange = Some(pr1 + pr21 as f64 * 0.02);
                }
                if let Some(lambda) = code2.wavelength(constellation, rec.fcn) {
                    if ppr2 != INVALID_PHASE_RANGE {
                        let cycles = self.adjust_carrier(sat, 1, ppr2 as f64 * 0.0005 / lambda);
                        l2.phase = Some(pr1 / lambda + cycles);
                    }
                }
                if rec.cnr2 > 0 {
                    l2.snr = Some(rec.cnr2 as f64 * 0.25);
                }
                let lock2 = legacy_lock_ms(lock2);
                l2.lock_time = Duration::from_milliseconds(lock2 as f64);
                cells.push(Cell {
                    sat,
                    slot: 1,
                    signal: l2,
                    lock_ms: Some(lock2),
                });
            }
        }

        self.commit_observations(epoch, station_id, sync, cells);
        for (slot, fcn) in channels {
            self.nav.set_glonass_channel(slot, fcn);
        }
        Ok(Some(Message::Observation { complete: !sync }))
    }

    /// Encodes legacy RTK observations, `n` being the variant (1 to 4)
    pub(crate) fn encode_legacy(
        &self,
        w: &mut BitWriter,
        constellation: Constellation,
        n: u8,
        sync: bool,
    ) -> Result<(), Error> {
        let glonass = constellation == Constellation::Glonass;
        let msg_type = u16::from(MessageID::LegacyObservation(constellation, n));

        let records = self
            .obs
            .constellation(constellation)
            .filter(|obs| obs.signals[0].is_some())
            .filter(|obs| !glonass || self.nav.channel(obs.sat).is_some())
            .sorted_by_key(|obs| obs.sat)
            .take(31)
            .collect::<Vec<_>>();

        if records.is_empty() {
            return Err(Error::NoData(msg_type));
        }

        let epoch = self.obs.epoch;
        w.u(12, self.station_id as u32);
        if glonass {
            w.u(27, round_u32(time::glonass_tod(epoch) * 1.0E3) % 86_400_000);
        } else {
            let (_, tow) = time::gpst_week_tow(epoch);
            w.u(30, round_u32(tow * 1.0E3) % 604_800_000);
        }
        w.flag(sync);
        w.u(5, records.len() as u32);
        w.flag(false); // smoothing
        w.u(3, 0); // smoothing interval

        let unit = if glonass {
            Constants::PRUNIT_GLO
        } else {
            Constants::PRUNIT_GPS
        };

        for obs in records {
            let fcn = self.nav.channel(obs.sat);
            let l1 = obs.signals[0];
            let l2 = obs.signals[1];

            let mut amb = 0;
            let mut pr1 = 0;
            let mut pr1c = None;
            if let Some(pr) = l1.and_then(|s| s.pseudorange) {
                amb = (pr / unit).floor().max(0.0) as u32;
                pr1 = round_u32((pr - amb as f64 * unit) / 0.02);
                pr1c = Some(pr1 as f64 * 0.02 + amb as f64 * unit);
            }

            let phase_range = |signal: Option<SignalObservation>| -> i32 {
                let value = signal.and_then(|s| {
                    let lambda = s.code.wavelength(constellation, fcn)?;
                    let (pr1c, phase) = (pr1c?, s.phase?);
                    let ppr = phase_minus_range(phase, pr1c / lambda);
                    Some(round_i32(ppr * lambda / 0.0005))
                });
                value
                    .filter(|v| v.abs() < 524288)
                    .unwrap_or(INVALID_PHASE_RANGE)
            };

            let code1 = match l1.map(|s| s.code) {
                Some(ObsCode::L1P | ObsCode::L1W | ObsCode::L1Y) => 1,
                _ => 0,
            };

            w.u(6, obs.sat.prn() as u32);
            w.u(1, code1);
            if glonass {
                w.u(5, fcn.map(|k| (i32::from(k) + 7) as u32).unwrap_or(0));
                w.u(25, pr1);
            } else {
                w.u(24, pr1);
            }
            w.s(20, phase_range(l1));
            w.u(7, legacy_lock_indicator(l1.map(|s| s.lock_ms()).unwrap_or(0)));
            if has_ambiguity(n) {
                if glonass {
                    w.u(7, amb.min(127));
                } else {
                    w.u(8, amb.min(255));
                }
                let cnr = l1.and_then(|s| s.snr).unwrap_or(0.0).max(0.0);
                w.u(8, round_u32(cnr / 0.25).min(255));
            }
            if has_l2(n) {
                let code2 = match (glonass, l2.map(|s| s.code)) {
                    (true, Some(ObsCode::L2P)) => 1,
                    (true, _) => 0,
                    (false, Some(ObsCode::L2P | ObsCode::L2Y)) => 1,
                    (false, Some(ObsCode::L2D)) => 2,
                    (false, Some(ObsCode::L2W)) => 3,
                    (false, _) => 0,
                };
                let pr21 = match (pr1c, l2.and_then(|s| s.pseudorange)) {
                    (Some(pr1c), Some(pr2)) if (pr2 - pr1c).abs() <= 163.82 => {
                        round_i32((pr2 - pr1c) / 0.02)
                    },
                    _ => INVALID_L2_RANGE,
                };
                w.u(2, code2);
                w.s(14, pr21);
                w.s(20, phase_range(l2));
                w.u(7, legacy_lock_indicator(l2.map(|s| s.lock_ms()).unwrap_or(0)));
                if n == 4 {
                    let cnr = l2.and_then(|s| s.snr).unwrap_or(0.0).max(0.0);
                    w.u(8, round_u32(cnr / 0.25).min(255));
                }
            }
        }
        Ok(())
    }
}
