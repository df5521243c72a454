//! State Space Representation messages
use gnss_rs::prelude::Constellation;
use hifitime::Epoch;
use itertools::Itertools;

use crate::{
    bits::{round_i32, round_u32, BitReader, BitWriter},
    constants::Constants,
    observation::ObsCode,
    rtcm3::{MessageID, SsrKind},
    sat::Sat,
    session::{Message, Session},
    ssr::{PhaseBias, SsrCategory, SsrCorrection, SsrEpoch},
    time, Error,
};

/// SSR signal and tracking mode identifiers, per constellation
const GPS_SSR_SIGNALS: &[&str] = &[
    "1C", "1P", "1W", "1Y", "1M", "2C", "2D", "2S", "2L", "2X", "2P", "2W", "2Y", "2M", "5I", "5Q",
    "5X", "1S", "1L", "1X",
];

const GLONASS_SSR_SIGNALS: &[&str] = &[
    "1C", "1P", "2C", "2P", "4A", "4B", "4X", "6A", "6B", "6X", "3I", "3Q", "3X",
];

const GALILEO_SSR_SIGNALS: &[&str] = &[
    "1A", "1B", "1C", "1X", "1Z", "5I", "5Q", "5X", "7I", "7Q", "7X", "8I", "8Q", "8X", "6A", "6B",
    "6C", "6X", "6Z",
];

const QZSS_SSR_SIGNALS: &[&str] = &[
    "1C", "1S", "1L", "2S", "2L", "2X", "5I", "5Q", "5X", "6S", "6L", "6X", "1X",
];

const BEIDOU_SSR_SIGNALS: &[&str] = &["2I", "2Q", "2X", "6I", "6Q", "6X", "7I", "7Q", "7X"];

fn ssr_signals(constellation: Constellation) -> &'static [&'static str] {
    match constellation {
        Constellation::GPS => GPS_SSR_SIGNALS,
        Constellation::Glonass => GLONASS_SSR_SIGNALS,
        Constellation::Galileo => GALILEO_SSR_SIGNALS,
        Constellation::QZSS => QZSS_SSR_SIGNALS,
        Constellation::BeiDou => BEIDOU_SSR_SIGNALS,
        _ => &[],
    }
}

fn ssr_code(constellation: Constellation, mode: u32) -> Option<ObsCode> {
    ssr_signals(constellation)
        .get(mode as usize)?
        .parse::<ObsCode>()
        .ok()
}

fn ssr_mode(constellation: Constellation, code: ObsCode) -> Option<u32> {
    ssr_signals(constellation)
        .iter()
        .position(|s| *s == code.as_str())
        .map(|mode| mode as u32)
}

/// Satellite field layout
struct SatLayout {
    /// PRN bits
    np: usize,
    /// IODE bits
    ni: usize,
    /// IODCRC bits
    nj: usize,
    /// PRN offset
    offp: u8,
    /// Number of satellites bits
    ns: usize,
}

fn sat_layout(constellation: Constellation) -> SatLayout {
    match constellation {
        Constellation::Glonass => SatLayout {
            np: 5,
            ni: 8,
            nj: 0,
            offp: 0,
            ns: 6,
        },
        Constellation::Galileo => SatLayout {
            np: 6,
            ni: 10,
            nj: 0,
            offp: 0,
            ns: 6,
        },
        Constellation::QZSS => SatLayout {
            np: 4,
            ni: 8,
            nj: 0,
            offp: 192,
            ns: 4,
        },
        Constellation::BeiDou => SatLayout {
            np: 6,
            ni: 10,
            nj: 24,
            offp: 1,
            ns: 6,
        },
        _ => SatLayout {
            np: 6,
            ni: 8,
            nj: 0,
            offp: 0,
            ns: 6,
        },
    }
}

/// Common SSR header
#[derive(Debug, Clone, Copy)]
struct SsrHeader {
    epoch: Epoch,
    udi: u8,
    reference_datum: bool,
    iod: u8,
    provider_id: u16,
    solution_id: u8,
    dispersive_bias: bool,
    mw_consistency: bool,
    nsat: usize,
}

/// Carries the reference datum bit
fn has_datum(kind: SsrKind) -> bool {
    matches!(kind, SsrKind::Orbit | SsrKind::Combined)
}

/// Categories updated by this message
fn categories(kind: SsrKind) -> &'static [SsrCategory] {
    match kind {
        SsrKind::Orbit => &[SsrCategory::Orbit],
        SsrKind::Clock => &[SsrCategory::Clock],
        SsrKind::Combined => &[SsrCategory::Orbit, SsrCategory::Clock],
        SsrKind::HighRateClock => &[SsrCategory::HighRateClock],
        SsrKind::Ura => &[SsrCategory::Ura],
        SsrKind::CodeBias => &[SsrCategory::CodeBias],
        SsrKind::PhaseBias => &[SsrCategory::PhaseBias],
    }
}

/// Corrections of one satellite, gathered before being committed
#[derive(Debug, Default)]
struct SsrRecord {
    iode: Option<(u16, u32)>,
    orbit: Option<([f64; 3], [f64; 3])>,
    clock: Option<[f64; 3]>,
    ura: Option<u8>,
    high_rate_clock: Option<f64>,
    code_biases: Option<Vec<(ObsCode, f64)>>,
    yaw: Option<(f64, f64)>,
    phase_biases: Option<Vec<(ObsCode, PhaseBias)>>,
}

fn read_orbit(r: &mut BitReader) -> Result<([f64; 3], [f64; 3]), Error> {
    let radial = r.s(22)? as f64 * 1.0E-4;
    let along = r.s(20)? as f64 * 4.0E-4;
    let cross = r.s(20)? as f64 * 4.0E-4;
    let radial_rate = r.s(21)? as f64 * 1.0E-6;
    let along_rate = r.s(19)? as f64 * 4.0E-6;
    let cross_rate = r.s(19)? as f64 * 4.0E-6;
    Ok((
        [radial, along, cross],
        [radial_rate, along_rate, cross_rate],
    ))
}

fn write_orbit(w: &mut BitWriter, ssr: &SsrCorrection) {
    w.s(22, round_i32(ssr.orbit[0] / 1.0E-4));
    w.s(20, round_i32(ssr.orbit[1] / 4.0E-4));
    w.s(20, round_i32(ssr.orbit[2] / 4.0E-4));
    w.s(21, round_i32(ssr.orbit_rate[0] / 1.0E-6));
    w.s(19, round_i32(ssr.orbit_rate[1] / 4.0E-6));
    w.s(19, round_i32(ssr.orbit_rate[2] / 4.0E-6));
}

fn read_clock(r: &mut BitReader) -> Result<[f64; 3], Error> {
    Ok([
        r.s(22)? as f64 * 1.0E-4,
        r.s(21)? as f64 * 1.0E-6,
        r.s(27)? as f64 * 2.0E-8,
    ])
}

fn write_clock(w: &mut BitWriter, ssr: &SsrCorrection) {
    w.s(22, round_i32(ssr.clock[0] / 1.0E-4));
    w.s(21, round_i32(ssr.clock[1] / 1.0E-6));
    w.s(27, round_i32(ssr.clock[2] / 2.0E-8));
}

impl Session {
    fn decode_ssr_header(
        &self,
        r: &mut BitReader,
        kind: SsrKind,
        constellation: Constellation,
    ) -> Result<SsrHeader, Error> {
        let reference = self.reference_time()?;
        let epoch = match constellation {
            Constellation::Glonass => time::adjust_glonass_tod(reference, r.u(17)? as f64),
            Constellation::BeiDou => {
                time::adjust_tow(reference, r.u(20)? as f64 + Constants::BDT_GPST_OFFSET)
            },
            _ => time::adjust_tow(reference, r.u(20)? as f64),
        };
        let udi = r.u(4)? as u8;
        r.skip(1)?; // multiple message
        let reference_datum = if has_datum(kind) { r.flag()? } else { false };
        let iod = r.u(4)? as u8;
        let provider_id = r.u(16)? as u16;
        let solution_id = r.u(4)? as u8;
        let (dispersive_bias, mw_consistency) = if kind == SsrKind::PhaseBias {
            (r.flag()?, r.flag()?)
        } else {
            (false, false)
        };
        let nsat = r.u(sat_layout(constellation).ns)? as usize;
        Ok(SsrHeader {
            epoch,
            udi,
            reference_datum,
            iod,
            provider_id,
            solution_id,
            dispersive_bias,
            mw_consistency,
            nsat,
        })
    }

    /// Decodes one SSR message. Corrections of all satellites are only
    /// stored once the complete message was read.
    pub(crate) fn decode_ssr(
        &mut self,
        r: &mut BitReader,
        kind: SsrKind,
        constellation: Constellation,
    ) -> Result<Option<Message>, Error> {
        let header = self.decode_ssr_header(r, kind, constellation)?;
        let layout = sat_layout(constellation);

        let mut records = Vec::with_capacity(header.nsat);
        for _ in 0..header.nsat {
            let prn = r.u(layout.np)? as u8 + layout.offp;
            let mut record = SsrRecord::default();
            match kind {
                SsrKind::Orbit => {
                    let iode = r.u(layout.ni)? as u16;
                    let iodcrc = r.u(layout.nj)?;
                    record.iode = Some((iode, iodcrc));
                    record.orbit = Some(read_orbit(r)?);
                },
                SsrKind::Clock => {
                    record.clock = Some(read_clock(r)?);
                },
                SsrKind::Combined => {
                    let iode = r.u(layout.ni)? as u16;
                    let iodcrc = r.u(layout.nj)?;
                    record.iode = Some((iode, iodcrc));
                    record.orbit = Some(read_orbit(r)?);
                    record.clock = Some(read_clock(r)?);
                },
                SsrKind::Ura => {
                    record.ura = Some(r.u(6)? as u8);
                },
                SsrKind::HighRateClock => {
                    record.high_rate_clock = Some(r.s(22)? as f64 * 1.0E-4);
                },
                SsrKind::CodeBias => {
                    let nbias = r.u(5)?;
                    let mut biases = Vec::with_capacity(nbias as usize);
                    for _ in 0..nbias {
                        let mode = r.u(5)?;
                        let bias = r.s(14)? as f64 * 0.01;
                        if let Some(code) = ssr_code(constellation, mode) {
                            biases.push((code, bias));
                        }
                    }
                    record.code_biases = Some(biases);
                },
                SsrKind::PhaseBias => {
                    let nbias = r.u(5)?;
                    // semicircles
                    let yaw_angle = r.u(9)? as f64 / 256.0 * 180.0;
                    let yaw_rate = r.s(8)? as f64 / 8192.0 * 180.0;
                    record.yaw = Some((yaw_angle, yaw_rate));
                    let mut biases = Vec::with_capacity(nbias as usize);
                    for _ in 0..nbias {
                        let mode = r.u(5)?;
                        let integer = r.flag()?;
                        let wide_lane = r.u(2)? as u8;
                        let discontinuity = r.u(4)? as u8;
                        let bias = r.s(20)? as f64 * 1.0E-4;
                        if let Some(code) = ssr_code(constellation, mode) {
                            biases.push((
                                code,
                                PhaseBias {
                                    bias,
                                    integer,
                                    wide_lane,
                                    discontinuity,
                                },
                            ));
                        }
                    }
                    record.phase_biases = Some(biases);
                },
            }
            if let Some(sat) = Sat::new(constellation, prn) {
                records.push((sat, record));
            }
        }

        let epoch = SsrEpoch {
            epoch: header.epoch,
            udi: header.udi,
            iod: header.iod,
        };
        for (sat, record) in records {
            let ssr = &mut self.ssr[sat.index() - 1];
            for category in categories(kind) {
                ssr.set_epoch(*category, epoch);
            }
            ssr.provider_id = header.provider_id;
            ssr.solution_id = header.solution_id;
            if let Some((iode, iodcrc)) = record.iode {
                ssr.iode = iode;
                ssr.iodcrc = iodcrc;
                ssr.reference_datum = header.reference_datum;
            }
            if let Some((orbit, rate)) = record.orbit {
                ssr.orbit = orbit;
                ssr.orbit_rate = rate;
            }
            if let Some(clock) = record.clock {
                ssr.clock = clock;
            }
            if let Some(ura) = record.ura {
                ssr.ura = ura;
            }
            if let Some(high_rate_clock) = record.high_rate_clock {
                ssr.high_rate_clock = high_rate_clock;
            }
            if let Some(biases) = record.code_biases {
                ssr.code_biases = biases.into_iter().collect();
            }
            if let Some((yaw_angle, yaw_rate)) = record.yaw {
                ssr.yaw_angle = yaw_angle;
                ssr.yaw_rate = yaw_rate;
                ssr.dispersive_bias = header.dispersive_bias;
                ssr.mw_consistency = header.mw_consistency;
            }
            if let Some(biases) = record.phase_biases {
                ssr.phase_biases = biases.into_iter().collect();
            }
            ssr.updated = true;
        }
        Ok(Some(Message::Ssr))
    }

    /// Encodes one SSR message, out of the satellites for which
    /// the corresponding categories were received.
    pub(crate) fn encode_ssr(
        &self,
        w: &mut BitWriter,
        kind: SsrKind,
        constellation: Constellation,
        sync: bool,
    ) -> Result<(), Error> {
        let msg_type = u16::from(MessageID::Ssr(kind, constellation));
        let layout = sat_layout(constellation);
        let category = categories(kind)[0];

        let sats = self
            .ssr
            .iter()
            .enumerate()
            .filter(|(_, ssr)| categories(kind).iter().all(|c| ssr.has(*c)))
            .filter_map(|(index, ssr)| Some((Sat::from_index(index + 1)?, ssr)))
            .filter(|(sat, _)| sat.constellation() == constellation)
            .take((1 << layout.ns) - 1)
            .collect::<Vec<_>>();

        let Some(epoch) = sats.first().and_then(|(_, ssr)| ssr.epoch(category)).copied() else {
            return Err(Error::NoData(msg_type));
        };
        let (_, first) = sats[0];

        match constellation {
            Constellation::Glonass => {
                w.u(17, time::glonass_tod(epoch.epoch).floor() as u32 % 86400)
            },
            Constellation::BeiDou => {
                let (_, tow) = time::bdt_week_tow(epoch.epoch);
                w.u(20, tow.floor() as u32)
            },
            _ => {
                let (_, tow) = time::gpst_week_tow(epoch.epoch);
                w.u(20, tow.floor() as u32)
            },
        }
        w.u(4, epoch.udi as u32);
        w.flag(sync);
        if has_datum(kind) {
            w.flag(first.reference_datum);
        }
        w.u(4, epoch.iod as u32);
        w.u(16, first.provider_id as u32);
        w.u(4, first.solution_id as u32);
        if kind == SsrKind::PhaseBias {
            w.flag(first.dispersive_bias);
            w.flag(first.mw_consistency);
        }
        w.u(layout.ns, sats.len() as u32);

        for (sat, ssr) in sats {
            w.u(layout.np, (sat.prn() - layout.offp) as u32);
            match kind {
                SsrKind::Orbit => {
                    w.u(layout.ni, ssr.iode as u32);
                    w.u(layout.nj, ssr.iodcrc);
                    write_orbit(w, ssr);
                },
                SsrKind::Clock => write_clock(w, ssr),
                SsrKind::Combined => {
                    w.u(layout.ni, ssr.iode as u32);
                    w.u(layout.nj, ssr.iodcrc);
                    write_orbit(w, ssr);
                    write_clock(w, ssr);
                },
                SsrKind::Ura => w.u(6, ssr.ura as u32),
                SsrKind::HighRateClock => w.s(22, round_i32(ssr.high_rate_clock / 1.0E-4)),
                SsrKind::CodeBias => {
                    let biases = ssr
                        .code_biases
                        .iter()
                        .filter_map(|(code, bias)| Some((ssr_mode(constellation, *code)?, *bias)))
                        .take(31)
                        .collect::<Vec<_>>();
                    w.u(5, biases.len() as u32);
                    for (mode, bias) in biases {
                        w.u(5, mode);
                        w.s(14, round_i32(bias / 0.01));
                    }
                },
                SsrKind::PhaseBias => {
                    let biases = ssr
                        .phase_biases
                        .iter()
                        .filter_map(|(code, bias)| Some((ssr_mode(constellation, *code)?, bias)))
                        .sorted_by_key(|(mode, _)| *mode)
                        .take(31)
                        .collect::<Vec<_>>();
                    w.u(5, biases.len() as u32);
                    let yaw_angle = ssr.yaw_angle.rem_euclid(360.0) / 180.0 * 256.0;
                    w.u(9, round_u32(yaw_angle) % 512);
                    w.s(8, round_i32(ssr.yaw_rate / 180.0 * 8192.0));
                    for (mode, bias) in biases {
                        w.u(5, mode);
                        w.flag(bias.integer);
                        w.u(2, bias.wide_lane as u32);
                        w.u(4, bias.discontinuity as u32);
                        w.s(20, round_i32(bias.bias / 1.0E-4));
                    }
                },
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::session::Status;

    fn session() -> Session {
        Session::default().with_time(time::gpst(2300, 100000.0))
    }

    fn decode(session: &mut Session, frame: &[u8]) -> Status {
        session.decode_rtcm3(frame, frame.len() - 6)
    }

    #[test]
    fn signal_modes() {
        for (constellation, mode, code) in [
            (Constellation::GPS, 0, ObsCode::L1C),
            (Constellation::GPS, 11, ObsCode::L2W),
            (Constellation::Glonass, 3, ObsCode::L2P),
            (Constellation::Galileo, 8, ObsCode::L7I),
            (Constellation::QZSS, 12, ObsCode::L1X),
            (Constellation::BeiDou, 6, ObsCode::L7I),
        ] {
            assert_eq!(ssr_code(constellation, mode), Some(code));
            assert_eq!(ssr_mode(constellation, code), Some(mode));
        }
        assert!(ssr_code(Constellation::BeiDou, 9).is_none());
        assert!(ssr_mode(Constellation::Glonass, ObsCode::L5Q).is_none());
    }

    #[test]
    fn combined_orbit_clock() {
        let mut tx = session();
        let t = time::gpst(2300, 100010.0);
        for prn in [3, 17] {
            let sat = Sat::new(Constellation::GPS, prn).unwrap();
            let ssr = &mut tx.ssr[sat.index() - 1];
            for category in [SsrCategory::Orbit, SsrCategory::Clock] {
                ssr.set_epoch(
                    category,
                    SsrEpoch {
                        epoch: t,
                        udi: 2,
                        iod: 7,
                    },
                );
            }
            ssr.provider_id = 258;
            ssr.solution_id = 1;
            ssr.iode = 55;
            ssr.orbit = [0.1234, -0.5, 1.0];
            ssr.orbit_rate = [0.000123, 0.0, -0.00004];
            ssr.clock = [-1.5, 0.001, 0.0];
        }
        // no URA available
        assert!(matches!(
            tx.encode_rtcm3(1061, 0, false),
            Err(Error::NoData(1061))
        ));
        let frame = tx.encode_rtcm3(1060, 0, false).unwrap();

        let mut rx = session();
        assert_eq!(decode(&mut rx, &frame).code(), 1060);
        let sat = Sat::new(Constellation::GPS, 17).unwrap();
        let ssr = &rx.ssr[sat.index() - 1];
        assert!(ssr.updated);
        assert!(!ssr.has(SsrCategory::HighRateClock));
        let epoch = ssr.epoch(SsrCategory::Clock).unwrap();
        assert_eq!(epoch.epoch, t);
        assert_eq!((epoch.udi, epoch.iod), (2, 7));
        assert_eq!((ssr.provider_id, ssr.solution_id, ssr.iode), (258, 1, 55));
        assert!((ssr.orbit[0] - 0.1234).abs() < 1.0E-9);
        assert!((ssr.orbit[1] + 0.5).abs() < 1.0E-9);
        assert!((ssr.orbit_rate[2] + 0.00004).abs() < 1.0E-9);
        assert!((ssr.clock[0] + 1.5).abs() < 1.0E-9);
        assert!(!rx.ssr[0].updated);
    }

    #[test]
    fn beidou_epoch() {
        let mut tx = session();
        let t = time::gpst(2300, 100014.0);
        let sat = Sat::new(Constellation::BeiDou, 20).unwrap();
        let ssr = &mut tx.ssr[sat.index() - 1];
        ssr.set_epoch(
            SsrCategory::HighRateClock,
            SsrEpoch {
                epoch: t,
                udi: 0,
                iod: 1,
            },
        );
        ssr.high_rate_clock = 0.0125;
        let frame = tx.encode_rtcm3(1263, 0, false).unwrap();

        let mut reader = BitReader::rtcm3(&frame, frame.len() - 6);
        assert_eq!(reader.u(12).unwrap(), 1263);
        // BDT
        assert_eq!(reader.u(20).unwrap(), 100000);

        let mut rx = session();
        assert_eq!(decode(&mut rx, &frame).code(), 1263);
        let ssr = &rx.ssr[sat.index() - 1];
        assert_eq!(ssr.epoch(SsrCategory::HighRateClock).unwrap().epoch, t);
        assert!((ssr.high_rate_clock - 0.0125).abs() < 1.0E-9);
    }

    #[test]
    fn phase_biases() {
        let mut tx = session();
        let sat = Sat::new(Constellation::Galileo, 12).unwrap();
        let ssr = &mut tx.ssr[sat.index() - 1];
        ssr.set_epoch(
            SsrCategory::PhaseBias,
            SsrEpoch {
                epoch: time::gpst(2300, 100000.0),
                udi: 5,
                iod: 3,
            },
        );
        ssr.dispersive_bias = true;
        ssr.yaw_angle = 271.40625;
        ssr.yaw_rate = 1.7578125;
        ssr.phase_biases.insert(
            ObsCode::L1C,
            PhaseBias {
                bias: 0.1234,
                integer: true,
                wide_lane: 2,
                discontinuity: 9,
            },
        );
        ssr.phase_biases.insert(ObsCode::L5Q, PhaseBias::default());
        // not an SSR signal
        ssr.phase_biases.insert(ObsCode::L2W, PhaseBias::default());
        ssr.code_biases.insert(ObsCode::L1C, 1.23);

        let frame = tx.encode_rtcm3(1267, 0, false).unwrap();
        let mut rx = session();
        assert_eq!(decode(&mut rx, &frame).code(), 1267);
        let decoded = &rx.ssr[sat.index() - 1];
        assert!(decoded.dispersive_bias);
        assert!(!decoded.mw_consistency);
        assert_eq!(decoded.yaw_angle, 271.40625);
        assert_eq!(decoded.yaw_rate, 1.7578125);
        assert_eq!(decoded.phase_biases.len(), 2);
        let bias = decoded.phase_biases[&ObsCode::L1C];
        assert!(bias.integer);
        assert_eq!((bias.wide_lane, bias.discontinuity), (2, 9));
        assert!((bias.bias - 0.1234).abs() < 1.0E-9);
        // code biases come with their own message
        assert!(decoded.code_biases.is_empty());
        assert!(!decoded.has(SsrCategory::CodeBias));
    }

    #[test]
    fn yaw_resolution() {
        let mut w = BitWriter::new();
        w.u(12, 1265);
        w.u(20, 100000); // tow
        w.u(4, 0); // udi
        w.flag(false);
        w.u(4, 0); // iod
        w.u(16, 1); // provider
        w.u(4, 0); // solution
        w.flag(false);
        w.flag(false);
        w.u(6, 1); // nsat
        w.u(6, 7); // prn
        w.u(5, 0); // nbias
        w.u(9, 256); // half turn
        w.s(8, 8);
        let frame = crate::rtcm3::frame(&w.into_bytes()).unwrap();

        let mut rx = session();
        assert_eq!(decode(&mut rx, &frame).code(), 1265);
        let sat = Sat::new(Constellation::GPS, 7).unwrap();
        let ssr = &rx.ssr[sat.index() - 1];
        assert_eq!(ssr.yaw_angle, 180.0);
        assert_eq!(ssr.yaw_rate, 0.17578125);
        assert!(ssr.phase_biases.is_empty());

        // and back to the same bit pattern
        let encoded = rx.encode_rtcm3(1265, 0, false).unwrap();
        assert_eq!(encoded, frame);
    }

    #[test]
    fn truncated_message_is_not_committed() {
        let mut tx = session();
        for prn in 1..=20 {
            let sat = Sat::new(Constellation::GPS, prn).unwrap();
            let ssr = &mut tx.ssr[sat.index() - 1];
            ssr.set_epoch(
                SsrCategory::Clock,
                SsrEpoch {
                    epoch: time::gpst(2300, 100000.0),
                    udi: 0,
                    iod: 0,
                },
            );
            ssr.clock[0] = prn as f64;
        }
        let frame = tx.encode_rtcm3(1058, 0, false).unwrap();
        // shorter payload length: CRC is not checked at this stage
        let len = frame.len() - 6 - 20;
        let mut rx = session();
        assert!(matches!(
            rx.decode_rtcm3(&frame, len),
            Status::Rejected(Error::NotEnoughBits)
        ));
        assert!(rx.ssr.iter().all(|ssr| !ssr.updated));
    }
}
