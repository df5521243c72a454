//! Broadcast ephemeris messages: 1019 (GPS), 1020 (GLONASS), 1042 (BeiDou),
//! 1044 (QZSS), 1045 and 1046 (Galileo F/NAV and I/NAV)
use gnss_rs::prelude::Constellation;
use log::debug;

use crate::{
    bits::{round_i32, round_u32, BitReader, BitWriter},
    constants::{
        Constants, P2_11, P2_19, P2_20, P2_29, P2_30, P2_31, P2_32, P2_33, P2_34, P2_40, P2_43,
        P2_46, P2_5, P2_50, P2_55, P2_59, P2_6, P2_66,
    },
    navigation::{Ephemeris, GlonassEphemeris},
    rtcm3::MessageID,
    sat::Sat,
    session::{Message, Session},
    time, Error,
};

/// Widths and resolutions of the Keplerian block,
/// which only differ for BeiDou
struct OrbitLayout {
    /// crs, crc
    radial_bits: usize,
    radial_scale: f64,
    /// cuc, cus, cic, cis
    harmonic_bits: usize,
    harmonic_scale: f64,
    toe_bits: usize,
    toe_scale: f64,
}

const GPS_ORBIT: OrbitLayout = OrbitLayout {
    radial_bits: 16,
    radial_scale: P2_5,
    harmonic_bits: 16,
    harmonic_scale: P2_29,
    toe_bits: 16,
    toe_scale: 16.0,
};

const GALILEO_ORBIT: OrbitLayout = OrbitLayout {
    toe_bits: 14,
    toe_scale: 60.0,
    ..GPS_ORBIT
};

const BEIDOU_ORBIT: OrbitLayout = OrbitLayout {
    radial_bits: 18,
    radial_scale: P2_6,
    harmonic_bits: 18,
    harmonic_scale: P2_31,
    toe_bits: 17,
    toe_scale: 8.0,
};

/// Galileo data sources, F/NAV (E5a)
const GALILEO_FNAV_CODE: u16 = (1 << 1) + (1 << 8);

/// Galileo data sources, I/NAV (E1-B, E5b)
const GALILEO_INAV_CODE: u16 = (1 << 0) + (1 << 2) + (1 << 9);

const ANGLE_14: f64 = P2_43 * Constants::SC2RAD;
const ANGLE_32: f64 = P2_31 * Constants::SC2RAD;

/// Reads the Keplerian block, returns toe in seconds of week
fn read_orbit(r: &mut BitReader, layout: &OrbitLayout, eph: &mut Ephemeris) -> Result<f64, Error> {
    eph.crs = r.s(layout.radial_bits)? as f64 * layout.radial_scale;
    eph.delta_n_rad_s = r.s(16)? as f64 * ANGLE_14;
    eph.m0_rad = r.s(32)? as f64 * ANGLE_32;
    eph.cuc = r.s(layout.harmonic_bits)? as f64 * layout.harmonic_scale;
    eph.e = r.u(32)? as f64 * P2_33;
    eph.cus = r.s(layout.harmonic_bits)? as f64 * layout.harmonic_scale;
    eph.sqrt_a = r.u(32)? as f64 * P2_19;
    let toe = r.u(layout.toe_bits)? as f64 * layout.toe_scale;
    eph.cic = r.s(layout.harmonic_bits)? as f64 * layout.harmonic_scale;
    eph.omega_0_rad = r.s(32)? as f64 * ANGLE_32;
    eph.cis = r.s(layout.harmonic_bits)? as f64 * layout.harmonic_scale;
    eph.i0_rad = r.s(32)? as f64 * ANGLE_32;
    eph.crc = r.s(layout.radial_bits)? as f64 * layout.radial_scale;
    eph.omega_rad = r.s(32)? as f64 * ANGLE_32;
    eph.omega_dot_rad_s = r.s(24)? as f64 * ANGLE_14;
    Ok(toe)
}

fn write_orbit(w: &mut BitWriter, layout: &OrbitLayout, eph: &Ephemeris) {
    w.s(layout.radial_bits, round_i32(eph.crs / layout.radial_scale));
    w.s(16, round_i32(eph.delta_n_rad_s / ANGLE_14));
    w.s(32, round_i32(eph.m0_rad / ANGLE_32));
    w.s(layout.harmonic_bits, round_i32(eph.cuc / layout.harmonic_scale));
    w.u(32, round_u32(eph.e / P2_33));
    w.s(layout.harmonic_bits, round_i32(eph.cus / layout.harmonic_scale));
    w.u(32, round_u32(eph.sqrt_a / P2_19));
    w.u(layout.toe_bits, round_u32(eph.toe_s / layout.toe_scale));
    w.s(layout.harmonic_bits, round_i32(eph.cic / layout.harmonic_scale));
    w.s(32, round_i32(eph.omega_0_rad / ANGLE_32));
    w.s(layout.harmonic_bits, round_i32(eph.cis / layout.harmonic_scale));
    w.s(32, round_i32(eph.i0_rad / ANGLE_32));
    w.s(layout.radial_bits, round_i32(eph.crc / layout.radial_scale));
    w.s(32, round_i32(eph.omega_rad / ANGLE_32));
    w.s(24, round_i32(eph.omega_dot_rad_s / ANGLE_14));
}

impl Session {
    /// Stores a decoded ephemeris and selects it as encoding target
    fn store_ephemeris(&mut self, eph: Ephemeris, set: usize) -> Message {
        let sat = eph.sat;
        let updated = self
            .nav
            .update_ephemeris(eph, set, self.config.accept_all_ephemeris);
        if !updated {
            debug!("{:?}: ephemeris not updated", sat.sv());
        }
        self.eph_sat = Some(sat);
        self.eph_set = set;
        Message::Ephemeris { sat, updated }
    }

    /// Ephemeris to encode: latest decoded satellite, if it matches
    fn target_ephemeris(
        &self,
        constellation: Constellation,
        set: usize,
        msg_type: u16,
    ) -> Result<&Ephemeris, Error> {
        self.eph_sat
            .filter(|sat| sat.constellation() == constellation)
            .and_then(|sat| self.nav.ephemeris(sat, set))
            .ok_or(Error::NoData(msg_type))
    }

    pub(crate) fn decode_gps_ephemeris(
        &mut self,
        r: &mut BitReader,
    ) -> Result<Option<Message>, Error> {
        let prn = r.u(6)? as u8;
        let week = r.u(10)?;
        let sva = r.u(4)? as u8;
        let code = r.u(2)? as u16;
        let idot = r.s(14)? as f64 * ANGLE_14;
        let iode = r.u(8)? as u16;
        let toc = r.u(16)? as f64 * 16.0;
        let f2 = r.s(8)? as f64 * P2_55;
        let f1 = r.s(16)? as f64 * P2_43;
        let f0 = r.s(22)? as f64 * P2_31;
        let iodc = r.u(10)? as u16;

        let sat = Sat::new(Constellation::GPS, prn).ok_or(Error::InvalidSatellite)?;
        let mut eph = Ephemeris::new(sat);
        let toe = read_orbit(r, &GPS_ORBIT, &mut eph)?;
        eph.tgd[0] = r.s(8)? as f64 * P2_31;
        eph.sv_health = r.u(6)? as u16;
        eph.flag = r.u(1)? as u8;
        eph.fit_hours = if r.flag()? { 0.0 } else { 4.0 };

        let (ref_week, _) = time::gpst_week_tow(self.reference_time()?);
        let week = time::adjust_week(week, 10, ref_week);
        eph.week = week;
        eph.sva = sva;
        eph.code = code;
        eph.iode = iode;
        eph.iodc = iodc;
        eph.i_dot_rad_s = idot;
        eph.clock_offset = f0;
        eph.clock_drift = f1;
        eph.clock_drift_rate = f2;
        eph.toe_s = toe;
        eph.toe = time::gpst(week, toe);
        eph.toc = time::gpst(week, toc);

        Ok(Some(self.store_ephemeris(eph, 0)))
    }

    pub(crate) fn encode_gps_ephemeris(&self, w: &mut BitWriter) -> Result<(), Error> {
        let msg_type = u16::from(MessageID::GpsEphemeris);
        let eph = self.target_ephemeris(Constellation::GPS, 0, msg_type)?;
        let (_, toc) = time::gpst_week_tow(eph.toc);

        w.u(6, eph.sat.prn() as u32);
        w.u(10, eph.week % 1024);
        w.u(4, eph.sva as u32);
        w.u(2, eph.code as u32);
        w.s(14, round_i32(eph.i_dot_rad_s / ANGLE_14));
        w.u(8, eph.iode as u32);
        w.u(16, round_u32(toc / 16.0));
        w.s(8, round_i32(eph.clock_drift_rate / P2_55));
        w.s(16, round_i32(eph.clock_drift / P2_43));
        w.s(22, round_i32(eph.clock_offset / P2_31));
        w.u(10, eph.iodc as u32);
        write_orbit(w, &GPS_ORBIT, eph);
        w.s(8, round_i32(eph.tgd[0] / P2_31));
        w.u(6, eph.sv_health as u32);
        w.u(1, eph.flag as u32);
        w.flag(eph.fit_hours <= 0.0);
        Ok(())
    }

    pub(crate) fn decode_qzss_ephemeris(
        &mut self,
        r: &mut BitReader,
    ) -> Result<Option<Message>, Error> {
        let prn = r.u(4)? as u8 + 192;
        let toc = r.u(16)? as f64 * 16.0;
        let f2 = r.s(8)? as f64 * P2_55;
        let f1 = r.s(16)? as f64 * P2_43;
        let f0 = r.s(22)? as f64 * P2_31;
        let iode = r.u(8)? as u16;

        let sat = Sat::new(Constellation::QZSS, prn).ok_or(Error::InvalidSatellite)?;
        let mut eph = Ephemeris::new(sat);
        let toe = read_orbit(r, &GPS_ORBIT, &mut eph)?;
        eph.i_dot_rad_s = r.s(14)? as f64 * ANGLE_14;
        eph.code = r.u(2)? as u16;
        let week = r.u(10)?;
        eph.sva = r.u(4)? as u8;
        eph.sv_health = r.u(6)? as u16;
        eph.tgd[0] = r.s(8)? as f64 * P2_31;
        eph.iodc = r.u(10)? as u16;
        eph.fit_hours = if r.flag()? { 0.0 } else { 2.0 };

        let (ref_week, _) = time::gpst_week_tow(self.reference_time()?);
        let week = time::adjust_week(week, 10, ref_week);
        eph.week = week;
        eph.iode = iode;
        eph.clock_offset = f0;
        eph.clock_drift = f1;
        eph.clock_drift_rate = f2;
        eph.toe_s = toe;
        eph.toe = time::gpst(week, toe);
        eph.toc = time::gpst(week, toc);

        Ok(Some(self.store_ephemeris(eph, 0)))
    }

    pub(crate) fn encode_qzss_ephemeris(&self, w: &mut BitWriter) -> Result<(), Error> {
        let msg_type = u16::from(MessageID::QzssEphemeris);
        let eph = self.target_ephemeris(Constellation::QZSS, 0, msg_type)?;
        let (_, toc) = time::gpst_week_tow(eph.toc);

        w.u(4, (eph.sat.prn() - 192) as u32);
        w.u(16, round_u32(toc / 16.0));
        w.s(8, round_i32(eph.clock_drift_rate / P2_55));
        w.s(16, round_i32(eph.clock_drift / P2_43));
        w.s(22, round_i32(eph.clock_offset / P2_31));
        w.u(8, eph.iode as u32);
        write_orbit(w, &GPS_ORBIT, eph);
        w.s(14, round_i32(eph.i_dot_rad_s / ANGLE_14));
        w.u(2, eph.code as u32);
        w.u(10, eph.week % 1024);
        w.u(4, eph.sva as u32);
        w.u(6, eph.sv_health as u32);
        w.s(8, round_i32(eph.tgd[0] / P2_31));
        w.u(10, eph.iodc as u32);
        w.flag(eph.fit_hours <= 0.0);
        Ok(())
    }

    pub(crate) fn decode_beidou_ephemeris(
        &mut self,
        r: &mut BitReader,
    ) -> Result<Option<Message>, Error> {
        let prn = r.u(6)? as u8;
        let week = r.u(13)?;
        let sva = r.u(4)? as u8;
        let idot = r.s(14)? as f64 * ANGLE_14;
        let aode = r.u(5)? as u16;
        let toc = r.u(17)? as f64 * 8.0;
        let f2 = r.s(11)? as f64 * P2_66;
        let f1 = r.s(22)? as f64 * P2_50;
        let f0 = r.s(24)? as f64 * P2_33;
        let aodc = r.u(5)? as u16;

        let sat = Sat::new(Constellation::BeiDou, prn).ok_or(Error::InvalidSatellite)?;
        let mut eph = Ephemeris::new(sat);
        let toe = read_orbit(r, &BEIDOU_ORBIT, &mut eph)?;
        eph.tgd[0] = r.s(10)? as f64 * 1.0E-10;
        eph.tgd[1] = r.s(10)? as f64 * 1.0E-10;
        eph.sv_health = r.u(1)? as u16;

        let (ref_week, _) = time::bdt_week_tow(self.reference_time()?);
        let week = time::adjust_week(week, 13, ref_week);
        eph.week = week;
        eph.sva = sva;
        eph.iode = aode;
        eph.iodc = aodc;
        eph.i_dot_rad_s = idot;
        eph.clock_offset = f0;
        eph.clock_drift = f1;
        eph.clock_drift_rate = f2;
        eph.toe_s = toe;
        eph.toe = time::bdt(week, toe);
        eph.toc = time::bdt(week, toc);

        Ok(Some(self.store_ephemeris(eph, 0)))
    }

    pub(crate) fn encode_beidou_ephemeris(&self, w: &mut BitWriter) -> Result<(), Error> {
        let msg_type = u16::from(MessageID::BeiDouEphemeris);
        let eph = self.target_ephemeris(Constellation::BeiDou, 0, msg_type)?;
        let (_, toc) = time::bdt_week_tow(eph.toc);

        w.u(6, eph.sat.prn() as u32);
        w.u(13, eph.week % 8192);
        w.u(4, eph.sva as u32);
        w.s(14, round_i32(eph.i_dot_rad_s / ANGLE_14));
        w.u(5, eph.iode as u32);
        w.u(17, round_u32(toc / 8.0));
        w.s(11, round_i32(eph.clock_drift_rate / P2_66));
        w.s(22, round_i32(eph.clock_drift / P2_50));
        w.s(24, round_i32(eph.clock_offset / P2_33));
        w.u(5, eph.iodc as u32);
        write_orbit(w, &BEIDOU_ORBIT, eph);
        w.s(10, round_i32(eph.tgd[0] / 1.0E-10));
        w.s(10, round_i32(eph.tgd[1] / 1.0E-10));
        w.u(1, eph.sv_health as u32);
        Ok(())
    }

    /// Decodes Galileo ephemeris. I/NAV is stored in data set 0,
    /// F/NAV in data set 1.
    pub(crate) fn decode_galileo_ephemeris(
        &mut self,
        r: &mut BitReader,
        inav: bool,
    ) -> Result<Option<Message>, Error> {
        if (inav && !self.config.galileo_inav) || (!inav && !self.config.galileo_fnav) {
            return Ok(None);
        }
        let prn = r.u(6)? as u8;
        let week = r.u(12)?;
        let iode = r.u(10)? as u16;
        let sva = r.u(8)? as u8;
        let idot = r.s(14)? as f64 * ANGLE_14;
        let toc = r.u(14)? as f64 * 60.0;
        let f2 = r.s(6)? as f64 * P2_59;
        let f1 = r.s(21)? as f64 * P2_46;
        let f0 = r.s(31)? as f64 * P2_34;

        let sat = Sat::new(Constellation::Galileo, prn).ok_or(Error::InvalidSatellite)?;
        let mut eph = Ephemeris::new(sat);
        let toe = read_orbit(r, &GALILEO_ORBIT, &mut eph)?;
        eph.tgd[0] = r.s(10)? as f64 * P2_32;
        if inav {
            eph.tgd[1] = r.s(10)? as f64 * P2_32;
            let e5b_hs = r.u(2)? as u16;
            let e5b_dvs = r.u(1)? as u16;
            let e1_hs = r.u(2)? as u16;
            let e1_dvs = r.u(1)? as u16;
            eph.sv_health = (e5b_hs << 7) + (e5b_dvs << 6) + (e1_hs << 1) + e1_dvs;
            eph.code = GALILEO_INAV_CODE;
        } else {
            let e5a_hs = r.u(2)? as u16;
            let e5a_dvs = r.u(1)? as u16;
            eph.sv_health = (e5a_hs << 4) + (e5a_dvs << 3);
            eph.code = GALILEO_FNAV_CODE;
        }

        let (ref_week, _) = time::gst_week_tow(self.reference_time()?);
        let week = time::adjust_week(week, 12, ref_week);
        eph.week = week;
        eph.iode = iode;
        eph.sva = sva;
        eph.i_dot_rad_s = idot;
        eph.clock_offset = f0;
        eph.clock_drift = f1;
        eph.clock_drift_rate = f2;
        eph.toe_s = toe;
        eph.toe = time::gst(week, toe);
        eph.toc = time::gst(week, toc);

        let set = if inav { 0 } else { 1 };
        Ok(Some(self.store_ephemeris(eph, set)))
    }

    pub(crate) fn encode_galileo_ephemeris(
        &self,
        w: &mut BitWriter,
        inav: bool,
    ) -> Result<(), Error> {
        let (id, set) = if inav {
            (MessageID::GalileoINavEphemeris, 0)
        } else {
            (MessageID::GalileoFNavEphemeris, 1)
        };
        let eph = self.target_ephemeris(Constellation::Galileo, set, u16::from(id))?;
        let (_, toc) = time::gst_week_tow(eph.toc);

        w.u(6, eph.sat.prn() as u32);
        w.u(12, eph.week % 4096);
        w.u(10, eph.iode as u32);
        w.u(8, eph.sva as u32);
        w.s(14, round_i32(eph.i_dot_rad_s / ANGLE_14));
        w.u(14, round_u32(toc / 60.0));
        w.s(6, round_i32(eph.clock_drift_rate / P2_59));
        w.s(21, round_i32(eph.clock_drift / P2_46));
        w.s(31, round_i32(eph.clock_offset / P2_34));
        write_orbit(w, &GALILEO_ORBIT, eph);
        w.s(10, round_i32(eph.tgd[0] / P2_32));
        let svh = eph.sv_health as u32;
        if inav {
            w.s(10, round_i32(eph.tgd[1] / P2_32));
            w.u(2, (svh >> 7) & 0x03);
            w.u(1, (svh >> 6) & 0x01);
            w.u(2, (svh >> 1) & 0x03);
            w.u(1, svh & 0x01);
            w.u(2, 0); // reserved
        } else {
            w.u(2, (svh >> 4) & 0x03);
            w.u(1, (svh >> 3) & 0x01);
            w.u(7, 0); // reserved
        }
        Ok(())
    }

    pub(crate) fn decode_glonass_ephemeris(
        &mut self,
        r: &mut BitReader,
    ) -> Result<Option<Message>, Error> {
        let prn = r.u(6)? as u8;
        let fcn = r.u(5)? as i8 - 7;
        r.skip(2 + 2)?; // almanac health, P1
        let tk_h = r.u(5)? as f64;
        let tk_m = r.u(6)? as f64;
        let tk_s = r.u(1)? as f64 * 30.0;
        let bn = r.u(1)? as u8;
        r.skip(1)?; // P2
        let tb = r.u(7)?;

        let mut pos = [0.0; 3];
        let mut vel = [0.0; 3];
        let mut acc = [0.0; 3];
        for i in 0..3 {
            vel[i] = r.g(24)? as f64 * P2_20 * 1.0E3;
            pos[i] = r.g(27)? as f64 * P2_11 * 1.0E3;
            acc[i] = r.g(5)? as f64 * P2_30 * 1.0E3;
        }
        r.skip(1)?; // P3
        let gamma = r.g(11)? as f64 * P2_40;
        r.skip(3)?; // P, ln
        let tau = r.g(22)? as f64 * P2_30;
        let dtau = r.g(5)? as f64 * P2_30;
        let age = r.u(5)? as u8;
        r.skip(1)?; // P4
        let ft = r.u(4)? as u8;
        // NT, M, additional data, NA, tau_c, N4, tau_gps, ln, reserved
        r.skip(11 + 2 + 1 + 11 + 32 + 5 + 22 + 1 + 7)?;

        let sat = Sat::new(Constellation::Glonass, prn).ok_or(Error::InvalidSatellite)?;
        let reference = self.reference_time()?;

        let mut geph = GlonassEphemeris::new(sat);
        geph.iode = tb as u8;
        geph.freq_channel = fcn;
        geph.sv_health = bn;
        geph.sva = ft;
        geph.age_op_days = age;
        geph.tof = time::adjust_glonass_tod(reference, tk_h * 3600.0 + tk_m * 60.0 + tk_s);
        geph.toe = time::adjust_glonass_tod(reference, tb as f64 * 900.0);
        geph.position_m = pos;
        geph.velocity_m_s = vel;
        geph.acceleration_m_s2 = acc;
        geph.clock_offset = -tau;
        geph.clock_rel_freq_bias = gamma;
        geph.l1_l2_gd = dtau;

        let updated = self
            .nav
            .update_glonass(geph, self.config.accept_all_ephemeris);
        if !updated {
            debug!("{:?}: ephemeris not updated", sat.sv());
        }
        self.eph_sat = Some(sat);
        self.eph_set = 0;
        Ok(Some(Message::Ephemeris { sat, updated }))
    }

    pub(crate) fn encode_glonass_ephemeris(&self, w: &mut BitWriter) -> Result<(), Error> {
        let msg_type = u16::from(MessageID::GlonassEphemeris);
        let geph = self
            .eph_sat
            .filter(|sat| sat.constellation() == Constellation::Glonass)
            .and_then(|sat| self.nav.glonass_ephemeris(sat))
            .ok_or(Error::NoData(msg_type))?;

        let tof = time::glonass_tod(geph.tof);
        let tk_h = (tof / 3600.0).floor() as u32;
        let tk_m = ((tof % 3600.0) / 60.0).floor() as u32;
        let tk_s = (tof % 60.0 >= 30.0) as u32;
        let tb = round_u32(time::glonass_tod(geph.toe) / 900.0) % 96;

        w.u(6, geph.sat.prn() as u32);
        w.u(5, (i32::from(geph.freq_channel) + 7) as u32);
        w.u(4, 0); // almanac health, P1
        w.u(5, tk_h % 24);
        w.u(6, tk_m);
        w.u(1, tk_s);
        w.u(1, geph.sv_health as u32);
        w.u(1, 0); // P2
        w.u(7, tb);
        for i in 0..3 {
            w.g(24, round_i32(geph.velocity_m_s[i] / P2_20 / 1.0E3));
            w.g(27, round_i32(geph.position_m[i] / P2_11 / 1.0E3));
            w.g(5, round_i32(geph.acceleration_m_s2[i] / P2_30 / 1.0E3));
        }
        w.u(1, 0); // P3
        w.g(11, round_i32(geph.clock_rel_freq_bias / P2_40));
        w.u(3, 0); // P, ln
        w.g(22, round_i32(-geph.clock_offset / P2_30));
        w.g(5, round_i32(geph.l1_l2_gd / P2_30));
        w.u(5, geph.age_op_days as u32);
        w.u(1, 0); // P4
        w.u(4, geph.sva as u32);
        w.u(11 + 2 + 1 + 11, 0);
        w.u(32, 0);
        w.u(5 + 22 + 1 + 7, 0);
        Ok(())
    }
}
