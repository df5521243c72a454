//! Station messages: 1005/1006 (antenna reference point),
//! 1007/1008/1033 (descriptors), 1230 (GLONASS biases) and 1029 (text)
use hifitime::{Epoch, TimeScale};
use log::debug;

use crate::{
    bits::{round_i32, round_i64, round_u32, BitReader, BitWriter},
    rtcm3::MessageID,
    session::{Message, Session},
    Error,
};

/// Maximal number of characters of a 1029 text
const MAX_TEXT_CHARS: usize = 127;

/// Maximal number of bytes of a 1029 text
const MAX_TEXT_BYTES: usize = 255;

/// Reads a length prefixed character string
fn read_string(r: &mut BitReader) -> Result<String, Error> {
    let n = r.u(8)? as usize;
    r.string(n)
}

/// Writes a length prefixed character string, truncated to 31 bytes
fn write_string(w: &mut BitWriter, s: &str) {
    let bytes = &s.as_bytes()[..s.len().min(31)];
    w.u(8, bytes.len() as u32);
    w.bytes(bytes);
}

/// Truncates a text to the 1029 limits, on a character boundary
fn truncate_text(text: &str) -> &str {
    let mut end = 0;
    for (n, (index, c)) in text.char_indices().enumerate() {
        if n >= MAX_TEXT_CHARS || index + c.len_utf8() > MAX_TEXT_BYTES {
            break;
        }
        end = index + c.len_utf8();
    }
    &text[..end]
}

impl Session {
    /// Decodes antenna reference point, with antenna height for 1006
    pub(crate) fn decode_station_coordinates(
        &mut self,
        r: &mut BitReader,
        height: bool,
    ) -> Result<Option<Message>, Error> {
        let station_id = r.u(12)? as u16;
        let itrf_year = r.u(6)? as u8;
        let indicators = r.u(4)? as u8;
        let x = r.s38()? as f64 * 1.0E-4;
        let oscillator = r.flag()?;
        r.skip(1)?; // reserved
        let y = r.s38()? as f64 * 1.0E-4;
        let quarter_cycle = r.u(2)? as u8;
        let z = r.s38()? as f64 * 1.0E-4;
        let antenna_height = if height {
            Some(r.u(16)? as f64 * 1.0E-4)
        } else {
            None
        };

        if !self.check_station(station_id)? {
            return Ok(None);
        }
        self.station.station_id = station_id;
        self.station.itrf_year = itrf_year;
        self.station.indicators = indicators;
        self.station.oscillator = oscillator;
        self.station.quarter_cycle = quarter_cycle;
        self.station.position = [x, y, z];
        if let Some(antenna_height) = antenna_height {
            self.station.antenna_height = antenna_height;
        }
        Ok(Some(Message::Station))
    }

    pub(crate) fn encode_station_coordinates(&self, w: &mut BitWriter, height: bool) {
        let station = &self.station;
        w.u(12, station.station_id as u32);
        w.u(6, station.itrf_year as u32);
        w.u(4, station.indicators as u32);
        w.s38(round_i64(station.position[0] / 1.0E-4));
        w.flag(station.oscillator);
        w.u(1, 0); // reserved
        w.s38(round_i64(station.position[1] / 1.0E-4));
        w.u(2, station.quarter_cycle as u32);
        w.s38(round_i64(station.position[2] / 1.0E-4));
        if height {
            w.u(16, round_u32(station.antenna_height / 1.0E-4));
        }
    }

    /// Decodes antenna descriptor, with antenna serial number for 1008
    pub(crate) fn decode_antenna_descriptor(
        &mut self,
        r: &mut BitReader,
        serial: bool,
    ) -> Result<Option<Message>, Error> {
        let station_id = r.u(12)? as u16;
        let descriptor = read_string(r)?;
        let setup_id = r.u(8)? as u8;
        let antenna_serial = if serial {
            Some(read_string(r)?)
        } else {
            None
        };

        if !self.check_station(station_id)? {
            return Ok(None);
        }
        self.station.antenna_descriptor = descriptor;
        self.station.antenna_setup_id = setup_id;
        if let Some(antenna_serial) = antenna_serial {
            self.station.antenna_serial = antenna_serial;
        }
        Ok(Some(Message::Station))
    }

    pub(crate) fn encode_antenna_descriptor(&self, w: &mut BitWriter, serial: bool) {
        w.u(12, self.station.station_id as u32);
        write_string(w, &self.station.antenna_descriptor);
        w.u(8, self.station.antenna_setup_id as u32);
        if serial {
            write_string(w, &self.station.antenna_serial);
        }
    }

    /// Decodes receiver and antenna descriptors (1033)
    pub(crate) fn decode_receiver_descriptor(
        &mut self,
        r: &mut BitReader,
    ) -> Result<Option<Message>, Error> {
        let station_id = r.u(12)? as u16;
        let descriptor = read_string(r)?;
        let setup_id = r.u(8)? as u8;
        let antenna_serial = read_string(r)?;
        let receiver_type = read_string(r)?;
        let receiver_firmware = read_string(r)?;
        let receiver_serial = read_string(r)?;

        if !self.check_station(station_id)? {
            return Ok(None);
        }
        self.station.antenna_descriptor = descriptor;
        self.station.antenna_setup_id = setup_id;
        self.station.antenna_serial = antenna_serial;
        self.station.receiver_type = receiver_type;
        self.station.receiver_firmware = receiver_firmware;
        self.station.receiver_serial = receiver_serial;
        Ok(Some(Message::Station))
    }

    pub(crate) fn encode_receiver_descriptor(&self, w: &mut BitWriter) {
        let station = &self.station;
        w.u(12, station.station_id as u32);
        write_string(w, &station.antenna_descriptor);
        w.u(8, station.antenna_setup_id as u32);
        write_string(w, &station.antenna_serial);
        write_string(w, &station.receiver_type);
        write_string(w, &station.receiver_firmware);
        write_string(w, &station.receiver_serial);
    }

    /// Decodes GLONASS code-phase biases (1230)
    pub(crate) fn decode_glonass_biases(
        &mut self,
        r: &mut BitReader,
    ) -> Result<Option<Message>, Error> {
        let station_id = r.u(12)? as u16;
        let alignment = r.flag()?;
        r.skip(3)?; // reserved
        let mask = r.u(4)?;
        let mut biases = [None; 4];
        for (i, bias) in biases.iter_mut().enumerate() {
            if mask & (1 << (3 - i)) != 0 {
                *bias = Some(r.s(16)? as f64 * 0.02);
            }
        }

        if !self.check_station(station_id)? {
            return Ok(None);
        }
        self.station.glonass_bias_alignment = alignment;
        self.station.glonass_code_phase_bias = biases;
        Ok(Some(Message::Station))
    }

    pub(crate) fn encode_glonass_biases(&self, w: &mut BitWriter) {
        let biases = &self.station.glonass_code_phase_bias;
        let mask = biases
            .iter()
            .enumerate()
            .filter(|(_, bias)| bias.is_some())
            .fold(0, |mask, (i, _)| mask | (1 << (3 - i)));

        w.u(12, self.station.station_id as u32);
        w.flag(self.station.glonass_bias_alignment);
        w.u(3, 0); // reserved
        w.u(4, mask);
        for bias in biases.iter().flatten() {
            w.s(16, round_i32(bias / 0.02));
        }
    }

    /// Decodes a text message (1029)
    pub(crate) fn decode_text(&mut self, r: &mut BitReader) -> Result<Option<Message>, Error> {
        let station_id = r.u(12)? as u16;
        let mjd = r.u(16)?;
        let tod = r.u(17)?;
        let nchars = r.u(7)?;
        let nbytes = r.u(8)? as usize;
        let text = r.string(nbytes)?;
        debug!(
            "station {} text (mjd {} tod {}s, {} characters): {}",
            station_id, mjd, tod, nchars, text
        );
        self.text = text;
        Ok(Some(Message::Text))
    }

    /// Encodes [Session::text], dated with the session time
    pub(crate) fn encode_text(&self, w: &mut BitWriter) -> Result<(), Error> {
        let msg_type = u16::from(MessageID::Text);
        if self.text.is_empty() {
            return Err(Error::NoData(msg_type));
        }
        let utc = self.reference_time()?.to_time_scale(TimeScale::UTC);
        let days = utc.to_mjd_utc_days();
        let mjd = days.floor();
        let midnight = Epoch::from_mjd_utc(mjd);
        let tod = (utc - midnight).to_seconds().floor() as u32;

        let text = truncate_text(&self.text);
        w.u(12, self.station_id as u32);
        w.u(16, mjd as u32);
        w.u(17, tod.min(86399));
        w.u(7, text.chars().count() as u32);
        w.u(8, text.len() as u32);
        w.bytes(text.as_bytes());
        Ok(())
    }
}
