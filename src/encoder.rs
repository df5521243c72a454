use log::debug;
use std::io::Write;

use crate::{session::Session, Error};

/// Stream [Encoder]: serializes the records of a [Session] as RTCM frames
/// and writes them on a [W] writable interface.
/// ```
/// use rtcm::prelude::{Encoder, Session};
///
/// let mut session = Session::default();
/// session.station.station_id = 2003;
/// session.station.position = [1114104.5999, -4850729.7108, 3975521.4643];
///
/// let mut encoder = Encoder::new(Vec::new());
///
/// let size = encoder.encode_rtcm3(&session, 1005, 0, false).unwrap();
/// assert_eq!(size, 25);
/// assert_eq!(encoder.into_inner().len(), 25);
/// ```
pub struct Encoder<W: Write> {
    /// [W]
    writer: W,
    /// Total number of bytes written
    total: usize,
}

impl<W: Write> Encoder<W> {
    /// Creates a new [Encoder] writing on [W]
    pub fn new(writer: W) -> Self {
        Self { writer, total: 0 }
    }

    /// Encodes one RTCM3 message (see [Session::encode_rtcm3]) and writes
    /// the frame. Returns the number of bytes written.
    pub fn encode_rtcm3(
        &mut self,
        session: &Session,
        msg_type: u16,
        subtype: u16,
        sync: bool,
    ) -> Result<usize, Error> {
        let frame = session.encode_rtcm3(msg_type, subtype, sync)?;
        self.write_frame(&frame)
    }

    /// Encodes one RTCM2 message (see [Session::encode_rtcm2]) and writes
    /// the frame. Returns the number of bytes written.
    pub fn encode_rtcm2(&mut self, session: &Session, msg_type: u8) -> Result<usize, Error> {
        let frame = session.encode_rtcm2(msg_type)?;
        self.write_frame(&frame)
    }

    /// Encodes a sequence of RTCM3 messages that share one epoch.
    /// All but the last encoded message carry the synchronous flag.
    /// Messages without data are skipped.
    pub fn encode_rtcm3_epoch(
        &mut self,
        session: &Session,
        msg_types: &[u16],
    ) -> Result<usize, Error> {
        let mut frames = Vec::with_capacity(msg_types.len());
        for msg_type in msg_types {
            match session.encode_rtcm3(*msg_type, 0, true) {
                Ok(frame) => frames.push((*msg_type, frame)),
                Err(Error::NoData(_)) => {
                    debug!("rtcm3 {}: nothing to encode", msg_type);
                },
                Err(e) => return Err(e),
            }
        }
        if let Some((msg_type, frame)) = frames.last_mut() {
            *frame = session.encode_rtcm3(*msg_type, 0, false)?;
        }
        let mut size = 0;
        for (_, frame) in frames {
            size += self.write_frame(&frame)?;
        }
        Ok(size)
    }

    /// Total number of bytes written so far
    pub fn total_written(&self) -> usize {
        self.total
    }

    /// Flushes [W]
    pub fn flush(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }

    /// Releases [W]
    pub fn into_inner(self) -> W {
        self.writer
    }

    fn write_frame(&mut self, frame: &[u8]) -> Result<usize, Error> {
        self.writer.write_all(frame)?;
        self.total += frame.len();
        Ok(frame.len())
    }
}
