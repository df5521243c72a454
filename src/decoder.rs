use log::debug;
use std::io::Read;

use crate::{
    config::Config,
    session::{Session, Status},
    Error,
};

/// Stream [Protocol]
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum Protocol {
    /// RTCM 3.x frames
    #[default]
    Rtcm3,
    /// RTCM 2.x, 6 of 8 encoded words
    Rtcm2,
}

/// Stream [Decoder]: feeds bytes read on an interface to a [Session]
/// and returns the [Status] of each processed frame.
/// ```
/// use rtcm::prelude::{Decoder, Protocol, Status, Message};
///
/// let bytes: &[u8] = &[
///     0xD3, 0x00, 0x13, 0x3E, 0xD7, 0xD3, 0x02, 0x02, 0x98, 0x0E, 0xDE, 0xEF, 0x34, 0xB4,
///     0xBD, 0x62, 0xAC, 0x09, 0x41, 0x98, 0x6F, 0x33, 0x36, 0x0B, 0x98,
/// ];
///
/// let mut decoder = Decoder::new(bytes, Protocol::Rtcm3);
///
/// match decoder.next() {
///     Some(Ok(Status::Decoded { msg_type, message })) => {
///         assert_eq!(msg_type, 1005);
///         assert_eq!(message, Message::Station);
///     },
///     _ => panic!("station frame not decoded"),
/// }
///
/// assert!(decoder.next().is_none());
/// assert_eq!(decoder.session().station.station_id, 2003);
/// ```
pub struct Decoder<R: Read> {
    /// [R]
    reader: R,
    /// [Protocol]
    protocol: Protocol,
    /// [Session] holding all records
    session: Session,
    /// Internal buffer
    buffer: Vec<u8>,
    /// Buffer read pointer
    rd_ptr: usize,
    /// Buffer write pointer
    wr_ptr: usize,
    /// End of stream reached
    eos: bool,
}

impl<R: Read> Decoder<R> {
    const BUFFER_SIZE: usize = 4096;

    /// Creates a new [Decoder] from [R] readable interface, using default options
    pub fn new(reader: R, protocol: Protocol) -> Self {
        Self::from_session(reader, protocol, Session::default())
    }

    /// Creates a new [Decoder] with these options
    pub fn with_config(reader: R, protocol: Protocol, config: Config) -> Self {
        Self::from_session(reader, protocol, Session::new(config))
    }

    /// Creates a new [Decoder] that keeps filling a preconfigured [Session]
    pub fn from_session(reader: R, protocol: Protocol, session: Session) -> Self {
        Self {
            reader,
            protocol,
            session,
            buffer: vec![0; Self::BUFFER_SIZE],
            rd_ptr: 0,
            wr_ptr: 0,
            eos: false,
        }
    }

    /// [Protocol] being decoded
    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    /// [Session] and the records gathered so far
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Mutable [Session], for example to update the reference time
    pub fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// Releases the [Session]
    pub fn into_session(self) -> Session {
        self.session
    }

    fn input(&mut self, byte: u8) -> Status {
        match self.protocol {
            Protocol::Rtcm3 => self.session.input_rtcm3(byte),
            Protocol::Rtcm2 => self.session.input_rtcm2(byte),
        }
    }
}

impl<R: Read> Iterator for Decoder<R> {
    /// [Status] of the next processed frame, or I/O error.
    /// Partial frames are never returned.
    type Item = Result<Status, Error>;
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            // consume internal buffer
            while self.rd_ptr < self.wr_ptr {
                let byte = self.buffer[self.rd_ptr];
                self.rd_ptr += 1;
                let status = self.input(byte);
                if status.is_complete() {
                    return Some(Ok(status));
                }
            }

            if self.eos {
                return None;
            }

            // fill in buffer
            match self.reader.read(&mut self.buffer) {
                Ok(0) => {
                    debug!("end of stream");
                    self.eos = true;
                    return None;
                },
                Ok(size) => {
                    self.rd_ptr = 0;
                    self.wr_ptr = size;
                },
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => {},
                Err(e) => {
                    self.eos = true;
                    return Some(Err(Error::IoError(e)));
                },
            }
        }
    }
}
