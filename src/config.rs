//! Session options
use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::Error;

bitflags! {
    /// Message families a [Session](crate::prelude::Session) interprets.
    /// Frames of other families are reported as unhandled.
    #[derive(Debug, Copy, Clone)]
    #[derive(PartialEq, PartialOrd)]
    #[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
    pub struct MessageFamily: u8 {
        const OBSERVATION = 0x01;
        const EPHEMERIS = 0x02;
        const STATION = 0x04;
        const SSR = 0x08;
        const TEXT = 0x10;
    }
}

impl Default for MessageFamily {
    fn default() -> Self {
        Self::all()
    }
}

/// [Session](crate::prelude::Session) options.
/// Options only alter which messages are honored, never the wire format.
/// ```
/// use std::str::FromStr;
/// use rtcm::prelude::Config;
///
/// let cfg = Config::from_str("-STA=2003 -EPHALL").unwrap();
/// assert_eq!(cfg.station_filter, Some(2003));
/// assert!(cfg.accept_all_ephemeris);
///
/// let cfg = Config::default()
///     .with_station_filter(12)
///     .with_galileo_fnav_only();
/// assert!(!cfg.galileo_inav);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Config {
    /// Only accept messages from this station ("-STA=")
    pub station_filter: Option<u16>,
    /// Accept ephemerides even when issue of data did not change ("-EPHALL")
    pub accept_all_ephemeris: bool,
    /// Accept Galileo I/NAV ephemerides (1046)
    pub galileo_inav: bool,
    /// Accept Galileo F/NAV ephemerides (1045)
    pub galileo_fnav: bool,
    /// Interpreted message families
    pub families: MessageFamily,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            station_filter: None,
            accept_all_ephemeris: false,
            galileo_inav: true,
            galileo_fnav: true,
            families: MessageFamily::default(),
        }
    }
}

impl Config {
    /// Only accept messages from this station
    pub fn with_station_filter(&self, station_id: u16) -> Self {
        let mut s = self.clone();
        s.station_filter = Some(station_id);
        s
    }
    /// Replace stored ephemerides even when their issue of data did not change
    pub fn with_all_ephemeris(&self) -> Self {
        let mut s = self.clone();
        s.accept_all_ephemeris = true;
        s
    }
    /// Only accept Galileo I/NAV ephemerides
    pub fn with_galileo_inav_only(&self) -> Self {
        let mut s = self.clone();
        s.galileo_inav = true;
        s.galileo_fnav = false;
        s
    }
    /// Only accept Galileo F/NAV ephemerides
    pub fn with_galileo_fnav_only(&self) -> Self {
        let mut s = self.clone();
        s.galileo_inav = false;
        s.galileo_fnav = true;
        s
    }
    /// Only interpret these message families
    pub fn with_families(&self, families: MessageFamily) -> Self {
        let mut s = self.clone();
        s.families = families;
        s
    }
}

impl std::str::FromStr for Config {
    type Err = Error;
    /// Parses a whitespace separated option string
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut cfg = Self::default();
        for option in s.split_whitespace() {
            if let Some(id) = option.strip_prefix("-STA=") {
                let id = id
                    .parse::<u16>()
                    .map_err(|_| Error::InvalidOption(option.to_string()))?;
                cfg = cfg.with_station_filter(id);
            } else {
                cfg = match option {
                    "-EPHALL" => cfg.with_all_ephemeris(),
                    "-GALINAV" => cfg.with_galileo_inav_only(),
                    "-GALFNAV" => cfg.with_galileo_fnav_only(),
                    _ => return Err(Error::InvalidOption(option.to_string())),
                };
            }
        }
        Ok(cfg)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;
    #[test]
    fn options() {
        let cfg = Config::from_str("").unwrap();
        assert_eq!(cfg, Config::default());
        assert!(cfg.galileo_inav && cfg.galileo_fnav);
        assert_eq!(cfg.families, MessageFamily::all());

        let cfg = Config::from_str("  -STA=15   -GALINAV ").unwrap();
        assert_eq!(cfg.station_filter, Some(15));
        assert!(cfg.galileo_inav);
        assert!(!cfg.galileo_fnav);
        assert!(!cfg.accept_all_ephemeris);

        for invalid in ["-STA=", "-STA=abc", "-STA=70000", "-UNKNOWN", "STA=1"] {
            match Config::from_str(invalid) {
                Err(Error::InvalidOption(option)) => assert_eq!(option, invalid),
                other => panic!("unexpected result: {:?}", other),
            }
        }
    }

    #[test]
    fn builder() {
        let cfg = Config::default()
            .with_all_ephemeris()
            .with_families(MessageFamily::OBSERVATION | MessageFamily::STATION);
        assert!(cfg.accept_all_ephemeris);
        assert!(cfg.families.contains(MessageFamily::STATION));
        assert!(!cfg.families.contains(MessageFamily::SSR));
    }
}
