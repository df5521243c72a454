//! Reference station description
#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Reference station metadata, gathered from station messages
/// (1005, 1006, 1007, 1008, 1033 and 1230).
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Station {
    pub station_id: u16,
    /// ITRF realization year
    pub itrf_year: u8,
    /// GPS, GLONASS, Galileo and reference station indicators (4 bits)
    pub indicators: u8,
    /// Single receiver oscillator indicator
    pub oscillator: bool,
    /// Quarter cycle indicator (2 bits)
    pub quarter_cycle: u8,
    /// Antenna reference point, ECEF [m]
    pub position: [f64; 3],
    /// Antenna height [m]
    pub antenna_height: f64,
    pub antenna_descriptor: String,
    pub antenna_setup_id: u8,
    pub antenna_serial: String,
    pub receiver_type: String,
    pub receiver_firmware: String,
    pub receiver_serial: String,
    /// GLONASS code-phase bias alignment indicator
    pub glonass_bias_alignment: bool,
    /// GLONASS code-phase biases [m], for L1C, L1P, L2C and L2P
    pub glonass_code_phase_bias: [Option<f64>; 4],
}

impl Station {
    /// True if an antenna reference point was received
    pub fn has_position(&self) -> bool {
        self.position.iter().any(|v| *v != 0.0)
    }
}
