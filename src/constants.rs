pub struct Constants {}

impl Constants {
    /// RTCM3 frame preamble
    pub const RTCM3_PREAMBLE: u8 = 0xD3;

    /// RTCM2 frame preamble
    pub const RTCM2_PREAMBLE: u8 = 0x66;

    /// RTCM3 header size (preamble + reserved bits + length)
    pub const RTCM3_HEADER_SIZE: usize = 3;

    /// RTCM3 CRC24Q trailer size
    pub const RTCM3_CRC_SIZE: usize = 3;

    /// Maximal RTCM3 payload (10 bit length field)
    pub const RTCM3_MAX_PAYLOAD: usize = 1023;

    /// Maximal RTCM3 frame size
    pub const RTCM3_MAX_FRAME: usize =
        Self::RTCM3_HEADER_SIZE + Self::RTCM3_MAX_PAYLOAD + Self::RTCM3_CRC_SIZE;

    /// Default session frame buffer capacity
    pub const DEFAULT_CAPACITY: usize = 1200;

    /// Maximal number of records in one observation epoch
    pub const MAX_OBS: usize = 96;

    /// Number of frequency slots per observation
    pub const NFREQ: usize = 5;

    /// Number of extended signal slots per observation
    pub const NEXOBS: usize = 3;

    /// Total number of signal slots per observation
    pub const MAX_SIGNALS: usize = Self::NFREQ + Self::NEXOBS;

    /// Speed of light [m/s]
    pub const SPEED_OF_LIGHT: f64 = 299792458.0;

    /// Range of one light millisecond [m]
    pub const RANGE_MS: f64 = Self::SPEED_OF_LIGHT * 0.001;

    /// Legacy GPS pseudorange ambiguity unit [m]
    pub const PRUNIT_GPS: f64 = 299792.458;

    /// Legacy GLONASS pseudorange ambiguity unit [m]
    pub const PRUNIT_GLO: f64 = 599584.916;

    /// Semi circle to radian (IS-GPS)
    pub const SC2RAD: f64 = 3.1415926535898;

    /// Seconds in one week
    pub const WEEK_SECONDS: f64 = 604800.0;

    /// Seconds in one day
    pub const DAY_SECONDS: f64 = 86400.0;

    /// GLONASS time offset to UTC [s]
    pub const GLONASS_UTC_OFFSET: f64 = 10800.0;

    /// GLONASS frequency channel numbers
    pub const GLONASS_CHANNELS: std::ops::RangeInclusive<i8> = -7..=6;

    /// BeiDou time offset to GPST [s]
    pub const BDT_GPST_OFFSET: f64 = 14.0;

    /// First BDT week, expressed in GPS weeks
    pub const BDT_WEEK_OFFSET: u32 = 1356;

    /// First GST week, expressed in GPS weeks
    pub const GST_WEEK_OFFSET: u32 = 1024;

    /// SSR update intervals [s], indexed by the 4 bit field
    pub const SSR_UPDATE_INTERVALS: [f64; 16] = [
        1.0, 2.0, 5.0, 10.0, 15.0, 30.0, 60.0, 120.0, 240.0, 300.0, 600.0, 900.0, 1800.0, 3600.0,
        7200.0, 10800.0,
    ];
}

/// Carrier frequencies [Hz]
pub struct Frequencies {}

impl Frequencies {
    pub const L1: f64 = 1.57542E9;
    pub const L2: f64 = 1.22760E9;
    pub const L5: f64 = 1.17645E9;
    pub const L6: f64 = 1.27875E9;
    pub const E7: f64 = 1.20714E9;
    pub const E8: f64 = 1.191795E9;
    pub const G1: f64 = 1.60200E9;
    pub const G1_STEP: f64 = 0.56250E6;
    pub const G2: f64 = 1.24600E9;
    pub const G2_STEP: f64 = 0.43750E6;
    pub const G3: f64 = 1.202025E9;
    pub const G1A: f64 = 1.600995E9;
    pub const G2A: f64 = 1.248060E9;
    pub const B1I: f64 = 1.561098E9;
    pub const B3: f64 = 1.26852E9;
}

/// Powers of two used as field resolutions
pub(crate) const P2_5: f64 = 0.03125;
pub(crate) const P2_6: f64 = 0.015625;
pub(crate) const P2_10: f64 = 0.0009765625;
pub(crate) const P2_11: f64 = 0.00048828125;
pub(crate) const P2_19: f64 = 1.9073486328125e-06;
pub(crate) const P2_20: f64 = 9.5367431640625e-07;
pub(crate) const P2_24: f64 = 5.960464477539063e-08;
pub(crate) const P2_29: f64 = 1.862645149230957e-09;
pub(crate) const P2_30: f64 = 9.313225746154785e-10;
pub(crate) const P2_31: f64 = 4.656612873077393e-10;
pub(crate) const P2_32: f64 = 2.3283064365386963e-10;
pub(crate) const P2_33: f64 = 1.1641532182693481e-10;
pub(crate) const P2_34: f64 = 5.820766091346741e-11;
pub(crate) const P2_40: f64 = 9.094947017729282e-13;
pub(crate) const P2_43: f64 = 1.1368683772161603e-13;
pub(crate) const P2_46: f64 = 1.4210854715202004e-14;
pub(crate) const P2_50: f64 = 8.881784197001252e-16;
pub(crate) const P2_55: f64 = 2.7755575615628914e-17;
pub(crate) const P2_59: f64 = 1.734723475976807e-18;
pub(crate) const P2_66: f64 = 1.3552527156068805e-20;
