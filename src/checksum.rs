//! Frame integrity: RTCM3 CRC24Q and RTCM2 word parity

lazy_static! {
    /// CRC24Q look up table, polynomial 0x1864CFB
    static ref CRC24Q_TABLE: [u32; 256] = {
        let mut table = [0_u32; 256];
        for (i, entry) in table.iter_mut().enumerate() {
            let mut crc = (i as u32) << 16;
            for _ in 0..8 {
                crc <<= 1;
                if crc & 0x1000000 != 0 {
                    crc ^= Crc24q::POLYNOMIAL;
                }
            }
            *entry = crc & 0xffffff;
        }
        table
    };
}

/// RTCM3 CRC24Q calculator
pub struct Crc24q;

impl Crc24q {
    pub const POLYNOMIAL: u32 = 0x1864CFB;

    /// Calculates the CRC24Q of this byte span.
    /// For an RTCM3 frame, this covers header and payload.
    /// ```
    /// use rtcm::prelude::Crc24q;
    /// assert_eq!(Crc24q::calc(&[]), 0);
    /// assert_eq!(Crc24q::calc(&[0xD3, 0x00, 0x00]), 0x47EA4B);
    /// ```
    pub fn calc(bytes: &[u8]) -> u32 {
        bytes.iter().fold(0, |crc, byte| {
            ((crc << 8) & 0xffffff) ^ CRC24Q_TABLE[(((crc >> 16) as u8) ^ byte) as usize]
        })
    }
}

/// RTCM2 30 bit word parity (GPS navigation message Hamming code).
///
/// Words are handled in a 32 bit register where bits 31-30
/// hold D29* and D30* of the previous word, bits 29-6 the 24 data
/// bits and bits 5-0 the parity bits.
pub struct Rtcm2Parity;

impl Rtcm2Parity {
    const HAMMING: [u32; 6] = [
        0xBB1F3480, 0x5D8F9A40, 0xAEC7CD00, 0x5763E680, 0x6BB1F340, 0x8B7A89C0,
    ];

    /// D30* of the previous word complements the data bits
    const D30_STAR: u32 = 0x40000000;

    const DATA_MASK: u32 = 0x3FFFFFC0;

    fn parity(word: u32) -> u32 {
        Self::HAMMING.iter().fold(0, |parity, mask| {
            (parity << 1) | (((word & mask) >> 6).count_ones() & 0x01)
        })
    }

    /// Verifies parity of this received word register,
    /// returns the 3 data bytes on success.
    pub fn decode_word(word: u32) -> Option<[u8; 3]> {
        let word = if word & Self::D30_STAR != 0 {
            word ^ Self::DATA_MASK
        } else {
            word
        };
        if Self::parity(word) != word & 0x3f {
            return None;
        }
        Some([(word >> 22) as u8, (word >> 14) as u8, (word >> 6) as u8])
    }

    /// Encodes 24 data bits into a 30 bit word (returned in bits 29-0),
    /// `previous` being the previously encoded 30 bit word.
    pub fn encode_word(previous: u32, data: u32) -> u32 {
        let register = ((previous & 0x03) << 30) | ((data & 0xffffff) << 6);
        let parity = Self::parity(register);
        let mut word = (register & Self::DATA_MASK) | parity;
        if register & Self::D30_STAR != 0 {
            word ^= Self::DATA_MASK;
        }
        word & 0x3fffffff
    }
}
