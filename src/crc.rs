//! CRC16 of the payload, tag `63`.
//!
//! The BR Code manual calls it CRC16-CCITT; the catalogued name of the
//! parameters (polynomial `0x1021`, initial value `0xFFFF`, no reflection, no
//! final XOR) is CRC-16/IBM-3740, also known as CRC-16/CCITT-FALSE.
use {
    crate::{Error, Result},
    crc::{Crc, CRC_16_IBM_3740},
    serde::{Serialize, Serializer},
    std::{
        fmt::{self, Display, Formatter},
        str::FromStr,
    },
};

const CRC: Crc<u16> = Crc::<u16>::new(&CRC_16_IBM_3740);

/// Header of the checksum tag: id `63`, length `04`. It is part of the
/// checksummed data even though its value is not.
pub const CRC_TAG_HEADER: &str = "6304";

/// Checksum tag value. Displays as four uppercase hex digits.
#[derive(Clone, Copy, Debug, Hash, Eq, PartialEq)]
pub struct Checksum(u16);

impl Checksum {
    pub fn compute(data: &[u8]) -> Self {
        Self(CRC.checksum(data))
    }

    pub const fn from_raw(value: u16) -> Self {
        Self(value)
    }

    pub const fn to_raw(self) -> u16 {
        self.0
    }
}

/// CRC over `payload` as ASCII bytes, rendered as the checksum tag value.
pub fn crc16(payload: &str) -> String {
    Checksum::compute(payload.as_bytes()).to_string()
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:04X}", self.0)
    }
}

impl Serialize for Checksum {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Accepts either case.
impl FromStr for Checksum {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let mut bytes = [0_u8; 2];
        if s.len() != 4 {
            return Err(Error::InvalidChecksum(s.to_owned()));
        }
        hex::decode_to_slice(s, &mut bytes).map_err(|_| Error::InvalidChecksum(s.to_owned()))?;
        Ok(Self(u16::from_be_bytes(bytes)))
    }
}

#[cfg(test)]
mod tests {
    use {super::*, hex_literal::hex};

    #[test]
    fn test_check_value() {
        // Catalogue check value of CRC-16/IBM-3740.
        assert_eq!(Checksum::compute(b"123456789").to_raw(), 0x29b1);
        assert_eq!(crc16("123456789"), "29B1");
    }

    #[test]
    fn test_bit_by_bit() {
        // Direct transcription of the manual's algorithm.
        fn reference(data: &[u8]) -> u16 {
            let mut register = 0xffff_u16;
            for &byte in data {
                register ^= u16::from(byte) << 8;
                for _ in 0..8 {
                    register = if register & 0x8000 != 0 {
                        (register << 1) ^ 0x1021
                    } else {
                        register << 1
                    };
                }
            }
            register
        }
        for data in [
            &b""[..],
            &b"6304"[..],
            &hex!("00 01 7f ff 30 31")[..],
            &b"000201010212"[..],
        ] {
            assert_eq!(Checksum::compute(data).to_raw(), reference(data));
        }
    }

    #[test]
    fn test_empty_is_initial_value() {
        assert_eq!(crc16(""), "FFFF");
    }

    #[test]
    fn test_display_keeps_leading_zeros() {
        assert_eq!(Checksum::from_raw(0x03be).to_string(), "03BE");
        assert_eq!(Checksum::from_raw(0).to_string(), "0000");
    }

    #[test]
    fn test_parse() {
        assert_eq!("E5EA".parse::<Checksum>().unwrap(), Checksum::from_raw(0xe5ea));
        assert_eq!("e5ea".parse::<Checksum>().unwrap(), Checksum::from_raw(0xe5ea));
        assert_eq!("03BE".parse::<Checksum>().unwrap(), Checksum::from_raw(0x03be));
        assert!(" 3BE".parse::<Checksum>().is_err());
        assert!("3BE".parse::<Checksum>().is_err());
        assert!("03BEX".parse::<Checksum>().is_err());
        assert!("03BG".parse::<Checksum>().is_err());
    }
}
