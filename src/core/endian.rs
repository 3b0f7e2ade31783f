//! Byte order (endianness) handling for TIFF/RIFF/PNG chunk headers

use byteorder::{BigEndian, ByteOrder, LittleEndian};

/// Byte order for binary data
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endian {
    Little,
    Big,
}

impl Endian {
    /// Read u16 from bytes
    pub fn read_u16(&self, data: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(data),
            Endian::Big => BigEndian::read_u16(data),
        }
    }

    /// Read u32 from bytes
    pub fn read_u32(&self, data: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(data),
            Endian::Big => BigEndian::read_u32(data),
        }
    }

    /// Detect endianness from TIFF header
    pub fn from_tiff_header(data: &[u8]) -> Option<Self> {
        if data.len() < 2 {
            return None;
        }

        match &data[0..2] {
            b"II" => Some(Endian::Little), // Intel byte order
            b"MM" => Some(Endian::Big),    // Motorola byte order
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_both_byte_orders() {
        assert_eq!(Endian::from_tiff_header(b"II*\0"), Some(Endian::Little));
        assert_eq!(Endian::from_tiff_header(b"MM\0*"), Some(Endian::Big));
        assert_eq!(Endian::from_tiff_header(b"XX"), None);
        assert_eq!(Endian::from_tiff_header(b"I"), None);
    }

    #[test]
    fn reads_values_per_endianness() {
        assert_eq!(Endian::Little.read_u16(&[0x01, 0x02]), 0x0201);
        assert_eq!(Endian::Big.read_u16(&[0x01, 0x02]), 0x0102);
        assert_eq!(Endian::Little.read_u32(&[0x01, 0x02, 0x03, 0x04]), 0x04030201);
        assert_eq!(Endian::Big.read_u32(&[0x01, 0x02, 0x03, 0x04]), 0x01020304);
    }
}
