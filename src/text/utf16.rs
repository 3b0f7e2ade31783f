//! UTF-16 decoding and the mis-decode repair heuristic

/// Decode a byte slice as UTF-16LE. Lone surrogates are replaced with U+FFFD
/// rather than failing the whole candidate — the best-of scorer penalizes
/// replacement characters directly.
pub fn decode_le(bytes: &[u8]) -> Option<String> {
    decode(bytes, true)
}

pub fn decode_be(bytes: &[u8]) -> Option<String> {
    decode(bytes, false)
}

fn decode(bytes: &[u8], little_endian: bool) -> Option<String> {
    if bytes.len() < 2 {
        return None;
    }
    let units: Vec<u16> = bytes
        .chunks_exact(2)
        .map(|pair| {
            if little_endian {
                u16::from_le_bytes([pair[0], pair[1]])
            } else {
                u16::from_be_bytes([pair[0], pair[1]])
            }
        })
        .collect();
    Some(char::decode_utf16(units).map(|r| r.unwrap_or('\u{FFFD}')).collect())
}

/// Fraction of NUL bytes in `bytes`, used to detect UTF-16 hiding behind an
/// encoding that wasn't declared.
pub fn nul_ratio(bytes: &[u8]) -> f64 {
    if bytes.is_empty() {
        return 0.0;
    }
    let nuls = bytes.iter().filter(|&&b| b == 0).count();
    nuls as f64 / bytes.len() as f64
}

/// When NULs fall more often at odd byte positions the text is more likely
/// UTF-16LE (ASCII-range code units have their high byte, the odd one, zero);
/// more NULs at even positions points to UTF-16BE.
pub fn likely_little_endian(bytes: &[u8]) -> bool {
    let mut even = 0usize;
    let mut odd = 0usize;
    for (i, &b) in bytes.iter().enumerate() {
        if b == 0 {
            if i % 2 == 0 {
                even += 1;
            } else {
                odd += 1;
            }
        }
    }
    odd >= even
}

/// Repair a string that was decoded as UTF-16LE/BE using the *wrong* endianness
/// by a naive byte-oriented reader upstream: when most code units
/// have a zero low byte, the string is actually big-endian code units that got
/// read little-endian. Re-serialize as BE bytes and redecode as LE.
pub fn repair_misdecoded(s: &str) -> String {
    let units: Vec<u16> = s.encode_utf16().collect();
    if units.is_empty() {
        return s.to_string();
    }
    let zero_low_byte = units.iter().filter(|&&u| u & 0x00FF == 0).count();
    if (zero_low_byte as f64 / units.len() as f64) < 0.3 {
        return s.to_string();
    }
    let mut be_bytes = Vec::with_capacity(units.len() * 2);
    for u in units {
        be_bytes.extend_from_slice(&u.to_be_bytes());
    }
    decode_le(&be_bytes).unwrap_or_else(|| s.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_ascii_both_ways() {
        let le = [b'a', 0, b'b', 0];
        let be = [0, b'a', 0, b'b'];
        assert_eq!(decode_le(&le).as_deref(), Some("ab"));
        assert_eq!(decode_be(&be).as_deref(), Some("ab"));
    }

    #[test]
    fn parity_heuristic_picks_endianness() {
        // ASCII-as-LE: NULs fall on odd indices.
        let le_ascii = b"a\0b\0c\0";
        assert!(likely_little_endian(le_ascii));
        // ASCII-as-BE: NULs fall on even indices.
        let be_ascii = b"\0a\0b\0c";
        assert!(!likely_little_endian(be_ascii));
    }

    #[test]
    fn repair_is_a_no_op_for_mostly_nonzero_low_bytes() {
        let s = "hello world";
        assert_eq!(repair_misdecoded(s), s);
    }
}
