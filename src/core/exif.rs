//! EXIF TIFF sub-parser
//!
//! Reads just enough of a TIFF/IFD structure to pull the handful of tags that
//! carry generation text: `ImageDescription`, `UserComment` (with its 8-byte
//! encoding prefix), `XPComment`, `XPTitle`. Everything else in the IFD is
//! skipped.

use crate::core::endian::Endian;
use crate::error::{Error, Result};
use crate::text::utf16;

const TAG_IMAGE_DESCRIPTION: u16 = 0x010E;
const TAG_EXIF_IFD_POINTER: u16 = 0x8769;
const TAG_USER_COMMENT: u16 = 0x9286;
const TAG_XP_TITLE: u16 = 0x9C9B;
const TAG_XP_COMMENT: u16 = 0x9C9C;

const TYPE_ASCII: u16 = 2;

struct IfdEntry {
    tag: u16,
    kind: u16,
    count: u32,
    raw_value_field: [u8; 4],
}

/// Extract the best available generation-text candidate from an EXIF blob
/// that starts with the 6-byte `Exif\0\0` signature, as produced by the JPEG
/// APP1 reader or synthesized by the WebP/PNG readers.
pub fn extract_text(data: &[u8]) -> Option<String> {
    if !data.starts_with(b"Exif\0\0") {
        return None;
    }
    let tiff = &data[6..];
    let header = TiffHeader::parse(tiff).ok()?;

    let ifd0 = read_ifd(tiff, header.byte_order, header.ifd0_offset as usize).ok()?;

    let mut user_comment = None;
    let mut image_description = None;
    let mut xp_title = None;
    let mut xp_comment = None;

    for entry in &ifd0 {
        match entry.tag {
            TAG_IMAGE_DESCRIPTION => {
                image_description = decode_ascii(tiff, header.byte_order, entry);
            }
            TAG_XP_TITLE => {
                xp_title = decode_xp_string(tiff, header.byte_order, entry);
            }
            TAG_XP_COMMENT => {
                xp_comment = decode_xp_string(tiff, header.byte_order, entry);
            }
            TAG_EXIF_IFD_POINTER => {
                let offset = header.byte_order.read_u32(&entry.raw_value_field);
                if let Ok(sub_ifd) = read_ifd(tiff, header.byte_order, offset as usize) {
                    for sub_entry in &sub_ifd {
                        if sub_entry.tag == TAG_USER_COMMENT {
                            user_comment = decode_user_comment(tiff, header.byte_order, sub_entry);
                        }
                    }
                }
            }
            _ => {}
        }
    }

    let combined_xp = match (xp_title, xp_comment) {
        (Some(t), Some(c)) => Some(format!("{t}\n{c}")),
        (Some(t), None) => Some(t),
        (None, Some(c)) => Some(c),
        (None, None) => None,
    };

    user_comment
        .or(image_description)
        .or(combined_xp)
        .map(|s| utf16::repair_misdecoded(&s))
}

struct TiffHeader {
    byte_order: Endian,
    ifd0_offset: u32,
}

impl TiffHeader {
    fn parse(tiff: &[u8]) -> Result<Self> {
        if tiff.len() < 8 {
            return Err(Error::Truncated("TIFF header"));
        }
        let byte_order = Endian::from_tiff_header(&tiff[0..2])
            .ok_or(Error::InvalidTiff("unrecognized byte order marker"))?;
        let magic = byte_order.read_u16(&tiff[2..4]);
        if magic != 42 {
            return Err(Error::InvalidTiff("bad magic number"));
        }
        let ifd0_offset = byte_order.read_u32(&tiff[4..8]);
        Ok(Self {
            byte_order,
            ifd0_offset,
        })
    }
}

fn type_size(kind: u16) -> usize {
    match kind {
        1 | 2 | 6 | 7 => 1, // BYTE, ASCII, SBYTE, UNDEFINED
        3 | 8 => 2,         // SHORT, SSHORT
        4 | 9 | 11 => 4,    // LONG, SLONG, FLOAT
        5 | 10 | 12 => 8,   // RATIONAL, SRATIONAL, DOUBLE
        _ => 1,
    }
}

fn read_ifd(tiff: &[u8], endian: Endian, offset: usize) -> Result<Vec<IfdEntry>> {
    if offset + 2 > tiff.len() {
        return Err(Error::Truncated("IFD entry count"));
    }
    let count = endian.read_u16(&tiff[offset..offset + 2]) as usize;
    let mut entries = Vec::with_capacity(count);
    let mut pos = offset + 2;
    for _ in 0..count {
        if pos + 12 > tiff.len() {
            break;
        }
        let tag = endian.read_u16(&tiff[pos..pos + 2]);
        let kind = endian.read_u16(&tiff[pos + 2..pos + 4]);
        let count = endian.read_u32(&tiff[pos + 4..pos + 8]);
        let mut raw_value_field = [0u8; 4];
        raw_value_field.copy_from_slice(&tiff[pos + 8..pos + 12]);
        entries.push(IfdEntry {
            tag,
            kind,
            count,
            raw_value_field,
        });
        pos += 12;
    }
    Ok(entries)
}

/// Resolve an entry's value bytes, whether inline or at an offset.
fn value_bytes<'a>(tiff: &'a [u8], endian: Endian, entry: &'a IfdEntry) -> Option<&'a [u8]> {
    let total = type_size(entry.kind) * entry.count as usize;
    if total <= 4 {
        Some(&entry.raw_value_field[..total])
    } else {
        let offset = endian.read_u32(&entry.raw_value_field) as usize;
        tiff.get(offset..offset + total)
    }
}

fn decode_ascii(tiff: &[u8], endian: Endian, entry: &IfdEntry) -> Option<String> {
    let bytes = value_bytes(tiff, endian, entry)?;
    let bytes = trim_trailing_nul(bytes);
    if bytes.is_empty() {
        return None;
    }
    // Heuristic UTF-16/Shift_JIS fallback
    if looks_like_utf16(bytes) {
        return crate::text::utf16::decode_le(bytes).or_else(|| crate::text::utf16::decode_be(bytes));
    }
    match std::str::from_utf8(bytes) {
        Ok(s) if !s.contains('\u{FFFD}') => Some(s.to_string()),
        _ => crate::text::shiftjis::decode(bytes).or_else(|| Some(crate::text::latin1::decode(bytes))),
    }
}

fn looks_like_utf16(bytes: &[u8]) -> bool {
    bytes.starts_with(&[0xFF, 0xFE])
        || bytes.starts_with(&[0xFE, 0xFF])
        || crate::text::utf16::nul_ratio(bytes) > 0.2
}

fn decode_user_comment(tiff: &[u8], endian: Endian, entry: &IfdEntry) -> Option<String> {
    let bytes = value_bytes(tiff, endian, entry)?;
    crate::text::decode_user_comment(bytes)
}

fn decode_xp_string(tiff: &[u8], endian: Endian, entry: &IfdEntry) -> Option<String> {
    let bytes = value_bytes(tiff, endian, entry)?;
    let bytes = trim_trailing_nul_utf16(bytes);
    crate::text::utf16::decode_le(bytes)
}

fn trim_trailing_nul(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().rposition(|&b| b != 0).map(|i| i + 1).unwrap_or(0);
    &bytes[..end]
}

fn trim_trailing_nul_utf16(bytes: &[u8]) -> &[u8] {
    let mut end = bytes.len();
    while end >= 2 && bytes[end - 2] == 0 && bytes[end - 1] == 0 {
        end -= 2;
    }
    &bytes[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_tiff_le(ifd0_tags: &[(u16, u16, u32, [u8; 4])], extra: &[(usize, &[u8])]) -> Vec<u8> {
        let mut tiff = vec![b'I', b'I', 42, 0];
        tiff.extend_from_slice(&8u32.to_le_bytes());
        tiff.extend_from_slice(&(ifd0_tags.len() as u16).to_le_bytes());
        for (tag, kind, count, value) in ifd0_tags {
            tiff.extend_from_slice(&tag.to_le_bytes());
            tiff.extend_from_slice(&kind.to_le_bytes());
            tiff.extend_from_slice(&count.to_le_bytes());
            tiff.extend_from_slice(value);
        }
        tiff.extend_from_slice(&0u32.to_le_bytes()); // next IFD offset
        for (offset, bytes) in extra {
            if tiff.len() < *offset {
                tiff.resize(*offset, 0);
            }
            tiff.splice(*offset..*offset, bytes.iter().copied());
        }
        tiff
    }

    #[test]
    fn missing_exif_prefix_returns_none() {
        assert_eq!(extract_text(b"not exif"), None);
    }

    #[test]
    fn extracts_image_description() {
        let desc = b"hello\0";
        let offset = 8 + 2 + 12 + 4; // header + count + one entry + next-ifd ptr
        let tiff = build_tiff_le(
            &[(
                TAG_IMAGE_DESCRIPTION,
                TYPE_ASCII,
                desc.len() as u32,
                (offset as u32).to_le_bytes(),
            )],
            &[(offset, desc)],
        );
        let mut data = b"Exif\0\0".to_vec();
        data.extend_from_slice(&tiff);
        assert_eq!(extract_text(&data).as_deref(), Some("hello"));
    }
}
