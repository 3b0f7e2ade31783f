//! JPEG marker-segment walker
//!
//! Collects the raw payloads generation metadata can hide in: APP1 EXIF,
//! APP1 standard and Extended XMP, and COM comments. Decoding those payloads
//! into text is somebody else's job; this module only knows how to find
//! them.

use crate::xmp::ExtendedXmpChunk;

const MARKER_SOI: u8 = 0xD8;
const MARKER_EOI: u8 = 0xD9;
const MARKER_SOS: u8 = 0xDA;
const MARKER_COM: u8 = 0xFE;

const APP1_EXIF_SIG: &[u8] = b"Exif\0\0";
const APP1_XMP_SIG: &[u8] = b"http://ns.adobe.com/xap/1.0/\0";
const APP1_XMP_EXT_SIG: &[u8] = b"http://ns.adobe.com/xmp/extension/\0";

/// Raw segment payloads collected from one JPEG file.
#[derive(Debug, Default)]
pub struct JpegSegments {
    /// The last APP1 EXIF segment seen, `Exif\0\0` prefix included.
    pub exif: Option<Vec<u8>>,
    /// Standard XMP packet fragments, signature stripped, in file order.
    pub xmp_standard: Vec<Vec<u8>>,
    /// Extended XMP chunks, signature stripped, not yet reassembled.
    pub xmp_extended: Vec<ExtendedXmpChunk>,
    /// COM segment payloads, in file order.
    pub comments: Vec<Vec<u8>>,
}

/// Walk `bytes` as a JPEG file and collect its metadata-bearing segments.
/// Returns an empty [`JpegSegments`] on a missing SOI marker or any other
/// structural problem — JPEG parsing never surfaces an error.
pub fn extract(bytes: &[u8]) -> JpegSegments {
    let mut segments = JpegSegments::default();
    if bytes.len() < 2 || bytes[0] != 0xFF || bytes[1] != MARKER_SOI {
        return segments;
    }

    let mut pos = 2usize;
    loop {
        // Marker segments can be preceded by 0xFF fill bytes.
        while pos < bytes.len() && bytes[pos] == 0xFF && pos + 1 < bytes.len() && bytes[pos + 1] == 0xFF {
            pos += 1;
        }
        if pos + 2 > bytes.len() || bytes[pos] != 0xFF {
            break;
        }
        let marker = bytes[pos + 1];
        pos += 2;

        match marker {
            0xD0..=0xD8 | 0x01 => continue,
            MARKER_EOI | MARKER_SOS => break,
            _ => {
                if pos + 2 > bytes.len() {
                    break;
                }
                let segment_len = u16::from_be_bytes([bytes[pos], bytes[pos + 1]]) as usize;
                if segment_len < 2 {
                    break;
                }
                let data_start = pos + 2;
                let data_len = segment_len - 2;
                let data_end = match data_start.checked_add(data_len) {
                    Some(end) if end <= bytes.len() => end,
                    _ => break,
                };
                let data = &bytes[data_start..data_end];

                match marker {
                    0xE1 => handle_app1(data, &mut segments),
                    MARKER_COM => segments.comments.push(data.to_vec()),
                    _ => {}
                }
                pos = data_end;
            }
        }
    }
    segments
}

fn handle_app1(data: &[u8], segments: &mut JpegSegments) {
    if data.starts_with(APP1_EXIF_SIG) {
        segments.exif = Some(data.to_vec());
    } else if let Some(rest) = data.strip_prefix(APP1_XMP_SIG) {
        segments.xmp_standard.push(rest.to_vec());
    } else if let Some(rest) = data.strip_prefix(APP1_XMP_EXT_SIG) {
        if let Some(chunk) = crate::xmp::parse_extended_chunk(rest) {
            segments.xmp_extended.push(chunk);
        }
    }
}
