//! PNG chunk walker and text-chunk extraction
//!
//! PNG stores generation metadata in `tEXt`/`zTXt`/`iTXt` chunks. This module
//! only cares about those three chunk types; everything else is skipped by
//! length and never decoded.

use crate::error::{Error, Result};
use flate2::read::ZlibDecoder;
use indexmap::IndexMap;
use std::io::Read;

const PNG_SIGNATURE: [u8; 8] = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A];

/// Walk `bytes` as a PNG file and collect its text chunks keyed by their PNG
/// keyword. Returns an empty map on signature mismatch or any other failure —
/// PNG parsing never surfaces an error to the caller.
pub fn extract(bytes: &[u8]) -> IndexMap<String, String> {
    let mut raw = IndexMap::new();
    if !bytes.starts_with(&PNG_SIGNATURE) {
        return raw;
    }

    let mut pos = 8usize;
    while let Some((chunk_type, data, next)) = read_chunk(bytes, pos) {
        pos = next;
        match chunk_type {
            b"tEXt" => {
                if let Some((key, value)) = parse_text(data) {
                    raw.insert(key, value);
                }
            }
            b"zTXt" => {
                if let Some((key, value)) = parse_ztxt(data) {
                    raw.insert(key, value);
                }
            }
            b"iTXt" => {
                if let Some((key, value)) = parse_itxt(data) {
                    raw.insert(key, value);
                }
            }
            b"IEND" => break,
            _ => {}
        }
    }
    raw
}

/// Read one chunk header + payload starting at `pos`. Returns `(type, data,
/// next_pos)`, or `None` once the buffer is too short to hold a full chunk.
fn read_chunk(bytes: &[u8], pos: usize) -> Option<(&[u8], &[u8], usize)> {
    if pos + 8 > bytes.len() {
        return None;
    }
    let len = u32::from_be_bytes(bytes[pos..pos + 4].try_into().ok()?) as usize;
    let chunk_type = &bytes[pos + 4..pos + 8];
    let data_start = pos + 8;
    let data_end = data_start.checked_add(len)?;
    if data_end + 4 > bytes.len() {
        return None;
    }
    Some((chunk_type, &bytes[data_start..data_end], data_end + 4))
}

fn parse_text(data: &[u8]) -> Option<(String, String)> {
    let nul = data.iter().position(|&b| b == 0)?;
    let key = crate::text::latin1::decode(&data[..nul]);
    let value = crate::text::latin1::decode(&data[nul + 1..]);
    Some((key, value))
}

fn parse_ztxt(data: &[u8]) -> Option<(String, String)> {
    let nul = data.iter().position(|&b| b == 0)?;
    let key = crate::text::latin1::decode(&data[..nul]);
    let compression_method = *data.get(nul + 1)?;
    if compression_method != 0 {
        return None;
    }
    let compressed = &data[nul + 2..];
    let inflated = inflate_zlib(compressed).ok()?;
    Some((key, crate::text::latin1::decode(&inflated)))
}

fn parse_itxt(data: &[u8]) -> Option<(String, String)> {
    let nul1 = data.iter().position(|&b| b == 0)?;
    let key = std::str::from_utf8(&data[..nul1]).ok()?.to_string();

    let compression_flag = *data.get(nul1 + 1)?;
    let _compression_method = *data.get(nul1 + 2)?;

    let lang_start = nul1 + 3;
    let lang_len = data[lang_start..].iter().position(|&b| b == 0)?;
    let translated_start = lang_start + lang_len + 1;
    let translated_len = data[translated_start..].iter().position(|&b| b == 0)?;
    let text_start = translated_start + translated_len + 1;
    let text_bytes = &data[text_start..];

    let text = if compression_flag == 1 {
        let inflated = inflate_zlib(text_bytes).ok()?;
        String::from_utf8(inflated).ok()?
    } else {
        std::str::from_utf8(text_bytes).ok()?.to_string()
    };

    Some((key, text))
}

fn inflate_zlib(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out).map_err(Error::Inflate)?;
    Ok(out)
}
