//! Recovery engine: salvages metadata when standard extraction fails
//! or returns text that "looks garbled".

use crate::a1111;
use crate::forge;
use crate::text::{shiftjis, utf16};

const WINDOW_BEFORE: usize = 4096;
const WINDOW_AFTER: usize = 8192;

/// Try every recovery step in order, returning the first successfully
/// located A1111 block.
pub fn recover(bytes: &[u8]) -> Option<String> {
    targeted_utf16_scan(bytes)
        .inspect(|_| tracing::trace!("recovered via targeted UTF-16 window scan"))
        .or_else(|| {
            whole_file_utf16(bytes).inspect(|_| tracing::trace!("recovered via whole-file UTF-16 redecode"))
        })
        .or_else(|| {
            whole_file_shiftjis(bytes)
                .inspect(|_| tracing::trace!("recovered via whole-file Shift_JIS redecode"))
        })
        .or_else(|| json_scan(bytes).inspect(|_| tracing::trace!("recovered via embedded JSON scan")))
}

fn targeted_utf16_scan(bytes: &[u8]) -> Option<String> {
    let needle_le: Vec<u8> = "Negative prompt:"
        .encode_utf16()
        .flat_map(|u| u.to_le_bytes())
        .collect();
    let needle_be: Vec<u8> = "Negative prompt:"
        .encode_utf16()
        .flat_map(|u| u.to_be_bytes())
        .collect();

    for (needle, little_endian) in [(&needle_le, true), (&needle_be, false)] {
        let mut start = 0usize;
        while let Some(rel) = find_subslice(&bytes[start..], needle) {
            let hit = start + rel;
            let window_start = hit.saturating_sub(WINDOW_BEFORE);
            let window_end = (hit + WINDOW_AFTER).min(bytes.len());
            let window = &bytes[window_start..window_end];
            let decoded = if little_endian {
                utf16::decode_le(window)
            } else {
                utf16::decode_be(window)
            };
            if let Some(text) = decoded {
                if let Some(block) = a1111::locate(&text) {
                    return Some(block);
                }
            }
            start = hit + 1;
        }
    }
    None
}

fn whole_file_utf16(bytes: &[u8]) -> Option<String> {
    for decoded in [utf16::decode_le(bytes), utf16::decode_be(bytes)] {
        let Some(text) = decoded else { continue };
        if let Some(block) = a1111::locate(&text) {
            return Some(block);
        }
        if let Some(block) = a1111::settings_line_fallback(&text) {
            return Some(block);
        }
    }
    None
}

fn whole_file_shiftjis(bytes: &[u8]) -> Option<String> {
    let text = shiftjis::decode(bytes)?;
    a1111::locate(&text).or_else(|| a1111::settings_line_fallback(&text))
}

fn json_scan(bytes: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(bytes);
    let needles = [
        "sd-metadata",
        "sd_metadata",
        "\"prompt\"",
        "\"Negative prompt\"",
        "Negative prompt:",
    ];
    for needle in needles {
        let mut search_from = 0usize;
        while let Some(rel) = text[search_from..].find(needle) {
            let idx = search_from + rel;
            if let Some(obj_text) = enclosing_braces(&text, idx) {
                if let Ok(value) = serde_json::from_str::<serde_json::Value>(obj_text) {
                    if let Some(block) = value_to_a1111(&value) {
                        return Some(block);
                    }
                }
            }
            search_from = idx + needle.len();
        }
    }
    None
}

fn value_to_a1111(value: &serde_json::Value) -> Option<String> {
    let obj = value.as_object()?;
    for key in ["sd-metadata", "sd_metadata", "parameters"] {
        if let Some(s) = obj.get(key).and_then(|v| v.as_str()) {
            return Some(s.to_string());
        }
    }
    forge::convert(value)
}

/// Find the nearest `{...}` enclosing byte offset `idx` in `text` via brace
/// matching, scanning backward for the unmatched opener and forward for its
/// closer.
fn enclosing_braces(text: &str, idx: usize) -> Option<&str> {
    let bytes = text.as_bytes();
    let mut depth = 0i32;
    let mut i = idx.min(bytes.len().saturating_sub(1));
    let start = loop {
        match bytes.get(i) {
            Some(b'}') => depth += 1,
            Some(b'{') => {
                if depth == 0 {
                    break i;
                }
                depth -= 1;
            }
            _ => {}
        }
        if i == 0 {
            return None;
        }
        i -= 1;
    };

    let mut depth = 0i32;
    for (j, &b) in bytes[start..].iter().enumerate() {
        if b == b'{' {
            depth += 1;
        } else if b == b'}' {
            depth -= 1;
            if depth == 0 {
                return text.get(start..start + j + 1);
            }
        }
    }
    None
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack.windows(needle.len()).position(|w| w == needle)
}
