//! Portable text-decoding engine
//!
//! Encoding dispatch is data-driven rather than exception-based: every decode
//! attempt returns `Option<String>`, and [`score::score`] is a pure function
//! kept separate from the decoders themselves, so new encodings or scoring
//! tweaks don't have to touch each other.

pub mod latin1;
pub mod score;
pub mod shiftjis;
pub mod utf16;

/// The encoding panel the best-of decoder chooses from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Latin1,
    Utf8,
    Utf16Le,
    Utf16Be,
    ShiftJis,
}

pub const ALL_ENCODINGS: [Encoding; 5] = [
    Encoding::Utf8,
    Encoding::Utf16Le,
    Encoding::Utf16Be,
    Encoding::ShiftJis,
    Encoding::Latin1,
];

/// Attempt to decode `bytes` with a single named encoding.
pub fn decode(encoding: Encoding, bytes: &[u8]) -> Option<String> {
    match encoding {
        Encoding::Latin1 => Some(latin1::decode(bytes)),
        Encoding::Utf8 => std::str::from_utf8(bytes).ok().map(str::to_string),
        Encoding::Utf16Le => utf16::decode_le(bytes),
        Encoding::Utf16Be => utf16::decode_be(bytes),
        Encoding::ShiftJis => shiftjis::decode(bytes),
    }
}

/// Try every encoding in `panel`, score each successful decode, and return the
/// winner. Latin-1 always succeeds, so this never returns `None` unless
/// `panel` is empty.
pub fn best_of(bytes: &[u8], panel: &[Encoding]) -> Option<(Encoding, String)> {
    best_of_with(bytes, panel, |_| 0.0)
}

/// Same as [`best_of`], but adds `extra_bias(text)` to each candidate's score
/// before comparing — used to bias selection toward SD-shaped text.
pub fn best_of_with(
    bytes: &[u8],
    panel: &[Encoding],
    extra_bias: impl Fn(&str) -> f64,
) -> Option<(Encoding, String)> {
    let mut best: Option<(Encoding, String, f64)> = None;
    for &encoding in panel {
        let Some(text) = decode(encoding, bytes) else {
            continue;
        };
        let candidate_score = score::score(&text) + extra_bias(&text);
        if best.as_ref().map(|(_, _, s)| candidate_score > *s).unwrap_or(true) {
            best = Some((encoding, text, candidate_score));
        }
    }
    best.map(|(enc, text, _)| (enc, text))
}

/// Build an ordered panel of encodings for `bytes`, putting Shift_JIS first
/// when the byte stream looks lead/trail-paired.
pub fn biased_panel(bytes: &[u8]) -> Vec<Encoding> {
    let mut panel = ALL_ENCODINGS.to_vec();
    if shiftjis::lead_trail_pair_ratio(bytes) > 0.05 {
        panel.retain(|e| *e != Encoding::ShiftJis);
        panel.insert(0, Encoding::ShiftJis);
    }
    panel
}

/// EXIF `UserComment` decoding: strip a recognized 8-byte encoding
/// prefix, then best-of decode the remainder with a bias toward the encoding
/// the prefix (or NUL statistics) suggests.
pub fn decode_user_comment(data: &[u8]) -> Option<String> {
    const ASCII_PREFIX: &[u8] = b"ASCII\0\0\0";
    const UNICODE_PREFIX: &[u8] = b"UNICODE\0";
    const JIS_PREFIX: &[u8] = b"JIS\0\0\0\0\0";

    let (hint, body) = if data.starts_with(JIS_PREFIX) {
        (Some(Encoding::ShiftJis), &data[JIS_PREFIX.len()..])
    } else if data.starts_with(UNICODE_PREFIX) {
        (Some(Encoding::Utf16Le), &data[UNICODE_PREFIX.len()..])
    } else if data.starts_with(ASCII_PREFIX) {
        (None, &data[ASCII_PREFIX.len()..])
    } else {
        (None, data)
    };

    if body.is_empty() {
        return None;
    }

    let mut panel = biased_panel(body);
    if let Some(hint) = hint {
        panel.retain(|e| *e != hint);
        panel.insert(0, hint);
        if hint == Encoding::Utf16Le {
            panel.retain(|e| *e != Encoding::Utf16Be);
            panel.insert(1, Encoding::Utf16Be);
        }
    } else {
        let ratio = utf16::nul_ratio(body);
        if ratio > 0.2 {
            let first = if utf16::likely_little_endian(body) {
                Encoding::Utf16Le
            } else {
                Encoding::Utf16Be
            };
            panel.retain(|e| *e != first);
            panel.insert(0, first);
        }
    }

    let (_, text) = best_of_with(body, &panel, score::sd_bias)?;
    Some(text.chars().filter(|&c| c != '\0').collect())
}

/// XMP packet text decoding: honor a BOM first, else fall back to
/// NUL-ratio UTF-16 detection, else best-of. A declared `encoding="..."`
/// attribute in the first-pass decode can override the result.
pub fn decode_xmp_text(data: &[u8]) -> Option<String> {
    if let Some(rest) = data.strip_prefix(&[0xEF, 0xBB, 0xBF]) {
        return decode(Encoding::Utf8, rest);
    }
    if let Some(rest) = data.strip_prefix(&[0xFE, 0xFF]) {
        return decode(Encoding::Utf16Be, rest);
    }
    if let Some(rest) = data.strip_prefix(&[0xFF, 0xFE]) {
        return decode(Encoding::Utf16Le, rest);
    }

    let ratio = utf16::nul_ratio(data);
    let first_pass = if ratio > 0.2 {
        let enc = if utf16::likely_little_endian(data) {
            Encoding::Utf16Le
        } else {
            Encoding::Utf16Be
        };
        decode(enc, data)
    } else {
        best_of(data, &biased_panel(data)).map(|(_, t)| t)
    }?;

    if let Some(declared) = declared_encoding(&first_pass) {
        if let Some(redecoded) = decode(declared, data) {
            if score::score(&redecoded) >= score::score(&first_pass) {
                return Some(redecoded);
            }
        }
    }
    Some(first_pass)
}

fn declared_encoding(xml: &str) -> Option<Encoding> {
    let idx = xml.find("encoding=")?;
    let rest = &xml[idx + "encoding=".len()..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let body = &rest[1..];
    let end = body.find(quote)?;
    match body[..end].to_ascii_lowercase().as_str() {
        "utf-8" => Some(Encoding::Utf8),
        "utf-16" | "utf-16le" => Some(Encoding::Utf16Le),
        "utf-16be" => Some(Encoding::Utf16Be),
        "shift_jis" | "windows-31j" | "sjis" => Some(Encoding::ShiftJis),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unicode_prefixed_user_comment_decodes_as_utf16le() {
        let mut data = b"UNICODE\0".to_vec();
        data.extend("hi".encode_utf16().flat_map(|u| u.to_le_bytes()));
        assert_eq!(decode_user_comment(&data).as_deref(), Some("hi"));
    }

    #[test]
    fn ascii_prefixed_user_comment_strips_prefix() {
        let mut data = b"ASCII\0\0\0".to_vec();
        data.extend_from_slice(b"plain text");
        assert_eq!(decode_user_comment(&data).as_deref(), Some("plain text"));
    }

    #[test]
    fn unprefixed_high_nul_ratio_is_treated_as_utf16() {
        let mut data = Vec::new();
        data.extend("hello".encode_utf16().flat_map(|u| u.to_le_bytes()));
        assert_eq!(decode_user_comment(&data).as_deref(), Some("hello"));
    }

    #[test]
    fn xmp_bom_wins_over_nul_parity() {
        // UTF-16BE BOM, but content would parity-favor a different endianness
        // if the BOM were ignored.
        let mut data = vec![0xFE, 0xFF];
        data.extend("ab".encode_utf16().flat_map(|u| u.to_be_bytes()));
        assert_eq!(decode_xmp_text(&data).as_deref(), Some("ab"));
    }

    #[test]
    fn xmp_without_bom_uses_best_of() {
        let data = b"<x:xmpmeta>plain</x:xmpmeta>".to_vec();
        assert_eq!(
            decode_xmp_text(&data).as_deref(),
            Some("<x:xmpmeta>plain</x:xmpmeta>")
        );
    }
}
