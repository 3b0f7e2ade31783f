//! XMP packet handling: Extended XMP reassembly and attribute extraction
//!
//! This module deliberately does not parse XMP as XML. The attribute this
//! crate cares about (`sd-metadata` / `parameters`, however a given tool
//! spells it) is extracted with a single dot-all regex over the packet text
//! rather than a full RDF tree walk.

use regex::Regex;
use std::collections::HashMap;
use std::sync::OnceLock;

/// A single Extended XMP chunk as found in a JPEG APP1 segment, before
/// reassembly.
#[derive(Debug, Clone)]
pub struct ExtendedXmpChunk {
    pub guid: String,
    pub total_length: u32,
    pub offset: u32,
    pub data: Vec<u8>,
}

const GUID_LEN: usize = 32;

/// Parse one Extended XMP APP1 payload, with the
/// `http://ns.adobe.com/xmp/extension/\0` signature already stripped.
pub fn parse_extended_chunk(data: &[u8]) -> Option<ExtendedXmpChunk> {
    if data.len() < GUID_LEN + 8 {
        return None;
    }
    let guid = std::str::from_utf8(&data[..GUID_LEN]).ok()?.to_string();
    let total_length = u32::from_be_bytes(data[GUID_LEN..GUID_LEN + 4].try_into().ok()?);
    let offset = u32::from_be_bytes(data[GUID_LEN + 4..GUID_LEN + 8].try_into().ok()?);
    let payload = data[GUID_LEN + 8..].to_vec();
    Some(ExtendedXmpChunk {
        guid,
        total_length,
        offset,
        data: payload,
    })
}

/// Reassemble the chunks belonging to the most complete GUID group into a
/// single buffer, ordered by offset and truncated to the declared total
/// length. A file with chunks from more than one GUID (e.g. re-saved by two
/// different tools) keeps only the largest group.
pub fn assemble_extended(chunks: &[ExtendedXmpChunk]) -> Option<Vec<u8>> {
    if chunks.is_empty() {
        return None;
    }
    let mut groups: HashMap<&str, Vec<&ExtendedXmpChunk>> = HashMap::new();
    for chunk in chunks {
        groups.entry(chunk.guid.as_str()).or_default().push(chunk);
    }
    let mut group = groups
        .into_values()
        .max_by_key(|group| group.iter().map(|c| c.data.len()).sum::<usize>())?;
    group.sort_by_key(|c| c.offset);

    let total_length = group[0].total_length as usize;
    let mut buf = Vec::with_capacity(total_length);
    for chunk in group {
        buf.extend_from_slice(&chunk.data);
    }
    buf.truncate(total_length);
    Some(buf)
}

fn attribute_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"(?is)(?:sd-metadata|sd_metadata|parameters)\s*=\s*(["'])((?s:.*?))\1"#).unwrap()
    })
}

/// Pull the `sd-metadata`/`parameters` attribute value out of combined XMP
/// XML text. Matching is case-insensitive and spans the whole
/// buffer in a single pass rather than walking the DOM. The quote character
/// is captured and backreferenced so a single-quoted attribute isn't cut
/// short by an apostrophe inside the value, and vice versa.
pub fn extract_attribute(xml: &str) -> Option<String> {
    let caps = attribute_regex().captures(xml)?;
    Some(unescape_entities(caps.get(2)?.as_str()))
}

fn unescape_entities(s: &str) -> String {
    s.replace("&#xA;", "\n")
        .replace("&#10;", "\n")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reassembles_chunks_out_of_order() {
        let chunks = vec![
            ExtendedXmpChunk {
                guid: "g".into(),
                total_length: 6,
                offset: 3,
                data: b"def".to_vec(),
            },
            ExtendedXmpChunk {
                guid: "g".into(),
                total_length: 6,
                offset: 0,
                data: b"abc".to_vec(),
            },
        ];
        assert_eq!(assemble_extended(&chunks).unwrap(), b"abcdef");
    }

    #[test]
    fn keeps_largest_guid_group() {
        let chunks = vec![
            ExtendedXmpChunk {
                guid: "small".into(),
                total_length: 1,
                offset: 0,
                data: b"x".to_vec(),
            },
            ExtendedXmpChunk {
                guid: "big".into(),
                total_length: 4,
                offset: 0,
                data: b"abcd".to_vec(),
            },
        ];
        assert_eq!(assemble_extended(&chunks).unwrap(), b"abcd");
    }

    #[test]
    fn extracts_quoted_attribute_and_unescapes_entities() {
        let xml = r#"<rdf:li xmp:parameters="a cat, masterpiece&#xA;Negative prompt: blurry"/>"#;
        assert_eq!(
            extract_attribute(xml).as_deref(),
            Some("a cat, masterpiece\nNegative prompt: blurry")
        );
    }

    #[test]
    fn extracts_single_quoted_attribute() {
        let xml = r#"<rdf:li xmp:parameters='a cat, masterpiece&#10;Negative prompt: blurry'/>"#;
        assert_eq!(
            extract_attribute(xml).as_deref(),
            Some("a cat, masterpiece\nNegative prompt: blurry")
        );
    }

    #[test]
    fn no_attribute_present_returns_none() {
        assert_eq!(extract_attribute("<x:xmpmeta></x:xmpmeta>"), None);
    }
}
