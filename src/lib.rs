//! sdmeta-core - extracts Stable-Diffusion-style generation metadata from
//! PNG, JPEG, and WebP image files.
//!
//! The sole public operation is [`parse_image_meta`]. It never panics and
//! never returns an error: malformed or absent metadata degrades to empty
//! maps rather than surfacing a `Result`.

mod a1111;
mod comfy;
pub mod core;
pub mod error;
mod forge;
mod normalizer;
mod recovery;
pub mod text;
pub mod types;
pub mod value;
pub mod xmp;

pub use types::{Format, ImageMeta};
pub use value::FieldValue;

use indexmap::IndexMap;
use types::{Candidate, SourceLabel};

/// Extract and normalize generation metadata from an image file.
///
/// `format_hint` is matched case-insensitively against `png`, `jpg`/`jpeg`,
/// and `webp`; anything else yields `Format::Unknown` with empty `fields`
/// and `raw` maps.
pub fn parse_image_meta(bytes: &[u8], format_hint: &str) -> ImageMeta {
    let meta = match format_hint.to_ascii_lowercase().as_str() {
        "png" => parse_png(bytes),
        "jpg" | "jpeg" => parse_jpeg(bytes),
        "webp" => parse_webp(bytes),
        other => {
            tracing::debug!(hint = other, "unrecognized format hint, returning empty metadata");
            ImageMeta::empty(Format::Unknown)
        }
    };
    tracing::debug!(
        format = ?meta.format,
        raw_keys = meta.raw.len(),
        fields = meta.fields.len(),
        "parsed image metadata"
    );
    meta
}

fn parse_png(bytes: &[u8]) -> ImageMeta {
    let mut raw = core::png::extract(bytes);
    maybe_recover(&mut raw, bytes);
    let fields = normalizer::normalize(&raw);
    ImageMeta {
        format: Format::Png,
        fields,
        raw,
    }
}

fn parse_jpeg(bytes: &[u8]) -> ImageMeta {
    let segments = core::jpeg::extract(bytes);
    let mut raw = IndexMap::new();
    let mut candidates = Vec::new();

    if let Some(exif_bytes) = &segments.exif {
        if let Some(text) = core::exif::extract_text(exif_bytes) {
            raw.insert("EXIF".to_string(), text.clone());
            candidates.push(Candidate {
                source: SourceLabel::Exif,
                text,
            });
        }
    }

    if let Some(combined_xmp) = combine_xmp(&segments.xmp_standard, &segments.xmp_extended) {
        raw.insert("XMP".to_string(), combined_xmp.clone());
        push_xmp_candidates(&combined_xmp, &mut candidates);
    }

    if let Some(comment_bytes) = segments.comments.last() {
        let panel = text::biased_panel(comment_bytes);
        if let Some((_, decoded)) = text::best_of(comment_bytes, &panel) {
            raw.insert("Comment".to_string(), decoded.clone());
            candidates.push(Candidate {
                source: SourceLabel::JpegComment,
                text: decoded,
            });
        }
    }

    if let Some(selected) = a1111::select_best(&candidates) {
        raw.insert("parameters".to_string(), selected.text);
    }
    maybe_recover(&mut raw, bytes);

    let fields = normalizer::normalize(&raw);
    ImageMeta {
        format: Format::Jpeg,
        fields,
        raw,
    }
}

fn parse_webp(bytes: &[u8]) -> ImageMeta {
    let segments = core::webp::extract(bytes);
    let mut raw = IndexMap::new();
    let mut candidates = Vec::new();

    if let Some(exif_bytes) = &segments.exif {
        if let Some(text) = core::exif::extract_text(exif_bytes) {
            raw.insert("EXIF".to_string(), text.clone());
            candidates.push(Candidate {
                source: SourceLabel::Exif,
                text,
            });
        }
    }

    if let Some(xmp_bytes) = &segments.xmp {
        if let Some(decoded) = text::decode_xmp_text(xmp_bytes) {
            raw.insert("XMP".to_string(), decoded.clone());
            push_xmp_candidates(&decoded, &mut candidates);
        }
    }

    if let Some(selected) = a1111::select_best(&candidates) {
        raw.insert("parameters".to_string(), selected.text);
    }
    maybe_recover(&mut raw, bytes);

    let fields = normalizer::normalize(&raw);
    ImageMeta {
        format: Format::Webp,
        fields,
        raw,
    }
}

/// Concatenate decoded standard-XMP fragments with the reassembled Extended
/// XMP payload, in that order.
fn combine_xmp(standard: &[Vec<u8>], extended: &[xmp::ExtendedXmpChunk]) -> Option<String> {
    let mut parts = Vec::new();
    for fragment in standard {
        if let Some(text) = text::decode_xmp_text(fragment) {
            parts.push(text);
        }
    }
    if let Some(assembled) = xmp::assemble_extended(extended) {
        if let Some(text) = text::decode_xmp_text(&assembled) {
            parts.push(text);
        }
    }
    if parts.is_empty() {
        None
    } else {
        Some(parts.join(""))
    }
}

fn push_xmp_candidates(xmp_text: &str, candidates: &mut Vec<Candidate>) {
    if let Some(attr) = xmp::extract_attribute(xmp_text) {
        candidates.push(Candidate {
            source: SourceLabel::XmpAttribute,
            text: attr,
        });
    }
    candidates.push(Candidate {
        source: SourceLabel::XmpText,
        text: xmp_text.to_string(),
    });
}

/// Run the recovery engine when no `parameters` candidate was
/// selected, or the selected one looks garbled.
fn maybe_recover(raw: &mut IndexMap<String, String>, bytes: &[u8]) {
    let needs_recovery = match raw.get("parameters") {
        None => true,
        Some(text) => a1111::looks_garbled(text),
    };
    if !needs_recovery {
        return;
    }
    tracing::trace!("no usable parameters candidate, falling back to the recovery engine");
    if let Some(recovered) = recovery::recover(bytes) {
        tracing::debug!("recovery engine salvaged a parameters block");
        raw.insert("parameters".to_string(), recovered);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_hint_yields_empty_result() {
        let meta = parse_image_meta(b"whatever", "tiff");
        assert_eq!(meta.format, Format::Unknown);
        assert!(meta.fields.is_empty());
        assert!(meta.raw.is_empty());
    }

    #[test]
    fn empty_buffer_yields_empty_result_for_each_known_format() {
        for hint in ["png", "jpg", "jpeg", "webp"] {
            let meta = parse_image_meta(b"", hint);
            assert!(meta.fields.is_empty());
            assert!(meta.raw.is_empty());
        }
    }

    #[test]
    fn hint_matching_is_case_insensitive() {
        let meta = parse_image_meta(b"", "PNG");
        assert_eq!(meta.format, Format::Png);
    }
}
