//! Core result and pipeline types

use crate::value::FieldValue;
use indexmap::IndexMap;
use serde::Serialize;

/// Container format, as declared by the caller's format hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Png,
    Jpeg,
    Webp,
    Unknown,
}

/// The result of [`crate::parse_image_meta`].
#[derive(Debug, Clone, Serialize)]
pub struct ImageMeta {
    pub format: Format,
    pub fields: IndexMap<String, FieldValue>,
    pub raw: IndexMap<String, String>,
}

impl ImageMeta {
    pub fn empty(format: Format) -> Self {
        Self {
            format,
            fields: IndexMap::new(),
            raw: IndexMap::new(),
        }
    }
}

/// Priority ordering for the A1111 selector: lower variants win ties.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum SourceLabel {
    Exif,
    XmpAttribute,
    XmpText,
    JpegComment,
}

impl SourceLabel {
    /// Lower priority number wins a tie in the selector.
    pub fn priority(&self) -> u8 {
        match self {
            SourceLabel::Exif => 0,
            SourceLabel::XmpAttribute => 1,
            SourceLabel::XmpText => 2,
            SourceLabel::JpegComment => 3,
        }
    }
}

/// A decoded text source flowing through the A1111 locator/selector pipeline.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub source: SourceLabel,
    pub text: String,
}
