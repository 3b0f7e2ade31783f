//! Internal error types
//!
//! Nothing in this enum ever reaches a caller of [`crate::parse_image_meta`]: every
//! layer that can fail catches its own `Result` and degrades to "produce less
//! output" per the public contract. It exists so the container walkers, the
//! TIFF/RIFF readers, and the inflate step have a normal `?`-shaped internal API
//! instead of threading `Option` through every intermediate call.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    #[error("truncated data: {0}")]
    Truncated(&'static str),

    #[error("invalid signature")]
    InvalidSignature,

    #[error("invalid TIFF header: {0}")]
    InvalidTiff(&'static str),

    #[error("decompression failed: {0}")]
    Inflate(#[from] std::io::Error),

    #[error("no decodable text")]
    Undecodable,

    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
}
