//! Container-level parsing: PNG chunks, JPEG marker segments, WebP RIFF
//! chunks, and the EXIF/TIFF sub-parser they all feed into.

pub mod endian;
pub mod exif;
pub mod jpeg;
pub mod png;
pub mod webp;

pub use endian::Endian;
