//! WebP (RIFF) chunk walker
//!
//! WebP's `EXIF` chunk holds a bare TIFF structure with no `Exif\0\0`
//! signature, unlike JPEG APP1 — this module adds the signature back so the
//! rest of the pipeline can treat all three containers' EXIF payloads
//! identically.

const RIFF_TAG: &[u8; 4] = b"RIFF";
const WEBP_TAG: &[u8; 4] = b"WEBP";

#[derive(Debug, Default)]
pub struct WebpSegments {
    /// EXIF payload with a synthesized `Exif\0\0` prefix.
    pub exif: Option<Vec<u8>>,
    /// Raw XMP packet bytes from the `XMP ` chunk, if present.
    pub xmp: Option<Vec<u8>>,
}

/// Walk `bytes` as a WebP RIFF container and collect its `EXIF`/`XMP ` chunks.
/// Returns an empty [`WebpSegments`] on a malformed or non-WebP RIFF file —
/// WebP parsing never surfaces an error.
pub fn extract(bytes: &[u8]) -> WebpSegments {
    let mut segments = WebpSegments::default();
    if bytes.len() < 12 || &bytes[0..4] != RIFF_TAG || &bytes[8..12] != WEBP_TAG {
        return segments;
    }

    let riff_len = u32::from_le_bytes(bytes[4..8].try_into().unwrap()) as usize;
    let end = (8 + riff_len).min(bytes.len());

    let mut pos = 12usize;
    while pos + 8 <= end {
        let chunk_id = &bytes[pos..pos + 4];
        let chunk_len = u32::from_le_bytes(bytes[pos + 4..pos + 8].try_into().unwrap()) as usize;
        let data_start = pos + 8;
        let data_end = match data_start.checked_add(chunk_len) {
            Some(e) if e <= bytes.len() => e,
            _ => break,
        };
        let data = &bytes[data_start..data_end];

        match chunk_id {
            b"EXIF" => {
                let mut with_sig = b"Exif\0\0".to_vec();
                with_sig.extend_from_slice(data);
                segments.exif = Some(with_sig);
            }
            b"XMP " => segments.xmp = Some(data.to_vec()),
            _ => {}
        }

        // Chunks are padded to an even byte count.
        pos = data_end + (chunk_len % 2);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn riff_chunk(id: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut out = id.to_vec();
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        if data.len() % 2 == 1 {
            out.push(0);
        }
        out
    }

    fn webp(chunks: &[Vec<u8>]) -> Vec<u8> {
        let mut body = WEBP_TAG.to_vec();
        for c in chunks {
            body.extend_from_slice(c);
        }
        let mut out = RIFF_TAG.to_vec();
        out.extend_from_slice(&(body.len() as u32).to_le_bytes());
        out.extend_from_slice(&body);
        out
    }

    #[test]
    fn rejects_non_riff() {
        assert!(extract(b"not riff data").exif.is_none());
    }

    #[test]
    fn rejects_riff_that_is_not_webp() {
        let mut data = RIFF_TAG.to_vec();
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(b"AVI ");
        assert!(extract(&data).exif.is_none());
    }

    #[test]
    fn extracts_exif_chunk_with_synthesized_prefix() {
        let tiff = b"IIMM\0*fakebody";
        let data = webp(&[riff_chunk(b"EXIF", tiff)]);
        let segments = extract(&data);
        let exif = segments.exif.unwrap();
        assert!(exif.starts_with(b"Exif\0\0"));
        assert_eq!(&exif[6..], tiff);
    }

    #[test]
    fn extracts_odd_length_xmp_chunk_with_padding() {
        let xmp = b"<x:xmpmeta>a</x:xmpmeta>"; // odd length by one char below
        let xmp = &xmp[..xmp.len() - 1];
        assert_eq!(xmp.len() % 2, 1);
        let data = webp(&[riff_chunk(b"XMP ", xmp), riff_chunk(b"EXIF", b"IIMM\0*")]);
        let segments = extract(&data);
        assert_eq!(segments.xmp.unwrap(), xmp);
        assert!(segments.exif.is_some());
    }
}
