//! A1111-style block locator and candidate selector

use crate::types::Candidate;
use regex::Regex;
use std::sync::OnceLock;

fn steps_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?mi)^[\t ]*Steps:[^\n]*").unwrap())
}

fn other_settings_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?mi)^[\t ]*(?:Sampler|CFG scale|Seed|Size|Model|Schedule type|Denoising strength|Hires steps):[^\n]*",
        )
        .unwrap()
    })
}

fn negative_prompt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)negative prompt:").unwrap())
}

/// Locate an A1111 parameter block within `text`, preserving every byte of
/// the source verbatim. Returns `None` if no `Negative
/// prompt:` marker is present at all.
pub fn locate(text: &str) -> Option<String> {
    let marker = negative_prompt_re().find(text)?;
    let tail_start = match text[marker.end()..].find('\n') {
        Some(rel) => marker.end() + rel + 1,
        None => return Some(text.to_string()),
    };
    let tail = &text[tail_start..];

    let settings_end = settings_line_fallback_end(tail).map(|end| tail_start + end);

    match settings_end {
        Some(end) => Some(text[..end].to_string()),
        None => Some(text.to_string()),
    }
}

/// Find the end offset (relative to `text`) of the first settings line,
/// without requiring a preceding `Negative prompt:` marker — used by the
/// recovery engine's whole-file-redecode fallback.
pub fn settings_line_fallback(text: &str) -> Option<String> {
    let end = settings_line_fallback_end(text)?;
    Some(text[..end].to_string())
}

fn settings_line_fallback_end(text: &str) -> Option<usize> {
    if let Some(m) = steps_line_re().find(text) {
        return Some(m.end());
    }
    other_settings_line_re().find(text).map(|m| m.end())
}

/// Score a candidate A1111 block for the selector.
pub fn score_block(text: &str) -> i32 {
    let lower = text.to_lowercase();
    let mut score = 0;
    if lower.contains("negative prompt:") {
        score += 5;
    }
    if lower.contains("steps:") {
        score += 4;
    }
    for needle in ["sampler:", "cfg scale:", "seed:", "size:"] {
        if lower.contains(needle) {
            score += 2;
        }
    }
    let non_empty_lines = text.lines().filter(|l| !l.trim().is_empty()).count();
    score += match non_empty_lines {
        3 => 3,
        2 => 2,
        n if n >= 4 => 1,
        _ => 0,
    };
    if text.len() > 50 && text.len() < 4000 {
        score += 1;
    }
    score
}

/// Pick the single best A1111 block across every source candidate. Ties are
/// broken by source priority (EXIF > XMP attributes > XMP text > JPEG COM).
pub fn select_best(candidates: &[Candidate]) -> Option<Candidate> {
    let mut best: Option<(i32, Candidate)> = None;
    for candidate in candidates {
        let Some(block) = locate(&candidate.text) else {
            continue;
        };
        let score = score_block(&block);
        let replace = match &best {
            None => true,
            Some((best_score, best_candidate)) => {
                score > *best_score
                    || (score == *best_score && candidate.source.priority() < best_candidate.source.priority())
            }
        };
        if replace {
            best = Some((
                score,
                Candidate {
                    source: candidate.source.clone(),
                    text: block,
                },
            ));
        }
    }
    if let Some((score, candidate)) = &best {
        tracing::trace!(source = ?candidate.source, score, "selected A1111 candidate");
    }
    best.map(|(_, candidate)| candidate)
}

/// garbled-text trigger: `U+FFFD`, NUL, or a high-byte-ratio above 0.5
/// with fewer than 10% ASCII letters.
pub fn looks_garbled(text: &str) -> bool {
    if text.contains('\u{FFFD}') || text.contains('\0') {
        return true;
    }
    let total = text.chars().count();
    if total == 0 {
        return false;
    }
    let high_byte = text.chars().filter(|&c| (c as u32) > 0x7F).count();
    let ascii_letters = text.chars().filter(|c| c.is_ascii_alphabetic()).count();
    let high_ratio = high_byte as f64 / total as f64;
    let ascii_ratio = ascii_letters as f64 / total as f64;
    high_ratio > 0.5 && ascii_ratio < 0.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceLabel;

    const BLOCK: &str = "a cat\nNegative prompt: blurry\nSteps: 20, Sampler: Euler, CFG scale: 7, Seed: 42, Size: 512x512";

    #[test]
    fn locates_full_block_with_settings_line() {
        let mut text = BLOCK.to_string();
        text.push_str("\ntrailing junk that should not be included");
        assert_eq!(locate(&text).as_deref(), Some(BLOCK));
    }

    #[test]
    fn returns_whole_text_when_no_settings_line_found() {
        let text = "a cat\nNegative prompt: blurry\njust more prose";
        assert_eq!(locate(text).as_deref(), Some(text));
    }

    #[test]
    fn returns_none_without_negative_prompt_marker() {
        assert_eq!(locate("just a prompt, no markers"), None);
    }

    #[test]
    fn locator_is_idempotent() {
        let once = locate(BLOCK).unwrap();
        let twice = locate(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn selector_prefers_higher_scoring_candidate() {
        let weak = Candidate {
            source: SourceLabel::JpegComment,
            text: "Negative prompt: x".to_string(),
        };
        let strong = Candidate {
            source: SourceLabel::XmpText,
            text: BLOCK.to_string(),
        };
        let chosen = select_best(&[weak, strong]).unwrap();
        assert_eq!(chosen.source, SourceLabel::XmpText);
    }

    #[test]
    fn selector_breaks_ties_by_source_priority() {
        let a = Candidate {
            source: SourceLabel::JpegComment,
            text: BLOCK.to_string(),
        };
        let b = Candidate {
            source: SourceLabel::Exif,
            text: BLOCK.to_string(),
        };
        let chosen = select_best(&[a, b]).unwrap();
        assert_eq!(chosen.source, SourceLabel::Exif);
    }

    #[test]
    fn garbled_text_detects_replacement_char() {
        assert!(looks_garbled("hel\u{FFFD}o"));
        assert!(!looks_garbled("a perfectly normal prompt"));
    }
}
