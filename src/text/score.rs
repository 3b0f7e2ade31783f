//! Best-of candidate scoring

/// Score a decoded candidate string. Higher is better; the best-of decoder
/// picks the highest-scoring candidate across the encoding panel.
pub fn score(text: &str) -> f64 {
    let mut replacement_chars = 0i64;
    let mut cjk = 0i64;
    let mut kana = 0i64;
    let mut ascii_printable = 0i64;
    let mut unexpected_controls = 0i64;
    let mut punctuation = 0i64;

    for c in text.chars() {
        let cp = c as u32;
        match c {
            '\u{FFFD}' => replacement_chars += 1,
            '\u{4E00}'..='\u{9FFF}' => cjk += 1,
            '\u{3040}'..='\u{30FF}' => kana += 1,
            ',' | ':' | ';' => punctuation += 1,
            _ => {}
        }
        if (0x20..=0x7E).contains(&cp) {
            ascii_printable += 1;
        }
        if cp < 32 && c != '\t' && c != '\n' && c != '\r' {
            unexpected_controls += 1;
        }
    }

    -100.0 * replacement_chars as f64
        + 5.0 * cjk as f64
        + 4.0 * kana as f64
        + 0.3 * ascii_printable as f64
        - 5.0 * unexpected_controls as f64
        + 0.5 * punctuation as f64
}

/// Additional bias applied when selecting specifically for Stable-Diffusion
/// generation text, on top of the general-purpose [`score`].
pub fn sd_bias(text: &str) -> f64 {
    let lower = text.to_ascii_lowercase();
    let mut bonus = 0.0;
    if lower.contains("negative prompt:") {
        bonus += 5.0;
    }
    if lower.contains("steps:") {
        bonus += 4.0;
    }
    for needle in ["sampler:", "cfg scale:", "seed:", "size:"] {
        if lower.contains(needle) {
            bonus += 2.0;
        }
    }
    if text.contains('\u{2019}') {
        bonus += 1.0;
    }
    if text.contains('\u{0019}') {
        bonus -= 3.0;
    }

    let ascii_printable = text
        .chars()
        .filter(|c| (0x20..=0x7E).contains(&(*c as u32)))
        .count();
    let ratio = if text.is_empty() {
        0.0
    } else {
        ascii_printable as f64 / text.chars().count() as f64
    };

    bonus + ratio
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn penalizes_replacement_characters() {
        assert!(score("hello") > score("hel\u{FFFD}o"));
    }

    #[test]
    fn rewards_cjk_and_kana() {
        assert!(score("\u{65E5}\u{672C}\u{8A9E}") > score("xyz"));
    }

    #[test]
    fn sd_bias_rewards_a1111_markers() {
        assert!(sd_bias("a cat\nNegative prompt: blurry\nSteps: 20") > sd_bias("a cat"));
    }
}
