//! Heuristic repair of mis-decoded text.
//!
//! The common failure mode is a single-byte-encoded page (GBK, windows-125x)
//! decoded as Latin-1 somewhere upstream, which shows up as long runs of
//! high-byte characters. Full statistical detection is expensive, so two
//! short-circuits keep the common case O(1) relative to document length:
//! a non-ASCII ratio check over a fixed sample, and a mojibake-run scan.

use encoding_rs::Encoding;

/// Texts shorter than this are too short to diagnose.
const MIN_LEN: usize = 20;

/// Number of leading characters sampled for the cheap checks.
const SAMPLE_CHARS: usize = 1_000;

/// Minimum non-ASCII ratio in the sample before repair is considered.
const NON_ASCII_RATIO: f64 = 0.1;

/// Length of a consecutive non-ASCII run treated as a mojibake signature.
const MOJIBAKE_RUN: usize = 10;

/// Minimum detection confidence required to re-decode.
const DETECT_CONFIDENCE: f32 = 0.8;

/// Detect and repair text that was decoded under the wrong encoding.
///
/// Never fails; when the text looks healthy or detection is inconclusive
/// the input is returned unchanged. Invalid bytes in the repaired text are
/// replaced with the Unicode replacement character.
pub fn repair_encoding(text: &str) -> String {
    if text.chars().take(MIN_LEN).count() < MIN_LEN {
        return text.to_string();
    }

    let mut sample_len = 0usize;
    let mut non_ascii = 0usize;
    let mut run = 0usize;
    let mut max_run = 0usize;

    for c in text.chars().take(SAMPLE_CHARS) {
        sample_len += 1;
        if c.is_ascii() {
            run = 0;
        } else {
            non_ascii += 1;
            run += 1;
            max_run = max_run.max(run);
        }
    }

    // Most pages are already correctly decoded.
    if (non_ascii as f64) < (sample_len as f64) * NON_ASCII_RATIO {
        return text.to_string();
    }

    // No mojibake signature, leave the text alone.
    if max_run < MOJIBAKE_RUN {
        return text.to_string();
    }

    let sample_bytes = latin1_bytes(text.chars().take(SAMPLE_CHARS));
    if sample_bytes.is_empty() {
        return text.to_string();
    }

    let (charset, confidence, _) = chardet::detect(&sample_bytes);
    if confidence <= DETECT_CONFIDENCE {
        return text.to_string();
    }

    let lowered = charset.to_lowercase();
    if lowered.is_empty() || lowered == "ascii" || lowered == "utf-8" {
        return text.to_string();
    }

    let label = chardet::charset2encoding(&charset);
    let encoding = Encoding::for_label(label.as_bytes())
        .or_else(|| Encoding::for_label(charset.as_bytes()));

    match encoding {
        Some(encoding) => {
            let full_bytes = latin1_bytes(text.chars());
            let (decoded, _, _) = encoding.decode(&full_bytes);
            decoded.into_owned()
        }
        None => text.to_string(),
    }
}

/// Re-encode characters as raw Latin-1 bytes, dropping anything above 0xFF.
fn latin1_bytes(chars: impl Iterator<Item = char>) -> Vec<u8> {
    chars
        .filter_map(|c| {
            let code = c as u32;
            (code <= 0xFF).then_some(code as u8)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_identity() {
        for input in ["", "a", "short text", "0123456789012345678"] {
            assert_eq!(repair_encoding(input), input);
        }
    }

    #[test]
    fn ascii_text_is_identity() {
        let input = "The quick brown fox jumps over the lazy dog. ".repeat(10);
        assert_eq!(repair_encoding(&input), input);
    }

    #[test]
    fn low_non_ascii_ratio_is_identity() {
        // Well under 10% non-ASCII in the sample.
        let input = format!("café {}", "plain ascii filler text ".repeat(20));
        assert_eq!(repair_encoding(&input), input);
    }

    #[test]
    fn scattered_non_ascii_without_run_is_identity() {
        // High ratio but no run of ten consecutive non-ASCII characters.
        let input = "é a ".repeat(100);
        assert_eq!(repair_encoding(&input), input);
    }

    #[test]
    fn correctly_decoded_cjk_is_untouched_or_repaired_without_panic() {
        // Genuine CJK text trips both short-circuits; whatever detection
        // concludes, the call must not panic and must return valid UTF-8.
        let input = "这是一个测试文本，用来验证编码修复不会崩溃。".repeat(5);
        let out = repair_encoding(&input);
        assert!(!out.is_empty());
    }

    #[test]
    fn repairs_gbk_misdecoded_as_latin1() {
        // "中文编码测试" encoded as GBK, then each byte read as a Latin-1
        // character: the classic double-encoding failure.
        let gbk_bytes: Vec<u8> = {
            let (encoded, _, _) = encoding_rs::GBK.encode("中文编码测试需要足够长的样本才能检测");
            encoded.into_owned()
        };
        let mangled: String = gbk_bytes.iter().map(|&b| b as char).collect();
        // Pad so the length threshold is met without diluting the ratio.
        let input = mangled.repeat(4);

        let repaired = repair_encoding(&input);
        assert!(repaired.contains("中文"), "expected repaired CJK, got {repaired:?}");
    }

    #[test]
    fn latin1_bytes_drops_wide_chars() {
        let bytes = latin1_bytes("aé中".chars());
        assert_eq!(bytes, vec![b'a', 0xE9]);
    }
}
