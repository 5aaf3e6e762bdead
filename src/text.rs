use crate::config::Config;
use crate::error::{Result, SegmentError};
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Normalize one page's extracted text. With the default config this is
/// newline canonicalization plus NFKC; regex noise-line removal is opt-in
/// for archives whose OCR carries repeated headers or stamps.
pub fn normalize(cfg: &Config, raw: &str) -> Result<String> {
    let mut text = raw.to_string();

    if cfg.text.normalize_newlines {
        text = text.replace("\r\n", "\n");
    }

    if cfg.text.normalize_unicode {
        text = text.nfkc().collect::<String>();
    }

    if cfg.text.remove_by_regex {
        text = remove_by_regex(cfg, &text)?;
    }

    Ok(text)
}

fn remove_by_regex(cfg: &Config, s: &str) -> Result<String> {
    let regs: Vec<Regex> = cfg
        .text
        .regex
        .patterns
        .iter()
        .map(|p| Regex::new(p))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|err| SegmentError::Processing(format!("invalid text.regex pattern: {err}")))?;

    let mut out = Vec::new();
    for line in s.lines() {
        if !regs.iter().any(|r| r.is_match(line.trim())) {
            out.push(line);
        }
    }
    Ok(out.join("\n"))
}
