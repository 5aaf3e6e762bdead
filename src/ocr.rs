use crate::error::{Result, SegmentError};
use serde::{Deserialize, Serialize};

const LINE_BLOCK: &str = "LINE";

/// One page's OCR payload as emitted by the upstream text-detection engine:
/// a flat list of typed blocks, of which only LINE blocks carry page text.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrPayload {
    #[serde(default)]
    pub blocks: Vec<OcrBlock>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct OcrBlock {
    pub block_type: String,
    #[serde(default)]
    pub text: Option<String>,
}

/// Parse one page entry of the archive: the final path segment, trimmed,
/// is the page number; the contents are the block-structured OCR payload.
pub fn parse_page_entry(name: &str, contents: &[u8]) -> Result<(u32, String)> {
    let page = page_number(name)?;
    let payload: OcrPayload =
        serde_json::from_slice(contents).map_err(|err| SegmentError::MalformedPage {
            entry: name.to_string(),
            detail: err.to_string(),
        })?;
    Ok((page, extract_text(&payload)))
}

pub fn page_number(name: &str) -> Result<u32> {
    let last = name.rsplit('/').next().unwrap_or(name).trim();
    match last.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(SegmentError::MalformedPage {
            entry: name.to_string(),
            detail: "entry name does not end in a page number".into(),
        }),
    }
}

/// The text of every LINE block, in payload order, one line break after
/// each, trimmed as a whole. No other block type contributes.
pub fn extract_text(payload: &OcrPayload) -> String {
    let mut text = String::new();
    for block in &payload.blocks {
        if block.block_type == LINE_BLOCK {
            if let Some(line) = &block.text {
                text.push_str(line);
                text.push('\n');
            }
        }
    }
    text.trim().to_string()
}
