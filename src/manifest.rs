use crate::error::{Result, SegmentError};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// One manifest record: the upstream classifier's verdict for a single page.
/// Keys beyond the ones modelled here (`File`, `DocumentType`, `Version`,
/// ...) ride along in `extra` and are re-emitted verbatim on output.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PageClassification {
    pub document_metadata: DocumentMetadata,
    #[serde(default)]
    pub classes: Vec<ClassScore>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct DocumentMetadata {
    pub page_number: u32,
    pub pages: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct ClassScore {
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone)]
pub struct Manifest {
    /// Declared page count; the expected universe is `1..=total_pages`.
    pub total_pages: u32,
    /// Classification records keyed by page number. A later record for the
    /// same page overwrites the earlier one.
    pub records: BTreeMap<u32, PageClassification>,
    /// Pages of the expected universe no record was seen for.
    pub unseen: BTreeSet<u32>,
}

/// Parse the manifest entry: UTF-8 text, one JSON record per line, in no
/// particular page order. The first record fixes the total page count; every
/// later record must agree with it.
pub fn parse(raw: &[u8]) -> Result<Manifest> {
    let text = std::str::from_utf8(raw)
        .map_err(|err| SegmentError::MalformedManifest(format!("not UTF-8: {err}")))?;

    let mut total_pages: Option<u32> = None;
    let mut records: BTreeMap<u32, PageClassification> = BTreeMap::new();
    let mut unseen: BTreeSet<u32> = BTreeSet::new();

    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }

        let record: PageClassification = serde_json::from_str(line).map_err(|err| {
            SegmentError::MalformedManifest(format!("line {}: {err}", idx + 1))
        })?;

        let total = match total_pages {
            Some(total) => {
                if record.document_metadata.pages != total {
                    return Err(SegmentError::MalformedManifest(format!(
                        "records disagree on total page count: {} vs {}",
                        total, record.document_metadata.pages
                    )));
                }
                total
            }
            None => {
                let total = record.document_metadata.pages;
                unseen.extend(1..=total);
                total_pages = Some(total);
                total
            }
        };

        let page = record.document_metadata.page_number;
        if page == 0 || page > total {
            return Err(SegmentError::MalformedManifest(format!(
                "line {}: page number {page} outside 1..={total}",
                idx + 1
            )));
        }

        unseen.remove(&page);
        records.insert(page, record);
    }

    let Some(total_pages) = total_pages else {
        return Err(SegmentError::MalformedManifest(
            "manifest contains no records".into(),
        ));
    };

    Ok(Manifest {
        total_pages,
        records,
        unseen,
    })
}
