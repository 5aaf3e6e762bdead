use crate::manifest::PageClassification;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A page reassembled from its two upstream halves. Either half can be
/// missing: a page without classification ends up unprocessed, a page
/// without OCR is classified with empty text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageRecord {
    #[serde(rename = "PageNumber")]
    pub page_number: u32,
    #[serde(
        rename = "Classification",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub classification: Option<PageClassification>,
    #[serde(rename = "OCR", default, skip_serializing_if = "Option::is_none")]
    pub ocr: Option<String>,
}

/// Merge classification records and OCR texts into one map keyed by page
/// number. The key set is the union of both sources.
pub fn reconcile(
    records: BTreeMap<u32, PageClassification>,
    texts: BTreeMap<u32, String>,
) -> BTreeMap<u32, PageRecord> {
    let mut pages: BTreeMap<u32, PageRecord> = BTreeMap::new();

    for (number, classification) in records {
        pages.insert(
            number,
            PageRecord {
                page_number: number,
                classification: Some(classification),
                ocr: None,
            },
        );
    }

    for (number, text) in texts {
        pages
            .entry(number)
            .or_insert_with(|| PageRecord {
                page_number: number,
                classification: None,
                ocr: None,
            })
            .ocr = Some(text);
    }

    pages
}
