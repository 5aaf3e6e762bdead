use crate::error::SegmentError;
use crate::pages::PageRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Job context handed in by the caller. Both fields are opaque strings,
/// copied through to every emitted document untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobContext {
    pub execution_id: String,
    pub source: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    #[serde(rename = "ACCEPTED")]
    Accepted,
    #[serde(rename = "REJECTED")]
    Rejected,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    #[serde(rename = "UNCLASSIFIED_PAGES")]
    UnclassifiedPages,
    #[serde(rename = "ERROR")]
    Error,
}

/// One logical multi-page document: contiguous pages in ascending order,
/// opened by a first-page-labelled page.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Document {
    pub execution_id: String,
    pub source: String,
    pub pages: Vec<PageRecord>,
}

/// The result envelope returned to the caller, in the upstream pipeline's
/// wire format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct SplitResult {
    pub outcome: Outcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documents: Option<Vec<Document>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<RejectReason>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unprocessed_pages: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// Wrap a finished segmentation. An empty unprocessed set is ACCEPTED;
/// otherwise the job is REJECTED with the unprocessed page numbers rendered
/// as strings, ascending. The grouped documents are returned either way so
/// the caller can re-run classification on just the listed pages.
pub fn assemble(documents: Vec<Document>, unprocessed: &BTreeSet<u32>) -> SplitResult {
    if unprocessed.is_empty() {
        return SplitResult {
            outcome: Outcome::Accepted,
            documents: Some(documents),
            reason: None,
            unprocessed_pages: None,
            error_message: None,
        };
    }

    SplitResult {
        outcome: Outcome::Rejected,
        documents: Some(documents),
        reason: Some(RejectReason::UnclassifiedPages),
        unprocessed_pages: Some(unprocessed.iter().map(u32::to_string).collect()),
        error_message: None,
    }
}

/// Convert an error escaping the core into the REJECTED/ERROR envelope,
/// message preserved verbatim. Nothing propagates past this point.
pub fn assemble_error(err: &SegmentError) -> SplitResult {
    SplitResult {
        outcome: Outcome::Rejected,
        documents: None,
        reason: Some(RejectReason::Error),
        unprocessed_pages: None,
        error_message: Some(err.to_string()),
    }
}
