use crate::config::Config;
use crate::error::{Result, SegmentError};
use crate::manifest::ClassScore;
use crate::pages::PageRecord;
use crate::report::{Document, JobContext};
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug)]
pub struct Segmentation {
    /// Documents in the order they were opened.
    pub documents: Vec<Document>,
    /// Pages never seen in the manifest plus pages that failed the
    /// confidence gate, ascending.
    pub unprocessed: BTreeSet<u32>,
}

/// Per-page verdict of the grouping state machine, computed independently of
/// any document state so the fold in `segment` is the only stateful step.
#[derive(Debug)]
enum Disposition {
    Open,
    Extend,
    Unprocessed,
    Ignore,
}

fn dispose(cfg: &Config, page: &PageRecord) -> Disposition {
    let Some(classification) = &page.classification else {
        return Disposition::Unprocessed;
    };
    let Some((label, score)) = top_class(&classification.classes) else {
        return Disposition::Unprocessed;
    };
    if score < cfg.classification.min_confidence {
        return Disposition::Unprocessed;
    }

    if label == cfg.classification.first_page_label {
        Disposition::Open
    } else if label == cfg.classification.page_label {
        Disposition::Extend
    } else {
        Disposition::Ignore
    }
}

/// The class with the highest confidence score. Ties keep the first listed,
/// so the result is deterministic for a given payload.
pub fn top_class(classes: &[ClassScore]) -> Option<(&str, f64)> {
    let mut best: Option<&ClassScore> = None;
    for class in classes {
        if best.is_none_or(|b| class.score > b.score) {
            best = Some(class);
        }
    }
    best.map(|c| (c.name.as_str(), c.score))
}

/// Group reconciled pages into documents, ascending by page number. A
/// first-page label closes any open document and opens a new one; a
/// continuation label extends the open document, or fails if none is open;
/// any other label is ignored outright. After the last page an open document
/// is closed even if it holds a single page.
pub fn segment(
    cfg: &Config,
    job: &JobContext,
    pages: &BTreeMap<u32, PageRecord>,
    unseen: &BTreeSet<u32>,
) -> Result<Segmentation> {
    let mut documents = Vec::new();
    let mut open: Option<Document> = None;
    let mut unprocessed = unseen.clone();

    for (&number, page) in pages {
        match dispose(cfg, page) {
            Disposition::Unprocessed => {
                unprocessed.insert(number);
            }
            Disposition::Open => {
                if let Some(doc) = open.take() {
                    documents.push(doc);
                }
                open = Some(Document {
                    execution_id: job.execution_id.clone(),
                    source: job.source.clone(),
                    pages: vec![with_text(page)],
                });
            }
            Disposition::Extend => match open.as_mut() {
                Some(doc) => doc.pages.push(with_text(page)),
                None => return Err(SegmentError::OrphanPage(number)),
            },
            Disposition::Ignore => {}
        }
    }

    if let Some(doc) = open.take() {
        documents.push(doc);
    }

    Ok(Segmentation {
        documents,
        unprocessed,
    })
}

/// Pages missing their OCR half are emitted with empty text.
fn with_text(page: &PageRecord) -> PageRecord {
    let mut page = page.clone();
    if page.ocr.is_none() {
        page.ocr = Some(String::new());
    }
    page
}
