use crate::{
    archive,
    config::Config,
    error::{Result, SegmentError},
    manifest::{self, Manifest},
    ocr, pages,
    report::{self, JobContext, SplitResult},
    segment, text,
};
use std::collections::BTreeMap;
use std::io::Read;
use tracing::{error, info};

pub struct SplitPipeline {
    cfg: Config,
}

impl SplitPipeline {
    pub fn new(cfg: &Config) -> Self {
        Self { cfg: cfg.clone() }
    }

    /// Run one segmentation job against an archive byte stream. Never fails:
    /// every error inside the core folds into the REJECTED/ERROR envelope
    /// with its message intact.
    pub fn run<R: Read>(&self, job: &JobContext, reader: R) -> SplitResult {
        match self.segment_archive(job, reader) {
            Ok(result) => result,
            Err(err) => {
                error!("segmentation failed: {err}");
                report::assemble_error(&err)
            }
        }
    }

    fn segment_archive<R: Read>(&self, job: &JobContext, reader: R) -> Result<SplitResult> {
        // Accumulation pass: one walk over the archive, in whatever order
        // the entries happen to be stored. Grouping needs the complete page
        // universe, so nothing is classified until this pass finishes.
        let mut manifest: Option<Manifest> = None;
        let mut texts: BTreeMap<u32, String> = BTreeMap::new();

        archive::read_entries(reader, |entry| {
            if entry.name.ends_with(&self.cfg.archive.manifest_suffix) {
                if manifest.is_some() {
                    return Err(SegmentError::MalformedManifest(format!(
                        "second manifest entry: {}",
                        entry.name
                    )));
                }
                manifest = Some(manifest::parse(&entry.contents)?);
            } else {
                let (page, raw) = ocr::parse_page_entry(&entry.name, &entry.contents)?;
                texts.insert(page, text::normalize(&self.cfg, &raw)?);
            }
            Ok(())
        })?;

        let Some(Manifest {
            total_pages,
            records,
            unseen,
        }) = manifest
        else {
            return Err(SegmentError::MalformedManifest(
                "archive contains no manifest entry".into(),
            ));
        };

        info!(
            "accumulated {} classified pages, {} OCR pages (expected {})",
            records.len(),
            texts.len(),
            total_pages
        );

        // Classification pass over the finished page map.
        let page_map = pages::reconcile(records, texts);
        let seg = segment::segment(&self.cfg, job, &page_map, &unseen)?;

        info!(
            "segmented {} documents ({} unprocessed pages)",
            seg.documents.len(),
            seg.unprocessed.len()
        );

        Ok(report::assemble(seg.documents, &seg.unprocessed))
    }
}
