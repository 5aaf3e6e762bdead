use thiserror::Error;

/// Failures inside the segmentation core. Everything here is caught at the
/// envelope boundary in `pipeline` and rendered as a REJECTED/ERROR result;
/// none of these abort the host process.
#[derive(Debug, Error)]
pub enum SegmentError {
    #[error("corrupt archive: {0}")]
    ArchiveCorrupt(String),

    #[error("malformed manifest: {0}")]
    MalformedManifest(String),

    #[error("malformed page entry {entry}: {detail}")]
    MalformedPage { entry: String, detail: String },

    #[error("page {0} continues a document but no document is open")]
    OrphanPage(u32),

    #[error("{0}")]
    Processing(String),
}

pub type Result<T> = std::result::Result<T, SegmentError>;
