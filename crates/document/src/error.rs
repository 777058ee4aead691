use pagesplit_core::ChunkRange;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("uploaded file is not a readable PDF: {0}")]
    Unparseable(String),

    #[error("encrypted PDFs are not supported")]
    Encrypted,

    #[error("split plan cannot be executed: {0}")]
    InvalidPlan(String),

    #[error("page {page} is missing from the page tree")]
    MissingPage { page: u32 },

    #[error("expected {expected} pages in extracted document, found {actual}")]
    PageCount { expected: u32, actual: u32 },

    #[error("failed to copy pages {range} into part {chunk}")]
    PageCopy {
        chunk: usize,
        range: ChunkRange,
        #[source]
        source: Box<DocumentError>,
    },

    #[error("malformed PDF structure: {0}")]
    Pdf(#[from] lopdf::Error),

    #[error("failed to serialize PDF: {0}")]
    Serialize(String),

    #[error("failed to write archive: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DocumentError {
    /// Errors caused by what the client uploaded rather than by the server.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Unparseable(_) | Self::Encrypted)
    }
}
