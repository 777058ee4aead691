use pagesplit_core::{ChunkRange, SplitPlan};
use tracing::debug;

use crate::bundle::{OutputBundle, OutputDocument};
use crate::error::DocumentError;

/// A read-only, page-indexed document that can copy contiguous page ranges
/// into standalone documents.
pub trait PageSource {
    fn page_count(&self) -> u32;

    fn extract(&self, range: ChunkRange) -> Result<Vec<u8>, DocumentError>;
}

pub fn part_name(base_name: &str, chunk_number: usize) -> String {
    format!("{}_part_{}.pdf", base_name, chunk_number)
}

/// Materializes every chunk of `plan` from `source`. Fails as a whole on the
/// first chunk that cannot be copied; nothing partial is returned.
pub fn partition<S>(
    source: &S,
    plan: &SplitPlan,
    base_name: &str,
) -> Result<OutputBundle, DocumentError>
where
    S: PageSource + ?Sized,
{
    if !plan.is_valid {
        return Err(DocumentError::InvalidPlan(plan.message.clone()));
    }

    let page_count = source.page_count();
    if plan.total_pages != page_count {
        return Err(DocumentError::InvalidPlan(format!(
            "plan covers {} pages but the document has {}",
            plan.total_pages, page_count
        )));
    }
    if let Some(range) = plan.chunks.iter().find(|range| range.end > page_count) {
        return Err(DocumentError::InvalidPlan(format!(
            "pages {} are out of range for a {} page document",
            range, page_count
        )));
    }

    let mut documents = Vec::with_capacity(plan.chunks.len());
    for (index, range) in plan.chunks.iter().copied().enumerate() {
        let chunk = index + 1;
        let bytes = source
            .extract(range)
            .map_err(|error| DocumentError::PageCopy {
                chunk,
                range,
                source: Box::new(error),
            })?;

        debug!(chunk, pages = %range, bytes = bytes.len(), "chunk extracted");
        documents.push(OutputDocument {
            name: part_name(base_name, chunk),
            range,
            bytes,
        });
    }

    Ok(OutputBundle {
        base_name: base_name.to_string(),
        documents,
    })
}
