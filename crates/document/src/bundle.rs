use std::io::{Seek, Write};

use chrono::{Datelike, Timelike};
use pagesplit_core::ChunkRange;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::DocumentError;

#[derive(Debug, Clone)]
pub struct OutputDocument {
    pub name: String,
    pub range: ChunkRange,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct OutputBundle {
    pub base_name: String,
    pub documents: Vec<OutputDocument>,
}

impl OutputBundle {
    pub fn archive_name(&self) -> String {
        format!("{}_split.zip", self.base_name)
    }

    pub fn total_pages(&self) -> u32 {
        self.documents.iter().map(|doc| doc.range.len()).sum()
    }
}

/// Writes every part into one zip archive, in chunk order, and hands the
/// finished writer back.
pub fn write_bundle<W>(bundle: &OutputBundle, writer: W) -> Result<W, DocumentError>
where
    W: Write + Seek,
{
    let now = chrono::Local::now();
    let options: FileOptions<'_, ()> = FileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .unix_permissions(0o644)
        .last_modified_time(
            zip::DateTime::from_date_and_time(
                now.year() as u16,
                now.month() as u8,
                now.day() as u8,
                now.hour() as u8,
                now.minute() as u8,
                now.second() as u8,
            )
            .unwrap_or_default(),
        );

    let mut zip = ZipWriter::new(writer);
    for document in &bundle.documents {
        zip.start_file(document.name.as_str(), options)?;
        zip.write_all(&document.bytes)?;
        debug!(entry = %document.name, bytes = document.bytes.len(), "archive entry written");
    }

    Ok(zip.finish()?)
}
