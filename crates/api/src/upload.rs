use axum::body::Bytes;
use axum::extract::multipart::{Multipart, MultipartError};
use axum::http::StatusCode;

use crate::error::ApiError;

const FILE_FIELD: &str = "file";
const PAGES_PER_SPLIT_FIELDS: [&str; 2] = ["pages_per_split", "pagesPerSplit"];

#[derive(Debug)]
pub struct SplitUpload {
    pub file_name: Option<String>,
    pub bytes: Bytes,
    pub pages_per_split: i64,
}

pub async fn read_split_upload(
    mut multipart: Multipart,
    max_upload_bytes: usize,
) -> Result<SplitUpload, ApiError> {
    let mut file = None;
    let mut pages_per_split = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|error| multipart_error(error, max_upload_bytes))?
    {
        let name = field.name().unwrap_or_default().to_string();

        if name == FILE_FIELD {
            let file_name = field.file_name().map(str::to_string);
            let bytes = field
                .bytes()
                .await
                .map_err(|error| multipart_error(error, max_upload_bytes))?;
            file = Some((file_name, bytes));
        } else if PAGES_PER_SPLIT_FIELDS.contains(&name.as_str()) {
            let text = field
                .text()
                .await
                .map_err(|error| multipart_error(error, max_upload_bytes))?;
            pages_per_split = Some(parse_pages_per_split(&text)?);
        }
    }

    let Some((file_name, bytes)) = file else {
        return Err(ApiError::bad_request(
            "missing_file",
            "multipart field 'file' is required",
        ));
    };
    let Some(pages_per_split) = pages_per_split else {
        return Err(ApiError::bad_request(
            "missing_pages_per_split",
            "form field 'pages_per_split' is required",
        ));
    };

    Ok(SplitUpload {
        file_name,
        bytes,
        pages_per_split,
    })
}

fn parse_pages_per_split(text: &str) -> Result<i64, ApiError> {
    text.trim().parse::<i64>().map_err(|_| {
        ApiError::bad_request(
            "invalid_pages_per_split",
            format!("pages_per_split must be an integer, got '{}'", text.trim()),
        )
    })
}

fn multipart_error(error: MultipartError, max_upload_bytes: usize) -> ApiError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::PayloadTooLarge {
            limit: max_upload_bytes,
        }
    } else {
        ApiError::bad_request("malformed_upload", error.body_text())
    }
}
