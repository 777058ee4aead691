pub const MAX_BASE_NAME_LEN: usize = 50;
pub const FALLBACK_BASE_NAME: &str = "document";

/// Reduces an uploaded file name to a base name safe for output file names:
/// extension stripped, everything outside `[A-Za-z0-9-]` folded to single
/// underscores, edges trimmed, at most 50 characters.
pub fn sanitize_filename(filename: &str) -> String {
    let stem = strip_extension(filename);

    let mut sanitized = String::with_capacity(stem.len());
    for ch in stem.chars() {
        let ch = if ch.is_ascii_alphanumeric() || ch == '-' {
            ch
        } else {
            '_'
        };
        if ch == '_' && sanitized.ends_with('_') {
            continue;
        }
        sanitized.push(ch);
    }

    sanitized
        .trim_matches('_')
        .chars()
        .take(MAX_BASE_NAME_LEN)
        .collect()
}

/// Like [`sanitize_filename`], but drops any client-supplied directory part
/// first and never returns an empty name.
pub fn sanitize_upload_name(filename: Option<&str>) -> String {
    let file_name = filename
        .and_then(|name| name.rsplit(['/', '\\']).next())
        .unwrap_or_default();

    let sanitized = sanitize_filename(file_name);
    if sanitized.is_empty() {
        FALLBACK_BASE_NAME.to_string()
    } else {
        sanitized
    }
}

// Only a dot in the last path segment starts an extension, and leading dots
// mark hidden files.
fn strip_extension(filename: &str) -> &str {
    let name_start = filename.rfind(['/', '\\']).map_or(0, |index| index + 1);
    let name = &filename[name_start..];
    match name.rfind('.') {
        Some(index) if name[..index].chars().any(|ch| ch != '.') => {
            &filename[..name_start + index]
        }
        _ => filename,
    }
}
