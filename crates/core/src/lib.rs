pub mod error;
pub mod models;
pub mod planner;
pub mod sanitize;

pub use error::SplitError;
pub use models::*;
pub use planner::plan_split;
pub use sanitize::{sanitize_filename, sanitize_upload_name, FALLBACK_BASE_NAME, MAX_BASE_NAME_LEN};
