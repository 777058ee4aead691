use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SplitError {
    #[error("pages per split must be between 1 and {max}, got {value}", max = u32::MAX)]
    InvalidPagesPerSplit { value: i64 },

    #[error("total pages must be between 0 and {max}, got {value}", max = u32::MAX)]
    InvalidTotalPages { value: i64 },

    #[error("{message}")]
    Infeasible { message: String },
}
