use std::fmt;
use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};

use crate::error::SplitError;
use crate::planner::plan_split;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitRequest {
    pub total_pages: u32,
    pub pages_per_split: NonZeroU32,
}

impl SplitRequest {
    /// Validates raw caller input. Out-of-range values are rejected here so the
    /// planner never has to clamp or guess.
    pub fn new(total_pages: i64, pages_per_split: i64) -> Result<Self, SplitError> {
        let total_pages = u32::try_from(total_pages)
            .map_err(|_| SplitError::InvalidTotalPages { value: total_pages })?;
        Ok(Self {
            total_pages,
            pages_per_split: pages_per_split_from(pages_per_split)?,
        })
    }

    pub fn plan(&self) -> SplitPlan {
        plan_split(self.total_pages, self.pages_per_split)
    }
}

pub fn pages_per_split_from(value: i64) -> Result<NonZeroU32, SplitError> {
    u32::try_from(value)
        .ok()
        .and_then(NonZeroU32::new)
        .ok_or(SplitError::InvalidPagesPerSplit { value })
}

/// Half-open page range `[start, end)`, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChunkRange {
    pub start: u32,
    pub end: u32,
}

impl ChunkRange {
    pub fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> u32 {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, page_index: u32) -> bool {
        (self.start..self.end).contains(&page_index)
    }

    /// 1-based page numbers, the numbering PDF page trees use.
    pub fn page_numbers(&self) -> impl Iterator<Item = u32> {
        (self.start + 1)..=self.end
    }
}

impl fmt::Display for ChunkRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.len() == 1 {
            write!(f, "{}", self.end)
        } else {
            write!(f, "{}-{}", self.start + 1, self.end)
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SplitPlan {
    pub is_valid: bool,
    pub message: String,
    pub needs_confirmation: bool,
    pub total_pages: u32,
    pub pages_per_split: u32,
    pub chunk_count: u32,
    pub chunks: Vec<ChunkRange>,
}

impl SplitPlan {
    pub fn last_chunk_len(&self) -> Option<u32> {
        self.chunks.last().map(ChunkRange::len)
    }

    pub fn into_result(self) -> Result<Self, SplitError> {
        if self.is_valid {
            Ok(self)
        } else {
            Err(SplitError::Infeasible {
                message: self.message,
            })
        }
    }
}
