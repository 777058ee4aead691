use std::num::NonZeroU32;

use crate::models::{ChunkRange, SplitPlan};

pub fn plan_split(total_pages: u32, pages_per_split: NonZeroU32) -> SplitPlan {
    let per = pages_per_split.get();

    if total_pages < per {
        return SplitPlan {
            is_valid: false,
            message: format!(
                "PDF has {} pages but requested {} pages per split",
                total_pages, per
            ),
            needs_confirmation: false,
            total_pages,
            pages_per_split: per,
            chunk_count: 0,
            chunks: Vec::new(),
        };
    }

    let chunk_count = total_pages.div_ceil(per);
    let remainder = total_pages % per;

    let (message, needs_confirmation) = if remainder == 0 {
        (
            format!(
                "PDF will be split into {} equal parts of {} pages",
                chunk_count, per
            ),
            false,
        )
    } else {
        (
            format!(
                "PDF will be split into {} parts of {} pages each. Last part will have {} pages instead of {} pages",
                chunk_count, per, remainder, per
            ),
            true,
        )
    };

    SplitPlan {
        is_valid: true,
        message,
        needs_confirmation,
        total_pages,
        pages_per_split: per,
        chunk_count,
        chunks: chunk_boundaries(total_pages, per),
    }
}

fn chunk_boundaries(total_pages: u32, per: u32) -> Vec<ChunkRange> {
    (0..total_pages)
        .step_by(per as usize)
        .map(|start| ChunkRange::new(start, start.saturating_add(per).min(total_pages)))
        .collect()
}
