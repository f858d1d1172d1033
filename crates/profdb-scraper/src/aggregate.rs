//! Merging a listing summary, its detail page and its reviews into one record.

use profdb_core::{ProfessorRecord, ProfessorSummary, ReviewRecord};

use crate::detail::DetailResult;

/// Builds the final record for one professor.
///
/// The detail page is authoritative; any value it did not provide falls back
/// to the listing card. Reviews are appended in the order given, so merging
/// with no reviews and appending later produces the same record.
#[must_use]
pub fn merge(
    summary: &ProfessorSummary,
    detail: DetailResult,
    reviews: Vec<ReviewRecord>,
) -> ProfessorRecord {
    let mut record = ProfessorRecord {
        name: non_blank(detail.name).unwrap_or_else(|| summary.name.clone()),
        department: non_blank(detail.department).unwrap_or_else(|| summary.department.clone()),
        overall_quality: detail.overall_quality.or(summary.avg_quality),
        difficulty_level: detail.difficulty_level.or(summary.avg_difficulty),
        would_take_again: detail.would_take_again.or(summary.would_take_again_pct),
        rating_distribution: detail.rating_distribution,
        tags: detail.tags,
        reviews: Vec::new(),
        detail_url: summary.detail_url.clone(),
    };
    record.append_reviews(reviews);
    record
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
