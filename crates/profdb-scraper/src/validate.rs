//! Record validation before a record is accepted into the output.
//!
//! Validation never repairs a record. Callers log the violations, count the
//! record as invalid and leave it out.

use std::fmt;

use profdb_core::{ProfessorRecord, ProfessorSummary, Tier};

/// One failed check: which field, and why.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub field: String,
    pub reason: String,
}

impl Violation {
    fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.reason)
    }
}

const SCORE_MAX: f64 = 5.0;
const PERCENT_MAX: u8 = 100;

fn check_score(field: impl Into<String>, value: Option<f64>, out: &mut Vec<Violation>) {
    if let Some(v) = value {
        if !v.is_finite() || !(0.0..=SCORE_MAX).contains(&v) {
            out.push(Violation::new(field, format!("{v} is outside 0-5")));
        }
    }
}

fn check_percent(field: &str, value: Option<u8>, out: &mut Vec<Violation>) {
    if let Some(v) = value {
        if v > PERCENT_MAX {
            out.push(Violation::new(field, format!("{v} is outside 0-100")));
        }
    }
}

fn into_result(violations: Vec<Violation>) -> Result<(), Vec<Violation>> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(violations)
    }
}

/// Checks a merged [`ProfessorRecord`]: name present, scores within 0-5,
/// percentage within 0-100, exactly the five tier keys in the distribution,
/// and per-review score ranges.
///
/// # Errors
///
/// Every violation found, in field order.
pub fn validate(record: &ProfessorRecord) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    if record.name.trim().is_empty() {
        violations.push(Violation::new("name", "must not be empty"));
    }
    check_score("overall_quality", record.overall_quality, &mut violations);
    check_score("difficulty_level", record.difficulty_level, &mut violations);
    check_percent("would_take_again", record.would_take_again, &mut violations);

    match serde_json::to_value(record.rating_distribution) {
        Ok(serde_json::Value::Object(map)) => {
            let keys_match = map.len() == Tier::ALL.len()
                && Tier::ALL.iter().all(|tier| map.contains_key(tier.label()));
            if !keys_match {
                violations.push(Violation::new(
                    "rating_distribution",
                    "must have exactly the keys Awesome, Great, Good, OK, Awful",
                ));
            }
        }
        _ => violations.push(Violation::new(
            "rating_distribution",
            "does not serialize as an object",
        )),
    }

    for (idx, review) in record.reviews.iter().enumerate() {
        check_score(
            format!("reviews[{idx}].quality_score"),
            review.quality_score,
            &mut violations,
        );
        check_score(
            format!("reviews[{idx}].difficulty_score"),
            review.difficulty_score,
            &mut violations,
        );
    }

    into_result(violations)
}

/// Checks a listing card before it is accepted as a [`ProfessorSummary`].
///
/// # Errors
///
/// Every violation found, in field order.
pub fn validate_summary(summary: &ProfessorSummary) -> Result<(), Vec<Violation>> {
    let mut violations = Vec::new();

    if summary.name.trim().is_empty() {
        violations.push(Violation::new("name", "must not be empty"));
    }
    if !(summary.detail_url.starts_with("https://") || summary.detail_url.starts_with("http://")) {
        violations.push(Violation::new("detail_url", "must be an absolute http(s) URL"));
    }
    check_score("avg_quality", summary.avg_quality, &mut violations);
    check_score("avg_difficulty", summary.avg_difficulty, &mut violations);
    check_percent("would_take_again_pct", summary.would_take_again_pct, &mut violations);

    into_result(violations)
}

/// `"field: reason; field: reason"` for logs and the run summary.
#[must_use]
pub fn describe(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use profdb_core::{RatingDistribution, ReviewRecord};

    fn record() -> ProfessorRecord {
        ProfessorRecord {
            name: "Ada Lovelace".to_owned(),
            department: "Mathematics".to_owned(),
            overall_quality: Some(4.5),
            difficulty_level: Some(3.1),
            would_take_again: Some(87),
            rating_distribution: RatingDistribution::default(),
            tags: vec![],
            reviews: vec![],
            detail_url: "https://www.ratemyprofessors.com/professor/1".to_owned(),
        }
    }

    fn review(quality: Option<f64>) -> ReviewRecord {
        ReviewRecord {
            course_code: "MAC2311".to_owned(),
            for_credit: true,
            attendance: "Mandatory".to_owned(),
            grade: "A".to_owned(),
            textbook_used: "Yes".to_owned(),
            quality_score: quality,
            difficulty_score: Some(3.0),
            review_text: "Clear lectures.".to_owned(),
            tags: vec![],
            date_posted: "Jan 5th, 2024".to_owned(),
            helpful_upvotes: 0,
            helpful_downvotes: 0,
        }
    }

    #[test]
    fn valid_record_passes() {
        assert_eq!(validate(&record()), Ok(()));
    }

    #[test]
    fn null_numbers_are_valid() {
        let mut r = record();
        r.overall_quality = None;
        r.difficulty_level = None;
        r.would_take_again = None;
        assert_eq!(validate(&r), Ok(()));
    }

    #[test]
    fn collects_every_violation() {
        let mut r = record();
        r.name = "  ".to_owned();
        r.overall_quality = Some(5.5);
        r.would_take_again = Some(101);
        let violations = validate(&r).unwrap_err();
        let fields: Vec<&str> = violations.iter().map(|v| v.field.as_str()).collect();
        assert_eq!(fields, vec!["name", "overall_quality", "would_take_again"]);
    }

    #[test]
    fn nan_score_is_rejected() {
        let mut r = record();
        r.difficulty_level = Some(f64::NAN);
        assert!(validate(&r).is_err());
    }

    #[test]
    fn review_scores_are_range_checked_with_index() {
        let mut r = record();
        r.reviews = vec![review(Some(4.0)), review(Some(-1.0))];
        let violations = validate(&r).unwrap_err();
        assert_eq!(violations.len(), 1);
        assert_eq!(violations[0].field, "reviews[1].quality_score");
    }

    #[test]
    fn summary_requires_absolute_url_and_name() {
        let summary = ProfessorSummary {
            name: String::new(),
            department: "Physics".to_owned(),
            university: "University of South Florida".to_owned(),
            rating_count: 3,
            avg_quality: Some(4.0),
            avg_difficulty: None,
            would_take_again_pct: None,
            detail_url: "/professor/9".to_owned(),
        };
        let violations = validate_summary(&summary).unwrap_err();
        assert_eq!(
            describe(&violations),
            "name: must not be empty; detail_url: must be an absolute http(s) URL"
        );
    }
}
