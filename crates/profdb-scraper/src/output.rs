//! JSON output: the dataset, the intermediate listing and the run summary.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use profdb_core::{ProfessorRecord, ProfessorSummary};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::ScraperError;

/// Serializes `value` as pretty JSON and replaces `path` atomically.
///
/// The document is written to a sibling temp file first and renamed over the
/// target, so a crash never leaves a truncated file behind. Missing parent
/// directories are created.
///
/// # Errors
///
/// [`ScraperError::Serialize`] if `value` cannot be encoded, or
/// [`ScraperError::Io`] for any filesystem failure.
pub fn write_json_atomic<T>(path: &Path, value: &T) -> Result<(), ScraperError>
where
    T: Serialize + ?Sized,
{
    let mut json = serde_json::to_string_pretty(value).map_err(ScraperError::Serialize)?;
    json.push('\n');

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| io_error(parent, source))?;
    }

    let tmp = temp_sibling(path);
    fs::write(&tmp, json).map_err(|source| io_error(&tmp, source))?;
    if let Err(source) = fs::rename(&tmp, path) {
        let _ = fs::remove_file(&tmp);
        return Err(io_error(path, source));
    }
    Ok(())
}

fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}

fn io_error(path: &Path, source: std::io::Error) -> ScraperError {
    ScraperError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, ScraperError> {
    let raw = fs::read_to_string(path).map_err(|source| io_error(path, source))?;
    serde_json::from_str(&raw).map_err(|source| ScraperError::Deserialize {
        context: path.display().to_string(),
        source,
    })
}

/// Loads a listing written by an earlier run, for the detail-only phase.
///
/// # Errors
///
/// [`ScraperError::Io`] if the file cannot be read, or
/// [`ScraperError::Deserialize`] if it is not a listing document.
pub fn read_listing(path: &Path) -> Result<Vec<ProfessorSummary>, ScraperError> {
    read_json(path)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedProfessor {
    pub professor: String,
    pub reason: String,
}

/// Counters accumulated while the run progresses.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunStats {
    pub skipped: Vec<SkippedProfessor>,
    pub listing_cards_dropped: usize,
    pub reviews_dropped_as_noise: usize,
    pub pagination_breaker_trips: usize,
    pub invalid_records: usize,
    /// Professors kept with no reviews because the review list could not be read.
    pub reviews_unreadable: usize,
    /// Set when the run stopped early on an interrupt.
    pub interrupted: bool,
}

impl RunStats {
    pub fn skip(&mut self, professor: impl Into<String>, reason: impl Into<String>) {
        self.skipped.push(SkippedProfessor {
            professor: professor.into(),
            reason: reason.into(),
        });
    }
}

/// End-of-run account of what was written and what was lost.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    pub total_professors_scraped: usize,
    pub total_reviews_collected: usize,
    pub average_reviews_per_professor: f64,
    pub departments: BTreeMap<String, usize>,
    pub errors_encountered: usize,
    pub professors_skipped: usize,
    pub skipped_list: Vec<SkippedProfessor>,
    pub listing_cards_dropped: usize,
    pub reviews_dropped_as_noise: usize,
    pub pagination_breaker_trips: usize,
    pub invalid_records: usize,
    pub reviews_unreadable: usize,
    pub interrupted: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunSummary {
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn build(
        records: &[ProfessorRecord],
        stats: &RunStats,
        started_at: DateTime<Utc>,
        finished_at: DateTime<Utc>,
    ) -> Self {
        let total_reviews: usize = records.iter().map(ProfessorRecord::review_count).sum();
        let average = if records.is_empty() {
            0.0
        } else {
            round2(total_reviews as f64 / records.len() as f64)
        };

        let mut departments = BTreeMap::new();
        for record in records {
            let department = if record.department.trim().is_empty() {
                "Unknown".to_owned()
            } else {
                record.department.clone()
            };
            *departments.entry(department).or_insert(0) += 1;
        }

        Self {
            total_professors_scraped: records.len(),
            total_reviews_collected: total_reviews,
            average_reviews_per_professor: average,
            departments,
            errors_encountered: stats.skipped.len()
                + stats.pagination_breaker_trips
                + stats.listing_cards_dropped
                + stats.reviews_unreadable,
            professors_skipped: stats.skipped.len(),
            skipped_list: stats.skipped.clone(),
            listing_cards_dropped: stats.listing_cards_dropped,
            reviews_dropped_as_noise: stats.reviews_dropped_as_noise,
            pagination_breaker_trips: stats.pagination_breaker_trips,
            invalid_records: stats.invalid_records,
            reviews_unreadable: stats.reviews_unreadable,
            interrupted: stats.interrupted,
            started_at,
            finished_at,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use profdb_core::{RatingDistribution, ReviewRecord};

    fn record(name: &str, department: &str, reviews: usize) -> ProfessorRecord {
        let review = ReviewRecord {
            course_code: "N/A".to_owned(),
            for_credit: false,
            attendance: "N/A".to_owned(),
            grade: "N/A".to_owned(),
            textbook_used: "N/A".to_owned(),
            quality_score: Some(4.0),
            difficulty_score: None,
            review_text: "Good".to_owned(),
            tags: vec![],
            date_posted: String::new(),
            helpful_upvotes: 0,
            helpful_downvotes: 0,
        };
        ProfessorRecord {
            name: name.to_owned(),
            department: department.to_owned(),
            overall_quality: Some(4.0),
            difficulty_level: None,
            would_take_again: None,
            rating_distribution: RatingDistribution::default(),
            tags: vec![],
            reviews: vec![review; reviews],
            detail_url: format!("https://example.test/{name}"),
        }
    }

    #[test]
    fn writes_pretty_json_and_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/out/usf_professors.json");
        let records = vec![record("José Núñez", "Física", 1)];

        write_json_atomic(&path, &records).unwrap();

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.ends_with('\n'));
        assert!(raw.contains("José Núñez"), "non-ASCII must be preserved: {raw}");
        assert!(raw.contains("\n  {"), "expected pretty output: {raw}");
        assert!(!raw.contains("detail_url"));
        assert!(raw.contains("\"professor_name\": \"José Núñez\""), "{raw}");

        let leftovers: Vec<_> = fs::read_dir(path.parent().unwrap())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers.len(), 1, "temp file left behind: {leftovers:?}");
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("summary.json");
        fs::write(&path, "stale").unwrap();
        write_json_atomic(&path, &vec![1, 2, 3]).unwrap();
        let parsed: Vec<u32> = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed, vec![1, 2, 3]);
    }

    #[test]
    fn listing_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("usf_professors_main.json");
        let listing = vec![ProfessorSummary {
            name: "Ada Lovelace".to_owned(),
            department: "Mathematics".to_owned(),
            university: "University of South Florida".to_owned(),
            rating_count: 12,
            avg_quality: Some(4.5),
            avg_difficulty: None,
            would_take_again_pct: None,
            detail_url: "https://www.ratemyprofessors.com/professor/1".to_owned(),
        }];
        write_json_atomic(&path, &listing).unwrap();
        assert_eq!(read_listing(&path).unwrap(), listing);
    }

    #[test]
    fn read_listing_reports_malformed_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{not json").unwrap();
        let err = read_listing(&path).unwrap_err();
        assert!(matches!(err, ScraperError::Deserialize { .. }), "got: {err:?}");
    }

    #[test]
    fn read_listing_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_listing(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, ScraperError::Io { .. }), "got: {err:?}");
    }

    #[test]
    fn summary_counts_reviews_departments_and_errors() {
        let records = vec![
            record("a", "Mathematics", 2),
            record("b", "Biology", 1),
            record("c", "Mathematics", 0),
        ];
        let mut stats = RunStats {
            listing_cards_dropped: 1,
            reviews_dropped_as_noise: 4,
            pagination_breaker_trips: 2,
            invalid_records: 1,
            reviews_unreadable: 3,
            ..RunStats::default()
        };
        stats.skip("d", "navigation to https://example.test/d failed: timeout");
        stats.skip("e", "validation failed: overall_quality: out of range");

        let now = Utc::now();
        let summary = RunSummary::build(&records, &stats, now, now);

        assert_eq!(summary.total_professors_scraped, 3);
        assert_eq!(summary.total_reviews_collected, 3);
        assert!((summary.average_reviews_per_professor - 1.0).abs() < f64::EPSILON);
        assert_eq!(
            summary.departments.into_iter().collect::<Vec<_>>(),
            vec![("Biology".to_owned(), 1), ("Mathematics".to_owned(), 2)]
        );
        assert_eq!(summary.professors_skipped, 2);
        assert_eq!(summary.errors_encountered, 8);
        assert_eq!(summary.reviews_unreadable, 3);
        assert!(!summary.interrupted);
        assert_eq!(summary.skipped_list[1].professor, "e");
        assert_eq!(summary.reviews_dropped_as_noise, 4);
    }

    #[test]
    fn average_is_rounded_to_two_places() {
        let records = vec![record("a", "X", 1), record("b", "X", 1), record("c", "X", 0)];
        let now = Utc::now();
        let summary = RunSummary::build(&records, &RunStats::default(), now, now);
        assert!((summary.average_reviews_per_professor - 0.67).abs() < 1e-9);
    }

    #[test]
    fn empty_run_has_zero_average() {
        let now = Utc::now();
        let summary = RunSummary::build(&[], &RunStats::default(), now, now);
        assert_eq!(summary.total_professors_scraped, 0);
        assert!(summary.average_reviews_per_professor.abs() < f64::EPSILON);
        assert!(summary.departments.is_empty());
    }

    #[test]
    fn summary_serializes_with_expected_keys() {
        let now = Utc::now();
        let summary = RunSummary::build(&[], &RunStats::default(), now, now);
        let value = serde_json::to_value(&summary).unwrap();
        for key in [
            "total_professors_scraped",
            "total_reviews_collected",
            "average_reviews_per_professor",
            "departments",
            "errors_encountered",
            "professors_skipped",
            "skipped_list",
            "listing_cards_dropped",
            "reviews_dropped_as_noise",
            "pagination_breaker_trips",
            "invalid_records",
            "reviews_unreadable",
            "interrupted",
        ] {
            assert!(value.get(key).is_some(), "missing key {key}");
        }
    }
}
