//! Reviews on a professor's detail page.
//!
//! Loads every review through the "load more ratings" control, then parses
//! each review element. Sub-fields the review does not provide fall back to
//! defaults; only reviews with neither text nor scores are dropped.

use std::sync::LazyLock;

use profdb_core::ReviewRecord;
use regex::Regex;
use scraper::{ElementRef, Html};

use crate::driver::PageDriver;
use crate::error::ScraperError;
use crate::normalize::{clean_text, dedup_cleaned, parse_boolean, parse_count, parse_number};
use crate::pagination::{load_all, LoadMoreOutcome, LoadMoreSettings};
use crate::selectors::{element_text, ReviewSelectors};

const NOT_AVAILABLE: &str = "N/A";

static FOR_CREDIT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)for credit:\s*(\w+)").expect("valid regex"));
static ATTENDANCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)attendance:\s*(\w+)").expect("valid regex"));
static GRADE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)grade\s*(?:received)?:\s*",
        r"([A-F][+-]?|Pass|Fail|Incomplete|Withdraw|Audit|Not sure yet|Rather not say)",
    ))
    .expect("valid regex")
});
static TEXTBOOK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)textbook:\s*(\w+(?:\s+\w+)?)").expect("valid regex"));

#[derive(Debug, Clone)]
pub struct ReviewsOutcome {
    /// In page order.
    pub reviews: Vec<ReviewRecord>,
    pub dropped_as_noise: usize,
    pub load_more: LoadMoreOutcome,
}

/// Reviews parsed from one page snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReviews {
    pub reviews: Vec<ReviewRecord>,
    pub dropped_as_noise: usize,
}

/// Expands the review list on the current page and parses every review.
///
/// Pagination problems never fail this call; the breaker ends the loop and
/// whatever is loaded is parsed.
///
/// # Errors
///
/// Only when the page source cannot be read after loading.
pub async fn extract_reviews<D>(
    driver: &D,
    selectors: &ReviewSelectors,
    load_more: &LoadMoreSettings,
) -> Result<ReviewsOutcome, ScraperError>
where
    D: PageDriver + ?Sized,
{
    let load_more = load_all(driver, &selectors.load_more, load_more, "reviews").await;
    let source = driver.page_source().await?;
    let parsed = parse_reviews(&source, selectors);
    tracing::info!(
        reviews = parsed.reviews.len(),
        dropped_as_noise = parsed.dropped_as_noise,
        clicks = load_more.clicks,
        "reviews extracted"
    );
    Ok(ReviewsOutcome {
        reviews: parsed.reviews,
        dropped_as_noise: parsed.dropped_as_noise,
        load_more,
    })
}

/// Parses every review element in `html`, in encounter order.
#[must_use]
pub fn parse_reviews(html: &str, selectors: &ReviewSelectors) -> ParsedReviews {
    let document = Html::parse_document(html);
    let mut parsed = ParsedReviews::default();

    for (idx, item) in selectors.item.all(document.root_element()).into_iter().enumerate() {
        let review = parse_review(item, selectors);
        if review.is_noise() {
            tracing::debug!(review = idx, "dropping review with no text and no scores");
            parsed.dropped_as_noise += 1;
            continue;
        }
        parsed.reviews.push(review);
    }
    parsed
}

/// Labelled metadata read from "Label: Value" items.
#[derive(Debug, Default)]
struct ReviewMeta {
    for_credit: Option<String>,
    attendance: Option<String>,
    grade: Option<String>,
    textbook: Option<String>,
}

impl ReviewMeta {
    fn from_items(item: ElementRef<'_>, selectors: &ReviewSelectors) -> Self {
        let mut meta = Self::default();
        for entry in selectors.meta_item.all(item) {
            let text = clean_text(&element_text(entry));
            let Some((label, value)) = text.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let label = label.to_lowercase();
            let slot = if label.contains("credit") {
                &mut meta.for_credit
            } else if label.contains("attendance") {
                &mut meta.attendance
            } else if label.contains("grade") {
                &mut meta.grade
            } else if label.contains("textbook") {
                &mut meta.textbook
            } else {
                continue;
            };
            if slot.is_none() {
                *slot = Some(value.to_owned());
            }
        }
        meta
    }
}

fn capture(re: &Regex, text: &str) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_owned())
}

fn parse_review(item: ElementRef<'_>, selectors: &ReviewSelectors) -> ReviewRecord {
    let full_text = clean_text(&element_text(item));
    let meta = ReviewMeta::from_items(item, selectors);

    let for_credit = meta
        .for_credit
        .or_else(|| capture(&FOR_CREDIT_RE, &full_text))
        .is_some_and(|value| parse_boolean(&value));
    let attendance = meta
        .attendance
        .or_else(|| capture(&ATTENDANCE_RE, &full_text))
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
    let grade = meta
        .grade
        .or_else(|| capture(&GRADE_RE, &full_text))
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());
    let textbook_used = meta
        .textbook
        .or_else(|| capture(&TEXTBOOK_RE, &full_text))
        .unwrap_or_else(|| NOT_AVAILABLE.to_owned());

    let positional: Vec<Option<f64>> = selectors
        .score
        .all(item)
        .into_iter()
        .map(|e| parse_number(&element_text(e)))
        .collect();
    let quality_score = selectors
        .quality
        .first_parsed(item, parse_number)
        .or_else(|| positional.first().copied().flatten());
    let difficulty_score = selectors
        .difficulty
        .first_parsed(item, parse_number)
        .or_else(|| positional.get(1).copied().flatten());

    let (helpful_upvotes, helpful_downvotes) = helpful_votes(item, selectors);

    ReviewRecord {
        course_code: selectors
            .course
            .first_text(item)
            .unwrap_or_else(|| NOT_AVAILABLE.to_owned()),
        for_credit,
        attendance,
        grade,
        textbook_used,
        quality_score,
        difficulty_score,
        review_text: selectors.comments.first_text(item).unwrap_or_default(),
        tags: dedup_cleaned(selectors.tags.all(item).into_iter().map(element_text)),
        date_posted: selectors.date.first_text(item).unwrap_or_default(),
        helpful_upvotes,
        helpful_downvotes,
    }
}

/// `(up, down)` from "Helpful N" / "Not helpful N" (or thumbs up/down) items.
fn helpful_votes(item: ElementRef<'_>, selectors: &ReviewSelectors) -> (u32, u32) {
    let mut up = 0;
    let mut down = 0;
    for entry in selectors.helpful.all(item) {
        let text = clean_text(&element_text(entry)).to_lowercase();
        let Some(count) = parse_count(&text) else {
            continue;
        };
        if text.contains("not helpful") || text.contains("thumbs down") {
            down = count;
        } else if text.contains("helpful") || text.contains("thumbs up") {
            up = count;
        }
    }
    (up, down)
}

#[cfg(test)]
#[path = "reviews_test.rs"]
mod tests;
