//! Professor detail page: scalar metadata, rating distribution and tags.
//!
//! The three groups are extracted independently. A group that is missing
//! gets one grace wait and a re-read of the page before it falls back to
//! its default, so a slow-rendering block never aborts the page.

use std::time::Duration;

use profdb_core::{RatingDistribution, Tier};
use scraper::Html;

use crate::driver::PageDriver;
use crate::error::ScraperError;
use crate::normalize::{clean_text, dedup_cleaned, parse_number, parse_percentage};
use crate::rate_limit::{retry_once_if_absent, RetryPolicy};
use crate::selectors::{element_text, DetailSelectors};

/// Everything read from one detail page. `None` means the page did not
/// provide the value; merging falls back to the listing card.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailResult {
    pub name: Option<String>,
    pub department: Option<String>,
    pub overall_quality: Option<f64>,
    pub difficulty_level: Option<f64>,
    pub would_take_again: Option<u8>,
    pub rating_distribution: RatingDistribution,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailMetadata {
    pub name: Option<String>,
    pub department: Option<String>,
    pub overall_quality: Option<f64>,
    pub difficulty_level: Option<f64>,
    pub would_take_again: Option<u8>,
}

impl DetailMetadata {
    /// Fields expected on every detail page that were not found.
    /// `would_take_again` is excluded: "N/A" is a legitimate value.
    #[must_use]
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.department.is_none() {
            missing.push("department");
        }
        if self.overall_quality.is_none() {
            missing.push("overall_quality");
        }
        if self.difficulty_level.is_none() {
            missing.push("difficulty_level");
        }
        missing
    }

    /// Fills every empty field from `later`.
    pub fn fill_missing(&mut self, later: DetailMetadata) {
        self.name = self.name.take().or(later.name);
        self.department = self.department.take().or(later.department);
        self.overall_quality = self.overall_quality.or(later.overall_quality);
        self.difficulty_level = self.difficulty_level.or(later.difficulty_level);
        self.would_take_again = self.would_take_again.or(later.would_take_again);
    }
}

#[derive(Debug, Clone)]
pub struct DetailSettings {
    pub retry: RetryPolicy,
    /// Single grace wait before a missing group is accepted as absent.
    pub missing_element_wait: Duration,
}

/// Navigates to `url` and extracts the three detail groups.
///
/// # Errors
///
/// Navigation failure after the retry policy is exhausted, or failure to
/// read the page source. The caller skips the professor.
pub async fn extract_detail<D>(
    driver: &D,
    url: &str,
    selectors: &DetailSelectors,
    settings: &DetailSettings,
) -> Result<DetailResult, ScraperError>
where
    D: PageDriver + ?Sized,
{
    settings
        .retry
        .run("navigate to professor", || driver.navigate(url))
        .await?;

    let source = driver.page_source().await?;
    let wait = settings.missing_element_wait;

    let mut metadata = parse_metadata(&source, selectors);
    let missing = metadata.missing_fields();
    if !missing.is_empty() {
        tracing::debug!(?missing, wait_ms = wait_ms(wait), "metadata incomplete, waiting once");
        tokio::time::sleep(wait).await;
        match driver.page_source().await {
            Ok(source) => metadata.fill_missing(parse_metadata(&source, selectors)),
            Err(err) => {
                tracing::debug!(error = %err, "could not re-read page for missing metadata");
            }
        }
        for field in metadata.missing_fields() {
            let err = ScraperError::MissingField {
                field: field.to_owned(),
            };
            tracing::warn!(error = %err, url, "leaving field empty");
        }
    }

    let rating_distribution = match find_with_grace(driver, wait, |html| {
        parse_distribution(html, selectors)
    })
    .await
    {
        Some(distribution) => distribution,
        None => {
            tracing::warn!("rating distribution not found; defaulting every tier to 0");
            RatingDistribution::default()
        }
    };

    let tags = find_with_grace(driver, wait, |html| {
        let tags = parse_tags(html, selectors);
        (!tags.is_empty()).then_some(tags)
    })
    .await
    .unwrap_or_default();

    tracing::debug!(
        tags = tags.len(),
        ratings = rating_distribution.total(),
        "detail page extracted"
    );

    Ok(DetailResult {
        name: metadata.name,
        department: metadata.department,
        overall_quality: metadata.overall_quality,
        difficulty_level: metadata.difficulty_level,
        would_take_again: metadata.would_take_again,
        rating_distribution,
        tags,
    })
}

/// Re-reads the page source and applies `parse`, with one grace wait when
/// the first read finds nothing.
async fn find_with_grace<D, T>(
    driver: &D,
    wait: Duration,
    parse: impl Fn(&str) -> Option<T>,
) -> Option<T>
where
    D: PageDriver + ?Sized,
{
    let parse = &parse;
    retry_once_if_absent(wait, || async move {
        let source = driver.page_source().await.ok()?;
        parse(&source)
    })
    .await
}

#[allow(clippy::cast_possible_truncation)]
fn wait_ms(wait: Duration) -> u64 {
    wait.as_millis() as u64
}

/// Scalar metadata. Each field tries its candidate selectors in order.
#[must_use]
pub fn parse_metadata(html: &str, selectors: &DetailSelectors) -> DetailMetadata {
    let document = Html::parse_document(html);
    let root = document.root_element();

    let mut difficulty_level = None;
    let mut would_take_again = None;
    for item in selectors.feedback_item.all(root) {
        let label = clean_text(&element_text(item)).to_lowercase();
        let number = selectors
            .feedback_number
            .first(item)
            .map(|n| clean_text(&element_text(n)));
        let Some(number) = number else {
            continue;
        };
        if label.contains("would take again") {
            would_take_again = would_take_again.or_else(|| parse_percentage(&number));
        } else if label.contains("difficulty") {
            difficulty_level = difficulty_level.or_else(|| parse_number(&number));
        }
    }

    DetailMetadata {
        name: selectors.name.first_text(root),
        department: selectors.department.first_text(root),
        overall_quality: selectors.quality.first_parsed(root, parse_number),
        difficulty_level,
        would_take_again,
    }
}

/// Tier counts, or `None` when the distribution section is absent.
///
/// Each tier row is recognised by its label as a whole word; the count is
/// the last integer in the row (`"Awesome 5"` and `"5 Awesome 28"` both
/// give the trailing number). Tiers without a row stay at 0.
#[must_use]
pub fn parse_distribution(html: &str, selectors: &DetailSelectors) -> Option<RatingDistribution> {
    let document = Html::parse_document(html);
    let section = selectors.distribution_section.first(document.root_element())?;

    let mut distribution = RatingDistribution::default();
    for row in selectors.distribution_item.all(section) {
        let text = clean_text(&element_text(row));
        let words: Vec<&str> = text.split_whitespace().collect();
        let Some(tier) = Tier::ALL
            .into_iter()
            .find(|tier| words.iter().any(|word| names_tier(word, *tier)))
        else {
            continue;
        };
        let count = words
            .iter()
            .rev()
            .find_map(|word| word.replace(',', "").parse::<u32>().ok());
        if let Some(count) = count {
            distribution.set(tier, count);
        }
    }
    Some(distribution)
}

fn names_tier(word: &str, tier: Tier) -> bool {
    word.trim_matches(|c: char| !c.is_alphabetic())
        .eq_ignore_ascii_case(tier.label())
}

/// Professor tags, cleaned and de-duplicated in page order.
#[must_use]
pub fn parse_tags(html: &str, selectors: &DetailSelectors) -> Vec<String> {
    let document = Html::parse_document(html);
    dedup_cleaned(
        selectors
            .tags
            .all(document.root_element())
            .into_iter()
            .map(element_text),
    )
}

#[cfg(test)]
#[path = "detail_test.rs"]
mod tests;
