//! Listing page: load every card, then map each card to a [`ProfessorSummary`].

use std::collections::HashSet;

use profdb_core::ProfessorSummary;
use reqwest::Url;
use scraper::{ElementRef, Html, Selector};

use crate::driver::PageDriver;
use crate::error::ScraperError;
use crate::normalize::{clean_text, parse_count, parse_number, parse_percentage};
use crate::pagination::{load_all, LoadMoreOutcome, LoadMoreSettings};
use crate::rate_limit::RetryPolicy;
use crate::selectors::{element_text, ListingSelectors};
use crate::validate::{describe, validate_summary};

#[derive(Debug, Clone)]
pub struct ListingOutcome {
    /// Deduplicated by `detail_url`, in page order.
    pub professors: Vec<ProfessorSummary>,
    /// Cards with no usable detail URL or failing validation.
    pub cards_dropped: usize,
    pub load_more: LoadMoreOutcome,
}

/// Cards parsed from one snapshot of the listing page.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedListing {
    pub professors: Vec<ProfessorSummary>,
    pub cards_dropped: usize,
    pub duplicates: usize,
}

/// Navigates to the listing, clicks "show more" until exhausted, and parses
/// every card on the page.
///
/// # Errors
///
/// Navigation failure after the retry policy is exhausted, or failure to read
/// the page source. Either is fatal to the run.
pub async fn extract_listing<D>(
    driver: &D,
    listing_url: &str,
    university: &str,
    selectors: &ListingSelectors,
    retry: &RetryPolicy,
    load_more: &LoadMoreSettings,
) -> Result<ListingOutcome, ScraperError>
where
    D: PageDriver + ?Sized,
{
    tracing::info!(url = listing_url, "loading professor listing");
    retry
        .run("navigate to listing", || driver.navigate(listing_url))
        .await?;

    let load_more = load_all(driver, &selectors.load_more, load_more, "listing").await;

    let source = driver.page_source().await?;
    let parsed = parse_listing(&source, listing_url, university, selectors);
    tracing::info!(
        professors = parsed.professors.len(),
        dropped = parsed.cards_dropped,
        duplicates = parsed.duplicates,
        clicks = load_more.clicks,
        "listing extracted"
    );

    Ok(ListingOutcome {
        professors: parsed.professors,
        cards_dropped: parsed.cards_dropped,
        load_more,
    })
}

/// Maps every card in `html` to a [`ProfessorSummary`].
///
/// Detail URLs are resolved against `base_url`. The first card seen for a
/// URL wins; later duplicates are skipped. Cards without a URL, or failing
/// basic validation, are dropped and logged.
#[must_use]
pub fn parse_listing(
    html: &str,
    base_url: &str,
    university: &str,
    selectors: &ListingSelectors,
) -> ParsedListing {
    let document = Html::parse_document(html);
    let base = Url::parse(base_url).ok();
    let mut seen: HashSet<String> = HashSet::new();
    let mut parsed = ParsedListing::default();

    for (idx, card) in selectors.card.all(document.root_element()).into_iter().enumerate() {
        let Some(detail_url) = card_href(card).and_then(|href| resolve_url(base.as_ref(), &href))
        else {
            tracing::warn!(card = idx, "dropping professor card without a detail URL");
            parsed.cards_dropped += 1;
            continue;
        };

        if seen.contains(&detail_url) {
            tracing::debug!(card = idx, url = %detail_url, "skipping duplicate professor card");
            parsed.duplicates += 1;
            continue;
        }

        let summary = parse_card(card, detail_url, university, selectors);
        if let Err(violations) = validate_summary(&summary) {
            tracing::warn!(
                card = idx,
                url = %summary.detail_url,
                violations = %describe(&violations),
                "dropping invalid professor card"
            );
            parsed.cards_dropped += 1;
            continue;
        }

        seen.insert(summary.detail_url.clone());
        parsed.professors.push(summary);
    }

    parsed
}

fn parse_card(
    card: ElementRef<'_>,
    detail_url: String,
    university: &str,
    selectors: &ListingSelectors,
) -> ProfessorSummary {
    let name = selectors.name.first_text(card).unwrap_or_default();

    // "Computer Science / University of South Florida"
    let department = selectors
        .school
        .first_text(card)
        .and_then(|school| school.split('/').next().map(clean_text))
        .unwrap_or_default();

    let avg_quality = selectors.quality.first_parsed(card, parse_number);
    let rating_count = selectors
        .rating_count
        .first_parsed(card, parse_count)
        .unwrap_or(0);

    let mut avg_difficulty = None;
    let mut would_take_again_pct = None;
    for item in selectors.feedback.all(card) {
        let text = clean_text(&element_text(item));
        let lowered = text.to_lowercase();
        if lowered.contains("would take again") {
            would_take_again_pct = parse_percentage(&text);
        } else if lowered.contains("difficulty") {
            avg_difficulty = parse_number(&text);
        }
    }

    ProfessorSummary {
        name,
        department,
        university: university.to_owned(),
        rating_count,
        avg_quality,
        avg_difficulty,
        would_take_again_pct,
        detail_url,
    }
}

/// The card's own `href`, or the first link inside it.
fn card_href(card: ElementRef<'_>) -> Option<String> {
    if let Some(href) = card.value().attr("href") {
        return Some(href.to_owned());
    }
    let link = Selector::parse("a[href]").ok()?;
    card.select(&link)
        .next()
        .and_then(|a| a.value().attr("href"))
        .map(str::to_owned)
}

/// Absolute http(s) URL for `href`, resolved against `base` when relative.
fn resolve_url(base: Option<&Url>, href: &str) -> Option<String> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') || href.starts_with("javascript:") {
        return None;
    }
    let url = match base {
        Some(base) => base.join(href).ok()?,
        None => Url::parse(href).ok()?,
    };
    matches!(url.scheme(), "http" | "https").then(|| url.to_string())
}

#[cfg(test)]
#[path = "listing_test.rs"]
mod tests;
