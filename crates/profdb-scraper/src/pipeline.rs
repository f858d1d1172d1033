//! Sequential scrape orchestration: listing, then one professor at a time.
//!
//! Failures are contained at the narrowest scope. A field falls back to its
//! default, a professor is skipped and recorded in [`RunStats`], and only a
//! failed listing phase is returned as an error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use profdb_core::{AppConfig, ProfessorRecord, ProfessorSummary};
use tracing::Instrument;

use crate::aggregate::merge;
use crate::detail::{extract_detail, DetailSettings};
use crate::driver::PageDriver;
use crate::error::ScraperError;
use crate::listing::extract_listing;
use crate::output::RunStats;
use crate::pagination::{DoneReason, LoadMoreOutcome, LoadMoreSettings};
use crate::rate_limit::{polite_pause, RetryPolicy};
use crate::reviews::extract_reviews;
use crate::selectors::CompiledSelectors;
use crate::validate::{describe, validate};

/// Tunables for one run, derived from [`AppConfig`] plus the CLI delay.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    pub listing_url: String,
    pub university: String,
    pub retry: RetryPolicy,
    pub listing_load_more: LoadMoreSettings,
    pub review_load_more: LoadMoreSettings,
    pub detail: DetailSettings,
    /// Base politeness delay between professors, jittered.
    pub delay: Duration,
    /// Raised to stop the run early; shared with both load-more loops.
    pub cancel: Arc<AtomicBool>,
}

impl ScrapeSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig, delay: Duration) -> Self {
        let retry = RetryPolicy::new(
            config.retry_max_attempts,
            Duration::from_millis(config.retry_base_delay_ms),
        );
        let cancel = Arc::new(AtomicBool::new(false));
        let load_more = |max_clicks| LoadMoreSettings {
            retry,
            breaker_threshold: config.breaker_threshold,
            max_clicks,
            throttle: delay,
            cancel: Arc::clone(&cancel),
        };
        Self {
            listing_url: config.listing_url.clone(),
            university: config.university.clone(),
            listing_load_more: load_more(config.listing_max_clicks),
            review_load_more: load_more(config.review_max_clicks),
            detail: DetailSettings {
                retry,
                missing_element_wait: Duration::from_millis(config.missing_element_wait_ms),
            },
            retry,
            delay,
            cancel,
        }
    }

    /// Replaces the cancel flag everywhere it is checked.
    #[must_use]
    pub fn with_cancel(mut self, cancel: Arc<AtomicBool>) -> Self {
        self.listing_load_more.cancel = Arc::clone(&cancel);
        self.review_load_more.cancel = Arc::clone(&cancel);
        self.cancel = cancel;
        self
    }

    fn cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }
}

/// Drives one scrape over a [`PageDriver`] and keeps the run counters.
pub struct Scraper<'a, D: PageDriver + ?Sized> {
    driver: &'a D,
    selectors: CompiledSelectors,
    settings: ScrapeSettings,
    stats: RunStats,
}

impl<'a, D: PageDriver + ?Sized> Scraper<'a, D> {
    #[must_use]
    pub fn new(driver: &'a D, selectors: CompiledSelectors, settings: ScrapeSettings) -> Self {
        Self {
            driver,
            selectors,
            settings,
            stats: RunStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> &RunStats {
        &self.stats
    }

    #[must_use]
    pub fn into_stats(self) -> RunStats {
        self.stats
    }

    /// Runs the listing phase. A cancel raised while loading stops the
    /// load-more loop and returns the professors already on the page.
    ///
    /// # Errors
    ///
    /// Propagates the listing failure; this is the only run-fatal condition.
    pub async fn scrape_listing(&mut self) -> Result<Vec<ProfessorSummary>, ScraperError> {
        let outcome = extract_listing(
            self.driver,
            &self.settings.listing_url,
            &self.settings.university,
            &self.selectors.listing,
            &self.settings.retry,
            &self.settings.listing_load_more,
        )
        .await?;
        self.stats.listing_cards_dropped += outcome.cards_dropped;
        self.note_load_more(&outcome.load_more);
        Ok(outcome.professors)
    }

    /// Scrapes every professor in order. Professors that fail are skipped
    /// and recorded; the returned records all passed validation.
    ///
    /// The cancel flag is checked before each professor; once set, the run
    /// stops and the records gathered so far are returned.
    pub async fn scrape_professors(
        &mut self,
        summaries: &[ProfessorSummary],
    ) -> Vec<ProfessorRecord> {
        let total = summaries.len();
        let mut records = Vec::with_capacity(total);

        for (idx, summary) in summaries.iter().enumerate() {
            if self.settings.cancelled() {
                self.stats.interrupted = true;
                tracing::warn!(
                    done = idx,
                    total,
                    "cancellation requested; stopping before next professor"
                );
                break;
            }
            if idx > 0 {
                polite_pause(self.settings.delay).await;
            }

            tracing::info!(
                professor = %summary.name,
                position = idx + 1,
                total,
                "scraping professor"
            );
            let span = tracing::info_span!("professor", url = %summary.detail_url);
            if let Some(record) = self.scrape_professor(summary).instrument(span).await {
                records.push(record);
            }
        }

        tracing::info!(
            scraped = records.len(),
            skipped = self.stats.skipped.len(),
            "professor phase complete"
        );
        records
    }

    /// Detail, reviews, merge and validation for one professor. `None` means
    /// the professor was skipped (the reason is in [`RunStats::skipped`]) or
    /// the run was cancelled before its reviews finished loading.
    pub async fn scrape_professor(
        &mut self,
        summary: &ProfessorSummary,
    ) -> Option<ProfessorRecord> {
        let professor = identifier(summary);

        let detail = match extract_detail(
            self.driver,
            &summary.detail_url,
            &self.selectors.detail,
            &self.settings.detail,
        )
        .await
        {
            Ok(detail) => detail,
            Err(err) => {
                tracing::warn!(
                    professor = %professor,
                    url = %summary.detail_url,
                    error = %err,
                    "skipping professor: detail page failed"
                );
                self.stats.skip(professor, err.to_string());
                return None;
            }
        };

        let reviews = match extract_reviews(
            self.driver,
            &self.selectors.reviews,
            &self.settings.review_load_more,
        )
        .await
        {
            Ok(outcome) => {
                self.note_load_more(&outcome.load_more);
                if outcome.load_more.reason == DoneReason::Cancelled {
                    tracing::warn!(
                        professor = %professor,
                        reviews_loaded = outcome.reviews.len(),
                        "cancelled mid-professor; leaving it out of the dataset"
                    );
                    return None;
                }
                self.stats.reviews_dropped_as_noise += outcome.dropped_as_noise;
                outcome.reviews
            }
            Err(err) => {
                tracing::warn!(
                    professor = %professor,
                    error = %err,
                    "reviews could not be read; keeping professor without reviews"
                );
                self.stats.reviews_unreadable += 1;
                Vec::new()
            }
        };

        let record = merge(summary, detail, reviews);
        if let Err(violations) = validate(&record) {
            let err = ScraperError::Validation {
                professor: record.identifier().to_owned(),
                violations: violations.iter().map(ToString::to_string).collect(),
            };
            tracing::warn!(error = %err, "dropping invalid professor record");
            self.stats.invalid_records += 1;
            self.stats
                .skip(professor, format!("validation failed: {}", describe(&violations)));
            return None;
        }

        tracing::info!(
            professor = %record.identifier(),
            reviews = record.review_count(),
            tags = record.tags.len(),
            "professor scraped"
        );
        Some(record)
    }

    fn note_load_more(&mut self, outcome: &LoadMoreOutcome) {
        match outcome.reason {
            DoneReason::BreakerTripped => self.stats.pagination_breaker_trips += 1,
            DoneReason::Cancelled => self.stats.interrupted = true,
            DoneReason::ControlAbsent | DoneReason::ClickLimit => {}
        }
    }
}

fn identifier(summary: &ProfessorSummary) -> String {
    if summary.name.trim().is_empty() {
        summary.detail_url.clone()
    } else {
        summary.name.clone()
    }
}
