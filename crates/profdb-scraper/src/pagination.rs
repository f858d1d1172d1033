//! "Load more" pagination as an explicit two-state machine.
//!
//! While LOADING, the loop locates the load-more control, scrolls it into
//! view and clicks it through the [`RetryPolicy`]. It moves to DONE when the
//! control is gone, when the consecutive-failure breaker trips, when the
//! click ceiling is reached, or when the run is cancelled. Every path out of
//! LOADING is bounded.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use profdb_core::ControlLocator;

use crate::driver::{find_first, PageDriver};
use crate::error::ScraperError;
use crate::rate_limit::{polite_pause, RetryPolicy};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DoneReason {
    /// The control is no longer on the page: everything is loaded.
    ControlAbsent,
    /// `breaker_threshold` consecutive iterations failed.
    BreakerTripped,
    /// `max_clicks` successful clicks were made.
    ClickLimit,
    /// The shared cancel flag was raised.
    Cancelled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadState {
    Loading,
    Done(DoneReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadMoreOutcome {
    pub clicks: u32,
    pub reason: DoneReason,
}

#[derive(Debug, Clone)]
pub struct LoadMoreSettings {
    pub retry: RetryPolicy,
    pub breaker_threshold: u32,
    pub max_clicks: u32,
    /// Politeness delay after each click, jittered.
    pub throttle: Duration,
    /// Checked before every click; shared with the rest of the run.
    pub cancel: Arc<AtomicBool>,
}

/// Clicks the first matching control in `controls` until it disappears or
/// a bound is hit. Never fails: errors count towards the breaker and the
/// partial result stands.
pub async fn load_all<D>(
    driver: &D,
    controls: &[ControlLocator],
    settings: &LoadMoreSettings,
    context: &str,
) -> LoadMoreOutcome
where
    D: PageDriver + ?Sized,
{
    let threshold = settings.breaker_threshold.max(1);
    let mut clicks = 0u32;
    let mut consecutive_failures = 0u32;

    let reason = loop {
        let state = if settings.cancel.load(Ordering::SeqCst) {
            tracing::warn!(context, clicks, "cancellation requested; stopping load-more");
            LoadState::Done(DoneReason::Cancelled)
        } else if clicks >= settings.max_clicks {
            tracing::warn!(
                context,
                clicks,
                max_clicks = settings.max_clicks,
                "load-more click ceiling reached; some entries may not be loaded"
            );
            LoadState::Done(DoneReason::ClickLimit)
        } else {
            match click_next(driver, controls, &settings.retry).await {
                Ok(false) => LoadState::Done(DoneReason::ControlAbsent),
                Ok(true) => {
                    clicks += 1;
                    consecutive_failures = 0;
                    tracing::debug!(context, clicks, "clicked load-more control");
                    LoadState::Loading
                }
                Err(err) => {
                    consecutive_failures += 1;
                    if consecutive_failures >= threshold {
                        log_breaker_trip(context, consecutive_failures, clicks, &err);
                        LoadState::Done(DoneReason::BreakerTripped)
                    } else {
                        tracing::warn!(
                            context,
                            consecutive_failures,
                            error = %err,
                            "load-more iteration failed"
                        );
                        LoadState::Loading
                    }
                }
            }
        };

        match state {
            LoadState::Done(reason) => break reason,
            LoadState::Loading => polite_pause(settings.throttle).await,
        }
    };

    tracing::info!(context, clicks, ?reason, "finished loading");
    LoadMoreOutcome { clicks, reason }
}

/// One LOADING step: `Ok(false)` when no control is present, `Ok(true)`
/// after a successful click.
async fn click_next<D>(
    driver: &D,
    controls: &[ControlLocator],
    retry: &RetryPolicy,
) -> Result<bool, ScraperError>
where
    D: PageDriver + ?Sized,
{
    let Some(control) = find_first(driver, controls).await? else {
        return Ok(false);
    };
    retry
        .run("load more", || {
            let control = &control;
            async move {
                driver.scroll_into_view(control).await?;
                driver.click(control).await
            }
        })
        .await?;
    Ok(true)
}

fn log_breaker_trip(context: &str, consecutive_failures: u32, clicks: u32, err: &ScraperError) {
    tracing::warn!(
        context,
        consecutive_failures,
        clicks,
        error = %err,
        "circuit breaker tripped; keeping what is already loaded"
    );
}
