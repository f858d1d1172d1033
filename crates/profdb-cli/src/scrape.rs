//! The scrape command: session lifecycle around the two pipeline phases.
//!
//! The browser session is closed on every exit path, including errors and
//! panics inside the pipeline. A first Ctrl-C stops the run at the next
//! professor boundary (or ends the load-more loop in progress) and the
//! completed records are still written. A second Ctrl-C abandons the run,
//! closes the session and exits with status 130.

use std::panic::AssertUnwindSafe;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use futures::FutureExt;
use profdb_core::{AppConfig, ProfessorSummary, SiteSelectors};
use profdb_scraper::{
    read_listing, write_json_atomic, CompiledSelectors, RunSummary, ScrapeSettings, Scraper,
    SessionOptions, WebDriverSession,
};
use tokio::sync::Notify;

const INTERRUPTED_EXIT: u8 = 130;

#[derive(Debug, Clone)]
pub(crate) struct RunOptions {
    pub headless: bool,
    pub output: PathBuf,
    pub delay: Duration,
    pub max_professors: Option<usize>,
    pub listing_output: PathBuf,
    pub summary_output: PathBuf,
    pub from_listing: Option<PathBuf>,
}

/// Runs one full scrape. Returns the interrupted exit status when a second
/// Ctrl-C abandons the run.
///
/// # Errors
///
/// Returns an error if the selectors or listing file cannot be loaded, the
/// browser session cannot be started, the listing phase fails or finds no
/// professors, or an output file cannot be written.
pub(crate) async fn run(config: &AppConfig, options: RunOptions) -> anyhow::Result<ExitCode> {
    let site = match &config.selectors_path {
        Some(path) => profdb_core::load_selectors(path)
            .with_context(|| format!("loading selectors from {}", path.display()))?,
        None => SiteSelectors::default(),
    };
    let selectors = CompiledSelectors::compile(&site)?;

    // Read before starting the browser so a bad file fails fast.
    let preloaded = match &options.from_listing {
        Some(path) => Some(load_listing_file(path)?),
        None => None,
    };

    let cancel = Arc::new(AtomicBool::new(false));
    let abort = Arc::new(Notify::new());
    spawn_ctrl_c_watcher(Arc::clone(&cancel), Arc::clone(&abort));

    let session = WebDriverSession::start(&SessionOptions {
        webdriver_url: config.webdriver_url.clone(),
        headless: options.headless,
        user_agent: config.user_agent.clone(),
        request_timeout: Duration::from_secs(config.request_timeout_secs),
        page_load_timeout: Duration::from_secs(config.page_load_timeout_secs),
    })
    .await
    .context("starting browser session")?;

    let settings = ScrapeSettings::from_config(config, options.delay).with_cancel(cancel);
    let scrape = AssertUnwindSafe(run_with_session(
        &session, selectors, settings, &options, preloaded,
    ))
    .catch_unwind();
    let outcome = tokio::select! {
        outcome = scrape => Some(outcome),
        () = abort.notified() => None,
    };

    if let Err(err) = session.close().await {
        tracing::warn!(error = %err, "failed to close browser session");
    }

    match outcome {
        Some(Ok(result)) => result.map(|()| ExitCode::SUCCESS),
        Some(Err(panic)) => std::panic::resume_unwind(panic),
        None => {
            tracing::error!("run abandoned on second interrupt; results not written");
            Ok(ExitCode::from(INTERRUPTED_EXIT))
        }
    }
}

fn load_listing_file(path: &Path) -> anyhow::Result<Vec<ProfessorSummary>> {
    let listing = read_listing(path)
        .with_context(|| format!("reading listing file {}", path.display()))?;
    if listing.is_empty() {
        anyhow::bail!("listing file {} contains no professors", path.display());
    }
    tracing::info!(
        path = %path.display(),
        professors = listing.len(),
        "loaded professors from listing file"
    );
    Ok(listing)
}

/// First Ctrl-C raises `cancel`; the second wakes `abort`.
fn spawn_ctrl_c_watcher(cancel: Arc<AtomicBool>, abort: Arc<Notify>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        tracing::warn!("interrupt received; finishing current professor, then writing results");
        cancel.store(true, Ordering::SeqCst);

        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("second interrupt received; abandoning run");
            abort.notify_one();
        }
    });
}

async fn run_with_session(
    session: &WebDriverSession,
    selectors: CompiledSelectors,
    settings: ScrapeSettings,
    options: &RunOptions,
    preloaded: Option<Vec<ProfessorSummary>>,
) -> anyhow::Result<()> {
    let started_at = chrono::Utc::now();
    let mut scraper = Scraper::new(session, selectors, settings);

    let mut professors = match preloaded {
        Some(listing) => listing,
        None => {
            let listing = scraper
                .scrape_listing()
                .await
                .context("listing phase failed")?;
            if listing.is_empty() {
                anyhow::bail!("listing phase found no professors");
            }
            write_json_atomic(&options.listing_output, &listing)?;
            tracing::info!(
                path = %options.listing_output.display(),
                professors = listing.len(),
                "wrote professor listing"
            );
            listing
        }
    };

    if let Some(max) = options.max_professors {
        if professors.len() > max {
            tracing::info!(max, found = professors.len(), "limiting professors");
            professors.truncate(max);
        }
    }

    let records = scraper.scrape_professors(&professors).await;
    write_json_atomic(&options.output, &records)?;
    tracing::info!(
        path = %options.output.display(),
        professors = records.len(),
        "wrote professor dataset"
    );

    let summary = RunSummary::build(&records, scraper.stats(), started_at, chrono::Utc::now());
    write_json_atomic(&options.summary_output, &summary)?;
    tracing::info!(
        path = %options.summary_output.display(),
        professors = summary.total_professors_scraped,
        reviews = summary.total_reviews_collected,
        skipped = summary.professors_skipped,
        errors = summary.errors_encountered,
        average_reviews = summary.average_reviews_per_professor,
        interrupted = summary.interrupted,
        "run complete"
    );
    tracing::info!(departments = ?summary.departments, "professors by department");
    for skipped in summary.skipped_list.iter().take(10) {
        tracing::warn!(professor = %skipped.professor, reason = %skipped.reason, "skipped");
    }
    if summary.skipped_list.len() > 10 {
        tracing::warn!(more = summary.skipped_list.len() - 10, "further professors skipped");
    }
    Ok(())
}
