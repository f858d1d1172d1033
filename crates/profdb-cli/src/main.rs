mod scrape;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "profdb")]
#[command(about = "Scrape professor ratings and reviews into a JSON dataset")]
struct Cli {
    /// Run the browser without a window (default).
    #[arg(long, overrides_with = "no_headless")]
    headless: bool,

    /// Show the browser window.
    #[arg(long = "no-headless", overrides_with = "headless")]
    no_headless: bool,

    /// Final dataset path.
    #[arg(long, default_value = "usf_professors.json")]
    output: PathBuf,

    /// Base delay between page actions, in seconds (jittered).
    #[arg(long, default_value_t = 1.5, value_parser = parse_delay)]
    delay: f64,

    /// Stop after this many professors.
    #[arg(long)]
    max_professors: Option<usize>,

    /// Intermediate listing path, written after the listing phase.
    #[arg(long, default_value = "usf_professors_main.json")]
    listing_output: PathBuf,

    /// Run summary path.
    #[arg(long, default_value = "scraping_summary.json")]
    summary_output: PathBuf,

    /// Skip the listing phase and read professors from an earlier listing file.
    #[arg(long)]
    from_listing: Option<PathBuf>,
}

impl Cli {
    /// The last of `--headless` / `--no-headless` wins; neither means headless.
    fn headless(&self) -> bool {
        self.headless || !self.no_headless
    }
}

fn parse_delay(raw: &str) -> Result<f64, String> {
    let value: f64 = raw
        .parse()
        .map_err(|_| format!("'{raw}' is not a number of seconds"))?;
    if value.is_finite() && value >= 0.0 {
        Ok(value)
    } else {
        Err(format!("delay must be a non-negative number of seconds, got {raw}"))
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let config = profdb_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    let options = scrape::RunOptions {
        headless: cli.headless(),
        output: cli.output,
        delay: std::time::Duration::from_secs_f64(cli.delay),
        max_professors: cli.max_professors,
        listing_output: cli.listing_output,
        summary_output: cli.summary_output,
        from_listing: cli.from_listing,
    };

    scrape::run(&config, options).await
}
