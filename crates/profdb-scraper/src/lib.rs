//! Professor-rating scraper: browser driver, extractors and JSON output.

pub mod aggregate;
pub mod detail;
pub mod driver;
pub mod error;
pub mod listing;
pub mod normalize;
pub mod output;
pub mod pagination;
pub mod pipeline;
pub mod rate_limit;
pub mod reviews;
pub mod selectors;
pub mod validate;

pub use aggregate::merge;
pub use detail::DetailResult;
pub use driver::{Element, PageDriver, SessionOptions, WebDriverSession};
pub use error::ScraperError;
pub use output::{read_listing, write_json_atomic, RunStats, RunSummary, SkippedProfessor};
pub use pipeline::{ScrapeSettings, Scraper};
pub use rate_limit::RetryPolicy;
pub use selectors::CompiledSelectors;
pub use validate::{validate, Violation};
