//! Browser automation capability consumed by the extractors.
//!
//! Extractors only ever see [`PageDriver`]: navigate, locate a control,
//! click it, scroll it into view, and read the rendered page source. Visible
//! content is parsed from the page source with the `scraper` crate, so the
//! browser is only used for what needs a live DOM.

mod protocol;
mod webdriver;

use async_trait::async_trait;
use profdb_core::ControlLocator;

use crate::error::ScraperError;

pub use webdriver::{SessionOptions, WebDriverSession};

/// Handle to a live element in the current page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Element {
    /// Driver-specific reference (a W3C element id for [`WebDriverSession`]).
    pub id: String,
    /// Human-readable description for logs and error messages.
    pub label: String,
}

#[async_trait]
pub trait PageDriver: Send + Sync {
    /// Load `url` and wait for the page to finish loading.
    ///
    /// # Errors
    ///
    /// [`ScraperError::Navigation`] when the page is unreachable or times out.
    async fn navigate(&self, url: &str) -> Result<(), ScraperError>;

    /// First displayed element matching `locator`. Absence is `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Only for driver or transport failures, never for absence.
    async fn find(&self, locator: &ControlLocator) -> Result<Option<Element>, ScraperError>;

    /// # Errors
    ///
    /// [`ScraperError::Interaction`] when the element cannot be clicked.
    async fn click(&self, element: &Element) -> Result<(), ScraperError>;

    /// # Errors
    ///
    /// [`ScraperError::Interaction`] when the element is gone.
    async fn scroll_into_view(&self, element: &Element) -> Result<(), ScraperError>;

    /// Serialized DOM of the current page.
    ///
    /// # Errors
    ///
    /// Driver or transport failures.
    async fn page_source(&self) -> Result<String, ScraperError>;
}

/// Tries each locator in order and returns the first element found.
///
/// # Errors
///
/// Propagates the first driver failure.
pub async fn find_first<D>(
    driver: &D,
    locators: &[ControlLocator],
) -> Result<Option<Element>, ScraperError>
where
    D: PageDriver + ?Sized,
{
    for locator in locators {
        if let Some(element) = driver.find(locator).await? {
            return Ok(Some(element));
        }
    }
    Ok(None)
}
