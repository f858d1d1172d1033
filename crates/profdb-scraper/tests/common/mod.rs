//! Scripted in-memory browser and HTML fixtures for pipeline tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use profdb_core::ControlLocator;
use profdb_scraper::detail::DetailSettings;
use profdb_scraper::pagination::LoadMoreSettings;
use profdb_scraper::{Element, PageDriver, RetryPolicy, ScrapeSettings, ScraperError};
use tracing_subscriber::fmt::MakeWriter;

pub const LISTING_URL: &str = "https://www.ratemyprofessors.com/search/professors/1262?q=*";
pub const USF: &str = "University of South Florida";

pub fn professor_url(id: u32) -> String {
    format!("https://www.ratemyprofessors.com/professor/{id}")
}

/// One URL's behaviour. Each successful click on the load-more control
/// advances to the next snapshot; the control is visible while a later
/// snapshot exists. A broken control is always visible and never clickable.
/// With `readable_sources` set, page-source reads past that many fail.
#[derive(Debug, Clone, Default)]
pub struct ScriptedPage {
    pub snapshots: Vec<String>,
    pub broken_control: bool,
    pub unreachable: bool,
    pub readable_sources: Option<u32>,
}

impl ScriptedPage {
    pub fn new(snapshots: Vec<String>) -> Self {
        Self {
            snapshots,
            ..Self::default()
        }
    }
}

#[derive(Debug, Default)]
struct Cursor {
    url: Option<String>,
    snapshot: usize,
    source_reads: u32,
}

#[derive(Debug, Default)]
pub struct SnapshotDriver {
    pages: HashMap<String, ScriptedPage>,
    cursor: Mutex<Cursor>,
    pub navigations: AtomicU32,
    pub clicks: AtomicU32,
}

impl SnapshotDriver {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn page(mut self, url: impl Into<String>, page: ScriptedPage) -> Self {
        self.pages.insert(url.into(), page);
        self
    }

    fn current(&self) -> Option<(ScriptedPage, usize)> {
        let cursor = self.cursor.lock().unwrap();
        let url = cursor.url.as_ref()?;
        self.pages.get(url).map(|p| (p.clone(), cursor.snapshot))
    }
}

#[async_trait]
impl PageDriver for SnapshotDriver {
    async fn navigate(&self, url: &str) -> Result<(), ScraperError> {
        self.navigations.fetch_add(1, Ordering::SeqCst);
        match self.pages.get(url) {
            Some(page) if !page.unreachable => {
                let mut cursor = self.cursor.lock().unwrap();
                cursor.url = Some(url.to_owned());
                cursor.snapshot = 0;
                cursor.source_reads = 0;
                Ok(())
            }
            _ => Err(ScraperError::Navigation {
                url: url.to_owned(),
                reason: "timeout".to_owned(),
            }),
        }
    }

    async fn find(&self, locator: &ControlLocator) -> Result<Option<Element>, ScraperError> {
        let Some((page, snapshot)) = self.current() else {
            return Ok(None);
        };
        let visible = page.broken_control || snapshot + 1 < page.snapshots.len();
        Ok(visible.then(|| Element {
            id: "load-more".to_owned(),
            label: locator.to_string(),
        }))
    }

    async fn click(&self, element: &Element) -> Result<(), ScraperError> {
        self.clicks.fetch_add(1, Ordering::SeqCst);
        let Some((page, _)) = self.current() else {
            return Err(ScraperError::Interaction {
                target: element.label.clone(),
                reason: "no page loaded".to_owned(),
            });
        };
        if page.broken_control {
            return Err(ScraperError::Interaction {
                target: element.label.clone(),
                reason: "element click intercepted".to_owned(),
            });
        }
        self.cursor.lock().unwrap().snapshot += 1;
        Ok(())
    }

    async fn scroll_into_view(&self, _element: &Element) -> Result<(), ScraperError> {
        Ok(())
    }

    async fn page_source(&self) -> Result<String, ScraperError> {
        let (page, snapshot) = self
            .current()
            .ok_or_else(|| ScraperError::Session("no page loaded".to_owned()))?;
        let reads = {
            let mut cursor = self.cursor.lock().unwrap();
            cursor.source_reads += 1;
            cursor.source_reads
        };
        if page.readable_sources.is_some_and(|limit| reads > limit) {
            return Err(ScraperError::Session("invalid session id".to_owned()));
        }
        let last = page.snapshots.len().saturating_sub(1);
        Ok(page
            .snapshots
            .get(snapshot.min(last))
            .cloned()
            .unwrap_or_default())
    }
}

/// Shared in-memory sink for formatted log lines.
#[derive(Debug, Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Installs a WARN-level fmt subscriber writing here for the current
    /// thread until the guard drops.
    pub fn capture(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Zero-delay settings with a small retry budget.
pub fn settings() -> ScrapeSettings {
    let retry = RetryPolicy::new(2, Duration::ZERO);
    let cancel = Arc::new(AtomicBool::new(false));
    let load_more = LoadMoreSettings {
        retry,
        breaker_threshold: 3,
        max_clicks: 50,
        throttle: Duration::ZERO,
        cancel: Arc::clone(&cancel),
    };
    ScrapeSettings {
        listing_url: LISTING_URL.to_owned(),
        university: USF.to_owned(),
        retry,
        listing_load_more: load_more.clone(),
        review_load_more: load_more,
        detail: DetailSettings {
            retry,
            missing_element_wait: Duration::ZERO,
        },
        delay: Duration::ZERO,
        cancel,
    }
}

pub fn card(id: u32, name: &str, department: &str, again: &str) -> String {
    format!(
        r#"<a class="TeacherCard__StyledTeacherCard-syjs0d-0" href="/professor/{id}">
  <div class="CardNumRating__CardNumRatingNumber">4.2</div>
  <div class="CardNumRating__CardNumRatingCount">12 ratings</div>
  <div class="CardName__StyledCardName">{name}</div>
  <div class="CardSchool__StyledCardSchool">{department} / University of South Florida</div>
  <div class="CardFeedback__StyledCardFeedback">
    <div class="CardFeedback__CardFeedbackItem"><div class="CardFeedback__CardFeedbackNumber">{again}</div> would take again</div>
    <div class="CardFeedback__CardFeedbackItem"><div class="CardFeedback__CardFeedbackNumber">3.0</div> level of difficulty</div>
  </div>
</a>"#
    )
}

pub fn listing_page(cards: &[String]) -> String {
    format!(
        "<html><body><div class=\"SearchResultsPage\">{}</div><button>Show More</button></body></html>",
        cards.concat()
    )
}

pub fn review(course: &str, text: &str) -> String {
    format!(
        r#"<div class="Rating__StyledRating-sc-1rhvpxz-1">
  <div class="RatingHeader__StyledClass-sc-1dlkqw1-2">{course}</div>
  <div class="CardNumRating__CardNumRatingNumber-quality">5.0</div>
  <div class="CardNumRating__CardNumRatingNumber-difficulty">2.0</div>
  <div class="Comments__StyledComments-dzzyvm-0">{text}</div>
  <div class="TimeStamp__StyledTimeStamp-sc-9q2r30-0">Jan 5th, 2024</div>
</div>"#
    )
}

const DISTRIBUTION: &str = r#"<div class="RatingDistributionChart__StyledChart">
  <ul>
    <li><b>Awesome 5</b><b>8</b></li>
    <li><b>Great 4</b><b>3</b></li>
    <li><b>Good 3</b><b>1</b></li>
    <li><b>OK 2</b><b>0</b></li>
    <li><b>Awful 1</b><b>0</b></li>
  </ul>
</div>"#;

/// A detail page. `reviews` are the review items visible in this snapshot.
pub fn detail_page(name: &str, with_distribution: bool, reviews: &[String]) -> String {
    format!(
        r#"<html><body>
<div class="TeacherInfo__StyledTeacher">
  <div class="RatingValue__AvgRating"><div class="RatingValue__Numerator-qw8sqy-2">4.6</div></div>
  <div class="NameTitle__Name-dowf0z-0"><span>{name}</span></div>
  <div class="NameTitle__Title-dowf0z-1">Professor in the <a class="TeacherDepartment__StyledDepartmentLink" href="/d">Mathematics department</a></div>
  <div class="TeacherFeedback__StyledTeacherFeedback">
    <div class="FeedbackItem__StyledFeedbackItem"><div class="FeedbackItem__FeedbackNumber">92%</div><div class="FeedbackItem__FeedbackDescription">Would take again</div></div>
    <div class="FeedbackItem__StyledFeedbackItem"><div class="FeedbackItem__FeedbackNumber">2.9</div><div class="FeedbackItem__FeedbackDescription">Level of Difficulty</div></div>
  </div>
</div>
{distribution}
<div class="TeacherTags__TagsContainer"><span class="Tag-bs9vf4-0">Caring</span></div>
<ul id="ratingsList">{reviews}</ul>
<button>Load More Ratings</button>
</body></html>"#,
        distribution = if with_distribution { DISTRIBUTION } else { "" },
        reviews = reviews.concat(),
    )
}
