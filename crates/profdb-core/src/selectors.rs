//! Site markup selectors, kept as configuration data.
//!
//! Every field is an ordered list of candidate CSS selectors; extractors try
//! them in order and use the first one that matches. The built-in defaults
//! target the current ratemyprofessors.com markup. A YAML file may override
//! any subset of fields, for example:
//!
//! ```yaml
//! detail:
//!   name:
//!     - "h1[class*='ProfessorName']"
//! reviews:
//!   load_more:
//!     - css: "button"
//!       text: "Load More Ratings"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// An interactive control: the first element matching `css` whose visible
/// text contains `text` (case-insensitive). `text: None` matches on CSS only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlLocator {
    pub css: String,
    #[serde(default)]
    pub text: Option<String>,
}

impl ControlLocator {
    #[must_use]
    pub fn new(css: &str, text: Option<&str>) -> Self {
        Self {
            css: css.to_string(),
            text: text.map(str::to_string),
        }
    }
}

impl std::fmt::Display for ControlLocator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.text {
            Some(text) => write!(f, "{} containing \"{text}\"", self.css),
            None => write!(f, "{}", self.css),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingSelectors {
    pub card: Vec<String>,
    pub name: Vec<String>,
    /// "Department / University" line on the card.
    pub school: Vec<String>,
    pub quality: Vec<String>,
    /// "N ratings" line.
    pub rating_count: Vec<String>,
    /// Labelled items such as "3.2 level of difficulty" and "87% would take again".
    pub feedback: Vec<String>,
    pub load_more: Vec<ControlLocator>,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            card: strings(&["a[class^='TeacherCard__StyledTeacherCard']"]),
            name: strings(&["div[class*='CardName']"]),
            school: strings(&["div[class*='CardSchool']"]),
            quality: strings(&[
                "div[class*='CardNumRatingNumber']",
                "div[class*='CardNumRating']",
            ]),
            rating_count: strings(&[
                "div[class*='CardNumRatingCount']",
                "div[class*='CardNumRating'] + div",
            ]),
            feedback: strings(&["div[class*='CardFeedbackItem']", "div[class*='CardFeedback']"]),
            load_more: vec![ControlLocator::new("button", Some("Show More"))],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetailSelectors {
    pub name: Vec<String>,
    pub department: Vec<String>,
    pub quality: Vec<String>,
    /// Labelled feedback blocks ("Level of Difficulty", "Would take again").
    pub feedback_item: Vec<String>,
    /// The number inside a feedback block.
    pub feedback_number: Vec<String>,
    pub distribution_section: Vec<String>,
    /// One tier row inside the distribution section.
    pub distribution_item: Vec<String>,
    pub tags: Vec<String>,
}

impl Default for DetailSelectors {
    fn default() -> Self {
        Self {
            name: strings(&[
                "div[class*='NameTitle__Name']",
                "div[class*='TeacherInfo__Name']",
                "h1[class*='NameTitle']",
            ]),
            department: strings(&[
                "div[class*='NameTitle__Title'] a",
                "a[class*='TeacherDepartment']",
                "div[class*='Department']",
            ]),
            quality: strings(&[
                "div[class*='RatingValue__Numerator']",
                "div[class*='TeacherRating__Rating']",
                "div[class*='Quality'] div[class*='RatingValue']",
            ]),
            feedback_item: strings(&["div[class*='FeedbackItem']"]),
            feedback_number: strings(&["div[class*='FeedbackNumber']"]),
            distribution_section: strings(&[
                "div[class*='RatingDistribution']",
                "div[class*='Histogram']",
                "div[class*='RatingBreakdown']",
            ]),
            distribution_item: strings(&["li", "div[class*='Rating']"]),
            tags: strings(&[
                "span[class*='Tag-']",
                "div[class*='TeacherTag']",
                "span[class*='TeacherTags']",
                "div[class*='Tag'] span",
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReviewSelectors {
    pub item: Vec<String>,
    pub course: Vec<String>,
    /// "Label: Value" items (For Credit, Attendance, Grade, Textbook).
    pub meta_item: Vec<String>,
    pub quality: Vec<String>,
    pub difficulty: Vec<String>,
    /// Positional fallback: first match is quality, second is difficulty.
    pub score: Vec<String>,
    pub comments: Vec<String>,
    pub tags: Vec<String>,
    pub date: Vec<String>,
    pub helpful: Vec<String>,
    pub load_more: Vec<ControlLocator>,
}

impl Default for ReviewSelectors {
    fn default() -> Self {
        Self {
            item: strings(&[
                "div[class*='Rating__StyledRating']",
                "div[class*='Rating-']",
                "li[class*='Rating']",
                "div[class*='RatingItem']",
            ]),
            course: strings(&[
                "div[class*='RatingHeader__StyledClass']",
                "div[class*='CourseName']",
                "div[class*='Class']",
            ]),
            meta_item: strings(&["div[class*='MetaItem']"]),
            quality: strings(&[
                "div[class*='CardNumRating__CardNumRatingNumber'][class*='quality']",
                "div[class*='Quality'] div[class*='CardNumRating']",
            ]),
            difficulty: strings(&[
                "div[class*='CardNumRating__CardNumRatingNumber'][class*='difficulty']",
                "div[class*='Difficulty'] div[class*='CardNumRating']",
            ]),
            score: strings(&[
                "div[class*='CardNumRatingNumber']",
                "div[class*='CardNumRating']",
            ]),
            comments: strings(&[
                "div[class*='Comments__StyledComments']",
                "div[class*='RatingComment']",
                "div[class*='CommentText']",
                "div[class*='Comment']",
            ]),
            tags: strings(&[
                "span[class*='Tag-']",
                "div[class*='RatingTag']",
                "span[class*='RatingTag']",
            ]),
            date: strings(&[
                "div[class*='TimeStamp']",
                "div[class*='Date']",
                "time",
                "span[class*='Date']",
            ]),
            helpful: strings(&[
                "div[class*='Helpful']",
                "button[class*='Helpful']",
                "div[class*='Thumbs']",
            ]),
            load_more: vec![
                ControlLocator::new("button", Some("Load More")),
                ControlLocator::new("button", Some("Show More")),
                ControlLocator::new("a", Some("Load More")),
            ],
        }
    }
}

/// All selectors used by the extractors, grouped by page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteSelectors {
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
    pub reviews: ReviewSelectors,
}

impl SiteSelectors {
    /// Checks that every candidate list is non-empty and holds no blank
    /// entries. CSS syntax is checked later, when the scraper compiles them.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSelectors`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lists: [(&str, &[String]); 24] = [
            ("listing.card", &self.listing.card),
            ("listing.name", &self.listing.name),
            ("listing.school", &self.listing.school),
            ("listing.quality", &self.listing.quality),
            ("listing.rating_count", &self.listing.rating_count),
            ("listing.feedback", &self.listing.feedback),
            ("detail.name", &self.detail.name),
            ("detail.department", &self.detail.department),
            ("detail.quality", &self.detail.quality),
            ("detail.feedback_item", &self.detail.feedback_item),
            ("detail.feedback_number", &self.detail.feedback_number),
            ("detail.distribution_section", &self.detail.distribution_section),
            ("detail.distribution_item", &self.detail.distribution_item),
            ("detail.tags", &self.detail.tags),
            ("reviews.item", &self.reviews.item),
            ("reviews.course", &self.reviews.course),
            ("reviews.meta_item", &self.reviews.meta_item),
            ("reviews.quality", &self.reviews.quality),
            ("reviews.difficulty", &self.reviews.difficulty),
            ("reviews.score", &self.reviews.score),
            ("reviews.comments", &self.reviews.comments),
            ("reviews.tags", &self.reviews.tags),
            ("reviews.date", &self.reviews.date),
            ("reviews.helpful", &self.reviews.helpful),
        ];

        for (field, candidates) in lists {
            if candidates.is_empty() {
                return Err(ConfigError::InvalidSelectors(format!(
                    "{field} must list at least one selector"
                )));
            }
            if candidates.iter().any(|c| c.trim().is_empty()) {
                return Err(ConfigError::InvalidSelectors(format!(
                    "{field} contains a blank selector"
                )));
            }
        }

        for (field, controls) in [
            ("listing.load_more", &self.listing.load_more),
            ("reviews.load_more", &self.reviews.load_more),
        ] {
            if controls.is_empty() {
                return Err(ConfigError::InvalidSelectors(format!(
                    "{field} must list at least one control"
                )));
            }
            if controls.iter().any(|c| c.css.trim().is_empty()) {
                return Err(ConfigError::InvalidSelectors(format!(
                    "{field} contains a control with a blank css selector"
                )));
            }
        }

        Ok(())
    }
}

/// Load site selectors from a YAML file, layering it over the built-in
/// defaults, and validate the result.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_selectors(path: &Path) -> Result<SiteSelectors, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SelectorsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let selectors: SiteSelectors =
        serde_yaml::from_str(&content).map_err(ConfigError::SelectorsFileParse)?;

    selectors.validate()?;

    Ok(selectors)
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| (*s).to_string()).collect()
}
