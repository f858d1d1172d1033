use serde::{Deserialize, Serialize};

/// One student review from a professor's detail page.
///
/// Text fields the page did not provide hold `"N/A"`; `date_posted` keeps the
/// site's original formatting verbatim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReviewRecord {
    pub course_code: String,
    pub for_credit: bool,
    pub attendance: String,
    pub grade: String,
    pub textbook_used: String,
    pub quality_score: Option<f64>,
    pub difficulty_score: Option<f64>,
    pub review_text: String,
    pub tags: Vec<String>,
    pub date_posted: String,
    #[serde(default)]
    pub helpful_upvotes: u32,
    #[serde(default)]
    pub helpful_downvotes: u32,
}

impl ReviewRecord {
    /// A review with no text and no scores carries no information.
    #[must_use]
    pub fn is_noise(&self) -> bool {
        self.review_text.trim().is_empty()
            && self.quality_score.is_none()
            && self.difficulty_score.is_none()
    }
}
