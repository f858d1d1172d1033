use serde::{Deserialize, Serialize};

use crate::reviews::ReviewRecord;

/// One of the five fixed rating-distribution buckets shown on a professor page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tier {
    Awesome,
    Great,
    Good,
    #[serde(rename = "OK")]
    Ok,
    Awful,
}

impl Tier {
    /// All tiers in display order, best to worst.
    pub const ALL: [Tier; 5] = [Tier::Awesome, Tier::Great, Tier::Good, Tier::Ok, Tier::Awful];

    /// The label used both on the site and as the JSON key.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Tier::Awesome => "Awesome",
            Tier::Great => "Great",
            Tier::Good => "Good",
            Tier::Ok => "OK",
            Tier::Awful => "Awful",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Count of ratings per [`Tier`].
///
/// Modelled as a struct rather than a map so that all five keys are always
/// present when serialized, in tier order. Missing keys deserialize as `0`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RatingDistribution {
    #[serde(rename = "Awesome")]
    pub awesome: u32,
    #[serde(rename = "Great")]
    pub great: u32,
    #[serde(rename = "Good")]
    pub good: u32,
    #[serde(rename = "OK")]
    pub ok: u32,
    #[serde(rename = "Awful")]
    pub awful: u32,
}

impl RatingDistribution {
    #[must_use]
    pub fn get(&self, tier: Tier) -> u32 {
        match tier {
            Tier::Awesome => self.awesome,
            Tier::Great => self.great,
            Tier::Good => self.good,
            Tier::Ok => self.ok,
            Tier::Awful => self.awful,
        }
    }

    pub fn set(&mut self, tier: Tier, count: u32) {
        let slot = match tier {
            Tier::Awesome => &mut self.awesome,
            Tier::Great => &mut self.great,
            Tier::Good => &mut self.good,
            Tier::Ok => &mut self.ok,
            Tier::Awful => &mut self.awful,
        };
        *slot = count;
    }

    /// Total number of ratings across all tiers.
    #[must_use]
    pub fn total(&self) -> u64 {
        Tier::ALL.iter().map(|t| u64::from(self.get(*t))).sum()
    }
}

/// Summary data for one card on the listing page.
///
/// Created once by the listing extractor and never mutated. `detail_url` is
/// the unique key for a professor across the whole run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorSummary {
    pub name: String,
    pub department: String,
    pub university: String,
    pub rating_count: u32,
    pub avg_quality: Option<f64>,
    pub avg_difficulty: Option<f64>,
    /// `None` means the card showed "N/A", which is distinct from `Some(0)`.
    pub would_take_again_pct: Option<u8>,
    pub detail_url: String,
}

/// The final merged entity written to the main dataset.
///
/// Field names and nesting are the downstream import contract; do not rename.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfessorRecord {
    #[serde(rename = "professor_name", alias = "name")]
    pub name: String,
    pub department: String,
    pub overall_quality: Option<f64>,
    pub difficulty_level: Option<f64>,
    pub would_take_again: Option<u8>,
    pub rating_distribution: RatingDistribution,
    pub tags: Vec<String>,
    pub reviews: Vec<ReviewRecord>,
    /// Run-level key; not part of the serialized shape.
    #[serde(skip)]
    pub detail_url: String,
}

impl ProfessorRecord {
    /// Appends reviews in extraction order.
    pub fn append_reviews<I>(&mut self, reviews: I)
    where
        I: IntoIterator<Item = ReviewRecord>,
    {
        self.reviews.extend(reviews);
    }

    #[must_use]
    pub fn review_count(&self) -> usize {
        self.reviews.len()
    }

    /// Identifier used in logs and the run summary: the name when known,
    /// otherwise the detail URL.
    #[must_use]
    pub fn identifier(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.detail_url
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
#[path = "professors_test.rs"]
mod tests;
