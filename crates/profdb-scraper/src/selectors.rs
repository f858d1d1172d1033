//! Site selectors compiled once into `scraper::Selector` lists.

use profdb_core::{ControlLocator, SiteSelectors};
use scraper::{ElementRef, Selector};

use crate::error::ScraperError;
use crate::normalize::clean_text;

/// Ordered candidate selectors for one field. Lookups use the first
/// candidate that yields a usable result.
#[derive(Debug, Clone)]
pub struct Candidates(Vec<Selector>);

impl Candidates {
    /// # Errors
    ///
    /// [`ScraperError::InvalidSelector`] for the first entry that does not parse.
    pub fn compile(raw: &[String]) -> Result<Self, ScraperError> {
        raw.iter()
            .map(|css| {
                Selector::parse(css).map_err(|e| ScraperError::InvalidSelector {
                    selector: css.clone(),
                    reason: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// First element of the first candidate that matches anything.
    #[must_use]
    pub fn first<'a>(&self, scope: ElementRef<'a>) -> Option<ElementRef<'a>> {
        self.0
            .iter()
            .find_map(|selector| descendants(scope, selector).next())
    }

    /// Every match of the first candidate that matches anything.
    #[must_use]
    pub fn all<'a>(&self, scope: ElementRef<'a>) -> Vec<ElementRef<'a>> {
        self.0
            .iter()
            .map(|selector| descendants(scope, selector).collect::<Vec<_>>())
            .find(|matches| !matches.is_empty())
            .unwrap_or_default()
    }

    /// Runs `parse` over the text of each candidate's first match and
    /// returns the first `Some`.
    pub fn first_parsed<T>(
        &self,
        scope: ElementRef<'_>,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Option<T> {
        self.0.iter().find_map(|selector| {
            let element = descendants(scope, selector).next()?;
            parse(&element_text(element))
        })
    }

    /// Cleaned, non-empty text of the first candidate that has some.
    #[must_use]
    pub fn first_text(&self, scope: ElementRef<'_>) -> Option<String> {
        self.first_parsed(scope, |text| {
            let cleaned = clean_text(text);
            (!cleaned.is_empty()).then_some(cleaned)
        })
    }
}

/// Matches strictly inside `scope`; the scope element itself never counts.
fn descendants<'a, 'b>(
    scope: ElementRef<'a>,
    selector: &'b Selector,
) -> impl Iterator<Item = ElementRef<'a>> + 'b
where
    'a: 'b,
{
    scope
        .select(selector)
        .filter(move |element| element.id() != scope.id())
}

/// All text nodes under `element`, space-joined (not yet cleaned).
#[must_use]
pub fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<Vec<_>>().join(" ")
}

#[derive(Debug, Clone)]
pub struct ListingSelectors {
    pub card: Candidates,
    pub name: Candidates,
    pub school: Candidates,
    pub quality: Candidates,
    pub rating_count: Candidates,
    pub feedback: Candidates,
    pub load_more: Vec<ControlLocator>,
}

#[derive(Debug, Clone)]
pub struct DetailSelectors {
    pub name: Candidates,
    pub department: Candidates,
    pub quality: Candidates,
    pub feedback_item: Candidates,
    pub feedback_number: Candidates,
    pub distribution_section: Candidates,
    pub distribution_item: Candidates,
    pub tags: Candidates,
}

#[derive(Debug, Clone)]
pub struct ReviewSelectors {
    pub item: Candidates,
    pub course: Candidates,
    pub meta_item: Candidates,
    pub quality: Candidates,
    pub difficulty: Candidates,
    pub score: Candidates,
    pub comments: Candidates,
    pub tags: Candidates,
    pub date: Candidates,
    pub helpful: Candidates,
    pub load_more: Vec<ControlLocator>,
}

/// [`SiteSelectors`] with every CSS string parsed.
#[derive(Debug, Clone)]
pub struct CompiledSelectors {
    pub listing: ListingSelectors,
    pub detail: DetailSelectors,
    pub reviews: ReviewSelectors,
}

impl CompiledSelectors {
    /// # Errors
    ///
    /// [`ScraperError::InvalidSelector`] naming the first selector that does
    /// not parse.
    pub fn compile(site: &SiteSelectors) -> Result<Self, ScraperError> {
        let listing = &site.listing;
        let detail = &site.detail;
        let reviews = &site.reviews;
        Ok(Self {
            listing: ListingSelectors {
                card: Candidates::compile(&listing.card)?,
                name: Candidates::compile(&listing.name)?,
                school: Candidates::compile(&listing.school)?,
                quality: Candidates::compile(&listing.quality)?,
                rating_count: Candidates::compile(&listing.rating_count)?,
                feedback: Candidates::compile(&listing.feedback)?,
                load_more: listing.load_more.clone(),
            },
            detail: DetailSelectors {
                name: Candidates::compile(&detail.name)?,
                department: Candidates::compile(&detail.department)?,
                quality: Candidates::compile(&detail.quality)?,
                feedback_item: Candidates::compile(&detail.feedback_item)?,
                feedback_number: Candidates::compile(&detail.feedback_number)?,
                distribution_section: Candidates::compile(&detail.distribution_section)?,
                distribution_item: Candidates::compile(&detail.distribution_item)?,
                tags: Candidates::compile(&detail.tags)?,
            },
            reviews: ReviewSelectors {
                item: Candidates::compile(&reviews.item)?,
                course: Candidates::compile(&reviews.course)?,
                meta_item: Candidates::compile(&reviews.meta_item)?,
                quality: Candidates::compile(&reviews.quality)?,
                difficulty: Candidates::compile(&reviews.difficulty)?,
                score: Candidates::compile(&reviews.score)?,
                comments: Candidates::compile(&reviews.comments)?,
                tags: Candidates::compile(&reviews.tags)?,
                date: Candidates::compile(&reviews.date)?,
                helpful: Candidates::compile(&reviews.helpful)?,
                load_more: reviews.load_more.clone(),
            },
        })
    }
}
