//! Product reviews and their pagination.

use std::ops::Range;

use chrono::{DateTime, Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

/// Reviews shown per page of the review list.
pub const REVIEWS_PER_PAGE: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reviewer {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub rating: u8,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub body: String,
    /// Timestamp as sent by the provider, usually RFC 3339.
    pub created_at: String,
    pub reviewer: Reviewer,
}

impl Review {
    /// Creation date as `M/D/YYYY`.
    pub fn display_date(&self) -> String {
        format_date_en_us(&self.created_at)
    }
}

/// Reviews for one product.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReviewsData {
    /// Average rating, 0 when there are no reviews.
    pub rating: f64,
    pub review_number: usize,
    pub reviews: Vec<Review>,
}

impl ReviewsData {
    pub fn from_reviews(reviews: Vec<Review>) -> Self {
        let rating = if reviews.is_empty() {
            0.0
        } else {
            reviews.iter().map(|r| f64::from(r.rating)).sum::<f64>() / reviews.len() as f64
        };
        Self {
            rating,
            review_number: reviews.len(),
            reviews,
        }
    }

    pub fn page_count(&self) -> usize {
        page_count(self.reviews.len())
    }

    /// Page `index`, clamped to the last page.
    pub fn page(&self, index: usize) -> ReviewPage<'_> {
        let page_count = self.page_count();
        let index = index.min(page_count.saturating_sub(1));
        ReviewPage {
            index,
            page_count,
            reviews: &self.reviews[page_range(self.reviews.len(), index)],
        }
    }
}

/// A slice of reviews plus its position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReviewPage<'a> {
    /// Zero-based page index.
    pub index: usize,
    pub page_count: usize,
    pub reviews: &'a [Review],
}

impl ReviewPage<'_> {
    /// Page buttons are only useful with more than one page.
    pub fn has_pagination(&self) -> bool {
        self.page_count > 1
    }
}

/// `ceil(len / REVIEWS_PER_PAGE)`.
pub fn page_count(len: usize) -> usize {
    len.div_ceil(REVIEWS_PER_PAGE)
}

/// Index range of page `index` within `len` reviews, clamped to bounds.
pub fn page_range(len: usize, index: usize) -> Range<usize> {
    let start = index.saturating_mul(REVIEWS_PER_PAGE).min(len);
    let end = start.saturating_add(REVIEWS_PER_PAGE).min(len);
    start..end
}

/// Format a timestamp or date as `M/D/YYYY`. Unparseable input is returned
/// unchanged.
pub fn format_date_en_us(value: &str) -> String {
    let date = DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| value.get(..10).and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok()));

    match date {
        Some(date) => format!("{}/{}/{}", date.month(), date.day(), date.year()),
        None => value.to_string(),
    }
}
