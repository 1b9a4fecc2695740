//! Review list with page buttons.

use edge_sdk::edge_core::QueryString;
use storefront_commerce::{Review, ReviewsData};

use super::escape_html;

/// Query parameter holding the 1-based review page.
pub const PAGE_PARAM: &str = "page";

/// Zero-based page index from the query; anything unparseable is page 0.
pub fn page_index(query: &QueryString) -> usize {
    query
        .get(PAGE_PARAM)
        .and_then(|p| p.trim().parse::<usize>().ok())
        .map(|page| page.saturating_sub(1))
        .unwrap_or(0)
}

pub fn render_review_list(
    data: &ReviewsData,
    index: usize,
    path: &str,
    query: &QueryString,
) -> String {
    let page = data.page(index);
    let reviews: String = page.reviews.iter().map(render_review).collect();

    let pagination = if page.has_pagination() {
        let buttons: String = (0..page.page_count)
            .map(|i| {
                if i == page.index {
                    format!(r#"<button class="review-page" disabled>{}</button>"#, i + 1)
                } else {
                    let mut link_query = query.clone();
                    link_query.set(PAGE_PARAM, (i + 1).to_string());
                    format!(
                        r##"<a class="review-page" href="{}#reviews">{}</a>"##,
                        escape_html(&link_query.to_url(path)),
                        i + 1
                    )
                }
            })
            .collect();
        format!(r#"<nav class="review-pagination">{}</nav>"#, buttons)
    } else {
        String::new()
    };

    format!(
        r#"<section class="review-list" id="reviews" data-section="reviews">
    <h2 class="review-count">Reviews ({count})</h2>
    <p class="review-average">{stars} {average:.1}</p>
    {reviews}
    {pagination}
</section>"#,
        count = data.review_number,
        stars = render_stars(data.rating),
        average = data.rating,
        reviews = reviews,
        pagination = pagination,
    )
}

/// Rendered when the reviews provider could not be reached.
pub fn render_review_list_fallback() -> String {
    r#"<section class="review-list review-list--fallback" id="reviews" data-section="reviews">
    <p class="reviews-unavailable">Reviews are unavailable right now.</p>
</section>"#
        .to_string()
}

fn render_review(review: &Review) -> String {
    let email = review
        .reviewer
        .email
        .as_deref()
        .map(|email| format!("<p>{}</p>", escape_html(email)))
        .unwrap_or_default();

    format!(
        r#"<article class="review">
        <div class="review-meta">
            <span class="review-stars" aria-label="{rating} out of 5">{stars}</span>
            <p class="review-author">{name}</p>
            {email}
        </div>
        <div class="review-content">
            <p class="review-title">{title}</p>
            <p class="review-date">{date}</p>
            <p class="review-body">{body}</p>
        </div>
    </article>
    <hr>"#,
        rating = review.rating,
        stars = render_stars(f64::from(review.rating)),
        name = escape_html(&review.reviewer.name),
        email = email,
        title = escape_html(review.title.as_deref().unwrap_or("")),
        date = escape_html(&review.display_date()),
        body = escape_html(&review.body),
    )
}

fn render_stars(rating: f64) -> String {
    let full = (rating.round() as usize).min(5);
    format!("{}{}", "★".repeat(full), "☆".repeat(5 - full))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_commerce::Reviewer;

    fn data(count: usize) -> ReviewsData {
        ReviewsData::from_reviews(
            (0..count)
                .map(|i| Review {
                    rating: 4,
                    title: Some(format!("Review {}", i)),
                    body: "Runs small <3".to_string(),
                    created_at: "2026-09-01T08:00:00+00:00".to_string(),
                    reviewer: Reviewer {
                        name: "Ana".to_string(),
                        email: Some("ana@example.com".to_string()),
                    },
                })
                .collect(),
        )
    }

    #[test]
    fn test_page_index() {
        assert_eq!(page_index(&QueryString::parse("page=3")), 2);
        assert_eq!(page_index(&QueryString::parse("page=0")), 0);
        assert_eq!(page_index(&QueryString::parse("page=x")), 0);
        assert_eq!(page_index(&QueryString::new()), 0);
    }

    #[test]
    fn test_second_page() {
        let query = QueryString::parse("Size=M&page=2");
        let html = render_review_list(&data(12), page_index(&query), "/products/silk-dress", &query);

        assert!(html.contains("Reviews (12)"));
        assert!(html.contains("Review 5<"));
        assert!(html.contains("Review 9<"));
        assert!(!html.contains("Review 10<"));
        assert!(!html.contains("Review 4<"));
        assert!(html.contains(r#"<button class="review-page" disabled>2</button>"#));
        assert!(html.contains(r#"href="/products/silk-dress?Size=M&amp;page=3#reviews">3</a>"#));
        assert!(html.contains("Runs small &lt;3"));
        assert!(html.contains("9/1/2026"));
    }

    #[test]
    fn test_single_page_has_no_buttons() {
        let html = render_review_list(&data(5), 0, "/p", &QueryString::new());
        assert!(!html.contains("review-pagination"));
        assert!(html.contains("★★★★☆"));
    }

    #[test]
    fn test_out_of_range_page_shows_last() {
        let html = render_review_list(&data(7), 9, "/p", &QueryString::new());
        assert!(html.contains("Review 6<"));
        assert!(html.contains(r#"<button class="review-page" disabled>2</button>"#));
    }
}
