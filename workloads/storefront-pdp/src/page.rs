//! Product page: data loading, section assembly and streaming.

use std::fmt::Display;
use std::future::Future;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use edge_sdk::edge_core::{QueryString, WorkloadError};
use edge_sdk::edge_data::{DependencyTag, FetchClient, FetchError, HttpTransport};
use edge_sdk::edge_observability::{DependencyMetrics, MetricsCollector, StructuredLogger};
use edge_sdk::edge_streaming::{HeadContent, Shell, StreamingSink};
use futures::Sink;
use serde_json::json;
use storefront_commerce::{
    CommerceError, CommerceResult, JudgemeClient, ProductPage, ReviewsData, SelectedOption,
    StorefrontClient, VariantSelection,
};
use storefront_tryon::TryOnSession;

use crate::config::StorefrontConfig;
use crate::sections::*;

/// Data behind one product page.
#[derive(Debug, Clone)]
pub struct LoadedPage {
    pub page: ProductPage,
    /// `None` when reviews are not configured, `Err` when loading failed.
    pub reviews: Option<Result<ReviewsData, String>>,
}

/// A rendered section ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedSection {
    pub name: &'static str,
    pub html: String,
}

/// Load the product and its reviews concurrently.
///
/// A product failure fails the page. A review failure is logged and
/// rendered as a fallback section.
pub async fn load_page<T: HttpTransport>(
    fetch: &FetchClient<T>,
    config: &StorefrontConfig,
    handle: &str,
    query: &QueryString,
    logger: &StructuredLogger,
    metrics: &mut MetricsCollector,
) -> CommerceResult<LoadedPage> {
    let storefront = StorefrontClient::new(
        fetch,
        &config.store_domain,
        &config.storefront_api_version,
        config.storefront_api_token.as_str(),
    );
    let selected_options: Vec<SelectedOption> = query
        .iter()
        .filter(|(name, _)| *name != PAGE_PARAM)
        .map(|(name, value)| SelectedOption::new(name, value))
        .collect();

    let product = timed(storefront.product_page(handle, &selected_options));
    let reviews = async {
        match &config.judgeme_api_token {
            Some(token) => {
                let judgeme = JudgemeClient::new(fetch, config.store_domain.as_str(), token.as_str());
                Some(timed(judgeme.reviews_for_handle(handle)).await)
            }
            None => None,
        }
    };
    let ((product, product_elapsed), reviews) = futures::join!(product, reviews);

    metrics.record_dependency(dependency_metrics(
        DependencyTag::Storefront,
        product_elapsed,
        &product,
    ));
    let page = product?;

    let reviews = reviews.map(|(result, elapsed)| {
        metrics.record_dependency(dependency_metrics(DependencyTag::Reviews, elapsed, &result));
        result.map_err(|err| {
            logger
                .warn("reviews unavailable")
                .field("handle", handle)
                .error(&err)
                .emit();
            err.to_string()
        })
    });

    logger
        .info("product loaded")
        .field("handle", handle)
        .field_u64("variants", page.product.variants.len() as u64)
        .field_bool("reviews", matches!(reviews, Some(Ok(_))))
        .emit();

    Ok(LoadedPage { page, reviews })
}

/// Request data the sections depend on.
pub struct PageRequest<'a> {
    pub path: &'a str,
    pub query: &'a QueryString,
    pub nonce: &'a str,
    pub now: DateTime<Utc>,
}

/// Render every section in document order.
pub fn render_sections(
    loaded: &LoadedPage,
    request: &PageRequest<'_>,
    config: &StorefrontConfig,
) -> Vec<RenderedSection> {
    let product = &loaded.page.product;
    let selection = VariantSelection::from_query(product, request.query);

    let information = render_product_information(&ProductInformation {
        product,
        selection: &selection,
        path: request.path,
        query: request.query,
        settings: &config.section,
        now: request.now,
        nonce: request.nonce,
    });

    let try_on = render_try_on(
        &TryOnSession::new(config.tryon.clone()).view(),
        config.fal_key.is_some(),
        request.nonce,
    );

    let details = render_product_details(product, &loaded.page.shop, &config.section);

    let reviews = match &loaded.reviews {
        Some(Ok(data)) => Some(render_review_list(
            data,
            page_index(request.query),
            request.path,
            request.query,
        )),
        Some(Err(_)) => Some(render_review_list_fallback()),
        None => None,
    };

    let mut sections = vec![
        RenderedSection {
            name: "product-information",
            html: information,
        },
        RenderedSection {
            name: "try-on",
            html: try_on,
        },
        RenderedSection {
            name: "product-details",
            html: details,
        },
    ];
    if let Some(html) = reviews {
        sections.push(RenderedSection {
            name: "reviews",
            html,
        });
    }
    sections
}

/// Document shell with SEO metadata and the request nonce.
pub fn page_shell(loaded: &LoadedPage, config: &StorefrontConfig, path: &str, nonce: &str) -> Shell {
    let product = &loaded.page.product;
    let title = format!("{} | {}", product.title, loaded.page.shop.name);
    let image = product.gallery(product.default_variant()).into_iter().next();

    let mut offer = json!({
        "@type": "Offer",
        "availability": "https://schema.org/OutOfStock",
    });
    if let Some(variant) = product.default_variant() {
        offer["price"] = json!(variant.price.decimal_string());
        offer["priceCurrency"] = json!(variant.price.currency.code());
        if variant.available_for_sale {
            offer["availability"] = json!("https://schema.org/InStock");
        }
    }
    let structured_data = json!({
        "@context": "https://schema.org",
        "@type": "Product",
        "name": product.title,
        "brand": product.vendor,
        "description": product.summary,
        "image": image.as_ref().map(|i| i.url.as_str()),
        "offers": offer,
    });

    let mut head = HeadContent::new(&title)
        .with_meta("description", &product.summary)
        .with_meta("og:title", &product.title)
        .with_meta("og:type", "product")
        .with_canonical(format!("{}{}", config.store_origin(), path))
        .with_style(PDP_STYLES)
        .with_structured_data(structured_data.to_string())
        .with_nonce(nonce);
    if let Some(image) = &image {
        head = head.with_meta("og:image", &image.url);
    }

    Shell::new(head)
}

/// Write the shell, every section and the closing to `sink`.
pub async fn stream_page<S, E>(
    sink: &mut StreamingSink<S>,
    shell: &Shell,
    sections: &[RenderedSection],
    metrics: &mut MetricsCollector,
) -> Result<(), WorkloadError>
where
    S: Sink<Vec<u8>, Error = E> + Unpin,
    E: Display,
{
    sink.send_shell(&shell.render_opening()).await?;
    metrics.record_shell_sent();

    for section in sections {
        metrics.section_started(section.name);
        sink.send_section(section.name, &section.html).await?;
        metrics.section_sent(section.name, section.html.len());
    }

    sink.finish(&shell.render_closing()).await
}

/// Minimal page for 404 and 500 responses.
pub fn error_page(status: u16, message: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head><meta charset=\"utf-8\"><title>{status}</title></head>\n<body><main class=\"error-page\"><h1>{status}</h1><p>{message}</p></main></body>\n</html>\n",
        status = status,
        message = escape_html(message),
    )
}

async fn timed<F: Future>(future: F) -> (F::Output, Duration) {
    let start = Instant::now();
    let output = future.await;
    (output, start.elapsed())
}

fn dependency_metrics<V>(
    tag: DependencyTag,
    elapsed: Duration,
    result: &Result<V, CommerceError>,
) -> DependencyMetrics {
    let status = match result {
        Ok(_) => Some(200),
        Err(CommerceError::Fetch(FetchError::Http { status, .. })) => Some(*status),
        Err(_) => None,
    };
    DependencyMetrics::new(tag.name(), elapsed, status)
}

const PDP_STYLES: &str = r#"
* { box-sizing: border-box; }
body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; margin: 0; color: #111; }
main { max-width: 1200px; margin: 0 auto; padding: 2rem; }
.breadcrumb { display: flex; gap: .5rem; margin-bottom: 1.5rem; }
.breadcrumb a { color: #666; }
.product-layout { display: grid; grid-template-columns: 1fr clamp(360px, 45%, 480px); gap: clamp(30px, 5%, 60px); }
.product-gallery { display: grid; grid-template-columns: 1fr 1fr; gap: .5rem; }
.product-media { width: 100%; height: auto; }
.product-badges { display: flex; gap: .5rem; font-size: .875rem; }
.badge { padding: .375rem .5rem; border-radius: 4px; color: #fff; }
.badge-discount { background: #c10000; }
.badge-new { background: #1a7f37; }
.product-vendor { color: #666; }
.product-price { display: flex; gap: .5rem; font-size: 1.5rem; }
.price-compare-at { color: #888; }
.product-option { border: 0; padding: 0; margin: 1rem 0; }
.option-value { display: inline-block; padding: .5rem 1rem; margin: .25rem; border: 1px solid #ccc; text-decoration: none; color: inherit; }
.option-value--selected { border-color: #111; }
.option-value--unavailable { opacity: .5; text-decoration: line-through; }
.product-form { display: flex; flex-direction: column; gap: 1rem; }
.btn-try-on, .btn-add-to-cart, .try-on-submit, .try-on-file { width: 100%; padding: .75rem; border: 1px solid #111; background: #fff; cursor: pointer; text-align: center; }
.btn-add-to-cart { background: #111; color: #fff; }
.btn-add-to-cart:disabled, .try-on-submit:disabled { opacity: .5; cursor: not-allowed; }
.try-on-popup { position: fixed; inset: 0; z-index: 50; display: flex; align-items: center; justify-content: center; background: rgba(0, 0, 0, .5); }
.try-on-popup[hidden] { display: none; }
.try-on-dialog { position: relative; background: #fff; border-radius: 8px; padding: 1rem; width: 100%; max-width: 28rem; }
.try-on-close { position: absolute; top: .5rem; right: .5rem; border: 0; background: none; font-size: 1.25rem; cursor: pointer; }
.try-on-upload { display: flex; flex-direction: column; align-items: center; gap: 1rem; }
.try-on-preview { max-height: 50vh; object-fit: contain; }
.try-on-carousel { display: flex; overflow-x: auto; scroll-snap-type: x mandatory; gap: 10px; }
.try-on-slide { flex: 0 0 100%; scroll-snap-align: center; display: flex; justify-content: center; }
.try-on-slide img { max-height: 70vh; object-fit: contain; }
.product-detail summary { display: flex; justify-content: space-between; padding: 1rem 0; font-weight: bold; border-bottom: 1px solid #eee; cursor: pointer; }
.details-learn-more { color: #666; }
.review-list { padding: 1.5rem 0; display: flex; flex-direction: column; gap: 1.5rem; }
.review-count { font-size: 1.125rem; text-transform: uppercase; }
.review { display: flex; gap: 1rem; }
.review-meta { width: 25%; }
.review-content { width: 75%; }
.review-stars { color: #f5a623; }
.review-body { display: -webkit-box; -webkit-line-clamp: 4; -webkit-box-orient: vertical; overflow: hidden; }
.review-pagination { display: flex; justify-content: center; gap: .5rem; }
.review-page { padding: .5rem 1rem; border-radius: 6px; background: #eee; color: #111; text-decoration: none; border: 0; }
.review-page:disabled { background: #111; color: #fff; }
@media (max-width: 768px) { .product-layout { grid-template-columns: 1fr; } .review { flex-direction: column; } .review-meta, .review-content { width: 100%; } }
"#;
