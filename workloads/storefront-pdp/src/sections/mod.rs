//! Section renderers for the product page.

mod product_details;
mod product_information;
mod review_list;
mod try_on;

pub use product_details::*;
pub use product_information::*;
pub use review_list::*;
pub use try_on::*;

/// Escape text for HTML element content and quoted attributes.
pub fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
