//! Crawler detection for buffered rendering.

const BOT_MARKERS: &[&str] = &[
    "bot",
    "crawler",
    "spider",
    "crawling",
    "slurp",
    "facebookexternalhit",
    "embedly",
    "lighthouse",
    "headlesschrome",
    "preview",
    "python-requests",
    "curl/",
    "wget/",
];

/// Whether the user agent belongs to a crawler or tool rather than a browser.
///
/// Crawlers get the whole page in one write instead of a stream. A missing
/// user agent is treated as a browser.
pub fn is_bot(user_agent: Option<&str>) -> bool {
    let Some(user_agent) = user_agent else {
        return false;
    };
    let user_agent = user_agent.to_ascii_lowercase();
    BOT_MARKERS.iter().any(|marker| user_agent.contains(marker))
}
