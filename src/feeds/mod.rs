//! XML feeds: sitemap and RSS

pub mod rss;
pub mod sitemap;

pub use rss::{render_rss, RSS_ITEM_LIMIT};
pub use sitemap::{build_sitemap, render_sitemap, SitemapEntry};

/// Escape the five XML special characters
pub fn xml_escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
