//! sitemap.xml generation

use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::fmt::Write;

use crate::db::schemas::{BlogPost, StaticPage};

use super::xml_escape;

/// Client routes always listed, with change frequency and priority
const CORE_ROUTES: &[(&str, &str, &str)] = &[
    ("/", "daily", "1.0"),
    ("/pricing", "weekly", "0.8"),
    ("/blog", "daily", "0.8"),
    ("/topics", "weekly", "0.7"),
    ("/questions", "weekly", "0.7"),
    ("/videos", "weekly", "0.6"),
];

#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub loc: String,
    pub lastmod: DateTime<Utc>,
    pub changefreq: &'static str,
    pub priority: &'static str,
}

/// Core routes, then blogs, then pages; first occurrence of a `loc` wins
pub fn build_sitemap(
    site_base: &str,
    blogs: &[BlogPost],
    pages: &[StaticPage],
    now: DateTime<Utc>,
) -> Vec<SitemapEntry> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    let mut push = |entry: SitemapEntry| {
        if seen.insert(entry.loc.clone()) {
            entries.push(entry);
        }
    };

    for &(path, changefreq, priority) in CORE_ROUTES {
        push(SitemapEntry {
            loc: format!("{}{}", site_base, path),
            lastmod: now,
            changefreq,
            priority,
        });
    }
    for post in blogs.iter().filter(|b| b.published) {
        push(SitemapEntry {
            loc: format!("{}/blog/{}", site_base, post.slug),
            lastmod: post.updated_at.unwrap_or(post.created_at),
            changefreq: "monthly",
            priority: "0.6",
        });
    }
    for page in pages {
        push(SitemapEntry {
            loc: format!("{}/pages/{}", site_base, page.slug),
            lastmod: page.last_modified().unwrap_or(now),
            changefreq: "monthly",
            priority: "0.5",
        });
    }
    entries
}

pub fn render_sitemap(entries: &[SitemapEntry]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
         <urlset xmlns=\"http://www.sitemaps.org/schemas/sitemap/0.9\">\n",
    );
    for entry in entries {
        // Writing to a String cannot fail
        let _ = write!(
            xml,
            "  <url>\n    <loc>{}</loc>\n    <lastmod>{}</lastmod>\n    \
             <changefreq>{}</changefreq>\n    <priority>{}</priority>\n  </url>\n",
            xml_escape(&entry.loc),
            entry.lastmod.format("%Y-%m-%d"),
            entry.changefreq,
            entry.priority,
        );
    }
    xml.push_str("</urlset>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn blog(slug: &str) -> BlogPost {
        BlogPost {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: slug.to_string(),
            excerpt: None,
            content: String::new(),
            published: true,
            created_at: Utc.with_ymd_and_hms(2024, 5, 1, 0, 0, 0).unwrap(),
            updated_at: None,
        }
    }

    fn page(slug: &str) -> StaticPage {
        StaticPage {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: slug.to_string(),
            content: String::new(),
            created_at: None,
            updated_at: Some(Utc.with_ymd_and_hms(2024, 6, 2, 0, 0, 0).unwrap()),
        }
    }

    #[test]
    fn test_duplicate_locs_are_listed_once() {
        let now = Utc::now();
        let entries = build_sitemap(
            "https://medprep.app",
            &[blog("ecg-basics"), blog("ecg-basics")],
            &[page("about"), page("about")],
            now,
        );
        let locs: Vec<&str> = entries.iter().map(|e| e.loc.as_str()).collect();
        assert_eq!(locs.len(), CORE_ROUTES.len() + 2);
        assert!(locs.contains(&"https://medprep.app/blog/ecg-basics"));
        assert!(locs.contains(&"https://medprep.app/pages/about"));
    }

    #[test]
    fn test_render_escapes_and_dates() {
        let mut post = blog("q&a");
        post.updated_at = Some(Utc.with_ymd_and_hms(2024, 7, 3, 12, 0, 0).unwrap());
        let entries = build_sitemap("https://medprep.app", &[post], &[], Utc::now());
        let xml = render_sitemap(&entries);

        assert!(xml.starts_with("<?xml"));
        assert!(xml.contains("<loc>https://medprep.app/blog/q&amp;a</loc>"));
        assert!(xml.contains("<lastmod>2024-07-03</lastmod>"));
        assert!(xml.trim_end().ends_with("</urlset>"));
    }

    #[test]
    fn test_unpublished_posts_are_skipped() {
        let mut draft = blog("draft");
        draft.published = false;
        let entries = build_sitemap("https://medprep.app", &[draft], &[], Utc::now());
        assert!(entries.iter().all(|e| !e.loc.ends_with("/blog/draft")));
    }
}
