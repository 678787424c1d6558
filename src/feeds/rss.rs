//! RSS 2.0 feed of published blog posts

use std::fmt::Write;

use crate::db::schemas::BlogPost;

use super::xml_escape;

pub const RSS_ITEM_LIMIT: usize = 20;

const FEED_TITLE: &str = "MedPrep Blog";
const FEED_DESCRIPTION: &str = "Study articles for medical licensing exams";

/// Render the newest posts (at most [`RSS_ITEM_LIMIT`]) as an RSS channel
pub fn render_rss(site_base: &str, posts: &[BlogPost]) -> String {
    let mut items: Vec<&BlogPost> = posts.iter().filter(|p| p.published).collect();
    items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    items.truncate(RSS_ITEM_LIMIT);

    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<rss version=\"2.0\">\n<channel>\n",
    );
    let _ = write!(
        xml,
        "  <title>{}</title>\n  <link>{}/blog</link>\n  <description>{}</description>\n",
        FEED_TITLE,
        xml_escape(site_base),
        FEED_DESCRIPTION,
    );
    if let Some(newest) = items.first() {
        let _ = writeln!(
            xml,
            "  <lastBuildDate>{}</lastBuildDate>",
            newest.created_at.to_rfc2822()
        );
    }

    for post in items {
        let link = xml_escape(&format!("{}/blog/{}", site_base, post.slug));
        let _ = write!(
            xml,
            "  <item>\n    <title>{}</title>\n    <link>{}</link>\n    \
             <guid isPermaLink=\"true\">{}</guid>\n    <pubDate>{}</pubDate>\n    \
             <description>{}</description>\n  </item>\n",
            xml_escape(&post.title),
            link,
            link,
            post.created_at.to_rfc2822(),
            xml_escape(post.excerpt.as_deref().unwrap_or("")),
        );
    }

    xml.push_str("</channel>\n</rss>\n");
    xml
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};
    use uuid::Uuid;

    fn post(slug: &str, days_ago: i64) -> BlogPost {
        let base = Utc.with_ymd_and_hms(2024, 9, 12, 8, 0, 0).unwrap();
        BlogPost {
            id: Uuid::new_v4(),
            slug: slug.to_string(),
            title: format!("Post {}", slug),
            excerpt: Some("Short & sweet".into()),
            content: String::new(),
            published: true,
            created_at: base - Duration::days(days_ago),
            updated_at: None,
        }
    }

    #[test]
    fn test_at_most_twenty_items_newest_first() {
        let posts: Vec<BlogPost> = (0..25).map(|i| post(&format!("p{}", i), i)).collect();
        let xml = render_rss("https://medprep.app", &posts);

        assert_eq!(xml.matches("<item>").count(), RSS_ITEM_LIMIT);
        let first = xml.find("/blog/p0<").unwrap();
        let second = xml.find("/blog/p1<").unwrap();
        assert!(first < second);
        assert!(!xml.contains("/blog/p20<"));
    }

    #[test]
    fn test_item_fields() {
        let xml = render_rss("https://medprep.app", &[post("ecg", 0)]);
        assert!(xml.contains("<pubDate>Thu, 12 Sep 2024 08:00:00 +0000</pubDate>"));
        assert!(xml.contains("<guid isPermaLink=\"true\">https://medprep.app/blog/ecg</guid>"));
        assert!(xml.contains("<description>Short &amp; sweet</description>"));
    }

    #[test]
    fn test_empty_feed_is_valid_channel() {
        let xml = render_rss("https://medprep.app", &[]);
        assert!(xml.contains("<channel>"));
        assert!(!xml.contains("<item>"));
    }
}
