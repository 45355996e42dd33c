//! 订阅源：窗口截取与 Atom/RSS 文档生成

use atom_syndication::{Entry, Feed, Link, Person, Text};
use chrono::{DateTime, FixedOffset, Utc};
use rss::{Category, Channel, Guid, Item};
use serde::{Deserialize, Serialize};

use crate::models::ContentItem;

/// 取有序序列的前 `feedcount` 项，序列更短时取全部
///
/// 返回的是原序列的切片，顺序与原序列一致（最新的在前）。
pub fn feed_window<T>(items: &[T], feedcount: usize) -> &[T] {
    &items[..feedcount.min(items.len())]
}

/// 订阅源格式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedFormat {
    #[default]
    Atom,
    Rss,
}

/// 订阅源的频道信息
#[derive(Debug, Clone)]
pub struct FeedChannel {
    pub title: String,
    /// 频道首页的完整 URL
    pub link: String,
    pub description: String,
    pub author: Option<String>,
}

/// 订阅源中的一项
#[derive(Debug, Clone)]
pub struct FeedEntry {
    pub title: String,
    /// 文章的完整 URL
    pub link: String,
    pub date: DateTime<FixedOffset>,
    pub content: String,
    pub categories: Vec<String>,
}

impl FeedEntry {
    /// 从文章生成订阅项，没有日期的条目返回 `None`
    pub fn from_item(item: &ContentItem, link: String) -> Option<Self> {
        Some(Self {
            title: item.title.clone(),
            link,
            date: item.date?,
            content: item.content.clone(),
            categories: item.categories.iter().cloned().collect(),
        })
    }
}

/// 生成订阅源文档
pub fn render_feed(format: FeedFormat, channel: &FeedChannel, entries: &[FeedEntry]) -> String {
    match format {
        FeedFormat::Atom => render_atom(channel, entries),
        FeedFormat::Rss => render_rss(channel, entries),
    }
}

fn render_atom(channel: &FeedChannel, entries: &[FeedEntry]) -> String {
    let mut feed = Feed::default();
    feed.set_title(Text::plain(channel.title.clone()));
    feed.set_id(channel.link.clone());
    // 使用最新条目的时间，保证相同输入得到相同输出；没有条目时取 Unix 纪元
    let updated = entries
        .first()
        .map(|e| e.date)
        .unwrap_or_else(|| DateTime::<Utc>::default().fixed_offset());
    feed.set_updated(updated);
    if !channel.description.is_empty() {
        feed.set_subtitle(Text::plain(channel.description.clone()));
    }
    if let Some(author) = &channel.author {
        let mut person = Person::default();
        person.set_name(author.clone());
        feed.set_authors(vec![person]);
    }

    let mut link = Link::default();
    link.set_href(channel.link.clone());
    link.set_rel("alternate".to_string());
    feed.set_links(vec![link]);

    for item in entries {
        let mut entry = Entry::default();
        entry.set_id(item.link.clone());
        entry.set_title(Text::plain(item.title.clone()));

        let mut link = Link::default();
        link.set_href(item.link.clone());
        link.set_rel("alternate".to_string());
        entry.set_links(vec![link]);

        entry.set_updated(item.date);
        entry.set_published(Some(item.date));
        entry.set_summary(Some(Text::html(item.content.clone())));
        entry.set_categories(
            item.categories
                .iter()
                .map(|name| {
                    let mut category = atom_syndication::Category::default();
                    category.set_term(name.clone());
                    category
                })
                .collect::<Vec<_>>(),
        );

        feed.entries.push(entry);
    }

    feed.to_string()
}

fn render_rss(channel: &FeedChannel, entries: &[FeedEntry]) -> String {
    let mut rss = Channel::default();
    rss.set_title(channel.title.clone());
    rss.set_link(channel.link.clone());
    rss.set_description(channel.description.clone());
    rss.set_generator(Some("rust-liquidluck".to_string()));
    if let Some(first) = entries.first() {
        rss.set_last_build_date(Some(first.date.to_rfc2822()));
    }

    for entry in entries {
        let mut item = Item::default();
        item.set_title(entry.title.clone());
        item.set_link(entry.link.clone());
        item.set_guid(Guid {
            value: entry.link.clone(),
            permalink: true,
        });
        item.set_pub_date(entry.date.to_rfc2822());
        item.set_description(entry.content.clone());
        item.set_author(channel.author.clone());
        item.set_categories(
            entry
                .categories
                .iter()
                .map(|name| Category {
                    name: name.clone(),
                    domain: None,
                })
                .collect::<Vec<_>>(),
        );

        rss.items.push(item);
    }

    rss.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn entry(title: &str, day: u32) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: format!("https://example.com/2024/{}.html", title),
            date: FixedOffset::east_opt(0)
                .unwrap()
                .with_ymd_and_hms(2024, 1, day, 0, 0, 0)
                .unwrap(),
            content: "<p>body</p>".to_string(),
            categories: vec!["code".to_string()],
        }
    }

    fn channel() -> FeedChannel {
        FeedChannel {
            title: "Felix Felicis".to_string(),
            link: "https://example.com/".to_string(),
            description: "a blog".to_string(),
            author: Some("admin".to_string()),
        }
    }

    #[test]
    fn test_window_shorter_than_feedcount() {
        let items = [5, 4, 3, 2, 1];
        assert_eq!(feed_window(&items, 20), &items[..]);
    }

    #[test]
    fn test_window_truncates_in_order() {
        let items: Vec<u32> = (0..30).rev().collect();
        for k in [0usize, 1, 7, 30, 31] {
            let window = feed_window(&items, k);
            assert_eq!(window.len(), k.min(items.len()));
            assert_eq!(window, &items[..window.len()]);
        }
    }

    #[test]
    fn test_atom_contains_entries_in_order() {
        let xml = render_feed(FeedFormat::Atom, &channel(), &[entry("newer", 2), entry("older", 1)]);
        assert!(xml.contains("<feed"));
        let newer = xml.find("2024/newer.html").unwrap();
        let older = xml.find("2024/older.html").unwrap();
        assert!(newer < older);
    }

    #[test]
    fn test_empty_atom_is_deterministic() {
        let first = render_feed(FeedFormat::Atom, &channel(), &[]);
        let second = render_feed(FeedFormat::Atom, &channel(), &[]);
        assert_eq!(first, second);
        assert!(first.contains("1970-01-01T00:00:00"));
    }

    #[test]
    fn test_rss_document() {
        let xml = render_feed(FeedFormat::Rss, &channel(), &[entry("only", 3)]);
        assert!(xml.contains("<rss"));
        assert!(xml.contains("<title>only</title>"));
        assert!(xml.contains("https://example.com/2024/only.html"));
    }

    #[test]
    fn test_undated_item_is_not_a_feed_entry() {
        let item = ContentItem::new("About", "about.md");
        assert!(FeedEntry::from_item(&item, "https://example.com/about.html".into()).is_none());
    }
}
