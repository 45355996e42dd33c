use std::path::Path;

use anyhow::Result;
use chrono::FixedOffset;

use super::front_matter::Document;
use super::{has_extension, Reader};
use crate::models::ContentItem;
use crate::utils::markdown;

const EXTENSIONS: &[&str] = &["md", "markdown", "mkd"];

/// Markdown 读取器
pub struct MarkdownReader {
    timezone: FixedOffset,
}

impl MarkdownReader {
    pub fn new(timezone: FixedOffset) -> Self {
        Self { timezone }
    }
}

impl Reader for MarkdownReader {
    fn name(&self) -> &str {
        "markdown"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, EXTENSIONS)
    }

    fn parse(&self, path: &Path) -> Result<ContentItem> {
        let document = Document::load(path)?;
        let html = markdown::render(&document.body)?;
        document.into_item(path, html, self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_parse_markdown_post() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hello-world.md");
        fs::write(
            &path,
            "---\ntitle: Hello World\ndate: 2024-03-01\ntags:\n  - rust\n---\n\n# Heading\n\nSome *text*.\n",
        )
        .unwrap();

        let reader = MarkdownReader::new(FixedOffset::east_opt(0).unwrap());
        assert!(reader.supports(&path));
        let item = reader.parse(&path).unwrap();
        assert_eq!(item.title, "Hello World");
        assert_eq!(item.filename, "hello-world");
        assert!(item.is_post());
        assert!(item.content.contains("<h1>Heading</h1>"));
        assert!(item.content.contains("<em>text</em>"));
        assert!(item.tags.contains("rust"));
    }

    #[test]
    fn test_does_not_support_other_files() {
        let reader = MarkdownReader::new(FixedOffset::east_opt(0).unwrap());
        assert!(!reader.supports(Path::new("style.css")));
        assert!(!reader.supports(Path::new("page.html")));
    }

    #[test]
    fn test_bad_date_fails() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.md");
        fs::write(&path, "---\ntitle: Broken\ndate: someday\n---\nbody\n").unwrap();

        let reader = MarkdownReader::new(FixedOffset::east_opt(0).unwrap());
        assert!(reader.parse(&path).is_err());
    }
}
