use std::path::Path;

use anyhow::Result;
use chrono::FixedOffset;

use super::front_matter::Document;
use super::{has_extension, Reader};
use crate::models::ContentItem;

const EXTENSIONS: &[&str] = &["html", "htm"];

/// HTML 读取器，正文原样保留
pub struct HtmlReader {
    timezone: FixedOffset,
}

impl HtmlReader {
    pub fn new(timezone: FixedOffset) -> Self {
        Self { timezone }
    }
}

impl Reader for HtmlReader {
    fn name(&self) -> &str {
        "html"
    }

    fn supports(&self, path: &Path) -> bool {
        has_extension(path, EXTENSIONS)
    }

    fn parse(&self, path: &Path) -> Result<ContentItem> {
        let document = Document::load(path)?;
        let html = document.body.clone();
        document.into_item(path, html, self.timezone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_body_is_kept_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("about.html");
        fs::write(&path, "---\ntitle: About\n---\n<div class=\"about\">hi</div>\n").unwrap();

        let item = HtmlReader::new(FixedOffset::east_opt(0).unwrap()).parse(&path).unwrap();
        assert_eq!(item.title, "About");
        assert!(!item.is_post());
        assert!(item.content.contains("<div class=\"about\">hi</div>"));
    }
}
