use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset};

use crate::core::error::BuildError;
use crate::models::ContentItem;

/// 没有分类的文章在 `{{category}}` 中使用的值
pub const DEFAULT_CATEGORY: &str = "uncategorized";

/// 永久链接模板中可用的占位符
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    Year,
    Month,
    Day,
    Hour,
    Minute,
    Second,
    Filename,
    Slug,
    Category,
}

impl Placeholder {
    fn from_name(name: &str) -> Option<Self> {
        let placeholder = match name {
            "date.year" | "year" => Placeholder::Year,
            "date.month" | "month" => Placeholder::Month,
            "date.day" | "day" => Placeholder::Day,
            "date.hour" | "hour" => Placeholder::Hour,
            "date.minute" | "minute" => Placeholder::Minute,
            "date.second" | "second" => Placeholder::Second,
            "filename" => Placeholder::Filename,
            "slug" => Placeholder::Slug,
            "category" => Placeholder::Category,
            _ => return None,
        };
        Some(placeholder)
    }

    fn expand(self, item: &ContentItem, date: &DateTime<FixedOffset>) -> String {
        match self {
            Placeholder::Year => date.format("%Y").to_string(),
            Placeholder::Month => date.format("%m").to_string(),
            Placeholder::Day => date.format("%d").to_string(),
            Placeholder::Hour => date.format("%H").to_string(),
            Placeholder::Minute => date.format("%M").to_string(),
            Placeholder::Second => date.format("%S").to_string(),
            Placeholder::Filename => item.filename.clone(),
            Placeholder::Slug => item.slug.clone(),
            Placeholder::Category => item
                .categories
                .iter()
                .next()
                .map(|c| slug::slugify(c))
                .unwrap_or_else(|| DEFAULT_CATEGORY.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

/// 解析过的永久链接模板，例如 `{{date.year}}/{{filename}}`
///
/// 模板在构建开始时解析一次，未知占位符在这里就会报配置错误。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermalinkTemplate {
    template: String,
    segments: Vec<Segment>,
}

impl PermalinkTemplate {
    /// 解析模板
    pub fn parse(template: &str) -> Result<Self, BuildError> {
        let trimmed = template.trim().trim_start_matches('/');
        if trimmed.is_empty() {
            return Err(BuildError::configuration("permalink 不能为空"));
        }

        let mut segments = Vec::new();
        let mut rest = trimmed;
        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 2..];
            let end = after.find("}}").ok_or_else(|| {
                BuildError::configuration(format!("permalink 中的占位符没有闭合: {}", template))
            })?;
            let name = after[..end].trim();
            let placeholder = Placeholder::from_name(name).ok_or_else(|| {
                BuildError::configuration(format!("permalink 中有未知的占位符 `{}`: {}", name, template))
            })?;
            segments.push(Segment::Placeholder(placeholder));
            rest = &after[end + 2..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        // 输出路径不能离开输出目录
        let escapes = trimmed.contains('\\')
            || trimmed.contains(':')
            || trimmed.split('/').any(|part| part == "..");
        if escapes {
            return Err(BuildError::configuration(format!(
                "permalink 不能指向输出目录之外: {}",
                template
            )));
        }

        Ok(Self {
            template: template.to_string(),
            segments,
        })
    }

    /// 原始模板字符串
    pub fn as_str(&self) -> &str {
        &self.template
    }

    /// 计算文章的输出路径（相对于输出目录）
    ///
    /// 没有日期的条目返回 `None`。相同的模板和条目总是得到相同的路径。
    pub fn resolve(&self, item: &ContentItem) -> Option<String> {
        let date = item.date.as_ref()?;
        let mut path = String::with_capacity(self.template.len() + 16);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => path.push_str(text),
                Segment::Placeholder(placeholder) => path.push_str(&placeholder.expand(item, date)),
            }
        }
        Some(finish_output_path(path))
    }
}

impl FromStr for PermalinkTemplate {
    type Err = BuildError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for PermalinkTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}

/// 目录形式的路径补上 `index.html`，没有扩展名的补上 `.html`
pub fn finish_output_path(mut path: String) -> String {
    if path.is_empty() || path.ends_with('/') {
        path.push_str("index.html");
        return path;
    }
    let last = path.rsplit('/').next().unwrap_or_default();
    if !last.contains('.') {
        path.push_str(".html");
    }
    path
}
