use std::fmt;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::FixedOffset;
use tracing::debug;

use crate::core::error::BuildError;
use crate::models::ContentItem;

mod front_matter;
mod html;
mod markdown;

pub use front_matter::{parse_date, FrontMatter};
pub use html::HtmlReader;
pub use markdown::MarkdownReader;

/// 读取器特征，每种内容格式实现一次
pub trait Reader: Send + Sync {
    /// 读取器名称（与配置中的键一致）
    fn name(&self) -> &str;

    /// 是否能处理该文件，只根据路径判断，不读取内容
    fn supports(&self, path: &Path) -> bool;

    /// 解析文件
    fn parse(&self, path: &Path) -> Result<ContentItem>;
}

/// 内置读取器的封闭集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderKind {
    Markdown,
    Html,
}

impl ReaderKind {
    /// 从配置键解析读取器
    pub fn from_key(key: &str) -> Result<Self, BuildError> {
        match key.trim() {
            "markdown" | "md" => Ok(ReaderKind::Markdown),
            "html" => Ok(ReaderKind::Html),
            other => Err(BuildError::configuration(format!("未知的读取器: {}", other))),
        }
    }

    pub fn key(self) -> &'static str {
        match self {
            ReaderKind::Markdown => "markdown",
            ReaderKind::Html => "html",
        }
    }

    /// 创建读取器实例
    pub fn build(self, timezone: FixedOffset) -> Box<dyn Reader> {
        match self {
            ReaderKind::Markdown => Box::new(MarkdownReader::new(timezone)),
            ReaderKind::Html => Box::new(HtmlReader::new(timezone)),
        }
    }
}

impl fmt::Display for ReaderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// 有序的读取器列表
///
/// 按配置顺序尝试，第一个 `supports` 返回 true 的读取器负责解析。
#[derive(Default)]
pub struct ReaderRegistry {
    readers: Vec<Box<dyn Reader>>,
}

impl ReaderRegistry {
    pub fn new(readers: Vec<Box<dyn Reader>>) -> Self {
        Self { readers }
    }

    /// 根据配置中的读取器列表创建注册表
    pub fn from_kinds(kinds: &[ReaderKind], timezone: FixedOffset) -> Self {
        Self::new(kinds.iter().map(|kind| kind.build(timezone)).collect())
    }

    pub fn len(&self) -> usize {
        self.readers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readers.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.readers.iter().map(|r| r.name()).collect()
    }

    /// 找到第一个支持该文件的读取器
    pub fn detect(&self, path: &Path) -> Option<&dyn Reader> {
        self.readers
            .iter()
            .find(|reader| reader.supports(path))
            .map(|reader| reader.as_ref())
    }

    /// 检测并解析文件
    ///
    /// 没有读取器支持时返回 `Ok(None)`；读取器声称支持但解析失败时返回
    /// [`BuildError::ReaderMismatch`]。
    pub fn read(&self, path: &Path) -> Result<Option<ContentItem>> {
        let Some(reader) = self.detect(path) else {
            debug!("没有读取器支持 {}", path.display());
            return Ok(None);
        };
        debug!("使用 {} 读取器解析 {}", reader.name(), path.display());
        match reader.parse(path) {
            Ok(item) => Ok(Some(item)),
            Err(e) => Err(anyhow!(BuildError::ReaderMismatch {
                reader: reader.name().to_string(),
                path: path.to_path_buf(),
                source: e.into(),
            })),
        }
    }
}

/// 按扩展名判断（忽略大小写）
pub(crate) fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| extensions.iter().any(|e| ext.eq_ignore_ascii_case(e)))
        .unwrap_or(false)
}
