use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;

/// 读取器解析出的一个内容单元
#[derive(Debug, Clone, Serialize)]
pub struct ContentItem {
    /// 标题
    pub title: String,
    /// 原始正文（front matter 之后的部分）
    pub raw: String,
    /// 渲染后的 HTML 正文
    pub content: String,
    /// 发布时间，缺失表示这是一个独立页面
    pub date: Option<DateTime<FixedOffset>>,
    /// 是否公开
    pub public: bool,
    /// 标签
    pub tags: BTreeSet<String>,
    /// 分类
    pub categories: BTreeSet<String>,
    /// 源文件路径
    pub source: PathBuf,
    /// 源文件名（不含扩展名）
    pub filename: String,
    /// URL 别名
    pub slug: String,
    /// 自定义模板
    pub template: Option<String>,
    /// 其余的 front matter 字段
    pub meta: BTreeMap<String, serde_json::Value>,
}

impl ContentItem {
    /// 创建一个只有标题和源路径的内容单元，其余字段为默认值
    pub fn new(title: impl Into<String>, source: impl Into<PathBuf>) -> Self {
        let source = source.into();
        let filename = source
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("untitled")
            .to_string();
        Self {
            title: title.into(),
            raw: String::new(),
            content: String::new(),
            date: None,
            public: true,
            tags: BTreeSet::new(),
            categories: BTreeSet::new(),
            source,
            slug: slug::slugify(&filename),
            filename,
            template: None,
            meta: BTreeMap::new(),
        }
    }

    pub fn with_date(mut self, date: DateTime<FixedOffset>) -> Self {
        self.date = Some(date);
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = public;
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = categories.into_iter().map(Into::into).collect();
        self
    }

    /// 是否为带日期的文章
    pub fn is_post(&self) -> bool {
        self.date.is_some()
    }
}

/// 一次构建中对源文件的分类结果
///
/// 每个扫描到的源路径恰好出现在其中一个桶里。
/// `public_posts` 与 `secure_posts` 按日期降序排列，日期相同时按源路径升序。
#[derive(Debug, Clone, Default)]
pub struct ClassificationBuckets {
    /// 没有读取器支持的文件，原样复制
    pub pure_files: Vec<PathBuf>,
    /// 没有日期的页面
    pub pure_pages: Vec<Arc<ContentItem>>,
    /// 公开文章
    pub public_posts: Vec<Arc<ContentItem>>,
    /// 非公开文章
    pub secure_posts: Vec<Arc<ContentItem>>,
}

impl ClassificationBuckets {
    /// 所有桶中的条目总数
    pub fn len(&self) -> usize {
        self.pure_files.len() + self.pure_pages.len() + self.public_posts.len() + self.secure_posts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// 所有文章（公开在前，非公开在后）
    pub fn posts(&self) -> impl Iterator<Item = &Arc<ContentItem>> {
        self.public_posts.iter().chain(self.secure_posts.iter())
    }
}
