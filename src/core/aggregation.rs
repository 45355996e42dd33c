use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::Datelike;

use crate::models::ContentItem;
use crate::utils::slugify;

/// 按年份、标签、分类对公开文章分组
///
/// 每组保持 `public_posts` 的顺序（日期降序，同日期按源路径升序）。
/// 只从公开文章构建，非公开文章永远不会出现在任何分组中。
#[derive(Debug, Clone, Default)]
pub struct AggregationIndex {
    pub years: BTreeMap<i32, Vec<Arc<ContentItem>>>,
    pub tags: BTreeMap<String, Vec<Arc<ContentItem>>>,
    pub categories: BTreeMap<String, Vec<Arc<ContentItem>>>,
    /// 标签名到输出目录名，互不重复
    tag_slugs: BTreeMap<String, String>,
    category_slugs: BTreeMap<String, String>,
}

impl AggregationIndex {
    /// 从有序的公开文章构建索引
    pub fn build(public_posts: &[Arc<ContentItem>]) -> Self {
        let mut index = Self::default();
        for post in public_posts {
            if let Some(date) = post.date {
                index.years.entry(date.year()).or_default().push(Arc::clone(post));
            }
            for tag in &post.tags {
                index.tags.entry(tag.clone()).or_default().push(Arc::clone(post));
            }
            for category in &post.categories {
                index
                    .categories
                    .entry(category.clone())
                    .or_default()
                    .push(Arc::clone(post));
            }
        }
        index.tag_slugs = unique_slugs(index.tags.keys());
        index.category_slugs = unique_slugs(index.categories.keys());
        index
    }

    /// 年份分组，新的年份在前
    pub fn years_desc(&self) -> impl Iterator<Item = (&i32, &Vec<Arc<ContentItem>>)> {
        self.years.iter().rev()
    }

    pub fn year(&self, year: i32) -> &[Arc<ContentItem>] {
        self.years.get(&year).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn tag(&self, tag: &str) -> &[Arc<ContentItem>] {
        self.tags.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn category(&self, category: &str) -> &[Arc<ContentItem>] {
        self.categories.get(category).map(Vec::as_slice).unwrap_or_default()
    }

    /// 标签的目录名，`tag/<slug>/`
    pub fn tag_slug(&self, tag: &str) -> Option<&str> {
        self.tag_slugs.get(tag).map(String::as_str)
    }

    /// 分类的目录名，`category/<slug>/`
    pub fn category_slug(&self, category: &str) -> Option<&str> {
        self.category_slugs.get(category).map(String::as_str)
    }
}

/// 为每个名字分配不重复的目录名
///
/// 按名字顺序分配，所以同样的输入总是得到同样的结果。别名为空时
/// 用 UTF-8 字节的十六进制代替，重名时追加 `-2`、`-3`。
fn unique_slugs<'a>(names: impl Iterator<Item = &'a String>) -> BTreeMap<String, String> {
    let mut used = HashSet::new();
    let mut slugs = BTreeMap::new();
    for name in names {
        let mut base = slugify(name);
        if base.is_empty() {
            base = name.bytes().map(|b| format!("{:02x}", b)).collect::<String>();
            base.insert(0, 'x');
        }
        let mut candidate = base.clone();
        let mut n = 2;
        while !used.insert(candidate.clone()) {
            candidate = format!("{}-{}", base, n);
            n += 1;
        }
        slugs.insert(name.clone(), candidate);
    }
    slugs
}
