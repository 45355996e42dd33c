use std::cmp::Ordering;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use rayon::prelude::*;
use tracing::{debug, info};
use walkdir::{DirEntry, WalkDir};

use crate::models::{ClassificationBuckets, ContentItem};
use crate::readers::ReaderRegistry;
use crate::utils::is_hidden;

/// 遍历源目录，返回排好序的文件列表（跳过隐藏文件和目录）
pub fn scan_source(source_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    let walker = WalkDir::new(source_dir)
        .follow_links(true)
        .into_iter()
        .filter_entry(|entry| entry.depth() == 0 || !is_hidden_entry(entry));
    for entry in walker {
        let entry = entry.with_context(|| format!("遍历目录失败: {}", source_dir.display()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    files.sort();
    debug!("在 {} 中找到 {} 个文件", source_dir.display(), files.len());
    Ok(files)
}

fn is_hidden_entry(entry: &DirEntry) -> bool {
    entry.file_name().to_str().map(is_hidden).unwrap_or(false)
}

/// 单个文件的检测结果
enum Classified {
    PureFile(PathBuf),
    Item(ContentItem),
}

/// 对源文件分类
///
/// 检测和解析在 rayon 线程池上并行执行，结果按输入顺序收集，
/// 然后单独做一次确定性的排序，因此输出与文件系统的遍历顺序无关。
/// 任何一个文件的 [`ReaderMismatch`](crate::core::error::BuildError::ReaderMismatch)
/// 都会终止整个分类。
pub fn classify(paths: &[PathBuf], registry: &ReaderRegistry) -> Result<ClassificationBuckets> {
    let results = paths
        .par_iter()
        .map(|path| -> Result<Classified> {
            Ok(match registry.read(path)? {
                Some(item) => Classified::Item(item),
                None => Classified::PureFile(path.clone()),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let mut buckets = ClassificationBuckets::default();
    for result in results {
        match result {
            Classified::PureFile(path) => buckets.pure_files.push(path),
            Classified::Item(item) => {
                let item = Arc::new(item);
                match (item.date.is_some(), item.public) {
                    (false, _) => buckets.pure_pages.push(item),
                    (true, true) => buckets.public_posts.push(item),
                    (true, false) => buckets.secure_posts.push(item),
                }
            }
        }
    }

    sort_posts(&mut buckets.public_posts);
    sort_posts(&mut buckets.secure_posts);
    buckets.pure_files.sort();
    buckets.pure_pages.sort_by(|a, b| a.source.cmp(&b.source));

    info!(
        "分类完成: {} 篇公开文章, {} 篇非公开文章, {} 个页面, {} 个文件",
        buckets.public_posts.len(),
        buckets.secure_posts.len(),
        buckets.pure_pages.len(),
        buckets.pure_files.len()
    );
    Ok(buckets)
}

/// 日期降序，同一时间按源路径升序
pub fn post_order(a: &ContentItem, b: &ContentItem) -> Ordering {
    b.date.cmp(&a.date).then_with(|| a.source.cmp(&b.source))
}

/// 按 [`post_order`] 排序
pub fn sort_posts(posts: &mut [Arc<ContentItem>]) {
    posts.sort_by(|a, b| post_order(a, b));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::readers::Reader;
    use anyhow::anyhow;
    use chrono::{DateTime, FixedOffset, TimeZone};
    use std::collections::HashMap;
    use std::fs;

    /// 从内存表中返回条目的读取器，只支持 `.md`
    struct TableReader {
        items: HashMap<PathBuf, ContentItem>,
    }

    impl Reader for TableReader {
        fn name(&self) -> &str {
            "table"
        }

        fn supports(&self, path: &Path) -> bool {
            path.extension().map_or(false, |ext| ext == "md")
        }

        fn parse(&self, path: &Path) -> Result<ContentItem> {
            self.items
                .get(path)
                .cloned()
                .ok_or_else(|| anyhow!("unknown file {}", path.display()))
        }
    }

    fn date(y: i32, m: u32, d: u32) -> DateTime<FixedOffset> {
        FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn registry(items: Vec<ContentItem>) -> ReaderRegistry {
        let items = items.into_iter().map(|i| (i.source.clone(), i)).collect();
        ReaderRegistry::new(vec![Box::new(TableReader { items })])
    }

    fn sources(posts: &[Arc<ContentItem>]) -> Vec<String> {
        posts.iter().map(|p| p.source.display().to_string()).collect()
    }

    #[test]
    fn test_posts_sorted_newest_first() {
        let items = vec![
            ContentItem::new("march", "a.md").with_date(date(2024, 3, 1)),
            ContentItem::new("january", "b.md").with_date(date(2024, 1, 1)),
            ContentItem::new("february", "c.md").with_date(date(2024, 2, 1)),
        ];
        let paths: Vec<PathBuf> = items.iter().map(|i| i.source.clone()).collect();
        let buckets = classify(&paths, &registry(items)).unwrap();

        let titles: Vec<&str> = buckets.public_posts.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["march", "february", "january"]);
    }

    #[test]
    fn test_equal_dates_break_ties_by_source_path() {
        let same = date(2024, 5, 5);
        let items = vec![
            ContentItem::new("z", "z.md").with_date(same),
            ContentItem::new("a", "a.md").with_date(same),
            ContentItem::new("m", "m.md").with_date(same),
        ];
        let mut paths: Vec<PathBuf> = items.iter().map(|i| i.source.clone()).collect();
        let expected = vec!["a.md", "m.md", "z.md"];

        let buckets = classify(&paths, &registry(items.clone())).unwrap();
        assert_eq!(sources(&buckets.public_posts), expected);

        paths.reverse();
        let buckets = classify(&paths, &registry(items)).unwrap();
        assert_eq!(sources(&buckets.public_posts), expected);
    }

    #[test]
    fn test_decision_table() {
        let items = vec![
            ContentItem::new("page", "about.md"),
            ContentItem::new("undated secret", "draft.md").with_public(false),
            ContentItem::new("public", "public.md").with_date(date(2024, 1, 1)),
            ContentItem::new("secret", "secret.md")
                .with_date(date(2024, 1, 2))
                .with_public(false),
        ];
        let mut paths: Vec<PathBuf> = items.iter().map(|i| i.source.clone()).collect();
        paths.push(PathBuf::from("logo.png"));

        let buckets = classify(&paths, &registry(items)).unwrap();
        assert_eq!(buckets.pure_files, vec![PathBuf::from("logo.png")]);
        assert_eq!(sources(&buckets.pure_pages), vec!["about.md", "draft.md"]);
        assert_eq!(sources(&buckets.public_posts), vec!["public.md"]);
        assert_eq!(sources(&buckets.secure_posts), vec!["secret.md"]);
        assert_eq!(buckets.len(), paths.len());
    }

    #[test]
    fn test_reader_mismatch_aborts_classification() {
        let paths = vec![PathBuf::from("ghost.md")];
        let err = classify(&paths, &registry(Vec::new())).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<crate::core::error::BuildError>(),
            Some(crate::core::error::BuildError::ReaderMismatch { .. })
        ));
    }

    #[test]
    fn test_scan_skips_hidden_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("posts")).unwrap();
        fs::create_dir_all(dir.path().join(".git")).unwrap();
        fs::write(dir.path().join("posts/b.md"), "b").unwrap();
        fs::write(dir.path().join("a.md"), "a").unwrap();
        fs::write(dir.path().join(".DS_Store"), "").unwrap();
        fs::write(dir.path().join(".git/config"), "").unwrap();

        let files = scan_source(dir.path()).unwrap();
        assert_eq!(files, vec![dir.path().join("a.md"), dir.path().join("posts/b.md")]);
    }
}
