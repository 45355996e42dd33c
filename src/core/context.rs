use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::{json, Map, Value};
use url::Url;

use crate::core::aggregation::AggregationIndex;
use crate::models::{BuildSettings, ClassificationBuckets, Config, ContentItem};
use crate::theme::yaml_to_value;
use crate::utils::relative_slash_path;

fn yaml_table(table: &BTreeMap<String, serde_yaml::Value>) -> Value {
    Value::Object(table.iter().map(|(k, v)| (k.clone(), yaml_to_value(v))).collect())
}

/// 一次构建的共享状态
///
/// 分类完成后创建，之后所有写入器只读访问，不再修改。
pub struct BuildContext {
    pub config: Config,
    pub settings: BuildSettings,
    /// 内容目录
    pub source_dir: PathBuf,
    /// 主题静态资源目录
    pub theme_static_dir: Option<PathBuf>,
    pub buckets: ClassificationBuckets,
    pub index: AggregationIndex,
    globals: Map<String, Value>,
}

impl BuildContext {
    pub fn new(config: Config, settings: BuildSettings, source_dir: PathBuf, buckets: ClassificationBuckets) -> Self {
        let index = AggregationIndex::build(&buckets.public_posts);
        let globals = Self::build_globals(&config);
        Self {
            config,
            settings,
            source_dir,
            theme_static_dir: None,
            buckets,
            index,
            globals,
        }
    }

    pub fn with_theme_static_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.theme_static_dir = Some(dir.into());
        self
    }

    fn build_globals(config: &Config) -> Map<String, Value> {
        let mut globals = Map::new();
        for (key, value) in &config.template_variables {
            globals.insert(key.clone(), yaml_to_value(value));
        }
        globals.insert(
            "site".to_string(),
            json!({
                "name": config.site.name,
                "url": config.site.url,
                "prefix": config.site.prefix,
                "description": config.site.description,
                "author": config.author,
            }),
        );
        globals.insert("static_prefix".to_string(), json!(config.static_prefix));
        globals.insert("authors".to_string(), yaml_table(&config.authors));
        globals.insert("theme".to_string(), yaml_table(&config.theme_variables));
        globals.insert("writer".to_string(), yaml_table(&config.writers_variables));
        globals
    }

    /// 文章的输出路径
    pub fn permalink(&self, item: &ContentItem) -> Option<String> {
        self.settings.permalink.resolve(item)
    }

    /// 源文件相对于内容目录的路径
    pub fn source_relative(&self, path: &Path) -> Option<String> {
        relative_slash_path(path, &self.source_dir)
    }

    /// 输出路径对应的站内 URL，`index.html` 省略为目录
    pub fn url(&self, path: &str) -> String {
        let path = path.strip_suffix("index.html").unwrap_or(path);
        format!("{}/{}", self.config.site.prefix.trim_end_matches('/'), path)
    }

    /// 输出路径对应的完整 URL
    pub fn absolute_url(&self, path: &str) -> String {
        let local = self.url(path);
        match Url::parse(&self.config.site.url).and_then(|base| base.join(&local)) {
            Ok(url) => url.to_string(),
            Err(_) => format!("{}{}", self.config.site.url.trim_end_matches('/'), local),
        }
    }

    /// 条目在模板中的表示
    pub fn item_value(&self, item: &ContentItem) -> Value {
        let path = match item.date {
            Some(_) => self.permalink(item),
            None => self
                .source_relative(&item.source)
                .map(|p| crate::utils::with_html_extension(&p)),
        };
        json!({
            "title": item.title,
            "content": item.content,
            "date": item.date.map(|d| d.to_rfc3339()),
            "public": item.public,
            "tags": item.tags,
            "categories": item.categories,
            "filename": item.filename,
            "slug": item.slug,
            "meta": item.meta,
            "url": path.as_deref().map(|p| self.url(p)),
            "author": self.author_value(item),
            "tag_links": self.links("tag", &item.tags, |t| self.index.tag_slug(t)),
            "category_links": self.links("category", &item.categories, |c| self.index.category_slug(c)),
        })
    }

    /// 条目的作者：front matter 的 `author`，否则是默认作者；`authors` 中的资料合并进来
    fn author_value(&self, item: &ContentItem) -> Value {
        let name = match item.meta.get("author") {
            Some(Value::String(name)) => Some(name.clone()),
            _ => self.config.author.clone(),
        };
        let Some(name) = name else {
            return Value::Null;
        };
        let mut author = Map::new();
        if let Some(Value::Object(profile)) = self.config.authors.get(&name).map(yaml_to_value) {
            author.extend(profile);
        }
        author.insert("name".to_string(), Value::String(name));
        Value::Object(author)
    }

    /// 标签或分类的列表页链接；非公开文章的标签没有列表页，`url` 为空
    fn links<'a>(&'a self, kind: &str, names: &BTreeSet<String>, slug: impl Fn(&str) -> Option<&'a str>) -> Value {
        names
            .iter()
            .map(|name| {
                let url = slug(name).map(|s| self.url(&format!("{}/{}/", kind, s)));
                json!({"name": name, "url": url})
            })
            .collect()
    }

    pub fn items_value(&self, items: &[Arc<ContentItem>]) -> Value {
        Value::Array(items.iter().map(|item| self.item_value(item)).collect())
    }

    /// 合并全局变量与写入器自己的变量，后者优先
    pub fn render_context(&self, local: Value) -> Value {
        let mut context = self.globals.clone();
        if let Value::Object(local) = local {
            context.extend(local);
        }
        Value::Object(context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{FixedOffset, TimeZone};

    fn context(prefix: &str) -> BuildContext {
        let mut config = Config::default();
        config.site.url = "https://example.com".to_string();
        config.site.prefix = prefix.to_string();
        config
            .template_variables
            .insert("analytics".to_string(), serde_yaml::Value::String("UA-1".to_string()));
        config.authors.insert(
            "admin".to_string(),
            serde_yaml::from_str("website: https://example.com/about\n").unwrap(),
        );
        config
            .theme_variables
            .insert("disqus".to_string(), serde_yaml::Value::String("blog".to_string()));
        config
            .writers_variables
            .insert("archive_title".to_string(), serde_yaml::Value::String("All".to_string()));
        let settings = config.validate().unwrap();
        BuildContext::new(config, settings, PathBuf::from("content"), ClassificationBuckets::default())
    }

    #[test]
    fn test_urls() {
        let ctx = context("/blog/");
        assert_eq!(ctx.url("index.html"), "/blog/");
        assert_eq!(ctx.url("2024/hello.html"), "/blog/2024/hello.html");
        assert_eq!(ctx.url("tag/rust/page/2/"), "/blog/tag/rust/page/2/");
        assert_eq!(ctx.absolute_url("2024/hello.html"), "https://example.com/blog/2024/hello.html");

        let ctx = context("");
        assert_eq!(ctx.url("feed.xml"), "/feed.xml");
    }

    #[test]
    fn test_item_value() {
        let ctx = context("");
        let date = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let post = ContentItem::new("Hello", "content/hello.md").with_date(date);
        let value = ctx.item_value(&post);
        assert_eq!(value["url"], "/2024/hello.html");
        assert_eq!(value["date"], "2024-03-01T00:00:00+00:00");

        let page = ContentItem::new("About", "content/docs/about.md");
        assert_eq!(ctx.item_value(&page)["url"], "/docs/about.html");
    }

    #[test]
    fn test_tag_links_use_index_directories() {
        let date = FixedOffset::east_opt(0).unwrap().with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let post = Arc::new(ContentItem::new("Hello", "content/hello.md").with_date(date).with_tags(["C", "C++"]));
        let buckets = ClassificationBuckets {
            public_posts: vec![Arc::clone(&post)],
            ..ClassificationBuckets::default()
        };
        let config = Config::default();
        let settings = config.validate().unwrap();
        let ctx = BuildContext::new(config, settings, PathBuf::from("content"), buckets);

        let value = ctx.item_value(&post);
        assert_eq!(value["tag_links"][0], json!({"name": "C", "url": "/tag/c/"}));
        assert_eq!(value["tag_links"][1], json!({"name": "C++", "url": "/tag/c-2/"}));

        let hidden = ContentItem::new("Secret", "content/secret.md").with_tags(["Private"]);
        assert_eq!(ctx.item_value(&hidden)["tag_links"][0]["url"], Value::Null);
    }

    #[test]
    fn test_render_context_merges_globals() {
        let ctx = context("");
        let value = ctx.render_context(json!({"title": "Archive", "analytics": "override"}));
        assert_eq!(value["title"], "Archive");
        assert_eq!(value["analytics"], "override");
        assert_eq!(value["site"]["url"], "https://example.com");
        assert_eq!(value["static_prefix"], "/static/");
    }

    #[test]
    fn test_variable_tables_become_globals() {
        let ctx = context("");
        let value = ctx.render_context(json!({}));
        assert_eq!(value["authors"]["admin"]["website"], "https://example.com/about");
        assert_eq!(value["theme"]["disqus"], "blog");
        assert_eq!(value["writer"]["archive_title"], "All");
    }

    #[test]
    fn test_item_author_profile() {
        let ctx = context("");
        let post = ContentItem::new("Hello", "content/hello.md");
        let author = &ctx.item_value(&post)["author"];
        assert_eq!(author["name"], "admin");
        assert_eq!(author["website"], "https://example.com/about");

        let mut guest = ContentItem::new("Guest", "content/guest.md");
        guest.meta.insert("author".to_string(), json!("lepture"));
        assert_eq!(ctx.item_value(&guest)["author"], json!({"name": "lepture"}));
    }
}
