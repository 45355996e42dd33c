use std::sync::Arc;

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use super::{Artifact, Writer};
use crate::core::context::BuildContext;
use crate::core::pagination::{page_path, paginate, Pager};
use crate::models::ContentItem;

const LISTING_TEMPLATE: &str = "archive.html";

/// 生成一组分页列表页
///
/// `base` 为空或以 `/` 结尾；`scope` 描述列表的来源（全部、年份、标签或分类）。
fn listing(ctx: &BuildContext, base: &str, title: &str, scope: Value, posts: &[Arc<ContentItem>]) -> Vec<Artifact> {
    let pages = paginate(posts, ctx.settings.perpage);
    pages
        .iter()
        .map(|page| {
            let pager = page.pager(base);
            let pager = Pager {
                prev: pager.prev.map(|p| ctx.url(&p)),
                next: pager.next.map(|p| ctx.url(&p)),
                ..pager
            };
            let context = ctx.render_context(json!({
                "title": title,
                "scope": scope,
                "posts": ctx.items_value(page.items),
                "pager": pager,
            }));
            Artifact::render(page_path(base, page.number), LISTING_TEMPLATE, context)
        })
        .collect()
}

/// 首页的时间线列表
pub struct ArchiveWriter;

impl Writer for ArchiveWriter {
    fn name(&self) -> &str {
        "archive"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let posts = &ctx.buckets.public_posts;
        let scope = json!({"kind": "archive"});
        let mut artifacts = listing(ctx, "", &ctx.config.site.name, scope.clone(), posts);
        // 没有文章时也生成一个空首页
        if artifacts.is_empty() {
            let pager = Pager {
                current: 1,
                total: 1,
                prev: None,
                next: None,
            };
            let context = ctx.render_context(json!({
                "title": ctx.config.site.name,
                "scope": scope,
                "posts": [],
                "pager": pager,
            }));
            artifacts.push(Artifact::render(page_path("", 0), LISTING_TEMPLATE, context));
        }
        Ok(artifacts)
    }
}

/// 按年份归档
pub struct YearWriter;

impl Writer for YearWriter {
    fn name(&self) -> &str {
        "year"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for (year, posts) in ctx.index.years_desc() {
            let base = format!("{}/", year);
            let scope = json!({"kind": "year", "name": year});
            artifacts.extend(listing(ctx, &base, &year.to_string(), scope, posts));
        }
        Ok(artifacts)
    }
}

/// 按标签归档
pub struct TagWriter;

impl Writer for TagWriter {
    fn name(&self) -> &str {
        "tag"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for (tag, posts) in &ctx.index.tags {
            let slug = ctx.index.tag_slug(tag).ok_or_else(|| anyhow!("标签缺少目录名: {}", tag))?;
            let base = format!("tag/{}/", slug);
            let scope = json!({"kind": "tag", "name": tag});
            artifacts.extend(listing(ctx, &base, tag, scope, posts));
        }
        Ok(artifacts)
    }
}

/// 按分类归档
pub struct CategoryWriter;

impl Writer for CategoryWriter {
    fn name(&self) -> &str {
        "category"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let mut artifacts = Vec::new();
        for (category, posts) in &ctx.index.categories {
            let slug = ctx
                .index
                .category_slug(category)
                .ok_or_else(|| anyhow!("分类缺少目录名: {}", category))?;
            let base = format!("category/{}/", slug);
            let scope = json!({"kind": "category", "name": category});
            artifacts.extend(listing(ctx, &base, category, scope, posts));
        }
        Ok(artifacts)
    }
}
