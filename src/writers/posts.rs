use anyhow::{anyhow, Result};
use serde_json::json;
use tracing::debug;

use super::{Artifact, Writer};
use crate::core::context::BuildContext;
use crate::utils::with_html_extension;

/// 为每篇文章生成独立页面（包括非公开文章）
pub struct PostWriter;

impl Writer for PostWriter {
    fn name(&self) -> &str {
        "post"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let public = &ctx.buckets.public_posts;
        let mut artifacts = Vec::with_capacity(public.len() + ctx.buckets.secure_posts.len());

        for (i, post) in ctx.buckets.posts().enumerate() {
            let path = ctx
                .permalink(post)
                .ok_or_else(|| anyhow!("文章没有日期: {}", post.source.display()))?;

            // 只有公开文章之间互相链接
            let (newer, older) = if i < public.len() {
                let newer = i.checked_sub(1).map(|n| ctx.item_value(&public[n]));
                let older = public.get(i + 1).map(|p| ctx.item_value(p));
                (newer, older)
            } else {
                (None, None)
            };

            let template = post.template.clone().unwrap_or_else(|| "post.html".to_string());
            let context = ctx.render_context(json!({
                "title": post.title,
                "post": ctx.item_value(post),
                "newer": newer,
                "older": older,
            }));
            debug!("文章 {} -> {}", post.source.display(), path);
            artifacts.push(Artifact::render(path, template, context));
        }

        Ok(artifacts)
    }
}

/// 为每个没有日期的页面生成输出
pub struct PageWriter;

impl Writer for PageWriter {
    fn name(&self) -> &str {
        "page"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        ctx.buckets
            .pure_pages
            .iter()
            .map(|page| {
                let relative = ctx
                    .source_relative(&page.source)
                    .ok_or_else(|| anyhow!("页面不在内容目录中: {}", page.source.display()))?;
                let template = page.template.clone().unwrap_or_else(|| "page.html".to_string());
                let context = ctx.render_context(json!({
                    "title": page.title,
                    "page": ctx.item_value(page),
                }));
                Ok(Artifact::render(with_html_extension(&relative), template, context))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ClassificationBuckets, Config, ContentItem};
    use crate::writers::test_support::{buckets, context_with, post};
    use crate::writers::ArtifactBody;
    use std::sync::Arc;

    fn context_of(artifact: &Artifact) -> &serde_json::Value {
        match &artifact.body {
            ArtifactBody::Render { context, .. } => context,
            other => panic!("unexpected body: {:?}", other),
        }
    }

    #[test]
    fn test_posts_use_permalinks_and_neighbours() {
        let ctx = context_with(
            Config::default(),
            buckets(
                vec![post("c", 2024, 3, 1), post("b", 2024, 2, 1), post("a", 2023, 1, 1)],
                vec![post("secret", 2024, 4, 1)],
            ),
        );
        let artifacts = PostWriter.run(&ctx).unwrap();
        let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["2024/c.html", "2024/b.html", "2023/a.html", "2024/secret.html"]);

        let middle = context_of(&artifacts[1]);
        assert_eq!(middle["newer"]["title"], "c");
        assert_eq!(middle["older"]["title"], "a");
        assert!(context_of(&artifacts[0])["newer"].is_null());
        assert!(context_of(&artifacts[3])["older"].is_null());
    }

    #[test]
    fn test_custom_template() {
        let mut item = post("wide", 2024, 1, 1);
        item.template = Some("wide.html".to_string());
        let ctx = context_with(Config::default(), buckets(vec![item], vec![]));
        let artifacts = PostWriter.run(&ctx).unwrap();
        assert!(matches!(&artifacts[0].body, ArtifactBody::Render { template, .. } if template == "wide.html"));
    }

    #[test]
    fn test_pages_keep_source_layout() {
        let buckets = ClassificationBuckets {
            pure_pages: vec![
                Arc::new(ContentItem::new("About", "content/about.md")),
                Arc::new(ContentItem::new("FAQ", "content/help/faq.markdown")),
            ],
            ..ClassificationBuckets::default()
        };
        let ctx = context_with(Config::default(), buckets);
        let artifacts = PageWriter.run(&ctx).unwrap();
        let paths: Vec<&str> = artifacts.iter().map(|a| a.path.as_str()).collect();
        assert_eq!(paths, vec!["about.html", "help/faq.html"]);
        assert_eq!(context_of(&artifacts[0])["page"]["title"], "About");
    }

    #[test]
    fn test_page_outside_source_fails() {
        let buckets = ClassificationBuckets {
            pure_pages: vec![Arc::new(ContentItem::new("Stray", "/tmp/stray.md"))],
            ..ClassificationBuckets::default()
        };
        let ctx = context_with(Config::default(), buckets);
        assert!(PageWriter.run(&ctx).is_err());
    }
}
