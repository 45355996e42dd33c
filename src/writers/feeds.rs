use std::sync::Arc;

use anyhow::{anyhow, Result};

use super::{Artifact, Writer};
use crate::core::context::BuildContext;
use crate::core::feed::{feed_window, render_feed, FeedChannel, FeedEntry};
use crate::models::ContentItem;

fn feed_entries(ctx: &BuildContext, posts: &[Arc<ContentItem>]) -> Vec<FeedEntry> {
    feed_window(posts, ctx.settings.feedcount)
        .iter()
        .filter_map(|post| {
            let link = ctx.absolute_url(&ctx.permalink(post)?);
            FeedEntry::from_item(post, link)
        })
        .collect()
}

fn feed_artifact(ctx: &BuildContext, path: String, channel: FeedChannel, posts: &[Arc<ContentItem>]) -> Artifact {
    let entries = feed_entries(ctx, posts);
    Artifact::bytes(path, render_feed(ctx.settings.feed_format, &channel, &entries))
}

/// 全站订阅源 `feed.xml`
pub struct ArchiveFeedWriter;

impl Writer for ArchiveFeedWriter {
    fn name(&self) -> &str {
        "archive_feed"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let site = &ctx.config.site;
        let channel = FeedChannel {
            title: site.name.clone(),
            link: ctx.absolute_url(""),
            description: site.description.clone(),
            author: ctx.config.author.clone(),
        };
        Ok(vec![feed_artifact(
            ctx,
            "feed.xml".to_string(),
            channel,
            &ctx.buckets.public_posts,
        )])
    }
}

/// 每个分类一个订阅源
pub struct CategoryFeedWriter;

impl Writer for CategoryFeedWriter {
    fn name(&self) -> &str {
        "category_feed"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let site = &ctx.config.site;
        ctx.index
            .categories
            .iter()
            .map(|(category, posts)| -> Result<Artifact> {
                let slug = ctx
                    .index
                    .category_slug(category)
                    .ok_or_else(|| anyhow!("分类缺少目录名: {}", category))?;
                let base = format!("category/{}/", slug);
                let channel = FeedChannel {
                    title: format!("{} - {}", site.name, category),
                    link: ctx.absolute_url(&base),
                    description: site.description.clone(),
                    author: ctx.config.author.clone(),
                };
                Ok(feed_artifact(ctx, format!("{}feed.xml", base), channel, posts))
            })
            .collect()
    }
}
