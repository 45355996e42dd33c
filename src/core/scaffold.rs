use std::fs;
use std::path::Path;

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::models::Config;

// 嵌入的默认主题文件
mod default_theme {
    pub const BASE_HTML: &str = include_str!("../../embed/theme/default/templates/base.html");
    pub const POST_HTML: &str = include_str!("../../embed/theme/default/templates/post.html");
    pub const PAGE_HTML: &str = include_str!("../../embed/theme/default/templates/page.html");
    pub const ARCHIVE_HTML: &str = include_str!("../../embed/theme/default/templates/archive.html");
    pub const STYLE_CSS: &str = include_str!("../../embed/theme/default/static/style.css");
}

const HELLO_POST: &str = r#"---
title: Hello World
date: 2024-01-01 12:00:00
tags:
  - liquidluck
categories: 入门
---

这是第一篇文章，编辑 `content/hello-world.md` 开始写作。

运行 `rust-liquidluck build` 生成站点，输出在 `deploy/` 目录中。
"#;

const ABOUT_PAGE: &str = r#"---
title: About
---

没有日期的文件会作为独立页面输出。
"#;

/// 初始化站点目录：配置文件、默认主题和示例内容
pub fn init_site(site_path: &Path, title: &str) -> Result<()> {
    let config_path = site_path.join("settings.yml");
    if config_path.exists() {
        bail!("站点已存在: {}", config_path.display());
    }

    let mut config = Config::default();
    config.site.name = title.to_string();

    let content_dir = site_path.join(&config.source);
    let theme_dir = site_path.join(&config.theme_dir).join(&config.theme);
    let templates_dir = theme_dir.join("templates");
    let static_dir = theme_dir.join("static");
    for dir in [&content_dir, &templates_dir, &static_dir] {
        fs::create_dir_all(dir).with_context(|| format!("创建目录失败: {}", dir.display()))?;
    }

    config.save(&config_path)?;

    let files = [
        (templates_dir.join("base.html"), default_theme::BASE_HTML),
        (templates_dir.join("post.html"), default_theme::POST_HTML),
        (templates_dir.join("page.html"), default_theme::PAGE_HTML),
        (templates_dir.join("archive.html"), default_theme::ARCHIVE_HTML),
        (static_dir.join("style.css"), default_theme::STYLE_CSS),
        (content_dir.join("hello-world.md"), HELLO_POST),
        (content_dir.join("about.md"), ABOUT_PAGE),
    ];
    for (path, body) in files {
        fs::write(&path, body).with_context(|| format!("写入文件失败: {}", path.display()))?;
    }

    info!("已初始化站点: {}", site_path.display());
    Ok(())
}
