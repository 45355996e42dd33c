use anyhow::{anyhow, Context, Result};
use tracing::warn;
use walkdir::WalkDir;

use super::{Artifact, Writer};
use crate::core::context::BuildContext;
use crate::utils::{ensure_trailing_slash, relative_slash_path};

/// 原样复制没有读取器处理的文件
pub struct FileWriter;

impl Writer for FileWriter {
    fn name(&self) -> &str {
        "file"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        ctx.buckets
            .pure_files
            .iter()
            .map(|file| {
                let relative = ctx
                    .source_relative(file)
                    .ok_or_else(|| anyhow!("文件不在内容目录中: {}", file.display()))?;
                Ok(Artifact::copy(relative, file.clone()))
            })
            .collect()
    }
}

/// 复制主题的静态资源到 `static_output`
pub struct StaticWriter;

impl Writer for StaticWriter {
    fn name(&self) -> &str {
        "static"
    }

    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>> {
        let static_dir = match &ctx.theme_static_dir {
            Some(dir) if dir.is_dir() => dir,
            Some(dir) => {
                warn!("主题静态资源目录不存在: {}", dir.display());
                return Ok(Vec::new());
            }
            None => return Ok(Vec::new()),
        };

        let prefix = match ctx.config.static_output.trim_matches('/') {
            "" => String::new(),
            dir => ensure_trailing_slash(dir),
        };

        let mut artifacts = Vec::new();
        for entry in WalkDir::new(static_dir).sort_by_file_name() {
            let entry = entry.with_context(|| format!("遍历静态资源失败: {}", static_dir.display()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            if let Some(relative) = relative_slash_path(entry.path(), static_dir) {
                artifacts.push(Artifact::copy(format!("{}{}", prefix, relative), entry.path()));
            }
        }
        Ok(artifacts)
    }
}
