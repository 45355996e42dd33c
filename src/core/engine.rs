use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};

use crate::core::classifier::{classify, scan_source};
use crate::core::context::BuildContext;
use crate::core::dispatcher::{DispatchReport, Dispatcher};
use crate::core::error::BuildError;
use crate::core::output::{FsOutput, Output};
use crate::models::{ClassificationBuckets, Config};
use crate::readers::ReaderRegistry;
use crate::theme::{Render, ThemeRenderer};

/// 一次构建的结果
#[derive(Debug, Clone)]
pub struct BuildReport {
    pub pure_files: usize,
    pub pure_pages: usize,
    pub public_posts: usize,
    pub secure_posts: usize,
    pub dispatch: DispatchReport,
}

impl BuildReport {
    fn new(buckets: &ClassificationBuckets, dispatch: DispatchReport) -> Self {
        Self {
            pure_files: buckets.pure_files.len(),
            pure_pages: buckets.pure_pages.len(),
            public_posts: buckets.public_posts.len(),
            secure_posts: buckets.secure_posts.len(),
            dispatch,
        }
    }
}

/// 站点构建引擎
///
/// 目录配置都相对于 `base_dir` 解析。
#[derive(Debug, Clone)]
pub struct Engine {
    /// 站点根目录
    pub base_dir: PathBuf,
    /// 站点配置
    pub config: Config,
}

impl Engine {
    pub fn new(base_dir: PathBuf, config: Config) -> Self {
        Self { base_dir, config }
    }

    /// 从站点目录加载配置文件，文件不存在时使用默认配置
    pub fn load(base_dir: PathBuf, config_file: &Path) -> Result<Self> {
        info!("工作目录: {}", base_dir.display());
        let config_path = base_dir.join(config_file);
        let config = if config_path.exists() {
            let config = Config::from_file(&config_path)?;
            info!("已加载配置: {}", config_path.display());
            config
        } else {
            warn!("配置文件不存在，使用默认配置: {}", config_path.display());
            Config::default()
        };
        Ok(Self::new(base_dir, config))
    }

    pub fn source_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.source)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.output)
    }

    /// 当前主题目录
    pub fn theme_dir(&self) -> PathBuf {
        self.base_dir.join(&self.config.theme_dir).join(&self.config.theme)
    }

    /// 构建站点并写入输出目录
    pub fn build(&self) -> Result<BuildReport> {
        self.config.validate()?;
        let renderer = ThemeRenderer::new(&self.theme_dir(), &self.config.site.prefix)?;
        let mut output = FsOutput::new(self.output_dir());
        let report = self.build_with(&renderer, &mut output)?;
        info!("输出目录: {}", output.root().display());
        Ok(report)
    }

    /// 使用给定的渲染器和输出目标构建
    pub fn build_with(&self, renderer: &dyn Render, output: &mut dyn Output) -> Result<BuildReport> {
        let started = Instant::now();
        // 配置错误必须在读取任何内容之前报告
        let settings = self.config.validate()?;

        let source_dir = self.source_dir();
        if !source_dir.is_dir() {
            return Err(anyhow!(BuildError::configuration(format!(
                "内容目录不存在: {}",
                source_dir.display()
            ))));
        }

        let registry = ReaderRegistry::from_kinds(&settings.readers, settings.timezone);
        info!("启用的读取器: {}", registry.names().join(", "));

        let paths = scan_source(&source_dir)
            .with_context(|| format!("扫描内容目录失败: {}", source_dir.display()))?;
        let buckets = classify(&paths, &registry)?;

        let dispatcher = Dispatcher::from_kinds(&settings.writers);
        let ctx = BuildContext::new(self.config.clone(), settings, source_dir, buckets)
            .with_theme_static_dir(self.theme_dir().join("static"));
        let dispatch = dispatcher.dispatch(&ctx, renderer, output)?;

        let report = BuildReport::new(&ctx.buckets, dispatch);
        info!(
            "构建完成，共生成 {} 个文件，耗时 {:.2?}",
            report.dispatch.total(),
            started.elapsed()
        );
        Ok(report)
    }

    /// 删除输出目录
    pub async fn clean(&self) -> Result<()> {
        let output_dir = self.output_dir();
        if !tokio::fs::try_exists(&output_dir).await.unwrap_or(false) {
            info!("输出目录不存在，无需清理: {}", output_dir.display());
            return Ok(());
        }
        tokio::fs::remove_dir_all(&output_dir)
            .await
            .with_context(|| format!("清理输出目录失败: {}", output_dir.display()))?;
        info!("已清理输出目录: {}", output_dir.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::output::MemoryOutput;
    use std::fs;

    struct TitleRender;

    impl Render for TitleRender {
        fn render(&self, template: &str, context: &serde_json::Value) -> Result<Vec<u8>> {
            Ok(format!("{}|{}", template, context["title"].as_str().unwrap_or("")).into_bytes())
        }
    }

    #[test]
    fn test_paths_are_relative_to_base() {
        let engine = Engine::new(PathBuf::from("/site"), Config::default());
        assert_eq!(engine.source_dir(), PathBuf::from("/site/content"));
        assert_eq!(engine.output_dir(), PathBuf::from("/site/deploy"));
        assert_eq!(engine.theme_dir(), PathBuf::from("/site/_themes/default"));
    }

    #[test]
    fn test_missing_config_falls_back_to_default() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::load(dir.path().to_path_buf(), Path::new("settings.yml")).unwrap();
        assert_eq!(engine.config.perpage, 30);
    }

    #[test]
    fn test_missing_source_is_configuration_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(dir.path().to_path_buf(), Config::default());
        let err = engine.build_with(&TitleRender, &mut MemoryOutput::new()).unwrap_err();
        assert!(matches!(err.downcast_ref::<BuildError>(), Some(BuildError::Configuration { .. })));
    }

    #[test]
    fn test_build_with_memory_output() {
        let dir = tempfile::tempdir().unwrap();
        let content = dir.path().join("content");
        fs::create_dir_all(&content).unwrap();
        fs::write(content.join("hello.md"), "---\ntitle: Hello\ndate: 2024-01-02\n---\nhi\n").unwrap();
        fs::write(content.join("about.md"), "---\ntitle: About\n---\nme\n").unwrap();

        let engine = Engine::new(dir.path().to_path_buf(), Config::default());
        let mut output = MemoryOutput::new();
        let report = engine.build_with(&TitleRender, &mut output).unwrap();

        assert_eq!(report.public_posts, 1);
        assert_eq!(report.pure_pages, 1);
        assert_eq!(output.text("2024/hello.html").unwrap(), "post.html|Hello");
        assert_eq!(output.text("about.html").unwrap(), "page.html|About");
        assert!(output.get("feed.xml").is_some());
    }

    #[tokio::test]
    async fn test_clean_removes_output() {
        let dir = tempfile::tempdir().unwrap();
        let engine = Engine::new(dir.path().to_path_buf(), Config::default());
        fs::create_dir_all(engine.output_dir().join("2024")).unwrap();
        fs::write(engine.output_dir().join("index.html"), "x").unwrap();

        engine.clean().await.unwrap();
        assert!(!engine.output_dir().exists());
        // 再次清理不报错
        engine.clean().await.unwrap();
    }
}
