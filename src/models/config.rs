use anyhow::{Context, Result};
use chrono::FixedOffset;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use crate::core::error::BuildError;
use crate::core::feed::FeedFormat;
use crate::core::pagination::PerPage;
use crate::core::permalink::PermalinkTemplate;
use crate::readers::ReaderKind;
use crate::writers::WriterKind;

/// 站点配置（对应 `settings.yml`）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 内容目录
    pub source: String,
    /// 输出目录
    pub output: String,
    /// 主题静态文件的输出目录（相对于输出目录）
    pub static_output: String,
    /// 静态文件的 URL 前缀
    pub static_prefix: String,
    /// 主题名称
    pub theme: String,
    /// 主题所在目录
    pub theme_dir: String,
    /// 文章永久链接模板
    pub permalink: String,
    /// 每页文章数
    pub perpage: i64,
    /// 订阅源中的文章数
    pub feedcount: i64,
    /// 订阅源格式
    pub feed_format: FeedFormat,
    /// 时区，例如 `+08:00`
    pub timezone: String,
    /// 站点信息
    pub site: SiteInfo,
    /// 默认作者
    pub author: Option<String>,
    /// 作者资料，键为作者名
    pub authors: BTreeMap<String, serde_yaml::Value>,
    /// 读取器，按顺序尝试
    pub readers: Vec<String>,
    /// 读取器选项，内置读取器没有可调的选项，只保留原值
    pub readers_variables: BTreeMap<String, serde_yaml::Value>,
    /// 写入器，按顺序执行
    pub writers: Vec<String>,
    /// 写入器选项，模板中为 `writer`
    pub writers_variables: BTreeMap<String, serde_yaml::Value>,
    /// 传给所有模板的变量
    pub template_variables: BTreeMap<String, serde_yaml::Value>,
    /// 主题选项，模板中为 `theme`
    pub theme_variables: BTreeMap<String, serde_yaml::Value>,
}

/// 站点信息
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteInfo {
    pub name: String,
    pub url: String,
    /// 站点在域名下的路径前缀
    pub prefix: String,
    pub description: String,
}

impl Default for SiteInfo {
    fn default() -> Self {
        Self {
            name: "Felix Felicis".to_string(),
            url: "http://localhost".to_string(),
            prefix: String::new(),
            description: String::new(),
        }
    }
}

/// 默认的写入器顺序
pub const DEFAULT_WRITERS: &[&str] = &[
    "post",
    "page",
    "archive",
    "archive_feed",
    "file",
    "static",
    "year",
    "tag",
    "category",
    "category_feed",
];

impl Default for Config {
    fn default() -> Self {
        Self {
            source: "content".to_string(),
            output: "deploy".to_string(),
            static_output: "static".to_string(),
            static_prefix: "/static/".to_string(),
            theme: "default".to_string(),
            theme_dir: "_themes".to_string(),
            permalink: "{{date.year}}/{{filename}}".to_string(),
            perpage: 30,
            feedcount: 20,
            feed_format: FeedFormat::Atom,
            timezone: "+00:00".to_string(),
            site: SiteInfo::default(),
            author: Some("admin".to_string()),
            authors: BTreeMap::new(),
            readers: vec!["markdown".to_string()],
            readers_variables: BTreeMap::new(),
            writers: DEFAULT_WRITERS.iter().map(|w| w.to_string()).collect(),
            writers_variables: BTreeMap::new(),
            template_variables: BTreeMap::new(),
            theme_variables: BTreeMap::new(),
        }
    }
}

/// 校验过的构建参数
#[derive(Debug, Clone)]
pub struct BuildSettings {
    pub permalink: PermalinkTemplate,
    pub perpage: PerPage,
    pub feedcount: usize,
    pub feed_format: FeedFormat,
    pub timezone: FixedOffset,
    pub readers: Vec<ReaderKind>,
    pub writers: Vec<WriterKind>,
}

impl Config {
    /// 从文件加载配置
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("读取配置文件失败: {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("解析配置文件失败: {}", path.display()))?;
        Ok(config)
    }

    /// 加载配置的别名
    pub fn load(path: &Path) -> Result<Self> {
        Self::from_file(path)
    }

    /// 保存配置到文件
    pub fn save(&self, path: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(path, yaml)?;
        Ok(())
    }

    /// 在处理任何内容之前校验配置
    pub fn validate(&self) -> Result<BuildSettings, BuildError> {
        let permalink = PermalinkTemplate::parse(&self.permalink)?;
        let perpage = PerPage::new(self.perpage)?;
        let feedcount = usize::try_from(self.feedcount).map_err(|_| {
            BuildError::configuration(format!("feedcount 不能为负数，当前为 {}", self.feedcount))
        })?;
        let timezone = parse_timezone(&self.timezone)?;

        let readers = self
            .readers
            .iter()
            .map(|key| ReaderKind::from_key(key))
            .collect::<Result<Vec<_>, _>>()?;
        let writers = self
            .writers
            .iter()
            .map(|key| WriterKind::from_key(key))
            .collect::<Result<Vec<_>, _>>()?;

        for (i, writer) in writers.iter().enumerate() {
            if writers[..i].contains(writer) {
                return Err(BuildError::configuration(format!("写入器 {} 重复配置", writer)));
            }
        }

        Ok(BuildSettings {
            permalink,
            perpage,
            feedcount,
            feed_format: self.feed_format,
            timezone,
            readers,
            writers,
        })
    }
}

/// 解析 `+08:00`、`-0500`、`Z` 这样的时区偏移
pub fn parse_timezone(value: &str) -> Result<FixedOffset, BuildError> {
    let invalid = || BuildError::configuration(format!("无法解析时区: {}", value));
    let value = value.trim();
    if value.eq_ignore_ascii_case("z") || value.eq_ignore_ascii_case("utc") {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }

    let (sign, rest) = match value.chars().next() {
        Some('+') => (1, &value[1..]),
        Some('-') => (-1, &value[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = digits[2..].parse().map_err(|_| invalid())?;
    if minutes >= 60 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let settings = Config::default().validate().unwrap();
        assert_eq!(settings.perpage.get(), 30);
        assert_eq!(settings.feedcount, 20);
        assert_eq!(settings.readers, vec![ReaderKind::Markdown]);
        assert_eq!(settings.writers.len(), DEFAULT_WRITERS.len());
        assert_eq!(settings.permalink.as_str(), "{{date.year}}/{{filename}}");
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let config: Config = serde_yaml::from_str("perpage: 5\nsite:\n  name: Test\n").unwrap();
        assert_eq!(config.perpage, 5);
        assert_eq!(config.site.name, "Test");
        assert_eq!(config.site.url, "http://localhost");
        assert_eq!(config.source, "content");
    }

    #[test]
    fn test_variable_tables() {
        let yaml = "authors:\n  lepture:\n    website: https://lepture.com\ntheme_variables:\n  disqus: blog\nwriters_variables:\n  archive_title: All\nreaders_variables:\n  markdown_extensions: [toc]\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.authors["lepture"]["website"].as_str(), Some("https://lepture.com"));
        assert_eq!(config.theme_variables["disqus"].as_str(), Some("blog"));
        assert_eq!(config.writers_variables["archive_title"].as_str(), Some("All"));
        assert!(config.readers_variables.contains_key("markdown_extensions"));
        config.validate().unwrap();
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let cases: Vec<fn(&mut Config)> = vec![
            |c| c.perpage = 0,
            |c| c.perpage = -1,
            |c| c.feedcount = -1,
            |c| c.permalink = "{{date.week}}/{{filename}}".to_string(),
            |c| c.permalink = "../{{filename}}".to_string(),
            |c| c.timezone = "Asia/Shanghai".to_string(),
            |c| c.readers = vec!["textile".to_string()],
            |c| c.writers = vec!["sitemap".to_string()],
            |c| c.writers = vec!["post".to_string(), "post".to_string()],
        ];
        for mutate in cases {
            let mut config = Config::default();
            mutate(&mut config);
            assert!(matches!(config.validate(), Err(BuildError::Configuration { .. })));
        }
    }

    #[test]
    fn test_feedcount_zero_is_allowed() {
        let config = Config {
            feedcount: 0,
            ..Config::default()
        };
        assert_eq!(config.validate().unwrap().feedcount, 0);
    }

    #[test]
    fn test_parse_timezone() {
        assert_eq!(parse_timezone("+08:00").unwrap().local_minus_utc(), 8 * 3600);
        assert_eq!(parse_timezone("-0530").unwrap().local_minus_utc(), -(5 * 3600 + 30 * 60));
        assert_eq!(parse_timezone("Z").unwrap().local_minus_utc(), 0);
        assert!(parse_timezone("+8").is_err());
        assert!(parse_timezone("+08:75").is_err());
    }
}
