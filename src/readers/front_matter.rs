use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use serde::{Deserialize, Deserializer};

use crate::models::ContentItem;

/// YAML 标量，数字和布尔值按文本处理（`title: 2024`）
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

fn scalar_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Scalar>::deserialize(deserializer)?.map(Scalar::into_string))
}

/// 列表或逗号分隔的字符串
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum StringList {
    One(Scalar),
    Many(Vec<Scalar>),
}

impl StringList {
    fn into_set(self) -> BTreeSet<String> {
        let values = match self {
            StringList::One(s) => s.into_string().split(',').map(str::to_string).collect::<Vec<_>>(),
            StringList::Many(v) => v.into_iter().map(Scalar::into_string).collect(),
        };
        values
            .into_iter()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .collect()
    }
}

/// 内容文件头部的元数据
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrontMatter {
    #[serde(default, deserialize_with = "scalar_string")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub date: Option<String>,
    pub public: Option<bool>,
    tags: Option<StringList>,
    categories: Option<StringList>,
    category: Option<StringList>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "scalar_string")]
    pub template: Option<String>,
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

/// 一个已拆分出 front matter 的源文件
pub struct Document {
    pub front_matter: FrontMatter,
    pub body: String,
}

impl Document {
    /// 读取并拆分源文件
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("读取文件失败: {}", path.display()))?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self> {
        let matter = Matter::<YAML>::new();
        let parsed = matter.parse(text);
        let front_matter = match parsed.data {
            Some(data) => data
                .deserialize::<FrontMatter>()
                .map_err(|e| anyhow!("front matter 格式错误: {}", e))?,
            None => FrontMatter::default(),
        };
        Ok(Self {
            front_matter,
            body: parsed.content,
        })
    }

    /// 生成内容单元，`content` 是读取器渲染后的正文
    pub fn into_item(self, path: &Path, content: String, timezone: FixedOffset) -> Result<ContentItem> {
        let FrontMatter {
            title,
            date,
            public,
            tags,
            categories,
            category,
            slug,
            template,
            extra,
        } = self.front_matter;

        let mut item = ContentItem::new(String::new(), path);
        item.title = title.unwrap_or_else(|| item.filename.clone());
        item.date = date
            .as_deref()
            .map(|d| parse_date(d, timezone))
            .transpose()?;
        item.public = public.unwrap_or(true);
        item.tags = tags.map(StringList::into_set).unwrap_or_default();
        item.categories = categories
            .into_iter()
            .chain(category)
            .flat_map(StringList::into_set)
            .collect();
        if let Some(slug) = slug {
            item.slug = slug::slugify(slug);
        }
        item.template = template;
        item.meta = extra;
        item.raw = self.body;
        item.content = content;
        Ok(item)
    }
}

const OFFSET_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S %z", "%Y-%m-%d %H:%M %z"];
const NAIVE_DATETIME_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M:%S"];

/// 解析 front matter 中的日期
///
/// 带时区的日期转换到 `timezone`；不带时区的日期视为 `timezone` 下的本地时间。
pub fn parse_date(value: &str, timezone: FixedOffset) -> Result<DateTime<FixedOffset>> {
    let value = value.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Ok(dt.with_timezone(&timezone));
    }
    for format in OFFSET_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(value, format) {
            return Ok(dt.with_timezone(&timezone));
        }
    }

    let naive = NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(value, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
        .ok_or_else(|| anyhow!("无法解析日期: {}", value))?;

    timezone
        .from_local_datetime(&naive)
        .single()
        .ok_or_else(|| anyhow!("无法解析日期: {}", value))
}
