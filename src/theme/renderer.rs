use anyhow::{anyhow, Context, Result};
use chrono::DateTime;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tera::Tera;
use tracing::{debug, error, info};

use crate::core::error::BuildError;

/// 模板渲染能力：`render(模板名, 上下文) -> 字节`
pub trait Render {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<Vec<u8>>;
}

/// 基于 Tera 的主题渲染器
pub struct ThemeRenderer {
    /// 主题目录
    pub theme_dir: PathBuf,
    /// 模板引擎
    pub tera: Tera,
}

impl ThemeRenderer {
    /// 加载主题目录下 `templates/` 中的全部模板
    pub fn new(theme_dir: &Path, prefix: &str) -> Result<Self> {
        let templates_dir = theme_dir.join("templates");
        if !templates_dir.is_dir() {
            return Err(anyhow!(BuildError::configuration(format!(
                "主题模板目录不存在: {}",
                templates_dir.display()
            ))));
        }

        let pattern = format!("{}/**/*", templates_dir.display());
        let tera = Tera::new(&pattern)
            .with_context(|| format!("加载主题模板失败: {}", templates_dir.display()))?;
        info!("已加载 {} 个模板", tera.get_template_names().count());

        Ok(Self::from_tera(theme_dir.to_path_buf(), tera, prefix))
    }

    /// 使用已经准备好的 Tera 实例
    pub fn from_tera(theme_dir: PathBuf, mut tera: Tera, prefix: &str) -> Self {
        Self::register_filters(&mut tera);
        Self::register_functions(&mut tera, prefix);
        Self { theme_dir, tera }
    }

    /// 注册模板过滤器
    fn register_filters(tera: &mut Tera) {
        tera.register_filter("date_format", Self::date_format_filter);
    }

    /// 注册模板函数
    fn register_functions(tera: &mut Tera, prefix: &str) {
        let prefix = prefix.trim_end_matches('/').to_string();
        tera.register_function(
            "url_for",
            move |args: &HashMap<String, tera::Value>| -> tera::Result<tera::Value> {
                let path = args
                    .get("path")
                    .and_then(|p| p.as_str())
                    .ok_or_else(|| tera::Error::msg("url_for 缺少参数: path"))?;
                Ok(tera::Value::String(format!("{}/{}", prefix, path.trim_start_matches('/'))))
            },
        );
    }

    fn date_format_filter(value: &tera::Value, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        if let Some(date) = value.as_str().and_then(|s| DateTime::parse_from_rfc3339(s).ok()) {
            let format = args.get("format").and_then(|f| f.as_str()).unwrap_or("%Y-%m-%d");
            Ok(tera::Value::String(date.format(format).to_string()))
        } else {
            Ok(value.clone())
        }
    }
}

impl Render for ThemeRenderer {
    fn render(&self, template: &str, context: &serde_json::Value) -> Result<Vec<u8>> {
        debug!("渲染模板 {}", template);
        let context = tera::Context::from_value(context.clone())?;
        match self.tera.render(template, &context) {
            Ok(result) => Ok(result.into_bytes()),
            Err(e) => {
                error!("模板渲染失败: {}", e);
                Err(anyhow!("模板 {} 渲染失败: {:?}", template, e))
            }
        }
    }
}

/// 将YAML值转换为JSON值（模板上下文使用 JSON）
pub fn yaml_to_value(yaml: &serde_yaml::Value) -> serde_json::Value {
    match yaml {
        serde_yaml::Value::Null => serde_json::Value::Null,
        serde_yaml::Value::Bool(b) => serde_json::Value::Bool(*b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                serde_json::Value::Number(serde_json::Number::from(i))
            } else if let Some(u) = n.as_u64() {
                serde_json::Value::Number(serde_json::Number::from(u))
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
        }
        serde_yaml::Value::String(s) => serde_json::Value::String(s.clone()),
        serde_yaml::Value::Sequence(seq) => serde_json::Value::Array(seq.iter().map(yaml_to_value).collect()),
        serde_yaml::Value::Mapping(map) => {
            let mut object = serde_json::Map::new();
            for (k, v) in map {
                let key = match k {
                    serde_yaml::Value::String(s) => s.clone(),
                    serde_yaml::Value::Number(n) => n.to_string(),
                    serde_yaml::Value::Bool(b) => b.to_string(),
                    // 复杂类型的键在模板里无法访问
                    _ => continue,
                };
                object.insert(key, yaml_to_value(v));
            }
            serde_json::Value::Object(object)
        }
        // 带标签的值直接使用内部值
        serde_yaml::Value::Tagged(tagged) => yaml_to_value(&tagged.value),
    }
}
