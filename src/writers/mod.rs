//! 写入器：每个写入器从共享的构建状态生成一类输出产物

use std::fmt;
use std::path::PathBuf;

use anyhow::Result;

use crate::core::context::BuildContext;
use crate::core::error::BuildError;

mod feeds;
mod files;
mod listing;
mod posts;

pub use feeds::{ArchiveFeedWriter, CategoryFeedWriter};
pub use files::{FileWriter, StaticWriter};
pub use listing::{ArchiveWriter, CategoryWriter, TagWriter, YearWriter};
pub use posts::{PageWriter, PostWriter};

/// 一个输出产物：相对输出路径加上内容来源
#[derive(Debug, Clone)]
pub struct Artifact {
    pub path: String,
    pub body: ArtifactBody,
}

#[derive(Debug, Clone)]
pub enum ArtifactBody {
    /// 用模板渲染
    Render {
        template: String,
        context: serde_json::Value,
    },
    /// 已经生成好的内容
    Bytes(Vec<u8>),
    /// 原样复制的文件
    Copy(PathBuf),
}

impl Artifact {
    pub fn render(path: impl Into<String>, template: impl Into<String>, context: serde_json::Value) -> Self {
        Self {
            path: path.into(),
            body: ArtifactBody::Render {
                template: template.into(),
                context,
            },
        }
    }

    pub fn bytes(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            body: ArtifactBody::Bytes(bytes.into()),
        }
    }

    pub fn copy(path: impl Into<String>, from: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            body: ArtifactBody::Copy(from.into()),
        }
    }
}

/// 写入器特征
///
/// `run` 只读取构建状态并返回计划生成的产物，不做任何 I/O 写入；
/// 模板渲染和文件写入由调度器通过注入的能力完成。
pub trait Writer: Send + Sync {
    /// 写入器名称（与配置中的键一致）
    fn name(&self) -> &str;

    /// 生成产物列表
    fn run(&self, ctx: &BuildContext) -> Result<Vec<Artifact>>;
}

/// 内置写入器的封闭集合
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterKind {
    Post,
    Page,
    Archive,
    ArchiveFeed,
    File,
    Static,
    Year,
    Tag,
    Category,
    CategoryFeed,
}

impl WriterKind {
    pub const ALL: [WriterKind; 10] = [
        WriterKind::Post,
        WriterKind::Page,
        WriterKind::Archive,
        WriterKind::ArchiveFeed,
        WriterKind::File,
        WriterKind::Static,
        WriterKind::Year,
        WriterKind::Tag,
        WriterKind::Category,
        WriterKind::CategoryFeed,
    ];

    /// 从配置键解析写入器
    pub fn from_key(key: &str) -> Result<Self, BuildError> {
        let key = key.trim();
        Self::ALL
            .iter()
            .copied()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| BuildError::configuration(format!("未知的写入器: {}", key)))
    }

    pub fn key(self) -> &'static str {
        match self {
            WriterKind::Post => "post",
            WriterKind::Page => "page",
            WriterKind::Archive => "archive",
            WriterKind::ArchiveFeed => "archive_feed",
            WriterKind::File => "file",
            WriterKind::Static => "static",
            WriterKind::Year => "year",
            WriterKind::Tag => "tag",
            WriterKind::Category => "category",
            WriterKind::CategoryFeed => "category_feed",
        }
    }

    /// 创建写入器实例
    pub fn build(self) -> Box<dyn Writer> {
        match self {
            WriterKind::Post => Box::new(PostWriter),
            WriterKind::Page => Box::new(PageWriter),
            WriterKind::Archive => Box::new(ArchiveWriter),
            WriterKind::ArchiveFeed => Box::new(ArchiveFeedWriter),
            WriterKind::File => Box::new(FileWriter),
            WriterKind::Static => Box::new(StaticWriter),
            WriterKind::Year => Box::new(YearWriter),
            WriterKind::Tag => Box::new(TagWriter),
            WriterKind::Category => Box::new(CategoryWriter),
            WriterKind::CategoryFeed => Box::new(CategoryFeedWriter),
        }
    }
}

impl fmt::Display for WriterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_writer_keys_round_trip() {
        for kind in WriterKind::ALL {
            assert_eq!(WriterKind::from_key(kind.key()).unwrap(), kind);
            assert_eq!(kind.build().name(), kind.key());
        }
        assert!(WriterKind::from_key("sitemap").is_err());
    }
}
