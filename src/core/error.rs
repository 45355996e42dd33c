use std::error::Error;
use std::path::PathBuf;
use thiserror::Error;

/// 构建错误类型
///
/// 所有变体都是致命的：构建立即终止，不做部分输出的保证。
#[derive(Error, Debug)]
pub enum BuildError {
    #[error("配置错误: {message}")]
    Configuration {
        message: String,
    },

    #[error("读取器 {reader} 声称支持 {} 但解析失败: {source}", .path.display())]
    ReaderMismatch {
        reader: String,
        path: PathBuf,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("写入器 {writer} 执行失败: {source}")]
    WriterFailure {
        writer: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },

    #[error("输出路径冲突: {path} 同时由 {first} 和 {second} 生成")]
    OutputConflict {
        path: String,
        first: String,
        second: String,
    },
}

impl BuildError {
    pub fn configuration(message: impl Into<String>) -> Self {
        BuildError::Configuration {
            message: message.into(),
        }
    }

    pub fn writer_failure(writer: &str, source: anyhow::Error) -> Self {
        BuildError::WriterFailure {
            writer: writer.to_string(),
            source: source.into(),
        }
    }
}
