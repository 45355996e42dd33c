pub mod core;
pub mod models;
pub mod readers;
pub mod theme;
pub mod utils;
pub mod writers;

// 常用类型
pub use crate::core::{BuildError, Engine, MemoryOutput, Output};
pub use crate::models::{ClassificationBuckets, Config, ContentItem};
pub use crate::readers::{Reader, ReaderKind, ReaderRegistry};
pub use crate::theme::{Render, ThemeRenderer};
pub use crate::writers::{Artifact, Writer, WriterKind};
