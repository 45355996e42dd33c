pub mod config;
pub mod types;

pub use config::{BuildSettings, Config, SiteInfo};
pub use types::{ClassificationBuckets, ContentItem};
