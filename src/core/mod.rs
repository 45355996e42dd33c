pub mod aggregation;
pub mod classifier;
pub mod context;
pub mod dispatcher;
pub mod engine;
pub mod error;
pub mod feed;
pub mod output;
pub mod pagination;
pub mod permalink;
pub mod scaffold;

pub use context::BuildContext;
pub use dispatcher::{DispatchReport, Dispatcher};
pub use engine::{BuildReport, Engine};
pub use error::BuildError;
pub use output::{FsOutput, MemoryOutput, Output};
