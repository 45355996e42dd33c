pub mod renderer;

pub use renderer::{yaml_to_value, Render, ThemeRenderer};
