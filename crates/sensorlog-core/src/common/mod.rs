pub mod config;

pub use config::{LabelReplacement, ToolSettings};
