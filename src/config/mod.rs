#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

pub use crate::domain::ports::SinkKind;
