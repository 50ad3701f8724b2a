//! Accessibility modeling runs from a YAML configuration.

pub mod config;
pub mod modes;
pub mod pipeline;

pub use config::AccessConfig;
pub use modes::ModeFlags;
