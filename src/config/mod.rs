//! Configuration module - settings loading and logging setup

pub mod settings;

pub use settings::Settings;
