//! Configuration module for bookcast
//!
//! This module handles:
//! - Project-level configuration (bookcast.toml)
//! - Training and optimizer settings
//! - Scoring defaults (threshold, model location)

mod project_config;

pub use project_config::{
    load_config_file, load_project_config, parse_delimiter, DataConfig, ProjectConfig,
    ScoringConfig, TrainingConfig, CONFIG_FILE, EXAMPLE_CONFIG, JSON_CONFIG_FILE,
};
