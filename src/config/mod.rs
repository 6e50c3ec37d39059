// src/config/mod.rs

//! Tool configuration (`jh_config.toml`).
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Find and load the config file (`loader.rs`).
//! - Validate basic invariants like reserved command names (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{discover_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{CommandSection, JhConfig, ProjectSection, RepoWatcherSection, SlurmSection};
pub use validate::validate_config;
