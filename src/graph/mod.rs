// src/graph/mod.rs

//! The declarative job graph.
//!
//! - [`model`] holds the serde data model (`ProjectConfig`, `JobConfig`).
//! - [`dependency`] holds the four-bucket `DependencySpec`.
//! - [`loader`] reads YAML / TOML / JSON graph files and merges them.
//! - [`validate`] normalizes scheduler options, checks reserved names and
//!   rejects cycles.
//! - [`closure`] computes which jobs a rerun request must submit.
//! - [`chart`] exports the graph as a Mermaid flowchart.

pub mod chart;
pub mod closure;
pub mod dependency;
pub mod loader;
pub mod model;
pub mod validate;

pub use chart::{flowchart, render_chart, Link, NodeClass};
pub use closure::{parse_joblist, JobsToRun};
pub use dependency::{DependencyKind, DependencySpec};
pub use loader::{load_project, load_projects, GraphFormat};
pub use model::{ConfigPayload, JobConfig, ProjectConfig, RawProjectConfig};
