// src/engine/mod.rs

//! Submission engine.
//!
//! - [`core`] computes the order jobs must be submitted in. It is pure and
//!   knows nothing about rendering or schedulers.
//! - [`project`] is the async shell: it renders each job through the
//!   command registry, resolves dependencies to job ids and submits through
//!   a [`SchedulerBackend`](crate::scheduler::SchedulerBackend).

pub mod core;
pub mod project;

pub use self::core::submission_order;
pub use project::{Project, ProjectSettings};
