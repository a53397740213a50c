//! Data models for checkgate.
//!
//! This module defines the core data structures:
//!
//! - [`Checklist`] / [`ChecklistItem`]: resolved quality-gate definitions
//! - [`ChecklistDefinition`]: a checklist as authored, before inheritance
//! - [`Execution`] / [`ItemResult`]: recorded runs and their per-item outcomes
//! - [`Severity`], [`ArtifactType`], [`ItemStatus`], [`ExecutionStatus`]: fixed enums

mod checklist;
mod execution;
mod types;

pub use checklist::{Checklist, ChecklistDefinition, ChecklistItem, Metadata};
pub use execution::{Execution, ItemResult, NewExecution, NewItemResult};
pub use types::{ArtifactType, ExecutionStatus, ItemStatus, Severity};
