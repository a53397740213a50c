//! # Checkgate - quality-gate checklists with execution tracking
//!
//! Checkgate keeps review checklists as YAML files, resolves them through
//! single-parent inheritance and prioritized override directories, and records
//! every run of a checklist against an artifact in a local SQLite store.
//!
//! ## Features
//!
//! - **Declarative validation**: checklist documents are checked against a YAML rule file
//! - **Inheritance**: a checklist may `extends` another; items merge by id
//! - **Override sources**: team directories shadow core checklists by priority
//! - **Execution tracking**: per-item outcomes, derived pass/fail/partial status
//! - **Reports**: story history, failed items, compliance rates, pending gates
//!
//! ## Quick Start
//!
//! ```bash
//! # Initialize a new checkgate project
//! checkgate init
//!
//! # Validate all checklist files
//! checkgate validate
//!
//! # Render a resolved checklist
//! checkgate show story-done
//!
//! # Record a run from a JSON document
//! checkgate import results.json
//! ```
//!
//! ## Modules
//!
//! - [`cli`]: Command-line interface definitions and handlers
//! - [`config`]: Configuration loading and management
//! - [`error`]: Error types and result aliases
//! - [`loader`]: Checklist lookup, inheritance and caching
//! - [`model`]: Data models (Checklist, Execution, ItemStatus, etc.)
//! - [`schema`]: Rule-driven checklist validation
//! - [`tracker`]: SQLite-backed execution tracking and reports

/// Command-line interface definitions using clap.
pub mod cli;

/// Configuration loading and management.
///
/// Handles `checkgate.toml` configuration files and project discovery.
pub mod config;

/// Error types and result aliases.
///
/// Defines `CheckgateError` enum and `Result<T>` type alias.
pub mod error;

/// Checklist resolution across override sources and core directories.
pub mod loader;

pub mod logging;

/// Data models for checklists and executions.
pub mod model;

/// Declarative validation of checklist documents.
pub mod schema;

/// Execution tracking.
///
/// Persists executions and item results, and answers reporting queries.
pub mod tracker;
