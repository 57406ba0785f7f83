//! Common types and utilities for the docflow analyzer.
//!
//! This crate provides foundational types used across all docflow crates:
//! - Issue kinds, severities and immutable `Issue` records
//! - The per-unit `DiagnosticEngine` (suppression + severity resolution)
//! - Analysis configuration (`AnalysisConfig`)
//! - Docblock comment text helpers
//! - Analyzer limits and thresholds

// Diagnostics - issue records and the per-unit collector
pub mod diagnostics;
pub use diagnostics::engine::DiagnosticEngine;
pub use diagnostics::{Issue, IssueKind, Severity, UnknownIssueKind};

// Configuration passed explicitly into each analysis run
pub mod config;
pub use config::{AnalysisConfig, ConfigError};

// Comment parsing utilities
pub mod comments;

// Centralized limits and thresholds
pub mod limits;

#[cfg(test)]
#[path = "tests/engine_tests.rs"]
mod engine_tests;
#[cfg(test)]
#[path = "tests/comments_tests.rs"]
mod comments_tests;
#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod config_tests;
