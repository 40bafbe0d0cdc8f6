//! Embeddable core library for dedupe.
//!
//! Provides a clap-free, I/O-abstracted entry point suitable for linking
//! into a package manager plugin or other host process.
//!
//! # Port traits
//!
//! All I/O is abstracted behind port traits in [`ports`]:
//! - [`SnapshotSource`](ports::SnapshotSource): load the graph snapshot
//! - [`WritePort`](ports::WritePort): write files and create directories
//!
//! The [`adapters`] module provides default filesystem-backed implementations.
//!
//! # Entry points
//!
//! - [`run_plan`](pipeline::run_plan): generate a plan + report
//! - [`run_apply`](pipeline::run_apply): apply an existing plan + report

pub mod adapters;
pub mod pipeline;
pub mod ports;
pub mod settings;

// Re-export the domain's sink so callers don't need dedupe-domain directly.
pub use dedupe_domain::{CollectingReportSink, DedupeError, DedupeEvent, NullReportSink, ReportSink};

// Re-export snapshot types so embedders don't need dedupe-snapshot directly.
pub use dedupe_snapshot::{LoadedSnapshot, SnapshotLoadError};

pub use dedupe_edit::DEFAULT_BACKUP_SUFFIX;
