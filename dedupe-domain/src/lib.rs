//! Domain logic: turn a graph snapshot into a deterministic reassignment plan.
//!
//! This crate owns *which* descriptors should move and where. It does not own *how* a plan is
//! applied to persisted state; that's the `dedupe-edit` crate.

mod error;
mod grouping;
mod planner;
mod ports;
mod range;
mod snapshot;
mod strategy;

pub use error::DedupeError;
pub use grouping::{DuplicationGroup, GroupMember, GroupingOutcome, NameFilter, group_bindings};
pub use planner::{PlanRequest, Planner, edit_id};
pub use ports::{CollectingReportSink, DedupeEvent, NullReportSink, ReportSink};
pub use range::{RangeError, RangeSet, is_satisfied_by, parse_range, parse_version};
pub use snapshot::{available_versions, read_bindings};
pub use strategy::select;
