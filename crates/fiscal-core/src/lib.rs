//! Deterministic fiscal kernel: one budget snapshot, one edit at a time.
//!
//! An action replaces one line item; the processor turns the change into
//! immediate and delayed economic effects plus headlines, the derived engine
//! recomputes inflation, yields and debt interest, and every bounded field is
//! clamped before the new snapshot is published. All randomness comes from
//! the caller's RNG so a seeded run replays exactly.

pub mod catalog;
pub mod clamp;
pub mod derived;
pub mod empathy;
pub mod init;
pub mod milestones;
pub mod narrative;
pub mod processor;
pub mod scheduler;
pub mod store;

pub use clamp::{check_invariants, InvariantViolation};
pub use init::baseline;
pub use processor::{apply, Transition, ValidationError};
pub use store::{ApplyOutcome, FiscalStore};
