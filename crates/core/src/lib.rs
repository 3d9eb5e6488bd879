//! runlog-core: run lifecycle and provenance-logging engine.
//!
//! Wraps an opaque user-supplied training action, executes it, and writes
//! one structured log file per run describing the environment, inputs,
//! outputs, parameters, and outcome.
//!
//! # Public API
//!
//! - [`parse_args()`] -- lenient argument model
//! - [`fingerprint()`] -- size + content hash of a file
//! - [`Orchestrator`] -- drives the lifecycle for one run
//! - [`UserAction`] / [`ActionRegistry`] -- the pluggable task seam
//! - [`RunRecord`] -- ordered, insert-once fact list
//! - [`HarnessError`] -- infrastructure failures that abort the process

/// Harness version recorded in every run log.
pub const HARNESS_VERSION: &str = env!("CARGO_PKG_VERSION");
/// Version of the run log layout. Bumped when keys change meaning.
pub const RECORD_SCHEMA_VERSION: u32 = 1;

pub mod action;
pub mod args;
pub mod clock;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod orchestrator;
pub mod record;
pub mod registry;
pub mod snapshot;
pub mod vcs;
pub mod writer;

// ── Convenience re-exports ───────────────────────────────────────────

pub use action::{ActionError, UserAction};
pub use args::{parse as parse_args, ParsedArguments};
pub use clock::{Clock, SystemClock};
pub use config::HarnessConfig;
pub use error::HarnessError;
pub use fingerprint::{fingerprint, FileFingerprint};
pub use orchestrator::{Orchestrator, Phase, RunOutcome};
pub use record::RunRecord;
pub use registry::{ActionFactory, ActionRegistry};
pub use snapshot::SystemSnapshot;
pub use vcs::{GitCli, VcsIdentity, VcsSource};
pub use writer::LogWriter;
