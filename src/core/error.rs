//! Error taxonomy (spec §7). The core favors plain `anyhow::Error` with
//! `Context`, the same way the teacher's tools do; `PipelineError` exists
//! only to name the fatal kinds so call sites and tests can tell them
//! apart without inventing a new error style the teacher never used.

use std::fmt;

/// A fatal error kind named by spec.md §7. `AlignmentSkip` is
/// deliberately absent: it never surfaces as an `Err` (see
/// `core::checker`), it is logged and the hit is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    Configuration(String),
    InputFormat(String),
    InvariantViolation(String),
    SubprocessFailure(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::Configuration(msg) => write!(f, "configuration error: {msg}"),
            PipelineError::InputFormat(msg) => write!(f, "input format error: {msg}"),
            PipelineError::InvariantViolation(msg) => write!(f, "invariant violation: {msg}"),
            PipelineError::SubprocessFailure(msg) => write!(f, "subprocess failure: {msg}"),
        }
    }
}

impl std::error::Error for PipelineError {}
