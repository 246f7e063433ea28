// ── Core error types ──
//
// Two layers: `CoreError` is what a run surfaces to the caller, while
// `CollectError` classifies per-model outcomes for the orchestrator --
// an unreachable model and an intentionally skipped one take different
// paths through the writer and neither aborts the run.

use thiserror::Error;

use crate::store::StoreError;

/// Run-level error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The controller could not be reached or rejected the session.
    /// Run-fatal; the writer is closed without any prepare/write calls.
    #[error("cannot connect to controller {controller}: {source}")]
    ConnectionFailed {
        controller: String,
        #[source]
        source: muster_api::Error,
    },

    /// A controller API call failed after the session was established.
    #[error("controller API error: {0}")]
    Api(#[from] muster_api::Error),

    /// A store operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),
}

/// Per-model collection outcome classification.
#[derive(Debug, Error)]
pub enum CollectError {
    /// The model's detail fetch failed; last-known canonical state is
    /// preserved through the fallback-copy path.
    #[error("model unreachable: {0}")]
    Unreachable(#[source] muster_api::Error),

    /// The model is intentionally excluded from persistence. Not a
    /// failure: no writer call is made for it.
    #[error("model skipped: {reason}")]
    Skipped { reason: String },
}
