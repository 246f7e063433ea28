//! Inventory collection and transactional reconciliation for muster.
//!
//! This crate owns the pipeline between the controller API capability
//! (`muster-api`) and the relational store:
//!
//! - **[`ModelCollector`]** — walks one model's application graph and
//!   assembles the canonical entity tree, de-duplicating machines by
//!   instance id and selecting each machine's IP through the configurable
//!   heuristic in [`collector`].
//!
//! - **[`Orchestrator`]** — drives one run per configured controller:
//!   connect, enumerate clouds and models, collect each model, classify
//!   outcomes (written / unreachable / skipped), and walk the writer
//!   through its lifecycle with guaranteed cleanup.
//!
//! - **[`InventoryWriter`]** — the reconciliation capability with two
//!   implementations: [`ConsoleWriter`] (side-effect-free diagnostics) and
//!   [`DatabaseWriter`] (staging-then-merge over the transactional
//!   [`Database`]). Either `finalize_controller` commits a fully reconciled
//!   state for the run, or `close` discards everything.

pub mod collector;
pub mod entity;
pub mod error;
pub mod orchestrator;
pub mod store;
pub mod writer;

// ── Primary re-exports ──────────────────────────────────────────────
pub use collector::{IpSelectionRules, ModelCollector};
pub use entity::{Application, Cloud, ControllerInfo, Machine, Model, Unit};
pub use error::{CollectError, CoreError};
pub use orchestrator::Orchestrator;
pub use store::{Database, DatabaseWriter, StoreError};
pub use writer::{ConsoleWriter, InventoryWriter};
