//! Editing layer on top of the filesystem engine.
//!
//! [`command`] describes single edits as data, [`history`] makes groups of
//! edits reversible and [`plan`] applies externally authored batches
//! tolerantly.

pub mod command;
pub mod history;
pub mod plan;

pub use command::EditCommand;
pub use history::{History, HistoryEntry};
pub use plan::{
    apply_plan, AppliedIntent, ChangeIntent, CreatePolicy, IntentKind, Outcome, PathPolicy,
    PlanItemError, PlanOptions, PlanReport,
};
