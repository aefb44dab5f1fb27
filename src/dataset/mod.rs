//! Local example list, composite-key identity and server reconciliation.

mod example;
pub mod identity;
pub mod store;

pub use example::{Example, ExampleDraft, ExampleKey, FormulaMatch, canonicalize_formula};
pub use identity::{ResolutionError, ServerIndex, resolve_ids};
pub use store::{ExampleStore, SelectionCounts, ToggleOutcome};
