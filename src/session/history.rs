//! Client-side pointer into the server-held training history.
//!
//! The server owns the snapshots; the client only tracks `{current_index,
//! total_entries}` and keeps `current_index ∈ [-1, total_entries - 1]`.

pub use crate::gateway::ModelHistory;

/// Which way a history step moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepDirection {
    Back,
    Forward,
}

impl StepDirection {
    pub fn label(self) -> &'static str {
        match self {
            Self::Back => "back",
            Self::Forward => "forward",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct HistoryNavigator {
    state: ModelHistory,
}

impl HistoryNavigator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> ModelHistory {
        self.state
    }

    pub fn current_index(&self) -> i64 {
        self.state.current_index
    }

    pub fn total_entries(&self) -> u64 {
        self.state.total_entries
    }

    pub fn is_empty(&self) -> bool {
        self.state.total_entries == 0
    }

    /// Stepping on an empty history is allowed; the server answers it as a query.
    pub fn can_step_back(&self) -> bool {
        self.state.current_index > 0 || self.is_empty()
    }

    pub fn can_step_forward(&self) -> bool {
        self.state.current_index < self.last_index() || self.is_empty()
    }

    pub fn can_step(&self, direction: StepDirection) -> bool {
        match direction {
            StepDirection::Back => self.can_step_back(),
            StepDirection::Forward => self.can_step_forward(),
        }
    }

    /// A successful training call discards every entry after the current one,
    /// then appends the new model.
    pub fn record_training(&mut self) {
        let next = self.state.current_index.max(-1).saturating_add(1);
        self.state = ModelHistory {
            current_index: next,
            total_entries: entries_through(next),
        };
    }

    /// Adopt the index a step-back/forward response reports.
    pub fn apply_step(&mut self, current_index: i64) {
        let current_index = current_index.max(-1);
        let total_entries = self.state.total_entries.max(entries_through(current_index));
        self.state = ModelHistory {
            current_index,
            total_entries,
        };
    }

    /// Overwrite with the server's view, pulled back into bounds.
    pub fn apply_server(&mut self, history: ModelHistory) {
        let total_entries = history.total_entries;
        let current_index = history.current_index.clamp(-1, last_index_of(total_entries));
        self.state = ModelHistory {
            current_index,
            total_entries,
        };
    }

    pub fn reset(&mut self) {
        self.state = ModelHistory::default();
    }

    fn last_index(&self) -> i64 {
        last_index_of(self.state.total_entries)
    }
}

/// Highest valid index for `total_entries`, saturating for lengths past `i64::MAX`.
fn last_index_of(total_entries: u64) -> i64 {
    match total_entries.checked_sub(1) {
        Some(last) => i64::try_from(last).unwrap_or(i64::MAX),
        None => -1,
    }
}

/// Entries needed for `index` to be valid. Zero for `-1`.
fn entries_through(index: i64) -> u64 {
    u64::try_from(index).map_or(0, |index| index + 1)
}
