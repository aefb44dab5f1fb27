//! Canonical local example list with selection and training flags.
//!
//! Every mutation keeps `used_in_training ⇒ selected`.

use std::collections::HashSet;

use super::identity::ServerIndex;
use super::{Example, ExampleDraft, ExampleKey, FormulaMatch, canonicalize_formula};
use crate::gateway::ServerExample;

/// Result of a selection toggle request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToggleOutcome {
    /// Selection now holds the contained value.
    Changed(bool),
    /// The example is used in the current model and cannot be deselected.
    Locked,
    NotFound,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SelectionCounts {
    pub selected: usize,
    /// Selected and not yet folded into the model.
    pub new: usize,
    /// Selected and already used.
    pub used: usize,
}

#[derive(Clone, Debug, Default)]
pub struct ExampleStore {
    examples: Vec<Example>,
}

impl ExampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from parsed drafts, assigning positional local ids.
    pub fn from_drafts(drafts: impl IntoIterator<Item = ExampleDraft>) -> Self {
        let mut store = Self::new();
        store.replace(drafts);
        store
    }

    /// Replace the whole list; formulas are stored in canonical form.
    pub fn replace(&mut self, drafts: impl IntoIterator<Item = ExampleDraft>) {
        self.examples = drafts
            .into_iter()
            .enumerate()
            .map(|(local_id, draft)| Example {
                local_id,
                name: draft.name,
                formula: canonicalize_formula(&draft.formula),
                is_positive: draft.is_positive,
                selected: false,
                used_in_training: false,
            })
            .collect();
    }

    pub fn clear(&mut self) {
        self.examples.clear();
    }

    pub fn examples(&self) -> &[Example] {
        &self.examples
    }

    pub fn get(&self, local_id: usize) -> Option<&Example> {
        self.examples.iter().find(|example| example.local_id == local_id)
    }

    pub fn len(&self) -> usize {
        self.examples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.examples.is_empty()
    }

    pub fn selected(&self) -> impl Iterator<Item = &Example> {
        self.examples.iter().filter(|example| example.selected)
    }

    /// Flip selection, or set it when `explicit` is given.
    pub fn toggle_selection(&mut self, local_id: usize, explicit: Option<bool>) -> ToggleOutcome {
        let Some(example) = self
            .examples
            .iter_mut()
            .find(|example| example.local_id == local_id)
        else {
            return ToggleOutcome::NotFound;
        };
        let target = explicit.unwrap_or(!example.selected);
        if example.used_in_training && !target {
            return ToggleOutcome::Locked;
        }
        example.selected = target;
        ToggleOutcome::Changed(target)
    }

    /// Set every selection to `value`; used examples stay selected.
    pub fn select_all(&mut self, value: bool) {
        for example in &mut self.examples {
            example.selected = value || example.used_in_training;
        }
    }

    /// Overwrite training flags from an authoritative server snapshot.
    ///
    /// Examples the server does not list, or lists without a flag, keep their state.
    /// Returns how many local examples changed.
    pub fn reconcile(&mut self, server_examples: &[ServerExample], matcher: FormulaMatch) -> usize {
        let index = ServerIndex::new(server_examples, matcher);
        let mut changed = 0;
        for example in &mut self.examples {
            let Some(used) = index
                .lookup(&example.name, &example.formula, example.is_positive)
                .and_then(|server| server.used_in_training)
            else {
                continue;
            };
            let selected = example.selected || used;
            if example.used_in_training != used || example.selected != selected {
                changed += 1;
            }
            example.used_in_training = used;
            example.selected = selected;
        }
        changed
    }

    /// Optimistically flag a just-trained batch as used. Never clears a flag.
    pub fn mark_used(&mut self, batch: &[ExampleKey]) {
        let batch: HashSet<&ExampleKey> = batch.iter().collect();
        for example in &mut self.examples {
            if batch.contains(&example.key()) {
                example.used_in_training = true;
                example.selected = true;
            }
        }
    }

    /// Clear every flag after the server model has been reset.
    pub fn reset(&mut self) {
        for example in &mut self.examples {
            example.selected = false;
            example.used_in_training = false;
        }
    }

    pub fn selected_counts(&self) -> SelectionCounts {
        let mut counts = SelectionCounts::default();
        for example in self.selected() {
            counts.selected += 1;
            if example.used_in_training {
                counts.used += 1;
            } else {
                counts.new += 1;
            }
        }
        counts
    }
}
