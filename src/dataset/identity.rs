//! Map local examples onto server ids through the `(name, formula, label)` key.

use std::collections::{HashMap, HashSet};

use super::{Example, ExampleKey, FormulaMatch};
use crate::gateway::ServerExample;

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    #[error("Could not find server ids for the selected examples")]
    NoServerIds,
}

/// Server examples indexed by composite key under one formula strategy.
///
/// When the server lists the same key twice the first entry wins, for both id
/// resolution and reconciliation. A last-wins map for reconciliation would let
/// the two disagree about which record a local example is.
pub struct ServerIndex<'a> {
    matcher: FormulaMatch,
    by_key: HashMap<ExampleKey, &'a ServerExample>,
}

impl<'a> ServerIndex<'a> {
    pub fn new(server_examples: &'a [ServerExample], matcher: FormulaMatch) -> Self {
        let mut by_key = HashMap::with_capacity(server_examples.len());
        for example in server_examples {
            by_key
                .entry(matcher.key_for(&example.name, &example.formula, example.is_positive))
                .or_insert(example);
        }
        Self { matcher, by_key }
    }

    pub fn lookup(&self, name: &str, formula: &str, is_positive: bool) -> Option<&'a ServerExample> {
        self.by_key
            .get(&self.matcher.key_for(name, formula, is_positive))
            .copied()
    }

    pub fn lookup_key(&self, key: &ExampleKey) -> Option<&'a ServerExample> {
        self.lookup(&key.name, &key.formula, key.is_positive)
    }
}

/// Resolve the selection to server ids, dropping examples the server does not know.
///
/// Ids come back in selection order without duplicates. An empty result is an error.
pub fn resolve_ids<'e>(
    selected: impl IntoIterator<Item = &'e Example>,
    server_examples: &[ServerExample],
    matcher: FormulaMatch,
) -> Result<Vec<u64>, ResolutionError> {
    let index = ServerIndex::new(server_examples, matcher);
    let mut seen = HashSet::new();
    let mut ids = Vec::new();
    for example in selected {
        match index.lookup(&example.name, &example.formula, example.is_positive) {
            Some(server) => {
                if seen.insert(server.id) {
                    ids.push(server.id);
                }
            }
            None => {
                tracing::debug!(
                    "No server match for example {:?} ({})",
                    example.name,
                    example.formula
                );
            }
        }
    }
    if ids.is_empty() {
        return Err(ResolutionError::NoServerIds);
    }
    Ok(ids)
}
