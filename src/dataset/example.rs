use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// One labeled training instance as held by the client.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Example {
    /// Position-derived id, stable while the list lives. Never sent to the server.
    pub local_id: usize,
    pub name: String,
    pub formula: String,
    pub is_positive: bool,
    /// User intent to include the example in the next training call.
    pub selected: bool,
    /// Server-confirmed: already folded into the model version in view.
    pub used_in_training: bool,
}

impl Example {
    pub fn key(&self) -> ExampleKey {
        ExampleKey {
            name: self.name.clone(),
            formula: self.formula.clone(),
            is_positive: self.is_positive,
        }
    }
}

/// Parsed dataset record before it enters the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExampleDraft {
    pub name: String,
    pub formula: String,
    pub is_positive: bool,
}

impl ExampleDraft {
    pub fn new(name: impl Into<String>, formula: impl Into<String>, is_positive: bool) -> Self {
        Self {
            name: name.into(),
            formula: formula.into(),
            is_positive,
        }
    }
}

/// Natural key shared by client-origin and server-origin records.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ExampleKey {
    pub name: String,
    pub formula: String,
    pub is_positive: bool,
}

/// How formula strings are compared across the client/server boundary.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormulaMatch {
    /// Byte-for-byte equality.
    #[default]
    Exact,
    /// Equality after [`canonicalize_formula`] on both sides.
    Canonical,
}

impl FormulaMatch {
    /// Project a formula onto the form this strategy compares.
    pub fn normalize<'a>(self, formula: &'a str) -> Cow<'a, str> {
        match self {
            Self::Exact => Cow::Borrowed(formula),
            Self::Canonical => Cow::Owned(canonicalize_formula(formula)),
        }
    }

    pub fn key_for(self, name: &str, formula: &str, is_positive: bool) -> ExampleKey {
        ExampleKey {
            name: name.to_string(),
            formula: self.normalize(formula).into_owned(),
            is_positive,
        }
    }
}

/// Collapse whitespace runs and space every comma as `", "`.
pub fn canonicalize_formula(formula: &str) -> String {
    let spaced = formula.replace(',', ", ");
    spaced.split_whitespace().collect::<Vec<_>>().join(" ")
}
