use crate::dataset::{Example, ExampleStore};

use super::state::{ModelStatus, TrainingMode};

#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please select at least one example")]
    NoSelection,
    #[error("All selected examples already used in training. Select new examples or use retrain all")]
    AllSelectedUsed,
    #[error("Initial training requires at least one positive example")]
    NeedsPositive,
    #[error("Training requires at least one negative example")]
    NeedsNegative,
    #[error("Already at the oldest model")]
    NoEarlierModel,
    #[error("Already at the newest model")]
    NoLaterModel,
    #[error("Enter a formula to compare")]
    EmptyFormula,
}

/// Check the training preconditions in order and return the batch to submit.
///
/// An unknown model status counts as an uninitialized model.
pub(crate) fn validate_training(
    store: &ExampleStore,
    status: Option<&ModelStatus>,
    mode: TrainingMode,
) -> Result<Vec<Example>, ValidationError> {
    let selection: Vec<Example> = store.selected().cloned().collect();
    if selection.is_empty() {
        return Err(ValidationError::NoSelection);
    }
    if !mode.retrain_all() && selection.iter().all(|example| example.used_in_training) {
        return Err(ValidationError::AllSelectedUsed);
    }
    let initialized = status.is_some_and(|status| status.model_initialized);
    if !initialized {
        if !selection.iter().any(|example| example.is_positive) {
            return Err(ValidationError::NeedsPositive);
        }
    } else {
        let server_has_negatives = status.is_some_and(|status| status.negative_examples_count > 0);
        if !server_has_negatives && selection.iter().all(|example| example.is_positive) {
            return Err(ValidationError::NeedsNegative);
        }
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::ExampleDraft;

    fn store() -> ExampleStore {
        ExampleStore::from_drafts([
            ExampleDraft::new("CarA", "IS(c1, BMW)", true),
            ExampleDraft::new("CarB", "NOT(IS(c1, BMW))", false),
            ExampleDraft::new("CarC", "IS(c1, Audi)", true),
        ])
    }

    fn initialized(negatives: u64) -> ModelStatus {
        ModelStatus {
            model_initialized: true,
            objects_count: 2,
            negative_examples_count: negatives,
            ..ModelStatus::default()
        }
    }

    #[test]
    fn empty_selection_is_rejected_first() {
        let store = store();
        assert_eq!(
            validate_training(&store, None, TrainingMode::RetrainAll),
            Err(ValidationError::NoSelection)
        );
    }

    #[test]
    fn resubmitting_used_examples_needs_retrain_all() {
        let mut store = store();
        store.toggle_selection(0, Some(true));
        store.mark_used(&[store.get(0).unwrap().key()]);
        let status = initialized(1);
        assert_eq!(
            validate_training(&store, Some(&status), TrainingMode::Incremental),
            Err(ValidationError::AllSelectedUsed)
        );
        let batch = validate_training(&store, Some(&status), TrainingMode::RetrainAll).unwrap();
        assert_eq!(batch.len(), 1);
    }

    #[test]
    fn first_training_needs_a_positive() {
        let mut store = store();
        store.toggle_selection(1, Some(true));
        assert_eq!(
            validate_training(&store, None, TrainingMode::Incremental),
            Err(ValidationError::NeedsPositive)
        );
        store.toggle_selection(0, Some(true));
        assert!(validate_training(&store, None, TrainingMode::Incremental).is_ok());
    }

    #[test]
    fn initialized_model_needs_a_negative_unless_server_has_one() {
        let mut store = store();
        store.toggle_selection(2, Some(true));
        assert_eq!(
            validate_training(&store, Some(&initialized(0)), TrainingMode::Incremental),
            Err(ValidationError::NeedsNegative)
        );
        assert!(validate_training(&store, Some(&initialized(2)), TrainingMode::Incremental).is_ok());
        store.toggle_selection(1, Some(true));
        assert!(validate_training(&store, Some(&initialized(0)), TrainingMode::Incremental).is_ok());
    }
}
