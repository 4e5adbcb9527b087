use crate::data::Label;
use crate::models::classifier::{check_lengths, Classifier, ClassifierError, Probabilities};
use crate::models::common::class_counts;
use crate::text::SparseVector;

/// Baseline that ignores the features and predicts the training prior
#[derive(Debug, Clone, Default)]
pub struct DummyClassifier {
    prior: Option<Probabilities>,
}

impl DummyClassifier {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Classifier for DummyClassifier {
    fn name(&self) -> &str {
        "DummyClassifier"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_lengths(features, labels)?;
        let counts = class_counts(labels);
        let total = labels.len() as f64;
        self.prior = Some([counts[0] as f64 / total, counts[1] as f64 / total]);
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        let proba = self.predict_proba(features)?;
        // Ties go to the first class
        Ok(if proba[1] > proba[0] { Label::Spam } else { Label::Ham })
    }

    fn predict_proba(&self, _features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        self.prior.ok_or_else(|| ClassifierError::NotFitted(self.name().to_string()))
    }
}
