use std::fmt::{self, Display};
use std::error::Error;

use crate::data::Label;
use crate::text::SparseVector;

/// Error type for classifier operations
#[derive(Debug, Clone, PartialEq)]
pub enum ClassifierError {
    /// Prediction requested before `fit`
    NotFitted(String),
    /// No training samples were given
    EmptyTrainingSet,
    /// Feature and label counts differ
    LengthMismatch { features: usize, labels: usize },
    /// The training labels contain only one class
    SingleClass(Label),
    /// The model has no probability estimates
    ProbabilityUnavailable(String),
    /// Invalid hyper-parameter
    InvalidParameter(String),
}

impl ClassifierError {
    /// Short name of the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            ClassifierError::NotFitted(_) => "NotFitted",
            ClassifierError::EmptyTrainingSet => "EmptyTrainingSet",
            ClassifierError::LengthMismatch { .. } => "LengthMismatch",
            ClassifierError::SingleClass(_) => "SingleClass",
            ClassifierError::ProbabilityUnavailable(_) => "ProbabilityUnavailable",
            ClassifierError::InvalidParameter(_) => "InvalidParameter",
        }
    }
}

impl Display for ClassifierError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassifierError::NotFitted(name) => write!(f, "{} is not fitted yet", name),
            ClassifierError::EmptyTrainingSet => write!(f, "Training set is empty"),
            ClassifierError::LengthMismatch { features, labels } => write!(
                f, "Found {} feature rows but {} labels", features, labels
            ),
            ClassifierError::SingleClass(label) => write!(
                f, "Training labels contain only one class: {}", label
            ),
            ClassifierError::ProbabilityUnavailable(name) => {
                write!(f, "{} does not provide probability estimates", name)
            }
            ClassifierError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl Error for ClassifierError {}

/// Probability per class, ordered as `Label::ALL`
pub type Probabilities = [f64; 2];

/// A binary ham/spam classifier over sparse feature vectors
pub trait Classifier: Send + Sync {
    /// Display name used in score tables
    fn name(&self) -> &str;

    /// Train on feature rows and their labels
    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError>;

    /// Predict the label of one sample
    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError>;

    /// Class probabilities of one sample
    fn predict_proba(&self, _features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        Err(ClassifierError::ProbabilityUnavailable(self.name().to_string()))
    }

    /// Fraction of samples predicted correctly
    fn score(&self, features: &[SparseVector], labels: &[Label]) -> Result<f64, ClassifierError> {
        check_lengths(features, labels)?;
        let mut correct = 0usize;
        for (x, &y) in features.iter().zip(labels) {
            if self.predict(x)? == y {
                correct += 1;
            }
        }
        Ok(correct as f64 / labels.len() as f64)
    }
}

/// Reject empty or misaligned training input
pub fn check_lengths(features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
    if features.len() != labels.len() {
        return Err(ClassifierError::LengthMismatch {
            features: features.len(),
            labels: labels.len(),
        });
    }
    if labels.is_empty() {
        return Err(ClassifierError::EmptyTrainingSet);
    }
    Ok(())
}

/// Like `check_lengths`, additionally requiring both classes to be present
pub fn check_training_set(features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
    check_lengths(features, labels)?;
    let first = labels[0];
    if labels.iter().all(|&l| l == first) {
        return Err(ClassifierError::SingleClass(first));
    }
    Ok(())
}

/// Number of feature columns spanned by `features`
pub fn feature_dimension(features: &[SparseVector]) -> usize {
    features
        .iter()
        .filter_map(|x| x.max_index())
        .max()
        .map_or(0, |m| m + 1)
}
