use std::fmt::{self, Display};
use std::error::Error;

use log::info;
use serde::{Serialize, Deserialize};

use crate::config::ServerConfig;
use crate::data::{Dataset, DatasetError, Label};
use crate::models::common::measure_execution_time;
use crate::models::{Classifier, ClassifierError, LinearSvc, Probabilities};
use crate::text::{TfidfVectorizer, Vectorizer, VectorizerError};

/// Error raised while building the served model
#[derive(Debug)]
pub enum ModelError {
    Dataset(DatasetError),
    Vectorizer(VectorizerError),
    Classifier(ClassifierError),
}

impl Display for ModelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelError::Dataset(e) => write!(f, "Dataset error: {}", e),
            ModelError::Vectorizer(e) => write!(f, "Vectorizer error: {}", e),
            ModelError::Classifier(e) => write!(f, "Classifier error: {}", e),
        }
    }
}

impl Error for ModelError {}

impl From<DatasetError> for ModelError {
    fn from(e: DatasetError) -> Self {
        ModelError::Dataset(e)
    }
}

impl From<VectorizerError> for ModelError {
    fn from(e: VectorizerError) -> Self {
        ModelError::Vectorizer(e)
    }
}

impl From<ClassifierError> for ModelError {
    fn from(e: ClassifierError) -> Self {
        ModelError::Classifier(e)
    }
}

/// Error raised while classifying a single message
#[derive(Debug, Clone, PartialEq)]
pub enum PredictError {
    Vectorizer(VectorizerError),
    Classifier(ClassifierError),
}

impl PredictError {
    /// Name of the underlying failure, reported to API callers
    pub fn kind(&self) -> &'static str {
        match self {
            PredictError::Vectorizer(e) => e.kind(),
            PredictError::Classifier(e) => e.kind(),
        }
    }
}

impl Display for PredictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PredictError::Vectorizer(e) => write!(f, "{}", e),
            PredictError::Classifier(e) => write!(f, "{}", e),
        }
    }
}

impl Error for PredictError {}

impl From<VectorizerError> for PredictError {
    fn from(e: VectorizerError) -> Self {
        PredictError::Vectorizer(e)
    }
}

impl From<ClassifierError> for PredictError {
    fn from(e: ClassifierError) -> Self {
        PredictError::Classifier(e)
    }
}

/// Label and class probabilities for one message
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub label: Label,
    /// `[p_ham, p_spam]`
    pub probabilities: Probabilities,
}

/// Facts about how the served model was trained
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingSummary {
    pub vectorizer: String,
    pub classifier: String,
    pub vocabulary_size: usize,
    pub training_size: usize,
    pub test_size: usize,
    pub test_accuracy: f64,
}

/// TF-IDF features feeding a linear SVM with Platt-scaled probabilities
pub struct SpamModel {
    vectorizer: TfidfVectorizer,
    classifier: LinearSvc,
    summary: TrainingSummary,
}

impl SpamModel {
    /// Load the configured dataset, split it and fit on the training side
    pub fn train(config: &ServerConfig) -> Result<Self, ModelError> {
        let dataset = Dataset::from_csv(&config.data_path)?;
        Self::from_dataset(&dataset, config.test_size, config.seed)
    }

    pub fn from_dataset(dataset: &Dataset, test_size: f64, seed: u64) -> Result<Self, ModelError> {
        let (train, test) = dataset.train_test_split(test_size, seed)?;

        let mut vectorizer = TfidfVectorizer::new();
        let features = vectorizer.fit_transform(&train.messages())?;
        let mut classifier = LinearSvc::with_probability();
        let (fitted, fit_ms) = measure_execution_time(|| classifier.fit(&features, &train.labels()));
        fitted?;

        let test_features = vectorizer.transform_all(&test.messages())?;
        let test_accuracy = classifier.score(&test_features, &test.labels())?;
        info!(
            "Trained {} on {} messages ({} terms) in {:.1} ms, held-out accuracy {:.4} over {} messages",
            classifier.name(),
            train.len(),
            vectorizer.n_features(),
            fit_ms,
            test_accuracy,
            test.len()
        );

        let summary = TrainingSummary {
            vectorizer: vectorizer.name().to_string(),
            classifier: classifier.name().to_string(),
            vocabulary_size: vectorizer.n_features(),
            training_size: train.len(),
            test_size: test.len(),
            test_accuracy,
        };
        Ok(Self { vectorizer, classifier, summary })
    }

    pub fn summary(&self) -> &TrainingSummary {
        &self.summary
    }

    pub fn predict(&self, message: &str) -> Result<Prediction, PredictError> {
        let features = self.vectorizer.transform(message)?;
        let label = self.classifier.predict(&features)?;
        let probabilities = self.classifier.predict_proba(&features)?;
        Ok(Prediction { label, probabilities })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Small corpus shared with the handler tests
    pub(crate) fn corpus() -> Dataset {
        let mut records = Vec::new();
        for i in 0..10 {
            records.push((Label::Spam, format!("WINNER claim your free prize now call {}", i)));
            records.push((Label::Spam, format!("Free entry win cash txt URGENT reply {}", i)));
            records.push((Label::Ham, format!("see you at lunch tomorrow then {}", i)));
            records.push((Label::Ham, format!("ok I will call mum when I get home {}", i)));
        }
        Dataset::from_records(records)
    }

    pub(crate) fn trained() -> SpamModel {
        SpamModel::from_dataset(&corpus(), 0.25, 77).unwrap()
    }

    #[test]
    fn test_summary() {
        let model = trained();
        let summary = model.summary();
        assert_eq!(summary.training_size, 30);
        assert_eq!(summary.test_size, 10);
        assert_eq!(summary.classifier, "LinearSVC");
        assert!(summary.vocabulary_size > 0);
        assert!(summary.test_accuracy >= 0.9);
    }

    #[test]
    fn test_predict_spam_and_ham() {
        let model = trained();

        let spam = model.predict("claim your free prize, WINNER").unwrap();
        assert_eq!(spam.label, Label::Spam);
        assert!((spam.probabilities.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        let ham = model.predict("see you at home for lunch").unwrap();
        assert_eq!(ham.label, Label::Ham);
    }

    #[test]
    fn test_split_errors_surface() {
        let tiny = Dataset::from_records([(Label::Ham, "only one")]);
        assert!(matches!(
            SpamModel::from_dataset(&tiny, 0.25, 77),
            Err(ModelError::Dataset(DatasetError::InvalidSplit(_)))
        ));
    }

    #[test]
    fn test_predict_error_kind() {
        let err = PredictError::from(VectorizerError::NotFitted("TfidfVectorizer".to_string()));
        assert_eq!(err.kind(), "NotFitted");
        assert_eq!(err.to_string(), "TfidfVectorizer is not fitted yet");
    }
}
