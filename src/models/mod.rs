//! Binary ham/spam classifiers
//!
//! Every model implements `Classifier` over sparse feature vectors produced
//! by the `text` vectorizers.

pub mod classifier;
pub mod common;
pub mod dummy;
pub mod linear;
pub mod naive_bayes;
pub mod neighbors;
pub mod svm;

pub use classifier::{Classifier, ClassifierError, Probabilities};
pub use dummy::DummyClassifier;
pub use linear::{
    LogisticRegression, PassiveAggressiveClassifier, Perceptron, RidgeClassifier, SgdClassifier,
};
pub use naive_bayes::{BernoulliNB, MultinomialNB};
pub use neighbors::KNeighborsClassifier;
pub use svm::{LinearSvc, SvcParams};

/// Every classifier with its default settings, in benchmark order
pub fn default_classifiers() -> Vec<Box<dyn Classifier>> {
    vec![
        Box::new(BernoulliNB::default()),
        Box::new(MultinomialNB::default()),
        Box::new(DummyClassifier::new()),
        Box::new(PassiveAggressiveClassifier::default()),
        Box::new(Perceptron::default()),
        Box::new(RidgeClassifier::default()),
        Box::new(SgdClassifier::default()),
        Box::new(LinearSvc::default()),
        Box::new(LogisticRegression::default()),
        Box::new(KNeighborsClassifier::default()),
    ]
}
