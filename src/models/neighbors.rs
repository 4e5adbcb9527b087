use crate::data::Label;
use crate::models::classifier::{check_lengths, Classifier, ClassifierError, Probabilities};
use crate::text::SparseVector;

/// Majority vote among the `k` nearest training samples (Euclidean distance)
#[derive(Debug, Clone)]
pub struct KNeighborsClassifier {
    k: usize,
    samples: Vec<(SparseVector, f64, Label)>,
}

impl KNeighborsClassifier {
    pub fn new(k: usize) -> Result<Self, ClassifierError> {
        if k == 0 {
            return Err(ClassifierError::InvalidParameter("k must be positive".to_string()));
        }
        Ok(Self { k, samples: Vec::new() })
    }

    fn votes(&self, features: &SparseVector) -> Result<[usize; 2], ClassifierError> {
        if self.samples.is_empty() {
            return Err(ClassifierError::NotFitted(self.name().to_string()));
        }

        let query_norm = features.squared_norm();
        let mut distances: Vec<(f64, Label)> = self
            .samples
            .iter()
            .map(|(x, norm, label)| (query_norm + norm - 2.0 * features.dot(x), *label))
            .collect();

        let k = self.k.min(distances.len());
        distances.select_nth_unstable_by(k - 1, |a, b| a.0.total_cmp(&b.0));

        let mut votes = [0usize; 2];
        for (_, label) in &distances[..k] {
            votes[label.index()] += 1;
        }
        Ok(votes)
    }
}

impl Default for KNeighborsClassifier {
    fn default() -> Self {
        Self { k: 5, samples: Vec::new() }
    }
}

impl Classifier for KNeighborsClassifier {
    fn name(&self) -> &str {
        "KNeighborsClassifier"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_lengths(features, labels)?;
        self.samples = features
            .iter()
            .zip(labels)
            .map(|(x, label)| (x.clone(), x.squared_norm(), *label))
            .collect();
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        let votes = self.votes(features)?;
        Ok(if votes[1] > votes[0] { Label::Spam } else { Label::Ham })
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        let votes = self.votes(features)?;
        let total = (votes[0] + votes[1]) as f64;
        Ok([votes[0] as f64 / total, votes[1] as f64 / total])
    }
}
