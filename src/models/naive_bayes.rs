use crate::data::Label;
use crate::models::classifier::{
    check_lengths, feature_dimension, Classifier, ClassifierError, Probabilities,
};
use crate::models::common::class_counts;
use crate::text::SparseVector;

/// Normalise per-class log scores into probabilities
fn softmax2(log_scores: [f64; 2]) -> Probabilities {
    let max = log_scores[0].max(log_scores[1]);
    let e0 = (log_scores[0] - max).exp();
    let e1 = (log_scores[1] - max).exp();
    [e0 / (e0 + e1), e1 / (e0 + e1)]
}

fn log_priors(labels: &[Label]) -> [f64; 2] {
    let counts = class_counts(labels);
    let total = labels.len() as f64;
    // An absent class gets a vanishing prior rather than -inf
    counts.map(|c| if c == 0 { f64::MIN_POSITIVE.ln() } else { (c as f64 / total).ln() })
}

/// Fitted parameters shared by the naive Bayes variants
#[derive(Debug, Clone)]
struct NaiveBayesState {
    class_log_prior: [f64; 2],
    /// `log P(feature | class)` per class and column
    feature_log_prob: [Vec<f64>; 2],
    /// Bernoulli only: `log(1 - P(feature | class))` per class and column
    neg_log_prob: Option<[Vec<f64>; 2]>,
    /// Bernoulli only: sum of `neg_log_prob` per class
    neg_log_sum: [f64; 2],
}

/// Naive Bayes over binary occurrence features
#[derive(Debug, Clone)]
pub struct BernoulliNB {
    /// Additive smoothing
    alpha: f64,
    state: Option<NaiveBayesState>,
}

impl BernoulliNB {
    pub fn new(alpha: f64) -> Result<Self, ClassifierError> {
        if alpha <= 0.0 {
            return Err(ClassifierError::InvalidParameter("alpha must be positive".to_string()));
        }
        Ok(Self { alpha, state: None })
    }

    fn joint_log_likelihood(&self, x: &SparseVector) -> Result<[f64; 2], ClassifierError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ClassifierError::NotFitted(self.name().to_string()))?;
        let neg = state.neg_log_prob.as_ref().ok_or_else(|| {
            ClassifierError::NotFitted(self.name().to_string())
        })?;

        let present = x.binarized();
        let mut scores = [0.0; 2];
        for c in 0..2 {
            let mut score = state.class_log_prior[c] + state.neg_log_sum[c];
            for (j, _) in present.iter() {
                // Columns never seen during training carry no evidence
                if let (Some(p), Some(q)) = (state.feature_log_prob[c].get(j), neg[c].get(j)) {
                    score += p - q;
                }
            }
            scores[c] = score;
        }
        Ok(scores)
    }
}

impl Default for BernoulliNB {
    fn default() -> Self {
        Self { alpha: 1.0, state: None }
    }
}

impl Classifier for BernoulliNB {
    fn name(&self) -> &str {
        "BernoulliNB"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_lengths(features, labels)?;
        let dimension = feature_dimension(features);
        let counts = class_counts(labels);

        let mut feature_count = [vec![0.0; dimension], vec![0.0; dimension]];
        for (x, label) in features.iter().zip(labels) {
            for (j, _) in x.binarized().iter() {
                feature_count[label.index()][j] += 1.0;
            }
        }

        let mut feature_log_prob = [Vec::new(), Vec::new()];
        let mut neg_log_prob = [Vec::new(), Vec::new()];
        let mut neg_log_sum = [0.0; 2];
        for c in 0..2 {
            let denominator = counts[c] as f64 + 2.0 * self.alpha;
            for j in 0..dimension {
                let p = (feature_count[c][j] + self.alpha) / denominator;
                feature_log_prob[c].push(p.ln());
                neg_log_prob[c].push((1.0 - p).ln());
            }
            neg_log_sum[c] = neg_log_prob[c].iter().sum();
        }

        self.state = Some(NaiveBayesState {
            class_log_prior: log_priors(labels),
            feature_log_prob,
            neg_log_prob: Some(neg_log_prob),
            neg_log_sum,
        });
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        let proba = self.predict_proba(features)?;
        Ok(if proba[1] > proba[0] { Label::Spam } else { Label::Ham })
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        Ok(softmax2(self.joint_log_likelihood(features)?))
    }
}

/// Naive Bayes over term counts (or tf-idf weights)
#[derive(Debug, Clone)]
pub struct MultinomialNB {
    alpha: f64,
    state: Option<NaiveBayesState>,
}

impl MultinomialNB {
    pub fn new(alpha: f64) -> Result<Self, ClassifierError> {
        if alpha <= 0.0 {
            return Err(ClassifierError::InvalidParameter("alpha must be positive".to_string()));
        }
        Ok(Self { alpha, state: None })
    }
}

impl Default for MultinomialNB {
    fn default() -> Self {
        Self { alpha: 1.0, state: None }
    }
}

impl Classifier for MultinomialNB {
    fn name(&self) -> &str {
        "MultinomialNB"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_lengths(features, labels)?;
        let dimension = feature_dimension(features);

        let mut feature_count = [vec![0.0; dimension], vec![0.0; dimension]];
        for (x, label) in features.iter().zip(labels) {
            for (j, v) in x.iter() {
                // Negative weights (e.g. from feature hashing) carry no count mass
                feature_count[label.index()][j] += v.max(0.0);
            }
        }

        let mut feature_log_prob = [Vec::new(), Vec::new()];
        for c in 0..2 {
            let total: f64 = feature_count[c].iter().sum::<f64>() + self.alpha * dimension as f64;
            feature_log_prob[c] = feature_count[c]
                .iter()
                .map(|count| ((count + self.alpha) / total).ln())
                .collect();
        }

        self.state = Some(NaiveBayesState {
            class_log_prior: log_priors(labels),
            feature_log_prob,
            neg_log_prob: None,
            neg_log_sum: [0.0; 2],
        });
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        let proba = self.predict_proba(features)?;
        Ok(if proba[1] > proba[0] { Label::Spam } else { Label::Ham })
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| ClassifierError::NotFitted(self.name().to_string()))?;

        let mut scores = state.class_log_prior;
        for (c, score) in scores.iter_mut().enumerate() {
            for (j, v) in features.iter() {
                if let Some(log_prob) = state.feature_log_prob[c].get(j) {
                    *score += v.max(0.0) * log_prob;
                }
            }
        }
        Ok(softmax2(scores))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Columns: 0 = "free", 1 = "prize", 2 = "lunch", 3 = "tomorrow"
    fn toy_corpus() -> (Vec<SparseVector>, Vec<Label>) {
        let features = vec![
            SparseVector::from_pairs(vec![(0, 2.0), (1, 1.0)]),
            SparseVector::from_pairs(vec![(0, 1.0), (1, 1.0)]),
            SparseVector::from_pairs(vec![(1, 1.0), (0, 1.0), (3, 1.0)]),
            SparseVector::from_pairs(vec![(2, 1.0), (3, 1.0)]),
            SparseVector::from_pairs(vec![(2, 2.0)]),
            SparseVector::from_pairs(vec![(3, 1.0), (2, 1.0)]),
        ];
        let labels = vec![Label::Spam, Label::Spam, Label::Spam, Label::Ham, Label::Ham, Label::Ham];
        (features, labels)
    }

    #[test]
    fn test_bernoulli_nb() {
        let (features, labels) = toy_corpus();
        let mut clf = BernoulliNB::default();
        clf.fit(&features, &labels).unwrap();

        assert_eq!(clf.score(&features, &labels).unwrap(), 1.0);
        let proba = clf.predict_proba(&SparseVector::from_pairs(vec![(0, 1.0)])).unwrap();
        assert!(proba[1] > 0.5);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);

        // Unseen columns are ignored
        assert!(clf.predict(&SparseVector::from_pairs(vec![(99, 1.0), (2, 1.0)])).is_ok());
    }

    #[test]
    fn test_multinomial_nb() {
        let (features, labels) = toy_corpus();
        let mut clf = MultinomialNB::default();
        clf.fit(&features, &labels).unwrap();

        assert_eq!(clf.predict(&SparseVector::from_pairs(vec![(1, 3.0)])).unwrap(), Label::Spam);
        assert_eq!(clf.predict(&SparseVector::from_pairs(vec![(2, 1.0)])).unwrap(), Label::Ham);
    }

    #[test]
    fn test_invalid_alpha() {
        assert!(BernoulliNB::new(0.0).is_err());
        assert!(MultinomialNB::new(-1.0).is_err());
    }
}
