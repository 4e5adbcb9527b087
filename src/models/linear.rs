//! Linear classifiers trained by online updates or a least-squares solve
//!
//! All models share `LinearModel` as their decision function: a positive
//! margin predicts spam.

use log::debug;

use crate::data::Label;
use crate::models::classifier::{
    check_training_set, feature_dimension, Classifier, ClassifierError, Probabilities,
};
use crate::models::common::{
    binary_probabilities, sigmoid, train_sgd, EpochOrder, LearningRate, LinearModel, Loss, SgdParams,
};
use crate::text::SparseVector;

fn fitted<'a>(model: &'a Option<LinearModel>, name: &str) -> Result<&'a LinearModel, ClassifierError> {
    model.as_ref().ok_or_else(|| ClassifierError::NotFitted(name.to_string()))
}

/// Classic perceptron: unit-step updates on mistakes only
#[derive(Debug, Clone)]
pub struct Perceptron {
    epochs: usize,
    seed: u64,
    model: Option<LinearModel>,
}

impl Perceptron {
    pub fn new(epochs: usize, seed: u64) -> Self {
        Self { epochs, seed, model: None }
    }
}

impl Default for Perceptron {
    fn default() -> Self {
        Self::new(15, 0)
    }
}

impl Classifier for Perceptron {
    fn name(&self) -> &str {
        "Perceptron"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_training_set(features, labels)?;
        let params = SgdParams {
            loss: Loss::Perceptron,
            alpha: 0.0,
            learning_rate: LearningRate::Constant(1.0),
            epochs: self.epochs,
            seed: self.seed,
        };
        self.model = Some(train_sgd(features, labels, &params));
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        Ok(fitted(&self.model, self.name())?.predict(features))
    }
}

/// Online passive-aggressive learner (PA-I) with hinge loss
#[derive(Debug, Clone)]
pub struct PassiveAggressiveClassifier {
    /// Maximum step size
    c: f64,
    epochs: usize,
    seed: u64,
    model: Option<LinearModel>,
}

impl PassiveAggressiveClassifier {
    pub fn new(c: f64, epochs: usize, seed: u64) -> Result<Self, ClassifierError> {
        if c <= 0.0 {
            return Err(ClassifierError::InvalidParameter("C must be positive".to_string()));
        }
        Ok(Self { c, epochs, seed, model: None })
    }
}

impl Default for PassiveAggressiveClassifier {
    fn default() -> Self {
        Self { c: 1.0, epochs: 10, seed: 0, model: None }
    }
}

impl Classifier for PassiveAggressiveClassifier {
    fn name(&self) -> &str {
        "PassiveAggressiveClassifier"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_training_set(features, labels)?;
        let mut model = LinearModel::zeros(feature_dimension(features));
        let mut order = EpochOrder::new(features.len(), self.seed);

        for _ in 0..self.epochs {
            for &i in order.shuffled() {
                let x = &features[i];
                let y = labels[i].sign();
                let loss = (1.0 - y * model.decision(x)).max(0.0);
                if loss == 0.0 {
                    continue;
                }
                // The intercept acts as an extra constant feature
                let norm = x.squared_norm() + 1.0;
                let tau = (loss / norm).min(self.c);
                x.add_scaled_to(&mut model.weights, tau * y);
                model.bias += tau * y;
            }
        }

        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        Ok(fitted(&self.model, self.name())?.predict(features))
    }
}

/// Linear SVM trained by stochastic gradient descent on the hinge loss
#[derive(Debug, Clone)]
pub struct SgdClassifier {
    params: SgdParams,
    model: Option<LinearModel>,
}

impl SgdClassifier {
    pub fn new(params: SgdParams) -> Self {
        Self { params, model: None }
    }
}

impl Default for SgdClassifier {
    fn default() -> Self {
        Self::new(SgdParams {
            loss: Loss::Hinge,
            alpha: 1e-4,
            learning_rate: LearningRate::Optimal,
            epochs: 15,
            seed: 0,
        })
    }
}

impl Classifier for SgdClassifier {
    fn name(&self) -> &str {
        "SGDClassifier"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_training_set(features, labels)?;
        self.model = Some(train_sgd(features, labels, &self.params));
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        Ok(fitted(&self.model, self.name())?.predict(features))
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        // Only the log loss yields calibrated probabilities
        if self.params.loss != Loss::Log {
            return Err(ClassifierError::ProbabilityUnavailable(self.name().to_string()));
        }
        let model = fitted(&self.model, self.name())?;
        Ok(binary_probabilities(sigmoid(model.decision(features))))
    }
}

/// L2-regularised logistic regression
#[derive(Debug, Clone)]
pub struct LogisticRegression {
    /// Inverse regularisation strength
    c: f64,
    epochs: usize,
    seed: u64,
    model: Option<LinearModel>,
}

impl LogisticRegression {
    pub fn new(c: f64, epochs: usize, seed: u64) -> Result<Self, ClassifierError> {
        if c <= 0.0 {
            return Err(ClassifierError::InvalidParameter("C must be positive".to_string()));
        }
        Ok(Self { c, epochs, seed, model: None })
    }
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self { c: 1.0, epochs: 30, seed: 0, model: None }
    }
}

impl Classifier for LogisticRegression {
    fn name(&self) -> &str {
        "LogisticRegression"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_training_set(features, labels)?;
        let params = SgdParams {
            loss: Loss::Log,
            alpha: 1.0 / (self.c * features.len() as f64),
            learning_rate: LearningRate::Optimal,
            epochs: self.epochs,
            seed: self.seed,
        };
        self.model = Some(train_sgd(features, labels, &params));
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        Ok(fitted(&self.model, self.name())?.predict(features))
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        let model = fitted(&self.model, self.name())?;
        Ok(binary_probabilities(sigmoid(model.decision(features))))
    }
}

/// Least-squares fit to ±1 targets with an L2 penalty
#[derive(Debug, Clone)]
pub struct RidgeClassifier {
    alpha: f64,
    max_iterations: usize,
    tolerance: f64,
    model: Option<LinearModel>,
}

impl RidgeClassifier {
    pub fn new(alpha: f64) -> Result<Self, ClassifierError> {
        if alpha <= 0.0 {
            return Err(ClassifierError::InvalidParameter("alpha must be positive".to_string()));
        }
        Ok(Self { alpha, max_iterations: 500, tolerance: 1e-8, model: None })
    }

    /// `(XᵀX + αI) v` where the last coordinate of `v` is the intercept
    fn normal_matvec(&self, features: &[SparseVector], v: &[f64], dimension: usize) -> Vec<f64> {
        let mut out = vec![0.0; dimension + 1];
        let (weights, bias) = v.split_at(dimension);
        for x in features {
            let t = x.dot_dense(weights) + bias[0];
            for (j, value) in x.iter() {
                out[j] += value * t;
            }
            out[dimension] += t;
        }
        for (o, vi) in out.iter_mut().zip(v) {
            *o += self.alpha * vi;
        }
        out
    }
}

impl Default for RidgeClassifier {
    fn default() -> Self {
        Self { alpha: 1.0, max_iterations: 500, tolerance: 1e-8, model: None }
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

impl Classifier for RidgeClassifier {
    fn name(&self) -> &str {
        "RidgeClassifier"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_training_set(features, labels)?;
        let dimension = feature_dimension(features);

        // Right-hand side Xᵀy, intercept last
        let mut rhs = vec![0.0; dimension + 1];
        for (x, label) in features.iter().zip(labels) {
            let y = label.sign();
            for (j, value) in x.iter() {
                rhs[j] += value * y;
            }
            rhs[dimension] += y;
        }

        // Conjugate gradient from zero
        let mut solution = vec![0.0; dimension + 1];
        let mut residual = rhs.clone();
        let mut direction = residual.clone();
        let mut rs_old = dot(&residual, &residual);
        let threshold = self.tolerance * dot(&rhs, &rhs).max(1e-300);

        let mut iterations = 0;
        while iterations < self.max_iterations && rs_old > threshold {
            let ad = self.normal_matvec(features, &direction, dimension);
            let step = rs_old / dot(&direction, &ad);
            for k in 0..=dimension {
                solution[k] += step * direction[k];
                residual[k] -= step * ad[k];
            }
            let rs_new = dot(&residual, &residual);
            let beta = rs_new / rs_old;
            for k in 0..=dimension {
                direction[k] = residual[k] + beta * direction[k];
            }
            rs_old = rs_new;
            iterations += 1;
        }
        debug!("RidgeClassifier converged after {} CG iterations", iterations);

        let bias = solution.pop().unwrap_or(0.0);
        self.model = Some(LinearModel { weights: solution, bias });
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        Ok(fitted(&self.model, self.name())?.predict(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Spam uses columns 0-1, ham uses columns 2-3, column 4 is shared noise
    fn separable() -> (Vec<SparseVector>, Vec<Label>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..10 {
            let noise = (i % 3) as f64 * 0.1;
            features.push(SparseVector::from_pairs(vec![(i % 2, 1.0), (4, noise)]));
            labels.push(Label::Spam);
            features.push(SparseVector::from_pairs(vec![(2 + i % 2, 1.0), (4, noise)]));
            labels.push(Label::Ham);
        }
        (features, labels)
    }

    fn assert_learns(clf: &mut dyn Classifier) {
        let (features, labels) = separable();
        clf.fit(&features, &labels).unwrap();
        assert_eq!(clf.score(&features, &labels).unwrap(), 1.0, "{} failed", clf.name());
    }

    #[test]
    fn test_linear_models_fit_separable_data() {
        assert_learns(&mut Perceptron::default());
        assert_learns(&mut PassiveAggressiveClassifier::default());
        assert_learns(&mut SgdClassifier::default());
        assert_learns(&mut LogisticRegression::default());
        assert_learns(&mut RidgeClassifier::default());
    }

    #[test]
    fn test_single_class_rejected() {
        let features = vec![SparseVector::from_pairs(vec![(0, 1.0)]); 3];
        let labels = vec![Label::Ham; 3];
        let mut clf = RidgeClassifier::default();
        assert_eq!(
            clf.fit(&features, &labels),
            Err(ClassifierError::SingleClass(Label::Ham))
        );
    }

    #[test]
    fn test_probabilities() {
        let (features, labels) = separable();

        let mut logistic = LogisticRegression::default();
        logistic.fit(&features, &labels).unwrap();
        let proba = logistic.predict_proba(&features[0]).unwrap();
        assert!(proba[1] > 0.5);
        assert!((proba[0] + proba[1] - 1.0).abs() < 1e-12);

        let mut perceptron = Perceptron::default();
        perceptron.fit(&features, &labels).unwrap();
        assert!(matches!(
            perceptron.predict_proba(&features[0]),
            Err(ClassifierError::ProbabilityUnavailable(_))
        ));
    }

    #[test]
    fn test_predict_before_fit() {
        let clf = SgdClassifier::default();
        assert!(matches!(
            clf.predict(&SparseVector::new()),
            Err(ClassifierError::NotFitted(_))
        ));
    }
}
