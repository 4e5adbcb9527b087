use std::time::Instant;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

use crate::data::Label;
use crate::text::SparseVector;

/// Weights and intercept of a linear decision function
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LinearModel {
    pub weights: Vec<f64>,
    pub bias: f64,
}

impl LinearModel {
    pub fn zeros(dimension: usize) -> Self {
        Self { weights: vec![0.0; dimension], bias: 0.0 }
    }

    /// Signed distance from the separating hyperplane; positive means spam
    pub fn decision(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.weights) + self.bias
    }

    pub fn predict(&self, x: &SparseVector) -> Label {
        Label::from_sign(self.decision(x))
    }
}

/// Count samples per class, ordered as `Label::ALL`
pub fn class_counts(labels: &[Label]) -> [usize; 2] {
    let mut counts = [0usize; 2];
    for label in labels {
        counts[label.index()] += 1;
    }
    counts
}

/// Numerically stable logistic function
pub fn sigmoid(z: f64) -> f64 {
    if z >= 0.0 {
        1.0 / (1.0 + (-z).exp())
    } else {
        let e = z.exp();
        e / (1.0 + e)
    }
}

/// Turn a spam probability into `[p_ham, p_spam]`
pub fn binary_probabilities(p_spam: f64) -> [f64; 2] {
    [1.0 - p_spam, p_spam]
}

/// Sample order for one epoch, reshuffled each call
pub struct EpochOrder {
    order: Vec<usize>,
    rng: StdRng,
}

impl EpochOrder {
    pub fn new(n: usize, seed: u64) -> Self {
        Self { order: (0..n).collect(), rng: StdRng::seed_from_u64(seed) }
    }

    pub fn shuffled(&mut self) -> &[usize] {
        self.order.shuffle(&mut self.rng);
        &self.order
    }
}

/// Per-sample loss driving stochastic gradient descent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Loss {
    /// Update only on misclassified samples
    Perceptron,
    /// Linear SVM loss
    Hinge,
    /// Logistic regression loss
    Log,
}

impl Loss {
    /// Negative derivative of the loss w.r.t. the decision value
    fn step_direction(&self, decision: f64, y: f64) -> f64 {
        let margin = y * decision;
        match self {
            Loss::Perceptron => if margin <= 0.0 { y } else { 0.0 },
            Loss::Hinge => if margin < 1.0 { y } else { 0.0 },
            Loss::Log => y * sigmoid(-margin),
        }
    }
}

/// Learning rate schedule for SGD
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LearningRate {
    Constant(f64),
    /// `1 / (alpha * (t0 + t))` with `t0 = 1 / alpha`
    Optimal,
}

/// Hyper-parameters for `train_sgd`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SgdParams {
    pub loss: Loss,
    /// L2 regularisation strength
    pub alpha: f64,
    pub learning_rate: LearningRate,
    pub epochs: usize,
    pub seed: u64,
}

/// Dense weights stored as `scale * values` so L2 decay is O(1) per step
struct ScaledWeights {
    values: Vec<f64>,
    scale: f64,
}

impl ScaledWeights {
    fn new(dimension: usize) -> Self {
        Self { values: vec![0.0; dimension], scale: 1.0 }
    }

    fn dot(&self, x: &SparseVector) -> f64 {
        x.dot_dense(&self.values) * self.scale
    }

    fn decay(&mut self, factor: f64) {
        self.scale *= factor;
        if self.scale < 1e-9 {
            self.rescale();
        }
    }

    fn add(&mut self, x: &SparseVector, amount: f64) {
        x.add_scaled_to(&mut self.values, amount / self.scale);
    }

    fn rescale(&mut self) {
        for v in &mut self.values {
            *v *= self.scale;
        }
        self.scale = 1.0;
    }

    fn into_dense(mut self) -> Vec<f64> {
        self.rescale();
        self.values
    }
}

/// Plain stochastic gradient descent over shuffled epochs
pub fn train_sgd(features: &[SparseVector], labels: &[Label], params: &SgdParams) -> LinearModel {
    let dimension = crate::models::classifier::feature_dimension(features);
    let mut weights = ScaledWeights::new(dimension);
    let mut bias = 0.0;
    let mut order = EpochOrder::new(features.len(), params.seed);

    let t0 = if params.alpha > 0.0 { 1.0 / params.alpha } else { 1.0 };
    let mut t = 0.0;

    for _ in 0..params.epochs {
        for &i in order.shuffled() {
            let x = &features[i];
            let y = labels[i].sign();

            let eta = match params.learning_rate {
                LearningRate::Constant(eta) => eta,
                LearningRate::Optimal => 1.0 / (params.alpha.max(1e-12) * (t0 + t)),
            };

            let direction = params.loss.step_direction(weights.dot(x) + bias, y);

            if params.alpha > 0.0 {
                weights.decay((1.0 - eta * params.alpha).max(1e-9));
            }
            if direction != 0.0 {
                weights.add(x, eta * direction);
                bias += eta * direction;
            }
            t += 1.0;
        }
    }

    LinearModel { weights: weights.into_dense(), bias }
}

/// Sigmoid fitted on decision values to turn margins into probabilities
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlattScaler {
    pub a: f64,
    pub b: f64,
}

impl PlattScaler {
    const MAX_ITERATIONS: usize = 100;
    const MIN_STEP: f64 = 1e-10;
    const SIGMA: f64 = 1e-12;
    const EPSILON: f64 = 1e-5;

    /// Fit `P(spam | f) = 1 / (1 + exp(a*f + b))` by Newton's method with backtracking
    pub fn fit(decisions: &[f64], labels: &[Label]) -> Self {
        let [n_neg, n_pos] = class_counts(labels);
        let (prior0, prior1) = (n_neg as f64, n_pos as f64);

        // Regularised targets keep the fit away from 0/1
        let hi = (prior1 + 1.0) / (prior1 + 2.0);
        let lo = 1.0 / (prior0 + 2.0);
        let targets: Vec<f64> = labels
            .iter()
            .map(|l| if *l == Label::Spam { hi } else { lo })
            .collect();

        let objective = |a: f64, b: f64| -> f64 {
            decisions
                .iter()
                .zip(&targets)
                .map(|(f, t)| {
                    let fapb = f * a + b;
                    if fapb >= 0.0 {
                        t * fapb + (1.0 + (-fapb).exp()).ln()
                    } else {
                        (t - 1.0) * fapb + (1.0 + fapb.exp()).ln()
                    }
                })
                .sum()
        };

        let mut a = 0.0;
        let mut b = ((prior0 + 1.0) / (prior1 + 1.0)).ln();
        let mut fval = objective(a, b);

        for _ in 0..Self::MAX_ITERATIONS {
            let (mut h11, mut h22, mut h21) = (Self::SIGMA, Self::SIGMA, 0.0);
            let (mut g1, mut g2) = (0.0, 0.0);

            for (f, t) in decisions.iter().zip(&targets) {
                let fapb = f * a + b;
                let (p, q) = if fapb >= 0.0 {
                    let e = (-fapb).exp();
                    (e / (1.0 + e), 1.0 / (1.0 + e))
                } else {
                    let e = fapb.exp();
                    (1.0 / (1.0 + e), e / (1.0 + e))
                };
                let d2 = p * q;
                h11 += f * f * d2;
                h22 += d2;
                h21 += f * d2;
                let d1 = t - p;
                g1 += f * d1;
                g2 += d1;
            }

            if g1.abs() < Self::EPSILON && g2.abs() < Self::EPSILON {
                break;
            }

            let det = h11 * h22 - h21 * h21;
            let da = -(h22 * g1 - h21 * g2) / det;
            let db = -(-h21 * g1 + h11 * g2) / det;
            let gd = g1 * da + g2 * db;

            let mut step = 1.0;
            while step >= Self::MIN_STEP {
                let (new_a, new_b) = (a + step * da, b + step * db);
                let new_f = objective(new_a, new_b);
                if new_f < fval + 1e-4 * step * gd {
                    a = new_a;
                    b = new_b;
                    fval = new_f;
                    break;
                }
                step /= 2.0;
            }
            if step < Self::MIN_STEP {
                break;
            }
        }

        Self { a, b }
    }

    /// Spam probability for a decision value
    pub fn probability(&self, decision: f64) -> f64 {
        sigmoid(-(self.a * decision + self.b))
    }
}

/// Run `f` and return its result along with the elapsed milliseconds
pub fn measure_execution_time<F, T>(f: F) -> (T, f64)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let result = f();
    let duration_ms = start.elapsed().as_secs_f64() * 1000.0;

    (result, duration_ms)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sigmoid_is_stable() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-12);
        assert!(sigmoid(800.0) <= 1.0);
        assert!(sigmoid(-800.0) >= 0.0);
        assert!(!sigmoid(-800.0).is_nan());
    }

    #[test]
    fn test_platt_scaler_is_monotone() {
        let decisions = vec![-2.0, -1.5, -1.0, -0.5, 0.4, 1.0, 1.5, 2.2];
        let labels = vec![
            Label::Ham, Label::Ham, Label::Ham, Label::Ham,
            Label::Spam, Label::Spam, Label::Spam, Label::Spam,
        ];
        let platt = PlattScaler::fit(&decisions, &labels);

        assert!(platt.a < 0.0);
        assert!(platt.probability(2.0) > 0.5);
        assert!(platt.probability(-2.0) < 0.5);
        assert!(platt.probability(1.0) > platt.probability(-1.0));
    }

    #[test]
    fn test_train_sgd_separates_simple_data() {
        let features = vec![
            SparseVector::from_pairs(vec![(0, 1.0)]),
            SparseVector::from_pairs(vec![(0, 1.0), (2, 0.5)]),
            SparseVector::from_pairs(vec![(1, 1.0)]),
            SparseVector::from_pairs(vec![(1, 1.0), (2, 0.5)]),
        ];
        let labels = vec![Label::Spam, Label::Spam, Label::Ham, Label::Ham];
        let params = SgdParams {
            loss: Loss::Hinge,
            alpha: 1e-4,
            learning_rate: LearningRate::Optimal,
            epochs: 20,
            seed: 7,
        };

        let model = train_sgd(&features, &labels, &params);
        for (x, y) in features.iter().zip(&labels) {
            assert_eq!(model.predict(x), *y);
        }
    }

    #[test]
    fn test_measure_execution_time() {
        let (value, ms) = measure_execution_time(|| 21 * 2);
        assert_eq!(value, 42);
        assert!(ms >= 0.0);
    }
}
