use log::debug;
use serde::{Serialize, Deserialize};

use crate::data::Label;
use crate::models::classifier::{
    check_training_set, feature_dimension, Classifier, ClassifierError, Probabilities,
};
use crate::models::common::{binary_probabilities, EpochOrder, LinearModel, PlattScaler};
use crate::text::SparseVector;

/// Settings for `LinearSvc`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SvcParams {
    /// Penalty on margin violations
    pub c: f64,
    /// Upper bound on passes over the data
    pub max_epochs: usize,
    /// Stop once the projected-gradient spread falls below this
    pub tolerance: f64,
    /// Fit a Platt sigmoid so `predict_proba` is available
    pub probability: bool,
    pub seed: u64,
}

impl Default for SvcParams {
    fn default() -> Self {
        Self {
            c: 1.0,
            max_epochs: 1000,
            tolerance: 0.1,
            probability: false,
            seed: 0,
        }
    }
}

/// Linear-kernel support vector machine.
///
/// Trained in the dual by coordinate descent on the hinge loss, with the
/// intercept folded in as a constant feature. With `probability` set, a
/// Platt sigmoid is fitted on the training decision values.
#[derive(Debug, Clone)]
pub struct LinearSvc {
    params: SvcParams,
    model: Option<LinearModel>,
    platt: Option<PlattScaler>,
}

impl LinearSvc {
    pub fn new(params: SvcParams) -> Result<Self, ClassifierError> {
        if params.c <= 0.0 {
            return Err(ClassifierError::InvalidParameter("C must be positive".to_string()));
        }
        Ok(Self { params, model: None, platt: None })
    }

    /// Default settings with probability estimates enabled
    pub fn with_probability() -> Self {
        Self {
            params: SvcParams { probability: true, ..SvcParams::default() },
            model: None,
            platt: None,
        }
    }

    fn fitted(&self) -> Result<&LinearModel, ClassifierError> {
        self.model
            .as_ref()
            .ok_or_else(|| ClassifierError::NotFitted(self.name().to_string()))
    }

    /// Signed margin of one sample
    pub fn decision_function(&self, features: &SparseVector) -> Result<f64, ClassifierError> {
        Ok(self.fitted()?.decision(features))
    }

    fn solve_dual(&self, features: &[SparseVector], labels: &[Label]) -> LinearModel {
        let c = self.params.c;
        let mut model = LinearModel::zeros(feature_dimension(features));
        let mut alpha = vec![0.0; features.len()];
        let diagonal: Vec<f64> = features.iter().map(|x| x.squared_norm() + 1.0).collect();
        let mut order = EpochOrder::new(features.len(), self.params.seed);

        let mut epoch = 0;
        while epoch < self.params.max_epochs {
            let mut max_pg = f64::NEG_INFINITY;
            let mut min_pg = f64::INFINITY;

            for &i in order.shuffled() {
                let x = &features[i];
                let y = labels[i].sign();
                let gradient = y * model.decision(x) - 1.0;

                let projected = if alpha[i] == 0.0 {
                    gradient.min(0.0)
                } else if alpha[i] == c {
                    gradient.max(0.0)
                } else {
                    gradient
                };
                max_pg = max_pg.max(projected);
                min_pg = min_pg.min(projected);

                if projected != 0.0 {
                    let old = alpha[i];
                    alpha[i] = (old - gradient / diagonal[i]).clamp(0.0, c);
                    let delta = (alpha[i] - old) * y;
                    x.add_scaled_to(&mut model.weights, delta);
                    model.bias += delta;
                }
            }

            epoch += 1;
            if max_pg - min_pg <= self.params.tolerance {
                break;
            }
        }

        let support = alpha.iter().filter(|&&a| a > 0.0).count();
        debug!("LinearSvc finished after {} epochs with {} support vectors", epoch, support);
        model
    }
}

impl Default for LinearSvc {
    fn default() -> Self {
        Self { params: SvcParams::default(), model: None, platt: None }
    }
}

impl Classifier for LinearSvc {
    fn name(&self) -> &str {
        "LinearSVC"
    }

    fn fit(&mut self, features: &[SparseVector], labels: &[Label]) -> Result<(), ClassifierError> {
        check_training_set(features, labels)?;
        let model = self.solve_dual(features, labels);

        self.platt = if self.params.probability {
            let decisions: Vec<f64> = features.iter().map(|x| model.decision(x)).collect();
            Some(PlattScaler::fit(&decisions, labels))
        } else {
            None
        };
        self.model = Some(model);
        Ok(())
    }

    fn predict(&self, features: &SparseVector) -> Result<Label, ClassifierError> {
        Ok(self.fitted()?.predict(features))
    }

    fn predict_proba(&self, features: &SparseVector) -> Result<Probabilities, ClassifierError> {
        let decision = self.decision_function(features)?;
        let platt = self
            .platt
            .as_ref()
            .ok_or_else(|| ClassifierError::ProbabilityUnavailable(self.name().to_string()))?;
        Ok(binary_probabilities(platt.probability(decision)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus() -> (Vec<SparseVector>, Vec<Label>) {
        let mut features = Vec::new();
        let mut labels = Vec::new();
        for i in 0..12 {
            let shared = 0.2 + (i % 4) as f64 * 0.1;
            features.push(SparseVector::from_pairs(vec![(0, 1.0), (2 + i % 3, shared)]));
            labels.push(Label::Spam);
            features.push(SparseVector::from_pairs(vec![(1, 1.0), (2 + i % 3, shared)]));
            labels.push(Label::Ham);
        }
        (features, labels)
    }

    #[test]
    fn test_linear_svc_separates() {
        let (features, labels) = corpus();
        let mut svc = LinearSvc::default();
        svc.fit(&features, &labels).unwrap();

        assert_eq!(svc.score(&features, &labels).unwrap(), 1.0);
        assert!(svc.decision_function(&SparseVector::from_pairs(vec![(0, 1.0)])).unwrap() > 0.0);
        assert!(matches!(
            svc.predict_proba(&features[0]),
            Err(ClassifierError::ProbabilityUnavailable(_))
        ));
    }

    #[test]
    fn test_probability_matches_prediction_side() {
        let (features, labels) = corpus();
        let mut svc = LinearSvc::with_probability();
        svc.fit(&features, &labels).unwrap();

        let spam = svc.predict_proba(&SparseVector::from_pairs(vec![(0, 1.0)])).unwrap();
        let ham = svc.predict_proba(&SparseVector::from_pairs(vec![(1, 1.0)])).unwrap();
        assert!(spam[1] > 0.5);
        assert!(ham[0] > 0.5);
        assert!((spam[0] + spam[1] - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_c() {
        let params = SvcParams { c: 0.0, ..SvcParams::default() };
        assert!(LinearSvc::new(params).is_err());
    }
}
