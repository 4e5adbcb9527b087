use serde::{Serialize, Serializer};
use chrono::{DateTime, Utc};

use crate::models::Probabilities;
use crate::web::model::TrainingSummary;

/// A response field that is serialized as `""` when it holds no value
#[derive(Debug, Clone, PartialEq)]
pub enum Slot<T> {
    Empty,
    Filled(T),
}

impl<T> Default for Slot<T> {
    fn default() -> Self {
        Slot::Empty
    }
}

impl<T: Serialize> Serialize for Slot<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Slot::Empty => serializer.serialize_str(""),
            Slot::Filled(value) => value.serialize(serializer),
        }
    }
}

/// Prediction endpoint response
#[derive(Debug, Clone, Default, Serialize)]
pub struct PredictResponse {
    pub message: String,
    pub predict: Slot<Vec<String>>,
    pub predict_proba: Slot<Vec<Probabilities>>,
    pub error: String,
}

/// Server status response
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    pub started_at: DateTime<Utc>,
    pub uptime_seconds: i64,
    pub model: TrainingSummary,
    pub cache_capacity: usize,
    pub cached_predictions: usize,
}
