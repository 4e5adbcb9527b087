//! Spam prediction HTTP service
//!
//! Trains a TF-IDF + linear SVM model at startup and answers
//! `GET /?message=...` with the predicted label and class probabilities.

pub mod handlers;
pub mod model;
pub mod models;
pub mod server;

pub use model::{ModelError, Prediction, PredictError, SpamModel};
pub use server::{configure, start_web_server, AppState};
