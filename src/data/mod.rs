//! Labelled message datasets

pub mod dataset;

pub use dataset::{Dataset, DatasetError, Label, LabelledMessage};
