use std::path::PathBuf;

use serde::{Serialize, Deserialize};

/// Default location of the labelled message CSV
pub const DEFAULT_DATA_PATH: &str = "data/spam.csv";

/// Settings for the prediction server
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Interface to bind
    pub host: String,
    /// Port to bind
    pub port: u16,
    /// Labelled training data
    pub data_path: PathBuf,
    /// Fraction of rows held out for the startup accuracy check
    pub test_size: f64,
    /// Shuffle seed for the train/test split
    pub seed: u64,
    /// Prediction cache entries; 0 disables the cache
    pub cache_capacity: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 666,
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            test_size: 0.25,
            seed: 77,
            cache_capacity: 1024,
        }
    }
}

impl ServerConfig {
    /// `host:port` string for binding
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Settings for the classifier comparison run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompareConfig {
    pub data_path: PathBuf,
    pub test_size: f64,
    pub seed: u64,
    /// Include the hashing vectorizer in the sweep
    pub hashing: bool,
    /// Optional CSV destination for the score table
    pub output: Option<PathBuf>,
}

impl Default for CompareConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from(DEFAULT_DATA_PATH),
            test_size: 0.33,
            seed: 42,
            hashing: false,
            output: None,
        }
    }
}
