//! Classifier comparison
//!
//! Fits every classifier against every vectorizer on one train/test split and
//! collects the held-out accuracy of each pairing.

use std::fmt::{self, Display};
use std::error::Error;
use std::io::Write;
use std::path::Path;

use log::{info, warn, error};
use serde::{Serialize, Deserialize};

use crate::config::CompareConfig;
use crate::data::{Dataset, DatasetError};
use crate::models::common::measure_execution_time;
use crate::models::{default_classifiers, Classifier};
use crate::text::{CountVectorizer, HashingVectorizer, TfidfVectorizer, Vectorizer};

/// Error type for a comparison run
#[derive(Debug)]
pub enum CompareError {
    Dataset(DatasetError),
    Io(std::io::Error),
    Csv(csv::Error),
}

impl Display for CompareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CompareError::Dataset(e) => write!(f, "Dataset error: {}", e),
            CompareError::Io(e) => write!(f, "IO error: {}", e),
            CompareError::Csv(e) => write!(f, "CSV error: {}", e),
        }
    }
}

impl Error for CompareError {}

impl From<DatasetError> for CompareError {
    fn from(e: DatasetError) -> Self {
        CompareError::Dataset(e)
    }
}

impl From<std::io::Error> for CompareError {
    fn from(e: std::io::Error) -> Self {
        CompareError::Io(e)
    }
}

impl From<csv::Error> for CompareError {
    fn from(e: csv::Error) -> Self {
        CompareError::Csv(e)
    }
}

/// Result of one classifier/vectorizer pairing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRow {
    pub classifier: String,
    pub vectorizer: String,
    /// Held-out accuracy, absent when the pairing failed
    pub score: Option<f64>,
    /// Time spent vectorizing and fitting, in milliseconds
    pub fit_ms: f64,
    /// Time spent transforming and scoring the test set, in milliseconds
    pub score_ms: f64,
    pub error: Option<String>,
}

impl Display for ScoreRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "classifier    {}", self.classifier)?;
        writeln!(f, "vectorizer    {}", self.vectorizer)?;
        match (&self.score, &self.error) {
            (Some(score), _) => writeln!(f, "score         {:.6}", score)?,
            (None, Some(err)) => writeln!(f, "error         {}", err)?,
            (None, None) => writeln!(f, "score         -")?,
        }
        write!(f, "fit/score ms  {:.1} / {:.1}", self.fit_ms, self.score_ms)
    }
}

/// Collected comparison results, in evaluation order
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreTable {
    pub rows: Vec<ScoreRow>,
}

impl ScoreTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Rows ordered best score first; failed pairings last
    pub fn ranked(&self) -> Vec<&ScoreRow> {
        let mut rows: Vec<&ScoreRow> = self.rows.iter().collect();
        rows.sort_by(|a, b| {
            let key = |r: &ScoreRow| r.score.unwrap_or(f64::NEG_INFINITY);
            key(b).total_cmp(&key(a))
        });
        rows
    }

    /// Best-scoring pairing, if any succeeded
    pub fn best(&self) -> Option<&ScoreRow> {
        self.ranked().into_iter().find(|r| r.score.is_some())
    }

    /// Write the table as CSV with a leading index column
    pub fn write_csv<P: AsRef<Path>>(&self, path: P) -> Result<(), CompareError> {
        let path = path.as_ref();
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(["", "classifier", "vectorizer", "score", "fit_ms", "score_ms", "error"])?;
        for (i, row) in self.rows.iter().enumerate() {
            writer.write_record([
                i.to_string(),
                row.classifier.clone(),
                row.vectorizer.clone(),
                row.score.map(|s| s.to_string()).unwrap_or_default(),
                format!("{:.3}", row.fit_ms),
                format!("{:.3}", row.score_ms),
                row.error.clone().unwrap_or_default(),
            ])?;
        }
        writer.flush()?;
        info!("Saved Output to {}", path.display());
        Ok(())
    }
}

impl Display for ScoreTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<4} {:<30} {:<18} {:>9}", "", "classifier", "vectorizer", "score")?;
        for (i, row) in self.ranked().iter().enumerate() {
            let score = row.score.map(|s| format!("{:.6}", s)).unwrap_or_else(|| "failed".to_string());
            writeln!(f, "{:<4} {:<30} {:<18} {:>9}", i, row.classifier, row.vectorizer, score)?;
        }
        Ok(())
    }
}

fn evaluate_pair(
    classifier: &mut dyn Classifier,
    vectorizer: &mut dyn Vectorizer,
    train: &Dataset,
    test: &Dataset,
) -> ScoreRow {
    let train_messages = train.messages();
    let train_labels = train.labels();

    let (fitted, fit_ms) = measure_execution_time(|| -> Result<(), Box<dyn Error>> {
        let features = vectorizer.fit_transform(&train_messages)?;
        classifier.fit(&features, &train_labels)?;
        Ok(())
    });

    let (scored, score_ms) = match fitted {
        Ok(()) => {
            let (result, ms) = measure_execution_time(|| -> Result<f64, Box<dyn Error>> {
                let features = vectorizer.transform_all(&test.messages())?;
                Ok(classifier.score(&features, &test.labels())?)
            });
            (result, ms)
        }
        Err(e) => (Err(e), 0.0),
    };

    let (score, error) = match scored {
        Ok(score) => (Some(score), None),
        Err(e) => (None, Some(e.to_string())),
    };

    ScoreRow {
        classifier: classifier.name().to_string(),
        vectorizer: vectorizer.name().to_string(),
        score,
        fit_ms,
        score_ms,
        error,
    }
}

/// Fit and score every classifier against every vectorizer.
///
/// A failing pairing is recorded with its error and the sweep continues.
pub fn performance<W: Write>(
    classifiers: &mut [Box<dyn Classifier>],
    vectorizers: &mut [Box<dyn Vectorizer>],
    train: &Dataset,
    test: &Dataset,
    out: &mut W,
) -> Result<ScoreTable, CompareError> {
    let mut table = ScoreTable::default();

    for classifier in classifiers.iter_mut() {
        for vectorizer in vectorizers.iter_mut() {
            let row = evaluate_pair(classifier.as_mut(), vectorizer.as_mut(), train, test);

            match (&row.score, &row.error) {
                (Some(score), _) => info!(
                    "{} + {}: {:.4} (fit {:.1} ms)",
                    row.classifier, row.vectorizer, score, row.fit_ms
                ),
                (None, Some(err)) => warn!("{} + {} failed: {}", row.classifier, row.vectorizer, err),
                (None, None) => {}
            }

            writeln!(out, "{}", row)?;
            writeln!(out)?;
            table.rows.push(row);
        }
    }

    Ok(table)
}

/// The vectorizers compared by default
pub fn default_vectorizers(hashing: bool) -> Vec<Box<dyn Vectorizer>> {
    let mut vectorizers: Vec<Box<dyn Vectorizer>> = vec![
        Box::new(CountVectorizer::new()),
        Box::new(TfidfVectorizer::new()),
    ];
    if hashing {
        vectorizers.push(Box::new(HashingVectorizer::default()));
    }
    vectorizers
}

/// Load, split and compare, narrating progress to `out`
pub fn run<W: Write>(config: &CompareConfig, out: &mut W) -> Result<ScoreTable, CompareError> {
    let data = Dataset::from_csv(&config.data_path)?;
    writeln!(out, "Data Loaded...")?;
    writeln!(out, "Preprocessing data...")?;
    writeln!(out, "{:<6} {}", "label", "message")?;
    for row in data.head(5) {
        writeln!(out, "{:<6} {}", row.label, row.message)?;
    }

    writeln!(out, "Splitting data...")?;
    let (train, test) = data.train_test_split(config.test_size, config.seed)?;
    writeln!(out, "Training Set:  {}", train.len())?;
    writeln!(out, "Testing Set:  {}", test.len())?;

    writeln!(out, "Measuring Model Performances...")?;
    let mut classifiers = default_classifiers();
    let mut vectorizers = default_vectorizers(config.hashing);
    let table = performance(&mut classifiers, &mut vectorizers, &train, &test, out)?;

    write!(out, "{}", table)?;
    match table.best() {
        Some(best) => info!(
            "Best pairing: {} + {} ({:.4})",
            best.classifier, best.vectorizer, best.score.unwrap_or_default()
        ),
        None => error!("Every classifier/vectorizer pairing failed"),
    }

    if let Some(path) = &config.output {
        table.write_csv(path)?;
    }
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Label;
    use crate::models::{DummyClassifier, MultinomialNB};

    fn corpus() -> Dataset {
        let spam = [
            "WINNER claim your free prize now",
            "Free entry to win cash prize call now",
            "Urgent you have won a free holiday call",
            "Claim free cash now text WIN",
            "Congratulations you won a prize claim now",
            "Free ringtone text win now",
        ];
        let ham = [
            "Are we meeting for lunch tomorrow",
            "I will call you when I get home",
            "Can you pick up milk on the way",
            "See you at the meeting tomorrow morning",
            "Thanks for dinner last night",
            "Running late be home soon",
        ];
        Dataset::from_records(
            spam.iter().map(|m| (Label::Spam, *m)).chain(ham.iter().map(|m| (Label::Ham, *m))),
        )
    }

    #[test]
    fn test_performance_covers_every_pair() {
        let data = corpus();
        let mut classifiers: Vec<Box<dyn Classifier>> =
            vec![Box::new(MultinomialNB::default()), Box::new(DummyClassifier::new())];
        let mut vectorizers = default_vectorizers(true);
        let mut out = Vec::new();

        let table = performance(&mut classifiers, &mut vectorizers, &data, &data, &mut out).unwrap();

        assert_eq!(table.len(), 6);
        assert!(table.rows.iter().all(|r| r.score.is_some()));
        let best = table.best().unwrap();
        assert_eq!(best.classifier, "MultinomialNB");
        assert!(String::from_utf8(out).unwrap().contains("TfidfVectorizer"));
    }

    #[test]
    fn test_failed_pair_is_recorded() {
        let data = corpus();
        let single_class = Dataset::from_records(vec![(Label::Ham, "only ham here")]);
        let mut classifiers: Vec<Box<dyn Classifier>> = vec![Box::new(crate::models::LinearSvc::default())];
        let mut vectorizers = default_vectorizers(false);
        let mut out = Vec::new();

        let table = performance(&mut classifiers, &mut vectorizers, &single_class, &data, &mut out).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows.iter().all(|r| r.score.is_none() && r.error.is_some()));
        assert!(table.best().is_none());
    }

    #[test]
    fn test_run_writes_csv() {
        let dir = tempfile::tempdir().unwrap();
        let data_path = dir.path().join("spam.csv");
        let mut csv = String::from("v1,v2,,,\n");
        for row in corpus().rows() {
            csv.push_str(&format!("{},{},,,\n", row.label, row.message));
        }
        std::fs::write(&data_path, csv).unwrap();

        let config = CompareConfig {
            data_path,
            test_size: 0.33,
            seed: 42,
            hashing: false,
            output: Some(dir.path().join("scores.csv")),
        };
        let mut out = Vec::new();
        let table = run(&config, &mut out).unwrap();

        assert_eq!(table.len(), 20);
        let printed = String::from_utf8(out).unwrap();
        assert!(printed.contains("Training Set:  8"));
        assert!(printed.contains("Testing Set:  4"));

        let written = std::fs::read_to_string(dir.path().join("scores.csv")).unwrap();
        assert_eq!(written.lines().count(), 21);
    }
}
