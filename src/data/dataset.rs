use std::fmt::{self, Display};
use std::error::Error;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use log::{info, debug};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Serialize, Deserialize};

/// Binary message label
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Label {
    /// Legitimate message
    Ham,
    /// Unsolicited message
    Spam,
}

impl Label {
    /// Class order used by probability vectors
    pub const ALL: [Label; 2] = [Label::Ham, Label::Spam];

    pub fn as_str(&self) -> &'static str {
        match self {
            Label::Ham => "ham",
            Label::Spam => "spam",
        }
    }

    /// Position in `Label::ALL`
    pub fn index(&self) -> usize {
        match self {
            Label::Ham => 0,
            Label::Spam => 1,
        }
    }

    /// Signed target used by linear models: spam is +1
    pub fn sign(&self) -> f64 {
        match self {
            Label::Ham => -1.0,
            Label::Spam => 1.0,
        }
    }

    pub fn from_sign(value: f64) -> Label {
        if value > 0.0 {
            Label::Spam
        } else {
            Label::Ham
        }
    }

    pub fn parse(value: &str) -> Option<Label> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ham" => Some(Label::Ham),
            "spam" => Some(Label::Spam),
            _ => None,
        }
    }
}

impl Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for dataset loading and splitting
#[derive(Debug)]
pub enum DatasetError {
    /// Underlying file error
    Io(std::io::Error),
    /// Malformed CSV
    Csv(csv::Error),
    /// A label other than ham/spam
    UnknownLabel { row: usize, value: String },
    /// A row without a label or message cell
    MissingField { row: usize, field: &'static str },
    /// The file contained no data rows
    Empty,
    /// Split parameters that would leave one side empty
    InvalidSplit(String),
}

impl Display for DatasetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatasetError::Io(e) => write!(f, "IO error: {}", e),
            DatasetError::Csv(e) => write!(f, "CSV error: {}", e),
            DatasetError::UnknownLabel { row, value } => {
                write!(f, "Unknown label '{}' on row {}", value, row)
            }
            DatasetError::MissingField { row, field } => {
                write!(f, "Row {} has no {} field", row, field)
            }
            DatasetError::Empty => write!(f, "Dataset contains no rows"),
            DatasetError::InvalidSplit(msg) => write!(f, "Invalid split: {}", msg),
        }
    }
}

impl Error for DatasetError {}

impl From<std::io::Error> for DatasetError {
    fn from(e: std::io::Error) -> Self {
        DatasetError::Io(e)
    }
}

impl From<csv::Error> for DatasetError {
    fn from(e: csv::Error) -> Self {
        DatasetError::Csv(e)
    }
}

/// One labelled message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LabelledMessage {
    pub label: Label,
    pub message: String,
}

/// In-memory labelled message collection
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    rows: Vec<LabelledMessage>,
}

// Header names recognised for the two data columns
const LABEL_HEADERS: [&str; 2] = ["v1", "label"];
const MESSAGE_HEADERS: [&str; 2] = ["v2", "message"];

/// Each byte is one Latin-1 code point
fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

impl Dataset {
    /// Build a dataset from `(label, message)` pairs
    pub fn from_records<S: Into<String>>(records: impl IntoIterator<Item = (Label, S)>) -> Self {
        Self {
            rows: records
                .into_iter()
                .map(|(label, message)| LabelledMessage { label, message: message.into() })
                .collect(),
        }
    }

    /// Load a labelled CSV file from disk
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self, DatasetError> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let dataset = Self::from_reader(file)?;
        info!(
            "Loaded {} messages from {} ({} spam, {} ham)",
            dataset.len(),
            path.display(),
            dataset.count(Label::Spam),
            dataset.count(Label::Ham)
        );
        Ok(dataset)
    }

    /// Parse a labelled CSV stream with a header row.
    ///
    /// Columns are found by header name (`v1`/`label`, `v2`/`message`), otherwise
    /// the first two columns are used. Any further columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DatasetError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .byte_headers()?
            .iter()
            .map(|h| decode_latin1(h).trim().to_ascii_lowercase())
            .collect();
        let find = |names: &[&str], fallback: usize| {
            headers
                .iter()
                .position(|h| names.contains(&h.as_str()))
                .unwrap_or(fallback)
        };
        let label_col = find(&LABEL_HEADERS, 0);
        let message_col = find(&MESSAGE_HEADERS, 1);
        debug!("Dataset columns: label={}, message={}", label_col, message_col);

        let mut rows = Vec::new();
        for (i, record) in csv_reader.byte_records().enumerate() {
            let record = record?;
            // Header is line 1
            let row = i + 2;

            let raw_label = record
                .get(label_col)
                .map(decode_latin1)
                .ok_or(DatasetError::MissingField { row, field: "label" })?;
            let message = record
                .get(message_col)
                .map(decode_latin1)
                .ok_or(DatasetError::MissingField { row, field: "message" })?;

            let label = Label::parse(&raw_label)
                .ok_or(DatasetError::UnknownLabel { row, value: raw_label.clone() })?;
            rows.push(LabelledMessage { label, message });
        }

        if rows.is_empty() {
            return Err(DatasetError::Empty);
        }
        Ok(Self { rows })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[LabelledMessage] {
        &self.rows
    }

    /// First `n` rows
    pub fn head(&self, n: usize) -> &[LabelledMessage] {
        &self.rows[..n.min(self.rows.len())]
    }

    /// Number of rows carrying `label`
    pub fn count(&self, label: Label) -> usize {
        self.rows.iter().filter(|r| r.label == label).count()
    }

    pub fn messages(&self) -> Vec<&str> {
        self.rows.iter().map(|r| r.message.as_str()).collect()
    }

    pub fn labels(&self) -> Vec<Label> {
        self.rows.iter().map(|r| r.label).collect()
    }

    /// Shuffle with a seeded RNG and split off `ceil(test_size * n)` rows for testing.
    ///
    /// Returns `(train, test)`.
    pub fn train_test_split(&self, test_size: f64, seed: u64) -> Result<(Dataset, Dataset), DatasetError> {
        if !(test_size > 0.0 && test_size < 1.0) {
            return Err(DatasetError::InvalidSplit(format!(
                "test_size must be between 0 and 1, got {}", test_size
            )));
        }

        let n = self.rows.len();
        let n_test = (test_size * n as f64).ceil() as usize;
        if n_test == 0 || n_test >= n {
            return Err(DatasetError::InvalidSplit(format!(
                "test_size {} leaves an empty side for {} rows", test_size, n
            )));
        }

        let mut order: Vec<usize> = (0..n).collect();
        let mut rng = StdRng::seed_from_u64(seed);
        order.shuffle(&mut rng);

        let pick = |indices: &[usize]| Dataset {
            rows: indices.iter().map(|&i| self.rows[i].clone()).collect(),
        };
        let test = pick(&order[..n_test]);
        let train = pick(&order[n_test..]);

        debug!("Split {} rows into {} train / {} test (seed {})", n, train.len(), test.len(), seed);
        Ok((train, test))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &[u8] = b"v1,v2,,,\n\
ham,\"Go until jurong point, crazy..\",,,\n\
spam,Free entry in 2 a wkly comp,,,\n\
ham,Ok lar... Joking wif u oni...,,,\n";

    #[test]
    fn test_from_reader_drops_extra_columns() {
        let dataset = Dataset::from_reader(SAMPLE).unwrap();
        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.rows()[0].message, "Go until jurong point, crazy..");
        assert_eq!(dataset.rows()[1].label, Label::Spam);
        assert_eq!(dataset.count(Label::Ham), 2);
    }

    #[test]
    fn test_latin1_bytes_decode() {
        let data: &[u8] = b"label,message\nspam,Win \xa3100 now\n";
        let dataset = Dataset::from_reader(data).unwrap();
        assert_eq!(dataset.rows()[0].message, "Win \u{a3}100 now");
    }

    #[test]
    fn test_unknown_label() {
        let data: &[u8] = b"v1,v2\nham,hello\neggs,bacon\n";
        match Dataset::from_reader(data) {
            Err(DatasetError::UnknownLabel { row, value }) => {
                assert_eq!(row, 3);
                assert_eq!(value, "eggs");
            }
            other => panic!("expected UnknownLabel, got {:?}", other),
        }
    }

    #[test]
    fn test_empty_file() {
        let data: &[u8] = b"v1,v2\n";
        assert!(matches!(Dataset::from_reader(data), Err(DatasetError::Empty)));
    }

    #[test]
    fn test_from_csv_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE).unwrap();
        let dataset = Dataset::from_csv(file.path()).unwrap();
        assert_eq!(dataset.head(2).len(), 2);
        assert_eq!(dataset.head(10).len(), 3);
    }

    #[test]
    fn test_train_test_split_is_deterministic() {
        let dataset = Dataset::from_records(
            (0..20).map(|i| (if i % 4 == 0 { Label::Spam } else { Label::Ham }, format!("message {}", i))),
        );

        let (train, test) = dataset.train_test_split(0.25, 77).unwrap();
        assert_eq!(test.len(), 5);
        assert_eq!(train.len(), 15);

        let (train_again, test_again) = dataset.train_test_split(0.25, 77).unwrap();
        assert_eq!(train, train_again);
        assert_eq!(test, test_again);

        // Every row lands on exactly one side
        let mut all: Vec<String> = train.messages().iter().chain(test.messages().iter()).map(|s| s.to_string()).collect();
        all.sort();
        all.dedup();
        assert_eq!(all.len(), 20);
    }

    #[test]
    fn test_invalid_split() {
        let dataset = Dataset::from_records(vec![(Label::Ham, "a"), (Label::Spam, "b")]);
        assert!(dataset.train_test_split(0.0, 1).is_err());
        assert!(dataset.train_test_split(1.5, 1).is_err());
        assert!(dataset.train_test_split(0.99, 1).is_err());
    }
}
