use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::{self, Display};
use std::error::Error;

use log::debug;
use serde::{Serialize, Deserialize};

use crate::text::sparse::SparseVector;
use crate::text::tokenize::tokenize;

/// Number of hashed features used when none is configured
pub const DEFAULT_HASHED_FEATURES: usize = 1 << 20;

/// Error type for vectorizer operations
#[derive(Debug, Clone, PartialEq)]
pub enum VectorizerError {
    /// `transform` was called before `fit`
    NotFitted(String),
    /// Training documents contained no tokens at all
    EmptyVocabulary,
    /// Invalid construction parameter
    InvalidParameter(String),
}

impl VectorizerError {
    /// Short name of the error variant
    pub fn kind(&self) -> &'static str {
        match self {
            VectorizerError::NotFitted(_) => "NotFitted",
            VectorizerError::EmptyVocabulary => "EmptyVocabulary",
            VectorizerError::InvalidParameter(_) => "InvalidParameter",
        }
    }
}

impl Display for VectorizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VectorizerError::NotFitted(name) => write!(f, "{} is not fitted yet", name),
            VectorizerError::EmptyVocabulary => {
                write!(f, "empty vocabulary; the documents contain no tokens")
            }
            VectorizerError::InvalidParameter(msg) => write!(f, "Invalid parameter: {}", msg),
        }
    }
}

impl Error for VectorizerError {}

/// Turns raw text into sparse feature vectors
pub trait Vectorizer: Send + Sync {
    /// Display name used in score tables
    fn name(&self) -> &str;

    /// Learn whatever state the vectorizer needs from the training documents
    fn fit(&mut self, documents: &[&str]) -> Result<(), VectorizerError>;

    /// Vectorize a single document
    fn transform(&self, document: &str) -> Result<SparseVector, VectorizerError>;

    /// Dimensionality of the produced vectors
    fn n_features(&self) -> usize;

    /// Fit on `documents` and return their vectors
    fn fit_transform(&mut self, documents: &[&str]) -> Result<Vec<SparseVector>, VectorizerError> {
        self.fit(documents)?;
        self.transform_all(documents)
    }

    /// Vectorize every document
    fn transform_all(&self, documents: &[&str]) -> Result<Vec<SparseVector>, VectorizerError> {
        documents.iter().map(|doc| self.transform(doc)).collect()
    }
}

fn build_vocabulary(documents: &[&str]) -> Result<BTreeMap<String, usize>, VectorizerError> {
    let terms: BTreeSet<String> = documents
        .iter()
        .flat_map(|doc| tokenize(doc))
        .collect();

    if terms.is_empty() {
        return Err(VectorizerError::EmptyVocabulary);
    }

    Ok(terms
        .into_iter()
        .enumerate()
        .map(|(index, term)| (term, index))
        .collect())
}

fn count_terms(vocabulary: &BTreeMap<String, usize>, document: &str) -> HashMap<usize, f64> {
    let mut counts: HashMap<usize, f64> = HashMap::new();
    for token in tokenize(document) {
        if let Some(&index) = vocabulary.get(&token) {
            *counts.entry(index).or_insert(0.0) += 1.0;
        }
    }
    counts
}

/// Raw term counts over a learned vocabulary
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CountVectorizer {
    /// Term to column index, sorted by term
    vocabulary: Option<BTreeMap<String, usize>>,
}

impl CountVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Learned vocabulary, if fitted
    pub fn vocabulary(&self) -> Option<&BTreeMap<String, usize>> {
        self.vocabulary.as_ref()
    }
}

impl Vectorizer for CountVectorizer {
    fn name(&self) -> &str {
        "CountVectorizer"
    }

    fn fit(&mut self, documents: &[&str]) -> Result<(), VectorizerError> {
        let vocabulary = build_vocabulary(documents)?;
        debug!("CountVectorizer learned {} terms from {} documents", vocabulary.len(), documents.len());
        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    fn transform(&self, document: &str) -> Result<SparseVector, VectorizerError> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or_else(|| VectorizerError::NotFitted(self.name().to_string()))?;

        Ok(SparseVector::from_pairs(
            count_terms(vocabulary, document).into_iter().collect(),
        ))
    }

    fn n_features(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, |v| v.len())
    }
}

/// Term counts weighted by smoothed inverse document frequency, L2-normalised
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    vocabulary: Option<BTreeMap<String, usize>>,
    /// Inverse document frequency per column
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn vocabulary(&self) -> Option<&BTreeMap<String, usize>> {
        self.vocabulary.as_ref()
    }

    /// Learned idf weight of `term`
    pub fn idf_of(&self, term: &str) -> Option<f64> {
        let index = *self.vocabulary.as_ref()?.get(term)?;
        self.idf.get(index).copied()
    }
}

impl Vectorizer for TfidfVectorizer {
    fn name(&self) -> &str {
        "TfidfVectorizer"
    }

    fn fit(&mut self, documents: &[&str]) -> Result<(), VectorizerError> {
        let vocabulary = build_vocabulary(documents)?;

        let mut document_frequency = vec![0usize; vocabulary.len()];
        for doc in documents {
            for index in count_terms(&vocabulary, doc).keys() {
                document_frequency[*index] += 1;
            }
        }

        // Smoothed idf: every term behaves as if it appeared in one extra document
        let n = documents.len() as f64;
        self.idf = document_frequency
            .iter()
            .map(|&df| ((1.0 + n) / (1.0 + df as f64)).ln() + 1.0)
            .collect();

        debug!("TfidfVectorizer learned {} terms from {} documents", vocabulary.len(), documents.len());
        self.vocabulary = Some(vocabulary);
        Ok(())
    }

    fn transform(&self, document: &str) -> Result<SparseVector, VectorizerError> {
        let vocabulary = self
            .vocabulary
            .as_ref()
            .ok_or_else(|| VectorizerError::NotFitted(self.name().to_string()))?;

        let pairs = count_terms(vocabulary, document)
            .into_iter()
            .map(|(index, count)| (index, count * self.idf[index]))
            .collect();

        let mut vector = SparseVector::from_pairs(pairs);
        vector.l2_normalize();
        Ok(vector)
    }

    fn n_features(&self) -> usize {
        self.vocabulary.as_ref().map_or(0, |v| v.len())
    }
}

/// Stateless feature hashing with alternating signs, L2-normalised
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "HashingParams")]
pub struct HashingVectorizer {
    n_features: usize,
}

/// Serialized form of `HashingVectorizer`, validated through `new`
#[derive(Deserialize)]
struct HashingParams {
    n_features: usize,
}

impl TryFrom<HashingParams> for HashingVectorizer {
    type Error = VectorizerError;

    fn try_from(params: HashingParams) -> Result<Self, Self::Error> {
        Self::new(params.n_features)
    }
}

impl HashingVectorizer {
    pub fn new(n_features: usize) -> Result<Self, VectorizerError> {
        if n_features == 0 {
            return Err(VectorizerError::InvalidParameter(
                "n_features must be positive".to_string(),
            ));
        }
        Ok(Self { n_features })
    }

    fn bucket(&self, token: &str) -> (usize, f64) {
        let digest = md5::compute(token.as_bytes());
        let hash = u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]);
        let sign = if digest[4] & 1 == 0 { 1.0 } else { -1.0 };
        (hash as usize % self.n_features, sign)
    }
}

impl Default for HashingVectorizer {
    fn default() -> Self {
        Self { n_features: DEFAULT_HASHED_FEATURES }
    }
}

impl Vectorizer for HashingVectorizer {
    fn name(&self) -> &str {
        "HashingVectorizer"
    }

    fn fit(&mut self, _documents: &[&str]) -> Result<(), VectorizerError> {
        Ok(())
    }

    fn transform(&self, document: &str) -> Result<SparseVector, VectorizerError> {
        let pairs = tokenize(document)
            .iter()
            .map(|token| self.bucket(token))
            .collect();

        let mut vector = SparseVector::from_pairs(pairs);
        vector.l2_normalize();
        Ok(vector)
    }

    fn n_features(&self) -> usize {
        self.n_features
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCS: [&str; 3] = [
        "free prize call now",
        "call me when you get home",
        "free free entry",
    ];

    #[test]
    fn test_count_vectorizer() {
        let mut vec = CountVectorizer::new();
        let rows = vec.fit_transform(&DOCS).unwrap();

        let vocab = vec.vocabulary().unwrap();
        assert_eq!(vec.n_features(), 10);
        // Vocabulary indices follow alphabetical order
        assert_eq!(vocab["call"], 0);
        assert_eq!(rows[2].get(vocab["free"]), 2.0);
        assert_eq!(rows[2].get(vocab["entry"]), 1.0);

        let unseen = vec.transform("totally unseen words").unwrap();
        assert!(unseen.is_empty());
    }

    #[test]
    fn test_tfidf_weights() {
        let mut vec = TfidfVectorizer::new();
        let rows = vec.fit_transform(&DOCS).unwrap();

        // "call" and "free" occur in two of three documents
        let expected_common = (4.0f64 / 3.0).ln() + 1.0;
        let expected_rare = (4.0f64 / 2.0).ln() + 1.0;
        assert!((vec.idf_of("call").unwrap() - expected_common).abs() < 1e-12);
        assert!((vec.idf_of("prize").unwrap() - expected_rare).abs() < 1e-12);

        for row in &rows {
            assert!((row.squared_norm() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_transform_before_fit() {
        let vec = TfidfVectorizer::new();
        assert_eq!(
            vec.transform("hello there"),
            Err(VectorizerError::NotFitted("TfidfVectorizer".to_string()))
        );
    }

    #[test]
    fn test_empty_vocabulary() {
        let mut vec = CountVectorizer::new();
        assert_eq!(vec.fit(&["a b c", "!!"]), Err(VectorizerError::EmptyVocabulary));
    }

    #[test]
    fn test_hashing_is_deterministic() {
        let vec = HashingVectorizer::new(1 << 10).unwrap();
        let a = vec.transform("free prize call now").unwrap();
        let b = vec.transform("now call prize free").unwrap();
        assert_eq!(a, b);
        assert!(a.max_index().unwrap() < 1 << 10);
        assert!(HashingVectorizer::new(0).is_err());
    }

    #[test]
    fn test_hashing_deserialize_validates_width() {
        assert!(serde_json::from_str::<HashingVectorizer>(r#"{"n_features":0}"#).is_err());

        let vec: HashingVectorizer = serde_json::from_str(r#"{"n_features":16}"#).unwrap();
        assert_eq!(vec.n_features(), 16);
        assert!(vec.transform("free prize").unwrap().max_index().unwrap() < 16);
    }
}
