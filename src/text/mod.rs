//! Text vectorization
//!
//! Tokenization and the bag-of-words vectorizers that turn messages into
//! sparse feature vectors for the classifiers.

pub mod sparse;
pub mod tokenize;
pub mod vectorizer;

pub use sparse::SparseVector;
pub use vectorizer::{
    CountVectorizer, HashingVectorizer, TfidfVectorizer, Vectorizer, VectorizerError,
};
