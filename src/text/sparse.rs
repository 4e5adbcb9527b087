use serde::{Serialize, Deserialize};

/// Sparse feature vector with strictly increasing indices
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SparseVector {
    /// Feature indices, sorted ascending
    indices: Vec<usize>,
    /// Values matching `indices`
    values: Vec<f64>,
}

impl SparseVector {
    /// Create an empty vector
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a vector from unordered `(index, value)` pairs.
    ///
    /// Duplicate indices are summed and explicit zeros are dropped.
    pub fn from_pairs(mut pairs: Vec<(usize, f64)>) -> Self {
        pairs.sort_by_key(|&(index, _)| index);

        let mut indices: Vec<usize> = Vec::with_capacity(pairs.len());
        let mut values: Vec<f64> = Vec::with_capacity(pairs.len());
        for (index, value) in pairs {
            match indices.last() {
                Some(&last) if last == index => {
                    if let Some(v) = values.last_mut() {
                        *v += value;
                    }
                }
                _ => {
                    indices.push(index);
                    values.push(value);
                }
            }
        }

        let mut vector = Self { indices, values };
        vector.prune_zeros();
        vector
    }

    fn prune_zeros(&mut self) {
        let mut keep = 0;
        for i in 0..self.indices.len() {
            if self.values[i] != 0.0 {
                self.indices[keep] = self.indices[i];
                self.values[keep] = self.values[i];
                keep += 1;
            }
        }
        self.indices.truncate(keep);
        self.values.truncate(keep);
    }

    /// Number of stored (non-zero) entries
    pub fn nnz(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Iterate over `(index, value)` pairs in index order
    pub fn iter(&self) -> impl Iterator<Item = (usize, f64)> + '_ {
        self.indices.iter().copied().zip(self.values.iter().copied())
    }

    /// Value at `index`, zero when absent
    pub fn get(&self, index: usize) -> f64 {
        match self.indices.binary_search(&index) {
            Ok(pos) => self.values[pos],
            Err(_) => 0.0,
        }
    }

    /// Largest stored index, if any
    pub fn max_index(&self) -> Option<usize> {
        self.indices.last().copied()
    }

    /// Dot product with a dense weight vector; indices past its end count as zero
    pub fn dot_dense(&self, dense: &[f64]) -> f64 {
        self.iter()
            .filter_map(|(i, v)| dense.get(i).map(|w| w * v))
            .sum()
    }

    /// Dot product with another sparse vector
    pub fn dot(&self, other: &SparseVector) -> f64 {
        let (mut a, mut b) = (0, 0);
        let mut sum = 0.0;
        while a < self.indices.len() && b < other.indices.len() {
            match self.indices[a].cmp(&other.indices[b]) {
                std::cmp::Ordering::Less => a += 1,
                std::cmp::Ordering::Greater => b += 1,
                std::cmp::Ordering::Equal => {
                    sum += self.values[a] * other.values[b];
                    a += 1;
                    b += 1;
                }
            }
        }
        sum
    }

    pub fn squared_norm(&self) -> f64 {
        self.values.iter().map(|v| v * v).sum()
    }

    /// Add `scale * self` into a dense vector, growing it if needed
    pub fn add_scaled_to(&self, dense: &mut Vec<f64>, scale: f64) {
        if let Some(max) = self.max_index() {
            if dense.len() <= max {
                dense.resize(max + 1, 0.0);
            }
        }
        for (i, v) in self.iter() {
            dense[i] += scale * v;
        }
    }

    /// Scale to unit L2 norm. Zero vectors are left unchanged.
    pub fn l2_normalize(&mut self) {
        let norm = self.squared_norm().sqrt();
        if norm > 0.0 {
            for v in &mut self.values {
                *v /= norm;
            }
        }
    }

    /// Copy with every stored value replaced by 1.0
    pub fn binarized(&self) -> SparseVector {
        let indices: Vec<usize> = self
            .iter()
            .filter(|&(_, v)| v > 0.0)
            .map(|(i, _)| i)
            .collect();
        let values = vec![1.0; indices.len()];
        SparseVector { indices, values }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_pairs_merges_and_sorts() {
        let v = SparseVector::from_pairs(vec![(4, 1.0), (1, 2.0), (4, 2.0), (7, 0.0)]);
        assert_eq!(v.nnz(), 2);
        assert_eq!(v.get(1), 2.0);
        assert_eq!(v.get(4), 3.0);
        assert_eq!(v.get(7), 0.0);
        assert_eq!(v.max_index(), Some(4));
    }

    #[test]
    fn test_dot_products() {
        let a = SparseVector::from_pairs(vec![(0, 1.0), (2, 2.0), (5, 3.0)]);
        let b = SparseVector::from_pairs(vec![(2, 4.0), (5, 1.0), (6, 9.0)]);
        assert_eq!(a.dot(&b), 11.0);
        assert_eq!(a.dot_dense(&[1.0, 1.0, 1.0]), 3.0);
    }

    #[test]
    fn test_l2_normalize() {
        let mut v = SparseVector::from_pairs(vec![(0, 3.0), (1, 4.0)]);
        v.l2_normalize();
        assert!((v.squared_norm() - 1.0).abs() < 1e-12);

        let mut empty = SparseVector::new();
        empty.l2_normalize();
        assert!(empty.is_empty());
    }
}
