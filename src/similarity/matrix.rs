//! Similarity matrix returned to callers

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::similarity::ComputationError;

/// Row-major `rows × cols` scores, row `i` is query `i`, column `j` document `j`
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityMatrix {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl SimilarityMatrix {
    /// Matrix with no cells; one of the dimensions must be zero
    pub fn empty(rows: usize, cols: usize) -> Self {
        debug_assert!(rows == 0 || cols == 0);
        Self {
            rows,
            cols,
            values: Vec::new(),
        }
    }

    /// Widen the model's f32 scores, checking the shape is `rows × cols`
    pub fn from_model_scores(scores: Vec<Vec<f32>>, rows: usize, cols: usize) -> Result<Self, ComputationError> {
        let bad_row = scores.iter().find(|row| row.len() != cols);
        if scores.len() != rows || bad_row.is_some() {
            return Err(ComputationError::ShapeMismatch {
                expected_rows: rows,
                expected_cols: cols,
                rows: scores.len(),
                cols: bad_row.map_or(cols, |row| row.len()),
            });
        }

        let values = scores
            .into_iter()
            .flat_map(|row| row.into_iter().map(f64::from))
            .collect();

        Ok(Self { rows, cols, values })
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Score of query `row` against document `col`
    pub fn get(&self, row: usize, col: usize) -> Option<f64> {
        if row < self.rows && col < self.cols {
            self.values.get(row * self.cols + col).copied()
        } else {
            None
        }
    }

    /// One row per query; empty rows when there are no documents
    pub fn iter_rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.rows).map(move |row| &self.values[row * self.cols..(row + 1) * self.cols])
    }

    pub fn to_rows(&self) -> Vec<Vec<f64>> {
        self.iter_rows().map(<[f64]>::to_vec).collect()
    }
}

/// Serialized as a JSON array of arrays
impl Serialize for SimilarityMatrix {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.rows))?;
        for row in self.iter_rows() {
            seq.serialize_element(row)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_model_scores() {
        let matrix = SimilarityMatrix::from_model_scores(
            vec![vec![0.5, 0.25, 1.0], vec![0.0, -0.5, 0.75]],
            2,
            3,
        )
        .unwrap();

        assert_eq!(matrix.rows(), 2);
        assert_eq!(matrix.cols(), 3);
        assert_eq!(matrix.get(0, 1), Some(0.25));
        assert_eq!(matrix.get(1, 1), Some(-0.5));
        assert_eq!(matrix.get(2, 0), None);
        assert_eq!(matrix.get(0, 3), None);
    }

    #[test]
    fn test_shape_mismatch() {
        let result = SimilarityMatrix::from_model_scores(vec![vec![0.5], vec![0.5, 0.5]], 2, 1);
        assert!(matches!(
            result,
            Err(ComputationError::ShapeMismatch { rows: 2, cols: 2, .. })
        ));

        let result = SimilarityMatrix::from_model_scores(vec![vec![0.5]], 2, 1);
        assert!(matches!(result, Err(ComputationError::ShapeMismatch { rows: 1, .. })));
    }

    #[test]
    fn test_json_shape() {
        let matrix = SimilarityMatrix::from_model_scores(vec![vec![0.5, 1.0], vec![0.25, 0.0]], 2, 2).unwrap();
        assert_eq!(serde_json::to_string(&matrix).unwrap(), "[[0.5,1.0],[0.25,0.0]]");

        assert_eq!(serde_json::to_string(&SimilarityMatrix::empty(0, 4)).unwrap(), "[]");
        assert_eq!(serde_json::to_string(&SimilarityMatrix::empty(2, 0)).unwrap(), "[[],[]]");
    }
}
