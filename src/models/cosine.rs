//! Pairwise cosine similarity between two embedding sets

use ndarray::Array2;

use crate::models::{Embedding, EmbeddingError, EmbeddingResult};

/// Score every vector of `a` against every vector of `b`.
///
/// Row `i` of the result holds `a[i]` against each `b[j]`. An empty side yields
/// an empty dimension rather than an error. Zero vectors score 0 against
/// everything.
pub fn cosine_similarity_matrix(a: &[Embedding], b: &[Embedding]) -> EmbeddingResult<Vec<Vec<f32>>> {
    if a.is_empty() {
        return Ok(Vec::new());
    }
    if b.is_empty() {
        return Ok(vec![Vec::new(); a.len()]);
    }

    let dim = a[0].len();
    let left = normalized_rows(a, dim)?;
    let right = normalized_rows(b, dim)?;

    let scores = left.dot(&right.t());
    Ok(scores.rows().into_iter().map(|row| row.to_vec()).collect())
}

fn normalized_rows(vectors: &[Embedding], dim: usize) -> EmbeddingResult<Array2<f32>> {
    if let Some(bad) = vectors.iter().find(|v| v.len() != dim) {
        return Err(EmbeddingError::InvalidInput {
            message: format!("Embedding dimension mismatch: expected {}, got {}", dim, bad.len()),
        });
    }

    let flat: Vec<f32> = vectors.iter().flat_map(|v| v.iter().copied()).collect();
    let mut matrix = Array2::from_shape_vec((vectors.len(), dim), flat)
        .map_err(|e| EmbeddingError::InvalidInput {
            message: format!("Failed to shape embeddings: {}", e),
        })?;

    for mut row in matrix.rows_mut() {
        let norm = row.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            row.mapv_inplace(|x| x / norm);
        }
    }

    Ok(matrix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_and_orthogonal() {
        let a = vec![vec![1.0, 0.0], vec![0.0, 2.0]];
        let b = vec![vec![3.0, 0.0], vec![0.0, 1.0], vec![1.0, 1.0]];

        let scores = cosine_similarity_matrix(&a, &b).unwrap();
        assert_eq!(scores.len(), 2);
        assert!(scores.iter().all(|row| row.len() == 3));

        assert!((scores[0][0] - 1.0).abs() < 1e-6);
        assert!(scores[0][1].abs() < 1e-6);
        assert!((scores[1][1] - 1.0).abs() < 1e-6);
        assert!((scores[0][2] - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-6);
    }

    #[test]
    fn test_empty_sides() {
        let some = vec![vec![1.0, 0.0]];
        assert!(cosine_similarity_matrix(&[], &some).unwrap().is_empty());

        let scores = cosine_similarity_matrix(&some, &[]).unwrap();
        assert_eq!(scores, vec![Vec::<f32>::new()]);
    }

    #[test]
    fn test_zero_vector_scores_zero() {
        let scores = cosine_similarity_matrix(&[vec![0.0, 0.0]], &[vec![1.0, 1.0]]).unwrap();
        assert_eq!(scores[0][0], 0.0);
    }

    #[test]
    fn test_dimension_mismatch() {
        let result = cosine_similarity_matrix(&[vec![1.0, 0.0]], &[vec![1.0, 0.0, 0.0]]);
        assert!(matches!(result, Err(EmbeddingError::InvalidInput { .. })));
    }
}
