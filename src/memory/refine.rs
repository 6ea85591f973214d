//! Modularity-based boundary refinement.
//!
//! Each candidate boundary is shifted within its interval so that the split
//! maximizes within-cluster modularity over the affinity matrix: splits that
//! keep high mutual affinity on one side and low affinity across score best.
//! Normalizing by the interval's total affinity keeps scores comparable
//! between intervals.

use super::error::MemoryError;

/// Tolerance for symmetry and non-negativity checks on the affinity matrix.
const SIMILARITY_TOLERANCE: f64 = 1e-9;

/// Refines boundaries against a symmetric, non-negative affinity matrix.
///
/// Boundaries are processed left to right. The i-th boundary may move inside
/// `[prev_refined + min_gap, next_initial - min_gap]`; the refined position
/// becomes the left wall for the next boundary. Ties keep the clamped initial
/// boundary, so refinement is a no-op when nothing strictly improves on it.
pub fn refine_boundaries(
    initial: &[usize],
    key_similarity: &[Vec<f64>],
    min_gap: usize,
) -> Result<Vec<usize>, MemoryError> {
    if min_gap == 0 {
        return Err(MemoryError::InvalidMinBoundaryGap);
    }
    if key_similarity.is_empty() {
        return Err(MemoryError::SimilarityRequired);
    }
    let token_count = key_similarity.len();
    if key_similarity.iter().any(|row| row.len() != token_count) {
        return Err(MemoryError::SimilarityNotSquare);
    }
    validate_similarity(key_similarity)?;
    if initial.is_empty() {
        return Ok(Vec::new());
    }
    validate_boundaries(initial, token_count, min_gap)?;

    let mut refined: Vec<usize> = Vec::with_capacity(initial.len());
    for (i, &boundary) in initial.iter().enumerate() {
        let alpha = if i > 0 { refined[i - 1] } else { 0 };
        let beta = if i + 1 < initial.len() {
            initial[i + 1]
        } else {
            token_count
        };

        let candidate_min = alpha + min_gap;
        let candidate_max = match beta.checked_sub(min_gap) {
            Some(max) if candidate_min <= max => max,
            _ => return Err(MemoryError::BoundaryGapInvalid),
        };

        let stats = IntervalStats::build(key_similarity, alpha, beta)?;

        // The clamped initial boundary seeds the best score; candidates must
        // strictly beat it, which keeps refinement stable under ties.
        let mut best_boundary = boundary.clamp(candidate_min, candidate_max);
        let mut best_score = stats.split_modularity(key_similarity, best_boundary);
        for candidate in candidate_min..=candidate_max {
            let score = stats.split_modularity(key_similarity, candidate);
            if score > best_score {
                best_score = score;
                best_boundary = candidate;
            }
        }

        refined.push(best_boundary);
    }

    Ok(refined)
}

fn validate_similarity(key_similarity: &[Vec<f64>]) -> Result<(), MemoryError> {
    for (i, row) in key_similarity.iter().enumerate() {
        for j in i..row.len() {
            let left = row[j];
            let right = key_similarity[j][i];

            if !left.is_finite() || !right.is_finite() {
                return Err(MemoryError::SimilarityNonFinite);
            }
            if left < -SIMILARITY_TOLERANCE || right < -SIMILARITY_TOLERANCE {
                return Err(MemoryError::SimilarityNegative);
            }
            if (left - right).abs() > SIMILARITY_TOLERANCE {
                return Err(MemoryError::SimilarityAsymmetric);
            }
        }
    }
    Ok(())
}

fn validate_boundaries(
    boundaries: &[usize],
    token_count: usize,
    min_gap: usize,
) -> Result<(), MemoryError> {
    let mut prev = 0usize;
    for (i, &boundary) in boundaries.iter().enumerate() {
        if boundary == 0 || boundary >= token_count {
            return Err(MemoryError::BoundaryOutOfRange);
        }
        if i > 0 {
            if boundary <= prev {
                return Err(MemoryError::BoundaryOrderInvalid);
            }
            if boundary - prev < min_gap {
                return Err(MemoryError::BoundaryGapInvalid);
            }
        }
        prev = boundary;
    }
    Ok(())
}

/// Per-token degree and total affinity of the token range `[alpha, beta)`.
struct IntervalStats {
    alpha: usize,
    beta: usize,
    degree: Vec<f64>,
    total_affinity: f64,
}

impl IntervalStats {
    fn build(
        key_similarity: &[Vec<f64>],
        alpha: usize,
        beta: usize,
    ) -> Result<Self, MemoryError> {
        let mut degree = vec![0.0; beta - alpha];
        let mut total_affinity = 0.0;
        for i in alpha..beta {
            for j in alpha..beta {
                let weight = key_similarity[i][j];
                degree[i - alpha] += weight;
                total_affinity += weight;
            }
        }
        if total_affinity <= 0.0 {
            return Err(MemoryError::NonPositiveTotalAffinity);
        }

        Ok(Self {
            alpha,
            beta,
            degree,
            total_affinity,
        })
    }

    /// Within-cluster modularity gain of splitting the interval at `split`.
    fn split_modularity(&self, key_similarity: &[Vec<f64>], split: usize) -> f64 {
        if split <= self.alpha || split >= self.beta {
            return f64::NEG_INFINITY;
        }

        let mut modularity = 0.0;
        for i in self.alpha..self.beta {
            for j in self.alpha..self.beta {
                let same_cluster = (i < split && j < split) || (i >= split && j >= split);
                if !same_cluster {
                    continue;
                }
                let expected =
                    self.degree[i - self.alpha] * self.degree[j - self.alpha] / self.total_affinity;
                modularity += key_similarity[i][j] - expected;
            }
        }

        modularity / self.total_affinity
    }
}
