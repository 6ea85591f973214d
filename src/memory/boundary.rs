//! Surprise-peak boundary detection.
//!
//! A boundary candidate is a strict local maximum of the surprise signal that
//! also clears the caller's threshold. Emitting the index *after* the peak
//! makes the peak token the last token of the closing segment.

use super::error::MemoryError;

/// Detects boundary indices from per-token surprise scores.
///
/// Peaks are visited left to right; when two peaks land closer than
/// `min_gap`, the stronger one wins. The returned indices point into the
/// surprise vector, not into absolute token space.
pub fn detect_boundaries(
    surprise: &[f64],
    threshold: f64,
    min_gap: usize,
) -> Result<Vec<usize>, MemoryError> {
    if threshold < 0.0 {
        return Err(MemoryError::NegativeSurpriseThreshold);
    }
    if min_gap == 0 {
        return Err(MemoryError::InvalidMinBoundaryGap);
    }
    if surprise.len() < 3 {
        return Ok(Vec::new());
    }

    let mut boundaries: Vec<usize> = Vec::new();
    let mut peaks: Vec<f64> = Vec::new();

    for i in 1..surprise.len() - 1 {
        let score = surprise[i];
        if score <= threshold {
            continue;
        }
        // Strict local maxima only; plateaus are not transition peaks.
        if score <= surprise[i - 1] || score <= surprise[i + 1] {
            continue;
        }

        // The boundary is the first token after the peak.
        let boundary = i + 1;
        match boundaries.last().copied() {
            None => {
                boundaries.push(boundary);
                peaks.push(score);
            }
            Some(last) if boundary - last >= min_gap => {
                boundaries.push(boundary);
                peaks.push(score);
            }
            Some(_) => {
                // Two peaks inside the minimum gap: keep the stronger one.
                let last_index = boundaries.len() - 1;
                if score > peaks[last_index] {
                    boundaries[last_index] = boundary;
                    peaks[last_index] = score;
                }
            }
        }
    }

    Ok(boundaries)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_invalid_parameters() {
        assert_eq!(
            detect_boundaries(&[0.0, 1.0, 0.0], -0.1, 1),
            Err(MemoryError::NegativeSurpriseThreshold)
        );
        assert_eq!(
            detect_boundaries(&[0.0, 1.0, 0.0], 0.5, 0),
            Err(MemoryError::InvalidMinBoundaryGap)
        );
    }

    #[test]
    fn short_input_yields_no_boundaries() {
        for scores in [&[][..], &[0.5][..], &[0.1, 0.9][..]] {
            assert_eq!(detect_boundaries(scores, 0.8, 1), Ok(Vec::new()));
        }
    }

    #[test]
    fn detects_surprise_peaks() {
        let scores = [0.05, 0.2, 1.2, 0.1, 0.15, 1.5, 0.2];
        assert_eq!(detect_boundaries(&scores, 0.8, 1), Ok(vec![3, 6]));
    }

    #[test]
    fn threshold_comparison_is_strict() {
        let scores = [0.1, 0.5, 0.1];
        assert_eq!(detect_boundaries(&scores, 0.5, 1), Ok(Vec::new()));
    }

    #[test]
    fn stronger_peak_replaces_weaker_within_gap() {
        let scores = [0.1, 1.1, 0.2, 1.5, 0.1];
        assert_eq!(detect_boundaries(&scores, 0.8, 3), Ok(vec![4]));
    }

    #[test]
    fn weaker_peak_within_gap_is_discarded() {
        let scores = [0.1, 1.5, 0.2, 1.1, 0.1];
        assert_eq!(detect_boundaries(&scores, 0.8, 3), Ok(vec![2]));
    }

    #[test]
    fn plateau_is_not_a_peak() {
        let scores = [0.1, 1.0, 1.0, 0.1];
        assert_eq!(detect_boundaries(&scores, 0.8, 1), Ok(Vec::new()));
    }

    #[test]
    fn distant_peaks_are_all_kept() {
        let scores = [0.1, 1.0, 0.1, 0.1, 1.2, 0.1, 0.1, 1.4, 0.1];
        assert_eq!(detect_boundaries(&scores, 0.8, 3), Ok(vec![2, 5, 8]));
    }
}
