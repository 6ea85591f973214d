//! Event segmentation over a surprise window.
//!
//! Ties the detector and refiner together: detect candidate boundaries from
//! the surprise scores, refine them against the affinity matrix, then cut the
//! token range into a contiguous run of events.

use chrono::{DateTime, Utc};

use super::boundary::detect_boundaries;
use super::error::MemoryError;
use super::event::Event;
use super::refine::refine_boundaries;

/// Inputs for one segmentation pass.
///
/// `start_token` anchors the surprise window in absolute token space;
/// `key_similarity` must be square with the same size as `surprise`.
#[derive(Debug)]
pub struct SegmentParams<'a> {
    pub tenant_id: &'a str,
    pub session_id: &'a str,
    pub start_token: i64,
    pub surprise: &'a [f64],
    pub key_similarity: &'a [Vec<f64>],
    pub threshold: f64,
    pub min_boundary_gap: usize,
    pub created_at: DateTime<Utc>,
    pub event_id_prefix: &'a str,
}

/// A segmentation result: the emitted events plus the absolute boundaries
/// they were cut at.
#[derive(Debug)]
pub struct SegmentOutcome {
    pub events: Vec<Event>,
    pub boundaries: Vec<i64>,
}

/// Segments `[start_token, start_token + surprise.len())` into events.
///
/// For `b` refined boundaries the outcome holds `b + 1` events that are
/// contiguous, non-overlapping, and cover the whole range. Event ids are
/// `"{prefix}_{i}"` with a zero-based index in span order.
pub fn build_events(params: &SegmentParams<'_>) -> Result<SegmentOutcome, MemoryError> {
    if params.start_token < 0 {
        return Err(MemoryError::StartTokenNegative);
    }
    if params.surprise.is_empty() {
        return Err(MemoryError::SurpriseRequired);
    }
    if params.key_similarity.is_empty() {
        return Err(MemoryError::SimilarityRequired);
    }
    if params.event_id_prefix.is_empty() {
        return Err(MemoryError::EventIdPrefixRequired);
    }
    if params.key_similarity.len() != params.surprise.len() {
        return Err(MemoryError::SimilaritySizeMismatch);
    }

    let detected = detect_boundaries(params.surprise, params.threshold, params.min_boundary_gap)?;
    let refined = refine_boundaries(&detected, params.key_similarity, params.min_boundary_gap)?;

    let end_token = params.start_token + params.surprise.len() as i64;
    let mut boundaries: Vec<i64> = Vec::with_capacity(refined.len());
    for &relative in &refined {
        let absolute = params.start_token + relative as i64;
        if absolute <= params.start_token || absolute >= end_token {
            return Err(MemoryError::BoundaryOutOfRange);
        }
        boundaries.push(absolute);
    }

    let mut events: Vec<Event> = Vec::with_capacity(boundaries.len() + 1);
    let mut cursor = params.start_token;
    for (i, &boundary) in boundaries.iter().enumerate() {
        events.push(new_event(params, i, cursor, boundary)?);
        cursor = boundary;
    }
    events.push(new_event(params, boundaries.len(), cursor, end_token)?);

    Ok(SegmentOutcome { events, boundaries })
}

fn new_event(
    params: &SegmentParams<'_>,
    index: usize,
    start_token: i64,
    end_token_exclusive: i64,
) -> Result<Event, MemoryError> {
    Event::new(
        format!("{}_{}", params.event_id_prefix, index),
        params.tenant_id.to_string(),
        params.session_id.to_string(),
        start_token,
        end_token_exclusive,
        params.created_at,
    )
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn identity(size: usize) -> Vec<Vec<f64>> {
        let mut matrix = vec![vec![0.0; size]; size];
        for (i, row) in matrix.iter_mut().enumerate() {
            row[i] = 1.0;
        }
        matrix
    }

    fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 2, 14, 12, 0, 0).unwrap()
    }

    fn params<'a>(
        start_token: i64,
        surprise: &'a [f64],
        key_similarity: &'a [Vec<f64>],
        prefix: &'a str,
    ) -> SegmentParams<'a> {
        SegmentParams {
            tenant_id: "tenant_1",
            session_id: "session_1",
            start_token,
            surprise,
            key_similarity,
            threshold: 0.8,
            min_boundary_gap: 1,
            created_at: created_at(),
            event_id_prefix: prefix,
        }
    }

    #[test]
    fn builds_contiguous_events() {
        let surprise = [0.05, 0.2, 1.2, 0.1, 0.15, 1.5, 0.2];
        let similarity = identity(surprise.len());

        let outcome = build_events(&params(100, &surprise, &similarity, "seg")).unwrap();

        assert_eq!(outcome.boundaries, vec![103, 105]);
        assert_eq!(outcome.events.len(), 3);

        let spans: Vec<(&str, i64, i64)> = outcome
            .events
            .iter()
            .map(|e| (e.event_id(), e.start_token(), e.end_token_exclusive()))
            .collect();
        assert_eq!(
            spans,
            vec![
                ("seg_0", 100, 103),
                ("seg_1", 103, 105),
                ("seg_2", 105, 107),
            ]
        );

        for event in &outcome.events {
            assert_eq!(event.tenant_id(), "tenant_1");
            assert_eq!(event.session_id(), "session_1");
            assert_eq!(event.created_at(), created_at());
        }
    }

    #[test]
    fn emits_single_event_when_no_peaks() {
        let surprise = [0.1, 0.2, 0.1, 0.2, 0.1];
        let similarity = identity(surprise.len());

        let outcome = build_events(&params(0, &surprise, &similarity, "seg")).unwrap();

        assert!(outcome.boundaries.is_empty());
        assert_eq!(outcome.events.len(), 1);
        assert_eq!(outcome.events[0].start_token(), 0);
        assert_eq!(outcome.events[0].end_token_exclusive(), 5);
    }

    #[test]
    fn rejects_invalid_input() {
        let surprise = [0.1, 1.0, 0.1];
        let similarity = identity(surprise.len());

        assert_eq!(
            build_events(&params(-1, &surprise, &similarity, "seg")).unwrap_err(),
            MemoryError::StartTokenNegative
        );
        assert_eq!(
            build_events(&params(0, &[], &similarity, "seg")).unwrap_err(),
            MemoryError::SurpriseRequired
        );
        assert_eq!(
            build_events(&params(0, &surprise, &[], "seg")).unwrap_err(),
            MemoryError::SimilarityRequired
        );
        assert_eq!(
            build_events(&params(0, &surprise, &similarity, "")).unwrap_err(),
            MemoryError::EventIdPrefixRequired
        );

        let mismatched = identity(1);
        assert_eq!(
            build_events(&params(0, &surprise, &mismatched, "seg")).unwrap_err(),
            MemoryError::SimilaritySizeMismatch
        );
    }

    #[test]
    fn propagates_detector_errors() {
        let surprise = [0.1, 1.0, 0.1];
        let similarity = identity(surprise.len());
        let mut p = params(0, &surprise, &similarity, "seg");
        p.threshold = -0.1;

        assert_eq!(
            build_events(&p).unwrap_err(),
            MemoryError::NegativeSurpriseThreshold
        );
    }

    #[test]
    fn propagates_refiner_errors() {
        let surprise = [0.1, 1.0, 0.1, 0.1];
        let asymmetric = vec![
            vec![1.0, 0.2, 0.0, 0.0],
            vec![0.1, 1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 0.0, 1.0],
        ];
        let p = params(0, &surprise, &asymmetric, "seg");

        assert_eq!(
            build_events(&p).unwrap_err(),
            MemoryError::SimilarityAsymmetric
        );
    }
}
