//! Cross-module pipeline tests: segmentation feeding the store, and the
//! invariants that hold across detector, refiner, and segmenter together.

use chrono::{DateTime, TimeZone, Utc};

use super::{build_events, detect_boundaries, refine_boundaries, MemoryStore, SegmentParams};

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

fn segment_params<'a>(
    start_token: i64,
    surprise: &'a [f64],
    key_similarity: &'a [Vec<f64>],
    min_boundary_gap: usize,
    prefix: &'a str,
) -> SegmentParams<'a> {
    SegmentParams {
        tenant_id: "tenant_1",
        session_id: "session_1",
        start_token,
        surprise,
        key_similarity,
        threshold: 0.8,
        min_boundary_gap,
        created_at: created_at(),
        event_id_prefix: prefix,
    }
}

#[test]
fn segmenter_output_covers_the_range_contiguously() {
    let cases: [(&[f64], usize); 4] = [
        (&[0.05, 0.2, 1.2, 0.1, 0.15, 1.5, 0.2], 1),
        (&[0.05, 0.2, 1.2, 0.1, 0.15, 1.5, 0.2], 3),
        (&[0.1, 1.1, 0.2, 1.5, 0.1], 3),
        (&[0.3, 0.1, 0.2], 1),
    ];

    for (surprise, min_gap) in cases {
        let similarity = identity(surprise.len());
        let outcome =
            build_events(&segment_params(50, surprise, &similarity, min_gap, "seg")).unwrap();

        assert_eq!(outcome.events[0].start_token(), 50);
        for pair in outcome.events.windows(2) {
            assert_eq!(pair[0].end_token_exclusive(), pair[1].start_token());
        }
        let last = outcome.events.last().unwrap();
        assert_eq!(last.end_token_exclusive(), 50 + surprise.len() as i64);
    }
}

#[test]
fn boundaries_respect_min_gap_before_and_after_refinement() {
    let surprise = [0.1, 1.0, 0.1, 0.1, 1.2, 0.1, 0.1, 1.4, 0.1];
    let min_gap = 2;

    let detected = detect_boundaries(&surprise, 0.8, min_gap).unwrap();
    for pair in detected.windows(2) {
        assert!(pair[1] - pair[0] >= min_gap);
    }

    let refined = refine_boundaries(&detected, &identity(surprise.len()), min_gap).unwrap();
    assert_eq!(refined.len(), detected.len());
    let mut prev = 0usize;
    for &boundary in &refined {
        assert!(boundary - prev >= min_gap);
        prev = boundary;
    }
}

#[test]
fn segment_then_retrieve_round_trip() {
    let store = MemoryStore::new();
    let surprise = [0.05, 0.2, 1.2, 0.1, 0.15, 1.5, 0.2];
    let similarity = identity(surprise.len());

    let outcome = build_events(&segment_params(100, &surprise, &similarity, 1, "seg")).unwrap();
    store.append_many(outcome.events.clone()).unwrap();

    let anchors = vec!["seg_1".to_string()];
    let events = store
        .retrieve_by_anchors("tenant_1", "session_1", &anchors, 1, 1, 1)
        .unwrap();

    let ids: Vec<&str> = events.iter().map(|e| e.event_id()).collect();
    assert_eq!(ids, vec!["seg_0", "seg_1", "seg_2"]);
}

#[test]
fn segmenting_twice_with_the_same_prefix_fails_atomically() {
    let store = MemoryStore::new();
    let surprise = [0.05, 0.2, 1.2, 0.1, 0.15, 1.5, 0.2];
    let similarity = identity(surprise.len());

    let first = build_events(&segment_params(100, &surprise, &similarity, 1, "seg")).unwrap();
    store.append_many(first.events).unwrap();
    let before = store.list_by_session("tenant_1", "session_1");

    let second = build_events(&segment_params(200, &surprise, &similarity, 1, "seg")).unwrap();
    assert!(store.append_many(second.events).is_err());

    assert_eq!(store.list_by_session("tenant_1", "session_1"), before);
}

#[test]
fn refinement_shifts_segment_boundaries_to_affinity_blocks() {
    // Detection proposes a boundary after the surprise spike at index 2, but
    // the affinity structure says the block edge sits one token earlier.
    let surprise = [0.05, 0.2, 1.2, 0.1, 0.05, 0.02];
    let similarity = vec![
        vec![1.0, 4.0, 0.1, 0.1, 0.1, 0.1],
        vec![4.0, 1.0, 0.1, 0.1, 0.1, 0.1],
        vec![0.1, 0.1, 1.0, 4.0, 4.0, 4.0],
        vec![0.1, 0.1, 4.0, 1.0, 4.0, 4.0],
        vec![0.1, 0.1, 4.0, 4.0, 1.0, 4.0],
        vec![0.1, 0.1, 4.0, 4.0, 4.0, 1.0],
    ];

    let outcome = build_events(&segment_params(0, &surprise, &similarity, 1, "seg")).unwrap();

    assert_eq!(outcome.boundaries, vec![2]);
    assert_eq!(outcome.events.len(), 2);
    assert_eq!(outcome.events[0].end_token_exclusive(), 2);
    assert_eq!(outcome.events[1].start_token(), 2);
}
