//! Tests for the write-behind persistence queue

use std::time::{Duration, Instant};

use poimap::{MemoryStore, OverlayKind, PersistQueue, PersistStore, PoiMapError};

fn payload(kind: OverlayKind) -> poimap::Result<String> {
    Ok(format!("{{\"kind\":\"{}\"}}", kind.storage_name()))
}

#[test]
fn test_write_waits_for_debounce_window() {
    let mut queue = PersistQueue::new();
    let mut store = MemoryStore::new();
    let t0 = Instant::now();

    queue.schedule(OverlayKind::Sizes, t0);

    // Nothing due before the window closes
    assert_eq!(
        queue.flush_due(t0 + Duration::from_millis(500), &mut store, payload),
        0
    );
    assert_eq!(
        queue.flush_due(t0 + Duration::from_millis(1000), &mut store, payload),
        1
    );
    assert!(store.get(OverlayKind::Sizes).is_some());
    assert!(!queue.is_pending(OverlayKind::Sizes));
}

#[test]
fn test_burst_coalesces_to_one_write() {
    let mut queue = PersistQueue::new();
    let mut store = MemoryStore::new();
    let t0 = Instant::now();

    // A drag emits many schedules in quick succession
    for i in 0..20 {
        queue.schedule(OverlayKind::DraggedPositions, t0 + Duration::from_millis(i * 10));
    }

    let done = t0 + Duration::from_millis(190 + 1000);
    assert_eq!(queue.flush_due(done, &mut store, payload), 1);
    assert_eq!(store.write_count, 1);
}

#[test]
fn test_reschedule_extends_window() {
    let mut queue = PersistQueue::new();
    let mut store = MemoryStore::new();
    let t0 = Instant::now();

    queue.schedule(OverlayKind::Rotations, t0);
    queue.schedule(OverlayKind::Rotations, t0 + Duration::from_millis(800));

    // The first deadline has passed but the reschedule pushed it out
    assert_eq!(
        queue.flush_due(t0 + Duration::from_millis(1100), &mut store, payload),
        0
    );
    assert_eq!(
        queue.flush_due(t0 + Duration::from_millis(1800), &mut store, payload),
        1
    );
}

#[test]
fn test_selection_waits_longer() {
    let mut queue = PersistQueue::new();
    let mut store = MemoryStore::new();
    let t0 = Instant::now();

    queue.schedule(OverlayKind::Selection, t0);
    queue.schedule(OverlayKind::Reshapes, t0);

    let after_one_second = t0 + Duration::from_millis(1000);
    assert_eq!(queue.flush_due(after_one_second, &mut store, payload), 1);
    assert!(store.get(OverlayKind::Reshapes).is_some());
    assert!(store.get(OverlayKind::Selection).is_none());

    let after_two_seconds = t0 + Duration::from_millis(2000);
    assert_eq!(queue.flush_due(after_two_seconds, &mut store, payload), 1);
    assert!(store.get(OverlayKind::Selection).is_some());
}

#[test]
fn test_cancel_drops_pending_write() {
    let mut queue = PersistQueue::new();
    let mut store = MemoryStore::new();
    let t0 = Instant::now();

    queue.schedule(OverlayKind::BreakPoints, t0);
    queue.cancel(OverlayKind::BreakPoints);

    assert_eq!(
        queue.flush_due(t0 + Duration::from_secs(10), &mut store, payload),
        0
    );
    assert_eq!(store.write_count, 0);
}

#[test]
fn test_flush_all_ignores_deadlines() {
    let mut queue = PersistQueue::new();
    let mut store = MemoryStore::new();
    let t0 = Instant::now();

    queue.schedule(OverlayKind::Sizes, t0);
    queue.schedule(OverlayKind::Selection, t0);

    assert_eq!(queue.flush_all(&mut store, payload), 2);
    assert!(queue.pending().is_empty());
}

struct FailingStore;

impl PersistStore for FailingStore {
    fn write(&mut self, kind: OverlayKind, _payload: &str) -> poimap::Result<()> {
        Err(PoiMapError::PersistFailed {
            kind: kind.storage_name().to_string(),
            message: "backend offline".to_string(),
        })
    }
}

#[test]
fn test_failed_write_is_dropped_not_retried() {
    let mut queue = PersistQueue::new();
    let mut store = FailingStore;
    let t0 = Instant::now();

    queue.schedule(OverlayKind::Sizes, t0);
    assert_eq!(
        queue.flush_due(t0 + Duration::from_secs(2), &mut store, payload),
        0
    );
    // The kind left the queue despite the failure
    assert!(!queue.is_pending(OverlayKind::Sizes));
}
