//! Tests for the frozen assignment store

use poimap::cluster::FrozenCluster;
use poimap::{
    AssignmentStore, Cluster, ClusterPhase, ClusterSnapshot, PoiKey, SurfacePoint,
};

fn key(index: usize) -> PoiKey {
    PoiKey::new("cafe", index, index as u64)
}

fn sample_cluster() -> Cluster {
    Cluster {
        id: "cluster-0".to_string(),
        members: vec![key(0), key(1), key(2)],
        mean: SurfacePoint::new(100.0, 100.0),
        target: SurfacePoint::new(150.0, 120.0),
        size: 80.0,
        phase: ClusterPhase::Radius100,
    }
}

#[test]
fn test_freeze_only_once() {
    let mut store = AssignmentStore::new();
    assert!(!store.is_frozen());

    store.freeze(&[sample_cluster()]);
    assert!(store.is_frozen());

    // A second freeze must not replace the snapshot
    let mut other = sample_cluster();
    other.id = "cluster-99".to_string();
    store.freeze(&[other]);

    let restored = store.restore(|_| Some(SurfacePoint::new(0.0, 0.0))).unwrap();
    assert_eq!(restored[0].id, "cluster-0");
}

#[test]
fn test_restore_filters_to_selection() {
    let mut store = AssignmentStore::new();
    store.freeze(&[sample_cluster()]);

    // Member 1 is deselected
    let restored = store
        .restore(|k| {
            if k.index == 1 {
                None
            } else {
                Some(SurfacePoint::new(50.0 * k.index as f64, 0.0))
            }
        })
        .unwrap();

    assert_eq!(restored.len(), 1);
    assert_eq!(restored[0].members, vec![key(0), key(2)]);
}

#[test]
fn test_restore_keeps_frozen_target_recomputes_mean() {
    let mut store = AssignmentStore::new();
    store.freeze(&[sample_cluster()]);

    let restored = store
        .restore(|k| Some(SurfacePoint::new(100.0 * k.index as f64, 60.0)))
        .unwrap();

    // Target is exactly as frozen
    assert_eq!(restored[0].target, SurfacePoint::new(150.0, 120.0));
    // Mean reflects the current member positions
    assert_eq!(restored[0].mean, SurfacePoint::new(100.0, 60.0));
}

#[test]
fn test_cluster_dissolves_below_two_members() {
    let mut store = AssignmentStore::new();
    store.freeze(&[sample_cluster()]);

    let restored = store
        .restore(|k| {
            if k.index == 0 {
                Some(SurfacePoint::new(10.0, 10.0))
            } else {
                None
            }
        })
        .unwrap();

    assert!(restored.is_empty());
}

#[test]
fn test_restore_without_snapshot() {
    let store = AssignmentStore::new();
    assert!(store.restore(|_| Some(SurfacePoint::default())).is_none());
}

#[test]
fn test_snapshot_serde_round_trip() {
    let mut store = AssignmentStore::new();
    store.freeze(&[sample_cluster()]);

    let json = store.export().unwrap();
    let snapshot = ClusterSnapshot::from_json(&json).unwrap();

    let mut reloaded = AssignmentStore::new();
    reloaded.load(snapshot);

    let surface = |k: &PoiKey| Some(SurfacePoint::new(k.index as f64, 0.0));
    let a = store.restore(surface).unwrap();
    let b = reloaded.restore(surface).unwrap();

    assert_eq!(a.len(), b.len());
    assert_eq!(a[0].id, b[0].id);
    assert_eq!(a[0].members, b[0].members);
    assert_eq!(a[0].target, b[0].target);
    assert_eq!(a[0].phase, b[0].phase);
}

#[test]
fn test_clear_allows_reclustering() {
    let mut store = AssignmentStore::new();
    store.freeze(&[sample_cluster()]);
    store.clear();
    assert!(!store.is_frozen());

    let replacement = FrozenCluster {
        id: "cluster-1".to_string(),
        members: vec![key(5), key(6)],
        target: SurfacePoint::new(10.0, 10.0),
        size: 80.0,
        phase: ClusterPhase::SameLocation,
    };
    store.load(ClusterSnapshot {
        clusters: vec![replacement],
    });
    assert!(store.is_frozen());
}
