//! Tests for the overlay store

use poimap::overlay::{OverlayStore, RESHAPE_MAX, RESHAPE_MIN};
use poimap::{EntityKey, PoiKey, SurfacePoint};

#[test]
fn test_storage_keys() {
    assert_eq!(
        EntityKey::Poi(PoiKey::new("cafe", 2, 42)).storage_key(),
        "cafe-42"
    );
    assert_eq!(EntityKey::Cluster("cluster-3".to_string()).storage_key(), "cluster-3");
    assert_eq!(EntityKey::Road(7).storage_key(), "highway-7");
    assert_eq!(EntityKey::Site.storage_key(), "siteMarker");
}

#[test]
fn test_position_keeps_first_original() {
    let mut overlays = OverlayStore::new();

    overlays.set_position(
        "cafe-1",
        SurfacePoint::new(100.0, 100.0),
        SurfacePoint::new(200.0, 150.0),
    );
    // Second drag passes a different "original"; the first one sticks
    overlays.set_position(
        "cafe-1",
        SurfacePoint::new(999.0, 999.0),
        SurfacePoint::new(300.0, 250.0),
    );

    let pos = overlays.position("cafe-1").unwrap();
    assert_eq!(pos.original, SurfacePoint::new(100.0, 100.0));
    assert_eq!(pos.current, SurfacePoint::new(300.0, 250.0));
}

#[test]
fn test_clear_position_drops_break_path() {
    let mut overlays = OverlayStore::new();

    overlays.set_position(
        "cafe-1",
        SurfacePoint::new(100.0, 100.0),
        SurfacePoint::new(200.0, 150.0),
    );
    overlays
        .break_path_mut("cafe-1")
        .points
        .push(SurfacePoint::new(150.0, 120.0));

    overlays.clear_position("cafe-1");
    assert!(overlays.position("cafe-1").is_none());
    assert!(overlays.break_path("cafe-1").is_none());
}

#[test]
fn test_rotation_wraps() {
    let mut overlays = OverlayStore::new();

    overlays.set_rotation("highway-0", 355.0 + 10.0);
    assert_eq!(overlays.rotation("highway-0"), 5.0);

    overlays.set_rotation("highway-0", -5.0);
    assert_eq!(overlays.rotation("highway-0"), 355.0);

    overlays.set_rotation("highway-0", 360.0);
    assert_eq!(overlays.rotation("highway-0"), 0.0);
}

#[test]
fn test_reshape_clamps_per_axis() {
    let mut overlays = OverlayStore::new();

    for _ in 0..60 {
        overlays.adjust_reshape("cluster-0", 10.0, -10.0);
    }
    let delta = overlays.reshape("cluster-0");
    assert_eq!(delta.width, RESHAPE_MAX);
    assert_eq!(delta.height, RESHAPE_MIN);
}

#[test]
fn test_serde_round_trip() {
    let mut overlays = OverlayStore::new();
    overlays.set_position(
        "cluster-0",
        SurfacePoint::new(100.0, 100.0),
        SurfacePoint::new(340.0, 220.0),
    );
    overlays.set_size("cafe-7", 65.0);
    overlays.set_rotation("highway-2", 35.0);
    overlays.adjust_reshape("cluster-0", 30.0, -20.0);
    overlays
        .break_path_mut("cluster-0")
        .points
        .push(SurfacePoint::new(200.0, 160.0));

    let json = serde_json::to_string(&overlays).unwrap();
    let restored: OverlayStore = serde_json::from_str(&json).unwrap();

    assert_eq!(restored.position("cluster-0"), overlays.position("cluster-0"));
    assert_eq!(restored.size("cafe-7"), Some(65.0));
    assert_eq!(restored.rotation("highway-2"), 35.0);
    assert_eq!(restored.reshape("cluster-0"), overlays.reshape("cluster-0"));
    assert_eq!(
        restored.break_path("cluster-0"),
        overlays.break_path("cluster-0")
    );
}
