//! Tests for the clustering pipeline

use poimap::cluster::Obstacle;
use poimap::geo_utils::haversine_distance;
use poimap::{
    ClusterCandidate, ClusterConfig, ClusterEngine, ClusterPhase, GeoPoint, OverlapResolver,
    PoiKey, Road, SiteMarker, SurfacePoint,
};

fn candidate(index: usize, lat: f64, lng: f64, x: f64, y: f64) -> ClusterCandidate {
    ClusterCandidate {
        key: PoiKey::new("cafe", index, index as u64),
        geo: GeoPoint::new(lat, lng),
        surface: SurfacePoint::new(x, y),
    }
}

fn site_at(x: f64, y: f64) -> SiteMarker {
    let mut site = SiteMarker::new(GeoPoint::new(0.0, 0.0), 25.0);
    site.surface = SurfacePoint::new(x, y);
    site
}

// At the equator, 0.001 degrees of latitude is about 111 meters.

#[test]
fn test_same_location_always_clusters() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    let candidates = vec![
        candidate(0, 1.23456, 2.34567, 100.0, 100.0),
        candidate(1, 1.23456, 2.34567, 100.0, 100.0),
    ];

    let (clusters, singles) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].phase, ClusterPhase::SameLocation);
    assert_eq!(clusters[0].members.len(), 2);
    assert!(singles.is_empty());
}

#[test]
fn test_primary_radius_clusters_close_pair() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    // 0.0005 degrees apart, about 56 meters
    let candidates = vec![
        candidate(0, 0.0, 0.0, 100.0, 100.0),
        candidate(1, 0.0005, 0.0, 100.0, 160.0),
    ];

    let (clusters, singles) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].phase, ClusterPhase::Radius100);
    assert!(singles.is_empty());
}

#[test]
fn test_fallback_radius_catches_mid_range_pair() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    // 0.0018 degrees apart, about 200 meters: past the primary radius,
    // within the fallback
    let candidates = vec![
        candidate(0, 0.0, 0.0, 100.0, 100.0),
        candidate(1, 0.0018, 0.0, 100.0, 300.0),
    ];

    let (clusters, _) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].phase, ClusterPhase::Radius300);
}

#[test]
fn test_pair_exactly_at_primary_radius_clusters() {
    // Distance limits are inclusive, so a pair sitting exactly on the
    // radius still clusters
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(0.0005, 0.0);
    let exact = haversine_distance(&a, &b);

    let mut config = ClusterConfig::default();
    config.primary_radius_meters = exact;
    let engine = ClusterEngine::new(config);

    let candidates = vec![
        candidate(0, a.lat, a.lng, 100.0, 100.0),
        candidate(1, b.lat, b.lng, 100.0, 160.0),
    ];
    let (clusters, singles) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].phase, ClusterPhase::Radius100);
    assert!(singles.is_empty());
}

#[test]
fn test_pair_exactly_at_fallback_radius_clusters() {
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(0.0018, 0.0);
    let exact = haversine_distance(&a, &b);

    let mut config = ClusterConfig::default();
    config.secondary_radius_meters = exact;
    let engine = ClusterEngine::new(config);

    let candidates = vec![
        candidate(0, a.lat, a.lng, 100.0, 100.0),
        candidate(1, b.lat, b.lng, 100.0, 300.0),
    ];
    let (clusters, _) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].phase, ClusterPhase::Radius300);
}

#[test]
fn test_pair_just_past_both_radii_stays_apart() {
    let a = GeoPoint::new(0.0, 0.0);
    let b = GeoPoint::new(0.0005, 0.0);
    let exact = haversine_distance(&a, &b);

    // Both limits a hair under the pair distance
    let mut config = ClusterConfig::default();
    config.primary_radius_meters = exact - 0.001;
    config.secondary_radius_meters = exact - 0.001;
    let engine = ClusterEngine::new(config);

    let candidates = vec![
        candidate(0, a.lat, a.lng, 100.0, 100.0),
        candidate(1, b.lat, b.lng, 100.0, 160.0),
    ];
    let (clusters, singles) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert!(clusters.is_empty());
    assert_eq!(singles.len(), 2);
}

#[test]
fn test_far_pair_stays_singleton() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    // 0.003 degrees apart, about 334 meters: beyond both radii
    let candidates = vec![
        candidate(0, 0.0, 0.0, 100.0, 100.0),
        candidate(1, 0.003, 0.0, 100.0, 430.0),
    ];

    let (clusters, singles) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert!(clusters.is_empty());
    assert_eq!(singles.len(), 2);
}

#[test]
fn test_mean_is_member_centroid() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    let candidates = vec![
        candidate(0, 0.0, 0.0, 100.0, 100.0),
        candidate(1, 0.0005, 0.0, 200.0, 200.0),
    ];

    let (clusters, _) = engine.compute(&candidates, &[], &site_at(900.0, 800.0));
    assert_eq!(clusters[0].mean, SurfacePoint::new(150.0, 150.0));
}

#[test]
fn test_compute_is_deterministic() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    let candidates = vec![
        candidate(0, 0.0, 0.0, 100.0, 100.0),
        candidate(1, 0.0005, 0.0, 100.0, 160.0),
        candidate(2, 0.01, 0.01, 700.0, 500.0),
        candidate(3, 0.0102, 0.01, 700.0, 530.0),
    ];
    let site = site_at(1300.0, 850.0);

    let (first, first_singles) = engine.compute(&candidates, &[], &site);
    let (second, second_singles) = engine.compute(&candidates, &[], &site);

    assert_eq!(first.len(), second.len());
    assert_eq!(first_singles, second_singles);
    for (a, b) in first.iter().zip(second.iter()) {
        assert_eq!(a.id, b.id);
        assert_eq!(a.members, b.members);
        assert_eq!(a.target, b.target);
    }
}

// ----------------------------------------------------------------------
// Road-side separation
// ----------------------------------------------------------------------

fn road_through(x: f64) -> Road {
    Road {
        name: "Main St".to_string(),
        road_class: "primary".to_string(),
        path: vec![GeoPoint::new(-0.001, 0.0), GeoPoint::new(0.002, 0.0)],
        center: GeoPoint::new(0.00025, 0.0),
        surface_path: vec![SurfacePoint::new(x, 0.0), SurfacePoint::new(x, 900.0)],
        label_anchor: SurfacePoint::new(x, 450.0),
    }
}

#[test]
fn test_opposite_road_sides_do_not_cluster() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    // Close in geo space but on opposite sides of the road at x=100,
    // both more than 30px clear of the line
    let candidates = vec![
        candidate(0, 0.0, 0.0, 40.0, 100.0),
        candidate(1, 0.0005, 0.0, 160.0, 100.0),
    ];

    let (clusters, singles) =
        engine.compute(&candidates, &[road_through(100.0)], &site_at(1300.0, 850.0));
    assert!(clusters.is_empty());
    assert_eq!(singles.len(), 2);
}

#[test]
fn test_same_road_side_clusters() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    let candidates = vec![
        candidate(0, 0.0, 0.0, 160.0, 100.0),
        candidate(1, 0.0005, 0.0, 200.0, 120.0),
    ];

    let (clusters, _) =
        engine.compute(&candidates, &[road_through(100.0)], &site_at(1300.0, 850.0));
    assert_eq!(clusters.len(), 1);
    assert_eq!(clusters[0].members.len(), 2);
}

#[test]
fn test_point_on_the_line_joins_either_side() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    // One POI within the 30px tolerance band counts as same-side
    let candidates = vec![
        candidate(0, 0.0, 0.0, 110.0, 100.0),
        candidate(1, 0.0005, 0.0, 180.0, 100.0),
    ];

    let (clusters, _) =
        engine.compute(&candidates, &[road_through(100.0)], &site_at(1300.0, 850.0));
    assert_eq!(clusters.len(), 1);
}

#[test]
fn test_distant_road_is_ignored() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    // Road center is about 11km away, well past the 500m relevance limit
    let mut road = road_through(100.0);
    road.center = GeoPoint::new(0.1, 0.0);

    let candidates = vec![
        candidate(0, 0.0, 0.0, 40.0, 100.0),
        candidate(1, 0.0005, 0.0, 160.0, 100.0),
    ];

    let (clusters, _) = engine.compute(&candidates, &[road], &site_at(1300.0, 850.0));
    assert_eq!(clusters.len(), 1);
}

// ----------------------------------------------------------------------
// Overlap resolution
// ----------------------------------------------------------------------

#[test]
fn test_cluster_pushed_off_site_marker() {
    let engine = ClusterEngine::new(ClusterConfig::default());

    let candidates = vec![
        candidate(0, 0.0, 0.0, 200.0, 200.0),
        candidate(1, 0.0005, 0.0, 200.0, 200.0 + 1e-6),
    ];
    let site = site_at(200.0, 200.0);

    let (clusters, _) = engine.compute(&candidates, &[], &site);
    assert_eq!(clusters.len(), 1);

    let dist = clusters[0].target.distance_to(&site.surface);
    assert!(dist >= 100.0, "target only {dist}px from the site marker");
    // Mean stays at the member centroid even after the push
    assert!(clusters[0].mean.distance_to(&SurfacePoint::new(200.0, 200.0)) < 1.0);
}

#[test]
fn test_resolver_respects_surface_bounds() {
    let config = ClusterConfig::default();
    let resolver = OverlapResolver::new(&config);

    let obstacles = vec![Obstacle {
        position: SurfacePoint::new(1395.0, 895.0),
    }];
    let resolved = resolver.resolve(SurfacePoint::new(1398.0, 898.0), &obstacles);

    assert!(resolved.x >= 0.0 && resolved.x <= config.surface_width);
    assert!(resolved.y >= 0.0 && resolved.y <= config.surface_height);
}

#[test]
fn test_resolver_leaves_clear_targets_alone() {
    let config = ClusterConfig::default();
    let resolver = OverlapResolver::new(&config);

    let obstacles = vec![Obstacle {
        position: SurfacePoint::new(500.0, 500.0),
    }];
    let target = SurfacePoint::new(100.0, 100.0);
    assert_eq!(resolver.resolve(target, &obstacles), target);
}
