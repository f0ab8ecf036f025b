//! # poimap
//!
//! POI clustering and map annotation engine for site analysis layouts.
//!
//! This library provides:
//! - Geographic-to-surface projection for a fixed rendering viewport
//! - Three-phase POI clustering (same-location, 100m, 300m fallback)
//!   with road-side separation
//! - Frozen cluster assignments (clustering runs once, later layout
//!   passes only filter and restore)
//! - An edit-mode state machine for drag/resize/rotate/reshape and
//!   break-line overrides over the computed layout
//! - A write-behind persistence queue for overlay state
//!
//! ## Quick Start
//!
//! ```rust
//! use poimap::{AnalysisSession, ClusterConfig, GeoPoint, Poi, SiteMarker};
//!
//! let site = SiteMarker::new(GeoPoint::new(28.5383, -81.3792), 25.0);
//! let mut session = AnalysisSession::new(site, ClusterConfig::default());
//! session.set_category(
//!     "restaurant",
//!     vec![
//!         Poi::new(1, "Coffee North", GeoPoint::new(28.5393, -81.3792), "restaurant"),
//!         Poi::new(2, "Coffee South", GeoPoint::new(28.5394, -81.3792), "restaurant"),
//!     ],
//! );
//!
//! let scene = session.layout();
//! let placed: usize = scene.clusters.iter().map(|c| c.members.len()).sum::<usize>()
//!     + scene.pois.len();
//! assert_eq!(placed, 2);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{PoiMapError, Result};

// Union-Find data structure for road-side grouping
pub mod union_find;
pub use union_find::UnionFind;

// Geographic utilities (distance, bearing, unit conversions)
pub mod geo_utils;

// Geographic-to-surface projection
pub mod projector;
pub use projector::SurfaceProjector;

// Clustering pipeline (precluster, radius phases, road-side split, overlaps)
pub mod cluster;
pub use cluster::{
    AssignmentStore, ClusterCandidate, ClusterEngine, ClusterSnapshot, OverlapResolver,
    RoadSideGrouper,
};

// User overlay state (positions, sizes, rotations, reshapes, break paths)
pub mod overlay;
pub use overlay::{BreakPath, OverlayStore, PositionOverride, ReshapeDelta};

// Edit mode state machine and input routing
pub mod editor;
pub use editor::{EditMode, EditorController, Key, PointerButton, PointerEvent};

// Write-behind persistence queue
pub mod persist;
pub use persist::{MemoryStore, OverlayKind, PersistQueue, PersistStore};

// External POI/logo source pipeline
pub mod source;
pub use source::{fetch_with_retry, FetchPlan, LogoResolver, PoiRecord, PoiSource, SourceConfig};

// Render scene assembly
pub mod render;
pub use render::{ClusterBox, ConnectorLine, LogoGrid, RenderScene};

// Session context owning layout and edit state
pub mod session;
pub use session::AnalysisSession;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate with latitude and longitude.
///
/// # Example
/// ```
/// use poimap::GeoPoint;
/// let point = GeoPoint::new(28.5383, -81.3792); // Orlando
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && self.lat >= -90.0
            && self.lat <= 90.0
            && self.lng >= -180.0
            && self.lng <= 180.0
    }

    /// Cell key at 5-decimal precision (~1m), used by the same-location
    /// precluster phase.
    pub fn cell_key(&self) -> String {
        format!("{:.5},{:.5}", self.lat, self.lng)
    }
}

/// A position on the rendering surface, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SurfacePoint {
    pub x: f64,
    pub y: f64,
}

impl SurfacePoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another surface point.
    pub fn distance_to(&self, other: &SurfacePoint) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

/// Geographic bounding rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from geographic points.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.lat);
            max_lat = max_lat.max(p.lat);
            min_lng = min_lng.min(p.lng);
            max_lng = max_lng.max(p.lng);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }

    /// Expand by a margin in degrees on every side.
    pub fn expanded(&self, margin: f64) -> Self {
        Self {
            min_lat: self.min_lat - margin,
            max_lat: self.max_lat + margin,
            min_lng: self.min_lng - margin,
            max_lng: self.max_lng + margin,
        }
    }
}

/// A point of interest within a fetched category collection.
///
/// Immutable layout input; position and size overrides live in
/// [`OverlayStore`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Poi {
    /// Identifier from the upstream provider
    pub id: u64,
    pub name: String,
    pub geo: GeoPoint,
    pub category: String,
    /// Distance from the site marker in meters
    pub distance_meters: f64,
    /// Resolved logo URL, if enrichment succeeded
    pub logo_url: Option<String>,
    /// Projected surface position (assigned during layout)
    #[serde(default)]
    pub surface: SurfacePoint,
    /// Excluded from clustering when set
    #[serde(default)]
    pub prevent_clustering: bool,
}

impl Poi {
    pub fn new(id: u64, name: &str, geo: GeoPoint, category: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            geo,
            category: category.to_string(),
            distance_meters: 0.0,
            logo_url: None,
            surface: SurfacePoint::default(),
            prevent_clustering: false,
        }
    }
}

/// Stable reference to a POI by its category, fetch index, and provider id.
///
/// Clusters store these instead of object handles so a frozen snapshot can
/// be re-filtered against the live selection on later layout passes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiKey {
    pub category: String,
    pub index: usize,
    pub source_id: u64,
}

impl PoiKey {
    pub fn new(category: &str, index: usize, source_id: u64) -> Self {
        Self {
            category: category.to_string(),
            index,
            source_id,
        }
    }
}

/// A physical road with its polyline and a representative label anchor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Road {
    pub name: String,
    pub road_class: String,
    /// Ordered geographic polyline
    pub path: Vec<GeoPoint>,
    /// Representative center used for relevance checks
    pub center: GeoPoint,
    /// Projected polyline (assigned during layout)
    #[serde(default)]
    pub surface_path: Vec<SurfacePoint>,
    /// Projected label anchor (assigned during layout)
    #[serde(default)]
    pub label_anchor: SurfacePoint,
}

impl Road {
    /// Build a road from a raw provider polyline, simplified with
    /// Douglas-Peucker so side checks stay cheap on dense geometry.
    ///
    /// Returns `None` if fewer than 2 valid points remain.
    pub fn from_path(name: &str, road_class: &str, path: &[GeoPoint]) -> Option<Self> {
        use geo::{algorithm::simplify::Simplify, Coord, LineString};

        let coords: Vec<Coord> = path
            .iter()
            .filter(|p| p.is_valid())
            .map(|p| Coord { x: p.lng, y: p.lat })
            .collect();
        if coords.len() < 2 {
            return None;
        }

        let simplified = LineString::new(coords).simplify(&0.0001);
        let path: Vec<GeoPoint> = simplified
            .0
            .iter()
            .map(|c| GeoPoint::new(c.y, c.x))
            .collect();
        let center = Bounds::from_points(&path)?.center();

        Some(Self {
            name: name.to_string(),
            road_class: road_class.to_string(),
            path,
            center,
            surface_path: Vec::new(),
            label_anchor: SurfacePoint::default(),
        })
    }
}

/// The singleton site marker at the center of the analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteMarker {
    pub geo: GeoPoint,
    /// Marker radius in px
    pub radius: f64,
    /// Projected position (assigned during layout)
    #[serde(default)]
    pub surface: SurfacePoint,
}

impl SiteMarker {
    pub fn new(geo: GeoPoint, radius: f64) -> Self {
        Self {
            geo,
            radius,
            surface: SurfacePoint::default(),
        }
    }
}

/// Which clustering phase produced a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClusterPhase {
    SameLocation,
    Radius100,
    Radius300,
}

/// A group of two or more POIs rendered as one visual unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    /// Member references in fetch order
    pub members: Vec<PoiKey>,
    /// Centroid of the members' surface positions
    pub mean: SurfacePoint,
    /// Rendered anchor position, after overlap resolution
    pub target: SurfacePoint,
    /// Base box size in px
    pub size: f64,
    pub phase: ClusterPhase,
}

/// Stable string identity for every draggable entity. These ids key the
/// overlay maps and the persisted payloads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EntityKey {
    Poi(PoiKey),
    Cluster(String),
    Road(usize),
    Site,
}

impl EntityKey {
    /// Storage key used in persisted overlay maps.
    pub fn storage_key(&self) -> String {
        match self {
            EntityKey::Poi(key) => format!("{}-{}", key.category, key.source_id),
            EntityKey::Cluster(id) => id.clone(),
            EntityKey::Road(idx) => format!("highway-{idx}"),
            EntityKey::Site => "siteMarker".to_string(),
        }
    }
}

/// Configuration for the clustering pipeline.
///
/// Distance limits are inclusive: a pair exactly at the radius clusters.
#[derive(Debug, Clone)]
pub struct ClusterConfig {
    /// Primary clustering radius in meters.
    /// Default: 100.0
    pub primary_radius_meters: f64,

    /// Fallback clustering radius in meters, applied to POIs the primary
    /// phase left unclustered. Default: 300.0
    pub secondary_radius_meters: f64,

    /// A road is only considered for side checks when its center is within
    /// this distance of the candidate centroid. Default: 500.0 meters
    pub road_relevance_meters: f64,

    /// Road segments further than this from a POI pair's midpoint are
    /// ignored for side checks. Default: 300.0 px
    pub segment_cutoff_px: f64,

    /// Signed offsets below this magnitude count as on the line.
    /// Default: 30.0 px
    pub side_tolerance_px: f64,

    /// Minimum separation kept between a cluster and roads, other clusters,
    /// and the site marker. Default: 100.0 px
    pub min_separation_px: f64,

    /// Upper bound on overlap-resolution passes per cluster. Default: 50
    pub max_overlap_retries: u32,

    /// Initial cluster box size in px. Default: 80.0
    pub cluster_size_px: f64,

    /// Rendering surface width in px. Default: 1400.0
    pub surface_width: f64,

    /// Rendering surface height in px. Default: 900.0
    pub surface_height: f64,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            primary_radius_meters: 100.0,
            secondary_radius_meters: 300.0,
            road_relevance_meters: 500.0,
            segment_cutoff_px: 300.0,
            side_tolerance_px: 30.0,
            min_separation_px: 100.0,
            max_overlap_retries: 50,
            cluster_size_px: 80.0,
            surface_width: 1400.0,
            surface_height: 900.0,
        }
    }
}
