//! Render scene assembly.
//!
//! Builds the final drawable description of a layout pass: cluster boxes
//! with their logo grids, unclustered POIs, road polylines with label
//! anchors, the site marker, and connector lines for every entity the
//! user has dragged away from its computed position. No drawing happens
//! here; the host renderer consumes the scene as-is.

use serde::{Deserialize, Serialize};

use crate::overlay::{OverlayStore, ReshapeDelta};
use crate::{Cluster, EntityKey, Poi, PoiKey, Road, SiteMarker, SurfacePoint};

/// Width multiplier for the cluster box relative to its base size.
const BOX_WIDTH_FACTOR: f64 = 1.5;
/// Height multiplier for the cluster box relative to its base size.
const BOX_HEIGHT_FACTOR: f64 = 1.2;

/// Logo grid dimensions inside a cluster box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogoGrid {
    pub cols: usize,
    pub rows: usize,
}

impl LogoGrid {
    /// Balance a grid for `count` logos given the box's reshape deltas.
    ///
    /// A square-ish grid is the baseline. When the user grew one axis
    /// noticeably more than the other, the grid leans that way: wider
    /// boxes get more columns, taller boxes more rows.
    pub fn balanced(count: usize, reshape: ReshapeDelta) -> Self {
        if count == 0 {
            return Self { cols: 0, rows: 0 };
        }

        let root = (count as f64).sqrt();
        let (cols, rows) = if reshape.width > reshape.height {
            let cols = (root * (1.0 + reshape.width / 200.0)).ceil().max(1.0) as usize;
            let cols = cols.min(count);
            (cols, count.div_ceil(cols))
        } else if reshape.height > reshape.width {
            let rows = (root * (1.0 + reshape.height / 200.0)).ceil().max(1.0) as usize;
            let rows = rows.min(count);
            (count.div_ceil(rows), rows)
        } else {
            let cols = root.ceil().max(1.0) as usize;
            (cols, count.div_ceil(cols))
        };

        Self { cols, rows }
    }
}

/// A cluster ready to draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterBox {
    pub id: String,
    pub members: Vec<PoiKey>,
    /// Box center after drag overrides
    pub position: SurfacePoint,
    pub width: f64,
    pub height: f64,
    pub grid: LogoGrid,
    /// Logo URLs in member order, `None` where enrichment failed
    pub logos: Vec<Option<String>>,
}

/// An unclustered POI ready to draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedPoi {
    pub key: PoiKey,
    pub name: String,
    pub position: SurfacePoint,
    pub size: f64,
    pub logo_url: Option<String>,
}

/// A road polyline with its label placement.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedRoad {
    pub index: usize,
    pub name: String,
    pub road_class: String,
    pub path: Vec<SurfacePoint>,
    pub label_position: SurfacePoint,
    /// Label rotation in degrees, [0, 360)
    pub label_rotation: f64,
}

/// The site marker ready to draw.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlacedSite {
    pub position: SurfacePoint,
    pub radius: f64,
}

/// A connector from an entity's computed anchor to its dragged position,
/// routed through the user's bend points.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectorLine {
    /// Storage key of the dragged entity
    pub key: String,
    /// Origin, bend points, then the override position
    pub points: Vec<SurfacePoint>,
}

/// Complete scene for one layout pass.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderScene {
    pub clusters: Vec<ClusterBox>,
    pub pois: Vec<PlacedPoi>,
    pub roads: Vec<PlacedRoad>,
    pub site: Option<PlacedSite>,
    pub connectors: Vec<ConnectorLine>,
}

/// Default rendered size for an individual POI marker, in px.
pub const DEFAULT_POI_SIZE: f64 = 40.0;

/// Assemble the scene from computed layout and overlays.
pub fn assemble_scene(
    clusters: &[Cluster],
    single_pois: &[(PoiKey, &Poi)],
    roads: &[Road],
    site: &SiteMarker,
    poi_of: impl Fn(&PoiKey) -> Option<Poi>,
    overlays: &OverlayStore,
) -> RenderScene {
    let mut scene = RenderScene::default();

    for cluster in clusters {
        let key = EntityKey::Cluster(cluster.id.clone()).storage_key();
        let position = overlays
            .position(&key)
            .map(|o| o.current)
            .unwrap_or(cluster.target);

        let reshape = overlays.reshape(&key);
        let size = overlays.size(&key).unwrap_or(cluster.size);
        let width = size * BOX_WIDTH_FACTOR + reshape.width;
        let height = size * BOX_HEIGHT_FACTOR + reshape.height;

        let logos = cluster
            .members
            .iter()
            .map(|k| poi_of(k).and_then(|p| p.logo_url))
            .collect();

        scene.clusters.push(ClusterBox {
            id: cluster.id.clone(),
            members: cluster.members.clone(),
            position,
            width,
            height,
            grid: LogoGrid::balanced(cluster.members.len(), reshape),
            logos,
        });

        push_connector(&mut scene, overlays, &key, cluster.target);
    }

    for (key, poi) in single_pois {
        let storage = EntityKey::Poi(key.clone()).storage_key();
        let position = overlays
            .position(&storage)
            .map(|o| o.current)
            .unwrap_or(poi.surface);

        scene.pois.push(PlacedPoi {
            key: key.clone(),
            name: poi.name.clone(),
            position,
            size: overlays.size(&storage).unwrap_or(DEFAULT_POI_SIZE),
            logo_url: poi.logo_url.clone(),
        });

        push_connector(&mut scene, overlays, &storage, poi.surface);
    }

    for (index, road) in roads.iter().enumerate() {
        let storage = EntityKey::Road(index).storage_key();
        let label_position = overlays
            .position(&storage)
            .map(|o| o.current)
            .unwrap_or(road.label_anchor);

        scene.roads.push(PlacedRoad {
            index,
            name: road.name.clone(),
            road_class: road.road_class.clone(),
            path: road.surface_path.clone(),
            label_position,
            label_rotation: overlays.rotation(&storage),
        });

        push_connector(&mut scene, overlays, &storage, road.label_anchor);
    }

    let site_key = EntityKey::Site.storage_key();
    let site_position = overlays
        .position(&site_key)
        .map(|o| o.current)
        .unwrap_or(site.surface);
    scene.site = Some(PlacedSite {
        position: site_position,
        radius: site.radius,
    });
    push_connector(&mut scene, overlays, &site_key, site.surface);

    scene
}

fn push_connector(
    scene: &mut RenderScene,
    overlays: &OverlayStore,
    key: &str,
    origin: SurfacePoint,
) {
    let Some(position) = overlays.position(key) else {
        return;
    };

    let mut points = vec![origin];
    if let Some(path) = overlays.break_path(key) {
        points.extend(path.points.iter().copied());
    }
    points.push(position.current);

    scene.connectors.push(ConnectorLine {
        key: key.to_string(),
        points,
    });
}
