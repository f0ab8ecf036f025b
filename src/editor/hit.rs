//! Pointer hit-testing against the render scene.
//!
//! Priority order: cluster boxes first, then individual POIs, then road
//! labels, then the site marker. The first match wins so a POI sitting on
//! a cluster edge never steals the cluster's drag.

use crate::render::RenderScene;
use crate::{EntityKey, SurfacePoint};

/// Click radius around an individual POI marker, in px.
pub const POI_HIT_RADIUS: f64 = 30.0;
/// Click radius around a road label anchor, in px.
pub const ROAD_LABEL_HIT_RADIUS: f64 = 50.0;
/// Minimum click radius around the site marker, in px.
pub const SITE_MIN_HIT_RADIUS: f64 = 30.0;

/// Find the topmost entity under the pointer.
pub fn hit_test(scene: &RenderScene, p: &SurfacePoint) -> Option<EntityKey> {
    for cluster in &scene.clusters {
        if (p.x - cluster.position.x).abs() <= cluster.width / 2.0
            && (p.y - cluster.position.y).abs() <= cluster.height / 2.0
        {
            return Some(EntityKey::Cluster(cluster.id.clone()));
        }
    }

    for poi in &scene.pois {
        if p.distance_to(&poi.position) <= POI_HIT_RADIUS {
            return Some(EntityKey::Poi(poi.key.clone()));
        }
    }

    for road in &scene.roads {
        if p.distance_to(&road.label_position) <= ROAD_LABEL_HIT_RADIUS {
            return Some(EntityKey::Road(road.index));
        }
    }

    if let Some(site) = &scene.site {
        if p.distance_to(&site.position) <= site.radius.max(SITE_MIN_HIT_RADIUS) {
            return Some(EntityKey::Site);
        }
    }

    None
}

/// Current rendered position of an entity, overrides applied.
pub fn entity_position(scene: &RenderScene, key: &EntityKey) -> Option<SurfacePoint> {
    match key {
        EntityKey::Cluster(id) => scene
            .clusters
            .iter()
            .find(|c| &c.id == id)
            .map(|c| c.position),
        EntityKey::Poi(poi_key) => scene
            .pois
            .iter()
            .find(|p| &p.key == poi_key)
            .map(|p| p.position),
        EntityKey::Road(index) => scene
            .roads
            .iter()
            .find(|r| r.index == *index)
            .map(|r| r.label_position),
        EntityKey::Site => scene.site.as_ref().map(|s| s.position),
    }
}
