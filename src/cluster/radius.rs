//! Radius clustering pass.
//!
//! Walks the not-yet-clustered candidates in fetch order. For each seed,
//! an R-tree prefilter in degree space narrows the neighbor set before the
//! exact great-circle check. Distance comparison is inclusive: a pair
//! exactly at the radius clusters.

use std::collections::HashSet;

use rstar::{RTree, RTreeObject, AABB};

use crate::geo_utils::{haversine_distance, meters_to_degrees, surface_centroid};
use crate::{Cluster, ClusterConfig, ClusterPhase, PoiKey, SurfacePoint};

use super::{ClusterCandidate, RoadSideGrouper};

/// Candidate point wrapper for R-tree indexing.
#[derive(Debug, Clone)]
struct CandidatePoint {
    index: usize,
    lat: f64,
    lng: f64,
}

impl RTreeObject for CandidatePoint {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point([self.lng, self.lat])
    }
}

/// Run one radius pass over the candidates.
///
/// Candidate sets are split by the road-side grouper; each same-side
/// sub-group of two or more members becomes a cluster tagged with `phase`.
/// First-found clusters win: members of an emitted cluster are never
/// reconsidered as neighbors for later seeds in the same pass.
pub fn radius_cluster(
    candidates: &[ClusterCandidate],
    radius_meters: f64,
    phase: ClusterPhase,
    grouper: &RoadSideGrouper,
    config: &ClusterConfig,
    next_id: &mut usize,
) -> Vec<Cluster> {
    let tree = RTree::bulk_load(
        candidates
            .iter()
            .enumerate()
            .map(|(index, c)| CandidatePoint {
                index,
                lat: c.geo.lat,
                lng: c.geo.lng,
            })
            .collect(),
    );

    let mut clusters = Vec::new();
    let mut taken: HashSet<usize> = HashSet::new();

    for (seed_idx, seed) in candidates.iter().enumerate() {
        if taken.contains(&seed_idx) {
            continue;
        }

        // Padded degree-space prefilter; the exact check below decides
        let radius_deg = meters_to_degrees(radius_meters, seed.geo.lat) * 1.1;
        let search = AABB::from_corners(
            [seed.geo.lng - radius_deg, seed.geo.lat - radius_deg],
            [seed.geo.lng + radius_deg, seed.geo.lat + radius_deg],
        );

        let mut group: Vec<usize> = tree
            .locate_in_envelope_intersecting(&search)
            .filter(|p| !taken.contains(&p.index))
            .filter(|p| {
                haversine_distance(&seed.geo, &candidates[p.index].geo) <= radius_meters
            })
            .map(|p| p.index)
            .collect();
        group.sort_unstable();

        if group.len() < 2 {
            continue;
        }

        let members: Vec<ClusterCandidate> =
            group.iter().map(|&i| candidates[i].clone()).collect();

        for side_group in grouper.split(&members) {
            if side_group.len() < 2 {
                continue;
            }

            let positions: Vec<SurfacePoint> = side_group
                .iter()
                .map(|key| member_surface(&members, key))
                .collect();
            let mean = surface_centroid(&positions);

            clusters.push(Cluster {
                id: format!("cluster-{}", *next_id),
                members: side_group.clone(),
                mean,
                target: mean,
                size: config.cluster_size_px,
                phase,
            });
            *next_id += 1;

            for key in &side_group {
                if let Some(&idx) = group
                    .iter()
                    .find(|&&i| candidates[i].key == *key)
                {
                    taken.insert(idx);
                }
            }
        }
    }

    clusters
}

fn member_surface(members: &[ClusterCandidate], key: &PoiKey) -> SurfacePoint {
    members
        .iter()
        .find(|m| m.key == *key)
        .map(|m| m.surface)
        .unwrap_or_default()
}
