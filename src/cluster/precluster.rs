//! Same-location precluster phase.
//!
//! POIs sharing a 5-decimal-degree coordinate cell sit within about one
//! meter of each other. Rendering them individually stacks their markers
//! exactly on top of each other, so cells with two or more members always
//! become a cluster before any radius pass runs.

use std::collections::HashMap;

use crate::geo_utils::surface_centroid;
use crate::{Cluster, ClusterConfig, ClusterPhase, SurfacePoint};

use super::ClusterCandidate;

/// Group candidates by coordinate cell and emit a cluster per cell with
/// two or more members. Cell order follows the first member's position in
/// the candidate slice, keeping ids stable across runs.
pub fn precluster_same_location(
    candidates: &[ClusterCandidate],
    config: &ClusterConfig,
    next_id: &mut usize,
) -> Vec<Cluster> {
    let mut cells: HashMap<String, Vec<usize>> = HashMap::new();
    let mut cell_order: Vec<String> = Vec::new();

    for (i, candidate) in candidates.iter().enumerate() {
        let key = candidate.geo.cell_key();
        let entry = cells.entry(key.clone()).or_default();
        if entry.is_empty() {
            cell_order.push(key);
        }
        entry.push(i);
    }

    let mut clusters = Vec::new();
    for key in cell_order {
        let indices = &cells[&key];
        if indices.len() < 2 {
            continue;
        }

        let positions: Vec<SurfacePoint> = indices.iter().map(|&i| candidates[i].surface).collect();
        let mean = surface_centroid(&positions);

        clusters.push(Cluster {
            id: format!("cluster-{}", *next_id),
            members: indices.iter().map(|&i| candidates[i].key.clone()).collect(),
            mean,
            target: mean,
            size: config.cluster_size_px,
            phase: ClusterPhase::SameLocation,
        });
        *next_id += 1;
    }

    clusters
}
