//! POI clustering pipeline.
//!
//! Clustering runs in three phases over the selected POIs of every
//! category:
//!
//! 1. Same-location precluster: POIs sharing a 5-decimal coordinate cell
//!    (about one meter) always cluster, regardless of radius settings.
//! 2. Primary radius pass (100 m default) over the remaining POIs.
//! 3. Fallback radius pass (300 m default) over what the primary pass
//!    left unclustered.
//!
//! Radius candidates are split by the road-side grouper before becoming
//! clusters, and every new cluster target runs through the overlap
//! resolver. The first successful run is frozen by the assignment store;
//! later layout passes restore the snapshot instead of re-clustering.

mod assignments;
mod overlap;
mod precluster;
mod radius;
mod road_side;

pub use assignments::{AssignmentStore, ClusterSnapshot, FrozenCluster};
pub use overlap::{Obstacle, OverlapResolver};
pub use precluster::precluster_same_location;
pub use radius::radius_cluster;
pub use road_side::RoadSideGrouper;

use crate::{Cluster, ClusterConfig, GeoPoint, PoiKey, Road, SiteMarker, SurfacePoint};

/// A POI offered to the clustering pipeline.
#[derive(Debug, Clone)]
pub struct ClusterCandidate {
    pub key: PoiKey,
    pub geo: GeoPoint,
    pub surface: SurfacePoint,
}

/// Orchestrates the clustering phases into a single computed layout.
#[derive(Debug)]
pub struct ClusterEngine {
    config: ClusterConfig,
}

impl ClusterEngine {
    pub fn new(config: ClusterConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ClusterConfig {
        &self.config
    }

    /// Run the full pipeline over the given candidates.
    ///
    /// Candidates must arrive in fetch order; the radius phases honor that
    /// order and first-found clusters win. Returns the clusters and the
    /// keys that stayed singleton.
    pub fn compute(
        &self,
        candidates: &[ClusterCandidate],
        roads: &[Road],
        site: &SiteMarker,
    ) -> (Vec<Cluster>, Vec<PoiKey>) {
        let mut clusters = Vec::new();
        let mut next_id = 0usize;

        let mut remaining: Vec<ClusterCandidate> = candidates.to_vec();

        // Phase 1: exact same-location cells
        let preclusters = precluster_same_location(&remaining, &self.config, &mut next_id);
        let clustered: std::collections::HashSet<PoiKey> = preclusters
            .iter()
            .flat_map(|c| c.members.iter().cloned())
            .collect();
        remaining.retain(|c| !clustered.contains(&c.key));
        clusters.extend(preclusters);

        // Phases 2 and 3: radius passes, fallback only over leftovers
        let grouper = RoadSideGrouper::new(&self.config, roads);
        let resolver = OverlapResolver::new(&self.config);

        for (radius, phase) in [
            (
                self.config.primary_radius_meters,
                crate::ClusterPhase::Radius100,
            ),
            (
                self.config.secondary_radius_meters,
                crate::ClusterPhase::Radius300,
            ),
        ] {
            let pass = radius_cluster(
                &remaining,
                radius,
                phase,
                &grouper,
                &self.config,
                &mut next_id,
            );
            let clustered: std::collections::HashSet<PoiKey> = pass
                .iter()
                .flat_map(|c| c.members.iter().cloned())
                .collect();
            remaining.retain(|c| !clustered.contains(&c.key));
            clusters.extend(pass);
        }

        // Push every cluster target clear of roads, peers, and the site
        for i in 0..clusters.len() {
            let obstacles = Obstacle::collect(&clusters, i, roads, site);
            clusters[i].target = resolver.resolve(clusters[i].target, &obstacles);
        }

        let singles = remaining.into_iter().map(|c| c.key).collect();
        (clusters, singles)
    }
}
