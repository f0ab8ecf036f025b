//! Overlap resolution for cluster targets.
//!
//! Freshly computed cluster targets can land on a road label, another
//! cluster, or the site marker. The resolver pushes the target along the
//! obstacle-to-cluster vector until it clears the minimum separation,
//! with a bounded number of passes and a clamp to the surface rectangle.

use crate::{Cluster, ClusterConfig, Road, SiteMarker, SurfacePoint};

/// A point the cluster target must keep its distance from.
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub position: SurfacePoint,
}

impl Obstacle {
    /// Gather the obstacles relevant to cluster `index`: road label
    /// anchors, every other cluster's target, and the site marker.
    pub fn collect(
        clusters: &[Cluster],
        index: usize,
        roads: &[Road],
        site: &SiteMarker,
    ) -> Vec<Obstacle> {
        let mut obstacles: Vec<Obstacle> = roads
            .iter()
            .map(|r| Obstacle {
                position: r.label_anchor,
            })
            .collect();

        for (i, cluster) in clusters.iter().enumerate() {
            if i != index {
                obstacles.push(Obstacle {
                    position: cluster.target,
                });
            }
        }

        obstacles.push(Obstacle {
            position: site.surface,
        });
        obstacles
    }
}

/// Pushes cluster targets clear of nearby obstacles.
#[derive(Debug)]
pub struct OverlapResolver {
    min_separation: f64,
    max_retries: u32,
    surface_width: f64,
    surface_height: f64,
}

impl OverlapResolver {
    pub fn new(config: &ClusterConfig) -> Self {
        Self {
            min_separation: config.min_separation_px,
            max_retries: config.max_overlap_retries,
            surface_width: config.surface_width,
            surface_height: config.surface_height,
        }
    }

    /// Resolve a target position against the obstacles.
    ///
    /// Each pass moves the target away from the nearest offending obstacle
    /// to separation plus a 20 px margin. Iteration stops when no obstacle
    /// is within the separation or after `max_retries` passes. The result
    /// is clamped to the surface. Deterministic for a given obstacle order.
    pub fn resolve(&self, target: SurfacePoint, obstacles: &[Obstacle]) -> SurfacePoint {
        let mut position = target;

        for _ in 0..self.max_retries {
            let offender = obstacles
                .iter()
                .map(|o| (position.distance_to(&o.position), o))
                .filter(|(dist, _)| *dist < self.min_separation)
                .min_by(|(a, _), (b, _)| a.total_cmp(b));

            let (dist, obstacle) = match offender {
                Some(found) => found,
                None => break,
            };

            position = self.push_away(position, obstacle.position, dist);
        }

        position
    }

    fn push_away(&self, position: SurfacePoint, from: SurfacePoint, dist: f64) -> SurfacePoint {
        let push_to = self.min_separation + 20.0;

        let (dx, dy) = if dist > 0.0 {
            ((position.x - from.x) / dist, (position.y - from.y) / dist)
        } else {
            // Coincident points have no direction, push straight down
            (0.0, 1.0)
        };

        SurfacePoint::new(
            (from.x + dx * push_to).clamp(0.0, self.surface_width),
            (from.y + dy * push_to).clamp(0.0, self.surface_height),
        )
    }
}
