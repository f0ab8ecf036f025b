//! Road-side splitting of cluster candidates.
//!
//! Two POIs on opposite sides of a road should not share a cluster even
//! when they sit within the clustering radius. The grouper finds the one
//! relevant road for a candidate set, classifies each POI pair against the
//! nearest road segment, and merges same-side pairs with union-find.

use crate::geo_utils::{compute_center, haversine_distance, point_to_segment, side_of_segment};
use crate::{ClusterConfig, PoiKey, Road, SurfacePoint, UnionFind};

use super::ClusterCandidate;

/// Splits candidate sets into same-side sub-groups.
#[derive(Debug)]
pub struct RoadSideGrouper<'a> {
    roads: &'a [Road],
    road_relevance_meters: f64,
    segment_cutoff_px: f64,
    side_tolerance_px: f64,
}

impl<'a> RoadSideGrouper<'a> {
    pub fn new(config: &ClusterConfig, roads: &'a [Road]) -> Self {
        Self {
            roads,
            road_relevance_meters: config.road_relevance_meters,
            segment_cutoff_px: config.segment_cutoff_px,
            side_tolerance_px: config.side_tolerance_px,
        }
    }

    /// Split a candidate set into sub-groups that may each become a cluster.
    ///
    /// With no relevant road the whole set stays together. Sub-groups are
    /// returned in a deterministic order (sorted by their smallest member).
    pub fn split(&self, members: &[ClusterCandidate]) -> Vec<Vec<PoiKey>> {
        let keys: Vec<PoiKey> = members.iter().map(|m| m.key.clone()).collect();

        let road = match self.relevant_road(members) {
            Some(road) => road,
            None => return vec![keys],
        };

        let mut uf: UnionFind<PoiKey> = UnionFind::with_capacity(members.len());
        for key in &keys {
            uf.make_set(key.clone());
        }

        for i in 0..members.len() {
            for j in (i + 1)..members.len() {
                if self.same_side(&members[i].surface, &members[j].surface, road) {
                    uf.union(&members[i].key, &members[j].key);
                }
            }
        }

        let groups = uf.groups();
        let mut roots: Vec<&PoiKey> = groups.keys().collect();
        roots.sort();
        roots.into_iter().map(|root| groups[root].clone()).collect()
    }

    /// The road whose representative center is nearest the candidate
    /// centroid, if it is close enough to matter.
    fn relevant_road(&self, members: &[ClusterCandidate]) -> Option<&'a Road> {
        let centroid = compute_center(&members.iter().map(|m| m.geo).collect::<Vec<_>>());

        self.roads
            .iter()
            .map(|road| (haversine_distance(&road.center, &centroid), road))
            .filter(|(dist, _)| *dist <= self.road_relevance_meters)
            .min_by(|(a, _), (b, _)| a.total_cmp(b))
            .map(|(_, road)| road)
    }

    /// Classify a POI pair against the road segment nearest their midpoint.
    ///
    /// Pairs count as same-side when no segment is near enough, when their
    /// cross-product signs agree, or when either point sits within the
    /// tolerance band around the line.
    fn same_side(&self, a: &SurfacePoint, b: &SurfacePoint, road: &Road) -> bool {
        let midpoint = SurfacePoint::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0);

        let segment = self.nearest_segment(&midpoint, road);
        let (seg_a, seg_b) = match segment {
            Some(seg) => seg,
            None => return true,
        };

        let side_a = signed_offset(a, &seg_a, &seg_b);
        let side_b = signed_offset(b, &seg_a, &seg_b);

        let on_line_a = side_a.abs() < self.side_tolerance_px;
        let on_line_b = side_b.abs() < self.side_tolerance_px;

        on_line_a || on_line_b || (side_a > 0.0) == (side_b > 0.0)
    }

    fn nearest_segment(
        &self,
        p: &SurfacePoint,
        road: &Road,
    ) -> Option<(SurfacePoint, SurfacePoint)> {
        let path = &road.surface_path;
        if path.len() < 2 {
            return None;
        }

        let mut best: Option<(f64, (SurfacePoint, SurfacePoint))> = None;
        for window in path.windows(2) {
            let (dist, _) = point_to_segment(p, &window[0], &window[1]);
            if best.as_ref().map_or(true, |(d, _)| dist < *d) {
                best = Some((dist, (window[0], window[1])));
            }
        }

        best.filter(|(dist, _)| *dist <= self.segment_cutoff_px)
            .map(|(_, seg)| seg)
    }
}

/// Signed perpendicular distance from `p` to the line through the segment.
fn signed_offset(p: &SurfacePoint, a: &SurfacePoint, b: &SurfacePoint) -> f64 {
    let len = a.distance_to(b);
    if len == 0.0 {
        return 0.0;
    }
    side_of_segment(p, a, b) / len
}
