//! Frozen cluster assignments.
//!
//! The first successful clustering run is snapshotted here. Every later
//! layout pass restores from the snapshot instead of re-clustering, so
//! toggling categories on and off never reshuffles which POIs share a
//! cluster. Restoring filters members against the live selection and
//! recomputes only the mean position; the frozen target stays where
//! overlap resolution (or the user) put it.

use log::warn;
use serde::{Deserialize, Serialize};

use crate::geo_utils::surface_centroid;
use crate::{Cluster, ClusterPhase, PoiKey, Result, SurfacePoint};

/// A cluster as frozen at snapshot time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrozenCluster {
    pub id: String,
    pub members: Vec<PoiKey>,
    pub target: SurfacePoint,
    pub size: f64,
    pub phase: ClusterPhase,
}

/// The complete frozen assignment of POIs to clusters.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClusterSnapshot {
    pub clusters: Vec<FrozenCluster>,
}

impl ClusterSnapshot {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Owns the one-shot snapshot and rebuilds live clusters from it.
#[derive(Debug, Default)]
pub struct AssignmentStore {
    snapshot: Option<ClusterSnapshot>,
}

impl AssignmentStore {
    pub fn new() -> Self {
        Self { snapshot: None }
    }

    /// Whether a clustering run has been frozen already.
    pub fn is_frozen(&self) -> bool {
        self.snapshot.is_some()
    }

    /// Freeze the first successful clustering run. No-op when a snapshot
    /// already exists.
    pub fn freeze(&mut self, clusters: &[Cluster]) {
        if self.snapshot.is_some() {
            return;
        }

        self.snapshot = Some(ClusterSnapshot {
            clusters: clusters
                .iter()
                .map(|c| FrozenCluster {
                    id: c.id.clone(),
                    members: c.members.clone(),
                    target: c.target,
                    size: c.size,
                    phase: c.phase,
                })
                .collect(),
        });
    }

    /// Rebuild live clusters from the snapshot.
    ///
    /// `surface_of` resolves a member key to its current projected position
    /// when the POI is selected, or `None` when it is not. Members that
    /// resolve to `None` drop out; clusters left with fewer than two
    /// members dissolve back to individual rendering.
    pub fn restore<F>(&self, surface_of: F) -> Option<Vec<Cluster>>
    where
        F: Fn(&PoiKey) -> Option<SurfacePoint>,
    {
        let snapshot = self.snapshot.as_ref()?;

        let clusters = snapshot
            .clusters
            .iter()
            .filter_map(|frozen| {
                let mut members = Vec::new();
                let mut positions: Vec<SurfacePoint> = Vec::new();
                for key in &frozen.members {
                    if let Some(surface) = surface_of(key) {
                        members.push(key.clone());
                        positions.push(surface);
                    }
                }

                if members.len() < 2 {
                    return None;
                }

                Some(Cluster {
                    id: frozen.id.clone(),
                    members,
                    mean: surface_centroid(&positions),
                    target: frozen.target,
                    size: frozen.size,
                    phase: frozen.phase,
                })
            })
            .collect();

        Some(clusters)
    }

    /// Replace the snapshot with a previously persisted one.
    pub fn load(&mut self, snapshot: ClusterSnapshot) {
        self.snapshot = Some(snapshot);
    }

    /// Serialized snapshot for persistence, if frozen.
    pub fn export(&self) -> Option<String> {
        let snapshot = self.snapshot.as_ref()?;
        match snapshot.to_json() {
            Ok(json) => Some(json),
            Err(e) => {
                warn!("Failed to serialize cluster snapshot: {e}");
                None
            }
        }
    }

    /// Drop the snapshot so the next layout pass re-clusters.
    pub fn clear(&mut self) {
        self.snapshot = None;
    }
}
