//! User overlay state.
//!
//! Everything the user changes about the computed layout lives here as
//! string-keyed maps, one per overlay kind. Keys are the stable storage
//! ids from [`EntityKey::storage_key`](crate::EntityKey::storage_key), so
//! the whole store round-trips through serde and restores verbatim.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::SurfacePoint;

/// Reshape limits per axis, in px.
pub const RESHAPE_MIN: f64 = -200.0;
pub const RESHAPE_MAX: f64 = 300.0;

/// A dragged position: where the entity started and where it sits now.
/// The original anchor is kept so connector lines know where to start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionOverride {
    pub original: SurfacePoint,
    pub current: SurfacePoint,
}

/// Per-cluster box growth, clamped to [-200, 300] on each axis.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReshapeDelta {
    pub width: f64,
    pub height: f64,
}

/// Ordered bend points routing a connector line.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BreakPath {
    pub points: Vec<SurfacePoint>,
}

/// All user overrides over the computed layout.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverlayStore {
    positions: HashMap<String, PositionOverride>,
    sizes: HashMap<String, f64>,
    rotations: HashMap<String, f64>,
    reshapes: HashMap<String, ReshapeDelta>,
    break_paths: HashMap<String, BreakPath>,
}

impl OverlayStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------
    // Positions
    // ------------------------------------------------------------------

    /// Record a drag. The original anchor is captured on the first drag of
    /// an entity and kept across subsequent drags.
    pub fn set_position(&mut self, key: &str, original: SurfacePoint, current: SurfacePoint) {
        match self.positions.get_mut(key) {
            Some(existing) => existing.current = current,
            None => {
                self.positions
                    .insert(key.to_string(), PositionOverride { original, current });
            }
        }
    }

    pub fn position(&self, key: &str) -> Option<&PositionOverride> {
        self.positions.get(key)
    }

    pub fn has_position(&self, key: &str) -> bool {
        self.positions.contains_key(key)
    }

    /// Remove a position override. The entity's break path goes with it,
    /// a connector with no override has nothing to route.
    pub fn clear_position(&mut self, key: &str) {
        self.positions.remove(key);
        self.break_paths.remove(key);
    }

    pub fn positions(&self) -> &HashMap<String, PositionOverride> {
        &self.positions
    }

    // ------------------------------------------------------------------
    // Sizes
    // ------------------------------------------------------------------

    pub fn set_size(&mut self, key: &str, size: f64) {
        self.sizes.insert(key.to_string(), size);
    }

    pub fn size(&self, key: &str) -> Option<f64> {
        self.sizes.get(key).copied()
    }

    pub fn clear_size(&mut self, key: &str) {
        self.sizes.remove(key);
    }

    // ------------------------------------------------------------------
    // Rotations (roads only)
    // ------------------------------------------------------------------

    /// Set a label rotation, wrapped into [0, 360).
    pub fn set_rotation(&mut self, key: &str, degrees: f64) {
        self.rotations
            .insert(key.to_string(), degrees.rem_euclid(360.0));
    }

    pub fn rotation(&self, key: &str) -> f64 {
        self.rotations.get(key).copied().unwrap_or(0.0)
    }

    pub fn clear_rotation(&mut self, key: &str) {
        self.rotations.remove(key);
    }

    // ------------------------------------------------------------------
    // Reshapes (clusters only)
    // ------------------------------------------------------------------

    /// Adjust a cluster's reshape delta, clamping each axis.
    pub fn adjust_reshape(&mut self, key: &str, d_width: f64, d_height: f64) -> ReshapeDelta {
        let entry = self.reshapes.entry(key.to_string()).or_default();
        entry.width = (entry.width + d_width).clamp(RESHAPE_MIN, RESHAPE_MAX);
        entry.height = (entry.height + d_height).clamp(RESHAPE_MIN, RESHAPE_MAX);
        *entry
    }

    pub fn reshape(&self, key: &str) -> ReshapeDelta {
        self.reshapes.get(key).copied().unwrap_or_default()
    }

    pub fn clear_reshape(&mut self, key: &str) {
        self.reshapes.remove(key);
    }

    // ------------------------------------------------------------------
    // Break paths
    // ------------------------------------------------------------------

    pub fn break_path(&self, key: &str) -> Option<&BreakPath> {
        self.break_paths.get(key)
    }

    pub fn break_path_mut(&mut self, key: &str) -> &mut BreakPath {
        self.break_paths.entry(key.to_string()).or_default()
    }

    pub fn clear_break_path(&mut self, key: &str) {
        self.break_paths.remove(key);
    }

    pub fn break_paths(&self) -> &HashMap<String, BreakPath> {
        &self.break_paths
    }
}
