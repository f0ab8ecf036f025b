//! Analysis session.
//!
//! One [`AnalysisSession`] owns everything a single site analysis needs:
//! fetched category data, the selection, roads, the site marker, the
//! projector, frozen cluster assignments, user overlays, the persistence
//! queue, and the edit mode controller. Hosts feed it data and input
//! events and draw the [`RenderScene`] it hands back.

use std::collections::HashSet;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::cluster::{AssignmentStore, ClusterCandidate, ClusterEngine};
use crate::editor::{EditContext, EditMode, EditorController, Key, PointerEvent};
use crate::overlay::OverlayStore;
use crate::persist::{OverlayKind, PersistQueue, PersistStore};
use crate::projector::SurfaceProjector;
use crate::render::{assemble_scene, RenderScene};
use crate::{
    Cluster, ClusterConfig, EntityKey, GeoPoint, Poi, PoiKey, Result, Road, SiteMarker,
    SurfacePoint,
};

/// Margin in degrees added around the fitted bounds so markers near the
/// edge stay clear of the surface border.
const FIT_MARGIN_DEGREES: f64 = 0.001;

#[derive(Debug)]
struct Category {
    name: String,
    pois: Vec<Poi>,
    selected: bool,
    /// Individually hidden POIs within a selected category
    hidden: HashSet<u64>,
}

/// Persisted shape of the selection state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionState {
    pub selected_categories: Vec<String>,
    pub hidden_pois: Vec<(String, u64)>,
}

/// The explicit context object for one analysis.
#[derive(Debug)]
pub struct AnalysisSession {
    site: SiteMarker,
    config: ClusterConfig,
    categories: Vec<Category>,
    roads: Vec<Road>,

    projector: Option<SurfaceProjector>,
    assignments: AssignmentStore,
    overlays: OverlayStore,
    queue: PersistQueue,
    editor: EditorController,

    clusters: Vec<Cluster>,
    singles: Vec<PoiKey>,
    scene: RenderScene,
}

impl AnalysisSession {
    pub fn new(site: SiteMarker, config: ClusterConfig) -> Self {
        Self {
            site,
            config,
            categories: Vec::new(),
            roads: Vec::new(),
            projector: None,
            assignments: AssignmentStore::new(),
            overlays: OverlayStore::new(),
            queue: PersistQueue::new(),
            editor: EditorController::new(),
            clusters: Vec::new(),
            singles: Vec::new(),
            scene: RenderScene::default(),
        }
    }

    // ------------------------------------------------------------------
    // Data
    // ------------------------------------------------------------------

    /// Add or replace a category's POI collection. New categories start
    /// selected.
    pub fn set_category(&mut self, name: &str, pois: Vec<Poi>) {
        match self.categories.iter_mut().find(|c| c.name == name) {
            Some(category) => category.pois = pois,
            None => self.categories.push(Category {
                name: name.to_string(),
                pois,
                selected: true,
                hidden: HashSet::new(),
            }),
        }
    }

    pub fn set_roads(&mut self, roads: Vec<Road>) {
        self.roads = roads;
    }

    pub fn site(&self) -> &SiteMarker {
        &self.site
    }

    pub fn category_names(&self) -> Vec<&str> {
        self.categories.iter().map(|c| c.name.as_str()).collect()
    }

    /// Toggle a whole category. Turning a category off clears the
    /// position overrides (and with them the break paths) of its POIs.
    pub fn set_category_selected(&mut self, name: &str, selected: bool, now: Instant) {
        let Some(idx) = self.categories.iter().position(|c| c.name == name) else {
            return;
        };
        if self.categories[idx].selected == selected {
            return;
        }
        self.categories[idx].selected = selected;

        if !selected {
            let keys: Vec<String> = self.categories[idx]
                .pois
                .iter()
                .enumerate()
                .map(|(i, poi)| EntityKey::Poi(PoiKey::new(name, i, poi.id)).storage_key())
                .collect();
            for key in keys {
                self.overlays.clear_position(&key);
            }
        }

        self.queue.schedule(OverlayKind::Selection, now);
    }

    /// Toggle a single POI within its category. Hiding a POI clears its
    /// position override.
    pub fn set_poi_selected(&mut self, category: &str, poi_id: u64, selected: bool, now: Instant) {
        let Some(cat) = self.categories.iter_mut().find(|c| c.name == category) else {
            return;
        };

        let changed = if selected {
            cat.hidden.remove(&poi_id)
        } else {
            cat.hidden.insert(poi_id)
        };
        if !changed {
            return;
        }

        if !selected {
            if let Some((index, poi)) = cat
                .pois
                .iter()
                .enumerate()
                .find(|(_, poi)| poi.id == poi_id)
            {
                let key = EntityKey::Poi(PoiKey::new(category, index, poi.id)).storage_key();
                self.overlays.clear_position(&key);
            }
        }

        self.queue.schedule(OverlayKind::Selection, now);
    }

    pub fn selection_state(&self) -> SelectionState {
        SelectionState {
            selected_categories: self
                .categories
                .iter()
                .filter(|c| c.selected)
                .map(|c| c.name.clone())
                .collect(),
            hidden_pois: self
                .categories
                .iter()
                .flat_map(|c| {
                    let mut ids: Vec<u64> = c.hidden.iter().copied().collect();
                    ids.sort_unstable();
                    ids.into_iter().map(move |id| (c.name.clone(), id))
                })
                .collect(),
        }
    }

    // ------------------------------------------------------------------
    // Layout
    // ------------------------------------------------------------------

    /// Run a layout pass and return the scene to draw.
    ///
    /// The first pass with clusterable POIs clusters and freezes the
    /// result; every later pass restores the frozen assignment filtered
    /// to the live selection. Passes before any data arrives never
    /// freeze, so clustering still runs once the data is there.
    pub fn layout(&mut self) -> RenderScene {
        self.rebuild_projector();
        self.project_all();

        let candidates = self.selected_candidates();
        let clusterable: Vec<ClusterCandidate> = candidates
            .iter()
            .filter(|c| {
                self.find_poi(&c.key)
                    .map_or(false, |poi| !poi.prevent_clustering)
            })
            .cloned()
            .collect();

        if self.assignments.is_frozen() {
            let clusters = self
                .assignments
                .restore(|key| {
                    clusterable
                        .iter()
                        .find(|c| c.key == *key)
                        .map(|c| c.surface)
                })
                .unwrap_or_default();
            self.clusters = clusters;
        } else {
            let engine = ClusterEngine::new(self.config.clone());
            let (clusters, _) = engine.compute(&clusterable, &self.roads, &self.site);
            if !clusterable.is_empty() {
                self.assignments.freeze(&clusters);
            }
            self.clusters = clusters;
        }

        let clustered: HashSet<PoiKey> = self
            .clusters
            .iter()
            .flat_map(|c| c.members.iter().cloned())
            .collect();
        self.singles = candidates
            .iter()
            .map(|c| c.key.clone())
            .filter(|k| !clustered.contains(k))
            .collect();

        self.rebuild_scene();
        self.scene.clone()
    }

    /// The scene from the last layout pass, overlays applied.
    pub fn scene(&self) -> &RenderScene {
        &self.scene
    }

    fn rebuild_projector(&mut self) {
        let mut points: Vec<GeoPoint> = vec![self.site.geo];
        for category in &self.categories {
            points.extend(category.pois.iter().map(|p| p.geo));
        }
        for road in &self.roads {
            points.extend(road.path.iter().copied());
        }

        self.projector = SurfaceProjector::fit(
            &points,
            FIT_MARGIN_DEGREES,
            self.config.surface_width,
            self.config.surface_height,
        );
    }

    fn project_all(&mut self) {
        let Some(projector) = &self.projector else {
            return;
        };

        self.site.surface = projector.project(&self.site.geo);

        for category in &mut self.categories {
            for poi in &mut category.pois {
                poi.surface = projector.project(&poi.geo);
            }
        }

        for road in &mut self.roads {
            road.surface_path = road.path.iter().map(|p| projector.project(p)).collect();
            road.label_anchor = road
                .surface_path
                .get(road.surface_path.len() / 2)
                .copied()
                .unwrap_or_default();
        }
    }

    fn selected_candidates(&self) -> Vec<ClusterCandidate> {
        let mut candidates = Vec::new();
        for category in &self.categories {
            if !category.selected {
                continue;
            }
            for (index, poi) in category.pois.iter().enumerate() {
                if category.hidden.contains(&poi.id) {
                    continue;
                }
                candidates.push(ClusterCandidate {
                    key: PoiKey::new(&category.name, index, poi.id),
                    geo: poi.geo,
                    surface: poi.surface,
                });
            }
        }
        candidates
    }

    fn find_poi(&self, key: &PoiKey) -> Option<&Poi> {
        self.categories
            .iter()
            .find(|c| c.name == key.category)?
            .pois
            .get(key.index)
            .filter(|poi| poi.id == key.source_id)
    }

    fn rebuild_scene(&mut self) {
        let singles: Vec<(PoiKey, &Poi)> = self
            .singles
            .iter()
            .filter_map(|key| self.find_poi(key).map(|poi| (key.clone(), poi)))
            .collect();

        self.scene = assemble_scene(
            &self.clusters,
            &singles,
            &self.roads,
            &self.site,
            |key| self.find_poi(key).cloned(),
            &self.overlays,
        );
    }

    // ------------------------------------------------------------------
    // Editing
    // ------------------------------------------------------------------

    pub fn mode(&self) -> EditMode {
        self.editor.mode()
    }

    pub fn enter_mode(&mut self, mode: EditMode) -> Result<()> {
        self.editor.enter(mode)
    }

    pub fn exit_mode(&mut self) {
        self.editor.exit();
    }

    /// Route a pointer event to the active mode and refresh the scene.
    pub fn pointer(&mut self, event: PointerEvent, now: Instant) {
        let mut ctx = EditContext {
            scene: &self.scene,
            overlays: &mut self.overlays,
            queue: &mut self.queue,
            now,
            surface_width: self.config.surface_width,
            surface_height: self.config.surface_height,
            default_cluster_size: self.config.cluster_size_px,
        };
        self.editor.on_pointer(event, &mut ctx);
        self.rebuild_scene();
    }

    /// Route a key press to the active mode and refresh the scene.
    pub fn key(&mut self, key: Key, now: Instant) {
        let mut ctx = EditContext {
            scene: &self.scene,
            overlays: &mut self.overlays,
            queue: &mut self.queue,
            now,
            surface_width: self.config.surface_width,
            surface_height: self.config.surface_height,
            default_cluster_size: self.config.cluster_size_px,
        };
        self.editor.on_key(key, &mut ctx);
        self.rebuild_scene();
    }

    /// User-facing notices from the editor since the last call.
    pub fn take_notices(&mut self) -> Vec<String> {
        self.editor.take_notices()
    }

    pub fn overlays(&self) -> &OverlayStore {
        &self.overlays
    }

    /// Restore a previously persisted overlay store.
    pub fn load_overlays(&mut self, overlays: OverlayStore) {
        self.overlays = overlays;
        self.rebuild_scene();
    }

    // ------------------------------------------------------------------
    // Persistence
    // ------------------------------------------------------------------

    pub fn queue(&self) -> &PersistQueue {
        &self.queue
    }

    /// Schedule a write of the frozen cluster assignments. No-op before
    /// the first clustering run.
    pub fn persist_assignments(&mut self, now: Instant) {
        if self.assignments.is_frozen() {
            self.queue.schedule(OverlayKind::ClusterAssignments, now);
        }
    }

    /// Restore a previously persisted assignment snapshot. The next
    /// layout pass uses it instead of clustering.
    pub fn load_assignments(&mut self, snapshot: crate::ClusterSnapshot) {
        self.assignments.load(snapshot);
    }

    /// Write out every persistence kind whose debounce window has closed.
    pub fn flush_due(&mut self, now: Instant, store: &mut dyn PersistStore) -> usize {
        let overlays = &self.overlays;
        let assignments = &self.assignments;
        let selection = self.selection_state();
        self.queue.flush_due(now, store, |kind| {
            Self::payload(kind, overlays, assignments, &selection)
        })
    }

    /// Write out everything pending regardless of deadlines.
    pub fn flush_all(&mut self, store: &mut dyn PersistStore) -> usize {
        let overlays = &self.overlays;
        let assignments = &self.assignments;
        let selection = self.selection_state();
        self.queue.flush_all(store, |kind| {
            Self::payload(kind, overlays, assignments, &selection)
        })
    }

    fn payload(
        kind: OverlayKind,
        overlays: &OverlayStore,
        assignments: &AssignmentStore,
        selection: &SelectionState,
    ) -> Result<String> {
        match kind {
            OverlayKind::Selection => Ok(serde_json::to_string(selection)?),
            OverlayKind::ClusterAssignments => Ok(assignments.export().unwrap_or_default()),
            _ => Ok(serde_json::to_string(overlays)?),
        }
    }
}

impl AnalysisSession {
    /// Convenience for tests and demos: drag an entity programmatically.
    pub fn drag_entity(&mut self, key: &EntityKey, to: SurfacePoint, now: Instant) {
        let Some(origin) = crate::editor::entity_position(&self.scene, key) else {
            return;
        };
        let storage = key.storage_key();
        let original = self
            .overlays
            .position(&storage)
            .map(|o| o.original)
            .unwrap_or(origin);
        self.overlays.set_position(&storage, original, to);
        self.queue.schedule(OverlayKind::DraggedPositions, now);
        self.rebuild_scene();
    }
}
