//! One interactive map instance.
//!
//! `MapExplorer` wires the location set, the cluster source and the viewport
//! animator together. Cluster queries always use the last *published* camera,
//! so the visible feature list only moves when subscribers were told it did.

use clustering::{ClusterFeature, ClusterSource, FeatureKey, LocationPoint};
use foundation::bounds::GeoBounds;
use foundation::camera::{CameraState, LngLat};
use foundation::ids::{ClusterId, LocationId};
use foundation::math::mercator::bounds_for;
use runtime::{Frame, SubscriptionId};
use tracing::{debug, info};
use viewport::{CameraSnapshot, DurationClass, TransitionId, ViewportAnimator};

use crate::config::{ExplorerConfig, Region};
use crate::error::ExplorerError;
use crate::filter::{LocationFilter, categories};
use crate::navigation::FocusCursor;

/// Zoom changes smaller than this are treated as no-ops.
const ZOOM_TOLERANCE: f64 = 1e-9;

#[derive(Debug)]
pub struct MapExplorer {
    config: ExplorerConfig,
    locations: Vec<LocationPoint>,
    filter: LocationFilter,
    source: ClusterSource,
    animator: ViewportAnimator,
    width: f64,
    height: f64,
    focus: FocusCursor,
    selected: Option<LocationId>,
    active_region: Option<String>,
}

impl MapExplorer {
    /// The viewport starts at 0×0, so bounds cover the whole world until the
    /// first [`resize`](Self::resize). The config is validated first.
    pub fn new(config: ExplorerConfig) -> Result<Self, ExplorerError> {
        let config = config.validated()?;
        let source = ClusterSource::new(config.cluster.clone())?;
        let animator =
            ViewportAnimator::new(config.default_view, config.constraints(), config.motion);
        Ok(Self {
            config,
            locations: Vec::new(),
            filter: LocationFilter::default(),
            source,
            animator,
            width: 0.0,
            height: 0.0,
            focus: FocusCursor::new(),
            selected: None,
            active_region: None,
        })
    }

    pub fn config(&self) -> &ExplorerConfig {
        &self.config
    }

    pub fn animator(&self) -> &ViewportAnimator {
        &self.animator
    }

    pub fn subscribe(&mut self, f: impl FnMut(&CameraSnapshot) + 'static) -> SubscriptionId {
        self.animator.subscribe(f)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.animator.unsubscribe(id)
    }

    /// Replaces the location set. Returns `true` if the index was rebuilt.
    pub fn set_locations(&mut self, locations: Vec<LocationPoint>) -> Result<bool, ExplorerError> {
        self.locations = locations;
        if let Some(id) = self.selected {
            if !self.locations.iter().any(|p| p.id == id) {
                self.selected = None;
            }
        }
        self.rebuild()
    }

    pub fn locations(&self) -> &[LocationPoint] {
        &self.locations
    }

    pub fn filter(&self) -> &LocationFilter {
        &self.filter
    }

    pub fn set_category(&mut self, category: Option<String>) -> Result<bool, ExplorerError> {
        self.filter.category = category;
        self.rebuild()
    }

    pub fn set_search(&mut self, search: impl Into<String>) -> Result<bool, ExplorerError> {
        self.filter.search = search.into();
        self.rebuild()
    }

    /// Distinct categories of the whole location set, sorted.
    pub fn categories(&self) -> Vec<String> {
        categories(&self.locations)
    }

    /// Locations passing the current filter.
    pub fn filtered_locations(&self) -> Vec<LocationPoint> {
        self.filter.apply(&self.locations)
    }

    fn rebuild(&mut self) -> Result<bool, ExplorerError> {
        let filtered = self.filtered_locations();
        let rebuilt = self.source.load(&filtered)?;
        if rebuilt {
            info!(
                total = self.locations.len(),
                visible = filtered.len(),
                generation = self.source.generation(),
                "location set changed"
            );
            self.refresh_focus()?;
        }
        Ok(rebuilt)
    }

    fn refresh_focus(&mut self) -> Result<(), ExplorerError> {
        let visible = self.visible_features()?;
        if self.focus.retain(&visible) {
            debug!("focused feature left the view");
        }
        Ok(())
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    pub fn size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    /// Camera of the last published snapshot, or the initial view.
    pub fn published_camera(&self) -> CameraState {
        self.animator
            .last_published()
            .map(|s| s.camera)
            .unwrap_or_else(|| self.animator.camera())
    }

    pub fn bounds(&self) -> GeoBounds {
        bounds_for(
            self.width,
            self.height,
            &self.published_camera(),
            self.config.projection_scale,
        )
    }

    /// Features in view at the published camera, in reading order.
    pub fn visible_features(&self) -> Result<Vec<ClusterFeature>, ExplorerError> {
        let camera = self.published_camera();
        let features =
            self.source
                .query_ordered(&self.bounds(), camera.zoom, &self.config.reading_order)?;
        Ok(features)
    }

    pub fn tick(&mut self, frame: Frame) {
        self.animator.tick(frame);
    }

    /// Where the camera is heading: the active target, else the camera.
    fn heading(&self) -> CameraState {
        self.animator
            .active()
            .map(|h| *h.target())
            .unwrap_or_else(|| self.animator.camera())
    }

    pub fn zoom_in(&mut self) -> Option<TransitionId> {
        let heading = self.heading();
        self.zoom_to(heading, heading.zoom * self.config.zoom_step)
    }

    pub fn zoom_out(&mut self) -> Option<TransitionId> {
        let heading = self.heading();
        self.zoom_to(heading, heading.zoom / self.config.zoom_step)
    }

    fn zoom_to(&mut self, heading: CameraState, zoom: f64) -> Option<TransitionId> {
        let zoom = self.config.zoom.clamp(zoom);
        if (zoom - heading.zoom).abs() < ZOOM_TOLERANCE {
            return None;
        }
        Some(
            self.animator
                .animate_to(CameraState::new(heading.center, zoom)),
        )
    }

    /// Brings a feature into focus. Points are approached at `select_zoom`
    /// (never zooming out); aggregates at the zoom where they split.
    pub fn select(&mut self, key: FeatureKey) -> Result<TransitionId, ExplorerError> {
        let current_zoom = self.heading().zoom;
        let target = match key {
            FeatureKey::Location(id) => {
                let point = self
                    .filtered_locations()
                    .into_iter()
                    .find(|p| p.id == id)
                    .ok_or(ExplorerError::UnknownFeature)?;
                self.selected = Some(id);
                CameraState::new(point.position(), self.config.select_zoom.max(current_zoom))
            }
            FeatureKey::Cluster(cluster_id) => {
                let visible = self.visible_features()?;
                let aggregate = visible
                    .iter()
                    .filter_map(|f| f.as_aggregate())
                    .find(|a| a.cluster_id == cluster_id)
                    .ok_or(ExplorerError::UnknownFeature)?;
                let zoom = f64::from(self.source.expansion_zoom(cluster_id)?);
                if zoom <= self.config.zoom.max {
                    CameraState::at(aggregate.longitude, aggregate.latitude, zoom)
                } else {
                    return self.select_member(cluster_id);
                }
            }
        };
        self.focus.set(key);
        self.active_region = None;
        debug!(?key, ?target, "select");
        Ok(self
            .animator
            .animate_to_with(target, DurationClass::Zoom, None))
    }

    /// Aggregates that only split past the zoom limit are walked member by
    /// member: each call selects the leaf after the currently selected one.
    fn select_member(&mut self, cluster_id: ClusterId) -> Result<TransitionId, ExplorerError> {
        let leaves = self.source.leaves(cluster_id, usize::MAX, 0)?;
        let next = self
            .selected
            .and_then(|id| leaves.iter().position(|p| p.id == id))
            .map_or(0, |i| (i + 1) % leaves.len());
        let leaf = leaves.get(next).ok_or(ExplorerError::UnknownFeature)?;
        let target = CameraState::at(leaf.longitude, leaf.latitude, self.config.zoom.max);
        self.selected = Some(leaf.id);
        self.focus.set(FeatureKey::Location(leaf.id));
        self.active_region = None;
        debug!(?cluster_id, leaf = ?leaf.id, ?target, "select member");
        Ok(self
            .animator
            .animate_to_with(target, DurationClass::Zoom, None))
    }

    pub fn selected(&self) -> Option<LocationId> {
        self.selected
    }

    pub fn focused(&self) -> Option<FeatureKey> {
        self.focus.focused()
    }

    pub fn focus_next(&mut self) -> Result<Option<FeatureKey>, ExplorerError> {
        let visible = self.visible_features()?;
        Ok(self.focus.next(&visible))
    }

    pub fn focus_prev(&mut self) -> Result<Option<FeatureKey>, ExplorerError> {
        let visible = self.visible_features()?;
        Ok(self.focus.prev(&visible))
    }

    pub fn regions(&self) -> &[Region] {
        &self.config.regions
    }

    pub fn active_region(&self) -> Option<&str> {
        self.active_region.as_deref()
    }

    pub fn go_to_region(&mut self, id: &str) -> Result<TransitionId, ExplorerError> {
        let camera = self
            .config
            .region(id)
            .map(Region::camera)
            .ok_or_else(|| ExplorerError::UnknownRegion(id.to_string()))?;
        let transition = self
            .animator
            .animate_to_with(camera, DurationClass::Slow, None);
        self.active_region = Some(id.to_string());
        Ok(transition)
    }

    /// Tracks a drag gesture 1:1.
    pub fn drag_to(&mut self, center: LngLat) {
        let zoom = self.animator.camera().zoom;
        self.animator.set_immediate(CameraState::new(center, zoom));
        self.active_region = None;
    }

    /// Publishes `camera` without easing.
    pub fn jump_to(&mut self, camera: CameraState) {
        self.animator.set_immediate(camera);
        self.active_region = None;
    }

    pub fn reset_view(&mut self) -> TransitionId {
        self.active_region = None;
        self.animator.reset_to_default()
    }
}
