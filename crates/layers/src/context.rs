use std::collections::HashMap;

use features::{AltitudeMode, Coordinate, Feature, Geometry, Projection};
use foundation::ids::{FeatureId, GeometryId};
use foundation::math::{Geodetic, Vec3, geodetic_to_ecef};
use scene::image::{ImageError, ImageHandle, ImageQueue, ImageRequest, RequestId};
use scene::{
    Billboard, BillboardImage, Label, Polyline, Primitive, PrimitiveCollection, PrimitiveId,
    PrimitiveKind, SceneError, ScenePrimitive, SceneView, SyncState,
};
use tracing::{debug, warn};

use crate::symbology::LayerConfig;

/// Fraction of the camera height used as the label eye offset.
const LABEL_EYE_OFFSET_SCALE: f64 = 0.01;

/// What a primitive represents for its geometry.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum PrimitiveRole {
    Primary,
    Label,
    GroundReference,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct PrimitiveOwner {
    pub feature: FeatureId,
    pub geometry: GeometryId,
    pub role: PrimitiveRole,
}

/// The renderer refused a primitive for one feature geometry.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructionFailure {
    pub feature: FeatureId,
    pub geometry: GeometryId,
    pub error: SceneError,
}

/// Result of delivering a deferred image to its billboard.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImageCompletion {
    Applied,
    Failed,
    /// The billboard was removed, destroyed, or has moved on to another image.
    Stale,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IndexViolation {
    #[error("primitive {0} has no owning feature")]
    Unowned(PrimitiveId),
    #[error("primitive {0} is not listed exactly once under its feature")]
    NotListed(PrimitiveId),
    #[error("index references missing primitive {0}")]
    Dangling(PrimitiveId),
    #[error("primitive {0} is listed under more than one feature")]
    Duplicate(PrimitiveId),
}

/// Per-layer reconciliation state.
///
/// Owns the layer's primitive collections and the index from features and
/// geometries to the primitives that draw them. Every membership change goes
/// through this type so the collections and the index never disagree.
#[derive(Debug)]
pub struct VectorContext {
    layer: LayerConfig,
    projection: Projection,
    view: SceneView,
    billboards: PrimitiveCollection<Billboard>,
    polylines: PrimitiveCollection<Polyline>,
    primitives: PrimitiveCollection<Primitive>,
    labels: PrimitiveCollection<Label>,
    feature_index: HashMap<FeatureId, Vec<PrimitiveId>>,
    geometry_index: HashMap<(GeometryId, PrimitiveRole), PrimitiveId>,
    owners: HashMap<PrimitiveId, PrimitiveOwner>,
    label_eye_offset: Vec3,
    current_time: Option<f64>,
    images: ImageQueue,
    failures: Vec<ConstructionFailure>,
}

impl VectorContext {
    pub fn new(layer: LayerConfig, projection: Projection, view: SceneView) -> Self {
        let label_eye_offset = label_eye_offset(&view, &layer);
        Self {
            layer,
            projection,
            view,
            billboards: PrimitiveCollection::new(),
            polylines: PrimitiveCollection::new(),
            primitives: PrimitiveCollection::new(),
            labels: PrimitiveCollection::new(),
            feature_index: HashMap::new(),
            geometry_index: HashMap::new(),
            owners: HashMap::new(),
            label_eye_offset,
            current_time: None,
            images: ImageQueue::new(),
            failures: Vec::new(),
        }
    }

    pub fn layer(&self) -> &LayerConfig {
        &self.layer
    }

    pub fn set_layer_config(&mut self, layer: LayerConfig) {
        self.layer = layer;
        self.label_eye_offset = label_eye_offset(&self.view, &self.layer);
    }

    pub fn projection(&self) -> Projection {
        self.projection
    }

    pub fn set_scene_view(&mut self, view: SceneView) {
        self.view = view;
        self.label_eye_offset = label_eye_offset(&self.view, &self.layer);
    }

    pub fn label_eye_offset(&self) -> Vec3 {
        self.label_eye_offset
    }

    pub fn current_time(&self) -> Option<f64> {
        self.current_time
    }

    pub fn set_current_time(&mut self, time: Option<f64>) {
        self.current_time = time;
    }

    pub fn opacity(&self) -> f32 {
        self.layer.opacity
    }

    /// Whether primitives of `feature` should be displayed.
    pub fn feature_shown(&self, feature: &Feature) -> bool {
        feature.shown && self.layer.visible
    }

    pub fn geodetic(&self, coord: &Coordinate) -> Geodetic {
        let [lon, lat] = self.projection.to_lon_lat([coord.x, coord.y]);
        Geodetic::from_lon_lat_deg(lon, lat, coord.z)
    }

    /// Projects a feature coordinate into scene (ECEF) space.
    pub fn to_cartesian(&self, coord: &Coordinate) -> Vec3 {
        geodetic_to_ecef(self.geodetic(coord)).into()
    }

    pub fn billboards(&self) -> &PrimitiveCollection<Billboard> {
        &self.billboards
    }

    pub fn polylines(&self) -> &PrimitiveCollection<Polyline> {
        &self.polylines
    }

    pub fn primitives(&self) -> &PrimitiveCollection<Primitive> {
        &self.primitives
    }

    pub fn labels(&self) -> &PrimitiveCollection<Label> {
        &self.labels
    }

    pub fn billboard(&self, id: PrimitiveId) -> Option<&Billboard> {
        self.billboards.get_by_id(id)
    }

    pub fn billboard_mut(&mut self, id: PrimitiveId) -> Option<&mut Billboard> {
        self.billboards.get_mut_by_id(id)
    }

    pub fn polyline(&self, id: PrimitiveId) -> Option<&Polyline> {
        self.polylines.get_by_id(id)
    }

    pub fn polyline_mut(&mut self, id: PrimitiveId) -> Option<&mut Polyline> {
        self.polylines.get_mut_by_id(id)
    }

    pub fn primitive(&self, id: PrimitiveId) -> Option<&Primitive> {
        self.primitives.get_by_id(id)
    }

    pub fn primitive_mut(&mut self, id: PrimitiveId) -> Option<&mut Primitive> {
        self.primitives.get_mut_by_id(id)
    }

    pub fn label(&self, id: PrimitiveId) -> Option<&Label> {
        self.labels.get_by_id(id)
    }

    pub fn label_mut(&mut self, id: PrimitiveId) -> Option<&mut Label> {
        self.labels.get_mut_by_id(id)
    }

    pub fn add_billboard(
        &mut self,
        billboard: Billboard,
        feature: &Feature,
        geometry: &Geometry,
    ) -> Result<PrimitiveId, SceneError> {
        let id = self.billboards.append(fresh(billboard))?;
        self.register(id, feature.id(), geometry.id(), PrimitiveRole::Primary);
        Ok(id)
    }

    pub fn add_polyline(
        &mut self,
        polyline: Polyline,
        feature: &Feature,
        geometry: &Geometry,
    ) -> Result<PrimitiveId, SceneError> {
        let id = self.polylines.append(fresh(polyline))?;
        self.register(id, feature.id(), geometry.id(), PrimitiveRole::Primary);
        Ok(id)
    }

    pub fn add_primitive(
        &mut self,
        primitive: Primitive,
        feature: &Feature,
        geometry: &Geometry,
    ) -> Result<PrimitiveId, SceneError> {
        let id = self.primitives.append(fresh(primitive))?;
        self.register(id, feature.id(), geometry.id(), PrimitiveRole::Primary);
        Ok(id)
    }

    pub fn add_label(
        &mut self,
        label: Label,
        feature: &Feature,
        geometry: &Geometry,
    ) -> Result<PrimitiveId, SceneError> {
        let id = self.labels.append(fresh(label))?;
        self.register(id, feature.id(), geometry.id(), PrimitiveRole::Label);
        Ok(id)
    }

    /// Adds a secondary polyline tying an elevated geometry to the ground.
    pub fn add_ground_reference(
        &mut self,
        polyline: Polyline,
        feature: &Feature,
        geometry: &Geometry,
    ) -> Result<PrimitiveId, SceneError> {
        let id = self.polylines.append(fresh(polyline))?;
        self.register(
            id,
            feature.id(),
            geometry.id(),
            PrimitiveRole::GroundReference,
        );
        Ok(id)
    }

    fn register(
        &mut self,
        id: PrimitiveId,
        feature: FeatureId,
        geometry: GeometryId,
        role: PrimitiveRole,
    ) {
        self.feature_index.entry(feature).or_default().push(id);
        self.geometry_index.insert((geometry, role), id);
        self.owners.insert(
            id,
            PrimitiveOwner {
                feature,
                geometry,
                role,
            },
        );
    }

    pub fn primitive_for_geometry(&self, geometry: GeometryId) -> Option<PrimitiveId> {
        self.lookup(geometry, PrimitiveRole::Primary)
    }

    pub fn label_for_geometry(&self, geometry: GeometryId) -> Option<PrimitiveId> {
        self.lookup(geometry, PrimitiveRole::Label)
    }

    pub fn ground_reference_for_geometry(&self, geometry: GeometryId) -> Option<PrimitiveId> {
        self.lookup(geometry, PrimitiveRole::GroundReference)
    }

    fn lookup(&self, geometry: GeometryId, role: PrimitiveRole) -> Option<PrimitiveId> {
        self.geometry_index.get(&(geometry, role)).copied()
    }

    pub fn owner(&self, id: PrimitiveId) -> Option<PrimitiveOwner> {
        self.owners.get(&id).copied()
    }

    pub fn primitives_for_feature(&self, feature: FeatureId) -> &[PrimitiveId] {
        self.feature_index
            .get(&feature)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn contains(&self, id: PrimitiveId) -> bool {
        match id.kind {
            PrimitiveKind::Billboard => self.billboards.contains(id),
            PrimitiveKind::Polyline => self.polylines.contains(id),
            PrimitiveKind::Primitive => self.primitives.contains(id),
            PrimitiveKind::Label => self.labels.contains(id),
        }
    }

    /// Removes a primitive from its collection and from every index.
    /// Pending image loads for a removed billboard are cancelled.
    pub fn remove_primitive(&mut self, id: PrimitiveId) -> bool {
        let removed = match id.kind {
            PrimitiveKind::Billboard => self.billboards.remove(id).is_some(),
            PrimitiveKind::Polyline => self.polylines.remove(id).is_some(),
            PrimitiveKind::Primitive => self.primitives.remove(id).is_some(),
            PrimitiveKind::Label => self.labels.remove(id).is_some(),
        };
        if !removed {
            return false;
        }

        if let Some(owner) = self.owners.remove(&id) {
            if let Some(ids) = self.feature_index.get_mut(&owner.feature) {
                ids.retain(|p| *p != id);
                if ids.is_empty() {
                    self.feature_index.remove(&owner.feature);
                }
            }
            let key = (owner.geometry, owner.role);
            if self.geometry_index.get(&key) == Some(&id) {
                self.geometry_index.remove(&key);
            }
        }
        if id.kind == PrimitiveKind::Billboard {
            self.images.cancel_for(id);
        }
        true
    }

    /// Removes every primitive of `feature`.
    pub fn remove_feature(&mut self, feature: FeatureId) -> usize {
        let ids = self.feature_index.get(&feature).cloned().unwrap_or_default();
        ids.into_iter()
            .filter(|id| self.remove_primitive(*id))
            .count()
    }

    pub fn state(&self, id: PrimitiveId) -> Option<&SyncState> {
        match id.kind {
            PrimitiveKind::Billboard => self.billboards.get_by_id(id).map(|p| p.state()),
            PrimitiveKind::Polyline => self.polylines.get_by_id(id).map(|p| p.state()),
            PrimitiveKind::Primitive => self.primitives.get_by_id(id).map(|p| p.state()),
            PrimitiveKind::Label => self.labels.get_by_id(id).map(|p| p.state()),
        }
    }

    fn state_mut(&mut self, id: PrimitiveId) -> Option<&mut SyncState> {
        match id.kind {
            PrimitiveKind::Billboard => self.billboards.get_mut_by_id(id).map(|p| p.state_mut()),
            PrimitiveKind::Polyline => self.polylines.get_mut_by_id(id).map(|p| p.state_mut()),
            PrimitiveKind::Primitive => self.primitives.get_mut_by_id(id).map(|p| p.state_mut()),
            PrimitiveKind::Label => self.labels.get_mut_by_id(id).map(|p| p.state_mut()),
        }
    }

    pub fn is_primitive_shown(&self, id: PrimitiveId) -> Option<bool> {
        match id.kind {
            PrimitiveKind::Billboard => self.billboards.get_by_id(id).map(|p| p.is_shown()),
            PrimitiveKind::Polyline => self.polylines.get_by_id(id).map(|p| p.is_shown()),
            PrimitiveKind::Primitive => self.primitives.get_by_id(id).map(|p| p.is_shown()),
            PrimitiveKind::Label => self.labels.get_by_id(id).map(|p| p.is_shown()),
        }
    }

    /// Flags every primitive of `feature` as not yet confirmed this pass.
    pub fn mark_dirty(&mut self, feature: FeatureId) {
        let ids = self.feature_index.get(&feature).cloned().unwrap_or_default();
        for id in ids {
            if let Some(state) = self.state_mut(id) {
                state.dirty = true;
            }
        }
    }

    pub fn mark_all_dirty(&mut self) {
        let ids: Vec<PrimitiveId> = self.owners.keys().copied().collect();
        for id in ids {
            if let Some(state) = self.state_mut(id) {
                state.dirty = true;
            }
        }
    }

    /// Removes the primitives of `feature` still dirty after its pass.
    pub fn sweep_dirty(&mut self, feature: FeatureId) -> usize {
        let stale: Vec<PrimitiveId> = self
            .primitives_for_feature(feature)
            .iter()
            .copied()
            .filter(|id| self.state(*id).is_some_and(|s| s.dirty))
            .collect();
        for id in &stale {
            debug!("removing stale primitive {id} of feature {feature}");
            self.remove_primitive(*id);
        }
        stale.len()
    }

    pub fn request_image(
        &mut self,
        billboard: PrimitiveId,
        generation: u32,
        src: impl Into<String>,
    ) -> RequestId {
        self.images.push(billboard, generation, src)
    }

    pub fn pending_image_requests(&self) -> &[ImageRequest] {
        self.images.pending()
    }

    /// Hands queued image requests to the host for loading.
    pub fn take_image_requests(&mut self) -> Vec<ImageRequest> {
        self.images.drain()
    }

    /// Delivers a loaded (or failed) image. Requests whose billboard is gone,
    /// destroyed, or now wants a different image are ignored.
    pub fn complete_image(
        &mut self,
        request: &ImageRequest,
        result: Result<ImageHandle, ImageError>,
    ) -> ImageCompletion {
        let Some(billboard) = self.billboards.get_mut_by_id(request.billboard) else {
            debug!("image {} arrived for removed billboard", request.src);
            return ImageCompletion::Stale;
        };
        if billboard.state.is_destroyed() || billboard.image_generation != request.generation {
            debug!("image {} superseded for {}", request.src, request.billboard);
            return ImageCompletion::Stale;
        }

        let src = request.src.clone();
        match result {
            Ok(image) => {
                billboard.size = Some([image.width, image.height]);
                billboard.image = BillboardImage::Loaded { src, image };
                ImageCompletion::Applied
            }
            Err(err) => {
                warn!("billboard {}: {err}", request.billboard);
                billboard.image = BillboardImage::Failed { src };
                ImageCompletion::Failed
            }
        }
    }

    pub fn record_failure(&mut self, feature: &Feature, geometry: &Geometry, error: SceneError) {
        debug!("feature {} geometry {}: {error}", feature.id(), geometry.id());
        self.failures.push(ConstructionFailure {
            feature: feature.id(),
            geometry: geometry.id(),
            error,
        });
    }

    pub fn take_failures(&mut self) -> Vec<ConstructionFailure> {
        std::mem::take(&mut self.failures)
    }

    pub fn primitive_count(&self) -> usize {
        self.billboards.len() + self.polylines.len() + self.primitives.len() + self.labels.len()
    }

    fn live_ids(&self) -> Vec<PrimitiveId> {
        let mut ids = self.billboards.ids();
        ids.extend(self.polylines.ids());
        ids.extend(self.primitives.ids());
        ids.extend(self.labels.ids());
        ids
    }

    /// Checks that the collections and the index agree.
    pub fn check_index(&self) -> Result<(), IndexViolation> {
        let live = self.live_ids();
        for id in &live {
            let owner = self.owners.get(id).ok_or(IndexViolation::Unowned(*id))?;
            let listed = self
                .feature_index
                .get(&owner.feature)
                .map_or(0, |ids| ids.iter().filter(|p| *p == id).count());
            if listed != 1 {
                return Err(IndexViolation::NotListed(*id));
            }
        }

        for id in self
            .owners
            .keys()
            .chain(self.feature_index.values().flatten())
            .chain(self.geometry_index.values())
        {
            if !self.contains(*id) {
                return Err(IndexViolation::Dangling(*id));
            }
        }

        let listed_total: usize = self.feature_index.values().map(Vec::len).sum();
        if listed_total != live.len() {
            for (feature, ids) in &self.feature_index {
                if let Some(id) = ids
                    .iter()
                    .find(|id| self.owners.get(*id).is_some_and(|o| o.feature != *feature))
                {
                    return Err(IndexViolation::Duplicate(*id));
                }
            }
        }
        Ok(())
    }
}

/// A freshly constructed primitive is current for this pass.
fn fresh<T: ScenePrimitive>(mut primitive: T) -> T {
    primitive.state_mut().dirty = false;
    primitive
}

/// Labels are pulled toward the camera when terrain or clamped geometry may hide them.
fn label_eye_offset(view: &SceneView, layer: &LayerConfig) -> Vec3 {
    if !view.terrain_enabled && layer.altitude_mode == AltitudeMode::Absolute {
        return Vec3::ZERO;
    }
    let z = (view.camera_height_m * LABEL_EYE_OFFSET_SCALE)
        .clamp(0.0, layer.max_label_eye_offset_m.max(0.0));
    Vec3::new(0.0, 0.0, -z)
}
