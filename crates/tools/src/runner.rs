use std::collections::{BTreeMap, HashMap};

use features::Feature;
use foundation::ids::FeatureId;
use layers::{ImageCompletion, LayerId, SyncReport, VectorLayer};
use scene::image::{ImageError, ImageHandle};
use serde::Serialize;
use tracing::{debug, info};

use crate::scenario::{FeatureDto, Pass, Scenario, ScenarioError};

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct ImageSummary {
    pub applied: usize,
    pub failed: usize,
    pub stale: usize,
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PrimitiveCounts {
    pub billboards: usize,
    pub polylines: usize,
    pub primitives: usize,
    pub labels: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub pass: usize,
    pub sync: SyncReport,
    pub images: ImageSummary,
    pub scene: PrimitiveCounts,
}

/// Options that change how a scenario is replayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunOptions {
    /// Deliver image loads right after the pass that requested them.
    pub resolve_images: bool,
    /// Fail the run when the primitive index is inconsistent after a pass.
    pub check_index: bool,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            resolve_images: true,
            check_index: true,
        }
    }
}

/// Replays scenario passes against one vector layer.
///
/// Features persist between passes by id: an unchanged description keeps the
/// same feature, edits bump the edited geometry or style revisions in place.
#[derive(Debug)]
pub struct ScenarioRunner {
    layer: VectorLayer,
    images: BTreeMap<String, [u32; 2]>,
    model: Vec<(FeatureDto, Feature)>,
    next_image: u64,
    options: RunOptions,
}

impl ScenarioRunner {
    pub fn new(scenario: &Scenario, options: RunOptions) -> Self {
        let mut layer = VectorLayer::new(LayerId(1), scenario.layer.clone(), scenario.projection);
        layer.set_scene_view(scenario.view.into());
        Self {
            layer,
            images: scenario.images.clone(),
            model: Vec::new(),
            next_image: 1,
            options,
        }
    }

    pub fn layer(&self) -> &VectorLayer {
        &self.layer
    }

    pub fn run(&mut self, passes: &[Pass]) -> Result<Vec<PassReport>, ScenarioError> {
        passes
            .iter()
            .enumerate()
            .map(|(i, pass)| self.run_pass(i, pass))
            .collect()
    }

    pub fn run_pass(&mut self, index: usize, pass: &Pass) -> Result<PassReport, ScenarioError> {
        self.apply(pass)?;
        if let Some(view) = pass.view {
            self.layer.set_scene_view(view.into());
        }
        self.layer.set_current_time(pass.time);

        let features: Vec<Feature> = self.model.iter().map(|(_, f)| f.clone()).collect();
        let sync = self.layer.sync(&features);
        info!(
            "pass {index}: {} visited, {} created, {} updated, {} recreated, {} removed",
            sync.visited, sync.created, sync.updated, sync.recreated, sync.removed
        );

        let images = if self.options.resolve_images {
            self.resolve_images()
        } else {
            ImageSummary::default()
        };

        let ctx = self.layer.context();
        if self.options.check_index {
            ctx.check_index()
                .map_err(|source| ScenarioError::Index { pass: index, source })?;
        }
        Ok(PassReport {
            pass: index,
            sync,
            images,
            scene: PrimitiveCounts {
                billboards: ctx.billboards().len(),
                polylines: ctx.polylines().len(),
                primitives: ctx.primitives().len(),
                labels: ctx.labels().len(),
            },
        })
    }

    /// Brings the persistent feature model in line with the pass.
    fn apply(&mut self, pass: &Pass) -> Result<(), ScenarioError> {
        let mut previous: HashMap<u64, (FeatureDto, Feature)> = self
            .model
            .drain(..)
            .map(|(dto, f)| (dto.id, (dto, f)))
            .collect();

        for dto in &pass.features {
            let feature = match previous.remove(&dto.id) {
                Some((old, feature)) if old == *dto => feature,
                Some((old, feature)) => edit(old, feature, dto)?,
                None => build(dto)?,
            };
            self.model.push((dto.clone(), feature));
        }
        Ok(())
    }

    fn resolve_images(&mut self) -> ImageSummary {
        let mut summary = ImageSummary::default();
        let ctx = self.layer.context_mut();
        for request in ctx.take_image_requests() {
            let result = match self.images.get(&request.src) {
                Some([width, height]) => {
                    let id = self.next_image;
                    self.next_image += 1;
                    Ok(ImageHandle {
                        id,
                        width: *width,
                        height: *height,
                    })
                }
                None => Err(ImageError::NotFound(request.src.clone())),
            };
            match ctx.complete_image(&request, result) {
                ImageCompletion::Applied => summary.applied += 1,
                ImageCompletion::Failed => summary.failed += 1,
                ImageCompletion::Stale => summary.stale += 1,
            }
        }
        summary
    }
}

fn build(dto: &FeatureDto) -> Result<Feature, ScenarioError> {
    let geometries = dto
        .geometries
        .iter()
        .map(|g| g.to_geometry(dto.id))
        .collect::<Result<Vec<_>, _>>()?;
    let mut feature = Feature::with_geometries(FeatureId(dto.id), geometries);
    feature.set_style(dto.style.clone());
    feature.shown = dto.shown;
    feature.dynamic = dto.dynamic;
    feature.altitude_mode = dto.altitude_mode;
    Ok(feature)
}

/// Applies the differences between two descriptions of one feature.
///
/// Geometries are matched by position and keep their ids while their layout
/// holds; extra geometries are appended and missing ones removed. A layout
/// change rebuilds the feature and its old primitives are swept on the next
/// sync.
fn edit(old: FeatureDto, mut feature: Feature, dto: &FeatureDto) -> Result<Feature, ScenarioError> {
    let ids: Vec<_> = feature.geometries().iter().map(|g| g.id()).collect();

    let mut edits = Vec::new();
    for ((before, after), geometry) in old.geometries.iter().zip(&dto.geometries).zip(feature.geometries()) {
        if before == after {
            continue;
        }
        let (shape, layout) = after.to_shape(dto.id)?;
        if layout != geometry.layout() {
            debug!("feature {}: geometry layout changed, rebuilding", dto.id);
            return build(dto);
        }
        edits.push((geometry.id(), shape));
    }
    let added = dto
        .geometries
        .iter()
        .skip(ids.len())
        .map(|g| g.to_geometry(dto.id))
        .collect::<Result<Vec<_>, _>>()?;

    for (id, shape) in edits {
        if let Some(g) = feature.geometry_mut(id) {
            g.set_shape(shape);
        }
    }
    for id in ids.iter().skip(dto.geometries.len()) {
        feature.remove_geometry(*id);
    }
    for geometry in added {
        feature.push_geometry(geometry);
    }
    if old.style != dto.style {
        feature.set_style(dto.style.clone());
    }
    feature.shown = dto.shown;
    feature.dynamic = dto.dynamic;
    feature.altitude_mode = dto.altitude_mode;
    Ok(feature)
}
