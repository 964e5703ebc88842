use std::collections::{HashMap, HashSet};

use features::{AltitudeMode, Feature, GeometryType, Projection};
use foundation::ids::{FeatureId, GeometryId};
use scene::SceneView;
use serde::Serialize;
use tracing::{debug, warn};

use crate::context::VectorContext;
use crate::converter::ConverterRegistry;
use crate::layer::{Layer, LayerId};
use crate::run_converter::{ConverterOutcome, run_converter};
use crate::symbology::LayerConfig;

/// Tally of one reconciliation pass.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    /// Features whose stamp changed and were reconciled.
    pub visited: usize,
    pub created: usize,
    pub updated: usize,
    pub recreated: usize,
    pub not_applicable: usize,
    pub dropped: usize,
    /// Primitives removed as stale or because their feature left the layer.
    pub removed: usize,
    /// Features with at least one primitive the renderer refused.
    pub failed: usize,
}

impl SyncReport {
    fn record(&mut self, outcome: ConverterOutcome) {
        match outcome {
            ConverterOutcome::Created => self.created += 1,
            ConverterOutcome::NotApplicable => self.not_applicable += 1,
            ConverterOutcome::Updated => self.updated += 1,
            ConverterOutcome::Recreated => self.recreated += 1,
            ConverterOutcome::Dropped => self.dropped += 1,
        }
    }
}

/// Everything about a feature that can change its primitives.
#[derive(Debug, Clone, PartialEq)]
struct FeatureStamp {
    style_revision: u64,
    geometries: Vec<(GeometryId, u64)>,
    shown: bool,
    dynamic: bool,
    altitude_mode: Option<AltitudeMode>,
    /// Current time, for features with tracks.
    track_time: Option<u64>,
}

impl FeatureStamp {
    fn of(feature: &Feature, context: &VectorContext) -> Self {
        let has_track = feature
            .geometries()
            .iter()
            .any(|g| g.geometry_type() == GeometryType::Track);
        Self {
            style_revision: feature.style_revision(),
            geometries: feature
                .geometries()
                .iter()
                .map(|g| (g.id(), g.revision().0))
                .collect(),
            shown: feature.shown,
            dynamic: feature.dynamic,
            altitude_mode: feature.altitude_mode,
            track_time: if has_track {
                context.current_time().map(f64::to_bits)
            } else {
                None
            },
        }
    }
}

/// Keeps one layer's scene primitives in step with its features.
#[derive(Debug)]
pub struct VectorLayer {
    id: LayerId,
    context: VectorContext,
    registry: ConverterRegistry,
    stamps: HashMap<FeatureId, FeatureStamp>,
}

impl VectorLayer {
    pub fn new(id: LayerId, config: LayerConfig, projection: Projection) -> Self {
        Self {
            id,
            context: VectorContext::new(config, projection, SceneView::default()),
            registry: ConverterRegistry,
            stamps: HashMap::new(),
        }
    }

    pub fn context(&self) -> &VectorContext {
        &self.context
    }

    /// Host access for image completion.
    pub fn context_mut(&mut self) -> &mut VectorContext {
        &mut self.context
    }

    pub fn config(&self) -> &LayerConfig {
        self.context.layer()
    }

    /// Applies a new layer configuration; every feature is revisited next pass.
    pub fn set_config(&mut self, config: LayerConfig) {
        self.context.set_layer_config(config);
        self.invalidate();
    }

    pub fn set_scene_view(&mut self, view: SceneView) {
        let offset = self.context.label_eye_offset();
        self.context.set_scene_view(view);
        if self.context.label_eye_offset() != offset {
            self.invalidate();
        }
    }

    pub fn set_current_time(&mut self, time: Option<f64>) {
        self.context.set_current_time(time);
    }

    /// Forgets all stamps so the next pass revisits every feature.
    pub fn invalidate(&mut self) {
        self.stamps.clear();
    }

    /// Runs one reconciliation pass over `features`.
    pub fn sync(&mut self, features: &[Feature]) -> SyncReport {
        let mut report = SyncReport::default();

        let present: HashSet<FeatureId> = features.iter().map(Feature::id).collect();
        let gone: Vec<FeatureId> = self
            .stamps
            .keys()
            .filter(|id| !present.contains(id))
            .copied()
            .collect();
        for id in gone {
            self.stamps.remove(&id);
            report.removed += self.context.remove_feature(id);
        }

        for feature in features {
            let stamp = FeatureStamp::of(feature, &self.context);
            if self.stamps.get(&feature.id()) == Some(&stamp) {
                continue;
            }
            report.visited += 1;
            self.sync_feature(feature, &mut report);
            self.stamps.insert(feature.id(), stamp);
        }

        if report.failed > 0 {
            warn!(
                "layer {}: {} features could not be rendered",
                self.id.0, report.failed
            );
        }
        report
    }

    fn sync_feature(&mut self, feature: &Feature, report: &mut SyncReport) {
        let context = &mut self.context;
        context.mark_dirty(feature.id());

        let style = feature.style();
        for geometry in feature.geometries() {
            if let Some(kind) = self
                .registry
                .resolve(feature, geometry, style, context.layer())
            {
                report.record(run_converter(&kind, feature, geometry, style, context));
            }
            if let Some(label) = self.registry.label(style) {
                report.record(run_converter(&label, feature, geometry, style, context));
            }
        }

        let swept = context.sweep_dirty(feature.id());
        if swept > 0 {
            debug!("feature {}: swept {swept} stale primitives", feature.id());
        }
        report.removed += swept;

        let failures = context.take_failures();
        if !failures.is_empty() {
            debug!(
                "feature {}: {} primitives refused",
                feature.id(),
                failures.len()
            );
            report.failed += 1;
        }
    }
}

impl Layer for VectorLayer {
    fn id(&self) -> LayerId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        ellipse_feature, icon, line_feature, point_feature, polygon_feature, stroke, text,
        track_feature,
    };
    use features::{Coordinate, Geometry, GeometryShape, Layout, Style};
    use foundation::color::Color;
    use pretty_assertions::assert_eq;
    use scene::{Billboard, Label, Polyline, Primitive};

    fn layer() -> VectorLayer {
        VectorLayer::new(LayerId(1), LayerConfig::default(), Projection::Epsg4326)
    }

    fn fixtures() -> Vec<Feature> {
        vec![
            point_feature(
                1,
                Style::new().with_image(icon("pin.png")).with_text(text("P")),
            ),
            line_feature(2, Style::new().with_stroke(stroke(2.0))),
            polygon_feature(3, Style::new().with_fill(Color::WHITE)),
            ellipse_feature(4, 0.0, Style::new()),
            track_feature(5, Style::new()),
        ]
    }

    /// Snapshot of every primitive's full contents.
    fn snapshot(
        ctx: &VectorContext,
    ) -> (Vec<Billboard>, Vec<Polyline>, Vec<Primitive>, Vec<Label>) {
        (
            ctx.billboards().iter().map(|(_, p)| p.clone()).collect(),
            ctx.polylines().iter().map(|(_, p)| p.clone()).collect(),
            ctx.primitives().iter().map(|(_, p)| p.clone()).collect(),
            ctx.labels().iter().map(|(_, p)| p.clone()).collect(),
        )
    }

    #[test]
    fn first_pass_creates_everything() {
        let mut l = layer();
        let report = l.sync(&fixtures());
        assert_eq!(
            report,
            SyncReport {
                visited: 5,
                created: 6,
                ..SyncReport::default()
            }
        );
        assert_eq!(l.context().billboards().len(), 1);
        assert_eq!(l.context().labels().len(), 1);
        assert_eq!(l.context().polylines().len(), 1);
        assert_eq!(l.context().primitives().len(), 3);
        l.context().check_index().unwrap();
    }

    #[test]
    fn unchanged_features_are_a_no_op() {
        let mut l = layer();
        let features = fixtures();
        l.sync(&features);
        let before = snapshot(l.context());

        assert_eq!(l.sync(&features), SyncReport::default());
        assert_eq!(snapshot(l.context()), before);
    }

    #[test]
    fn forced_revisit_rewrites_nothing() {
        let mut l = layer();
        let features = fixtures();
        l.sync(&features);
        let before = snapshot(l.context());

        l.invalidate();
        let report = l.sync(&features);
        assert_eq!(report.updated, 6);
        assert_eq!(report.created + report.recreated + report.removed, 0);
        assert_eq!(snapshot(l.context()), before);
    }

    #[test]
    fn removed_feature_loses_its_primitives() {
        let mut l = layer();
        let mut features = fixtures();
        l.sync(&features);
        let point = features.remove(0);

        let report = l.sync(&features);
        assert_eq!(report.removed, 2);
        assert!(l.context().billboards().is_empty());
        assert!(l.context().labels().is_empty());
        let g = point.geometries()[0].id();
        assert_eq!(l.context().primitive_for_geometry(g), None);
        assert_eq!(l.context().label_for_geometry(g), None);
        l.context().check_index().unwrap();
    }

    #[test]
    fn dropped_text_sweeps_label() {
        let mut l = layer();
        let mut features = fixtures();
        l.sync(&features);

        features[0].update_style(|s| s.text = None);
        let report = l.sync(&features);
        assert_eq!(report.visited, 1);
        assert_eq!(report.updated, 1);
        assert_eq!(report.removed, 1);
        assert!(l.context().labels().is_empty());
        assert_eq!(l.context().billboards().len(), 1);
    }

    #[test]
    fn dropped_image_sweeps_billboard() {
        let mut l = layer();
        let mut features = fixtures();
        l.sync(&features);

        features[0].update_style(|s| s.image = None);
        let report = l.sync(&features);
        assert_eq!(report.removed, 1);
        assert!(l.context().billboards().is_empty());
        assert_eq!(l.context().labels().len(), 1);
        l.context().check_index().unwrap();
    }

    #[test]
    fn geometry_edit_recomputes_only_that_feature() {
        let mut l = layer();
        let mut features = fixtures();
        l.sync(&features);

        let gid = features[2].geometries()[0].id();
        let g = features[2].geometry_mut(gid).unwrap();
        g.set_shape(GeometryShape::Polygon(vec![crate::testing::square_ring(
            11.0, 46.0, 0.2,
        )]));
        let revision = g.revision().0;

        let report = l.sync(&features);
        assert_eq!(report.visited, 1);
        assert_eq!(report.updated, 1);
        let id = l.context().primitive_for_geometry(gid).unwrap();
        assert_eq!(
            l.context().primitive(id).unwrap().state.geom_revision,
            Some(revision)
        );
    }

    #[test]
    fn becoming_dynamic_swaps_primitive_kind() {
        let mut l = layer();
        let mut features = fixtures();
        l.sync(&features);
        features[1].dynamic = true;

        let report = l.sync(&features);
        assert_eq!(report.recreated, 1);
        assert_eq!(l.context().polylines().len(), 2);
        assert_eq!(l.context().primitives().len(), 2);
        l.context().check_index().unwrap();
    }

    #[test]
    fn hiding_feature_hides_marker_and_label() {
        let mut l = layer();
        let mut features = fixtures();
        l.sync(&features);
        features[0].shown = false;
        l.sync(&features);

        let ctx = l.context();
        let g = features[0].geometries()[0].id();
        for id in [ctx.primitive_for_geometry(g), ctx.label_for_geometry(g)] {
            assert_eq!(ctx.is_primitive_shown(id.unwrap()), Some(false));
        }
    }

    #[test]
    fn refused_primitives_are_counted_per_feature() {
        let mut l = layer();
        let bad = |id| {
            let coords = vec![Coordinate::xy(f64::NAN, 0.0), Coordinate::xy(1.0, 1.0)];
            let g = Geometry::line_string(coords.clone(), Layout::XY);
            let g2 = Geometry::line_string(coords, Layout::XY);
            Feature::with_geometries(FeatureId(id), vec![g, g2])
        };
        let features = [bad(10), bad(11)];
        let report = l.sync(&features);
        assert_eq!(report.failed, 2);
        assert_eq!(report.not_applicable, 4);
        assert_eq!(l.context().primitive_count(), 0);
        l.context().check_index().unwrap();

        // Failures are not retried until the feature changes.
        assert_eq!(l.sync(&features).visited, 0);
    }

    #[test]
    fn time_change_revisits_tracks_only() {
        let mut l = layer();
        let features = fixtures();
        l.sync(&features);

        l.set_current_time(Some(15.0));
        let report = l.sync(&features);
        assert_eq!(report.visited, 1);
        assert_eq!(report.updated, 1);
        let id = l.context().polylines().get(0).unwrap().0;
        assert_eq!(l.context().polyline(id).unwrap().positions.len(), 2);
    }

    #[test]
    fn config_change_revisits_everything() {
        let mut l = layer();
        let features = fixtures();
        l.sync(&features);

        l.set_config(LayerConfig {
            opacity: 0.5,
            ..LayerConfig::default()
        });
        let report = l.sync(&features);
        assert_eq!(report.visited, 5);
        let (_, p) = l.context().primitives().get(0).unwrap();
        assert!(p.outline_color.unwrap().a <= 0.5);
    }
}
