use features::{Feature, Geometry, GeometryShape, Style};
use foundation::math::Vec3;
use scene::{Polyline, PrimitiveId, PrimitiveKind};
use tracing::trace;

use super::{Converter, created, to_positions};
use crate::context::VectorContext;
use crate::style::{dash_pattern, line_color, line_width};

/// Draws the part of a track already travelled at the context's current time.
#[derive(Debug, Default, Copy, Clone)]
pub struct RunConverter;

/// Number of leading track vertices with a timestamp at or before `time`.
pub(crate) fn visible_count(times: &[f64], time: Option<f64>) -> usize {
    match time {
        Some(t) => times.iter().take_while(|ts| **ts <= t).count(),
        None => times.len(),
    }
}

fn visible_positions(geometry: &Geometry, context: &VectorContext) -> Option<Vec<Vec3>> {
    let GeometryShape::Track { coords, times } = geometry.shape() else {
        return None;
    };
    let n = visible_count(times, context.current_time()).min(coords.len());
    // Nothing to draw until the track has a segment.
    (n >= 2).then(|| to_positions(context, &coords[..n]))
}

impl Converter for RunConverter {
    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let Some(positions) = visible_positions(geometry, context) else {
            return false;
        };
        let stroke = style.stroke.as_ref();
        let mut polyline = Polyline::new(
            positions,
            line_width(stroke),
            line_color(stroke, context.opacity()),
        );
        polyline.dash_pattern = stroke.and_then(|s| dash_pattern(&s.line_dash));
        polyline.show = context.feature_shown(feature);
        polyline.state.geom_revision = Some(geometry.revision().0);

        let result = context.add_polyline(polyline, feature, geometry);
        created(result, feature, geometry, context).is_some()
    }

    fn update(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
        primitive: PrimitiveId,
    ) -> bool {
        if primitive.kind != PrimitiveKind::Polyline {
            return false;
        }
        let GeometryShape::Track { coords, times } = geometry.shape() else {
            return false;
        };
        let revision = geometry.revision().0;
        let Some(current) = context.polyline(primitive) else {
            return false;
        };
        let visible = visible_count(times, context.current_time()).min(coords.len());
        let positions = if current.state.geom_revision != Some(revision)
            || current.positions.len() != visible
        {
            // Hidden until a full segment is reached again.
            let Some(positions) = visible_positions(geometry, context) else {
                return false;
            };
            Some(positions)
        } else {
            trace!("track {primitive}: visible portion unchanged");
            None
        };
        let stroke = style.stroke.as_ref();
        let width = line_width(stroke);
        let color = line_color(stroke, context.opacity());
        let show = context.feature_shown(feature);

        let Some(polyline) = context.polyline_mut(primitive) else {
            return false;
        };
        if polyline.state.is_destroyed() {
            return false;
        }
        if let Some(positions) = positions {
            polyline.positions = positions;
            polyline.state.geom_revision = Some(revision);
        }
        polyline.width = width;
        polyline.color = color;
        polyline.dash_pattern = stroke.and_then(|s| dash_pattern(&s.line_dash));
        polyline.show = show;
        polyline.state.dirty = false;
        true
    }
}
