use features::{Feature, Geometry, Style};
use scene::{Polyline, PrimitiveId, PrimitiveKind};
use tracing::trace;

use super::{Converter, created, line_coordinates, to_positions};
use crate::context::VectorContext;
use crate::style::{dash_pattern, line_color, line_width};

/// Draws frequently edited line strings as polylines, which accept new
/// vertices and width in place.
#[derive(Debug, Default, Copy, Clone)]
pub struct DynamicLineConverter;

struct LineStyle {
    width: f32,
    color: foundation::color::Color,
    dash_pattern: Option<u16>,
    show: bool,
}

impl LineStyle {
    fn resolve(feature: &Feature, style: &Style, context: &VectorContext) -> Self {
        let stroke = style.stroke.as_ref();
        Self {
            width: line_width(stroke),
            color: line_color(stroke, context.opacity()),
            dash_pattern: stroke.and_then(|s| dash_pattern(&s.line_dash)),
            show: context.feature_shown(feature),
        }
    }

    fn apply(&self, polyline: &mut Polyline) {
        polyline.width = self.width;
        polyline.color = self.color;
        polyline.dash_pattern = self.dash_pattern;
        polyline.show = self.show;
    }
}

impl Converter for DynamicLineConverter {
    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let line_style = LineStyle::resolve(feature, style, context);
        let positions = to_positions(context, line_coordinates(geometry));
        let mut polyline = Polyline::new(positions, line_style.width, line_style.color);
        line_style.apply(&mut polyline);
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
        let revision = geometry.revision().0;
        let Some(current) = context.polyline(primitive) else {
            return false;
        };
        let positions = if current.state.geom_revision != Some(revision) {
            let positions = to_positions(context, line_coordinates(geometry));
            // The polyline cannot hold fewer than two vertices.
            if positions.len() < 2 {
                return false;
            }
            Some(positions)
        } else {
            trace!("polyline {primitive}: geometry unchanged");
            None
        };
        let line_style = LineStyle::resolve(feature, style, context);

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
        line_style.apply(polyline);
        polyline.state.dirty = false;
        true
    }
}
