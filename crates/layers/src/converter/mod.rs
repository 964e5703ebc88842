//! The four-operation contract that turns one feature geometry into scene
//! primitives, and its eight implementations.

mod dynamic_line;
mod ellipse;
mod ellipsoid;
mod label;
mod line;
mod point;
mod polygon;
mod registry;
mod run;

pub use dynamic_line::DynamicLineConverter;
pub use ellipse::EllipseConverter;
pub use ellipsoid::EllipsoidConverter;
pub use label::{LabelConverter, sanitize_label_text};
pub use line::LineConverter;
pub use point::PointConverter;
pub use polygon::PolygonConverter;
pub use registry::{CONVERTERS, ConverterRegistry, StyleClass};
pub use run::RunConverter;

use features::{Coordinate, Feature, Geometry, GeometryShape, Style};
use foundation::color::Color;
use foundation::math::Vec3;
use scene::{Primitive, PrimitiveId, SceneError};

use crate::context::VectorContext;
use crate::style::{DEFAULT_STROKE_COLOR, dash_pattern, fill_color, line_color, line_width, stroke_color};

/// Reconciles one (feature, geometry, style) with its primitive.
///
/// `create` returns false when the style does not call for a primitive.
/// `update` returns false when the primitive cannot be revised in place,
/// after which the driver deletes and recreates it.
pub trait Converter {
    fn retrieve(
        &self,
        _feature: &Feature,
        geometry: &Geometry,
        _style: &Style,
        context: &VectorContext,
    ) -> Option<PrimitiveId> {
        context.primitive_for_geometry(geometry.id())
    }

    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool;

    fn update(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
        primitive: PrimitiveId,
    ) -> bool;

    fn delete(&self, _feature: &Feature, geometry: &Geometry, context: &mut VectorContext) -> bool {
        match context.primitive_for_geometry(geometry.id()) {
            Some(id) => context.remove_primitive(id),
            None => false,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConverterKind {
    Point,
    Label,
    Polygon,
    Ellipse,
    Ellipsoid,
    Line,
    DynamicLine,
    Run,
}

impl ConverterKind {
    fn converter(self) -> &'static dyn Converter {
        match self {
            ConverterKind::Point => &PointConverter,
            ConverterKind::Label => &LabelConverter,
            ConverterKind::Polygon => &PolygonConverter,
            ConverterKind::Ellipse => &EllipseConverter,
            ConverterKind::Ellipsoid => &EllipsoidConverter,
            ConverterKind::Line => &LineConverter,
            ConverterKind::DynamicLine => &DynamicLineConverter,
            ConverterKind::Run => &RunConverter,
        }
    }
}

impl Converter for ConverterKind {
    fn retrieve(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &VectorContext,
    ) -> Option<PrimitiveId> {
        self.converter().retrieve(feature, geometry, style, context)
    }

    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        self.converter().create(feature, geometry, style, context)
    }

    fn update(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
        primitive: PrimitiveId,
    ) -> bool {
        self.converter()
            .update(feature, geometry, style, context, primitive)
    }

    fn delete(&self, feature: &Feature, geometry: &Geometry, context: &mut VectorContext) -> bool {
        self.converter().delete(feature, geometry, context)
    }
}

/// Vertices of line-like geometries.
pub(crate) fn line_coordinates(geometry: &Geometry) -> &[Coordinate] {
    match geometry.shape() {
        GeometryShape::LineString(coords) => coords,
        GeometryShape::Track { coords, .. } => coords,
        GeometryShape::Ellipse(e) => &e.ring,
        GeometryShape::Point(c) => std::slice::from_ref(c),
        GeometryShape::Polygon(rings) => rings.first().map(Vec::as_slice).unwrap_or(&[]),
    }
}

pub(crate) fn to_positions(context: &VectorContext, coords: &[Coordinate]) -> Vec<Vec3> {
    coords.iter().map(|c| context.to_cartesian(c)).collect()
}

/// Converts an `add_*` result into the converter's boolean outcome.
pub(crate) fn created(
    result: Result<PrimitiveId, SceneError>,
    feature: &Feature,
    geometry: &Geometry,
    context: &mut VectorContext,
) -> Option<PrimitiveId> {
    match result {
        Ok(id) => Some(id),
        Err(err) => {
            context.record_failure(feature, geometry, err);
            None
        }
    }
}

/// Colors and stroke of a batched primitive, resolved from a style.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Paint {
    pub fill_color: Option<Color>,
    pub outline_color: Option<Color>,
    pub outline_width: f32,
    pub dash_pattern: Option<u16>,
    pub show: bool,
}

impl Paint {
    /// Fill and stroke as styled; a shape with neither gets the default outline.
    pub(crate) fn area(feature: &Feature, style: &Style, context: &VectorContext) -> Self {
        let opacity = context.opacity();
        let fill = fill_color(style.fill.as_ref(), opacity);
        let outline = match (fill, stroke_color(style.stroke.as_ref(), opacity)) {
            (None, None) => Some(DEFAULT_STROKE_COLOR.with_opacity(opacity)),
            (_, stroke) => stroke,
        };
        Self::with_colors(fill, outline, feature, style, context)
    }

    /// Stroke only, falling back to the default stroke color.
    pub(crate) fn outline(feature: &Feature, style: &Style, context: &VectorContext) -> Self {
        let outline = line_color(style.stroke.as_ref(), context.opacity());
        Self::with_colors(None, Some(outline), feature, style, context)
    }

    fn with_colors(
        fill_color: Option<Color>,
        outline_color: Option<Color>,
        feature: &Feature,
        style: &Style,
        context: &VectorContext,
    ) -> Self {
        Self {
            fill_color,
            outline_color,
            outline_width: line_width(style.stroke.as_ref()),
            dash_pattern: style
                .stroke
                .as_ref()
                .and_then(|s| dash_pattern(&s.line_dash)),
            show: context.feature_shown(feature),
        }
    }

    pub(crate) fn apply(&self, primitive: &mut Primitive) {
        primitive.fill_color = self.fill_color;
        primitive.outline_color = self.outline_color;
        primitive.outline_width = self.outline_width;
        primitive.dash_pattern = self.dash_pattern;
        primitive.show = self.show;
    }
}
