use features::{Feature, Geometry, GeometryType, Style};

use super::ConverterKind;
use crate::symbology::LayerConfig;

/// Style predicate half of the registry key.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StyleClass {
    /// The style carries an image (icon or procedural shape).
    Image,
    Plain,
    /// The feature is edited often and wants in-place updatable primitives.
    Dynamic,
    /// The layer draws ellipses as 3-D ellipsoids.
    Ellipsoid,
}

/// Converter for each (geometry type, style class) pair. Pairs not listed have
/// no primary primitive.
pub const CONVERTERS: [(GeometryType, StyleClass, ConverterKind); 10] = [
    (GeometryType::Point, StyleClass::Image, ConverterKind::Point),
    (GeometryType::LineString, StyleClass::Plain, ConverterKind::Line),
    (GeometryType::LineString, StyleClass::Dynamic, ConverterKind::DynamicLine),
    (GeometryType::Polygon, StyleClass::Plain, ConverterKind::Polygon),
    (GeometryType::Polygon, StyleClass::Dynamic, ConverterKind::Polygon),
    (GeometryType::Ellipse, StyleClass::Plain, ConverterKind::Ellipse),
    (GeometryType::Ellipse, StyleClass::Dynamic, ConverterKind::Ellipse),
    (GeometryType::Ellipse, StyleClass::Ellipsoid, ConverterKind::Ellipsoid),
    (GeometryType::Track, StyleClass::Plain, ConverterKind::Run),
    (GeometryType::Track, StyleClass::Dynamic, ConverterKind::Run),
];

#[derive(Debug, Default, Copy, Clone)]
pub struct ConverterRegistry;

impl ConverterRegistry {
    pub fn classify(
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        layer: &LayerConfig,
    ) -> StyleClass {
        match geometry.geometry_type() {
            GeometryType::Point if style.image.is_some() => StyleClass::Image,
            GeometryType::Ellipse if layer.ellipsoids => StyleClass::Ellipsoid,
            _ if feature.dynamic => StyleClass::Dynamic,
            _ => StyleClass::Plain,
        }
    }

    pub fn lookup(geometry_type: GeometryType, class: StyleClass) -> Option<ConverterKind> {
        CONVERTERS
            .iter()
            .find(|(g, c, _)| *g == geometry_type && *c == class)
            .map(|(_, _, kind)| *kind)
    }

    /// The converter drawing the geometry itself.
    pub fn resolve(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        layer: &LayerConfig,
    ) -> Option<ConverterKind> {
        let class = Self::classify(feature, geometry, style, layer);
        Self::lookup(geometry.geometry_type(), class)
    }

    /// The label converter, when the style has text.
    pub fn label(&self, style: &Style) -> Option<ConverterKind> {
        style.text.as_ref().map(|_| ConverterKind::Label)
    }
}
