//! Fixtures shared by the converter and driver tests.

use features::{
    Coordinate, Ellipse, Feature, Geometry, IconStyle, ImageStyle, Layout, Projection, Stroke,
    Style, TextStyle,
};
use foundation::color::Color;
use foundation::ids::FeatureId;
use scene::SceneView;

use crate::context::VectorContext;
use crate::symbology::LayerConfig;

pub(crate) fn context() -> VectorContext {
    context_with(LayerConfig::default())
}

pub(crate) fn context_with(layer: LayerConfig) -> VectorContext {
    VectorContext::new(layer, Projection::Epsg4326, SceneView::default())
}

pub(crate) fn icon(src: &str) -> ImageStyle {
    ImageStyle::Icon(IconStyle {
        src: src.to_string(),
        scale: 1.0,
        rotation: 0.0,
        color: None,
    })
}

pub(crate) fn text(value: &str) -> TextStyle {
    TextStyle {
        text: Some(value.to_string()),
        ..TextStyle::default()
    }
}

pub(crate) fn stroke(width: f32) -> Stroke {
    Stroke::new(Color::new(1.0, 0.0, 0.0, 1.0), width)
}

pub(crate) fn with_style(mut feature: Feature, style: Style) -> Feature {
    feature.set_style(style);
    feature
}

pub(crate) fn point_feature(id: u64, style: Style) -> Feature {
    let g = Geometry::point(Coordinate::xyz(10.0, 45.0, 100.0), Layout::XYZ);
    with_style(Feature::new(FeatureId(id), g), style)
}

pub(crate) fn line_feature(id: u64, style: Style) -> Feature {
    let g = Geometry::line_string(
        vec![
            Coordinate::xy(10.0, 45.0),
            Coordinate::xy(10.1, 45.1),
            Coordinate::xy(10.2, 45.0),
        ],
        Layout::XY,
    );
    with_style(Feature::new(FeatureId(id), g), style)
}

pub(crate) fn square_ring(lon: f64, lat: f64, d: f64) -> Vec<Coordinate> {
    vec![
        Coordinate::xy(lon - d, lat - d),
        Coordinate::xy(lon + d, lat - d),
        Coordinate::xy(lon + d, lat + d),
        Coordinate::xy(lon - d, lat + d),
        Coordinate::xy(lon - d, lat - d),
    ]
}

pub(crate) fn polygon_feature(id: u64, style: Style) -> Feature {
    let g = Geometry::polygon(vec![square_ring(10.0, 45.0, 0.1)], Layout::XY);
    with_style(Feature::new(FeatureId(id), g), style)
}

pub(crate) fn ellipse_feature(id: u64, altitude: f64, style: Style) -> Feature {
    let g = Geometry::ellipse(Ellipse::new(
        Coordinate::xyz(10.0, 45.0, altitude),
        2000.0,
        1000.0,
        30.0,
    ));
    with_style(Feature::new(FeatureId(id), g), style)
}

pub(crate) fn track_feature(id: u64, style: Style) -> Feature {
    let g = Geometry::track(
        vec![
            Coordinate::xy(10.0, 45.0),
            Coordinate::xy(10.1, 45.0),
            Coordinate::xy(10.2, 45.0),
            Coordinate::xy(10.3, 45.0),
        ],
        vec![0.0, 10.0, 20.0, 30.0],
        Layout::XY,
    );
    with_style(Feature::new(FeatureId(id), g), style)
}
