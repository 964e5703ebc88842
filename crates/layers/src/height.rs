use features::{AltitudeMode, Feature, Geometry};
use scene::HeightReference;

use crate::symbology::LayerConfig;

/// Resolves how a feature's primitives are positioned relative to terrain.
///
/// The feature's own altitude mode wins over the layer's. Absolute mode on a
/// geometry without altitude clamps to the ground.
pub fn height_reference(
    layer: &LayerConfig,
    feature: &Feature,
    geometry: &Geometry,
) -> HeightReference {
    match feature.altitude_mode.unwrap_or(layer.altitude_mode) {
        AltitudeMode::ClampToGround => HeightReference::ClampToGround,
        AltitudeMode::RelativeToGround => HeightReference::RelativeToGround,
        AltitudeMode::Absolute if !geometry.has_altitude() => HeightReference::ClampToGround,
        AltitudeMode::Absolute => HeightReference::None,
    }
}

#[cfg(test)]
mod tests {
    use super::height_reference;
    use crate::symbology::LayerConfig;
    use features::{AltitudeMode, Coordinate, Feature, Geometry, Layout};
    use foundation::ids::FeatureId;
    use scene::HeightReference;

    #[test]
    fn feature_mode_overrides_layer() {
        let layer = LayerConfig {
            altitude_mode: AltitudeMode::ClampToGround,
            ..LayerConfig::default()
        };
        let g = Geometry::point(Coordinate::xyz(0.0, 0.0, 50.0), Layout::XYZ);
        let mut f = Feature::new(FeatureId(1), g.clone());
        assert_eq!(height_reference(&layer, &f, &g), HeightReference::ClampToGround);

        f.altitude_mode = Some(AltitudeMode::Absolute);
        assert_eq!(height_reference(&layer, &f, &g), HeightReference::None);
    }

    #[test]
    fn absolute_without_altitude_clamps() {
        let g = Geometry::point(Coordinate::xy(0.0, 0.0), Layout::XY);
        let f = Feature::new(FeatureId(1), g.clone());
        assert_eq!(
            height_reference(&LayerConfig::default(), &f, &g),
            HeightReference::ClampToGround
        );
    }
}
