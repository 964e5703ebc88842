use features::AltitudeMode;
use serde::{Deserialize, Serialize};

/// Layer-wide styling and 3-D display options.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerConfig {
    pub visible: bool,
    /// Multiplied into every primitive color's alpha.
    pub opacity: f32,
    pub altitude_mode: AltitudeMode,
    /// Draw a vertical line from elevated ellipses down to the ground.
    pub show_ground_reference: bool,
    /// Render ellipses as 3-D ellipsoids instead of outlines.
    pub ellipsoids: bool,
    pub default_font: String,
    /// Upper bound for the label eye offset (meters).
    pub max_label_eye_offset_m: f64,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            visible: true,
            opacity: 1.0,
            altitude_mode: AltitudeMode::Absolute,
            show_ground_reference: false,
            ellipsoids: false,
            default_font: "bold 14px Arial".to_string(),
            max_label_eye_offset_m: 10_000.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::LayerConfig;
    use features::AltitudeMode;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: LayerConfig =
            serde_json::from_str(r#"{"opacity": 0.5, "altitude_mode": "clamp_to_ground"}"#)
                .unwrap();
        assert_eq!(cfg.opacity, 0.5);
        assert_eq!(cfg.altitude_mode, AltitudeMode::ClampToGround);
        assert!(cfg.visible);
        assert_eq!(cfg.default_font, LayerConfig::default().default_font);
    }
}
