/// Camera and globe state the renderer exposes to per-layer contexts.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SceneView {
    /// Camera height above the ellipsoid (meters).
    pub camera_height_m: f64,
    pub terrain_enabled: bool,
}

impl Default for SceneView {
    fn default() -> Self {
        Self {
            camera_height_m: 10_000_000.0,
            terrain_enabled: false,
        }
    }
}
