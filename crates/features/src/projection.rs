use serde::{Deserialize, Serialize};

use foundation::math::WGS84_A;

/// Source projection of feature coordinates.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Projection {
    #[default]
    #[serde(rename = "EPSG:4326")]
    Epsg4326,
    #[serde(rename = "EPSG:3857")]
    Epsg3857,
}

impl Projection {
    /// Converts a projected `[x, y]` into `[lon, lat]` degrees.
    pub fn to_lon_lat(self, xy: [f64; 2]) -> [f64; 2] {
        match self {
            Projection::Epsg4326 => xy,
            Projection::Epsg3857 => {
                let lon = (xy[0] / WGS84_A).to_degrees();
                let lat = (2.0 * (xy[1] / WGS84_A).exp().atan() - std::f64::consts::FRAC_PI_2)
                    .to_degrees();
                [lon, lat]
            }
        }
    }
}
