use super::{Ecef, Geodetic, geodetic_to_ecef};

/// Local East-North-Up coordinates (meters).
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    pub fn new(east: f64, north: f64, up: f64) -> Self {
        Self { east, north, up }
    }
}

/// Tangent-plane frame anchored at a geodetic origin.
///
/// The basis is computed once so repeated conversions (tessellating a ring,
/// interpolating an ellipse) do not redo the trigonometry per vertex.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct LocalFrame {
    origin: Ecef,
    east: [f64; 3],
    north: [f64; 3],
    up: [f64; 3],
}

impl LocalFrame {
    pub fn at(origin: Geodetic) -> Self {
        let sin_lat = origin.lat_rad.sin();
        let cos_lat = origin.lat_rad.cos();
        let sin_lon = origin.lon_rad.sin();
        let cos_lon = origin.lon_rad.cos();

        Self {
            origin: geodetic_to_ecef(origin),
            east: [-sin_lon, cos_lon, 0.0],
            north: [-sin_lat * cos_lon, -sin_lat * sin_lon, cos_lat],
            up: [cos_lat * cos_lon, cos_lat * sin_lon, sin_lat],
        }
    }

    pub fn origin(&self) -> Ecef {
        self.origin
    }

    pub fn to_local(&self, point: Ecef) -> Enu {
        let d = [
            point.x - self.origin.x,
            point.y - self.origin.y,
            point.z - self.origin.z,
        ];
        let dot = |axis: [f64; 3]| axis[0] * d[0] + axis[1] * d[1] + axis[2] * d[2];
        Enu::new(dot(self.east), dot(self.north), dot(self.up))
    }

    pub fn to_ecef(&self, enu: Enu) -> Ecef {
        let axis = |i: usize| self.east[i] * enu.east + self.north[i] * enu.north + self.up[i] * enu.up;
        Ecef::new(
            self.origin.x + axis(0),
            self.origin.y + axis(1),
            self.origin.z + axis(2),
        )
    }
}
