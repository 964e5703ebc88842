use std::sync::atomic::{AtomicU64, Ordering};

use foundation::bounds::Extent2;
use foundation::ids::GeometryId;
use foundation::math::WGS84_A;

static NEXT_GEOMETRY_ID: AtomicU64 = AtomicU64::new(1);

fn next_geometry_id() -> GeometryId {
    GeometryId(NEXT_GEOMETRY_ID.fetch_add(1, Ordering::Relaxed))
}

/// Monotonic change counter, bumped on every structural change.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Revision(pub u64);

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    /// Altitude in meters; 0 for 2-D layouts.
    pub z: f64,
}

impl Coordinate {
    pub const fn xy(x: f64, y: f64) -> Self {
        Self { x, y, z: 0.0 }
    }

    pub const fn xyz(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Layout {
    XY,
    XYZ,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum GeometryType {
    Point,
    LineString,
    Polygon,
    Ellipse,
    Track,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ellipse {
    /// Center as `[lon, lat, alt]` degrees/meters.
    pub center: Coordinate,
    pub semi_major_m: f64,
    pub semi_minor_m: f64,
    /// Orientation of the major axis, degrees clockwise from north.
    pub orientation_deg: f64,
    /// Interpolated outline ring, closed.
    pub ring: Vec<Coordinate>,
}

pub const ELLIPSE_SEGMENTS: usize = 64;

impl Ellipse {
    pub fn new(center: Coordinate, semi_major_m: f64, semi_minor_m: f64, orientation_deg: f64) -> Self {
        let mut e = Self {
            center,
            semi_major_m,
            semi_minor_m,
            orientation_deg,
            ring: Vec::new(),
        };
        e.interpolate();
        e
    }

    /// Recomputes `ring` using a spherical small-offset approximation.
    pub fn interpolate(&mut self) {
        let lat0 = self.center.y.to_radians();
        let cos_lat = lat0.cos().max(1e-12);
        let o = self.orientation_deg.to_radians();
        let (major_e, major_n) = (o.sin(), o.cos());
        let (minor_e, minor_n) = (o.cos(), -o.sin());

        self.ring.clear();
        for i in 0..=ELLIPSE_SEGMENTS {
            let t = (i % ELLIPSE_SEGMENTS) as f64 / ELLIPSE_SEGMENTS as f64 * std::f64::consts::TAU;
            let a = self.semi_major_m * t.cos();
            let b = self.semi_minor_m * t.sin();
            let east = major_e * a + minor_e * b;
            let north = major_n * a + minor_n * b;
            self.ring.push(Coordinate::xyz(
                self.center.x + (east / (WGS84_A * cos_lat)).to_degrees(),
                self.center.y + (north / WGS84_A).to_degrees(),
                self.center.z,
            ));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum GeometryShape {
    Point(Coordinate),
    LineString(Vec<Coordinate>),
    /// First ring is the outer boundary; the rest are holes.
    Polygon(Vec<Vec<Coordinate>>),
    Ellipse(Ellipse),
    /// A line whose vertices carry timestamps (seconds), same length as the coordinates.
    Track {
        coords: Vec<Coordinate>,
        times: Vec<f64>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Geometry {
    id: GeometryId,
    revision: Revision,
    layout: Layout,
    shape: GeometryShape,
}

impl Geometry {
    fn with_shape(layout: Layout, shape: GeometryShape) -> Self {
        Self {
            id: next_geometry_id(),
            revision: Revision(1),
            layout,
            shape,
        }
    }

    pub fn point(coord: Coordinate, layout: Layout) -> Self {
        Self::with_shape(layout, GeometryShape::Point(coord))
    }

    pub fn line_string(coords: Vec<Coordinate>, layout: Layout) -> Self {
        Self::with_shape(layout, GeometryShape::LineString(coords))
    }

    pub fn polygon(rings: Vec<Vec<Coordinate>>, layout: Layout) -> Self {
        Self::with_shape(layout, GeometryShape::Polygon(rings))
    }

    pub fn ellipse(ellipse: Ellipse) -> Self {
        let layout = if ellipse.center.z != 0.0 {
            Layout::XYZ
        } else {
            Layout::XY
        };
        Self::with_shape(layout, GeometryShape::Ellipse(ellipse))
    }

    pub fn track(coords: Vec<Coordinate>, times: Vec<f64>, layout: Layout) -> Self {
        Self::with_shape(layout, GeometryShape::Track { coords, times })
    }

    pub fn id(&self) -> GeometryId {
        self.id
    }

    pub fn revision(&self) -> Revision {
        self.revision
    }

    pub fn layout(&self) -> Layout {
        self.layout
    }

    pub fn shape(&self) -> &GeometryShape {
        &self.shape
    }

    pub fn geometry_type(&self) -> GeometryType {
        match self.shape {
            GeometryShape::Point(_) => GeometryType::Point,
            GeometryShape::LineString(_) => GeometryType::LineString,
            GeometryShape::Polygon(_) => GeometryType::Polygon,
            GeometryShape::Ellipse(_) => GeometryType::Ellipse,
            GeometryShape::Track { .. } => GeometryType::Track,
        }
    }

    pub fn has_altitude(&self) -> bool {
        self.layout == Layout::XYZ
    }

    /// Marks a structural change.
    pub fn changed(&mut self) {
        self.revision = Revision(self.revision.0 + 1);
    }

    /// Replaces the shape and bumps the revision.
    pub fn set_shape(&mut self, shape: GeometryShape) {
        self.shape = shape;
        self.changed();
    }

    pub fn first_coordinate(&self) -> Option<Coordinate> {
        match &self.shape {
            GeometryShape::Point(c) => Some(*c),
            GeometryShape::LineString(coords) => coords.first().copied(),
            GeometryShape::Polygon(rings) => rings.first().and_then(|r| r.first()).copied(),
            GeometryShape::Ellipse(e) => e.ring.first().copied(),
            GeometryShape::Track { coords, .. } => coords.first().copied(),
        }
    }

    pub fn extent(&self) -> Extent2 {
        let mut extent = Extent2::empty();
        let mut add = |c: &Coordinate| extent.extend(c.x, c.y);
        match &self.shape {
            GeometryShape::Point(c) => add(c),
            GeometryShape::LineString(coords) => coords.iter().for_each(add),
            GeometryShape::Polygon(rings) => rings.iter().flatten().for_each(add),
            GeometryShape::Ellipse(e) => e.ring.iter().for_each(add),
            GeometryShape::Track { coords, .. } => coords.iter().for_each(add),
        }
        extent
    }

    /// Moves an ellipse center and re-interpolates its outline.
    pub fn set_ellipse_center(&mut self, center: Coordinate) -> bool {
        let GeometryShape::Ellipse(e) = &mut self.shape else {
            return false;
        };
        e.center = center;
        e.interpolate();
        self.layout = if center.z != 0.0 {
            Layout::XYZ
        } else {
            Layout::XY
        };
        self.changed();
        true
    }

    pub fn push_track_point(&mut self, coord: Coordinate, time: f64) -> bool {
        let GeometryShape::Track { coords, times } = &mut self.shape else {
            return false;
        };
        coords.push(coord);
        times.push(time);
        self.changed();
        true
    }

    /// Repairs polygon rings: closes them, drops repeated vertices and
    /// degenerate rings, and orients the shell counter-clockwise with clockwise
    /// holes. Bumps the revision only when something was corrected.
    pub fn correct_polygon(&mut self) -> bool {
        let GeometryShape::Polygon(rings) = &mut self.shape else {
            return false;
        };

        let mut corrected: Vec<Vec<Coordinate>> = Vec::with_capacity(rings.len());
        for (i, ring) in rings.iter().enumerate() {
            let mut r: Vec<Coordinate> = Vec::with_capacity(ring.len() + 1);
            for c in ring {
                if r.last().is_some_and(|l: &Coordinate| l.x == c.x && l.y == c.y) {
                    continue;
                }
                r.push(*c);
            }
            if let (Some(first), Some(last)) = (r.first().copied(), r.last().copied())
                && (first.x != last.x || first.y != last.y)
            {
                r.push(first);
            }
            if r.len() < 4 {
                continue;
            }
            let ccw = signed_area(&r) > 0.0;
            let want_ccw = i == 0;
            if ccw != want_ccw {
                r.reverse();
            }
            corrected.push(r);
        }

        if corrected == *rings {
            return false;
        }
        *rings = corrected;
        self.changed();
        true
    }
}

fn signed_area(ring: &[Coordinate]) -> f64 {
    ring.windows(2)
        .map(|w| w[0].x * w[1].y - w[1].x * w[0].y)
        .sum::<f64>()
        * 0.5
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square(cw: bool) -> Vec<Coordinate> {
        let mut r = vec![
            Coordinate::xy(0.0, 0.0),
            Coordinate::xy(1.0, 0.0),
            Coordinate::xy(1.0, 1.0),
            Coordinate::xy(0.0, 1.0),
            Coordinate::xy(0.0, 0.0),
        ];
        if cw {
            r.reverse();
        }
        r
    }

    #[test]
    fn ids_are_unique_and_revision_starts_at_one() {
        let a = Geometry::point(Coordinate::xy(0.0, 0.0), Layout::XY);
        let b = Geometry::point(Coordinate::xy(0.0, 0.0), Layout::XY);
        assert_ne!(a.id(), b.id());
        assert_eq!(a.revision(), Revision(1));
    }

    #[test]
    fn set_shape_bumps_revision() {
        let mut g = Geometry::line_string(vec![Coordinate::xy(0.0, 0.0)], Layout::XY);
        g.set_shape(GeometryShape::LineString(vec![
            Coordinate::xy(0.0, 0.0),
            Coordinate::xy(1.0, 1.0),
        ]));
        assert_eq!(g.revision(), Revision(2));
    }

    #[test]
    fn extent_center_of_polygon() {
        let g = Geometry::polygon(vec![square(false)], Layout::XY);
        assert_eq!(g.extent().center(), Some([0.5, 0.5]));
    }

    #[test]
    fn correcting_a_clean_polygon_is_a_no_op() {
        let mut g = Geometry::polygon(vec![square(false)], Layout::XY);
        assert!(!g.correct_polygon());
        assert_eq!(g.revision(), Revision(1));
    }

    #[test]
    fn correcting_reorients_and_closes_rings() {
        let mut open_cw = square(true);
        open_cw.pop();
        open_cw.insert(1, open_cw[0]);
        let mut g = Geometry::polygon(vec![open_cw], Layout::XY);
        assert!(g.correct_polygon());
        assert_eq!(g.revision(), Revision(2));

        let GeometryShape::Polygon(rings) = g.shape() else {
            panic!("expected polygon");
        };
        assert_eq!(rings[0].len(), 5);
        assert_eq!(rings[0].first(), rings[0].last());
        assert!(signed_area(&rings[0]) > 0.0);
    }

    #[test]
    fn ellipse_ring_is_closed_and_layout_tracks_altitude() {
        let mut g = Geometry::ellipse(Ellipse::new(
            Coordinate::xy(-5.0, -5.0),
            100_000.0,
            50_000.0,
            45.0,
        ));
        assert!(!g.has_altitude());
        let GeometryShape::Ellipse(e) = g.shape() else {
            panic!("expected ellipse");
        };
        assert_eq!(e.ring.len(), ELLIPSE_SEGMENTS + 1);
        assert_eq!(e.ring.first(), e.ring.last());

        assert!(g.set_ellipse_center(Coordinate::xyz(0.0, 0.0, 1000.0)));
        assert!(g.has_altitude());
        assert_eq!(g.revision(), Revision(2));
    }

    #[test]
    fn track_points_append() {
        let mut g = Geometry::track(vec![Coordinate::xy(0.0, 0.0)], vec![0.0], Layout::XY);
        assert!(g.push_track_point(Coordinate::xy(1.0, 0.0), 10.0));
        assert_eq!(g.revision(), Revision(2));
        assert_eq!(g.geometry_type(), GeometryType::Track);
    }
}
