use earcutr::earcut;
use foundation::math::{Ecef, Geodetic, LocalFrame, Vec3};

/// Triangles and boundary rings of one polygon, in ECEF.
#[derive(Debug, Clone, PartialEq)]
pub struct Tessellation {
    /// Flat list, three vertices per triangle.
    pub triangles: Vec<Vec3>,
    pub outlines: Vec<Vec<Vec3>>,
}

/// Triangulates `rings` (outer first, then holes) in the tangent plane at
/// `origin`. Returns `None` when nothing drawable is left.
pub fn tessellate(rings: &[Vec<Vec3>], origin: Geodetic) -> Option<Tessellation> {
    let frame = LocalFrame::at(origin);

    let mut vertices: Vec<Vec3> = Vec::new();
    let mut coords_2d: Vec<f64> = Vec::new();
    let mut hole_indices: Vec<usize> = Vec::new();
    let mut outlines: Vec<Vec<Vec3>> = Vec::with_capacity(rings.len());

    for (ring_i, ring) in rings.iter().enumerate() {
        let open = open_ring(ring);
        if open.len() < 3 {
            // A degenerate shell leaves nothing to draw; degenerate holes are skipped.
            if ring_i == 0 {
                return None;
            }
            continue;
        }
        if ring_i > 0 {
            hole_indices.push(vertices.len());
        }
        for p in open {
            let enu = frame.to_local(Ecef::from(*p));
            coords_2d.push(enu.east);
            coords_2d.push(enu.north);
            vertices.push(*p);
        }
        outlines.push(ring.clone());
    }

    let indices = earcut(&coords_2d, &hole_indices, 2).ok()?;
    let triangles: Vec<Vec3> = indices
        .into_iter()
        .filter_map(|i| vertices.get(i).copied())
        .collect();
    if triangles.is_empty() {
        return None;
    }
    Some(Tessellation {
        triangles,
        outlines,
    })
}

/// The ring without its closing duplicate vertex.
fn open_ring(ring: &[Vec3]) -> &[Vec3] {
    match ring {
        [first, .., last] if (*first - *last).length() < 1e-9 => &ring[..ring.len() - 1],
        _ => ring,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use foundation::math::geodetic_to_ecef;

    fn ecef(lon: f64, lat: f64) -> Vec3 {
        geodetic_to_ecef(Geodetic::from_lon_lat_deg(lon, lat, 0.0)).into()
    }

    fn square(lon: f64, lat: f64, d: f64) -> Vec<Vec3> {
        vec![
            ecef(lon - d, lat - d),
            ecef(lon + d, lat - d),
            ecef(lon + d, lat + d),
            ecef(lon - d, lat + d),
            ecef(lon - d, lat - d),
        ]
    }

    #[test]
    fn square_is_two_triangles() {
        let t = tessellate(&[square(10.0, 45.0, 0.01)], Geodetic::from_lon_lat_deg(10.0, 45.0, 0.0))
            .unwrap();
        assert_eq!(t.triangles.len(), 6);
        assert_eq!(t.outlines.len(), 1);
        assert_eq!(t.outlines[0].len(), 5);
    }

    #[test]
    fn holes_add_triangles() {
        let rings = [square(10.0, 45.0, 0.02), square(10.0, 45.0, 0.01)];
        let t = tessellate(&rings, Geodetic::from_lon_lat_deg(10.0, 45.0, 0.0)).unwrap();
        assert_eq!(t.triangles.len(), 8 * 3);
        assert_eq!(t.outlines.len(), 2);
    }

    #[test]
    fn degenerate_shell_is_none() {
        let ring = vec![ecef(0.0, 0.0), ecef(1.0, 0.0), ecef(0.0, 0.0)];
        assert_eq!(tessellate(&[ring], Geodetic::from_lon_lat_deg(0.0, 0.0, 0.0)), None);
        assert_eq!(tessellate(&[], Geodetic::from_lon_lat_deg(0.0, 0.0, 0.0)), None);
    }
}
