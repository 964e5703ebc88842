use features::{Feature, Geometry, GeometryShape, Style};
use foundation::math::Geodetic;
use scene::{Primitive, PrimitiveId, PrimitiveKind, PrimitiveShape, SceneError};
use tracing::trace;

use super::{Converter, Paint, created, to_positions};
use crate::context::VectorContext;
use crate::tessellate::{Tessellation, tessellate};

/// Draws polygons as triangulated fill plus outline rings.
#[derive(Debug, Default, Copy, Clone)]
pub struct PolygonConverter;

fn polygon_tessellation(geometry: &Geometry, context: &VectorContext) -> Option<Tessellation> {
    let GeometryShape::Polygon(rings) = geometry.shape() else {
        return None;
    };
    let outer = rings.first()?;
    let origin = centroid(outer.iter().map(|c| context.geodetic(c)))?;
    let rings: Vec<_> = rings.iter().map(|r| to_positions(context, r)).collect();
    tessellate(&rings, origin)
}

fn centroid(points: impl Iterator<Item = Geodetic>) -> Option<Geodetic> {
    let (mut lat, mut lon, mut n) = (0.0, 0.0, 0usize);
    for p in points {
        lat += p.lat_rad;
        lon += p.lon_rad;
        n += 1;
    }
    (n > 0).then(|| Geodetic::new(lat / n as f64, lon / n as f64, 0.0))
}

impl Converter for PolygonConverter {
    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let Some(t) = polygon_tessellation(geometry, context) else {
            context.record_failure(
                feature,
                geometry,
                SceneError::Degenerate {
                    kind: PrimitiveKind::Primitive,
                    reason: "polygon has no drawable area",
                },
            );
            return false;
        };
        let mut primitive = Primitive::new(PrimitiveShape::Polygon {
            triangles: t.triangles,
            outlines: t.outlines,
        });
        primitive.state.geom_revision = Some(geometry.revision().0);
        Paint::area(feature, style, context).apply(&mut primitive);

        let result = context.add_primitive(primitive, feature, geometry);
        created(result, feature, geometry, context).is_some()
    }

    fn update(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
        primitive: PrimitiveId,
    ) -> bool {
        if primitive.kind != PrimitiveKind::Primitive {
            return false;
        }
        let revision = geometry.revision().0;
        let Some(current) = context.primitive(primitive) else {
            return false;
        };
        if !matches!(current.shape, PrimitiveShape::Polygon { .. }) {
            return false;
        }
        let retriangulated = if current.state.geom_revision != Some(revision) {
            // Nothing drawable left; let the driver rebuild (and report) it.
            let Some(t) = polygon_tessellation(geometry, context) else {
                return false;
            };
            Some(t)
        } else {
            trace!("polygon {primitive}: geometry unchanged");
            None
        };

        let paint = Paint::area(feature, style, context);

        let Some(p) = context.primitive_mut(primitive) else {
            return false;
        };
        if p.state.is_destroyed() {
            return false;
        }
        if let Some(t) = retriangulated {
            p.shape = PrimitiveShape::Polygon {
                triangles: t.triangles,
                outlines: t.outlines,
            };
            p.state.geom_revision = Some(revision);
        }
        paint.apply(p);
        p.state.dirty = false;
        true
    }
}
