use features::{Feature, Geometry, GeometryShape, Style};
use foundation::math::Vec3;
use scene::{Primitive, PrimitiveId, PrimitiveKind, PrimitiveShape};

use super::{Converter, Paint, created};
use crate::context::VectorContext;

/// Draws ellipses as solid ellipsoids. The volume is baked at construction,
/// so any geometry change rebuilds it.
#[derive(Debug, Default, Copy, Clone)]
pub struct EllipsoidConverter;

/// Solid volumes take the fill, else the stroke color.
fn paint(feature: &Feature, style: &Style, context: &VectorContext) -> Paint {
    let mut paint = Paint::area(feature, style, context);
    paint.fill_color = paint.fill_color.or(paint.outline_color);
    paint.outline_color = None;
    paint
}

impl Converter for EllipsoidConverter {
    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let GeometryShape::Ellipse(e) = geometry.shape() else {
            return false;
        };
        let vertical = e.semi_minor_m;
        let mut primitive = Primitive::new(PrimitiveShape::Ellipsoid {
            center: context.to_cartesian(&e.center),
            radii: Vec3::new(e.semi_major_m, e.semi_minor_m, vertical),
            heading_rad: e.orientation_deg.to_radians(),
        });
        primitive.state.geom_revision = Some(geometry.revision().0);
        paint(feature, style, context).apply(&mut primitive);

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
        let paint = paint(feature, style, context);
        let Some(p) = context.primitive_mut(primitive) else {
            return false;
        };
        if p.state.is_destroyed()
            || p.state.geom_revision != Some(geometry.revision().0)
            || !matches!(p.shape, PrimitiveShape::Ellipsoid { .. })
        {
            return false;
        }
        paint.apply(p);
        p.state.dirty = false;
        true
    }
}
