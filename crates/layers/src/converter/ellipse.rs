use features::{Coordinate, Ellipse, Feature, Geometry, GeometryShape, Style};
use foundation::color::Color;
use foundation::math::Vec3;
use scene::{Polyline, Primitive, PrimitiveId, PrimitiveKind, PrimitiveShape};
use tracing::{debug, trace};

use super::{Converter, Paint, created, to_positions};
use crate::context::VectorContext;
use crate::style::DEFAULT_LINE_WIDTH;

/// Draws ellipses as outline rings, with an optional line from an elevated
/// center down to the ground.
#[derive(Debug, Default, Copy, Clone)]
pub struct EllipseConverter;

fn ellipse(geometry: &Geometry) -> Option<&Ellipse> {
    match geometry.shape() {
        GeometryShape::Ellipse(e) => Some(e),
        _ => None,
    }
}

/// A ground reference is drawn only when enabled and the center is off the ground.
fn wants_ground_reference(e: &Ellipse, context: &VectorContext) -> bool {
    context.layer().show_ground_reference && e.center.z != 0.0
}

fn ground_reference_positions(e: &Ellipse, context: &VectorContext) -> Vec<Vec3> {
    let ground = Coordinate::xyz(e.center.x, e.center.y, 0.0);
    vec![context.to_cartesian(&e.center), context.to_cartesian(&ground)]
}

fn outline_color(paint: &Paint) -> Color {
    paint.outline_color.unwrap_or(Color::WHITE)
}

fn add_ground_reference(
    e: &Ellipse,
    paint: &Paint,
    feature: &Feature,
    geometry: &Geometry,
    context: &mut VectorContext,
) {
    let mut line = Polyline::new(
        ground_reference_positions(e, context),
        DEFAULT_LINE_WIDTH,
        outline_color(paint),
    );
    line.show = paint.show;
    line.state.geom_revision = Some(geometry.revision().0);
    let result = context.add_ground_reference(line, feature, geometry);
    created(result, feature, geometry, context);
}

/// Adds, refreshes, or removes the ground reference to match the ellipse.
fn sync_ground_reference(
    e: &Ellipse,
    paint: &Paint,
    feature: &Feature,
    geometry: &Geometry,
    context: &mut VectorContext,
) {
    let existing = context.ground_reference_for_geometry(geometry.id());
    match (wants_ground_reference(e, context), existing) {
        (true, None) => add_ground_reference(e, paint, feature, geometry, context),
        (true, Some(id)) => {
            let revision = geometry.revision().0;
            let positions = context
                .polyline(id)
                .filter(|l| l.state.geom_revision != Some(revision))
                .map(|_| ground_reference_positions(e, context));
            let Some(line) = context.polyline_mut(id) else {
                return;
            };
            if line.state.is_destroyed() {
                context.remove_primitive(id);
                add_ground_reference(e, paint, feature, geometry, context);
                return;
            }
            if let Some(positions) = positions {
                line.positions = positions;
                line.state.geom_revision = Some(revision);
            }
            line.color = outline_color(paint);
            line.show = paint.show;
            line.state.dirty = false;
        }
        (false, Some(id)) => {
            debug!("removing ground reference of geometry {}", geometry.id());
            context.remove_primitive(id);
        }
        (false, None) => {}
    }
}

impl Converter for EllipseConverter {
    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let Some(e) = ellipse(geometry) else {
            return false;
        };
        let paint = Paint::outline(feature, style, context);
        let mut primitive = Primitive::new(PrimitiveShape::Outline {
            rings: vec![to_positions(context, &e.ring)],
        });
        primitive.state.geom_revision = Some(geometry.revision().0);
        paint.apply(&mut primitive);

        let result = context.add_primitive(primitive, feature, geometry);
        if created(result, feature, geometry, context).is_none() {
            return false;
        }
        if wants_ground_reference(e, context) {
            add_ground_reference(e, &paint, feature, geometry, context);
        }
        true
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
        let Some(e) = ellipse(geometry) else {
            return false;
        };
        let revision = geometry.revision().0;
        let Some(current) = context.primitive(primitive) else {
            return false;
        };
        if !matches!(current.shape, PrimitiveShape::Outline { .. }) {
            return false;
        }
        let ring = if current.state.geom_revision != Some(revision) {
            Some(to_positions(context, &e.ring))
        } else {
            trace!("ellipse {primitive}: geometry unchanged");
            None
        };
        let paint = Paint::outline(feature, style, context);

        let Some(p) = context.primitive_mut(primitive) else {
            return false;
        };
        if p.state.is_destroyed() {
            return false;
        }
        if let Some(ring) = ring {
            p.shape = PrimitiveShape::Outline { rings: vec![ring] };
            p.state.geom_revision = Some(revision);
        }
        paint.apply(p);
        p.state.dirty = false;

        sync_ground_reference(e, &paint, feature, geometry, context);
        true
    }

    fn delete(&self, _feature: &Feature, geometry: &Geometry, context: &mut VectorContext) -> bool {
        if let Some(id) = context.ground_reference_for_geometry(geometry.id()) {
            context.remove_primitive(id);
        }
        match context.primitive_for_geometry(geometry.id()) {
            Some(id) => context.remove_primitive(id),
            None => false,
        }
    }
}
