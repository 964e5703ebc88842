use features::{Feature, Geometry, Style};
use scene::{Primitive, PrimitiveId, PrimitiveKind, PrimitiveShape};

use super::{Converter, Paint, created, line_coordinates, to_positions};
use crate::context::VectorContext;

/// Draws static line strings as batched primitives. Their vertices and width
/// are baked at construction, so geometry or width changes rebuild them.
#[derive(Debug, Default, Copy, Clone)]
pub struct LineConverter;

impl Converter for LineConverter {
    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let paint = Paint::outline(feature, style, context);
        let mut primitive = Primitive::new(PrimitiveShape::Line {
            positions: to_positions(context, line_coordinates(geometry)),
            width: paint.outline_width,
        });
        primitive.state.geom_revision = Some(geometry.revision().0);
        paint.apply(&mut primitive);

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
        let paint = Paint::outline(feature, style, context);
        let Some(p) = context.primitive_mut(primitive) else {
            return false;
        };
        if p.state.is_destroyed() || p.state.geom_revision != Some(geometry.revision().0) {
            return false;
        }
        let PrimitiveShape::Line { width, .. } = p.shape else {
            return false;
        };
        if width != paint.outline_width {
            return false;
        }
        paint.apply(p);
        p.state.dirty = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_converter::{ConverterOutcome, run_converter};
    use crate::testing::{context, line_feature, stroke};
    use foundation::color::Color;

    #[test]
    fn dash_change_updates_in_place() {
        let mut ctx = context();
        let mut f = line_feature(1, Style::new().with_stroke(stroke(2.0)));
        let g = f.geometries()[0].clone();
        assert!(LineConverter.create(&f, &g, f.style(), &mut ctx));
        let id = ctx.primitive_for_geometry(g.id()).unwrap();
        assert_eq!(ctx.primitive(id).unwrap().dash_pattern, None);

        f.update_style(|s| {
            if let Some(stroke) = s.stroke.as_mut() {
                stroke.line_dash = vec![12.0, 4.0];
            }
        });
        assert!(LineConverter.update(&f, &g, f.style(), &mut ctx, id));
        assert_eq!(ctx.primitive_for_geometry(g.id()), Some(id));
        assert_eq!(
            ctx.primitive(id).unwrap().dash_pattern,
            Some(0b1111_1111_1111_0000)
        );
    }

    #[test]
    fn unstyled_line_uses_default_stroke() {
        let mut ctx = context();
        let f = line_feature(1, Style::new());
        let g = &f.geometries()[0];
        assert!(LineConverter.create(&f, g, f.style(), &mut ctx));
        let id = ctx.primitive_for_geometry(g.id()).unwrap();
        let p = ctx.primitive(id).unwrap();
        assert_eq!(p.outline_color, Some(crate::style::DEFAULT_STROKE_COLOR));
        assert!(matches!(p.shape, PrimitiveShape::Line { width, .. } if width == 1.0));
    }

    #[test]
    fn width_change_recreates() {
        let mut ctx = context();
        let mut f = line_feature(1, Style::new().with_stroke(stroke(2.0)));
        let g = f.geometries()[0].clone();
        run_converter(&LineConverter, &f, &g, f.style(), &mut ctx);
        let before = ctx.primitive_for_geometry(g.id()).unwrap();

        f.update_style(|s| s.stroke = Some(stroke(5.0)));
        assert_eq!(
            run_converter(&LineConverter, &f, &g, f.style(), &mut ctx),
            ConverterOutcome::Recreated
        );
        let after = ctx.primitive_for_geometry(g.id()).unwrap();
        assert_ne!(before, after);
        assert_eq!(ctx.primitives().len(), 1);
        ctx.check_index().unwrap();
    }

    #[test]
    fn geometry_change_recreates() {
        let mut ctx = context();
        let f = line_feature(1, Style::new());
        let mut g = f.geometries()[0].clone();
        LineConverter.create(&f, &g, f.style(), &mut ctx);
        let id = ctx.primitive_for_geometry(g.id()).unwrap();

        g.changed();
        assert!(!LineConverter.update(&f, &g, f.style(), &mut ctx, id));
    }

    #[test]
    fn color_refreshes_in_place() {
        let mut ctx = context();
        let mut f = line_feature(1, Style::new().with_stroke(stroke(2.0)));
        let g = f.geometries()[0].clone();
        LineConverter.create(&f, &g, f.style(), &mut ctx);
        let id = ctx.primitive_for_geometry(g.id()).unwrap();

        f.update_style(|s| {
            if let Some(stroke) = s.stroke.as_mut() {
                stroke.color = Color::BLACK;
            }
        });
        assert!(LineConverter.update(&f, &g, f.style(), &mut ctx, id));
        assert_eq!(ctx.primitive(id).unwrap().outline_color, Some(Color::BLACK));
    }
}
