use features::{Feature, Geometry, Style};
use tracing::debug;

use crate::context::VectorContext;
use crate::converter::Converter;

/// What one reconciliation step did.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ConverterOutcome {
    Created,
    /// No primitive existed and the style calls for none.
    NotApplicable,
    Updated,
    /// In-place update was infeasible; the primitive was rebuilt.
    Recreated,
    /// In-place update was infeasible and the rebuild produced nothing.
    Dropped,
}

/// Drives `converter` for one feature geometry: update the existing
/// primitive, rebuild it when that fails, or create one if none exists.
pub fn run_converter<C: Converter + ?Sized>(
    converter: &C,
    feature: &Feature,
    geometry: &Geometry,
    style: &Style,
    context: &mut VectorContext,
) -> ConverterOutcome {
    let outcome = match converter.retrieve(feature, geometry, style, context) {
        None => {
            if converter.create(feature, geometry, style, context) {
                ConverterOutcome::Created
            } else {
                ConverterOutcome::NotApplicable
            }
        }
        Some(primitive) => {
            if converter.update(feature, geometry, style, context, primitive) {
                ConverterOutcome::Updated
            } else {
                converter.delete(feature, geometry, context);
                if converter.create(feature, geometry, style, context) {
                    ConverterOutcome::Recreated
                } else {
                    ConverterOutcome::Dropped
                }
            }
        }
    };
    debug!(
        "feature {} geometry {}: {outcome:?}",
        feature.id(),
        geometry.id()
    );
    outcome
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use super::*;
    use crate::converter::{ConverterKind, PointConverter};
    use crate::testing::{context, icon, point_feature};
    use pretty_assertions::assert_eq;
    use scene::{Billboard, BillboardImage, PrimitiveId};

    /// Records calls and answers `create`/`update` as configured.
    struct Scripted {
        create_ok: bool,
        update_ok: bool,
        calls: RefCell<Vec<&'static str>>,
        updated: RefCell<Option<PrimitiveId>>,
    }

    impl Scripted {
        fn new(create_ok: bool, update_ok: bool) -> Self {
            Self {
                create_ok,
                update_ok,
                calls: RefCell::new(Vec::new()),
                updated: RefCell::new(None),
            }
        }

        fn calls(&self) -> Vec<&'static str> {
            self.calls.borrow().clone()
        }
    }

    impl Converter for Scripted {
        fn create(
            &self,
            feature: &Feature,
            geometry: &Geometry,
            _style: &Style,
            context: &mut VectorContext,
        ) -> bool {
            self.calls.borrow_mut().push("create");
            if self.create_ok {
                let b = Billboard::new(
                    context.to_cartesian(&geometry.first_coordinate().unwrap_or_default()),
                    BillboardImage::Failed { src: String::new() },
                );
                context.add_billboard(b, feature, geometry).unwrap();
            }
            self.create_ok
        }

        fn update(
            &self,
            _feature: &Feature,
            _geometry: &Geometry,
            _style: &Style,
            context: &mut VectorContext,
            primitive: PrimitiveId,
        ) -> bool {
            self.calls.borrow_mut().push("update");
            *self.updated.borrow_mut() = Some(primitive);
            if self.update_ok
                && let Some(b) = context.billboard_mut(primitive)
            {
                b.state.dirty = false;
            }
            self.update_ok
        }

        fn delete(&self, _feature: &Feature, geometry: &Geometry, context: &mut VectorContext) -> bool {
            self.calls.borrow_mut().push("delete");
            context
                .primitive_for_geometry(geometry.id())
                .is_some_and(|id| context.remove_primitive(id))
        }
    }

    #[test]
    fn absent_primitive_is_created() {
        let mut ctx = context();
        let f = point_feature(1, Style::new());
        let g = &f.geometries()[0];
        let c = Scripted::new(true, true);
        assert_eq!(
            run_converter(&c, &f, g, f.style(), &mut ctx),
            ConverterOutcome::Created
        );
        assert_eq!(c.calls(), vec!["create"]);
    }

    #[test]
    fn not_applicable_stops() {
        let mut ctx = context();
        let f = point_feature(1, Style::new());
        let c = Scripted::new(false, true);
        assert_eq!(
            run_converter(&c, &f, &f.geometries()[0], f.style(), &mut ctx),
            ConverterOutcome::NotApplicable
        );
        assert_eq!(c.calls(), vec!["create"]);
        assert_eq!(ctx.primitive_count(), 0);
    }

    #[test]
    fn present_primitive_is_updated() {
        let mut ctx = context();
        let f = point_feature(1, Style::new());
        let g = &f.geometries()[0];
        let c = Scripted::new(true, true);
        run_converter(&c, &f, g, f.style(), &mut ctx);
        let id = ctx.primitive_for_geometry(g.id());

        assert_eq!(
            run_converter(&c, &f, g, f.style(), &mut ctx),
            ConverterOutcome::Updated
        );
        assert_eq!(c.calls(), vec!["create", "update"]);
        assert_eq!(ctx.primitive_for_geometry(g.id()), id);
    }

    #[test]
    fn failed_update_deletes_once_then_creates_once() {
        let mut ctx = context();
        let f = point_feature(1, Style::new());
        let g = &f.geometries()[0];
        let c = Scripted::new(true, false);
        run_converter(&c, &f, g, f.style(), &mut ctx);

        assert_eq!(
            run_converter(&c, &f, g, f.style(), &mut ctx),
            ConverterOutcome::Recreated
        );
        assert_eq!(c.calls(), vec!["create", "update", "delete", "create"]);
        let old = c.updated.borrow().unwrap();
        let new = ctx.primitive_for_geometry(g.id()).unwrap();
        assert_ne!(old, new);
        assert!(!ctx.contains(old));
        assert_eq!(ctx.billboards().len(), 1);
        ctx.check_index().unwrap();
    }

    #[test]
    fn failed_rebuild_leaves_nothing() {
        let mut ctx = context();
        let f = point_feature(1, Style::new());
        let g = &f.geometries()[0];
        run_converter(&Scripted::new(true, true), &f, g, f.style(), &mut ctx);

        let c = Scripted::new(false, false);
        assert_eq!(
            run_converter(&c, &f, g, f.style(), &mut ctx),
            ConverterOutcome::Dropped
        );
        assert_eq!(ctx.primitive_count(), 0);
        assert_eq!(ctx.primitive_for_geometry(g.id()), None);
    }

    #[test]
    fn image_point_through_registry_kind() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("pin.png")));
        let g = &f.geometries()[0];
        assert_eq!(
            run_converter(&ConverterKind::Point, &f, g, f.style(), &mut ctx),
            ConverterOutcome::Created
        );
        assert_eq!(ctx.billboards().len(), 1);
        let id = PointConverter.retrieve(&f, g, f.style(), &ctx).unwrap();
        assert_eq!(ctx.billboards().get(0).map(|(i, _)| i), Some(id));
    }

    #[test]
    fn works_through_trait_objects() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("pin.png")));
        let converter: &dyn Converter = &PointConverter;
        assert_eq!(
            run_converter(converter, &f, &f.geometries()[0], f.style(), &mut ctx),
            ConverterOutcome::Created
        );
    }
}
