use features::{Feature, Geometry, ImageStyle, Style};
use foundation::color::Color;
use scene::{Billboard, BillboardImage, HeightReference, PrimitiveId, PrimitiveKind};
use tracing::trace;

use super::{Converter, created};
use crate::context::VectorContext;
use crate::height::height_reference;
use crate::shape::{draw_shape, shape_key};

/// Draws point geometries with an image style as billboards.
#[derive(Debug, Default, Copy, Clone)]
pub struct PointConverter;

/// Cheap billboard attributes, resolved before the billboard is borrowed.
struct Attributes {
    show: bool,
    opacity: f32,
    height_reference: HeightReference,
}

impl Attributes {
    fn resolve(feature: &Feature, geometry: &Geometry, context: &VectorContext) -> Self {
        Self {
            show: context.feature_shown(feature),
            opacity: context.opacity(),
            height_reference: height_reference(context.layer(), feature, geometry),
        }
    }

    fn apply(&self, billboard: &mut Billboard, image: &ImageStyle) {
        billboard.show = self.show;
        billboard.height_reference = self.height_reference;
        match image {
            ImageStyle::Icon(icon) => {
                billboard.color = icon.color.unwrap_or(Color::WHITE).with_opacity(self.opacity);
                billboard.scale = icon.scale;
                billboard.rotation = icon.rotation;
            }
            ImageStyle::Shape(_) => {
                // Fill and stroke colors are baked into the raster.
                billboard.color = Color::WHITE.with_opacity(self.opacity);
                billboard.scale = 1.0;
                billboard.rotation = 0.0;
            }
        }
    }
}

fn initial_image(image: &ImageStyle) -> (BillboardImage, Option<[u32; 2]>) {
    match image {
        ImageStyle::Icon(icon) => (
            BillboardImage::Pending {
                src: icon.src.clone(),
            },
            None,
        ),
        ImageStyle::Shape(shape) => {
            let raster = draw_shape(shape);
            let size = [raster.width, raster.height];
            (
                BillboardImage::Raster {
                    key: shape_key(shape),
                    raster,
                },
                Some(size),
            )
        }
    }
}

/// Swaps the billboard image when the style points elsewhere. Returns the
/// source to load when a deferred request is needed.
fn refresh_image(billboard: &mut Billboard, image: &ImageStyle) -> Option<String> {
    match image {
        ImageStyle::Icon(icon) => {
            if billboard.image.src() == Some(icon.src.as_str()) {
                return None;
            }
            billboard.image = BillboardImage::Pending {
                src: icon.src.clone(),
            };
            billboard.size = None;
            billboard.image_generation = billboard.image_generation.wrapping_add(1);
            Some(icon.src.clone())
        }
        ImageStyle::Shape(shape) => {
            let key = shape_key(shape);
            if matches!(&billboard.image, BillboardImage::Raster { key: k, .. } if *k == key) {
                return None;
            }
            let raster = draw_shape(shape);
            billboard.size = Some([raster.width, raster.height]);
            billboard.image = BillboardImage::Raster { key, raster };
            // Any icon load still in flight is now stale.
            billboard.image_generation = billboard.image_generation.wrapping_add(1);
            None
        }
    }
}

impl Converter for PointConverter {
    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let Some(image) = &style.image else {
            return false;
        };
        let Some(coord) = geometry.first_coordinate() else {
            return false;
        };

        let (initial, size) = initial_image(image);
        let mut billboard = Billboard::new(context.to_cartesian(&coord), initial);
        billboard.size = size;
        billboard.state.geom_revision = Some(geometry.revision().0);
        Attributes::resolve(feature, geometry, context).apply(&mut billboard, image);

        let generation = billboard.image_generation;
        let result = context.add_billboard(billboard, feature, geometry);
        let Some(id) = created(result, feature, geometry, context) else {
            return false;
        };
        if let ImageStyle::Icon(icon) = image {
            context.request_image(id, generation, icon.src.clone());
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
        if primitive.kind != PrimitiveKind::Billboard {
            return false;
        }
        let Some(image) = &style.image else {
            return false;
        };
        let Some(coord) = geometry.first_coordinate() else {
            return false;
        };
        let revision = geometry.revision().0;
        let Some(current) = context.billboard(primitive) else {
            return false;
        };
        let position =
            (current.state.geom_revision != Some(revision)).then(|| context.to_cartesian(&coord));
        let attributes = Attributes::resolve(feature, geometry, context);

        let Some(billboard) = context.billboard_mut(primitive) else {
            return false;
        };
        if billboard.state.is_destroyed() {
            return false;
        }
        match position {
            Some(p) => {
                billboard.position = p;
                billboard.state.geom_revision = Some(revision);
            }
            None => trace!("billboard {primitive}: geometry unchanged"),
        }
        attributes.apply(billboard, image);
        let request = refresh_image(billboard, image);
        billboard.state.dirty = false;

        let generation = billboard.image_generation;
        if let Some(src) = request {
            context.request_image(primitive, generation, src);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::ImageCompletion;
    use crate::testing::{context, icon, point_feature};
    use features::{Fill, RegularShape, Stroke};
    use scene::image::{ImageError, ImageHandle};

    fn handle(id: u64) -> ImageHandle {
        ImageHandle {
            id,
            width: 32,
            height: 48,
        }
    }

    #[test]
    fn icon_creates_pending_billboard() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("pin.png")));
        let g = &f.geometries()[0];

        assert!(PointConverter.create(&f, g, f.style(), &mut ctx));
        assert_eq!(ctx.billboards().len(), 1);
        let id = PointConverter.retrieve(&f, g, f.style(), &ctx).unwrap();
        let b = ctx.billboard(id).unwrap();
        assert!(matches!(&b.image, BillboardImage::Pending { src } if src == "pin.png"));
        assert!(!b.state.dirty);
        let generation = b.image_generation;

        let requests = ctx.take_image_requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].billboard, id);
        assert_eq!(requests[0].generation, generation);
    }

    #[test]
    fn no_image_is_not_applicable() {
        let mut ctx = context();
        let f = point_feature(1, Style::new());
        assert!(!PointConverter.create(&f, &f.geometries()[0], f.style(), &mut ctx));
        assert!(ctx.billboards().is_empty());
    }

    #[test]
    fn image_completion_applies_to_live_billboard() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("pin.png")));
        PointConverter.create(&f, &f.geometries()[0], f.style(), &mut ctx);
        let request = ctx.take_image_requests().remove(0);

        assert_eq!(
            ctx.complete_image(&request, Ok(handle(9))),
            ImageCompletion::Applied
        );
        let b = ctx.billboard(request.billboard).unwrap();
        assert_eq!(b.size, Some([32, 48]));
        assert!(matches!(b.image, BillboardImage::Loaded { .. }));
    }

    #[test]
    fn completion_after_delete_is_ignored() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("pin.png")));
        let g = &f.geometries()[0];
        PointConverter.create(&f, g, f.style(), &mut ctx);
        let request = ctx.take_image_requests().remove(0);

        assert!(PointConverter.delete(&f, g, &mut ctx));
        assert_eq!(PointConverter.retrieve(&f, g, f.style(), &ctx), None);
        assert_eq!(
            ctx.complete_image(&request, Ok(handle(1))),
            ImageCompletion::Stale
        );
        assert!(ctx.billboards().is_empty());
        ctx.check_index().unwrap();
    }

    #[test]
    fn delete_cancels_queued_requests() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("pin.png")));
        let g = &f.geometries()[0];
        PointConverter.create(&f, g, f.style(), &mut ctx);
        PointConverter.delete(&f, g, &mut ctx);
        assert!(ctx.pending_image_requests().is_empty());
    }

    #[test]
    fn changing_icon_supersedes_pending_load() {
        let mut ctx = context();
        let mut f = point_feature(1, Style::new().with_image(icon("a.png")));
        let g = f.geometries()[0].clone();
        PointConverter.create(&f, &g, f.style(), &mut ctx);
        let id = ctx.primitive_for_geometry(g.id()).unwrap();
        let old = ctx.take_image_requests().remove(0);

        f.update_style(|s| s.image = Some(icon("b.png")));
        assert!(PointConverter.update(&f, &g, f.style(), &mut ctx, id));
        let new = ctx.take_image_requests().remove(0);
        assert_eq!(new.billboard, id);
        assert_ne!(new.generation, old.generation);

        assert_eq!(
            ctx.complete_image(&old, Ok(handle(1))),
            ImageCompletion::Stale
        );
        assert_eq!(
            ctx.complete_image(&new, Err(ImageError::NotFound("b.png".into()))),
            ImageCompletion::Failed
        );
        assert!(matches!(
            ctx.billboard(id).unwrap().image,
            BillboardImage::Failed { .. }
        ));
    }

    #[test]
    fn same_icon_does_not_reload() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("a.png")));
        let g = &f.geometries()[0];
        PointConverter.create(&f, g, f.style(), &mut ctx);
        ctx.take_image_requests();
        let id = ctx.primitive_for_geometry(g.id()).unwrap();

        assert!(PointConverter.update(&f, g, f.style(), &mut ctx, id));
        assert!(ctx.pending_image_requests().is_empty());
    }

    #[test]
    fn shape_is_rasterized_with_its_colors() {
        let mut ctx = context();
        let fill = Color::new(1.0, 0.0, 0.0, 1.0);
        let stroke = Stroke::new(Color::new(0.0, 0.0, 1.0, 1.0), 2.0);
        let shape = RegularShape::circle(5.0, Some(Fill { color: fill }), Some(stroke));
        let f = point_feature(1, Style::new().with_image(ImageStyle::Shape(shape)));
        let g = &f.geometries()[0];
        PointConverter.create(&f, g, f.style(), &mut ctx);

        let id = ctx.primitive_for_geometry(g.id()).unwrap();
        let b = ctx.billboard(id).unwrap();
        assert_eq!(b.color, Color::WHITE);
        assert_eq!(b.size, Some([15, 15]));
        let BillboardImage::Raster { raster, .. } = &b.image else {
            panic!("expected raster");
        };
        assert_eq!(raster.get(7, 7), Some([255, 0, 0, 255]));
        // Left edge of the circle sits at x = 7.5 - 5.
        assert_eq!(raster.get(2, 7), Some([0, 0, 255, 255]));
        assert!(ctx.pending_image_requests().is_empty());
    }

    #[test]
    fn fill_change_redraws_shape() {
        let mut ctx = context();
        let circle = |color| RegularShape::circle(5.0, Some(Fill { color }), None);
        let mut f = point_feature(
            1,
            Style::new().with_image(ImageStyle::Shape(circle(Color::WHITE))),
        );
        let g = f.geometries()[0].clone();
        PointConverter.create(&f, &g, f.style(), &mut ctx);
        let id = ctx.primitive_for_geometry(g.id()).unwrap();

        f.set_style(Style::new().with_image(ImageStyle::Shape(circle(Color::BLACK))));
        assert!(PointConverter.update(&f, &g, f.style(), &mut ctx, id));
        let b = ctx.billboard(id).unwrap();
        let BillboardImage::Raster { raster, .. } = &b.image else {
            panic!("expected raster");
        };
        assert_eq!(raster.get(5, 5), Some([0, 0, 0, 255]));
    }

    #[test]
    fn unchanged_geometry_keeps_position() {
        let mut ctx = context();
        let f = point_feature(1, Style::new().with_image(icon("a.png")));
        let g = &f.geometries()[0];
        PointConverter.create(&f, g, f.style(), &mut ctx);
        let id = ctx.primitive_for_geometry(g.id()).unwrap();

        // A position written behind the converter's back survives an update
        // with the same geometry revision.
        let marker = foundation::math::Vec3::new(1.0, 2.0, 3.0);
        ctx.billboard_mut(id).unwrap().position = marker;
        PointConverter.update(&f, g, f.style(), &mut ctx, id);
        assert_eq!(ctx.billboard(id).unwrap().position, marker);

        let mut moved = g.clone();
        moved.changed();
        PointConverter.update(&f, &moved, f.style(), &mut ctx, id);
        assert_ne!(ctx.billboard(id).unwrap().position, marker);
    }

    #[test]
    fn hidden_feature_hides_billboard() {
        let mut ctx = context();
        let mut f = point_feature(1, Style::new().with_image(icon("a.png")));
        f.shown = false;
        let g = &f.geometries()[0];
        PointConverter.create(&f, g, f.style(), &mut ctx);
        let id = ctx.primitive_for_geometry(g.id()).unwrap();
        assert_eq!(ctx.is_primitive_shown(id), Some(false));
    }
}
