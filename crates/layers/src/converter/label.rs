use std::borrow::Cow;

use features::{Coordinate, Feature, Geometry, GeometryShape, Style, TextStyle};
use foundation::math::Vec3;
use scene::{HeightReference, Label, PrimitiveId, PrimitiveKind};
use tracing::{trace, warn};

use super::{Converter, created};
use crate::context::VectorContext;
use crate::height::height_reference;
use crate::style::{
    fill_color, horizontal_origin, label_style, line_width, stroke_color, vertical_origin,
};

/// Draws the text of a style as a label next to its geometry.
#[derive(Debug, Default, Copy, Clone)]
pub struct LabelConverter;

/// Strips characters outside `\n`, `\r`, printable ASCII and Latin-1.
/// Text measurement in the renderer does not terminate on some other code points.
pub fn sanitize_label_text(text: &str) -> Cow<'_, str> {
    fn keep(c: char) -> bool {
        matches!(c as u32, 0x0A | 0x0D | 0x20..=0x7E | 0xA0..=0xFF)
    }
    if text.chars().all(keep) {
        Cow::Borrowed(text)
    } else {
        Cow::Owned(text.chars().filter(|c| keep(*c)).collect())
    }
}

/// Everything a label update needs from the context, resolved up front.
struct LabelInputs {
    position: Option<Vec3>,
    show: bool,
    opacity: f32,
    height_reference: HeightReference,
    eye_offset: Vec3,
    default_font: String,
}

impl LabelInputs {
    fn resolve(
        feature: &Feature,
        geometry: &Geometry,
        context: &VectorContext,
        recompute_position: bool,
    ) -> Self {
        let position = if recompute_position {
            label_position(geometry, context)
        } else {
            None
        };
        // A hidden marker hides its label.
        let show = match context.primitive_for_geometry(geometry.id()) {
            Some(primary) => context
                .is_primitive_shown(primary)
                .unwrap_or_else(|| context.feature_shown(feature)),
            None => context.feature_shown(feature),
        };
        Self {
            position,
            show,
            opacity: context.opacity(),
            height_reference: height_reference(context.layer(), feature, geometry),
            eye_offset: context.label_eye_offset(),
            default_font: context.layer().default_font.clone(),
        }
    }

    fn apply(self, label: &mut Label, geometry: &Geometry, text: &TextStyle) {
        match self.position {
            Some(p) => {
                label.position = p;
                label.state.geom_revision = Some(geometry.revision().0);
            }
            None => trace!("label for geometry {}: position unchanged", geometry.id()),
        }
        label.height_reference = self.height_reference;
        label.show = self.show;
        label.eye_offset = self.eye_offset;

        if let Some(color) = fill_color(text.fill.as_ref(), self.opacity) {
            label.fill_color = color;
        }
        if let Some(color) = stroke_color(text.stroke.as_ref(), self.opacity) {
            label.outline_color = color;
            label.outline_width = line_width(text.stroke.as_ref());
        }
        if let Some(style) = label_style(text) {
            label.style = style;
        }

        if let Some(align) = text.text_align.as_deref() {
            match horizontal_origin(align) {
                Some(origin) => label.horizontal_origin = origin,
                None => warn!("unknown text alignment {align:?}"),
            }
        }
        if let Some(baseline) = text.text_baseline.as_deref() {
            match vertical_origin(baseline) {
                Some(origin) => label.vertical_origin = origin,
                None => warn!("unknown text baseline {baseline:?}"),
            }
        }

        let clean = sanitize_label_text(text.text.as_deref().unwrap_or_default());
        if label.text != clean {
            label.text = clean.into_owned();
        }
        let font = text.font.as_deref().unwrap_or(&self.default_font);
        if label.font != font {
            label.font = font.to_string();
        }
        label.pixel_offset = [text.offset_x, text.offset_y];
    }
}

/// Points label at the coordinate, other shapes at the extent center. Both use
/// the altitude of the first coordinate.
fn label_position(geometry: &Geometry, context: &VectorContext) -> Option<Vec3> {
    let first = geometry.first_coordinate()?;
    let mut anchor = match geometry.shape() {
        GeometryShape::Point(c) => *c,
        GeometryShape::Ellipse(e) => e.center,
        _ => {
            let [x, y] = geometry.extent().center()?;
            Coordinate::xy(x, y)
        }
    };
    anchor.z = first.z;
    Some(context.to_cartesian(&anchor))
}

impl Converter for LabelConverter {
    fn retrieve(
        &self,
        _feature: &Feature,
        geometry: &Geometry,
        _style: &Style,
        context: &VectorContext,
    ) -> Option<PrimitiveId> {
        context.label_for_geometry(geometry.id())
    }

    fn create(
        &self,
        feature: &Feature,
        geometry: &Geometry,
        style: &Style,
        context: &mut VectorContext,
    ) -> bool {
        let Some(text) = &style.text else {
            return false;
        };
        if geometry.first_coordinate().is_none() {
            return false;
        }
        let mut label = Label::default();
        LabelInputs::resolve(feature, geometry, context, true).apply(&mut label, geometry, text);

        let result = context.add_label(label, feature, geometry);
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
        if primitive.kind != PrimitiveKind::Label {
            return false;
        }
        let Some(text) = &style.text else {
            return false;
        };
        let Some(current) = context.label(primitive) else {
            return false;
        };
        let stale = current.state.geom_revision != Some(geometry.revision().0);
        let inputs = LabelInputs::resolve(feature, geometry, context, stale);

        let Some(label) = context.label_mut(primitive) else {
            return false;
        };
        if label.state.is_destroyed() {
            return false;
        }
        inputs.apply(label, geometry, text);
        label.state.dirty = false;
        true
    }

    fn delete(&self, _feature: &Feature, geometry: &Geometry, context: &mut VectorContext) -> bool {
        match context.label_for_geometry(geometry.id()) {
            Some(id) => context.remove_primitive(id),
            None => false,
        }
    }
}
