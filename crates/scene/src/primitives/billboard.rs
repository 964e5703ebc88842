use foundation::color::Color;
use foundation::math::Vec3;

use super::{
    HeightReference, HorizontalOrigin, ScenePrimitive, SyncState, VerticalOrigin, check_position,
};
use crate::entity::PrimitiveKind;
use crate::error::SceneError;
use crate::image::{ImageHandle, Raster};

#[derive(Debug, Clone, PartialEq)]
pub enum BillboardImage {
    /// Waiting on a deferred image load.
    Pending { src: String },
    Loaded { src: String, image: ImageHandle },
    Failed { src: String },
    /// Drawn in-process; `key` identifies the drawing inputs.
    Raster { key: u64, raster: Raster },
}

impl BillboardImage {
    pub fn src(&self) -> Option<&str> {
        match self {
            BillboardImage::Pending { src }
            | BillboardImage::Loaded { src, .. }
            | BillboardImage::Failed { src } => Some(src),
            BillboardImage::Raster { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Billboard {
    pub position: Vec3,
    pub show: bool,
    /// Tint multiplied into the image.
    pub color: Color,
    pub scale: f32,
    pub rotation: f32,
    pub image: BillboardImage,
    /// Bumped whenever `image` is re-requested; deferred loads carry the value they were issued for.
    pub image_generation: u32,
    /// Pixel size of the resolved image.
    pub size: Option<[u32; 2]>,
    pub pixel_offset: [f64; 2],
    pub eye_offset: Vec3,
    pub height_reference: HeightReference,
    pub horizontal_origin: HorizontalOrigin,
    pub vertical_origin: VerticalOrigin,
    pub state: SyncState,
}

impl Billboard {
    pub fn new(position: Vec3, image: BillboardImage) -> Self {
        Self {
            position,
            show: true,
            color: Color::WHITE,
            scale: 1.0,
            rotation: 0.0,
            image,
            image_generation: 0,
            size: None,
            pixel_offset: [0.0, 0.0],
            eye_offset: Vec3::ZERO,
            height_reference: HeightReference::None,
            horizontal_origin: HorizontalOrigin::Center,
            vertical_origin: VerticalOrigin::Center,
            state: SyncState::default(),
        }
    }
}

impl ScenePrimitive for Billboard {
    const KIND: PrimitiveKind = PrimitiveKind::Billboard;

    fn validate(&self) -> Result<(), SceneError> {
        check_position(Self::KIND, self.position)?;
        if !(self.scale.is_finite() && self.scale > 0.0) {
            return Err(SceneError::Degenerate {
                kind: Self::KIND,
                reason: "scale must be positive",
            });
        }
        Ok(())
    }

    fn state(&self) -> &SyncState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut SyncState {
        &mut self.state
    }

    fn is_shown(&self) -> bool {
        self.show
    }
}
