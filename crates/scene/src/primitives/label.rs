use foundation::color::Color;
use foundation::math::Vec3;

use super::{
    HeightReference, HorizontalOrigin, ScenePrimitive, SyncState, VerticalOrigin, check_position,
};
use crate::entity::PrimitiveKind;
use crate::error::SceneError;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum LabelStyle {
    #[default]
    Fill,
    Outline,
    FillAndOutline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub position: Vec3,
    pub text: String,
    pub font: String,
    pub fill_color: Color,
    pub outline_color: Color,
    pub outline_width: f32,
    pub style: LabelStyle,
    pub horizontal_origin: HorizontalOrigin,
    pub vertical_origin: VerticalOrigin,
    pub pixel_offset: [f64; 2],
    pub eye_offset: Vec3,
    pub height_reference: HeightReference,
    pub show: bool,
    pub state: SyncState,
}

impl Default for Label {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            text: String::new(),
            font: String::new(),
            fill_color: Color::WHITE,
            outline_color: Color::BLACK,
            outline_width: 1.0,
            style: LabelStyle::Fill,
            horizontal_origin: HorizontalOrigin::Center,
            vertical_origin: VerticalOrigin::Center,
            pixel_offset: [0.0, 0.0],
            eye_offset: Vec3::ZERO,
            height_reference: HeightReference::None,
            show: true,
            state: SyncState::default(),
        }
    }
}

impl ScenePrimitive for Label {
    const KIND: PrimitiveKind = PrimitiveKind::Label;

    fn validate(&self) -> Result<(), SceneError> {
        check_position(Self::KIND, self.position)
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
