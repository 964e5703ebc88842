use foundation::color::Color;
use foundation::math::Vec3;

use super::{ScenePrimitive, SyncState, check_positions};
use crate::entity::PrimitiveKind;
use crate::error::SceneError;

/// In-place updatable line.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub positions: Vec<Vec3>,
    pub width: f32,
    pub color: Color,
    /// 16-bit repeating dash mask, MSB first; `None` draws solid.
    pub dash_pattern: Option<u16>,
    pub show: bool,
    pub state: SyncState,
}

impl Polyline {
    pub fn new(positions: Vec<Vec3>, width: f32, color: Color) -> Self {
        Self {
            positions,
            width,
            color,
            dash_pattern: None,
            show: true,
            state: SyncState::default(),
        }
    }
}

impl ScenePrimitive for Polyline {
    const KIND: PrimitiveKind = PrimitiveKind::Polyline;

    fn validate(&self) -> Result<(), SceneError> {
        check_positions(Self::KIND, &self.positions, 2)?;
        if !(self.width.is_finite() && self.width > 0.0) {
            return Err(SceneError::Degenerate {
                kind: Self::KIND,
                reason: "width must be positive",
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
