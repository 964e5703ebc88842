pub mod billboard;
pub mod label;
pub mod polygon;
pub mod polyline;

pub use billboard::*;
pub use label::*;
pub use polygon::*;
pub use polyline::*;

use foundation::math::Vec3;

use crate::entity::PrimitiveKind;
use crate::error::SceneError;

/// Reconciliation bookkeeping carried by every primitive.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SyncState {
    /// Not yet confirmed current in the running pass.
    pub dirty: bool,
    /// Source geometry revision the position/shape was computed from.
    pub geom_revision: Option<u64>,
    destroyed: bool,
}

impl SyncState {
    pub fn is_destroyed(&self) -> bool {
        self.destroyed
    }

    pub(crate) fn destroy(&mut self) {
        self.destroyed = true;
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum HeightReference {
    #[default]
    None,
    ClampToGround,
    RelativeToGround,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum HorizontalOrigin {
    #[default]
    Center,
    Left,
    Right,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default)]
pub enum VerticalOrigin {
    #[default]
    Center,
    Bottom,
    Top,
}

/// Common surface of everything stored in a [`crate::PrimitiveCollection`].
pub trait ScenePrimitive {
    const KIND: PrimitiveKind;

    /// Construction check; the renderer rejects primitives that fail it.
    fn validate(&self) -> Result<(), SceneError>;
    fn state(&self) -> &SyncState;
    fn state_mut(&mut self) -> &mut SyncState;
    fn is_shown(&self) -> bool;
}

pub(crate) fn check_position(kind: PrimitiveKind, p: Vec3) -> Result<(), SceneError> {
    if p.is_finite() {
        Ok(())
    } else {
        Err(SceneError::NonFinitePosition { kind })
    }
}

pub(crate) fn check_positions(
    kind: PrimitiveKind,
    positions: &[Vec3],
    min: usize,
) -> Result<(), SceneError> {
    if positions.len() < min {
        return Err(SceneError::TooFewVertices {
            kind,
            min,
            got: positions.len(),
        });
    }
    positions
        .iter()
        .try_for_each(|p| check_position(kind, *p))
}
