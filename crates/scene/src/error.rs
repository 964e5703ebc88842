use crate::entity::PrimitiveKind;

/// The renderer refused to construct a primitive.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SceneError {
    #[error("{kind:?} position is not finite")]
    NonFinitePosition { kind: PrimitiveKind },
    #[error("{kind:?} needs at least {min} vertices, got {got}")]
    TooFewVertices {
        kind: PrimitiveKind,
        min: usize,
        got: usize,
    },
    #[error("{kind:?} has a degenerate shape: {reason}")]
    Degenerate {
        kind: PrimitiveKind,
        reason: &'static str,
    },
}
