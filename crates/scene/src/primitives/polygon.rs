use foundation::color::Color;
use foundation::math::Vec3;

use super::{ScenePrimitive, SyncState, check_position, check_positions};
use crate::entity::PrimitiveKind;
use crate::error::SceneError;

/// Geometry baked into a [`Primitive`].
#[derive(Debug, Clone, PartialEq)]
pub enum PrimitiveShape {
    /// Flat triangle list (3 vertices per triangle) plus boundary rings for the outline.
    Polygon {
        triangles: Vec<Vec3>,
        outlines: Vec<Vec<Vec3>>,
    },
    /// Closed outline rings only.
    Outline { rings: Vec<Vec<Vec3>> },
    Line { positions: Vec<Vec3>, width: f32 },
    Ellipsoid {
        center: Vec3,
        /// Semi-axes (meters): major, minor, vertical.
        radii: Vec3,
        heading_rad: f64,
    },
}

/// Batched geometry primitive (polygons, ellipse outlines, static lines, ellipsoids).
#[derive(Debug, Clone, PartialEq)]
pub struct Primitive {
    pub shape: PrimitiveShape,
    pub fill_color: Option<Color>,
    pub outline_color: Option<Color>,
    pub outline_width: f32,
    pub dash_pattern: Option<u16>,
    pub show: bool,
    pub state: SyncState,
}

impl Primitive {
    pub fn new(shape: PrimitiveShape) -> Self {
        Self {
            shape,
            fill_color: None,
            outline_color: None,
            outline_width: 1.0,
            dash_pattern: None,
            show: true,
            state: SyncState::default(),
        }
    }
}

impl ScenePrimitive for Primitive {
    const KIND: PrimitiveKind = PrimitiveKind::Primitive;

    fn validate(&self) -> Result<(), SceneError> {
        let kind = Self::KIND;
        match &self.shape {
            PrimitiveShape::Polygon {
                triangles,
                outlines,
            } => {
                check_positions(kind, triangles, 3)?;
                if triangles.len() % 3 != 0 {
                    return Err(SceneError::Degenerate {
                        kind,
                        reason: "triangle list length is not a multiple of 3",
                    });
                }
                outlines
                    .iter()
                    .try_for_each(|ring| check_positions(kind, ring, 3))
            }
            PrimitiveShape::Outline { rings } => {
                if rings.is_empty() {
                    return Err(SceneError::Degenerate {
                        kind,
                        reason: "outline has no rings",
                    });
                }
                rings
                    .iter()
                    .try_for_each(|ring| check_positions(kind, ring, 3))
            }
            PrimitiveShape::Line { positions, width } => {
                check_positions(kind, positions, 2)?;
                if !(width.is_finite() && *width > 0.0) {
                    return Err(SceneError::Degenerate {
                        kind,
                        reason: "line width must be positive",
                    });
                }
                Ok(())
            }
            PrimitiveShape::Ellipsoid { center, radii, .. } => {
                check_position(kind, *center)?;
                if !(radii.is_finite() && radii.x > 0.0 && radii.y > 0.0 && radii.z > 0.0) {
                    return Err(SceneError::Degenerate {
                        kind,
                        reason: "ellipsoid radii must be positive",
                    });
                }
                Ok(())
            }
        }
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
