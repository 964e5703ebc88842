use serde::{Deserialize, Serialize};

use foundation::ids::{FeatureId, GeometryId};

use crate::geometry::Geometry;
use crate::style::Style;

/// How primitive altitudes relate to terrain.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AltitudeMode {
    #[default]
    Absolute,
    ClampToGround,
    RelativeToGround,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Feature {
    id: FeatureId,
    geometries: Vec<Geometry>,
    style: Style,
    style_revision: u64,
    pub shown: bool,
    /// Frequently edited geometry (drawn with in-place updatable primitives).
    pub dynamic: bool,
    pub altitude_mode: Option<AltitudeMode>,
}

impl Feature {
    pub fn new(id: FeatureId, geometry: Geometry) -> Self {
        Self::with_geometries(id, vec![geometry])
    }

    pub fn with_geometries(id: FeatureId, geometries: Vec<Geometry>) -> Self {
        Self {
            id,
            geometries,
            style: Style::default(),
            style_revision: 0,
            shown: true,
            dynamic: false,
            altitude_mode: None,
        }
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn geometries(&self) -> &[Geometry] {
        &self.geometries
    }

    pub fn geometry(&self, id: GeometryId) -> Option<&Geometry> {
        self.geometries.iter().find(|g| g.id() == id)
    }

    pub fn geometry_mut(&mut self, id: GeometryId) -> Option<&mut Geometry> {
        self.geometries.iter_mut().find(|g| g.id() == id)
    }

    pub fn push_geometry(&mut self, geometry: Geometry) {
        self.geometries.push(geometry);
    }

    pub fn remove_geometry(&mut self, id: GeometryId) -> Option<Geometry> {
        let pos = self.geometries.iter().position(|g| g.id() == id)?;
        Some(self.geometries.remove(pos))
    }

    pub fn style(&self) -> &Style {
        &self.style
    }

    pub fn style_revision(&self) -> u64 {
        self.style_revision
    }

    pub fn set_style(&mut self, style: Style) {
        self.style = style;
        self.style_revision += 1;
    }

    /// Edits the style in place and bumps the style revision.
    pub fn update_style(&mut self, edit: impl FnOnce(&mut Style)) {
        edit(&mut self.style);
        self.style_revision += 1;
    }
}
