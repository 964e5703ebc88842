//! JSON scenario format: a layer configuration plus a sequence of feature
//! snapshots, one per reconciliation pass.

use std::collections::BTreeMap;
use std::path::Path;

use features::{AltitudeMode, Coordinate, Ellipse, Geometry, GeometryShape, Layout, Projection, Style};
use layers::LayerConfig;
use scene::SceneView;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("read {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("parse scenario: {0}")]
    Json(#[from] serde_json::Error),
    #[error("feature {feature}: {reason}")]
    Geometry { feature: u64, reason: String },
    #[error("pass {pass}: {source}")]
    Index {
        pass: usize,
        source: layers::IndexViolation,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    #[serde(default)]
    pub projection: Projection,
    #[serde(default)]
    pub layer: LayerConfig,
    #[serde(default)]
    pub view: ViewDto,
    /// Image sources the fake loader resolves, with their pixel size.
    #[serde(default)]
    pub images: BTreeMap<String, [u32; 2]>,
    pub passes: Vec<Pass>,
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let text = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ScenarioError> {
        Ok(serde_json::from_str(text)?)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewDto {
    pub camera_height_m: f64,
    pub terrain_enabled: bool,
}

impl Default for ViewDto {
    fn default() -> Self {
        let view = SceneView::default();
        Self {
            camera_height_m: view.camera_height_m,
            terrain_enabled: view.terrain_enabled,
        }
    }
}

impl From<ViewDto> for SceneView {
    fn from(v: ViewDto) -> Self {
        SceneView {
            camera_height_m: v.camera_height_m,
            terrain_enabled: v.terrain_enabled,
        }
    }
}

/// The complete feature set of the layer at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pass {
    /// Current time for track display.
    #[serde(default)]
    pub time: Option<f64>,
    #[serde(default)]
    pub view: Option<ViewDto>,
    pub features: Vec<FeatureDto>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureDto {
    pub id: u64,
    pub geometries: Vec<GeometryDto>,
    #[serde(default)]
    pub style: Style,
    #[serde(default = "default_shown")]
    pub shown: bool,
    #[serde(default)]
    pub dynamic: bool,
    #[serde(default)]
    pub altitude_mode: Option<AltitudeMode>,
}

fn default_shown() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GeometryDto {
    Point {
        coordinates: Vec<f64>,
    },
    LineString {
        coordinates: Vec<Vec<f64>>,
    },
    Polygon {
        rings: Vec<Vec<Vec<f64>>>,
    },
    Ellipse {
        center: Vec<f64>,
        semi_major_m: f64,
        semi_minor_m: f64,
        #[serde(default)]
        orientation_deg: f64,
    },
    Track {
        coordinates: Vec<Vec<f64>>,
        times: Vec<f64>,
    },
}

fn coordinate(values: &[f64]) -> Result<Coordinate, String> {
    match values {
        [x, y] => Ok(Coordinate::xy(*x, *y)),
        [x, y, z] => Ok(Coordinate::xyz(*x, *y, *z)),
        other => Err(format!("coordinate needs 2 or 3 values, got {}", other.len())),
    }
}

fn coordinates(values: &[Vec<f64>]) -> Result<Vec<Coordinate>, String> {
    values.iter().map(|v| coordinate(v)).collect()
}

fn layout_of<'a>(values: impl IntoIterator<Item = &'a Vec<f64>>) -> Layout {
    if values.into_iter().any(|v| v.len() == 3) {
        Layout::XYZ
    } else {
        Layout::XY
    }
}

impl GeometryDto {
    /// Converts to a shape plus its coordinate layout.
    pub fn to_shape(&self, feature: u64) -> Result<(GeometryShape, Layout), ScenarioError> {
        let fail = |reason: String| ScenarioError::Geometry { feature, reason };
        match self {
            GeometryDto::Point { coordinates: c } => Ok((
                GeometryShape::Point(coordinate(c).map_err(fail)?),
                layout_of([c]),
            )),
            GeometryDto::LineString { coordinates: c } => Ok((
                GeometryShape::LineString(coordinates(c).map_err(fail)?),
                layout_of(c),
            )),
            GeometryDto::Polygon { rings } => {
                let shape = rings
                    .iter()
                    .map(|r| coordinates(r))
                    .collect::<Result<Vec<_>, _>>()
                    .map_err(fail)?;
                Ok((GeometryShape::Polygon(shape), layout_of(rings.iter().flatten())))
            }
            GeometryDto::Ellipse {
                center,
                semi_major_m,
                semi_minor_m,
                orientation_deg,
            } => {
                let c = coordinate(center).map_err(fail)?;
                let layout = if c.z != 0.0 { Layout::XYZ } else { Layout::XY };
                Ok((
                    GeometryShape::Ellipse(Ellipse::new(
                        c,
                        *semi_major_m,
                        *semi_minor_m,
                        *orientation_deg,
                    )),
                    layout,
                ))
            }
            GeometryDto::Track { coordinates: c, times } => {
                if c.len() != times.len() {
                    return Err(fail(format!(
                        "track has {} coordinates but {} times",
                        c.len(),
                        times.len()
                    )));
                }
                Ok((
                    GeometryShape::Track {
                        coords: coordinates(c).map_err(fail)?,
                        times: times.clone(),
                    },
                    layout_of(c),
                ))
            }
        }
    }

    pub fn to_geometry(&self, feature: u64) -> Result<Geometry, ScenarioError> {
        let (shape, layout) = self.to_shape(feature)?;
        Ok(match shape {
            GeometryShape::Point(c) => Geometry::point(c, layout),
            GeometryShape::LineString(c) => Geometry::line_string(c, layout),
            GeometryShape::Polygon(rings) => Geometry::polygon(rings, layout),
            GeometryShape::Ellipse(e) => Geometry::ellipse(e),
            GeometryShape::Track { coords, times } => Geometry::track(coords, times, layout),
        })
    }
}
