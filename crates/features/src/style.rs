use serde::{Deserialize, Serialize};

use foundation::color::Color;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fill {
    pub color: Color,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub color: Color,
    /// Pixels; `None` uses the renderer default.
    #[serde(default)]
    pub width: Option<f32>,
    /// Canvas-style dash array (on, off, on, off, ...).
    #[serde(default)]
    pub line_dash: Vec<f32>,
}

impl Stroke {
    pub fn new(color: Color, width: f32) -> Self {
        Self {
            color,
            width: Some(width),
            line_dash: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TextStyle {
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub font: Option<String>,
    #[serde(default)]
    pub fill: Option<Fill>,
    #[serde(default)]
    pub stroke: Option<Stroke>,
    #[serde(default)]
    pub text_align: Option<String>,
    #[serde(default)]
    pub text_baseline: Option<String>,
    #[serde(default)]
    pub offset_x: f64,
    #[serde(default)]
    pub offset_y: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IconStyle {
    pub src: String,
    #[serde(default = "default_scale")]
    pub scale: f32,
    /// Radians, clockwise.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub color: Option<Color>,
}

fn default_scale() -> f32 {
    1.0
}

/// Procedurally drawn marker: a regular polygon, star (`radius2`), or circle (`points == 0`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegularShape {
    #[serde(default)]
    pub points: u32,
    pub radius: f32,
    #[serde(default)]
    pub radius2: Option<f32>,
    /// Radians.
    #[serde(default)]
    pub angle: f32,
    #[serde(default)]
    pub fill: Option<Fill>,
    #[serde(default)]
    pub stroke: Option<Stroke>,
}

impl RegularShape {
    pub fn circle(radius: f32, fill: Option<Fill>, stroke: Option<Stroke>) -> Self {
        Self {
            points: 0,
            radius,
            radius2: None,
            angle: 0.0,
            fill,
            stroke,
        }
    }

    pub fn is_circle(&self) -> bool {
        self.points < 3
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ImageStyle {
    Icon(IconStyle),
    Shape(RegularShape),
}

/// Resolved, declarative style for one feature. The sync core only reads it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Style {
    #[serde(default)]
    pub fill: Option<Fill>,
    #[serde(default)]
    pub stroke: Option<Stroke>,
    #[serde(default)]
    pub text: Option<TextStyle>,
    #[serde(default)]
    pub image: Option<ImageStyle>,
}

impl Style {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fill(mut self, color: Color) -> Self {
        self.fill = Some(Fill { color });
        self
    }

    pub fn with_stroke(mut self, stroke: Stroke) -> Self {
        self.stroke = Some(stroke);
        self
    }

    pub fn with_text(mut self, text: TextStyle) -> Self {
        self.text = Some(text);
        self
    }

    pub fn with_image(mut self, image: ImageStyle) -> Self {
        self.image = Some(image);
        self
    }
}
