//! Pure translations from 2-D style attributes to primitive attributes.

use features::{Fill, Stroke, TextStyle};
use foundation::color::Color;
use scene::{HorizontalOrigin, LabelStyle, VerticalOrigin};

/// Canvas default line width.
pub const DEFAULT_LINE_WIDTH: f32 = 1.0;

/// Stroke color used when a line-like geometry has no stroke style (#3399CC).
pub const DEFAULT_STROKE_COLOR: Color = Color::new(0.2, 0.6, 0.8, 1.0);

/// `textAlign` → horizontal origin.
pub const TEXT_ALIGN: [(&str, HorizontalOrigin); 3] = [
    ("center", HorizontalOrigin::Center),
    ("left", HorizontalOrigin::Left),
    ("right", HorizontalOrigin::Right),
];

/// `textBaseline` → vertical origin.
pub const TEXT_BASELINE: [(&str, VerticalOrigin); 5] = [
    ("top", VerticalOrigin::Top),
    ("middle", VerticalOrigin::Center),
    ("bottom", VerticalOrigin::Bottom),
    ("alphabetic", VerticalOrigin::Top),
    ("hanging", VerticalOrigin::Bottom),
];

pub fn horizontal_origin(text_align: &str) -> Option<HorizontalOrigin> {
    TEXT_ALIGN
        .iter()
        .find(|(name, _)| *name == text_align)
        .map(|(_, origin)| *origin)
}

pub fn vertical_origin(text_baseline: &str) -> Option<VerticalOrigin> {
    TEXT_BASELINE
        .iter()
        .find(|(name, _)| *name == text_baseline)
        .map(|(_, origin)| *origin)
}

pub fn fill_color(fill: Option<&Fill>, opacity: f32) -> Option<Color> {
    fill.map(|f| f.color.with_opacity(opacity))
}

pub fn stroke_color(stroke: Option<&Stroke>, opacity: f32) -> Option<Color> {
    stroke.map(|s| s.color.with_opacity(opacity))
}

/// Stroke color, falling back to the default stroke.
pub fn line_color(stroke: Option<&Stroke>, opacity: f32) -> Color {
    stroke_color(stroke, opacity).unwrap_or(DEFAULT_STROKE_COLOR.with_opacity(opacity))
}

pub fn line_width(stroke: Option<&Stroke>) -> f32 {
    stroke
        .and_then(|s| s.width)
        .filter(|w| w.is_finite())
        .unwrap_or(DEFAULT_LINE_WIDTH)
        .max(DEFAULT_LINE_WIDTH)
}

/// Converts a canvas dash array into a 16-bit repeating mask, MSB first.
///
/// Each bit covers one pixel; the dash period repeats across the mask.
///
/// Returns `None` for a solid line (no dash, zero-length pattern, or all bits on).
pub fn dash_pattern(line_dash: &[f32]) -> Option<u16> {
    let mut dash: Vec<f32> = line_dash
        .iter()
        .map(|d| if d.is_finite() { d.max(0.0) } else { 0.0 })
        .collect();
    if dash.is_empty() {
        return None;
    }
    // Canvas repeats odd-length dash arrays to make them even.
    if dash.len() % 2 == 1 {
        dash.extend_from_within(..);
    }
    let total: f32 = dash.iter().sum();
    if total <= 0.0 {
        return None;
    }

    let mut pattern = 0u16;
    for bit in 0..16u32 {
        let pos = (bit as f32 + 0.5) % total;
        let mut acc = 0.0;
        let mut on = true;
        for (i, d) in dash.iter().enumerate() {
            acc += d;
            if pos < acc {
                on = i % 2 == 0;
                break;
            }
        }
        if on {
            pattern |= 1 << (15 - bit);
        }
    }

    (pattern != u16::MAX).then_some(pattern)
}

/// Which label style the text's fill/stroke combination calls for.
pub fn label_style(text: &TextStyle) -> Option<LabelStyle> {
    match (text.fill.is_some(), text.stroke.is_some()) {
        (true, true) => Some(LabelStyle::FillAndOutline),
        (true, false) => Some(LabelStyle::Fill),
        (false, true) => Some(LabelStyle::Outline),
        (false, false) => None,
    }
}
