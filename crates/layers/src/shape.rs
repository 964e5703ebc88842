//! Offscreen rasterization of procedural point markers.
//!
//! The fill is drawn as opaque white and recolored by the fill tint before the
//! stroke is composited over it, so fill alpha applies exactly once and the
//! stroke keeps its own color.

use std::f32::consts::{FRAC_PI_2, TAU};
use std::hash::{DefaultHasher, Hash, Hasher};

use features::RegularShape;
use foundation::color::Color;
use scene::image::Raster;
use tracing::debug;

use crate::style::DEFAULT_LINE_WIDTH;

/// Substitute fill drawn into the raster.
pub const RASTER_FILL: Color = Color::WHITE;

const CIRCLE_SEGMENTS: usize = 64;
const SUPERSAMPLE: u32 = 4;
/// Largest canvas edge drawn; bigger shapes are scaled down to fit.
pub const MAX_CANVAS_SIZE: f32 = 1024.0;

/// Canvas geometry derived from a shape.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderOptions {
    pub stroke_color: Option<Color>,
    pub stroke_width: f32,
    /// Outer radius actually drawn.
    pub radius: f32,
    /// Scale applied to the shape's radii to fit `MAX_CANVAS_SIZE`.
    pub scale: f32,
    /// Canvas edge length before rounding up: `2 * (radius + stroke_width) + 1`.
    pub size: f32,
}

pub fn render_options(shape: &RegularShape) -> RenderOptions {
    let finite = |v: f32| if v.is_finite() { v.max(0.0) } else { 0.0 };
    let mut stroke_width = match &shape.stroke {
        Some(s) => finite(s.width.unwrap_or(DEFAULT_LINE_WIDTH)),
        None => 0.0,
    };
    let mut radius = finite(shape.radius);
    let mut scale = 1.0;

    let size = 2.0 * (radius + stroke_width) + 1.0;
    if size > MAX_CANVAS_SIZE {
        scale = (MAX_CANVAS_SIZE - 1.0) / (size - 1.0);
        radius *= scale;
        stroke_width *= scale;
        debug!("shape of canvas size {size} scaled by {scale}");
    }
    RenderOptions {
        stroke_color: shape.stroke.as_ref().map(|s| s.color),
        stroke_width,
        radius,
        scale,
        size: (2.0 * (radius + stroke_width) + 1.0).min(MAX_CANVAS_SIZE),
    }
}

/// Identifies the drawing inputs of `shape`; equal keys draw equal rasters.
pub fn shape_key(shape: &RegularShape) -> u64 {
    let mut h = DefaultHasher::new();
    shape.points.hash(&mut h);
    shape.radius.to_bits().hash(&mut h);
    shape.radius2.map(f32::to_bits).hash(&mut h);
    shape.angle.to_bits().hash(&mut h);
    shape.fill.as_ref().map(|f| f.color.to_rgba8()).hash(&mut h);
    if let Some(stroke) = &shape.stroke {
        stroke.color.to_rgba8().hash(&mut h);
        stroke.width.unwrap_or(DEFAULT_LINE_WIDTH).to_bits().hash(&mut h);
    }
    h.finish()
}

/// Draws the shape into a fresh raster of side `ceil(size)`, with the fill
/// color as the tint of the white fill.
pub fn draw_shape(shape: &RegularShape) -> Raster {
    let tint = shape.fill.as_ref().map_or(Color::WHITE, |f| f.color);
    draw_tinted(shape, tint)
}

/// Draws the shape with its fill drawn as `RASTER_FILL` multiplied by `tint`.
fn draw_tinted(shape: &RegularShape, tint: Color) -> Raster {
    let opts = render_options(shape);
    let side = opts.size.ceil().clamp(1.0, MAX_CANVAS_SIZE) as u32;
    let mut raster = Raster::new(side, side);
    let center = opts.size / 2.0;
    let outline = outline_vertices(shape, &opts, center);
    let fill = Color::new(
        RASTER_FILL.r * tint.r,
        RASTER_FILL.g * tint.g,
        RASTER_FILL.b * tint.b,
        RASTER_FILL.a * tint.a,
    );
    let half_stroke = opts.stroke_width / 2.0;

    let samples = (SUPERSAMPLE * SUPERSAMPLE) as f32;
    for y in 0..side {
        for x in 0..side {
            let mut fill_hits = 0u32;
            let mut stroke_hits = 0u32;
            for sy in 0..SUPERSAMPLE {
                for sx in 0..SUPERSAMPLE {
                    let px = x as f32 + (sx as f32 + 0.5) / SUPERSAMPLE as f32;
                    let py = y as f32 + (sy as f32 + 0.5) / SUPERSAMPLE as f32;
                    if shape.fill.is_some() && contains(&outline, px, py) {
                        fill_hits += 1;
                    }
                    if opts.stroke_color.is_some()
                        && edge_distance(&outline, px, py) <= half_stroke
                    {
                        stroke_hits += 1;
                    }
                }
            }

            let mut out = [0.0f32; 4];
            if fill_hits > 0 {
                out = over(out, fill, fill_hits as f32 / samples);
            }
            if let Some(stroke) = opts.stroke_color
                && stroke_hits > 0
            {
                out = over(out, stroke, stroke_hits as f32 / samples);
            }
            if out[3] > 0.0 {
                raster.put(x, y, to_rgba8(out));
            }
        }
    }
    raster
}

fn outline_vertices(shape: &RegularShape, opts: &RenderOptions, center: f32) -> Vec<(f32, f32)> {
    let at = |radius: f32, theta: f32| (center + radius * theta.cos(), center + radius * theta.sin());
    let outer = opts.radius;
    if shape.is_circle() {
        return (0..CIRCLE_SEGMENTS)
            .map(|i| at(outer, i as f32 / CIRCLE_SEGMENTS as f32 * TAU))
            .collect();
    }

    let points = shape.points as usize;
    let start = shape.angle - FRAC_PI_2;
    let inner = shape
        .radius2
        .filter(|r2| r2.is_finite() && *r2 != shape.radius)
        .map(|r2| (r2 * opts.scale).max(0.0));
    match inner {
        Some(inner) => (0..points * 2)
            .map(|i| {
                let radius = if i % 2 == 0 { outer } else { inner };
                at(radius, start + i as f32 * TAU / (points * 2) as f32)
            })
            .collect(),
        None => (0..points)
            .map(|i| at(outer, start + i as f32 * TAU / points as f32))
            .collect(),
    }
}

/// Even-odd point-in-polygon test.
fn contains(ring: &[(f32, f32)], x: f32, y: f32) -> bool {
    let mut inside = false;
    let mut j = ring.len().wrapping_sub(1);
    for (i, &(xi, yi)) in ring.iter().enumerate() {
        let (xj, yj) = ring[j];
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

fn edge_distance(ring: &[(f32, f32)], x: f32, y: f32) -> f32 {
    let mut best = f32::INFINITY;
    for i in 0..ring.len() {
        let (ax, ay) = ring[i];
        let (bx, by) = ring[(i + 1) % ring.len()];
        let (dx, dy) = (bx - ax, by - ay);
        let len2 = dx * dx + dy * dy;
        let t = if len2 > 0.0 {
            (((x - ax) * dx + (y - ay) * dy) / len2).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let (cx, cy) = (ax + t * dx - x, ay + t * dy - y);
        best = best.min((cx * cx + cy * cy).sqrt());
    }
    best
}

/// Source-over compositing in straight alpha.
fn over(dst: [f32; 4], src: Color, coverage: f32) -> [f32; 4] {
    let sa = src.a * coverage;
    let da = dst[3];
    let out_a = sa + da * (1.0 - sa);
    if out_a <= 0.0 {
        return [0.0; 4];
    }
    let mix = |s: f32, d: f32| (s * sa + d * da * (1.0 - sa)) / out_a;
    [
        mix(src.r, dst[0]),
        mix(src.g, dst[1]),
        mix(src.b, dst[2]),
        out_a,
    ]
}

fn to_rgba8(c: [f32; 4]) -> [u8; 4] {
    Color::new(c[0], c[1], c[2], c[3]).to_rgba8()
}

#[cfg(test)]
mod tests {
    use super::*;
    use features::{Fill, Stroke};

    fn square() -> RegularShape {
        RegularShape {
            points: 4,
            radius: 10.0,
            radius2: None,
            angle: std::f32::consts::FRAC_PI_4,
            fill: Some(Fill {
                color: Color::new(1.0, 0.0, 0.0, 0.5),
            }),
            stroke: Some(Stroke::new(Color::new(0.0, 0.0, 1.0, 1.0), 2.0)),
        }
    }

    #[test]
    fn canvas_size_includes_stroke() {
        let opts = render_options(&square());
        assert_eq!(opts.size, 25.0);
        assert_eq!(opts.stroke_width, 2.0);

        let raster = draw_shape(&square());
        assert_eq!((raster.width, raster.height), (25, 25));

        let frac = RegularShape::circle(2.3, None, None);
        assert_eq!(draw_shape(&frac).width, 6);
    }

    #[test]
    fn thin_strokes_keep_their_width() {
        let half = RegularShape::circle(5.0, None, Some(Stroke::new(Color::BLACK, 0.5)));
        assert_eq!(render_options(&half).size, 12.0);
        assert_eq!(draw_shape(&half).width, 12);

        let zero = RegularShape::circle(5.0, None, Some(Stroke::new(Color::BLACK, 0.0)));
        assert_eq!(render_options(&zero).size, 11.0);
        assert_eq!(draw_shape(&zero).width, 11);

        let mut unset = RegularShape::circle(5.0, None, Some(Stroke::new(Color::BLACK, 0.0)));
        if let Some(stroke) = unset.stroke.as_mut() {
            stroke.width = None;
        }
        assert_eq!(render_options(&unset).stroke_width, DEFAULT_LINE_WIDTH);
    }

    #[test]
    fn oversized_shapes_are_scaled_to_fit() {
        let huge = RegularShape::circle(1.0e5, Some(Fill { color: Color::WHITE }), None);
        let opts = render_options(&huge);
        assert!(opts.size <= MAX_CANVAS_SIZE);
        assert!(opts.scale < 1.0);

        let wide = render_options(&RegularShape::circle(
            f32::INFINITY,
            None,
            Some(Stroke::new(Color::BLACK, 1.0e6)),
        ));
        assert_eq!(wide.radius, 0.0);
        assert!(wide.size <= MAX_CANVAS_SIZE);
    }

    #[test]
    fn capture_draws_opaque_white_fill() {
        let raster = draw_tinted(&square(), Color::WHITE);
        assert_eq!(raster.get(12, 12), Some([255, 255, 255, 255]));
        assert_eq!(raster.get(0, 0), Some([0, 0, 0, 0]));
    }

    #[test]
    fn tint_recolors_fill_but_not_stroke() {
        let shape = square();
        let raster = draw_shape(&shape);
        // Fill alpha is applied once.
        assert_eq!(raster.get(12, 12), Some([255, 0, 0, 128]));
        // Axis-aligned square with half-diagonal 10: left edge at x = 12.5 - 7.07.
        let edge = raster.get(5, 12).unwrap();
        assert!(edge[2] > 200 && edge[0] < 60, "{edge:?}");
    }

    #[test]
    fn circle_without_fill_is_hollow() {
        let shape = RegularShape::circle(8.0, None, Some(Stroke::new(Color::BLACK, 2.0)));
        let raster = draw_shape(&shape);
        let c = raster.width / 2;
        assert_eq!(raster.get(c, c), Some([0, 0, 0, 0]));
        assert!(raster.pixels.iter().any(|p| p[3] == 255));
    }

    #[test]
    fn shape_key_tracks_drawing_inputs() {
        let a = square();
        let mut b = square();
        assert_eq!(shape_key(&a), shape_key(&b));
        b.fill = Some(Fill {
            color: Color::BLACK,
        });
        assert_ne!(shape_key(&a), shape_key(&b));
        b = square();
        b.radius = 11.0;
        assert_ne!(shape_key(&a), shape_key(&b));
    }
}
