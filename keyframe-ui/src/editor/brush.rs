// Freehand brush for the artboard: settings, presets and stroke rasterization.

use crate::Canvas;
use egui::Color32;
use kurbo::{ParamCurve, Point, QuadBez, Rect};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Colors offered by the host's swatch row.
pub const PALETTE: [Color32; 8] = [
    Color32::BLACK,
    Color32::WHITE,
    Color32::from_rgb(0xEF, 0x44, 0x44),
    Color32::from_rgb(0xF9, 0x73, 0x16),
    Color32::from_rgb(0xEA, 0xB3, 0x08),
    Color32::from_rgb(0x22, 0xC5, 0x5E),
    Color32::from_rgb(0x3B, 0x82, 0xF6),
    Color32::from_rgb(0xA8, 0x55, 0xF7),
];

/// Stroke width presets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BrushSize {
    Small,
    #[default]
    Medium,
    Large,
}

impl BrushSize {
    pub fn width(self) -> f32 {
        match self {
            BrushSize::Small => 3.0,
            BrushSize::Medium => 8.0,
            BrushSize::Large => 16.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BrushSettings {
    pub color: Color32,
    pub width: f32,
    pub smoothing: bool,
}

impl Default for BrushSettings {
    fn default() -> Self {
        Self {
            color: Color32::BLACK,
            width: BrushSize::default().width(),
            smoothing: true,
        }
    }
}

impl BrushSettings {
    fn radius(&self) -> f64 {
        (f64::from(self.width) / 2.0).max(0.5)
    }
}

/// One pen-down..pen-up drag. The brush is captured at the start so changing
/// settings mid-drag only affects the next stroke.
#[derive(Debug, Clone)]
pub struct Stroke {
    brush: BrushSettings,
    last: Point,
    // End of the last smoothed curve; the next curve starts here.
    curve_end: Point,
    segments: usize,
}

impl Stroke {
    pub fn begin(brush: BrushSettings, at: Point) -> Self {
        trace!(x = at.x, y = at.y, "stroke begin");
        Self {
            brush,
            last: at,
            curve_end: at,
            segments: 0,
        }
    }

    pub fn segments(&self) -> usize {
        self.segments
    }

    /// Render the segment ending at `to` onto the canvas.
    ///
    /// With smoothing, the segment is the quadratic curve from the previous
    /// curve end, controlled by the last pen position, to the midpoint of the
    /// last position and `to`. Without smoothing it is a straight line.
    pub fn extend(&mut self, canvas: &mut Canvas, to: Point) {
        let radius = self.brush.radius();
        if self.brush.smoothing {
            let mid = self.last.midpoint(to);
            let curve = QuadBez::new(self.curve_end, self.last, mid);
            paint_polyline(canvas, &flatten(curve), radius, self.brush.color);
            self.curve_end = mid;
        } else {
            paint_polyline(canvas, &[self.last, to], radius, self.brush.color);
        }
        self.last = to;
        self.segments += 1;
        trace!(x = to.x, y = to.y, segments = self.segments, "stroke extend");
    }
}

fn flatten(curve: QuadBez) -> Vec<Point> {
    let control_len = (curve.p1 - curve.p0).hypot() + (curve.p2 - curve.p1).hypot();
    let steps = (control_len / 2.0).ceil().clamp(1.0, 64.0) as usize;
    (0..=steps)
        .map(|i| curve.eval(i as f64 / steps as f64))
        .collect()
}

/// Paint every pixel whose center lies within `radius` of the polyline.
/// Round caps and joins fall out of the distance test; each pixel is blended
/// at most once per call.
fn paint_polyline(canvas: &mut Canvas, points: &[Point], radius: f64, color: Color32) {
    let Some(first) = points.first() else {
        return;
    };
    let bounds = points
        .iter()
        .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
        .inflate(radius, radius);

    let x0 = bounds.x0.floor().max(0.0) as u32;
    let y0 = bounds.y0.floor().max(0.0) as u32;
    let x1 = (bounds.x1.ceil().max(0.0) as u32).min(canvas.width());
    let y1 = (bounds.y1.ceil().max(0.0) as u32).min(canvas.height());
    let radius_sq = radius * radius;

    for y in y0..y1 {
        for x in x0..x1 {
            let center = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let hit = if points.len() == 1 {
                (center - points[0]).hypot2() <= radius_sq
            } else {
                points
                    .windows(2)
                    .any(|w| distance_sq_to_segment(center, w[0], w[1]) <= radius_sq)
            };
            if hit {
                canvas.blend_pixel(x, y, color);
            }
        }
    }
}

fn distance_sq_to_segment(p: Point, a: Point, b: Point) -> f64 {
    let ab = b - a;
    let len_sq = ab.hypot2();
    if len_sq == 0.0 {
        return (p - a).hypot2();
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    (p - (a + ab * t)).hypot2()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn brush(width: f32, smoothing: bool) -> BrushSettings {
        BrushSettings {
            color: Color32::BLACK,
            width,
            smoothing,
        }
    }

    #[test]
    fn straight_segment_covers_its_path() {
        let mut canvas = Canvas::new(20, 20, Color32::WHITE);
        let mut stroke = Stroke::begin(brush(3.0, false), Point::new(2.0, 10.0));
        stroke.extend(&mut canvas, Point::new(18.0, 10.0));

        for x in 2..18 {
            assert_eq!(canvas.get_pixel(x, 9), Some(Color32::BLACK), "x={x}");
        }
        assert_eq!(canvas.get_pixel(10, 2), Some(Color32::WHITE));
    }

    #[test]
    fn round_cap_does_not_fill_square_corners() {
        let mut canvas = Canvas::new(30, 30, Color32::WHITE);
        let mut stroke = Stroke::begin(brush(16.0, false), Point::new(15.0, 15.0));
        stroke.extend(&mut canvas, Point::new(15.0, 15.0));

        assert_eq!(canvas.get_pixel(15, 15), Some(Color32::BLACK));
        // Corner of the 16px bounding square is outside the 8px radius.
        assert_eq!(canvas.get_pixel(7, 7), Some(Color32::WHITE));
    }

    #[test]
    fn first_smoothed_segment_stops_at_midpoint() {
        let mut canvas = Canvas::new(40, 40, Color32::WHITE);
        let mut stroke = Stroke::begin(brush(2.0, true), Point::new(0.0, 20.0));
        stroke.extend(&mut canvas, Point::new(40.0, 20.0));

        assert_eq!(canvas.get_pixel(10, 19), Some(Color32::BLACK));
        assert_eq!(canvas.get_pixel(30, 19), Some(Color32::WHITE));
    }

    #[test]
    fn segments_off_canvas_are_clipped() {
        let mut canvas = Canvas::new(10, 10, Color32::WHITE);
        let mut stroke = Stroke::begin(brush(4.0, false), Point::new(-20.0, -20.0));
        stroke.extend(&mut canvas, Point::new(30.0, 30.0));
        assert_eq!(canvas.get_pixel(5, 5), Some(Color32::BLACK));
        assert_eq!(stroke.segments(), 1);
    }

    #[test]
    fn palette_swatches_are_opaque() {
        assert_eq!(PALETTE[0], Color32::BLACK);
        assert!(PALETTE.iter().all(|c| c.a() == 255));
    }

    #[test]
    fn size_presets_grow() {
        assert!(BrushSize::Small.width() < BrushSize::Medium.width());
        assert!(BrushSize::Medium.width() < BrushSize::Large.width());
    }
}
