// Raster surface for the Keyframe artboard.
// Pixels are always opaque: strokes and pasted images are composited onto it.

use egui::{Color32, ColorImage};
use image::{Rgba, RgbaImage};
use keyframe_core::Dimensions;
use tracing::{debug, info, trace, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color32>,
}

/// Where a pasted image lands on the canvas, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Fit `image` inside `surface` without distortion, centered on both axes.
///
/// A surface wider than the image (by aspect) gets the full height and a
/// proportional width; otherwise the full width and a proportional height.
/// The image therefore touches the surface edge on at least one axis.
pub fn letterbox(image: Dimensions, surface: Dimensions) -> Placement {
    if image == surface {
        return Placement {
            x: 0,
            y: 0,
            width: surface.width,
            height: surface.height,
        };
    }

    let (width, height) = if surface.aspect_ratio() > image.aspect_ratio() {
        let scaled = f64::from(image.width) * f64::from(surface.height) / f64::from(image.height);
        (scaled.round() as u32, surface.height)
    } else {
        let scaled = f64::from(image.height) * f64::from(surface.width) / f64::from(image.width);
        (surface.width, scaled.round() as u32)
    };
    let width = width.clamp(1, surface.width);
    let height = height.clamp(1, surface.height);

    Placement {
        x: (surface.width - width) / 2,
        y: (surface.height - height) / 2,
        width,
        height,
    }
}

impl Canvas {
    pub fn new(width: u32, height: u32, background: Color32) -> Self {
        info!(
            "Creating new canvas of size {}x{} with background color {:?}",
            width, height, background
        );

        let total_pixels = width as usize * height as usize;
        let pixels = vec![background; total_pixels];
        trace!("Canvas created");

        Self {
            width,
            height,
            pixels,
        }
    }

    fn is_valid_coordinate(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    fn coord_to_index(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    pub fn get_pixel(&self, x: u32, y: u32) -> Option<Color32> {
        if !self.is_valid_coordinate(x, y) {
            return None;
        }
        Some(self.pixels[self.coord_to_index(x, y)])
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, color: Color32) -> bool {
        if !self.is_valid_coordinate(x, y) {
            warn!(
                "Attempted to set pixel color at invalid coordinates ({}, {})",
                x, y
            );
            return false;
        }

        let index = self.coord_to_index(x, y);
        self.pixels[index] = color;
        true
    }

    /// Source-over blend of a premultiplied color onto the pixel at (x, y).
    /// Out-of-bounds coordinates are ignored.
    pub fn blend_pixel(&mut self, x: u32, y: u32, color: Color32) {
        if !self.is_valid_coordinate(x, y) {
            return;
        }
        let index = self.coord_to_index(x, y);
        self.pixels[index] = blend_premultiplied(color, self.pixels[index]);
    }

    pub fn fill(&mut self, color: Color32) {
        debug!("Filling canvas {:?}", color);
        self.pixels.fill(color);
    }

    pub fn clear(&mut self) {
        debug!("Clearing canvas");
        self.fill(Color32::WHITE);
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Clear to white and paste `image` letterboxed and centered.
    ///
    /// Images of exactly the canvas size are copied without resampling, so
    /// exporting and re-importing a canvas is pixel-exact.
    pub fn paste_letterboxed(&mut self, image: &RgbaImage) -> Placement {
        let source = Dimensions::new(image.width(), image.height());
        let placement = letterbox(source, self.dimensions());
        info!(
            source = %source,
            x = placement.x,
            y = placement.y,
            width = placement.width,
            height = placement.height,
            "pasting image onto canvas"
        );

        self.clear();

        let resized;
        let scaled = if placement.width == image.width() && placement.height == image.height() {
            image
        } else {
            resized = image::imageops::resize(
                image,
                placement.width,
                placement.height,
                image::imageops::FilterType::Triangle,
            );
            &resized
        };

        for (x, y, pixel) in scaled.enumerate_pixels() {
            let index = self.coord_to_index(placement.x + x, placement.y + y);
            self.pixels[index] = over_white(*pixel);
        }

        placement
    }

    /// Straight-alpha RGBA copy of the surface.
    pub fn to_rgba_image(&self) -> RgbaImage {
        let mut image = RgbaImage::new(self.width, self.height);
        for (pixel, color) in image.pixels_mut().zip(&self.pixels) {
            *pixel = Rgba(color.to_srgba_unmultiplied());
        }
        image
    }

    /// Surface as an egui image for live preview.
    pub fn to_color_image(&self) -> ColorImage {
        let rgba = self.to_rgba_image();
        ColorImage::from_rgba_unmultiplied([self.width as usize, self.height as usize], rgba.as_raw())
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Canvas::new(512, 512, Color32::WHITE)
    }
}

fn blend_premultiplied(src: Color32, dst: Color32) -> Color32 {
    let a = u32::from(src.a());
    if a == 255 {
        return src;
    }
    let inv = 255 - a;
    let channel = |s: u8, d: u8| -> u8 {
        (u32::from(s) + (u32::from(d) * inv + 127) / 255).min(255) as u8
    };
    Color32::from_rgb(
        channel(src.r(), dst.r()),
        channel(src.g(), dst.g()),
        channel(src.b(), dst.b()),
    )
}

// Straight alpha over an opaque white backdrop.
fn over_white(pixel: Rgba<u8>) -> Color32 {
    let [r, g, b, a] = pixel.0;
    if a == 255 {
        return Color32::from_rgb(r, g, b);
    }
    let a = u32::from(a);
    let channel = |c: u8| -> u8 { ((u32::from(c) * a + 255 * (255 - a) + 127) / 255) as u8 };
    Color32::from_rgb(channel(r), channel(g), channel(b))
}
