//!
//! A small software rasterizer standing in for a gpu renderer. Like a gpu read-back the
//! pixels come out bottom row first, `PixelBuffer::into_image` takes care of flipping them.
//!

use delaunay_mesh::geo::{BarycentricCoords, Bbox, Vec2};
use image::RgbImage;

use crate::color::{Color, Rgba};
use crate::error::{TrifadeError, TrifadeResult};
use crate::frame::{DrawPrimitive, Frame};

/// Point sizes are expressed in tenths of a pixel of diameter.
const POINT_SIZE_SCALE: f64 = 10.0;

/// Anything able to draw a `Frame` and hand back the result.
pub trait Renderer {
    fn draw(&mut self, frame: &Frame);

    fn read_pixels(&self) -> PixelBuffer;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    TopLeft,
    BottomLeft,
}

/// Tightly packed rgb8 pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub origin: Origin,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Convert to a top-left origin image.
    pub fn into_image(self) -> TrifadeResult<RgbImage> {
        let PixelBuffer {
            width,
            height,
            origin,
            data,
        } = self;

        let mut img = RgbImage::from_raw(width, height, data).ok_or_else(|| {
            TrifadeError::invalid_parameter(format!(
                "pixel buffer is too small for a {}x{} image",
                width, height
            ))
        })?;

        if origin == Origin::BottomLeft {
            image::imageops::flip_vertical_in_place(&mut img);
        }

        Ok(img)
    }
}

#[derive(Debug, Clone)]
pub struct SoftwareRenderer {
    width: u32,
    height: u32,
    pixels: Vec<Color>,
}

impl SoftwareRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        SoftwareRenderer {
            width,
            height,
            pixels: vec![Color::new(0.0, 0.0, 0.0); (width as usize) * (height as usize)],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Color of the pixel at column `x` and row `y`, counting rows from the bottom.
    pub fn pixel(&self, x: u32, y: u32) -> Option<Color> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.pixels[self.index_of(x, y)])
    }

    fn index_of(&self, x: u32, y: u32) -> usize {
        y as usize * self.width as usize + x as usize
    }

    fn clear(&mut self, color: Color) {
        for p in &mut self.pixels {
            *p = color;
        }
    }

    fn blend(&mut self, x: u32, y: u32, color: Rgba) {
        let ix = self.index_of(x, y);
        let dst = &mut self.pixels[ix];
        let a = color.a;

        dst.r = color.r * a + dst.r * (1.0 - a);
        dst.g = color.g * a + dst.g * (1.0 - a);
        dst.b = color.b * a + dst.b * (1.0 - a);
    }

    /// Calls `f` with the center of every pixel inside `bbox`, clipped to the canvas.
    fn scan(&mut self, bbox: Bbox, mut f: impl FnMut(Vec2) -> bool, color: Rgba) {
        if self.width == 0 || self.height == 0 {
            return;
        }

        let clip = |v: f64, max: u32| v.floor().max(0.0).min(f64::from(max - 1)) as u32;

        let (min, max) = (bbox.min(), bbox.max());
        if max.x < 0.0
            || max.y < 0.0
            || min.x > f64::from(self.width)
            || min.y > f64::from(self.height)
        {
            return;
        }

        for y in clip(min.y, self.height)..=clip(max.y, self.height) {
            for x in clip(min.x, self.width)..=clip(max.x, self.width) {
                let center = Vec2::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
                if f(center) {
                    self.blend(x, y, color);
                }
            }
        }
    }

    fn fill_triangle(&mut self, vertices: [Vec2; 3], color: Rgba) {
        if color.a <= 0.0 || !vertices.iter().all(Vec2::is_finite) {
            return;
        }

        let mut bbox = Bbox::new(vertices[0]);
        bbox.expand(vertices[1]);
        bbox.expand(vertices[2]);

        self.scan(
            bbox,
            |p| BarycentricCoords::triangle(vertices, p).is_some(),
            color,
        );
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f64, color: Rgba) {
        let dir = to - from;
        let len = dir.norm();
        if color.a <= 0.0 || width <= 0.0 || len < 1e-9 || !len.is_finite() {
            return;
        }

        let half = width.max(1.0) / 2.0;

        let pad = Vec2::new(half, half);
        let mut bbox = Bbox::new(from - pad);
        bbox.expand(from + pad);
        bbox.expand(to - pad);
        bbox.expand(to + pad);

        let unit = dir / len;
        self.scan(
            bbox,
            |p| {
                let rel = p - from;
                let along = rel.dot(unit);
                along >= 0.0 && along <= len && rel.cross(unit).abs() <= half
            },
            color,
        );
    }

    fn draw_marker(&mut self, center: Vec2, size: f64, color: Rgba) {
        if !center.is_finite() {
            return;
        }

        let radius = (size / POINT_SIZE_SCALE).max(1.0) / 2.0;
        let mut bbox = Bbox::new(center - Vec2::new(radius, radius));
        bbox.expand(center + Vec2::new(radius, radius));

        self.scan(bbox, |p| p.dist2(center) <= radius * radius, color);
    }
}

impl Renderer for SoftwareRenderer {
    fn draw(&mut self, frame: &Frame) {
        if frame.width != self.width || frame.height != self.height {
            *self = SoftwareRenderer::new(frame.width, frame.height);
        }

        self.clear(frame.background);

        for primitive in &frame.primitives {
            match *primitive {
                DrawPrimitive::Fill { vertices, color } => self.fill_triangle(vertices, color),
                DrawPrimitive::Line {
                    from,
                    to,
                    width,
                    color,
                } => self.stroke_line(from, to, width, color),
                DrawPrimitive::Marker {
                    center,
                    size,
                    color,
                } => self.draw_marker(center, size, color),
            }
        }
    }

    fn read_pixels(&self) -> PixelBuffer {
        let data = self.pixels.iter().flat_map(|c| c.to_rgb8().to_vec()).collect();

        PixelBuffer {
            width: self.width,
            height: self.height,
            origin: Origin::BottomLeft,
            data,
        }
    }
}
