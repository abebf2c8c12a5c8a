//! CPU raster target
//!
//! Shapes are drawn by sampling their signed distance at each pixel center
//! inside the shape's bounding box, which gives one pixel of anti-aliasing
//! for free.

use glam::Vec2;
use image::{Rgba, RgbaImage};

use crate::sim::{coverage, sd_capsule, sd_circle};

/// Linear RGBA color, components in 0..=1
pub type Color = [f32; 4];

pub struct Canvas {
    image: RgbaImage,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width, height),
        }
    }

    /// Start from an existing image (e.g. a pre-rendered background)
    pub fn from_image(image: RgbaImage) -> Self {
        Self { image }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn clear(&mut self, color: Color) {
        let px = to_rgba8(color);
        for p in self.image.pixels_mut() {
            *p = px;
        }
    }

    /// Replace the contents with `other`, reusing the allocation
    pub fn copy_from(&mut self, other: &RgbaImage) {
        if self.image.dimensions() == other.dimensions() {
            self.image.copy_from_slice(other.as_raw());
        } else {
            self.image = other.clone();
        }
    }

    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Color) {
        let reach = Vec2::splat(radius + 1.0);
        self.fill(center - reach, center + reach, color, |p| {
            sd_circle(p, center, radius)
        });
    }

    /// Segment with round caps, `thickness` being the capsule radius
    pub fn draw_segment(&mut self, a: Vec2, b: Vec2, thickness: f32, color: Color) {
        let reach = Vec2::splat(thickness + 1.0);
        self.fill(a.min(b) - reach, a.max(b) + reach, color, |p| {
            sd_capsule(p, a, b, thickness)
        });
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Copy of the current contents
    pub fn snapshot(&self) -> RgbaImage {
        self.image.clone()
    }

    fn fill(&mut self, min: Vec2, max: Vec2, color: Color, sdf: impl Fn(Vec2) -> f32) {
        let (w, h) = (self.image.width() as i64, self.image.height() as i64);
        let x0 = (min.x.floor() as i64).clamp(0, w);
        let y0 = (min.y.floor() as i64).clamp(0, h);
        let x1 = (max.x.ceil() as i64).clamp(0, w);
        let y1 = (max.y.ceil() as i64).clamp(0, h);

        for y in y0..y1 {
            for x in x0..x1 {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let alpha = coverage(sdf(p)) * color[3];
                if alpha > 0.0 {
                    let dst = self.image.get_pixel_mut(x as u32, y as u32);
                    *dst = blend(*dst, color, alpha);
                }
            }
        }
    }
}

fn to_rgba8(color: Color) -> Rgba<u8> {
    Rgba(color.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8))
}

/// Source-over blend of `color` at `alpha` onto `dst`
fn blend(dst: Rgba<u8>, color: Color, alpha: f32) -> Rgba<u8> {
    let mut out = dst;
    for i in 0..3 {
        let d = dst.0[i] as f32 / 255.0;
        let c = color[i].clamp(0.0, 1.0) * alpha + d * (1.0 - alpha);
        out.0[i] = (c * 255.0).round() as u8;
    }
    let da = dst.0[3] as f32 / 255.0;
    out.0[3] = ((alpha + da * (1.0 - alpha)) * 255.0).round() as u8;
    out
}
