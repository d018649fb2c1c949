//! RGBA raster surfaces and the compositing primitives the tools paint with.

mod raster;
mod stack;

pub use raster::{smoothed_path, CoverageMask};
pub use stack::SurfaceStack;

use image::{Rgba, RgbaImage};
use serde::{Deserialize, Serialize};

use crate::geometry::{Color, ImageBounds, Rect};
use crate::transform::Transform;

/// How painted pixels combine with what is already on the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositeMode {
    /// Source-over: paint on top of existing pixels.
    #[default]
    PaintOver,
    /// Destination-out: reduce existing alpha, never change color.
    CutHole,
}

impl CompositeMode {
    pub const fn from_eraser(eraser: bool) -> Self {
        if eraser {
            Self::CutHole
        } else {
            Self::PaintOver
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Surface {
    pixels: RgbaImage,
}

impl Surface {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: RgbaImage::new(width, height),
        }
    }

    pub fn from_image(pixels: RgbaImage) -> Self {
        Self { pixels }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width()
    }

    pub fn height(&self) -> u32 {
        self.pixels.height()
    }

    pub fn bounds(&self) -> ImageBounds {
        ImageBounds::new(self.width(), self.height())
    }

    pub fn as_image(&self) -> &RgbaImage {
        &self.pixels
    }

    pub fn pixel(&self, x: i64, y: i64) -> Option<Rgba<u8>> {
        if !self.bounds().contains(x, y) {
            return None;
        }
        Some(*self.pixels.get_pixel(x as u32, y as u32))
    }

    pub fn clear(&mut self) {
        self.pixels.fill(0);
    }

    /// Reallocates to a new size; contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        if self.width() == width && self.height() == height {
            self.clear();
            return;
        }
        self.pixels = RgbaImage::new(width, height);
    }

    /// Replaces the contents with `source` placed at the origin.
    pub fn copy_from(&mut self, source: &Surface) {
        if source.pixels.dimensions() == self.pixels.dimensions() {
            self.pixels.copy_from_slice(source.pixels.as_raw());
            return;
        }
        self.clear();
        image::imageops::replace(&mut self.pixels, &source.pixels, 0, 0);
    }

    /// Blends `color` at `opacity * coverage` into one pixel.
    pub fn blend_pixel(
        &mut self,
        x: u32,
        y: u32,
        color: Color,
        opacity: f32,
        coverage: f32,
        mode: CompositeMode,
    ) {
        let source_alpha = color.a.clamp(0.0, 1.0) * opacity.clamp(0.0, 1.0) * coverage;
        if source_alpha <= 0.0 {
            return;
        }
        let target = self.pixels.get_pixel_mut(x, y);
        *target = composite_pixel(*target, [color.r, color.g, color.b], source_alpha, mode);
    }

    /// Fills every pixel whose center lies inside `rect`.
    pub fn fill_rect(&mut self, rect: Rect, color: Color, opacity: f32, mode: CompositeMode) {
        let Some((left, top, right, bottom)) = self.pixel_span(rect) else {
            return;
        };
        for y in top..bottom {
            for x in left..right {
                self.blend_pixel(x, y, color, opacity, 1.0, mode);
            }
        }
    }

    /// Paints `color` through a coverage mask of the same size.
    pub fn paint_mask(
        &mut self,
        mask: &CoverageMask,
        color: Color,
        opacity: f32,
        mode: CompositeMode,
    ) {
        for (x, y, coverage) in mask.covered() {
            if x < self.width() && y < self.height() {
                self.blend_pixel(x, y, color, opacity, coverage, mode);
            }
        }
    }

    /// Composites `source` onto this surface at `transform`, sampling the
    /// nearest source pixel for every destination pixel.
    pub fn draw_transformed(
        &mut self,
        source: &Surface,
        transform: &Transform,
        mode: CompositeMode,
    ) {
        let (width, height) = self.pixels.dimensions();
        for y in 0..height {
            for x in 0..width {
                let world = transform.screen_to_world(crate::geometry::Point::new(
                    f64::from(x) + 0.5,
                    f64::from(y) + 0.5,
                ));
                let Some(sample) = source.pixel(world.x.floor() as i64, world.y.floor() as i64)
                else {
                    continue;
                };
                if sample[3] == 0 {
                    continue;
                }
                let target = self.pixels.get_pixel_mut(x, y);
                let alpha = f32::from(sample[3]) / 255.0;
                *target = composite_pixel(*target, [sample[0], sample[1], sample[2]], alpha, mode);
            }
        }
    }

    /// Makes every pixel whose center lies outside `keep` transparent.
    pub fn clear_outside(&mut self, keep: Rect) {
        for (x, y, pixel) in self.pixels.enumerate_pixels_mut() {
            let cx = f64::from(x) + 0.5;
            let cy = f64::from(y) + 0.5;
            if cx < keep.x || cx >= keep.right() || cy < keep.y || cy >= keep.bottom() {
                *pixel = Rgba([0, 0, 0, 0]);
            }
        }
    }

    /// Strokes a rectangle border `thickness` pixels wide, inside `rect`.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color, thickness: f64) {
        if rect.is_empty() {
            return;
        }
        let t = thickness.max(1.0).min(rect.w / 2.0).min(rect.h / 2.0).max(0.5);
        let edges = [
            Rect::new(rect.x, rect.y, rect.w, t),
            Rect::new(rect.x, rect.bottom() - t, rect.w, t),
            Rect::new(rect.x, rect.y + t, t, rect.h - 2.0 * t),
            Rect::new(rect.right() - t, rect.y + t, t, rect.h - 2.0 * t),
        ];
        for edge in edges {
            self.fill_rect(edge, color, 1.0, CompositeMode::PaintOver);
        }
    }

    fn pixel_span(&self, rect: Rect) -> Option<(u32, u32, u32, u32)> {
        if rect.is_empty() {
            return None;
        }
        let clamp_x = |v: f64| (v - 0.5).ceil().clamp(0.0, f64::from(self.width())) as u32;
        let clamp_y = |v: f64| (v - 0.5).ceil().clamp(0.0, f64::from(self.height())) as u32;
        let left = clamp_x(rect.x);
        let right = clamp_x(rect.right());
        let top = clamp_y(rect.y);
        let bottom = clamp_y(rect.bottom());
        (left < right && top < bottom).then_some((left, top, right, bottom))
    }
}

/// Straight-alpha source-over / destination-out for one pixel.
pub(crate) fn composite_pixel(
    target: Rgba<u8>,
    source_rgb: [u8; 3],
    source_alpha: f32,
    mode: CompositeMode,
) -> Rgba<u8> {
    let source_alpha = source_alpha.clamp(0.0, 1.0);
    let target_alpha = f32::from(target[3]) / 255.0;
    match mode {
        CompositeMode::PaintOver => {
            if source_alpha >= 1.0 {
                return Rgba([source_rgb[0], source_rgb[1], source_rgb[2], 255]);
            }
            let out_alpha = source_alpha + target_alpha * (1.0 - source_alpha);
            if out_alpha <= 0.0 {
                return Rgba([0, 0, 0, 0]);
            }
            let channel = |index: usize| {
                let source = f32::from(source_rgb[index]) * source_alpha;
                let target = f32::from(target[index]) * target_alpha * (1.0 - source_alpha);
                ((source + target) / out_alpha).round().clamp(0.0, 255.0) as u8
            };
            Rgba([
                channel(0),
                channel(1),
                channel(2),
                to_u8_alpha(out_alpha),
            ])
        }
        CompositeMode::CutHole => {
            let out_alpha = to_u8_alpha(target_alpha * (1.0 - source_alpha));
            if out_alpha == 0 {
                return Rgba([0, 0, 0, 0]);
            }
            Rgba([target[0], target[1], target[2], out_alpha])
        }
    }
}

fn to_u8_alpha(alpha: f32) -> u8 {
    (alpha * 255.0).round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, pixel: [u8; 4]) -> Surface {
        Surface::from_image(RgbaImage::from_pixel(width, height, Rgba(pixel)))
    }

    #[test]
    fn paint_over_with_full_alpha_replaces_color() {
        let mut surface = solid(4, 4, [10, 20, 30, 255]);
        surface.fill_rect(
            Rect::new(1.0, 1.0, 1.0, 1.0),
            Color::rgb(200, 100, 0),
            1.0,
            CompositeMode::PaintOver,
        );
        assert_eq!(surface.pixel(1, 1), Some(Rgba([200, 100, 0, 255])));
        assert_eq!(surface.pixel(0, 0), Some(Rgba([10, 20, 30, 255])));
        assert_eq!(surface.pixel(2, 1), Some(Rgba([10, 20, 30, 255])));
    }

    #[test]
    fn paint_over_half_opacity_mixes_channels() {
        let mut surface = solid(1, 1, [0, 0, 0, 255]);
        surface.blend_pixel(0, 0, Color::rgb(255, 255, 255), 0.5, 1.0, CompositeMode::PaintOver);
        let pixel = surface.pixel(0, 0).expect("in bounds");
        assert_eq!(pixel[3], 255);
        assert!((127..=128).contains(&pixel[0]));
    }

    #[test]
    fn cut_hole_reduces_alpha_without_touching_color() {
        let mut surface = solid(2, 1, [90, 80, 70, 255]);
        surface.blend_pixel(0, 0, Color::rgb(255, 0, 0), 0.5, 1.0, CompositeMode::CutHole);
        surface.blend_pixel(1, 0, Color::rgb(255, 0, 0), 1.0, 1.0, CompositeMode::CutHole);
        assert_eq!(surface.pixel(0, 0), Some(Rgba([90, 80, 70, 128])));
        assert_eq!(surface.pixel(1, 0), Some(Rgba([0, 0, 0, 0])));
    }

    #[test]
    fn clear_outside_keeps_only_pixels_with_centers_inside() {
        let mut surface = solid(6, 6, [1, 2, 3, 255]);
        surface.clear_outside(Rect::new(2.0, 1.0, 2.0, 3.0));
        let kept = surface
            .as_image()
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel[3] != 0)
            .map(|(x, y, _)| (x, y))
            .collect::<Vec<_>>();
        assert_eq!(kept, vec![(2, 1), (3, 1), (2, 2), (3, 2), (2, 3), (3, 3)]);
    }

    #[test]
    fn draw_transformed_at_identity_copies_pixels() {
        let mut source = Surface::new(3, 3);
        source.fill_rect(
            Rect::new(0.0, 0.0, 3.0, 3.0),
            Color::rgb(5, 6, 7),
            1.0,
            CompositeMode::PaintOver,
        );
        let mut target = Surface::new(3, 3);
        target.draw_transformed(&source, &Transform::default(), CompositeMode::PaintOver);
        assert_eq!(target, source);
    }

    #[test]
    fn stroke_rect_leaves_interior_untouched() {
        let mut surface = Surface::new(8, 8);
        surface.stroke_rect(Rect::new(1.0, 1.0, 6.0, 6.0), Color::rgb(255, 0, 0), 1.0);
        assert_eq!(surface.pixel(1, 1).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(6, 6).map(|p| p[3]), Some(255));
        assert_eq!(surface.pixel(3, 3).map(|p| p[3]), Some(0));
        assert_eq!(surface.pixel(0, 0).map(|p| p[3]), Some(0));
    }
}
