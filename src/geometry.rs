//! Shared geometric and color primitives used across editor modules.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A point in either screen or world space. Which one is implied by the call
/// site; conversions go through [`crate::transform::Transform`].
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn distance(self, other: Point) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl Rect {
    pub const fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Builds the rectangle spanned by two corners in any order.
    pub fn from_corners(a: Point, b: Point) -> Self {
        let left = a.x.min(b.x);
        let top = a.y.min(b.y);
        Self {
            x: left,
            y: top,
            w: a.x.max(b.x) - left,
            h: a.y.max(b.y) - top,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.h
    }

    pub fn is_empty(&self) -> bool {
        self.w <= 0.0 || self.h <= 0.0
    }
}

/// Deltas to the four cumulative crop trims. Never an absolute rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RectChange {
    pub dx: i32,
    pub dy: i32,
    pub dw: i32,
    pub dh: i32,
}

impl RectChange {
    pub const fn new(dx: i32, dy: i32, dw: i32, dh: i32) -> Self {
        Self { dx, dy, dw, dh }
    }

    pub const fn is_zero(&self) -> bool {
        self.dx == 0 && self.dy == 0 && self.dw == 0 && self.dh == 0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageBounds {
    pub width: u32,
    pub height: u32,
}

impl ImageBounds {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= 0 && y >= 0 && x < i64::from(self.width) && y < i64::from(self.height)
    }
}

/// Crop expressed as cumulative trims from the original image edges.
///
/// `x`/`y` are the left/top trims; `w`/`h` are the total horizontal and
/// vertical trims, so the visible size is `(img_w - w, img_h - h)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CropTrim {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

impl CropTrim {
    pub const NONE: CropTrim = CropTrim::new(0, 0, 0, 0);

    pub const fn new(x: u32, y: u32, w: u32, h: u32) -> Self {
        Self { x, y, w, h }
    }

    /// Applies `change` and checks the result still leaves a visible region.
    pub fn apply_change(
        self,
        change: RectChange,
        image: ImageBounds,
    ) -> Result<CropTrim, CropTrimError> {
        let shift = |value: u32, delta: i32| -> Result<u32, CropTrimError> {
            let shifted = i64::from(value) + i64::from(delta);
            u32::try_from(shifted).map_err(|_| CropTrimError::NegativeTrim)
        };
        let next = CropTrim {
            x: shift(self.x, change.dx)?,
            y: shift(self.y, change.dy)?,
            w: shift(self.w, change.dw)?,
            h: shift(self.h, change.dh)?,
        };
        next.visible_rect(image)?;
        Ok(next)
    }

    pub fn change_to(self, next: CropTrim) -> RectChange {
        let delta = |from: u32, to: u32| (i64::from(to) - i64::from(from)) as i32;
        RectChange {
            dx: delta(self.x, next.x),
            dy: delta(self.y, next.y),
            dw: delta(self.w, next.w),
            dh: delta(self.h, next.h),
        }
    }

    /// The visible rectangle `(x, y, img_w - w, img_h - h)` in world pixels.
    pub fn visible_rect(&self, image: ImageBounds) -> Result<VisibleRect, CropTrimError> {
        let width = image.width.saturating_sub(self.w);
        let height = image.height.saturating_sub(self.h);
        if width == 0 || height == 0 {
            return Err(CropTrimError::EmptyRegion);
        }
        // the left/top trim can never exceed the total trim on that axis
        if self.x > self.w || self.y > self.h {
            return Err(CropTrimError::OutOfBounds);
        }
        Ok(VisibleRect {
            x: self.x,
            y: self.y,
            width,
            height,
        })
    }
}

/// Pixel-aligned visible region of the image after cropping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VisibleRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl VisibleRect {
    pub fn to_rect(self) -> Rect {
        Rect::new(
            f64::from(self.x),
            f64::from(self.y),
            f64::from(self.width),
            f64::from(self.height),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum CropTrimError {
    #[error("crop would leave an empty visible region")]
    EmptyRegion,
    #[error("crop trim would extend past the original image edge")]
    NegativeTrim,
    #[error("crop offset falls outside the original image")]
    OutOfBounds,
}

/// 8-bit RGB color with a fractional alpha in `[0, 1]`.
///
/// Serializes as a CSS hex string so patches and event scripts can carry it
/// the same way the toolbar does.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid color string {0:?}")]
pub struct ColorParseError(pub String);

impl Color {
    pub const BLACK: Color = Color::rgb(0, 0, 0);
    pub const TRANSPARENT: Color = Color::new(0, 0, 0, 0.0);

    pub const fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn alpha_u8(&self) -> u8 {
        (self.a.clamp(0.0, 1.0) * 255.0).round() as u8
    }

    pub fn from_rgba8(pixel: [u8; 4]) -> Self {
        Self::new(pixel[0], pixel[1], pixel[2], f32::from(pixel[3]) / 255.0)
    }

    pub fn to_rgba8(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.alpha_u8()]
    }

    /// Formats as `#rrggbb`, or `#rrggbbaa` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let alpha = self.alpha_u8();
        if alpha == u8::MAX {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, alpha)
        }
    }

    pub fn from_hex(value: &str) -> Result<Self, ColorParseError> {
        let invalid = || ColorParseError(value.to_string());
        let digits = value.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !digits.is_ascii() || !matches!(digits.len(), 6 | 8) {
            return Err(invalid());
        }
        let channel = |index: usize| {
            u8::from_str_radix(&digits[index * 2..index * 2 + 2], 16).map_err(|_| invalid())
        };
        let alpha = if digits.len() == 8 { channel(3)? } else { u8::MAX };
        Ok(Self::new(
            channel(0)?,
            channel(1)?,
            channel(2)?,
            f32::from(alpha) / 255.0,
        ))
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl TryFrom<String> for Color {
    type Error = ColorParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_hex(&value)
    }
}

impl From<Color> for String {
    fn from(color: Color) -> Self {
        color.to_hex()
    }
}
