//! Screen ↔ world coordinate conversion for the pan/zoom view.
//!
//! World coordinates are pixels of the loaded image. Screen coordinates are
//! pixels of the display surface. The mapping is
//! `world = screen * scale + offset`, where `offset` is in world units and
//! `scale` is world pixels per screen pixel, derived from a discrete zoom step.

use crate::geometry::{Point, Rect};

/// Each zoom step multiplies the on-screen magnification by this factor.
pub const ZOOM_BASE: f64 = 1.25;
pub const MIN_ZOOM_STEP: i32 = -12;
pub const MAX_ZOOM_STEP: i32 = 24;
// scale_of stays finite and non-zero well past these bounds
const HARD_ZOOM_STEP_LIMIT: i32 = 64;

/// World pixels per screen pixel at `step`. Larger steps zoom in.
pub fn scale_of(step: i32) -> f64 {
    ZOOM_BASE.powi(-step)
}

/// Inverse of [`scale_of`], rounded to the nearest step.
pub fn step_of(scale: f64) -> i32 {
    if !scale.is_finite() || scale <= 0.0 {
        return 0;
    }
    (-(scale.ln() / ZOOM_BASE.ln())).round() as i32
}

/// Inclusive zoom step range. Bounds are clamped to a range where the scale
/// is always finite and non-zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoomLimits {
    min_step: i32,
    max_step: i32,
}

impl Default for ZoomLimits {
    fn default() -> Self {
        Self {
            min_step: MIN_ZOOM_STEP,
            max_step: MAX_ZOOM_STEP,
        }
    }
}

impl ZoomLimits {
    pub fn new(min_step: i32, max_step: i32) -> Self {
        let min_step = min_step.clamp(-HARD_ZOOM_STEP_LIMIT, 0);
        let max_step = max_step.clamp(0, HARD_ZOOM_STEP_LIMIT);
        Self { min_step, max_step }
    }

    pub const fn min_step(&self) -> i32 {
        self.min_step
    }

    pub const fn max_step(&self) -> i32 {
        self.max_step
    }

    pub fn clamp(&self, step: i32) -> i32 {
        step.clamp(self.min_step, self.max_step)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    offset: Point,
    step: i32,
    limits: ZoomLimits,
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Point::default(), 0, ZoomLimits::default())
    }
}

impl Transform {
    pub fn new(offset: Point, step: i32, limits: ZoomLimits) -> Self {
        Self {
            offset,
            step: limits.clamp(step),
            limits,
        }
    }

    pub const fn offset(&self) -> Point {
        self.offset
    }

    pub const fn step(&self) -> i32 {
        self.step
    }

    pub fn scale(&self) -> f64 {
        scale_of(self.step)
    }

    pub fn screen_to_world(&self, screen: Point) -> Point {
        let scale = self.scale();
        Point::new(
            screen.x * scale + self.offset.x,
            screen.y * scale + self.offset.y,
        )
    }

    pub fn world_to_screen(&self, world: Point) -> Point {
        let scale = self.scale();
        Point::new(
            (world.x - self.offset.x) / scale,
            (world.y - self.offset.y) / scale,
        )
    }

    pub fn world_rect_to_screen(&self, rect: Rect) -> Rect {
        let top_left = self.world_to_screen(Point::new(rect.x, rect.y));
        let bottom_right = self.world_to_screen(Point::new(rect.right(), rect.bottom()));
        Rect::from_corners(top_left, bottom_right)
    }

    pub fn screen_rect_to_world(&self, rect: Rect) -> Rect {
        let top_left = self.screen_to_world(Point::new(rect.x, rect.y));
        let bottom_right = self.screen_to_world(Point::new(rect.right(), rect.bottom()));
        Rect::from_corners(top_left, bottom_right)
    }

    /// Zooms by `delta` steps keeping the world point under `mouse` fixed.
    /// Returns `false` when the step was already at the limit.
    pub fn zoom_at(&mut self, mouse: Point, delta: i32) -> bool {
        let next_step = self.limits.clamp(self.step.saturating_add(delta));
        if next_step == self.step {
            return false;
        }
        let old_scale = self.scale();
        let new_scale = scale_of(next_step);
        self.offset.x += mouse.x * old_scale - mouse.x * new_scale;
        self.offset.y += mouse.y * old_scale - mouse.y * new_scale;
        self.step = next_step;
        true
    }

    /// Pans by a screen-space drag delta so the image follows the pointer.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx == 0.0 && dy == 0.0 {
            return;
        }
        let scale = self.scale();
        self.offset.x -= dx * scale;
        self.offset.y -= dy * scale;
    }
}
