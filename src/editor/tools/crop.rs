use super::ToolError;
use crate::geometry::{Color, CropTrim, ImageBounds, Point, Rect, RectChange};
use crate::surface::{CompositeMode, Surface};
use crate::transform::Transform;

const CROP_FILL: Color = Color::new(255, 255, 255, 0.12);
const CROP_OUTLINE: Color = Color::new(255, 255, 255, 0.85);

/// A committed crop: the trims after and before it was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropRecord {
    pub new: CropTrim,
    pub previous: CropTrim,
}

impl CropRecord {
    /// Builds a record from a change against `previous`, rejecting any change
    /// that would leave no visible pixels.
    pub fn from_change(
        previous: CropTrim,
        change: RectChange,
        image: ImageBounds,
    ) -> Result<Self, ToolError> {
        let new = previous.apply_change(change, image)?;
        Ok(Self { new, previous })
    }
}

/// Tracks the rectangle the user drags out, in screen space.
#[derive(Debug, Clone, Default)]
pub struct CropTool {
    anchor: Option<Point>,
    corner: Option<Point>,
}

impl CropTool {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pointer_down(&mut self, screen: Point) {
        self.anchor = Some(screen);
        self.corner = Some(screen);
    }

    pub fn pointer_move(&mut self, screen: Point) {
        if self.anchor.is_some() {
            self.corner = Some(screen);
        }
    }

    /// Ends the drag and returns the dragged rectangle, if it has area.
    pub fn pointer_up(&mut self) -> Option<Rect> {
        let rect = self.rect();
        self.reset();
        rect.filter(|rect| !rect.is_empty())
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    pub fn rect(&self) -> Option<Rect> {
        Some(Rect::from_corners(self.anchor?, self.corner?))
    }

    pub fn reset(&mut self) {
        self.anchor = None;
        self.corner = None;
    }

    /// Renders the interactive rectangle as a translucent outline.
    pub fn draw(&self, display: &mut Surface) {
        let Some(rect) = self.rect().filter(|rect| !rect.is_empty()) else {
            return;
        };
        display.fill_rect(rect, CROP_FILL, 1.0, CompositeMode::PaintOver);
        display.stroke_rect(rect, CROP_OUTLINE, 1.0);
    }
}

/// Converts a screen-space crop rectangle into a change of the cumulative
/// trims. The rectangle is clamped to the currently visible region and its
/// edges are snapped to whole pixels.
pub fn crop_change(
    screen_rect: Rect,
    transform: &Transform,
    image: ImageBounds,
    current: CropTrim,
) -> Result<RectChange, ToolError> {
    let visible = current.visible_rect(image)?.to_rect();
    let world = transform.screen_rect_to_world(screen_rect);

    let left = world.x.clamp(visible.x, visible.right()).round();
    let right = world.right().clamp(visible.x, visible.right()).round();
    let top = world.y.clamp(visible.y, visible.bottom()).round();
    let bottom = world.bottom().clamp(visible.y, visible.bottom()).round();
    if right <= left || bottom <= top {
        return Err(ToolError::InvalidCropGeometry);
    }

    let next = CropTrim {
        x: left as u32,
        y: top as u32,
        w: image.width - (right - left) as u32,
        h: image.height - (bottom - top) as u32,
    };
    Ok(current.change_to(next))
}
