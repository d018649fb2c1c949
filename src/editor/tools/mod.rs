mod crop;
mod pencil;
mod spray;
mod timer;

pub use crop::{crop_change, CropRecord, CropTool};
pub use pencil::{DrawingRecord, PencilTool};
pub use spray::{SplatRecord, SprayTool, DEFAULT_SPRAY_INTERVAL};
pub use timer::{RepeatingTimer, MAX_CATCH_UP};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::geometry::{Color, CropTrimError, Point};
use crate::surface::{CompositeMode, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    Pencil,
    Spray,
    Crop,
    Pan,
    ColorPicker,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ToolError {
    #[error("crop rectangle does not overlap the visible image")]
    InvalidCropGeometry,
    #[error("no image is loaded")]
    NoImage,
    #[error(transparent)]
    CropTrim(#[from] CropTrimError),
}

pub const MIN_LINE_WIDTH: f64 = 1.0;
pub const MAX_LINE_WIDTH: f64 = 256.0;

/// Style a finished record carries so replay never depends on live settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeStyle {
    pub width: f64,
    pub opacity: f32,
    pub composite: CompositeMode,
    pub color: Color,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeOptions {
    pub color: Color,
    pub opacity: f32,
    pub width: f64,
    pub eraser: bool,
}

impl Default for StrokeOptions {
    fn default() -> Self {
        Self {
            color: Color::BLACK,
            opacity: 1.0,
            width: 4.0,
            eraser: false,
        }
    }
}

impl StrokeOptions {
    pub fn set_color(&mut self, color: Color) {
        self.color = color;
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.opacity = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            1.0
        };
    }

    pub fn set_width(&mut self, width: f64) {
        self.width = if width.is_finite() {
            width.clamp(MIN_LINE_WIDTH, MAX_LINE_WIDTH)
        } else {
            MIN_LINE_WIDTH
        };
    }

    pub fn set_eraser(&mut self, eraser: bool) {
        self.eraser = eraser;
    }

    pub fn composite(&self) -> CompositeMode {
        CompositeMode::from_eraser(self.eraser)
    }

    pub fn style(&self) -> StrokeStyle {
        StrokeStyle {
            width: self.width,
            opacity: self.opacity,
            composite: self.composite(),
            color: self.color,
        }
    }
}

/// Pointer-driven tool that paints onto the live surface and yields an
/// immutable record when the drag ends.
pub trait StrokeTool {
    type Record;

    fn options(&self) -> &StrokeOptions;
    fn options_mut(&mut self) -> &mut StrokeOptions;

    fn pointer_down(&mut self, world: Point, live: &mut Surface);
    fn pointer_move(&mut self, world: Point, live: &mut Surface);
    /// Ends the drag. Returns `None` for a drag that produced nothing.
    fn pointer_up(&mut self, live: &mut Surface) -> Option<Self::Record>;
    fn is_dragging(&self) -> bool;
    /// Drops any in-progress stroke without emitting a record.
    fn reset(&mut self);

    /// Repaints `record` onto `target` using the record's own style.
    fn draw_from_history(&self, record: &Self::Record, target: &mut Surface);

    fn composite_mode(&self) -> CompositeMode {
        self.options().composite()
    }

    fn set_opacity(&mut self, opacity: f32) {
        self.options_mut().set_opacity(opacity);
    }

    fn set_line_width(&mut self, width: f64) {
        self.options_mut().set_width(width);
    }

    fn set_eraser(&mut self, eraser: bool) {
        self.options_mut().set_eraser(eraser);
    }

    fn set_color(&mut self, color: Color) {
        self.options_mut().set_color(color);
    }
}

/// All tool instances of one editor.
#[derive(Debug)]
pub struct EditorTools {
    pub pencil: PencilTool,
    pub spray: SprayTool,
    pub crop: CropTool,
}

impl Default for EditorTools {
    fn default() -> Self {
        Self::new(StrokeOptions::default(), DEFAULT_SPRAY_INTERVAL)
    }
}

impl EditorTools {
    pub fn new(options: StrokeOptions, spray_interval: std::time::Duration) -> Self {
        Self {
            pencil: PencilTool::new(options),
            spray: SprayTool::new(options, spray_interval),
            crop: CropTool::new(),
        }
    }

    pub fn reset_all(&mut self) {
        self.pencil.reset();
        self.spray.reset();
        self.crop.reset();
    }

    pub fn composite_mode(&self, tool: ToolKind) -> CompositeMode {
        match tool {
            ToolKind::Pencil => self.pencil.composite_mode(),
            ToolKind::Spray => self.spray.composite_mode(),
            ToolKind::Crop | ToolKind::Pan | ToolKind::ColorPicker => CompositeMode::PaintOver,
        }
    }

    pub fn is_stroke_in_progress(&self) -> bool {
        self.pencil.is_dragging() || self.spray.is_dragging()
    }

    pub fn set_shared_color(&mut self, color: Color) {
        self.pencil.set_color(color);
        self.spray.set_color(color);
    }

    pub fn set_shared_opacity(&mut self, opacity: f32) {
        self.pencil.set_opacity(opacity);
        self.spray.set_opacity(opacity);
    }

    pub fn set_shared_line_width(&mut self, width: f64) {
        self.pencil.set_line_width(width);
        self.spray.set_line_width(width);
    }

    pub fn set_shared_eraser(&mut self, eraser: bool) {
        self.pencil.set_eraser(eraser);
        self.spray.set_eraser(eraser);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stroke_options_clamp_out_of_range_values() {
        let mut options = StrokeOptions::default();
        options.set_opacity(3.0);
        assert_eq!(options.opacity, 1.0);
        options.set_opacity(-1.0);
        assert_eq!(options.opacity, 0.0);
        options.set_opacity(f32::NAN);
        assert_eq!(options.opacity, 1.0);

        options.set_width(0.0);
        assert_eq!(options.width, MIN_LINE_WIDTH);
        options.set_width(10_000.0);
        assert_eq!(options.width, MAX_LINE_WIDTH);
    }

    #[test]
    fn eraser_switches_composite_mode() {
        let mut options = StrokeOptions::default();
        assert_eq!(options.composite(), CompositeMode::PaintOver);
        options.set_eraser(true);
        assert_eq!(options.style().composite, CompositeMode::CutHole);
    }

    #[test]
    fn shared_style_updates_both_stroke_tools() {
        let mut tools = EditorTools::default();
        tools.set_shared_color(Color::rgb(12, 34, 56));
        tools.set_shared_line_width(9.0);
        tools.set_shared_opacity(0.25);
        tools.set_shared_eraser(true);

        for options in [tools.pencil.options(), tools.spray.options()] {
            assert_eq!(options.color, Color::rgb(12, 34, 56));
            assert_eq!(options.width, 9.0);
            assert_eq!(options.opacity, 0.25);
            assert!(options.eraser);
        }
        assert_eq!(tools.composite_mode(ToolKind::Pencil), CompositeMode::CutHole);
        assert_eq!(tools.composite_mode(ToolKind::Crop), CompositeMode::PaintOver);
    }
}
