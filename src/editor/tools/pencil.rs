use super::{StrokeOptions, StrokeStyle, StrokeTool};
use crate::geometry::Point;
use crate::surface::{smoothed_path, CompositeMode, CoverageMask, Surface};

/// A finished freehand stroke: the raw pointer samples in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawingRecord {
    points: Vec<Point>,
    style: StrokeStyle,
}

impl DrawingRecord {
    pub fn new(points: Vec<Point>, style: StrokeStyle) -> Self {
        Self { points, style }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    pub fn style(&self) -> StrokeStyle {
        self.style
    }
}

#[derive(Debug, Clone)]
pub struct PencilTool {
    options: StrokeOptions,
    points: Vec<Point>,
    dragging: bool,
}

impl PencilTool {
    pub fn new(options: StrokeOptions) -> Self {
        Self {
            options,
            points: Vec::new(),
            dragging: false,
        }
    }

    pub fn points(&self) -> &[Point] {
        &self.points
    }

    fn repaint_live(&self, live: &mut Surface) {
        live.clear();
        let mut style = self.options.style();
        // the live surface always holds paint; the display applies the mode
        style.composite = CompositeMode::PaintOver;
        paint_stroke(&self.points, style, live);
    }
}

impl StrokeTool for PencilTool {
    type Record = DrawingRecord;

    fn options(&self) -> &StrokeOptions {
        &self.options
    }

    fn options_mut(&mut self) -> &mut StrokeOptions {
        &mut self.options
    }

    fn pointer_down(&mut self, world: Point, live: &mut Surface) {
        self.points.clear();
        self.points.push(world);
        self.dragging = true;
        live.clear();
    }

    fn pointer_move(&mut self, world: Point, live: &mut Surface) {
        if !self.dragging {
            return;
        }
        self.points.push(world);
        self.repaint_live(live);
    }

    fn pointer_up(&mut self, live: &mut Surface) -> Option<DrawingRecord> {
        if !self.dragging {
            return None;
        }
        self.dragging = false;
        live.clear();
        let points = std::mem::take(&mut self.points);
        if points.len() < 2 {
            tracing::debug!(samples = points.len(), "discarding pencil tap");
            return None;
        }
        Some(DrawingRecord::new(points, self.options.style()))
    }

    fn is_dragging(&self) -> bool {
        self.dragging
    }

    fn reset(&mut self) {
        self.points.clear();
        self.dragging = false;
    }

    fn draw_from_history(&self, record: &DrawingRecord, target: &mut Surface) {
        paint_stroke(&record.points, record.style, target);
    }
}

fn paint_stroke(points: &[Point], style: StrokeStyle, target: &mut Surface) {
    if points.is_empty() {
        return;
    }
    let mut mask = CoverageMask::new(target.width(), target.height());
    mask.stroke_polyline(&smoothed_path(points), style.width);
    target.paint_mask(&mask, style.color, style.opacity, style.composite);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Color;
    use image::{Rgba, RgbaImage};

    fn pencil() -> PencilTool {
        let mut options = StrokeOptions::default();
        options.set_color(Color::rgb(200, 10, 10));
        options.set_width(3.0);
        PencilTool::new(options)
    }

    #[test]
    fn drag_records_raw_samples_and_sticky_style() {
        let mut tool = pencil();
        let mut live = Surface::new(50, 50);
        tool.pointer_down(Point::new(5.0, 5.0), &mut live);
        tool.pointer_move(Point::new(10.0, 12.0), &mut live);
        tool.pointer_move(Point::new(20.0, 18.0), &mut live);
        assert!(live.as_image().pixels().any(|pixel| pixel[3] > 0));

        let record = tool.pointer_up(&mut live).expect("drag emits a record");
        assert_eq!(
            record.points(),
            &[
                Point::new(5.0, 5.0),
                Point::new(10.0, 12.0),
                Point::new(20.0, 18.0)
            ]
        );
        assert_eq!(record.style().color, Color::rgb(200, 10, 10));
        assert_eq!(record.style().width, 3.0);
        assert!(tool.points().is_empty());
        assert!(!tool.is_dragging());
        assert!(live.as_image().pixels().all(|pixel| pixel[3] == 0));
    }

    #[test]
    fn tap_without_drag_produces_nothing() {
        let mut tool = pencil();
        let mut live = Surface::new(10, 10);
        tool.pointer_down(Point::new(5.0, 5.0), &mut live);
        assert!(tool.pointer_up(&mut live).is_none());
        assert!(tool.points().is_empty());
    }

    #[test]
    fn history_replay_uses_record_style_not_live_settings() {
        let mut tool = pencil();
        let mut live = Surface::new(30, 30);
        tool.pointer_down(Point::new(2.0, 15.0), &mut live);
        tool.pointer_move(Point::new(28.0, 15.0), &mut live);
        let record = tool.pointer_up(&mut live).expect("record");

        let mut first = Surface::new(30, 30);
        tool.draw_from_history(&record, &mut first);

        tool.set_color(Color::rgb(0, 255, 0));
        tool.set_line_width(20.0);
        let mut second = Surface::new(30, 30);
        tool.draw_from_history(&record, &mut second);

        assert_eq!(first, second);
        assert_eq!(first.pixel(15, 15), Some(Rgba([200, 10, 10, 255])));
    }

    #[test]
    fn eraser_record_cuts_alpha_from_opaque_target() {
        let mut tool = pencil();
        tool.set_eraser(true);
        let mut live = Surface::new(20, 20);
        tool.pointer_down(Point::new(0.0, 10.0), &mut live);
        tool.pointer_move(Point::new(20.0, 10.0), &mut live);
        let record = tool.pointer_up(&mut live).expect("record");
        assert_eq!(record.style().composite, CompositeMode::CutHole);

        let mut target = Surface::from_image(RgbaImage::from_pixel(20, 20, Rgba([7, 8, 9, 255])));
        tool.draw_from_history(&record, &mut target);
        assert_eq!(target.pixel(10, 9), Some(Rgba([0, 0, 0, 0])));
        assert_eq!(target.pixel(10, 0), Some(Rgba([7, 8, 9, 255])));
    }
}
