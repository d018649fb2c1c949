mod command;

pub use command::{Command, ReplayTarget};

use crate::surface::Surface;

pub const DEFAULT_CHECKPOINT_INTERVAL: usize = 25;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStep {
    Undo,
    Redo,
}

impl HistoryStep {
    const fn applied_message(self) -> &'static str {
        match self {
            Self::Undo => "undo applied",
            Self::Redo => "redo applied",
        }
    }

    const fn empty_message(self) -> &'static str {
        match self {
            Self::Undo => "undo list empty",
            Self::Redo => "redo list empty",
        }
    }
}

/// Snapshot of the committed surface after the first `applied` commands.
#[derive(Debug, Clone)]
struct Checkpoint {
    applied: usize,
    committed: Surface,
}

/// Replay-based undo/redo: undo rebuilds the committed surface from the base
/// image (or the nearest checkpoint) by re-applying every remaining pixel
/// command. Crop trims only move through their own commands.
#[derive(Debug, Clone)]
pub struct History {
    undo: Vec<Command>,
    redo: Vec<Command>,
    checkpoint_interval: usize,
    checkpoints: Vec<Checkpoint>,
}

impl Default for History {
    fn default() -> Self {
        Self::new(DEFAULT_CHECKPOINT_INTERVAL)
    }
}

impl History {
    /// `checkpoint_interval == 0` disables checkpoints.
    pub fn new(checkpoint_interval: usize) -> Self {
        Self {
            undo: Vec::new(),
            redo: Vec::new(),
            checkpoint_interval,
            checkpoints: Vec::new(),
        }
    }

    pub fn undo_len(&self) -> usize {
        self.undo.len()
    }

    pub fn redo_len(&self) -> usize {
        self.redo.len()
    }

    pub fn can_undo(&self) -> bool {
        !self.undo.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo.is_empty()
    }

    /// Applied commands, oldest first.
    pub fn commands(&self) -> &[Command] {
        &self.undo
    }

    pub fn checkpoint_count(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
        self.checkpoints.clear();
    }

    /// Records a finished edit, drops the redo list, and applies it.
    pub fn insert(&mut self, command: impl Into<Command>, target: &mut ReplayTarget<'_>) {
        let command = command.into();
        tracing::debug!(
            command = command.label(),
            discarded_redo = self.redo.len(),
            "inserting history command"
        );
        self.redo.clear();
        command.apply(target);
        self.undo.push(command);
        self.maybe_checkpoint(target);
    }

    /// Returns `false` when there was nothing to undo.
    pub fn undo(&mut self, target: &mut ReplayTarget<'_>) -> bool {
        let Some(command) = self.undo.pop() else {
            tracing::debug!("{}", HistoryStep::Undo.empty_message());
            return false;
        };
        let applied = self.undo.len();
        self.checkpoints.retain(|checkpoint| checkpoint.applied <= applied);

        command.unapply(target);
        if command.touches_pixels() {
            self.rebuild(target);
        }
        tracing::debug!(
            command = command.label(),
            remaining = applied,
            "{}",
            HistoryStep::Undo.applied_message()
        );
        self.redo.push(command);
        true
    }

    /// Returns `false` when there was nothing to redo.
    pub fn redo(&mut self, target: &mut ReplayTarget<'_>) -> bool {
        let Some(command) = self.redo.pop() else {
            tracing::debug!("{}", HistoryStep::Redo.empty_message());
            return false;
        };
        command.apply(target);
        tracing::debug!(
            command = command.label(),
            "{}",
            HistoryStep::Redo.applied_message()
        );
        self.undo.push(command);
        self.maybe_checkpoint(target);
        true
    }

    /// Resets the committed surface to the base image (or the latest
    /// checkpoint) and re-applies the remaining pixel commands in order. The
    /// crop trims are left as they are.
    pub fn rebuild(&self, target: &mut ReplayTarget<'_>) {
        let start = match self.checkpoints.last() {
            Some(checkpoint) => {
                target.surfaces.restore_committed(&checkpoint.committed);
                checkpoint.applied
            }
            None => {
                target.surfaces.reset_committed();
                0
            }
        };
        for command in self.undo[start..].iter().filter(|c| c.touches_pixels()) {
            command.apply(target);
        }
        tracing::debug!(
            from_checkpoint = start,
            replayed = self.undo.len() - start,
            "rebuilt committed surface"
        );
    }

    fn maybe_checkpoint(&mut self, target: &ReplayTarget<'_>) {
        let applied = self.undo.len();
        if self.checkpoint_interval == 0 || applied % self.checkpoint_interval != 0 {
            return;
        }
        if self
            .checkpoints
            .last()
            .is_some_and(|checkpoint| checkpoint.applied >= applied)
        {
            return;
        }
        self.checkpoints.push(Checkpoint {
            applied,
            committed: target.surfaces.committed().clone(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::editor::tools::{CropRecord, DrawingRecord, EditorTools, StrokeOptions, StrokeStyle};
    use crate::geometry::{Color, CropTrim, ImageBounds, Point, RectChange};
    use crate::surface::SurfaceStack;
    use image::{Rgba, RgbaImage};

    struct Fixture {
        surfaces: SurfaceStack,
        crop: CropTrim,
        tools: EditorTools,
    }

    impl Fixture {
        fn new() -> Self {
            let image = RgbaImage::from_pixel(40, 40, Rgba([255, 255, 255, 255]));
            Self {
                surfaces: SurfaceStack::new(image, 40, 40),
                crop: CropTrim::NONE,
                tools: EditorTools::default(),
            }
        }

        fn target(&mut self) -> ReplayTarget<'_> {
            ReplayTarget {
                surfaces: &mut self.surfaces,
                crop: &mut self.crop,
                tools: &self.tools,
            }
        }
    }

    fn line(y: f64, color: Color) -> DrawingRecord {
        let mut options = StrokeOptions::default();
        options.set_color(color);
        options.set_width(3.0);
        let style: StrokeStyle = options.style();
        DrawingRecord::new(vec![Point::new(2.0, y), Point::new(38.0, y)], style)
    }

    #[test]
    fn insert_applies_and_clears_redo() {
        let mut fixture = Fixture::new();
        let mut history = History::new(0);
        history.insert(line(10.0, Color::rgb(255, 0, 0)), &mut fixture.target());
        history.insert(line(20.0, Color::rgb(0, 255, 0)), &mut fixture.target());
        assert!(history.undo(&mut fixture.target()));
        assert_eq!(history.redo_len(), 1);

        history.insert(line(30.0, Color::rgb(0, 0, 255)), &mut fixture.target());
        assert_eq!(history.undo_len(), 2);
        assert_eq!(history.redo_len(), 0);
        assert_eq!(
            fixture.surfaces.committed().pixel(20, 30),
            Some(Rgba([0, 0, 255, 255]))
        );
        assert_eq!(
            fixture.surfaces.committed().pixel(20, 20),
            Some(Rgba([255, 255, 255, 255]))
        );
    }

    #[test]
    fn undo_then_redo_restores_identical_pixels() {
        let mut fixture = Fixture::new();
        let mut history = History::new(0);
        for (index, y) in [8.0, 16.0, 24.0, 32.0].into_iter().enumerate() {
            let shade = 40 * index as u8;
            history.insert(line(y, Color::rgb(shade, 0, 0)), &mut fixture.target());
        }
        let expected = fixture.surfaces.committed().clone();

        while history.undo(&mut fixture.target()) {}
        assert_eq!(fixture.surfaces.committed(), fixture.surfaces.base());

        while history.redo(&mut fixture.target()) {}
        assert_eq!(fixture.surfaces.committed(), &expected);
    }

    #[test]
    fn empty_lists_are_noops() {
        let mut fixture = Fixture::new();
        let mut history = History::default();
        assert!(!history.undo(&mut fixture.target()));
        assert!(!history.redo(&mut fixture.target()));
        assert_eq!(fixture.surfaces.committed(), fixture.surfaces.base());
    }

    #[test]
    fn crop_commands_restore_previous_trims() {
        let mut fixture = Fixture::new();
        let mut history = History::new(0);
        let bounds = ImageBounds::new(40, 40);
        let first = CropRecord::from_change(CropTrim::NONE, RectChange::new(2, 2, 4, 4), bounds)
            .expect("valid crop");
        history.insert(first, &mut fixture.target());
        let second = CropRecord::from_change(fixture.crop, RectChange::new(1, 0, 2, 0), bounds)
            .expect("valid crop");
        history.insert(second, &mut fixture.target());
        history.insert(line(20.0, Color::BLACK), &mut fixture.target());
        assert_eq!(fixture.crop, CropTrim::new(3, 2, 6, 4));

        history.undo(&mut fixture.target());
        assert_eq!(fixture.crop, CropTrim::new(3, 2, 6, 4));
        history.undo(&mut fixture.target());
        assert_eq!(fixture.crop, CropTrim::new(2, 2, 4, 4));
        history.undo(&mut fixture.target());
        assert_eq!(fixture.crop, CropTrim::NONE);

        history.redo(&mut fixture.target());
        assert_eq!(fixture.crop, CropTrim::new(2, 2, 4, 4));
    }

    #[test]
    fn pixel_undo_keeps_trims_set_outside_history() {
        let mut fixture = Fixture::new();
        let mut history = History::new(0);
        fixture.crop = CropTrim::new(4, 0, 8, 0);
        history.insert(line(20.0, Color::BLACK), &mut fixture.target());

        assert!(history.undo(&mut fixture.target()));
        assert_eq!(fixture.crop, CropTrim::new(4, 0, 8, 0));
        assert_eq!(fixture.surfaces.committed(), fixture.surfaces.base());
    }

    #[test]
    fn checkpoint_rebuild_matches_full_replay() {
        let mut with_checkpoints = Fixture::new();
        let mut without = Fixture::new();
        let mut fast = History::new(2);
        let mut slow = History::new(0);

        for step in 0..7u8 {
            let record = line(4.0 + 5.0 * f64::from(step), Color::rgb(30 * step, 100, 0));
            fast.insert(record.clone(), &mut with_checkpoints.target());
            slow.insert(record, &mut without.target());
        }
        assert_eq!(fast.checkpoint_count(), 3);

        for _ in 0..4 {
            fast.undo(&mut with_checkpoints.target());
            slow.undo(&mut without.target());
            assert_eq!(
                with_checkpoints.surfaces.committed(),
                without.surfaces.committed()
            );
        }
        assert_eq!(fast.checkpoint_count(), 1);

        fast.redo(&mut with_checkpoints.target());
        slow.redo(&mut without.target());
        fast.undo(&mut with_checkpoints.target());
        slow.undo(&mut without.target());
        assert_eq!(
            with_checkpoints.surfaces.committed(),
            without.surfaces.committed()
        );
    }

    #[test]
    fn clear_drops_everything() {
        let mut fixture = Fixture::new();
        let mut history = History::new(1);
        history.insert(line(10.0, Color::BLACK), &mut fixture.target());
        history.undo(&mut fixture.target());
        history.insert(line(12.0, Color::BLACK), &mut fixture.target());
        history.clear();
        assert!(!history.can_undo());
        assert!(!history.can_redo());
        assert_eq!(history.checkpoint_count(), 0);
        assert!(history.commands().is_empty());
    }
}
