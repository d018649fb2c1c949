use crate::editor::tools::{CropRecord, DrawingRecord, EditorTools, SplatRecord, StrokeTool};
use crate::geometry::CropTrim;
use crate::surface::SurfaceStack;

/// Everything a command may touch when applied.
pub struct ReplayTarget<'a> {
    pub surfaces: &'a mut SurfaceStack,
    pub crop: &'a mut CropTrim,
    pub tools: &'a EditorTools,
}

/// One finalized, replayable edit.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Pencil(DrawingRecord),
    Spray(SplatRecord),
    Crop(CropRecord),
}

impl Command {
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pencil(_) => "pencil",
            Self::Spray(_) => "spray",
            Self::Crop(_) => "crop",
        }
    }

    pub const fn touches_pixels(&self) -> bool {
        !matches!(self, Self::Crop(_))
    }

    pub fn apply(&self, target: &mut ReplayTarget<'_>) {
        match self {
            Self::Pencil(record) => target
                .tools
                .pencil
                .draw_from_history(record, target.surfaces.committed_mut()),
            Self::Spray(record) => target
                .tools
                .spray
                .draw_from_history(record, target.surfaces.committed_mut()),
            Self::Crop(record) => *target.crop = record.new,
        }
    }

    /// Reverts the command's effect on editor state. Pixel commands have no
    /// inverse; their undo is a rebuild.
    pub fn unapply(&self, target: &mut ReplayTarget<'_>) {
        if let Self::Crop(record) = self {
            *target.crop = record.previous;
        }
    }
}

impl From<DrawingRecord> for Command {
    fn from(record: DrawingRecord) -> Self {
        Self::Pencil(record)
    }
}

impl From<SplatRecord> for Command {
    fn from(record: SplatRecord) -> Self {
        Self::Spray(record)
    }
}

impl From<CropRecord> for Command {
    fn from(record: CropRecord) -> Self {
        Self::Crop(record)
    }
}
