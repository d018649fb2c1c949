use crate::editor::{EditorError, StateError, ToolError};
use thiserror::Error;

pub type AppResult<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Tool(#[from] ToolError),
    #[error(transparent)]
    Editor(#[from] EditorError),
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),
}
