pub mod cli;
pub mod config;
pub mod editor;
pub mod error;
pub mod geometry;
pub mod history;
pub mod input;
pub mod logging;
pub mod surface;
pub mod transform;

pub use editor::{Editor, EditorAction, EditorSettings, EditorState};
pub use error::{AppError, AppResult};

/// Opens an image file into a fresh editor.
pub fn open_editor(path: &std::path::Path, settings: EditorSettings) -> AppResult<Editor> {
    let image = image::open(path)?.to_rgba8();
    let mut editor = Editor::new(settings, input::DefaultKeymap);
    editor.load_image(image);
    Ok(editor)
}
