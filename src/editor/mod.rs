//! Editor composition root: state, surfaces, history, tools and keymap.

pub mod state;
pub mod tools;

use std::time::Duration;

use image::RgbaImage;
use serde_json::Value;
use thiserror::Error;

use crate::geometry::{Color, Point, Rect};
use crate::history::{Command, History, ReplayTarget, DEFAULT_CHECKPOINT_INTERVAL};
use crate::input::{DefaultKeymap, InputEvent, Key, Keymap, Modifiers, PointerButton};
use crate::surface::{CompositeMode, Surface, SurfaceStack};
use crate::transform::{Transform, ZoomLimits};

pub use state::{EditorState, StateError, StateResult};
pub use tools::{
    crop_change, CropRecord, EditorTools, SprayTool, StrokeOptions, StrokeTool, ToolError,
    ToolKind, DEFAULT_SPRAY_INTERVAL,
};

const CROP_BORDER: Color = Color::new(128, 128, 128, 0.9);

/// Requests the editor hands back to the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    Save,
    Load,
}

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("no image is loaded")]
    NoImage,
    #[error(transparent)]
    State(#[from] StateError),
}

/// Construction-time tunables, usually derived from the config file.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EditorSettings {
    pub stroke: StrokeOptions,
    pub spray_interval: Duration,
    pub zoom_limits: ZoomLimits,
    pub checkpoint_interval: usize,
    /// Fixed spray seed for reproducible runs.
    pub spray_seed: Option<u64>,
}

impl Default for EditorSettings {
    fn default() -> Self {
        Self {
            stroke: StrokeOptions::default(),
            spray_interval: DEFAULT_SPRAY_INTERVAL,
            zoom_limits: ZoomLimits::default(),
            checkpoint_interval: DEFAULT_CHECKPOINT_INTERVAL,
            spray_seed: None,
        }
    }
}

/// What the pointer is doing between down and up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum Gesture {
    #[default]
    Idle,
    Pan,
    Stroke(ToolKind),
    Crop,
}

#[derive(Debug)]
pub struct Editor<K: Keymap = DefaultKeymap> {
    state: EditorState,
    surfaces: SurfaceStack,
    history: History,
    tools: EditorTools,
    keymap: K,
    zoom_limits: ZoomLimits,
    gesture: Gesture,
}

impl Default for Editor<DefaultKeymap> {
    fn default() -> Self {
        Self::new(EditorSettings::default(), DefaultKeymap)
    }
}

impl<K: Keymap> Editor<K> {
    pub fn new(settings: EditorSettings, keymap: K) -> Self {
        let mut tools = EditorTools::new(settings.stroke, settings.spray_interval);
        if let Some(seed) = settings.spray_seed {
            tools.spray = SprayTool::with_seed(settings.stroke, settings.spray_interval, seed);
        }
        let state = EditorState {
            color: settings.stroke.color,
            ..EditorState::default()
        };
        Self {
            state,
            surfaces: SurfaceStack::default(),
            history: History::new(settings.checkpoint_interval),
            tools,
            keymap,
            zoom_limits: settings.zoom_limits,
            gesture: Gesture::Idle,
        }
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn surfaces(&self) -> &SurfaceStack {
        &self.surfaces
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn tools(&self) -> &EditorTools {
        &self.tools
    }

    pub fn transform(&self) -> Transform {
        self.state.transform(self.zoom_limits)
    }

    /// Validated merge into the editor state. Tool and color changes are
    /// pushed into the tools; the image size cannot be patched.
    pub fn set_state(&mut self, patch: Value) -> StateResult<()> {
        let mut next = self.state.clone();
        next.set_state(patch)?;

        let bounds = self.surfaces.image_bounds();
        if next.img_w != bounds.width || next.img_h != bounds.height {
            let field = if next.img_w != bounds.width { "img_w" } else { "img_h" };
            return Err(StateError::InvalidValue {
                field: field.to_string(),
                reason: "image size follows the loaded image".to_string(),
            });
        }

        let tool_changed = next.active_tool != self.state.active_tool;
        let color_changed = next.color != self.state.color;
        let client_changed = next.client_rect != self.state.client_rect;
        self.state = next;
        let transform = self.transform();
        self.state.set_transform(&transform);

        if tool_changed {
            self.reset_tool_state();
        }
        if color_changed {
            self.tools.set_shared_color(self.state.color);
        }
        if client_changed {
            self.resize_display_to_client();
        }
        Ok(())
    }

    /// Replaces the image and resets history, view, crop and tools.
    pub fn load_image(&mut self, image: RgbaImage) {
        let (width, height) = image.dimensions();
        self.surfaces.load(image);
        self.history.clear();
        self.tools.reset_all();
        self.gesture = Gesture::Idle;
        self.state.reset_for_image(self.surfaces.image_bounds());
        tracing::info!(width, height, "image loaded");
    }

    pub fn set_client_rect(&mut self, rect: Rect) {
        self.state.client_rect = rect;
        self.resize_display_to_client();
    }

    fn resize_display_to_client(&mut self) {
        let rect = self.state.client_rect;
        self.surfaces
            .resize_display(rect.w.max(0.0) as u32, rect.h.max(0.0) as u32);
    }

    pub fn set_active_tool(&mut self, tool: Option<ToolKind>) {
        if self.state.active_tool == tool {
            return;
        }
        tracing::debug!(from = ?self.state.active_tool, to = ?tool, "switching tool");
        self.state.active_tool = tool;
        self.reset_tool_state();
    }

    fn reset_tool_state(&mut self) {
        self.tools.reset_all();
        self.surfaces.clear_live();
        self.state.is_drawing = false;
        self.state.drag_anchor = None;
        self.gesture = Gesture::Idle;
    }

    pub fn set_color(&mut self, color: Color) {
        self.state.color = color;
        self.tools.set_shared_color(color);
    }

    pub fn set_opacity(&mut self, opacity: f32) {
        self.tools.set_shared_opacity(opacity);
    }

    pub fn set_line_width(&mut self, width: f64) {
        self.tools.set_shared_line_width(width);
    }

    pub fn set_eraser(&mut self, eraser: bool) {
        self.tools.set_shared_eraser(eraser);
    }

    /// Dispatches one host event. Only key events can yield an action.
    pub fn handle_event(&mut self, event: InputEvent) -> Option<EditorAction> {
        match event {
            InputEvent::PointerDown {
                position,
                button,
                modifiers,
            } => self.pointer_down(position, button, modifiers),
            InputEvent::PointerMove { position, .. } => self.pointer_move(position),
            InputEvent::PointerUp { position, .. } => self.pointer_up(position),
            InputEvent::Wheel {
                position,
                delta,
                modifiers,
            } => {
                self.wheel(position, delta, modifiers);
            }
            InputEvent::Key { key, modifiers } => return self.handle_key(key, modifiers),
            InputEvent::Tick { elapsed_ms } => {
                self.tick(Duration::from_millis(elapsed_ms));
            }
        }
        None
    }

    pub fn pointer_down(&mut self, screen: Point, button: PointerButton, modifiers: Modifiers) {
        if self.gesture != Gesture::Idle {
            tracing::debug!(gesture = ?self.gesture, "ignoring pointer down mid-gesture");
            return;
        }
        self.state.is_mousedown = true;
        if !self.surfaces.has_image() {
            return;
        }

        let active = self.state.active_tool;
        let primary = button == PointerButton::Primary;
        if self.keymap.is_pan(button, modifiers) || (primary && active == Some(ToolKind::Pan)) {
            self.gesture = Gesture::Pan;
            self.state.drag_anchor = Some(screen);
            return;
        }
        if self.keymap.is_color_sample(button, modifiers)
            || (primary && active == Some(ToolKind::ColorPicker))
        {
            let color = self.sample_color(screen);
            tracing::debug!(color = %color.to_hex(), "sampled color");
            self.set_color(color);
            return;
        }
        if !primary {
            return;
        }

        let world = self.transform().screen_to_world(screen);
        match active {
            Some(ToolKind::Pencil) => {
                self.tools.pencil.pointer_down(world, self.surfaces.live_mut());
                self.begin_stroke(ToolKind::Pencil, screen);
            }
            Some(ToolKind::Spray) => {
                self.tools.spray.pointer_down(world, self.surfaces.live_mut());
                self.begin_stroke(ToolKind::Spray, screen);
            }
            Some(ToolKind::Crop) => {
                self.tools.crop.pointer_down(screen);
                self.state.drag_anchor = Some(screen);
                self.gesture = Gesture::Crop;
            }
            Some(ToolKind::Pan | ToolKind::ColorPicker) | None => {}
        }
    }

    fn begin_stroke(&mut self, tool: ToolKind, screen: Point) {
        self.state.is_drawing = true;
        self.state.drag_anchor = Some(screen);
        self.gesture = Gesture::Stroke(tool);
    }

    pub fn pointer_move(&mut self, screen: Point) {
        match self.gesture {
            Gesture::Idle => {}
            Gesture::Pan => {
                let Some(last) = self.state.drag_anchor else {
                    return;
                };
                let mut transform = self.transform();
                transform.pan_by(screen.x - last.x, screen.y - last.y);
                self.state.set_transform(&transform);
                self.state.drag_anchor = Some(screen);
            }
            Gesture::Stroke(tool) => {
                let world = self.transform().screen_to_world(screen);
                let live = self.surfaces.live_mut();
                match tool {
                    ToolKind::Pencil => self.tools.pencil.pointer_move(world, live),
                    ToolKind::Spray => self.tools.spray.pointer_move(world, live),
                    _ => {}
                }
            }
            Gesture::Crop => self.tools.crop.pointer_move(screen),
        }
    }

    pub fn pointer_up(&mut self, screen: Point) {
        self.state.is_mousedown = false;
        self.state.drag_anchor = None;
        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Pan => {}
            Gesture::Stroke(tool) => {
                self.state.is_drawing = false;
                let live = self.surfaces.live_mut();
                match tool {
                    ToolKind::Pencil => {
                        if let Some(record) = self.tools.pencil.pointer_up(live) {
                            self.commit(record);
                        }
                    }
                    ToolKind::Spray => {
                        if let Some(record) = self.tools.spray.pointer_up(live) {
                            self.commit(record);
                        }
                    }
                    _ => {}
                }
            }
            Gesture::Crop => {
                self.tools.crop.pointer_move(screen);
                let Some(rect) = self.tools.crop.pointer_up() else {
                    return;
                };
                if let Err(err) = self.commit_crop(rect) {
                    tracing::warn!(error = %err, ?rect, "rejecting crop");
                }
            }
        }
    }

    /// Turns a screen-space crop rectangle into a crop command. Returns
    /// `Ok(false)` when the rectangle matches the current crop.
    pub fn commit_crop(&mut self, screen_rect: Rect) -> Result<bool, ToolError> {
        if !self.surfaces.has_image() {
            return Err(ToolError::NoImage);
        }
        let bounds = self.surfaces.image_bounds();
        let current = self.state.crop();
        let change = crop_change(screen_rect, &self.transform(), bounds, current)?;
        if change.is_zero() {
            tracing::debug!("crop matches current trims");
            return Ok(false);
        }
        let record = CropRecord::from_change(current, change, bounds)?;
        self.commit(record);
        Ok(true)
    }

    fn commit(&mut self, command: impl Into<Command>) {
        self.with_replay_target(|history, target| history.insert(command, target));
    }

    fn with_replay_target<R>(
        &mut self,
        run: impl FnOnce(&mut History, &mut ReplayTarget<'_>) -> R,
    ) -> R {
        let mut crop = self.state.crop();
        let result = {
            let mut target = ReplayTarget {
                surfaces: &mut self.surfaces,
                crop: &mut crop,
                tools: &self.tools,
            };
            run(&mut self.history, &mut target)
        };
        self.state.set_crop(crop);
        result
    }

    /// Zooms around `screen` unless the keymap rejects the gesture or a
    /// stroke is mid-drag. Positive deltas zoom out.
    pub fn wheel(&mut self, screen: Point, delta: f64, modifiers: Modifiers) -> bool {
        if !self.keymap.is_wheel_zoom(modifiers) || self.tools.is_stroke_in_progress() {
            return false;
        }
        let steps = if delta > 0.0 {
            -1
        } else if delta < 0.0 {
            1
        } else {
            return false;
        };
        let mut transform = self.transform();
        if !transform.zoom_at(screen, steps) {
            return false;
        }
        self.state.set_transform(&transform);
        true
    }

    pub fn handle_key(&mut self, key: Key, modifiers: Modifiers) -> Option<EditorAction> {
        if self.keymap.is_undo(key, modifiers) {
            self.undo();
        } else if self.keymap.is_redo(key, modifiers) {
            self.redo();
        } else if self.keymap.is_save(key, modifiers) {
            return Some(EditorAction::Save);
        } else if self.keymap.is_load(key, modifiers) {
            return Some(EditorAction::Load);
        } else if let Some(tool) = self.keymap.tool_selection(key, modifiers) {
            self.set_active_tool(Some(tool));
        }
        None
    }

    /// Advances host time; drives the spray burst timer.
    pub fn tick(&mut self, elapsed: Duration) -> usize {
        if self.gesture != Gesture::Stroke(ToolKind::Spray) {
            return 0;
        }
        self.tools.spray.tick(elapsed, self.surfaces.live_mut())
    }

    pub fn undo(&mut self) -> bool {
        if self.gesture != Gesture::Idle {
            tracing::debug!("ignoring undo mid-gesture");
            return false;
        }
        self.with_replay_target(|history, target| history.undo(target))
    }

    pub fn redo(&mut self) -> bool {
        if self.gesture != Gesture::Idle {
            tracing::debug!("ignoring redo mid-gesture");
            return false;
        }
        self.with_replay_target(|history, target| history.redo(target))
    }

    /// Rebuilds the display surface from committed, live and the crop mask.
    pub fn draw(&mut self) -> &Surface {
        let transform = self.transform();
        let stroke_mode = match self.gesture {
            Gesture::Stroke(tool) => Some(self.tools.composite_mode(tool)),
            _ => None,
        };
        let visible = self
            .state
            .crop()
            .visible_rect(self.surfaces.image_bounds())
            .ok()
            .filter(|_| self.surfaces.has_image());

        let (display, committed, live) = self.surfaces.compose_parts();
        display.clear();
        display.draw_transformed(committed, &transform, CompositeMode::PaintOver);
        if let Some(mode) = stroke_mode {
            display.draw_transformed(live, &transform, mode);
        }
        if let Some(visible) = visible {
            let screen = transform.world_rect_to_screen(visible.to_rect());
            display.clear_outside(screen);
            let border = Rect::new(screen.x - 1.0, screen.y - 1.0, screen.w + 2.0, screen.h + 2.0);
            display.stroke_rect(border, CROP_BORDER, 1.0);
        }
        if self.state.active_tool == Some(ToolKind::Crop) {
            self.tools.crop.draw(display);
        }
        self.surfaces.display()
    }

    /// Exports the committed surface cut to the current crop.
    pub fn render_final(&self) -> Result<RgbaImage, EditorError> {
        if !self.surfaces.has_image() {
            return Err(EditorError::NoImage);
        }
        let visible = self
            .state
            .crop()
            .visible_rect(self.surfaces.image_bounds())
            .map_err(|err| StateError::InvalidValue {
                field: "crop".to_string(),
                reason: err.to_string(),
            })?;
        let image = image::imageops::crop_imm(
            self.surfaces.committed().as_image(),
            visible.x,
            visible.y,
            visible.width,
            visible.height,
        )
        .to_image();
        Ok(image)
    }

    /// Color of the committed pixel under `screen`; transparent off-image.
    pub fn sample_color(&self, screen: Point) -> Color {
        let world = self.transform().screen_to_world(screen);
        self.surfaces
            .committed()
            .pixel(world.x.floor() as i64, world.y.floor() as i64)
            .map_or(Color::TRANSPARENT, |pixel| Color::from_rgba8(pixel.0))
    }
}
