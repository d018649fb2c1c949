use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use super::tools::ToolKind;
use crate::geometry::{Color, CropTrim, CropTrimError, ImageBounds, Point, Rect};
use crate::transform::{Transform, ZoomLimits};

pub type StateResult<T> = std::result::Result<T, StateError>;

#[derive(Debug, Error)]
pub enum StateError {
    #[error("unknown editor state field `{0}`")]
    UnknownField(String),
    #[error("invalid value for editor state field `{field}`: {reason}")]
    InvalidValue { field: String, reason: String },
    #[error("state patch must be a JSON object")]
    NotAnObject,
}

const FIELDS: &[&str] = &[
    "active_tool",
    "is_drawing",
    "is_mousedown",
    "drag_anchor",
    "color",
    "client_rect",
    "sx",
    "sy",
    "img_w",
    "img_h",
    "scale_step",
    "crop_x",
    "crop_y",
    "crop_w",
    "crop_h",
];

/// The single source of truth for one editing session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorState {
    pub active_tool: Option<ToolKind>,
    pub is_drawing: bool,
    pub is_mousedown: bool,
    pub drag_anchor: Option<Point>,
    pub color: Color,
    pub client_rect: Rect,
    pub sx: f64,
    pub sy: f64,
    pub img_w: u32,
    pub img_h: u32,
    pub scale_step: i32,
    pub crop_x: u32,
    pub crop_y: u32,
    pub crop_w: u32,
    pub crop_h: u32,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            active_tool: None,
            is_drawing: false,
            is_mousedown: false,
            drag_anchor: None,
            color: Color::BLACK,
            client_rect: Rect::default(),
            sx: 0.0,
            sy: 0.0,
            img_w: 0,
            img_h: 0,
            scale_step: 0,
            crop_x: 0,
            crop_y: 0,
            crop_w: 0,
            crop_h: 0,
        }
    }
}

impl EditorState {
    /// Shallow-merges `patch` into the state. Every key must name an existing
    /// field and every value must deserialize into that field's type; on any
    /// error the state is left untouched.
    pub fn set_state(&mut self, patch: Value) -> StateResult<()> {
        let Value::Object(patch) = patch else {
            return Err(StateError::NotAnObject);
        };
        let next = self.merged(patch)?;
        next.validate()?;
        tracing::debug!(state = ?next, "editor state updated");
        *self = next;
        Ok(())
    }

    fn merged(&self, patch: Map<String, Value>) -> StateResult<Self> {
        if let Some(unknown) = patch.keys().find(|key| !FIELDS.contains(&key.as_str())) {
            tracing::warn!(field = %unknown, "rejecting unknown editor state field");
            return Err(StateError::UnknownField(unknown.clone()));
        }

        let mut next = self.clone();
        for (field, value) in patch {
            next.assign(&field, value).map_err(|err| {
                tracing::warn!(field = %field, error = %err, "rejecting editor state value");
                StateError::InvalidValue {
                    field,
                    reason: err.to_string(),
                }
            })?;
        }
        Ok(next)
    }

    /// Deserializes `value` straight into the named field. Untouched fields
    /// keep their exact in-memory values.
    fn assign(&mut self, field: &str, value: Value) -> serde_json::Result<()> {
        use serde_json::from_value;

        match field {
            "active_tool" => self.active_tool = from_value(value)?,
            "is_drawing" => self.is_drawing = from_value(value)?,
            "is_mousedown" => self.is_mousedown = from_value(value)?,
            "drag_anchor" => self.drag_anchor = from_value(value)?,
            "color" => self.color = from_value(value)?,
            "client_rect" => self.client_rect = from_value(value)?,
            "sx" => self.sx = from_value(value)?,
            "sy" => self.sy = from_value(value)?,
            "img_w" => self.img_w = from_value(value)?,
            "img_h" => self.img_h = from_value(value)?,
            "scale_step" => self.scale_step = from_value(value)?,
            "crop_x" => self.crop_x = from_value(value)?,
            "crop_y" => self.crop_y = from_value(value)?,
            "crop_w" => self.crop_w = from_value(value)?,
            "crop_h" => self.crop_h = from_value(value)?,
            _ => {}
        }
        Ok(())
    }

    fn validate(&self) -> StateResult<()> {
        if self.img_w == 0 && self.img_h == 0 {
            return if self.crop() == CropTrim::NONE {
                Ok(())
            } else {
                Err(invalid_crop(CropTrimError::OutOfBounds))
            };
        }
        self.crop()
            .visible_rect(self.image_bounds())
            .map(|_| ())
            .map_err(invalid_crop)
    }

    pub fn image_bounds(&self) -> ImageBounds {
        ImageBounds::new(self.img_w, self.img_h)
    }

    pub fn has_image(&self) -> bool {
        self.img_w > 0 && self.img_h > 0
    }

    pub fn crop(&self) -> CropTrim {
        CropTrim::new(self.crop_x, self.crop_y, self.crop_w, self.crop_h)
    }

    pub(crate) fn set_crop(&mut self, crop: CropTrim) {
        self.crop_x = crop.x;
        self.crop_y = crop.y;
        self.crop_w = crop.w;
        self.crop_h = crop.h;
    }

    pub fn transform(&self, limits: ZoomLimits) -> Transform {
        Transform::new(Point::new(self.sx, self.sy), self.scale_step, limits)
    }

    pub(crate) fn set_transform(&mut self, transform: &Transform) {
        let offset = transform.offset();
        self.sx = offset.x;
        self.sy = offset.y;
        self.scale_step = transform.step();
    }

    /// Resets everything tied to the previous image and records the new size.
    pub(crate) fn reset_for_image(&mut self, bounds: ImageBounds) {
        *self = Self {
            active_tool: self.active_tool,
            color: self.color,
            client_rect: self.client_rect,
            img_w: bounds.width,
            img_h: bounds.height,
            ..Self::default()
        };
    }
}

fn invalid_crop(err: CropTrimError) -> StateError {
    StateError::InvalidValue {
        field: "crop".to_string(),
        reason: err.to_string(),
    }
}
