use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::editor::{EditorSettings, StrokeOptions};
use crate::geometry::Color;
use crate::transform::{ZoomLimits, MAX_ZOOM_STEP, MIN_ZOOM_STEP};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigPathError {
    MissingHomeDirectory,
}

const APP_DIR: &str = "rastedit";
const APP_CONFIG_FILE: &str = "config.json";

/// Editor defaults from `config.json`. Every field is optional.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub line_width: f64,
    pub opacity: f32,
    pub color: Color,
    pub spray_interval_ms: u64,
    pub min_zoom_step: i32,
    pub max_zoom_step: i32,
    pub checkpoint_interval: usize,
    pub spray_seed: Option<u64>,
}

impl Default for EditorConfig {
    fn default() -> Self {
        let settings = EditorSettings::default();
        Self {
            line_width: settings.stroke.width,
            opacity: settings.stroke.opacity,
            color: settings.stroke.color,
            spray_interval_ms: settings.spray_interval.as_millis() as u64,
            min_zoom_step: MIN_ZOOM_STEP,
            max_zoom_step: MAX_ZOOM_STEP,
            checkpoint_interval: settings.checkpoint_interval,
            spray_seed: None,
        }
    }
}

impl EditorConfig {
    /// Out-of-range values are clamped by the setters they flow through.
    pub fn editor_settings(&self) -> EditorSettings {
        let mut stroke = StrokeOptions::default();
        stroke.set_width(self.line_width);
        stroke.set_opacity(self.opacity);
        stroke.set_color(self.color);
        EditorSettings {
            stroke,
            spray_interval: Duration::from_millis(self.spray_interval_ms),
            zoom_limits: ZoomLimits::new(self.min_zoom_step, self.max_zoom_step),
            checkpoint_interval: self.checkpoint_interval,
            spray_seed: self.spray_seed,
        }
    }
}

pub fn load_editor_config() -> EditorConfig {
    let (xdg_config_home, home) = config_env_dirs();
    load_editor_config_with(xdg_config_home.as_deref(), home.as_deref())
}

fn load_editor_config_with(xdg_config_home: Option<&Path>, home: Option<&Path>) -> EditorConfig {
    let path = match app_config_path(APP_DIR, APP_CONFIG_FILE, xdg_config_home, home) {
        Ok(p) => p,
        Err(_) => return EditorConfig::default(),
    };
    if !path.exists() {
        return EditorConfig::default();
    }
    load_editor_config_from(&path)
}

/// Reads a specific config file; unreadable or malformed files yield defaults.
pub fn load_editor_config_from(path: &Path) -> EditorConfig {
    match std::fs::read_to_string(path) {
        Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|err| {
            tracing::warn!(?err, ?path, "failed to parse config.json; using defaults");
            EditorConfig::default()
        }),
        Err(err) => {
            tracing::warn!(?err, ?path, "failed to read config.json; using defaults");
            EditorConfig::default()
        }
    }
}

pub fn config_env_dirs() -> (Option<PathBuf>, Option<PathBuf>) {
    (
        std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from),
        std::env::var_os("HOME").map(PathBuf::from),
    )
}

pub fn app_config_path(
    app_dir: &str,
    file_name: &str,
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    let mut path = config_root(xdg_config_home, home)?;
    path.push(app_dir);
    path.push(file_name);
    Ok(path)
}

fn config_root(
    xdg_config_home: Option<&Path>,
    home: Option<&Path>,
) -> Result<PathBuf, ConfigPathError> {
    if let Some(xdg) = xdg_config_home.filter(|path| !path.as_os_str().is_empty()) {
        return Ok(xdg.to_path_buf());
    }

    let home = home.ok_or(ConfigPathError::MissingHomeDirectory)?;
    Ok(home.join(".config"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rastedit-config-{name}-{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(dir.join(APP_DIR)).expect("create scratch config dir");
        dir
    }

    #[test]
    fn app_config_path_prefers_xdg_config_home() {
        let path = app_config_path(
            "rastedit",
            "config.json",
            Some(Path::new("/tmp/config-root")),
            Some(Path::new("/tmp/home")),
        )
        .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/config-root/rastedit/config.json"));
    }

    #[test]
    fn app_config_path_falls_back_to_home_dot_config() {
        let path = app_config_path("rastedit", "config.json", None, Some(Path::new("/tmp/home")))
            .expect("path should resolve");

        assert_eq!(path, PathBuf::from("/tmp/home/.config/rastedit/config.json"));
    }

    #[test]
    fn app_config_path_errors_when_home_missing_and_xdg_unset() {
        let error = app_config_path("rastedit", "config.json", None, None).unwrap_err();
        assert_eq!(error, ConfigPathError::MissingHomeDirectory);
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load_editor_config_with(Some(Path::new("/nonexistent/rastedit-root")), None);
        assert_eq!(config, EditorConfig::default());
        assert_eq!(config.spray_interval_ms, 20);
    }

    #[test]
    fn partial_file_overrides_only_named_fields() {
        let root = scratch_dir("partial");
        std::fs::write(
            root.join(APP_DIR).join(APP_CONFIG_FILE),
            r##"{ "line_width": 9.5, "color": "#102030", "checkpoint_interval": 0 }"##,
        )
        .expect("write config");

        let config = load_editor_config_with(Some(&root), None);
        assert_eq!(config.line_width, 9.5);
        assert_eq!(config.color, Color::rgb(16, 32, 48));
        assert_eq!(config.checkpoint_interval, 0);
        assert_eq!(config.opacity, 1.0);
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn malformed_file_falls_back_to_defaults() {
        let root = scratch_dir("malformed");
        std::fs::write(root.join(APP_DIR).join(APP_CONFIG_FILE), "{ not json").expect("write");
        assert_eq!(load_editor_config_with(Some(&root), None), EditorConfig::default());
        let _ = std::fs::remove_dir_all(root);
    }

    #[test]
    fn editor_settings_clamp_out_of_range_values() {
        let config = EditorConfig {
            line_width: 0.0,
            opacity: 4.0,
            min_zoom_step: -500,
            max_zoom_step: 500,
            ..EditorConfig::default()
        };
        let settings = config.editor_settings();
        assert_eq!(settings.stroke.width, 1.0);
        assert_eq!(settings.stroke.opacity, 1.0);
        assert_eq!(settings.zoom_limits.min_step(), -64);
        assert_eq!(settings.zoom_limits.max_step(), 64);
    }
}
