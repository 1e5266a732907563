//! Configuration structures deserialized from `config.toml`.

use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::config::defaults;
use crate::error::ShaderError;
use crate::graphics::shader::{ShaderSources, DEFAULT_FRAGMENT_SHADER, DEFAULT_VERTEX_SHADER};

/// Root of the client configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct QuadConfig {
    #[serde(default)]
    pub window: WindowConfig,
    #[serde(default)]
    pub render: RenderConfig,
    #[serde(default)]
    pub input: InputConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WindowConfig {
    #[serde(default = "defaults::default_window_width")]
    pub width: u32,
    #[serde(default = "defaults::default_window_height")]
    pub height: u32,
    #[serde(default = "defaults::default_window_title")]
    pub title: String,
}

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: defaults::default_window_width(),
            height: defaults::default_window_height(),
            title: defaults::default_window_title(),
        }
    }
}

/// How the frame loop drains protocol events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DispatchMode {
    /// Flush, read whatever is available without waiting, dispatch it.
    #[default]
    Pending,
    /// Wait for at least one event every frame.
    Blocking,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenderConfig {
    #[serde(default = "defaults::default_clear_color")]
    pub clear_color: [f32; 4],
    #[serde(default)]
    pub dispatch: DispatchMode,
    #[serde(default = "defaults::default_swap_interval")]
    pub swap_interval: i32,
    #[serde(default)]
    pub max_frames: Option<u64>,
    #[serde(default)]
    pub vertex_shader: Option<PathBuf>,
    #[serde(default)]
    pub fragment_shader: Option<PathBuf>,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            clear_color: defaults::default_clear_color(),
            dispatch: DispatchMode::default(),
            swap_interval: defaults::default_swap_interval(),
            max_frames: None,
            vertex_shader: None,
            fragment_shader: None,
        }
    }
}

impl RenderConfig {
    /// Shader text for the quad, read from the override paths where set.
    pub fn shader_sources(&self) -> Result<ShaderSources, ShaderError> {
        Ok(ShaderSources {
            vertex: read_source(self.vertex_shader.as_ref(), DEFAULT_VERTEX_SHADER)?,
            fragment: read_source(self.fragment_shader.as_ref(), DEFAULT_FRAGMENT_SHADER)?,
        })
    }
}

fn read_source(path: Option<&PathBuf>, builtin: &str) -> Result<String, ShaderError> {
    match path {
        Some(path) => fs::read_to_string(path).map_err(|source| ShaderError::Source {
            path: path.clone(),
            source,
        }),
        None => Ok(builtin.to_owned()),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    /// Linux evdev keycode whose release ends the loop.
    #[serde(default = "defaults::default_exit_key")]
    pub exit_key: u32,
    #[serde(default = "defaults::default_true")]
    pub exit_on_close: bool,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            exit_key: defaults::default_exit_key(),
            exit_on_close: defaults::default_true(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "defaults::default_log_level")]
    pub level: String,
    #[serde(default = "defaults::default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: defaults::default_log_level(),
            format: defaults::default_log_format(),
        }
    }
}
