//! Error handling for the NovaDE quad client.
//!
//! Every bootstrap stage has its own error enum so a failure report names the
//! subsystem that gave up: [`ConnectionError`] for reaching the compositor,
//! [`ProtocolError`] for registry/shell/seat negotiation, [`GraphicsInitError`]
//! for EGL, [`ShaderError`] for program building and [`RuntimeDispatchError`]
//! for the frame loop. [`ClientError`] wraps all of them together with the
//! configuration and logging errors.
//!
//! Variants that correspond to a single failing call carry a [`CallSite`] so the
//! report can point at the exact request and the line that issued it.

use std::fmt;
use std::panic::Location;
use std::path::PathBuf;

use thiserror::Error;
use wayland_backend::client::WaylandError;

use crate::graphics::shader::StageKind;

/// A failing call together with the source location that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallSite {
    pub call: &'static str,
    pub file: &'static str,
    pub line: u32,
}

impl CallSite {
    /// Captures the caller's location for `call`.
    #[track_caller]
    pub fn here(call: &'static str) -> Self {
        let location = Location::caller();
        Self {
            call,
            file: location.file(),
            line: location.line(),
        }
    }
}

impl fmt::Display for CallSite {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.call, self.file, self.line)
    }
}

/// The display server could not be reached.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("{site} failed: cannot reach the display server")]
    Connect {
        site: CallSite,
        #[source]
        source: wayland_client::ConnectError,
    },
}

/// Registry, shell or seat negotiation failed.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("{site} failed")]
    Roundtrip {
        site: CallSite,
        #[source]
        source: wayland_client::DispatchError,
    },

    /// The round-trip completed but the compositor never advertised `interface`.
    #[error("required global `{interface}` not found")]
    MissingGlobal { interface: &'static str },

    /// The seat did not advertise a mandatory input device.
    #[error("seat does not provide a {device}")]
    MissingSeatDevice { device: &'static str },
}

/// EGL bootstrap failed.
#[derive(Debug, Error)]
pub enum GraphicsInitError {
    #[error("{site} failed")]
    Egl {
        site: CallSite,
        #[source]
        source: khronos_egl::Error,
    },

    #[error("{site} returned EGL_NO_DISPLAY")]
    NoDisplay { site: CallSite },

    #[error("{site} found no config matching 8-bit RGBA, window-capable, ES3-renderable")]
    NoMatchingConfig { site: CallSite },

    #[error("{site} failed: {reason}")]
    NativeWindow { site: CallSite, reason: String },

    #[error("{site} failed: {reason}")]
    Gl { site: CallSite, reason: String },
}

/// Building the quad's shader program failed.
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("failed to create program object: {0}")]
    CreateProgram(String),

    #[error("failed to create {stage} stage object: {reason}")]
    CreateStage { stage: StageKind, reason: String },

    #[error("{stage} stage failed to compile:\n{log}")]
    Compile { stage: StageKind, log: String },

    #[error("program failed to link:\n{log}")]
    Link { log: String },

    #[error("failed to read shader source from {path:?}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A fatal error inside the frame loop.
#[derive(Debug, Error)]
pub enum RuntimeDispatchError {
    #[error("dispatching protocol events failed on frame {frame}")]
    Dispatch {
        frame: u64,
        #[source]
        source: wayland_client::DispatchError,
    },

    #[error("exchanging protocol messages failed on frame {frame}")]
    Io {
        frame: u64,
        #[source]
        source: WaylandError,
    },

    #[error("presenting frame {frame} failed")]
    Present {
        frame: u64,
        #[source]
        source: khronos_egl::Error,
    },
}

/// Configuration loading or validation failed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read configuration file from {path:?}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse configuration file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("configuration validation failed: {0}")]
    Validation(String),

    #[error("could not determine the configuration directory")]
    DirectoryUnavailable,
}

/// Installing the global `tracing` subscriber failed.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log level `{0}`")]
    InvalidLevel(String),

    #[error("failed to install the global tracing subscriber: {0}")]
    Install(String),
}

/// Top-level error of the client; one variant per failing subsystem.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("configuration error")]
    Config(#[from] ConfigError),

    #[error("logging initialization failed")]
    Logging(#[from] LoggingError),

    #[error("connection error")]
    Connection(#[from] ConnectionError),

    #[error("protocol error")]
    Protocol(#[from] ProtocolError),

    #[error("graphics initialization error")]
    Graphics(#[from] GraphicsInitError),

    #[error("shader error")]
    Shader(#[from] ShaderError),

    #[error("render loop error")]
    Runtime(#[from] RuntimeDispatchError),
}

pub type Result<T, E = ClientError> = std::result::Result<T, E>;
