//! Client configuration: TOML schema, defaults and loading.

pub mod defaults;
pub mod loader;
pub mod types;

pub use loader::{ConfigLoader, CONFIG_PATH_ENV};
pub use types::{DispatchMode, InputConfig, LoggingConfig, QuadConfig, RenderConfig, WindowConfig};
