//! EGL context bootstrap and GLES rendering of the quad.

pub mod egl;
pub mod gles;
pub mod quad;
pub mod shader;

pub use egl::GraphicsContext;
pub use gles::{GlesApi, QuadGeometry};
pub use quad::QuadRenderer;
pub use shader::{build_program, compile_stage, link, ShaderSources, StageKind};
