//! The full-window quad and its per-frame draw.

use std::rc::Rc;

use tracing::debug;

use crate::error::{CallSite, GraphicsInitError, Result};
use crate::graphics::gles::{GlesApi, Program, QuadGeometry};
use crate::graphics::shader::{self, ShaderSources};
use crate::state::RenderState;

pub const POSITION_ATTRIBUTE: &str = "position";
pub const RESOLUTION_UNIFORM: &str = "resolution";
pub const POINTER_UNIFORM: &str = "pointer";

/// Clip-space corners, one `vec4` each, in triangle-fan order.
pub const QUAD_VERTICES: [f32; 16] = [
    -1.0, -1.0, 0.0, 1.0, //
    1.0, -1.0, 0.0, 1.0, //
    1.0, 1.0, 0.0, 1.0, //
    -1.0, 1.0, 0.0, 1.0,
];
pub const QUAD_VERTEX_COUNT: i32 = 4;

pub struct QuadRenderer<G: GlesApi> {
    gl: Rc<G>,
    program: Program,
    quad: QuadGeometry,
    clear_color: [f32; 4],
}

impl<G: GlesApi> QuadRenderer<G> {
    /// Builds the program and uploads the quad. Requires a current context.
    pub fn new(gl: Rc<G>, sources: &ShaderSources, clear_color: [f32; 4]) -> Result<Self> {
        let program = shader::build_program(gl.as_ref(), sources)?;

        let Some(attribute) = gl.attribute(program, POSITION_ATTRIBUTE) else {
            gl.delete_program_object(program);
            return Err(GraphicsInitError::Gl {
                site: CallSite::here("glGetAttribLocation"),
                reason: format!("program has no active `{POSITION_ATTRIBUTE}` attribute"),
            }
            .into());
        };

        let quad = match gl.upload_quad(&QUAD_VERTICES, attribute) {
            Ok(quad) => quad,
            Err(reason) => {
                gl.delete_program_object(program);
                return Err(GraphicsInitError::Gl {
                    site: CallSite::here("glBufferData"),
                    reason,
                }
                .into());
            }
        };
        debug!(attribute, "quad geometry uploaded");

        Ok(Self {
            gl,
            program,
            quad,
            clear_color,
        })
    }

    /// Clears, uploads both uniforms and draws the quad as one triangle fan.
    pub fn draw(&self, state: &RenderState) {
        let gl = self.gl.as_ref();
        gl.clear_frame(self.clear_color);
        gl.bind_program(Some(self.program));

        // Looked up every frame; a uniform the shader does not use has no location.
        if let Some(location) = gl.uniform(self.program, RESOLUTION_UNIFORM) {
            gl.set_vec2(&location, state.resolution.x, state.resolution.y);
        }
        if let Some(location) = gl.uniform(self.program, POINTER_UNIFORM) {
            gl.set_vec2(&location, state.pointer.x, state.pointer.y);
        }

        gl.bind_quad(self.quad);
        gl.draw_fan(0, QUAD_VERTEX_COUNT);
    }

    pub fn resize(&self, width: i32, height: i32) {
        self.gl.set_viewport(width, height);
    }
}

impl<G: GlesApi> Drop for QuadRenderer<G> {
    fn drop(&mut self) {
        debug!("releasing quad program and geometry");
        self.gl.delete_quad(self.quad);
        self.gl.delete_program_object(self.program);
    }
}
