//! The slice of OpenGL ES the quad needs, behind a trait.
//!
//! [`GlesApi`] is implemented for `glow::Context` in production; tests use the
//! `mockall`-generated `MockGlesApi` to observe exactly which calls a frame or a
//! shader build issues.

use glow::HasContext;

use crate::graphics::shader::StageKind;

pub type Program = glow::Program;
pub type Stage = glow::Shader;
pub type UniformLocation = glow::UniformLocation;

/// Vertex array plus the buffer holding the quad's positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuadGeometry {
    pub vertex_array: glow::VertexArray,
    pub buffer: glow::Buffer,
}

#[cfg_attr(test, mockall::automock)]
pub trait GlesApi {
    fn create_program_object(&self) -> Result<Program, String>;
    fn delete_program_object(&self, program: Program);

    fn create_stage(&self, kind: StageKind) -> Result<Stage, String>;
    /// Sets the source and compiles; returns the compile status.
    fn compile_stage_source(&self, stage: Stage, source: &str) -> bool;
    fn stage_log(&self, stage: Stage) -> String;
    fn attach_stage(&self, program: Program, stage: Stage);
    fn delete_stage(&self, stage: Stage);

    /// Links and returns the link status.
    fn link(&self, program: Program) -> bool;
    fn link_log(&self, program: Program) -> String;
    fn bind_program(&self, program: Option<Program>);

    fn uniform(&self, program: Program, name: &str) -> Option<UniformLocation>;
    fn attribute(&self, program: Program, name: &str) -> Option<u32>;
    fn set_vec2(&self, location: &UniformLocation, x: f32, y: f32);

    /// Uploads `vec4` positions and wires them to attribute `attribute`.
    fn upload_quad(&self, positions: &[f32], attribute: u32) -> Result<QuadGeometry, String>;
    fn delete_quad(&self, quad: QuadGeometry);
    fn bind_quad(&self, quad: QuadGeometry);

    fn set_viewport(&self, width: i32, height: i32);
    fn clear_frame(&self, color: [f32; 4]);
    fn draw_fan(&self, first: i32, count: i32);
}

impl GlesApi for glow::Context {
    fn create_program_object(&self) -> Result<Program, String> {
        unsafe { self.create_program() }
    }

    fn delete_program_object(&self, program: Program) {
        unsafe { self.delete_program(program) }
    }

    fn create_stage(&self, kind: StageKind) -> Result<Stage, String> {
        unsafe { self.create_shader(kind.gl_enum()) }
    }

    fn compile_stage_source(&self, stage: Stage, source: &str) -> bool {
        unsafe {
            self.shader_source(stage, source);
            self.compile_shader(stage);
            self.get_shader_compile_status(stage)
        }
    }

    fn stage_log(&self, stage: Stage) -> String {
        unsafe { self.get_shader_info_log(stage) }
    }

    fn attach_stage(&self, program: Program, stage: Stage) {
        unsafe { self.attach_shader(program, stage) }
    }

    fn delete_stage(&self, stage: Stage) {
        unsafe { self.delete_shader(stage) }
    }

    fn link(&self, program: Program) -> bool {
        unsafe {
            self.link_program(program);
            self.get_program_link_status(program)
        }
    }

    fn link_log(&self, program: Program) -> String {
        unsafe { self.get_program_info_log(program) }
    }

    fn bind_program(&self, program: Option<Program>) {
        unsafe { self.use_program(program) }
    }

    fn uniform(&self, program: Program, name: &str) -> Option<UniformLocation> {
        unsafe { self.get_uniform_location(program, name) }
    }

    fn attribute(&self, program: Program, name: &str) -> Option<u32> {
        unsafe { self.get_attrib_location(program, name) }
    }

    fn set_vec2(&self, location: &UniformLocation, x: f32, y: f32) {
        unsafe { self.uniform_2_f32(Some(location), x, y) }
    }

    fn upload_quad(&self, positions: &[f32], attribute: u32) -> Result<QuadGeometry, String> {
        unsafe {
            let vertex_array = self.create_vertex_array()?;
            let buffer = match self.create_buffer() {
                Ok(buffer) => buffer,
                Err(err) => {
                    self.delete_vertex_array(vertex_array);
                    return Err(err);
                }
            };
            self.bind_vertex_array(Some(vertex_array));
            self.bind_buffer(glow::ARRAY_BUFFER, Some(buffer));
            self.buffer_data_u8_slice(
                glow::ARRAY_BUFFER,
                bytemuck::cast_slice(positions),
                glow::STATIC_DRAW,
            );
            self.vertex_attrib_pointer_f32(attribute, 4, glow::FLOAT, false, 0, 0);
            self.enable_vertex_attrib_array(attribute);
            self.bind_vertex_array(None);
            self.bind_buffer(glow::ARRAY_BUFFER, None);
            Ok(QuadGeometry {
                vertex_array,
                buffer,
            })
        }
    }

    fn delete_quad(&self, quad: QuadGeometry) {
        unsafe {
            self.delete_buffer(quad.buffer);
            self.delete_vertex_array(quad.vertex_array);
        }
    }

    fn bind_quad(&self, quad: QuadGeometry) {
        unsafe { self.bind_vertex_array(Some(quad.vertex_array)) }
    }

    fn set_viewport(&self, width: i32, height: i32) {
        unsafe { self.viewport(0, 0, width, height) }
    }

    fn clear_frame(&self, [r, g, b, a]: [f32; 4]) {
        unsafe {
            self.clear_color(r, g, b, a);
            self.clear(glow::COLOR_BUFFER_BIT);
        }
    }

    fn draw_fan(&self, first: i32, count: i32) {
        unsafe { self.draw_arrays(glow::TRIANGLE_FAN, first, count) }
    }
}
