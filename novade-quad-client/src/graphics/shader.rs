//! Compiling and linking the quad's shader program.

use std::fmt;

use tracing::{debug, info};

use crate::error::ShaderError;
use crate::graphics::gles::{GlesApi, Program};

pub const DEFAULT_VERTEX_SHADER: &str = include_str!("../../shaders/quad.vert");
pub const DEFAULT_FRAGMENT_SHADER: &str = include_str!("../../shaders/quad.frag");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageKind {
    Vertex,
    Fragment,
}

impl StageKind {
    pub fn gl_enum(self) -> u32 {
        match self {
            Self::Vertex => glow::VERTEX_SHADER,
            Self::Fragment => glow::FRAGMENT_SHADER,
        }
    }
}

impl fmt::Display for StageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vertex => "vertex",
            Self::Fragment => "fragment",
        })
    }
}

/// Source text of both stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: String,
    pub fragment: String,
}

impl Default for ShaderSources {
    fn default() -> Self {
        Self {
            vertex: DEFAULT_VERTEX_SHADER.to_owned(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_owned(),
        }
    }
}

/// Compiles one stage and attaches it to `program` on success.
///
/// The stage object is deleted before returning, whatever the outcome; once
/// attached, the program keeps the compiled code alive.
pub fn compile_stage<G: GlesApi + ?Sized>(
    gl: &G,
    program: Program,
    kind: StageKind,
    source: &str,
) -> Result<(), ShaderError> {
    let stage = gl
        .create_stage(kind)
        .map_err(|reason| ShaderError::CreateStage { stage: kind, reason })?;

    let result = if gl.compile_stage_source(stage, source) {
        gl.attach_stage(program, stage);
        debug!(stage = %kind, "stage compiled and attached");
        Ok(())
    } else {
        Err(ShaderError::Compile {
            stage: kind,
            log: gl.stage_log(stage),
        })
    };
    gl.delete_stage(stage);
    result
}

pub fn link<G: GlesApi + ?Sized>(gl: &G, program: Program) -> Result<(), ShaderError> {
    if gl.link(program) {
        Ok(())
    } else {
        Err(ShaderError::Link {
            log: gl.link_log(program),
        })
    }
}

/// Builds a linked program from `sources`; the program is deleted if any step fails.
pub fn build_program<G: GlesApi + ?Sized>(
    gl: &G,
    sources: &ShaderSources,
) -> Result<Program, ShaderError> {
    let program = gl
        .create_program_object()
        .map_err(ShaderError::CreateProgram)?;

    let built = compile_stage(gl, program, StageKind::Vertex, &sources.vertex)
        .and_then(|()| compile_stage(gl, program, StageKind::Fragment, &sources.fragment))
        .and_then(|()| link(gl, program));

    match built {
        Ok(()) => {
            info!("shader program linked");
            Ok(program)
        }
        Err(err) => {
            gl.delete_program_object(program);
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gles::{handles, MockGlesApi};
    use mockall::predicate::eq;
    use mockall::Sequence;

    const PROGRAM: u32 = 7;
    const VERTEX: u32 = 1;
    const FRAGMENT: u32 = 2;

    fn expect_program(gl: &mut MockGlesApi) {
        gl.expect_create_program_object()
            .times(1)
            .returning(|| Ok(handles::program(PROGRAM)));
    }

    fn expect_stage(gl: &mut MockGlesApi, kind: StageKind, raw: u32, compiles: bool) {
        gl.expect_create_stage()
            .with(eq(kind))
            .times(1)
            .returning(move |_| Ok(handles::stage(raw)));
        gl.expect_compile_stage_source()
            .times(1)
            .returning(move |stage, _| {
                assert_eq!(stage, handles::stage(raw));
                compiles
            });
    }

    #[test]
    fn vertex_syntax_error_stops_before_attach_and_link() {
        let mut gl = MockGlesApi::new();
        expect_program(&mut gl);
        expect_stage(&mut gl, StageKind::Vertex, VERTEX, false);
        gl.expect_stage_log()
            .times(1)
            .returning(|_| "0:1: syntax error: unexpected '}'".to_string());
        gl.expect_delete_stage()
            .with(eq(handles::stage(VERTEX)))
            .times(1)
            .return_const(());
        gl.expect_attach_stage().never();
        gl.expect_link().never();
        gl.expect_delete_program_object()
            .with(eq(handles::program(PROGRAM)))
            .times(1)
            .return_const(());

        let sources = ShaderSources {
            vertex: "void main() { }}".to_string(),
            fragment: DEFAULT_FRAGMENT_SHADER.to_string(),
        };
        match build_program(&gl, &sources) {
            Err(ShaderError::Compile { stage, log }) => {
                assert_eq!(stage, StageKind::Vertex);
                assert!(log.contains("syntax error"));
            }
            other => panic!("expected a vertex compile error, got {other:?}"),
        }
    }

    #[test]
    fn stages_are_deleted_right_after_attach() {
        let mut gl = MockGlesApi::new();
        let mut seq = Sequence::new();
        expect_program(&mut gl);
        for (kind, raw) in [(StageKind::Vertex, VERTEX), (StageKind::Fragment, FRAGMENT)] {
            gl.expect_create_stage()
                .with(eq(kind))
                .times(1)
                .in_sequence(&mut seq)
                .returning(move |_| Ok(handles::stage(raw)));
            gl.expect_compile_stage_source()
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| true);
            gl.expect_attach_stage()
                .with(eq(handles::program(PROGRAM)), eq(handles::stage(raw)))
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());
            gl.expect_delete_stage()
                .with(eq(handles::stage(raw)))
                .times(1)
                .in_sequence(&mut seq)
                .return_const(());
        }
        gl.expect_link()
            .with(eq(handles::program(PROGRAM)))
            .times(1)
            .in_sequence(&mut seq)
            .return_const(true);
        gl.expect_delete_program_object().never();

        let program = build_program(&gl, &ShaderSources::default()).expect("program links");
        assert_eq!(program, handles::program(PROGRAM));
    }

    #[test]
    fn link_failure_carries_the_linker_log() {
        let mut gl = MockGlesApi::new();
        expect_program(&mut gl);
        expect_stage(&mut gl, StageKind::Vertex, VERTEX, true);
        expect_stage(&mut gl, StageKind::Fragment, FRAGMENT, true);
        gl.expect_attach_stage().times(2).return_const(());
        gl.expect_delete_stage().times(2).return_const(());
        gl.expect_link().times(1).return_const(false);
        gl.expect_link_log()
            .times(1)
            .returning(|_| "varying `v` not written by the vertex stage".to_string());
        gl.expect_delete_program_object().times(1).return_const(());

        let err = build_program(&gl, &ShaderSources::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "program failed to link:\nvarying `v` not written by the vertex stage"
        );
    }

    #[test]
    fn fragment_failure_keeps_the_stage_kind() {
        let mut gl = MockGlesApi::new();
        expect_program(&mut gl);
        expect_stage(&mut gl, StageKind::Vertex, VERTEX, true);
        expect_stage(&mut gl, StageKind::Fragment, FRAGMENT, false);
        gl.expect_attach_stage()
            .with(eq(handles::program(PROGRAM)), eq(handles::stage(VERTEX)))
            .times(1)
            .return_const(());
        gl.expect_stage_log().times(1).returning(|_| "bad".to_string());
        gl.expect_delete_stage().times(2).return_const(());
        gl.expect_link().never();
        gl.expect_delete_program_object().times(1).return_const(());

        let err = build_program(&gl, &ShaderSources::default()).unwrap_err();
        assert!(matches!(
            err,
            ShaderError::Compile {
                stage: StageKind::Fragment,
                ..
            }
        ));
    }

    #[test]
    fn stage_creation_failure_is_reported() {
        let mut gl = MockGlesApi::new();
        gl.expect_create_stage()
            .returning(|_| Err("out of memory".to_string()));
        let err = compile_stage(&gl, handles::program(PROGRAM), StageKind::Fragment, "")
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "failed to create fragment stage object: out of memory"
        );
    }

    #[test]
    fn builtin_sources_use_the_interface_names() {
        let sources = ShaderSources::default();
        assert!(sources.vertex.starts_with("#version 300 es"));
        assert!(sources.vertex.contains("position"));
        assert!(sources.fragment.contains("resolution"));
        assert!(sources.fragment.contains("pointer"));
    }
}
