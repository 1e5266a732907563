//! The frame loop: dispatch, exit check, resize, draw, present.

use tracing::{debug, info, trace};

use crate::error::RuntimeDispatchError;
use crate::graphics::gles::GlesApi;
use crate::graphics::quad::QuadRenderer;
use crate::state::{ClientState, ExitPolicy, ExitReason};

/// Drains protocol events into the client state once per frame.
pub trait EventPump {
    /// Returns the number of events dispatched.
    fn pump(&mut self, state: &mut ClientState, frame: u64) -> Result<usize, RuntimeDispatchError>;
}

/// The drawable the frame is presented to.
pub trait PresentTarget {
    fn present(&mut self) -> Result<(), khronos_egl::Error>;
    /// Resizes the native window backing the surface.
    fn resize(&mut self, width: i32, height: i32);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoopSummary {
    /// Frames presented.
    pub frames: u64,
    pub reason: ExitReason,
}

#[derive(Debug, Clone, Copy)]
pub struct RenderLoop {
    policy: ExitPolicy,
    max_frames: Option<u64>,
}

impl RenderLoop {
    pub fn new(policy: ExitPolicy, max_frames: Option<u64>) -> Self {
        Self { policy, max_frames }
    }

    /// Runs one iteration. Returns the exit reason when the loop should stop
    /// before drawing this frame.
    pub fn step<P, T, G>(
        &self,
        frame: u64,
        pump: &mut P,
        state: &mut ClientState,
        target: &mut T,
        renderer: &QuadRenderer<G>,
    ) -> Result<Option<ExitReason>, RuntimeDispatchError>
    where
        P: EventPump + ?Sized,
        T: PresentTarget + ?Sized,
        G: GlesApi,
    {
        let dispatched = pump.pump(state, frame)?;
        trace!(frame, dispatched, "events dispatched");

        if let Some(reason) = state.exit_reason(&self.policy) {
            return Ok(Some(reason));
        }

        if let Some((width, height)) = state.render.take_pending_resize() {
            target.resize(width, height);
            renderer.resize(width, height);
        }

        renderer.draw(&state.render);
        target
            .present()
            .map_err(|source| RuntimeDispatchError::Present { frame, source })?;
        Ok(None)
    }

    /// Iterates until an exit condition, the frame limit or an error.
    pub fn run<P, T, G>(
        &self,
        pump: &mut P,
        state: &mut ClientState,
        target: &mut T,
        renderer: &QuadRenderer<G>,
    ) -> Result<LoopSummary, RuntimeDispatchError>
    where
        P: EventPump + ?Sized,
        T: PresentTarget + ?Sized,
        G: GlesApi,
    {
        info!(exit_key = self.policy.key, max_frames = ?self.max_frames, "entering render loop");
        let mut frames = 0;
        let reason = loop {
            if self.max_frames.is_some_and(|limit| frames >= limit) {
                break ExitReason::FrameLimit;
            }
            if let Some(reason) = self.step(frames, pump, state, target, renderer)? {
                break reason;
            }
            frames += 1;
        };
        debug!(frames, ?reason, "render loop finished");
        Ok(LoopSummary { frames, reason })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graphics::gles::{handles, MockGlesApi};
    use crate::graphics::shader::ShaderSources;
    use crate::state::KeyTransition;
    use pretty_assertions::assert_eq;
    use std::io;
    use std::rc::Rc;
    use wayland_backend::client::WaylandError;

    const ESC: u32 = 1;
    const CLEAR: [f32; 4] = [0.2, 0.3, 0.4, 1.0];

    type Script = Box<dyn FnMut(u64, &mut ClientState) -> Result<usize, RuntimeDispatchError>>;

    /// Runs a scripted closure in place of protocol dispatch.
    struct ScriptedPump {
        script: Script,
        calls: u64,
    }

    impl ScriptedPump {
        fn idle() -> Self {
            Self::new(|_, _| Ok(0))
        }

        fn new(
            script: impl FnMut(u64, &mut ClientState) -> Result<usize, RuntimeDispatchError> + 'static,
        ) -> Self {
            Self {
                script: Box::new(script),
                calls: 0,
            }
        }
    }

    impl EventPump for ScriptedPump {
        fn pump(&mut self, state: &mut ClientState, frame: u64) -> Result<usize, RuntimeDispatchError> {
            self.calls += 1;
            (self.script)(frame, state)
        }
    }

    #[derive(Default)]
    struct RecordingTarget {
        presents: u64,
        resizes: Vec<(i32, i32)>,
        fail_on: Option<u64>,
    }

    impl PresentTarget for RecordingTarget {
        fn present(&mut self) -> Result<(), khronos_egl::Error> {
            if self.fail_on == Some(self.presents) {
                return Err(khronos_egl::Error::BadSurface);
            }
            self.presents += 1;
            Ok(())
        }

        fn resize(&mut self, width: i32, height: i32) {
            self.resizes.push((width, height));
        }
    }

    fn policy() -> ExitPolicy {
        ExitPolicy {
            key: ESC,
            on_close: true,
        }
    }

    /// A GL mock expecting `frames` complete frames.
    fn gl_for_frames(frames: usize) -> MockGlesApi {
        let mut gl = MockGlesApi::new();
        gl.expect_create_program_object()
            .returning(|| Ok(handles::program(5)));
        gl.expect_create_stage()
            .returning(|kind| Ok(handles::stage(kind.gl_enum())));
        gl.expect_compile_stage_source().returning(|_, _| true);
        gl.expect_attach_stage().return_const(());
        gl.expect_delete_stage().return_const(());
        gl.expect_link().return_const(true);
        gl.expect_attribute().returning(|_, _| Some(0));
        gl.expect_upload_quad().returning(|_, _| Ok(handles::quad()));

        gl.expect_clear_frame()
            .withf(|color| *color == CLEAR)
            .times(frames)
            .return_const(());
        gl.expect_bind_program().times(frames).return_const(());
        gl.expect_uniform()
            .times(2 * frames)
            .returning(|_, _| Some(handles::uniform(1)));
        gl.expect_set_vec2().times(2 * frames).return_const(());
        gl.expect_bind_quad().times(frames).return_const(());
        gl.expect_draw_fan()
            .withf(|first, count| (*first, *count) == (0, 4))
            .times(frames)
            .return_const(());

        gl.expect_delete_quad().return_const(());
        gl.expect_delete_program_object().return_const(());
        gl
    }

    fn renderer(gl: MockGlesApi) -> QuadRenderer<MockGlesApi> {
        QuadRenderer::new(Rc::new(gl), &ShaderSources::default(), CLEAR).expect("renderer builds")
    }

    #[test]
    fn three_idle_frames_each_clear_draw_and_present_once() {
        let renderer = renderer(gl_for_frames(3));
        let mut pump = ScriptedPump::idle();
        let mut target = RecordingTarget::default();
        let mut state = ClientState::new(640, 480);

        let summary = RenderLoop::new(policy(), Some(3))
            .run(&mut pump, &mut state, &mut target, &renderer)
            .expect("loop runs");

        assert_eq!(
            summary,
            LoopSummary {
                frames: 3,
                reason: ExitReason::FrameLimit
            }
        );
        assert_eq!(pump.calls, 3);
        assert_eq!(target.presents, 3);
        assert!(target.resizes.is_empty());
    }

    #[test]
    fn exits_on_the_iteration_that_sees_the_release_and_not_before() {
        let renderer = renderer(gl_for_frames(2));
        let mut pump = ScriptedPump::new(|frame, state| {
            match frame {
                1 => state.render.record_key(ESC, KeyTransition::Pressed),
                2 => state.render.record_key(ESC, KeyTransition::Released),
                _ => {}
            }
            Ok(1)
        });
        let mut target = RecordingTarget::default();
        let mut state = ClientState::new(640, 480);

        let summary = RenderLoop::new(policy(), None)
            .run(&mut pump, &mut state, &mut target, &renderer)
            .expect("loop runs");

        assert_eq!(summary.reason, ExitReason::ExitKey);
        assert_eq!(summary.frames, 2);
        assert_eq!(target.presents, 2);
        assert_eq!(pump.calls, 3);
    }

    #[test]
    fn configure_resizes_window_before_drawing() {
        let mut gl = gl_for_frames(1);
        gl.expect_set_viewport()
            .withf(|width, height| (*width, *height) == (800, 600))
            .times(1)
            .return_const(());
        let renderer = renderer(gl);
        let mut pump = ScriptedPump::new(|_, state| {
            state.render.apply_configure(800, 600);
            Ok(1)
        });
        let mut target = RecordingTarget::default();
        let mut state = ClientState::new(640, 480);

        RenderLoop::new(policy(), Some(1))
            .run(&mut pump, &mut state, &mut target, &renderer)
            .expect("loop runs");

        assert_eq!(target.resizes, vec![(800, 600)]);
        assert_eq!(state.render.resolution, glam::Vec2::new(800.0, 600.0));
    }

    #[test]
    fn dispatch_failure_ends_the_loop_with_an_error() {
        let renderer = renderer(gl_for_frames(1));
        let mut pump = ScriptedPump::new(|frame, _| {
            if frame == 1 {
                Err(RuntimeDispatchError::Io {
                    frame,
                    source: WaylandError::Io(io::Error::from(io::ErrorKind::BrokenPipe)),
                })
            } else {
                Ok(0)
            }
        });
        let mut target = RecordingTarget::default();
        let mut state = ClientState::new(640, 480);

        let err = RenderLoop::new(policy(), None)
            .run(&mut pump, &mut state, &mut target, &renderer)
            .unwrap_err();

        assert!(matches!(err, RuntimeDispatchError::Io { frame: 1, .. }));
        assert_eq!(target.presents, 1);
    }

    #[test]
    fn failed_swap_is_fatal() {
        let renderer = renderer(gl_for_frames(1));
        let mut pump = ScriptedPump::idle();
        let mut target = RecordingTarget {
            fail_on: Some(0),
            ..RecordingTarget::default()
        };
        let mut state = ClientState::new(640, 480);

        let err = RenderLoop::new(policy(), Some(5))
            .run(&mut pump, &mut state, &mut target, &renderer)
            .unwrap_err();

        assert_eq!(err.to_string(), "presenting frame 0 failed");
    }

    #[test]
    fn close_request_stops_before_drawing() {
        let renderer = renderer(gl_for_frames(0));
        let mut pump = ScriptedPump::new(|_, state| {
            state.close_requested = true;
            Ok(1)
        });
        let mut target = RecordingTarget::default();
        let mut state = ClientState::new(640, 480);

        let summary = RenderLoop::new(policy(), None)
            .run(&mut pump, &mut state, &mut target, &renderer)
            .expect("loop runs");

        assert_eq!(summary.reason, ExitReason::CloseRequested);
        assert_eq!(summary.frames, 0);
        assert_eq!(target.presents, 0);
    }
}
