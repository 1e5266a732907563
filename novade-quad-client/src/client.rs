//! Bootstrap sequence and ownership of everything the client holds.

use tracing::info;
use wayland_client::Proxy;

use crate::config::QuadConfig;
use crate::error::{ProtocolError, Result};
use crate::graphics::{GraphicsContext, QuadRenderer};
use crate::guard::TeardownStack;
use crate::protocol::input::{adopt_devices, adopt_seat};
use crate::protocol::{Drawable, Session};
use crate::render_loop::{LoopSummary, RenderLoop};
use crate::state::{ClientState, ExitPolicy};

/// A fully bootstrapped client, ready to run its frame loop.
///
/// Fields drop in declaration order: GL objects first, then the EGL context,
/// then every guarded protocol and EGL handle in reverse acquisition order, and
/// the connection last.
pub struct QuadClient {
    renderer: QuadRenderer<glow::Context>,
    graphics: GraphicsContext,
    stack: TeardownStack,
    state: ClientState,
    session: Session,
    policy: ExitPolicy,
    max_frames: Option<u64>,
}

/// Protocol half of the bootstrap: binds the globals, creates the toplevel,
/// waits for its first configure and adopts the seat devices.
///
/// Nothing is created on the compositor until all three globals are bound.
pub fn negotiate_surface(
    session: &mut Session,
    state: &mut ClientState,
    title: &str,
    stack: &mut TeardownStack,
) -> Result<Drawable, ProtocolError> {
    let qh = session.handle();
    let globals = session.bind_globals(state)?;
    let shell = stack.push("xdg_wm_base", globals.shell.clone(), |shell| shell.destroy());
    adopt_seat(globals.seat.clone(), stack);

    let drawable = Drawable::create(&globals.compositor, &shell, title, state, &qh, stack);
    session.await_configure(state)?;
    adopt_devices(state, stack)?;
    Ok(drawable)
}

impl QuadClient {
    /// Connects, negotiates the surface and brings up rendering.
    ///
    /// Any failure releases what was acquired so far and names the failing step.
    pub fn bootstrap(config: &QuadConfig) -> Result<Self> {
        let session = Session::connect(config.render.dispatch)?;
        Self::bootstrap_with(session, config)
    }

    /// [`bootstrap`](Self::bootstrap) over an already established session.
    pub fn bootstrap_with(mut session: Session, config: &QuadConfig) -> Result<Self> {
        let mut state = ClientState::new(config.window.width, config.window.height);
        let mut stack = TeardownStack::new();

        let drawable =
            negotiate_surface(&mut session, &mut state, &config.window.title, &mut stack)?;

        // Validated to fit an i32 by the config loader.
        let width = config.window.width as i32;
        let height = config.window.height as i32;
        // SAFETY: the pointer comes from `session`. On failure the locals,
        // `stack` included, drop before the parameter; on success the struct
        // field order keeps the session last.
        let graphics = unsafe {
            GraphicsContext::bootstrap(
                session.display_ptr(),
                &drawable.surface,
                width,
                height,
                config.render.swap_interval,
                &mut stack,
            )?
        };

        let sources = config.render.shader_sources()?;
        let renderer = QuadRenderer::new(graphics.gl(), &sources, config.render.clear_color)?;
        renderer.resize(width, height);

        info!(
            surface = %drawable.surface.id(),
            resources = stack.len(),
            "bootstrap complete"
        );

        Ok(Self {
            renderer,
            graphics,
            stack,
            state,
            session,
            policy: ExitPolicy {
                key: config.input.exit_key,
                on_close: config.input.exit_on_close,
            },
            max_frames: config.render.max_frames,
        })
    }

    /// Runs the frame loop until an exit condition or a fatal error.
    pub fn run(mut self) -> Result<LoopSummary> {
        let summary = RenderLoop::new(self.policy, self.max_frames).run(
            &mut self.session,
            &mut self.state,
            &mut self.graphics,
            &self.renderer,
        )?;
        info!(
            frames = summary.frames,
            reason = ?summary.reason,
            resources = self.stack.len(),
            "shutting down"
        );
        Ok(summary)
    }
}
