//! Drawable surface creation and the xdg-shell configure handshake.
//!
//! The surface moves through `Created → RoleAssigned → ConfigurePending →
//! Acknowledged`. Every `xdg_surface.configure` is acknowledged with its own
//! serial, exactly once, in receipt order. Only after the first acknowledge may
//! a buffer be attached; [`Drawable::create`] therefore commits the bare surface
//! and the caller round-trips until [`SurfaceHandshake::is_acknowledged`].

use tracing::{debug, info, trace, warn};
use wayland_client::protocol::{wl_compositor::WlCompositor, wl_surface::WlSurface};
use wayland_client::{delegate_noop, Connection, Dispatch, QueueHandle};
use wayland_protocols::xdg::shell::client::{
    xdg_surface::{self, XdgSurface},
    xdg_toplevel::{self, XdgToplevel},
    xdg_wm_base::{self, XdgWmBase},
};

use crate::guard::TeardownStack;
use crate::state::ClientState;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandshakePhase {
    #[default]
    Created,
    RoleAssigned,
    ConfigurePending,
    Acknowledged,
}

/// Tracks the configure/acknowledge exchange for the one toplevel.
#[derive(Debug, Default)]
pub struct SurfaceHandshake {
    phase: HandshakePhase,
    acknowledged: u64,
    last_serial: Option<u32>,
}

impl SurfaceHandshake {
    pub fn phase(&self) -> HandshakePhase {
        self.phase
    }

    pub fn is_acknowledged(&self) -> bool {
        self.phase == HandshakePhase::Acknowledged
    }

    /// Number of configure events acknowledged so far.
    pub fn acknowledged(&self) -> u64 {
        self.acknowledged
    }

    pub fn last_serial(&self) -> Option<u32> {
        self.last_serial
    }

    pub fn role_assigned(&mut self) {
        self.advance(HandshakePhase::Created, HandshakePhase::RoleAssigned);
    }

    pub fn toplevel_requested(&mut self) {
        self.advance(HandshakePhase::RoleAssigned, HandshakePhase::ConfigurePending);
    }

    /// Acknowledges one configure event through `ack`, unconditionally.
    pub fn acknowledge(&mut self, serial: u32, ack: impl FnOnce(u32)) {
        if self.phase != HandshakePhase::Acknowledged && self.phase != HandshakePhase::ConfigurePending {
            warn!(phase = ?self.phase, serial, "configure received before the toplevel role was requested");
        }
        ack(serial);
        self.acknowledged += 1;
        self.last_serial = Some(serial);
        if self.phase != HandshakePhase::Acknowledged {
            debug!(serial, "first configure acknowledged; surface may now take buffers");
            self.phase = HandshakePhase::Acknowledged;
        }
    }

    fn advance(&mut self, from: HandshakePhase, to: HandshakePhase) {
        if self.phase != from {
            warn!(current = ?self.phase, expected = ?from, next = ?to, "unexpected surface handshake transition");
        }
        self.phase = to;
    }
}

/// The surface and its shell role objects.
#[derive(Debug, Clone)]
pub struct Drawable {
    pub surface: WlSurface,
    pub xdg_surface: XdgSurface,
    pub toplevel: XdgToplevel,
}

impl Drawable {
    /// Creates surface, shell surface and toplevel role, then commits the bare
    /// surface so the compositor sends the initial configure.
    pub fn create(
        compositor: &WlCompositor,
        shell: &XdgWmBase,
        title: &str,
        state: &mut ClientState,
        qh: &QueueHandle<ClientState>,
        stack: &mut TeardownStack,
    ) -> Self {
        let surface = stack.push("wl_surface", compositor.create_surface(qh, ()), |surface| {
            surface.destroy()
        });

        let xdg_surface = stack.push(
            "xdg_surface",
            shell.get_xdg_surface(&surface, qh, ()),
            |xdg_surface| xdg_surface.destroy(),
        );
        state.handshake.role_assigned();

        let toplevel = stack.push("xdg_toplevel", xdg_surface.get_toplevel(qh, ()), |toplevel| {
            toplevel.destroy()
        });
        toplevel.set_title(title.to_owned());
        state.handshake.toplevel_requested();

        surface.commit();
        info!(title, "toplevel surface created, waiting for the first configure");

        Self {
            surface,
            xdg_surface,
            toplevel,
        }
    }
}

impl Dispatch<XdgWmBase, ()> for ClientState {
    fn event(
        _state: &mut Self,
        shell: &XdgWmBase,
        event: xdg_wm_base::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_wm_base::Event::Ping { serial } = event {
            trace!(serial, "ping");
            shell.pong(serial);
        }
    }
}

impl Dispatch<XdgSurface, ()> for ClientState {
    fn event(
        state: &mut Self,
        xdg_surface: &XdgSurface,
        event: xdg_surface::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let xdg_surface::Event::Configure { serial } = event {
            trace!(serial, "xdg_surface configure");
            state
                .handshake
                .acknowledge(serial, |serial| xdg_surface.ack_configure(serial));
        }
    }
}

impl Dispatch<XdgToplevel, ()> for ClientState {
    fn event(
        state: &mut Self,
        _toplevel: &XdgToplevel,
        event: xdg_toplevel::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        match event {
            xdg_toplevel::Event::Configure { width, height, .. } => {
                if state.render.apply_configure(width, height) {
                    debug!(width, height, "toplevel resized by compositor");
                } else {
                    trace!(width, height, "toplevel configure leaves the size to the client");
                }
            }
            xdg_toplevel::Event::Close => {
                info!("compositor asked the toplevel to close");
                state.close_requested = true;
            }
            _ => {}
        }
    }
}

delegate_noop!(ClientState: WlCompositor);
delegate_noop!(ClientState: ignore WlSurface);
