//! The three globals the client cannot run without and the bookkeeping that
//! proves all of them were bound.

use wayland_client::protocol::{wl_compositor::WlCompositor, wl_seat::WlSeat};
use wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase;

use crate::error::ProtocolError;

/// A global interface the registry listener binds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredGlobal {
    Compositor,
    Shell,
    Seat,
}

impl RequiredGlobal {
    pub const ALL: [RequiredGlobal; 3] = [Self::Compositor, Self::Shell, Self::Seat];

    pub fn interface(self) -> &'static str {
        match self {
            Self::Compositor => "wl_compositor",
            Self::Shell => "xdg_wm_base",
            Self::Seat => "wl_seat",
        }
    }

    pub fn from_interface(interface: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|global| global.interface() == interface)
    }
}

/// Handles stored by the registry listener as globals are advertised.
#[derive(Debug)]
pub struct GlobalBindings<C, S, T> {
    pub compositor: Option<C>,
    pub shell: Option<S>,
    pub seat: Option<T>,
}

impl<C, S, T> Default for GlobalBindings<C, S, T> {
    fn default() -> Self {
        Self {
            compositor: None,
            shell: None,
            seat: None,
        }
    }
}

/// All three required globals, bound.
#[derive(Debug, Clone)]
pub struct BoundGlobals<C, S, T> {
    pub compositor: C,
    pub shell: S,
    pub seat: T,
}

pub type WaylandGlobals = BoundGlobals<WlCompositor, XdgWmBase, WlSeat>;

impl<C: Clone, S: Clone, T: Clone> GlobalBindings<C, S, T> {
    /// Fails with the first missing global, in [`RequiredGlobal::ALL`] order.
    pub fn resolve(&self) -> Result<BoundGlobals<C, S, T>, ProtocolError> {
        match (&self.compositor, &self.shell, &self.seat) {
            (Some(compositor), Some(shell), Some(seat)) => Ok(BoundGlobals {
                compositor: compositor.clone(),
                shell: shell.clone(),
                seat: seat.clone(),
            }),
            (compositor, shell, _) => {
                let missing = if compositor.is_none() {
                    RequiredGlobal::Compositor
                } else if shell.is_none() {
                    RequiredGlobal::Shell
                } else {
                    RequiredGlobal::Seat
                };
                Err(ProtocolError::MissingGlobal {
                    interface: missing.interface(),
                })
            }
        }
    }
}
