//! NovaDE quad client.
//!
//! A Wayland client that binds `wl_compositor`, `xdg_wm_base` and `wl_seat`,
//! negotiates an xdg toplevel, brings up an OpenGL ES 3 context through EGL and
//! renders a full-window quad whose fragment shader follows the pointer. The
//! release of the exit key ends the program.
//!
//! Bootstrap order is connection, globals, surface handshake, input devices,
//! EGL, shader program, frame loop; see [`client::QuadClient`].

pub mod client;
pub mod config;
pub mod error;
pub mod graphics;
pub mod guard;
pub mod logging;
pub mod protocol;
pub mod render_loop;
pub mod state;

pub use client::QuadClient;
pub use config::{ConfigLoader, QuadConfig};
pub use error::{ClientError, Result};
pub use render_loop::{EventPump, LoopSummary, PresentTarget, RenderLoop};
pub use state::{ClientState, ExitPolicy, ExitReason, KeyTransition, RenderState};
