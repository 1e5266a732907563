//! Wayland protocol plumbing: connection, globals, the toplevel surface and
//! seat input. All `Dispatch` impls target [`crate::state::ClientState`].

pub mod globals;
pub mod input;
pub mod session;
pub mod surface;

pub use globals::{BoundGlobals, GlobalBindings, RequiredGlobal, WaylandGlobals};
pub use session::Session;
pub use surface::{Drawable, HandshakePhase, SurfaceHandshake};
