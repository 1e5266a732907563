//! Connection to the compositor, global discovery and event dispatch.

use std::ffi::c_void;
use std::io::ErrorKind;
use std::os::unix::net::UnixStream;

use tracing::{debug, info, trace};
use wayland_backend::client::WaylandError;
use wayland_client::protocol::wl_registry;
use wayland_client::{Connection, Dispatch, EventQueue, Proxy, QueueHandle};

use crate::config::DispatchMode;
use crate::error::{CallSite, ConnectionError, ProtocolError, RuntimeDispatchError};
use crate::protocol::globals::{RequiredGlobal, WaylandGlobals};
use crate::render_loop::EventPump;
use crate::state::ClientState;

/// The one connection of the process, its event queue and registry.
pub struct Session {
    connection: Connection,
    queue: EventQueue<ClientState>,
    registry: wl_registry::WlRegistry,
    dispatch_mode: DispatchMode,
}

impl Session {
    /// Connects to `$WAYLAND_DISPLAY` and requests the registry.
    pub fn connect(dispatch_mode: DispatchMode) -> Result<Self, ConnectionError> {
        let connection =
            Connection::connect_to_env().map_err(|source| ConnectionError::Connect {
                site: CallSite::here("wl_display_connect"),
                source,
            })?;
        Ok(Self::with_connection(connection, dispatch_mode))
    }

    /// Speaks the protocol over an already connected socket.
    pub fn from_socket(stream: UnixStream, dispatch_mode: DispatchMode) -> Result<Self, ConnectionError> {
        let connection = Connection::from_socket(stream).map_err(|source| ConnectionError::Connect {
            site: CallSite::here("wl_display_connect_to_fd"),
            source,
        })?;
        Ok(Self::with_connection(connection, dispatch_mode))
    }

    fn with_connection(connection: Connection, dispatch_mode: DispatchMode) -> Self {
        let queue = connection.new_event_queue();
        let registry = connection.display().get_registry(&queue.handle(), ());
        info!(registry = %registry.id(), "connected to display server");

        Self {
            connection,
            queue,
            registry,
            dispatch_mode,
        }
    }

    pub fn handle(&self) -> QueueHandle<ClientState> {
        self.queue.handle()
    }

    /// Raw `wl_display*` for EGL's platform display.
    pub fn display_ptr(&self) -> *mut c_void {
        self.connection.backend().display_ptr() as *mut c_void
    }

    /// Blocks until the server has processed every queued request.
    #[track_caller]
    pub fn roundtrip(&mut self, state: &mut ClientState) -> Result<usize, ProtocolError> {
        let site = CallSite::here("wl_display_roundtrip");
        self.queue
            .roundtrip(state)
            .map_err(|source| ProtocolError::Roundtrip { site, source })
    }

    /// Waits for the globals advertised on connect and checks all three were bound.
    pub fn bind_globals(&mut self, state: &mut ClientState) -> Result<WaylandGlobals, ProtocolError> {
        self.roundtrip(state)?;
        let globals = state.bindings.resolve()?;
        info!(
            compositor = globals.compositor.version(),
            shell = globals.shell.version(),
            seat = globals.seat.version(),
            "required globals bound"
        );
        Ok(globals)
    }

    /// Round-trips until the first `xdg_surface.configure` has been acknowledged.
    pub fn await_configure(&mut self, state: &mut ClientState) -> Result<(), ProtocolError> {
        while !state.handshake.is_acknowledged() {
            self.roundtrip(state)?;
        }
        debug!(
            serial = state.handshake.last_serial(),
            "surface configured"
        );
        Ok(())
    }

    fn read_pending(&mut self, frame: u64) -> Result<(), RuntimeDispatchError> {
        self.connection
            .flush()
            .map_err(|source| RuntimeDispatchError::Io { frame, source })?;
        if let Some(guard) = self.queue.prepare_read() {
            match guard.read() {
                Ok(read) => trace!(read, "read events"),
                Err(WaylandError::Io(ref err)) if err.kind() == ErrorKind::WouldBlock => {}
                Err(source) => return Err(RuntimeDispatchError::Io { frame, source }),
            }
        }
        Ok(())
    }
}

impl EventPump for Session {
    fn pump(&mut self, state: &mut ClientState, frame: u64) -> Result<usize, RuntimeDispatchError> {
        match self.dispatch_mode {
            DispatchMode::Blocking => self
                .queue
                .blocking_dispatch(state)
                .map_err(|source| RuntimeDispatchError::Dispatch { frame, source }),
            DispatchMode::Pending => {
                self.read_pending(frame)?;
                self.queue
                    .dispatch_pending(state)
                    .map_err(|source| RuntimeDispatchError::Dispatch { frame, source })
            }
        }
    }
}

impl Dispatch<wl_registry::WlRegistry, ()> for ClientState {
    fn event(
        state: &mut Self,
        registry: &wl_registry::WlRegistry,
        event: wl_registry::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => {
                let Some(global) = RequiredGlobal::from_interface(&interface) else {
                    trace!(name, interface = %interface, version, "skipping global");
                    return;
                };
                debug!(name, interface = %interface, version, "binding global");
                match global {
                    RequiredGlobal::Compositor => {
                        let version = version.min(
                            wayland_client::protocol::wl_compositor::WlCompositor::interface().version,
                        );
                        state.bindings.compositor = Some(registry.bind(name, version, qh, ()));
                    }
                    RequiredGlobal::Shell => {
                        let version = version.min(
                            wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase::interface()
                                .version,
                        );
                        state.bindings.shell = Some(registry.bind(name, version, qh, ()));
                    }
                    RequiredGlobal::Seat => {
                        let version = version
                            .min(wayland_client::protocol::wl_seat::WlSeat::interface().version);
                        state.bindings.seat = Some(registry.bind(name, version, qh, ()));
                    }
                }
            }
            wl_registry::Event::GlobalRemove { name } => {
                trace!(name, "global removed");
            }
            _ => {}
        }
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        debug!(registry = %self.registry.id(), "disconnecting from display server");
        // Push out destroy requests queued by the teardown stack.
        let _ = self.connection.flush();
    }
}
