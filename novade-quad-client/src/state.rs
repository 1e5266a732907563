//! State shared between protocol callbacks and the frame loop.
//!
//! Everything here lives on the single render thread. Callbacks run inline in
//! the dispatch call and write [`RenderState`]; the frame loop reads it right
//! after dispatch returns, so no synchronization is involved.

use glam::Vec2;
use wayland_client::protocol::{
    wl_compositor::WlCompositor, wl_keyboard::WlKeyboard, wl_pointer::WlPointer, wl_seat::WlSeat,
    wl_touch::WlTouch,
};
use wayland_protocols::xdg::shell::client::xdg_wm_base::XdgWmBase;

use crate::error::ProtocolError;
use crate::protocol::globals::GlobalBindings;
use crate::protocol::surface::SurfaceHandshake;

/// Whether a key went down or up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTransition {
    Released,
    Pressed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyEvent {
    /// Linux evdev keycode as delivered by `wl_keyboard.key`.
    pub code: u32,
    pub transition: KeyTransition,
}

/// Values the shader reads every frame.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderState {
    pub resolution: Vec2,
    pub pointer: Vec2,
    pub last_key: Option<KeyEvent>,
    pending_resize: Option<(i32, i32)>,
}

impl RenderState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            resolution: Vec2::new(width as f32, height as f32),
            pointer: Vec2::ZERO,
            last_key: None,
            pending_resize: None,
        }
    }

    /// Applies an `xdg_toplevel.configure` size.
    ///
    /// A zero dimension means the compositor leaves the size to the client and
    /// is ignored. Returns whether the resolution changed.
    pub fn apply_configure(&mut self, width: i32, height: i32) -> bool {
        if width <= 0 || height <= 0 {
            return false;
        }
        self.resolution = Vec2::new(width as f32, height as f32);
        self.pending_resize = Some((width, height));
        true
    }

    /// Native-window resize requested by the last configure, if not yet applied.
    pub fn take_pending_resize(&mut self) -> Option<(i32, i32)> {
        self.pending_resize.take()
    }

    /// Records a pointer or touch position in surface coordinates.
    ///
    /// Wayland's origin is top-left, GL's is bottom-left.
    pub fn update_position(&mut self, x: f64, y: f64) {
        self.pointer = Vec2::new(x as f32, self.resolution.y - y as f32);
    }

    pub fn record_key(&mut self, code: u32, transition: KeyTransition) {
        self.last_key = Some(KeyEvent { code, transition });
    }
}

/// When the frame loop should stop on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitPolicy {
    pub key: u32,
    pub on_close: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitReason {
    ExitKey,
    CloseRequested,
    FrameLimit,
}

/// Seat devices obtained from the capabilities event.
#[derive(Debug, Default)]
pub struct InputDevices {
    pub keyboard: Option<WlKeyboard>,
    pub pointer: Option<WlPointer>,
    pub touch: Option<WlTouch>,
}

impl InputDevices {
    /// Keyboard and pointer are mandatory; touch is optional.
    pub fn require(&self) -> Result<(WlKeyboard, WlPointer, Option<WlTouch>), ProtocolError> {
        let keyboard = self
            .keyboard
            .clone()
            .ok_or(ProtocolError::MissingSeatDevice { device: "keyboard" })?;
        let pointer = self
            .pointer
            .clone()
            .ok_or(ProtocolError::MissingSeatDevice { device: "pointer" })?;
        Ok((keyboard, pointer, self.touch.clone()))
    }
}

/// The `Dispatch` target for every protocol object the client owns.
#[derive(Debug)]
pub struct ClientState {
    pub render: RenderState,
    pub bindings: GlobalBindings<WlCompositor, XdgWmBase, WlSeat>,
    pub handshake: SurfaceHandshake,
    pub devices: InputDevices,
    pub close_requested: bool,
}

impl ClientState {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            render: RenderState::new(width, height),
            bindings: GlobalBindings::default(),
            handshake: SurfaceHandshake::default(),
            devices: InputDevices::default(),
            close_requested: false,
        }
    }

    /// Exit check run once per iteration, right after dispatch.
    ///
    /// Only the most recent key event counts, and only its release.
    pub fn exit_reason(&self, policy: &ExitPolicy) -> Option<ExitReason> {
        let exit_key = KeyEvent {
            code: policy.key,
            transition: KeyTransition::Released,
        };
        if self.render.last_key == Some(exit_key) {
            return Some(ExitReason::ExitKey);
        }
        if policy.on_close && self.close_requested {
            return Some(ExitReason::CloseRequested);
        }
        None
    }
}
