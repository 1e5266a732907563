//! Seat, keyboard, pointer and touch listeners.
//!
//! Only three events touch [`RenderState`](crate::state::RenderState): keyboard
//! `key`, pointer `motion` and touch `motion`. Pointer and touch share one
//! position slot; touch ids and phases are not tracked.

use tracing::{debug, trace, warn};
use wayland_client::protocol::{
    wl_keyboard::{self, WlKeyboard},
    wl_pointer::{self, WlPointer},
    wl_seat::{self, WlSeat},
    wl_touch::{self, WlTouch},
};
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, WEnum};

use crate::guard::TeardownStack;
use crate::state::{ClientState, KeyTransition};

/// `release` requests on keyboard, pointer and touch exist since seat version 3.
const DEVICE_RELEASE_SINCE: u32 = 3;
/// `wl_seat.release` exists since version 5.
const SEAT_RELEASE_SINCE: u32 = 5;

impl Dispatch<WlSeat, ()> for ClientState {
    fn event(
        state: &mut Self,
        seat: &WlSeat,
        event: wl_seat::Event,
        _data: &(),
        _conn: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_seat::Event::Capabilities {
                capabilities: WEnum::Value(capabilities),
            } => {
                debug!(?capabilities, "seat capabilities");
                if capabilities.contains(wl_seat::Capability::Keyboard) && state.devices.keyboard.is_none() {
                    state.devices.keyboard = Some(seat.get_keyboard(qh, ()));
                }
                if capabilities.contains(wl_seat::Capability::Pointer) && state.devices.pointer.is_none() {
                    state.devices.pointer = Some(seat.get_pointer(qh, ()));
                }
                if capabilities.contains(wl_seat::Capability::Touch) && state.devices.touch.is_none() {
                    state.devices.touch = Some(seat.get_touch(qh, ()));
                }
            }
            wl_seat::Event::Capabilities {
                capabilities: WEnum::Unknown(raw),
            } => {
                warn!(raw, "seat advertised unknown capabilities");
            }
            wl_seat::Event::Name { name } => trace!(name = %name, "seat name"),
            _ => {}
        }
    }
}

impl Dispatch<WlKeyboard, ()> for ClientState {
    fn event(
        state: &mut Self,
        _keyboard: &WlKeyboard,
        event: wl_keyboard::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_keyboard::Event::Key {
            key,
            state: key_state,
            ..
        } = event
        {
            let Some(transition) = key_transition(key_state) else {
                trace!(key, state = ?key_state, "ignoring key state");
                return;
            };
            trace!(key, ?transition, "key");
            state.render.record_key(key, transition);
        }
    }
}

/// Press and release count; repeats and unknown states do not.
pub fn key_transition(state: WEnum<wl_keyboard::KeyState>) -> Option<KeyTransition> {
    match state {
        WEnum::Value(wl_keyboard::KeyState::Pressed) => Some(KeyTransition::Pressed),
        WEnum::Value(wl_keyboard::KeyState::Released) => Some(KeyTransition::Released),
        _ => None,
    }
}

impl Dispatch<WlPointer, ()> for ClientState {
    fn event(
        state: &mut Self,
        _pointer: &WlPointer,
        event: wl_pointer::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_pointer::Event::Motion {
            surface_x,
            surface_y,
            ..
        } = event
        {
            state.render.update_position(surface_x, surface_y);
        }
    }
}

impl Dispatch<WlTouch, ()> for ClientState {
    fn event(
        state: &mut Self,
        _touch: &WlTouch,
        event: wl_touch::Event,
        _data: &(),
        _conn: &Connection,
        _qh: &QueueHandle<Self>,
    ) {
        if let wl_touch::Event::Motion { x, y, .. } = event {
            state.render.update_position(x, y);
        }
    }
}

/// Registers release of the seat devices on `stack`.
///
/// Keyboard and pointer must be present; see [`crate::state::InputDevices::require`].
pub fn adopt_devices(
    state: &ClientState,
    stack: &mut TeardownStack,
) -> Result<(), crate::error::ProtocolError> {
    let (keyboard, pointer, touch) = state.devices.require()?;

    stack.push("wl_keyboard", keyboard, |keyboard| {
        if keyboard.version() >= DEVICE_RELEASE_SINCE {
            keyboard.release();
        }
    });
    stack.push("wl_pointer", pointer, |pointer| {
        if pointer.version() >= DEVICE_RELEASE_SINCE {
            pointer.release();
        }
    });
    match touch {
        Some(touch) => {
            stack.push("wl_touch", touch, |touch| {
                if touch.version() >= DEVICE_RELEASE_SINCE {
                    touch.release();
                }
            });
        }
        None => debug!("seat has no touch device"),
    }
    Ok(())
}

/// Registers release of the seat global itself.
pub fn adopt_seat(seat: WlSeat, stack: &mut TeardownStack) -> WlSeat {
    stack.push("wl_seat", seat, |seat| {
        if seat.version() >= SEAT_RELEASE_SINCE {
            seat.release();
        }
    })
}
