//! Default values referenced by `serde`'s `default` attributes.

/// `KEY_ESC` in `linux/input-event-codes.h`.
pub const KEY_ESC: u32 = 1;

pub(super) fn default_window_width() -> u32 {
    640
}

pub(super) fn default_window_height() -> u32 {
    480
}

pub(super) fn default_window_title() -> String {
    "NovaDE Quad".to_string()
}

/// Opaque black.
pub(super) fn default_clear_color() -> [f32; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

/// Vsync.
pub(super) fn default_swap_interval() -> i32 {
    1
}

pub(super) fn default_exit_key() -> u32 {
    KEY_ESC
}

pub(super) fn default_true() -> bool {
    true
}

pub(super) fn default_log_level() -> String {
    "info".to_string()
}

pub(super) fn default_log_format() -> String {
    "text".to_string()
}
