//! EGL bootstrap on top of the Wayland connection.
//!
//! Every object is registered on the caller's [`TeardownStack`] right after it
//! is created, so a failure at any later step releases exactly what exists.

use std::ffi::c_void;
use std::ptr;
use std::rc::Rc;

use khronos_egl as egl;
use tracing::{debug, info};
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::Proxy;
use wayland_egl::WlEglSurface;

use crate::error::{CallSite, GraphicsInitError};
use crate::guard::TeardownStack;
use crate::render_loop::PresentTarget;

type Egl = egl::Instance<egl::Static>;

/// 8-bit RGBA, window-capable, ES3-renderable.
pub const CONFIG_ATTRIBUTES: [egl::Int; 13] = [
    egl::RED_SIZE,
    8,
    egl::GREEN_SIZE,
    8,
    egl::BLUE_SIZE,
    8,
    egl::ALPHA_SIZE,
    8,
    egl::SURFACE_TYPE,
    egl::WINDOW_BIT,
    egl::RENDERABLE_TYPE,
    egl::OPENGL_ES3_BIT,
    egl::NONE,
];

pub const CONTEXT_ATTRIBUTES: [egl::Int; 3] = [egl::CONTEXT_CLIENT_VERSION, 3, egl::NONE];

fn instance() -> Egl {
    egl::Instance::new(egl::Static)
}

trait EglResultExt<T> {
    fn at(self, call: &'static str) -> Result<T, GraphicsInitError>;
}

impl<T> EglResultExt<T> for Result<T, egl::Error> {
    #[track_caller]
    fn at(self, call: &'static str) -> Result<T, GraphicsInitError> {
        let site = CallSite::here(call);
        self.map_err(|source| GraphicsInitError::Egl { site, source })
    }
}

/// A current ES3 context drawing into the toplevel's surface.
pub struct GraphicsContext {
    egl: Egl,
    display: egl::Display,
    surface: egl::Surface,
    window: Rc<WlEglSurface>,
    gl: Rc<glow::Context>,
}

impl GraphicsContext {
    /// Brings up EGL for `surface` at `width`×`height`.
    ///
    /// # Safety
    ///
    /// `wl_display` must be the `wl_display*` of the live connection that owns
    /// `surface`, and that connection must outlive every guard pushed here.
    pub unsafe fn bootstrap(
        wl_display: *mut c_void,
        surface: &WlSurface,
        width: i32,
        height: i32,
        swap_interval: i32,
        stack: &mut TeardownStack,
    ) -> Result<Self, GraphicsInitError> {
        let egl = instance();

        let display = egl
            .get_display(wl_display as egl::NativeDisplayType)
            .ok_or(GraphicsInitError::NoDisplay {
                site: CallSite::here("eglGetDisplay"),
            })?;

        let (major, minor) = egl.initialize(display).at("eglInitialize")?;
        stack.push("egl_display", display, |display| {
            let _ = instance().terminate(display);
        });
        info!(major, minor, "EGL initialized");

        egl.bind_api(egl::OPENGL_ES_API).at("eglBindAPI")?;

        let config = egl
            .choose_first_config(display, &CONFIG_ATTRIBUTES)
            .at("eglChooseConfig")?
            .ok_or(GraphicsInitError::NoMatchingConfig {
                site: CallSite::here("eglChooseConfig"),
            })?;

        let context = egl
            .create_context(display, config, None, &CONTEXT_ATTRIBUTES)
            .at("eglCreateContext")?;
        stack.push("egl_context", context, move |context| {
            let _ = instance().destroy_context(display, context);
        });

        let window = WlEglSurface::new(surface.id(), width, height).map_err(|err| {
            GraphicsInitError::NativeWindow {
                site: CallSite::here("wl_egl_window_create"),
                reason: format!("{err:?}"),
            }
        })?;
        let window = stack.push("wl_egl_window", Rc::new(window), drop);

        let egl_surface = egl
            .create_window_surface(display, config, window.ptr() as egl::NativeWindowType, None)
            .at("eglCreateWindowSurface")?;
        stack.push("egl_surface", egl_surface, move |egl_surface| {
            let _ = instance().destroy_surface(display, egl_surface);
        });

        egl.make_current(display, Some(egl_surface), Some(egl_surface), Some(context))
            .at("eglMakeCurrent")?;
        stack.push("egl_current", display, |display| {
            let _ = instance().make_current(display, None, None, None);
        });

        egl.swap_interval(display, swap_interval)
            .at("eglSwapInterval")?;

        let gl = glow::Context::from_loader_function(|name| {
            egl.get_proc_address(name)
                .map_or(ptr::null(), |function| function as *const c_void)
        });
        debug!(width, height, swap_interval, "EGL window surface current");

        Ok(Self {
            egl,
            display,
            surface: egl_surface,
            window,
            gl: Rc::new(gl),
        })
    }

    /// GL entry points bound to this context.
    pub fn gl(&self) -> Rc<glow::Context> {
        Rc::clone(&self.gl)
    }
}

impl PresentTarget for GraphicsContext {
    fn present(&mut self) -> Result<(), egl::Error> {
        self.egl.swap_buffers(self.display, self.surface)
    }

    fn resize(&mut self, width: i32, height: i32) {
        debug!(width, height, "resizing native window");
        self.window.resize(width, height, 0, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attribute(list: &[egl::Int], key: egl::Int) -> Option<egl::Int> {
        list.chunks(2)
            .find(|pair| pair[0] == key)
            .and_then(|pair| pair.get(1).copied())
    }

    #[test]
    fn config_requests_8_bit_rgba() {
        for channel in [egl::RED_SIZE, egl::GREEN_SIZE, egl::BLUE_SIZE, egl::ALPHA_SIZE] {
            assert_eq!(attribute(&CONFIG_ATTRIBUTES, channel), Some(8));
        }
    }

    #[test]
    fn config_requests_a_window_capable_es3_surface() {
        assert_eq!(attribute(&CONFIG_ATTRIBUTES, egl::SURFACE_TYPE), Some(egl::WINDOW_BIT));
        assert_eq!(
            attribute(&CONFIG_ATTRIBUTES, egl::RENDERABLE_TYPE),
            Some(egl::OPENGL_ES3_BIT)
        );
        assert_eq!(CONFIG_ATTRIBUTES.last(), Some(&egl::NONE));
    }

    #[test]
    fn context_requests_client_version_3() {
        assert_eq!(attribute(&CONTEXT_ATTRIBUTES, egl::CONTEXT_CLIENT_VERSION), Some(3));
        assert_eq!(CONTEXT_ATTRIBUTES.last(), Some(&egl::NONE));
    }

    #[test]
    fn egl_failures_name_the_call() {
        let err = Err::<(), _>(egl::Error::BadConfig).at("eglCreateContext").unwrap_err();
        assert!(err.to_string().starts_with("eglCreateContext ("));
    }
}
