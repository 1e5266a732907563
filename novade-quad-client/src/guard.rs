//! Scoped ownership for handles owned by external libraries.
//!
//! Wayland proxies, EGL objects and GL names are plain copyable handles whose
//! lifetime is managed by explicit destroy calls. [`Guard`] pairs such a handle
//! with its release function and runs it on drop. [`TeardownStack`] keeps the
//! guards of a whole bootstrap sequence and releases them in reverse acquisition
//! order, both on normal shutdown and when a later step fails.

use std::fmt;
use std::ops::Deref;

use tracing::debug;

/// Owns `T` and hands it to a release function when dropped.
pub struct Guard<T> {
    label: &'static str,
    value: Option<T>,
    release: Option<Box<dyn FnOnce(T)>>,
}

impl<T> Guard<T> {
    pub fn new(label: &'static str, value: T, release: impl FnOnce(T) + 'static) -> Self {
        Self {
            label,
            value: Some(value),
            release: Some(Box::new(release)),
        }
    }
}

impl<T> Deref for Guard<T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.value.as_ref().expect("guard value is only taken on drop")
    }
}

impl<T> Drop for Guard<T> {
    fn drop(&mut self) {
        if let (Some(value), Some(release)) = (self.value.take(), self.release.take()) {
            debug!(resource = self.label, "releasing");
            release(value);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Guard<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Guard")
            .field("label", &self.label)
            .field("value", &self.value)
            .finish()
    }
}

/// Type-erased view of a guard so differently typed guards share one stack.
trait Releasable {
    fn label(&self) -> &'static str;
}

impl<T> Releasable for Guard<T> {
    fn label(&self) -> &'static str {
        self.label
    }
}

/// Ordered stack of guards, released last-in first-out.
#[derive(Default)]
pub struct TeardownStack {
    guards: Vec<Box<dyn Releasable>>,
}

impl TeardownStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `release` for `value` and returns the value for further use.
    pub fn push<T>(&mut self, label: &'static str, value: T, release: impl FnOnce(T) + 'static) -> T
    where
        T: Clone + 'static,
    {
        debug!(resource = label, "acquired");
        self.guards
            .push(Box::new(Guard::new(label, value.clone(), release)));
        value
    }

    pub fn len(&self) -> usize {
        self.guards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guards.is_empty()
    }

    /// Labels in acquisition order.
    pub fn labels(&self) -> Vec<&'static str> {
        self.guards.iter().map(|guard| guard.label()).collect()
    }

    /// Releases everything now, newest first.
    pub fn unwind(&mut self) {
        while let Some(guard) = self.guards.pop() {
            drop(guard);
        }
    }
}

impl Drop for TeardownStack {
    fn drop(&mut self) {
        self.unwind();
    }
}

impl fmt::Debug for TeardownStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TeardownStack")
            .field("guards", &self.labels())
            .finish()
    }
}
