//! Sticky error register and checked native calls.

use tracing::warn;

use crate::error::{WebGLError, WebGLResult};
use crate::native::NativeGl;

/// Per-context error slot. The first error sticks until `getError` takes it.
///
/// A native error drained while another error is pending is held behind it
/// and surfaces on the following `getError`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorRegister {
    pending: Option<WebGLError>,
    native: Option<WebGLError>,
}

impl ErrorRegister {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error` unless an earlier one is still pending.
    pub fn set(&mut self, error: WebGLError) {
        if self.pending.is_none() {
            self.pending = Some(error);
        }
    }

    /// Keep a native error drained from the driver.
    pub fn set_native(&mut self, error: WebGLError) {
        if self.pending.is_none() {
            self.pending = Some(error);
        } else if self.native.is_none() {
            self.native = Some(error);
        }
    }

    /// Take the pending error. A held native error moves up behind it.
    pub fn take(&mut self) -> Option<WebGLError> {
        let error = self.pending.take();
        self.pending = self.native.take();
        error
    }

    pub fn peek(&self) -> Option<WebGLError> {
        self.pending
    }
}

/// Run a native call that can fail at execution time and report its outcome.
///
/// Errors left in the native register by earlier calls are drained into the
/// sticky register first, so the register read afterwards belongs to this
/// call alone. Callers must only commit shadow state when this returns `Ok`.
pub fn guarded_call<G, F>(gl: &mut G, errors: &mut ErrorRegister, call: F) -> WebGLResult<()>
where
    G: NativeGl,
    F: FnOnce(&mut G),
{
    if let Some(stale) = WebGLError::from_code(gl.get_error()) {
        errors.set_native(stale);
    }

    call(gl);

    let outcome = WebGLError::from_code(gl.get_error());

    match outcome {
        Some(error) => {
            warn!(%error, "native call failed; shadow state left unchanged");
            Err(error)
        }
        None => Ok(()),
    }
}
