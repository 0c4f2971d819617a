//! Error types.
//!
//! Two channels exist and they never mix. [`WebGLError`] values are GL
//! errors: they land in the per-context sticky register and are observed by
//! the host through `getError`. [`UsageError`] values are caller bugs at the
//! host boundary (wrong arity, wrong argument kind) and are returned directly.

use crate::constants;
use thiserror::Error;

/// GL errors reported through the sticky error register.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WebGLError {
    #[error("Invalid enum")]
    InvalidEnum,

    #[error("Invalid value")]
    InvalidValue,

    #[error("Invalid operation")]
    InvalidOperation,

    #[error("Invalid framebuffer operation")]
    InvalidFramebufferOperation,

    #[error("Out of memory")]
    OutOfMemory,

    #[error("Context lost")]
    ContextLost,
}

impl WebGLError {
    /// The GL enum value `getError` reports for this error.
    pub fn code(self) -> u32 {
        match self {
            Self::InvalidEnum => constants::INVALID_ENUM,
            Self::InvalidValue => constants::INVALID_VALUE,
            Self::InvalidOperation => constants::INVALID_OPERATION,
            Self::InvalidFramebufferOperation => constants::INVALID_FRAMEBUFFER_OPERATION,
            Self::OutOfMemory => constants::OUT_OF_MEMORY,
            Self::ContextLost => constants::CONTEXT_LOST_WEBGL,
        }
    }

    /// Map a native error register value. `NO_ERROR` maps to `None`.
    ///
    /// Codes outside the WebGL vocabulary (stack overflow/underflow from
    /// desktop drivers) are reported as `InvalidOperation`.
    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            constants::NO_ERROR => None,
            constants::INVALID_ENUM => Some(Self::InvalidEnum),
            constants::INVALID_VALUE => Some(Self::InvalidValue),
            constants::INVALID_OPERATION => Some(Self::InvalidOperation),
            constants::INVALID_FRAMEBUFFER_OPERATION => Some(Self::InvalidFramebufferOperation),
            constants::OUT_OF_MEMORY => Some(Self::OutOfMemory),
            constants::CONTEXT_LOST_WEBGL => Some(Self::ContextLost),
            _ => Some(Self::InvalidOperation),
        }
    }
}

/// Result type for operations that can raise a GL error.
pub type WebGLResult<T> = Result<T, WebGLError>;

/// Malformed calls at the host boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum UsageError {
    #[error("Unknown method: {0}")]
    UnknownMethod(String),

    #[error("{method}: expected {expected} arguments, got {got}")]
    ArgumentCount {
        method: &'static str,
        expected: &'static str,
        got: usize,
    },

    #[error("{method}: argument {index} is not a valid {expected}")]
    ArgumentType {
        method: &'static str,
        index: usize,
        expected: &'static str,
    },
}
