//! # RustKit WebGL2
//!
//! WebGL2 validation and object-lifetime layer for the RustKit browser engine.
//!
//! ## Features
//!
//! - **Validation**: enum, format/type and dimension checks the driver skips
//! - **Object lifetimes**: reference-counted deferred deletion of textures,
//!   renderbuffers, framebuffers and vertex arrays
//! - **Sticky errors**: `getError` semantics on top of the native error register
//! - **Pixel unpacking**: `UNPACK_FLIP_Y_WEBGL` and
//!   `UNPACK_PREMULTIPLY_ALPHA_WEBGL` applied on the CPU before uploads
//! - **Framebuffers**: attachment tracking and completeness
//!
//! ## Architecture
//!
//! [`WebGL2RenderingContext`] owns an implementation of [`NativeGl`] and an
//! [`ObjectRegistry`]. Every call is validated against shadow state first;
//! calls that allocate storage go through [`sticky::guarded_call`] so shadow
//! state is only committed when the driver accepted the call. Script hosts
//! call in through [`WebGL2RenderingContext::invoke`].
//!
//! [`RecordingGl`] is an in-memory native backend for headless use and tests.

pub mod config;
pub mod constants;
pub mod context;
pub mod error;
pub mod formats;
pub mod framebuffer;
pub mod host;
pub mod native;
pub mod object;
pub mod pixels;
pub mod recording;
pub mod registry;
pub mod sticky;

pub use config::{ContextAttributes, ContextLimits};
pub use context::{ImageSource, TexImageSource, WebGL2RenderingContext};
pub use error::{UsageError, WebGLError, WebGLResult};
pub use framebuffer::{AttachedImage, Attachment, AttachmentPoint, FramebufferData};
pub use host::HostValue;
pub use native::{NativeGl, NativeHandle, NativeImageDesc, NativePixels};
pub use object::{
    Attachable, Bindable, ContextId, Deletable, GLObject, LifetimeState, ObjectHandle, ObjectId, ObjectKind,
    WebGLFramebuffer, WebGLRenderbuffer, WebGLTexture, WebGLVertexArrayObject,
};
pub use pixels::{unpack_pixels, UnpackOptions};
pub use recording::{NativeCall, RecordedPixels, RecordingGl};
pub use registry::{ObjectRecord, ObjectRegistry};
