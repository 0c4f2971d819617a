//! In-memory native backend that records every call.
//!
//! `RecordingGl` hands out object names, answers limit queries from a table
//! and keeps a GL-style error register. Allocation-class calls can be told
//! to fail so callers can observe how the layer above reacts. Headless hosts
//! and the tests in this crate drive the context through it.

use std::collections::{HashMap, HashSet};

use tracing::trace;

use crate::constants;
use crate::native::{NativeGl, NativeHandle, NativeImageDesc, NativePixels};

/// Pixel payload as captured by the recorder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedPixels {
    Client(Vec<u8>),
    UnpackBufferOffset(u64),
}

impl From<NativePixels<'_>> for RecordedPixels {
    fn from(pixels: NativePixels<'_>) -> Self {
        match pixels {
            NativePixels::Client(bytes) => Self::Client(bytes.to_vec()),
            NativePixels::UnpackBufferOffset(offset) => Self::UnpackBufferOffset(offset),
        }
    }
}

/// A recorded native call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NativeCall {
    GenTexture(NativeHandle),
    DeleteTexture(NativeHandle),
    GenRenderbuffer(NativeHandle),
    DeleteRenderbuffer(NativeHandle),
    GenFramebuffer(NativeHandle),
    DeleteFramebuffer(NativeHandle),
    GenVertexArray(NativeHandle),
    DeleteVertexArray(NativeHandle),
    ActiveTexture(u32),
    BindTexture {
        target: u32,
        texture: NativeHandle,
    },
    BindRenderbuffer {
        target: u32,
        renderbuffer: NativeHandle,
    },
    BindFramebuffer {
        target: u32,
        framebuffer: NativeHandle,
    },
    BindVertexArray(NativeHandle),
    PixelStore {
        pname: u32,
        param: i32,
    },
    TexImage2D {
        desc: NativeImageDesc,
        pixels: RecordedPixels,
    },
    TexImage3D {
        desc: NativeImageDesc,
        pixels: RecordedPixels,
    },
    TexStorage2D {
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    },
    RenderbufferStorageMultisample {
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    },
    FramebufferTexture2D {
        target: u32,
        attachment: u32,
        textarget: u32,
        texture: NativeHandle,
        level: i32,
    },
    FramebufferRenderbuffer {
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: NativeHandle,
    },
    DrawBuffers(Vec<u32>),
    BlitFramebuffer {
        src: [i32; 4],
        dst: [i32; 4],
        mask: u32,
        filter: u32,
    },
    StencilFuncSeparate {
        face: u32,
        func: u32,
        reference: i32,
        mask: u32,
    },
    StencilMaskSeparate {
        face: u32,
        mask: u32,
    },
}

impl NativeCall {
    /// Whether this call deletes a native object.
    pub fn is_delete(&self) -> bool {
        matches!(
            self,
            Self::DeleteTexture(_)
                | Self::DeleteRenderbuffer(_)
                | Self::DeleteFramebuffer(_)
                | Self::DeleteVertexArray(_)
        )
    }

    /// Whether this call uploads or allocates image storage.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            Self::TexImage2D { .. }
                | Self::TexImage3D { .. }
                | Self::TexStorage2D { .. }
                | Self::RenderbufferStorageMultisample { .. }
        )
    }
}

/// Recording implementation of [`NativeGl`].
#[derive(Debug)]
pub struct RecordingGl {
    calls: Vec<NativeCall>,
    next_name: NativeHandle,
    vertex_arrays: HashMap<NativeHandle, bool>,
    integers: HashMap<u32, i32>,
    extensions: HashSet<String>,
    error: u32,
    fail_next_allocation: Option<u32>,
}

impl RecordingGl {
    /// Create a recorder with conservative WebGL2 minimum-ish limits.
    pub fn new() -> Self {
        let integers = [
            (constants::MAX_TEXTURE_SIZE, 4096),
            (constants::MAX_CUBE_MAP_TEXTURE_SIZE, 4096),
            (constants::MAX_3D_TEXTURE_SIZE, 256),
            (constants::MAX_ARRAY_TEXTURE_LAYERS, 256),
            (constants::MAX_RENDERBUFFER_SIZE, 4096),
            (constants::MAX_SAMPLES, 4),
            (constants::MAX_DRAW_BUFFERS, 4),
            (constants::MAX_COMBINED_TEXTURE_IMAGE_UNITS, 16),
            (constants::PIXEL_UNPACK_BUFFER_BINDING, 0),
        ]
        .into_iter()
        .collect();

        Self {
            calls: Vec::new(),
            next_name: 1,
            vertex_arrays: HashMap::new(),
            integers,
            extensions: HashSet::new(),
            error: constants::NO_ERROR,
            fail_next_allocation: None,
        }
    }

    /// Override an integer query result.
    pub fn with_integer(mut self, pname: u32, value: i32) -> Self {
        self.integers.insert(pname, value);
        self
    }

    /// Advertise a native extension.
    pub fn with_extension(mut self, name: impl Into<String>) -> Self {
        self.extensions.insert(name.into());
        self
    }

    /// Change an integer query result after construction.
    pub fn set_integer(&mut self, pname: u32, value: i32) {
        self.integers.insert(pname, value);
    }

    /// Make the next upload/storage call report `code`.
    pub fn fail_next_allocation(&mut self, code: u32) {
        self.fail_next_allocation = Some(code);
    }

    /// Put `code` into the native error register, as if an earlier call failed.
    pub fn raise_error(&mut self, code: u32) {
        if self.error == constants::NO_ERROR {
            self.error = code;
        }
    }

    /// All calls recorded so far.
    pub fn calls(&self) -> &[NativeCall] {
        &self.calls
    }

    /// Take recorded calls, leaving the log empty.
    pub fn take_calls(&mut self) -> Vec<NativeCall> {
        std::mem::take(&mut self.calls)
    }

    /// Number of recorded calls matching `pred`.
    pub fn count(&self, pred: impl Fn(&NativeCall) -> bool) -> usize {
        self.calls.iter().filter(|c| pred(c)).count()
    }

    fn gen(&mut self) -> NativeHandle {
        let name = self.next_name;
        self.next_name += 1;
        name
    }

    fn record(&mut self, call: NativeCall) {
        trace!(?call, "native call");
        self.calls.push(call);
    }

    fn allocate(&mut self, call: NativeCall) {
        self.record(call);
        if let Some(code) = self.fail_next_allocation.take() {
            self.raise_error(code);
        }
    }
}

impl Default for RecordingGl {
    fn default() -> Self {
        Self::new()
    }
}

impl NativeGl for RecordingGl {
    fn gen_texture(&mut self) -> NativeHandle {
        let name = self.gen();
        self.record(NativeCall::GenTexture(name));
        name
    }

    fn delete_texture(&mut self, texture: NativeHandle) {
        self.record(NativeCall::DeleteTexture(texture));
    }

    fn gen_renderbuffer(&mut self) -> NativeHandle {
        let name = self.gen();
        self.record(NativeCall::GenRenderbuffer(name));
        name
    }

    fn delete_renderbuffer(&mut self, renderbuffer: NativeHandle) {
        self.record(NativeCall::DeleteRenderbuffer(renderbuffer));
    }

    fn gen_framebuffer(&mut self) -> NativeHandle {
        let name = self.gen();
        self.record(NativeCall::GenFramebuffer(name));
        name
    }

    fn delete_framebuffer(&mut self, framebuffer: NativeHandle) {
        self.record(NativeCall::DeleteFramebuffer(framebuffer));
    }

    fn gen_vertex_array(&mut self) -> NativeHandle {
        let name = self.gen();
        self.vertex_arrays.insert(name, false);
        self.record(NativeCall::GenVertexArray(name));
        name
    }

    fn delete_vertex_array(&mut self, array: NativeHandle) {
        self.vertex_arrays.remove(&array);
        self.record(NativeCall::DeleteVertexArray(array));
    }

    fn is_vertex_array(&mut self, array: NativeHandle) -> bool {
        // GL only reports names that have been bound at least once.
        self.vertex_arrays.get(&array).copied().unwrap_or(false)
    }

    fn active_texture(&mut self, unit: u32) {
        self.record(NativeCall::ActiveTexture(unit));
    }

    fn bind_texture(&mut self, target: u32, texture: NativeHandle) {
        self.record(NativeCall::BindTexture { target, texture });
    }

    fn bind_renderbuffer(&mut self, target: u32, renderbuffer: NativeHandle) {
        self.record(NativeCall::BindRenderbuffer {
            target,
            renderbuffer,
        });
    }

    fn bind_framebuffer(&mut self, target: u32, framebuffer: NativeHandle) {
        self.record(NativeCall::BindFramebuffer {
            target,
            framebuffer,
        });
    }

    fn bind_vertex_array(&mut self, array: NativeHandle) {
        if let Some(bound) = self.vertex_arrays.get_mut(&array) {
            *bound = true;
        }
        self.record(NativeCall::BindVertexArray(array));
    }

    fn pixel_storei(&mut self, pname: u32, param: i32) {
        self.record(NativeCall::PixelStore { pname, param });
    }

    fn tex_image_2d(&mut self, desc: &NativeImageDesc, pixels: NativePixels<'_>) {
        self.allocate(NativeCall::TexImage2D {
            desc: *desc,
            pixels: pixels.into(),
        });
    }

    fn tex_image_3d(&mut self, desc: &NativeImageDesc, pixels: NativePixels<'_>) {
        self.allocate(NativeCall::TexImage3D {
            desc: *desc,
            pixels: pixels.into(),
        });
    }

    fn tex_storage_2d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32) {
        self.allocate(NativeCall::TexStorage2D {
            target,
            levels,
            internal_format,
            width,
            height,
        });
    }

    fn renderbuffer_storage_multisample(
        &mut self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        self.allocate(NativeCall::RenderbufferStorageMultisample {
            target,
            samples,
            internal_format,
            width,
            height,
        });
    }

    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        textarget: u32,
        texture: NativeHandle,
        level: i32,
    ) {
        self.record(NativeCall::FramebufferTexture2D {
            target,
            attachment,
            textarget,
            texture,
            level,
        });
    }

    fn framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: NativeHandle,
    ) {
        self.record(NativeCall::FramebufferRenderbuffer {
            target,
            attachment,
            renderbuffer_target,
            renderbuffer,
        });
    }

    fn draw_buffers(&mut self, buffers: &[u32]) {
        self.record(NativeCall::DrawBuffers(buffers.to_vec()));
    }

    fn blit_framebuffer(&mut self, src: [i32; 4], dst: [i32; 4], mask: u32, filter: u32) {
        self.record(NativeCall::BlitFramebuffer {
            src,
            dst,
            mask,
            filter,
        });
    }

    fn stencil_func_separate(&mut self, face: u32, func: u32, reference: i32, mask: u32) {
        self.record(NativeCall::StencilFuncSeparate {
            face,
            func,
            reference,
            mask,
        });
    }

    fn stencil_mask_separate(&mut self, face: u32, mask: u32) {
        self.record(NativeCall::StencilMaskSeparate { face, mask });
    }

    fn get_error(&mut self) -> u32 {
        std::mem::replace(&mut self.error, constants::NO_ERROR)
    }

    fn get_integer(&mut self, pname: u32) -> i32 {
        self.integers.get(&pname).copied().unwrap_or(0)
    }

    fn has_extension(&self, name: &str) -> bool {
        self.extensions.contains(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_unique_and_nonzero() {
        let mut gl = RecordingGl::new();
        let a = gl.gen_texture();
        let b = gl.gen_framebuffer();
        assert_ne!(a, 0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_failed_allocation_sets_error_once() {
        let mut gl = RecordingGl::new();
        gl.fail_next_allocation(constants::OUT_OF_MEMORY);
        gl.tex_storage_2d(constants::TEXTURE_2D, 1, constants::RGBA8, 4, 4);
        assert_eq!(gl.get_error(), constants::OUT_OF_MEMORY);
        assert_eq!(gl.get_error(), constants::NO_ERROR);

        gl.tex_storage_2d(constants::TEXTURE_2D, 1, constants::RGBA8, 4, 4);
        assert_eq!(gl.get_error(), constants::NO_ERROR);
        assert_eq!(gl.count(NativeCall::is_storage), 2);
    }

    #[test]
    fn test_vertex_array_exists_after_first_bind() {
        let mut gl = RecordingGl::new();
        let vao = gl.gen_vertex_array();
        assert!(!gl.is_vertex_array(vao));
        gl.bind_vertex_array(vao);
        assert!(gl.is_vertex_array(vao));
        gl.delete_vertex_array(vao);
        assert!(!gl.is_vertex_array(vao));
    }

    #[test]
    fn test_limits_can_be_overridden() {
        let mut gl = RecordingGl::new().with_integer(constants::MAX_DRAW_BUFFERS, 8);
        assert_eq!(gl.get_integer(constants::MAX_DRAW_BUFFERS), 8);
        assert_eq!(gl.get_integer(0xFFFF), 0);
    }
}
