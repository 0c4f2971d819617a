//! The native GL call surface.
//!
//! The context drives an implementation of [`NativeGl`] and never talks to a
//! driver any other way. Loading entry points and dispatch setup live with
//! whoever implements the trait. Calls are blocking and run on the caller's
//! thread; none of them validate their arguments.

/// Raw native object name (`GLuint`). Zero is the default object.
pub type NativeHandle = u32;

/// Pixel payload handed to a native texture upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NativePixels<'a> {
    /// Client memory, already unpacked (flipped / premultiplied).
    Client(&'a [u8]),
    /// Byte offset into the buffer bound to `PIXEL_UNPACK_BUFFER`.
    UnpackBufferOffset(u64),
}

/// Parameters of a 2D or 3D image upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NativeImageDesc {
    pub target: u32,
    pub level: i32,
    pub internal_format: u32,
    pub width: i32,
    pub height: i32,
    pub depth: i32,
    pub format: u32,
    pub ty: u32,
}

/// Native GL entry points used by the WebGL2 layer.
pub trait NativeGl {
    // Object names
    fn gen_texture(&mut self) -> NativeHandle;
    fn delete_texture(&mut self, texture: NativeHandle);
    fn gen_renderbuffer(&mut self) -> NativeHandle;
    fn delete_renderbuffer(&mut self, renderbuffer: NativeHandle);
    fn gen_framebuffer(&mut self) -> NativeHandle;
    fn delete_framebuffer(&mut self, framebuffer: NativeHandle);
    fn gen_vertex_array(&mut self) -> NativeHandle;
    fn delete_vertex_array(&mut self, array: NativeHandle);
    fn is_vertex_array(&mut self, array: NativeHandle) -> bool;

    // Bindings
    fn active_texture(&mut self, unit: u32);
    fn bind_texture(&mut self, target: u32, texture: NativeHandle);
    fn bind_renderbuffer(&mut self, target: u32, renderbuffer: NativeHandle);
    fn bind_framebuffer(&mut self, target: u32, framebuffer: NativeHandle);
    fn bind_vertex_array(&mut self, array: NativeHandle);

    // Pixel store
    fn pixel_storei(&mut self, pname: u32, param: i32);

    // Storage
    fn tex_image_2d(&mut self, desc: &NativeImageDesc, pixels: NativePixels<'_>);
    fn tex_image_3d(&mut self, desc: &NativeImageDesc, pixels: NativePixels<'_>);
    fn tex_storage_2d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32);
    fn renderbuffer_storage_multisample(
        &mut self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    );

    // Framebuffer attachments and operations
    fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        textarget: u32,
        texture: NativeHandle,
        level: i32,
    );
    fn framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: NativeHandle,
    );
    fn draw_buffers(&mut self, buffers: &[u32]);
    fn blit_framebuffer(&mut self, src: [i32; 4], dst: [i32; 4], mask: u32, filter: u32);

    // Stencil state
    fn stencil_func_separate(&mut self, face: u32, func: u32, reference: i32, mask: u32);
    fn stencil_mask_separate(&mut self, face: u32, mask: u32);

    // Queries
    fn get_error(&mut self) -> u32;
    fn get_integer(&mut self, pname: u32) -> i32;
    fn has_extension(&self, name: &str) -> bool;
}
