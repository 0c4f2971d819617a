//! Texture objects, bindings and uploads.

use std::borrow::Cow;

use tracing::{debug, trace};

use super::{binding_target, is_cube_face, WebGL2RenderingContext};
use crate::constants;
use crate::error::{WebGLError, WebGLResult};
use crate::formats;
use crate::framebuffer::refresh_attachments;
use crate::native::{NativeGl, NativeImageDesc, NativePixels};
use crate::object::{LevelInfo, LifetimeState, ObjectData, ObjectId, ObjectKind, TextureData, WebGLTexture};
use crate::pixels::unpack_pixels;
use crate::sticky::guarded_call;

/// A decoded host image (`ImageData`, `HTMLImageElement`, ...).
///
/// Pixels are already converted to the upload's format and type, with rows
/// tightly packed. `UNPACK_ALIGNMENT` does not apply to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Where a `texImage*` call takes its pixels from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TexImageSource<'a> {
    /// Client memory laid out per the unpack state; `None` zero-fills.
    Pixels(Option<&'a [u8]>),
    /// A decoded host image.
    Image(&'a ImageSource),
    /// Byte offset into the bound `PIXEL_UNPACK_BUFFER`.
    UnpackOffset(u64),
}

/// One `texImage2D`/`texImage3D` request.
struct ImageUpload<'a> {
    three_d: bool,
    target: u32,
    level: i32,
    internal_format: u32,
    width: i32,
    height: i32,
    depth: i32,
    border: i32,
    format: u32,
    ty: u32,
    source: TexImageSource<'a>,
}

/// Pixels ready for the native call.
enum PreparedPixels<'a> {
    Client { bytes: Cow<'a, [u8]>, image: bool },
    Offset(u64),
}

impl<G: NativeGl> WebGL2RenderingContext<G> {
    // ==================== Objects ====================

    pub fn create_texture(&mut self) -> WebGLTexture {
        let native = self.gl.gen_texture();
        WebGLTexture::from_handle(self.registry.register(ObjectKind::Texture, native))
    }

    pub fn is_texture(&self, texture: Option<WebGLTexture>) -> bool {
        self.is_object(texture.as_ref())
    }

    /// Bind `texture` to `target` of the active unit.
    ///
    /// A texture's target is fixed by its first bind.
    pub fn bind_texture(&mut self, target: u32, texture: Option<WebGLTexture>) {
        let result = self.try_bind_texture(target, texture);
        self.report(result);
    }

    fn try_bind_texture(&mut self, target: u32, texture: Option<WebGLTexture>) -> WebGLResult<()> {
        if !matches!(
            target,
            constants::TEXTURE_2D
                | constants::TEXTURE_CUBE_MAP
                | constants::TEXTURE_3D
                | constants::TEXTURE_2D_ARRAY
        ) {
            return Err(WebGLError::InvalidEnum);
        }

        let id = texture.map(|t| self.resolve_live(&t)).transpose()?;
        if let Some(data) = id.and_then(|id| self.texture_data_mut(id)) {
            match data.target {
                Some(bound) if bound != target => return Err(WebGLError::InvalidOperation),
                _ => data.target = Some(target),
            }
        }

        let native = self.native_of(id);
        self.gl.bind_texture(target, native);
        let unit = self.bindings.active_unit;
        if let Some(slot) = self
            .bindings
            .texture_units
            .get_mut(unit)
            .and_then(|unit| unit.slot_mut(target))
        {
            self.registry.bind(slot, id, &mut self.gl);
        }
        trace!(target, native, unit, "bound texture");
        Ok(())
    }

    pub fn active_texture(&mut self, texture: u32) {
        let unit = texture
            .checked_sub(constants::TEXTURE0)
            .filter(|unit| *unit < self.limits.max_texture_units);
        match unit {
            Some(unit) => {
                self.bindings.active_unit = unit as usize;
                self.gl.active_texture(texture);
            }
            None => self.report(Err(WebGLError::InvalidEnum)),
        }
    }

    /// Request deletion. The texture is unbound from every unit and detached
    /// from the bound framebuffers; other attachments keep it alive.
    pub fn delete_texture(&mut self, texture: Option<WebGLTexture>) {
        let Some(texture) = texture else {
            return;
        };
        let result = self.resolve(&texture).map(|id| {
            if self.registry.state(id) == Some(LifetimeState::Live) {
                self.unbind_texture_everywhere(id);
                self.detach_from_bound_framebuffers(id);
                self.registry.request_delete(id, &mut self.gl);
            }
        });
        self.report(result);
    }

    fn unbind_texture_everywhere(&mut self, id: ObjectId) {
        let active = self.bindings.active_unit;
        let mut current = active;
        for (index, unit) in self.bindings.texture_units.iter_mut().enumerate() {
            for (target, slot) in unit.slots_mut() {
                if *slot != Some(id) {
                    continue;
                }
                if index != current {
                    self.gl.active_texture(constants::TEXTURE0 + index as u32);
                    current = index;
                }
                self.gl.bind_texture(target, 0);
                self.registry.bind(slot, None, &mut self.gl);
            }
        }
        if current != active {
            self.gl.active_texture(constants::TEXTURE0 + active as u32);
        }
    }

    fn bound_texture(&self, target: u32) -> Option<ObjectId> {
        self.bindings
            .texture_units
            .get(self.bindings.active_unit)
            .and_then(|unit| unit.slot(target))
            .flatten()
    }

    pub(crate) fn texture_data(&self, id: ObjectId) -> Option<&TextureData> {
        match self.registry.get(id).map(|record| &record.data) {
            Some(ObjectData::Texture(data)) => Some(data),
            _ => None,
        }
    }

    fn texture_data_mut(&mut self, id: ObjectId) -> Option<&mut TextureData> {
        match self.registry.get_mut(id).map(|record| &mut record.data) {
            Some(ObjectData::Texture(data)) => Some(data),
            _ => None,
        }
    }

    /// Shadow state of `texture`, if it belongs to this context.
    pub fn texture_info(&self, texture: &WebGLTexture) -> Option<&TextureData> {
        self.resolve(texture).ok().and_then(|id| self.texture_data(id))
    }

    // ==================== Uploads ====================

    /// `texImage2D` with explicit dimensions.
    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_2d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        border: i32,
        format: u32,
        ty: u32,
        source: TexImageSource<'_>,
    ) {
        let result = self.try_tex_image(ImageUpload {
            three_d: false,
            target,
            level,
            internal_format,
            width,
            height,
            depth: 1,
            border,
            format,
            ty,
            source,
        });
        self.report(result);
    }

    /// `texImage2D` from a host image; the image supplies the dimensions.
    pub fn tex_image_2d_image(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        format: u32,
        ty: u32,
        image: &ImageSource,
    ) {
        let (Ok(width), Ok(height)) = (i32::try_from(image.width), i32::try_from(image.height)) else {
            self.report(Err(WebGLError::InvalidValue));
            return;
        };
        self.tex_image_2d(
            target,
            level,
            internal_format,
            width,
            height,
            0,
            format,
            ty,
            TexImageSource::Image(image),
        );
    }

    /// `texImage3D` for `TEXTURE_3D` and `TEXTURE_2D_ARRAY`.
    #[allow(clippy::too_many_arguments)]
    pub fn tex_image_3d(
        &mut self,
        target: u32,
        level: i32,
        internal_format: u32,
        width: i32,
        height: i32,
        depth: i32,
        border: i32,
        format: u32,
        ty: u32,
        source: TexImageSource<'_>,
    ) {
        let result = self.try_tex_image(ImageUpload {
            three_d: true,
            target,
            level,
            internal_format,
            width,
            height,
            depth,
            border,
            format,
            ty,
            source,
        });
        self.report(result);
    }

    fn try_tex_image(&mut self, upload: ImageUpload<'_>) -> WebGLResult<()> {
        let ImageUpload {
            three_d,
            target,
            level,
            internal_format,
            width,
            height,
            depth,
            border,
            format,
            ty,
            source,
        } = upload;

        if level < 0 || width < 0 || height < 0 || depth < 0 || border != 0 {
            return Err(WebGLError::InvalidValue);
        }

        let target_ok = if three_d {
            matches!(target, constants::TEXTURE_3D | constants::TEXTURE_2D_ARRAY)
        } else {
            target == constants::TEXTURE_2D || is_cube_face(target)
        };
        if !target_ok || !formats::verify_format(internal_format, format, ty) {
            return Err(WebGLError::InvalidEnum);
        }

        let pixel_size = formats::pixel_size(internal_format, ty);
        if pixel_size == 0 {
            trace!(internal_format, ty, "no pixel size for upload; ignoring");
            return Ok(());
        }

        let id = self.bound_texture(target).ok_or(WebGLError::InvalidOperation)?;
        if self.texture_data(id).is_some_and(|tex| tex.immutable) {
            return Err(WebGLError::InvalidOperation);
        }

        self.check_image_size(target, level, width, height, depth)?;

        let (w, h, d) = (width as u32, height as u32, depth as u32);
        let unpack_bound = self.gl.get_integer(constants::PIXEL_UNPACK_BUFFER_BINDING) != 0;
        let prepared = match source {
            TexImageSource::UnpackOffset(offset) => {
                if !unpack_bound {
                    return Err(WebGLError::InvalidOperation);
                }
                PreparedPixels::Offset(offset)
            }
            _ if unpack_bound => return Err(WebGLError::InvalidOperation),
            TexImageSource::Pixels(None) => {
                let len = formats::image_byte_len(w, h, d, pixel_size, self.unpack.alignment);
                PreparedPixels::Client {
                    bytes: Cow::Owned(vec![0; len]),
                    image: false,
                }
            }
            TexImageSource::Pixels(Some(bytes)) => PreparedPixels::Client {
                bytes: self.unpack_client(ty, format, (w, h, d), bytes, self.unpack.alignment)?,
                image: false,
            },
            TexImageSource::Image(image) => PreparedPixels::Client {
                bytes: self.unpack_client(ty, format, (w, h, d), &image.pixels, 1)?,
                image: true,
            },
        };

        let desc = NativeImageDesc {
            target,
            level,
            internal_format,
            width,
            height,
            depth,
            format,
            ty,
        };
        let alignment = self.unpack.alignment as i32;
        guarded_call(&mut self.gl, &mut self.errors, |gl| {
            let (pixels, image) = match &prepared {
                PreparedPixels::Client { bytes, image } => (NativePixels::Client(bytes), *image),
                PreparedPixels::Offset(offset) => (NativePixels::UnpackBufferOffset(*offset), false),
            };
            // Host images are tightly packed.
            if image && alignment != 1 {
                gl.pixel_storei(constants::UNPACK_ALIGNMENT, 1);
            }
            if three_d {
                gl.tex_image_3d(&desc, pixels);
            } else {
                gl.tex_image_2d(&desc, pixels);
            }
            if image && alignment != 1 {
                gl.pixel_storei(constants::UNPACK_ALIGNMENT, alignment);
            }
        })?;

        if let Some(tex) = self.texture_data_mut(id) {
            tex.set_level(level as usize, LevelInfo { width, height, depth });
            tex.internal_format = internal_format;
            tex.format = format;
            tex.ty = ty;
        }
        refresh_attachments(&mut self.registry, id);
        debug!(target, level, width, height, depth, internal_format, "defined texture image");
        Ok(())
    }

    /// Bounds checks shared by the upload paths.
    fn check_image_size(&self, target: u32, level: i32, width: i32, height: i32, depth: i32) -> WebGLResult<()> {
        let limits = &self.limits;
        let (max_size, max_layers) = match target {
            constants::TEXTURE_3D => (limits.max_3d_texture_size, limits.max_3d_texture_size),
            constants::TEXTURE_2D_ARRAY => (limits.max_texture_size, limits.max_array_texture_layers),
            t if is_cube_face(t) || t == constants::TEXTURE_CUBE_MAP => (limits.max_cube_map_texture_size, 1),
            _ => (limits.max_texture_size, 1),
        };
        if level as usize > formats::max_mip_level(max_size) {
            return Err(WebGLError::InvalidValue);
        }
        let level_size = max_size >> level;
        let max_depth = if target == constants::TEXTURE_3D {
            level_size
        } else {
            max_layers
        };
        if width > level_size || height > level_size || depth > max_depth {
            return Err(WebGLError::InvalidValue);
        }
        if binding_target(target) == Some(constants::TEXTURE_CUBE_MAP) && width != height {
            return Err(WebGLError::InvalidValue);
        }
        Ok(())
    }

    /// Check client data length and apply the unpack transforms.
    fn unpack_client<'a>(
        &self,
        ty: u32,
        format: u32,
        (width, height, depth): (u32, u32, u32),
        bytes: &'a [u8],
        alignment: u32,
    ) -> WebGLResult<Cow<'a, [u8]>> {
        let pixel_size = formats::pixel_size(format, ty);
        if bytes.len() < formats::image_byte_len(width, height, depth, pixel_size, alignment) {
            return Err(WebGLError::InvalidOperation);
        }
        if self.unpack.is_identity() {
            return Ok(Cow::Borrowed(bytes));
        }
        let options = crate::pixels::UnpackOptions {
            alignment,
            ..self.unpack
        };
        Ok(Cow::Owned(unpack_pixels(ty, format, width, height, depth, bytes, &options)))
    }

    // ==================== Immutable Storage ====================

    /// Allocate every level of the bound texture at once. The texture
    /// becomes immutable.
    pub fn tex_storage_2d(&mut self, target: u32, levels: i32, internal_format: u32, width: i32, height: i32) {
        let result = self.try_tex_storage_2d(target, levels, internal_format, width, height);
        self.report(result);
    }

    fn try_tex_storage_2d(
        &mut self,
        target: u32,
        levels: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) -> WebGLResult<()> {
        if levels < 1 || width < 1 || height < 1 {
            return Err(WebGLError::InvalidValue);
        }
        if !matches!(target, constants::TEXTURE_2D | constants::TEXTURE_CUBE_MAP) {
            return Err(WebGLError::InvalidEnum);
        }
        let (format, ty) = formats::storage_format(internal_format).ok_or(WebGLError::InvalidEnum)?;

        let id = self.bound_texture(target).ok_or(WebGLError::InvalidOperation)?;
        if self.texture_data(id).is_some_and(|tex| tex.immutable) {
            return Err(WebGLError::InvalidOperation);
        }
        if levels > formats::mip_level_count(width, height) {
            return Err(WebGLError::InvalidOperation);
        }
        self.check_image_size(target, 0, width, height, 1)?;

        guarded_call(&mut self.gl, &mut self.errors, |gl| {
            gl.tex_storage_2d(target, levels, internal_format, width, height)
        })?;

        if let Some(tex) = self.texture_data_mut(id) {
            for level in 0..levels {
                tex.set_level(
                    level as usize,
                    LevelInfo {
                        width: (width >> level).max(1),
                        height: (height >> level).max(1),
                        depth: 1,
                    },
                );
            }
            tex.internal_format = internal_format;
            tex.format = format;
            tex.ty = ty;
            tex.immutable = true;
        }
        refresh_attachments(&mut self.registry, id);
        debug!(target, levels, internal_format, width, height, "allocated immutable texture");
        Ok(())
    }
}
