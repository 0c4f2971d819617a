//! The WebGL2 rendering context.
//!
//! Public methods mirror the WebGL IDL: they return nothing (or the queried
//! value) and record failures in the sticky error register. Each one is a
//! thin shell around a `try_*` body returning [`WebGLResult`] so that the
//! validation order reads top to bottom with `?`.

mod framebuffers;
mod renderbuffers;
mod textures;
mod vertex_arrays;

pub use textures::{ImageSource, TexImageSource};

use tracing::{debug, trace};

use crate::config::{ContextAttributes, ContextLimits};
use crate::constants;
use crate::error::{WebGLError, WebGLResult};
use crate::native::{NativeGl, NativeHandle};
use crate::object::{ContextId, GLObject, LifetimeState, ObjectId};
use crate::pixels::UnpackOptions;
use crate::registry::ObjectRegistry;
use crate::sticky::ErrorRegister;

// ==================== Context State ====================

/// Texture bindings of one texture unit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct TextureUnit {
    pub tex_2d: Option<ObjectId>,
    pub cube_map: Option<ObjectId>,
    pub tex_3d: Option<ObjectId>,
    pub tex_2d_array: Option<ObjectId>,
}

impl TextureUnit {
    /// Binding slot for a bind target. Cube faces resolve to the cube map slot.
    pub fn slot(&self, target: u32) -> Option<Option<ObjectId>> {
        match binding_target(target)? {
            constants::TEXTURE_2D => Some(self.tex_2d),
            constants::TEXTURE_CUBE_MAP => Some(self.cube_map),
            constants::TEXTURE_3D => Some(self.tex_3d),
            _ => Some(self.tex_2d_array),
        }
    }

    pub fn slot_mut(&mut self, target: u32) -> Option<&mut Option<ObjectId>> {
        match binding_target(target)? {
            constants::TEXTURE_2D => Some(&mut self.tex_2d),
            constants::TEXTURE_CUBE_MAP => Some(&mut self.cube_map),
            constants::TEXTURE_3D => Some(&mut self.tex_3d),
            _ => Some(&mut self.tex_2d_array),
        }
    }

    /// Every (bind target, slot) pair of this unit.
    pub fn slots_mut(&mut self) -> [(u32, &mut Option<ObjectId>); 4] {
        [
            (constants::TEXTURE_2D, &mut self.tex_2d),
            (constants::TEXTURE_CUBE_MAP, &mut self.cube_map),
            (constants::TEXTURE_3D, &mut self.tex_3d),
            (constants::TEXTURE_2D_ARRAY, &mut self.tex_2d_array),
        ]
    }
}

/// The bind target an image target belongs to.
pub(crate) fn binding_target(target: u32) -> Option<u32> {
    match target {
        constants::TEXTURE_2D
        | constants::TEXTURE_CUBE_MAP
        | constants::TEXTURE_3D
        | constants::TEXTURE_2D_ARRAY => Some(target),
        t if is_cube_face(t) => Some(constants::TEXTURE_CUBE_MAP),
        _ => None,
    }
}

pub(crate) fn is_cube_face(target: u32) -> bool {
    (constants::TEXTURE_CUBE_MAP_POSITIVE_X..=constants::TEXTURE_CUBE_MAP_NEGATIVE_Z).contains(&target)
}

/// Object bindings held by the context. Every `Some` holds one reference.
#[derive(Debug, Clone, Default)]
pub(crate) struct Bindings {
    pub draw_framebuffer: Option<ObjectId>,
    pub read_framebuffer: Option<ObjectId>,
    pub renderbuffer: Option<ObjectId>,
    pub vertex_array: Option<ObjectId>,
    pub texture_units: Vec<TextureUnit>,
    pub active_unit: usize,
}

/// Stencil function and masks for one face.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct StencilFace {
    pub func: u32,
    pub reference: i32,
    pub value_mask: u32,
    pub write_mask: u32,
}

impl Default for StencilFace {
    fn default() -> Self {
        Self {
            func: constants::ALWAYS,
            reference: 0,
            value_mask: u32::MAX,
            write_mask: u32::MAX,
        }
    }
}

/// Shadow of the stencil state. WebGL requires front and back to agree on
/// reference value and masks before drawing or blitting.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct StencilState {
    pub front: StencilFace,
    pub back: StencilFace,
    dirty: bool,
    consistent: bool,
}

impl StencilState {
    fn new() -> Self {
        Self {
            consistent: true,
            ..Default::default()
        }
    }

    fn faces_mut(&mut self, face: u32) -> Vec<&mut StencilFace> {
        self.dirty = true;
        match face {
            constants::FRONT => vec![&mut self.front],
            constants::BACK => vec![&mut self.back],
            _ => vec![&mut self.front, &mut self.back],
        }
    }

    fn is_consistent(&mut self) -> bool {
        if self.dirty {
            self.consistent = self.front.reference == self.back.reference
                && self.front.value_mask == self.back.value_mask
                && self.front.write_mask == self.back.write_mask;
            self.dirty = false;
        }
        self.consistent
    }
}

// ==================== WebGL2 Context ====================

/// A WebGL2 context driving a native GL implementation.
#[derive(Debug)]
pub struct WebGL2RenderingContext<G: NativeGl> {
    id: ContextId,
    gl: G,
    registry: ObjectRegistry,
    errors: ErrorRegister,
    limits: ContextLimits,
    attributes: ContextAttributes,
    bindings: Bindings,
    unpack: UnpackOptions,
    colorspace_conversion: u32,
    pack_alignment: u32,
    stencil: StencilState,
    /// Draw buffer selection of the default framebuffer.
    default_draw_buffer: u32,
}

impl<G: NativeGl> WebGL2RenderingContext<G> {
    /// Create a context. Limits are queried from `gl` once, here.
    pub fn new(mut gl: G, attributes: ContextAttributes) -> Self {
        let id = ContextId::next();
        let limits = ContextLimits::query(&mut gl);
        debug!(context = id.id(), ?limits, "creating WebGL2 context");

        Self {
            id,
            gl,
            registry: ObjectRegistry::new(id),
            errors: ErrorRegister::new(),
            bindings: Bindings {
                texture_units: vec![TextureUnit::default(); limits.max_texture_units as usize],
                ..Default::default()
            },
            limits,
            attributes,
            unpack: UnpackOptions::default(),
            colorspace_conversion: constants::BROWSER_DEFAULT_WEBGL,
            pack_alignment: crate::formats::DEFAULT_ALIGNMENT,
            stencil: StencilState::new(),
            default_draw_buffer: constants::BACK,
        }
    }

    pub fn id(&self) -> ContextId {
        self.id
    }

    pub fn limits(&self) -> &ContextLimits {
        &self.limits
    }

    /// The native surface.
    pub fn gl(&self) -> &G {
        &self.gl
    }

    pub fn gl_mut(&mut self) -> &mut G {
        &mut self.gl
    }

    /// The object registry, for inspecting reference counts and lifetimes.
    pub fn registry(&self) -> &ObjectRegistry {
        &self.registry
    }

    pub fn get_context_attributes(&self) -> ContextAttributes {
        self.attributes.clone()
    }

    /// Get and clear the error.
    ///
    /// The sticky register wins; otherwise whatever the native layer holds.
    pub fn get_error(&mut self) -> u32 {
        match self.errors.take() {
            Some(error) => error.code(),
            None => self.gl.get_error(),
        }
    }

    /// Delete every native object still alive and hand back the native surface.
    pub fn destroy(mut self) -> G {
        debug!(context = self.id.id(), "destroying WebGL2 context");
        self.registry.destroy_all(&mut self.gl);
        self.gl
    }

    // ==================== Helpers ====================

    /// Record a failed operation in the sticky register.
    fn report(&mut self, result: WebGLResult<()>) {
        if let Err(error) = result {
            trace!(%error, "recording GL error");
            self.errors.set(error);
        }
    }

    /// Ownership check for an incoming handle.
    fn resolve<T: GLObject>(&self, object: &T) -> WebGLResult<ObjectId> {
        let handle = object.handle();
        if self.registry.check_owns(&handle, T::KIND) {
            Ok(handle.id())
        } else {
            Err(WebGLError::InvalidOperation)
        }
    }

    /// Ownership check that also rejects objects flagged for deletion.
    fn resolve_live<T: GLObject>(&self, object: &T) -> WebGLResult<ObjectId> {
        let id = self.resolve(object)?;
        match self.registry.state(id) {
            Some(LifetimeState::Live) => Ok(id),
            _ => Err(WebGLError::InvalidOperation),
        }
    }

    /// Shared body of the `is*` queries.
    fn is_object<T: GLObject>(&self, object: Option<&T>) -> bool {
        object
            .and_then(|object| self.resolve(object).ok())
            .and_then(|id| self.registry.get(id))
            .is_some_and(|record| record.is_live() && record.bound_once)
    }

    fn native_of(&self, id: Option<ObjectId>) -> NativeHandle {
        id.and_then(|id| self.registry.get(id))
            .map_or(0, |record| record.native)
    }

    /// The front/back stencil precondition of draw-like calls.
    fn check_stencil_state(&mut self) -> WebGLResult<()> {
        if self.stencil.is_consistent() {
            Ok(())
        } else {
            Err(WebGLError::InvalidOperation)
        }
    }

    // ==================== Pixel Store ====================

    pub fn pixel_storei(&mut self, pname: u32, param: i32) {
        let result = self.try_pixel_storei(pname, param);
        self.report(result);
    }

    fn try_pixel_storei(&mut self, pname: u32, param: i32) -> WebGLResult<()> {
        match pname {
            constants::UNPACK_FLIP_Y_WEBGL => self.unpack.flip_y = param != 0,
            constants::UNPACK_PREMULTIPLY_ALPHA_WEBGL => self.unpack.premultiply_alpha = param != 0,
            constants::UNPACK_COLORSPACE_CONVERSION_WEBGL => {
                let value = param as u32;
                if value != constants::BROWSER_DEFAULT_WEBGL && value != constants::NONE {
                    return Err(WebGLError::InvalidEnum);
                }
                self.colorspace_conversion = value;
            }
            constants::UNPACK_ALIGNMENT | constants::PACK_ALIGNMENT => {
                if !matches!(param, 1 | 2 | 4 | 8) {
                    return Err(WebGLError::InvalidValue);
                }
                if pname == constants::UNPACK_ALIGNMENT {
                    self.unpack.alignment = param as u32;
                } else {
                    self.pack_alignment = param as u32;
                }
                self.gl.pixel_storei(pname, param);
            }
            _ => return Err(WebGLError::InvalidEnum),
        }
        Ok(())
    }

    /// Current unpack state.
    pub fn unpack_options(&self) -> UnpackOptions {
        self.unpack
    }

    /// `getParameter` for the pixel store enums.
    pub fn get_pixel_store(&self, pname: u32) -> Option<i32> {
        match pname {
            constants::UNPACK_FLIP_Y_WEBGL => Some(self.unpack.flip_y as i32),
            constants::UNPACK_PREMULTIPLY_ALPHA_WEBGL => Some(self.unpack.premultiply_alpha as i32),
            constants::UNPACK_COLORSPACE_CONVERSION_WEBGL => Some(self.colorspace_conversion as i32),
            constants::UNPACK_ALIGNMENT => Some(self.unpack.alignment as i32),
            constants::PACK_ALIGNMENT => Some(self.pack_alignment as i32),
            _ => None,
        }
    }

    // ==================== Stencil ====================

    pub fn stencil_func(&mut self, func: u32, reference: i32, mask: u32) {
        self.stencil_func_separate(constants::FRONT_AND_BACK, func, reference, mask);
    }

    pub fn stencil_func_separate(&mut self, face: u32, func: u32, reference: i32, mask: u32) {
        let result = self.try_stencil_func_separate(face, func, reference, mask);
        self.report(result);
    }

    fn try_stencil_func_separate(&mut self, face: u32, func: u32, reference: i32, mask: u32) -> WebGLResult<()> {
        check_face(face)?;
        if !(constants::NEVER..=constants::ALWAYS).contains(&func) {
            return Err(WebGLError::InvalidEnum);
        }
        for state in self.stencil.faces_mut(face) {
            state.func = func;
            state.reference = reference;
            state.value_mask = mask;
        }
        self.gl.stencil_func_separate(face, func, reference, mask);
        Ok(())
    }

    pub fn stencil_mask(&mut self, mask: u32) {
        self.stencil_mask_separate(constants::FRONT_AND_BACK, mask);
    }

    pub fn stencil_mask_separate(&mut self, face: u32, mask: u32) {
        let result = check_face(face).map(|()| {
            for state in self.stencil.faces_mut(face) {
                state.write_mask = mask;
            }
            self.gl.stencil_mask_separate(face, mask);
        });
        self.report(result);
    }
}

fn check_face(face: u32) -> WebGLResult<()> {
    match face {
        constants::FRONT | constants::BACK | constants::FRONT_AND_BACK => Ok(()),
        _ => Err(WebGLError::InvalidEnum),
    }
}
