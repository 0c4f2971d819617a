//! Renderbuffer objects and storage.

use tracing::{debug, trace};

use super::WebGL2RenderingContext;
use crate::constants;
use crate::error::{WebGLError, WebGLResult};
use crate::formats;
use crate::framebuffer::refresh_attachments;
use crate::native::NativeGl;
use crate::object::{LifetimeState, ObjectData, ObjectKind, RenderbufferData, WebGLRenderbuffer};
use crate::sticky::guarded_call;

impl<G: NativeGl> WebGL2RenderingContext<G> {
    pub fn create_renderbuffer(&mut self) -> WebGLRenderbuffer {
        let native = self.gl.gen_renderbuffer();
        WebGLRenderbuffer::from_handle(self.registry.register(ObjectKind::Renderbuffer, native))
    }

    pub fn is_renderbuffer(&self, renderbuffer: Option<WebGLRenderbuffer>) -> bool {
        self.is_object(renderbuffer.as_ref())
    }

    pub fn bind_renderbuffer(&mut self, target: u32, renderbuffer: Option<WebGLRenderbuffer>) {
        let result = self.try_bind_renderbuffer(target, renderbuffer);
        self.report(result);
    }

    fn try_bind_renderbuffer(&mut self, target: u32, renderbuffer: Option<WebGLRenderbuffer>) -> WebGLResult<()> {
        if target != constants::RENDERBUFFER {
            return Err(WebGLError::InvalidEnum);
        }
        let id = renderbuffer.map(|rb| self.resolve_live(&rb)).transpose()?;
        let native = self.native_of(id);
        self.gl.bind_renderbuffer(target, native);
        self.registry.bind(&mut self.bindings.renderbuffer, id, &mut self.gl);
        trace!(native, "bound renderbuffer");
        Ok(())
    }

    /// Request deletion, unbinding it and detaching it from the bound framebuffers.
    pub fn delete_renderbuffer(&mut self, renderbuffer: Option<WebGLRenderbuffer>) {
        let Some(renderbuffer) = renderbuffer else {
            return;
        };
        let result = self.resolve(&renderbuffer).map(|id| {
            if self.registry.state(id) != Some(LifetimeState::Live) {
                return;
            }
            if self.bindings.renderbuffer == Some(id) {
                self.gl.bind_renderbuffer(constants::RENDERBUFFER, 0);
                self.registry.bind(&mut self.bindings.renderbuffer, None, &mut self.gl);
            }
            self.detach_from_bound_framebuffers(id);
            self.registry.request_delete(id, &mut self.gl);
        });
        self.report(result);
    }

    /// Shadow state of `renderbuffer`, if it belongs to this context.
    pub fn renderbuffer_info(&self, renderbuffer: &WebGLRenderbuffer) -> Option<RenderbufferData> {
        let id = self.resolve(renderbuffer).ok()?;
        match self.registry.get(id).map(|record| &record.data) {
            Some(ObjectData::Renderbuffer(data)) => Some(*data),
            _ => None,
        }
    }

    pub fn renderbuffer_storage(&mut self, target: u32, internal_format: u32, width: i32, height: i32) {
        self.renderbuffer_storage_multisample(target, 0, internal_format, width, height);
    }

    pub fn renderbuffer_storage_multisample(
        &mut self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) {
        let result = self.try_renderbuffer_storage(target, samples, internal_format, width, height);
        self.report(result);
    }

    fn try_renderbuffer_storage(
        &mut self,
        target: u32,
        samples: i32,
        internal_format: u32,
        width: i32,
        height: i32,
    ) -> WebGLResult<()> {
        if samples < 0 || width < 0 || height < 0 {
            return Err(WebGLError::InvalidValue);
        }
        if target != constants::RENDERBUFFER {
            return Err(WebGLError::InvalidEnum);
        }

        let requested = match internal_format {
            constants::DEPTH_STENCIL => constants::DEPTH24_STENCIL8,
            constants::DEPTH_COMPONENT32 => self.limits.preferred_depth_format,
            other => other,
        };
        let format = formats::renderbuffer_format(requested, self.limits.color_buffer_float)
            .ok_or(WebGLError::InvalidEnum)?;

        let id = self.bindings.renderbuffer.ok_or(WebGLError::InvalidOperation)?;
        if format.integer && samples > 0 {
            return Err(WebGLError::InvalidOperation);
        }
        if samples > self.limits.max_samples {
            return Err(WebGLError::InvalidOperation);
        }
        let max_size = self.limits.max_renderbuffer_size;
        if width > max_size || height > max_size {
            return Err(WebGLError::InvalidValue);
        }

        let native_format = format.internal_format;
        guarded_call(&mut self.gl, &mut self.errors, |gl| {
            gl.renderbuffer_storage_multisample(target, samples, native_format, width, height)
        })?;

        if let Some(record) = self.registry.get_mut(id) {
            record.data = ObjectData::Renderbuffer(RenderbufferData {
                width,
                height,
                internal_format: native_format,
                samples,
            });
        }
        refresh_attachments(&mut self.registry, id);
        debug!(samples, internal_format = native_format, width, height, "allocated renderbuffer");
        Ok(())
    }
}
