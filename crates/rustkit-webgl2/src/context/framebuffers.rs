//! Framebuffer objects, attachments, draw buffers and blits.

use tracing::{debug, trace};

use super::{binding_target, is_cube_face, WebGL2RenderingContext};
use crate::constants;
use crate::error::{WebGLError, WebGLResult};
use crate::formats;
use crate::framebuffer::{AttachedImage, Attachment, AttachmentPoint, FramebufferData};
use crate::native::NativeGl;
use crate::object::{
    LifetimeState, ObjectData, ObjectId, ObjectKind, WebGLFramebuffer, WebGLRenderbuffer, WebGLTexture,
};

const BLIT_MASK: u32 = constants::COLOR_BUFFER_BIT | constants::DEPTH_BUFFER_BIT | constants::STENCIL_BUFFER_BIT;

impl<G: NativeGl> WebGL2RenderingContext<G> {
    // ==================== Objects ====================

    pub fn create_framebuffer(&mut self) -> WebGLFramebuffer {
        let native = self.gl.gen_framebuffer();
        WebGLFramebuffer::from_handle(self.registry.register(ObjectKind::Framebuffer, native))
    }

    pub fn is_framebuffer(&self, framebuffer: Option<WebGLFramebuffer>) -> bool {
        self.is_object(framebuffer.as_ref())
    }

    /// Request deletion. A bound framebuffer is unbound first, which puts the
    /// default framebuffer back in place.
    pub fn delete_framebuffer(&mut self, framebuffer: Option<WebGLFramebuffer>) {
        let Some(framebuffer) = framebuffer else {
            return;
        };
        let result = self.resolve(&framebuffer).map(|id| {
            if self.registry.state(id) != Some(LifetimeState::Live) {
                return;
            }
            let draw = self.bindings.draw_framebuffer == Some(id);
            let read = self.bindings.read_framebuffer == Some(id);
            match (draw, read) {
                (true, true) => self.gl.bind_framebuffer(constants::FRAMEBUFFER, 0),
                (true, false) => self.gl.bind_framebuffer(constants::DRAW_FRAMEBUFFER, 0),
                (false, true) => self.gl.bind_framebuffer(constants::READ_FRAMEBUFFER, 0),
                (false, false) => {}
            }
            if draw {
                self.registry.bind(&mut self.bindings.draw_framebuffer, None, &mut self.gl);
            }
            if read {
                self.registry.bind(&mut self.bindings.read_framebuffer, None, &mut self.gl);
            }
            self.registry.request_delete(id, &mut self.gl);
        });
        self.report(result);
    }

    // ==================== Binding ====================

    /// Bind `framebuffer`, or the default drawing buffer for `None`.
    ///
    /// Framebuffers already flagged for deletion are ignored without error.
    pub fn bind_framebuffer(&mut self, target: u32, framebuffer: Option<WebGLFramebuffer>) {
        let result = self.try_bind_framebuffer(target, framebuffer);
        self.report(result);
    }

    fn try_bind_framebuffer(&mut self, target: u32, framebuffer: Option<WebGLFramebuffer>) -> WebGLResult<()> {
        if !matches!(
            target,
            constants::FRAMEBUFFER | constants::DRAW_FRAMEBUFFER | constants::READ_FRAMEBUFFER
        ) {
            return Err(WebGLError::InvalidEnum);
        }

        let id = match framebuffer {
            Some(fb) => {
                let id = self.resolve(&fb)?;
                if self.registry.state(id) != Some(LifetimeState::Live) {
                    trace!(id = id.id(), "ignoring bind of deleted framebuffer");
                    return Ok(());
                }
                Some(id)
            }
            None => None,
        };

        let native = self.native_of(id);
        self.gl.bind_framebuffer(target, native);
        if target != constants::READ_FRAMEBUFFER {
            self.registry.bind(&mut self.bindings.draw_framebuffer, id, &mut self.gl);
        }
        if target != constants::DRAW_FRAMEBUFFER {
            self.registry.bind(&mut self.bindings.read_framebuffer, id, &mut self.gl);
        }
        trace!(target, native, "bound framebuffer");
        Ok(())
    }

    /// The framebuffer bound to `target`; `Ok(None)` is the default framebuffer.
    fn framebuffer_binding(&self, target: u32) -> WebGLResult<Option<ObjectId>> {
        match target {
            constants::FRAMEBUFFER | constants::DRAW_FRAMEBUFFER => Ok(self.bindings.draw_framebuffer),
            constants::READ_FRAMEBUFFER => Ok(self.bindings.read_framebuffer),
            _ => Err(WebGLError::InvalidEnum),
        }
    }

    pub(crate) fn framebuffer_data(&self, id: ObjectId) -> Option<&FramebufferData> {
        match self.registry.get(id).map(|record| &record.data) {
            Some(ObjectData::Framebuffer(data)) => Some(data),
            _ => None,
        }
    }

    fn framebuffer_data_mut(&mut self, id: ObjectId) -> Option<&mut FramebufferData> {
        match self.registry.get_mut(id).map(|record| &mut record.data) {
            Some(ObjectData::Framebuffer(data)) => Some(data),
            _ => None,
        }
    }

    /// Shadow state of `framebuffer`, if it belongs to this context.
    pub fn framebuffer_info(&self, framebuffer: &WebGLFramebuffer) -> Option<&FramebufferData> {
        self.resolve(framebuffer).ok().and_then(|id| self.framebuffer_data(id))
    }

    // ==================== Attachments ====================

    pub fn framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        textarget: u32,
        texture: Option<WebGLTexture>,
        level: i32,
    ) {
        let result = self.try_framebuffer_texture_2d(target, attachment, textarget, texture, level);
        self.report(result);
    }

    fn try_framebuffer_texture_2d(
        &mut self,
        target: u32,
        attachment: u32,
        textarget: u32,
        texture: Option<WebGLTexture>,
        level: i32,
    ) -> WebGLResult<()> {
        let binding = self.framebuffer_binding(target)?;
        let point = self.attachment_point(attachment)?;
        if textarget != constants::TEXTURE_2D && !is_cube_face(textarget) {
            return Err(WebGLError::InvalidEnum);
        }
        let fb = binding.ok_or(WebGLError::InvalidOperation)?;

        let image = match texture {
            Some(texture) => {
                let id = self.resolve_live(&texture)?;
                let max_size = if is_cube_face(textarget) {
                    self.limits.max_cube_map_texture_size
                } else {
                    self.limits.max_texture_size
                };
                if level < 0 || level as usize > formats::max_mip_level(max_size) {
                    return Err(WebGLError::InvalidValue);
                }
                // A texture that was never bound has no type to match.
                let bound_target = self.texture_data(id).and_then(|tex| tex.target);
                if bound_target.is_none() || bound_target != binding_target(textarget) {
                    return Err(WebGLError::InvalidOperation);
                }
                Some(AttachedImage::Texture { id, textarget, level })
            }
            None => None,
        };

        let native = self.native_of(image.map(|image| image.object()));
        let level = if image.is_some() { level } else { 0 };
        self.gl
            .framebuffer_texture_2d(target, attachment, textarget, native, level);
        self.set_attachment(fb, point, image);
        Ok(())
    }

    pub fn framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: Option<WebGLRenderbuffer>,
    ) {
        let result = self.try_framebuffer_renderbuffer(target, attachment, renderbuffer_target, renderbuffer);
        self.report(result);
    }

    fn try_framebuffer_renderbuffer(
        &mut self,
        target: u32,
        attachment: u32,
        renderbuffer_target: u32,
        renderbuffer: Option<WebGLRenderbuffer>,
    ) -> WebGLResult<()> {
        let binding = self.framebuffer_binding(target)?;
        let point = self.attachment_point(attachment)?;
        if renderbuffer_target != constants::RENDERBUFFER {
            return Err(WebGLError::InvalidEnum);
        }
        let fb = binding.ok_or(WebGLError::InvalidOperation)?;

        let image = renderbuffer
            .map(|rb| self.resolve_live(&rb))
            .transpose()?
            .map(|id| AttachedImage::Renderbuffer { id });

        let native = self.native_of(image.map(|image| image.object()));
        self.gl
            .framebuffer_renderbuffer(target, attachment, renderbuffer_target, native);
        self.set_attachment(fb, point, image);
        Ok(())
    }

    fn attachment_point(&self, attachment: u32) -> WebGLResult<AttachmentPoint> {
        AttachmentPoint::from_enum(attachment, self.limits.max_draw_buffers).ok_or(WebGLError::InvalidEnum)
    }

    /// Replace the image at `point` of `fb`, moving references.
    fn set_attachment(&mut self, fb: ObjectId, point: AttachmentPoint, image: Option<AttachedImage>) {
        let entry = image.map(|image| match self.registry.get(image.object()) {
            Some(record) => Attachment::describe(image, &record.data),
            None => Attachment::undefined(image),
        });
        if let Some(image) = image {
            self.registry.retain(image.object());
        }
        let previous = self
            .framebuffer_data_mut(fb)
            .and_then(|data| data.set(point, entry));
        if let Some(previous) = previous {
            self.registry.release(previous.image.object(), &mut self.gl);
        }
        debug!(fb = fb.id(), ?point, ?image, "updated attachment");
    }

    /// Detach `id` from the currently bound framebuffers.
    pub(super) fn detach_from_bound_framebuffers(&mut self, id: ObjectId) {
        let mut targets = vec![(constants::DRAW_FRAMEBUFFER, self.bindings.draw_framebuffer)];
        if self.bindings.read_framebuffer != self.bindings.draw_framebuffer {
            targets.push((constants::READ_FRAMEBUFFER, self.bindings.read_framebuffer));
        }

        for (target, fb) in targets {
            let Some(fb) = fb else {
                continue;
            };
            let points = self
                .framebuffer_data(fb)
                .map(|data| data.points_holding(id))
                .unwrap_or_default();
            for point in points {
                let removed = self.framebuffer_data_mut(fb).and_then(|data| data.set(point, None));
                match removed.map(|entry| entry.image) {
                    Some(AttachedImage::Texture { textarget, .. }) => {
                        self.gl
                            .framebuffer_texture_2d(target, point.to_enum(), textarget, 0, 0)
                    }
                    Some(AttachedImage::Renderbuffer { .. }) => {
                        self.gl
                            .framebuffer_renderbuffer(target, point.to_enum(), constants::RENDERBUFFER, 0)
                    }
                    None => continue,
                }
                self.registry.release(id, &mut self.gl);
            }
        }
    }

    // ==================== Status ====================

    /// Completeness of the framebuffer bound to `target`. Zero on error.
    pub fn check_framebuffer_status(&mut self, target: u32) -> u32 {
        match self.framebuffer_binding(target) {
            Ok(binding) => self.framebuffer_status(binding),
            Err(error) => {
                self.report(Err(error));
                0
            }
        }
    }

    fn framebuffer_status(&self, binding: Option<ObjectId>) -> u32 {
        match binding {
            None => constants::FRAMEBUFFER_COMPLETE,
            Some(id) => self
                .framebuffer_data(id)
                .map_or(constants::FRAMEBUFFER_UNSUPPORTED, FramebufferData::status),
        }
    }

    // ==================== Draw Buffers ====================

    pub fn draw_buffers(&mut self, buffers: &[u32]) {
        let result = self.try_draw_buffers(buffers);
        self.report(result);
    }

    fn try_draw_buffers(&mut self, buffers: &[u32]) -> WebGLResult<()> {
        self.check_stencil_state()?;
        if buffers.len() > self.limits.max_draw_buffers as usize {
            return Err(WebGLError::InvalidValue);
        }
        let known = |buffer: u32| {
            buffer == constants::NONE
                || buffer == constants::BACK
                || (constants::COLOR_ATTACHMENT0..=constants::COLOR_ATTACHMENT15).contains(&buffer)
        };
        if !buffers.iter().all(|&buffer| known(buffer)) {
            return Err(WebGLError::InvalidEnum);
        }

        match self.bindings.draw_framebuffer {
            None => {
                let [buffer] = buffers else {
                    return Err(WebGLError::InvalidOperation);
                };
                if *buffer != constants::BACK && *buffer != constants::NONE {
                    return Err(WebGLError::InvalidOperation);
                }
                self.default_draw_buffer = *buffer;
            }
            Some(fb) => {
                let in_order = buffers
                    .iter()
                    .enumerate()
                    .all(|(i, &buffer)| buffer == constants::NONE || buffer == constants::COLOR_ATTACHMENT0 + i as u32);
                if !in_order {
                    return Err(WebGLError::InvalidOperation);
                }
                if let Some(data) = self.framebuffer_data_mut(fb) {
                    data.draw_buffers = buffers.to_vec();
                }
            }
        }

        self.gl.draw_buffers(buffers);
        Ok(())
    }

    /// Draw buffer selection of the bound draw framebuffer.
    pub fn draw_buffer_selection(&self) -> Vec<u32> {
        match self.bindings.draw_framebuffer {
            None => vec![self.default_draw_buffer],
            Some(fb) => self
                .framebuffer_data(fb)
                .map(|data| data.draw_buffers.clone())
                .unwrap_or_default(),
        }
    }

    // ==================== Blit ====================

    /// Copy a rectangle from the read framebuffer to the draw framebuffer.
    /// Rectangles are `[x0, y0, x1, y1]`.
    pub fn blit_framebuffer(&mut self, src: [i32; 4], dst: [i32; 4], mask: u32, filter: u32) {
        let result = self.try_blit_framebuffer(src, dst, mask, filter);
        self.report(result);
    }

    fn try_blit_framebuffer(&mut self, src: [i32; 4], dst: [i32; 4], mask: u32, filter: u32) -> WebGLResult<()> {
        self.check_stencil_state()?;
        if mask & !BLIT_MASK != 0 {
            return Err(WebGLError::InvalidValue);
        }
        if filter != constants::NEAREST && filter != constants::LINEAR {
            return Err(WebGLError::InvalidEnum);
        }
        let depth = mask & constants::DEPTH_BUFFER_BIT != 0;
        let stencil = mask & constants::STENCIL_BUFFER_BIT != 0;
        if (depth || stencil) && filter == constants::LINEAR {
            return Err(WebGLError::InvalidOperation);
        }

        let read = self.bindings.read_framebuffer;
        let draw = self.bindings.draw_framebuffer;
        if self.framebuffer_status(read) != constants::FRAMEBUFFER_COMPLETE
            || self.framebuffer_status(draw) != constants::FRAMEBUFFER_COMPLETE
        {
            return Err(WebGLError::InvalidFramebufferOperation);
        }
        if read == draw {
            return Err(WebGLError::InvalidOperation);
        }

        let mismatch = |a: Option<u32>, b: Option<u32>| matches!((a, b), (Some(a), Some(b)) if a != b);
        if depth && mismatch(self.depth_format(read), self.depth_format(draw)) {
            return Err(WebGLError::InvalidOperation);
        }
        if stencil && mismatch(self.stencil_format(read), self.stencil_format(draw)) {
            return Err(WebGLError::InvalidOperation);
        }

        self.gl.blit_framebuffer(src, dst, mask, filter);
        Ok(())
    }

    /// Depth format of a framebuffer; the default one follows the context attributes.
    fn depth_format(&self, binding: Option<ObjectId>) -> Option<u32> {
        match binding {
            None => self.default_depth_stencil_format().filter(|f| formats::is_depth_format(*f)),
            Some(id) => self
                .framebuffer_data(id)
                .and_then(FramebufferData::depth_attachment)
                .map(|a| a.internal_format),
        }
    }

    fn stencil_format(&self, binding: Option<ObjectId>) -> Option<u32> {
        match binding {
            None => self.default_depth_stencil_format().filter(|f| formats::has_stencil(*f)),
            Some(id) => self
                .framebuffer_data(id)
                .and_then(FramebufferData::stencil_attachment)
                .map(|a| a.internal_format),
        }
    }

    fn default_depth_stencil_format(&self) -> Option<u32> {
        match (self.attributes.depth, self.attributes.stencil) {
            (true, true) => Some(constants::DEPTH24_STENCIL8),
            (true, false) => Some(constants::DEPTH_COMPONENT24),
            (false, true) => Some(constants::STENCIL_INDEX8),
            (false, false) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ContextAttributes;
    use crate::constants::*;
    use crate::context::{TexImageSource, WebGL2RenderingContext};
    use crate::framebuffer::AttachmentPoint;
    use crate::object::{GLObject, LifetimeState, WebGLFramebuffer, WebGLRenderbuffer};
    use crate::recording::{NativeCall, RecordingGl};

    type Context = WebGL2RenderingContext<RecordingGl>;

    fn context() -> Context {
        WebGL2RenderingContext::new(RecordingGl::new(), ContextAttributes::default())
    }

    fn renderbuffer(ctx: &mut Context, internal_format: u32, width: i32, height: i32) -> WebGLRenderbuffer {
        let rb = ctx.create_renderbuffer();
        ctx.bind_renderbuffer(RENDERBUFFER, Some(rb));
        ctx.renderbuffer_storage(RENDERBUFFER, internal_format, width, height);
        rb
    }

    /// A complete framebuffer with a color and a depth renderbuffer.
    fn complete_framebuffer(ctx: &mut Context, depth_format: u32) -> WebGLFramebuffer {
        let color = renderbuffer(ctx, RGBA8, 4, 4);
        let depth = renderbuffer(ctx, depth_format, 4, 4);
        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0, RENDERBUFFER, Some(color));
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, DEPTH_ATTACHMENT, RENDERBUFFER, Some(depth));
        fb
    }

    #[test]
    fn test_bind_none_binds_default_for_every_target() {
        let mut ctx = context();
        let fb = ctx.create_framebuffer();
        for target in [FRAMEBUFFER, DRAW_FRAMEBUFFER, READ_FRAMEBUFFER] {
            ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
            ctx.gl_mut().take_calls();
            ctx.bind_framebuffer(target, None);
            assert_eq!(ctx.get_error(), NO_ERROR);
            assert_eq!(
                ctx.gl().calls(),
                &[NativeCall::BindFramebuffer {
                    target,
                    framebuffer: 0
                }]
            );
        }
        ctx.bind_framebuffer(FRAMEBUFFER, None);
        assert_eq!(ctx.bindings.draw_framebuffer, None);
        assert_eq!(ctx.bindings.read_framebuffer, None);
        assert_eq!(ctx.registry().ref_count(fb.handle().id()), 0);
    }

    #[test]
    fn test_bind_bad_target_changes_nothing() {
        let mut ctx = context();
        let fb = ctx.create_framebuffer();
        ctx.gl_mut().take_calls();
        ctx.bind_framebuffer(RENDERBUFFER, Some(fb));
        assert_eq!(ctx.get_error(), INVALID_ENUM);
        assert!(ctx.gl().calls().is_empty());
        assert_eq!(ctx.bindings.draw_framebuffer, None);
        assert_eq!(ctx.registry().ref_count(fb.handle().id()), 0);
    }

    #[test]
    fn test_bind_framebuffer_targets_hold_one_reference_each() {
        let mut ctx = context();
        let fb = ctx.create_framebuffer();
        let id = fb.handle().id();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        assert_eq!(ctx.registry().ref_count(id), 2);
        ctx.bind_framebuffer(READ_FRAMEBUFFER, None);
        assert_eq!(ctx.registry().ref_count(id), 1);
        assert!(ctx.is_framebuffer(Some(fb)));
    }

    #[test]
    fn test_bind_deleted_framebuffer_is_ignored() {
        let mut ctx = context();
        let fb = ctx.create_framebuffer();
        ctx.delete_framebuffer(Some(fb));
        ctx.gl_mut().take_calls();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        assert_eq!(ctx.get_error(), NO_ERROR);
        assert!(ctx.gl().calls().is_empty());
    }

    #[test]
    fn test_delete_bound_framebuffer_restores_default() {
        let mut ctx = context();
        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        ctx.delete_framebuffer(Some(fb));
        assert_eq!(ctx.bindings.draw_framebuffer, None);
        assert_eq!(ctx.registry().state(fb.handle().id()), Some(LifetimeState::Deleted));
        assert!(!ctx.is_framebuffer(Some(fb)));
    }

    #[test]
    fn test_attachment_tracks_storage_and_status() {
        let mut ctx = context();
        let fb = complete_framebuffer(&mut ctx, DEPTH_COMPONENT16);
        assert_eq!(ctx.check_framebuffer_status(FRAMEBUFFER), FRAMEBUFFER_COMPLETE);

        // Redefining attached storage refreshes the cached entry.
        ctx.renderbuffer_storage(RENDERBUFFER, DEPTH_COMPONENT16, 8, 8);
        assert_eq!(ctx.check_framebuffer_status(FRAMEBUFFER), FRAMEBUFFER_INCOMPLETE_DIMENSIONS);
        let depth = ctx
            .framebuffer_info(&fb)
            .and_then(|data| data.attachment(AttachmentPoint::Depth).copied());
        assert_eq!(depth.map(|a| a.width), Some(8));
        assert_eq!(ctx.get_error(), NO_ERROR);
    }

    #[test]
    fn test_texture_attachment_and_refresh() {
        let mut ctx = context();
        let tex = ctx.create_texture();
        ctx.bind_texture(TEXTURE_2D, Some(tex));
        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        ctx.framebuffer_texture_2d(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, Some(tex), 0);
        assert_eq!(
            ctx.check_framebuffer_status(FRAMEBUFFER),
            FRAMEBUFFER_INCOMPLETE_ATTACHMENT
        );

        ctx.tex_image_2d(TEXTURE_2D, 0, RGBA, 2, 2, 0, RGBA, UNSIGNED_BYTE, TexImageSource::Pixels(None));
        assert_eq!(ctx.check_framebuffer_status(FRAMEBUFFER), FRAMEBUFFER_COMPLETE);
        // One binding plus one attachment.
        assert_eq!(ctx.registry().ref_count(tex.handle().id()), 2);
        assert_eq!(ctx.get_error(), NO_ERROR);
    }

    #[test]
    fn test_attachment_validation() {
        let mut ctx = context();
        let rb = renderbuffer(&mut ctx, RGBA8, 1, 1);

        // Default framebuffer cannot take attachments.
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0, RENDERBUFFER, Some(rb));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);

        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0 + 4, RENDERBUFFER, Some(rb));
        assert_eq!(ctx.get_error(), INVALID_ENUM);
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, Some(rb));
        assert_eq!(ctx.get_error(), INVALID_ENUM);

        let mut other = context();
        let foreign = other.create_renderbuffer();
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0, RENDERBUFFER, Some(foreign));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        assert!(ctx.framebuffer_info(&fb).is_some_and(|data| data.attachments.is_empty()));
    }

    #[test]
    fn test_detach_releases_reference() {
        let mut ctx = context();
        let rb = renderbuffer(&mut ctx, RGBA8, 1, 1);
        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0, RENDERBUFFER, Some(rb));
        assert_eq!(ctx.registry().ref_count(rb.handle().id()), 2);
        ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0, RENDERBUFFER, None);
        assert_eq!(ctx.registry().ref_count(rb.handle().id()), 1);
    }

    #[test]
    fn test_status_of_default_and_bad_target() {
        let mut ctx = context();
        assert_eq!(ctx.check_framebuffer_status(FRAMEBUFFER), FRAMEBUFFER_COMPLETE);
        assert_eq!(ctx.check_framebuffer_status(TEXTURE_2D), 0);
        assert_eq!(ctx.get_error(), INVALID_ENUM);
        ctx.create_framebuffer();
        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(READ_FRAMEBUFFER, Some(fb));
        assert_eq!(
            ctx.check_framebuffer_status(READ_FRAMEBUFFER),
            FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT
        );
    }

    #[test]
    fn test_draw_buffers_on_default_framebuffer() {
        let mut ctx = context();
        ctx.draw_buffers(&[NONE]);
        assert_eq!(ctx.get_error(), NO_ERROR);
        assert_eq!(ctx.draw_buffer_selection(), vec![NONE]);

        ctx.draw_buffers(&[COLOR_ATTACHMENT0]);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.draw_buffers(&[BACK, BACK]);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.draw_buffers(&[0x1234]);
        assert_eq!(ctx.get_error(), INVALID_ENUM);
        assert_eq!(ctx.draw_buffer_selection(), vec![NONE]);
    }

    #[test]
    fn test_draw_buffers_on_framebuffer() {
        let mut ctx = context();
        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(DRAW_FRAMEBUFFER, Some(fb));

        ctx.draw_buffers(&[COLOR_ATTACHMENT0, NONE, COLOR_ATTACHMENT0 + 2]);
        assert_eq!(ctx.get_error(), NO_ERROR);
        assert_eq!(ctx.draw_buffer_selection(), vec![COLOR_ATTACHMENT0, NONE, COLOR_ATTACHMENT0 + 2]);

        ctx.draw_buffers(&[COLOR_ATTACHMENT0 + 1]);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.draw_buffers(&[BACK]);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.draw_buffers(&[NONE; 5]);
        assert_eq!(ctx.get_error(), INVALID_VALUE);
        assert_eq!(ctx.gl().count(|c| matches!(c, NativeCall::DrawBuffers(_))), 1);
    }

    #[test]
    fn test_draw_buffers_requires_consistent_stencil() {
        let mut ctx = context();
        ctx.stencil_mask_separate(FRONT, 1);
        ctx.draw_buffers(&[BACK]);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
    }

    #[test]
    fn test_blit_validation_order() {
        let mut ctx = context();
        let rect = [0, 0, 4, 4];

        ctx.blit_framebuffer(rect, rect, 0x1, NEAREST);
        assert_eq!(ctx.get_error(), INVALID_VALUE);
        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT, 0x1234);
        assert_eq!(ctx.get_error(), INVALID_ENUM);
        ctx.blit_framebuffer(rect, rect, DEPTH_BUFFER_BIT, LINEAR);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);

        // Default to default is the same framebuffer.
        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT, LINEAR);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);

        let incomplete = ctx.create_framebuffer();
        ctx.bind_framebuffer(READ_FRAMEBUFFER, Some(incomplete));
        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT, LINEAR);
        assert_eq!(ctx.get_error(), INVALID_FRAMEBUFFER_OPERATION);
        assert_eq!(ctx.gl().count(|c| matches!(c, NativeCall::BlitFramebuffer { .. })), 0);
    }

    #[test]
    fn test_blit_between_framebuffers() {
        let mut ctx = context();
        let src = complete_framebuffer(&mut ctx, DEPTH_COMPONENT16);
        let dst = complete_framebuffer(&mut ctx, DEPTH_COMPONENT24);
        ctx.bind_framebuffer(READ_FRAMEBUFFER, Some(src));
        ctx.bind_framebuffer(DRAW_FRAMEBUFFER, Some(dst));
        let rect = [0, 0, 4, 4];

        ctx.blit_framebuffer(rect, rect, DEPTH_BUFFER_BIT, NEAREST);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);

        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT, LINEAR);
        assert_eq!(ctx.get_error(), NO_ERROR);
        assert_eq!(ctx.gl().count(|c| matches!(c, NativeCall::BlitFramebuffer { .. })), 1);
    }

    #[test]
    fn test_blit_from_framebuffer_to_default() {
        let mut ctx = context();
        let src = complete_framebuffer(&mut ctx, DEPTH_COMPONENT24);
        ctx.bind_framebuffer(DRAW_FRAMEBUFFER, None);
        ctx.bind_framebuffer(READ_FRAMEBUFFER, Some(src));
        let rect = [0, 0, 4, 4];

        // Default attributes give the back buffer a 24-bit depth buffer.
        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT | DEPTH_BUFFER_BIT, NEAREST);
        assert_eq!(ctx.get_error(), NO_ERROR);
    }

    #[test]
    fn test_blit_requires_consistent_stencil() {
        let mut ctx = context();
        let src = complete_framebuffer(&mut ctx, DEPTH_COMPONENT16);
        let dst = complete_framebuffer(&mut ctx, DEPTH_COMPONENT16);
        ctx.bind_framebuffer(READ_FRAMEBUFFER, Some(src));
        ctx.bind_framebuffer(DRAW_FRAMEBUFFER, Some(dst));
        let rect = [0, 0, 4, 4];

        ctx.stencil_mask_separate(FRONT, 1);
        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT, NEAREST);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        assert_eq!(ctx.gl().count(|c| matches!(c, NativeCall::BlitFramebuffer { .. })), 0);

        ctx.stencil_mask_separate(FRONT, u32::MAX);
        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT, NEAREST);
        assert_eq!(ctx.get_error(), NO_ERROR);
        assert_eq!(ctx.gl().count(|c| matches!(c, NativeCall::BlitFramebuffer { .. })), 1);
    }

    #[test]
    fn test_blit_stencil_format_mismatch() {
        fn with_stencil(ctx: &mut Context, format: u32) -> WebGLFramebuffer {
            let color = renderbuffer(ctx, RGBA8, 4, 4);
            let depth_stencil = renderbuffer(ctx, format, 4, 4);
            let fb = ctx.create_framebuffer();
            ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
            ctx.framebuffer_renderbuffer(FRAMEBUFFER, COLOR_ATTACHMENT0, RENDERBUFFER, Some(color));
            ctx.framebuffer_renderbuffer(FRAMEBUFFER, DEPTH_STENCIL_ATTACHMENT, RENDERBUFFER, Some(depth_stencil));
            fb
        }

        let mut ctx = context();
        let src = with_stencil(&mut ctx, DEPTH24_STENCIL8);
        let dst = with_stencil(&mut ctx, DEPTH32F_STENCIL8);
        ctx.bind_framebuffer(READ_FRAMEBUFFER, Some(src));
        ctx.bind_framebuffer(DRAW_FRAMEBUFFER, Some(dst));
        assert_eq!(ctx.check_framebuffer_status(READ_FRAMEBUFFER), FRAMEBUFFER_COMPLETE);
        assert_eq!(ctx.check_framebuffer_status(DRAW_FRAMEBUFFER), FRAMEBUFFER_COMPLETE);
        let rect = [0, 0, 4, 4];

        ctx.blit_framebuffer(rect, rect, STENCIL_BUFFER_BIT, NEAREST);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        assert_eq!(ctx.gl().count(|c| matches!(c, NativeCall::BlitFramebuffer { .. })), 0);

        ctx.blit_framebuffer(rect, rect, COLOR_BUFFER_BIT, NEAREST);
        assert_eq!(ctx.get_error(), NO_ERROR);
    }

    #[test]
    fn test_bind_foreign_framebuffer_and_renderbuffer() {
        let mut ctx = context();
        let mut other = context();
        let foreign_fb = other.create_framebuffer();
        let foreign_rb = other.create_renderbuffer();
        ctx.gl_mut().take_calls();

        ctx.bind_framebuffer(FRAMEBUFFER, Some(foreign_fb));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.bind_renderbuffer(RENDERBUFFER, Some(foreign_rb));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);

        assert!(ctx.gl().calls().is_empty());
        assert_eq!(other.registry().ref_count(foreign_fb.handle().id()), 0);
        assert_eq!(other.registry().ref_count(foreign_rb.handle().id()), 0);
        assert!(!other.is_framebuffer(Some(foreign_fb)));
    }

    #[test]
    fn test_attach_never_bound_texture_is_invalid_operation() {
        let mut ctx = context();
        let tex = ctx.create_texture();
        let fb = ctx.create_framebuffer();
        ctx.bind_framebuffer(FRAMEBUFFER, Some(fb));
        ctx.gl_mut().take_calls();

        ctx.framebuffer_texture_2d(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, Some(tex), 0);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        assert!(ctx.gl().calls().is_empty());
        assert_eq!(ctx.registry().ref_count(tex.handle().id()), 0);
        assert!(ctx.framebuffer_info(&fb).is_some_and(|data| data.attachments.is_empty()));

        // A cube map texture cannot back a 2D image target either.
        ctx.bind_texture(TEXTURE_CUBE_MAP, Some(tex));
        ctx.framebuffer_texture_2d(FRAMEBUFFER, COLOR_ATTACHMENT0, TEXTURE_2D, Some(tex), 0);
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
    }
}
