//! Vertex array objects.

use tracing::trace;

use super::WebGL2RenderingContext;
use crate::error::WebGLResult;
use crate::native::NativeGl;
use crate::object::{GLObject, LifetimeState, ObjectKind, WebGLVertexArrayObject};

impl<G: NativeGl> WebGL2RenderingContext<G> {
    pub fn create_vertex_array(&mut self) -> WebGLVertexArrayObject {
        let native = self.gl.gen_vertex_array();
        WebGLVertexArrayObject::from_handle(self.registry.register(ObjectKind::VertexArray, native))
    }

    /// Bind `array`, or the default vertex array for `None`.
    pub fn bind_vertex_array(&mut self, array: Option<WebGLVertexArrayObject>) {
        let result = self.try_bind_vertex_array(array);
        self.report(result);
    }

    fn try_bind_vertex_array(&mut self, array: Option<WebGLVertexArrayObject>) -> WebGLResult<()> {
        let id = array.map(|array| self.resolve_live(&array)).transpose()?;
        let native = self.native_of(id);
        self.gl.bind_vertex_array(native);
        self.registry.bind(&mut self.bindings.vertex_array, id, &mut self.gl);
        trace!(native, "bound vertex array");
        Ok(())
    }

    /// Request deletion. Deleting the bound array rebinds the default first.
    pub fn delete_vertex_array(&mut self, array: Option<WebGLVertexArrayObject>) {
        let Some(array) = array else {
            return;
        };
        let result = self.resolve(&array).map(|id| {
            if self.registry.state(id) != Some(LifetimeState::Live) {
                return;
            }
            if self.bindings.vertex_array == Some(id) {
                self.gl.bind_vertex_array(0);
                self.registry.bind(&mut self.bindings.vertex_array, None, &mut self.gl);
            }
            self.registry.request_delete(id, &mut self.gl);
        });
        self.report(result);
    }

    /// False for foreign, deleted or never-bound arrays. Never records an error.
    pub fn is_vertex_array(&mut self, array: Option<WebGLVertexArrayObject>) -> bool {
        let Some(array) = array else {
            return false;
        };
        let handle = array.handle();
        if !self.registry.check_owns(&handle, ObjectKind::VertexArray) {
            return false;
        }
        match self.registry.get(handle.id()) {
            Some(record) if record.is_live() => {
                let native = record.native;
                self.gl.is_vertex_array(native)
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::ContextAttributes;
    use crate::constants::*;
    use crate::context::WebGL2RenderingContext;
    use crate::object::{GLObject, LifetimeState};
    use crate::recording::{NativeCall, RecordingGl};

    fn context() -> WebGL2RenderingContext<RecordingGl> {
        WebGL2RenderingContext::new(RecordingGl::new(), ContextAttributes::default())
    }

    #[test]
    fn test_is_vertex_array_after_first_bind() {
        let mut ctx = context();
        let vao = ctx.create_vertex_array();
        assert!(!ctx.is_vertex_array(Some(vao)));
        ctx.bind_vertex_array(Some(vao));
        assert!(ctx.is_vertex_array(Some(vao)));
        assert!(!ctx.is_vertex_array(None));
    }

    #[test]
    fn test_delete_bound_vertex_array_rebinds_default_first() {
        let mut ctx = context();
        let vao = ctx.create_vertex_array();
        ctx.bind_vertex_array(Some(vao));
        ctx.gl_mut().take_calls();

        ctx.delete_vertex_array(Some(vao));
        let native = ctx.registry().get(vao.handle().id()).map(|r| r.native).unwrap_or_default();
        assert_eq!(
            ctx.gl().calls(),
            &[NativeCall::BindVertexArray(0), NativeCall::DeleteVertexArray(native)]
        );
        assert_eq!(ctx.registry().state(vao.handle().id()), Some(LifetimeState::Deleted));
        assert!(!ctx.is_vertex_array(Some(vao)));
        assert_eq!(ctx.get_error(), NO_ERROR);
    }

    #[test]
    fn test_foreign_vertex_array() {
        let mut ctx = context();
        let mut other = context();
        let foreign = other.create_vertex_array();
        other.bind_vertex_array(Some(foreign));

        assert!(!ctx.is_vertex_array(Some(foreign)));
        assert_eq!(ctx.get_error(), NO_ERROR);
        ctx.bind_vertex_array(Some(foreign));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.delete_vertex_array(Some(foreign));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        assert!(other.is_vertex_array(Some(foreign)));
    }

    #[test]
    fn test_bind_deleted_vertex_array_fails() {
        let mut ctx = context();
        let vao = ctx.create_vertex_array();
        ctx.delete_vertex_array(Some(vao));
        ctx.bind_vertex_array(Some(vao));
        assert_eq!(ctx.get_error(), INVALID_OPERATION);
        ctx.bind_vertex_array(None);
        assert_eq!(ctx.get_error(), NO_ERROR);
    }
}
