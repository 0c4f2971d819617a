//! Host boundary: dynamically typed calls dispatched by method name.
//!
//! Script hosts hand over loosely typed argument lists. Malformed call
//! shapes (wrong arity, wrong value kinds) are [`UsageError`]s returned to
//! the host and never reach the sticky GL error register. Well-formed calls
//! go to the typed context methods.

use tracing::trace;

use crate::context::{ImageSource, TexImageSource, WebGL2RenderingContext};
use crate::error::UsageError;
use crate::native::NativeGl;
use crate::object::{WebGLFramebuffer, WebGLRenderbuffer, WebGLTexture, WebGLVertexArrayObject};

/// A value crossing the host boundary.
#[derive(Debug, Clone, PartialEq)]
pub enum HostValue {
    Null,
    Bool(bool),
    Int(i64),
    Number(f64),
    Bytes(Vec<u8>),
    List(Vec<HostValue>),
    Image(ImageSource),
    Texture(WebGLTexture),
    Renderbuffer(WebGLRenderbuffer),
    Framebuffer(WebGLFramebuffer),
    VertexArray(WebGLVertexArrayObject),
}

impl HostValue {
    fn as_integer(&self) -> Option<i64> {
        match *self {
            Self::Int(value) => Some(value),
            Self::Number(value) if value.is_finite() && value.fract() == 0.0 => Some(value as i64),
            Self::Bool(value) => Some(value as i64),
            _ => None,
        }
    }
}

/// Positional view of one call's arguments.
struct Args<'a> {
    method: &'static str,
    values: &'a [HostValue],
}

impl<'a> Args<'a> {
    fn new(
        method: &'static str,
        values: &'a [HostValue],
        counts: &[usize],
        expected: &'static str,
    ) -> Result<Self, UsageError> {
        if !counts.contains(&values.len()) {
            return Err(UsageError::ArgumentCount {
                method,
                expected,
                got: values.len(),
            });
        }
        Ok(Self { method, values })
    }

    fn type_error(&self, index: usize, expected: &'static str) -> UsageError {
        UsageError::ArgumentType {
            method: self.method,
            index,
            expected,
        }
    }

    fn value(&self, index: usize) -> &'a HostValue {
        &self.values[index]
    }

    fn uint(&self, index: usize) -> Result<u32, UsageError> {
        self.value(index)
            .as_integer()
            .and_then(|value| u32::try_from(value).ok())
            .ok_or_else(|| self.type_error(index, "GLenum"))
    }

    fn int(&self, index: usize) -> Result<i32, UsageError> {
        self.value(index)
            .as_integer()
            .and_then(|value| i32::try_from(value).ok())
            .ok_or_else(|| self.type_error(index, "GLint"))
    }

    /// A nullable object argument.
    fn object<T>(
        &self,
        index: usize,
        expected: &'static str,
        extract: impl Fn(&HostValue) -> Option<T>,
    ) -> Result<Option<T>, UsageError> {
        match self.value(index) {
            HostValue::Null => Ok(None),
            value => extract(value).map(Some).ok_or_else(|| self.type_error(index, expected)),
        }
    }

    fn texture(&self, index: usize) -> Result<Option<WebGLTexture>, UsageError> {
        self.object(index, "WebGLTexture", |v| match v {
            HostValue::Texture(t) => Some(*t),
            _ => None,
        })
    }

    fn renderbuffer(&self, index: usize) -> Result<Option<WebGLRenderbuffer>, UsageError> {
        self.object(index, "WebGLRenderbuffer", |v| match v {
            HostValue::Renderbuffer(rb) => Some(*rb),
            _ => None,
        })
    }

    fn framebuffer(&self, index: usize) -> Result<Option<WebGLFramebuffer>, UsageError> {
        self.object(index, "WebGLFramebuffer", |v| match v {
            HostValue::Framebuffer(fb) => Some(*fb),
            _ => None,
        })
    }

    fn vertex_array(&self, index: usize) -> Result<Option<WebGLVertexArrayObject>, UsageError> {
        self.object(index, "WebGLVertexArrayObject", |v| match v {
            HostValue::VertexArray(vao) => Some(*vao),
            _ => None,
        })
    }

    /// Pixel source of the dimensioned `texImage*` overloads.
    fn pixels(&self, index: usize) -> Result<TexImageSource<'a>, UsageError> {
        match self.value(index) {
            HostValue::Null => Ok(TexImageSource::Pixels(None)),
            HostValue::Bytes(bytes) => Ok(TexImageSource::Pixels(Some(bytes.as_slice()))),
            HostValue::Image(image) => Ok(TexImageSource::Image(image)),
            value => value
                .as_integer()
                .and_then(|offset| u64::try_from(offset).ok())
                .map(TexImageSource::UnpackOffset)
                .ok_or_else(|| self.type_error(index, "ArrayBufferView or offset")),
        }
    }

    fn rect(&self, start: usize) -> Result<[i32; 4], UsageError> {
        Ok([
            self.int(start)?,
            self.int(start + 1)?,
            self.int(start + 2)?,
            self.int(start + 3)?,
        ])
    }
}

impl<G: NativeGl> WebGL2RenderingContext<G> {
    /// Dispatch a host call by WebGL method name.
    pub fn invoke(&mut self, method: &str, args: &[HostValue]) -> Result<HostValue, UsageError> {
        trace!(method, argc = args.len(), "host call");
        match method {
            "getError" => {
                Args::new("getError", args, &[0], "0")?;
                Ok(HostValue::Int(self.get_error() as i64))
            }
            "pixelStorei" => {
                let a = Args::new("pixelStorei", args, &[2], "2")?;
                self.pixel_storei(a.uint(0)?, a.int(1)?);
                Ok(HostValue::Null)
            }

            // Textures
            "createTexture" => {
                Args::new("createTexture", args, &[0], "0")?;
                Ok(HostValue::Texture(self.create_texture()))
            }
            "bindTexture" => {
                let a = Args::new("bindTexture", args, &[2], "2")?;
                self.bind_texture(a.uint(0)?, a.texture(1)?);
                Ok(HostValue::Null)
            }
            "deleteTexture" => {
                let a = Args::new("deleteTexture", args, &[1], "1")?;
                self.delete_texture(a.texture(0)?);
                Ok(HostValue::Null)
            }
            "activeTexture" => {
                let a = Args::new("activeTexture", args, &[1], "1")?;
                self.active_texture(a.uint(0)?);
                Ok(HostValue::Null)
            }
            "texImage2D" => {
                let a = Args::new("texImage2D", args, &[6, 9], "6 or 9")?;
                if args.len() == 6 {
                    let HostValue::Image(image) = a.value(5) else {
                        return Err(a.type_error(5, "TexImageSource"));
                    };
                    self.tex_image_2d_image(a.uint(0)?, a.int(1)?, a.uint(2)?, a.uint(3)?, a.uint(4)?, image);
                } else {
                    self.tex_image_2d(
                        a.uint(0)?,
                        a.int(1)?,
                        a.uint(2)?,
                        a.int(3)?,
                        a.int(4)?,
                        a.int(5)?,
                        a.uint(6)?,
                        a.uint(7)?,
                        a.pixels(8)?,
                    );
                }
                Ok(HostValue::Null)
            }
            "texImage3D" => {
                let a = Args::new("texImage3D", args, &[10], "10")?;
                self.tex_image_3d(
                    a.uint(0)?,
                    a.int(1)?,
                    a.uint(2)?,
                    a.int(3)?,
                    a.int(4)?,
                    a.int(5)?,
                    a.int(6)?,
                    a.uint(7)?,
                    a.uint(8)?,
                    a.pixels(9)?,
                );
                Ok(HostValue::Null)
            }
            "texStorage2D" => {
                let a = Args::new("texStorage2D", args, &[5], "5")?;
                self.tex_storage_2d(a.uint(0)?, a.int(1)?, a.uint(2)?, a.int(3)?, a.int(4)?);
                Ok(HostValue::Null)
            }

            // Renderbuffers
            "createRenderbuffer" => {
                Args::new("createRenderbuffer", args, &[0], "0")?;
                Ok(HostValue::Renderbuffer(self.create_renderbuffer()))
            }
            "bindRenderbuffer" => {
                let a = Args::new("bindRenderbuffer", args, &[2], "2")?;
                self.bind_renderbuffer(a.uint(0)?, a.renderbuffer(1)?);
                Ok(HostValue::Null)
            }
            "deleteRenderbuffer" => {
                let a = Args::new("deleteRenderbuffer", args, &[1], "1")?;
                self.delete_renderbuffer(a.renderbuffer(0)?);
                Ok(HostValue::Null)
            }
            "renderbufferStorage" => {
                let a = Args::new("renderbufferStorage", args, &[4], "4")?;
                self.renderbuffer_storage(a.uint(0)?, a.uint(1)?, a.int(2)?, a.int(3)?);
                Ok(HostValue::Null)
            }
            "renderbufferStorageMultisample" => {
                let a = Args::new("renderbufferStorageMultisample", args, &[5], "5")?;
                self.renderbuffer_storage_multisample(a.uint(0)?, a.int(1)?, a.uint(2)?, a.int(3)?, a.int(4)?);
                Ok(HostValue::Null)
            }

            // Framebuffers
            "createFramebuffer" => {
                Args::new("createFramebuffer", args, &[0], "0")?;
                Ok(HostValue::Framebuffer(self.create_framebuffer()))
            }
            "bindFramebuffer" => {
                let a = Args::new("bindFramebuffer", args, &[2], "2")?;
                self.bind_framebuffer(a.uint(0)?, a.framebuffer(1)?);
                Ok(HostValue::Null)
            }
            "deleteFramebuffer" => {
                let a = Args::new("deleteFramebuffer", args, &[1], "1")?;
                self.delete_framebuffer(a.framebuffer(0)?);
                Ok(HostValue::Null)
            }
            "framebufferTexture2D" => {
                let a = Args::new("framebufferTexture2D", args, &[5], "5")?;
                self.framebuffer_texture_2d(a.uint(0)?, a.uint(1)?, a.uint(2)?, a.texture(3)?, a.int(4)?);
                Ok(HostValue::Null)
            }
            "framebufferRenderbuffer" => {
                let a = Args::new("framebufferRenderbuffer", args, &[4], "4")?;
                self.framebuffer_renderbuffer(a.uint(0)?, a.uint(1)?, a.uint(2)?, a.renderbuffer(3)?);
                Ok(HostValue::Null)
            }
            "checkFramebufferStatus" => {
                let a = Args::new("checkFramebufferStatus", args, &[1], "1")?;
                Ok(HostValue::Int(self.check_framebuffer_status(a.uint(0)?) as i64))
            }
            "drawBuffers" => {
                let a = Args::new("drawBuffers", args, &[1], "1")?;
                let HostValue::List(items) = a.value(0) else {
                    return Err(a.type_error(0, "sequence<GLenum>"));
                };
                let buffers = items
                    .iter()
                    .map(|item| item.as_integer().and_then(|v| u32::try_from(v).ok()))
                    .collect::<Option<Vec<u32>>>()
                    .ok_or_else(|| a.type_error(0, "sequence<GLenum>"))?;
                self.draw_buffers(&buffers);
                Ok(HostValue::Null)
            }
            "blitFramebuffer" => {
                let a = Args::new("blitFramebuffer", args, &[10], "10")?;
                self.blit_framebuffer(a.rect(0)?, a.rect(4)?, a.uint(8)?, a.uint(9)?);
                Ok(HostValue::Null)
            }

            // Vertex arrays
            "createVertexArray" => {
                Args::new("createVertexArray", args, &[0], "0")?;
                Ok(HostValue::VertexArray(self.create_vertex_array()))
            }
            "bindVertexArray" => {
                let a = Args::new("bindVertexArray", args, &[1], "1")?;
                self.bind_vertex_array(a.vertex_array(0)?);
                Ok(HostValue::Null)
            }
            "deleteVertexArray" => {
                let a = Args::new("deleteVertexArray", args, &[1], "1")?;
                self.delete_vertex_array(a.vertex_array(0)?);
                Ok(HostValue::Null)
            }
            "isVertexArray" => {
                let a = Args::new("isVertexArray", args, &[1], "1")?;
                // Anything that is not a vertex array simply is not one.
                let array = a.vertex_array(0).ok().flatten();
                Ok(HostValue::Bool(self.is_vertex_array(array)))
            }

            other => Err(UsageError::UnknownMethod(other.to_string())),
        }
    }
}
