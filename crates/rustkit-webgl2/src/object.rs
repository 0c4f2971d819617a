//! Object handles and shadow payloads.
//!
//! The set of object kinds is closed, so kinds are a tagged enum
//! ([`ObjectKind`] / [`ObjectData`]) and what each kind may take part in is
//! expressed with marker traits on the typed handles.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::framebuffer::FramebufferData;

// ==================== Identifiers ====================

/// Unique context identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ContextId(u64);

impl ContextId {
    pub(crate) fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Registry-local object identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    pub fn id(&self) -> u32 {
        self.0
    }
}

/// The kinds of objects a registry tracks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectKind {
    Texture,
    Renderbuffer,
    Framebuffer,
    VertexArray,
}

/// Where an object is in its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifetimeState {
    Live,
    /// Deletion requested while something still references the object.
    PendingDelete,
    /// The native object is gone.
    Deleted,
}

/// Untyped handle: which context, which object, which kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle {
    pub(crate) context: ContextId,
    pub(crate) id: ObjectId,
    pub(crate) kind: ObjectKind,
}

impl ObjectHandle {
    pub fn context(&self) -> ContextId {
        self.context
    }

    pub fn id(&self) -> ObjectId {
        self.id
    }

    pub fn kind(&self) -> ObjectKind {
        self.kind
    }
}

// ==================== Typed handles ====================

/// A typed WebGL object handle.
pub trait GLObject: Copy {
    const KIND: ObjectKind;

    fn handle(&self) -> ObjectHandle;
}

/// Objects that occupy binding points.
pub trait Bindable: GLObject {}

/// Objects the host may delete.
pub trait Deletable: GLObject {}

/// Objects whose images can be attached to a framebuffer.
pub trait Attachable: GLObject {}

macro_rules! gl_object {
    ($(#[$meta:meta])* $name:ident => $kind:ident: $($cap:ident),*) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub struct $name(ObjectHandle);

        impl $name {
            pub(crate) fn from_handle(handle: ObjectHandle) -> Self {
                debug_assert_eq!(handle.kind, ObjectKind::$kind);
                Self(handle)
            }
        }

        impl GLObject for $name {
            const KIND: ObjectKind = ObjectKind::$kind;

            fn handle(&self) -> ObjectHandle {
                self.0
            }
        }

        $(impl $cap for $name {})*
    };
}

gl_object!(
    /// `WebGLTexture`.
    WebGLTexture => Texture: Bindable, Deletable, Attachable
);
gl_object!(
    /// `WebGLRenderbuffer`.
    WebGLRenderbuffer => Renderbuffer: Bindable, Deletable, Attachable
);
gl_object!(
    /// `WebGLFramebuffer`.
    WebGLFramebuffer => Framebuffer: Bindable, Deletable
);
gl_object!(
    /// `WebGLVertexArrayObject`.
    WebGLVertexArrayObject => VertexArray: Bindable, Deletable
);

// ==================== Shadow payloads ====================

/// Dimensions of one mip level.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelInfo {
    pub width: i32,
    pub height: i32,
    pub depth: i32,
}

/// Texture shadow state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextureData {
    /// Target fixed by the first bind.
    pub target: Option<u32>,
    /// Indexed by mip level.
    pub levels: Vec<LevelInfo>,
    pub internal_format: u32,
    pub format: u32,
    pub ty: u32,
    /// Set by texStorage; storage can never be redefined afterwards.
    pub immutable: bool,
}

impl TextureData {
    /// Metadata for `level`, if it has been defined.
    pub fn level(&self, level: usize) -> Option<&LevelInfo> {
        self.levels.get(level).filter(|info| info.width > 0)
    }

    pub(crate) fn set_level(&mut self, level: usize, info: LevelInfo) {
        if self.levels.len() <= level {
            self.levels.resize(level + 1, LevelInfo::default());
        }
        self.levels[level] = info;
    }
}

/// Renderbuffer shadow state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderbufferData {
    pub width: i32,
    pub height: i32,
    pub internal_format: u32,
    pub samples: i32,
}

/// Per-kind payload of a registry record.
#[derive(Debug, Clone, PartialEq)]
pub enum ObjectData {
    Texture(TextureData),
    Renderbuffer(RenderbufferData),
    Framebuffer(FramebufferData),
    VertexArray,
}

impl ObjectData {
    pub(crate) fn empty(kind: ObjectKind) -> Self {
        match kind {
            ObjectKind::Texture => Self::Texture(TextureData::default()),
            ObjectKind::Renderbuffer => Self::Renderbuffer(RenderbufferData::default()),
            ObjectKind::Framebuffer => Self::Framebuffer(FramebufferData::default()),
            ObjectKind::VertexArray => Self::VertexArray,
        }
    }

    pub fn kind(&self) -> ObjectKind {
        match self {
            Self::Texture(_) => ObjectKind::Texture,
            Self::Renderbuffer(_) => ObjectKind::Renderbuffer,
            Self::Framebuffer(_) => ObjectKind::Framebuffer,
            Self::VertexArray => ObjectKind::VertexArray,
        }
    }
}
