//! Framebuffer attachment bookkeeping.
//!
//! Each attachment caches the size, format and sample count of the image it
//! refers to. Whenever storage of an attached texture or renderbuffer is
//! redefined, [`refresh_attachments`] brings every framebuffer referencing
//! it back in sync. Completeness is only evaluated on demand.

use std::collections::BTreeMap;

use crate::constants;
use crate::formats;
use crate::object::{LifetimeState, ObjectData, ObjectId};
use crate::registry::ObjectRegistry;

/// A framebuffer attachment point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum AttachmentPoint {
    Color(u32),
    Depth,
    Stencil,
    DepthStencil,
}

impl AttachmentPoint {
    /// Parse an attachment enum; color indices must be below `max_draw_buffers`.
    pub fn from_enum(attachment: u32, max_draw_buffers: u32) -> Option<Self> {
        match attachment {
            constants::DEPTH_ATTACHMENT => Some(Self::Depth),
            constants::STENCIL_ATTACHMENT => Some(Self::Stencil),
            constants::DEPTH_STENCIL_ATTACHMENT => Some(Self::DepthStencil),
            a if (constants::COLOR_ATTACHMENT0..=constants::COLOR_ATTACHMENT15).contains(&a) => {
                let index = a - constants::COLOR_ATTACHMENT0;
                (index < max_draw_buffers).then_some(Self::Color(index))
            }
            _ => None,
        }
    }

    pub fn to_enum(self) -> u32 {
        match self {
            Self::Color(index) => constants::COLOR_ATTACHMENT0 + index,
            Self::Depth => constants::DEPTH_ATTACHMENT,
            Self::Stencil => constants::STENCIL_ATTACHMENT,
            Self::DepthStencil => constants::DEPTH_STENCIL_ATTACHMENT,
        }
    }
}

/// The image an attachment refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachedImage {
    Texture { id: ObjectId, textarget: u32, level: i32 },
    Renderbuffer { id: ObjectId },
}

impl AttachedImage {
    pub fn object(&self) -> ObjectId {
        match *self {
            Self::Texture { id, .. } | Self::Renderbuffer { id } => id,
        }
    }
}

/// An attachment entry with the attached image's cached description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment {
    pub image: AttachedImage,
    pub width: i32,
    pub height: i32,
    pub internal_format: u32,
    pub samples: i32,
}

impl Attachment {
    /// An entry whose image has no storage yet.
    pub fn undefined(image: AttachedImage) -> Self {
        Self {
            image,
            width: 0,
            height: 0,
            internal_format: 0,
            samples: 0,
        }
    }

    /// Describe `image` from the current shadow state of its object.
    pub fn describe(image: AttachedImage, data: &ObjectData) -> Self {
        let mut entry = Self::undefined(image);
        match (image, data) {
            (AttachedImage::Texture { level, .. }, ObjectData::Texture(tex)) => {
                if let Some(info) = usize::try_from(level).ok().and_then(|l| tex.level(l)) {
                    entry.width = info.width;
                    entry.height = info.height;
                    entry.internal_format = tex.internal_format;
                }
            }
            (AttachedImage::Renderbuffer { .. }, ObjectData::Renderbuffer(rb)) => {
                entry.width = rb.width;
                entry.height = rb.height;
                entry.internal_format = rb.internal_format;
                entry.samples = rb.samples;
            }
            _ => {}
        }
        entry
    }
}

/// Framebuffer shadow state.
#[derive(Debug, Clone, PartialEq)]
pub struct FramebufferData {
    pub attachments: BTreeMap<AttachmentPoint, Attachment>,
    pub draw_buffers: Vec<u32>,
}

impl Default for FramebufferData {
    fn default() -> Self {
        Self {
            attachments: BTreeMap::new(),
            draw_buffers: vec![constants::COLOR_ATTACHMENT0],
        }
    }
}

impl FramebufferData {
    pub fn attachment(&self, point: AttachmentPoint) -> Option<&Attachment> {
        self.attachments.get(&point)
    }

    /// Replace the entry at `point`, returning the previous one.
    pub fn set(&mut self, point: AttachmentPoint, attachment: Option<Attachment>) -> Option<Attachment> {
        match attachment {
            Some(attachment) => self.attachments.insert(point, attachment),
            None => self.attachments.remove(&point),
        }
    }

    /// Whether any attachment refers to `id`.
    pub fn references(&self, id: ObjectId) -> bool {
        self.attachments.values().any(|a| a.image.object() == id)
    }

    /// Attachment points currently holding `id`.
    pub fn points_holding(&self, id: ObjectId) -> Vec<AttachmentPoint> {
        self.attachments
            .iter()
            .filter(|(_, a)| a.image.object() == id)
            .map(|(point, _)| *point)
            .collect()
    }

    /// One entry per attachment slot, so the same object can appear twice.
    pub fn attached_objects(&self) -> Vec<ObjectId> {
        self.attachments.values().map(|a| a.image.object()).collect()
    }

    /// The attachment providing depth, if any.
    pub fn depth_attachment(&self) -> Option<&Attachment> {
        self.attachment(AttachmentPoint::DepthStencil)
            .or_else(|| self.attachment(AttachmentPoint::Depth))
    }

    /// The attachment providing stencil, if any.
    pub fn stencil_attachment(&self) -> Option<&Attachment> {
        self.attachment(AttachmentPoint::DepthStencil)
            .or_else(|| self.attachment(AttachmentPoint::Stencil))
    }

    /// `checkFramebufferStatus` evaluated against shadow state.
    pub fn status(&self) -> u32 {
        if self.attachments.is_empty() {
            return constants::FRAMEBUFFER_INCOMPLETE_MISSING_ATTACHMENT;
        }

        let has_depth_stencil = self.attachments.contains_key(&AttachmentPoint::DepthStencil);
        if has_depth_stencil
            && (self.attachments.contains_key(&AttachmentPoint::Depth)
                || self.attachments.contains_key(&AttachmentPoint::Stencil))
        {
            return constants::FRAMEBUFFER_UNSUPPORTED;
        }

        for (point, a) in &self.attachments {
            if a.width <= 0 || a.height <= 0 || !format_fits(*point, a.internal_format) {
                return constants::FRAMEBUFFER_INCOMPLETE_ATTACHMENT;
            }
        }

        let mut entries = self.attachments.values();
        if let Some(first) = entries.next() {
            for a in entries {
                if a.samples != first.samples {
                    return constants::FRAMEBUFFER_INCOMPLETE_MULTISAMPLE;
                }
                if a.width != first.width || a.height != first.height {
                    return constants::FRAMEBUFFER_INCOMPLETE_DIMENSIONS;
                }
            }
        }

        constants::FRAMEBUFFER_COMPLETE
    }
}

fn format_fits(point: AttachmentPoint, internal_format: u32) -> bool {
    let depth = formats::is_depth_format(internal_format);
    let stencil = formats::has_stencil(internal_format);
    match point {
        AttachmentPoint::Color(_) => !depth && !stencil,
        AttachmentPoint::Depth => depth,
        AttachmentPoint::Stencil => stencil,
        AttachmentPoint::DepthStencil => depth && stencil,
    }
}

/// Recompute the cached entry of every attachment that refers to `object`.
///
/// Framebuffers whose native object is already gone are skipped.
pub fn refresh_attachments(registry: &mut ObjectRegistry, object: ObjectId) {
    let Some(source) = registry.get(object).map(|record| record.data.clone()) else {
        return;
    };

    let framebuffers: Vec<ObjectId> = registry
        .iter()
        .filter(|(_, record)| record.state != LifetimeState::Deleted)
        .filter(|(_, record)| matches!(&record.data, ObjectData::Framebuffer(fb) if fb.references(object)))
        .map(|(id, _)| id)
        .collect();

    for fb_id in framebuffers {
        if let Some(ObjectData::Framebuffer(fb)) = registry.get_mut(fb_id).map(|record| &mut record.data) {
            for point in fb.points_holding(object) {
                if let Some(entry) = fb.attachments.get_mut(&point) {
                    *entry = Attachment::describe(entry.image, &source);
                }
            }
        }
    }
}
