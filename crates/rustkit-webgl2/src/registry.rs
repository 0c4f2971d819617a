//! Object registry and lifetime tracking.
//!
//! Every wrapped native object has one record here holding its reference
//! count and lifetime state. References come from binding points and
//! framebuffer attachments. A native delete happens exactly once: when a
//! delete has been requested and the last reference goes away.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::native::{NativeGl, NativeHandle};
use crate::object::{ContextId, LifetimeState, ObjectData, ObjectHandle, ObjectId, ObjectKind};

/// Registry entry for one native object.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectRecord {
    pub native: NativeHandle,
    pub ref_count: u32,
    pub state: LifetimeState,
    /// Set the first time the object is bound; the `is*` queries need it.
    pub bound_once: bool,
    pub data: ObjectData,
}

impl ObjectRecord {
    pub fn kind(&self) -> ObjectKind {
        self.data.kind()
    }

    pub fn is_live(&self) -> bool {
        self.state == LifetimeState::Live
    }
}

/// Per-context object registry.
#[derive(Debug)]
pub struct ObjectRegistry {
    context: ContextId,
    next_id: u32,
    objects: HashMap<ObjectId, ObjectRecord>,
}

impl ObjectRegistry {
    pub fn new(context: ContextId) -> Self {
        Self {
            context,
            next_id: 1,
            objects: HashMap::new(),
        }
    }

    pub fn context(&self) -> ContextId {
        self.context
    }

    /// Wrap a freshly generated native object.
    pub fn register(&mut self, kind: ObjectKind, native: NativeHandle) -> ObjectHandle {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(
            id,
            ObjectRecord {
                native,
                ref_count: 0,
                state: LifetimeState::Live,
                bound_once: false,
                data: ObjectData::empty(kind),
            },
        );
        debug!(?kind, native, id = id.0, "registered object");
        ObjectHandle {
            context: self.context,
            id,
            kind,
        }
    }

    /// Drop the record for `handle` without touching the native object.
    pub fn unregister(&mut self, handle: &ObjectHandle) -> Option<ObjectRecord> {
        if !self.check_owns(handle, handle.kind) {
            return None;
        }
        self.objects.remove(&handle.id)
    }

    /// Whether `handle` belongs to this registry and is of kind `expected`.
    pub fn check_owns(&self, handle: &ObjectHandle, expected: ObjectKind) -> bool {
        handle.context == self.context
            && handle.kind == expected
            && self
                .objects
                .get(&handle.id)
                .is_some_and(|record| record.kind() == expected)
    }

    pub fn get(&self, id: ObjectId) -> Option<&ObjectRecord> {
        self.objects.get(&id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut ObjectRecord> {
        self.objects.get_mut(&id)
    }

    pub fn state(&self, id: ObjectId) -> Option<LifetimeState> {
        self.objects.get(&id).map(|record| record.state)
    }

    pub fn ref_count(&self, id: ObjectId) -> u32 {
        self.objects.get(&id).map_or(0, |record| record.ref_count)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ObjectId, &ObjectRecord)> {
        self.objects.iter().map(|(id, record)| (*id, record))
    }

    /// Number of records whose native object still exists.
    pub fn live_count(&self) -> usize {
        self.objects
            .values()
            .filter(|record| record.state != LifetimeState::Deleted)
            .count()
    }

    /// Request deletion. Returns true if the native object was deleted now.
    pub fn request_delete<G: NativeGl>(&mut self, id: ObjectId, gl: &mut G) -> bool {
        let Some(record) = self.objects.get_mut(&id) else {
            return false;
        };
        if record.state != LifetimeState::Live {
            return false;
        }
        record.state = LifetimeState::PendingDelete;
        if record.ref_count > 0 {
            debug!(id = id.0, refs = record.ref_count, "deferring delete");
        }
        self.check_delete(id, gl);
        self.state(id) == Some(LifetimeState::Deleted)
    }

    /// Move `slot` to `object`, adjusting both reference counts.
    pub fn bind<G: NativeGl>(&mut self, slot: &mut Option<ObjectId>, object: Option<ObjectId>, gl: &mut G) {
        if *slot == object {
            return;
        }
        if let Some(id) = object {
            self.retain(id);
            if let Some(record) = self.objects.get_mut(&id) {
                record.bound_once = true;
            }
        }
        if let Some(previous) = std::mem::replace(slot, object) {
            self.release(previous, gl);
        }
    }

    pub fn retain(&mut self, id: ObjectId) {
        if let Some(record) = self.objects.get_mut(&id) {
            record.ref_count += 1;
        }
    }

    pub fn release<G: NativeGl>(&mut self, id: ObjectId, gl: &mut G) {
        let Some(record) = self.objects.get_mut(&id) else {
            return;
        };
        match record.ref_count.checked_sub(1) {
            Some(count) => record.ref_count = count,
            None => warn!(id = id.0, "released an object with no references"),
        }
        self.check_delete(id, gl);
    }

    /// Perform the deferred native delete once nothing references the object.
    ///
    /// Deleting a framebuffer drops the references its attachments hold,
    /// which can in turn finish pending deletes of the attached images.
    pub fn check_delete<G: NativeGl>(&mut self, id: ObjectId, gl: &mut G) {
        let mut queue = vec![id];
        while let Some(id) = queue.pop() {
            let Some(record) = self.objects.get_mut(&id) else {
                continue;
            };
            if record.state != LifetimeState::PendingDelete || record.ref_count > 0 {
                continue;
            }

            let kind = record.kind();
            delete_native(gl, kind, record.native);
            debug!(?kind, native = record.native, id = id.0, "deleted native object");
            record.state = LifetimeState::Deleted;
            let released = match std::mem::replace(&mut record.data, ObjectData::empty(kind)) {
                ObjectData::Framebuffer(fb) => fb.attached_objects(),
                _ => Vec::new(),
            };

            for attached in released {
                if let Some(record) = self.objects.get_mut(&attached) {
                    record.ref_count = record.ref_count.saturating_sub(1);
                    queue.push(attached);
                }
            }
        }
    }

    /// Delete every native object that still exists and forget all records.
    pub fn destroy_all<G: NativeGl>(&mut self, gl: &mut G) {
        for (_, record) in self.objects.drain() {
            if record.state != LifetimeState::Deleted {
                delete_native(gl, record.kind(), record.native);
            }
        }
        debug!("registry destroyed");
    }
}

fn delete_native<G: NativeGl>(gl: &mut G, kind: ObjectKind, native: NativeHandle) {
    match kind {
        ObjectKind::Texture => gl.delete_texture(native),
        ObjectKind::Renderbuffer => gl.delete_renderbuffer(native),
        ObjectKind::Framebuffer => gl.delete_framebuffer(native),
        ObjectKind::VertexArray => gl.delete_vertex_array(native),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::framebuffer::{AttachedImage, Attachment, AttachmentPoint};
    use crate::recording::{NativeCall, RecordingGl};

    fn setup() -> (ObjectRegistry, RecordingGl) {
        (ObjectRegistry::new(ContextId::next()), RecordingGl::new())
    }

    fn native_deletes(gl: &RecordingGl) -> usize {
        gl.count(NativeCall::is_delete)
    }

    #[test]
    fn test_check_owns_rejects_foreign_and_wrong_kind() {
        let (mut registry, _) = setup();
        let mut other = ObjectRegistry::new(ContextId::next());

        let tex = registry.register(ObjectKind::Texture, 1);
        let foreign = other.register(ObjectKind::Texture, 1);

        assert!(registry.check_owns(&tex, ObjectKind::Texture));
        assert!(!registry.check_owns(&tex, ObjectKind::Renderbuffer));
        assert!(!registry.check_owns(&foreign, ObjectKind::Texture));
    }

    #[test]
    fn test_delete_unreferenced_object_is_immediate() {
        let (mut registry, mut gl) = setup();
        let tex = registry.register(ObjectKind::Texture, 7);
        assert!(registry.request_delete(tex.id, &mut gl));
        assert_eq!(registry.state(tex.id), Some(LifetimeState::Deleted));
        assert_eq!(gl.calls(), &[NativeCall::DeleteTexture(7)]);
    }

    #[test]
    fn test_delete_is_deferred_until_last_unbind() {
        let (mut registry, mut gl) = setup();
        let rb = registry.register(ObjectKind::Renderbuffer, 3);
        let mut slot_a = None;
        let mut slot_b = None;

        registry.bind(&mut slot_a, Some(rb.id), &mut gl);
        registry.bind(&mut slot_b, Some(rb.id), &mut gl);
        assert_eq!(registry.ref_count(rb.id), 2);

        assert!(!registry.request_delete(rb.id, &mut gl));
        assert_eq!(registry.state(rb.id), Some(LifetimeState::PendingDelete));

        registry.bind(&mut slot_a, None, &mut gl);
        assert_eq!(native_deletes(&gl), 0);

        registry.bind(&mut slot_b, None, &mut gl);
        assert_eq!(registry.ref_count(rb.id), 0);
        assert_eq!(registry.state(rb.id), Some(LifetimeState::Deleted));
        assert_eq!(native_deletes(&gl), 1);

        // A second request is a no-op.
        assert!(!registry.request_delete(rb.id, &mut gl));
        assert_eq!(native_deletes(&gl), 1);
    }

    #[test]
    fn test_ref_count_tracks_slots_holding_object() {
        let (mut registry, mut gl) = setup();
        let a = registry.register(ObjectKind::Texture, 1);
        let b = registry.register(ObjectKind::Texture, 2);
        let mut slots = [None; 4];

        for slot in slots.iter_mut() {
            registry.bind(slot, Some(a.id), &mut gl);
        }
        registry.bind(&mut slots[1], Some(b.id), &mut gl);
        registry.bind(&mut slots[2], Some(a.id), &mut gl);
        registry.bind(&mut slots[3], None, &mut gl);

        let holding = |id| slots.iter().filter(|s| **s == Some(id)).count() as u32;
        assert_eq!(registry.ref_count(a.id), holding(a.id));
        assert_eq!(registry.ref_count(b.id), holding(b.id));
    }

    #[test]
    fn test_framebuffer_delete_releases_attachments() {
        let (mut registry, mut gl) = setup();
        let fb = registry.register(ObjectKind::Framebuffer, 10);
        let rb = registry.register(ObjectKind::Renderbuffer, 11);

        registry.retain(rb.id);
        if let Some(ObjectData::Framebuffer(data)) = registry.get_mut(fb.id).map(|r| &mut r.data) {
            data.set(
                AttachmentPoint::Color(0),
                Some(Attachment::undefined(AttachedImage::Renderbuffer { id: rb.id })),
            );
        }

        registry.request_delete(rb.id, &mut gl);
        assert_eq!(registry.state(rb.id), Some(LifetimeState::PendingDelete));

        registry.request_delete(fb.id, &mut gl);
        assert_eq!(registry.state(fb.id), Some(LifetimeState::Deleted));
        assert_eq!(registry.state(rb.id), Some(LifetimeState::Deleted));
        assert_eq!(
            gl.calls(),
            &[NativeCall::DeleteFramebuffer(10), NativeCall::DeleteRenderbuffer(11)]
        );
    }

    #[test]
    fn test_destroy_all_deletes_survivors_once() {
        let (mut registry, mut gl) = setup();
        let a = registry.register(ObjectKind::VertexArray, 1);
        registry.register(ObjectKind::Framebuffer, 2);
        registry.request_delete(a.id, &mut gl);

        registry.destroy_all(&mut gl);
        assert_eq!(native_deletes(&gl), 2);
        assert_eq!(registry.live_count(), 0);
    }

    #[test]
    fn test_unregister_requires_ownership() {
        let (mut registry, _) = setup();
        let mut other = ObjectRegistry::new(ContextId::next());
        let tex = registry.register(ObjectKind::Texture, 1);
        let foreign = other.register(ObjectKind::Texture, 1);

        assert!(registry.unregister(&foreign).is_none());
        assert!(registry.unregister(&tex).is_some());
        assert!(!registry.check_owns(&tex, ObjectKind::Texture));
    }
}
