//! Sprite batching state machine.
//!
//! [`SpriteBatch`] accumulates vertices destined for one GPU program and
//! submits them in as few draws as possible. A submission ("flush") happens
//! only when it must: the active texture or transform changes, the staging
//! buffer fills up, or the caller forces one at the end of a frame.
//!
//! The batch never talks to the GPU directly. Every mutating operation takes
//! a [`DrawSink`], the seam where flushed geometry leaves the batch. The real
//! sink records draws for a wgpu render pass; tests substitute a recording
//! sink to observe submission boundaries.

use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use std::sync::atomic::{AtomicU64, Ordering};

/// Opaque identity of a GPU texture, used for state-change detection.
///
/// Ids are allocated from a process-wide counter and never reused, so two
/// equal ids always name the same texture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureId(u64);

impl TextureId {
    /// Allocate a fresh id.
    pub fn allocate() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }

    /// Get the raw u64 value.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

/// One vertex of sprite geometry.
///
/// Position is in whatever space the active transform maps to clip space
/// (framebuffer pixels for the orthographic setup); texcoords are
/// normalized to [0,1].
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct SpriteVertex {
    pub position: [f32; 2],
    pub texcoord: [f32; 2],
}

/// Where flushed geometry goes.
///
/// One `submit` call corresponds to exactly one GPU draw. Every vertex in
/// `vertices` was pushed while `texture` and `transform` were active, which
/// is the invariant the whole batching design exists to preserve.
pub trait DrawSink {
    fn submit(&mut self, texture: TextureId, transform: Mat4, vertices: &[SpriteVertex]);
}

/// Accumulates sprite vertices and flushes them on state changes.
///
/// The staging buffer has a fixed capacity chosen at creation; its
/// allocation lives for the lifetime of the batch. Texture and transform
/// start out unset (`None`), so the first `set_texture`/`set_transform` is
/// always observed as a change. An all-zero matrix is a legitimate
/// transform, distinct from unset.
pub struct SpriteBatch {
    staging: Vec<SpriteVertex>,
    capacity: usize,
    texture: Option<TextureId>,
    transform: Option<Mat4>,
}

impl SpriteBatch {
    /// Create a batch with staging room for `capacity` vertices.
    ///
    /// # Panics
    ///
    /// Panics when `capacity` is zero; a batch that can never hold a vertex
    /// is a programmer error.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "sprite batch capacity must be non-zero");
        Self {
            staging: Vec::with_capacity(capacity),
            capacity,
            texture: None,
            transform: None,
        }
    }

    /// Make `texture` the active texture, flushing buffered geometry under
    /// the previous one first. No-op when `texture` is already active.
    ///
    /// A single draw can only reference one texture; switching mid-batch
    /// without flushing would retroactively corrupt buffered vertices.
    pub fn set_texture(&mut self, sink: &mut dyn DrawSink, texture: TextureId) {
        if self.texture != Some(texture) {
            self.flush(sink);
            self.texture = Some(texture);
        }
    }

    /// Make `transform` the active transform, flushing buffered geometry
    /// under the previous one first. No-op when the value is unchanged.
    pub fn set_transform(&mut self, sink: &mut dyn DrawSink, transform: Mat4) {
        if self.transform != Some(transform) {
            self.flush(sink);
            self.transform = Some(transform);
        }
    }

    /// Append one vertex under the currently active texture and transform.
    ///
    /// When the staging buffer is full this flushes first (an overflow
    /// flush: it frees staging space without any state change), so pushing
    /// can never fail. Callers must set texture and transform before
    /// pushing the vertices that depend on them.
    pub fn push_vertex(&mut self, sink: &mut dyn DrawSink, x: f32, y: f32, u: f32, v: f32) {
        if self.staging.len() == self.capacity {
            self.flush(sink);
        }
        self.staging.push(SpriteVertex {
            position: [x, y],
            texcoord: [u, v],
        });
    }

    /// Submit all buffered vertices as one draw and reset the staging
    /// buffer. No-op when nothing is buffered.
    ///
    /// # Panics
    ///
    /// Panics if vertices were buffered while texture or transform was
    /// never set; the sprite emitter makes that unreachable in practice.
    pub fn flush(&mut self, sink: &mut dyn DrawSink) {
        if self.staging.is_empty() {
            return;
        }

        let Some(texture) = self.texture else {
            panic!("flushing {} vertices with no active texture", self.staging.len());
        };
        let Some(transform) = self.transform else {
            panic!("flushing {} vertices with no active transform", self.staging.len());
        };

        sink.submit(texture, transform, &self.staging);
        self.staging.clear();
    }

    /// Number of buffered vertices.
    pub fn len(&self) -> usize {
        self.staging.len()
    }

    /// Whether nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.staging.is_empty()
    }

    /// The fixed staging capacity in vertices.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// The active texture, if one has been set.
    pub fn active_texture(&self) -> Option<TextureId> {
        self.texture
    }

    /// The active transform, if one has been set.
    pub fn active_transform(&self) -> Option<Mat4> {
        self.transform
    }
}
