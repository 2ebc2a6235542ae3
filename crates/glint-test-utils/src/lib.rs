//! Recording draw sink for verifying batching behaviour without a GPU.
//!
//! [`RecordingSink`] implements [`DrawSink`] by keeping every submission it
//! receives, so tests can assert on draw counts, draw order, and which
//! texture/transform each vertex ended up under.

use glam::Mat4;
use glint_render::{DrawSink, SpriteVertex, TextureId};

/// One recorded draw submission.
#[derive(Debug, Clone)]
pub struct RecordedDraw {
    pub texture: TextureId,
    pub transform: Mat4,
    pub vertices: Vec<SpriteVertex>,
}

/// Records every submission for later assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    draws: Vec<RecordedDraw>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded draws, in submission order.
    pub fn draws(&self) -> &[RecordedDraw] {
        &self.draws
    }

    /// Number of draw submissions recorded.
    pub fn draw_count(&self) -> usize {
        self.draws.len()
    }

    /// Total vertices across all submissions.
    pub fn total_vertices(&self) -> usize {
        self.draws.iter().map(|d| d.vertices.len()).sum()
    }

    /// Vertex counts per submission, in order.
    pub fn vertex_counts(&self) -> Vec<usize> {
        self.draws.iter().map(|d| d.vertices.len()).collect()
    }

    /// Texture ids per submission, in order.
    pub fn textures(&self) -> Vec<TextureId> {
        self.draws.iter().map(|d| d.texture).collect()
    }

    /// Clear recorded draws (useful between test steps).
    pub fn clear(&mut self) {
        self.draws.clear();
    }
}

impl DrawSink for RecordingSink {
    fn submit(&mut self, texture: TextureId, transform: Mat4, vertices: &[SpriteVertex]) {
        self.draws.push(RecordedDraw {
            texture,
            transform,
            vertices: vertices.to_vec(),
        });
    }
}
