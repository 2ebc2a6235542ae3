//! Sprite emission: one draw request in, six vertices out.

use crate::batch::{DrawSink, SpriteBatch, TextureId};
use glint_core::geometry::{Pos, Rect, Size};

/// The part of a texture the emitter needs: its identity and pixel
/// dimensions for UV normalization. Plain copy, no GPU resource attached,
/// so tests can fabricate one.
#[derive(Debug, Clone, Copy)]
pub struct TextureInfo {
    pub id: TextureId,
    pub width: u32,
    pub height: u32,
}

/// Emit one sprite as two triangles into `batch`.
///
/// `dest` is the destination top-left in framebuffer space, `size` the
/// on-screen sprite size, and `src` the source rectangle in texture pixel
/// space (for an atlas, the sub-image of one sprite). Sets the texture
/// first so the pushed vertices are guaranteed to be drawn with it.
///
/// Source rectangles are not validated; out-of-bounds values sample
/// outside the intended sprite. Debug builds assert non-negative spans.
pub fn emit_sprite(
    batch: &mut SpriteBatch,
    sink: &mut dyn DrawSink,
    texture: TextureInfo,
    dest: Pos<f32>,
    size: Size<f32>,
    src: Rect<f32>,
) {
    debug_assert!(src.width >= 0.0 && src.height >= 0.0, "negative source rect span");

    batch.set_texture(sink, texture.id);

    let x1 = dest.x;
    let y1 = dest.y;
    let x2 = dest.x + size.width;
    let y2 = dest.y + size.height;

    let tex_width = texture.width as f32;
    let tex_height = texture.height as f32;
    let u1 = src.x / tex_width;
    let v1 = src.y / tex_height;
    let u2 = (src.x + src.width) / tex_width;
    let v2 = (src.y + src.height) / tex_height;

    // Triangle 1: top-left, bottom-right, bottom-left.
    batch.push_vertex(sink, x1, y1, u1, v1);
    batch.push_vertex(sink, x2, y2, u2, v2);
    batch.push_vertex(sink, x1, y2, u1, v2);

    // Triangle 2: top-left, top-right, bottom-right.
    batch.push_vertex(sink, x1, y1, u1, v1);
    batch.push_vertex(sink, x2, y1, u2, v1);
    batch.push_vertex(sink, x2, y2, u2, v2);
}

/// Vertex count of one emitted sprite.
pub const VERTICES_PER_SPRITE: usize = 6;

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Mat4;

    struct VecSink(Vec<(TextureId, Vec<crate::batch::SpriteVertex>)>);

    impl DrawSink for VecSink {
        fn submit(
            &mut self,
            texture: TextureId,
            _transform: Mat4,
            vertices: &[crate::batch::SpriteVertex],
        ) {
            self.0.push((texture, vertices.to_vec()));
        }
    }

    fn test_texture(width: u32, height: u32) -> TextureInfo {
        TextureInfo {
            id: TextureId::allocate(),
            width,
            height,
        }
    }

    #[test]
    fn test_quad_corners_and_uvs() {
        let mut sink = VecSink(Vec::new());
        let mut batch = SpriteBatch::new(64);
        batch.set_transform(&mut sink, Mat4::IDENTITY);

        let texture = test_texture(256, 128);
        emit_sprite(
            &mut batch,
            &mut sink,
            texture,
            Pos::new(10.0, 20.0),
            Size::new(48.0, 48.0),
            Rect::new(64.0, 32.0, 64.0, 32.0),
        );
        batch.flush(&mut sink);

        let vertices = &sink.0[0].1;
        assert_eq!(vertices.len(), VERTICES_PER_SPRITE);

        // Winding: (TL, BR, BL), (TL, TR, BR).
        assert_eq!(vertices[0].position, [10.0, 20.0]);
        assert_eq!(vertices[1].position, [58.0, 68.0]);
        assert_eq!(vertices[2].position, [10.0, 68.0]);
        assert_eq!(vertices[3].position, [10.0, 20.0]);
        assert_eq!(vertices[4].position, [58.0, 20.0]);
        assert_eq!(vertices[5].position, [58.0, 68.0]);

        // UVs normalized against the 256x128 texture.
        assert_eq!(vertices[0].texcoord, [0.25, 0.25]);
        assert_eq!(vertices[1].texcoord, [0.5, 0.5]);
        assert_eq!(vertices[4].texcoord, [0.5, 0.25]);
    }

    #[test]
    fn test_emit_sets_texture_before_pushing() {
        let mut sink = VecSink(Vec::new());
        let mut batch = SpriteBatch::new(64);
        batch.set_transform(&mut sink, Mat4::IDENTITY);

        let first = test_texture(64, 64);
        let second = test_texture(64, 64);
        let src = Rect::new(0.0, 0.0, 64.0, 64.0);

        emit_sprite(&mut batch, &mut sink, first, Pos::new(0.0, 0.0), Size::new(8.0, 8.0), src);
        emit_sprite(&mut batch, &mut sink, second, Pos::new(8.0, 0.0), Size::new(8.0, 8.0), src);
        batch.flush(&mut sink);

        // The texture switch split the sprites into separate draws.
        assert_eq!(sink.0.len(), 2);
        assert_eq!(sink.0[0].0, first.id);
        assert_eq!(sink.0[1].0, second.id);
    }
}
