//! End-to-end batching behaviour, observed through a recording sink.

use glam::Mat4;
use glint_core::geometry::{Pos, Rect, Size};
use glint_core::math::orthographic;
use glint_render::{SpriteBatch, TextureId, TextureInfo, emit_sprite};
use glint_test_utils::RecordingSink;

fn atlas(width: u32, height: u32) -> TextureInfo {
    TextureInfo {
        id: TextureId::allocate(),
        width,
        height,
    }
}

fn screen_transform() -> Mat4 {
    orthographic(0.0, 640.0, 480.0, 0.0, -1.0, 1.0)
}

#[test]
fn test_consecutive_pushes_merge_into_one_draw() {
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(100);
    batch.set_texture(&mut sink, TextureId::allocate());
    batch.set_transform(&mut sink, screen_transform());

    for i in 0..42 {
        batch.push_vertex(&mut sink, i as f32, 0.0, 0.0, 0.0);
    }
    batch.flush(&mut sink);

    assert_eq!(sink.draw_count(), 1);
    assert_eq!(sink.draws()[0].vertices.len(), 42);
    for (i, vertex) in sink.draws()[0].vertices.iter().enumerate() {
        assert_eq!(vertex.position[0], i as f32);
    }
}

#[test]
fn test_vertices_across_state_change_never_share_a_draw() {
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(100);
    let t1 = TextureId::allocate();
    let t2 = TextureId::allocate();

    batch.set_texture(&mut sink, t1);
    batch.set_transform(&mut sink, screen_transform());
    batch.push_vertex(&mut sink, 1.0, 0.0, 0.0, 0.0);

    batch.set_texture(&mut sink, t2);
    batch.push_vertex(&mut sink, 2.0, 0.0, 0.0, 0.0);

    batch.set_transform(&mut sink, Mat4::IDENTITY);
    batch.push_vertex(&mut sink, 3.0, 0.0, 0.0, 0.0);
    batch.flush(&mut sink);

    assert_eq!(sink.draw_count(), 3);
    assert_eq!(sink.vertex_counts(), vec![1, 1, 1]);
    assert_eq!(sink.draws()[0].texture, t1);
    assert_eq!(sink.draws()[1].texture, t2);
    assert_eq!(sink.draws()[1].transform, screen_transform());
    assert_eq!(sink.draws()[2].transform, Mat4::IDENTITY);
}

#[test]
fn test_capacity_plus_one_pushes_split_capacity_then_one() {
    let capacity = 30;
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(capacity);
    batch.set_texture(&mut sink, TextureId::allocate());
    batch.set_transform(&mut sink, screen_transform());

    for _ in 0..capacity + 1 {
        batch.push_vertex(&mut sink, 0.0, 0.0, 0.0, 0.0);
    }
    batch.flush(&mut sink);

    assert_eq!(sink.vertex_counts(), vec![capacity, 1]);
}

#[test]
fn test_three_sprites_at_capacity_six_flush_per_sprite() {
    // Capacity of exactly one sprite: each emit overflows the previous one
    // out, so three same-texture sprites become three draws in order.
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(6);
    let texture = atlas(256, 64);
    batch.set_transform(&mut sink, screen_transform());

    for i in 0..3 {
        emit_sprite(
            &mut batch,
            &mut sink,
            texture,
            Pos::new(i as f32 * 48.0, 0.0),
            Size::new(48.0, 48.0),
            Rect::new(2.0, 2.0, 24.0, 24.0),
        );
    }
    batch.flush(&mut sink);

    assert_eq!(sink.draw_count(), 3);
    assert_eq!(sink.vertex_counts(), vec![6, 6, 6]);
    for (i, draw) in sink.draws().iter().enumerate() {
        assert_eq!(draw.vertices[0].position[0], i as f32 * 48.0);
    }
}

#[test]
fn test_texture_reuse_still_flushes_per_switch() {
    // A, B, A: T1 is reused but each switch is a real state change, so
    // three draws result.
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(100);
    let t1 = atlas(64, 64);
    let t2 = atlas(64, 64);
    batch.set_transform(&mut sink, screen_transform());

    let src = Rect::new(0.0, 0.0, 32.0, 32.0);
    let size = Size::new(48.0, 48.0);
    emit_sprite(&mut batch, &mut sink, t1, Pos::new(0.0, 0.0), size, src);
    emit_sprite(&mut batch, &mut sink, t2, Pos::new(48.0, 0.0), size, src);
    emit_sprite(&mut batch, &mut sink, t1, Pos::new(96.0, 0.0), size, src);
    batch.flush(&mut sink);

    assert_eq!(sink.draw_count(), 3);
    assert_eq!(sink.textures(), vec![t1.id, t2.id, t1.id]);
}

#[test]
fn test_same_texture_sprites_share_one_draw() {
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(6000);
    let texture = atlas(256, 64);
    batch.set_transform(&mut sink, screen_transform());

    // The whole alien grid under one texture and one transform collapses
    // into a single draw.
    for row in 0..15 {
        for col in 0..20 {
            emit_sprite(
                &mut batch,
                &mut sink,
                texture,
                Pos::new(col as f32 * 48.0, row as f32 * 48.0),
                Size::new(48.0, 48.0),
                Rect::new(2.0, 2.0, 24.0, 24.0),
            );
        }
    }
    batch.flush(&mut sink);

    assert_eq!(sink.draw_count(), 1);
    assert_eq!(sink.draws()[0].vertices.len(), 15 * 20 * 6);
}

#[test]
fn test_forced_flush_on_empty_batch_draws_nothing() {
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(100);
    let texture = TextureId::allocate();
    batch.set_texture(&mut sink, texture);
    batch.set_transform(&mut sink, screen_transform());

    batch.flush(&mut sink);

    assert_eq!(sink.draw_count(), 0);
    assert_eq!(batch.active_texture(), Some(texture));
    assert_eq!(batch.active_transform(), Some(screen_transform()));
}

#[test]
fn test_redundant_state_sets_are_free() {
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(100);
    let texture = TextureId::allocate();
    let transform = screen_transform();

    batch.set_texture(&mut sink, texture);
    batch.set_transform(&mut sink, transform);
    batch.push_vertex(&mut sink, 0.0, 0.0, 0.0, 0.0);

    for _ in 0..10 {
        batch.set_texture(&mut sink, texture);
        batch.set_transform(&mut sink, transform);
    }

    assert_eq!(sink.draw_count(), 0);
    batch.flush(&mut sink);
    assert_eq!(sink.draw_count(), 1);
}

#[test]
fn test_new_transform_applies_only_to_later_vertices() {
    let mut sink = RecordingSink::new();
    let mut batch = SpriteBatch::new(100);
    batch.set_texture(&mut sink, TextureId::allocate());

    let first = orthographic(0.0, 640.0, 480.0, 0.0, -1.0, 1.0);
    let second = orthographic(0.0, 800.0, 600.0, 0.0, -1.0, 1.0);

    batch.set_transform(&mut sink, first);
    batch.push_vertex(&mut sink, 0.0, 0.0, 0.0, 0.0);
    batch.set_transform(&mut sink, second);
    batch.push_vertex(&mut sink, 0.0, 0.0, 0.0, 0.0);
    batch.flush(&mut sink);

    assert_eq!(sink.draw_count(), 2);
    assert_eq!(sink.draws()[0].transform, first);
    assert_eq!(sink.draws()[1].transform, second);
}
