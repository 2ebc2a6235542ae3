//! Context and GPU resource lifecycle tests.
//!
//! These need a real adapter; run with:
//! `cargo test --test context_tests -- --ignored`

use glint_render::{GraphicsContext, SpriteRenderer, Texture};
use std::sync::Arc;

#[test]
#[ignore] // Requires GPU
fn test_context_creation_sync() {
    let ctx = GraphicsContext::new_owned_sync().expect("no GPU available");
    assert_eq!(Arc::strong_count(&ctx), 1);
    assert!(ctx.device().limits().max_texture_dimension_2d > 0);
}

#[test]
#[ignore] // Requires GPU
fn test_texture_upload_and_registration() {
    let ctx = GraphicsContext::new_owned_sync().expect("no GPU available");

    let pixels = vec![255u8; 4 * 4 * 4];
    let texture = Texture::from_rgba8(&ctx, &pixels, 4, 4);
    assert_eq!((texture.width(), texture.height()), (4, 4));

    let mut renderer = SpriteRenderer::new(ctx.clone(), wgpu::TextureFormat::Rgba8UnormSrgb, 6000);
    renderer.register_texture(&texture);

    let info = texture.info();
    assert_eq!(info.id, texture.id());
}

#[test]
#[ignore] // Requires GPU
fn test_distinct_textures_get_distinct_ids() {
    let ctx = GraphicsContext::new_owned_sync().expect("no GPU available");

    let pixels = vec![0u8; 2 * 2 * 4];
    let a = Texture::from_rgba8(&ctx, &pixels, 2, 2);
    let b = Texture::from_rgba8(&ctx, &pixels, 2, 2);
    assert_ne!(a.id(), b.id());
}
