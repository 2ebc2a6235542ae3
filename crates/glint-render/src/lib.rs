//! Batched 2D sprite rendering on wgpu.
//!
//! The pieces, in dependency order: [`GraphicsContext`] owns the device and
//! queue, [`Texture`] loads an atlas, [`SpriteBatch`] accumulates geometry
//! and decides when to flush, [`FrameSink`] records the flushes, and
//! [`SpriteRenderer`] replays them into a render pass.

pub mod batch;
pub mod context;
pub mod sprite;
pub mod sprite_renderer;
pub mod texture;
pub mod window;

pub use batch::{DrawSink, SpriteBatch, SpriteVertex, TextureId};
pub use context::{ContextError, GraphicsContext};
pub use sprite::{TextureInfo, emit_sprite};
pub use sprite_renderer::{FrameSink, SpriteRenderer};
pub use texture::{Texture, TextureError};
pub use window::{Frame, WindowContext};
