//! Per-window surface management.

use crate::context::{ContextError, GraphicsContext};
use std::sync::Arc;
use winit::dpi::PhysicalSize;

/// Owns a window's swapchain surface and its configuration.
///
/// Resizes are applied lazily at the start of the next frame; winit can
/// deliver several resize events between redraws and only the last one
/// matters.
pub struct WindowContext {
    context: Arc<GraphicsContext>,
    surface: wgpu::Surface<'static>,
    config: wgpu::SurfaceConfiguration,
    pending_resize: Option<PhysicalSize<u32>>,
}

impl WindowContext {
    pub fn new(
        context: Arc<GraphicsContext>,
        window: Arc<winit::window::Window>,
    ) -> Result<Self, ContextError> {
        let PhysicalSize { width, height } = window.inner_size();
        let surface = context.instance().create_surface(window)?;

        let config = surface
            .get_default_config(context.adapter(), width.max(1), height.max(1))
            .ok_or(ContextError::IncompatibleSurface)?;

        surface.configure(context.device(), &config);

        Ok(Self {
            context,
            surface,
            config,
            pending_resize: None,
        })
    }

    /// Note a new framebuffer size; takes effect on the next `begin_frame`.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        self.pending_resize = Some(new_size);
    }

    /// The surface texture format renderers must target.
    pub fn format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Current framebuffer size in pixels.
    pub fn size(&self) -> (u32, u32) {
        (self.config.width, self.config.height)
    }

    /// Acquire the next swapchain image and start encoding a frame.
    ///
    /// `SurfaceError::Lost`/`Outdated` are recoverable — the caller skips
    /// the frame and the reconfigure happens on the next one.
    pub fn begin_frame(&mut self) -> Result<Frame, wgpu::SurfaceError> {
        if let Some(new_size) = self.pending_resize.take() {
            if new_size.width > 0 && new_size.height > 0 {
                self.config.width = new_size.width;
                self.config.height = new_size.height;
                self.surface.configure(self.context.device(), &self.config);
            }
        }

        let surface_texture = self.surface.get_current_texture()?;
        let view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let encoder = self
            .context
            .device()
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        Ok(Frame {
            surface_texture,
            view,
            encoder,
        })
    }

    pub fn context(&self) -> &GraphicsContext {
        &self.context
    }
}

/// One frame in flight: the acquired swapchain image plus its command
/// encoder. Dropped without `present` the frame is simply abandoned.
pub struct Frame {
    surface_texture: wgpu::SurfaceTexture,
    view: wgpu::TextureView,
    encoder: wgpu::CommandEncoder,
}

impl Frame {
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    pub fn encoder(&mut self) -> &mut wgpu::CommandEncoder {
        &mut self.encoder
    }

    /// Submit the encoded work and present the image.
    pub fn present(self, context: &GraphicsContext) {
        context.queue().submit(std::iter::once(self.encoder.finish()));
        self.surface_texture.present();
    }
}
