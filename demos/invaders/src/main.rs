//! Frame driver: draws a grid of aliens from one texture atlas every frame.

use glint_core::geometry::{Pos, Rect, Size};
use glint_core::math::orthographic;
use glint_render::{
    FrameSink, GraphicsContext, SpriteBatch, SpriteRenderer, Texture, TextureInfo, WindowContext,
    emit_sprite,
};
use std::path::Path;
use std::sync::Arc;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::WindowId;

const ATLAS_PATH: &str = "aliens.png";
const SPRITE_SIZE: f32 = 48.0;
const VERTEX_CAPACITY: usize = 6000;

/// Source rectangles of the five alien sprites packed in the atlas.
const ALIEN_SOURCES: [[f32; 4]; 5] = [
    [2.0, 2.0, 24.0, 24.0],
    [58.0, 2.0, 24.0, 24.0],
    [114.0, 2.0, 24.0, 24.0],
    [170.0, 2.0, 24.0, 24.0],
    [2.0, 30.0, 24.0, 24.0],
];

struct State {
    window: Arc<winit::window::Window>,
    surface: WindowContext,
    renderer: SpriteRenderer,
    batch: SpriteBatch,
    atlas: TextureInfo,
    // Keeps the GPU texture alive for the process lifetime.
    _atlas_texture: Texture,
}

impl State {
    fn new(event_loop: &ActiveEventLoop) -> Result<Self, Box<dyn std::error::Error>> {
        let attributes = winit::window::Window::default_attributes()
            .with_title("This is a Title")
            .with_inner_size(winit::dpi::PhysicalSize::new(640, 480))
            .with_resizable(true);
        let window = Arc::new(event_loop.create_window(attributes)?);

        let context = GraphicsContext::new_owned_sync()?;
        let surface = WindowContext::new(context.clone(), window.clone())?;

        let mut renderer = SpriteRenderer::new(context.clone(), surface.format(), VERTEX_CAPACITY);
        let atlas_texture = Texture::load(&context, Path::new(ATLAS_PATH))?;
        renderer.register_texture(&atlas_texture);

        Ok(Self {
            window,
            surface,
            renderer,
            batch: SpriteBatch::new(VERTEX_CAPACITY),
            atlas: atlas_texture.info(),
            _atlas_texture: atlas_texture,
        })
    }

    fn draw(&mut self) {
        let mut frame = match self.surface.begin_frame() {
            Ok(frame) => frame,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.resize(self.window.inner_size());
                return;
            }
            Err(err) => {
                tracing::error!(%err, "failed to acquire frame");
                return;
            }
        };

        let (width, height) = self.surface.size();
        let mut sink = FrameSink::new();

        self.batch.set_transform(
            &mut sink,
            orthographic(0.0, width as f32, height as f32, 0.0, -1.0, 1.0),
        );

        let sprite = Size::new(SPRITE_SIZE, SPRITE_SIZE);
        let mut y = 0.0;
        for _row in 0..15 {
            let mut x = 0.0;
            for _repeat in 0..4 {
                for source in &ALIEN_SOURCES {
                    emit_sprite(
                        &mut self.batch,
                        &mut sink,
                        self.atlas,
                        Pos::new(x, y),
                        sprite,
                        Rect::new(source[0], source[1], source[2], source[3]),
                    );
                    x += SPRITE_SIZE;
                }
            }
            y += SPRITE_SIZE;
        }

        self.batch.flush(&mut sink);
        self.renderer.prepare(&sink);

        {
            let view = frame.view().clone();
            let mut pass = frame
                .encoder()
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("Alien Grid Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Clear(wgpu::Color {
                                r: 0.5,
                                g: 0.5,
                                b: 0.5,
                                a: 1.0,
                            }),
                            store: wgpu::StoreOp::Store,
                        },
                        depth_slice: None,
                    })],
                    depth_stencil_attachment: None,
                    timestamp_writes: None,
                    occlusion_query_set: None,
                });
            self.renderer.render(&sink, &mut pass);
        }

        frame.present(self.surface.context());
        self.window.request_redraw();
    }
}

#[derive(Default)]
struct InvadersApp {
    state: Option<State>,
}

impl ApplicationHandler for InvadersApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }

        match State::new(event_loop) {
            Ok(state) => self.state = Some(state),
            Err(err) => {
                tracing::error!(%err, "failed to start");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(state) = self.state.as_mut() else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(new_size) => state.surface.resize(new_size),
            WindowEvent::RedrawRequested => state.draw(),
            _ => {}
        }
    }
}

fn main() {
    glint_core::logging::init();

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            tracing::error!(%err, "failed to create event loop");
            std::process::exit(1);
        }
    };
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = InvadersApp::default();
    if let Err(err) = event_loop.run_app(&mut app) {
        tracing::error!(%err, "event loop error");
        std::process::exit(1);
    }
}
