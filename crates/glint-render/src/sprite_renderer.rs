//! wgpu pipeline that turns recorded flushes into draw calls.
//!
//! The GL-era shape of this renderer drew immediately inside each flush.
//! wgpu records draws into a pass instead, so a frame runs in two steps:
//! during the frame every flush lands in a [`FrameSink`] as one submission
//! (texture, transform, contiguous vertex range); at pass time
//! [`SpriteRenderer::render`] replays the submissions as exactly one draw
//! each, in flush order. Draw count and draw order observable on the GPU
//! equal flush count and flush order.

use crate::batch::{DrawSink, SpriteVertex, TextureId};
use crate::context::GraphicsContext;
use crate::texture::Texture;
use ahash::HashMap;
use glam::Mat4;
use std::sync::Arc;

/// One recorded flush.
#[derive(Debug, Clone, Copy)]
struct Submission {
    texture: TextureId,
    transform: Mat4,
    start: u32,
    count: u32,
}

/// Accumulates a frame's flushes. Create one per frame, feed it to the
/// batch, then hand it to [`SpriteRenderer::prepare`] and
/// [`SpriteRenderer::render`].
pub struct FrameSink {
    vertices: Vec<SpriteVertex>,
    submissions: Vec<Submission>,
}

impl FrameSink {
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            submissions: Vec::new(),
        }
    }

    /// Number of draws this frame will issue.
    pub fn submission_count(&self) -> usize {
        self.submissions.len()
    }

    /// Total vertices across all submissions.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

impl Default for FrameSink {
    fn default() -> Self {
        Self::new()
    }
}

impl DrawSink for FrameSink {
    fn submit(&mut self, texture: TextureId, transform: Mat4, vertices: &[SpriteVertex]) {
        let start = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        self.submissions.push(Submission {
            texture,
            transform,
            start,
            count: vertices.len() as u32,
        });
    }
}

/// Fixed-function sprite pipeline: position+texcoord vertices, one sampled
/// texture, one transform uniform, alpha blending.
///
/// Textures are registered once (bind group created up front) and drawn by
/// id thereafter. Per-submission transforms live in one uniform buffer at
/// dynamic offsets, so the whole frame needs two buffer writes.
pub struct SpriteRenderer {
    context: Arc<GraphicsContext>,
    pipeline: wgpu::RenderPipeline,
    sampler: wgpu::Sampler,
    texture_layout: wgpu::BindGroupLayout,
    texture_bind_groups: HashMap<TextureId, wgpu::BindGroup>,
    transform_layout: wgpu::BindGroupLayout,
    transform_buffer: wgpu::Buffer,
    transform_bind_group: wgpu::BindGroup,
    transform_capacity: usize,
    transform_stride: u64,
    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
}

impl SpriteRenderer {
    /// Create the pipeline targeting `target_format` (the window surface
    /// format), with a GPU vertex buffer initially sized for
    /// `vertex_capacity` vertices.
    pub fn new(
        context: Arc<GraphicsContext>,
        target_format: wgpu::TextureFormat,
        vertex_capacity: usize,
    ) -> Self {
        let device = context.device();

        let transform_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Transform Bind Group Layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: true,
                    min_binding_size: wgpu::BufferSize::new(TRANSFORM_SIZE),
                },
                count: None,
            }],
        });

        let texture_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Sprite Texture Bind Group Layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Sprite Shader"),
            source: wgpu::ShaderSource::Wgsl(SPRITE_SHADER.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Sprite Pipeline Layout"),
            bind_group_layouts: &[&transform_layout, &texture_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Sprite Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<SpriteVertex>() as u64,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &[
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 0,
                            shader_location: 0,
                        },
                        wgpu::VertexAttribute {
                            format: wgpu::VertexFormat::Float32x2,
                            offset: 8,
                            shader_location: 1,
                        },
                    ],
                }],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: target_format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        // Nearest + clamp avoids bleeding between adjacent atlas sprites.
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("Sprite Sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let transform_stride = (device.limits().min_uniform_buffer_offset_alignment as u64)
            .max(TRANSFORM_SIZE);
        let transform_capacity = INITIAL_TRANSFORM_SLOTS;
        let (transform_buffer, transform_bind_group) = Self::create_transform_buffer(
            device,
            &transform_layout,
            transform_stride,
            transform_capacity,
        );

        let vertex_buffer = Self::create_vertex_buffer(device, vertex_capacity);

        tracing::info!(vertex_capacity, "created sprite renderer");

        Self {
            context,
            pipeline,
            sampler,
            texture_layout,
            texture_bind_groups: HashMap::default(),
            transform_layout,
            transform_buffer,
            transform_bind_group,
            transform_capacity,
            transform_stride,
            vertex_buffer,
            vertex_capacity,
        }
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Vertex Buffer"),
            size: (capacity * std::mem::size_of::<SpriteVertex>()) as u64,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn create_transform_buffer(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        stride: u64,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Sprite Transform Buffer"),
            size: stride * capacity as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Sprite Transform Bind Group"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(TRANSFORM_SIZE),
                }),
            }],
        });

        (buffer, bind_group)
    }

    /// Create the bind group for a texture so it can be drawn by id.
    pub fn register_texture(&mut self, texture: &Texture) {
        let bind_group = self
            .context
            .device()
            .create_bind_group(&wgpu::BindGroupDescriptor {
                label: Some("Sprite Texture Bind Group"),
                layout: &self.texture_layout,
                entries: &[
                    wgpu::BindGroupEntry {
                        binding: 0,
                        resource: wgpu::BindingResource::TextureView(texture.view()),
                    },
                    wgpu::BindGroupEntry {
                        binding: 1,
                        resource: wgpu::BindingResource::Sampler(&self.sampler),
                    },
                ],
            });

        self.texture_bind_groups.insert(texture.id(), bind_group);
    }

    /// Upload the frame's vertices and transforms. Buffers grow by
    /// recreation when a frame outruns them; the old allocation is dropped.
    pub fn prepare(&mut self, frame: &FrameSink) {
        if frame.submissions.is_empty() {
            return;
        }

        let device = self.context.device();

        if frame.vertices.len() > self.vertex_capacity {
            self.vertex_capacity = frame.vertices.len().next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(device, self.vertex_capacity);
            tracing::trace!(capacity = self.vertex_capacity, "grew sprite vertex buffer");
        }

        if frame.submissions.len() > self.transform_capacity {
            self.transform_capacity = frame.submissions.len().next_power_of_two();
            let (buffer, bind_group) = Self::create_transform_buffer(
                device,
                &self.transform_layout,
                self.transform_stride,
                self.transform_capacity,
            );
            self.transform_buffer = buffer;
            self.transform_bind_group = bind_group;
            tracing::trace!(capacity = self.transform_capacity, "grew transform buffer");
        }

        let queue = self.context.queue();
        queue.write_buffer(
            &self.vertex_buffer,
            0,
            bytemuck::cast_slice(&frame.vertices),
        );

        let mut transforms = vec![0u8; frame.submissions.len() * self.transform_stride as usize];
        for (i, submission) in frame.submissions.iter().enumerate() {
            let offset = i * self.transform_stride as usize;
            transforms[offset..offset + TRANSFORM_SIZE as usize]
                .copy_from_slice(bytemuck::cast_slice(&submission.transform.to_cols_array()));
        }
        queue.write_buffer(&self.transform_buffer, 0, &transforms);

        tracing::trace!(
            draws = frame.submissions.len(),
            vertices = frame.vertices.len(),
            "prepared sprite frame"
        );
    }

    /// Replay the frame: one draw per recorded submission, in order.
    /// `prepare` must have run for this frame first.
    ///
    /// # Panics
    ///
    /// Panics when a submission references a texture id that was never
    /// passed to [`register_texture`](Self::register_texture).
    pub fn render(&self, frame: &FrameSink, pass: &mut wgpu::RenderPass<'_>) {
        if frame.submissions.is_empty() {
            return;
        }

        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));

        for (i, submission) in frame.submissions.iter().enumerate() {
            let bind_group = self
                .texture_bind_groups
                .get(&submission.texture)
                .unwrap_or_else(|| {
                    panic!("texture id {} was never registered", submission.texture.as_u64())
                });

            let offset = (i as u64 * self.transform_stride) as u32;
            pass.set_bind_group(0, &self.transform_bind_group, &[offset]);
            pass.set_bind_group(1, bind_group, &[]);
            pass.draw(submission.start..submission.start + submission.count, 0..1);
        }
    }
}

const TRANSFORM_SIZE: u64 = std::mem::size_of::<Mat4>() as u64;
const INITIAL_TRANSFORM_SLOTS: usize = 64;

/// WGSL for the fixed sprite program: transformed position, pass-through
/// texcoord, one sampled texture.
const SPRITE_SHADER: &str = r#"
struct Transform {
    mvp: mat4x4<f32>,
}

@group(0) @binding(0)
var<uniform> transform: Transform;

struct VertexInput {
    @location(0) position: vec2<f32>,
    @location(1) texcoord: vec2<f32>,
}

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) texcoord: vec2<f32>,
}

@vertex
fn vs_main(input: VertexInput) -> VertexOutput {
    var output: VertexOutput;
    output.position = transform.mvp * vec4<f32>(input.position, 0.0, 1.0);
    output.texcoord = input.texcoord;
    return output;
}

@group(1) @binding(0)
var t_sprite: texture_2d<f32>;
@group(1) @binding(1)
var s_sprite: sampler;

@fragment
fn fs_main(input: VertexOutput) -> @location(0) vec4<f32> {
    return textureSample(t_sprite, s_sprite, input.texcoord);
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_sink_records_ranges_in_order() {
        let mut sink = FrameSink::new();
        let t1 = TextureId::allocate();
        let t2 = TextureId::allocate();

        let vertex = SpriteVertex {
            position: [0.0, 0.0],
            texcoord: [0.0, 0.0],
        };

        sink.submit(t1, Mat4::IDENTITY, &[vertex; 6]);
        sink.submit(t2, Mat4::IDENTITY, &[vertex; 3]);

        assert_eq!(sink.submission_count(), 2);
        assert_eq!(sink.vertex_count(), 9);
        assert_eq!(sink.submissions[0].start, 0);
        assert_eq!(sink.submissions[0].count, 6);
        assert_eq!(sink.submissions[1].start, 6);
        assert_eq!(sink.submissions[1].count, 3);
        assert_eq!(sink.submissions[1].texture, t2);
    }
}
