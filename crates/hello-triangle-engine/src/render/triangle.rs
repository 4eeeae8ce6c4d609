use anyhow::Result;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;

use crate::core::{AppControl, FrameCtx, View, ViewDelegate};
use crate::paint::Color;
use crate::render::{RenderCtx, RenderTarget};
use crate::shader_types::{Vertex, VertexInputIndex, ViewportUniform};

/// Triangle in pixel space around the drawable centre.
pub const TRIANGLE_VERTICES: [Vertex; 3] = [
    Vertex::new([250.0, -250.0], [1.0, 0.0, 0.0, 1.0]),
    Vertex::new([-250.0, -250.0], [0.0, 1.0, 0.0, 1.0]),
    Vertex::new([0.0, 250.0], [0.0, 0.0, 1.0, 1.0]),
];

/// Draws one colored triangle into a view every frame.
///
/// Owns all of its GPU resources. The pipeline is built for the surface format
/// of the view it was created from.
pub struct Renderer {
    pipeline: wgpu::RenderPipeline,
    bind_group: wgpu::BindGroup,
    viewport_ubo: wgpu::Buffer,
    vertex_buffer: wgpu::Buffer,
    vertex_count: u32,

    viewport_size: PhysicalSize<u32>,
    clear_color: Color,

    warned_empty_viewport: bool,
}

impl Renderer {
    /// Builds the pipeline and buffers for `view`.
    ///
    /// Fails if the device rejects any of them, e.g. when the view's format
    /// cannot be rendered to.
    pub fn new(view: &View<'_>) -> Result<Self> {
        anyhow::ensure!(
            !view.surface_format.is_depth_stencil_format(),
            "view format {:?} is not a color format",
            view.surface_format
        );

        let device = view.device;
        let scope = device.push_error_scope(wgpu::ErrorFilter::Validation);

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("hello-triangle shader"),
            source: wgpu::ShaderSource::Wgsl(include_str!("shaders/triangle.wgsl").into()),
        });

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("hello-triangle bgl"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: VertexInputIndex::ViewportSize.index(),
                visibility: wgpu::ShaderStages::VERTEX,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: wgpu::BufferSize::new(
                        std::mem::size_of::<ViewportUniform>() as u64,
                    ),
                },
                count: None,
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("hello-triangle pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            immediate_size: 0,
        });

        // Index into this array is the vertex-buffer slot.
        let buffers = [Vertex::layout()];
        debug_assert_eq!(buffers.len(), VertexInputIndex::Vertices.index() as usize + 1);

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("hello-triangle pipeline"),
            layout: Some(&pipeline_layout),

            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &buffers,
            },

            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format: view.surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),

            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },

            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview_mask: None,
            cache: None,
        });

        // Uploaded once; never written again.
        let vertex_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("hello-triangle vbo"),
            contents: bytemuck::cast_slice(&TRIANGLE_VERTICES),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let viewport_size = view.drawable_size;
        let viewport_ubo = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("hello-triangle viewport ubo"),
            contents: bytemuck::bytes_of(&ViewportUniform::new(
                viewport_size.width,
                viewport_size.height,
            )),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("hello-triangle bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: VertexInputIndex::ViewportSize.index(),
                resource: viewport_ubo.as_entire_binding(),
            }],
        });

        if let Some(err) = pollster::block_on(scope.pop()) {
            anyhow::bail!(
                "device rejected triangle pipeline for format {:?}: {err}",
                view.surface_format
            );
        }

        log::debug!(
            "triangle renderer ready: format {:?}, viewport {}x{}",
            view.surface_format,
            viewport_size.width,
            viewport_size.height
        );

        Ok(Self {
            pipeline,
            bind_group,
            viewport_ubo,
            vertex_buffer,
            vertex_count: TRIANGLE_VERTICES.len() as u32,
            viewport_size,
            clear_color: Color::black(),
            warned_empty_viewport: false,
        })
    }

    /// Sets the color the drawable is cleared to before the triangle is drawn.
    pub fn with_clear_color(mut self, color: Color) -> Self {
        debug_assert!(color.is_finite(), "clear color must be finite");
        self.clear_color = color;
        self
    }

    /// Returns the last non-empty drawable size reported to this renderer.
    pub fn viewport_size(&self) -> PhysicalSize<u32> {
        self.viewport_size
    }

    pub fn clear_color(&self) -> Color {
        self.clear_color
    }

    /// Records the triangle draw into `target`.
    ///
    /// The target is loaded, not cleared; callers clear it first.
    pub fn encode(&mut self, ctx: &RenderCtx<'_>, target: &mut RenderTarget<'_>) {
        if self.viewport_size.width == 0 || self.viewport_size.height == 0 || !ctx.viewport.is_valid()
        {
            if !self.warned_empty_viewport {
                log::debug!("Renderer: empty viewport; draw skipped");
                self.warned_empty_viewport = true;
            }
            return;
        }

        let uniform = ViewportUniform::new(self.viewport_size.width, self.viewport_size.height);
        ctx.queue.write_buffer(&self.viewport_ubo, 0, bytemuck::bytes_of(&uniform));

        let mut rpass = target.encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some("hello-triangle pass"),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: target.color_view,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Load,
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: None,
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        });

        rpass.set_viewport(0.0, 0.0, ctx.viewport.width, ctx.viewport.height, 0.0, 1.0);
        rpass.set_pipeline(&self.pipeline);
        rpass.set_bind_group(0, &self.bind_group, &[]);
        rpass.set_vertex_buffer(VertexInputIndex::Vertices.index(), self.vertex_buffer.slice(..));
        rpass.draw(0..self.vertex_count, 0..1);
    }
}

impl ViewDelegate for Renderer {
    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        if ctx.time.frame_index % 600 == 0 {
            log::trace!("frame {} (dt {:.4}s)", ctx.time.frame_index, ctx.time.dt);
        }

        let clear = self.clear_color;
        ctx.render(clear, |rctx, target| self.encode(rctx, target))
    }

    fn on_resize(&mut self, size: PhysicalSize<u32>) {
        if size.width == 0 || size.height == 0 {
            log::debug!("Renderer: ignoring zero-area resize");
            return;
        }
        self.viewport_size = size;
        self.warned_empty_viewport = false;
    }
}
