use std::collections::HashMap;
use std::mem::offset_of;
use std::sync::Arc;

use anyhow::Context;
use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use wgpu::{MultisampleState, PipelineCompilationOptions, RenderPassDescriptor, ShaderSource};
use winit::{dpi::PhysicalSize, window::Window};

use crate::camera::{Camera, CameraUniform};
use crate::error::FrameError;
use crate::rendering::backend::{DrawableId, RenderBackend};
use crate::rendering::config::ViewportConfig;
use crate::rendering::wireframe::{polyline_segments, shape_segments, Segment};
use crate::scene_graph::geometry::Geometry;
use crate::scene_graph::primitive::Shape;

const LINE_SHADER: &str = include_str!("../shaders/line.wgsl");

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
struct LineVertex {
    position: [f32; 3],
    color: [f32; 3],
}

const LINE_VERTEX_LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
    array_stride: std::mem::size_of::<LineVertex>() as wgpu::BufferAddress,
    step_mode: wgpu::VertexStepMode::Vertex,
    attributes: &[
        wgpu::VertexAttribute {
            offset: offset_of!(LineVertex, position) as wgpu::BufferAddress,
            shader_location: 0,
            format: wgpu::VertexFormat::Float32x3,
        },
        wgpu::VertexAttribute {
            offset: offset_of!(LineVertex, color) as wgpu::BufferAddress,
            shader_location: 1,
            format: wgpu::VertexFormat::Float32x3,
        },
    ],
};

struct LineDrawable {
    segments: Vec<Segment>,
    position: Vec3,
    color: [f32; 3],
    in_scene: bool,
}

/// Windowed render backend. Every drawable is a set of line segments, all
/// batched into one vertex buffer per frame.
pub struct WgpuEngine {
    pub window: Arc<Window>,
    pub size: PhysicalSize<u32>,

    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    surface_config: wgpu::SurfaceConfiguration,
    pipeline: wgpu::RenderPipeline,

    camera: Camera,
    camera_uniform: CameraUniform,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    vertex_buffer: wgpu::Buffer,
    vertex_capacity: usize,
    vertices: Vec<LineVertex>,

    drawables: HashMap<DrawableId, LineDrawable>,
    next_id: u64,
    config: ViewportConfig,
}

impl WgpuEngine {
    const INITIAL_VERTEX_CAPACITY: usize = 4096;

    pub async fn new(window: Arc<Window>, config: ViewportConfig) -> anyhow::Result<WgpuEngine> {
        let size = window.inner_size();

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor::default());
        let surface = instance
            .create_surface(window.clone())
            .context("Failed to create surface")?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("No suitable graphics adapter")?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                label: None,
                memory_hints: Default::default(),
                trace: wgpu::Trace::Off,
            })
            .await
            .context("Failed to create device")?;

        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .copied()
            .or_else(|| surface_caps.formats.first().copied())
            .context("Surface reports no formats")?;

        let surface_config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: surface_caps.present_modes[0],
            alpha_mode: surface_caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        let camera = Camera::from_config(&config.camera);
        let mut camera_uniform = CameraUniform::default();
        camera_uniform.update(size, &camera);
        camera_uniform.set_light(&config.light);
        let camera_buffer = camera_uniform.create_buffer(&device);

        let bind_group_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("Camera bind group layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: None,
                },
                count: None,
            }],
        });

        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera bind group"),
            layout: &bind_group_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Line Pipeline Layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Line Shader"),
            source: ShaderSource::Wgsl(LINE_SHADER.into()),
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Line Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[LINE_VERTEX_LAYOUT],
                compilation_options: PipelineCompilationOptions::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: surface_format,
                    blend: Some(wgpu::BlendState::REPLACE),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: PipelineCompilationOptions::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::LineList,
                strip_index_format: None,
                front_face: wgpu::FrontFace::Ccw,
                cull_mode: None,
                polygon_mode: wgpu::PolygonMode::Fill,
                unclipped_depth: false,
                conservative: false,
            },
            depth_stencil: None,
            multisample: MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        let vertex_buffer = Self::create_vertex_buffer(&device, Self::INITIAL_VERTEX_CAPACITY);

        log::info!(
            "Viewport ready: {}x{} {:?} on {}",
            size.width,
            size.height,
            surface_format,
            adapter.get_info().name
        );

        Ok(Self {
            window,
            size,
            surface,
            device,
            queue,
            surface_config,
            pipeline,
            camera,
            camera_uniform,
            camera_buffer,
            camera_bind_group,
            vertex_buffer,
            vertex_capacity: Self::INITIAL_VERTEX_CAPACITY,
            vertices: Vec::new(),
            drawables: HashMap::new(),
            next_id: 0,
            config,
        })
    }

    fn create_vertex_buffer(device: &wgpu::Device, capacity: usize) -> wgpu::Buffer {
        device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("Line vertex buffer"),
            size: (capacity * std::mem::size_of::<LineVertex>()) as wgpu::BufferAddress,
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        })
    }

    fn insert(&mut self, segments: Vec<Segment>, position: Vec3, color: [f32; 3]) -> DrawableId {
        let id = DrawableId::new(self.next_id);
        self.next_id += 1;
        self.drawables.insert(
            id,
            LineDrawable {
                segments,
                position,
                color,
                in_scene: true,
            },
        );
        id
    }

    fn gather_vertices(&mut self) {
        self.vertices.clear();
        for drawable in self.drawables.values().filter(|d| d.in_scene) {
            for (a, b) in &drawable.segments {
                for point in [*a, *b] {
                    self.vertices.push(LineVertex {
                        position: (point + drawable.position).to_array(),
                        color: drawable.color,
                    });
                }
            }
        }

        if self.vertices.len() > self.vertex_capacity {
            self.vertex_capacity = self.vertices.len().next_power_of_two();
            self.vertex_buffer = Self::create_vertex_buffer(&self.device, self.vertex_capacity);
            log::debug!("Grew line vertex buffer to {} vertices", self.vertex_capacity);
        }

        if !self.vertices.is_empty() {
            self.queue
                .write_buffer(&self.vertex_buffer, 0, bytemuck::cast_slice(&self.vertices));
        }
    }
}

impl RenderBackend for WgpuEngine {
    fn create_shape(&mut self, shape: &Shape, position: Vec3) -> DrawableId {
        let color = self.config.primitive_color;
        self.insert(shape_segments(shape), position, color)
    }

    fn create_polyline(&mut self, points: &[Vec3]) -> DrawableId {
        let color = self.config.connector_color;
        self.insert(polyline_segments(points), Vec3::ZERO, color)
    }

    fn create_mesh(&mut self, geometry: &Geometry, position: Vec3) -> DrawableId {
        let color = self.config.imported_color;
        self.insert(geometry.edges(), position, color)
    }

    fn place(&mut self, drawable: DrawableId, position: Vec3) {
        if let Some(d) = self.drawables.get_mut(&drawable) {
            d.position = position;
        }
    }

    fn remove_from_scene(&mut self, drawable: DrawableId) {
        if let Some(d) = self.drawables.get_mut(&drawable) {
            d.in_scene = false;
        }
    }

    fn dispose_drawable(&mut self, drawable: DrawableId) {
        self.drawables.remove(&drawable);
    }

    fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }

        self.size = PhysicalSize::new(width, height);
        self.surface_config.width = width;
        self.surface_config.height = height;
        self.surface.configure(&self.device, &self.surface_config);
        self.camera_uniform.update(self.size, &self.camera);
    }

    fn render_frame(&mut self) -> Result<(), FrameError> {
        self.gather_vertices();
        self.camera_uniform
            .update_buffer(&self.queue, &self.camera_buffer);

        let output = match self.surface.get_current_texture() {
            Ok(output) => output,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                return Err(FrameError::SurfaceLost)
            }
            Err(wgpu::SurfaceError::OutOfMemory) => return Err(FrameError::OutOfMemory),
            Err(wgpu::SurfaceError::Timeout) => return Err(FrameError::Timeout),
            Err(other) => return Err(FrameError::Other(other.to_string())),
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let [r, g, b, a] = self.config.clear_color;
            let mut render_pass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("Line Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color { r, g, b, a }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if !self.vertices.is_empty() {
                render_pass.set_pipeline(&self.pipeline);
                render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
                render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
                render_pass.draw(0..self.vertices.len() as u32, 0..1);
            }
        }

        self.queue.submit([encoder.finish()]);
        output.present();

        Ok(())
    }
}
