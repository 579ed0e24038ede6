use glam::{Mat4, Vec2, Vec3};
use wgpu::util::DeviceExt;

use crate::rendering::config::{CameraConfig, LightConfig};

#[derive(Debug, Clone)]
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        Self {
            eye: config.eye,
            target: config.target,
            up: config.up,
            fov_y_radians: config.fov_y_radians,
            near: config.near,
            far: config.far,
        }
    }

    pub fn get_vp_matrix(&self, resolution: Vec2) -> Mat4 {
        let aspect = if resolution.y > 0.0 {
            resolution.x / resolution.y
        } else {
            1.0
        };
        let view = Mat4::look_at_lh(self.eye, self.target, self.up);
        let projection = Mat4::perspective_lh(self.fov_y_radians, aspect, self.near, self.far);
        projection * view
    }
}

/// Per-frame uniform: camera matrix plus the single light's brightness.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable, Default)]
pub struct CameraUniform {
    view_proj: Mat4,
    // xyz direction, w intensity
    light: [f32; 4],
}

impl CameraUniform {
    pub fn update(&mut self, resolution: winit::dpi::PhysicalSize<u32>, camera: &Camera) {
        self.view_proj =
            camera.get_vp_matrix(Vec2::new(resolution.width as f32, resolution.height as f32));
    }

    pub fn set_light(&mut self, light: &LightConfig) {
        let direction = light.direction.normalize_or_zero();
        self.light = [direction.x, direction.y, direction.z, light.intensity];
    }

    pub fn create_buffer(&self, device: &wgpu::Device) -> wgpu::Buffer {
        device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::cast_slice(&[*self]),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        })
    }

    pub fn update_buffer(&self, queue: &wgpu::Queue, buffer: &wgpu::Buffer) {
        queue.write_buffer(buffer, 0, bytemuck::cast_slice(&[*self]));
    }
}
