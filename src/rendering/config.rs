use glam::Vec3;

#[derive(Debug, Clone)]
pub struct CameraConfig {
    pub eye: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov_y_radians: f32,
    pub near: f32,
    pub far: f32,
}

#[derive(Debug, Clone)]
pub struct LightConfig {
    pub direction: Vec3,
    pub intensity: f32,
}

#[derive(Debug, Clone)]
pub struct ViewportConfig {
    pub clear_color: [f64; 4],
    pub camera: CameraConfig,
    pub light: LightConfig,
    pub primitive_color: [f32; 3],
    pub imported_color: [f32; 3],
    pub connector_color: [f32; 3],
}

impl Default for ViewportConfig {
    fn default() -> Self {
        Self {
            clear_color: [0.05, 0.05, 0.08, 1.0],
            camera: CameraConfig {
                eye: Vec3::new(0.0, 5.0, -10.0),
                target: Vec3::ZERO,
                up: Vec3::Y,
                fov_y_radians: std::f32::consts::FRAC_PI_4,
                near: 0.1,
                far: 100.0,
            },
            light: LightConfig {
                direction: Vec3::new(0.0, 1.0, 0.0),
                intensity: 0.7,
            },
            primitive_color: [0.8, 0.8, 0.9],
            imported_color: [0.6, 0.9, 0.6],
            connector_color: [1.0, 0.6, 0.2],
        }
    }
}
