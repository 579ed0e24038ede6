pub mod backend;
pub mod config;
pub mod headless;
pub mod wgpu_engine;
pub mod wireframe;
