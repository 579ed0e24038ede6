use std::sync::Arc;

use anyhow::Context;
use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, EventLoop},
    window::Window,
};

use crate::{
    demo::{DemoScene, ASSET_ENV},
    error::FrameError,
    rendering::{config::ViewportConfig, wgpu_engine::WgpuEngine},
    session::ViewportSession,
};

struct App {
    config: ViewportConfig,
    window: Option<Arc<Window>>,
    session: Option<ViewportSession<WgpuEngine>>,
    demo: Option<DemoScene>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: ViewportConfig) -> Self {
        Self {
            config,
            window: None,
            session: None,
            demo: None,
            error: None,
        }
    }

    fn start(&mut self, event_loop: &ActiveEventLoop) -> anyhow::Result<()> {
        let window_attributes = Window::default_attributes().with_title("meshlink");
        let window = Arc::new(
            event_loop
                .create_window(window_attributes)
                .context("Failed to create window")?,
        );

        let engine = pollster::block_on(WgpuEngine::new(window.clone(), self.config.clone()))?;
        let mut session = ViewportSession::new(engine, self.config.clone());
        let demo = DemoScene::populate(session.scene_mut()?)?;

        if let Ok(asset) = std::env::var(ASSET_ENV) {
            if let Err(e) = demo.attach_asset(&mut session, &asset) {
                log::error!("{:#}", e);
            }
        }

        window.request_redraw();

        self.window = Some(window);
        self.session = Some(session);
        self.demo = Some(demo);
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.session.is_some() {
            return;
        }

        if let Err(e) = self.start(event_loop) {
            log::error!("Failed to start viewport: {:#}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: winit::window::WindowId,
        event: WindowEvent,
    ) {
        let (Some(session), Some(window)) = (self.session.as_mut(), self.window.as_ref()) else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                session.teardown();
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                session.resize(new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                let demo = self.demo.as_ref();
                let result = session.tick(|scene, time| {
                    if let Some(demo) = demo {
                        if let Err(e) = demo.update(scene, time) {
                            log::warn!("Demo update failed: {}", e);
                        }
                    }
                });

                match result {
                    Ok(()) => {}
                    Err(FrameError::SurfaceLost) => {
                        let size = window.inner_size();
                        session.resize(size.width, size.height);
                    }
                    Err(FrameError::OutOfMemory) => {
                        log::error!("Out of memory");
                        event_loop.exit();
                    }
                    Err(FrameError::Timeout) => {
                        log::warn!("Timeout");
                    }
                    Err(other) => {
                        log::error!("Unexpected error: {:?}", other);
                    }
                }

                window.request_redraw();
            }
            _ => (),
        }
    }
}

pub async fn run() -> anyhow::Result<()> {
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let mut app = App::new(ViewportConfig::default());
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
