//! The window and its OpenGL context.

use glutin::dpi::PhysicalSize;
use glutin::event::{Event, WindowEvent};
use glutin::event_loop::{ControlFlow, EventLoop};
use glutin::window::WindowBuilder;
use glutin::{Api, ContextBuilder, GlProfile, GlRequest, PossiblyCurrent, WindowedContext};
use graphics::GlDriver;
use log::{debug, info};
use winit::platform::run_return::EventLoopExtRunReturn;

use crate::error::AppError;

pub struct Window {
    events: EventLoop<()>,
    context: WindowedContext<PossiblyCurrent>,
    should_close: bool,
    size: (u32, u32),
    resized: bool,
}

impl Window {
    /// Opens a window with a current OpenGL 3.3 core context. Any non-zero `swap_interval` turns
    /// on vsync; glutin doesn't expose longer intervals.
    pub fn create(
        width: u32,
        height: u32,
        title: &str,
        swap_interval: u32,
    ) -> Result<Self, AppError> {
        let events = EventLoop::new();
        let builder = WindowBuilder::new()
            .with_title(title)
            .with_inner_size(PhysicalSize::new(width, height));

        let context = ContextBuilder::new()
            .with_gl(GlRequest::Specific(Api::OpenGl, (3, 3)))
            .with_gl_profile(GlProfile::Core)
            .with_vsync(swap_interval > 0)
            .build_windowed(builder, &events)?;

        let context = unsafe { context.make_current() }.map_err(|(_, e)| e)?;
        let size = context.window().inner_size();
        info!("Opened {}x{} window \"{}\"", size.width, size.height, title);

        Ok(Self {
            events,
            context,
            should_close: false,
            size: (size.width, size.height),
            // The first frame sets up the viewport like any resize
            resized: true,
        })
    }

    /// Loads the OpenGL function table from this window's context.
    pub fn load_driver(&self) -> Result<GlDriver, AppError> {
        let context = &self.context;
        // The context was made current in `create` and lives as long as the window
        Ok(unsafe { GlDriver::load_with(|s| context.get_proc_address(s)) }?)
    }

    /// Handles everything that's queued up without waiting for more.
    pub fn poll_events(&mut self) {
        let context = &self.context;
        let should_close = &mut self.should_close;
        let size = &mut self.size;
        let resized = &mut self.resized;

        self.events.run_return(|event, _, control_flow| {
            *control_flow = ControlFlow::Poll;

            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => *should_close = true,
                    WindowEvent::Resized(new_size) => {
                        debug!("Window resized to {}x{}", new_size.width, new_size.height);
                        context.resize(new_size);
                        *size = (new_size.width, new_size.height);
                        *resized = true;
                    }
                    _ => {}
                },
                Event::MainEventsCleared => *control_flow = ControlFlow::Exit,
                _ => {}
            }
        });
    }

    pub fn swap_buffers(&self) -> Result<(), AppError> {
        Ok(self.context.swap_buffers()?)
    }

    pub fn should_close(&self) -> bool {
        self.should_close
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    /// The new size if the window changed size since the last call.
    pub fn take_resize(&mut self) -> Option<(u32, u32)> {
        if std::mem::replace(&mut self.resized, false) {
            Some(self.size)
        } else {
            None
        }
    }
}

/// Width over height, falling back to 1 while minimised.
pub fn aspect_ratio((width, height): (u32, u32)) -> f32 {
    if width == 0 || height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn aspect_ratio_survives_minimising() {
        assert_eq!(aspect_ratio((640, 480)), 640.0 / 480.0);
        assert_eq!(aspect_ratio((0, 0)), 1.0);
        assert_eq!(aspect_ratio((300, 0)), 1.0);
    }
}
