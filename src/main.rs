#[macro_use] extern crate clap;

pub mod error;
pub mod interface;
pub mod scene;

use std::process;

use graphics::{GlContext, Renderer};
use log::{error, info};

use error::AppError;
use interface::cli::Settings;
use interface::window::{aspect_ratio, Window};
use scene::QuadScene;

const CLEAR_COLOR: [f32; 4] = [0.0, 0.0, 0.0, 1.0];

/// A renderer with the clear colour set and alpha blending on, so the quad colour's alpha shows.
fn setup_renderer(gl: &GlContext) -> Renderer {
    let renderer = Renderer::new(gl);
    renderer.set_clear_color(CLEAR_COLOR);
    renderer.enable_alpha_blending();
    renderer
}

fn run(settings: &Settings) -> Result<(), AppError> {
    let mut window = Window::create(
        settings.width,
        settings.height,
        &settings.title,
        settings.swap_interval,
    )?;
    let gl = GlContext::new(window.load_driver()?);
    info!("OpenGL {}", gl.driver_version());

    // Declared after the window so they're dropped while its context is still alive
    let renderer = setup_renderer(&gl);
    let mut scene = QuadScene::new(
        &gl,
        &settings.shader,
        settings.color,
        aspect_ratio(window.size()),
    )?;

    let mut frames = 0u64;
    while !window.should_close() {
        if let Some((width, height)) = window.take_resize() {
            renderer.set_viewport(0, 0, width, height);
            scene.set_aspect(aspect_ratio((width, height)));
        }

        renderer.clear();
        scene.render(&renderer)?;
        window.swap_buffers()?;
        window.poll_events();

        frames += 1;
        if settings.frames.map_or(false, |limit| frames >= limit) {
            break;
        }
    }

    info!("Closing after {} frames", frames);
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let settings = match Settings::from_args(std::env::args_os()) {
        Ok(settings) => settings,
        // --help and --version land here too
        Err(AppError::Cli(e)) => e.exit(),
        Err(e) => {
            error!("{}", e);
            process::exit(e.exit_code());
        }
    };

    if let Err(e) = run(&settings) {
        error!("{}", e);
        process::exit(e.exit_code());
    }
}
