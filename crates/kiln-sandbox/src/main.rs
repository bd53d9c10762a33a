mod motion;

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Result;
use glam::Vec2;

use kiln_engine::backend::{RenderBackend, WgpuBackend, WgpuShader};
use kiln_engine::camera::OrthographicCamera;
use kiln_engine::core::{App, AppControl, FrameCtx};
use kiln_engine::device::GpuInit;
use kiln_engine::input::Key;
use kiln_engine::logging::{init_logging, LoggingConfig};
use kiln_engine::paint::Color;
use kiln_engine::render::{PrimitiveRenderer, PrimitiveSettings};
use kiln_engine::texture::Texture;
use kiln_engine::window::{Runtime, RuntimeConfig};

use motion::Motion;

const QUAD_SIZE: f32 = 100.0;
const BACKGROUND: Color = Color::new(0.2, 0.2, 0.25, 1.0);

struct Sandbox {
    renderer: PrimitiveRenderer<WgpuShader>,
    camera: OrthographicCamera,
    texture: Rc<Texture>,
    player: Motion,
}

impl Sandbox {
    fn new(texture: Texture, width: f32, height: f32) -> Self {
        let mut camera = OrthographicCamera::new(width, height);
        camera.ortho_size = 300.0;
        Self {
            renderer: PrimitiveRenderer::new(),
            camera,
            texture: Rc::new(texture),
            player: Motion::default(),
        }
    }

    fn draw_grid(&mut self) {
        let grid = Color::new(1.0, 1.0, 1.0, 0.08);
        for i in -6..=6 {
            let p = i as f32 * 50.0;
            self.renderer.draw_line(p, -300.0, p, 300.0, grid);
            self.renderer.draw_line(-300.0, p, 300.0, p, grid);
        }
    }
}

impl App for Sandbox {
    fn init(&mut self, backend: &mut WgpuBackend<'_>) {
        self.renderer.initialize(backend);
        backend.upload_texture(&self.texture);
    }

    fn on_resize(&mut self, width: u32, height: u32) {
        self.camera.set_viewport_size(width as f32, height as f32);
    }

    fn on_frame(&mut self, ctx: &mut FrameCtx<'_, '_>) -> AppControl {
        let dt = ctx.time.dt;

        self.renderer.begin_frame();
        self.renderer.clear(ctx.backend, BACKGROUND);
        self.renderer.set_pipeline(
            ctx.backend,
            PrimitiveSettings {
                depth_test: false,
                blend: true,
            },
        );

        let input = Vec2::new(
            ctx.input.axis(Key::A, Key::D),
            ctx.input.axis(Key::S, Key::W),
        );
        self.player.step(input, dt);

        self.draw_grid();
        self.renderer.draw_quad(-290.0, -290.0, 40.0, 40.0, Color::RED);
        self.renderer.draw_point(0.0, 0.0, 6.0, Color::WHITE);
        let p = self.player.position;
        self.renderer
            .draw_textured_quad(p.x, p.y, QUAD_SIZE, QUAD_SIZE, Some(&self.texture));

        self.renderer.end_frame(ctx.backend, &self.camera);

        if ctx.time.frame_index % 600 == 0 {
            log::debug!("frame {} dt={dt:.4} pos={p}", ctx.time.frame_index);
        }
        AppControl::Continue
    }

    fn on_exit(&mut self, backend: &mut WgpuBackend<'_>) {
        let renderer = std::mem::take(&mut self.renderer);
        renderer.release(backend);
        backend.release_texture(&self.texture);
    }
}

/// PNG from the first argument, or a generated checkerboard.
fn load_texture() -> Result<Texture> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        match Texture::load_png(&path, "player") {
            Ok(t) => return Ok(t),
            Err(e) => log::warn!("{e}; using checkerboard"),
        }
    }
    Ok(Texture::checkerboard(
        "player",
        64,
        8,
        Color::from_u8(240, 180, 60, 255),
        Color::from_u8(40, 40, 48, 255),
    )?)
}

fn main() -> Result<()> {
    init_logging(LoggingConfig::default());

    let config = RuntimeConfig {
        title: "Kiln Sandbox".to_string(),
        initial_size: kiln_engine::window::LogicalSize::new(800.0, 600.0),
        clear_color: None,
        ..RuntimeConfig::default()
    };
    let texture = load_texture()?;
    let app = Sandbox::new(
        texture,
        config.initial_size.width as f32,
        config.initial_size.height as f32,
    );

    Runtime::run(config, GpuInit::default(), app)
}
