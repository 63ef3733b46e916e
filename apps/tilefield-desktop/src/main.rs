use anyhow::{Context, Result};
use clap::Parser;
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tilefield_common::{FieldConfig, FieldOverrides};
use tilefield_kernel::{Game, GameSummary, SystemClock};
use tilefield_render::{DrawList, OrthoCamera};
use tilefield_render_wgpu::WgpuRenderer;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowId};

#[derive(Parser)]
#[command(name = "tilefield-desktop", about = "Tile field desktop window")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// JSON field config; flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Field width in cells
    #[arg(long)]
    width: Option<u32>,

    /// Field height in cells
    #[arg(long)]
    height: Option<u32>,

    /// Cell edge length in world units (pixels at the default zoom)
    #[arg(long)]
    cell_size: Option<f32>,

    /// Show the field inspector panel
    #[arg(long)]
    inspector: bool,
}

impl Cli {
    fn field_config(&self) -> Result<FieldConfig> {
        let base = match &self.config {
            Some(path) => FieldConfig::load(path)
                .with_context(|| format!("loading config {}", path.display()))?,
            None => FieldConfig::default(),
        };
        Ok(base.with_overrides(&FieldOverrides {
            width: self.width,
            height: self.height,
            cell_size: self.cell_size,
            ..FieldOverrides::default()
        })?)
    }
}

/// Application state.
struct AppState {
    game: Game<SystemClock>,
    camera: OrthoCamera,
    show_inspector: bool,
    frames: u64,
}

impl AppState {
    fn new(config: FieldConfig, show_inspector: bool) -> Result<Self> {
        let game = tilefield_kernel::init(config, SystemClock::new())?;
        Ok(Self {
            game,
            camera: OrthoCamera::default(),
            show_inspector,
            frames: 0,
        })
    }

    fn draw_ui(&self, ctx: &EguiContext) {
        if !self.show_inspector {
            return;
        }

        let summary = self.game.summary();

        egui::SidePanel::left("inspector")
            .default_width(240.0)
            .show(ctx, |ui| {
                ui.heading("Tile Field");
                ui.separator();
                if let Some(field) = self.game.field() {
                    ui.label(format!(
                        "Grid: {}x{}  cell={}",
                        field.width(),
                        field.height(),
                        field.cell_size()
                    ));
                }
                ui.label(format!("Tiles: {} / {}", summary.occupied, summary.cells));
                ui.label(format!("Next spawn: {} ms", summary.next_spawn_ms));
                ui.label(format!("Elapsed: {} ms", summary.elapsed_ms));
                ui.separator();
                ui.label(format!(
                    "Ticks: {}  skipped: {}",
                    summary.ticks, summary.skipped_ticks
                ));
                ui.label(format!("Frames: {}", self.frames));
                ui.label(format!(
                    "Camera: {:.0}..{:.0} x {:.0}..{:.0}",
                    self.camera.left, self.camera.right, self.camera.top, self.camera.bottom
                ));
            });
    }
}

struct Gpu {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    renderer: WgpuRenderer,
    egui_winit: egui_winit::State,
    egui_renderer: egui_wgpu::Renderer,
}

impl Gpu {
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Tilefield")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs)?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });

        let surface = instance.create_surface(window.clone())?;

        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .context("no compatible GPU adapter")?;

        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("tilefield_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))?;

        let size = window.inner_size();
        let surface_caps = surface.get_capabilities(&adapter);
        let surface_format = surface_caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or_else(|| surface_caps.formats.first())
            .copied()
            .context("surface reports no formats")?;
        let alpha_mode = surface_caps
            .alpha_modes
            .first()
            .copied()
            .unwrap_or(wgpu::CompositeAlphaMode::Auto);

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(&device, surface_format, config.width, config.height);

        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, surface_format, None, 1, false);

        tracing::info!(
            "GPU initialized with {} backend",
            adapter.get_info().backend.to_str()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            renderer,
            egui_winit,
            egui_renderer,
        })
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn draw_overlay(
        &mut self,
        egui_ctx: &EguiContext,
        state: &AppState,
        view: &wgpu::TextureView,
    ) {
        let raw_input = self.egui_winit.take_egui_input(&self.window);
        let full_output = egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx);
        });

        self.egui_winit
            .handle_platform_output(&self.window, full_output.platform_output);

        let paint_jobs = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.config.width, self.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            self.egui_renderer
                .update_texture(&self.device, &self.queue, *id, image_delta);
        }
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        self.egui_renderer.update_buffers(
            &self.device,
            &self.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        self.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }

    /// Render the scene, overlay the inspector, present. Returns false if
    /// the frame was skipped.
    fn render(&mut self, egui_ctx: &EguiContext, state: &AppState) -> bool {
        let output = match self.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                self.surface.configure(&self.device, &self.config);
                return false;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return false;
            }
        };

        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let list = DrawList::from_scene(state.game.scene());
        self.renderer
            .render(&self.device, &self.queue, &view, &state.camera, &list);

        if state.show_inspector {
            self.draw_overlay(egui_ctx, state, &view);
        }

        output.present();
        true
    }
}

struct GpuApp {
    state: AppState,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
    failed: Option<anyhow::Error>,
}

impl GpuApp {
    fn new(state: AppState) -> Self {
        Self {
            state,
            gpu: None,
            egui_ctx: EguiContext::default(),
            failed: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: anyhow::Error) {
        tracing::error!("{error:#}");
        self.failed = Some(error);
        event_loop.exit();
    }

    /// Stop the game and hand back its final summary, or the fatal error.
    fn finish(self) -> Result<GameSummary> {
        let summary = self.state.game.shutdown();
        match self.failed {
            Some(error) => Err(error),
            None => Ok(summary),
        }
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }

        match Gpu::new(event_loop, &self.egui_ctx) {
            Ok(gpu) => {
                let size = gpu.window.inner_size();
                self.state.camera.resize(size.width, size.height);
                gpu.window.request_redraw();
                self.gpu = Some(gpu);
            }
            Err(e) => self.fail(event_loop, e.context("GPU initialization failed")),
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        if self.state.show_inspector {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(new_size) => {
                gpu.resize(new_size);
                self.state.camera.resize(new_size.width, new_size.height);
            }
            WindowEvent::RedrawRequested => {
                if gpu.render(&self.egui_ctx, &self.state) {
                    self.state.frames += 1;
                }
                gpu.window.request_redraw();
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if let Err(e) = self.state.game.pump() {
            self.fail(event_loop, anyhow::Error::new(e).context("tick failed"));
            return;
        }

        let deadline = Instant::now() + self.state.game.time_until_next_tick();
        event_loop.set_control_flow(ControlFlow::WaitUntil(deadline));
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("tilefield-desktop starting");

    let config = cli.field_config()?;
    let state = AppState::new(config, cli.inspector)?;

    let event_loop = EventLoop::new()?;
    let mut app = GpuApp::new(state);
    event_loop.run_app(&mut app)?;

    let summary = app.finish()?;
    tracing::info!(%summary, "tilefield-desktop exiting");
    Ok(())
}
