use anyhow::{Context as _, Result, anyhow};
use clap::Parser;
use duskfall_assets::AssetLibrary;
use duskfall_input::{Action, FrameIntent, IntentState};
use duskfall_kernel::{FrameOutcome, GameSession, SessionConfig, SessionState};
use duskfall_persist::ScoreFile;
use duskfall_render::{FramePlan, Renderer};
use duskfall_render_wgpu::{WgpuRenderer, WgpuTarget};
use egui::Context as EguiContext;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{DeviceEvent, ElementState, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{CursorGrabMode, Window, WindowId};

/// Simulation step. Movement constants in the kernel are per step.
const STEP_SECONDS: f32 = 1.0 / 60.0;
/// Steps run per redraw at most, so a stall does not snowball.
const MAX_STEPS_PER_FRAME: u32 = 5;

#[derive(Parser)]
#[command(name = "duskfall-desktop", about = "Duskfall: survive the night")]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Session config JSON; defaults apply for missing fields
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the config's seed
    #[arg(long)]
    seed: Option<u64>,

    /// Directory holding models and textures
    #[arg(long, default_value = "./assets")]
    assets: PathBuf,

    /// High-score file
    #[arg(long, default_value = "./duskfall_scores.json")]
    scores: PathBuf,
}

/// Intent for one catch-up step. The first step of a redraw takes the
/// pending intent; later steps repeat its held movement without edges, so a
/// jump or shot fires once.
fn step_intent(state: &mut IntentState, held: &mut Option<FrameIntent>) -> FrameIntent {
    let intent = match held.take() {
        Some(previous) => previous,
        None => state.take_frame(),
    };
    *held = Some(intent.without_edges());
    intent
}

/// Requests from the UI, applied after the egui pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum UiCommand {
    Start,
    Resume,
    Restart,
    Menu,
    Quit,
}

/// Game state independent of the window and GPU.
struct AppState {
    session: GameSession,
    intent: IntentState,
    scores: ScoreFile,
    /// Rank of the last game-over score, if it made the table.
    last_rank: Option<usize>,
    started: Instant,
    last_frame: Instant,
    accumulator: f32,
    pointer_captured: bool,
}

impl AppState {
    fn new(config: SessionConfig, scores: ScoreFile) -> Self {
        let now = Instant::now();
        Self {
            session: GameSession::new(config),
            intent: IntentState::new(),
            scores,
            last_rank: None,
            started: now,
            last_frame: now,
            accumulator: 0.0,
            pointer_captured: false,
        }
    }

    fn now(&self) -> f64 {
        self.started.elapsed().as_secs_f64()
    }

    fn act(&mut self, action: Action) {
        if self.session.state() == SessionState::Playing {
            let now = self.now();
            self.intent.apply(action, now);
        }
    }

    fn handle_key(&mut self, key: KeyCode, pressed: bool) {
        let action = match key {
            KeyCode::KeyW | KeyCode::ArrowUp => Action::Forward(pressed),
            KeyCode::KeyS | KeyCode::ArrowDown => Action::Back(pressed),
            KeyCode::KeyA | KeyCode::ArrowLeft => Action::StrafeLeft(pressed),
            KeyCode::KeyD | KeyCode::ArrowRight => Action::StrafeRight(pressed),
            KeyCode::Space if pressed => Action::Jump,
            KeyCode::Escape if pressed => {
                match self.session.state() {
                    SessionState::Playing => self.pause(),
                    SessionState::Paused => self.command(UiCommand::Resume),
                    _ => {}
                }
                return;
            }
            KeyCode::Enter if pressed => {
                match self.session.state() {
                    SessionState::Menu => self.command(UiCommand::Start),
                    SessionState::GameOver => self.command(UiCommand::Restart),
                    _ => {}
                }
                return;
            }
            _ => Action::Noop,
        };
        self.act(action);
    }

    fn pause(&mut self) {
        if let Err(err) = self.session.pause() {
            tracing::warn!(%err, "pause rejected");
        }
        self.intent.clear();
    }

    fn command(&mut self, command: UiCommand) {
        let result = match command {
            UiCommand::Start => self.session.start(),
            UiCommand::Resume => self.session.resume(),
            UiCommand::Restart => self.session.restart(),
            UiCommand::Menu => self.session.to_menu(),
            UiCommand::Quit => return,
        };
        match result {
            Ok(()) => {
                self.intent.clear();
                self.accumulator = 0.0;
                if command != UiCommand::Menu {
                    self.last_rank = None;
                }
            }
            Err(err) => tracing::warn!(%err, "transition rejected"),
        }
    }

    /// Run whole simulation steps for the time since the last redraw.
    fn update(&mut self) {
        let now = Instant::now();
        let dt = (now - self.last_frame).as_secs_f32().min(0.25);
        self.last_frame = now;
        if self.session.state() != SessionState::Playing {
            return;
        }
        self.accumulator += dt;
        let mut steps = 0;
        let mut held = None;
        while self.accumulator >= STEP_SECONDS && steps < MAX_STEPS_PER_FRAME {
            self.accumulator -= STEP_SECONDS;
            steps += 1;
            let intent = step_intent(&mut self.intent, &mut held);
            if let FrameOutcome::GameOver { score } = self.session.frame(STEP_SECONDS, &intent) {
                self.finish(score);
                break;
            }
        }
        if steps == MAX_STEPS_PER_FRAME {
            self.accumulator = 0.0;
        }
        for event in self.session.drain_events() {
            tracing::debug!(event = event.name(), ?event, "game event");
        }
    }

    fn finish(&mut self, score: u32) {
        self.intent.clear();
        self.accumulator = 0.0;
        match self.scores.submit(score) {
            Ok(rank) => self.last_rank = rank,
            Err(err) => {
                tracing::error!(%err, path = %self.scores.path().display(), "could not save score")
            }
        }
    }

    fn draw_ui(&self, ctx: &EguiContext, commands: &mut Vec<UiCommand>) {
        let panel = |title: &str| {
            egui::Window::new(title.to_owned())
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .collapsible(false)
                .resizable(false)
        };
        let button = |ui: &mut egui::Ui, label: &str, command: UiCommand, out: &mut Vec<UiCommand>| {
            if ui.add_sized([180.0, 28.0], egui::Button::new(label)).clicked() {
                out.push(command);
            }
        };

        match self.session.state() {
            SessionState::Menu => {
                panel("Duskfall").show(ctx, |ui| {
                    ui.label("WASD to move, mouse to look, hold the button to charge a shot.");
                    ui.add_space(8.0);
                    button(ui, "Start", UiCommand::Start, commands);
                    button(ui, "Quit", UiCommand::Quit, commands);
                    self.score_table(ui);
                });
            }
            SessionState::Paused => {
                panel("Paused").show(ctx, |ui| {
                    button(ui, "Resume", UiCommand::Resume, commands);
                    button(ui, "Main menu", UiCommand::Menu, commands);
                });
            }
            SessionState::GameOver => {
                panel("Game over").show(ctx, |ui| {
                    ui.heading(format!("Score: {}", self.session.score()));
                    if let Some(rank) = self.last_rank {
                        ui.label(format!("New high score, #{}", rank + 1));
                    }
                    ui.add_space(8.0);
                    button(ui, "Play again", UiCommand::Restart, commands);
                    button(ui, "Main menu", UiCommand::Menu, commands);
                    self.score_table(ui);
                });
            }
            SessionState::Playing => {}
        }

        if matches!(
            self.session.state(),
            SessionState::Playing | SessionState::Paused
        ) {
            self.hud(ctx);
        }
    }

    fn hud(&self, ctx: &EguiContext) {
        let health = self.session.health();
        let hearts = "\u{2665}".repeat(health.current() as usize);
        egui::Area::new(egui::Id::new("hud"))
            .anchor(egui::Align2::LEFT_TOP, [16.0, 16.0])
            .show(ctx, |ui| {
                ui.label(
                    egui::RichText::new(format!("SCORE {}", self.session.score()))
                        .size(22.0)
                        .color(egui::Color32::WHITE),
                );
                ui.label(
                    egui::RichText::new(hearts)
                        .size(22.0)
                        .color(egui::Color32::from_rgb(220, 30, 40)),
                );
                let charge = self.intent.charge();
                if charge.is_charging() {
                    ui.add(
                        egui::ProgressBar::new(charge.fraction(self.now()))
                            .desired_width(200.0)
                            .text("charge"),
                    );
                }
            });
    }

    fn score_table(&self, ui: &mut egui::Ui) {
        let table = self.scores.scores();
        if table.is_empty() {
            return;
        }
        ui.separator();
        ui.label("High scores");
        for (i, score) in table.as_slice().iter().enumerate() {
            ui.monospace(format!("{}. {score:>6}", i + 1));
        }
    }
}

/// Everything that exists only while the window does.
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
    fn new(event_loop: &ActiveEventLoop, egui_ctx: &EguiContext, assets: &AssetLibrary) -> Result<Self> {
        let attrs = Window::default_attributes()
            .with_title("Duskfall")
            .with_inner_size(PhysicalSize::new(1280u32, 720));
        let window = Arc::new(event_loop.create_window(attrs).context("create window")?);

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::all(),
            ..Default::default()
        });
        let surface = instance
            .create_surface(window.clone())
            .context("create surface")?;
        let adapter = pollster::block_on(instance.request_adapter(&wgpu::RequestAdapterOptions {
            power_preference: wgpu::PowerPreference::HighPerformance,
            compatible_surface: Some(&surface),
            force_fallback_adapter: false,
        }))
        .ok_or_else(|| anyhow!("no suitable GPU adapter"))?;
        let (device, queue) = pollster::block_on(adapter.request_device(
            &wgpu::DeviceDescriptor {
                label: Some("duskfall_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: Default::default(),
            },
            None,
        ))
        .context("create device")?;

        let size = window.inner_size();
        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .find(|f| f.is_srgb())
            .or(caps.formats.first())
            .copied()
            .ok_or_else(|| anyhow!("surface reports no formats"))?;
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let renderer = WgpuRenderer::new(
            &device,
            &queue,
            format,
            config.width,
            config.height,
            assets,
        );
        let egui_winit = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(&device, format, None, 1, false);
        tracing::info!(
            backend = ?adapter.get_info().backend,
            "GPU initialized"
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

    fn aspect(&self) -> f32 {
        self.config.width as f32 / self.config.height.max(1) as f32
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        self.config.width = size.width.max(1);
        self.config.height = size.height.max(1);
        self.surface.configure(&self.device, &self.config);
        self.renderer
            .resize(&self.device, self.config.width, self.config.height);
    }

    fn set_pointer_capture(&self, captured: bool) {
        let grab = if captured {
            self.window
                .set_cursor_grab(CursorGrabMode::Confined)
                .or_else(|_| self.window.set_cursor_grab(CursorGrabMode::Locked))
        } else {
            self.window.set_cursor_grab(CursorGrabMode::None)
        };
        if let Err(err) = grab {
            tracing::warn!(%err, "cursor grab unavailable");
        }
        self.window.set_cursor_visible(!captured);
    }
}

struct GpuApp {
    state: AppState,
    assets: AssetLibrary,
    gpu: Option<Gpu>,
    egui_ctx: EguiContext,
}

impl GpuApp {
    /// Capture the pointer exactly while playing.
    fn sync_pointer(&mut self) {
        let want = self.state.session.state() == SessionState::Playing;
        if want != self.state.pointer_captured {
            self.state.pointer_captured = want;
            if let Some(gpu) = &self.gpu {
                gpu.set_pointer_capture(want);
            }
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        self.state.update();
        self.sync_pointer();
        let Some(gpu) = &mut self.gpu else {
            return;
        };

        let output = match gpu.surface.get_current_texture() {
            Ok(t) => t,
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                gpu.surface.configure(&gpu.device, &gpu.config);
                return;
            }
            Err(e) => {
                tracing::error!("surface error: {e}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let plan = FramePlan::build(&self.state.session, gpu.aspect());
        let mut target = WgpuTarget {
            renderer: &gpu.renderer,
            device: &gpu.device,
            queue: &gpu.queue,
            view: &view,
        };
        if let Err(err) = target.render(&plan) {
            tracing::error!(%err, "frame dropped");
        }

        let raw_input = gpu.egui_winit.take_egui_input(&gpu.window);
        let mut commands = Vec::new();
        let state = &self.state;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            state.draw_ui(ctx, &mut commands);
        });
        gpu.egui_winit
            .handle_platform_output(&gpu.window, full_output.platform_output);
        let paint_jobs = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [gpu.config.width, gpu.config.height],
            pixels_per_point: full_output.pixels_per_point,
        };

        for (id, image_delta) in &full_output.textures_delta.set {
            gpu.egui_renderer
                .update_texture(&gpu.device, &gpu.queue, *id, image_delta);
        }
        let mut encoder = gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("egui_encoder"),
            });
        gpu.egui_renderer.update_buffers(
            &gpu.device,
            &gpu.queue,
            &mut encoder,
            &paint_jobs,
            &screen_descriptor,
        );
        {
            let mut pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui_pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
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
            gpu.egui_renderer
                .render(&mut pass, &paint_jobs, &screen_descriptor);
        }
        gpu.queue.submit(std::iter::once(encoder.finish()));
        for id in &full_output.textures_delta.free {
            gpu.egui_renderer.free_texture(id);
        }
        output.present();

        for command in commands {
            if command == UiCommand::Quit {
                event_loop.exit();
            }
            self.state.command(command);
        }
        self.sync_pointer();
    }
}

impl ApplicationHandler for GpuApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.is_some() {
            return;
        }
        match Gpu::new(event_loop, &self.egui_ctx, &self.assets) {
            Ok(gpu) => self.gpu = Some(gpu),
            Err(err) => {
                tracing::error!("{err:#}");
                event_loop.exit();
            }
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        if let Some(gpu) = &mut self.gpu {
            let response = gpu.egui_winit.on_window_event(&gpu.window, &event);
            // While playing the pointer belongs to the game.
            if response.consumed && !self.state.pointer_captured {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = &mut self.gpu {
                    gpu.resize(size);
                }
            }
            WindowEvent::Focused(false) => {
                if self.state.session.state() == SessionState::Playing {
                    self.state.pause();
                }
                self.sync_pointer();
            }
            WindowEvent::KeyboardInput {
                event:
                    KeyEvent {
                        physical_key: PhysicalKey::Code(key),
                        state: key_state,
                        repeat: false,
                        ..
                    },
                ..
            } => {
                self.state
                    .handle_key(key, key_state == ElementState::Pressed);
            }
            WindowEvent::MouseInput {
                button: MouseButton::Left,
                state: button_state,
                ..
            } => {
                let action = match button_state {
                    ElementState::Pressed => Action::ChargeStart,
                    ElementState::Released => Action::ChargeRelease,
                };
                self.state.act(action);
            }
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(gpu) = &self.gpu {
                    gpu.window.request_redraw();
                }
            }
            _ => {}
        }
    }

    fn device_event(
        &mut self,
        _event_loop: &ActiveEventLoop,
        _device_id: winit::event::DeviceId,
        event: DeviceEvent,
    ) {
        if let DeviceEvent::MouseMotion { delta } = event {
            if self.state.pointer_captured {
                self.state.act(Action::Look {
                    dx: delta.0 as f32,
                    dy: delta.1 as f32,
                });
            }
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(gpu) = &self.gpu {
            gpu.window.request_redraw();
        }
    }
}

fn load_config(path: Option<&PathBuf>, seed: Option<u64>) -> Result<SessionConfig> {
    let mut config = match path {
        Some(path) => SessionConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    if let Some(seed) = seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .init();

    tracing::info!("duskfall-desktop starting");

    let config = load_config(cli.config.as_ref(), cli.seed)?;
    let scores = ScoreFile::open(&cli.scores)
        .with_context(|| format!("opening scores {}", cli.scores.display()))?;
    let assets = AssetLibrary::load(&cli.assets);

    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = GpuApp {
        state: AppState::new(config, scores),
        assets,
        gpu: None,
        egui_ctx: EguiContext::default(),
    };
    event_loop.run_app(&mut app)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn catch_up_steps_fire_once_and_keep_walking() {
        let mut state = IntentState::new();
        state.apply(Action::Forward(true), 0.0);
        state.apply(Action::Jump, 0.0);
        state.apply(Action::ChargeStart, 0.0);
        state.apply(Action::ChargeRelease, 0.5);

        let mut held = None;
        let first = step_intent(&mut state, &mut held);
        let second = step_intent(&mut state, &mut held);
        let third = step_intent(&mut state, &mut held);
        assert!(first.jump);
        assert!(first.fire.is_some());
        for later in [second, third] {
            assert!(later.movement.forward);
            assert!(!later.jump);
            assert_eq!(later.fire, None);
        }
    }

    #[test]
    fn next_redraw_takes_fresh_input() {
        let mut state = IntentState::new();
        let mut held = None;
        step_intent(&mut state, &mut held);
        state.apply(Action::Jump, 1.0);
        let mut next = None;
        assert!(step_intent(&mut state, &mut next).jump);
    }
}
