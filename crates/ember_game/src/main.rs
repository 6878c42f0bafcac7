//! Ember Engine -- host loop and application entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`.
//! Startup wires the ambient services in the order the rest of the engine
//! expects them: file logger, config, window, GPU context, resource
//! manager, game state. Each frame then runs a fixed cycle:
//!
//!   1. Forward queued input events to the active screen
//!   2. `while should_step()` -- consume fixed-dt slices of simulation
//!   3. Rebuild the sprite batch from the active screen
//!   4. Stream the batch into GPU buffers and draw it in one pass
//!
//! Screen transitions are host-driven: the loop watches its own shortcuts
//! (Escape quits, Enter on the menu starts play) and asks the game state
//! to switch. The game state itself never decides transitions.

mod game_state;
mod screen;
mod screens;

use std::sync::Arc;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use ember_assets::ResourceManager;
use ember_core::config::{Config, ConfigKey, DEFAULT_CONFIG_FILE};
use ember_core::input::{InputState, Key, ScreenEvent};
use ember_core::logging::FileLogger;
use ember_core::time::TimeState;
use ember_platform::window::PlatformConfig;
use ember_render::{
    Camera2D, GpuContext, GpuTextureRealizer, SpriteBatch, SpritePipeline, SpriteVertex,
};

use game_state::GameState;
use screens::{MenuScreen, PlayScreen};

const MENU_SCREEN: &str = "menu";
const PLAY_SCREEN: &str = "play";
const FPS_LOG_INTERVAL_FRAMES: u64 = 600;

struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    time: TimeState,
    input: InputState,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    resources: ResourceManager<GpuTextureRealizer>,
    game_state: GameState<GpuTextureRealizer>,
    pending_events: Vec<ScreenEvent>,

    // Per-frame GPU mesh state. The batch is rebuilt on the CPU each
    // frame and streamed into these buffers; they grow power-of-two and
    // never shrink.
    batch: SpriteBatch,
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, game_folder: &str) -> Self {
        let gpu = GpuContext::new(window.clone())
            .unwrap_or_else(|err| panic!("Failed to create rendering context: {err}"));
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let camera = Camera2D::new(gpu.size.0, gpu.size.1);

        let realizer = GpuTextureRealizer::new(&gpu, &sprite_pipeline);
        let mut resources = ResourceManager::new(game_folder, realizer);
        log::info!(
            "Resource manager rooted at {}",
            resources.game_root().display()
        );

        let mut game_state = GameState::new();
        game_state.add_screen(MENU_SCREEN, MenuScreen::new());
        game_state.add_screen(PLAY_SCREEN, PlayScreen::new());
        if let Err(err) = game_state.set_active_screen(MENU_SCREEN, &mut resources) {
            log::error!("Failed to activate '{MENU_SCREEN}': {err}");
        }

        let camera_uniform = camera.build_uniform();
        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera_uniform]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);
        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Self {
            window,
            gpu,
            time: TimeState::new(),
            input: InputState::new(),
            camera,
            sprite_pipeline,
            resources,
            game_state,
            pending_events: Vec::new(),
            batch: SpriteBatch::new(),
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 1,
            mesh_index_capacity: 1,
        }
    }

    fn frame(&mut self, event_loop: &ActiveEventLoop) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }

        self.time.begin_frame();
        if self.time.frame_count % FPS_LOG_INTERVAL_FRAMES == 0 {
            log::debug!("fps: {:.1}", self.time.smoothed_fps);
        }

        // Events reach the active screen before this frame's updates.
        for event in self.pending_events.drain(..) {
            self.game_state.handle_event(&event);
        }

        if self.input.is_just_pressed(Key::Escape) {
            log::info!("Escape pressed, exiting.");
            event_loop.exit();
            return;
        }
        if self.input.is_just_pressed(Key::Enter)
            && self.game_state.active_screen() == Some(MENU_SCREEN)
        {
            if let Err(err) = self
                .game_state
                .set_active_screen(PLAY_SCREEN, &mut self.resources)
            {
                log::error!("Failed to activate '{PLAY_SCREEN}': {err}");
            }
        }

        let fixed_dt = self.time.fixed_dt as f32;
        while self.time.should_step() {
            self.game_state.update(fixed_dt);
        }

        self.batch.clear();
        self.game_state.render(&mut self.batch);
        self.upload_batch();
        self.draw_frame();

        // Clear edge-triggered input only after at least one fixed step
        // consumed it; a press on a zero-step frame must survive.
        if self.time.steps_this_frame > 0 {
            self.input.end_frame();
        }
    }

    fn upload_batch(&mut self) {
        let vertex_count = self.batch.vertices().len().max(1);
        if vertex_count > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = vertex_count.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }
        let index_count = self.batch.indices().len().max(1);
        if index_count > self.mesh_index_capacity {
            self.mesh_index_capacity = index_count.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }

        if !self.batch.vertices().is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(self.batch.vertices()),
            );
        }
        if !self.batch.indices().is_empty() {
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(self.batch.indices()),
            );
        }
    }

    fn draw_frame(&mut self) {
        let camera_uniform = self.camera.build_uniform();
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[camera_uniform]),
        );

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Frame Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Screen Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color {
                            r: 0.05,
                            g: 0.05,
                            b: 0.08,
                            a: 1.0,
                        }),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });

            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);

            let mut last_bound: Option<&str> = None;
            for draw in self.batch.draw_calls() {
                match self.resources.get_texture(&draw.texture_key) {
                    Ok(sprite) => {
                        if last_bound != Some(&*draw.texture_key) {
                            render_pass.set_bind_group(1, &sprite.bind_group, &[]);
                            last_bound = Some(&*draw.texture_key);
                        }
                        render_pass.draw_indexed(
                            draw.index_start..(draw.index_start + draw.index_count),
                            0,
                            0..1,
                        );
                    }
                    Err(err) => {
                        log::warn!("Skipping draw call: {err}");
                    }
                }
            }
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

struct App {
    config: PlatformConfig,
    game_folder: String,
    state: Option<EngineState>,
}

impl App {
    fn new(config: PlatformConfig, game_folder: String) -> Self {
        Self {
            config,
            game_folder,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = ember_platform::window::create_window(event_loop, &self.config);
        self.state = Some(EngineState::new(window, &self.game_folder));
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(state) = &self.state {
            state.window.request_redraw();
        }
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                event_loop.exit();
            }

            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.resize(w, h);
                    log::info!("Resized to {}x{}", w, h);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if let PhysicalKey::Code(key_code) = event.physical_key {
                    if let Some(key) = map_key(key_code) {
                        match event.state {
                            ElementState::Pressed => {
                                // Skip OS key repeats so screens see one
                                // press per physical press.
                                if !state.input.is_held(key) {
                                    state.pending_events.push(ScreenEvent::KeyPressed(key));
                                }
                                state.input.key_down(key);
                            }
                            ElementState::Released => {
                                state.input.key_up(key);
                                state.pending_events.push(ScreenEvent::KeyReleased(key));
                            }
                        }
                    }
                }
            }

            WindowEvent::RedrawRequested => {
                state.frame(event_loop);
            }

            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Batch Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Batch Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Enter => Some(Key::Enter),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        _ => None,
    }
}

fn main() {
    let game_name = std::env::args().nth(1).unwrap_or_else(|| "base".to_string());
    let game_folder = format!("assets/{game_name}");

    if let Err(err) = std::fs::create_dir_all(&game_folder) {
        eprintln!("Failed to create game folder '{game_folder}': {err}");
    }
    FileLogger::new()
        .with_root_folder(&game_folder)
        .install()
        .expect("Failed to install logger");

    log::info!("Ember Engine starting, game folder: {game_folder}");

    let config = Config::load(DEFAULT_CONFIG_FILE)
        .unwrap_or_else(|err| panic!("Failed to load config '{DEFAULT_CONFIG_FILE}': {err}"));
    let width = config
        .get_int(ConfigKey::ScreenWidth)
        .unwrap_or_else(|err| panic!("Bad config: {err}"));
    let height = config
        .get_int(ConfigKey::ScreenHeight)
        .unwrap_or_else(|err| panic!("Bad config: {err}"));
    log::info!("Config values: screen {width}x{height}");

    let platform_config = PlatformConfig {
        width: width.max(1) as u32,
        height: height.max(1) as u32,
        ..Default::default()
    };

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(platform_config, game_folder);
    event_loop.run_app(&mut app).expect("Event loop error");
}
