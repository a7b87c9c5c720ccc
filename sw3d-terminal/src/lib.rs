/// Terminal front end for the scene: render loop, input and logging
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self},
};
use std::io::{self, stdout, Write};
use std::time::{Duration, Instant};
use sw3d_core::{GeometryError, RenderMode, SceneConfig, SceneState};

pub mod export;
pub mod logging;
pub mod renderer;

pub use renderer::{AsciiRenderer, RasterState, Shading};

/// Shadows are black, darkened through `shadow_alpha`
const SHADOW_COLOR: [f32; 3] = [0.0, 0.0, 0.0];

/// Raw mode and the alternate screen, restored on drop even while unwinding
struct ScreenGuard;

impl ScreenGuard {
    fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let guard = ScreenGuard;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;
        Ok(guard)
    }
}

impl Drop for ScreenGuard {
    fn drop(&mut self) {
        let left = execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show);
        let raw = terminal::disable_raw_mode();
        if let Err(error) = left.and(raw) {
            tracing::warn!(%error, "failed to restore terminal");
        }
    }
}

/// Main application struct for terminal 3D rendering
pub struct TerminalApp {
    scene: SceneState,
    renderer: AsciiRenderer,
    running: bool,
    target_frame_time: Duration,
    last_tick: Instant,
    last_fps_sample: Instant,
    frame_count: u32,
    fps: f32,
}

impl TerminalApp {
    /// Build the scene sized to the current terminal
    pub fn new(config: &SceneConfig) -> anyhow::Result<Self> {
        let (width, height) = terminal::size()?;
        Ok(Self::with_size(config, width, height)?)
    }

    /// Build the scene for a fixed viewport without touching the terminal
    pub fn with_size(config: &SceneConfig, width: u16, height: u16) -> Result<Self, GeometryError> {
        let scene = SceneState::new(config, u32::from(width), u32::from(height))?;
        let now = Instant::now();
        Ok(Self {
            scene,
            renderer: AsciiRenderer::new(usize::from(width), usize::from(height)),
            running: true,
            target_frame_time: Duration::from_secs(1) / config.target_fps.max(1),
            last_tick: now,
            last_fps_sample: now,
            frame_count: 0,
            fps: 0.0,
        })
    }

    pub fn scene(&self) -> &SceneState {
        &self.scene
    }

    pub fn renderer(&self) -> &AsciiRenderer {
        &self.renderer
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn run(&mut self) -> io::Result<()> {
        let _screen = ScreenGuard::enter()?;
        self.main_loop()
    }

    fn main_loop(&mut self) -> io::Result<()> {
        tracing::info!(
            width = self.renderer.width(),
            height = self.renderer.height(),
            target_ms = self.target_frame_time.as_millis() as u64,
            "render loop started"
        );
        self.last_tick = Instant::now();

        while self.running {
            let frame_start = Instant::now();

            // Handle input
            while event::poll(Duration::from_millis(0))? {
                let event = event::read()?;
                self.handle_event(&event);
            }

            // Update
            let dt = frame_start.duration_since(self.last_tick).as_secs_f32();
            self.last_tick = frame_start;
            self.scene.tick(dt);

            // Render
            self.render_frame();
            self.present()?;

            // Frame timing
            self.frame_count += 1;
            let elapsed = frame_start.elapsed();
            if elapsed < self.target_frame_time {
                std::thread::sleep(self.target_frame_time - elapsed);
            }

            // Update FPS counter
            let now = Instant::now();
            if (now - self.last_fps_sample).as_secs() >= 1 {
                self.fps = self.frame_count as f32 / (now - self.last_fps_sample).as_secs_f32();
                let target_fps = 1.0 / self.target_frame_time.as_secs_f32();
                if self.fps < target_fps * 0.5 {
                    tracing::warn!(fps = self.fps, target_fps, "frame rate below half of target");
                } else {
                    tracing::trace!(fps = self.fps, "frame rate");
                }
                self.frame_count = 0;
                self.last_fps_sample = now;
            }
        }

        tracing::info!("render loop stopped");
        Ok(())
    }

    /// Apply one input event to the scene
    pub fn handle_event(&mut self, event: &Event) {
        match event {
            Event::Key(KeyEvent { code, kind, .. }) if *kind != KeyEventKind::Release => {
                self.handle_key(*code)
            }
            Event::Resize(width, height) => self.resize(*width, *height),
            _ => {}
        }
    }

    fn handle_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') | KeyCode::Esc => {
                self.running = false;
            }
            KeyCode::Up => self.scene.move_forward(1.0),
            KeyCode::Down => self.scene.move_forward(-1.0),
            KeyCode::Left => self.scene.turn(1.0),
            KeyCode::Right => self.scene.turn(-1.0),
            KeyCode::Char('m') => {
                self.scene.render_mode = self.scene.render_mode.toggled();
                tracing::debug!(mode = ?self.scene.render_mode, "render mode toggled");
            }
            KeyCode::Char(' ') => {
                self.scene.paused = !self.scene.paused;
                tracing::debug!(paused = self.scene.paused, "animation toggled");
            }
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        tracing::debug!(width, height, "terminal resized");
        self.renderer.resize(usize::from(width), usize::from(height));
        self.scene.camera.set_viewport(u32::from(width), u32::from(height));
    }

    /// Draw one frame into the renderer's buffers
    pub fn render_frame(&mut self) {
        let scene = &self.scene;
        let clip_from_world = scene.camera.clip_from_world();
        let light = scene.light_position();
        let wireframe = scene.render_mode == RenderMode::Line;

        self.renderer.clear();

        let opaque = RasterState::opaque(wireframe);
        for item in scene.static_items() {
            self.renderer.draw_mesh(
                item.mesh,
                &item.model,
                &clip_from_world,
                &Shading::lit(item.material, light),
                &opaque,
            );
        }

        // Shadows sit on the floor, above the ground grid and under the props
        let shadow = RasterState::shadow(scene.shadow_alpha, wireframe);
        for item in scene.shadow_items() {
            self.renderer.draw_mesh(
                item.mesh,
                &item.model,
                &clip_from_world,
                &Shading::Flat(SHADOW_COLOR),
                &shadow,
            );
        }

        for item in scene.inhabitants() {
            self.renderer.draw_mesh(
                item.mesh,
                &item.model,
                &clip_from_world,
                &Shading::lit(item.material, light),
                &opaque,
            );
        }
    }

    fn present(&mut self) -> io::Result<()> {
        let mut stdout = stdout();
        queue!(stdout, cursor::MoveTo(0, 0))?;

        self.renderer.draw(&mut stdout)?;

        // Draw UI overlay
        queue!(
            stdout,
            cursor::MoveTo(0, 0),
            SetForegroundColor(Color::Yellow),
            Print(self.status_line()),
            ResetColor
        )?;

        stdout.flush()?;
        Ok(())
    }

    fn status_line(&self) -> String {
        let mode = match self.scene.render_mode {
            RenderMode::Fill => "fill",
            RenderMode::Line => "wire",
        };
        let paused = if self.scene.paused { " | PAUSED" } else { "" };
        let line = format!(
            "SW3D | FPS: {:.1} | {mode}{paused} | Arrows=Move/Turn M=Mode Space=Pause Q=Quit",
            self.fps
        );
        line.chars().take(self.renderer.width()).collect()
    }
}
