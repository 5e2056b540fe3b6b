/// Terminal host for the articulated arm: input, frame loop and ASCII output
use anyhow::Context;
use arm3d_core::{
    ArmCommand, ArmConfig, ArmModel, ArticulatedModelState, Camera, FrameReport, GeometrySet,
    SegmentRenderer,
};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind},
    execute, queue,
    style::{Color, Print, ResetColor, SetForegroundColor},
    terminal::{self, ClearType},
};
use log::{debug, info};
use std::io::{stdout, Write};
use std::time::Duration;

pub mod logging;
pub mod renderer;

pub use logging::{init_logging, LoggingConfig};
pub use renderer::AsciiRenderer;

/// Rows reserved for the status overlay
const OVERLAY_ROWS: u16 = 2;

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: u32 = 2;

/// What a key press asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Command(ArmCommand),
}

/// Map a key to its action: arrows drive arm1/arm2, A/D the palm, W/S the fingers
pub fn key_action(code: KeyCode) -> Option<KeyAction> {
    let command = match code {
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Some(KeyAction::Quit),
        KeyCode::Left => ArmCommand::Arm1Left,
        KeyCode::Right => ArmCommand::Arm1Right,
        KeyCode::Up => ArmCommand::Arm2Up,
        KeyCode::Down => ArmCommand::Arm2Down,
        KeyCode::Char('a') | KeyCode::Char('A') => ArmCommand::PalmLeft,
        KeyCode::Char('d') | KeyCode::Char('D') => ArmCommand::PalmRight,
        KeyCode::Char('w') | KeyCode::Char('W') => ArmCommand::FingerOpen,
        KeyCode::Char('s') | KeyCode::Char('S') => ArmCommand::FingerClose,
        _ => return None,
    };
    Some(KeyAction::Command(command))
}

/// Main application struct for terminal arm rendering
pub struct TerminalApp {
    config: ArmConfig,
    model: ArmModel,
    state: ArticulatedModelState,
    geometry: GeometrySet,
    camera: Camera,
    renderer: AsciiRenderer,
    running: bool,
    dirty: bool,
    resized: bool,
    last_report: FrameReport,
}

impl TerminalApp {
    pub fn new(config: ArmConfig) -> anyhow::Result<Self> {
        let (width, height) = terminal::size().context("failed to query terminal size")?;
        Ok(Self::with_size(config, width, height))
    }

    /// Build the app for a terminal of `width` x `height` cells
    pub fn with_size(config: ArmConfig, width: u16, height: u16) -> Self {
        let model = config.model();
        let geometry = GeometrySet::for_arm(model.kind, &model.dimensions);
        let (render_width, render_height) = render_area(width, height);

        let mut camera = config.camera.camera(render_width, render_height);
        camera.set_viewport(render_width, render_height * CELL_ASPECT);

        Self {
            state: config.initial_state(),
            config,
            model,
            geometry,
            camera,
            renderer: AsciiRenderer::new(render_width as usize, render_height as usize),
            running: true,
            dirty: true,
            resized: false,
            last_report: FrameReport::default(),
        }
    }

    pub fn state(&self) -> &ArticulatedModelState {
        &self.state
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Whether the next frame needs a re-walk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn last_report(&self) -> &FrameReport {
        &self.last_report
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(stdout(), terminal::EnterAlternateScreen, cursor::Hide)?;

        let result = self.main_loop();

        // Cleanup
        terminal::disable_raw_mode()?;
        execute!(stdout(), terminal::LeaveAlternateScreen, cursor::Show)?;

        result
    }

    fn main_loop(&mut self) -> anyhow::Result<()> {
        let frame_time = Duration::from_millis(1000 / 30); // 30 FPS cadence

        while self.running {
            // Drain every pending event before the next frame
            if event::poll(frame_time)? {
                self.handle_event(&event::read()?);
                while event::poll(Duration::ZERO)? {
                    self.handle_event(&event::read()?);
                }
            }

            if self.dirty {
                let mut stdout = stdout();
                self.render_to(&mut stdout)?;
                stdout.flush()?;
            }
        }

        Ok(())
    }

    /// Apply one input event to the app state
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
        match key_action(code) {
            Some(KeyAction::Quit) => {
                info!("quit requested");
                self.running = false;
            }
            Some(KeyAction::Command(command)) if self.model.kind.accepts(command) => {
                if self.state.apply(command, &self.config.policy) {
                    self.dirty = true;
                }
            }
            _ => {}
        }
    }

    fn resize(&mut self, width: u16, height: u16) {
        let (render_width, render_height) = render_area(width, height);
        debug!("resize to {}x{}", render_width, render_height);
        self.renderer
            .resize(render_width as usize, render_height as usize);
        self.camera
            .set_viewport(render_width, render_height * CELL_ASPECT);
        self.dirty = true;
        self.resized = true;
    }

    /// Walk and draw the whole arm, then write the frame to `out`
    pub fn render_to<W: Write>(&mut self, out: &mut W) -> anyhow::Result<()> {
        self.renderer.clear();

        let segment_renderer = SegmentRenderer::new(self.camera.view_projection(), &self.geometry);
        self.last_report = self
            .model
            .render(&self.state, &segment_renderer, &mut self.renderer)
            .context("frame aborted")?;
        self.dirty = false;

        if std::mem::take(&mut self.resized) {
            queue!(out, terminal::Clear(ClearType::All))?;
        }
        self.renderer.draw(out)?;
        self.draw_overlay(out)?;
        Ok(())
    }

    fn draw_overlay<W: Write>(&self, out: &mut W) -> std::io::Result<()> {
        let top = self.renderer.height() as u16;
        let state = &self.state;
        queue!(
            out,
            cursor::MoveTo(0, top),
            SetForegroundColor(Color::Yellow),
            Print(format!(
                "ARM3D | arm1 {:6.1}  arm2 {:6.1}  palm {:6.1}  finger {:5.1}",
                state.arm1, state.arm2, state.palm, state.finger
            )),
            cursor::MoveTo(0, top + 1),
            Print("Controls: Left/Right=arm1 Up/Down=arm2 A/D=palm W/S=fingers Q=Quit"),
            ResetColor
        )?;

        if !self.last_report.skipped.is_empty() {
            let names: Vec<_> = self.last_report.skipped.iter().map(|s| s.name()).collect();
            queue!(
                out,
                cursor::MoveTo(0, 0),
                SetForegroundColor(Color::Red),
                Print(format!("skipped: {}", names.join(", "))),
                ResetColor
            )?;
        }
        Ok(())
    }
}

/// Cells available to the rasterizer below which the overlay sits
fn render_area(width: u16, height: u16) -> (u32, u32) {
    let width = width.max(1) as u32;
    let height = height.saturating_sub(OVERLAY_ROWS).max(1) as u32;
    (width, height)
}
