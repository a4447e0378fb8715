// ============================================================================
// CRATE CONFIGURATION & IMPORTS
// ============================================================================

pub mod config;
pub mod error;
pub mod gauge;
mod render;
pub mod slider;
pub mod timer;

pub use config::{Color, Easing, MeterAttributes};
pub use error::{Error, Result};
pub use gauge::{GaugeLayout, GaugeState, Point, Sweep};
pub use slider::{Slider, Track};

// External crate imports
use log::{debug, error, info, warn};
use pixels::{Pixels, SurfaceTexture};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rusttype::Font;

// Standard library imports
use std::sync::mpsc::Receiver;
use std::time::{Duration, Instant};

// Window management imports
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, KeyEvent, MouseButton, WindowEvent};
use winit::event_loop::{ControlFlow, EventLoop};
use winit::keyboard::{Key, NamedKey};
use winit::window::WindowBuilder;

use render::{Canvas, Scene};
use timer::FixedRate;

/// Font used for the value labels unless [`Meter::with_font`] replaces it.
pub const DEFAULT_FONT: &[u8] = include_bytes!("DejaVuSans.ttf");

// ============================================================================
// PUBLIC API - MAIN INTERFACE
// ============================================================================

/// Command enum for updating a meter from another thread
#[derive(Debug, Clone, PartialEq)]
pub enum MeterCommand {
    SetValue(f64),
    SetVibration(u32),
}

/// The analog meter widget: styled attributes, needle state and the font
/// its labels are set in.
pub struct Meter {
    attributes: MeterAttributes,
    state: GaugeState,
    font: Font<'static>,
    slider: Option<Slider>,
    rng: StdRng,
}

impl Meter {
    pub fn new(attributes: MeterAttributes) -> Result<Self> {
        let attributes = attributes.sanitized();
        let font = Font::try_from_bytes(DEFAULT_FONT)
            .ok_or_else(|| Error::Font("embedded font is not a valid TrueType font".to_string()))?;
        let state = GaugeState::new(&attributes);
        Ok(Self {
            attributes,
            state,
            font,
            slider: None,
            rng: StdRng::from_rng(&mut rand::rng()),
        })
    }

    /// Replace the label font with TrueType/OpenType data.
    pub fn with_font(mut self, data: Vec<u8>) -> Result<Self> {
        self.font = Font::try_from_vec(data)
            .ok_or_else(|| Error::Font("font data could not be parsed".to_string()))?;
        Ok(self)
    }

    /// Attach a slider strip under the gauge that sets the needle value.
    pub fn with_slider(mut self) -> Self {
        let value = self.state.value().round() as i32;
        self.slider = Some(Slider::new(
            self.attributes.min_value,
            self.attributes.max_value,
            value,
        ));
        self
    }

    /// Make the vibration reproducible.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn attributes(&self) -> &MeterAttributes {
        &self.attributes
    }

    pub fn state(&self) -> &GaugeState {
        &self.state
    }

    pub fn slider(&self) -> Option<&Slider> {
        self.slider.as_ref()
    }

    pub fn value(&self) -> f64 {
        self.state.value()
    }

    /// Retarget the needle; an attached slider follows the clamped value.
    pub fn set_value(&mut self, value: f64) {
        self.state.set_value(value);
        if let Some(slider) = self.slider.as_mut() {
            slider.set(self.state.value().round() as i32);
        }
    }

    pub fn apply(&mut self, command: MeterCommand) {
        debug!("applying {command:?}");
        match command {
            MeterCommand::SetValue(value) => self.set_value(value),
            MeterCommand::SetVibration(degrees) => self.state.set_vibration(degrees),
        }
    }

    /// Advance one timer period: ease toward the target, then vibrate.
    pub fn tick(&mut self) {
        self.state.tick(&mut self.rng);
    }

    /// Frame size the window opens with.
    pub fn frame_size(&self) -> (usize, usize) {
        let slider_height = if self.slider.is_some() {
            self.attributes.slider_height
        } else {
            0
        };
        (
            self.attributes.window_width,
            self.attributes.window_height + slider_height,
        )
    }

    /// Draw the current state into an RGBA8 frame of `width` x `height` pixels.
    pub fn render(&self, frame: &mut [u8], width: usize, height: usize) {
        let slider_height = match self.slider {
            Some(_) => self.attributes.slider_height.min(height),
            None => 0,
        };
        let gauge_height = height - slider_height;

        let mut scene = Scene::new();
        let layout = GaugeLayout::compute(&self.attributes, &self.state, width, gauge_height);
        render::add_meter(&mut scene, &layout, &self.attributes, width);
        if let Some(ref slider) = self.slider {
            let track = Track::new(width, height, slider_height);
            slider.add_to_scene(&mut scene, &track, &self.attributes);
        }

        let mut canvas = Canvas::new(frame, width, height);
        scene.render(&mut canvas, &self.font);
    }

    /// Open a window and animate the meter until it is closed.
    pub fn show(&mut self) -> Result<()> {
        self.run_window(None)
    }

    /// Like [`Meter::show`], applying commands received between frames.
    pub fn show_with_commands(&mut self, receiver: Receiver<MeterCommand>) -> Result<()> {
        self.run_window(Some(receiver))
    }

    fn run_window(&mut self, receiver: Option<Receiver<MeterCommand>>) -> Result<()> {
        let (logical_width, logical_height) = self.frame_size();

        let event_loop = EventLoop::new()?;
        let window = WindowBuilder::new()
            .with_title(&self.attributes.title)
            .with_inner_size(LogicalSize::new(
                logical_width as f64,
                logical_height as f64,
            ))
            .with_resizable(false)
            .build(&event_loop)?;

        let window = std::sync::Arc::new(window);
        let window_clone = window.clone();
        let size = window.inner_size();
        let mut fb_width = size.width as usize;
        let mut fb_height = size.height as usize;
        let surface_texture = SurfaceTexture::new(size.width, size.height, &window);
        let mut pixels = Pixels::new(size.width, size.height, surface_texture)?;

        let mut timer = FixedRate::new(
            Duration::from_millis(self.attributes.update_rate_ms),
            Instant::now(),
        );
        let mut cursor = (0.0, 0.0);
        info!(
            "meter window opened: {}x{} px, repaint every {:?}",
            fb_width,
            fb_height,
            timer.period()
        );

        event_loop.run(move |event, window_target| {
            window_target.set_control_flow(ControlFlow::WaitUntil(timer.next_deadline()));
            match event {
                Event::WindowEvent { event, .. } => match event {
                    WindowEvent::CloseRequested => {
                        info!("meter window closed");
                        window_target.exit();
                    }
                    WindowEvent::Resized(new_size) => {
                        fb_width = new_size.width as usize;
                        fb_height = new_size.height as usize;
                        if let Err(err) = pixels.resize_buffer(new_size.width, new_size.height) {
                            warn!("failed to resize frame buffer: {err}");
                        }
                        if let Err(err) = pixels.resize_surface(new_size.width, new_size.height) {
                            warn!("failed to resize surface: {err}");
                        }
                    }
                    WindowEvent::CursorMoved { position, .. } => {
                        cursor = (position.x, position.y);
                        let track = self.track(fb_width, fb_height);
                        if let Some(value) = self.slider.as_mut().and_then(|s| s.drag(cursor.0, &track)) {
                            self.set_value(f64::from(value));
                        }
                    }
                    WindowEvent::MouseInput {
                        state,
                        button: MouseButton::Left,
                        ..
                    } => {
                        let track = self.track(fb_width, fb_height);
                        let changed = match (state, self.slider.as_mut()) {
                            (ElementState::Pressed, Some(slider)) => {
                                slider.press(cursor.0, cursor.1, &track)
                            }
                            (ElementState::Released, Some(slider)) => {
                                slider.release();
                                None
                            }
                            (_, None) => None,
                        };
                        if let Some(value) = changed {
                            self.set_value(f64::from(value));
                        }
                    }
                    WindowEvent::KeyboardInput {
                        event:
                            KeyEvent {
                                logical_key: Key::Named(key),
                                state: ElementState::Pressed,
                                ..
                            },
                        ..
                    } => {
                        let delta = match key {
                            NamedKey::ArrowLeft | NamedKey::ArrowDown => -1,
                            NamedKey::ArrowRight | NamedKey::ArrowUp => 1,
                            _ => 0,
                        };
                        if delta != 0 {
                            self.nudge(delta);
                        }
                    }
                    WindowEvent::RedrawRequested => {
                        if let Some(ref receiver) = receiver {
                            while let Ok(command) = receiver.try_recv() {
                                self.apply(command);
                            }
                        }
                        for _ in 0..timer.due(Instant::now()) {
                            self.tick();
                        }

                        self.render(pixels.frame_mut(), fb_width, fb_height);
                        if let Err(err) = pixels.render() {
                            error!("failed to present frame: {err}");
                            window_target.exit();
                        }
                    }
                    _ => {}
                },
                Event::AboutToWait => {
                    if Instant::now() >= timer.next_deadline() {
                        window_clone.request_redraw();
                    }
                }
                _ => {}
            }
        })?;

        Ok(())
    }

    fn track(&self, width: usize, height: usize) -> Track {
        Track::new(width, height, self.attributes.slider_height.min(height))
    }

    /// Keyboard step: moves the slider when there is one, the value otherwise.
    fn nudge(&mut self, delta: i32) {
        match self.slider.as_mut() {
            Some(slider) => {
                if let Some(value) = slider.step(delta) {
                    self.set_value(f64::from(value));
                }
            }
            None => self.set_value(self.state.value() + f64::from(delta)),
        }
    }
}
