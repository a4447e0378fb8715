//! Seek-bar style slider shown under the meter on the host screen.
//!
//! The slider owns an integer progress in `[min, max]` and reports a new
//! value only when the progress actually changes.

use crate::config::{Color, MeterAttributes};
use crate::render::{DrawCommand, Scene};

const THUMB_RADIUS: i32 = 14;
const TRACK_THICKNESS: f32 = 6.0;

/// Where the track lies on the canvas
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Track {
    pub x0: f64,
    pub x1: f64,
    pub y: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Track {
    /// Track centred in a strip of `strip_height` pixels at the bottom of the canvas.
    pub fn new(width: usize, height: usize, strip_height: usize) -> Self {
        let margin = (strip_height as f64 / 2.0).max(f64::from(THUMB_RADIUS) * 2.0);
        let top = height.saturating_sub(strip_height) as f64;
        let x1 = (width as f64 - margin).max(margin);
        Self {
            x0: margin,
            x1,
            y: top + strip_height as f64 / 2.0,
            top,
            bottom: height as f64,
        }
    }

    fn contains(&self, x: f64, y: f64) -> bool {
        let reach = f64::from(THUMB_RADIUS);
        (self.top..=self.bottom).contains(&y) && (self.x0 - reach..=self.x1 + reach).contains(&x)
    }
}

#[derive(Debug, Clone)]
pub struct Slider {
    min: i32,
    max: i32,
    value: i32,
    dragging: bool,
}

impl Slider {
    pub fn new(min: i32, max: i32, value: i32) -> Self {
        let (min, max) = (min.min(max), min.max(max));
        Self {
            min,
            max,
            value: value.clamp(min, max),
            dragging: false,
        }
    }

    pub fn value(&self) -> i32 {
        self.value
    }

    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    pub fn value_at(&self, x: f64, track: &Track) -> i32 {
        let span = track.x1 - track.x0;
        let t = if span > 0.0 {
            ((x - track.x0) / span).clamp(0.0, 1.0)
        } else {
            0.0
        };
        (f64::from(self.min) + t * (f64::from(self.max) - f64::from(self.min))).round() as i32
    }

    /// Start a drag when the press lands on the slider strip.
    pub fn press(&mut self, x: f64, y: f64, track: &Track) -> Option<i32> {
        if !track.contains(x, y) {
            return None;
        }
        self.dragging = true;
        self.update(self.value_at(x, track))
    }

    pub fn drag(&mut self, x: f64, track: &Track) -> Option<i32> {
        if !self.dragging {
            return None;
        }
        self.update(self.value_at(x, track))
    }

    pub fn release(&mut self) {
        self.dragging = false;
    }

    /// Move the thumb without reporting a change, for values set elsewhere.
    pub fn set(&mut self, value: i32) {
        self.value = value.clamp(self.min, self.max);
    }

    pub fn step(&mut self, delta: i32) -> Option<i32> {
        self.update(self.value.saturating_add(delta))
    }

    fn update(&mut self, value: i32) -> Option<i32> {
        let value = value.clamp(self.min, self.max);
        if value == self.value {
            return None;
        }
        self.value = value;
        Some(value)
    }

    fn thumb_x(&self, track: &Track) -> f64 {
        let range = f64::from(self.max) - f64::from(self.min);
        let t = if range > 0.0 {
            (f64::from(self.value) - f64::from(self.min)) / range
        } else {
            0.0
        };
        track.x0 + t * (track.x1 - track.x0)
    }

    pub(crate) fn add_to_scene(&self, scene: &mut Scene, track: &Track, attrs: &MeterAttributes) {
        let y = track.y.round() as i32;
        let (x0, x1) = (track.x0.round() as i32, track.x1.round() as i32);
        let thumb = self.thumb_x(track).round() as i32;
        let fill = attrs.needle_color.as_tuple();
        scene.add_command(DrawCommand::Line {
            x0,
            y0: y,
            x1,
            y1: y,
            thickness: TRACK_THICKNESS,
            tapered: false,
            color: Color::LIGHT_GRAY.as_tuple(),
        });
        scene.add_command(DrawCommand::Line {
            x0,
            y0: y,
            x1: thumb,
            y1: y,
            thickness: TRACK_THICKNESS,
            tapered: false,
            color: fill,
        });
        scene.add_command(DrawCommand::Circle {
            cx: thumb,
            cy: y,
            radius: THUMB_RADIUS,
            color: fill,
        });
    }
}
