//! Needle state and the per-frame gauge geometry.
//!
//! Angles are in degrees, measured in screen coordinates: 0 points right and
//! angles grow clockwise because y points down. With the default sweep of
//! 180 degrees starting at 180, the minimum value sits on the left, the
//! maximum on the right, and the needle stands upright at 270.

use log::debug;
use rand::Rng;

use crate::config::{Easing, MeterAttributes};

/// Distance below which the needle counts as having reached its target.
const SETTLE_EPSILON: f64 = 1e-3;

/// Far enough outside any canvas that clipping hides the difference.
pub const COORD_LIMIT: f64 = 1_000_000.0;

/// Labels drawn per frame at most.
pub const MAX_LABELS: usize = 200;
/// Ticks drawn per frame at most.
pub const MAX_TICKS: usize = 2_000;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Pixel position, pulled in to within `COORD_LIMIT` of the origin.
    pub fn rounded(self) -> (i32, i32) {
        let round = |v: f64| v.clamp(-COORD_LIMIT, COORD_LIMIT).round() as i32;
        (round(self.x), round(self.y))
    }
}

/// Project `length` units from `origin` along `angle_deg`.
pub fn project(origin: Point, angle_deg: f64, length: f64) -> Point {
    let angle = angle_deg.to_radians();
    Point::new(
        origin.x + angle.cos() * length,
        origin.y + angle.sin() * length,
    )
}

/// Angular range the value range is mapped onto
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sweep {
    pub start: f64,
    pub span: f64,
    pub min: f64,
    pub max: f64,
}

impl Sweep {
    pub fn from_attributes(attrs: &MeterAttributes) -> Self {
        Self {
            start: attrs.start_angle,
            span: attrs.sweep_angle,
            min: f64::from(attrs.min_value),
            max: f64::from(attrs.max_value),
        }
    }

    pub fn end(&self) -> f64 {
        self.start + self.span
    }

    pub fn midpoint(&self) -> f64 {
        self.start + self.span / 2.0
    }

    pub fn value_to_angle(&self, value: f64) -> f64 {
        let range = self.max - self.min;
        if range <= 0.0 {
            return self.start;
        }
        let t = ((value - self.min) / range).clamp(0.0, 1.0);
        self.start + self.span * t
    }

    pub fn angle_to_value(&self, angle: f64) -> f64 {
        let t = ((angle - self.start) / self.span).clamp(0.0, 1.0);
        self.min + t * (self.max - self.min)
    }

    pub fn clamp_angle(&self, angle: f64) -> f64 {
        angle.clamp(self.start, self.end())
    }
}

/// The single mutable entity behind the meter: where the needle is, where
/// it is heading, and how much it shakes.
#[derive(Debug, Clone)]
pub struct GaugeState {
    sweep: Sweep,
    easing: Easing,
    vibration_degrees: u32,
    value: f64,
    current_angle: f64,
    target_angle: f64,
    jitter: f64,
}

impl GaugeState {
    pub fn new(attrs: &MeterAttributes) -> Self {
        let sweep = Sweep::from_attributes(attrs);
        let value = attrs.current_value.clamp(sweep.min, sweep.max);
        Self {
            sweep,
            easing: attrs.easing,
            vibration_degrees: attrs.vibration_degrees,
            value,
            current_angle: sweep.midpoint(),
            target_angle: sweep.value_to_angle(value),
            jitter: 0.0,
        }
    }

    /// Retarget the needle. Values outside the range are clamped, NaN is ignored.
    pub fn set_value(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.value = value.clamp(self.sweep.min, self.sweep.max);
        self.target_angle = self.sweep.value_to_angle(self.value);
        debug!(
            "needle target set to {} ({:.1} degrees)",
            self.value, self.target_angle
        );
    }

    pub fn set_vibration(&mut self, degrees: u32) {
        self.vibration_degrees = degrees;
        if degrees == 0 {
            self.jitter = 0.0;
        }
    }

    /// Target value.
    pub fn value(&self) -> f64 {
        self.value
    }

    /// Value the needle currently points at, ignoring vibration.
    pub fn displayed_value(&self) -> f64 {
        self.sweep.angle_to_value(self.current_angle)
    }

    pub fn sweep(&self) -> &Sweep {
        &self.sweep
    }

    pub fn current_angle(&self) -> f64 {
        self.current_angle
    }

    pub fn target_angle(&self) -> f64 {
        self.target_angle
    }

    pub fn jitter(&self) -> f64 {
        self.jitter
    }

    /// Angle the needle is drawn at: eased angle plus jitter, kept on the dial.
    pub fn needle_angle(&self) -> f64 {
        self.sweep.clamp_angle(self.current_angle + self.jitter)
    }

    pub fn is_settled(&self) -> bool {
        (self.target_angle - self.current_angle).abs() < SETTLE_EPSILON
    }

    /// Move the needle one easing step toward its target. Never overshoots.
    pub fn step(&mut self) {
        let remaining = self.target_angle - self.current_angle;
        let delta = match self.easing {
            Easing::Step { degrees } => {
                if remaining.abs() <= degrees {
                    remaining
                } else {
                    degrees.copysign(remaining)
                }
            }
            Easing::Lerp { factor } => {
                if remaining.abs() < SETTLE_EPSILON {
                    remaining
                } else {
                    remaining * factor
                }
            }
        };
        self.current_angle = self.sweep.clamp_angle(self.current_angle + delta);
    }

    /// Pick a new jitter offset: a whole number of degrees below the
    /// vibration bound, turned either way.
    pub fn vibrate<R: Rng>(&mut self, rng: &mut R) -> f64 {
        let magnitude = if self.vibration_degrees == 0 {
            0.0
        } else {
            f64::from(rng.random_range(0..self.vibration_degrees))
        };
        self.jitter = if rng.random_bool(0.5) {
            magnitude
        } else {
            -magnitude
        };
        self.jitter
    }

    /// One timer period.
    pub fn tick<R: Rng>(&mut self, rng: &mut R) {
        self.step();
        self.vibrate(rng);
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickMark {
    pub start: Point,
    pub end: Point,
    pub major: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValueLabel {
    pub value: i32,
    pub text: String,
    pub position: Point,
}

/// Everything the renderer needs for one frame, in canvas coordinates
#[derive(Debug, Clone, PartialEq)]
pub struct GaugeLayout {
    pub origin: Point,
    pub needle_end: Point,
    pub ticks: Vec<TickMark>,
    pub labels: Vec<ValueLabel>,
}

impl GaugeLayout {
    /// The needle pivots on the bottom centre of a `width` x `height` area.
    pub fn compute(attrs: &MeterAttributes, state: &GaugeState, width: usize, height: usize) -> Self {
        let origin = Point::new(width as f64 / 2.0, height as f64);
        let needle_end = project(origin, state.needle_angle(), attrs.needle_length);
        let sweep = state.sweep();
        let values = major_values(attrs.min_value, attrs.max_value, attrs.interval);

        let labels = values
            .iter()
            .map(|&value| ValueLabel {
                value,
                text: value.to_string(),
                position: project(
                    origin,
                    sweep.value_to_angle(f64::from(value)),
                    attrs.values_radius,
                ),
            })
            .collect();

        Self {
            origin,
            needle_end,
            ticks: tick_marks(attrs, sweep, origin, &values),
            labels,
        }
    }
}

/// Values carrying a major tick and a label: `min`, `min + interval`, ... up to `max`.
pub fn major_values(min: i32, max: i32, interval: i32) -> Vec<i32> {
    (min..=max)
        .step_by(interval.max(1) as usize)
        .take(MAX_LABELS)
        .collect()
}

fn tick_marks(attrs: &MeterAttributes, sweep: &Sweep, origin: Point, values: &[i32]) -> Vec<TickMark> {
    let per_gap = (MAX_TICKS / values.len().max(1)).max(1) as u32;
    let subdivisions = attrs.interval_subdivisions.clamp(1, per_gap);
    let mut ticks = Vec::with_capacity(values.len() * subdivisions as usize);
    for (i, &value) in values.iter().enumerate() {
        ticks.push(tick_mark(attrs, origin, sweep.value_to_angle(f64::from(value)), true));
        if let Some(&next) = values.get(i + 1) {
            for j in 1..subdivisions {
                let minor = f64::from(value)
                    + (f64::from(next) - f64::from(value)) * f64::from(j) / f64::from(subdivisions);
                ticks.push(tick_mark(attrs, origin, sweep.value_to_angle(minor), false));
            }
        }
    }
    ticks
}

fn tick_mark(attrs: &MeterAttributes, origin: Point, angle: f64, major: bool) -> TickMark {
    let start = project(
        origin,
        angle,
        attrs.needle_length * attrs.ticks_distance_factor,
    );
    let length_factor = if major {
        attrs.major_tick_length_factor
    } else {
        attrs.minor_tick_length_factor
    };
    TickMark {
        start,
        end: project(start, angle, attrs.needle_length * length_factor),
        major,
    }
}
