use std::path::Path;
use std::str::FromStr;

use bon::Builder;
use log::warn;
use serde::Deserialize;

use crate::error::{Error, Result};
use crate::gauge::{MAX_LABELS, MAX_TICKS};

/// Color representation for meter elements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(try_from = "String")]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00);
    pub const WHITE: Self = Self::new(0xff, 0xff, 0xff);
    pub const LIGHT_GRAY: Self = Self::new(0xcc, 0xcc, 0xcc);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub const fn as_tuple(self) -> (u8, u8, u8) {
        (self.r, self.g, self.b)
    }

    fn named(name: &str) -> Option<Self> {
        let color = match name {
            "black" => Self::BLACK,
            "white" => Self::WHITE,
            "red" => Self::new(0xff, 0x00, 0x00),
            "green" => Self::new(0x00, 0xff, 0x00),
            "blue" => Self::new(0x00, 0x00, 0xff),
            "yellow" => Self::new(0xff, 0xff, 0x00),
            "cyan" => Self::new(0x00, 0xff, 0xff),
            "magenta" => Self::new(0xff, 0x00, 0xff),
            "gray" | "grey" => Self::new(0x88, 0x88, 0x88),
            "lightgray" | "lightgrey" => Self::LIGHT_GRAY,
            "darkgray" | "darkgrey" => Self::new(0x44, 0x44, 0x44),
            _ => return None,
        };
        Some(color)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Accepts `#RRGGBB`, `#AARRGGBB` (alpha dropped) or a color name.
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let Some(hex) = trimmed.strip_prefix('#') else {
            return Self::named(&trimmed.to_ascii_lowercase())
                .ok_or_else(|| Error::InvalidColor(s.to_string()));
        };
        let rgb = match hex.len() {
            6 => Some(hex),
            8 => hex.get(2..),
            _ => None,
        }
        .ok_or_else(|| Error::InvalidColor(s.to_string()))?;
        let channel = |i: usize| {
            rgb.get(i..i + 2)
                .and_then(|c| u8::from_str_radix(c, 16).ok())
                .ok_or_else(|| Error::InvalidColor(s.to_string()))
        };
        Ok(Self::new(channel(0)?, channel(2)?, channel(4)?))
    }
}

impl TryFrom<String> for Color {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// How the needle approaches its target angle on every tick
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Easing {
    /// Fixed angular step per tick, in degrees.
    Step { degrees: f64 },
    /// Fraction of the remaining distance covered per tick.
    Lerp { factor: f64 },
}

impl Default for Easing {
    fn default() -> Self {
        Easing::Step {
            degrees: DEFAULT_STEP_DEGREES,
        }
    }
}

const DEFAULT_STEP_DEGREES: f64 = 4.0;
const DEFAULT_LERP_FACTOR: f64 = 0.1;
const DEFAULT_SWEEP: f64 = 180.0;
const DEFAULT_UPDATE_RATE_MS: u64 = 5;
const DEFAULT_NEEDLE_LENGTH: f64 = 100.0;

/// Longest update period; slower meters would look frozen.
pub const MAX_UPDATE_RATE_MS: u64 = 60_000;
/// Largest radius or length, in pixels, of any drawn element.
pub const MAX_EXTENT: f64 = 100_000.0;
/// Widest stroke and largest label size, in pixels.
pub const MAX_STROKE: f64 = 1_000.0;
/// Largest window side, in pixels.
pub const MAX_WINDOW_SIDE: usize = 16_384;

/// Styled attributes of the meter.
///
/// Every attribute has a default, so both the builder and an attribute file
/// may name only the ones they care about.
#[derive(Debug, Clone, PartialEq, Builder, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MeterAttributes {
    #[builder(default = "Analog Meter".to_string())]
    pub title: String,

    // Window configuration
    #[builder(default = 1000)]
    pub window_width: usize,
    #[builder(default = 600)]
    pub window_height: usize,
    #[builder(default = 96)]
    pub slider_height: usize,
    #[builder(default = DEFAULT_UPDATE_RATE_MS)]
    pub update_rate_ms: u64,

    // Value range
    #[builder(default = 0)]
    pub min_value: i32,
    #[builder(default = 9)]
    pub max_value: i32,
    #[builder(default = 0.0)]
    pub current_value: f64,

    // Sweep, in degrees with y pointing down
    #[builder(default = 180.0)]
    pub start_angle: f64,
    #[builder(default = DEFAULT_SWEEP)]
    pub sweep_angle: f64,

    // Needle configuration
    #[builder(default = Color::BLACK)]
    pub needle_color: Color,
    #[builder(default = 1.0)]
    pub needle_thickness: f32,
    #[builder(default = DEFAULT_NEEDLE_LENGTH)]
    pub needle_length: f64,
    #[builder(default = false)]
    pub needle_tapered: bool,
    #[builder(default = 30)]
    pub hub_radius: i32,
    #[builder(default)]
    pub easing: Easing,
    #[builder(default = 2)]
    pub vibration_degrees: u32,

    // Tick configuration
    #[builder(default = 1)]
    pub interval: i32,
    #[builder(default = 2)]
    pub interval_subdivisions: u32,
    #[builder(default = Color::BLACK)]
    pub intervals_color: Color,
    #[builder(default = 0.7)]
    pub ticks_distance_factor: f64,
    #[builder(default = 0.2)]
    pub major_tick_length_factor: f64,
    #[builder(default = 0.25)]
    pub minor_tick_length_factor: f64,
    #[builder(default = 10.0)]
    pub major_tick_thickness: f32,
    #[builder(default = 5.0)]
    pub minor_tick_thickness: f32,

    // Value labels
    #[builder(default = Color::BLACK)]
    pub values_color: Color,
    #[builder(default = 400.0)]
    pub values_radius: f64,
    #[builder(default = 64.0)]
    pub values_text_size: f32,

    // Reflection band
    #[builder(default = false)]
    pub reflection: bool,
    #[builder(default = Color::LIGHT_GRAY)]
    pub reflection_color: Color,
    #[builder(default = 32)]
    pub reflection_alpha: u8,
    #[builder(default = 200)]
    pub reflection_half_height: i32,

    // Colors
    #[builder(default = Color::WHITE)]
    pub background_color: Color,
}

impl Default for MeterAttributes {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl MeterAttributes {
    /// Parse an attribute file's contents. Missing attributes keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Replace values the meter cannot draw with workable fallbacks.
    pub fn sanitized(mut self) -> Self {
        if self.max_value < self.min_value {
            warn!(
                "max_value {} is below min_value {}, swapping",
                self.max_value, self.min_value
            );
            std::mem::swap(&mut self.min_value, &mut self.max_value);
        } else if self.max_value == self.min_value {
            warn!("empty value range at {}, widening by one", self.min_value);
            self.max_value = self.min_value.saturating_add(1);
        }
        if self.interval <= 0 {
            warn!("interval {} must be positive, using 1", self.interval);
            self.interval = 1;
        }
        if self.interval_subdivisions == 0 {
            warn!("interval_subdivisions must be at least 1, using 1");
            self.interval_subdivisions = 1;
        }
        if !self.sweep_angle.is_finite() || self.sweep_angle <= 0.0 {
            warn!(
                "sweep_angle {} must be positive, using {DEFAULT_SWEEP}",
                self.sweep_angle
            );
            self.sweep_angle = DEFAULT_SWEEP;
        }
        if !self.start_angle.is_finite() {
            warn!("start_angle is not finite, using 180");
            self.start_angle = 180.0;
        }
        if self.update_rate_ms == 0 {
            warn!("update_rate_ms must be positive, using {DEFAULT_UPDATE_RATE_MS}");
            self.update_rate_ms = DEFAULT_UPDATE_RATE_MS;
        } else if self.update_rate_ms > MAX_UPDATE_RATE_MS {
            warn!(
                "update_rate_ms {} is too slow, using {MAX_UPDATE_RATE_MS}",
                self.update_rate_ms
            );
            self.update_rate_ms = MAX_UPDATE_RATE_MS;
        }
        self.limit_tick_count();

        self.needle_length = capped(
            "needle_length",
            self.needle_length,
            DEFAULT_NEEDLE_LENGTH,
            MAX_EXTENT,
        );
        self.values_radius = capped("values_radius", self.values_radius, 400.0, MAX_EXTENT);
        self.hub_radius = capped_int("hub_radius", self.hub_radius, MAX_EXTENT as i32);
        self.reflection_half_height = capped_int(
            "reflection_half_height",
            self.reflection_half_height,
            MAX_EXTENT as i32,
        );
        self.needle_thickness =
            capped("needle_thickness", f64::from(self.needle_thickness), 1.0, MAX_STROKE) as f32;
        self.major_tick_thickness = capped(
            "major_tick_thickness",
            f64::from(self.major_tick_thickness),
            10.0,
            MAX_STROKE,
        ) as f32;
        self.minor_tick_thickness = capped(
            "minor_tick_thickness",
            f64::from(self.minor_tick_thickness),
            5.0,
            MAX_STROKE,
        ) as f32;
        self.values_text_size =
            capped("values_text_size", f64::from(self.values_text_size), 64.0, MAX_STROKE) as f32;
        for (name, side) in [
            ("window_width", &mut self.window_width),
            ("window_height", &mut self.window_height),
            ("slider_height", &mut self.slider_height),
        ] {
            if *side > MAX_WINDOW_SIDE {
                warn!("{name} {side} exceeds {MAX_WINDOW_SIDE}, using {MAX_WINDOW_SIDE}");
                *side = MAX_WINDOW_SIDE;
            }
        }
        self.easing = match self.easing {
            Easing::Step { degrees } if !(degrees.is_finite() && degrees > 0.0) => {
                warn!("easing step {degrees} must be positive, using {DEFAULT_STEP_DEGREES}");
                Easing::Step {
                    degrees: DEFAULT_STEP_DEGREES,
                }
            }
            Easing::Lerp { factor } if !(factor > 0.0 && factor <= 1.0) => {
                warn!("easing factor {factor} must lie in (0, 1], using {DEFAULT_LERP_FACTOR}");
                Easing::Lerp {
                    factor: DEFAULT_LERP_FACTOR,
                }
            }
            easing => easing,
        };
        let (min, max) = (f64::from(self.min_value), f64::from(self.max_value));
        if self.current_value.is_nan() {
            self.current_value = min;
        }
        self.current_value = self.current_value.clamp(min, max);
        self
    }

    /// Raise `interval`, then lower `interval_subdivisions`, until one frame
    /// holds at most `MAX_LABELS` labels and `MAX_TICKS` ticks.
    fn limit_tick_count(&mut self) {
        let span = i64::from(self.max_value) - i64::from(self.min_value);
        let max_labels = MAX_LABELS as i64;
        if span / i64::from(self.interval) + 1 > max_labels {
            let interval = (span + max_labels - 2) / (max_labels - 1);
            warn!(
                "interval {} gives more than {MAX_LABELS} labels, using {interval}",
                self.interval
            );
            // span < 2^32, so span / 199 fits
            self.interval = interval as i32;
        }
        let labels = (span / i64::from(self.interval) + 1) as u64;
        let max_subdivisions = (MAX_TICKS as u64 / labels).max(1);
        if u64::from(self.interval_subdivisions) > max_subdivisions {
            warn!(
                "interval_subdivisions {} gives more than {MAX_TICKS} ticks, using {max_subdivisions}",
                self.interval_subdivisions
            );
            self.interval_subdivisions = max_subdivisions as u32;
        }
    }
}

fn capped(name: &str, value: f64, default: f64, max: f64) -> f64 {
    if !value.is_finite() || value < 0.0 {
        warn!("{name} {value} is invalid, using {default}");
        default
    } else if value > max {
        warn!("{name} {value} exceeds {max}, using {max}");
        max
    } else {
        value
    }
}

fn capped_int(name: &str, value: i32, max: i32) -> i32 {
    let capped = value.clamp(0, max);
    if capped != value {
        warn!("{name} {value} is out of range, using {capped}");
    }
    capped
}
