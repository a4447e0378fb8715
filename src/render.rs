// ============================================================================
// RETAINED MODE SCENE & DRAWING PRIMITIVES
// ============================================================================

use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::config::MeterAttributes;
use crate::gauge::GaugeLayout;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum DrawCommand {
    Clear((u8, u8, u8)),
    Line {
        x0: i32,
        y0: i32,
        x1: i32,
        y1: i32,
        thickness: f32,
        tapered: bool,
        color: (u8, u8, u8),
    },
    Circle {
        cx: i32,
        cy: i32,
        radius: i32,
        color: (u8, u8, u8),
    },
    Ellipse {
        cx: i32,
        cy: i32,
        rx: i32,
        ry: i32,
        alpha: f32,
        color: (u8, u8, u8),
    },
    Text {
        x: i32,
        y: i32,
        text: String,
        font_size: f32,
        color: (u8, u8, u8),
    },
}

pub(crate) struct Scene {
    commands: Vec<DrawCommand>,
}

impl Scene {
    pub(crate) fn new() -> Self {
        Self {
            commands: Vec::new(),
        }
    }

    pub(crate) fn add_command(&mut self, command: DrawCommand) {
        self.commands.push(command);
    }

    #[cfg(test)]
    pub(crate) fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub(crate) fn render(&self, canvas: &mut Canvas, font: &Font) {
        for command in &self.commands {
            match command {
                DrawCommand::Clear(color) => {
                    canvas.clear(*color);
                }
                DrawCommand::Line {
                    x0,
                    y0,
                    x1,
                    y1,
                    thickness,
                    tapered,
                    color,
                } => {
                    if *tapered {
                        draw_thick_line_tapered_aa(canvas, *x0, *y0, *x1, *y1, *thickness, *color);
                    } else {
                        draw_thick_line_aa(canvas, *x0, *y0, *x1, *y1, *thickness, *color);
                    }
                }
                DrawCommand::Circle {
                    cx,
                    cy,
                    radius,
                    color,
                } => {
                    draw_circle(canvas, *cx, *cy, *radius, *color);
                }
                DrawCommand::Ellipse {
                    cx,
                    cy,
                    rx,
                    ry,
                    alpha,
                    color,
                } => {
                    draw_ellipse(canvas, *cx, *cy, *rx, *ry, *alpha, *color);
                }
                DrawCommand::Text {
                    x,
                    y,
                    text,
                    font_size,
                    color,
                } => {
                    draw_text(canvas, *x, *y, text, font, Scale::uniform(*font_size), *color);
                }
            }
        }
    }
}

// ============================================================================
// CORE DATA TYPES
// ============================================================================

/// RGBA8 frame buffer view
pub(crate) struct Canvas<'a> {
    frame: &'a mut [u8],
    width: usize,
    height: usize,
}

impl<'a> Canvas<'a> {
    pub(crate) fn new(frame: &'a mut [u8], width: usize, height: usize) -> Self {
        // Never index past the buffer, whatever size the caller claims.
        let height = if width == 0 {
            0
        } else {
            height.min(frame.len() / (width * 4))
        };
        Self {
            frame,
            width,
            height,
        }
    }

    fn clear(&mut self, color: (u8, u8, u8)) {
        for chunk in self.frame.chunks_exact_mut(4) {
            chunk.copy_from_slice(&[color.0, color.1, color.2, 0xff]);
        }
    }

    fn set_pixel(&mut self, x: i32, y: i32, color: (u8, u8, u8), alpha: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let idx = (y as usize * self.width + x as usize) * 4;
        let a = alpha.clamp(0.0, 1.0);
        let src = [color.0 as f32, color.1 as f32, color.2 as f32];
        let dst = [
            self.frame[idx] as f32,
            self.frame[idx + 1] as f32,
            self.frame[idx + 2] as f32,
        ];
        let out = [
            (src[0] * a + dst[0] * (1.0 - a)).round() as u8,
            (src[1] * a + dst[1] * (1.0 - a)).round() as u8,
            (src[2] * a + dst[2] * (1.0 - a)).round() as u8,
            0xff,
        ];
        self.frame[idx..idx + 4].copy_from_slice(&out);
    }
}

// ============================================================================
// METER SCENE
// ============================================================================

/// Background, reflection, needle, hub, ticks, then labels.
pub(crate) fn add_meter(scene: &mut Scene, layout: &GaugeLayout, attrs: &MeterAttributes, width: usize) {
    scene.add_command(DrawCommand::Clear(attrs.background_color.as_tuple()));

    let (ox, oy) = layout.origin.rounded();
    if attrs.reflection {
        scene.add_command(DrawCommand::Ellipse {
            cx: ox,
            cy: oy,
            rx: i32::try_from(width / 2).unwrap_or(i32::MAX),
            ry: attrs.reflection_half_height,
            alpha: f32::from(attrs.reflection_alpha) / 255.0,
            color: attrs.reflection_color.as_tuple(),
        });
    }

    let needle_color = attrs.needle_color.as_tuple();
    let (nx, ny) = layout.needle_end.rounded();
    scene.add_command(DrawCommand::Line {
        x0: ox,
        y0: oy,
        x1: nx,
        y1: ny,
        thickness: attrs.needle_thickness,
        tapered: attrs.needle_tapered,
        color: needle_color,
    });
    scene.add_command(DrawCommand::Circle {
        cx: ox,
        cy: oy,
        radius: attrs.hub_radius,
        color: needle_color,
    });

    for tick in &layout.ticks {
        let (x0, y0) = tick.start.rounded();
        let (x1, y1) = tick.end.rounded();
        scene.add_command(DrawCommand::Line {
            x0,
            y0,
            x1,
            y1,
            thickness: if tick.major {
                attrs.major_tick_thickness
            } else {
                attrs.minor_tick_thickness
            },
            tapered: false,
            color: attrs.intervals_color.as_tuple(),
        });
    }

    for label in &layout.labels {
        let (x, y) = label.position.rounded();
        scene.add_command(DrawCommand::Text {
            x,
            y,
            text: label.text.clone(),
            font_size: attrs.values_text_size,
            color: attrs.values_color.as_tuple(),
        });
    }
}

// ============================================================================
// DRAWING PRIMITIVES
// ============================================================================

fn draw_thick_line_aa(
    canvas: &mut Canvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: f32,
    color: (u8, u8, u8),
) {
    draw_line_with_profile(canvas, x0, y0, x1, y1, thickness, color, |_| 1.0);
}

fn draw_thick_line_tapered_aa(
    canvas: &mut Canvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: f32,
    color: (u8, u8, u8),
) {
    // Keep 5% at the tip so the needle does not vanish.
    draw_line_with_profile(canvas, x0, y0, x1, y1, thickness, color, |t| 1.0 - t * 0.95);
}

/// Distance-field line: `profile(t)` scales the width along the segment.
fn draw_line_with_profile(
    canvas: &mut Canvas,
    x0: i32,
    y0: i32,
    x1: i32,
    y1: i32,
    thickness: f32,
    color: (u8, u8, u8),
    profile: impl Fn(f32) -> f32,
) {
    let pad = (thickness.ceil() as i32).saturating_add(1);
    let (min_x, max_x) = (x0.min(x1).saturating_sub(pad), x0.max(x1).saturating_add(pad));
    let (min_y, max_y) = (y0.min(y1).saturating_sub(pad), y0.max(y1).saturating_add(pad));
    let dx = x1 as f32 - x0 as f32;
    let dy = y1 as f32 - y0 as f32;
    let len_sq = dx * dx + dy * dy;
    for y in min_y.max(0)..=max_y.min(canvas.height as i32 - 1) {
        for x in min_x.max(0)..=max_x.min(canvas.width as i32 - 1) {
            let px = x as f32 - x0 as f32;
            let py = y as f32 - y0 as f32;
            let t = if len_sq > 0.0 {
                ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let lx = x0 as f32 + t * dx;
            let ly = y0 as f32 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let local_thickness = thickness * profile(t);
            let aa = (1.0 - (dist - local_thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                canvas.set_pixel(x, y, color, aa);
            }
        }
    }
}

fn draw_circle(canvas: &mut Canvas, cx: i32, cy: i32, radius: i32, color: (u8, u8, u8)) {
    draw_ellipse(canvas, cx, cy, radius, radius, 1.0, color);
}

fn draw_ellipse(
    canvas: &mut Canvas,
    cx: i32,
    cy: i32,
    rx: i32,
    ry: i32,
    alpha: f32,
    color: (u8, u8, u8),
) {
    if rx <= 0 || ry <= 0 {
        return;
    }
    let (rxf, ryf) = (rx as f64, ry as f64);
    let min_y = cy.saturating_sub(ry).saturating_sub(1).max(0);
    let max_y = cy.saturating_add(ry).saturating_add(1);
    let min_x = cx.saturating_sub(rx).saturating_sub(1).max(0);
    let max_x = cx.saturating_add(rx).saturating_add(1);
    for y in min_y..=max_y.min(canvas.height as i32 - 1) {
        for x in min_x..=max_x.min(canvas.width as i32 - 1) {
            let nx = (f64::from(x) - f64::from(cx)) / rxf;
            let ny = (f64::from(y) - f64::from(cy)) / ryf;
            // Approximate distance to the rim in pixels along the minor axis.
            let dist = ((nx * nx + ny * ny).sqrt() - 1.0) * rxf.min(ryf);
            let aa = if dist > 0.0 { 1.0 - dist.min(1.0) } else { 1.0 };
            if aa > 0.0 {
                canvas.set_pixel(x, y, color, alpha * aa as f32);
            }
        }
    }
}

/// Draw `text` centred on (x, y).
fn draw_text(
    canvas: &mut Canvas,
    x: i32,
    y: i32,
    text: &str,
    font: &Font,
    scale: Scale,
    color: (u8, u8, u8),
) {
    let v_metrics = font.v_metrics(scale);
    let glyphs: Vec<PositionedGlyph> = font
        .layout(text, scale, point(0.0, v_metrics.ascent))
        .collect();
    let (min_x, max_x, min_y, max_y) = glyphs.iter().filter_map(|g| g.pixel_bounding_box()).fold(
        (i32::MAX, i32::MIN, i32::MAX, i32::MIN),
        |(min_x, max_x, min_y, max_y), bb| {
            (
                min_x.min(bb.min.x),
                max_x.max(bb.max.x),
                min_y.min(bb.min.y),
                max_y.max(bb.max.y),
            )
        },
    );
    let width_px = if min_x < max_x { max_x - min_x } else { 0 };
    let height_px = if min_y < max_y { max_y - min_y } else { 0 };
    let offset_x = x.saturating_sub(width_px / 2);
    let offset_y = y.saturating_sub(height_px / 2);
    for glyph in glyphs {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, v| {
                let px = offset_x.saturating_add(gx as i32 + bb.min.x - min_x);
                let py = offset_y.saturating_add(gy as i32 + bb.min.y - min_y);
                canvas.set_pixel(px, py, color, v);
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gauge::GaugeState;

    const W: usize = 64;
    const H: usize = 48;

    fn font() -> Font<'static> {
        Font::try_from_bytes(crate::DEFAULT_FONT).unwrap()
    }

    fn pixel(frame: &[u8], x: usize, y: usize) -> (u8, u8, u8) {
        let idx = (y * W + x) * 4;
        (frame[idx], frame[idx + 1], frame[idx + 2])
    }

    fn render(scene: &Scene) -> Vec<u8> {
        let mut frame = vec![0u8; W * H * 4];
        let mut canvas = Canvas::new(&mut frame, W, H);
        scene.render(&mut canvas, &font());
        frame
    }

    #[test]
    fn test_clear_fills_opaque() {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear((1, 2, 3)));
        let frame = render(&scene);
        assert!(frame.chunks_exact(4).all(|px| px == [1, 2, 3, 0xff]));
    }

    #[test]
    fn test_line_and_circle_cover_their_pixels() {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear((0xff, 0xff, 0xff)));
        scene.add_command(DrawCommand::Line {
            x0: 2,
            y0: 10,
            x1: 40,
            y1: 10,
            thickness: 3.0,
            tapered: false,
            color: (0, 0, 0),
        });
        scene.add_command(DrawCommand::Circle {
            cx: 50,
            cy: 30,
            radius: 5,
            color: (0xff, 0, 0),
        });
        let frame = render(&scene);
        assert_eq!(pixel(&frame, 20, 10), (0, 0, 0));
        assert_eq!(pixel(&frame, 20, 20), (0xff, 0xff, 0xff));
        assert_eq!(pixel(&frame, 50, 30), (0xff, 0, 0));
        assert_eq!(pixel(&frame, 50, 37), (0xff, 0xff, 0xff));
    }

    #[test]
    fn test_degenerate_line_draws_a_dot() {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear((0xff, 0xff, 0xff)));
        scene.add_command(DrawCommand::Line {
            x0: 8,
            y0: 8,
            x1: 8,
            y1: 8,
            thickness: 4.0,
            tapered: true,
            color: (0, 0, 0),
        });
        let frame = render(&scene);
        assert_eq!(pixel(&frame, 8, 8), (0, 0, 0));
    }

    #[test]
    fn test_translucent_ellipse_blends() {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear((0xff, 0xff, 0xff)));
        scene.add_command(DrawCommand::Ellipse {
            cx: 32,
            cy: 24,
            rx: 30,
            ry: 6,
            alpha: 0.5,
            color: (0, 0, 0),
        });
        let frame = render(&scene);
        assert_eq!(pixel(&frame, 32, 24), (0x80, 0x80, 0x80));
        assert_eq!(pixel(&frame, 32, 40), (0xff, 0xff, 0xff));
    }

    #[test]
    fn test_shapes_off_canvas_are_clipped() {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Circle {
            cx: -20,
            cy: 500,
            radius: 40,
            color: (0, 0, 0),
        });
        scene.add_command(DrawCommand::Text {
            x: W as i32,
            y: H as i32,
            text: "88".to_string(),
            font_size: 40.0,
            color: (0, 0, 0),
        });
        render(&scene);
    }

    #[test]
    fn test_extreme_coordinates_saturate() {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear((0xff, 0xff, 0xff)));
        scene.add_command(DrawCommand::Line {
            x0: 32,
            y0: H as i32 - 1,
            x1: 32,
            y1: i32::MIN,
            thickness: 2.0,
            tapered: false,
            color: (0, 0, 0),
        });
        let frame = render(&scene);
        assert_eq!(pixel(&frame, 32, 10), (0, 0, 0));
        assert_eq!(pixel(&frame, 10, 10), (0xff, 0xff, 0xff));

        scene.add_command(DrawCommand::Circle {
            cx: i32::MAX,
            cy: 0,
            radius: i32::MAX,
            color: (0, 0, 0),
        });
        scene.add_command(DrawCommand::Text {
            x: i32::MIN,
            y: i32::MAX,
            text: "8".to_string(),
            font_size: 20.0,
            color: (0, 0, 0),
        });
        let frame = render(&scene);
        assert_eq!(pixel(&frame, W - 1, 0), (0, 0, 0));
    }

    #[test]
    fn test_text_is_drawn_around_its_centre() {
        let mut scene = Scene::new();
        scene.add_command(DrawCommand::Clear((0xff, 0xff, 0xff)));
        scene.add_command(DrawCommand::Text {
            x: 32,
            y: 24,
            text: "8".to_string(),
            font_size: 30.0,
            color: (0, 0, 0),
        });
        let frame = render(&scene);
        let inked: Vec<(usize, usize)> = (0..H)
            .flat_map(|y| (0..W).map(move |x| (x, y)))
            .filter(|&(x, y)| pixel(&frame, x, y).0 < 0x80)
            .collect();
        assert!(!inked.is_empty());
        assert!(inked.iter().all(|&(x, _)| (20..44).contains(&x)));
        assert!(inked.iter().all(|&(_, y)| (8..40).contains(&y)));
    }

    #[test]
    fn test_meter_commands_follow_draw_order() {
        let attrs = MeterAttributes::builder().reflection(true).build();
        let state = GaugeState::new(&attrs);
        let layout = GaugeLayout::compute(&attrs, &state, 1000, 600);
        let mut scene = Scene::new();
        add_meter(&mut scene, &layout, &attrs, 1000);

        let commands = scene.commands();
        assert!(matches!(commands[0], DrawCommand::Clear((0xff, 0xff, 0xff))));
        assert!(matches!(commands[1], DrawCommand::Ellipse { alpha, .. } if (alpha - 32.0 / 255.0).abs() < 1e-6));
        assert!(matches!(commands[2], DrawCommand::Line { x0: 500, y0: 600, .. }));
        assert!(matches!(commands[3], DrawCommand::Circle { radius: 30, .. }));
        let ticks = &commands[4..4 + layout.ticks.len()];
        assert!(ticks.iter().all(|c| matches!(c, DrawCommand::Line { .. })));
        let labels = &commands[4 + layout.ticks.len()..];
        assert_eq!(labels.len(), 10);
        assert!(labels.iter().all(|c| matches!(c, DrawCommand::Text { font_size, .. } if *font_size == 64.0)));
    }

    #[test]
    fn test_meter_without_reflection_skips_band() {
        let attrs = MeterAttributes::default();
        let layout = GaugeLayout::compute(&attrs, &GaugeState::new(&attrs), 1000, 600);
        let mut scene = Scene::new();
        add_meter(&mut scene, &layout, &attrs, 1000);
        assert!(!scene
            .commands()
            .iter()
            .any(|c| matches!(c, DrawCommand::Ellipse { .. })));
    }
}
