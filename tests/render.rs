use analog_meter::{Color, Meter, MeterAttributes};

const RED: Color = Color::new(0xff, 0x00, 0x00);
const GREEN: Color = Color::new(0x00, 0xff, 0x00);
const BLUE: Color = Color::new(0x00, 0x00, 0xff);

fn pixel(frame: &[u8], width: usize, x: usize, y: usize) -> (u8, u8, u8) {
    let idx = (y * width + x) * 4;
    (frame[idx], frame[idx + 1], frame[idx + 2])
}

fn render(meter: &Meter) -> (Vec<u8>, usize, usize) {
    let (width, height) = meter.frame_size();
    let mut frame = vec![0u8; width * height * 4];
    meter.render(&mut frame, width, height);
    (frame, width, height)
}

/// Upright, motionless needle with every element in its own color.
fn colored_meter() -> Meter {
    let attributes = MeterAttributes::builder()
        .current_value(4.5)
        .vibration_degrees(0)
        .interval_subdivisions(1)
        .needle_thickness(4.0)
        .needle_color(RED)
        .intervals_color(BLUE)
        .values_color(GREEN)
        .build();
    Meter::new(attributes).unwrap()
}

#[test]
fn needle_hub_ticks_and_labels_land_where_expected() {
    let meter = colored_meter();
    assert!(meter.state().is_settled());
    let (frame, width, _) = render(&meter);

    // background
    assert_eq!(pixel(&frame, width, 500, 100), (0xff, 0xff, 0xff));
    // needle, pointing straight up from the bottom centre
    assert_eq!(pixel(&frame, width, 500, 510), RED.as_tuple());
    // hub
    assert_eq!(pixel(&frame, width, 500, 590), RED.as_tuple());
    // major tick for the minimum value, on the left along the bottom edge
    assert_eq!(pixel(&frame, width, 420, 599), BLUE.as_tuple());

    // label "4" sits 400 px out at 260 degrees, around (430, 206)
    let green_ink = (180..235)
        .flat_map(|y| (405..455).map(move |x| (x, y)))
        .filter(|&(x, y)| {
            let (r, g, b) = pixel(&frame, width, x, y);
            g > 0x80 && r < 0x80 && b < 0x80
        })
        .count();
    assert!(green_ink > 20, "expected label ink, found {green_ink} pixels");
}

#[test]
fn same_seed_renders_same_frames() {
    let attributes = MeterAttributes::builder().vibration_degrees(3).build();
    let mut first = Meter::new(attributes.clone()).unwrap().with_seed(42);
    let mut second = Meter::new(attributes).unwrap().with_seed(42);
    for _ in 0..10 {
        first.tick();
        second.tick();
        assert_eq!(render(&first).0, render(&second).0);
    }
}

#[test]
fn slider_strip_renders_below_gauge() {
    let meter = Meter::new(MeterAttributes::builder().needle_color(RED).build())
        .unwrap()
        .with_slider();
    let (frame, width, height) = render(&meter);
    assert_eq!((width, height), (1000, 696));

    // 96 px strip: track from x 48 to 952 at y 648, thumb at the minimum.
    assert_eq!(pixel(&frame, width, 48, 648), RED.as_tuple());
    assert_eq!(pixel(&frame, width, 900, 648), Color::LIGHT_GRAY.as_tuple());
    assert_eq!(pixel(&frame, width, 700, 620), (0xff, 0xff, 0xff));
}

#[test]
fn short_buffer_does_not_panic() {
    let meter = colored_meter().with_slider();
    let mut frame = vec![0u8; 1000 * 100 * 4];
    meter.render(&mut frame, 1000, 696);
    let mut empty: Vec<u8> = Vec::new();
    meter.render(&mut empty, 0, 0);
}

#[test]
fn bundled_attribute_file_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/meter.toml");
    let attributes = MeterAttributes::load(path).unwrap();
    assert_eq!(attributes.title, "UV meter");
    assert!(attributes.reflection);
    assert_eq!(attributes.sanitized().max_value, 9);
}

#[test]
fn oversized_geometry_renders_without_overflow() {
    let attributes = MeterAttributes::builder()
        .needle_length(1e10)
        .hub_radius(i32::MAX)
        .needle_color(RED)
        .reflection(true)
        .reflection_half_height(i32::MAX)
        .build();
    let meter = Meter::new(attributes).unwrap().with_slider();
    let (frame, width, _) = render(&meter);
    // The hub now covers the whole gauge area.
    assert_eq!(pixel(&frame, width, 10, 10), RED.as_tuple());
}

#[test]
fn full_value_range_renders_bounded_ticks() {
    let attributes = MeterAttributes::builder()
        .min_value(i32::MIN)
        .max_value(i32::MAX)
        .interval_subdivisions(4_000_000_000)
        .update_rate_ms(u64::MAX)
        .build();
    let mut meter = Meter::new(attributes).unwrap().with_slider();
    meter.tick();
    render(&meter);
    assert!(meter.attributes().interval > 1);
}
