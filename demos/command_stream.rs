use analog_meter::{Easing, Meter, MeterAttributes, MeterCommand};
use rand::Rng;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // A 0-100 meter with a label every 10 and a longer, lerp-eased needle
    let attributes = MeterAttributes::builder()
        .title("Command stream".to_string())
        .max_value(100)
        .interval(10)
        .interval_subdivisions(5)
        .needle_length(380.0)
        .needle_thickness(8.0)
        .needle_tapered(true)
        .values_text_size(40.0)
        .values_radius(440.0)
        .easing(Easing::Lerp { factor: 0.02 })
        .reflection(true)
        .build();

    let mut meter = Meter::new(attributes)?;

    let (sender, receiver) = mpsc::channel();

    // Spawn a thread that jumps the needle to a random value every second
    thread::spawn(move || {
        let mut rng = rand::rng();
        loop {
            let commands = [
                MeterCommand::SetValue(rng.random_range(0.0..=100.0)),
                MeterCommand::SetVibration(rng.random_range(0..4)),
            ];
            if commands.into_iter().any(|cmd| sender.send(cmd).is_err()) {
                break;
            }
            thread::sleep(Duration::from_secs(1));
        }
    });

    println!("Displaying a meter driven by random commands. Close the window to exit.");

    meter.show_with_commands(receiver)?;
    Ok(())
}
