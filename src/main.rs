//! Host screen: an analog meter with a slider wired to its needle.
//!
//! Drag the slider or use the arrow keys to move the needle. With `--stdin`
//! every line read from standard input that parses as a number becomes the
//! new needle value, so the meter can sit at the end of a pipe.

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::mpsc::{self, Sender};
use std::thread;

use analog_meter::{Meter, MeterAttributes, MeterCommand};
use anyhow::Context;
use clap::Parser;
use log::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "analog-meter", version, about = "Analog meter with a slider-driven needle")]
struct Args {
    /// TOML file with the meter's styled attributes
    #[arg(short, long)]
    attributes: Option<PathBuf>,

    /// TrueType/OpenType font for the value labels
    #[arg(long)]
    font: Option<PathBuf>,

    /// Window title
    #[arg(long)]
    title: Option<String>,

    /// Initial needle value
    #[arg(long, allow_negative_numbers = true)]
    value: Option<f64>,

    /// Read needle values from standard input, one per line
    #[arg(long)]
    stdin: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut attributes = load_attributes(args.attributes.as_deref());
    if let Some(title) = args.title {
        attributes.title = title;
    }
    if let Some(value) = args.value {
        attributes.current_value = value;
    }

    let mut meter = Meter::new(attributes).context("failed to create meter")?;
    if let Some(path) = args.font {
        let data = std::fs::read(&path)
            .with_context(|| format!("failed to read font {}", path.display()))?;
        meter = meter
            .with_font(data)
            .with_context(|| format!("failed to load font {}", path.display()))?;
    }
    let mut meter = meter.with_slider();

    if args.stdin {
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || read_values(io::stdin().lock(), sender));
        meter
            .show_with_commands(receiver)
            .context("meter window failed")
    } else {
        meter.show().context("meter window failed")
    }
}

/// Missing or broken attribute files fall back to the defaults.
fn load_attributes(path: Option<&std::path::Path>) -> MeterAttributes {
    let Some(path) = path else {
        return MeterAttributes::default();
    };
    match MeterAttributes::load(path) {
        Ok(attributes) => {
            info!("loaded attributes from {}", path.display());
            attributes
        }
        Err(err) => {
            warn!(
                "ignoring attributes in {}: {err}; using defaults",
                path.display()
            );
            MeterAttributes::default()
        }
    }
}

fn read_values(input: impl BufRead, sender: Sender<MeterCommand>) {
    for line in input.lines() {
        let Ok(line) = line else { break };
        let trimmed = line.trim();
        match trimmed.parse::<f64>() {
            Ok(value) => {
                if sender.send(MeterCommand::SetValue(value)).is_err() {
                    break;
                }
            }
            Err(_) if trimmed.is_empty() => {}
            Err(_) => warn!("skipping non-numeric input {trimmed:?}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_values_skips_junk() {
        let (sender, receiver) = mpsc::channel();
        read_values("3\n\n  4.5 \nabc\n-1\n".as_bytes(), sender);
        let values: Vec<MeterCommand> = receiver.iter().collect();
        assert_eq!(
            values,
            [
                MeterCommand::SetValue(3.0),
                MeterCommand::SetValue(4.5),
                MeterCommand::SetValue(-1.0),
            ]
        );
    }

    #[test]
    fn test_broken_attribute_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meter.toml");
        std::fs::write(&path, "max_value = \"nine\"").unwrap();
        assert_eq!(load_attributes(Some(path.as_path())), MeterAttributes::default());
        assert_eq!(load_attributes(None), MeterAttributes::default());
    }

    #[test]
    fn test_args_parse() {
        let args = Args::parse_from(["analog-meter", "--value", "-2", "--stdin", "-a", "m.toml"]);
        assert_eq!(args.value, Some(-2.0));
        assert!(args.stdin);
        assert_eq!(args.attributes, Some(PathBuf::from("m.toml")));
    }
}
