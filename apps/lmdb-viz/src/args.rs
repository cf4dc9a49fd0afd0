//! Command-line arguments.

use std::path::PathBuf;

use lmdb_viz::{Result, VizError};

/// What the binary was asked to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Version,
    Render(Args),
}

/// Options for rendering one store. Unset values come from the configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    pub db_dir: PathBuf,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub magnification: Option<u32>,
    pub skip: Option<f64>,
    pub zoom: Option<f64>,
    pub hidden: Vec<String>,
    pub out: Option<PathBuf>,
    pub json: bool,
    pub config: Option<PathBuf>,
}

/// Parses the arguments following the program name.
pub fn parse<I>(args: I) -> Result<Command>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut parsed = Args::default();
    let mut db_dir: Option<PathBuf> = None;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--help" | "-h" => return Ok(Command::Help),
            "--version" | "-V" => return Ok(Command::Version),
            "--width" => parsed.width = Some(positive(&arg, value(&arg, &mut args)?)?),
            "--height" => parsed.height = Some(positive(&arg, value(&arg, &mut args)?)?),
            "--mag" => parsed.magnification = Some(positive(&arg, value(&arg, &mut args)?)?),
            "--skip" => parsed.skip = Some(number(&arg, value(&arg, &mut args)?)?),
            "--zoom" => parsed.zoom = Some(number(&arg, value(&arg, &mut args)?)?),
            "--hide" => parsed.hidden.push(value(&arg, &mut args)?),
            "--out" | "-o" => parsed.out = Some(PathBuf::from(value(&arg, &mut args)?)),
            "--json" => parsed.json = true,
            "--config" | "-c" => parsed.config = Some(PathBuf::from(value(&arg, &mut args)?)),
            flag if flag.starts_with('-') => {
                return Err(VizError::InvalidInput(format!("unknown option: {flag}")));
            }
            path => {
                if db_dir.is_some() {
                    return Err(VizError::InvalidInput(
                        "multiple store directories specified".to_string(),
                    ));
                }
                db_dir = Some(PathBuf::from(path));
            }
        }
    }

    match db_dir {
        Some(db_dir) => Ok(Command::Render(Args { db_dir, ..parsed })),
        None => Ok(Command::Help),
    }
}

fn value(flag: &str, args: &mut impl Iterator<Item = String>) -> Result<String> {
    args.next()
        .ok_or_else(|| VizError::InvalidInput(format!("{flag} requires a value")))
}

fn positive(flag: &str, raw: String) -> Result<u32> {
    match raw.parse::<u32>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(VizError::InvalidInput(format!(
            "{flag} expects a positive integer, got {raw:?}"
        ))),
    }
}

fn number(flag: &str, raw: String) -> Result<f64> {
    match raw.parse::<f64>() {
        Ok(value) if value.is_finite() => Ok(value),
        _ => Err(VizError::InvalidInput(format!(
            "{flag} expects a number, got {raw:?}"
        ))),
    }
}

pub fn print_usage() {
    println!("lmdb-viz - LMDB space usage visualizer");
    println!();
    println!("USAGE:");
    println!("    lmdb-viz [OPTIONS] <DB_DIR>");
    println!();
    println!("ARGS:");
    println!("    <DB_DIR>               Directory holding data.mdb");
    println!();
    println!("OPTIONS:");
    println!("        --width <N>        Output width in pixels");
    println!("        --height <N>       Output height in pixels");
    println!("        --mag <N>          Pixels per cell along each axis (1-16)");
    println!("        --skip <F>         Fraction of the map skipped before the window");
    println!("        --zoom <F>         Zoom factor");
    println!("        --hide <NAME>      Hide a table, or NAME:key / NAME:val (repeatable)");
    println!("    -o, --out <FILE>       Write the frame as a binary PPM image");
    println!("        --json             Print the summary as JSON");
    println!("    -c, --config <FILE>    Configuration file (default: $LMDB_VIZ_CONFIG)");
    println!("    -h, --help             Print help information");
    println!("    -V, --version          Print version information");
}
