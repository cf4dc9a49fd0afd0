//! # lmdb-viz
//!
//! Renders the space usage of an LMDB store.
//!
//! ```bash
//! # Summary and status line
//! lmdb-viz ./store
//!
//! # Zoomed image of the second half, without the "logs" table
//! lmdb-viz ./store --skip 0.5 --zoom 2 --hide logs --out store.ppm
//! ```

mod args;
mod ppm;
mod report;

use std::fs::File;
use std::io::BufWriter;

use lmdb_viz::{
    render, ExtentIndex, RecordKind, Result, StoreExtentCrawler, Summary, ViewState, Visibility,
    VizConfig, VizError,
};

use crate::args::{Args, Command};
use crate::report::Report;

fn main() {
    let _ = dotenvy::dotenv();
    env_logger::init();

    if let Err(e) = run() {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    match args::parse(std::env::args().skip(1))? {
        Command::Help => args::print_usage(),
        Command::Version => println!("lmdb-viz {}", env!("CARGO_PKG_VERSION")),
        Command::Render(args) => render_store(&args)?,
    }
    Ok(())
}

fn render_store(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => VizConfig::load(path)?,
        None => VizConfig::from_env()?,
    };

    let crawler = StoreExtentCrawler::open(&args.db_dir, &config.store)?;
    let index = crawler.crawl()?;

    let mut view = ViewState::with_defaults(config.view, index.tables().len());
    if let Some(magnification) = args.magnification {
        view.magnification = magnification;
    }
    if let Some(skip) = args.skip {
        view.skip = skip;
    }
    if let Some(zoom) = args.zoom {
        view.zoom = zoom;
    }
    for entry in config.hidden.iter().chain(&args.hidden) {
        hide(&mut view.visibility, &index, entry);
    }

    let width = args.width.unwrap_or(config.width) as usize;
    let height = args.height.unwrap_or(config.height) as usize;
    if width == 0 || height == 0 {
        return Err(VizError::InvalidInput(format!(
            "output size must be positive, got {width}x{height}"
        )));
    }

    let frame = render(&index, width, height, &view);
    let summary = Summary::new(&index);
    let report = Report::new(&args.db_dir, &summary, &frame);

    if args.json {
        let json = serde_json::to_string_pretty(&report).map_err(std::io::Error::from)?;
        println!("{json}");
    } else {
        print!("{}", report.to_text());
    }

    if let Some(out) = &args.out {
        let file = File::create(out)?;
        ppm::write_ppm(&frame, BufWriter::new(file))?;
        log::info!("wrote {width}x{height} image to {}", out.display());
    }
    Ok(())
}

/// Applies one `name`, `name:key` or `name:val` entry to `visibility`.
fn hide(visibility: &mut Visibility, index: &ExtentIndex, entry: &str) {
    let (name, kind) = match entry.rsplit_once(':') {
        Some((name, "key")) => (name, Some(RecordKind::Key)),
        Some((name, "val")) => (name, Some(RecordKind::Value)),
        _ => (entry, None),
    };

    let Some(table_id) = index.table_id(name) else {
        log::warn!("cannot hide {entry:?}: no table named {name:?}");
        return;
    };
    match kind {
        Some(kind) => visibility.set(table_id, kind, false),
        None => visibility.hide_table(table_id),
    }
}
