mod app;
mod board;
mod headless;
mod sim;
mod util;

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use clap::Parser;

use board::{CardFilter, load_board, sample_board};
use sim::SimConfig;

#[derive(Debug, Parser)]
#[command(author, version, about)]
struct Args {
    /// Board snapshot JSON; the built-in sample board is used when omitted.
    #[arg(long)]
    board: Option<PathBuf>,

    /// Layout config JSON. Any subset of fields.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Seed for the node placement RNG.
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, default_value = "")]
    query: String,

    #[arg(long)]
    project: Option<String>,

    #[arg(long)]
    category: Option<String>,

    /// Show archived cards instead of active ones.
    #[arg(long)]
    archived: bool,

    /// Run the layout without a window and print the result as JSON.
    #[arg(long)]
    headless: bool,

    #[arg(long, default_value_t = 300)]
    ticks: u64,

    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    fn filter(&self) -> CardFilter {
        CardFilter {
            query: self.query.clone(),
            project: self.project.clone(),
            category: self.category.clone(),
            archived: self.archived,
        }
    }
}

fn init_logging(verbosity: u8) {
    let level = match verbosity {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.format(|buf, record| {
        writeln!(buf, "[{} {}] {}", record.level(), record.target(), record.args())
    });
    builder.init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = match &args.config {
        Some(path) => SimConfig::load(path)?,
        None => SimConfig::default(),
    };
    let filter = args.filter();

    if args.headless {
        let board = match &args.board {
            Some(path) => load_board(path)?,
            None => sample_board(),
        };
        return headless::run(&board, &filter, config, args.seed, args.ticks)
            .context("headless layout failed");
    }

    let launch = app::Launch {
        board: args.board.clone(),
        config,
        seed: args.seed,
        filter,
    };
    let options = eframe::NativeOptions {
        viewport: eframe::egui::ViewportBuilder::default().with_inner_size([1440.0, 920.0]),
        ..Default::default()
    };

    eframe::run_native(
        "idea-threads",
        options,
        Box::new(move |cc| Ok(Box::new(app::ThreadsApp::new(cc, launch)))),
    )
    .map_err(|error| anyhow!("failed to start the threads view: {error}"))
}

