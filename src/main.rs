//! Flower Garden: falling resource blocks bloom into flowers, in the terminal.

mod app;
mod highscores;
mod keys;
mod theme;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use flowergarden::{RulesConfig, Simulation};
use std::path::PathBuf;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {e}");
        theme::Theme::default()
    });
    let rules = args.rules();
    let seed = args.seed.unwrap_or_else(rand::random);
    log::info!("starting with seed {seed}, rules {rules:?}");
    let sim = Simulation::new(rules, seed)
        .context("invalid rules")?
        .with_high_score(highscores::load_high_score());

    let mut app = App::new(args, sim, theme);
    app.run()?;
    Ok(())
}

/// The terminal is in raw mode on the alternate screen, so logs only go to a file, or to stderr
/// when RUST_LOG asks for it explicitly.
fn init_logging(log_file: Option<&std::path::Path>) -> Result<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(path) = log_file {
        let file = std::fs::File::create(path)
            .with_context(|| format!("cannot create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    } else if std::env::var_os("RUST_LOG").is_none() {
        return Ok(());
    }
    builder.init();
    Ok(())
}

/// Flower Garden in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "flowergarden",
    version,
    about = "Falling-block puzzle: arrange seeds, soil, water and sun into shapes to grow flowers.",
    long_about = "Flower Garden is a terminal falling-block puzzle.\n\n\
        Resource blocks (seed, soil, water, sun, rock) fall one at a time. When settled blocks \
        form one of the seven tetromino shapes with a seed, soil and water plus a sun, they \
        bloom into a flower. Sun is only needed, never used up. Fill the bottom rows with \
        flowers to advance the wave.\n\n\
        CONTROLS (normal):\n  Left/Right  Move    Down  Drop half a row   Up/Space/C  Hold\n  P           Pause   Q / Esc  Quit         R           Restart after game over\n\n\
        CONTROLS (vim):\n  h/l         Move    j     Drop              k           Hold\n\n\
        Hold H and press R on the title screen to reset the high score. The mouse works too: \
        left/right halves move, the bottom strip drops and the top-right corner holds."
)]
pub struct Args {
    /// Random seed for the bag and flower angles. Random if not set.
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Simulation ticks per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub tick_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Skip the title screen and start playing immediately.
    #[arg(long)]
    pub no_title: bool,

    /// Write logs to this file (filter with RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,

    /// Ticks between half-row steps of loose settled blocks.
    #[arg(long, value_name = "TICKS")]
    pub resettle_every: Option<u64>,

    /// Ticks between automatic half-row drops of the falling block.
    #[arg(long, value_name = "TICKS")]
    pub auto_drop_every: Option<u64>,

    /// Minimum ticks between two sideways moves.
    #[arg(long, value_name = "TICKS")]
    pub move_cooldown: Option<u64>,
}

impl Args {
    /// Default rules with the command-line overrides applied.
    pub fn rules(&self) -> RulesConfig {
        let defaults = RulesConfig::default();
        RulesConfig {
            resettle_every: self.resettle_every.unwrap_or(defaults.resettle_every),
            auto_drop_every: self.auto_drop_every.unwrap_or(defaults.auto_drop_every),
            move_cooldown: self.move_cooldown.unwrap_or(defaults.move_cooldown),
            ..defaults
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
