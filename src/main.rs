//! Stacktui: drop swinging pancakes onto a plate and build a ten-high stack in the terminal.

mod app;
mod config;
mod game;
mod input;
mod oscillator;
mod resolver;
mod stack;
mod theme;
mod timer;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use config::GameConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {e}");
        theme::Theme::default()
    });
    let config = args.game_config();
    let mut app = App::new(&args, config, theme)?;
    app.run()?;
    Ok(())
}

/// The UI owns the terminal, so logs only go to a file. Without `--log-file`
/// logging stays off.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("creating log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("initialising logger")?;
    log::info!("stacktui {} starting", env!("CARGO_PKG_VERSION"));
    Ok(())
}

/// Pancake stacking arcade game in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "stacktui",
    version,
    about = "Stack swinging pancakes on a plate before the clock runs out.",
    long_about = "Stacktui is a terminal stacking game.\n\n\
        A pancake swings left and right above the stack. Drop it so it lands on the one below: \
        whatever hangs over the edge is cut off, so the next pancake is narrower. Miss completely \
        and the game is over. Stack ten before time runs out to win.\n\n\
        CONTROLS:\n  Space / Down / j  Drop    Enter / R  Start, restart\n  B  Hit-box outline    Q / Esc  Quit"
)]
pub struct Args {
    /// Round length in seconds.
    #[arg(long, default_value = "30", value_name = "SECS")]
    pub duration: u32,

    /// Pancakes needed to win (plate not counted).
    #[arg(long, default_value = "10", value_name = "N")]
    pub win_at: usize,

    /// Field width in game units (the board is scaled to the terminal).
    #[arg(long, default_value = "400", value_name = "UNITS")]
    pub field_width: f64,

    /// Plate width in game units; also the first pancake's width.
    #[arg(long, default_value = "150", value_name = "UNITS")]
    pub plate_width: f64,

    /// Starting swing speed, units per frame.
    #[arg(long, default_value = "2.0", value_name = "SPEED")]
    pub initial_speed: f64,

    /// Speed added after every landed pancake.
    #[arg(long, default_value = "0.1", value_name = "SPEED")]
    pub speed_step: f64,

    /// Speed cap.
    #[arg(long, default_value = "5.0", value_name = "SPEED")]
    pub max_speed: f64,

    /// Fall animation length in ms before a drop is resolved.
    #[arg(long, default_value = "300", value_name = "MS")]
    pub drop_delay_ms: u64,

    /// Resolve drops immediately (no fall animation).
    #[arg(long)]
    pub no_animation: bool,

    /// Target render frames per second.
    #[arg(long, default_value = "60.0", value_name = "RATE")]
    pub frame_rate: f64,

    /// Path to theme file (btop-style theme[key]=\"value\"). Uses One Dark if not set.
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Skip the title screen and start immediately.
    #[arg(long)]
    pub no_menu: bool,

    /// Start with the tolerance outline around the swinging pancake visible.
    #[arg(long)]
    pub show_outline: bool,

    /// Write logs to this file (filter with RUST_LOG).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

impl Args {
    pub fn game_config(&self) -> GameConfig {
        let config = GameConfig {
            round_secs: self.duration,
            win_threshold: self.win_at,
            field_width: self.field_width,
            plate_width: self.plate_width,
            initial_width: self.plate_width,
            initial_speed: self.initial_speed,
            speed_step: self.speed_step,
            max_speed: self.max_speed,
            drop_delay: Duration::from_millis(self.drop_delay_ms),
            ..GameConfig::default()
        };
        if self.no_animation {
            config.without_drop_delay()
        } else {
            config
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

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_reference_constants() {
        let args = Args::parse_from(["stacktui"]);
        assert_eq!(args.game_config(), GameConfig::default());
    }

    #[test]
    fn test_no_animation_zeroes_delay() {
        let args = Args::parse_from(["stacktui", "--no-animation", "--win-at", "5"]);
        let config = args.game_config();
        assert_eq!(config.drop_delay, Duration::ZERO);
        assert_eq!(config.win_threshold, 5);
    }

    #[test]
    fn test_palette_alias() {
        let args = Args::parse_from(["stacktui", "--palette", "colourblind"]);
        assert_eq!(args.palette, Palette::Colorblind);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Args::command().debug_assert();
    }
}
