use std::path::PathBuf;
use std::time::Duration;

use clap::{ArgGroup, Parser, ValueEnum};
use engine::EngineSettings;
use log::LevelFilter;
use vision::DetectorSettings;

use crate::options::HelperOptions;

#[derive(Parser, Debug)]
#[command(name = "xqhelper")]
#[command(author = "Jørgen Hanssen <jorgen@hanssen.io>")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(group(ArgGroup::new("snapshot").required(true).args(["image", "markup"])))]
pub struct Args {
    /// Screen capture of the board, re-read on every poll.
    #[arg(long)]
    pub image: Option<PathBuf>,

    /// JSON dump of the page hosting the board, re-read on every poll.
    #[arg(long)]
    pub markup: Option<PathBuf>,

    /// Directory holding the board and piece patterns.
    #[arg(long, default_value = "patterns")]
    pub patterns: PathBuf,

    /// UCI engine binary.
    #[arg(long, default_value = "fairy-stockfish")]
    pub engine: PathBuf,

    /// Engine option as NAME=VALUE, applied over the xiangqi defaults. Repeatable.
    #[arg(long = "engine-option", value_parser = parse_key_value)]
    pub engine_options: Vec<(String, String)>,

    #[arg(long, default_value_t = 100)]
    pub poll_ms: u64,

    #[arg(long, default_value_t = 0.8)]
    pub anchor_threshold: f32,

    #[arg(long, default_value_t = 0.8)]
    pub piece_threshold: f32,

    #[arg(long, default_value_t = 0.7)]
    pub marker_threshold: f32,

    /// Share of a match that may overlap a better one before it is dropped.
    #[arg(long, default_value_t = 0.3)]
    pub overlap_threshold: f32,

    /// Seconds per search.
    #[arg(long, default_value_t = 2)]
    pub move_time: u64,

    /// Principal variations requested from the engine.
    #[arg(long, default_value_t = 1)]
    pub lines: u8,

    /// Moves shown per candidate line.
    #[arg(long, default_value_t = 8)]
    pub display_depth: usize,

    /// Seconds a search may run past its handoff before the engine is restarted.
    #[arg(long, default_value_t = 20)]
    pub watchdog_secs: u64,

    #[arg(long, default_value_t = 100)]
    pub settle_ms: u64,

    /// Show boards without querying the engine.
    #[arg(long)]
    pub no_assist: bool,

    /// Log engine communication and detection details to a file for debugging.
    #[arg(short, long)]
    pub log_file: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::Off,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

impl Args {
    pub fn engine_settings(&self) -> EngineSettings {
        let mut settings = EngineSettings {
            path: self.engine.clone(),
            move_time: Duration::from_secs(self.move_time),
            line_count: self.lines,
            watchdog_deadline: Duration::from_secs(self.watchdog_secs),
            settle_delay: Duration::from_millis(self.settle_ms),
            ..EngineSettings::default()
        };
        for (name, value) in &self.engine_options {
            settings.set_option(name, value);
        }
        settings
    }

    pub fn detector_settings(&self) -> DetectorSettings {
        DetectorSettings {
            anchor_threshold: self.anchor_threshold,
            piece_threshold: self.piece_threshold,
            marker_threshold: self.marker_threshold,
            overlap_threshold: self.overlap_threshold,
            ..DetectorSettings::default()
        }
    }

    /// Validates the adjustable options the same way console commands are.
    pub fn helper_options(&self) -> Result<HelperOptions, String> {
        let mut options = HelperOptions::default();
        options.update("movetime", &self.move_time.to_string())?;
        options.update("multipv", &self.lines.to_string())?;
        options.update("depth", &self.display_depth.to_string())?;
        options.update("assist", &(!self.no_assist).to_string())?;
        Ok(options)
    }
}

fn parse_key_value(input: &str) -> Result<(String, String), String> {
    let (name, value) = input
        .split_once('=')
        .ok_or_else(|| format!("Expected NAME=VALUE, got {:?}", input))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing option name in {:?}", input));
    }
    Ok((name.to_string(), value.trim().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_requires_snapshot_source() {
        assert!(Args::try_parse_from(["xqhelper"]).is_err());
        assert!(
            Args::try_parse_from(["xqhelper", "--image", "a.png", "--markup", "b.json"]).is_err()
        );
        assert!(Args::try_parse_from(["xqhelper", "--markup", "b.json"]).is_ok());
    }

    #[test]
    fn test_engine_settings() {
        let args = Args::try_parse_from([
            "xqhelper",
            "--image",
            "capture.png",
            "--engine",
            "/opt/fsf",
            "--engine-option",
            "UCI_Elo=2000",
            "--engine-option",
            "Threads = 4",
            "--lines",
            "3",
        ])
        .unwrap();

        let settings = args.engine_settings();
        assert_eq!(settings.path, PathBuf::from("/opt/fsf"));
        assert_eq!(settings.line_count, 3);
        assert_eq!(
            settings.options,
            vec![
                ("UCI_Variant".to_string(), "xiangqi".to_string()),
                ("UCI_Elo".to_string(), "2000".to_string()),
                ("Threads".to_string(), "4".to_string()),
            ]
        );
        assert_eq!(settings.settle_delay, Duration::from_millis(100));
    }

    #[test]
    fn test_helper_options_validated() {
        let args = Args::try_parse_from(["xqhelper", "--image", "c.png", "--no-assist"]).unwrap();
        let options = args.helper_options().unwrap();
        assert!(!options.assist.value);
        assert_eq!(options.move_time.value, 2);

        let args = Args::try_parse_from(["xqhelper", "--image", "c.png", "--lines", "7"]).unwrap();
        assert!(args.helper_options().is_err());
    }

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("Hash=64"),
            Ok(("Hash".to_string(), "64".to_string()))
        );
        assert!(parse_key_value("Hash").is_err());
        assert!(parse_key_value("=64").is_err());
    }
}
