//! CLI: argument parsing, usage text and config resolution.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{CommandFactory, FromArgMatches, Parser, ValueEnum};

use crate::config::{Config, default_config_path, load_config};
use crate::error::{LogviewError, Result};

pub const VERSION: &str = match option_env!("LOGVIEW_VERSION") {
    Some(v) => v,
    None => env!("CARGO_PKG_VERSION"),
};

/// How a matched line is coloured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Mode {
    /// Colour the whole line
    Line,
    /// Colour only the level marker
    #[value(aliases = ["level", "default"])]
    Keyword,
}

#[derive(Parser, Debug)]
#[command(
    name = "logview",
    version = VERSION,
    about = "Tail a log file and highlight lines by log level"
)]
struct Args {
    /// Load config from file
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Lines of last to show
    #[arg(short = 'n', long = "lines", value_name = "NUMBER")]
    lines: Option<usize>,

    /// Highlight mode
    #[arg(short = 'm', long = "mode", value_enum, value_name = "MODE")]
    mode: Option<Mode>,

    /// Show line number
    #[arg(short = 'l', long = "linenumber")]
    line_number: bool,

    /// Interval of detecting new content
    #[arg(short = 'i', long = "interval", value_name = "MILLISECONDS")]
    interval: Option<u64>,

    /// Print the default config file and exit
    #[arg(long = "print-default-config")]
    print_default_config: bool,

    /// Log file to follow
    #[arg(value_name = "LOG_FILE", required_unless_present = "print_default_config")]
    file: Option<PathBuf>,
}

/// What the process was asked to do.
#[derive(Debug)]
pub enum Invocation {
    Follow { path: PathBuf, config: Config },
    /// Help, version or the default config. Printed, then the process
    /// exits with status 1 like every other way out.
    Print(String),
}

fn help_footer() -> String {
    format!(
        "Default config:\n\n{}",
        Config::default().to_config_string()
    )
}

fn try_parse_args<I, T>(args: I) -> std::result::Result<Args, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = Args::command()
        .after_help(help_footer())
        .try_get_matches_from(args)?;
    Args::from_arg_matches(&matches)
}

impl Args {
    /// Builds the final config: defaults, then the config file, then flags.
    fn resolve(self, default_config: Option<PathBuf>) -> Result<Invocation> {
        if self.print_default_config {
            return Ok(Invocation::Print(Config::default().to_config_string()));
        }
        let path = self
            .file
            .ok_or_else(|| LogviewError::usage("exactly one LOG_FILE is required"))?;

        let config_file = self
            .config
            .or_else(|| default_config.filter(|p| p.is_file()));
        let mut config = match config_file {
            Some(file) => load_config(&file, Config::default())?,
            None => Config::default(),
        };

        if let Some(lines) = self.lines {
            config.tail_line_count = lines;
        }
        if let Some(interval) = self.interval {
            config.poll_interval_ms = interval;
        }
        if let Some(mode) = self.mode {
            config.highlight_whole_line = mode == Mode::Line;
        }
        if self.line_number {
            config.show_line_number = true;
        }
        config.validate()?;
        Ok(Invocation::Follow { path, config })
    }
}

/// Parses the process arguments. `--help`/`--version` come back as
/// [`Invocation::Print`]; malformed arguments as [`LogviewError::Usage`].
pub fn parse() -> Result<Invocation> {
    parse_from(std::env::args_os(), default_config_path())
}

fn parse_from<I, T>(args: I, default_config: Option<PathBuf>) -> Result<Invocation>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match try_parse_args(args) {
        Ok(args) => args.resolve(default_config),
        Err(e) if !e.use_stderr() => Ok(Invocation::Print(e.render().to_string())),
        Err(e) => Err(LogviewError::usage(e.render().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn resolve(args: &[&str]) -> Result<Invocation> {
        parse_from(std::iter::once("logview").chain(args.iter().copied()), None)
    }

    fn printed(args: &[&str]) -> String {
        match resolve(args).unwrap() {
            Invocation::Print(text) => text,
            other => panic!("Expected Print, got {other:?}"),
        }
    }

    fn follow(args: &[&str]) -> (PathBuf, Config) {
        match resolve(args).unwrap() {
            Invocation::Follow { path, config } => (path, config),
            other => panic!("Expected Follow, got {other:?}"),
        }
    }

    #[test]
    fn test_defaults() {
        let (path, config) = follow(&["app.log"]);
        assert_eq!(path, PathBuf::from("app.log"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_interval_and_lines_are_independent() {
        let (_, config) = follow(&["-i", "250", "app.log"]);
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.tail_line_count, Config::default().tail_line_count);

        let (_, config) = follow(&["--lines", "7", "--interval", "5", "app.log"]);
        assert_eq!(config.poll_interval_ms, 5);
        assert_eq!(config.tail_line_count, 7);
    }

    #[test]
    fn test_modes() {
        assert!(follow(&["-m", "line", "a.log"]).1.highlight_whole_line);
        for mode in ["keyword", "level", "default"] {
            assert!(!follow(&["-m", mode, "a.log"]).1.highlight_whole_line);
        }
        assert!(resolve(&["-m", "rainbow", "a.log"]).is_err());
    }

    #[test]
    fn test_line_number_flag() {
        assert!(follow(&["-l", "a.log"]).1.show_line_number);
    }

    #[test]
    fn test_positional_count() {
        assert!(resolve(&[]).is_err());
        assert!(resolve(&["a.log", "b.log"]).is_err());
        assert!(resolve(&["-x", "a.log"]).is_err());
    }

    #[test]
    fn test_print_default_config() {
        assert_eq!(
            printed(&["--print-default-config"]),
            Config::default().to_config_string()
        );
    }

    #[test]
    fn test_help_and_version_are_printed_not_exited() {
        let help = printed(&["-h"]);
        assert!(help.contains("--linenumber"));
        assert!(help.contains("Default config:"));
        assert!(printed(&["--version"]).contains(VERSION));
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[basic]\nlines_of_last=3\ndetect_interval=100\nhighlight_line=true\n")
            .unwrap();
        file.flush().unwrap();
        let cfg = file.path().to_str().unwrap();

        let (_, config) = follow(&["-c", cfg, "a.log"]);
        assert_eq!(config.tail_line_count, 3);
        assert_eq!(config.poll_interval_ms, 100);
        assert!(config.highlight_whole_line);

        let (_, config) = follow(&["-c", cfg, "-n", "9", "-m", "keyword", "a.log"]);
        assert_eq!(config.tail_line_count, 9);
        assert_eq!(config.poll_interval_ms, 100);
        assert!(!config.highlight_whole_line);
    }

    #[test]
    fn test_bad_config_file_is_reported() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[basic]\nline_number_color=1,2\n").unwrap();
        file.flush().unwrap();
        let cfg = file.path().to_str().unwrap();
        assert!(matches!(
            resolve(&["-c", cfg, "a.log"]),
            Err(LogviewError::ConfigValidation { line: 2, .. })
        ));
    }

    #[test]
    fn test_help_lists_default_config() {
        let err = try_parse_args(["logview", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
        let help = err.to_string();
        assert!(help.contains("--interval"));
        assert!(help.contains("line_number_color=175,95,0"));
    }
}
