//! Runtime configuration and the `[group]` key/value config file loader.

use std::fmt::Write;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::debug;

use crate::constants::{
    DEFAULT_LINE_LEN, DEFAULT_POLL_INTERVAL_MS, DEFAULT_TAIL_LINES, MAX_LINE_LEN,
};
use crate::error::{LogviewError, Result};
use crate::theme::{Level, LevelTable, Rgb};

const BASIC_GROUP: &str = "basic";

/// Immutable configuration shared by the reader, highlighter and poll loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub poll_interval_ms: u64,
    pub max_line_length: usize,
    pub tail_line_count: usize,
    pub highlight_whole_line: bool,
    pub show_line_number: bool,
    pub line_number_color: Rgb,
    pub levels: LevelTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            max_line_length: DEFAULT_LINE_LEN,
            tail_line_count: DEFAULT_TAIL_LINES,
            highlight_whole_line: false,
            show_line_number: false,
            line_number_color: Rgb::new(175, 95, 0),
            levels: LevelTable::default(),
        }
    }
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Checks the cross-field limits that single keys cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.max_line_length == 0 || self.max_line_length > MAX_LINE_LEN {
            return Err(LogviewError::usage(format!(
                "line max length must be in 1..={MAX_LINE_LEN}, got {}",
                self.max_line_length
            )));
        }
        Ok(())
    }

    /// Renders the config in the file format understood by [`load_config`].
    pub fn to_config_string(&self) -> String {
        let mut s = String::new();
        let _ = writeln!(s, "[{BASIC_GROUP}]");
        let _ = writeln!(s, "detect_interval={}ms", self.poll_interval_ms);
        let _ = writeln!(s, "lines_of_last={}", self.tail_line_count);
        let _ = writeln!(s, "line_max_length={}", self.max_line_length);
        let _ = writeln!(s, "highlight_line={}", self.highlight_whole_line);
        let _ = writeln!(s, "show_line_number={}", self.show_line_number);
        let _ = writeln!(s, "line_number_color={}", self.line_number_color);
        for &level in Level::all() {
            let rule = self.levels.rule(level);
            let _ = writeln!(s);
            let _ = writeln!(s, "[{}]", rule.group_name());
            let _ = writeln!(s, "text={}", encode_spaces(rule.marker()));
            let _ = writeln!(s, "color={}", rule.color);
        }
        s
    }
}

/// Default config file location: `<config_dir>/logview/logview.conf`.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("logview").join("logview.conf"))
}

/// Reads a config file and applies it on top of `base`.
pub fn load_config(path: &Path, base: Config) -> Result<Config> {
    let content = fs::read_to_string(path).map_err(|source| LogviewError::ConfigRead {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&content, base).map_err(|(line, message)| {
        LogviewError::ConfigValidation {
            path: path.to_path_buf(),
            line,
            message,
        }
    })?;
    debug!(path = %path.display(), "config loaded");
    Ok(config)
}

/// Parses config text. Errors carry the 1-based line number.
pub fn parse_config(
    content: &str,
    mut config: Config,
) -> std::result::Result<Config, (usize, String)> {
    let mut group: Option<String> = None;
    for (idx, raw) in content.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
            let name = name.trim();
            if name != BASIC_GROUP && Level::from_name(name).is_none() {
                return Err((line_no, format!("Unknown group: [{name}]")));
            }
            group = Some(name.to_string());
            continue;
        }
        let Some(current) = group.as_deref() else {
            return Err((line_no, format!("Invalid line outside of a group: {line}")));
        };
        let Some((key, value)) = line.split_once('=') else {
            return Err((line_no, format!("Invalid line: {line}")));
        };
        let key = key.trim();
        let value = decode_spaces(value.trim());
        if key.is_empty() || value.is_empty() {
            return Err((
                line_no,
                format!("Group [{current}]: invalid key-value: {key}={value}"),
            ));
        }
        apply_key(&mut config, current, key, &value).map_err(|msg| (line_no, msg))?;
    }
    Ok(config)
}

fn apply_key(
    config: &mut Config,
    group: &str,
    key: &str,
    value: &str,
) -> std::result::Result<(), String> {
    let invalid = || format!("Group [{group}]: invalid key-value: {key}={value}");

    if let Some(level) = Level::from_name(group) {
        let rule = config.levels.rule_mut(level);
        return match key {
            "text" => rule.set_marker(value),
            "color" => {
                rule.color = value.parse()?;
                Ok(())
            }
            _ => Err(invalid()),
        };
    }

    match key {
        "detect_interval" => {
            let ms = value.strip_suffix("ms").unwrap_or(value).trim();
            config.poll_interval_ms = ms.parse().map_err(|_| invalid())?;
        }
        "lines_of_last" => {
            config.tail_line_count = value.parse().map_err(|_| invalid())?;
        }
        "line_max_length" => {
            let len: usize = value.parse().map_err(|_| invalid())?;
            if len == 0 || len > MAX_LINE_LEN {
                return Err(format!(
                    "Group [{group}]: line_max_length must be in 1..={MAX_LINE_LEN}, got {len}"
                ));
            }
            config.max_line_length = len;
        }
        "highlight_line" => {
            config.highlight_whole_line = parse_bool(value).ok_or_else(invalid)?;
        }
        "show_line_number" => {
            config.show_line_number = parse_bool(value).ok_or_else(invalid)?;
        }
        "line_number_color" => {
            config.line_number_color = value.parse()?;
        }
        _ => return Err(invalid()),
    }
    Ok(())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

fn decode_spaces(value: &str) -> String {
    value.replace("<space>", " ")
}

/// Spaces at the edges would be trimmed away on load, so write them as `<space>`.
fn encode_spaces(value: &str) -> String {
    let trimmed = value.trim_matches(' ');
    let lead = value.len() - value.trim_start_matches(' ').len();
    if trimmed.is_empty() {
        return "<space>".repeat(value.len());
    }
    let trail = value.len() - value.trim_end_matches(' ').len();
    format!("{}{}{}", "<space>".repeat(lead), trimmed, "<space>".repeat(trail))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write as _;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_config() {
        let text = "\
# logview config
[basic]
detect_interval=250ms
lines_of_last = 5
line_max_length=120
highlight_line=1
show_line_number=true
line_number_color=1,2,3

[error]
text=<space>E<space>
color=10,20,30
";
        let config = parse_config(text, Config::default()).unwrap();
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.tail_line_count, 5);
        assert_eq!(config.max_line_length, 120);
        assert!(config.highlight_whole_line);
        assert!(config.show_line_number);
        assert_eq!(config.line_number_color, Rgb::new(1, 2, 3));
        let rule = config.levels.rule(Level::Error);
        assert_eq!(rule.marker(), " E ");
        assert_eq!(rule.color, Rgb::new(10, 20, 30));
        assert_eq!(config.levels.rule(Level::Info).marker(), "[info]");
    }

    #[test]
    fn test_false_values() {
        let base = Config {
            highlight_whole_line: true,
            show_line_number: true,
            ..Config::default()
        };
        let text = "[basic]\nhighlight_line=false\nshow_line_number=0\n";
        let config = parse_config(text, base).unwrap();
        assert!(!config.highlight_whole_line);
        assert!(!config.show_line_number);
    }

    #[test]
    fn test_rejections_report_line() {
        let cases = [
            ("[basic]\nhighlight_line=yes\n", 2),
            ("[basic]\n\nline_number_color=300,0,0\n", 3),
            ("[basic]\nunknown=1\n", 2),
            ("[info]\ntext=\n", 2),
            ("[info]\nnot a pair\n", 2),
            ("[nope]\n", 1),
            ("text=[x]\n", 1),
            ("[basic]\nline_max_length=0\n", 2),
            ("[basic]\nline_max_length=999999\n", 2),
            ("[basic]\nlines_of_last=-3\n", 2),
        ];
        for (text, line) in cases {
            let err = parse_config(text, Config::default()).unwrap_err();
            assert_eq!(err.0, line, "{text:?} -> {}", err.1);
        }
    }

    #[test]
    fn test_default_config_roundtrips_through_parser() {
        let mut config = Config::default();
        config.levels.rule_mut(Level::Trace).set_marker(" T").unwrap();
        let parsed = parse_config(&config.to_config_string(), Config::default()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_load_config_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"[basic]\nlines_of_last=3\n").unwrap();
        file.flush().unwrap();
        let config = load_config(file.path(), Config::default()).unwrap();
        assert_eq!(config.tail_line_count, 3);

        file.write_all(b"bogus\n").unwrap();
        file.flush().unwrap();
        match load_config(file.path(), Config::default()) {
            Err(LogviewError::ConfigValidation { line, .. }) => assert_eq!(line, 3),
            other => panic!("Expected ConfigValidation, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_config_file() {
        let path = Path::new("/this/config/does/not/exist.conf");
        let result = load_config(path, Config::default());
        assert!(matches!(result, Err(LogviewError::ConfigRead { .. })));
    }

    #[test]
    fn test_validate_line_length() {
        let config = Config {
            max_line_length: MAX_LINE_LEN + 1,
            ..Config::default()
        };
        assert!(config.validate().is_err());
        assert!(Config::default().validate().is_ok());
    }
}
