//! Theme: rgb colours, the six level groups and their marker table.

use std::fmt;
use std::str::FromStr;

use crossterm::style::Color;

/// 24-bit foreground colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn to_crossterm(self) -> Color {
        Color::Rgb {
            r: self.r,
            g: self.g,
            b: self.b,
        }
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{}", self.r, self.g, self.b)
    }
}

impl FromStr for Rgb {
    type Err = String;

    /// Parses `r,g,b` where every channel is an integer in [0,255].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || format!("Invalid color: {s}");
        let channels: Vec<&str> = s.split(',').map(str::trim).collect();
        let [r, g, b] = channels[..] else {
            return Err(invalid());
        };
        let channel = |v: &str| v.parse::<u8>().map_err(|_| invalid());
        Ok(Rgb::new(channel(r)?, channel(g)?, channel(b)?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl Level {
    /// Group name, also the config file section.
    pub fn name(self) -> &'static str {
        match self {
            Level::Trace => "trace",
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Critical => "critical",
        }
    }

    pub fn default_color(self) -> Rgb {
        match self {
            Level::Trace => Rgb::new(80, 220, 44),
            Level::Debug => Rgb::new(90, 220, 200),
            Level::Info => Rgb::new(50, 150, 240),
            Level::Warning => Rgb::new(220, 240, 25),
            Level::Error => Rgb::new(233, 20, 20),
            Level::Critical => Rgb::new(240, 20, 200),
        }
    }

    pub fn default_marker(self) -> String {
        format!("[{}]", self.name())
    }

    /// All groups in match priority order.
    pub fn all() -> &'static [Level; 6] {
        &[
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warning,
            Level::Error,
            Level::Critical,
        ]
    }

    pub fn from_name(name: &str) -> Option<Level> {
        Level::all().iter().copied().find(|l| l.name() == name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelRule {
    pub level: Level,
    marker: String,
    pub color: Rgb,
}

impl LevelRule {
    pub fn group_name(&self) -> &'static str {
        self.level.name()
    }

    pub fn marker(&self) -> &str {
        &self.marker
    }

    /// Replaces the marker text. Empty markers are refused.
    pub fn set_marker(&mut self, marker: impl Into<String>) -> Result<(), String> {
        let marker = marker.into();
        if marker.is_empty() {
            return Err(format!("Group [{}]: marker text is empty", self.group_name()));
        }
        self.marker = marker;
        Ok(())
    }
}

/// The six level rules, always in `Level::all()` order.
///
/// Groups can neither be added nor removed; only marker and colour change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelTable {
    rules: [LevelRule; 6],
}

impl Default for LevelTable {
    fn default() -> Self {
        let levels = *Level::all();
        Self {
            rules: levels.map(|level| LevelRule {
                level,
                marker: level.default_marker(),
                color: level.default_color(),
            }),
        }
    }
}

impl LevelTable {
    pub fn rules(&self) -> &[LevelRule; 6] {
        &self.rules
    }

    pub fn rule(&self, level: Level) -> &LevelRule {
        &self.rules[level as usize]
    }

    pub fn rule_mut(&mut self, level: Level) -> &mut LevelRule {
        &mut self.rules[level as usize]
    }

    /// First rule (in table order) whose marker occurs in `line`, with the
    /// byte offset of the marker's first occurrence.
    pub fn find_match(&self, line: &str) -> Option<(&LevelRule, usize)> {
        self.rules()
            .iter()
            .find_map(|rule| line.find(rule.marker()).map(|pos| (rule, pos)))
    }
}
