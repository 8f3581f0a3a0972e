//! Line rendering: level colouring and the optional line-number prefix.

use std::fmt::Write;

use crossterm::style::{ResetColor, SetForegroundColor};

use crate::config::Config;
use crate::theme::{LevelTable, Rgb};

fn trim_line_end(line: &str) -> &str {
    line.trim_end_matches(['\n', '\r'])
}

fn push_colored(out: &mut String, text: &str, color: Rgb) {
    let _ = write!(
        out,
        "{}{}{}",
        SetForegroundColor(color.to_crossterm()),
        text,
        ResetColor
    );
}

/// Colour one line by the first level rule whose marker it contains.
///
/// In whole-line mode the full line is wrapped, otherwise only the first
/// occurrence of the marker. Lines without a marker come back unchanged
/// apart from the trimmed line ending.
pub fn render(line: &str, levels: &LevelTable, highlight_whole_line: bool) -> String {
    let line = trim_line_end(line);
    let Some((rule, start)) = levels.find_match(line) else {
        return line.to_string();
    };
    let mut out = String::with_capacity(line.len() + 32);
    if highlight_whole_line {
        push_colored(&mut out, line, rule.color);
    } else {
        let end = start + rule.marker().len();
        out.push_str(&line[..start]);
        push_colored(&mut out, &line[start..end], rule.color);
        out.push_str(&line[end..]);
    }
    out
}

/// Full output line: optional coloured line number, a space, then content.
pub fn render_numbered(line: &str, line_number: u64, config: &Config) -> String {
    let body = render(line, &config.levels, config.highlight_whole_line);
    if !config.show_line_number {
        return body;
    }
    let mut out = String::with_capacity(body.len() + 32);
    push_colored(&mut out, &line_number.to_string(), config.line_number_color);
    out.push(' ');
    out.push_str(&body);
    out
}
