//! Terminal and JSON output for the CLI.

use std::time::Duration;

use console::{style, StyledObject};
use indicatif::{ProgressBar, ProgressStyle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Human { verbose: bool },
    Json,
}

/// Where command output goes.
///
/// In JSON mode human-readable lines are suppressed and only `json` and
/// `error` print, so stdout stays machine-parseable.
#[derive(Debug, Clone)]
pub struct Output {
    mode: Mode,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        let mode = if json { Mode::Json } else { Mode::Human { verbose } };
        Self { mode }
    }

    pub fn is_json(&self) -> bool {
        self.mode == Mode::Json
    }

    fn line(&self, marker: StyledObject<&str>, msg: impl std::fmt::Display) {
        if !self.is_json() {
            println!("{marker} {msg}");
        }
    }

    fn err_line(&self, marker: StyledObject<&str>, msg: impl std::fmt::Display) {
        if !self.is_json() {
            eprintln!("{marker} {msg}");
        }
    }

    pub fn info(&self, msg: &str) {
        self.line(style("ℹ").blue(), msg);
    }

    pub fn success(&self, msg: &str) {
        self.line(style("✓").green(), msg);
    }

    pub fn warn(&self, msg: &str) {
        self.err_line(style("⚠").yellow(), msg);
    }

    /// Errors print in both modes.
    pub fn error(&self, msg: &str) {
        match self.mode {
            Mode::Json => eprintln!("{}", serde_json::json!({ "error": msg })),
            Mode::Human { .. } => eprintln!("{} {}", style("✗").red(), style(msg).red()),
        }
    }

    /// Only shown with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if let Mode::Human { verbose: true } = self.mode {
            eprintln!("{} {}", style("→").dim(), style(msg).dim());
        }
    }

    pub fn header(&self, msg: &str) {
        if !self.is_json() {
            println!("\n{}", style(msg).bold().underlined());
        }
    }

    /// `[n/total] msg`
    pub fn step(&self, num: usize, total: usize, msg: &str) {
        if !self.is_json() {
            println!("{} {msg}", style(format!("[{num}/{total}]")).dim());
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if !self.is_json() {
            println!("  {}: {value}", style(key).dim());
        }
    }

    pub fn list_item(&self, item: &str) {
        if !self.is_json() {
            println!("  {} {item}", style("•").dim());
        }
    }

    /// Left-aligned columns padded to `widths`.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.is_json() {
            return;
        }
        let row = cols
            .iter()
            .zip(widths)
            .map(|(col, width)| format!("{col:width$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {row}");
    }

    /// Pretty JSON on stdout, regardless of mode.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(json) => println!("{json}"),
            Err(e) => self.error(&format!("failed to serialize output: {e}")),
        }
    }

    /// Spinner for a step of unknown length; hidden in JSON mode.
    pub fn spinner(&self, msg: &str) -> ProgressBar {
        if self.is_json() {
            return ProgressBar::hidden();
        }
        let style = ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner());
        let spinner = ProgressBar::new_spinner().with_style(style);
        spinner.set_message(msg.to_string());
        spinner.enable_steady_tick(Duration::from_millis(100));
        spinner
    }
}

/// Colour a forward reason: green when the store now answers, red when
/// something went wrong, dim for pass-through.
pub fn reason_badge(reason: &str) -> String {
    match reason {
        "rendered" | "stored" => style(reason).green().to_string(),
        "static_asset" | "no_match" => style(reason).dim().to_string(),
        "render_failed" | "store_unavailable" | "manifest_unavailable" => {
            style(reason).red().to_string()
        }
        _ => reason.to_string(),
    }
}

/// Human-readable byte count (`1.50 KB`).
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 3] = ["KB", "MB", "GB"];

    if bytes < 1024 {
        return format!("{bytes} B");
    }
    let mut value = bytes as f64 / 1024.0;
    let mut unit = 0;
    while value >= 1024.0 && unit + 1 < UNITS.len() {
        value /= 1024.0;
        unit += 1;
    }
    format!("{value:.2} {}", UNITS[unit])
}
