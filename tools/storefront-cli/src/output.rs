//! Terminal output for the CLI.
//!
//! In `--json` mode only machine-readable documents reach stdout; the
//! decorated lines below are suppressed.

use chrono::{Local, TimeZone};
use console::{style, StyledObject};

#[derive(Clone)]
pub struct Output {
    verbose: bool,
    json: bool,
}

impl Output {
    pub fn new(verbose: bool, json: bool) -> Self {
        Self { verbose, json }
    }

    fn out(&self, icon: StyledObject<&str>, msg: &str) {
        if !self.json {
            println!("{} {}", icon, msg);
        }
    }

    fn err(&self, icon: StyledObject<&str>, msg: &str) {
        if !self.json {
            eprintln!("{} {}", icon, msg);
        }
    }

    pub fn info(&self, msg: &str) {
        self.out(style("ℹ").blue(), msg);
    }

    pub fn success(&self, msg: &str) {
        self.out(style("✓").green(), msg);
    }

    pub fn warn(&self, msg: &str) {
        self.err(style("⚠").yellow(), msg);
    }

    /// Errors are printed in JSON mode too, as `{"error": ".."}` on stderr.
    pub fn error(&self, msg: &str) {
        if self.json {
            eprintln!("{}", serde_json::json!({ "error": msg }));
        } else {
            eprintln!("{} {}", style("✗").red(), style(msg).red());
        }
    }

    /// Only shown with `--verbose`.
    pub fn debug(&self, msg: &str) {
        if self.verbose {
            self.err(style("→").dim(), &style(msg).dim().to_string());
        }
    }

    pub fn header(&self, title: &str) {
        if !self.json {
            println!("\n{}", style(title).bold().underlined());
        }
    }

    /// Pretty-printed JSON document on stdout.
    pub fn json<T: serde::Serialize>(&self, value: &T) {
        match serde_json::to_string_pretty(value) {
            Ok(doc) => println!("{}", doc),
            Err(e) => self.error(&format!("Failed to encode output: {}", e)),
        }
    }

    pub fn kv(&self, key: &str, value: &str) {
        if !self.json {
            println!("  {}: {}", style(key).dim(), value);
        }
    }

    pub fn list_item(&self, item: &str) {
        self.out(style("  •").dim(), item);
    }

    /// Columns padded to `widths`; extra columns are dropped.
    pub fn table_row(&self, cols: &[&str], widths: &[usize]) {
        if self.json {
            return;
        }
        let row = cols
            .iter()
            .zip(widths)
            .map(|(col, width)| format!("{:<width$}", col, width = *width))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", row.trim_end());
    }

    pub fn is_verbose(&self) -> bool {
        self.verbose
    }

    pub fn is_json(&self) -> bool {
        self.json
    }
}

/// Colored label for how a cart sync settled.
pub fn sync_badge(outcome: &str) -> String {
    let label = style(outcome);
    match outcome {
        "reconciled" => label.green(),
        "pending" => label.yellow(),
        "kept" => label.red(),
        "discarded" => label.dim(),
        _ => label,
    }
    .to_string()
}

/// Local wall-clock rendering of an epoch-milliseconds timestamp.
pub fn format_epoch_ms(ms: i64) -> String {
    match Local.timestamp_millis_opt(ms).single() {
        Some(time) => time.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => ms.to_string(),
    }
}

pub fn format_duration(secs: u64) -> String {
    match secs {
        0..=59 => format!("{}s", secs),
        60..=3599 => format!("{}m {}s", secs / 60, secs % 60),
        _ => format!("{}h {}m", secs / 3600, (secs % 3600) / 60),
    }
}

pub fn format_price(price: f64) -> String {
    format!("{:.2}", price)
}
