//! Progress display module
//!
//! Styled status lines, spinners and the run summary. Everything here goes
//! to stderr so stdout stays clean for the transformed wordlist.

use bytesize::ByteSize;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::{Duration, Instant};

/// Print the application banner
pub fn print_banner() {
    let banner = r#"
╔══════════════════════════════════════════════════════════════╗
║   wordlist-transform                                         ║
║   masks · rules · codecs · frequency pipelines               ║
╚══════════════════════════════════════════════════════════════╝
"#;

    eprintln!("{}", banner.green());
}

/// Print a section header
pub fn print_header(text: &str) {
    eprintln!("\n{} {}", "▶".green(), text.green().bold());
}

/// Print an info message
pub fn print_info(text: &str) {
    eprintln!("  {} {}", "ℹ".cyan(), text);
}

/// Print a success message
pub fn print_success(text: &str) {
    eprintln!("  {} {}", "✔".green(), text.green());
}

/// Print a warning message
pub fn print_warning(text: &str) {
    eprintln!("  {} {}", "⚠".yellow(), text.yellow());
}

/// Print an error message
pub fn print_error(text: &str) {
    eprintln!("  {} {}", "✖".red(), text.red());
}

/// Create a styled spinner for indeterminate progress
///
/// Returns a hidden bar when `quiet` is set.
pub fn create_spinner(msg: &str, quiet: bool) -> ProgressBar {
    if quiet {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new_spinner();

    // The template is a literal; fall back to the default style if it ever fails to parse
    let style = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠁⠂⠄⡀⢀⠠⠐⠈ ");
    pb.set_style(style);

    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));

    pb
}

/// Statistics for one pipeline run
#[derive(Debug)]
pub struct ProcessingStats {
    pub files: u64,
    pub bytes: u64,
    pub lines_read: u64,
    pub keys_in: usize,
    pub keys_out: usize,
    /// Key count after each transformation stage
    pub stages: Vec<(String, usize)>,
    pub start_time: Instant,
}

impl ProcessingStats {
    pub fn new() -> Self {
        Self {
            files: 0,
            bytes: 0,
            lines_read: 0,
            keys_in: 0,
            keys_out: 0,
            stages: Vec::new(),
            start_time: Instant::now(),
        }
    }

    pub fn add_file(&mut self, size: u64, lines: u64) {
        self.files += 1;
        self.bytes += size;
        self.lines_read += lines;
    }

    pub fn add_stage(&mut self, name: &str, keys: usize) {
        self.stages.push((name.to_string(), keys));
    }

    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    pub fn lines_per_second(&self) -> f64 {
        let elapsed = self.elapsed().as_secs_f64();
        if elapsed > 0.0 {
            self.lines_read as f64 / elapsed
        } else {
            0.0
        }
    }

    /// Print final statistics
    pub fn print_summary(&self) {
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
        eprintln!("{}", "                    PROCESSING COMPLETE".green().bold());
        eprintln!("{}", "═".repeat(60).green());
        eprintln!();

        eprintln!("  {} {}", "Files read:     ".green(), format_number(self.files));
        eprintln!("  {} {}", "Data read:      ".green(), ByteSize(self.bytes));
        eprintln!("  {} {}", "Lines read:     ".green(), format_number(self.lines_read));
        eprintln!("  {} {}", "Unique input:   ".green(), format_number(self.keys_in as u64));
        eprintln!();

        for (name, keys) in &self.stages {
            eprintln!("  {} {:<16} {}", "•".green(), name, format_number(*keys as u64));
        }
        if !self.stages.is_empty() {
            eprintln!();
        }

        eprintln!(
            "  {} {}",
            "Unique output:  ".green().bold(),
            format_number(self.keys_out as u64).green().bold()
        );
        eprintln!();
        eprintln!("  {} {}", "Duration:       ".green(), format_duration(self.elapsed()));
        eprintln!("  {} {:.2} lines/sec", "Throughput:     ".green(), self.lines_per_second());
        eprintln!();
        eprintln!("{}", "═".repeat(60).green());
    }
}

impl Default for ProcessingStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Format a number with thousand separators
pub fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::new();
    let chars: Vec<char> = s.chars().collect();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }

    result
}

/// Format duration as human-readable string
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();

    if secs < 60 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m", secs / 3600, (secs % 3600) / 60)
    }
}
