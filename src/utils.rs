//! Terminal output helpers.

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Print an error message and exit.
pub fn error_exit(message: &str, code: i32) -> ! {
    eprintln!("{} {}", "Error:".red().bold(), message);
    std::process::exit(code);
}

/// Print a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an informational message.
pub fn info(message: &str) {
    println!("{} {}", "Info:".cyan(), message);
}

/// Print a warning message.
pub fn warning(message: &str) {
    println!("{} {}", "Warning:".yellow(), message);
}

/// Run `f` while a spinner with `message` is drawn on stderr.
///
/// The spinner hides itself when stderr is not a terminal.
pub fn with_spinner<T>(message: &str, f: impl FnOnce() -> T) -> T {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(80));

    let result = f();

    spinner.finish_and_clear();
    result
}

/// Frame `lines` in a box with an optional title centred in the top border.
pub fn format_box(title: Option<&str>, lines: &[String], padding: usize) -> Vec<String> {
    let content_width = lines
        .iter()
        .map(|l| l.chars().count())
        .chain(title.map(|t| t.chars().count() + 2))
        .max()
        .unwrap_or(0);
    let inner = content_width + padding * 2;

    let top = match title {
        Some(t) => {
            let label = format!(" {t} ");
            let fill = inner - label.chars().count();
            let left = fill / 2;
            format!("┌{}{}{}┐", "─".repeat(left), label, "─".repeat(fill - left))
        }
        None => format!("┌{}┐", "─".repeat(inner)),
    };

    let mut boxed = Vec::with_capacity(lines.len() + 2);
    boxed.push(top);
    for line in lines {
        let pad_right = content_width - line.chars().count() + padding;
        boxed.push(format!(
            "│{}{}{}│",
            " ".repeat(padding),
            line,
            " ".repeat(pad_right)
        ));
    }
    boxed.push(format!("└{}┘", "─".repeat(inner)));
    boxed
}

/// Print a cyan box around `lines`.
pub fn print_box(title: Option<&str>, lines: &[String]) {
    for line in format_box(title, lines, 2) {
        println!("{}", line.cyan());
    }
}
