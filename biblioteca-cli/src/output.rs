//! Terminal output helpers.

use crate::error::CliError;
use biblioteca::client::ClientError;
use biblioteca::{AdminApp, Alert, AlertKind};
use colored::Colorize;

pub fn print_mini_banner() {
    println!(
        "\n  {} {} {}\n",
        "📚".bright_yellow(),
        "Biblioteca Admin".bright_white().bold(),
        format!("v{}", env!("CARGO_PKG_VERSION")).dimmed()
    );
}

pub fn info(msg: &str) {
    println!("  {} {}", "→".cyan(), msg);
}

pub fn warn(msg: &str) {
    println!("  {} {}", "⚠".yellow().bold(), msg.yellow());
}

pub fn alert(alert: &Alert) {
    match alert.kind() {
        AlertKind::Success => println!("  {} {}", "✓".green().bold(), alert.message().green()),
        AlertKind::Error => println!("  {} {}", "✗".red().bold(), alert.message().red()),
    }
}

/// Show a success alert and print it.
pub fn succeeded(app: &AdminApp, message: &str) {
    alert(&app.alerts().success(message));
}

/// Turn a failed call into an error alert.
pub fn failed(app: &AdminApp, error: ClientError, fallback: &str) -> CliError {
    let alert = app.alerts().report(&error, fallback);
    CliError::Api(alert.message().to_string())
}

/// Print rows under a header, padding each column to its widest cell.
pub fn table(headers: &[&str], rows: &[Vec<String>]) {
    if rows.is_empty() {
        println!("  {}", "(none)".dimmed());
        return;
    }

    let widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .map(|r| r.get(i).map_or(0, |c| c.chars().count()))
                .max()
                .unwrap_or(0)
                .max(h.chars().count())
        })
        .collect();

    let header = headers
        .iter()
        .zip(&widths)
        .map(|(h, w)| format!("{h:<w$}"))
        .collect::<Vec<_>>()
        .join("  ");
    println!("  {}", header.bright_white().bold());

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(c, w)| format!("{c:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("  {}", line);
    }
}

pub fn field(label: &str, value: impl std::fmt::Display) {
    println!("  {} {}", format!("{label}:").bright_white().bold(), value);
}
