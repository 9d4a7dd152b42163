//! Output formatting utilities

use colored::*;
use ginger_deploy::{DeployReport, DeployStatus};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;
use tabled::{Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table format
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Print a vector of items in the specified format
pub fn print_output<T: Serialize + Tabled>(data: Vec<T>, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if data.is_empty() {
                println!("{}", "No results".dimmed());
            } else {
                let table = Table::new(data).to_string();
                println!("{}", table);
            }
        }
        OutputFormat::Json => print_json(&data),
    }
}

fn print_json<T: Serialize + ?Sized>(data: &T) {
    match serde_json::to_string_pretty(data) {
        Ok(json) => println!("{}", json),
        Err(e) => print_error(&format!("Failed to encode output: {}", e)),
    }
}

/// Table row for one entity outcome
#[derive(Debug, Serialize, Tabled)]
struct OutcomeRow {
    phase: String,
    kind: String,
    name: String,
    status: String,
    detail: String,
}

/// Print every entity outcome and a one-line summary
pub fn print_report(report: &DeployReport, format: OutputFormat) {
    if let OutputFormat::Json = format {
        print_json(report);
        return;
    }

    let rows: Vec<OutcomeRow> = report
        .phases
        .iter()
        .flat_map(|phase| {
            phase.entities.iter().map(move |e| OutcomeRow {
                phase: phase.phase.to_string(),
                kind: e.kind.to_string(),
                name: e.name.clone(),
                status: e.outcome.label().to_string(),
                detail: e.outcome.reason().unwrap_or_default().to_string(),
            })
        })
        .collect();
    if !rows.is_empty() {
        println!("{}", Table::new(rows));
    }

    let failed = report.entities().filter(|e| e.outcome.is_failure()).count();
    match report.status() {
        DeployStatus::Success => print_success("Deploy complete"),
        DeployStatus::PartialSuccess => print_warning(&format!(
            "Deploy finished with {} failed entit{}",
            failed,
            if failed == 1 { "y" } else { "ies" }
        )),
        DeployStatus::Failed => {
            if let Some((phase, reason)) = &report.aborted {
                print_error(&format!("Deploy aborted in {} phase: {}", phase, reason));
            }
        }
    }
}

/// Spinner shown while a long-running phase is in flight
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

/// Ask a yes/no question, defaulting to no
pub fn confirm(prompt: &str) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

/// Confirmation seam backed by an interactive prompt
pub struct PromptConfirm;

impl ginger_deploy::Confirmation for PromptConfirm {
    fn confirm(&self, prompt: &str) -> bool {
        confirm(prompt)
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn print_warning(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_format_default() {
        let format = OutputFormat::default();
        assert!(matches!(format, OutputFormat::Table));
    }
}
