//! Colored table rendering for `requests` and `replay` (`spec.md` §6).

use colored::Colorize;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct RequestSummary {
    pub id: String,
    pub method: String,
    pub path: String,
    pub timestamp: String,
    pub status_code: Option<u16>,
}

#[derive(Debug, Deserialize)]
pub struct ReplayResult {
    pub request_id: String,
    pub status_code: u16,
    #[serde(default)]
    pub headers: std::collections::HashMap<String, String>,
    pub body_length: usize,
}

fn colorize_status(status: u16) -> colored::ColoredString {
    let text = status.to_string();
    match status {
        200..=299 => text.green(),
        300..=399 => text.cyan(),
        400..=499 => text.yellow(),
        _ => text.red(),
    }
}

pub fn print_requests_table(summaries: &[RequestSummary]) {
    if summaries.is_empty() {
        println!("{}", "no requests recorded".dimmed());
        return;
    }

    println!(
        "{:<10} {:<8} {:<30} {:<24} {:<6}",
        "ID".bold(),
        "METHOD".bold(),
        "PATH".bold(),
        "TIMESTAMP".bold(),
        "STATUS".bold(),
    );
    for summary in summaries {
        let status = match summary.status_code {
            Some(code) => colorize_status(code).to_string(),
            None => "pending".dimmed().to_string(),
        };
        println!(
            "{:<10} {:<8} {:<30} {:<24} {:<6}",
            summary.id, summary.method, summary.path, summary.timestamp, status,
        );
    }
}

pub fn print_replay_result(result: &ReplayResult) {
    println!(
        "replayed as {} -> {} ({} bytes)",
        result.request_id.bold(),
        colorize_status(result.status_code),
        result.body_length,
    );
    for (name, value) in &result.headers {
        println!("  {}: {value}", name.dimmed());
    }
}
