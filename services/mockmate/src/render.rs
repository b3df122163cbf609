//! Plain-text rendering for the terminal.

use mockmate_core::history::summarize;
use mockmate_core::{FeedbackReport, HistoryRecord, Message, Role, SessionError};
use std::error::Error;
use std::fmt::Write;

pub fn message(message: &Message) -> String {
    let speaker = match message.role {
        Role::Assistant => "Interviewer",
        Role::User => "You",
    };
    format!("{speaker}: {}", message.content)
}

/// The whole conversation. Answers that never got a reply are flagged.
pub fn transcript(messages: &[Message], failed_turns: &[usize]) -> String {
    let mut out = String::new();
    for (index, m) in messages.iter().enumerate() {
        let _ = write!(out, "{:>3}  {}", index, message(m));
        if failed_turns.contains(&index) {
            out.push_str("  [no reply]");
        }
        out.push('\n');
    }
    out
}

pub fn report(report: &FeedbackReport) -> String {
    let mut out = format!(
        "Score: {}/100 ({})\nVerdict: {}\n",
        report.score,
        report.band(),
        if report.verdict.is_empty() { "n/a" } else { report.verdict.as_str() }
    );
    if !report.summary.is_empty() {
        let _ = writeln!(out, "\n{}", report.summary);
    }
    if !report.category_scores.is_empty() {
        out.push_str("\nCategories:\n");
        for (name, score) in &report.category_scores {
            let _ = writeln!(out, "  {name:<24} {score:>4.1}/10");
        }
    }
    for (title, items) in [("Strengths", &report.strengths), ("To improve", &report.weaknesses)] {
        if items.is_empty() {
            continue;
        }
        let _ = writeln!(out, "\n{title}:");
        for item in items {
            let _ = writeln!(out, "  - {item}");
        }
    }
    out
}

pub fn history(records: &[HistoryRecord]) -> String {
    if records.is_empty() {
        return "No past interviews.".to_string();
    }
    records.iter().map(summarize).collect::<Vec<_>>().join("\n")
}

/// The error and its causes on one line.
pub fn error(err: &SessionError) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let _ = write!(out, ": {cause}");
        source = cause.source();
    }
    out
}
