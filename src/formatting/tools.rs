use super::{format_elapsed, short_target};
use crate::types::{ToolEntry, ToolStatus};
use chrono::{DateTime, Utc};
use colored::Colorize;

const MAX_RUNNING_SHOWN: usize = 2;
const MAX_COMPLETED_SHOWN: usize = 3;

fn is_path_tool(name: &str) -> bool {
    matches!(
        name,
        "Read" | "Write" | "Edit" | "MultiEdit" | "NotebookEdit" | "NotebookRead"
    )
}

fn running_label(tool: &ToolEntry, now: DateTime<Utc>) -> String {
    let elapsed = format_elapsed(tool.elapsed(now));
    match tool.target.as_deref() {
        Some(target) if is_path_tool(&tool.name) => {
            format!("◐ {}: {} ({})", tool.name, short_target(target), elapsed)
        }
        Some(target) => format!("◐ {}: {} ({})", tool.name, target, elapsed),
        None => format!("◐ {} ({})", tool.name, elapsed),
    }
}

/// Render the active-operations segment: newest running tools first, then
/// finished tools counted by name, then the error count
pub fn render_tools(tools: &[ToolEntry], now: DateTime<Utc>) -> String {
    let mut parts = Vec::new();

    parts.extend(
        tools
            .iter()
            .rev()
            .filter(|t| t.status == ToolStatus::Running)
            .take(MAX_RUNNING_SHOWN)
            .map(|t| running_label(t, now).yellow().to_string()),
    );

    // Counted in first-seen order so ties keep a stable position
    let mut completed: Vec<(&str, usize)> = Vec::new();
    for tool in tools.iter().filter(|t| t.status == ToolStatus::Completed) {
        match completed.iter_mut().find(|(name, _)| *name == tool.name) {
            Some((_, count)) => *count += 1,
            None => completed.push((tool.name.as_str(), 1)),
        }
    }
    completed.sort_by(|a, b| b.1.cmp(&a.1));
    parts.extend(
        completed
            .into_iter()
            .take(MAX_COMPLETED_SHOWN)
            .map(|(name, count)| format!("✓ {} ×{}", name, count).green().to_string()),
    );

    let errors = tools
        .iter()
        .filter(|t| t.status == ToolStatus::Error)
        .count();
    if errors > 0 {
        parts.push(format!("✗ {}", errors).red().to_string());
    }

    parts.join(" ")
}
