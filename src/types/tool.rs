use super::ids::ToolUseId;
use crate::constants::MAX_COMMAND_TARGET_CHARS;
use chrono::{DateTime, Utc};
use serde_json::Value;

/// Lifecycle state of a tool invocation. `Completed` and `Error` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolStatus {
    Running,
    Completed,
    Error,
}

impl ToolStatus {
    #[inline]
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ToolStatus::Running)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolEntry {
    pub id: ToolUseId,
    pub name: String,
    pub target: Option<String>,
    pub status: ToolStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
}

impl ToolEntry {
    /// Start tracking a freshly seen invocation
    pub fn running(id: ToolUseId, name: String, input: &Value, start_time: DateTime<Utc>) -> Self {
        let target = extract_target(&name, input);
        Self {
            id,
            name,
            target,
            status: ToolStatus::Running,
            start_time,
            end_time: None,
        }
    }

    /// Apply a tool result. Returns false when the entry had already finished.
    pub fn finish(&mut self, failed: bool, end_time: DateTime<Utc>) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = if failed {
            ToolStatus::Error
        } else {
            ToolStatus::Completed
        };
        self.end_time = Some(end_time);
        true
    }

    /// Time spent so far, or in total once finished
    pub fn elapsed(&self, now: DateTime<Utc>) -> chrono::Duration {
        self.end_time
            .unwrap_or(now)
            .signed_duration_since(self.start_time)
    }
}

/// Pull a short human-readable target out of a tool's parameters
pub fn extract_target(name: &str, input: &Value) -> Option<String> {
    let field = |key: &str| input.get(key).and_then(Value::as_str).map(str::to_string);

    match name {
        "Read" | "Write" | "Edit" | "MultiEdit" => field("file_path"),
        "NotebookEdit" | "NotebookRead" => field("notebook_path"),
        "Glob" | "Grep" => field("pattern"),
        "Bash" => field("command").map(|cmd| truncate_command(&cmd)),
        "WebFetch" => field("url"),
        "WebSearch" => field("query"),
        "Task" => field("description"),
        _ => None,
    }
}

fn truncate_command(command: &str) -> String {
    let command = command.trim();
    if command.chars().count() <= MAX_COMMAND_TARGET_CHARS {
        return command.to_string();
    }
    let head: String = command.chars().take(MAX_COMMAND_TARGET_CHARS).collect();
    format!("{}...", head)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_extract_target_known_tools() {
        assert_eq!(
            extract_target("Read", &json!({"file_path": "/src/lib.rs"})),
            Some("/src/lib.rs".to_string())
        );
        assert_eq!(
            extract_target("Grep", &json!({"pattern": "fn main", "path": "src"})),
            Some("fn main".to_string())
        );
        assert_eq!(
            extract_target("NotebookEdit", &json!({"notebook_path": "a.ipynb"})),
            Some("a.ipynb".to_string())
        );
        assert_eq!(
            extract_target("Task", &json!({"description": "explore repo"})),
            Some("explore repo".to_string())
        );
    }

    #[test]
    fn test_extract_target_truncates_bash() {
        let long = "cargo test --workspace --all-features -- --nocapture";
        let target = extract_target("Bash", &json!({ "command": long })).unwrap();
        assert_eq!(target, "cargo test --workspace --all-f...");

        assert_eq!(
            extract_target("Bash", &json!({"command": "ls -la"})),
            Some("ls -la".to_string())
        );
    }

    #[test]
    fn test_extract_target_unknown_or_missing() {
        assert_eq!(extract_target("TodoWrite", &json!({"todos": []})), None);
        assert_eq!(extract_target("Read", &json!({})), None);
        assert_eq!(extract_target("Read", &Value::Null), None);
        assert_eq!(extract_target("Read", &json!({"file_path": 7})), None);
    }

    #[test]
    fn test_finish_is_terminal() {
        let start = Utc::now();
        let mut entry = ToolEntry::running("t1".into(), "Bash".into(), &Value::Null, start);
        assert_eq!(entry.status, ToolStatus::Running);
        assert!(entry.end_time.is_none());

        let end = start + chrono::Duration::seconds(3);
        assert!(entry.finish(true, end));
        assert_eq!(entry.status, ToolStatus::Error);
        assert_eq!(entry.end_time, Some(end));
        assert_eq!(entry.elapsed(end + chrono::Duration::seconds(60)).num_seconds(), 3);

        assert!(!entry.finish(false, end + chrono::Duration::seconds(5)));
        assert_eq!(entry.status, ToolStatus::Error);
        assert_eq!(entry.end_time, Some(end));
    }
}
