use super::ids::{SessionId, ToolUseId};
use super::usage::{TranscriptUsage, UsageRecord};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::path::{Path, PathBuf};

// Input structure
#[derive(Debug, Default, Deserialize)]
pub struct StatuslineHookJson {
    #[serde(default)]
    pub session_id: Option<SessionId>,
    #[serde(default)]
    pub cwd: String,
    #[serde(default)]
    pub transcript_path: Option<PathBuf>,
    #[serde(default)]
    pub model: Option<Model>,
    #[serde(default)]
    pub context_window: Option<ContextWindow>,
}

impl StatuslineHookJson {
    /// Session id, treating an empty string as absent
    pub fn session_id(&self) -> Option<&SessionId> {
        self.session_id.as_ref().filter(|id| !id.is_empty())
    }

    /// Usage delivered directly in the snapshot, if the host sent one
    pub fn embedded_usage(&self) -> Option<&UsageRecord> {
        self.context_window.as_ref()?.current_usage.as_ref()
    }

    pub fn transcript_path(&self) -> Option<&Path> {
        self.transcript_path
            .as_deref()
            .filter(|path| !path.as_os_str().is_empty())
    }

    pub fn model_name(&self) -> &str {
        self.model
            .as_ref()
            .map(|m| m.display_name.as_str())
            .unwrap_or("")
    }
}

#[derive(Debug, Deserialize)]
pub struct Model {
    #[serde(alias = "_id")]
    #[allow(dead_code)]
    pub id: Option<String>,
    #[serde(default)]
    pub display_name: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ContextWindow {
    #[serde(default)]
    pub total_input_tokens: u64,
    #[serde(default)]
    pub total_output_tokens: u64,
    #[serde(default)]
    pub context_window_size: Option<u64>,
    #[serde(default)]
    pub current_usage: Option<UsageRecord>,
    #[serde(default)]
    pub used_percentage: Option<f64>,
    #[serde(default)]
    pub remaining_percentage: Option<f64>,
}

// Transcript record structure for parsing JSONL
#[derive(Debug, Deserialize)]
pub struct TranscriptRecord {
    #[serde(rename = "type", default)]
    pub record_type: String,
    #[serde(default, deserialize_with = "lenient_string")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub message: Option<TranscriptMessage>,
}

impl TranscriptRecord {
    pub fn is_assistant(&self) -> bool {
        self.record_type == "assistant"
    }

    pub fn usage(&self) -> Option<&TranscriptUsage> {
        self.message.as_ref()?.usage.as_ref()
    }

    /// Content blocks that parse as a known shape; anything else is dropped
    pub fn content_blocks(&self) -> impl Iterator<Item = ContentBlock> + '_ {
        self.message
            .iter()
            .flat_map(|message| message.content.iter())
            .filter_map(|block| ContentBlock::deserialize(block).ok())
    }
}

#[derive(Debug, Deserialize)]
pub struct TranscriptMessage {
    #[serde(default)]
    pub usage: Option<TranscriptUsage>,
    #[serde(default, deserialize_with = "content_array")]
    pub content: Vec<Value>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    ToolUse {
        #[serde(default)]
        id: Option<ToolUseId>,
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        input: Value,
    },
    ToolResult {
        #[serde(default)]
        tool_use_id: Option<ToolUseId>,
        #[serde(default)]
        is_error: Option<bool>,
    },
    #[serde(other)]
    Other,
}

// Non-string values (e.g. epoch numbers) count as absent
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

// Plain string content carries no blocks
fn content_array<'de, D>(deserializer: D) -> Result<Vec<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(blocks) => Ok(blocks),
        _ => Ok(Vec::new()),
    }
}
