pub mod context_tokens;
pub mod ids;
pub mod input;
pub mod tool;
pub mod usage;

pub use context_tokens::ContextTokens;
pub use ids::{SessionId, ToolUseId};
pub use input::{
    ContentBlock, ContextWindow, Model, StatuslineHookJson, TranscriptMessage, TranscriptRecord,
};
pub use tool::{ToolEntry, ToolStatus, extract_target};
pub use usage::{CumulativeCache, TranscriptUsage, UsageRecord};
