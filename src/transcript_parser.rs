//! Tool lifecycle reconstruction from a session transcript.
//!
//! Invocation blocks open an entry in the `Running` state; a later result
//! block with the same id moves it to `Completed` or `Error`, both
//! terminal. Lines are replayed oldest first so every end follows its
//! start. Results whose invocation was never seen in this pass are dropped.

use crate::clock::{Clock, SystemClock};
use crate::constants::MAX_TRACKED_TOOLS;
use crate::types::{ContentBlock, ToolEntry, ToolUseId, TranscriptRecord};
use crate::utils::{parse_record, read_transcript, transcript_lines};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;

/// Entries in first-seen order with an id index
#[derive(Debug, Default)]
struct ToolLog {
    entries: Vec<ToolEntry>,
    index: HashMap<ToolUseId, usize>,
}

impl ToolLog {
    // A repeated invocation id replaces the entry but keeps its position
    fn start(&mut self, entry: ToolEntry) {
        match self.index.get(&entry.id) {
            Some(&slot) => self.entries[slot] = entry,
            None => {
                self.index.insert(entry.id.clone(), self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    fn finish(&mut self, id: &ToolUseId, failed: bool, at: DateTime<Utc>) {
        let Some(&slot) = self.index.get(id) else {
            tracing::trace!("tool result {} has no matching invocation", id);
            return;
        };
        if !self.entries[slot].finish(failed, at) {
            tracing::trace!("ignoring repeated result for tool {}", id);
        }
    }

    fn apply(&mut self, record: &TranscriptRecord, now: DateTime<Utc>) {
        let at = record
            .timestamp
            .as_deref()
            .and_then(|ts| ts.parse::<DateTime<Utc>>().ok())
            .unwrap_or(now);

        for block in record.content_blocks() {
            match block {
                ContentBlock::ToolUse {
                    id: Some(id),
                    name: Some(name),
                    input,
                } => self.start(ToolEntry::running(id, name, &input, at)),
                ContentBlock::ToolResult {
                    tool_use_id: Some(id),
                    is_error,
                } => self.finish(&id, is_error.unwrap_or(false), at),
                _ => {}
            }
        }
    }

    /// The newest `limit` entries, oldest first
    fn into_recent(self, limit: usize) -> Vec<ToolEntry> {
        let skip = self.entries.len().saturating_sub(limit);
        self.entries.into_iter().skip(skip).collect()
    }
}

/// Replay lines oldest first into at most `limit` tool entries
pub fn tools_from_lines<'a, I>(lines: I, now: DateTime<Utc>, limit: usize) -> Vec<ToolEntry>
where
    I: Iterator<Item = &'a str>,
{
    let mut log = ToolLog::default();
    for record in lines.filter_map(parse_record) {
        log.apply(&record, now);
    }
    log.into_recent(limit)
}

/// Tool entries for a transcript's contents, capped to the display limit.
/// Events without their own timestamp are stamped with the clock's time.
pub fn tools_in<C: Clock>(content: &str, clock: &C) -> Vec<ToolEntry> {
    tools_from_lines(transcript_lines(content), clock.now(), MAX_TRACKED_TOOLS)
}

/// Load recent tool activity from a transcript file; empty when unreadable
pub async fn parse_tools(transcript_path: &Path) -> Vec<ToolEntry> {
    match read_transcript(transcript_path).await {
        Ok(content) => tools_in(&content, &SystemClock),
        Err(e) => {
            tracing::debug!("no tool activity: {}", e);
            Vec::new()
        }
    }
}
