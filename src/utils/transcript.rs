use crate::error::{Result, StatusError};
use crate::types::TranscriptRecord;
use std::path::Path;
use tokio::fs as async_fs;

/// Read a whole transcript into memory
pub async fn read_transcript(transcript_path: &Path) -> Result<String> {
    async_fs::read_to_string(transcript_path)
        .await
        .map_err(|source| StatusError::FileRead {
            path: transcript_path.to_path_buf(),
            source,
        })
}

/// Non-empty lines of a transcript, iterable from either end
pub fn transcript_lines(content: &str) -> impl DoubleEndedIterator<Item = &str> + '_ {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
}

/// Parse one JSONL line; malformed lines yield None
pub fn parse_record(line: &str) -> Option<TranscriptRecord> {
    match serde_json::from_str::<TranscriptRecord>(line) {
        Ok(record) => Some(record),
        Err(e) => {
            tracing::trace!("skipping malformed transcript line: {}", e);
            None
        }
    }
}
