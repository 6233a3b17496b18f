use crate::error::Result;
use crate::types::{CumulativeCache, TranscriptRecord, TranscriptUsage, UsageRecord};
use crate::utils::{parse_record, read_transcript, transcript_lines};
use rayon::prelude::*;
use std::path::Path;

/// Usage carried by an assistant record, if it has all required counts
fn record_usage(record: &TranscriptRecord) -> Option<UsageRecord> {
    if !record.is_assistant() {
        return None;
    }
    record.usage()?.to_record()
}

/// First usage found in `lines`. Stops at the first match, so callers
/// that feed lines newest-first never look past the latest usage.
pub fn last_usage_from<'a, I>(lines: I) -> Option<UsageRecord>
where
    I: Iterator<Item = &'a str>,
{
    lines
        .filter_map(parse_record)
        .find_map(|record| record_usage(&record))
}

/// Most recent usage record in a transcript's contents
pub fn last_usage_in(content: &str) -> Option<UsageRecord> {
    last_usage_from(transcript_lines(content).rev())
}

/// Load the latest usage from a transcript file
pub async fn parse_last_usage(transcript_path: &Path) -> Option<UsageRecord> {
    let content = match read_transcript(transcript_path).await {
        Ok(content) => content,
        Err(e) => {
            tracing::debug!("no transcript usage: {}", e);
            return None;
        }
    };

    last_usage_in(&content)
}

/// Cache token totals across every assistant record in the contents
pub fn cumulative_cache_in(content: &str) -> CumulativeCache {
    content
        .par_lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(parse_record)
        .filter(TranscriptRecord::is_assistant)
        .filter_map(|record| record.usage().map(TranscriptUsage::cache_totals))
        .reduce(CumulativeCache::default, CumulativeCache::merge)
}

async fn sum_cache_totals(transcript_path: &Path) -> Result<CumulativeCache> {
    let content = read_transcript(transcript_path).await?;
    // The rayon scan stays off the async worker
    let totals = tokio::task::spawn_blocking(move || cumulative_cache_in(&content)).await?;
    Ok(totals)
}

/// Whole-session cache totals; None only when the transcript can't be read
pub async fn parse_cumulative_cache(transcript_path: &Path) -> Option<CumulativeCache> {
    match sum_cache_totals(transcript_path).await {
        Ok(totals) => Some(totals),
        Err(e) => {
            tracing::debug!("no cumulative cache totals: {}", e);
            None
        }
    }
}
