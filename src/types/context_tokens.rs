use crate::formatting::format_number_with_commas;
use crate::types::{ContextWindow, UsageRecord};
use colored::Colorize;
use std::env;
use std::fmt;

/// Represents the context token usage for a session
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct ContextTokens(u64);

impl ContextTokens {
    /// Create from raw token count
    pub fn new(tokens: u64) -> Self {
        ContextTokens(tokens)
    }

    /// Create from a resolved usage record
    pub fn from_usage(usage: &UsageRecord) -> Self {
        ContextTokens(usage.total_input())
    }

    /// Calculate usage percentage and actual max tokens
    fn calculate_percentage(&self) -> (usize, usize) {
        let max_output_tokens = env::var("CLAUDE_CODE_MAX_OUTPUT_TOKENS")
            .ok()
            .and_then(|s| s.parse::<usize>().ok())
            .unwrap_or(32_000);

        let max_tokens = 200_000usize;
        let auto_compact_margin = 13_000usize;
        let actual_max_tokens = max_tokens
            .saturating_sub(max_output_tokens)
            .saturating_sub(auto_compact_margin);

        let percentage = if actual_max_tokens > 0 {
            ((self.0 as usize * 100) / actual_max_tokens).min(9999)
        } else {
            0
        };

        (percentage, actual_max_tokens)
    }

    /// Get formatted string with color coding for terminal output
    pub fn to_formatted_string(&self) -> String {
        let (percentage, actual_max_tokens) = self.calculate_percentage();
        let warning_margin = 20_000usize;
        let warning_threshold = actual_max_tokens.saturating_sub(warning_margin);

        let percentage_str = format!("{}%", percentage);
        let percentage_str = if percentage < 70 {
            percentage_str.green()
        } else if self.0 as usize <= warning_threshold {
            percentage_str.yellow()
        } else {
            percentage_str.red()
        };

        format!(
            "{} ({} / {})",
            percentage_str,
            format_number_with_commas(self.0 as usize),
            format_number_with_commas(actual_max_tokens)
        )
    }

    /// Get formatted string using host-provided percentage and context window size
    pub fn to_formatted_string_with_api(
        &self,
        used_percentage: u8,
        context_window_size: u64,
    ) -> String {
        let percentage_str = format!("{}%", used_percentage);
        let percentage_str = if used_percentage < 70 {
            percentage_str.green()
        } else if used_percentage < 90 {
            percentage_str.yellow()
        } else {
            percentage_str.red()
        };

        format!(
            "{} ({} / {})",
            percentage_str,
            format_number_with_commas(self.0 as usize),
            format_number_with_commas(context_window_size as usize)
        )
    }

    /// Pick the host's figures when the snapshot carries them
    pub fn display_for(&self, window: Option<&ContextWindow>) -> String {
        match window.and_then(|w| Some((w.used_percentage?, w.context_window_size?))) {
            Some((percentage, size)) => {
                self.to_formatted_string_with_api(percentage.clamp(0.0, 255.0) as u8, size)
            }
            None => self.to_formatted_string(),
        }
    }
}

impl fmt::Display for ContextTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} tokens", self.0)
    }
}
