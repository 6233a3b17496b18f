// Module declarations
pub mod cache;
pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod formatting;
pub mod resolver;
pub mod transcript_parser;
pub mod types;
pub mod usage_parser;
pub mod utils;

// Re-export commonly used items
pub use cache::CacheManager;
pub use clock::{Clock, SystemClock};
pub use config::Settings;
pub use error::{Result, StatusError};
pub use resolver::{Resolution, UsageResolver, UsageSource};
pub use transcript_parser::parse_tools;
pub use types::{
    ContextTokens, CumulativeCache, SessionId, StatuslineHookJson, ToolEntry, ToolStatus,
    UsageRecord,
};
pub use usage_parser::{parse_cumulative_cache, parse_last_usage};
