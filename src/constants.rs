use chrono::Duration;

/// How long a persisted usage record stays valid in the cache store
pub const DEFAULT_CACHE_TTL: Duration = Duration::minutes(5);

/// Upper bound on tool lifecycle entries handed to the display
pub const MAX_TRACKED_TOOLS: usize = 20;

/// Shape version written into the cache store
pub const CACHE_STORE_VERSION: u32 = 1;

pub const CACHE_FILE_NAME: &str = "usage-cache.json";

/// Longest shell command kept as a tool target, in characters
pub const MAX_COMMAND_TARGET_CHARS: usize = 30;
