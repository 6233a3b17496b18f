//! Best-available token usage for the current session.
//!
//! Sources are consulted strictly in order and the first answer wins:
//!
//! 1. usage embedded in the snapshot, when it is real usage;
//! 2. the latest usage record in the session transcript;
//! 3. the persistent cache store.
//!
//! The host leaves the embedded usage out while a long-running tool is
//! executing, which is what the transcript covers. The cache covers the
//! window right after a session starts, before the transcript has any
//! usage in it. Embedded usage is written through to the cache, except
//! on the call that observes a session switch, where it may still belong
//! to the previous session.

use crate::cache::CacheManager;
use crate::clock::{Clock, SystemClock};
use crate::types::{SessionId, StatuslineHookJson, UsageRecord};
use crate::usage_parser::parse_last_usage;
use std::fmt;

/// Which source answered a resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageSource {
    Embedded,
    Transcript,
    Cache,
}

impl fmt::Display for UsageSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UsageSource::Embedded => "embedded",
            UsageSource::Transcript => "transcript",
            UsageSource::Cache => "cache",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub usage: Option<UsageRecord>,
    pub source: Option<UsageSource>,
    pub session_changed: bool,
}

impl Resolution {
    fn found(usage: UsageRecord, source: UsageSource, session_changed: bool) -> Self {
        tracing::debug!("usage resolved from {}", source);
        Self {
            usage: Some(usage),
            source: Some(source),
            session_changed,
        }
    }

    fn absent(session_changed: bool) -> Self {
        tracing::debug!("no usage available from any source");
        Self {
            usage: None,
            source: None,
            session_changed,
        }
    }
}

/// Resolver state owned by the caller and threaded through each call
#[derive(Debug)]
pub struct UsageResolver<C: Clock = SystemClock> {
    cache: CacheManager<C>,
    last_session_id: Option<SessionId>,
    cached_usage: Option<UsageRecord>,
}

impl<C: Clock> UsageResolver<C> {
    pub fn new(cache: CacheManager<C>) -> Self {
        Self {
            cache,
            last_session_id: None,
            cached_usage: None,
        }
    }

    pub fn cache_mut(&mut self) -> &mut CacheManager<C> {
        &mut self.cache
    }

    /// Last usage this resolver recovered from a transcript
    pub fn cached_usage(&self) -> Option<UsageRecord> {
        self.cached_usage
    }

    pub async fn resolve(&mut self, snapshot: &StatuslineHookJson) -> Resolution {
        let session_id = snapshot.session_id();
        let session_changed =
            self.last_session_id.is_some() && self.last_session_id.as_ref() != session_id;
        self.last_session_id = session_id.cloned();

        if session_changed {
            tracing::debug!("session changed to {:?}", session_id.map(SessionId::as_str));
            self.cached_usage = None;
        }

        let embedded = snapshot
            .embedded_usage()
            .copied()
            .filter(UsageRecord::is_real);

        if let Some(usage) = embedded
            && let Some(id) = session_id
            && !session_changed
        {
            self.cache.set(id, usage);
        }

        if let Some(usage) = embedded {
            self.cached_usage = None;
            return Resolution::found(usage, UsageSource::Embedded, session_changed);
        }

        if let Some(path) = snapshot.transcript_path()
            && let Some(usage) = parse_last_usage(path).await
        {
            self.cached_usage = Some(usage);
            return Resolution::found(usage, UsageSource::Transcript, session_changed);
        }

        if let Some(id) = session_id
            && let Some(usage) = self.cache.get(id)
        {
            return Resolution::found(usage, UsageSource::Cache, session_changed);
        }

        Resolution::absent(session_changed)
    }
}
