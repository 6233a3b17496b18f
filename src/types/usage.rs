use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Token accounting for one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    #[serde(default, deserialize_with = "lenient_count")]
    pub input_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub output_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_creation_input_tokens: u64,
    #[serde(default, deserialize_with = "lenient_count")]
    pub cache_read_input_tokens: u64,
}

impl UsageRecord {
    pub fn new(
        input_tokens: u64,
        output_tokens: u64,
        cache_creation_input_tokens: u64,
        cache_read_input_tokens: u64,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            cache_creation_input_tokens,
            cache_read_input_tokens,
        }
    }

    /// Whether this record can be trusted as real usage.
    ///
    /// All-zero records and records with only cache fields populated are
    /// what the host sends while it has nothing to report, so both count
    /// as absent. Requiring input or output to be nonzero covers both.
    pub fn is_real(&self) -> bool {
        self.input_tokens > 0 || self.output_tokens > 0
    }

    /// Tokens occupying the context window, cache included
    pub fn total_input(&self) -> u64 {
        self.input_tokens + self.cache_creation_input_tokens + self.cache_read_input_tokens
    }
}

/// Usage sub-record as it appears in the transcript, where any field may be
/// missing or carry a non-numeric value
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TranscriptUsage {
    #[serde(default, deserialize_with = "lenient_u64")]
    pub input_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub output_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub cache_creation_input_tokens: Option<u64>,
    #[serde(default, deserialize_with = "lenient_u64")]
    pub cache_read_input_tokens: Option<u64>,
}

impl TranscriptUsage {
    /// Convert to a usage record. Input, output and cache-read counts are
    /// required; cache creation defaults to zero.
    pub fn to_record(&self) -> Option<UsageRecord> {
        Some(UsageRecord {
            input_tokens: self.input_tokens?,
            output_tokens: self.output_tokens?,
            cache_creation_input_tokens: self.cache_creation_input_tokens.unwrap_or(0),
            cache_read_input_tokens: self.cache_read_input_tokens?,
        })
    }

    pub fn cache_totals(&self) -> CumulativeCache {
        CumulativeCache {
            cache_read: self.cache_read_input_tokens.unwrap_or(0),
            cache_creation: self.cache_creation_input_tokens.unwrap_or(0),
        }
    }
}

/// Cache token totals summed over a whole session log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CumulativeCache {
    pub cache_read: u64,
    pub cache_creation: u64,
}

impl CumulativeCache {
    #[inline]
    pub fn merge(self, other: Self) -> Self {
        Self {
            cache_read: self.cache_read + other.cache_read,
            cache_creation: self.cache_creation + other.cache_creation,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cache_read == 0 && self.cache_creation == 0
    }
}

fn number_as_u64(value: &Value) -> Option<u64> {
    value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|n| n.is_finite() && *n >= 0.0)
            .map(|n| n as u64)
    })
}

fn lenient_u64<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(number_as_u64))
}

fn lenient_count<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(lenient_u64(deserializer)?.unwrap_or(0))
}
