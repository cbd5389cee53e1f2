//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies.

use std::collections::HashMap;
use std::time::Duration;

use serde::Serialize;

use crate::cache::{CacheStats, CounterResult};
use crate::tasks::ReclaimerState;

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, Serialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
    /// Remaining TTL in seconds, None if the key never expires
    pub ttl_remaining: Option<u64>,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>, ttl: Option<Duration>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl_remaining: ttl.map(|ttl| ttl.as_secs()),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, Serialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// Response body for the DELETE operation (DELETE /del/:key)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The key that was deleted
    pub key: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' deleted successfully", key),
            key,
        }
    }
}

/// Response body for TTL updates (POST /expire)
#[derive(Debug, Clone, Serialize)]
pub struct ExpireResponse {
    pub key: String,
    /// New TTL in seconds, 0 when the key was deleted
    pub ttl: u64,
}

/// Response body for counter operations (POST /incr)
#[derive(Debug, Clone, Serialize)]
pub struct CounterResponse {
    pub key: String,
    /// One of "failed", "not_effective", "success"
    pub result: &'static str,
    /// Counter value after the operation, 0 unless it succeeded
    pub value: i64,
}

impl CounterResponse {
    pub fn new(key: impl Into<String>, result: CounterResult) -> Self {
        Self {
            key: key.into(),
            result: result.as_str(),
            value: result.value(),
        }
    }
}

/// Response body for set additions (POST /sadd)
#[derive(Debug, Clone, Serialize)]
pub struct AddMembersResponse {
    pub key: String,
    /// Number of members that were not present before
    pub added: usize,
}

/// Response body listing set members (GET /smembers/:key, GET /srandmember/:key)
#[derive(Debug, Clone, Serialize)]
pub struct MembersResponse {
    pub key: String,
    pub members: Vec<String>,
}

/// Response body listing hash fields (GET /hgetall/:key)
#[derive(Debug, Clone, Serialize)]
pub struct HashResponse {
    pub key: String,
    pub fields: HashMap<String, String>,
}

/// Response body for hash writes (PUT /hset)
#[derive(Debug, Clone, Serialize)]
pub struct HashSetResponse {
    pub key: String,
    /// Number of fields written
    pub written: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Current number of keys in the table
    pub total_entries: usize,
    /// Entries removed on access after expiring
    pub lazy_expirations: u64,
    /// Entries removed by the background reclaimer
    pub reclaimed_entries: u64,
    /// Completed reclaim cycles
    pub reclaim_cycles: u64,
    /// Share of expired entries removed by the reclaimer
    pub active_reclaim_ratio: f64,
    /// Reclaimer state, None when active cleaning is off
    pub reclaimer: Option<ReclaimerState>,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(stats: &CacheStats, reclaimer: Option<ReclaimerState>) -> Self {
        Self {
            total_entries: stats.total_entries,
            lazy_expirations: stats.lazy_expirations,
            reclaimed_entries: stats.reclaimed_entries,
            reclaim_cycles: stats.reclaim_cycles,
            active_reclaim_ratio: stats.active_reclaim_ratio(),
            reclaimer,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_response_serialize() {
        let resp = GetResponse::new("test_key", "test_value", Some(Duration::from_millis(4_500)));
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("test_key"));
        assert!(json.contains("test_value"));
        assert_eq!(resp.ttl_remaining, Some(4));
    }

    #[test]
    fn test_set_response_serialize() {
        let resp = SetResponse::new("my_key");
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("my_key"));
        assert!(json.contains("successfully"));
    }

    #[test]
    fn test_counter_response() {
        let resp = CounterResponse::new("hits", CounterResult::Success(12));
        assert_eq!(resp.result, "success");
        assert_eq!(resp.value, 12);

        let resp = CounterResponse::new("hits", CounterResult::Failed);
        assert_eq!(resp.result, "failed");
        assert_eq!(resp.value, 0);
    }

    #[test]
    fn test_stats_response_ratio() {
        let stats = CacheStats {
            total_entries: 10,
            lazy_expirations: 1,
            reclaimed_entries: 3,
            reclaim_cycles: 2,
        };
        let resp = StatsResponse::new(&stats, Some(ReclaimerState::Paused));
        assert!((resp.active_reclaim_ratio - 0.75).abs() < 0.001);

        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains(r#""reclaimer":"paused""#));
    }

    #[test]
    fn test_health_response_serialize() {
        let resp = HealthResponse::healthy();
        let json = serde_json::to_string(&resp).unwrap();
        assert!(json.contains("healthy"));
        assert!(json.contains("timestamp"));
    }
}
