//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies and query strings.

use std::collections::HashMap;

use serde::Deserialize;

/// Maximum allowed key length in bytes
pub const MAX_KEY_LENGTH: usize = 256;

/// Maximum allowed value size in bytes
pub const MAX_VALUE_SIZE: usize = 1024 * 1024; // 1 MB

/// Checks a key, returning an error message if it is invalid.
pub fn validate_key(key: &str) -> Option<String> {
    if key.is_empty() {
        return Some("Key cannot be empty".to_string());
    }
    if key.len() > MAX_KEY_LENGTH {
        return Some(format!(
            "Key exceeds maximum length of {} bytes",
            MAX_KEY_LENGTH
        ));
    }
    None
}

/// Request body for storing a string (PUT /set)
#[derive(Debug, Clone, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// Optional TTL in seconds; omitted = never expires
    #[serde(default)]
    pub ttl: Option<u64>,
}

impl SetRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if let Some(message) = validate_key(&self.key) {
            return Some(message);
        }
        if self.value.len() > MAX_VALUE_SIZE {
            return Some(format!(
                "Value exceeds maximum size of {} bytes",
                MAX_VALUE_SIZE
            ));
        }
        None
    }
}

/// Request body for rewriting a key's TTL (POST /expire)
#[derive(Debug, Clone, Deserialize)]
pub struct ExpireRequest {
    pub key: String,
    /// New TTL in seconds; 0 deletes the key
    pub ttl: u64,
}

/// Request body for counter increments (POST /incr)
#[derive(Debug, Clone, Deserialize)]
pub struct IncrRequest {
    pub key: String,
    /// Amount to add, negative to decrement
    #[serde(default = "default_delta")]
    pub delta: i64,
    /// TTL in seconds applied only when the counter is created
    #[serde(default)]
    pub ttl: Option<u64>,
}

fn default_delta() -> i64 {
    1
}

/// Request body for adding set members (POST /sadd)
#[derive(Debug, Clone, Deserialize)]
pub struct AddMembersRequest {
    pub key: String,
    pub members: Vec<String>,
}

impl AddMembersRequest {
    pub fn validate(&self) -> Option<String> {
        if let Some(message) = validate_key(&self.key) {
            return Some(message);
        }
        if self.members.is_empty() {
            return Some("At least one member is required".to_string());
        }
        None
    }
}

/// Request body for setting hash fields (PUT /hset)
#[derive(Debug, Clone, Deserialize)]
pub struct HashSetRequest {
    pub key: String,
    pub fields: HashMap<String, String>,
}

impl HashSetRequest {
    pub fn validate(&self) -> Option<String> {
        if let Some(message) = validate_key(&self.key) {
            return Some(message);
        }
        if self.fields.is_empty() {
            return Some("At least one field is required".to_string());
        }
        None
    }
}

/// Query string for random member sampling (GET /srandmember/:key)
#[derive(Debug, Clone, Deserialize)]
pub struct RandomMembersQuery {
    /// Number of members to draw (default: 1)
    #[serde(default = "default_count")]
    pub count: usize,
}

fn default_count() -> usize {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, Some(60));
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest {
            key: "".to_string(),
            value: "test".to_string(),
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_key_too_long() {
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH + 1)).is_some());
        assert!(validate_key(&"x".repeat(MAX_KEY_LENGTH)).is_none());
    }

    #[test]
    fn test_validate_value_too_large() {
        let req = SetRequest {
            key: "key".to_string(),
            value: "x".repeat(MAX_VALUE_SIZE + 1),
            ttl: None,
        };
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_incr_request_defaults() {
        let req: IncrRequest = serde_json::from_str(r#"{"key": "hits"}"#).unwrap();
        assert_eq!(req.delta, 1);
        assert!(req.ttl.is_none());
    }

    #[test]
    fn test_add_members_requires_members() {
        let req: AddMembersRequest =
            serde_json::from_str(r#"{"key": "s", "members": []}"#).unwrap();
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_hash_set_request_deserialize() {
        let req: HashSetRequest =
            serde_json::from_str(r#"{"key": "h", "fields": {"a": "1"}}"#).unwrap();
        assert!(req.validate().is_none());
        assert_eq!(req.fields["a"], "1");
    }
}
