//! API Handlers
//!
//! HTTP request handlers for each cache server endpoint.

use std::time::Duration;

use axum::{
    extract::{Path, Query, State},
    Json,
};
use tracing::debug;

use crate::cache::{CacheStore, CounterOps};
use crate::config::Config;
use crate::error::{ApiError, ApiResult, Result};
use crate::lifecycle::Lifecycle;
use crate::models::{
    validate_key, AddMembersRequest, AddMembersResponse, CounterResponse, DeleteResponse,
    ExpireRequest, ExpireResponse, GetResponse, HashResponse, HashSetRequest, HashSetResponse,
    HealthResponse, IncrRequest, MembersResponse, RandomMembersQuery, SetRequest, SetResponse,
    StatsResponse,
};

/// Application state shared across all handlers.
///
/// The store is internally synchronized, so handlers share a cheap clone
/// of it without an outer lock.
#[derive(Clone, Debug)]
pub struct AppState {
    pub cache: CacheStore,
}

impl AppState {
    /// Creates a new AppState with the given cache store.
    pub fn new(cache: CacheStore) -> Self {
        Self { cache }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Starts the background reclaimer when active cleaning is enabled and
    /// ties its shutdown to `lifecycle`.
    pub fn from_config(config: &Config, lifecycle: &Lifecycle) -> Result<Self> {
        let cache = CacheStore::with_config(&config.engine, lifecycle)?;
        Ok(Self::new(cache))
    }
}

fn require_valid_key(key: &str) -> ApiResult<()> {
    match validate_key(key) {
        Some(message) => Err(ApiError::InvalidRequest(message)),
        None => Ok(()),
    }
}

/// Handler for PUT /set
///
/// Stores a string with optional TTL, replacing any value under the key.
pub async fn set_handler(
    State(state): State<AppState>,
    Json(req): Json<SetRequest>,
) -> ApiResult<Json<SetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    match req.ttl {
        Some(secs) => state
            .cache
            .store_with_ttl(&req.key, req.value, Duration::from_secs(secs)),
        None => state.cache.store(&req.key, req.value),
    }

    Ok(Json(SetResponse::new(req.key)))
}

/// Handler for GET /get/:key
pub async fn get_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<GetResponse>> {
    let (value, ttl) = state
        .cache
        .load_with_ttl(&key)?
        .ok_or_else(|| ApiError::NotFound(key.clone()))?;

    Ok(Json(GetResponse::new(key, value, ttl)))
}

/// Handler for DELETE /del/:key
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<DeleteResponse>> {
    if !state.cache.delete(&key) {
        return Err(ApiError::NotFound(key));
    }

    Ok(Json(DeleteResponse::new(key)))
}

/// Handler for POST /expire
///
/// Restarts the key's TTL from now. A TTL of zero deletes the key.
pub async fn expire_handler(
    State(state): State<AppState>,
    Json(req): Json<ExpireRequest>,
) -> ApiResult<Json<ExpireResponse>> {
    require_valid_key(&req.key)?;

    if !state.cache.expire(&req.key, Duration::from_secs(req.ttl)) {
        return Err(ApiError::NotFound(req.key));
    }

    Ok(Json(ExpireResponse {
        key: req.key,
        ttl: req.ttl,
    }))
}

/// Handler for POST /incr
///
/// The counter outcome is reported in the body; a non-counter key yields
/// `"failed"` rather than an HTTP error.
pub async fn incr_handler(
    State(state): State<AppState>,
    Json(req): Json<IncrRequest>,
) -> ApiResult<Json<CounterResponse>> {
    require_valid_key(&req.key)?;

    let result = match req.ttl {
        Some(secs) => state.cache.increase_with_expire_when_not_exist(
            &req.key,
            req.delta,
            Duration::from_secs(secs),
        ),
        None => state.cache.increase(&req.key, req.delta),
    };
    debug!(key = %req.key, result = result.as_str(), "counter updated");

    Ok(Json(CounterResponse::new(req.key, result)))
}

/// Handler for POST /sadd
pub async fn add_members_handler(
    State(state): State<AppState>,
    Json(req): Json<AddMembersRequest>,
) -> ApiResult<Json<AddMembersResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let added = state.cache.add_members(&req.key, req.members)?;

    Ok(Json(AddMembersResponse {
        key: req.key,
        added,
    }))
}

/// Handler for GET /smembers/:key
///
/// A missing key reads as an empty set.
pub async fn members_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<MembersResponse>> {
    let members = state.cache.get_members(&key)?;

    Ok(Json(MembersResponse { key, members }))
}

/// Handler for GET /srandmember/:key?count=N
pub async fn random_members_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Query(query): Query<RandomMembersQuery>,
) -> ApiResult<Json<MembersResponse>> {
    let members = state.cache.get_random_members(&key, query.count)?;

    Ok(Json(MembersResponse { key, members }))
}

/// Handler for PUT /hset
pub async fn hash_set_handler(
    State(state): State<AppState>,
    Json(req): Json<HashSetRequest>,
) -> ApiResult<Json<HashSetResponse>> {
    if let Some(error_msg) = req.validate() {
        return Err(ApiError::InvalidRequest(error_msg));
    }

    let written = req.fields.len();
    state.cache.hset_many(&req.key, req.fields)?;

    Ok(Json(HashSetResponse {
        key: req.key,
        written,
    }))
}

/// Handler for GET /hgetall/:key
pub async fn hash_get_all_handler(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> ApiResult<Json<HashResponse>> {
    let fields = state.cache.hget_all(&key)?;

    Ok(Json(HashResponse { key, fields }))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let stats = state.cache.stats();

    Json(StatsResponse::new(&stats, state.cache.reclaimer_state()))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CounterResult;
    use std::collections::HashMap;

    fn test_state() -> AppState {
        AppState::new(CacheStore::with_random_seed(7))
    }

    #[tokio::test]
    async fn test_set_and_get_handler() {
        let state = test_state();

        let req = SetRequest {
            key: "test_key".to_string(),
            value: "test_value".to_string(),
            ttl: None,
        };
        let result = set_handler(State(state.clone()), Json(req)).await;
        assert!(result.is_ok());

        let response = get_handler(State(state.clone()), Path("test_key".to_string()))
            .await
            .unwrap();
        assert_eq!(response.value, "test_value");
        assert!(response.ttl_remaining.is_none());
    }

    #[tokio::test]
    async fn test_set_with_ttl_reports_remaining() {
        let state = test_state();

        let req = SetRequest {
            key: "session".to_string(),
            value: "abc".to_string(),
            ttl: Some(60),
        };
        set_handler(State(state.clone()), Json(req)).await.unwrap();

        let response = get_handler(State(state), Path("session".to_string()))
            .await
            .unwrap();
        let remaining = response.ttl_remaining.unwrap();
        assert!(remaining <= 60 && remaining >= 58);
    }

    #[tokio::test]
    async fn test_get_nonexistent_key() {
        let state = test_state();

        let result = get_handler(State(state), Path("nonexistent".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_get_wrong_kind_is_cache_error() {
        let state = test_state();
        state.cache.add_member("tags", "a").unwrap();

        let result = get_handler(State(state), Path("tags".to_string())).await;
        assert!(matches!(result, Err(ApiError::Cache(_))));
    }

    #[tokio::test]
    async fn test_delete_handler() {
        let state = test_state();
        state.cache.store("to_delete", "value");

        let result = delete_handler(State(state.clone()), Path("to_delete".to_string())).await;
        assert!(result.is_ok());

        let result = delete_handler(State(state), Path("to_delete".to_string())).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_expire_zero_deletes() {
        let state = test_state();
        state.cache.store("k", "v");

        let req = ExpireRequest {
            key: "k".to_string(),
            ttl: 0,
        };
        expire_handler(State(state.clone()), Json(req)).await.unwrap();

        assert!(!state.cache.exist_key("k"));
    }

    #[tokio::test]
    async fn test_expire_rejects_invalid_key() {
        let state = test_state();

        let req = ExpireRequest {
            key: String::new(),
            ttl: 10,
        };
        let result = expire_handler(State(state.clone()), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));

        let req = ExpireRequest {
            key: "k".repeat(crate::models::requests::MAX_KEY_LENGTH + 1),
            ttl: 10,
        };
        let result = expire_handler(State(state), Json(req)).await;
        assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
    }

    #[tokio::test]
    async fn test_incr_handler_tri_state() {
        let state = test_state();

        let req = IncrRequest {
            key: "hits".to_string(),
            delta: 3,
            ttl: Some(30),
        };
        let response = incr_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.result, "success");
        assert_eq!(response.value, 3);
        assert_eq!(state.cache.get_counter("hits"), CounterResult::Success(3));

        state.cache.store("name", "x");
        let req = IncrRequest {
            key: "name".to_string(),
            delta: 1,
            ttl: None,
        };
        let response = incr_handler(State(state), Json(req)).await.unwrap();
        assert_eq!(response.result, "failed");
    }

    #[tokio::test]
    async fn test_set_members_roundtrip() {
        let state = test_state();

        let req = AddMembersRequest {
            key: "tags".to_string(),
            members: vec!["a".to_string(), "b".to_string(), "a".to_string()],
        };
        let response = add_members_handler(State(state.clone()), Json(req))
            .await
            .unwrap();
        assert_eq!(response.added, 2);

        let response = members_handler(State(state.clone()), Path("tags".to_string()))
            .await
            .unwrap();
        let mut members = response.0.members;
        members.sort();
        assert_eq!(members, vec!["a", "b"]);

        let response = random_members_handler(
            State(state),
            Path("tags".to_string()),
            Query(RandomMembersQuery { count: 1 }),
        )
        .await
        .unwrap();
        assert_eq!(response.members.len(), 1);
    }

    #[tokio::test]
    async fn test_hash_handlers() {
        let state = test_state();

        let mut fields = HashMap::new();
        fields.insert("name".to_string(), "ada".to_string());
        fields.insert("lang".to_string(), "rust".to_string());
        let req = HashSetRequest {
            key: "user".to_string(),
            fields: fields.clone(),
        };
        let response = hash_set_handler(State(state.clone()), Json(req)).await.unwrap();
        assert_eq!(response.written, 2);

        let response = hash_get_all_handler(State(state), Path("user".to_string()))
            .await
            .unwrap();
        assert_eq!(response.0.fields, fields);
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();
        state.cache.store("a", "1");

        let response = stats_handler(State(state)).await;
        assert_eq!(response.total_entries, 1);
        assert_eq!(response.lazy_expirations, 0);
        assert!(response.reclaimer.is_none());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
