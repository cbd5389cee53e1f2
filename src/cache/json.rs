//! JSON convenience wrappers around string and hash operations.
//!
//! Values are encoded with `serde_json`; failures are reported as
//! [`CacheError::Serialization`] carrying the key.

use std::collections::HashMap;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::CacheStore;
use crate::error::{CacheError, Result};

impl CacheStore {
    /// Decodes the JSON string stored at `key`.
    ///
    /// # Arguments
    /// * `key` - The cache key to look up
    ///
    /// # Errors
    /// `ValueTypeMismatch` for a non-string key, `Serialization` if the
    /// stored text does not decode as `T`.
    ///
    /// # Example
    /// ```
    /// use cache_engine::CacheStore;
    ///
    /// let store = CacheStore::new();
    /// store.store_json("point", &(1, 2)).unwrap();
    /// let point: Option<(i32, i32)> = store.load_json("point").unwrap();
    /// assert_eq!(point, Some((1, 2)));
    /// ```
    pub fn load_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.load(key)?.map(|raw| decode(key, &raw)).transpose()
    }

    /// Decodes the value at `key` and returns it with its remaining TTL.
    pub fn load_json_with_ttl<T: DeserializeOwned>(
        &self,
        key: &str,
    ) -> Result<Option<(T, Option<Duration>)>> {
        self.load_with_ttl(key)?
            .map(|(raw, ttl)| decode(key, &raw).map(|value| (value, ttl)))
            .transpose()
    }

    /// Encodes `value` as JSON and stores it without TTL, replacing any
    /// value under `key`.
    ///
    /// # Arguments
    /// * `key` - The cache key
    /// * `value` - Any serializable value
    pub fn store_json<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        self.store(key, encode(key, value)?);
        Ok(())
    }

    /// Like [`store_json`](Self::store_json); the value expires after `ttl`.
    pub fn store_json_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl: Duration,
    ) -> Result<()> {
        self.store_with_ttl(key, encode(key, value)?, ttl);
        Ok(())
    }

    /// Removes `key` and decodes the value it held.
    ///
    /// The key is removed even when decoding fails, so unreadable records
    /// do not linger.
    pub fn load_and_delete_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        self.load_and_delete(key)?
            .map(|raw| decode(key, &raw))
            .transpose()
    }

    /// Returns the decoded existing value and `true`, or stores `value` and
    /// returns it with `false`.
    pub fn load_or_store_json<T>(&self, key: &str, value: T) -> Result<(T, bool)>
    where
        T: Serialize + DeserializeOwned,
    {
        let (raw, loaded) = self.load_or_store(key, encode(key, &value)?)?;
        if loaded {
            Ok((decode(key, &raw)?, true))
        } else {
            Ok((value, false))
        }
    }

    /// Decodes one hash field.
    ///
    /// # Arguments
    /// * `key` - The hash key
    /// * `field` - The field to read; None if it or the key is missing
    pub fn hget_json<T: DeserializeOwned>(&self, key: &str, field: &str) -> Result<Option<T>> {
        self.hget(key, field)?
            .map(|raw| decode(key, &raw))
            .transpose()
    }

    /// Encodes `value` as JSON into one hash field, creating the hash if needed.
    pub fn hset_json<T: Serialize + ?Sized>(&self, key: &str, field: &str, value: &T) -> Result<()> {
        self.hset(key, field, encode(key, value)?)
    }

    /// Decodes every field of the hash at `key`.
    pub fn hget_all_json<T: DeserializeOwned>(&self, key: &str) -> Result<HashMap<String, T>> {
        self.hget_all(key)?
            .into_iter()
            .map(|(field, raw)| decode(key, &raw).map(|value| (field, value)))
            .collect()
    }
}

fn encode<T: Serialize + ?Sized>(key: &str, value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| CacheError::serialization(key, e))
}

fn decode<T: DeserializeOwned>(key: &str, raw: &str) -> Result<T> {
    serde_json::from_str(raw).map_err(|e| CacheError::serialization(key, e))
}

#[cfg(test)]
mod tests {
    use crate::cache::CacheStore;
    use crate::error::CacheError;
    use serde::{Deserialize, Serialize};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        visits: u32,
    }

    fn session() -> Session {
        Session {
            user: "alice".to_string(),
            visits: 3,
        }
    }

    #[test]
    fn test_store_and_load_json() {
        let store = CacheStore::new();

        store.store_json("s", &session()).unwrap();
        assert_eq!(store.load_json::<Session>("s").unwrap(), Some(session()));
        assert!(store.load_json::<Session>("missing").unwrap().is_none());
    }

    #[test]
    fn test_load_json_with_ttl() {
        let store = CacheStore::new();
        store
            .store_json_with_ttl("s", &session(), Duration::from_secs(30))
            .unwrap();

        let (value, ttl) = store.load_json_with_ttl::<Session>("s").unwrap().unwrap();
        assert_eq!(value, session());
        assert!(ttl.unwrap() <= Duration::from_secs(30));
    }

    #[test]
    fn test_load_json_bad_payload() {
        let store = CacheStore::new();
        store.store("s", "not json");

        let err = store.load_json::<Session>("s").unwrap_err();
        assert!(matches!(err, CacheError::Serialization { ref key, .. } if key == "s"));
        // Plain load leaves the key alone
        assert!(store.exist_key("s"));
    }

    #[test]
    fn test_load_and_delete_json_removes_poison_record() {
        let store = CacheStore::new();
        store.store("s", "{broken");

        assert!(store.load_and_delete_json::<Session>("s").is_err());
        assert!(!store.exist_key("s"));
    }

    #[test]
    fn test_load_or_store_json() {
        let store = CacheStore::new();

        let (value, loaded) = store.load_or_store_json("s", session()).unwrap();
        assert_eq!(value, session());
        assert!(!loaded);

        let other = Session {
            user: "bob".to_string(),
            visits: 0,
        };
        let (value, loaded) = store.load_or_store_json("s", other).unwrap();
        assert_eq!(value, session());
        assert!(loaded);
    }

    #[test]
    fn test_hash_json() {
        let store = CacheStore::new();

        store.hset_json("sessions", "a", &session()).unwrap();
        store.hset_json("sessions", "b", &session()).unwrap();

        assert_eq!(
            store.hget_json::<Session>("sessions", "a").unwrap(),
            Some(session())
        );
        let all = store.hget_all_json::<Session>("sessions").unwrap();
        assert_eq!(all.len(), 2);
    }
}
