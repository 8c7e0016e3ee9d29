use anyhow::{Result, anyhow};
use fjall::Keyspace;
use serde::Deserialize;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::task;

#[derive(Serialize, Deserialize)]
struct StoredEntry<T> {
    value: T,
    expires_at: u64, // Unix timestamp (seconds)
}

/// On-disk keyed store for weather datasets and observations.
///
/// Concurrent writers of the same key simply overwrite each other; the last
/// complete entry wins.
#[derive(Clone)]
pub struct WeatherCache {
    store: Keyspace,
}

fn get_from_store(store: Keyspace, key: Vec<u8>) -> anyhow::Result<Option<Vec<u8>>> {
    Ok(store.get(key)?.map(|v| v.to_vec()))
}

impl WeatherCache {
    /// Opens (or creates) the cache database at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = fjall::Database::builder(&path).open()?;
        let items = db.keyspace("weather", fjall::KeyspaceCreateOptions::default)?;
        Ok(WeatherCache { store: items })
    }

    /// Stores a serializable value with a time-to-live (TTL).
    #[tracing::instrument(name = "put_cache", level = "debug", skip(self, value))]
    pub async fn put<T: Serialize + Send + Debug + 'static>(
        &self,
        key: &str,
        value: T,
        ttl: Duration,
    ) -> Result<()> {
        let store = self.store.clone();
        let key = key.as_bytes().to_vec();
        let expires_at = SystemTime::now()
            .checked_add(ttl)
            .ok_or(anyhow!("TTL overflow"))?
            .duration_since(UNIX_EPOCH)?
            .as_secs();
        let entry = StoredEntry { value, expires_at };
        let bytes = postcard::to_stdvec(&entry)?;

        task::spawn_blocking(move || store.insert(key, bytes)).await??;
        Ok(())
    }

    /// Retrieves a value if it exists and has not expired.
    /// Returns `None` for cache misses or expired entries.
    #[tracing::instrument(name = "query_cache", level = "debug", skip(self))]
    pub async fn get<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Result<Option<T>> {
        let store = self.store.clone();
        let key_bytes = key.as_bytes().to_vec();

        let maybe_bytes: Option<Vec<u8>> =
            task::spawn_blocking(move || get_from_store(store, key_bytes)).await??;

        let Some(bytes) = maybe_bytes else {
            tracing::debug!("Key not found");
            return Ok(None);
        };

        let entry: StoredEntry<T> = match postcard::from_bytes(&bytes) {
            Ok(entry) => entry,
            Err(e) => {
                // written by an older layout, treat as a miss
                tracing::debug!("Undecodable entry: {e}");
                self.remove(key).await?;
                return Ok(None);
            }
        };
        let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

        if now < entry.expires_at {
            tracing::debug!("Key found and still fresh");
            Ok(Some(entry.value))
        } else {
            tracing::debug!("Key found but expired");
            self.remove(key).await?;
            Ok(None)
        }
    }

    /// Manually removes a key from the cache.
    pub async fn remove(&self, key: &str) -> Result<()> {
        let key = key.as_bytes().to_vec();
        let store = self.store.clone();
        task::spawn_blocking(move || store.remove(key)).await??;
        Ok(())
    }
}

/// Expands a leading `~` to the home directory
#[must_use]
pub fn expand_home(location: &str) -> PathBuf {
    match location.strip_prefix("~/") {
        Some(rest) => dirs::home_dir()
            .map(|home| home.join(rest))
            .unwrap_or_else(|| PathBuf::from(location)),
        None => PathBuf::from(location),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[derive(Debug, Serialize, Deserialize, PartialEq)]
    struct Station {
        name: String,
        temperatures: Vec<f64>,
    }

    #[tokio::test]
    async fn test_round_trip() {
        let dir = TempDir::new().unwrap();
        let cache = WeatherCache::open(dir.path()).unwrap();
        let station = Station {
            name: "duluth".to_string(),
            temperatures: vec![-12.5, -9.0, -14.1],
        };

        cache
            .put("archive:duluth", station, Duration::from_secs(3600))
            .await
            .unwrap();
        let cached: Option<Station> = cache.get("archive:duluth").await.unwrap();

        assert_eq!(
            cached,
            Some(Station {
                name: "duluth".to_string(),
                temperatures: vec![-12.5, -9.0, -14.1],
            })
        );
    }

    #[tokio::test]
    async fn test_missing_key() {
        let dir = TempDir::new().unwrap();
        let cache = WeatherCache::open(dir.path()).unwrap();
        let cached: Option<Station> = cache.get("nothing-here").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_expired_entry_is_a_miss_and_removed() {
        let dir = TempDir::new().unwrap();
        let cache = WeatherCache::open(dir.path()).unwrap();
        cache
            .put("current:1", 3.5_f64, Duration::from_secs(0))
            .await
            .unwrap();

        let cached: Option<f64> = cache.get("current:1").await.unwrap();
        assert!(cached.is_none());
    }

    #[tokio::test]
    async fn test_overwrite_keeps_last_value() {
        let dir = TempDir::new().unwrap();
        let cache = WeatherCache::open(dir.path()).unwrap();
        cache.put("k", 1_u32, Duration::from_secs(60)).await.unwrap();
        cache.put("k", 2_u32, Duration::from_secs(60)).await.unwrap();
        assert_eq!(cache.get::<u32>("k").await.unwrap(), Some(2));

        cache.remove("k").await.unwrap();
        assert_eq!(cache.get::<u32>("k").await.unwrap(), None);
    }

    #[test]
    fn test_expand_home() {
        assert_eq!(expand_home("/var/cache/icyroute"), PathBuf::from("/var/cache/icyroute"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home("~/.cache/icyroute"), home.join(".cache/icyroute"));
        }
    }
}
