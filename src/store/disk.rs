use crate::core::cache::Cache;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionCreateOptions, PartitionHandle};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::marker::PhantomData;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::debug;

#[derive(Serialize, Deserialize)]
struct Entry<V> {
    value: V,
    expires_at: Option<SystemTime>,
}

/// Cache persisted in a fjall partition so downloads survive between runs.
///
/// Keys and values are stored as JSON. Storage errors are logged and treated
/// as misses.
pub struct DiskCache<K, V> {
    // Keeps the keyspace open for as long as the partition is in use
    _keyspace: Keyspace,
    partition: PartitionHandle,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> DiskCache<K, V> {
    pub fn open(path: &Path, partition: &str) -> Result<Self> {
        std::fs::create_dir_all(path)?;
        let keyspace = fjall::Config::new(path).open()?;
        let partition = keyspace.open_partition(partition, PartitionCreateOptions::default())?;
        Ok(Self {
            _keyspace: keyspace,
            partition,
            _marker: PhantomData,
        })
    }
}

impl<K, V> DiskCache<K, V>
where
    K: Serialize + Debug,
    V: Serialize + DeserializeOwned,
{
    fn read(&self, key: &K) -> Result<Option<V>> {
        let raw_key = serde_json::to_vec(key)?;
        let Some(raw) = self.partition.get(&raw_key)? else {
            debug!("Cache MISS for key: {:?}", key);
            return Ok(None);
        };
        let entry: Entry<V> = serde_json::from_slice(&raw)?;
        if entry.expires_at.is_some_and(|at| at <= SystemTime::now()) {
            debug!("Cache entry expired for key: {:?}", key);
            self.partition.remove(raw_key)?;
            return Ok(None);
        }
        debug!("Cache HIT for key: {:?}", key);
        Ok(Some(entry.value))
    }

    fn write(&self, key: &K, value: V, ttl: Option<Duration>) -> Result<()> {
        let entry = Entry {
            value,
            expires_at: ttl.and_then(|d| SystemTime::now().checked_add(d)),
        };
        self.partition
            .insert(serde_json::to_vec(key)?, serde_json::to_vec(&entry)?)?;
        debug!("Cache PUT for key: {:?}", key);
        Ok(())
    }
}

#[async_trait]
impl<K, V> Cache<K, V> for DiskCache<K, V>
where
    K: Serialize + Debug + Send + Sync + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &K) -> Option<V> {
        self.read(key).unwrap_or_else(|e| {
            debug!("DiskCache get error: {}", e);
            None
        })
    }

    async fn put(&self, key: K, value: V, ttl: Option<Duration>) {
        if let Err(e) = self.write(&key, value, ttl) {
            debug!("DiskCache put error: {}", e);
        }
    }

    async fn remove(&self, key: &K) {
        let res: Result<()> = (|| Ok(self.partition.remove(serde_json::to_vec(key)?)?))();
        if let Err(e) = res {
            debug!("DiskCache remove error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::price::PriceHistory;
    use chrono::NaiveDate;
    use tempfile::tempdir;
    use tokio::time::sleep;

    fn voo() -> PriceHistory {
        PriceHistory {
            symbol: "VOO".to_string(),
            currency: "USD".to_string(),
            observations: vec![(NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(), 340.2)],
        }
    }

    #[tokio::test]
    async fn test_disk_cache_get_put() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::<String, PriceHistory>::open(dir.path(), "history").unwrap();

        assert!(cache.get(&"VOO".to_string()).await.is_none());

        cache.put("VOO".to_string(), voo(), None).await;

        assert_eq!(cache.get(&"VOO".to_string()).await, Some(voo()));
    }

    #[tokio::test]
    async fn test_disk_cache_ttl_expiration() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();

        cache
            .put("CADUSD=X".to_string(), 0.79, Some(Duration::from_millis(10)))
            .await;
        assert_eq!(cache.get(&"CADUSD=X".to_string()).await, Some(0.79));

        sleep(Duration::from_millis(20)).await;
        assert!(cache.get(&"CADUSD=X".to_string()).await.is_none());
    }

    #[tokio::test]
    async fn test_disk_cache_ttl_beyond_clock_range_never_expires() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();

        cache
            .put("CADUSD=X".to_string(), 0.79, Some(Duration::MAX))
            .await;

        assert_eq!(cache.get(&"CADUSD=X".to_string()).await, Some(0.79));
    }

    #[tokio::test]
    async fn test_disk_cache_remove() {
        let dir = tempdir().unwrap();
        let cache = DiskCache::<String, f64>::open(dir.path(), "rates").unwrap();

        cache.put("CADUSD=X".to_string(), 0.79, None).await;
        cache.remove(&"CADUSD=X".to_string()).await;

        assert!(cache.get(&"CADUSD=X".to_string()).await.is_none());
    }
}
