pub mod disk;
pub mod memory;

use crate::core::cache::Cache;
use crate::core::config::AppConfig;
use disk::DiskCache;
use memory::MemoryCache;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Opens the cache for `partition`, persisted under the data path when the
/// config asks for it. Each partition gets its own keyspace under
/// `<data_path>/cache`. A disk cache that cannot be opened degrades to memory.
pub fn open_cache<K, V>(config: &AppConfig, partition: &str) -> Arc<dyn Cache<K, V>>
where
    K: Eq + Hash + Serialize + Debug + Send + Sync + 'static,
    V: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    if config.cache.persist {
        let opened = config
            .data_path()
            .and_then(|path| {
                DiskCache::<K, V>::open(&path.join("cache").join(partition), partition)
            });
        match opened {
            Ok(cache) => return Arc::new(cache),
            Err(e) => debug!("Falling back to memory cache for {partition}: {e}"),
        }
    }
    Arc::new(MemoryCache::<K, V>::new())
}
