use std::hash::Hash as StdHash;
use std::sync::Arc;

use serde::{de::DeserializeOwned, Serialize};

use crate::{
    cache::Cache,
    db::{Database, CF_METADATA},
    errors::{DbError, DbResult},
    key::{DbKey, DbKeyDecode},
    staging::StagingArea,
};

/// Typed access to one column family: reads go through the staging area,
/// then the cache, then the database. Writes are staged.
pub struct CachedDbAccess<K, V> {
    db: Arc<Database>,
    cf: &'static str,
    cache: Arc<Cache<K, Arc<V>>>,
}

impl<K, V> Clone for CachedDbAccess<K, V> {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), cf: self.cf, cache: self.cache.clone() }
    }
}

impl<K, V> CachedDbAccess<K, V>
where
    K: DbKey + Clone + Eq + StdHash + Send + Sync + std::fmt::Debug + 'static,
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(db: Arc<Database>, cf: &'static str, cache_size: usize) -> Self {
        Self { db, cf, cache: Arc::new(Cache::new(cache_size)) }
    }

    pub fn get(&self, staging: &StagingArea, key: &K) -> DbResult<Option<Arc<V>>> {
        if let Some(shard) = staging.shard::<K, V>(self.cf)? {
            if let Some(staged) = shard.get(key) {
                return Ok(staged);
            }
        }
        if let Some(value) = self.cache.get(key) {
            return Ok(Some(value));
        }
        match self.db.get(self.cf, &key.key_bytes())? {
            Some(bytes) => {
                let value: Arc<V> = Arc::new(bincode::deserialize(&bytes)?);
                self.cache.insert(key.clone(), value.clone());
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    pub fn read(&self, staging: &StagingArea, key: &K) -> DbResult<Arc<V>> {
        self.get(staging, key)?.ok_or_else(|| DbError::KeyNotFound(self.cf, format!("{key:?}")))
    }

    pub fn has(&self, staging: &StagingArea, key: &K) -> DbResult<bool> {
        if let Some(shard) = staging.shard::<K, V>(self.cf)? {
            if let Some(staged) = shard.get(key) {
                return Ok(staged.is_some());
            }
        }
        if self.cache.contains_key(key) {
            return Ok(true);
        }
        self.db.exists(self.cf, &key.key_bytes())
    }

    pub fn write(&self, staging: &mut StagingArea, key: K, value: V) -> DbResult<()> {
        self.write_arc(staging, key, Arc::new(value))
    }

    pub fn write_arc(&self, staging: &mut StagingArea, key: K, value: Arc<V>) -> DbResult<()> {
        staging.shard_mut::<K, V>(self.cf, self.cf, &self.cache)?.insert(key, value);
        Ok(())
    }

    pub fn delete(&self, staging: &mut StagingArea, key: K) -> DbResult<()> {
        staging.shard_mut::<K, V>(self.cf, self.cf, &self.cache)?.delete(key);
        Ok(())
    }

    /// Committed entries only, in key byte order, starting at `from`
    pub fn iterate_from(&self, from: Option<&K>, limit: usize) -> DbResult<Vec<(K, Arc<V>)>>
    where
        K: DbKeyDecode,
    {
        let from_bytes = from.map(|key| key.key_bytes());
        self.db
            .scan_from(self.cf, from_bytes.as_deref(), limit)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_key_bytes(&k)?, Arc::new(bincode::deserialize(&v)?))))
            .collect()
    }

    /// Committed entries merged with the ones staged in `staging`
    pub fn iterate_all(&self, staging: &StagingArea) -> DbResult<Vec<(K, Arc<V>)>>
    where
        K: DbKeyDecode,
    {
        let mut entries: std::collections::HashMap<K, Arc<V>> = self.iterate_from(None, usize::MAX)?.into_iter().collect();
        if let Some(shard) = staging.shard::<K, V>(self.cf)? {
            for (key, value) in shard.entries() {
                match value {
                    Some(value) => entries.insert(key.clone(), value.clone()),
                    None => entries.remove(key),
                };
            }
        }
        Ok(entries.into_iter().collect())
    }

    /// Stages deletion of every committed and staged entry
    pub fn delete_all(&self, staging: &mut StagingArea) -> DbResult<()>
    where
        K: DbKeyDecode,
    {
        let keys: Vec<K> = self.iterate_all(staging)?.into_iter().map(|(k, _)| k).collect();
        let shard = staging.shard_mut::<K, V>(self.cf, self.cf, &self.cache)?;
        for key in keys {
            shard.delete(key);
        }
        Ok(())
    }
}

/// A single value stored under a fixed metadata key
pub struct CachedDbItem<V> {
    access: CachedDbAccess<&'static str, V>,
    key: &'static str,
}

impl<V> Clone for CachedDbItem<V> {
    fn clone(&self) -> Self {
        Self { access: self.access.clone(), key: self.key }
    }
}

impl<V> CachedDbItem<V>
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    pub fn new(db: Arc<Database>, key: &'static str) -> Self {
        Self { access: CachedDbAccess { db, cf: CF_METADATA, cache: Arc::new(Cache::new(1)) }, key }
    }

    pub fn get(&self, staging: &StagingArea) -> DbResult<Option<Arc<V>>> {
        if let Some(shard) = staging.shard::<&'static str, V>(self.key)? {
            if let Some(staged) = shard.get(&self.key) {
                return Ok(staged);
            }
        }
        self.access.get(&StagingArea::new(), &self.key)
    }

    pub fn read(&self, staging: &StagingArea) -> DbResult<Arc<V>> {
        self.get(staging)?.ok_or(DbError::KeyNotFound(CF_METADATA, self.key.to_string()))
    }

    pub fn write(&self, staging: &mut StagingArea, value: V) -> DbResult<()> {
        staging.shard_mut::<&'static str, V>(self.key, CF_METADATA, &self.access.cache)?.insert(self.key, Arc::new(value));
        Ok(())
    }
}
