use std::any::Any;
use std::collections::HashMap;
use std::hash::Hash as StdHash;
use std::sync::Arc;

use rocksdb::WriteBatch;
use serde::Serialize;

use crate::{
    cache::Cache,
    db::Database,
    errors::{DbError, DbResult},
    key::DbKey,
};

/// Pending writes of a single store
pub trait StagingShard: Send {
    fn write_to_batch(&self, db: &Database, batch: &mut WriteBatch) -> DbResult<()>;

    /// Publishes the committed values to the store cache
    fn after_commit(self: Box<Self>);

    fn len(&self) -> usize;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Typed pending writes: `None` marks a deletion
pub struct MapShard<K, V> {
    cf: &'static str,
    cache: Arc<Cache<K, Arc<V>>>,
    entries: HashMap<K, Option<Arc<V>>>,
}

impl<K, V> MapShard<K, V>
where
    K: DbKey + Clone + Eq + StdHash + Send + Sync + 'static,
    V: Serialize + Send + Sync + 'static,
{
    pub fn new(cf: &'static str, cache: Arc<Cache<K, Arc<V>>>) -> Self {
        Self { cf, cache, entries: HashMap::new() }
    }

    /// `Some(None)` when the key is staged for deletion
    pub fn get(&self, key: &K) -> Option<Option<Arc<V>>> {
        self.entries.get(key).cloned()
    }

    pub fn insert(&mut self, key: K, value: Arc<V>) {
        self.entries.insert(key, Some(value));
    }

    pub fn delete(&mut self, key: K) {
        self.entries.insert(key, None);
    }

    pub fn entries(&self) -> impl Iterator<Item = (&K, &Option<Arc<V>>)> {
        self.entries.iter()
    }
}

impl<K, V> StagingShard for MapShard<K, V>
where
    K: DbKey + Clone + Eq + StdHash + Send + Sync + 'static,
    V: Serialize + Send + Sync + 'static,
{
    fn write_to_batch(&self, db: &Database, batch: &mut WriteBatch) -> DbResult<()> {
        let cf = db.cf_handle(self.cf)?;
        for (key, value) in self.entries.iter() {
            match value {
                Some(value) => batch.put_cf(cf, key.key_bytes(), bincode::serialize(value.as_ref())?),
                None => batch.delete_cf(cf, key.key_bytes()),
            }
        }
        Ok(())
    }

    fn after_commit(self: Box<Self>) {
        for (key, value) in self.entries {
            match value {
                Some(value) => self.cache.insert(key, value),
                None => {
                    self.cache.remove(&key);
                }
            }
        }
    }

    fn len(&self) -> usize {
        self.entries.len()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Write buffer of a single consensus operation. All reads go through it before
/// the store caches and the database, so staged writes are visible to later steps
/// of the same operation. Committed atomically by [`Database::commit`]; dropping it
/// discards every staged write.
#[derive(Default)]
pub struct StagingArea {
    shards: HashMap<&'static str, Box<dyn StagingShard>>,
}

impl StagingArea {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.values().all(|shard| shard.len() == 0)
    }

    /// Number of staged keys across all stores
    pub fn len(&self) -> usize {
        self.shards.values().map(|shard| shard.len()).sum()
    }

    pub fn shard<K, V>(&self, name: &'static str) -> DbResult<Option<&MapShard<K, V>>>
    where
        K: DbKey + Clone + Eq + StdHash + Send + Sync + 'static,
        V: Serialize + Send + Sync + 'static,
    {
        match self.shards.get(name) {
            None => Ok(None),
            Some(shard) => shard.as_any().downcast_ref::<MapShard<K, V>>().map(Some).ok_or(DbError::StagingShardMismatch(name)),
        }
    }

    pub fn shard_mut<K, V>(&mut self, name: &'static str, cf: &'static str, cache: &Arc<Cache<K, Arc<V>>>) -> DbResult<&mut MapShard<K, V>>
    where
        K: DbKey + Clone + Eq + StdHash + Send + Sync + 'static,
        V: Serialize + Send + Sync + 'static,
    {
        self.shards
            .entry(name)
            .or_insert_with(|| Box::new(MapShard::new(cf, cache.clone())) as Box<dyn StagingShard>)
            .as_any_mut()
            .downcast_mut::<MapShard<K, V>>()
            .ok_or(DbError::StagingShardMismatch(name))
    }

    pub(crate) fn into_shards(self) -> impl Iterator<Item = Box<dyn StagingShard>> {
        self.shards.into_values()
    }

    pub(crate) fn shards(&self) -> impl Iterator<Item = &dyn StagingShard> {
        self.shards.values().map(|shard| shard.as_ref())
    }
}
