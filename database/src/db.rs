use crate::errors::{DbError, DbResult};
use crate::staging::StagingArea;
use parking_lot::RwLock;
use rocksdb::{ColumnFamilyDescriptor, Direction, IteratorMode, Options, WriteBatch, DB};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, trace};

pub const CF_HEADERS: &str = "headers";
pub const CF_BLOCK_TRANSACTIONS: &str = "block_transactions";
pub const CF_RELATIONS_PARENTS: &str = "relations_parents";
pub const CF_RELATIONS_CHILDREN: &str = "relations_children";
pub const CF_GHOSTDAG: &str = "ghostdag";
pub const CF_REACHABILITY: &str = "reachability";
pub const CF_STATUSES: &str = "statuses";
pub const CF_DEPTH: &str = "depth";
pub const CF_DAA_ADDED: &str = "daa_added";
pub const CF_UTXO_DIFFS: &str = "utxo_diffs";
pub const CF_ACCEPTANCE: &str = "acceptance";
pub const CF_SINK_UTXO_SET: &str = "sink_utxo_set";
pub const CF_PRUNING_UTXO_SET: &str = "pruning_utxo_set";
pub const CF_METADATA: &str = "metadata";

pub const ALL_COLUMN_FAMILIES: [&str; 14] = [
    CF_HEADERS,
    CF_BLOCK_TRANSACTIONS,
    CF_RELATIONS_PARENTS,
    CF_RELATIONS_CHILDREN,
    CF_GHOSTDAG,
    CF_REACHABILITY,
    CF_STATUSES,
    CF_DEPTH,
    CF_DAA_ADDED,
    CF_UTXO_DIFFS,
    CF_ACCEPTANCE,
    CF_SINK_UTXO_SET,
    CF_PRUNING_UTXO_SET,
    CF_METADATA,
];

pub struct Database {
    db: Arc<DB>,
    is_closed: Arc<RwLock<bool>>,
}

impl Database {
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_max_open_files(10000);
        opts.set_keep_log_file_num(10);
        opts.set_max_background_jobs(4);
        opts.set_bytes_per_sync(1048576);
        opts.increase_parallelism(4);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);

        let cf_descriptors: Vec<_> =
            ALL_COLUMN_FAMILIES.iter().map(|name| ColumnFamilyDescriptor::new(*name, Options::default())).collect();

        let db = DB::open_cf_descriptors(&opts, path.as_ref(), cf_descriptors)?;
        debug!("opened consensus database at {}", path.as_ref().display());
        Ok(Self { db: Arc::new(db), is_closed: Arc::new(RwLock::new(false)) })
    }

    fn check_closed(&self) -> DbResult<()> {
        if *self.is_closed.read() {
            return Err(DbError::DatabaseClosed);
        }
        Ok(())
    }

    pub(crate) fn cf_handle(&self, cf_name: &str) -> DbResult<&rocksdb::ColumnFamily> {
        self.db.cf_handle(cf_name).ok_or_else(|| DbError::ColumnFamilyNotFound(cf_name.to_string()))
    }

    pub fn get(&self, cf_name: &str, key: &[u8]) -> DbResult<Option<Vec<u8>>> {
        self.check_closed()?;
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.get_cf(cf, key)?)
    }

    pub fn exists(&self, cf_name: &str, key: &[u8]) -> DbResult<bool> {
        self.check_closed()?;
        let cf = self.cf_handle(cf_name)?;
        Ok(self.db.get_pinned_cf(cf, key)?.is_some())
    }

    /// Atomically writes every staged change, then publishes it to the store caches
    pub fn commit(&self, staging: StagingArea) -> DbResult<()> {
        self.check_closed()?;
        let mut batch = WriteBatch::default();
        for shard in staging.shards() {
            shard.write_to_batch(self, &mut batch)?;
        }
        trace!("committing staging area with {} writes", batch.len());
        self.db.write(batch)?;
        for shard in staging.into_shards() {
            shard.after_commit();
        }
        Ok(())
    }

    /// Raw key/value pairs of a column family starting at `from` (inclusive), at most `limit` of them
    pub fn scan_from(&self, cf_name: &str, from: Option<&[u8]>, limit: usize) -> DbResult<Vec<(Box<[u8]>, Box<[u8]>)>> {
        self.check_closed()?;
        let cf = self.cf_handle(cf_name)?;
        let mode = match from {
            Some(key) => IteratorMode::From(key, Direction::Forward),
            None => IteratorMode::Start,
        };
        let mut items = Vec::new();
        for item in self.db.iterator_cf(cf, mode).take(limit) {
            items.push(item?);
        }
        Ok(items)
    }

    pub fn count(&self, cf_name: &str) -> DbResult<usize> {
        self.check_closed()?;
        let cf = self.cf_handle(cf_name)?;
        let mut count = 0usize;
        for item in self.db.iterator_cf(cf, IteratorMode::Start) {
            item?;
            count += 1;
        }
        Ok(count)
    }

    pub fn close(&self) {
        *self.is_closed.write() = true;
    }

    pub fn compact(&self, cf_name: &str) -> DbResult<()> {
        let cf = self.cf_handle(cf_name)?;
        self.db.compact_range_cf(cf, None::<&[u8]>, None::<&[u8]>);
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self { db: self.db.clone(), is_closed: self.is_closed.clone() }
    }
}
