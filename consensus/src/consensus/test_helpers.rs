use crate::consensus::dag::{ReachabilityManager, ReachabilityService};
use crate::consensus::ghostdag::GhostdagManager;
use consensus_core::ghostdag::{GhostdagData, SortableBlock};
use consensus_core::header::Header;
use consensus_core::{Hash, KType, ORIGIN};
use database::stores::{GhostdagStore, HeaderStore, ReachabilityStore, RelationsStore};
use database::{Database, StagingArea};
use std::sync::Arc;
use tempfile::TempDir;

/// Opens a fresh database in a temporary directory. Keep the directory alive for the lifetime of the test.
pub(crate) fn temp_db() -> (TempDir, Arc<Database>) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open(dir.path()).unwrap();
    (dir, Arc::new(db))
}

pub(crate) fn h(i: u64) -> Hash {
    Hash::from_le_u64([i, 0, 0, 0])
}

/// Headers-only DAG driving GHOSTDAG and reachability directly, without the processing pipeline
pub(crate) struct GhostdagTestDag {
    pub staging: StagingArea,
    pub ghostdag: GhostdagManager,
    pub reachability: ReachabilityManager,
    pub ghostdag_store: GhostdagStore,
    best: SortableBlock,
    headers: HeaderStore,
    relations: RelationsStore,
    db: Arc<Database>,
    _dir: TempDir,
}

impl GhostdagTestDag {
    pub const BITS: u32 = 0x207f_ffff;

    pub fn new(genesis: Hash, k: KType) -> Self {
        Self::with_reachability_params(genesis, k, u64::MAX - 1, 100, 1 << 12)
    }

    pub fn with_reachability_params(genesis: Hash, k: KType, capacity: u64, depth: u64, slack: u64) -> Self {
        let (dir, db) = temp_db();
        let headers = HeaderStore::new(db.clone(), 1000);
        let relations = RelationsStore::new(db.clone(), 1000);
        let ghostdag_store = GhostdagStore::new(db.clone(), 1000);
        let reachability = ReachabilityManager::new(ReachabilityStore::new(db.clone(), 1000), depth, slack);
        let service: Arc<dyn ReachabilityService> = Arc::new(reachability.clone());
        let ghostdag =
            GhostdagManager::new(genesis, k, ghostdag_store.clone(), relations.clone(), headers.clone(), service);

        let mut dag = Self {
            staging: StagingArea::new(),
            ghostdag,
            reachability,
            ghostdag_store,
            best: SortableBlock::new(genesis, Default::default()),
            headers,
            relations,
            db: db.clone(),
            _dir: dir,
        };
        dag.reachability.init(&mut dag.staging, capacity).unwrap();
        dag.insert_header(genesis, &[]);
        dag.ghostdag_store.insert(&mut dag.staging, genesis, Arc::new(GhostdagData::genesis())).unwrap();
        dag.reachability.add_block(&mut dag.staging, genesis, ORIGIN, &[]).unwrap();
        dag
    }

    fn insert_header(&mut self, hash: Hash, parents: &[Hash]) {
        let mut header = Header::from_precomputed_hash(hash, parents.to_vec());
        header.bits = Self::BITS;
        self.headers.insert(&mut self.staging, Arc::new(header)).unwrap();
        self.relations.insert(&mut self.staging, hash, parents.to_vec()).unwrap();
    }

    /// Colors and registers `hash` on top of `parents`
    pub fn add(&mut self, hash: Hash, parents: &[Hash]) -> Arc<GhostdagData> {
        self.insert_header(hash, parents);
        let data = Arc::new(self.ghostdag.ghostdag(&self.staging, parents).unwrap());
        self.ghostdag_store.insert(&mut self.staging, hash, data.clone()).unwrap();
        let mergeset: Vec<Hash> = data.unordered_mergeset_without_selected_parent().collect();
        self.reachability.add_block(&mut self.staging, hash, data.selected_parent, &mergeset).unwrap();
        let candidate = SortableBlock::new(hash, data.blue_work);
        if candidate > self.best {
            self.best = candidate;
            self.reachability.hint_virtual_selected_parent(&mut self.staging, hash).unwrap();
        }
        data
    }

    pub fn database(&self) -> Arc<Database> {
        self.db.clone()
    }

    pub fn data(&self, hash: Hash) -> Arc<GhostdagData> {
        self.ghostdag_store.get_data(&self.staging, hash).unwrap()
    }
}
