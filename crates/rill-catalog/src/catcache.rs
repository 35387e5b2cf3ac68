//! The catalog cache.
//!
//! [`CatCache`] owns the in-memory descriptors for every table, type,
//! function, index and column of the database, answers lookups by OID, by
//! name or by multi-column predicate, and inserts new catalog rows. It sits
//! on top of an abstract [`CatalogStore`]; the binding to the in-memory
//! substrate is [`VolatileCatCache`].
//!
//! A cache miss is not an error and surfaces as an absent result. A
//! corrupt catalog (a duplicate OID in a unique systable, a missing
//! required row, a meta page that fails validation) is fatal.
//!
//! All interior maps sit behind locks, which keeps the lookup interface
//! `&self` and gives a future one-writer/snapshot-readers extension a
//! place to attach; the core itself is single-threaded.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::BufRead;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use rill_common::constants::{DB_META_FILE_ID, DB_META_MAGIC, DB_META_VERSION};
use rill_common::types::{Datum, FieldId, FileId, NullableDatumRef, Oid, RecordId};
use rill_common::{RillError, RillResult};

use rill_storage::{CatalogStore, Record, VolatileStore};

use crate::bootstrap::BootstrapCatCache;
use crate::desc::{IndexDesc, TableDesc};
use crate::fmgr::{FuncRegistry, FunctionCallInfo, FunctionPtr};
use crate::idxtyps::IdxType;
use crate::initfile::{InitDataFileReader, InitLine};
use crate::optypes::OpType;
use crate::schema::{Schema, SchemaCatalog};
use crate::systables::initoids::{
    FUNC_INT2_EQ, FUNC_OID_EQ, FUNC_UINT1_EQ, FUNC_VARCHAR_STR_EQ_CI, TAB_COLUMN, TAB_FUNCTION,
    TAB_FUNCTION_ARGS, TAB_INDEX, TAB_INDEX_COLUMN, TAB_OPERATOR, TAB_TABLE, TAB_TYPE,
};
use crate::systables::{
    ColumnEntry, FunctionArgsEntry, FunctionEntry, IndexColumnEntry, IndexEntry, SysTableRow,
    TableEntry, TypeEntry,
};

/// One cached catalog row: its location in the systable file plus the
/// decoded, shared row struct.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Where the row lives in its systable file.
    pub recid: RecordId,
    /// The decoded row.
    pub row: SysTableRow,
}

/// How a predicate search resolves its matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    /// At most one row matches; return the first one found and cache it.
    Unique,
    /// Like [`SearchMode::Unique`], but the returned entry bypasses the
    /// cache and is owned by the caller alone.
    UniqueUncached,
    /// Exactly this many rows must match, or the catalog is corrupt.
    ExpectCount(usize),
    /// Any number of rows may match.
    All,
}

/// The catalog cache over a file substrate `S`.
#[derive(Debug)]
pub struct CatCache<S: CatalogStore> {
    store: Mutex<S>,
    registry: Arc<FuncRegistry>,
    initialized: bool,
    /// Index-accelerated lookup is disabled in this snapshot; every search
    /// takes the sequential-scan fallback.
    use_index: bool,
    systable_fids: RwLock<HashMap<Oid, FileId>>,
    recid_lookup: Mutex<HashMap<RecordId, CacheEntry>>,
    table_descs: RwLock<HashMap<Oid, Arc<TableDesc>>>,
    index_descs: RwLock<HashMap<Oid, Arc<IndexDesc>>>,
    /// Non-volatile indexes registered through `add_index`, waiting for a
    /// build pass. No build pass runs in scan-only mode.
    pending_index_builds: Mutex<Vec<Oid>>,
}

/// The catalog cache bound to the volatile in-memory substrate.
///
/// A volatile catalog can only be created from init data; nothing persists
/// for [`CatCache::initialize_from_existing`] to restore.
pub type VolatileCatCache = CatCache<VolatileStore>;

impl<S: CatalogStore> CatCache<S> {
    /// Creates an uninitialized cache over `store`.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            store: Mutex::new(store),
            registry: Arc::new(FuncRegistry::builtin()),
            initialized: false,
            use_index: false,
            systable_fids: RwLock::new(HashMap::new()),
            recid_lookup: Mutex::new(HashMap::new()),
            table_descs: RwLock::new(HashMap::new()),
            index_descs: RwLock::new(HashMap::new()),
            pending_index_builds: Mutex::new(Vec::new()),
        }
    }

    /// Returns whether the cache has been initialized.
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns the built-in function registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<FuncRegistry> {
        &self.registry
    }

    /// Returns the non-volatile indexes still waiting for a build pass.
    #[must_use]
    pub fn pending_index_builds(&self) -> Vec<Oid> {
        self.pending_index_builds.lock().clone()
    }

    // =========================================================================
    // Initialization
    // =========================================================================

    /// Creates the catalog from init data and initializes the cache.
    ///
    /// Creates the database meta page, allocates one systable file per
    /// `table` block, inserts every record the reader produces, patches
    /// the stored Table rows with the allocated file IDs, persists the
    /// (systable, file) mapping and the OID counter in the meta page, and
    /// loads the minimum cache.
    pub fn initialize_from_init_data<R: BufRead>(
        &mut self,
        init_data: R,
        bootstrap: &BootstrapCatCache,
    ) -> RillResult<()> {
        if self.initialized {
            return Err(RillError::internal("catalog cache is already initialized"));
        }

        // The database meta file must be the first file ever created.
        {
            let store = self.store.get_mut();
            let meta_fid = store.create_file(false)?;
            debug_assert_eq!(meta_fid.as_u32(), DB_META_FILE_ID);
        }

        let fids = self.load_init_data(init_data, bootstrap)?;
        self.finish_init_catalog(&fids, bootstrap)?;
        self.load_min_cache(&fids, bootstrap)?;

        // Index build pass: this snapshot runs scan-only, so the catalog
        // indexes declared in the init data stay unbuilt.
        debug!(systables = fids.len(), "catalog created from init data");
        self.initialized = true;
        Ok(())
    }

    /// Initializes the cache from a previously created substrate.
    ///
    /// Opens the database meta page, validates it, loads each systable's
    /// file ID from it, and loads the minimum cache.
    pub fn initialize_from_existing(
        &mut self,
        bootstrap: &BootstrapCatCache,
    ) -> RillResult<()> {
        if self.initialized {
            return Err(RillError::internal("catalog cache is already initialized"));
        }

        let fids = {
            let store = self.store.get_mut();
            let fh = store.open_file(FileId::new(DB_META_FILE_ID))?;
            let page = store.first_page(&fh)?;
            let buf = page.data();

            let magic = u32::from_le_bytes(buf[0..4].try_into().unwrap());
            let version = u32::from_le_bytes(buf[4..8].try_into().unwrap());
            if magic != DB_META_MAGIC || version != DB_META_VERSION {
                return Err(RillError::corruption(format!(
                    "database meta page failed validation (magic {magic:#x}, version {version})"
                )));
            }

            let count = u32::from_le_bytes(buf[12..16].try_into().unwrap()) as usize;
            let mut fids = HashMap::with_capacity(count);
            for i in 0..count {
                let at = 16 + 8 * i;
                let tabid = Oid::new(u32::from_le_bytes(buf[at..at + 4].try_into().unwrap()));
                let fid = FileId::new(u32::from_le_bytes(buf[at + 4..at + 8].try_into().unwrap()));
                fids.insert(tabid, fid);
            }
            fids
        };

        self.load_min_cache(&fids, bootstrap)?;
        debug!(systables = fids.len(), "catalog restored from existing data");
        self.initialized = true;
        Ok(())
    }

    fn load_init_data<R: BufRead>(
        &mut self,
        init_data: R,
        bootstrap: &BootstrapCatCache,
    ) -> RillResult<HashMap<Oid, FileId>> {
        let mut reader = InitDataFileReader::new(init_data, bootstrap);
        let mut fids: HashMap<Oid, FileId> = HashMap::new();
        let mut current = None;

        loop {
            match reader.next() {
                InitLine::Table => {
                    let tabid = reader.last_tabid();
                    let store = self.store.get_mut();
                    let fid = match fids.entry(tabid) {
                        Entry::Occupied(e) => *e.get(),
                        Entry::Vacant(v) => *v.insert(store.create_file(true)?),
                    };
                    current = Some(store.open_file(fid)?);
                }
                InitLine::Data => {
                    let Some(fh) = &current else {
                        return Err(RillError::corruption(
                            "init data line without a table declaration",
                        ));
                    };
                    let store = self.store.get_mut();
                    let mut rec = Record::new(reader.record_bytes());
                    store.append_record(fh, &mut rec)?;
                }
                InitLine::Eof => break,
                InitLine::Error => {
                    return Err(RillError::InputParse {
                        line: reader.last_line_no(),
                        message: reader
                            .last_error()
                            .unwrap_or("init data parse failure")
                            .to_string(),
                    });
                }
            }
        }
        Ok(fids)
    }

    /// Rewrites the stored Table rows with the file IDs allocated during
    /// the load, and persists the meta page.
    fn finish_init_catalog(
        &mut self,
        fids: &HashMap<Oid, FileId>,
        bootstrap: &BootstrapCatCache,
    ) -> RillResult<()> {
        let table_fid = *fids.get(&TAB_TABLE).ok_or_else(|| {
            RillError::corruption("init data does not populate the Table systable")
        })?;
        let table_desc = bootstrap.find_table_desc(TAB_TABLE).ok_or_else(|| {
            RillError::corruption("bootstrap catalog lacks the Table systable descriptor")
        })?;
        let schema = table_desc.schema();

        let store = self.store.get_mut();
        let fh = store.open_file(table_fid)?;
        let mut iter = store.iterate(&fh)?;
        let mut buf = Vec::new();
        while store.next_record(&mut iter)? {
            let mut row = {
                let payload = store.current_record(&iter)?;
                let data = schema.dissemble_payload(payload);
                TableEntry::from_datums(&data)?
            };
            let Some(&fid) = fids.get(&row.tabid) else {
                continue;
            };
            if row.tabfid == fid {
                continue;
            }
            row.tabfid = fid;

            buf.clear();
            schema.write_payload_datums(&row.datum_vector(), &mut buf)?;
            let mut rec = Record::new(&buf);
            // Same length as the stored row, so this updates in place and
            // the record ID is stable.
            store.update_current(&mut iter, &mut rec)?;
        }
        store.end_iterate(&mut iter);

        // Persist the meta page: magic, version, the OID counter, and the
        // (systable, file) mapping.
        let fh = store.open_file(FileId::new(DB_META_FILE_ID))?;
        let mut page = store.first_page(&fh)?;
        let buf = page.data_mut();
        buf[0..4].copy_from_slice(&DB_META_MAGIC.to_le_bytes());
        buf[4..8].copy_from_slice(&DB_META_VERSION.to_le_bytes());
        buf[8..12].copy_from_slice(&(Oid::MAX_SYS.as_u32() + 1).to_le_bytes());
        buf[12..16].copy_from_slice(&(fids.len() as u32).to_le_bytes());
        let mut entries: Vec<(Oid, FileId)> = fids.iter().map(|(&t, &f)| (t, f)).collect();
        entries.sort_unstable();
        for (i, (tabid, fid)) in entries.iter().enumerate() {
            let at = 16 + 8 * i;
            buf[at..at + 4].copy_from_slice(&tabid.as_u32().to_le_bytes());
            buf[at + 4..at + 8].copy_from_slice(&fid.as_u32().to_le_bytes());
        }
        page.mark_dirty();
        Ok(())
    }

    /// Loads the minimum set of cached state required to serve lookups:
    /// the systable file mapping and a descriptor for every systable,
    /// taken from the self-describing bootstrap catalog.
    fn load_min_cache(
        &mut self,
        fids: &HashMap<Oid, FileId>,
        bootstrap: &BootstrapCatCache,
    ) -> RillResult<()> {
        let mut descs = HashMap::with_capacity(fids.len());
        for (&tabid, &fid) in fids {
            let bootstrap_desc = bootstrap.find_table_desc(tabid).ok_or_else(|| {
                RillError::corruption(format!("systable {tabid} is not in the bootstrap catalog"))
            })?;
            let mut row = bootstrap_desc.table().as_ref().clone();
            row.tabfid = fid;
            descs.insert(
                tabid,
                Arc::new(TableDesc::new(
                    Arc::new(row),
                    bootstrap_desc.schema().clone(),
                )),
            );
        }

        *self.systable_fids.write() = fids.clone();
        *self.table_descs.write() = descs;
        Ok(())
    }

    fn systable_fid(&self, systabid: Oid) -> RillResult<FileId> {
        self.systable_fids
            .read()
            .get(&systabid)
            .copied()
            .ok_or_else(|| RillError::corruption(format!("no file for systable {systabid}")))
    }

    fn systable_desc(&self, systabid: Oid) -> RillResult<Arc<TableDesc>> {
        self.table_descs
            .read()
            .get(&systabid)
            .map(Arc::clone)
            .ok_or_else(|| RillError::corruption(format!("no descriptor for systable {systabid}")))
    }

    // =========================================================================
    // The lookup primitive
    // =========================================================================

    /// Searches systable `systabid` for rows matching every predicate
    /// `fieldids[k] == rhs[k]`, with equality decided by the registered
    /// functions `eq_funcids[k]`.
    ///
    /// `idx_hint` names an index usable for the lookup; with
    /// index-accelerated lookup disabled in this snapshot it is accepted
    /// and ignored, and the systable is scanned sequentially. A row
    /// matches when every equality function returns true and non-null.
    pub fn search_catalog_entry(
        &self,
        systabid: Oid,
        idx_hint: Oid,
        fieldids: &[FieldId],
        eq_funcids: &[Oid],
        rhs: &[Datum<'_>],
        mode: SearchMode,
    ) -> RillResult<Vec<CacheEntry>> {
        debug_assert_eq!(fieldids.len(), eq_funcids.len());
        debug_assert_eq!(fieldids.len(), rhs.len());
        let _ = (idx_hint, self.use_index);

        let desc = self.systable_desc(systabid)?;
        let schema = desc.schema();
        let mut eq_funcs: Vec<FunctionPtr> = Vec::with_capacity(eq_funcids.len());
        for &f in eq_funcids {
            eq_funcs.push(self.registry.lookup(f)?);
        }

        let unique = matches!(mode, SearchMode::Unique | SearchMode::UniqueUncached);
        let fid = self.systable_fid(systabid)?;
        let mut matches: Vec<(RecordId, Vec<u8>)> = Vec::new();
        {
            let mut store = self.store.lock();
            let fh = store.open_file(fid)?;
            let mut iter = store.iterate(&fh)?;
            while store.next_record(&mut iter)? {
                let rid = store.current_record_id(&iter);
                let mut is_match = true;
                {
                    let payload = store.current_record(&iter)?;
                    for k in 0..fieldids.len() {
                        let field = schema.get_field(fieldids[k], payload);
                        let args = [
                            NullableDatumRef::from(&field),
                            NullableDatumRef::from(&rhs[k]),
                        ];
                        let res = (eq_funcs[k])(&FunctionCallInfo {
                            args: &args,
                            typparam: 0,
                        })?;
                        if res.is_null() || !res.get_bool() {
                            is_match = false;
                            break;
                        }
                    }
                }
                if is_match {
                    let payload = store.current_record(&iter)?;
                    matches.push((rid, payload.to_vec()));
                    if unique {
                        break;
                    }
                }
            }
            store.end_iterate(&mut iter);
        }

        if let SearchMode::ExpectCount(expected) = mode {
            if matches.len() != expected {
                return Err(RillError::corruption(format!(
                    "expected {expected} matching rows in systable {systabid}, found {}",
                    matches.len()
                )));
            }
        }

        let mut out = Vec::with_capacity(matches.len());
        if matches!(mode, SearchMode::UniqueUncached) {
            for (recid, bytes) in matches {
                let data = schema.dissemble_payload(&bytes);
                let row = SysTableRow::decode(systabid, &data)?;
                out.push(CacheEntry { recid, row });
            }
        } else {
            let mut lookup = self.recid_lookup.lock();
            for (recid, bytes) in matches {
                let entry = match lookup.entry(recid) {
                    Entry::Occupied(e) => e.get().clone(),
                    Entry::Vacant(v) => {
                        let data = schema.dissemble_payload(&bytes);
                        let row = SysTableRow::decode(systabid, &data)?;
                        v.insert(CacheEntry { recid, row }).clone()
                    }
                };
                out.push(entry);
            }
        }
        Ok(out)
    }

    fn search_by_oid(
        &self,
        systabid: Oid,
        idx_hint: Oid,
        oid_col: FieldId,
        oid: Oid,
    ) -> RillResult<Option<CacheEntry>> {
        let rhs = [Datum::from_oid(oid)];
        let mut found = self.search_catalog_entry(
            systabid,
            idx_hint,
            &[oid_col],
            &[FUNC_OID_EQ],
            &rhs,
            SearchMode::Unique,
        )?;
        Ok(found.pop())
    }

    fn search_by_name(
        &self,
        systabid: Oid,
        idx_hint: Oid,
        name_col: FieldId,
        name: &str,
    ) -> RillResult<Option<CacheEntry>> {
        let rhs = [Datum::from_cstr(name)?];
        let mut found = self.search_catalog_entry(
            systabid,
            idx_hint,
            &[name_col],
            &[FUNC_VARCHAR_STR_EQ_CI],
            &rhs,
            SearchMode::Unique,
        )?;
        Ok(found.pop())
    }

    // =========================================================================
    // Derived finders
    // =========================================================================

    /// Returns the Table row with OID `tabid`.
    pub fn find_table(&self, tabid: Oid) -> RillResult<Option<Arc<TableEntry>>> {
        use crate::systables::initoids::IDX_TABLE_TABID;
        let entry = self.search_by_oid(TAB_TABLE, IDX_TABLE_TABID, TableEntry::TABID_COL, tabid)?;
        Ok(entry.and_then(|e| e.row.as_table()))
    }

    /// Returns the OID of the table named `tabname`, matched
    /// case-insensitively.
    pub fn find_table_by_name(&self, tabname: &str) -> RillResult<Option<Oid>> {
        use crate::systables::initoids::IDX_TABLE_TABNAME;
        let entry =
            self.search_by_name(TAB_TABLE, IDX_TABLE_TABNAME, TableEntry::TABNAME_COL, tabname)?;
        Ok(entry.and_then(|e| e.row.as_table()).map(|t| t.tabid))
    }

    /// Returns the Type row with OID `typid`.
    pub fn find_type(&self, typid: Oid) -> RillResult<Option<Arc<TypeEntry>>> {
        use crate::systables::initoids::IDX_TYPE_TYPID;
        let entry = self.search_by_oid(TAB_TYPE, IDX_TYPE_TYPID, TypeEntry::TYPID_COL, typid)?;
        Ok(entry.and_then(|e| e.row.as_type()))
    }

    /// Returns the Function row with OID `funcid`.
    pub fn find_function(&self, funcid: Oid) -> RillResult<Option<Arc<FunctionEntry>>> {
        use crate::systables::initoids::IDX_FUNCTION_FUNCID;
        let entry = self.search_by_oid(
            TAB_FUNCTION,
            IDX_FUNCTION_FUNCID,
            FunctionEntry::FUNCID_COL,
            funcid,
        )?;
        Ok(entry.and_then(|e| e.row.as_function()))
    }

    /// Returns the OID of the function named `funcname`, matched
    /// case-insensitively.
    pub fn find_function_by_name(&self, funcname: &str) -> RillResult<Option<Oid>> {
        use crate::systables::initoids::IDX_FUNCTION_FUNCNAME;
        let entry = self.search_by_name(
            TAB_FUNCTION,
            IDX_FUNCTION_FUNCNAME,
            FunctionEntry::FUNCNAME_COL,
            funcname,
        )?;
        Ok(entry.and_then(|e| e.row.as_function()).map(|f| f.funcid))
    }

    /// Returns the FunctionArgs row of argument `funcargid` of function
    /// `funcid`.
    pub fn find_function_args(
        &self,
        funcid: Oid,
        funcargid: FieldId,
    ) -> RillResult<Option<Arc<FunctionArgsEntry>>> {
        use crate::systables::initoids::IDX_FUNCTION_ARGS_FUNCID_FUNCARGID;
        let rhs = [Datum::from_oid(funcid), Datum::from_i16(funcargid)];
        let mut found = self.search_catalog_entry(
            TAB_FUNCTION_ARGS,
            IDX_FUNCTION_ARGS_FUNCID_FUNCARGID,
            &[
                FunctionArgsEntry::FUNCID_COL,
                FunctionArgsEntry::FUNCARGID_COL,
            ],
            &[FUNC_OID_EQ, FUNC_INT2_EQ],
            &rhs,
            SearchMode::Unique,
        )?;
        Ok(found.pop().and_then(|e| e.row.as_function_args()))
    }

    /// Returns the Index row with OID `idxid`.
    pub fn find_index(&self, idxid: Oid) -> RillResult<Option<Arc<IndexEntry>>> {
        use crate::systables::initoids::IDX_INDEX_IDXID;
        let entry = self.search_by_oid(TAB_INDEX, IDX_INDEX_IDXID, IndexEntry::IDXID_COL, idxid)?;
        Ok(entry.and_then(|e| e.row.as_index()))
    }

    /// Returns the OID of the index named `idxname`, matched
    /// case-insensitively.
    pub fn find_index_by_name(&self, idxname: &str) -> RillResult<Option<Oid>> {
        let entry =
            self.search_by_name(TAB_INDEX, Oid::INVALID, IndexEntry::IDXNAME_COL, idxname)?;
        Ok(entry.and_then(|e| e.row.as_index()).map(|i| i.idxid))
    }

    /// Returns the OIDs of all indexes over table `idxtabid`.
    pub fn find_all_indexes_of_table(&self, idxtabid: Oid) -> RillResult<Vec<Oid>> {
        use crate::systables::initoids::IDX_INDEX_IDXTABID;
        let rhs = [Datum::from_oid(idxtabid)];
        let entries = self.search_catalog_entry(
            TAB_INDEX,
            IDX_INDEX_IDXTABID,
            &[IndexEntry::IDXTABID_COL],
            &[FUNC_OID_EQ],
            &rhs,
            SearchMode::All,
        )?;
        Ok(entries
            .into_iter()
            .filter_map(|e| e.row.as_index())
            .map(|i| i.idxid)
            .collect())
    }

    /// Returns all Column rows of table `coltabid`, ordered by column
    /// position. The row count must match the Table row's column count.
    pub fn find_columns_of_table(&self, coltabid: Oid) -> RillResult<Vec<Arc<ColumnEntry>>> {
        use crate::systables::initoids::IDX_COLUMN_COLTABID_COLID;
        let table = self.find_table(coltabid)?.ok_or_else(|| {
            RillError::corruption(format!("table {coltabid} has no Table row"))
        })?;

        let rhs = [Datum::from_oid(coltabid)];
        let entries = self.search_catalog_entry(
            TAB_COLUMN,
            IDX_COLUMN_COLTABID_COLID,
            &[ColumnEntry::COLTABID_COL],
            &[FUNC_OID_EQ],
            &rhs,
            SearchMode::ExpectCount(table.tabncols as usize),
        )?;

        let mut columns: Vec<Arc<ColumnEntry>> = entries
            .into_iter()
            .filter_map(|e| e.row.as_column())
            .collect();
        columns.sort_by_key(|c| c.colid);
        Ok(columns)
    }

    /// Returns the OID of the function implementing `optype` over the
    /// operand types, or a missing-operator error.
    ///
    /// Both operand types of a binary operator must be given; a unary
    /// operator takes the invalid OID on the right.
    pub fn find_operator(&self, optype: OpType, arg0: Oid, arg1: Oid) -> RillResult<Oid> {
        let rhs = [
            Datum::from_u8(optype.as_u8()),
            Datum::from_oid(arg0),
            Datum::from_oid(arg1),
        ];
        let mut found = self.search_catalog_entry(
            TAB_OPERATOR,
            Oid::INVALID,
            &[
                crate::systables::OperatorEntry::OPRTYPE_COL,
                crate::systables::OperatorEntry::OPRARG0_COL,
                crate::systables::OperatorEntry::OPRARG1_COL,
            ],
            &[FUNC_UINT1_EQ, FUNC_OID_EQ, FUNC_OID_EQ],
            &rhs,
            SearchMode::Unique,
        )?;
        found
            .pop()
            .and_then(|e| e.row.as_operator())
            .map(|o| o.oprfuncid)
            .ok_or(RillError::MissingOperator {
                op: optype.symbol().unwrap_or("?"),
                typid: arg0.as_u32(),
            })
    }

    // =========================================================================
    // Descriptor materialization
    // =========================================================================

    /// Returns the descriptor of table `tabid`, assembling and caching it
    /// on a miss.
    pub fn find_table_desc(&self, tabid: Oid) -> RillResult<Option<Arc<TableDesc>>> {
        if let Some(desc) = self.table_descs.read().get(&tabid) {
            return Ok(Some(Arc::clone(desc)));
        }

        let Some(table) = self.find_table(tabid)? else {
            return Ok(None);
        };
        let columns = self.find_columns_of_table(tabid)?;

        let typid: Vec<Oid> = columns.iter().map(|c| c.coltypid).collect();
        let typparam: Vec<u64> = columns.iter().map(|c| c.coltypparam).collect();
        let nullable: Vec<bool> = columns.iter().map(|c| c.colisnullable).collect();
        let names: Vec<String> = columns.iter().map(|c| c.colname.clone()).collect();

        let mut schema = Schema::create_with_names(&typid, &typparam, &nullable, names)?;
        schema.compute_layout(self)?;

        let desc = Arc::new(TableDesc::new(table, schema));
        // Cache population on a miss is idempotent: a concurrent fill of
        // the same descriptor is equal, so either copy may win.
        let mut descs = self.table_descs.write();
        Ok(Some(Arc::clone(
            descs.entry(tabid).or_insert(desc),
        )))
    }

    /// Returns the descriptor of index `idxid`, assembling and caching it
    /// on a miss.
    pub fn find_index_desc(&self, idxid: Oid) -> RillResult<Option<Arc<IndexDesc>>> {
        if let Some(desc) = self.index_descs.read().get(&idxid) {
            return Ok(Some(Arc::clone(desc)));
        }

        let Some(index) = self.find_index(idxid)? else {
            return Ok(None);
        };

        let rhs = [Datum::from_oid(idxid)];
        let entries = self.search_catalog_entry(
            TAB_INDEX_COLUMN,
            crate::systables::initoids::IDX_INDEX_COLUMN_IDXCOLIDXID,
            &[IndexColumnEntry::IDXCOLIDXID_COL],
            &[FUNC_OID_EQ],
            &rhs,
            SearchMode::All,
        )?;
        let mut columns: Vec<Arc<IndexColumnEntry>> = entries
            .into_iter()
            .filter_map(|e| e.row.as_index_column())
            .collect();
        if columns.is_empty() {
            return Err(RillError::corruption(format!(
                "index {idxid} has no IndexColumn rows"
            )));
        }
        columns.sort_by_key(|c| c.idxcolid);

        let table_desc = self.find_table_desc(index.idxtabid)?.ok_or_else(|| {
            RillError::corruption(format!(
                "index {idxid} references missing table {}",
                index.idxtabid
            ))
        })?;
        let table_schema = table_desc.schema();

        let mut typid = Vec::with_capacity(columns.len());
        let mut typparam = Vec::with_capacity(columns.len());
        let mut nullable = Vec::with_capacity(columns.len());
        let mut names = Vec::with_capacity(columns.len());
        for c in &columns {
            let col = c.idxcoltabcolid;
            typid.push(table_schema.field_type_id(col));
            typparam.push(table_schema.field_type_param(col));
            nullable.push(table_schema.field_is_nullable(col));
            names.push(table_schema.field_name(col).to_string());
        }

        let mut key_schema = Schema::create_with_names(&typid, &typparam, &nullable, names)?;
        key_schema.compute_layout(self)?;

        let desc = Arc::new(IndexDesc::new(index, columns, key_schema));
        let mut descs = self.index_descs.write();
        Ok(Some(Arc::clone(descs.entry(idxid).or_insert(desc))))
    }

    // =========================================================================
    // Insertion
    // =========================================================================

    /// Allocates a fresh object ID from the counter in the database meta
    /// page. Fails once the OID space is exhausted.
    pub fn allocate_oid(&self) -> RillResult<Oid> {
        let mut store = self.store.lock();
        let fh = store.open_file(FileId::new(DB_META_FILE_ID))?;
        let mut page = store.first_page(&fh)?;
        let buf = page.data_mut();

        let next = u32::from_le_bytes(buf[8..12].try_into().unwrap());
        if next > Oid::MAX.as_u32() {
            return Err(RillError::OidExhausted);
        }
        buf[8..12].copy_from_slice(&(next + 1).to_le_bytes());
        page.mark_dirty();
        Ok(Oid::new(next))
    }

    /// Encodes and appends catalog rows into systable `systabid`.
    fn insert_catalog_entries(
        &self,
        systabid: Oid,
        rows: &[Vec<Datum<'_>>],
    ) -> RillResult<()> {
        let desc = self.systable_desc(systabid)?;
        let schema = desc.schema();
        let fid = self.systable_fid(systabid)?;

        let mut store = self.store.lock();
        let fh = store.open_file(fid)?;
        let mut buf = Vec::new();
        for row in rows {
            buf.clear();
            schema.write_payload_datums(row, &mut buf)?;
            let mut rec = Record::new(&buf);
            store.append_record(&fh, &mut rec)?;
            // Index maintenance would go here; the catalog runs scan-only
            // in this snapshot.
        }
        Ok(())
    }

    /// Adds a table to the catalog and returns its OID.
    ///
    /// All column vectors must have one entry per column. Fails with an
    /// already-exists error when a table of the same name (compared
    /// case-insensitively) is present.
    #[allow(clippy::too_many_arguments)]
    pub fn add_table(
        &self,
        tabname: &str,
        coltypid: &[Oid],
        coltypparam: &[u64],
        field_names: &[String],
        colisnullable: &[bool],
        colisarray: &[bool],
        tabfid: FileId,
    ) -> RillResult<Oid> {
        let ncols = coltypid.len();
        if ncols == 0
            || coltypparam.len() != ncols
            || field_names.len() != ncols
            || colisnullable.len() != ncols
            || colisarray.len() != ncols
        {
            return Err(RillError::invalid_argument(
                "column vectors are empty or of different lengths",
            ));
        }

        let tabid = self.allocate_oid()?;
        if self.find_table_by_name(tabname)?.is_some() {
            return Err(RillError::AlreadyExists {
                kind: "table",
                name: tabname.to_string(),
            });
        }

        let mut tabisvarlen = false;
        for &t in coltypid {
            let typ = self.find_type(t)?.ok_or_else(|| {
                RillError::invalid_argument(format!("column type {t} does not exist"))
            })?;
            tabisvarlen |= typ.typisvarlen;
        }
        let table_row = TableEntry {
            tabid,
            tabissys: false,
            tabisvarlen,
            tabncols: ncols as i16,
            tabfid,
            tabname: tabname.to_string(),
        };
        self.insert_catalog_entries(TAB_TABLE, &[table_row.datum_vector()])?;

        let column_rows: Vec<ColumnEntry> = (0..ncols)
            .map(|i| ColumnEntry {
                coltabid: tabid,
                colid: i as i16,
                coltypid: coltypid[i],
                coltypparam: coltypparam[i],
                colisnullable: colisnullable[i],
                colisarray: colisarray[i],
                colname: field_names[i].clone(),
            })
            .collect();
        let column_datums: Vec<Vec<Datum<'_>>> =
            column_rows.iter().map(ColumnEntry::datum_vector).collect();
        self.insert_catalog_entries(TAB_COLUMN, &column_datums)?;

        info!(table = tabname, oid = %tabid, columns = ncols, "added table to catalog");
        Ok(tabid)
    }

    /// Adds an index to the catalog and returns its OID.
    ///
    /// `idxcolltfuncids` and `idxcoleqfuncids` may be shorter than the key
    /// column list or hold invalid OIDs; missing comparison functions are
    /// filled in from the default operators of each key column's type, and
    /// the lookup failing is a missing-operator error.
    #[allow(clippy::too_many_arguments)]
    pub fn add_index(
        &self,
        idxname: &str,
        idxtabid: Oid,
        idxtyp: IdxType,
        idxunique: bool,
        idxcoltabcolids: &[FieldId],
        idxfid: FileId,
        idxcolltfuncids: &[Oid],
        idxcoleqfuncids: &[Oid],
    ) -> RillResult<Oid> {
        if idxcoltabcolids.is_empty() {
            return Err(RillError::invalid_argument("index has no key columns"));
        }
        if !idxtyp.is_valid() {
            return Err(RillError::invalid_argument("invalid index type"));
        }

        let idxid = self.allocate_oid()?;
        if self.find_index_by_name(idxname)?.is_some() {
            return Err(RillError::AlreadyExists {
                kind: "index",
                name: idxname.to_string(),
            });
        }

        let table_desc = self.find_table_desc(idxtabid)?.ok_or_else(|| {
            RillError::invalid_argument(format!("table {idxtabid} does not exist"))
        })?;
        let table_schema = table_desc.schema();

        // Resolve the comparison functions, falling back to the default
        // operators of each key column's type.
        let mut ltfuncs = Vec::with_capacity(idxcoltabcolids.len());
        let mut eqfuncs = Vec::with_capacity(idxcoltabcolids.len());
        for (i, &tabcol) in idxcoltabcolids.iter().enumerate() {
            if tabcol < 0 || tabcol >= table_schema.num_fields() {
                return Err(RillError::invalid_argument(format!(
                    "key column {tabcol} is out of range"
                )));
            }
            let coltyp = table_schema.field_type_id(tabcol);

            let lt = match idxcolltfuncids.get(i) {
                Some(&f) if f.is_valid() => f,
                _ if idxtyp.needs_less_operator() => {
                    self.find_operator(OpType::Lt, coltyp, coltyp)?
                }
                _ => Oid::INVALID,
            };
            let eq = match idxcoleqfuncids.get(i) {
                Some(&f) if f.is_valid() => f,
                _ if idxtyp.needs_equal_operator() => {
                    self.find_operator(OpType::Eq, coltyp, coltyp)?
                }
                _ => Oid::INVALID,
            };
            ltfuncs.push(lt);
            eqfuncs.push(eq);
        }

        let index_row = IndexEntry {
            idxid,
            idxtabid,
            idxtyp,
            idxunique,
            idxfid,
            idxname: idxname.to_string(),
        };
        self.insert_catalog_entries(TAB_INDEX, &[index_row.datum_vector()])?;

        let column_rows: Vec<IndexColumnEntry> = idxcoltabcolids
            .iter()
            .enumerate()
            .map(|(i, &tabcol)| IndexColumnEntry {
                idxcolidxid: idxid,
                idxcolid: i as i16,
                idxcoltabcolid: tabcol,
                idxcolltfuncid: ltfuncs[i],
                idxcoleqfuncid: eqfuncs[i],
            })
            .collect();
        let column_datums: Vec<Vec<Datum<'_>>> = column_rows
            .iter()
            .map(IndexColumnEntry::datum_vector)
            .collect();
        self.insert_catalog_entries(TAB_INDEX_COLUMN, &column_datums)?;

        if !idxtyp.is_volatile() {
            // Persistent indexes wait for a build pass; none runs in
            // scan-only mode.
            self.pending_index_builds.lock().push(idxid);
        }

        info!(index = idxname, oid = %idxid, table = %idxtabid, "added index to catalog");
        Ok(idxid)
    }
}

impl<S: CatalogStore> SchemaCatalog for CatCache<S> {
    fn find_type(&self, typid: Oid) -> RillResult<Arc<TypeEntry>> {
        CatCache::find_type(self, typid)?
            .ok_or_else(|| RillError::corruption(format!("type {typid} is not in the catalog")))
    }

    fn function(&self, funcid: Oid) -> RillResult<FunctionPtr> {
        self.registry.lookup(funcid)
    }
}
