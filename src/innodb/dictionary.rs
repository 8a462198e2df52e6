//! InnoDB data dictionary (system catalog) bootstrap.
//!
//! The pre-8.0 dictionary lives in the system space as four ordinary
//! B+Tree tables: `SYS_TABLES`, `SYS_COLUMNS`, `SYS_INDEXES` and
//! `SYS_FIELDS`. Their root pages are recorded in the dictionary header on
//! page 7 ([`DictionaryHeader`]), but their column layouts cannot be read
//! from the catalog itself, so they are hardcoded here ([`CatalogIndex`]).
//! Everything else, including the schema of every user table, is resolved
//! by scanning those four tables with [`BTreeIndex`].

use std::cell::OnceCell;
use std::collections::{BTreeMap, HashMap};

use serde::Serialize;
use tracing::{debug, warn};

use crate::innodb::btree::BTreeIndex;
use crate::innodb::constants::*;
use crate::innodb::field_decode::FieldValue;
use crate::innodb::index::{FsegHeader, Record};
use crate::innodb::page::Page;
use crate::innodb::page_types::PageType;
use crate::innodb::schema::{ColumnDef, DataType, IndexKind, RecordDescriber};
use crate::innodb::space::PageStore;
use crate::IdbError;

/// One catalog record projected to column name → value.
pub type DictionaryRow = BTreeMap<String, FieldValue>;

/// Root pages of the catalog indexes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogRoots {
    pub sys_tables: u32,
    pub sys_table_ids: u32,
    pub sys_columns: u32,
    pub sys_indexes: u32,
    pub sys_fields: u32,
}

/// Dictionary header at `FIL_PAGE_DATA` of page 7 in the system space.
#[derive(Debug, Clone, Serialize)]
pub struct DictionaryHeader {
    pub max_row_id: u64,
    pub max_table_id: u64,
    pub max_index_id: u64,
    pub max_space_id: u32,
    pub mix_id_low: u32,
    pub roots: CatalogRoots,
    pub unused_space: u32,
    pub fseg: Option<FsegHeader>,
}

impl DictionaryHeader {
    /// Parse the header from the dictionary header page.
    pub fn parse(page: &Page) -> Result<Self, IdbError> {
        if page.page_type() != PageType::Sys {
            warn!(
                page = page.number(),
                page_type = %page.page_type(),
                "dictionary header page has an unexpected type"
            );
        }
        let base = FIL_PAGE_DATA;
        let fseg_at = base + DICT_HDR_FSEG_HEADER;
        Ok(DictionaryHeader {
            max_row_id: page.read_u64(base + DICT_HDR_ROW_ID)?,
            max_table_id: page.read_u64(base + DICT_HDR_TABLE_ID)?,
            max_index_id: page.read_u64(base + DICT_HDR_INDEX_ID)?,
            max_space_id: page.read_u32(base + DICT_HDR_MAX_SPACE_ID)?,
            mix_id_low: page.read_u32(base + DICT_HDR_MIX_ID_LOW)?,
            roots: CatalogRoots {
                sys_tables: page.read_u32(base + DICT_HDR_TABLES)?,
                sys_table_ids: page.read_u32(base + DICT_HDR_TABLE_IDS)?,
                sys_columns: page.read_u32(base + DICT_HDR_COLUMNS)?,
                sys_indexes: page.read_u32(base + DICT_HDR_INDEXES)?,
                sys_fields: page.read_u32(base + DICT_HDR_FIELDS)?,
            },
            unused_space: page.read_u32(base + DICT_HDR_UNUSED_SPACE)?,
            fseg: FsegHeader::parse(page.bytes(fseg_at, FSEG_HEADER_SIZE)?),
        })
    }
}

const VARCHAR_100: DataType = DataType::VarChar { max_length: 100 };
const UINT: DataType = DataType::Integer {
    width: 4,
    unsigned: true,
};
const UBIGINT: DataType = DataType::Integer {
    width: 8,
    unsigned: true,
};

const SYS_TABLES_KEYS: &[ColumnDef] = &[ColumnDef::not_null("NAME", VARCHAR_100)];
const SYS_TABLES_ROWS: &[ColumnDef] = &[
    ColumnDef::not_null("ID", UBIGINT),
    ColumnDef::not_null("N_COLS", UINT),
    ColumnDef::not_null("TYPE", UINT),
    ColumnDef::not_null("MIX_ID", UBIGINT),
    ColumnDef::not_null("MIX_LEN", UINT),
    ColumnDef::not_null("CLUSTER_NAME", VARCHAR_100),
    ColumnDef::not_null("SPACE", UINT),
];
const SYS_TABLE_IDS_KEYS: &[ColumnDef] = &[ColumnDef::not_null("ID", UBIGINT)];
const SYS_TABLE_IDS_ROWS: &[ColumnDef] = &[ColumnDef::not_null("NAME", VARCHAR_100)];
const SYS_COLUMNS_KEYS: &[ColumnDef] = &[
    ColumnDef::not_null("TABLE_ID", UBIGINT),
    ColumnDef::not_null("POS", UINT),
];
const SYS_COLUMNS_ROWS: &[ColumnDef] = &[
    ColumnDef::not_null("NAME", VARCHAR_100),
    ColumnDef::not_null("MTYPE", UINT),
    ColumnDef::not_null("PRTYPE", UINT),
    ColumnDef::not_null("LEN", UINT),
    ColumnDef::not_null("PREC", UINT),
];
const SYS_INDEXES_KEYS: &[ColumnDef] = &[
    ColumnDef::not_null("TABLE_ID", UBIGINT),
    ColumnDef::not_null("ID", UBIGINT),
];
const SYS_INDEXES_ROWS: &[ColumnDef] = &[
    ColumnDef::not_null("NAME", VARCHAR_100),
    ColumnDef::not_null("N_FIELDS", UINT),
    ColumnDef::not_null("TYPE", UINT),
    ColumnDef::not_null("SPACE", UINT),
    ColumnDef::not_null("PAGE_NO", UINT),
];
const SYS_FIELDS_KEYS: &[ColumnDef] = &[
    ColumnDef::not_null("INDEX_ID", UBIGINT),
    ColumnDef::not_null("POS", UINT),
];
const SYS_FIELDS_ROWS: &[ColumnDef] = &[ColumnDef::not_null("COL_NAME", VARCHAR_100)];

static SYS_TABLES_PRIMARY: RecordDescriber =
    RecordDescriber::fixed(IndexKind::Clustered, SYS_TABLES_KEYS, SYS_TABLES_ROWS);
static SYS_TABLES_ID: RecordDescriber =
    RecordDescriber::fixed(IndexKind::Secondary, SYS_TABLE_IDS_KEYS, SYS_TABLE_IDS_ROWS);
static SYS_COLUMNS_PRIMARY: RecordDescriber =
    RecordDescriber::fixed(IndexKind::Clustered, SYS_COLUMNS_KEYS, SYS_COLUMNS_ROWS);
static SYS_INDEXES_PRIMARY: RecordDescriber =
    RecordDescriber::fixed(IndexKind::Clustered, SYS_INDEXES_KEYS, SYS_INDEXES_ROWS);
static SYS_FIELDS_PRIMARY: RecordDescriber =
    RecordDescriber::fixed(IndexKind::Clustered, SYS_FIELDS_KEYS, SYS_FIELDS_ROWS);

/// The five bootstrap indexes of the catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CatalogIndex {
    SysTablesPrimary,
    SysTablesId,
    SysColumnsPrimary,
    SysIndexesPrimary,
    SysFieldsPrimary,
}

impl CatalogIndex {
    pub const ALL: [CatalogIndex; 5] = [
        CatalogIndex::SysTablesPrimary,
        CatalogIndex::SysTablesId,
        CatalogIndex::SysColumnsPrimary,
        CatalogIndex::SysIndexesPrimary,
        CatalogIndex::SysFieldsPrimary,
    ];

    /// Look up a catalog index by table and index name.
    ///
    /// # Examples
    ///
    /// ```
    /// use ibr::innodb::dictionary::CatalogIndex;
    ///
    /// assert_eq!(
    ///     CatalogIndex::from_names("SYS_TABLES", "ID"),
    ///     Some(CatalogIndex::SysTablesId)
    /// );
    /// assert_eq!(CatalogIndex::from_names("SYS_COLUMNS", "ID"), None);
    /// assert_eq!(CatalogIndex::from_names("test/t", "PRIMARY"), None);
    /// ```
    pub fn from_names(table: &str, index: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|c| c.table_name() == table && c.index_name() == index)
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            CatalogIndex::SysTablesPrimary | CatalogIndex::SysTablesId => "SYS_TABLES",
            CatalogIndex::SysColumnsPrimary => "SYS_COLUMNS",
            CatalogIndex::SysIndexesPrimary => "SYS_INDEXES",
            CatalogIndex::SysFieldsPrimary => "SYS_FIELDS",
        }
    }

    pub fn index_name(&self) -> &'static str {
        match self {
            CatalogIndex::SysTablesId => "ID",
            _ => "PRIMARY",
        }
    }

    /// Fixed table id InnoDB assigns to the catalog table.
    pub fn table_id(&self) -> u64 {
        match self {
            CatalogIndex::SysTablesPrimary | CatalogIndex::SysTablesId => 1,
            CatalogIndex::SysColumnsPrimary => 2,
            CatalogIndex::SysIndexesPrimary => 3,
            CatalogIndex::SysFieldsPrimary => 4,
        }
    }

    /// Hardcoded column layout.
    pub fn describer(&self) -> &'static RecordDescriber {
        match self {
            CatalogIndex::SysTablesPrimary => &SYS_TABLES_PRIMARY,
            CatalogIndex::SysTablesId => &SYS_TABLES_ID,
            CatalogIndex::SysColumnsPrimary => &SYS_COLUMNS_PRIMARY,
            CatalogIndex::SysIndexesPrimary => &SYS_INDEXES_PRIMARY,
            CatalogIndex::SysFieldsPrimary => &SYS_FIELDS_PRIMARY,
        }
    }

    /// Root page recorded in the dictionary header.
    pub fn root(&self, header: &DictionaryHeader) -> u64 {
        let roots = &header.roots;
        let page = match self {
            CatalogIndex::SysTablesPrimary => roots.sys_tables,
            CatalogIndex::SysTablesId => roots.sys_table_ids,
            CatalogIndex::SysColumnsPrimary => roots.sys_columns,
            CatalogIndex::SysIndexesPrimary => roots.sys_indexes,
            CatalogIndex::SysFieldsPrimary => roots.sys_fields,
        };
        page as u64
    }
}

/// Where an index lives and what it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IndexRef {
    pub table_name: String,
    pub index_name: String,
    pub table_id: u64,
    pub index_id: u64,
    pub space_id: u32,
    pub root_page: u64,
    pub kind: IndexKind,
}

fn row_u64(row: &DictionaryRow, column: &str) -> Result<u64, IdbError> {
    row.get(column)
        .and_then(FieldValue::as_u64)
        .ok_or_else(|| IdbError::Parse(format!("Catalog row has no integer {}", column)))
}

fn row_str<'r>(row: &'r DictionaryRow, column: &str) -> Result<&'r str, IdbError> {
    row.get(column)
        .and_then(FieldValue::as_str)
        .ok_or_else(|| IdbError::Parse(format!("Catalog row has no string {}", column)))
}

/// Read access to the catalog of one system space.
pub struct DataDictionary<'s> {
    store: &'s dyn PageStore,
    header: DictionaryHeader,
    index_ids: OnceCell<HashMap<u64, CatalogIndex>>,
}

impl<'s> DataDictionary<'s> {
    /// Read the dictionary header from page 7 of a system space.
    pub fn new(store: &'s dyn PageStore) -> Result<Self, IdbError> {
        if !store.is_system_space() {
            return Err(IdbError::Argument(format!(
                "Space {} is not the system space; the data dictionary lives in space 0",
                store.space_id()
            )));
        }
        let header = DictionaryHeader::parse(&store.read_page(DICT_HDR_PAGE_NO)?)?;
        debug!(roots = ?header.roots, max_table_id = header.max_table_id, "dictionary header");
        Ok(DataDictionary {
            store,
            header,
            index_ids: OnceCell::new(),
        })
    }

    pub fn header(&self) -> &DictionaryHeader {
        &self.header
    }

    pub fn store(&self) -> &'s dyn PageStore {
        self.store
    }

    pub fn is_data_dictionary_table(&self, table: &str) -> bool {
        CatalogIndex::ALL.iter().any(|c| c.table_name() == table)
    }

    pub fn is_data_dictionary_index(&self, table: &str, index: &str) -> bool {
        CatalogIndex::from_names(table, index).is_some()
    }

    /// Hardcoded describer of a catalog index.
    pub fn data_dictionary_index_describer(
        &self,
        table: &str,
        index: &str,
    ) -> Option<RecordDescriber> {
        CatalogIndex::from_names(table, index).map(|c| c.describer().clone())
    }

    fn catalog_tree(&self, catalog: CatalogIndex) -> Result<BTreeIndex<'s>, IdbError> {
        BTreeIndex::open(
            self.store,
            catalog.root(&self.header),
            Some(catalog.describer().clone()),
        )
    }

    /// Open an index tree of the system space by name.
    ///
    /// Catalog indexes use their hardcoded layout; other indexes are
    /// resolved through the catalog and must live in space 0.
    pub fn index_tree_for(&self, table: &str, index: &str) -> Result<BTreeIndex<'s>, IdbError> {
        if let Some(catalog) = CatalogIndex::from_names(table, index) {
            return self.catalog_tree(catalog);
        }
        let found = self.index_by_name(table, index)?.ok_or_else(|| {
            IdbError::Argument(format!("No index {} on table {} in the catalog", index, table))
        })?;
        if found.space_id != self.store.space_id() {
            return Err(IdbError::Argument(format!(
                "Index {} of {} lives in space {}; open that tablespace instead",
                index, table, found.space_id
            )));
        }
        let describer = self.record_describer_by_index_name(table, index)?;
        BTreeIndex::open(self.store, found.root_page, describer)
    }

    /// Open a user index inside `store` (usually a file-per-table `.ibd`).
    pub fn user_index_tree<'t>(
        &self,
        store: &'t dyn PageStore,
        table: &str,
        index: &str,
    ) -> Result<BTreeIndex<'t>, IdbError> {
        let found = self.index_by_name(table, index)?.ok_or_else(|| {
            IdbError::Argument(format!("No index {} on table {} in the catalog", index, table))
        })?;
        if found.space_id != store.space_id() {
            warn!(
                table,
                index,
                catalog_space = found.space_id,
                file_space = store.space_id(),
                "space id of the file does not match the catalog"
            );
        }
        let describer = self.record_describer_by_index_name(table, index)?;
        BTreeIndex::open(store, found.root_page, describer)
    }

    /// All records of a catalog index.
    pub fn each_record_from_data_dictionary_index(
        &self,
        table: &str,
        index: &str,
    ) -> Result<Vec<Record>, IdbError> {
        let catalog = CatalogIndex::from_names(table, index).ok_or_else(|| {
            IdbError::Argument(format!("{}.{} is not a data dictionary index", table, index))
        })?;
        self.catalog_tree(catalog)?.each_record()
    }

    fn catalog_rows(&self, catalog: CatalogIndex) -> Result<Vec<DictionaryRow>, IdbError> {
        Ok(self
            .catalog_tree(catalog)?
            .each_record()?
            .iter()
            .map(Record::to_map)
            .collect())
    }

    /// `SYS_TABLES` rows.
    pub fn each_table(&self) -> Result<Vec<DictionaryRow>, IdbError> {
        self.catalog_rows(CatalogIndex::SysTablesPrimary)
    }

    /// `SYS_INDEXES` rows.
    pub fn each_index(&self) -> Result<Vec<DictionaryRow>, IdbError> {
        self.catalog_rows(CatalogIndex::SysIndexesPrimary)
    }

    /// `SYS_COLUMNS` rows.
    pub fn each_column(&self) -> Result<Vec<DictionaryRow>, IdbError> {
        self.catalog_rows(CatalogIndex::SysColumnsPrimary)
    }

    /// `SYS_FIELDS` rows.
    pub fn each_field(&self) -> Result<Vec<DictionaryRow>, IdbError> {
        self.catalog_rows(CatalogIndex::SysFieldsPrimary)
    }

    /// Table names in `SYS_TABLES` key order.
    pub fn each_table_name(&self) -> Result<Vec<String>, IdbError> {
        self.each_table()?
            .iter()
            .map(|row| row_str(row, "NAME").map(str::to_string))
            .collect()
    }

    /// `SYS_INDEXES` rows of indexes stored in `space_id`.
    pub fn each_index_by_space_id(&self, space_id: u32) -> Result<Vec<DictionaryRow>, IdbError> {
        let mut out = Vec::new();
        for row in self.each_index()? {
            if row_u64(&row, "SPACE")? == space_id as u64 {
                out.push(row);
            }
        }
        Ok(out)
    }

    /// Root pages of the indexes stored in `space_id`.
    pub fn each_index_root_page_number(&self, space_id: u32) -> Result<Vec<u64>, IdbError> {
        self.each_index_by_space_id(space_id)?
            .iter()
            .map(|row| row_u64(row, "PAGE_NO"))
            .collect()
    }

    /// Index id found on each catalog root page, built on first use.
    pub fn data_dictionary_index_ids(&self) -> Result<&HashMap<u64, CatalogIndex>, IdbError> {
        if let Some(ids) = self.index_ids.get() {
            return Ok(ids);
        }
        let mut ids = HashMap::new();
        for catalog in CatalogIndex::ALL {
            let index_id = self.catalog_tree(catalog)?.index_id()?;
            debug!(
                table = catalog.table_name(),
                index = catalog.index_name(),
                index_id,
                "catalog index id"
            );
            ids.insert(index_id, catalog);
        }
        Ok(self.index_ids.get_or_init(|| ids))
    }

    fn catalog_ref(&self, catalog: CatalogIndex, index_id: u64) -> IndexRef {
        IndexRef {
            table_name: catalog.table_name().to_string(),
            index_name: catalog.index_name().to_string(),
            table_id: catalog.table_id(),
            index_id,
            space_id: 0,
            root_page: catalog.root(&self.header),
            kind: catalog.describer().kind,
        }
    }

    fn index_ref(&self, table_name: &str, row: &DictionaryRow) -> Result<IndexRef, IdbError> {
        let kind = if row_u64(row, "TYPE")? & DICT_CLUSTERED != 0 {
            IndexKind::Clustered
        } else {
            IndexKind::Secondary
        };
        Ok(IndexRef {
            table_name: table_name.to_string(),
            index_name: row_str(row, "NAME")?.to_string(),
            table_id: row_u64(row, "TABLE_ID")?,
            index_id: row_u64(row, "ID")?,
            space_id: row_u64(row, "SPACE")? as u32,
            root_page: row_u64(row, "PAGE_NO")?,
            kind,
        })
    }

    /// `SYS_TABLES` row with the given table id.
    pub fn table_by_id(&self, table_id: u64) -> Result<Option<DictionaryRow>, IdbError> {
        for row in self.each_table()? {
            if row_u64(&row, "ID")? == table_id {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    fn table_by_name(&self, table: &str) -> Result<Option<DictionaryRow>, IdbError> {
        for row in self.each_table()? {
            if row_str(&row, "NAME")? == table {
                return Ok(Some(row));
            }
        }
        Ok(None)
    }

    /// Table and index an index id belongs to.
    pub fn index_by_id(&self, index_id: u64) -> Result<Option<IndexRef>, IdbError> {
        if let Some(catalog) = self.data_dictionary_index_ids()?.get(&index_id) {
            return Ok(Some(self.catalog_ref(*catalog, index_id)));
        }
        for row in self.each_index()? {
            if row_u64(&row, "ID")? != index_id {
                continue;
            }
            let table_id = row_u64(&row, "TABLE_ID")?;
            let table = match self.table_by_id(table_id)? {
                Some(table) => table,
                None => {
                    warn!(index_id, table_id, "index refers to a table missing from SYS_TABLES");
                    return Ok(None);
                }
            };
            return Ok(Some(self.index_ref(row_str(&table, "NAME")?, &row)?));
        }
        Ok(None)
    }

    /// Catalog entry of a user index by name.
    pub fn index_by_name(&self, table: &str, index: &str) -> Result<Option<IndexRef>, IdbError> {
        let table_row = match self.table_by_name(table)? {
            Some(row) => row,
            None => return Ok(None),
        };
        let table_id = row_u64(&table_row, "ID")?;
        for row in self.each_index()? {
            if row_u64(&row, "TABLE_ID")? == table_id && row_str(&row, "NAME")? == index {
                return Ok(Some(self.index_ref(table, &row)?));
            }
        }
        Ok(None)
    }

    /// Describer for the index with `index_id`, `None` if no catalog entry
    /// or table columns are known for it.
    pub fn record_describer_by_index_id(
        &self,
        index_id: u64,
    ) -> Result<Option<RecordDescriber>, IdbError> {
        if let Some(catalog) = self.data_dictionary_index_ids()?.get(&index_id) {
            return Ok(Some(catalog.describer().clone()));
        }
        match self.index_by_id(index_id)? {
            Some(found) => self.record_describer_by_index_name(&found.table_name, &found.index_name),
            None => {
                warn!(index_id, "index id not found in the catalog");
                Ok(None)
            }
        }
    }

    /// Strict form of [`record_describer_by_index_id`](Self::record_describer_by_index_id).
    pub fn resolve_describer(&self, index_id: u64) -> Result<RecordDescriber, IdbError> {
        self.record_describer_by_index_id(index_id)?
            .ok_or(IdbError::UnresolvedSchema { index_id })
    }

    /// Build the describer of a user index from `SYS_COLUMNS`, `SYS_INDEXES`
    /// and `SYS_FIELDS`.
    pub fn record_describer_by_index_name(
        &self,
        table: &str,
        index: &str,
    ) -> Result<Option<RecordDescriber>, IdbError> {
        if let Some(describer) = self.data_dictionary_index_describer(table, index) {
            return Ok(Some(describer));
        }
        let table_row = match self.table_by_name(table)? {
            Some(row) => row,
            None => return Ok(None),
        };
        let table_id = row_u64(&table_row, "ID")?;

        let indexes: Vec<IndexRef> = self
            .each_index()?
            .iter()
            .filter(|row| row_u64(row, "TABLE_ID").ok() == Some(table_id))
            .map(|row| self.index_ref(table, row))
            .collect::<Result<_, _>>()?;
        let target = match indexes.iter().find(|i| i.index_name == index) {
            Some(target) => target,
            None => return Ok(None),
        };

        let columns = self.table_columns(table_id)?;
        if columns.is_empty() {
            warn!(table, table_id, "no SYS_COLUMNS rows for table");
            return Ok(None);
        }
        let fields = self.index_fields()?;

        let key_columns = |index_id: u64| -> Result<Vec<ColumnDef>, IdbError> {
            fields
                .get(&index_id)
                .map(|names| names.as_slice())
                .unwrap_or_default()
                .iter()
                .map(|name| {
                    columns
                        .iter()
                        .find(|c| c.name == name.as_str())
                        .cloned()
                        .ok_or_else(|| {
                            IdbError::Parse(format!(
                                "Index field {} is not a column of {}",
                                name, table
                            ))
                        })
                })
                .collect()
        };
        let clustered_keys = || -> Result<Vec<ColumnDef>, IdbError> {
            let keys = match indexes.iter().find(|i| i.kind == IndexKind::Clustered) {
                Some(clustered) => key_columns(clustered.index_id)?,
                None => Vec::new(),
            };
            if keys.is_empty() {
                return Ok(vec![ColumnDef::not_null("DB_ROW_ID", DataType::RowId)]);
            }
            Ok(keys)
        };

        let describer = match target.kind {
            IndexKind::Clustered => {
                let keys = clustered_keys()?;
                let rows = columns
                    .iter()
                    .filter(|c| !keys.iter().any(|k| k.name == c.name))
                    .cloned()
                    .collect();
                RecordDescriber::new(IndexKind::Clustered, keys, rows)
            }
            IndexKind::Secondary => {
                let keys = key_columns(target.index_id)?;
                let rows = clustered_keys()?
                    .into_iter()
                    .filter(|c| !keys.iter().any(|k| k.name == c.name))
                    .collect();
                RecordDescriber::new(IndexKind::Secondary, keys, rows)
            }
        };
        debug!(
            table,
            index,
            keys = describer.keys.len(),
            rows = describer.rows.len(),
            "resolved user describer"
        );
        Ok(Some(describer))
    }

    /// Column definitions of a table in `POS` order.
    fn table_columns(&self, table_id: u64) -> Result<Vec<ColumnDef>, IdbError> {
        let mut rows: Vec<(u64, ColumnDef)> = Vec::new();
        for row in self.each_column()? {
            if row_u64(&row, "TABLE_ID")? != table_id {
                continue;
            }
            let name = row_str(&row, "NAME")?;
            let mtype = row_u64(&row, "MTYPE")?;
            let prtype = row_u64(&row, "PRTYPE")?;
            let len = row_u64(&row, "LEN")?;
            let data_type = DataType::from_mtype(mtype, prtype, len).unwrap_or_else(|e| {
                warn!(column = name, error = %e, "decoding column as opaque bytes");
                DataType::Opaque {
                    mtype,
                    length: len as usize,
                }
            });
            let nullable = prtype & DATA_NOT_NULL == 0;
            rows.push((row_u64(&row, "POS")?, ColumnDef::new(name, data_type, nullable)));
        }
        rows.sort_by_key(|(pos, _)| *pos);
        Ok(rows.into_iter().map(|(_, def)| def).collect())
    }

    /// Index id to key column names in `POS` order.
    fn index_fields(&self) -> Result<HashMap<u64, Vec<String>>, IdbError> {
        let mut by_index: HashMap<u64, Vec<(u64, String)>> = HashMap::new();
        for row in self.each_field()? {
            by_index
                .entry(row_u64(&row, "INDEX_ID")?)
                .or_default()
                .push((row_u64(&row, "POS")?, row_str(&row, "COL_NAME")?.to_string()));
        }
        Ok(by_index
            .into_iter()
            .map(|(id, mut names)| {
                names.sort_by_key(|(pos, _)| *pos);
                (id, names.into_iter().map(|(_, n)| n).collect())
            })
            .collect())
    }
}
