//! The one concrete `Cursor`/`DbPool` pair the pipeline ships with: each
//! logical database is a directory under `$ASAP_HOME/db`, each table a
//! JSON array of string-keyed rows in its own file, rewritten atomically
//! on every insert. Good enough to drive the demonstration carrier and
//! the integration tests without standing up a real client library; a
//! deployment with an actual LIMS/ACORD database swaps this crate out for
//! its own `Cursor` impl.

use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use camino::{Utf8Path, Utf8PathBuf};

use asap_ports::db::{Cursor, DbError, DbPool, DbResult, Row};
use asap_utils::atomic_write;

fn table_path(dir: &Utf8Path, table: &str) -> Utf8PathBuf {
    dir.join(format!("{table}.json"))
}

fn load_rows(path: &Utf8Path) -> DbResult<Vec<Row>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    let text = std::fs::read_to_string(path).map_err(|e| DbError::QueryFailed { table: path.to_string(), reason: e.to_string() })?;
    serde_json::from_str(&text).map_err(|e| DbError::QueryFailed { table: path.to_string(), reason: e.to_string() })
}

/// One logical database: a directory of `<table>.json` files, each an
/// array of rows. Reads go straight to disk; writes serialize through an
/// in-process lock so concurrent inserts from the same run don't race
/// each other's read-modify-write of the same table file.
pub struct FileCursor {
    dir: Utf8PathBuf,
    write_lock: RwLock<()>,
}

impl FileCursor {
    pub fn new(dir: Utf8PathBuf) -> Self {
        Self { dir, write_lock: RwLock::new(()) }
    }

    /// Seeds or replaces a table wholesale, for test and demo fixtures.
    pub fn seed(&self, table: &str, rows: &[Row]) -> DbResult<()> {
        let _guard = self.write_lock.write().expect("file cursor lock poisoned");
        self.write_table(table, rows)
    }

    fn write_table(&self, table: &str, rows: &[Row]) -> DbResult<()> {
        std::fs::create_dir_all(&self.dir).map_err(|e| DbError::QueryFailed { table: table.to_string(), reason: e.to_string() })?;
        let path = table_path(&self.dir, table);
        let text = serde_json::to_string_pretty(rows).map_err(|e| DbError::QueryFailed { table: table.to_string(), reason: e.to_string() })?;
        atomic_write::write_file_atomic(&path, &text).map_err(|e| DbError::QueryFailed { table: table.to_string(), reason: e.to_string() })
    }
}

#[async_trait]
impl Cursor for FileCursor {
    async fn query(&self, table: &str, key_column: &str, key_value: &str) -> DbResult<Vec<Row>> {
        let path = table_path(&self.dir, table);
        let rows = load_rows(&path)?;
        Ok(rows.into_iter().filter(|row| row.get(key_column).map(|v| v.as_str()) == Some(key_value)).collect())
    }

    async fn insert(&self, table: &str, row: Row) -> DbResult<()> {
        let _guard = self.write_lock.write().expect("file cursor lock poisoned");
        let path = table_path(&self.dir, table);
        let mut rows = load_rows(&path)?;
        rows.push(row);
        self.write_table(table, &rows)
    }
}

/// Resolves a logical name (`sip`, `snip`, `delta_qc`, `acord`, `case_qc`,
/// `xmit`) to a per-database directory under `root`, lazily creating and
/// caching one [`FileCursor`] per name.
pub struct FileDbPool {
    root: Utf8PathBuf,
    cursors: RwLock<BTreeMap<String, Arc<FileCursor>>>,
}

impl FileDbPool {
    pub fn new(root: Utf8PathBuf) -> Self {
        Self { root, cursors: RwLock::new(BTreeMap::new()) }
    }

    pub fn cursor_dir(&self, logical_name: &str) -> Utf8PathBuf {
        self.root.join(logical_name)
    }

    pub fn cursor_for(&self, logical_name: &str) -> Arc<FileCursor> {
        if let Some(cursor) = self.cursors.read().expect("pool lock poisoned").get(logical_name) {
            return cursor.clone();
        }
        let mut guard = self.cursors.write().expect("pool lock poisoned");
        guard
            .entry(logical_name.to_string())
            .or_insert_with(|| Arc::new(FileCursor::new(self.root.join(logical_name))))
            .clone()
    }
}

#[async_trait]
impl DbPool for FileDbPool {
    async fn get_cursor(&self, logical_name: &str) -> DbResult<Arc<dyn Cursor>> {
        Ok(self.cursor_for(logical_name) as Arc<dyn Cursor>)
    }
}
