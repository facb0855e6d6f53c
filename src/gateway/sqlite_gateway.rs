use std::sync::{Arc, Mutex};

use rusqlite::types::ValueRef;
use rusqlite::{params, Connection, Row};
use tracing::{debug, info};

use crate::error::{Result, ScripError};
use crate::row::ScripRow;

/// Connection target that keeps the table in memory.
pub const IN_MEMORY: &str = ":memory:";

const SELECT_ALL: &str = "SELECT id, name, description, type, time_span, streak, created_at
     FROM scrips ORDER BY id DESC";

/// Sole reader and writer of the `scrips` table.
///
/// The connection is opened on first use. Every mutating call re-reads the
/// whole table and returns it, newest id first.
#[derive(Clone)]
pub struct SqliteGateway {
    target: String,
    conn: Arc<Mutex<Option<Connection>>>,
}

impl SqliteGateway {
    /// Gateway for a database file path (or [`IN_MEMORY`]). Nothing is opened yet.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            conn: Arc::new(Mutex::new(None)),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY)
    }

    pub fn target(&self) -> &str {
        &self.target
    }

    /// Ensure the table exists and return its rows.
    pub async fn initialize(&self) -> Result<Vec<ScripRow>> {
        self.run(|conn| {
            ensure_schema(conn)?;
            select_all(conn)
        })
        .await
    }

    pub async fn select_all(&self) -> Result<Vec<ScripRow>> {
        self.run(|conn| select_all(conn)).await
    }

    /// Insert a new row; any `id` on it is ignored and a fresh one is assigned.
    pub async fn insert(&self, row: ScripRow) -> Result<Vec<ScripRow>> {
        self.run(move |conn| {
            let id = insert_row(conn, None, &row)?;
            debug!(id, "inserted scrip");
            select_all(conn)
        })
        .await
    }

    /// Overwrite the mutable columns of row `id`. `created_at` is never rewritten.
    pub async fn update(&self, id: i64, row: ScripRow) -> Result<Vec<ScripRow>> {
        self.run(move |conn| {
            let changed = conn.execute(
                "UPDATE scrips
                 SET name = ?1, description = ?2, type = ?3, time_span = ?4, streak = ?5
                 WHERE id = ?6",
                params![
                    row.name,
                    row.description,
                    row.kind.as_deref().unwrap_or("[]"),
                    row.time_span.as_deref().unwrap_or("[]"),
                    row.streak.as_deref().unwrap_or("[]"),
                    id,
                ],
            )?;
            if changed == 0 {
                return Err(ScripError::NotFound(id.to_string()));
            }
            debug!(id, "updated scrip");
            select_all(conn)
        })
        .await
    }

    pub async fn delete(&self, id: i64) -> Result<Vec<ScripRow>> {
        self.run(move |conn| {
            let changed = conn.execute("DELETE FROM scrips WHERE id = ?1", [id])?;
            if changed == 0 {
                return Err(ScripError::NotFound(id.to_string()));
            }
            debug!(id, "deleted scrip");
            select_all(conn)
        })
        .await
    }

    /// Delete every row, then insert `rows` in order keeping their ids.
    ///
    /// There is no enclosing transaction: if an item is `Err` or an insert
    /// fails, the table keeps the already inserted prefix and the error is
    /// returned. On success the inserted rows are returned in input order,
    /// each carrying the id it was stored under.
    pub async fn replace_all<I>(&self, rows: I) -> Result<Vec<ScripRow>>
    where
        I: IntoIterator<Item = Result<ScripRow>> + Send + 'static,
    {
        self.run(move |conn| {
            let removed = conn.execute("DELETE FROM scrips", [])?;
            info!(removed, "cleared scrips table");
            let mut inserted = Vec::new();
            for row in rows {
                let mut row = row?;
                let id = insert_row(conn, row.id, &row)?;
                if row.created_at.is_none() {
                    row.created_at = conn.query_row(
                        "SELECT created_at FROM scrips WHERE id = ?1",
                        [id],
                        |stored| text(stored, 0),
                    )?;
                }
                row.id = Some(id);
                inserted.push(row);
            }
            debug!(count = inserted.len(), "inserted imported rows");
            Ok(inserted)
        })
        .await
    }

    /// Run `f` on the blocking pool with the connection, opening it if needed.
    async fn run<T, F>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        let target = self.target.clone();
        tokio::task::spawn_blocking(move || {
            let mut guard = conn
                .lock()
                .map_err(|_| ScripError::Task("connection lock poisoned".to_string()))?;
            if guard.is_none() {
                *guard = Some(open(&target)?);
            }
            match guard.as_ref() {
                Some(conn) => f(conn),
                None => Err(ScripError::Task("connection unavailable".to_string())),
            }
        })
        .await?
    }

    #[cfg(test)]
    pub(crate) async fn execute_raw(&self, sql: &'static str) -> Result<()> {
        self.run(move |conn| Ok(conn.execute_batch(sql)?)).await
    }
}

fn open(target: &str) -> Result<Connection> {
    let conn = Connection::open(target).map_err(|e| ScripError::Connection {
        target: target.to_string(),
        message: e.to_string(),
    })?;
    ensure_schema(&conn)?;
    info!(target, "opened scrip store");
    Ok(conn)
}

fn ensure_schema(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS scrips (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            description TEXT NOT NULL,
            type TEXT NOT NULL,
            time_span TEXT NOT NULL,
            streak TEXT NOT NULL,
            created_at DATETIME DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Insert with an explicit id, or let AUTOINCREMENT pick one when `id` is None.
fn insert_row(conn: &Connection, id: Option<i64>, row: &ScripRow) -> Result<i64> {
    conn.execute(
        "INSERT INTO scrips (id, name, description, type, time_span, streak, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, COALESCE(?7, CURRENT_TIMESTAMP))",
        params![
            id,
            row.name,
            row.description,
            row.kind.as_deref().unwrap_or("[]"),
            row.time_span.as_deref().unwrap_or("[]"),
            row.streak.as_deref().unwrap_or("[]"),
            row.created_at,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn select_all(conn: &Connection) -> Result<Vec<ScripRow>> {
    let mut stmt = conn.prepare(SELECT_ALL)?;
    let rows = stmt
        .query_map([], |row| {
            Ok(ScripRow {
                id: row.get(0)?,
                name: text(row, 1)?.unwrap_or_default(),
                description: text(row, 2)?.unwrap_or_default(),
                kind: text(row, 3)?,
                time_span: text(row, 4)?,
                streak: text(row, 5)?,
                created_at: text(row, 6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Read a column as text whatever its storage class.
fn text(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<String>> {
    Ok(match row.get_ref(idx)? {
        ValueRef::Null => None,
        ValueRef::Integer(n) => Some(n.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    })
}
