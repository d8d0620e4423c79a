//! SQLite-backed progress store.
//!
//! One row per idiom, keyed by idiom id. Writes are full-record upserts;
//! read-modify-write cycles go through [`ProgressStore::update`], which runs
//! inside a single transaction while holding the connection lock.

use crate::error::{StoreError, StoreResult};
use crate::models::{IdiomId, Progress, Status};
use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Result as SqlResult};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SELECT_COLUMNS: &str = "SELECT idiom_id, status, last_reviewed, review_count, study_count,
        quiz_correct_count, quiz_wrong_count, last_quiz_result, last_selected_option_idx
     FROM progress";

pub struct ProgressStore {
    conn: Mutex<Connection>,
}

impl ProgressStore {
    /// Open (or create) the store at `path`, creating parent directories.
    pub fn open(path: &Path) -> StoreResult<Self> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| StoreError::Directory {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        tracing::info!(path = %path.display(), "opened progress store");
        Ok(store)
    }

    pub fn in_memory() -> StoreResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Mutex::new(conn),
        };
        store.init()?;
        Ok(store)
    }

    /// Close the underlying connection.
    pub fn close(self) -> StoreResult<()> {
        let conn = self.conn.into_inner().map_err(|_| StoreError::Poisoned)?;
        conn.close().map_err(|(_, err)| StoreError::Sqlite(err))?;
        tracing::debug!("closed progress store");
        Ok(())
    }

    fn init(&self) -> StoreResult<()> {
        self.lock()?.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS progress (
                idiom_id INTEGER PRIMARY KEY,
                status TEXT NOT NULL,
                last_reviewed TEXT,
                review_count INTEGER NOT NULL DEFAULT 0,
                study_count INTEGER NOT NULL DEFAULT 0,
                quiz_correct_count INTEGER NOT NULL DEFAULT 0,
                quiz_wrong_count INTEGER NOT NULL DEFAULT 0,
                last_quiz_result INTEGER,
                last_selected_option_idx INTEGER
            );
            "#,
        )?;
        Ok(())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| StoreError::Poisoned)
    }

    pub fn get(&self, id: IdiomId) -> StoreResult<Option<Progress>> {
        let conn = self.lock()?;
        Ok(select_one(&conn, id)?)
    }

    /// Insert or fully overwrite the record for `progress.idiom_id`.
    pub fn put(&self, progress: &Progress) -> StoreResult<()> {
        let conn = self.lock()?;
        upsert(&conn, progress)?;
        Ok(())
    }

    /// Every stored record, in no particular order.
    pub fn get_all(&self) -> StoreResult<Vec<Progress>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(SELECT_COLUMNS)?;
        let records = stmt
            .query_map([], parse_progress_row)?
            .collect::<SqlResult<Vec<_>>>()?;
        Ok(records)
    }

    /// Atomically replace the record for `id` with `f(current)`.
    ///
    /// `f` receives `None` when no record exists yet and must return a record
    /// for the same id.
    pub fn update<F>(&self, id: IdiomId, f: F) -> StoreResult<Progress>
    where
        F: FnOnce(Option<Progress>) -> Progress,
    {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let updated = f(select_one(&tx, id)?);
        debug_assert_eq!(updated.idiom_id, id);
        upsert(&tx, &updated)?;
        tx.commit()?;
        Ok(updated)
    }
}

fn select_one(conn: &Connection, id: IdiomId) -> SqlResult<Option<Progress>> {
    conn.query_row(
        &format!("{SELECT_COLUMNS} WHERE idiom_id = ?1"),
        params![id],
        parse_progress_row,
    )
    .optional()
}

fn upsert(conn: &Connection, progress: &Progress) -> SqlResult<()> {
    conn.execute(
        "INSERT INTO progress (idiom_id, status, last_reviewed, review_count, study_count,
                quiz_correct_count, quiz_wrong_count, last_quiz_result, last_selected_option_idx)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
         ON CONFLICT(idiom_id) DO UPDATE SET
            status = excluded.status, last_reviewed = excluded.last_reviewed,
            review_count = excluded.review_count, study_count = excluded.study_count,
            quiz_correct_count = excluded.quiz_correct_count,
            quiz_wrong_count = excluded.quiz_wrong_count,
            last_quiz_result = excluded.last_quiz_result,
            last_selected_option_idx = excluded.last_selected_option_idx",
        params![
            progress.idiom_id,
            progress.status.as_str(),
            progress.last_reviewed.map(|t| t.to_rfc3339()),
            progress.review_count,
            progress.study_count,
            progress.quiz_correct_count,
            progress.quiz_wrong_count,
            progress.last_quiz_result,
            progress.last_selected_option_idx.map(|i| i as i64),
        ],
    )?;
    Ok(())
}

fn parse_progress_row(row: &rusqlite::Row) -> SqlResult<Progress> {
    let status_str: String = row.get(1)?;
    let status = status_str
        .parse::<Status>()
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, e.into()))?;

    let last_reviewed = row
        .get::<_, Option<String>>(2)?
        .map(|s| {
            DateTime::parse_from_rfc3339(&s)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(2, Type::Text, Box::new(e)))
        })
        .transpose()?;

    let last_selected_option_idx = row
        .get::<_, Option<i64>>(8)?
        .map(|i| {
            usize::try_from(i)
                .map_err(|e| rusqlite::Error::FromSqlConversionFailure(8, Type::Integer, Box::new(e)))
        })
        .transpose()?;

    Ok(Progress {
        idiom_id: row.get(0)?,
        status,
        last_reviewed,
        review_count: row.get(3)?,
        study_count: row.get(4)?,
        quiz_correct_count: row.get(5)?,
        quiz_wrong_count: row.get(6)?,
        last_quiz_result: row.get(7)?,
        last_selected_option_idx,
    })
}
