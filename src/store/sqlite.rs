/*!
 * SQLite-backed sentence store.
 *
 * Persistence uses a single rusqlite connection wrapped in Arc<Mutex> and
 * accessed from async contexts through tokio's spawn_blocking, so database
 * work never blocks the runtime. An in-memory variant exists for tests.
 */

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use log::{debug, info};
use rusqlite::{Connection, params};
use uuid::Uuid;

use super::models::{NewSentence, SentenceRecord};
use super::SentenceStore;

/// Default database filename
const DEFAULT_DB_FILENAME: &str = "lingoflow.db";

/// Default database directory name under the user's data directory
const DEFAULT_DB_DIRNAME: &str = "lingoflow";

/// Create the sentences table and its task index
fn initialize_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS sentences (
            id          TEXT PRIMARY KEY,
            task_id     TEXT NOT NULL,
            idx         INTEGER NOT NULL,
            raw_text    TEXT NOT NULL,
            trans_text  TEXT,
            created_at  TEXT NOT NULL,
            updated_at  TEXT NOT NULL
        );
        CREATE INDEX IF NOT EXISTS idx_sentences_task ON sentences (task_id, idx);
        "#,
    )
    .context("Failed to initialize sentence store schema")?;

    Ok(())
}

/// SQLite-backed store with thread-safe async access
#[derive(Debug, Clone)]
pub struct SqliteStore {
    /// Path to the database file
    db_path: PathBuf,

    /// Thread-safe connection wrapped in Arc<Mutex>
    connection: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    /// Open (or create) the store at the default location
    pub fn new_default() -> Result<Self> {
        let db_path = Self::default_database_path()?;
        Self::new(&db_path)
    }

    /// Open (or create) the store at the specified path
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        // Ensure parent directory exists
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create database directory: {:?}", parent))?;
        }

        info!("Opening sentence store at: {:?}", db_path);

        let conn = Connection::open(&db_path)
            .with_context(|| format!("Failed to open database: {:?}", db_path))?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path,
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Create an in-memory store (for testing)
    pub fn new_in_memory() -> Result<Self> {
        debug!("Creating in-memory sentence store");

        let conn = Connection::open_in_memory().context("Failed to create in-memory database")?;
        initialize_schema(&conn)?;

        Ok(Self {
            db_path: PathBuf::from(":memory:"),
            connection: Arc::new(Mutex::new(conn)),
        })
    }

    /// Get the default database path
    pub fn default_database_path() -> Result<PathBuf> {
        let base_dir = dirs::data_local_dir()
            .or_else(dirs::data_dir)
            .or_else(|| dirs::home_dir().map(|h| h.join(".local").join("share")))
            .ok_or_else(|| anyhow!("Could not determine data directory"))?;

        Ok(base_dir.join(DEFAULT_DB_DIRNAME).join(DEFAULT_DB_FILENAME))
    }

    /// Get the database file path
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Execute a database operation asynchronously using spawn_blocking
    async fn execute_async<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.connection.clone();

        tokio::task::spawn_blocking(move || {
            let conn = conn
                .lock()
                .map_err(|e| anyhow!("Failed to acquire database lock: {}", e))?;

            f(&conn)
        })
        .await
        .context("Database task panicked")?
    }
}

#[async_trait]
impl SentenceStore for SqliteStore {
    async fn insert_sentences(&self, task_id: &str, sentences: &[NewSentence]) -> Result<()> {
        let task_id = task_id.to_string();
        let sentences = sentences.to_vec();

        self.execute_async(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                INSERT INTO sentences (id, task_id, idx, raw_text, trans_text, created_at, updated_at)
                VALUES (?1, ?2, ?3, ?4, NULL, datetime('now'), datetime('now'))
                "#,
            )?;

            for sentence in &sentences {
                stmt.execute(params![
                    Uuid::new_v4().to_string(),
                    task_id,
                    sentence.index,
                    sentence.raw_text,
                ])?;
            }

            Ok(())
        })
        .await
    }

    async fn list_by_task(&self, task_id: &str) -> Result<Vec<SentenceRecord>> {
        let task_id = task_id.to_string();

        self.execute_async(move |conn| {
            let mut stmt = conn.prepare(
                r#"
                SELECT id, task_id, idx, raw_text, trans_text, created_at, updated_at
                FROM sentences
                WHERE task_id = ?1
                ORDER BY idx ASC
                "#,
            )?;

            let rows = stmt
                .query_map([&task_id], |row| {
                    Ok(SentenceRecord {
                        id: row.get(0)?,
                        task_id: row.get(1)?,
                        index: row.get(2)?,
                        raw_text: row.get(3)?,
                        trans_text: row.get(4)?,
                        created_at: row.get(5)?,
                        updated_at: row.get(6)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
        .await
    }

    async fn update_translation(&self, id: &str, trans_text: &str) -> Result<()> {
        let id = id.to_string();
        let trans_text = trans_text.to_string();

        self.execute_async(move |conn| {
            let updated = conn.execute(
                r#"
                UPDATE sentences
                SET trans_text = ?1, updated_at = datetime('now')
                WHERE id = ?2
                "#,
                params![trans_text, id],
            )?;

            if updated == 0 {
                return Err(anyhow!("no sentence with id '{}'", id));
            }

            Ok(())
        })
        .await
    }
}
