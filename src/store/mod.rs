/*!
 * Sentence store abstraction and implementations.
 *
 * The row store holding sentence records is an external collaborator; this
 * crate only depends on a keyed update and an ordered per-task read. Two
 * implementations are provided: an in-memory map for tests and ephemeral
 * runs, and SQLite-backed persistence with an async-safe connection
 * wrapper.
 */

use async_trait::async_trait;
use anyhow::Result;

pub mod memory;
pub mod models;
pub mod sqlite;

pub use memory::MemoryStore;
pub use models::{NewSentence, SentenceRecord};
pub use sqlite::SqliteStore;

/// External row store holding sentence records, keyed by record id
#[async_trait]
pub trait SentenceStore: Send + Sync + std::fmt::Debug {
    /// Insert the sentences of a task in order
    async fn insert_sentences(&self, task_id: &str, sentences: &[NewSentence]) -> Result<()>;

    /// All sentence records of a task, ordered by index
    async fn list_by_task(&self, task_id: &str) -> Result<Vec<SentenceRecord>>;

    /// Set the translated text of one sentence
    async fn update_translation(&self, id: &str, trans_text: &str) -> Result<()>;
}
