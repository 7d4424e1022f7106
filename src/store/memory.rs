/*!
 * In-memory sentence store.
 *
 * Backs tests and ephemeral runs with the same trait surface as the SQLite
 * store. Records live in a map guarded by a parking_lot RwLock.
 */

use std::collections::HashMap;

use anyhow::{Result, anyhow};
use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use super::models::{NewSentence, SentenceRecord};
use super::SentenceStore;

/// Map-backed store for tests and ephemeral runs
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<HashMap<String, SentenceRecord>>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records held
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Fetch one record by id
    pub fn get(&self, id: &str) -> Option<SentenceRecord> {
        self.records.read().get(id).cloned()
    }
}

#[async_trait]
impl SentenceStore for MemoryStore {
    async fn insert_sentences(&self, task_id: &str, sentences: &[NewSentence]) -> Result<()> {
        let now = chrono::Utc::now().to_rfc3339();
        let mut records = self.records.write();
        for sentence in sentences {
            let id = Uuid::new_v4().to_string();
            records.insert(
                id.clone(),
                SentenceRecord {
                    id,
                    task_id: task_id.to_string(),
                    index: sentence.index,
                    raw_text: sentence.raw_text.clone(),
                    trans_text: None,
                    created_at: now.clone(),
                    updated_at: now.clone(),
                },
            );
        }
        Ok(())
    }

    async fn list_by_task(&self, task_id: &str) -> Result<Vec<SentenceRecord>> {
        let records = self.records.read();
        let mut rows: Vec<SentenceRecord> = records
            .values()
            .filter(|r| r.task_id == task_id)
            .cloned()
            .collect();
        rows.sort_by_key(|r| r.index);
        Ok(rows)
    }

    async fn update_translation(&self, id: &str, trans_text: &str) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .get_mut(id)
            .ok_or_else(|| anyhow!("no sentence with id '{}'", id))?;
        record.trans_text = Some(trans_text.to_string());
        record.updated_at = chrono::Utc::now().to_rfc3339();
        Ok(())
    }
}
