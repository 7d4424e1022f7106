/*!
 * Record types for the sentence store.
 */

use serde::{Deserialize, Serialize};

/// A sentence to translate, as persisted in the row store
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SentenceRecord {
    /// Stable record id
    pub id: String,

    /// Task this sentence belongs to
    pub task_id: String,

    /// Position within the task's transcript; ordering key
    pub index: i64,

    /// Original sentence text
    pub raw_text: String,

    /// Translated text, written exactly once per run - by the backend or
    /// by the identity fallback, never both
    pub trans_text: Option<String>,

    /// Creation time
    pub created_at: String,

    /// Last update time
    pub updated_at: String,
}

impl SentenceRecord {
    /// Whether this sentence still needs translation
    pub fn is_pending(&self) -> bool {
        self.trans_text.is_none()
    }
}

/// A new sentence awaiting insertion
#[derive(Debug, Clone)]
pub struct NewSentence {
    /// Position within the task's transcript
    pub index: i64,

    /// Original sentence text
    pub raw_text: String,
}

impl NewSentence {
    /// Build the ordered insertion list from raw sentence texts
    pub fn from_texts<S: Into<String>>(texts: impl IntoIterator<Item = S>) -> Vec<Self> {
        texts
            .into_iter()
            .enumerate()
            .map(|(index, text)| Self {
                index: index as i64,
                raw_text: text.into(),
            })
            .collect()
    }
}
