/*!
 * Application controller.
 *
 * Wires configuration, the sentence store and the remote collaborators
 * into the two user-facing workflows: uploading a media file and
 * translating a task's transcript. Progress bars live here, not in the
 * core subsystems - those only expose callbacks.
 */

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::info;
use uuid::Uuid;

use crate::app_config::Config;
use crate::file_utils;
use crate::providers::openai::OpenAi;
use crate::retry::RetryPolicy;
use crate::store::{NewSentence, SentenceStore, SqliteStore};
use crate::translation::{PipelineReport, PipelineSettings, TranslationPipeline};
use crate::upload::{
    CompletedUpload, HttpPartTransport, HttpStorageIssuer, MultipartUploadSession,
    SessionSettings,
};

/// Main application controller
pub struct Controller {
    /// Application configuration
    config: Config,

    /// Sentence store shared by import and translation
    store: Arc<dyn SentenceStore>,
}

impl Controller {
    /// Create a controller with the given configuration and the default
    /// SQLite-backed store
    pub fn with_config(config: Config) -> Result<Self> {
        let store = SqliteStore::new_default().context("Failed to open sentence store")?;
        Ok(Self {
            config,
            store: Arc::new(store),
        })
    }

    /// Create a controller over an explicit store (used by tests)
    pub fn with_store(config: Config, store: Arc<dyn SentenceStore>) -> Self {
        Self { config, store }
    }

    /// Upload a media file through the multipart upload manager.
    ///
    /// The object name is derived from the file name and a content hash, so
    /// re-uploading identical content targets the same object.
    pub async fn upload_media(&self, input_file: &Path) -> Result<CompletedUpload> {
        let data = file_utils::read_file_bytes(input_file).await?;
        let object_name = file_utils::object_name_for(input_file, &data);

        info!(
            "Uploading {:?} ({} bytes) as '{}'",
            input_file,
            data.len(),
            object_name
        );

        let upload_cfg = &self.config.upload;
        let issuer = HttpStorageIssuer::new(&upload_cfg.endpoint, upload_cfg.timeout_secs)?;
        let transport = HttpPartTransport::new(upload_cfg.timeout_secs);

        let settings = SessionSettings {
            chunk_size: upload_cfg.chunk_size_bytes,
            concurrency: upload_cfg.concurrency,
            retry: RetryPolicy::new(upload_cfg.retry_count, upload_cfg.retry_backoff_ms),
        };

        let mut session =
            MultipartUploadSession::new(Arc::new(issuer), Arc::new(transport), settings);

        let total_chunks =
            crate::upload::chunk_count(data.len(), upload_cfg.chunk_size_bytes);
        let progress_bar = Self::styled_bar(total_chunks as u64, "parts");

        let pb = progress_bar.clone();
        let completed = session
            .upload(&object_name, data, move |progress| {
                pb.set_position(progress.completed_chunks as u64);
            })
            .await?;
        progress_bar.finish_with_message("upload complete");

        Ok(completed)
    }

    /// Import a sentence transcript (one sentence per line) as a new task
    pub async fn import_sentences(&self, input_file: &Path) -> Result<String> {
        let lines = file_utils::read_sentence_lines(input_file).await?;
        if lines.is_empty() {
            anyhow::bail!("transcript {:?} contains no sentences", input_file);
        }

        let task_id = Uuid::new_v4().to_string();
        let sentences = NewSentence::from_texts(lines);
        self.store
            .insert_sentences(&task_id, &sentences)
            .await
            .context("Failed to insert sentences")?;

        info!(
            "Imported {} sentence(s) from {:?} as task '{}'",
            sentences.len(),
            input_file,
            task_id
        );

        Ok(task_id)
    }

    /// Translate every pending sentence of a task
    pub async fn translate_task(&self, task_id: &str) -> Result<PipelineReport> {
        let translation_cfg = &self.config.translation;
        let backend = OpenAi::new_with_config(
            translation_cfg.api_key.clone(),
            translation_cfg.endpoint.clone(),
            translation_cfg.model.clone(),
            RetryPolicy::new(
                translation_cfg.retry_count,
                translation_cfg.retry_backoff_ms,
            ),
            translation_cfg.timeout_secs,
        );

        let settings = PipelineSettings {
            source_language: self.config.source_language.clone(),
            target_language: self.config.target_language.clone(),
            batch: translation_cfg.batch.to_batch_config(),
            template: Default::default(),
        };

        let pipeline =
            TranslationPipeline::new(Arc::new(backend), Arc::clone(&self.store), settings);

        let sentences = self.store.list_by_task(task_id).await?;
        if sentences.is_empty() {
            anyhow::bail!("task '{}' has no sentences", task_id);
        }

        let progress_bar = Self::styled_bar(sentences.len() as u64, "sentences");
        let pb = progress_bar.clone();

        let report = pipeline
            .run(task_id, move |progress| {
                pb.set_position(progress.translated as u64);
            })
            .await?;
        progress_bar.finish_with_message("translation complete");

        if report.fallback > 0 {
            log::warn!(
                "{} sentence(s) kept their original text after repeated backend failures",
                report.fallback
            );
        }

        Ok(report)
    }

    fn styled_bar(len: u64, unit: &str) -> ProgressBar {
        let progress_bar = ProgressBar::new(len);
        let template = format!(
            "{{spinner:.green}} [{{elapsed_precise}}] [{{bar:40.cyan/blue}}] {{pos}}/{{len}} {} ({{percent}}%) {{msg}}",
            unit
        );
        let style = ProgressStyle::default_bar()
            .template(&template)
            .or_else(|_| {
                ProgressStyle::default_bar()
                    .template("{spinner} [{bar:40}] {pos}/{len} ({percent}%) {msg}")
            })
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        progress_bar.set_style(style.progress_chars("█▓▒░"));
        progress_bar
    }
}
