/*!
 * End-to-end translation workflow tests
 *
 * Full pipeline runs against the SQLite store and the mock backend,
 * including resume after interruption.
 */

use std::sync::Arc;

use lingoflow::providers::mock::MockBackend;
use lingoflow::store::{NewSentence, SentenceStore, SqliteStore};
use lingoflow::translation::{BatchConfig, PipelineSettings, TranslationPipeline};

fn fast_settings(initial: usize) -> PipelineSettings {
    let mut settings = PipelineSettings::new("en", "fr");
    settings.batch = BatchConfig {
        initial_size: initial,
        min_size: 1,
        required_successes: 3,
        retry_delay_ms: 0,
    };
    settings
}

async fn sqlite_with_sentences(task_id: &str, count: usize) -> Arc<SqliteStore> {
    let store = Arc::new(SqliteStore::new_in_memory().unwrap());
    let texts: Vec<String> = (0..count).map(|i| format!("sentence {}", i)).collect();
    store
        .insert_sentences(task_id, &NewSentence::from_texts(texts))
        .await
        .unwrap();
    store
}

#[tokio::test]
async fn test_translationWorkflow_withSqliteStore_shouldPersistAllRows() {
    let store = sqlite_with_sentences("task-1", 7).await;
    let backend = Arc::new(MockBackend::with_tag("fr"));

    let pipeline = TranslationPipeline::new(
        backend.clone(),
        store.clone() as Arc<dyn SentenceStore>,
        fast_settings(3),
    );
    let report = pipeline.run("task-1", |_| {}).await.unwrap();

    assert_eq!(report.total, 7);
    assert_eq!(report.translated, 7);
    assert_eq!(report.batches, 3, "7 sentences in batches of 3, 3, 1");

    let rows = store.list_by_task("task-1").await.unwrap();
    for row in &rows {
        let trans = row.trans_text.as_deref().unwrap();
        assert_eq!(trans, format!("[fr] sentence {}", row.index));
    }
}

#[tokio::test]
async fn test_translationWorkflow_batchSizes_shouldFollowInitialSize() {
    let store = sqlite_with_sentences("task-1", 120).await;
    let backend = Arc::new(MockBackend::new());

    let pipeline = TranslationPipeline::new(
        backend.clone(),
        store as Arc<dyn SentenceStore>,
        fast_settings(50),
    );
    pipeline.run("task-1", |_| {}).await.unwrap();

    assert_eq!(backend.log().batch_sizes, vec![50, 50, 20]);
}

#[tokio::test]
async fn test_translationWorkflow_rerunAfterCompletion_shouldCallBackendNotAtAll() {
    let store = sqlite_with_sentences("task-1", 5).await;
    let backend = Arc::new(MockBackend::new());

    let pipeline = TranslationPipeline::new(
        backend.clone(),
        store.clone() as Arc<dyn SentenceStore>,
        fast_settings(10),
    );
    pipeline.run("task-1", |_| {}).await.unwrap();
    assert_eq!(backend.log().call_count, 1);

    // Second run over the same task: everything is already translated
    let fresh_backend = Arc::new(MockBackend::new());
    let pipeline = TranslationPipeline::new(
        fresh_backend.clone(),
        store as Arc<dyn SentenceStore>,
        fast_settings(10),
    );
    let report = pipeline.run("task-1", |_| {}).await.unwrap();

    assert_eq!(report.skipped, 5);
    assert_eq!(fresh_backend.log().call_count, 0);
}

#[tokio::test]
async fn test_translationWorkflow_interruptedRun_shouldResumeWherePersisted() {
    let store = sqlite_with_sentences("task-1", 6).await;
    let backend = Arc::new(MockBackend::with_tag("fr"));

    // Simulate an interrupted earlier run: its first batch of 2 was
    // persisted before the process died
    let rows = store.list_by_task("task-1").await.unwrap();
    for row in rows.iter().take(2) {
        store
            .update_translation(&row.id, &format!("[fr] {}", row.raw_text))
            .await
            .unwrap();
    }

    // Resumed run: only the 4 pending rows reach the backend
    let pipeline = TranslationPipeline::new(
        backend.clone(),
        store.clone() as Arc<dyn SentenceStore>,
        fast_settings(10),
    );
    let report = pipeline.run("task-1", |_| {}).await.unwrap();

    assert_eq!(report.skipped, 2);
    assert_eq!(report.translated, 4);
    assert_eq!(backend.log().batch_sizes, vec![4]);

    let rows = store.list_by_task("task-1").await.unwrap();
    assert!(rows.iter().all(|r| r.trans_text.is_some()));
}

#[tokio::test]
async fn test_translationWorkflow_progressBaseline_shouldStartFromSkipped() {
    let store = sqlite_with_sentences("task-1", 4).await;
    let rows = store.list_by_task("task-1").await.unwrap();
    store.update_translation(&rows[0].id, "done").await.unwrap();

    let backend = Arc::new(MockBackend::new());
    let pipeline = TranslationPipeline::new(
        backend,
        store as Arc<dyn SentenceStore>,
        fast_settings(1),
    );

    let first_report = Arc::new(parking_lot::Mutex::new(None));
    let sink = Arc::clone(&first_report);
    pipeline
        .run("task-1", move |p| {
            sink.lock().get_or_insert(p.translated);
        })
        .await
        .unwrap();

    // The first progress report already includes the pre-translated row
    assert_eq!(first_report.lock().unwrap(), 2);
}
