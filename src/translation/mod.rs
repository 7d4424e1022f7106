/*!
 * Adaptive-batch translation.
 *
 * - `batch`: generic batch stepper with success/failure-driven sizing
 * - `pipeline`: sentence pipeline over a backend and a sentence store
 * - `prompts`: system/user prompt construction
 */

pub mod batch;
pub mod pipeline;
pub mod prompts;

// Re-export main types for easier usage
pub use batch::{AdaptiveBatchProcessor, BatchConfig, BatchRunState, BatchStep, BatchWorker};
pub use pipeline::{
    PipelineProgress, PipelineReport, PipelineSettings, TranslatedSentence, TranslationPipeline,
};
pub use prompts::PromptTemplate;
