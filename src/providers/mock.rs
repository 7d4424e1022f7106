/*!
 * Mock translation backend.
 *
 * Deterministic in-process backend for tests and dry runs: translates by
 * tagging each sentence, records every call, and can be scripted to fail a
 * fixed number of times, whenever a batch contains a given substring, or
 * randomly at a configured rate.
 */

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use rand::Rng;

use crate::errors::ProviderError;

use super::{BatchTranslation, TranslationBackend};

/// Tracks calls made against the mock backend
#[derive(Debug, Default, Clone)]
pub struct CallLog {
    /// Number of translate calls made
    pub call_count: usize,

    /// Batch size of each translate call, in order
    pub batch_sizes: Vec<usize>,

    /// Last user prompt received
    pub last_user_prompt: Option<String>,
}

/// Scripted failure behavior
#[derive(Debug, Default)]
struct FailurePlan {
    /// Fail this many upcoming calls unconditionally
    fail_next: usize,

    /// Fail any batch whose input contains this substring
    fail_when_input_contains: Option<String>,

    /// Random failure probability in [0, 1)
    failure_rate: f64,
}

/// Deterministic backend for tests and dry runs
#[derive(Debug)]
pub struct MockBackend {
    log: Mutex<CallLog>,
    plan: Mutex<FailurePlan>,
    /// Tag prepended to every translated sentence
    tag: String,
}

impl MockBackend {
    /// Create a mock that "translates" by prefixing a language tag
    pub fn new() -> Self {
        Self {
            log: Mutex::new(CallLog::default()),
            plan: Mutex::new(FailurePlan::default()),
            tag: "xx".to_string(),
        }
    }

    /// Create a mock with a custom language tag
    pub fn with_tag(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Self::new()
        }
    }

    /// Fail the next `n` translate calls
    pub fn fail_times(&self, n: usize) {
        self.plan.lock().fail_next = n;
    }

    /// Fail any call whose batch contains `needle` in some sentence
    pub fn fail_when_input_contains(&self, needle: impl Into<String>) {
        self.plan.lock().fail_when_input_contains = Some(needle.into());
    }

    /// Fail calls randomly at the given rate
    pub fn with_failure_rate(self, rate: f64) -> Self {
        self.plan.lock().failure_rate = rate.clamp(0.0, 1.0);
        self
    }

    /// Snapshot of the call log
    pub fn log(&self) -> CallLog {
        self.log.lock().clone()
    }

    /// The mock translation of one sentence
    pub fn translate_text(&self, text: &str) -> String {
        format!("[{}] {}", self.tag, text)
    }

    fn should_fail(&self, inputs: &HashMap<String, String>) -> Option<ProviderError> {
        let mut plan = self.plan.lock();

        if plan.fail_next > 0 {
            plan.fail_next -= 1;
            return Some(ProviderError::ApiError {
                status_code: 500,
                message: "scripted failure".to_string(),
            });
        }

        if let Some(needle) = &plan.fail_when_input_contains {
            if inputs.values().any(|text| text.contains(needle.as_str())) {
                return Some(ProviderError::RequestFailed(format!(
                    "scripted failure: batch contains '{}'",
                    needle
                )));
            }
        }

        if plan.failure_rate > 0.0 && rand::rng().random_bool(plan.failure_rate) {
            return Some(ProviderError::ConnectionError(
                "random failure injection".to_string(),
            ));
        }

        None
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate(
        &self,
        _system_prompt: &str,
        user_prompt: &str,
    ) -> Result<BatchTranslation, ProviderError> {
        let inputs: HashMap<String, String> = serde_json::from_str(user_prompt)
            .map_err(|e| ProviderError::ParseError(format!("invalid user prompt: {}", e)))?;

        {
            let mut log = self.log.lock();
            log.call_count += 1;
            log.batch_sizes.push(inputs.len());
            log.last_user_prompt = Some(user_prompt.to_string());
        }

        if let Some(error) = self.should_fail(&inputs) {
            return Err(error);
        }

        let output = inputs
            .into_iter()
            .map(|(key, text)| (key, self.translate_text(&text)))
            .collect();

        Ok(BatchTranslation { output })
    }

    async fn test_connection(&self) -> Result<(), ProviderError> {
        Ok(())
    }
}
