/*!
 * Prompt construction for batch translation.
 *
 * The backend receives a system prompt rendered from a template and a user
 * prompt containing a positional JSON map of the batch: each sentence is
 * keyed by its position within the batch, and the backend must return the
 * same keys. Cardinality is validated by the pipeline, not here.
 */

use serde_json::{Map, Value};

/// System prompt template with language placeholders
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for sentence translation.
    pub const SENTENCE_TRANSLATOR: &'static str = r#"You are an expert translator specializing in {source_language} to {target_language} translation of media transcripts.

## Your Role
- Translate each sentence naturally while preserving meaning and tone
- Keep sentence boundaries exactly as given; never merge or split entries
- Preserve numbers, names and inline punctuation

## Input
You receive a JSON object mapping position keys to sentences.

## Output Requirements
- Return ONLY a valid JSON object with exactly the same keys as the input
- Each value is the translated sentence for that key
- Do not include any text outside the JSON object"#;

    /// Create a new prompt template
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default sentence translator template
    pub fn sentence_translator() -> Self {
        Self::new(Self::SENTENCE_TRANSLATOR)
    }

    /// Render the template with the given languages
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::sentence_translator()
    }
}

/// Serialize a batch into the positional JSON map the backend expects.
///
/// Keys are the 0-based positions within the batch, as strings.
pub fn build_user_prompt<S: AsRef<str>>(texts: &[S]) -> String {
    let mut map = Map::new();
    for (position, text) in texts.iter().enumerate() {
        map.insert(position.to_string(), Value::from(text.as_ref()));
    }
    Value::Object(map).to_string()
}
