//! Vector math shared by the intent classifier (§4.2) and the retriever's
//! semantic search ranking (§4.3) — both need cosine similarity over
//! embeddings, so it lives here rather than being duplicated.

use crate::traits::{ChatRequest, LlmProvider};
use alex_domain::tool::Message;
use alex_domain::Result;
use serde::Deserialize;

/// Cosine similarity between two vectors. Returns `0.0` on mismatched
/// lengths or zero magnitude rather than dividing by zero.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        tracing::warn!(len_a = a.len(), len_b = b.len(), "cosine_similarity: mismatched lengths");
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let mag_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let mag_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if mag_a == 0.0 || mag_b == 0.0 {
        return 0.0;
    }

    dot / (mag_a * mag_b)
}

/// Element-wise average of a set of vectors. Empty input yields an empty
/// vector.
pub fn compute_centroid(vectors: &[Vec<f32>]) -> Vec<f32> {
    if vectors.is_empty() {
        return Vec::new();
    }

    let dim = vectors[0].len();
    let count = vectors.len() as f32;
    let mut centroid = vec![0.0f32; dim];
    for v in vectors {
        for (acc, val) in centroid.iter_mut().zip(v.iter()) {
            *acc += val;
        }
    }
    for val in &mut centroid {
        *val /= count;
    }
    centroid
}

/// Intent + complexity pair returned by the classifier (§4.2).
#[derive(Debug, Clone, Deserialize)]
pub struct Classification {
    pub intent: String,
    pub complexity_score: f32,
    #[serde(default)]
    pub topics: Vec<String>,
    #[serde(default)]
    pub entities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct RawClassification {
    intent: String,
    #[serde(alias = "complexity")]
    complexity_score: f32,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    entities: Vec<String>,
}

/// Strips a leading/trailing ```json fence, if present.
fn strip_code_fence(s: &str) -> &str {
    let trimmed = s.trim();
    let trimmed = trimmed.strip_prefix("```json").or_else(|| trimmed.strip_prefix("```")).unwrap_or(trimmed);
    trimmed.strip_suffix("```").unwrap_or(trimmed).trim()
}

const CLASSIFIER_PROMPT: &str = "Classify the user's message. Respond with JSON only: \
{\"intent\": one of [chat, question, code_change, refactor, debug, test, memory_query, \
task_planning, creative, self_modify, trade], \
\"complexity_score\": a float from 0.0 to 1.0, \
\"topics\": an array of up to 5 short topic keywords, \
\"entities\": an array of up to 5 named entities mentioned}.";

/// Calls the model with a low temperature and a JSON-object hint, parsing
/// tolerant of code-fence wrapping. Falls back to `{chat, 0.5}` on any parse
/// failure rather than failing the turn (§4.2).
pub async fn classify(provider: &dyn LlmProvider, user_message: &str) -> Result<Classification> {
    let req = ChatRequest {
        messages: vec![Message::system(CLASSIFIER_PROMPT), Message::user(user_message)],
        temperature: Some(0.0),
        json_mode: true,
        ..Default::default()
    };

    let response = match provider.chat(req).await {
        Ok(r) => r,
        Err(_) => return Ok(fallback()),
    };

    let text = strip_code_fence(&response.content);
    match serde_json::from_str::<RawClassification>(text) {
        Ok(raw) => Ok(Classification {
            intent: raw.intent,
            complexity_score: raw.complexity_score.clamp(0.0, 1.0),
            topics: raw.topics,
            entities: raw.entities,
        }),
        Err(e) => {
            tracing::warn!(error = %e, "classifier: failed to parse model response, falling back");
            Ok(fallback())
        }
    }
}

fn fallback() -> Classification {
    Classification { intent: "chat".to_string(), complexity_score: 0.5, topics: Vec::new(), entities: Vec::new() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cosine_similarity_identical_vectors_is_one() {
        let v = vec![1.0, 2.0, 3.0];
        assert!((cosine_similarity(&v, &v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn cosine_similarity_mismatched_lengths_is_zero() {
        assert_eq!(cosine_similarity(&[1.0, 2.0], &[1.0]), 0.0);
    }

    #[test]
    fn compute_centroid_averages_elementwise() {
        let centroid = compute_centroid(&[vec![1.0, 1.0], vec![3.0, 5.0]]);
        assert_eq!(centroid, vec![2.0, 3.0]);
    }

    #[test]
    fn strip_code_fence_handles_json_fence() {
        let s = "```json\n{\"a\":1}\n```";
        assert_eq!(strip_code_fence(s), "{\"a\":1}");
    }
}
