// Judgment adapter backed by the OpenAI chat completions API
//
// Uses OpenAI's `json_schema` response format so the model returns a
// `Judgment` directly. The schema is generated from the Rust type with schemars.

use async_trait::async_trait;
use schemars::{schema_for, JsonSchema};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::error::JudgeError;
use super::{BaseJudge, Judgment};
use crate::common::SemanticChunk;

/// Characters of page content sent to the model.
const CONTENT_PREVIEW_CHARS: usize = 2000;

/// Characters of each chunk listed in the prompt.
const CHUNK_PREVIEW_CHARS: usize = 100;

const SYSTEM_PROMPT: &str = r#"You are a Query Fan-Out Analysis expert that analyses web content to predict how an AI search engine breaks down content into sub-queries.

Your task is to:
1. Identify the primary entity/topic
2. Generate 8-10 sub-queries that the search engine's AI would likely create from this content
3. Score each query's coverage in the content (Yes/Partial/No)
4. Provide optimisation recommendations
5. Calculate an overall coverage score (0-10)

Analyse the content the way an AI search mode would - looking for comprehensive answers across related sub-topics."#;

#[derive(Clone)]
pub struct OpenAiJudge {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiJudge {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::new(),
            api_key: api_key.into(),
            base_url: "https://api.openai.com/v1".to_string(),
            model: model.into(),
        }
    }

    /// Set a custom base URL (for Azure, proxies, etc.).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    fn request_body(&self, user_prompt: String) -> Value {
        json!({
            "model": self.model,
            "temperature": 0.0,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": user_prompt },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "query_fan_out",
                    "strict": true,
                    "schema": openai_schema::<Judgment>(),
                },
            },
        })
    }
}

#[derive(Debug, Deserialize)]
struct ChatResponseRaw {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

#[async_trait]
impl BaseJudge for OpenAiJudge {
    async fn judge(
        &self,
        title: &str,
        content: &str,
        chunks: &[SemanticChunk],
    ) -> Result<Judgment, JudgeError> {
        let start = std::time::Instant::now();
        let body = self.request_body(build_user_prompt(title, content, chunks));

        info!(model = %self.model, chunks = chunks.len(), "Calling judgment model");

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                warn!(error = %e, "Judgment request failed");
                JudgeError::Network(e.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            warn!(status = %status, error = %error_text, "Judgment API error");
            return Err(JudgeError::Api(format!("{}: {}", status, error_text)));
        }

        let raw: ChatResponseRaw = response
            .json()
            .await
            .map_err(|e| JudgeError::Parse(e.to_string()))?;

        let json_str = raw
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(JudgeError::EmptyResponse)?;

        debug!(
            model = %self.model,
            duration_ms = start.elapsed().as_millis(),
            "Judgment received"
        );

        parse_judgment(&json_str)
    }
}

/// Parse the model's JSON and clamp the score into range.
pub fn parse_judgment(json_str: &str) -> Result<Judgment, JudgeError> {
    let mut judgment: Judgment =
        serde_json::from_str(json_str).map_err(|e| JudgeError::Parse(e.to_string()))?;

    if !judgment.coverage_score.is_finite() {
        return Err(JudgeError::Parse(format!(
            "coverage score is not a number: {}",
            judgment.coverage_score
        )));
    }
    judgment.coverage_score = judgment.coverage_score.clamp(0.0, 10.0);

    Ok(judgment)
}

pub fn build_user_prompt(title: &str, content: &str, chunks: &[SemanticChunk]) -> String {
    let preview: String = content.chars().take(CONTENT_PREVIEW_CHARS).collect();
    let chunk_lines = chunks
        .iter()
        .map(|chunk| {
            let kind = serde_json::to_value(chunk.chunk_type)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string))
                .unwrap_or_default();
            let head: String = chunk.content.chars().take(CHUNK_PREVIEW_CHARS).collect();
            format!("- {}: {}...", kind, head)
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "TITLE: {}\n\nCONTENT PREVIEW: {}\n\nSEMANTIC CHUNKS DETECTED: {}\n{}\n\nAnalyse this content for query fan-out patterns and provide the structured response.",
        title,
        preview,
        chunks.len(),
        chunk_lines
    )
}

/// OpenAI strict-mode schema for `T`.
///
/// Strict mode needs `additionalProperties: false` and every property listed in
/// `required` on each object, no `$ref`s, and no `format` keywords.
pub fn openai_schema<T: JsonSchema>() -> Value {
    let mut value = serde_json::to_value(schema_for!(T)).unwrap_or_default();

    let definitions = value.get("definitions").cloned();
    if let Some(defs) = definitions {
        inline_refs(&mut value, &defs);
    }
    fix_object_schemas(&mut value);

    if let Value::Object(map) = &mut value {
        map.remove("definitions");
        map.remove("$schema");
        map.remove("title");
    }

    value
}

fn fix_object_schemas(value: &mut Value) {
    match value {
        Value::Object(map) => {
            map.remove("format");
            if map.get("type") == Some(&Value::String("object".to_string())) {
                map.insert("additionalProperties".to_string(), Value::Bool(false));
                if let Some(Value::Object(props)) = map.get("properties") {
                    let all_keys = props.keys().cloned().map(Value::String).collect();
                    map.insert("required".to_string(), Value::Array(all_keys));
                }
            }
            for (_, v) in map.iter_mut() {
                fix_object_schemas(v);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                fix_object_schemas(item);
            }
        }
        _ => {}
    }
}

fn inline_refs(value: &mut Value, definitions: &Value) {
    match value {
        Value::Object(map) => {
            if let Some(Value::String(ref_path)) = map.get("$ref").cloned() {
                if let Some(def) = ref_path
                    .strip_prefix("#/definitions/")
                    .and_then(|name| definitions.get(name))
                {
                    *value = def.clone();
                    inline_refs(value, definitions);
                    return;
                }
            }
            for (_, v) in map.iter_mut() {
                inline_refs(v, definitions);
            }
        }
        Value::Array(arr) => {
            for item in arr.iter_mut() {
                inline_refs(item, definitions);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::{ChunkType, Coverage, QueryPotential};

    #[test]
    fn test_schema_is_strict_and_inlined() {
        let schema = openai_schema::<Judgment>();
        let text = serde_json::to_string(&schema).unwrap();

        assert!(!text.contains("$ref"));
        assert!(!text.contains("definitions"));
        assert_eq!(schema["additionalProperties"], Value::Bool(false));

        let required = schema["required"].as_array().unwrap();
        for key in ["primaryEntity", "queries", "recommendations", "coverageScore"] {
            assert!(required.contains(&Value::String(key.to_string())));
        }

        let coverage = &schema["properties"]["queries"]["items"]["properties"]["coverage"];
        assert!(serde_json::to_string(coverage).unwrap().contains("Partial"));
    }

    #[test]
    fn test_parse_judgment_clamps_score() {
        let json = r#"{
            "primaryEntity": "Sourdough",
            "queries": [{"query": "q", "description": "d", "coverage": "Partial"}],
            "recommendations": ["Add a FAQ"],
            "coverageScore": 14.2
        }"#;
        let judgment = parse_judgment(json).unwrap();

        assert_eq!(judgment.coverage_score, 10.0);
        assert_eq!(judgment.queries[0].coverage, Coverage::Partial);
    }

    #[test]
    fn test_parse_judgment_rejects_bad_output() {
        assert!(matches!(parse_judgment("not json"), Err(JudgeError::Parse(_))));
        assert!(matches!(
            parse_judgment(r#"{"primaryEntity": "x"}"#),
            Err(JudgeError::Parse(_))
        ));
    }

    #[test]
    fn test_user_prompt_previews_content_and_chunks() {
        let content = "a".repeat(5000);
        let chunks = vec![SemanticChunk {
            chunk_type: ChunkType::Section,
            content: "b".repeat(300),
            length: 300,
            query_potential: QueryPotential::Medium,
        }];
        let prompt = build_user_prompt("Title", &content, &chunks);

        assert!(prompt.contains("TITLE: Title"));
        assert!(prompt.contains(&"a".repeat(2000)));
        assert!(!prompt.contains(&"a".repeat(2001)));
        assert!(prompt.contains("SEMANTIC CHUNKS DETECTED: 1"));
        assert!(prompt.contains(&format!("- section: {}...", "b".repeat(100))));
    }

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let judge = OpenAiJudge::new("sk-test", "gpt-4o").with_base_url("http://localhost:9000/v1/");
        assert_eq!(judge.base_url, "http://localhost:9000/v1");
    }
}
