//! Gemini `generateContent` client (Developer API or Vertex AI).

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{AuthMode, TinselConfig};
use crate::error::{Result, TinselError};
use crate::types::{AgentToolCall, ContentPart, ImageContent, ModelMessage, Role};

use super::http::{api_key_headers, bearer_headers, shared_client, status_to_error};
use super::schema::{is_empty_object_schema, normalize_for_gemini};
use super::{FinishReason, ModelProvider, ProviderRequest, ProviderResponse, ToolDefinition};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Low-level client for `models/{model}:generateContent`.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    auth: AuthMode,
    base_url: Option<String>,
}

impl GeminiClient {
    pub fn new(auth: AuthMode) -> Self {
        Self {
            auth,
            base_url: None,
        }
    }

    /// Build from config, honoring the base-URL override for the active mode.
    pub fn from_config(config: &TinselConfig) -> Self {
        let base_url = if config.auth.is_vertex() {
            config.vertex_base_url.clone()
        } else {
            config.gemini_base_url.clone()
        };
        Self {
            auth: config.auth.clone(),
            base_url,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn auth(&self) -> &AuthMode {
        &self.auth
    }

    /// Full `generateContent` URL for a model.
    pub fn model_url(&self, model: &str) -> String {
        match &self.auth {
            AuthMode::ApiKey { .. } => {
                let base = self.base_url.as_deref().unwrap_or(GEMINI_BASE_URL);
                format!("{}/models/{model}:generateContent", base.trim_end_matches('/'))
            }
            AuthMode::Vertex {
                project_id,
                location,
                ..
            } => {
                let base = self
                    .base_url
                    .clone()
                    .unwrap_or_else(|| vertex_base_url(location));
                format!(
                    "{}/v1/projects/{project_id}/locations/{location}/publishers/google/models/{model}:generateContent",
                    base.trim_end_matches('/')
                )
            }
        }
    }

    fn headers(&self) -> Result<HeaderMap> {
        match &self.auth {
            AuthMode::ApiKey { api_key: Some(key) } => Ok(api_key_headers(key)),
            AuthMode::ApiKey { api_key: None } => Err(TinselError::Authentication(
                "Missing GOOGLE_API_KEY".into(),
            )),
            AuthMode::Vertex {
                access_token: Some(token),
                ..
            } => Ok(bearer_headers(token)),
            AuthMode::Vertex {
                access_token: None, ..
            } => Err(TinselError::Authentication(
                "Missing GOOGLE_ACCESS_TOKEN for Vertex AI".into(),
            )),
        }
    }

    /// POST a request and parse the response.
    pub async fn generate_content(
        &self,
        model: &str,
        request: &GenerateContentRequest,
    ) -> Result<GenerateContentResponse> {
        let url = self.model_url(model);
        let headers = self.headers()?;

        debug!(model, vertex = self.auth.is_vertex(), "Gemini generateContent");

        let resp = shared_client()
            .post(&url)
            .headers(headers)
            .json(request)
            .send()
            .await?;

        let status = resp.status().as_u16();
        if status != 200 {
            let body_text = resp.text().await.unwrap_or_default();
            return Err(status_to_error(status, &body_text));
        }

        Ok(resp.json().await?)
    }
}

/// Vertex AI host for a location; `global` has no regional prefix.
pub fn vertex_base_url(location: &str) -> String {
    if location == "global" {
        "https://aiplatform.googleapis.com".to_string()
    } else {
        format!("https://{location}-aiplatform.googleapis.com")
    }
}

// Wire types

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    pub contents: Vec<Content>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDeclarations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

impl Content {
    pub fn user(parts: Vec<Part>) -> Self {
        Self {
            role: Some("user".into()),
            parts,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inline_data: Option<Blob>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_response: Option<FunctionResponse>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought_signature: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thought: Option<bool>,
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Default::default()
        }
    }

    pub fn image(image: &ImageContent) -> Self {
        Self {
            inline_data: Some(Blob {
                mime_type: image.mime_type.clone(),
                data: image.data.clone(),
            }),
            ..Default::default()
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Blob {
    pub mime_type: String,
    pub data: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub args: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionResponse {
    pub name: String,
    pub response: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ToolDeclarations {
    pub function_declarations: Vec<FunctionDeclaration>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FunctionDeclaration {
    pub name: String,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_modalities: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_config: Option<ImageConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ImageConfig {
    pub aspect_ratio: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

impl GenerateContentResponse {
    fn parts(&self) -> impl Iterator<Item = &Part> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|content| content.parts.iter())
    }

    /// Concatenated non-thought text of all candidates.
    pub fn text(&self) -> String {
        self.parts()
            .filter(|p| p.thought != Some(true))
            .filter_map(|p| p.text.as_deref())
            .collect::<Vec<_>>()
            .join("")
    }

    /// The first inline-data part, if any.
    pub fn first_inline_image(&self) -> Option<&Blob> {
        self.parts().find_map(|p| p.inline_data.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<Content>,
    #[serde(default)]
    pub finish_reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

/// `ModelProvider` backed by Gemini.
pub struct GoogleProvider {
    client: GeminiClient,
    model: String,
}

impl GoogleProvider {
    pub fn new(client: GeminiClient, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    fn build_request_body(&self, request: &ProviderRequest) -> GenerateContentRequest {
        let mut system_texts = Vec::new();
        let mut contents: Vec<Content> = Vec::new();

        for msg in &request.messages {
            match msg.role {
                Role::System => system_texts.push(msg.text()),
                Role::User => contents.push(Content::user(build_user_parts(&msg.content))),
                Role::Assistant => contents.push(Content {
                    role: Some("model".into()),
                    parts: build_model_parts(msg),
                }),
                Role::Tool => {
                    let parts: Vec<Part> = msg
                        .content
                        .iter()
                        .filter_map(|part| match part {
                            ContentPart::ToolResult(tr) => Some(Part {
                                function_response: Some(FunctionResponse {
                                    name: tr.tool_name.clone(),
                                    response: wrap_function_response(&tr.result, tr.is_error),
                                }),
                                ..Default::default()
                            }),
                            _ => None,
                        })
                        .collect();
                    // Responses to one model turn travel together in a single user turn.
                    match contents.last_mut() {
                        Some(last)
                            if last.role.as_deref() == Some("user")
                                && last.parts.iter().all(|p| p.function_response.is_some()) =>
                        {
                            last.parts.extend(parts);
                        }
                        _ => contents.push(Content::user(parts)),
                    }
                }
            }
        }

        // Gemini rejects a content entry without parts, e.g. an empty model reply.
        contents.retain(|content| !content.parts.is_empty());

        let system_instruction = (!system_texts.is_empty()).then(|| Content {
            role: None,
            parts: vec![Part::text(system_texts.join("\n\n"))],
        });

        let tools = match &request.tools {
            Some(tools) if !tools.is_empty() => vec![ToolDeclarations {
                function_declarations: tools.iter().map(function_declaration).collect(),
            }],
            _ => Vec::new(),
        };

        let generation_config = request.temperature.map(|temperature| GenerationConfig {
            temperature: Some(temperature),
            ..Default::default()
        });

        GenerateContentRequest {
            contents,
            system_instruction,
            tools,
            generation_config,
        }
    }
}

#[async_trait]
impl ModelProvider for GoogleProvider {
    fn model_id(&self) -> &str {
        &self.model
    }

    async fn generate(&self, request: &ProviderRequest) -> Result<ProviderResponse> {
        let body = self.build_request_body(request);
        let data = self.client.generate_content(&self.model, &body).await?;

        let candidate = data
            .candidates
            .first()
            .ok_or_else(|| TinselError::api(200, "No candidates in Gemini response"))?;

        let mut tool_calls = Vec::new();
        if let Some(content) = &candidate.content {
            for part in &content.parts {
                if let Some(fc) = &part.function_call {
                    tool_calls.push(AgentToolCall {
                        id: uuid::Uuid::new_v4().to_string(),
                        name: fc.name.clone(),
                        arguments: fc
                            .args
                            .clone()
                            .unwrap_or_else(|| serde_json::Value::Object(Default::default())),
                        thought_signature: part.thought_signature.clone(),
                    });
                }
            }
        }

        let finish_reason = candidate.finish_reason.as_deref().map(|reason| match reason {
            "STOP" => FinishReason::Stop,
            "MAX_TOKENS" => FinishReason::Length,
            "SAFETY" | "PROHIBITED_CONTENT" | "BLOCKLIST" => FinishReason::ContentFilter,
            _ => FinishReason::Other,
        });

        if let Some(usage) = &data.usage_metadata {
            debug!(
                model = %self.model,
                input_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "Gemini usage"
            );
        }

        Ok(ProviderResponse {
            text: data.text(),
            tool_calls,
            finish_reason,
        })
    }
}

fn build_user_parts(content: &[ContentPart]) -> Vec<Part> {
    content
        .iter()
        .filter_map(|part| match part {
            ContentPart::Text { text } => Some(Part::text(text.clone())),
            ContentPart::Image(img) => Some(Part::image(img)),
            _ => None,
        })
        .collect()
}

fn build_model_parts(msg: &ModelMessage) -> Vec<Part> {
    let mut parts = Vec::new();
    let text = msg.text();
    if !text.is_empty() {
        parts.push(Part::text(text));
    }
    for call in msg.tool_calls() {
        parts.push(Part {
            function_call: Some(FunctionCall {
                name: call.name.clone(),
                args: Some(call.arguments.clone()),
            }),
            thought_signature: call.thought_signature.clone(),
            ..Default::default()
        });
    }
    parts
}

// functionResponse.response must be a JSON object.
fn wrap_function_response(result: &serde_json::Value, is_error: bool) -> serde_json::Value {
    match result {
        serde_json::Value::Object(_) if !is_error => result.clone(),
        _ if is_error => serde_json::json!({ "error": result }),
        _ => serde_json::json!({ "result": result }),
    }
}

fn function_declaration(tool: &ToolDefinition) -> FunctionDeclaration {
    FunctionDeclaration {
        name: tool.name.clone(),
        description: tool.description.clone(),
        parameters: (!is_empty_object_schema(&tool.parameters))
            .then(|| normalize_for_gemini(&tool.parameters)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::AgentToolResult;
    use serde_json::json;

    fn provider() -> GoogleProvider {
        GoogleProvider::new(
            GeminiClient::new(AuthMode::ApiKey {
                api_key: Some("k".into()),
            }),
            "gemini-2.5-flash",
        )
    }

    #[test]
    fn api_key_url_targets_developer_api() {
        let client = GeminiClient::new(AuthMode::ApiKey { api_key: None });
        assert_eq!(
            client.model_url("gemini-2.5-flash"),
            "https://generativelanguage.googleapis.com/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn vertex_url_includes_project_and_location() {
        let client = GeminiClient::new(AuthMode::Vertex {
            project_id: "elf".into(),
            location: "us-central1".into(),
            access_token: None,
        });
        assert_eq!(
            client.model_url("gemini-2.5-flash-image"),
            "https://us-central1-aiplatform.googleapis.com/v1/projects/elf/locations/us-central1/publishers/google/models/gemini-2.5-flash-image:generateContent"
        );
    }

    #[test]
    fn global_location_uses_unprefixed_host() {
        assert_eq!(vertex_base_url("global"), "https://aiplatform.googleapis.com");
    }

    #[test]
    fn missing_credentials_is_an_authentication_error() {
        let client = GeminiClient::new(AuthMode::ApiKey { api_key: None });
        assert!(matches!(client.headers(), Err(TinselError::Authentication(_))));
    }

    #[test]
    fn request_body_maps_roles_and_tool_turns() {
        let call = AgentToolCall {
            id: "c1".into(),
            name: "get_tree_state".into(),
            arguments: json!({}),
            thought_signature: Some("sig".into()),
        };
        let request = ProviderRequest {
            messages: vec![
                ModelMessage::system("be festive"),
                ModelMessage::user("what does my tree look like?"),
                ModelMessage::assistant_tool_calls("", vec![call]),
                ModelMessage::tool_result(AgentToolResult {
                    tool_call_id: "c1".into(),
                    tool_name: "get_tree_state".into(),
                    result: json!({"theme": "emerald_gold"}),
                    is_error: false,
                }),
            ],
            tools: Some(vec![ToolDefinition {
                name: "get_tree_state".into(),
                description: "Read the tree".into(),
                parameters: json!({"type": "object", "properties": {}}),
            }]),
            temperature: None,
        };

        let body = serde_json::to_value(provider().build_request_body(&request)).unwrap();
        assert_eq!(body["systemInstruction"]["parts"][0]["text"], "be festive");
        assert_eq!(body["contents"][1]["role"], "model");
        assert_eq!(body["contents"][1]["parts"][0]["functionCall"]["name"], "get_tree_state");
        assert_eq!(body["contents"][1]["parts"][0]["thoughtSignature"], "sig");
        assert_eq!(body["contents"][2]["role"], "user");
        assert_eq!(
            body["contents"][2]["parts"][0]["functionResponse"]["response"],
            json!({"theme": "emerald_gold"})
        );
        assert!(body["tools"][0]["functionDeclarations"][0].get("parameters").is_none());
        assert!(body.get("generationConfig").is_none());
    }

    #[test]
    fn empty_model_turn_is_left_out() {
        let request = ProviderRequest {
            messages: vec![
                ModelMessage::user("hi"),
                ModelMessage::assistant(""),
                ModelMessage::user("again"),
            ],
            ..Default::default()
        };
        let body = serde_json::to_value(provider().build_request_body(&request)).unwrap();
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 2);
        for content in contents {
            assert!(!content["parts"].as_array().unwrap().is_empty(), "{content}");
            assert_eq!(content["role"], "user");
        }
    }

    #[test]
    fn consecutive_tool_results_share_one_turn() {
        let result = |id: &str, value: serde_json::Value| {
            ModelMessage::tool_result(AgentToolResult {
                tool_call_id: id.into(),
                tool_name: "update_tree_config".into(),
                result: value,
                is_error: false,
            })
        };
        let request = ProviderRequest {
            messages: vec![
                ModelMessage::user("make it red and blue"),
                result("a", json!({"status": "success"})),
                result("b", json!("plain")),
            ],
            ..Default::default()
        };
        let body = provider().build_request_body(&request);
        assert_eq!(body.contents.len(), 2);
        assert_eq!(body.contents[1].parts.len(), 2);
        assert_eq!(
            body.contents[1].parts[1]
                .function_response
                .as_ref()
                .unwrap()
                .response,
            json!({"result": "plain"})
        );
    }

    #[test]
    fn error_results_are_wrapped() {
        assert_eq!(
            wrap_function_response(&json!("timed out"), true),
            json!({"error": "timed out"})
        );
    }

    #[test]
    fn response_text_skips_thoughts() {
        let response: GenerateContentResponse = serde_json::from_value(json!({
            "candidates": [{
                "content": {"role": "model", "parts": [
                    {"text": "thinking...", "thought": true},
                    {"text": "Ho ho "},
                    {"text": "ho!"}
                ]},
                "finishReason": "STOP"
            }]
        }))
        .unwrap();
        assert_eq!(response.text(), "Ho ho ho!");
        assert!(response.first_inline_image().is_none());
    }
}
