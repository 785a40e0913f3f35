/// 생성형 AI(Gemini) 호출
///
/// REST `generateContent` 엔드포인트만 사용한다. 재시도와 캐시는 없다.
// region:    --- Imports
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

// endregion: --- Imports

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

// region:    --- Errors
#[derive(Error, Debug)]
pub enum GenAiError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("upstream returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("response carried no text")]
    EmptyResponse,

    #[error("malformed response: {0}")]
    Malformed(String),
}
// endregion: --- Errors

// region:    --- Generative Model Trait
/// 생성형 모델 트레이트
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    /// 스키마에 맞는 JSON 텍스트 생성
    async fn generate_structured(&self, prompt: &str, schema: &Value)
        -> Result<String, GenAiError>;

    /// 이미지 생성. 첫 번째 inline 이미지의 base64 데이터를 돌려준다.
    async fn generate_image(&self, prompt: &str) -> Result<Option<InlineImage>, GenAiError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    pub data: String,
}
// endregion: --- Generative Model Trait

// region:    --- Wire Types
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: Option<String>,
    data: String,
}

impl GenerateContentResponse {
    fn first_parts(self) -> Vec<Part> {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts)
            .unwrap_or_default()
    }

    fn text(self) -> Option<String> {
        let text: String = self
            .first_parts()
            .into_iter()
            .filter_map(|p| p.text)
            .collect();
        (!text.is_empty()).then_some(text)
    }

    fn inline_image(self) -> Option<InlineImage> {
        self.first_parts()
            .into_iter()
            .find_map(|p| p.inline_data)
            .map(|d| InlineImage {
                mime_type: d.mime_type.unwrap_or_else(|| "image/png".to_string()),
                data: d.data,
            })
    }
}
// endregion: --- Wire Types

// region:    --- Gemini Client
/// Gemini REST 클라이언트
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiClient {
    pub fn new(
        api_key: String,
        base_url: String,
        text_model: String,
        image_model: String,
        timeout: Option<Duration>,
    ) -> Result<Self, GenAiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        Ok(Self {
            http: builder.build()?,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            text_model,
            image_model,
        })
    }

    async fn generate_content(
        &self,
        model: &str,
        body: Value,
    ) -> Result<GenerateContentResponse, GenAiError> {
        let url = format!("{}/models/{}:generateContent", self.base_url, model);
        debug!("{:<12} --> generateContent model={}", "GenAi", model);

        let response = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json::<GenerateContentResponse>()
            .await
            .map_err(|e| GenAiError::Malformed(e.to_string()))
    }
}

fn user_contents(prompt: &str) -> Value {
    json!([{ "role": "user", "parts": [{ "text": prompt }] }])
}

#[async_trait]
impl GenerativeModel for GeminiClient {
    async fn generate_structured(
        &self,
        prompt: &str,
        schema: &Value,
    ) -> Result<String, GenAiError> {
        info!("{:<12} --> 구조화 생성 요청 model={}", "GenAi", self.text_model);
        let body = json!({
            "contents": user_contents(prompt),
            "generationConfig": {
                "responseMimeType": "application/json",
                "responseSchema": schema,
            }
        });
        self.generate_content(&self.text_model, body)
            .await?
            .text()
            .ok_or(GenAiError::EmptyResponse)
    }

    async fn generate_image(&self, prompt: &str) -> Result<Option<InlineImage>, GenAiError> {
        info!("{:<12} --> 이미지 생성 요청 model={}", "GenAi", self.image_model);
        let body = json!({ "contents": user_contents(prompt) });
        Ok(self
            .generate_content(&self.image_model, body)
            .await?
            .inline_image())
    }
}
// endregion: --- Gemini Client

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(raw: Value) -> GenerateContentResponse {
        serde_json::from_value(raw).unwrap()
    }

    #[test]
    fn text_parts_are_joined() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [{ "text": "{\"a\":" }, { "text": "1}" }] } }]
        }));
        assert_eq!(response.text().as_deref(), Some("{\"a\":1}"));
    }

    #[test]
    fn missing_candidates_yield_no_text() {
        assert!(parse(json!({})).text().is_none());
        assert!(parse(json!({ "candidates": [{}] })).text().is_none());
    }

    #[test]
    fn first_inline_image_wins() {
        let response = parse(json!({
            "candidates": [{ "content": { "parts": [
                { "text": "here you go" },
                { "inlineData": { "mimeType": "image/jpeg", "data": "AAA" } },
                { "inlineData": { "mimeType": "image/png", "data": "BBB" } }
            ] } }]
        }));
        assert_eq!(
            response.inline_image(),
            Some(InlineImage {
                mime_type: "image/jpeg".to_string(),
                data: "AAA".to_string()
            })
        );
    }
}
