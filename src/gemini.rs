//! Gemini API連携
//!
//! GenerativeBackend を REST (`models/{model}:generateContent`) で実装する。
//! 画像リクエストは画像モデル、テキストリクエストはテキストモデルに送る。
//! APIキーは `x-goog-api-key` ヘッダーで送り、URLには載せない。

use async_trait::async_trait;
use poster_ai_common::{
    Error as StudioError, GenerateRequest, GenerateResponse, GenerativeBackend, ImagePayload,
    Part, RequestKind,
};
use reqwest::header::{HeaderMap, HeaderValue, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

use crate::config::Config;
use crate::error::{PosterAiError, Result};

/// 接続設定
#[derive(Debug, Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub base_url: String,
    pub image_model: String,
    pub text_model: String,
    pub timeout_seconds: u64,
}

impl GeminiSettings {
    /// 設定ファイルと環境変数から組み立てる
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            api_key: config.get_api_key()?,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            image_model: config.image_model.clone(),
            text_model: config.text_model.clone(),
            timeout_seconds: config.timeout_seconds,
        })
    }
}

const API_KEY_HEADER: &str = "x-goog-api-key";

pub struct GeminiBackend {
    client: reqwest::Client,
    settings: GeminiSettings,
    api_key: HeaderValue,
}

impl GeminiBackend {
    pub fn new(settings: GeminiSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(settings.timeout_seconds))
            .build()
            .map_err(|e| PosterAiError::Http(e.to_string()))?;
        let mut api_key = HeaderValue::from_str(&settings.api_key)
            .map_err(|_| PosterAiError::Config("APIキーに使用できない文字が含まれています".to_string()))?;
        api_key.set_sensitive(true);
        Ok(Self {
            client,
            settings,
            api_key,
        })
    }

    fn model_for(&self, kind: RequestKind) -> &str {
        match kind {
            RequestKind::Image => &self.settings.image_model,
            RequestKind::Text => &self.settings.text_model,
        }
    }

    fn build_url(&self, model: &str) -> String {
        format!("{}/models/{}:generateContent", self.settings.base_url, model)
    }
}

#[async_trait]
impl GenerativeBackend for GeminiBackend {
    async fn generate_content(
        &self,
        request: &GenerateRequest,
    ) -> poster_ai_common::Result<GenerateResponse> {
        let model = self.model_for(request.kind);
        let url = self.build_url(model);
        let body = GeminiRequest::from_request(request);

        debug!(
            model,
            images = request.image_count(),
            prompt_chars = request.prompt_text().len(),
            "Gemini API呼び出し"
        );

        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(API_KEY_HEADER, self.api_key.clone());

        let response = self
            .client
            .post(&url)
            .headers(headers)
            .json(&body)
            .send()
            .await
            .map_err(|e| StudioError::generation(format!("通信エラー: {}", e.without_url())))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| {
                StudioError::generation(format!("レスポンス読み込みエラー: {}", e.without_url()))
            })?;

        if !status.is_success() {
            let detail = serde_json::from_str::<GeminiResponse>(&text)
                .ok()
                .and_then(|r| r.error)
                .map(|e| e.message)
                .unwrap_or(text);
            return Err(StudioError::generation(format!("HTTP {}: {}", status, detail)));
        }

        debug!(status = status.as_u16(), bytes = text.len(), "Gemini API応答");
        parse_response(&text)
    }
}

// =============================================
// ワイヤーフォーマット
// =============================================

#[derive(Debug, Serialize)]
struct GeminiRequest {
    contents: Vec<Content>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

impl GeminiRequest {
    fn from_request(request: &GenerateRequest) -> Self {
        let parts = request
            .parts
            .iter()
            .map(|part| match part {
                Part::Text(text) => RequestPart::Text { text: text.clone() },
                Part::InlineImage(image) => RequestPart::InlineData {
                    inline_data: InlineData {
                        mime_type: image.mime_type.clone(),
                        data: image.data.clone(),
                    },
                },
            })
            .collect();

        let generation_config = match request.kind {
            RequestKind::Image => Some(GenerationConfig {
                response_modalities: vec!["IMAGE".to_string(), "TEXT".to_string()],
            }),
            RequestKind::Text => None,
        };

        Self {
            contents: vec![Content { parts }],
            generation_config,
        }
    }
}

#[derive(Debug, Serialize)]
struct Content {
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RequestPart {
    Text { text: String },
    InlineData { inline_data: InlineData },
}

#[derive(Debug, Serialize, Deserialize)]
struct InlineData {
    #[serde(alias = "mimeType")]
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    #[serde(rename = "responseModalities")]
    response_modalities: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<ErrorDetail>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    text: Option<String>,
    #[serde(rename = "inlineData", alias = "inline_data")]
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// レスポンスJSONを共通のパート列に変換
///
/// 先頭候補のパートだけを使う。候補がなければ Generation エラー。
fn parse_response(text: &str) -> poster_ai_common::Result<GenerateResponse> {
    let parsed: GeminiResponse = serde_json::from_str(text)
        .map_err(|e| StudioError::generation(format!("レスポンスのパースに失敗: {}", e)))?;

    if let Some(error) = parsed.error {
        return Err(StudioError::generation(format!("Gemini APIエラー: {}", error.message)));
    }

    let content = parsed
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .ok_or_else(|| StudioError::generation("モデルから応答がありませんでした"))?;

    let parts = content
        .parts
        .into_iter()
        .flat_map(|part| {
            let image = part
                .inline_data
                .map(|d| Part::InlineImage(ImagePayload::new(d.mime_type, d.data)));
            let text = part.text.map(Part::Text);
            image.into_iter().chain(text)
        })
        .collect();

    Ok(GenerateResponse::new(parts))
}
