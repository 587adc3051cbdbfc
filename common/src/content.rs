//! 生成サービスとの境界
//!
//! リクエストは順序付きパート（画像 or テキスト）のリスト、
//! レスポンスも同じくパートのリスト。具体的な通信は GenerativeBackend の実装側（HTTPクライアントやテスト用モック）が担う。

use async_trait::async_trait;

use crate::error::Result;
use crate::types::ImagePayload;

/// リクエスト/レスポンスの1パート
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Part {
    InlineImage(ImagePayload),
    Text(String),
}

impl Part {
    pub fn text(text: impl Into<String>) -> Self {
        Part::Text(text.into())
    }

    pub fn image(image: &ImagePayload) -> Self {
        Part::InlineImage(image.clone())
    }
}

/// どちらのモデルに送るか
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    /// 画像を返せるモデル（画像+テキストで応答）
    Image,
    /// テキストのみのモデル
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateRequest {
    pub kind: RequestKind,
    pub parts: Vec<Part>,
}

impl GenerateRequest {
    pub fn image(parts: Vec<Part>) -> Self {
        Self {
            kind: RequestKind::Image,
            parts,
        }
    }

    pub fn text(parts: Vec<Part>) -> Self {
        Self {
            kind: RequestKind::Text,
            parts,
        }
    }

    pub fn image_count(&self) -> usize {
        self.parts
            .iter()
            .filter(|p| matches!(p, Part::InlineImage(_)))
            .count()
    }

    /// テキストパートを連結（ログ・テスト用）
    pub fn prompt_text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineImage(_) => None,
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerateResponse {
    pub parts: Vec<Part>,
}

impl GenerateResponse {
    pub fn new(parts: Vec<Part>) -> Self {
        Self { parts }
    }

    /// 最初の画像パート
    pub fn first_image(&self) -> Option<&ImagePayload> {
        self.parts.iter().find_map(|p| match p {
            Part::InlineImage(image) if !image.data.is_empty() => Some(image),
            _ => None,
        })
    }

    /// テキストパートを連結した本文
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(|p| match p {
                Part::Text(t) => Some(t.as_str()),
                Part::InlineImage(_) => None,
            })
            .collect::<String>()
    }
}

/// 生成サービス呼び出しの抽象
///
/// 実装は通信エラー・タイムアウト・不正なレスポンスをすべて `Error::Generation` に正規化して返すこと。
/// リトライはしない。
#[async_trait]
pub trait GenerativeBackend: Send + Sync {
    async fn generate_content(&self, request: &GenerateRequest) -> Result<GenerateResponse>;
}

#[async_trait]
impl<B: GenerativeBackend + ?Sized> GenerativeBackend for std::sync::Arc<B> {
    async fn generate_content(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        (**self).generate_content(request).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_image_skips_text_and_empty() {
        let response = GenerateResponse::new(vec![
            Part::text("here you go"),
            Part::InlineImage(ImagePayload::png("")),
            Part::InlineImage(ImagePayload::png("FIRST")),
            Part::InlineImage(ImagePayload::png("SECOND")),
        ]);
        assert_eq!(response.first_image().unwrap().data, "FIRST");
    }

    #[test]
    fn test_first_image_none_for_text_only() {
        let response = GenerateResponse::new(vec![Part::text("I can't do that")]);
        assert!(response.first_image().is_none());
        assert_eq!(response.text(), "I can't do that");
    }

    #[test]
    fn test_request_helpers() {
        let request = GenerateRequest::image(vec![
            Part::image(&ImagePayload::png("A")),
            Part::text("one"),
            Part::image(&ImagePayload::png("B")),
            Part::text("two"),
        ]);
        assert_eq!(request.kind, RequestKind::Image);
        assert_eq!(request.image_count(), 2);
        assert_eq!(request.prompt_text(), "one\ntwo");
    }
}
