//! 生成クライアント
//!
//! 生成サービスへの4つの操作:
//! - remove_background(s): 背景除去（複数枚は並列、全件成功のみ）
//! - generate_variants: 6作風を並列生成（全件成功のみ、部分結果は捨てる）
//! - refine: 1枚を指示に従って修正
//! - suggest_concept: 商品画像からコンセプト文を提案
//!
//! 並列呼び出しは try_join_all で合流する。最初の失敗で合流が終わり、
//! 残りのリクエストの future はその場で drop される（結果は使われない）。

use futures::future::try_join_all;
use tracing::{debug, info, warn};

use crate::content::{GenerateRequest, GenerateResponse, GenerativeBackend, Part};
use crate::error::{Error, Result};
use crate::prompts::{
    build_poster_prompt, build_refine_prompt, REFERENCE_STYLE_PROMPT, REMOVE_BACKGROUND_PROMPT,
    SUGGEST_CONCEPT_PROMPT, VIBES, VIBE_NAMES,
};
use crate::types::{is_blank, GenerationParameters, ImagePayload, VARIANT_COUNT};

pub struct PosterClient<B> {
    backend: B,
}

impl<B: GenerativeBackend> PosterClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// 背景除去（1枚）
    pub async fn remove_background(&self, image: &ImagePayload) -> Result<ImagePayload> {
        let request = GenerateRequest::image(vec![
            Part::image(image),
            Part::text(REMOVE_BACKGROUND_PROMPT),
        ]);
        debug!(mime_type = %image.mime_type, "背景除去リクエスト");

        let response = self.send(&request, "背景除去").await?;
        take_first_image(response).ok_or_else(|| {
            Error::generation("AIが画像を返しませんでした。背景除去に失敗した可能性があります")
        })
    }

    /// 背景除去（複数枚を並列、入力順で返す）
    pub async fn remove_backgrounds(&self, images: &[ImagePayload]) -> Result<Vec<ImagePayload>> {
        if images.is_empty() {
            return Ok(Vec::new());
        }

        info!(count = images.len(), "背景除去を並列実行");
        try_join_all(images.iter().map(|image| self.remove_background(image))).await
    }

    /// ポスター6案を並列生成
    ///
    /// 1つでも失敗したら全体を失敗にする。エラーには失敗した作風名が入る。
    pub async fn generate_variants(&self, params: &GenerationParameters) -> Result<Vec<ImagePayload>> {
        info!(
            products = params.product_images.len(),
            references = params.reference_images.len(),
            aspect_ratio = %params.aspect_ratio,
            "ポスター生成を並列実行"
        );

        let posters = try_join_all(
            VIBES
                .iter()
                .zip(VIBE_NAMES.iter())
                .map(|(vibe, name)| self.generate_single(params, vibe, name)),
        )
        .await?;

        debug_assert_eq!(posters.len(), VARIANT_COUNT);
        Ok(posters)
    }

    async fn generate_single(
        &self,
        params: &GenerationParameters,
        vibe: &str,
        vibe_name: &str,
    ) -> Result<ImagePayload> {
        let request = GenerateRequest::image(build_poster_parts(params, vibe));
        debug!(vibe = vibe_name, images = request.image_count(), "ポスター生成リクエスト");

        let response = self
            .backend
            .generate_content(&request)
            .await
            .map_err(|e| {
                warn!(vibe = vibe_name, error = %e, "ポスター生成失敗");
                Error::generation(format!("作風 '{}' のポスター生成に失敗しました: {}", vibe_name, e))
            })?;

        take_first_image(response).ok_or_else(|| {
            warn!(vibe = vibe_name, "画像なしのレスポンス");
            Error::generation(format!(
                "AIが作風 '{}' のポスター画像を返しませんでした",
                vibe_name
            ))
        })
    }

    /// 1枚を修正
    pub async fn refine(&self, poster: &ImagePayload, instruction: &str) -> Result<ImagePayload> {
        if is_blank(instruction) {
            return Err(Error::validation("修正内容を入力してください"));
        }

        let request = GenerateRequest::image(vec![
            Part::image(poster),
            Part::text(build_refine_prompt(instruction)),
        ]);
        debug!(instruction, "修正リクエスト");

        let response = self.send(&request, "ポスター修正").await?;
        take_first_image(response).ok_or_else(|| {
            Error::generation("AIが修正後の画像を返しませんでした。別の指示を試してください")
        })
    }

    /// コンセプト案を取得（前後の空白は除く）
    pub async fn suggest_concept(&self, images: &[ImagePayload]) -> Result<String> {
        if images.is_empty() {
            return Err(Error::validation("商品画像を先にアップロードしてください"));
        }

        let mut parts: Vec<Part> = images.iter().map(Part::image).collect();
        parts.push(Part::text(SUGGEST_CONCEPT_PROMPT));
        let request = GenerateRequest::text(parts);
        debug!(images = images.len(), "コンセプト提案リクエスト");

        let response = self.send(&request, "コンセプト提案").await?;
        let text = response.text().trim().to_string();
        if text.is_empty() {
            return Err(Error::generation("AIがコンセプト案を返しませんでした"));
        }
        Ok(text)
    }

    async fn send(&self, request: &GenerateRequest, operation: &str) -> Result<GenerateResponse> {
        self.backend.generate_content(request).await.map_err(|e| {
            warn!(operation, error = %e, "生成サービス呼び出し失敗");
            Error::generation(format!("{}でAIとの通信に失敗しました: {}", operation, e))
        })
    }
}

/// ポスター生成リクエストのパート列
///
/// 商品画像（全件）→ プロンプト → 参考画像 → 参考画像の扱いの指示
pub fn build_poster_parts(params: &GenerationParameters, vibe: &str) -> Vec<Part> {
    let mut parts: Vec<Part> = params.product_images.iter().map(Part::image).collect();
    parts.push(Part::text(build_poster_prompt(params, vibe)));

    if !params.reference_images.is_empty() {
        parts.extend(params.reference_images.iter().map(Part::image));
        parts.push(Part::text(REFERENCE_STYLE_PROMPT));
    }

    parts
}

fn take_first_image(response: GenerateResponse) -> Option<ImagePayload> {
    response.first_image().cloned()
}
