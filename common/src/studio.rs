//! スタジオの状態管理
//!
//! セッション中の状態（元画像・背景除去済み画像・ポスター6案・選択・ギャラリー）を一か所で持ち、
//! ユーザー操作を生成クライアントの呼び出しに変換する。
//!
//! 各パイプラインは「開始 → 実行 → 完了」の3段階:
//! - begin_*: 前提条件をチェックし、依存する状態をクリアしてジョブを返す（同期）
//! - job.execute: 生成サービスを呼ぶ（非同期、Studioを借用しない）
//! - complete_*: チケットがまだ有効なら結果を反映する（同期）
//!
//! 元画像の追加・削除は SourceSetChanged イベントを返す。呼び出し側はそのジョブを実行して背景除去を完了させる。

use tracing::{info, warn};

use crate::client::PosterClient;
use crate::content::GenerativeBackend;
use crate::error::{Error, Result};
use crate::gallery::Gallery;
use crate::pipeline::{Completion, Pipeline, PipelineSlot, PipelineState, Ticket};
use crate::types::{
    is_blank, AspectRatio, FontStyle, GenerationParameters, ImagePayload, SourceImage,
    VARIANT_COUNT,
};

/// 生成コントロールの現在値
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PosterControls {
    pub concept: String,
    pub background_concept: String,
    pub poster_text: String,
    pub aspect_ratio: AspectRatio,
    pub font: FontStyle,
}

/// 元画像セットが変わったときのイベント
#[derive(Debug)]
pub enum SourceSetChanged {
    /// 元画像が空になった（通信なしで完了済み）
    Cleared,
    /// 背景除去を実行する必要がある
    Pending(RemovalJob),
}

/// 背景除去ジョブ
#[derive(Debug)]
pub struct RemovalJob {
    ticket: Ticket,
    images: Vec<ImagePayload>,
}

impl RemovalJob {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn images(&self) -> &[ImagePayload] {
        &self.images
    }

    pub async fn execute<B: GenerativeBackend>(
        &self,
        client: &PosterClient<B>,
    ) -> Result<Vec<ImagePayload>> {
        client.remove_backgrounds(&self.images).await
    }
}

/// ポスター生成ジョブ（パラメータは開始時点のスナップショット）
#[derive(Debug)]
pub struct GenerationJob {
    ticket: Ticket,
    params: GenerationParameters,
}

impl GenerationJob {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn params(&self) -> &GenerationParameters {
        &self.params
    }

    pub async fn execute<B: GenerativeBackend>(
        &self,
        client: &PosterClient<B>,
    ) -> Result<Vec<ImagePayload>> {
        client.generate_variants(&self.params).await
    }
}

/// 修正ジョブ
#[derive(Debug)]
pub struct RefinementJob {
    ticket: Ticket,
    /// 開始時点のバッチ（生成エポック）
    batch_epoch: u64,
    index: usize,
    poster: ImagePayload,
    instruction: String,
}

impl RefinementJob {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    pub async fn execute<B: GenerativeBackend>(
        &self,
        client: &PosterClient<B>,
    ) -> Result<ImagePayload> {
        client.refine(&self.poster, &self.instruction).await
    }
}

/// コンセプト提案ジョブ
#[derive(Debug)]
pub struct SuggestionJob {
    ticket: Ticket,
    images: Vec<ImagePayload>,
}

impl SuggestionJob {
    pub fn ticket(&self) -> Ticket {
        self.ticket
    }

    pub async fn execute<B: GenerativeBackend>(&self, client: &PosterClient<B>) -> Result<String> {
        client.suggest_concept(&self.images).await
    }
}

/// セッション状態
#[derive(Debug)]
pub struct Studio {
    product_images: Vec<SourceImage>,
    processed_images: Vec<ImagePayload>,
    reference_images: Vec<SourceImage>,
    controls: PosterControls,
    posters: Vec<ImagePayload>,
    selected: Option<usize>,
    gallery: Gallery,
    error: Option<String>,
    removal: PipelineSlot<usize>,
    generation: PipelineSlot<usize>,
    refinement: PipelineSlot<usize>,
    suggestion: PipelineSlot<()>,
}

impl Default for Studio {
    fn default() -> Self {
        Self::new()
    }
}

impl Studio {
    pub fn new() -> Self {
        Self::with_controls(PosterControls::default())
    }

    pub fn with_controls(controls: PosterControls) -> Self {
        Self {
            product_images: Vec::new(),
            processed_images: Vec::new(),
            reference_images: Vec::new(),
            controls,
            posters: Vec::new(),
            selected: None,
            gallery: Gallery::new(),
            error: None,
            removal: PipelineSlot::new(Pipeline::BackgroundRemoval),
            generation: PipelineSlot::new(Pipeline::Generation),
            refinement: PipelineSlot::new(Pipeline::Refinement),
            suggestion: PipelineSlot::new(Pipeline::Suggestion),
        }
    }

    // =============================================
    // 参照
    // =============================================

    pub fn product_images(&self) -> &[SourceImage] {
        &self.product_images
    }

    pub fn processed_images(&self) -> &[ImagePayload] {
        &self.processed_images
    }

    pub fn reference_images(&self) -> &[SourceImage] {
        &self.reference_images
    }

    pub fn controls(&self) -> &PosterControls {
        &self.controls
    }

    pub fn posters(&self) -> &[ImagePayload] {
        &self.posters
    }

    pub fn selected_index(&self) -> Option<usize> {
        self.selected
    }

    pub fn selected_poster(&self) -> Option<&ImagePayload> {
        self.selected.and_then(|i| self.posters.get(i))
    }

    pub fn gallery(&self) -> &Gallery {
        &self.gallery
    }

    pub fn gallery_mut(&mut self) -> &mut Gallery {
        &mut self.gallery
    }

    /// 表示中のエラーメッセージ
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn dismiss_error(&mut self) {
        self.error = None;
    }

    pub fn removal_state(&self) -> &PipelineState<usize> {
        self.removal.state()
    }

    pub fn generation_state(&self) -> &PipelineState<usize> {
        self.generation.state()
    }

    pub fn refinement_state(&self) -> &PipelineState<usize> {
        self.refinement.state()
    }

    pub fn suggestion_state(&self) -> &PipelineState<()> {
        self.suggestion.state()
    }

    pub fn is_busy(&self, pipeline: Pipeline) -> bool {
        match pipeline {
            Pipeline::BackgroundRemoval => self.removal.is_running(),
            Pipeline::Generation => self.generation.is_running(),
            Pipeline::Refinement => self.refinement.is_running(),
            Pipeline::Suggestion => self.suggestion.is_running(),
        }
    }

    // =============================================
    // コントロール
    // =============================================

    pub fn set_concept(&mut self, concept: impl Into<String>) {
        self.controls.concept = concept.into();
    }

    pub fn set_background_concept(&mut self, background: impl Into<String>) {
        self.controls.background_concept = background.into();
    }

    pub fn set_poster_text(&mut self, text: impl Into<String>) {
        self.controls.poster_text = text.into();
    }

    pub fn set_aspect_ratio(&mut self, aspect_ratio: AspectRatio) {
        self.controls.aspect_ratio = aspect_ratio;
    }

    pub fn set_font(&mut self, font: FontStyle) {
        self.controls.font = font;
    }

    pub fn add_reference_images(&mut self, images: Vec<SourceImage>) {
        self.reference_images.extend(images);
    }

    pub fn remove_reference_image(&mut self, index: usize) -> Result<SourceImage> {
        if index >= self.reference_images.len() {
            return Err(self.reject(Error::validation("指定された参考画像がありません")));
        }
        Ok(self.reference_images.remove(index))
    }

    // =============================================
    // 選択・ギャラリー
    // =============================================

    pub fn select_poster(&mut self, index: usize) -> Result<()> {
        if index >= self.posters.len() {
            return Err(self.reject(Error::validation("ポスター番号が範囲外です")));
        }
        self.selected = Some(index);
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// バッチ内のポスターをギャラリーに保存（重複は無視して false）
    pub fn save_poster(&mut self, index: usize) -> Result<bool> {
        let Some(poster) = self.posters.get(index).cloned() else {
            return Err(self.reject(Error::validation("ポスター番号が範囲外です")));
        };
        Ok(self.gallery.save(poster))
    }

    pub fn remove_saved_poster(&mut self, index: usize) -> Result<ImagePayload> {
        match self.gallery.remove(index) {
            Some(poster) => Ok(poster),
            None => Err(self.reject(Error::validation("指定された保存済みポスターがありません"))),
        }
    }

    // =============================================
    // 背景除去パイプライン
    // =============================================

    /// 元画像を追加
    pub fn add_product_images(&mut self, images: Vec<SourceImage>) -> SourceSetChanged {
        self.product_images.extend(images);
        self.on_source_set_changed()
    }

    /// 元画像を削除
    pub fn remove_product_image(&mut self, index: usize) -> Result<SourceSetChanged> {
        if index >= self.product_images.len() {
            return Err(self.reject(Error::validation("指定された商品画像がありません")));
        }
        self.product_images.remove(index);
        Ok(self.on_source_set_changed())
    }

    /// 元画像セットの変更に反応して背景除去を開始
    ///
    /// 背景除去済み画像・ポスター・選択は結果に関係なくクリアし、
    /// 生成と修正は打ち切って Idle に戻す。
    fn on_source_set_changed(&mut self) -> SourceSetChanged {
        self.error = None;
        self.processed_images.clear();
        self.clear_batch();
        self.generation.reset();
        self.refinement.reset();

        let ticket = self.removal.begin();
        if self.product_images.is_empty() {
            self.removal.succeed(&ticket, 0);
            info!("商品画像なし: 背景除去をスキップ");
            return SourceSetChanged::Cleared;
        }

        info!(count = self.product_images.len(), epoch = ticket.epoch, "背景除去開始");
        SourceSetChanged::Pending(RemovalJob {
            ticket,
            images: self.product_images.iter().map(|s| s.image.clone()).collect(),
        })
    }

    /// 背景除去の結果を反映
    pub fn complete_removal(
        &mut self,
        job: RemovalJob,
        result: Result<Vec<ImagePayload>>,
    ) -> Result<Completion> {
        if !self.removal.is_current(&job.ticket) {
            warn!(epoch = job.ticket.epoch, "古い背景除去結果を破棄");
            return Ok(Completion::Stale);
        }

        let result = result.and_then(|images| {
            if images.len() == job.images.len() {
                Ok(images)
            } else {
                Err(Error::generation(format!(
                    "背景除去の結果が{}件ではなく{}件でした",
                    job.images.len(),
                    images.len()
                )))
            }
        });

        match result {
            Ok(images) => {
                info!(count = images.len(), "背景除去完了");
                let count = images.len();
                self.processed_images = images;
                Ok(self.removal.succeed(&job.ticket, count))
            }
            Err(e) => {
                self.removal.fail(&job.ticket, e.message());
                Err(self.reject(e))
            }
        }
    }

    /// イベントに応じて背景除去を実行
    pub async fn process_product_images<B: GenerativeBackend>(
        &mut self,
        client: &PosterClient<B>,
        event: SourceSetChanged,
    ) -> Result<Completion> {
        match event {
            SourceSetChanged::Cleared => Ok(Completion::Applied),
            SourceSetChanged::Pending(job) => {
                let result = job.execute(client).await;
                self.complete_removal(job, result)
            }
        }
    }

    // =============================================
    // 生成パイプライン
    // =============================================

    /// ポスター生成を開始
    pub fn begin_generation(&mut self) -> Result<GenerationJob> {
        if self.processed_images.is_empty() {
            return Err(self.reject(Error::validation(
                "商品画像を1枚以上アップロードしてください",
            )));
        }
        if is_blank(&self.controls.concept) {
            return Err(self.reject(Error::validation("ポスターのコンセプトを入力してください")));
        }

        self.error = None;
        self.clear_batch();
        self.refinement.reset();

        let params = self.snapshot_parameters();
        let ticket = self.generation.begin();
        info!(epoch = ticket.epoch, "ポスター生成開始");
        Ok(GenerationJob { ticket, params })
    }

    /// 生成結果を反映（6件そろっている場合のみ）
    pub fn complete_generation(
        &mut self,
        job: GenerationJob,
        result: Result<Vec<ImagePayload>>,
    ) -> Result<Completion> {
        if !self.generation.is_current(&job.ticket) {
            warn!(epoch = job.ticket.epoch, "古い生成結果を破棄");
            return Ok(Completion::Stale);
        }

        let result = result.and_then(|posters| {
            if posters.len() == VARIANT_COUNT {
                Ok(posters)
            } else {
                Err(Error::generation(format!(
                    "ポスターが{}件ではなく{}件でした",
                    VARIANT_COUNT,
                    posters.len()
                )))
            }
        });

        match result {
            Ok(posters) => {
                info!("ポスター生成完了");
                self.posters = posters;
                self.selected = None;
                Ok(self.generation.succeed(&job.ticket, VARIANT_COUNT))
            }
            Err(e) => {
                self.generation.fail(&job.ticket, e.message());
                Err(self.reject(e))
            }
        }
    }

    pub async fn generate<B: GenerativeBackend>(
        &mut self,
        client: &PosterClient<B>,
    ) -> Result<Completion> {
        let job = self.begin_generation()?;
        let result = job.execute(client).await;
        self.complete_generation(job, result)
    }

    // =============================================
    // 修正パイプライン
    // =============================================

    /// 選択中のポスターの修正を開始
    pub fn begin_refinement(&mut self, instruction: &str) -> Result<RefinementJob> {
        let Some(index) = self.selected else {
            return Err(self.reject(Error::validation("修正するポスターを選択してください")));
        };
        let Some(poster) = self.posters.get(index).cloned() else {
            return Err(self.reject(Error::validation("選択したポスターが見つかりません")));
        };
        if is_blank(instruction) {
            return Err(self.reject(Error::validation("修正内容を入力してください")));
        }

        self.error = None;
        let ticket = self.refinement.begin();
        info!(index, epoch = ticket.epoch, "ポスター修正開始");
        Ok(RefinementJob {
            ticket,
            batch_epoch: self.generation.epoch(),
            index,
            poster,
            instruction: instruction.to_string(),
        })
    }

    /// 修正結果を反映（同じインデックスだけを置き換える）
    pub fn complete_refinement(
        &mut self,
        job: RefinementJob,
        result: Result<ImagePayload>,
    ) -> Result<Completion> {
        let batch_replaced = self.generation.epoch() != job.batch_epoch;
        if !self.refinement.is_current(&job.ticket) || batch_replaced || job.index >= self.posters.len() {
            warn!(index = job.index, epoch = job.ticket.epoch, "古い修正結果を破棄");
            return Ok(Completion::Stale);
        }

        match result {
            Ok(poster) => {
                info!(index = job.index, "ポスター修正完了");
                self.posters[job.index] = poster;
                Ok(self.refinement.succeed(&job.ticket, job.index))
            }
            Err(e) => {
                self.refinement.fail(&job.ticket, e.message());
                Err(self.reject(e))
            }
        }
    }

    pub async fn refine<B: GenerativeBackend>(
        &mut self,
        client: &PosterClient<B>,
        instruction: &str,
    ) -> Result<Completion> {
        let job = self.begin_refinement(instruction)?;
        let result = job.execute(client).await;
        self.complete_refinement(job, result)
    }

    // =============================================
    // コンセプト提案パイプライン
    // =============================================

    pub fn begin_suggestion(&mut self) -> Result<SuggestionJob> {
        if self.processed_images.is_empty() {
            return Err(self.reject(Error::validation("商品画像を先にアップロードしてください")));
        }

        self.error = None;
        let ticket = self.suggestion.begin();
        info!(epoch = ticket.epoch, "コンセプト提案開始");
        Ok(SuggestionJob {
            ticket,
            images: self.processed_images.clone(),
        })
    }

    /// 提案結果でコンセプトを上書き（追記しない）
    pub fn complete_suggestion(
        &mut self,
        job: SuggestionJob,
        result: Result<String>,
    ) -> Result<Completion> {
        if !self.suggestion.is_current(&job.ticket) {
            warn!(epoch = job.ticket.epoch, "古い提案結果を破棄");
            return Ok(Completion::Stale);
        }

        match result {
            Ok(concept) => {
                self.controls.concept = concept;
                Ok(self.suggestion.succeed(&job.ticket, ()))
            }
            Err(e) => {
                self.suggestion.fail(&job.ticket, e.message());
                Err(self.reject(e))
            }
        }
    }

    pub async fn suggest_concept<B: GenerativeBackend>(
        &mut self,
        client: &PosterClient<B>,
    ) -> Result<Completion> {
        let job = self.begin_suggestion()?;
        let result = job.execute(client).await;
        self.complete_suggestion(job, result)
    }

    // =============================================
    // 内部
    // =============================================

    fn clear_batch(&mut self) {
        self.posters.clear();
        self.selected = None;
    }

    fn snapshot_parameters(&self) -> GenerationParameters {
        GenerationParameters {
            product_images: self.processed_images.clone(),
            concept: self.controls.concept.clone(),
            background_concept: self.controls.background_concept.clone(),
            poster_text: self.controls.poster_text.clone(),
            aspect_ratio: self.controls.aspect_ratio,
            font_style: Some(self.controls.font.descriptor().to_string()),
            reference_images: self.reference_images.iter().map(|r| r.image.clone()).collect(),
        }
    }

    /// エラーを表示状態にして返す
    fn reject(&mut self, error: Error) -> Error {
        self.error = Some(error.message().to_string());
        error
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(tag: &str) -> SourceImage {
        SourceImage::new(format!("{}.jpg", tag), ImagePayload::new("image/jpeg", tag))
    }

    fn cutouts(tags: &[&str]) -> Vec<ImagePayload> {
        tags.iter().map(|t| ImagePayload::png(format!("{}-cut", t))).collect()
    }

    fn batch(prefix: &str) -> Vec<ImagePayload> {
        (0..VARIANT_COUNT)
            .map(|i| ImagePayload::png(format!("{}{}", prefix, i)))
            .collect()
    }

    /// 背景除去済み・コンセプト入力済みのスタジオ
    fn ready_studio() -> Studio {
        let mut studio = Studio::new();
        let SourceSetChanged::Pending(job) = studio.add_product_images(vec![source("a")]) else {
            panic!("removal job expected");
        };
        studio.complete_removal(job, Ok(cutouts(&["a"]))).unwrap();
        studio.set_concept("Citrus summer");
        studio
    }

    fn studio_with_batch() -> Studio {
        let mut studio = ready_studio();
        let job = studio.begin_generation().unwrap();
        studio.complete_generation(job, Ok(batch("p"))).unwrap();
        studio
    }

    // =============================================
    // 背景除去
    // =============================================

    #[test]
    fn test_add_images_starts_removal() {
        let mut studio = Studio::new();
        let event = studio.add_product_images(vec![source("a"), source("b")]);

        let SourceSetChanged::Pending(job) = event else {
            panic!("removal job expected");
        };
        assert_eq!(job.images().len(), 2);
        assert!(studio.is_busy(Pipeline::BackgroundRemoval));

        let completion = studio.complete_removal(job, Ok(cutouts(&["a", "b"]))).unwrap();
        assert_eq!(completion, Completion::Applied);
        assert_eq!(studio.processed_images().len(), 2);
        assert_eq!(studio.processed_images()[1].data, "b-cut");
        assert_eq!(studio.removal_state(), &PipelineState::Succeeded(2));
    }

    #[test]
    fn test_removing_last_image_short_circuits() {
        let mut studio = ready_studio();
        let event = studio.remove_product_image(0).unwrap();

        assert!(matches!(event, SourceSetChanged::Cleared));
        assert!(studio.processed_images().is_empty());
        assert_eq!(studio.removal_state(), &PipelineState::Succeeded(0));
        assert!(!studio.is_busy(Pipeline::BackgroundRemoval));
    }

    #[test]
    fn test_remove_product_image_out_of_range() {
        let mut studio = Studio::new();
        let err = studio.remove_product_image(3).unwrap_err();
        assert!(err.is_validation());
        assert!(studio.error().is_some());
    }

    #[test]
    fn test_removal_failure_leaves_processed_empty() {
        let mut studio = ready_studio();
        let SourceSetChanged::Pending(job) = studio.add_product_images(vec![source("b")]) else {
            panic!("removal job expected");
        };

        let err = studio
            .complete_removal(job, Err(Error::generation("no image")))
            .unwrap_err();
        assert!(err.is_generation());
        assert!(studio.processed_images().is_empty());
        assert_eq!(studio.error(), Some("no image"));
        assert_eq!(studio.removal_state().error(), Some("no image"));
    }

    #[test]
    fn test_removal_result_with_wrong_count_fails() {
        let mut studio = Studio::new();
        let SourceSetChanged::Pending(job) = studio.add_product_images(vec![source("a"), source("b")]) else {
            panic!("removal job expected");
        };
        assert!(studio.complete_removal(job, Ok(cutouts(&["a"]))).is_err());
        assert!(studio.processed_images().is_empty());
    }

    #[test]
    fn test_newer_removal_supersedes_older() {
        let mut studio = Studio::new();
        let SourceSetChanged::Pending(first) = studio.add_product_images(vec![source("a")]) else {
            panic!("removal job expected");
        };
        let SourceSetChanged::Pending(second) = studio.add_product_images(vec![source("b")]) else {
            panic!("removal job expected");
        };

        assert_eq!(studio.complete_removal(first, Ok(cutouts(&["a"]))).unwrap(), Completion::Stale);
        assert!(studio.processed_images().is_empty());

        studio.complete_removal(second, Ok(cutouts(&["a", "b"]))).unwrap();
        assert_eq!(studio.processed_images().len(), 2);
    }

    #[test]
    fn test_new_upload_clears_batch_and_selection() {
        let mut studio = studio_with_batch();
        studio.select_poster(3).unwrap();

        let _event = studio.add_product_images(vec![source("b")]);
        assert!(studio.posters().is_empty());
        assert_eq!(studio.selected_index(), None);
        assert!(studio.processed_images().is_empty());
        assert_eq!(studio.generation_state(), &PipelineState::Idle);
    }

    // =============================================
    // 生成
    // =============================================

    #[test]
    fn test_generation_requires_processed_images() {
        let mut studio = Studio::new();
        studio.set_concept("something");
        let err = studio.begin_generation().unwrap_err();
        assert!(err.is_validation());
        assert!(!studio.is_busy(Pipeline::Generation));
    }

    #[test]
    fn test_generation_requires_concept() {
        let mut studio = ready_studio();
        studio.set_concept("   ");
        let err = studio.begin_generation().unwrap_err();
        assert!(err.is_validation());
        assert_eq!(studio.error(), Some("ポスターのコンセプトを入力してください"));
        assert_eq!(studio.generation_state(), &PipelineState::Idle);
    }

    #[test]
    fn test_generation_snapshot_ignores_later_edits() {
        let mut studio = ready_studio();
        studio.set_poster_text("SALE");
        studio.set_font(FontStyle::BoldDisplay);
        studio.add_reference_images(vec![source("ref")]);

        let job = studio.begin_generation().unwrap();
        studio.set_concept("changed");
        studio.set_poster_text("");

        assert_eq!(job.params().concept, "Citrus summer");
        assert_eq!(job.params().poster_text, "SALE");
        assert_eq!(job.params().font_style.as_deref(), Some(FontStyle::BoldDisplay.descriptor()));
        assert_eq!(job.params().product_images, cutouts(&["a"]));
        assert_eq!(job.params().reference_images.len(), 1);
    }

    #[test]
    fn test_generation_clears_previous_batch_on_start() {
        let mut studio = studio_with_batch();
        studio.select_poster(1).unwrap();

        let job = studio.begin_generation().unwrap();
        assert!(studio.posters().is_empty());
        assert_eq!(studio.selected_index(), None);

        let err = studio
            .complete_generation(job, Err(Error::generation("retro failed")))
            .unwrap_err();
        assert!(err.is_generation());
        assert!(studio.posters().is_empty());
    }

    #[test]
    fn test_generation_rejects_partial_batch() {
        let mut studio = ready_studio();
        let job = studio.begin_generation().unwrap();
        let mut partial = batch("p");
        partial.truncate(5);

        assert!(studio.complete_generation(job, Ok(partial)).is_err());
        assert!(studio.posters().is_empty());
    }

    #[test]
    fn test_late_generation_after_upload_is_discarded() {
        let mut studio = ready_studio();
        let job = studio.begin_generation().unwrap();

        let _event = studio.add_product_images(vec![source("b")]);
        assert_eq!(studio.generation_state(), &PipelineState::Idle);

        let completion = studio.complete_generation(job, Ok(batch("late"))).unwrap();
        assert_eq!(completion, Completion::Stale);
        assert!(studio.posters().is_empty());
    }

    // =============================================
    // 修正
    // =============================================

    #[test]
    fn test_refinement_requires_selection() {
        let mut studio = studio_with_batch();
        let err = studio.begin_refinement("make it blue").unwrap_err();
        assert_eq!(err.message(), "修正するポスターを選択してください");
    }

    #[test]
    fn test_refinement_requires_instruction() {
        let mut studio = studio_with_batch();
        studio.select_poster(0).unwrap();
        let err = studio.begin_refinement("  ").unwrap_err();
        assert!(err.is_validation());
        assert!(!studio.is_busy(Pipeline::Refinement));
    }

    #[test]
    fn test_refinement_replaces_only_selected_index() {
        let mut studio = studio_with_batch();
        studio.select_poster(2).unwrap();
        let before = studio.posters().to_vec();

        let job = studio.begin_refinement("make it blue").unwrap();
        studio.complete_refinement(job, Ok(ImagePayload::png("blue"))).unwrap();

        for (i, poster) in studio.posters().iter().enumerate() {
            if i == 2 {
                assert_eq!(poster.data, "blue");
            } else {
                assert_eq!(poster, &before[i]);
            }
        }
        assert_eq!(studio.selected_index(), Some(2));
        assert_eq!(studio.refinement_state(), &PipelineState::Succeeded(2));
    }

    #[test]
    fn test_refinement_failure_keeps_batch() {
        let mut studio = studio_with_batch();
        studio.select_poster(4).unwrap();
        let before = studio.posters().to_vec();

        let job = studio.begin_refinement("add snow").unwrap();
        assert!(studio.complete_refinement(job, Err(Error::generation("no image"))).is_err());
        assert_eq!(studio.posters(), before.as_slice());
        assert_eq!(studio.selected_index(), Some(4));
    }

    #[test]
    fn test_refinement_state_reset_with_batch() {
        let mut studio = studio_with_batch();
        studio.select_poster(2).unwrap();
        let job = studio.begin_refinement("make it blue").unwrap();
        studio.complete_refinement(job, Ok(ImagePayload::png("blue"))).unwrap();

        let _job = studio.begin_generation().unwrap();
        assert_eq!(studio.refinement_state(), &PipelineState::Idle);

        let _event = studio.add_product_images(vec![source("b")]);
        assert_eq!(studio.generation_state(), &PipelineState::Idle);
        assert_eq!(studio.refinement_state(), &PipelineState::Idle);
    }

    #[test]
    fn test_refinement_discarded_when_batch_replaced() {
        let mut studio = studio_with_batch();
        studio.select_poster(0).unwrap();
        let refine_job = studio.begin_refinement("warmer").unwrap();

        let generation_job = studio.begin_generation().unwrap();
        studio.complete_generation(generation_job, Ok(batch("q"))).unwrap();

        let completion = studio
            .complete_refinement(refine_job, Ok(ImagePayload::png("warm")))
            .unwrap();
        assert_eq!(completion, Completion::Stale);
        assert_eq!(studio.posters(), batch("q").as_slice());
    }

    // =============================================
    // 提案
    // =============================================

    #[test]
    fn test_suggestion_requires_processed_images() {
        let mut studio = Studio::new();
        assert!(studio.begin_suggestion().unwrap_err().is_validation());
    }

    #[test]
    fn test_suggestion_overwrites_concept() {
        let mut studio = ready_studio();
        let job = studio.begin_suggestion().unwrap();
        studio.complete_suggestion(job, Ok("A fresh new idea".to_string())).unwrap();
        assert_eq!(studio.controls().concept, "A fresh new idea");
    }

    // =============================================
    // 選択・ギャラリー
    // =============================================

    #[test]
    fn test_select_out_of_range() {
        let mut studio = studio_with_batch();
        assert!(studio.select_poster(VARIANT_COUNT).is_err());
        assert_eq!(studio.selected_index(), None);
    }

    #[test]
    fn test_save_poster_dedup() {
        let mut studio = studio_with_batch();
        assert!(studio.save_poster(0).unwrap());
        assert!(!studio.save_poster(0).unwrap());
        assert!(studio.save_poster(1).unwrap());
        assert_eq!(studio.gallery().len(), 2);
    }

    #[test]
    fn test_error_cleared_by_next_begin_and_dismiss() {
        let mut studio = ready_studio();
        studio.set_concept("");
        assert!(studio.begin_generation().is_err());
        assert!(studio.error().is_some());

        studio.set_concept("ok");
        studio.begin_generation().unwrap();
        assert!(studio.error().is_none());

        let _ = studio.select_poster(9);
        studio.dismiss_error();
        assert!(studio.error().is_none());
    }
}
