//! Poster AI Common Library
//!
//! CLIとスタジオで共有される型・プロンプト・生成オーケストレーション・状態管理。
//! 通信やファイルIOは持たず、生成サービスは GenerativeBackend トレイト越しに呼ぶ。

pub mod client;
pub mod content;
pub mod data_url;
pub mod error;
pub mod gallery;
pub mod pipeline;
pub mod prompts;
pub mod studio;
pub mod types;

pub use client::PosterClient;
pub use content::{GenerateRequest, GenerateResponse, GenerativeBackend, Part, RequestKind};
pub use data_url::{extract_base64_from_data_url, extract_mime_type_from_data_url, parse_data_url};
pub use error::{Error, Result};
pub use gallery::Gallery;
pub use pipeline::{Completion, Pipeline, PipelineState};
pub use prompts::{build_poster_prompt, build_refine_prompt, VIBES, VIBE_NAMES};
pub use studio::{PosterControls, SourceSetChanged, Studio};
pub use types::{
    AspectRatio, FontStyle, GenerationParameters, ImagePayload, SourceImage, VARIANT_COUNT,
};
