//! ポスター生成の型定義
//!
//! CLIと対話スタジオで共有される型:
//! - ImagePayload: Base64画像とMIMEタイプ（生成サービスとの受け渡し単位）
//! - SourceImage: ユーザーが追加した画像（ラベル付き）
//! - AspectRatio / FontStyle: 生成コントロールの選択肢
//! - GenerationParameters: 生成開始時点のスナップショット

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// 1回の生成で作るバリエーション数
pub const VARIANT_COUNT: usize = 6;

/// Base64エンコード済み画像
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImagePayload {
    pub mime_type: String,
    pub data: String,
}

impl ImagePayload {
    pub fn new(mime_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self {
            mime_type: mime_type.into(),
            data: data.into(),
        }
    }

    /// MIMEタイプ省略時はPNGとして扱う
    pub fn png(data: impl Into<String>) -> Self {
        Self::new("image/png", data)
    }

    pub fn from_bytes(mime_type: impl Into<String>, bytes: &[u8]) -> Self {
        Self::new(mime_type, BASE64.encode(bytes))
    }

    /// Base64をデコードして生バイトを返す
    pub fn decode(&self) -> Result<Vec<u8>> {
        BASE64
            .decode(self.data.trim().as_bytes())
            .map_err(|e| Error::validation(format!("画像データのBase64が不正です: {}", e)))
    }

    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, self.data)
    }
}

/// ユーザーが追加した元画像
///
/// `label` はプレビュー参照（ファイル名やパス）。画像本体はセッションが所有する。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pub label: String,
    pub image: ImagePayload,
}

impl SourceImage {
    pub fn new(label: impl Into<String>, image: ImagePayload) -> Self {
        Self {
            label: label.into(),
            image,
        }
    }
}

/// ポスターのアスペクト比
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AspectRatio {
    #[default]
    #[serde(rename = "9:16")]
    Portrait,
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "16:9")]
    Landscape,
    #[serde(rename = "3:4")]
    Standard,
    #[serde(rename = "4:3")]
    Wide,
}

impl AspectRatio {
    pub const ALL: [AspectRatio; 5] = [
        AspectRatio::Portrait,
        AspectRatio::Square,
        AspectRatio::Landscape,
        AspectRatio::Standard,
        AspectRatio::Wide,
    ];

    /// プロンプトに埋め込む比率表記
    pub fn value(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "9:16",
            AspectRatio::Square => "1:1",
            AspectRatio::Landscape => "16:9",
            AspectRatio::Standard => "3:4",
            AspectRatio::Wide => "4:3",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AspectRatio::Portrait => "Portrait (9:16)",
            AspectRatio::Square => "Square (1:1)",
            AspectRatio::Landscape => "Landscape (16:9)",
            AspectRatio::Standard => "Standard (3:4)",
            AspectRatio::Wide => "Wide (4:3)",
        }
    }
}

impl std::str::FromStr for AspectRatio {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        AspectRatio::ALL
            .iter()
            .copied()
            .find(|r| {
                r.value() == key
                    || r.label().to_lowercase() == key
                    || r.label().to_lowercase().starts_with(&format!("{} ", key))
            })
            .ok_or_else(|| {
                format!(
                    "Unknown aspect ratio: {}. Use 9:16, 1:1, 16:9, 3:4, or 4:3",
                    s
                )
            })
    }
}

impl std::fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// 文字入れのフォント指定
///
/// プリセットはモデル向けの説明文に展開される。任意の説明文も指定できる。
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FontStyle {
    #[default]
    Default,
    ModernSans,
    ElegantSerif,
    PlayfulScript,
    BoldDisplay,
    FuturisticTech,
    Custom(String),
}

impl FontStyle {
    pub const PRESETS: [FontStyle; 6] = [
        FontStyle::Default,
        FontStyle::ModernSans,
        FontStyle::ElegantSerif,
        FontStyle::PlayfulScript,
        FontStyle::BoldDisplay,
        FontStyle::FuturisticTech,
    ];

    pub fn label(&self) -> &str {
        match self {
            FontStyle::Default => "Default",
            FontStyle::ModernSans => "Modern Sans-Serif",
            FontStyle::ElegantSerif => "Elegant Serif",
            FontStyle::PlayfulScript => "Playful Script",
            FontStyle::BoldDisplay => "Bold Display",
            FontStyle::FuturisticTech => "Futuristic Tech",
            FontStyle::Custom(_) => "Custom",
        }
    }

    /// CLIで使うキー
    pub fn key(&self) -> &str {
        match self {
            FontStyle::Default => "default",
            FontStyle::ModernSans => "modern-sans",
            FontStyle::ElegantSerif => "elegant-serif",
            FontStyle::PlayfulScript => "playful-script",
            FontStyle::BoldDisplay => "bold-display",
            FontStyle::FuturisticTech => "futuristic-tech",
            FontStyle::Custom(_) => "custom",
        }
    }

    /// モデルに渡す説明文
    pub fn descriptor(&self) -> &str {
        match self {
            FontStyle::Default => "a clean and readable font",
            FontStyle::ModernSans => {
                "a modern, clean, minimalist sans-serif font like Helvetica or Futura"
            }
            FontStyle::ElegantSerif => {
                "an elegant, classic serif font like Times New Roman or Garamond"
            }
            FontStyle::PlayfulScript => "a casual, playful script or handwritten font",
            FontStyle::BoldDisplay => "a bold, impactful display font suitable for headlines",
            FontStyle::FuturisticTech => "a futuristic, digital, or sci-fi style font",
            FontStyle::Custom(descriptor) => descriptor,
        }
    }
}

impl std::str::FromStr for FontStyle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err("Font style must not be empty".to_string());
        }

        let key = trimmed.to_lowercase();
        let preset = FontStyle::PRESETS
            .iter()
            .find(|f| f.key() == key || f.label().to_lowercase() == key)
            .cloned();

        Ok(preset.unwrap_or_else(|| FontStyle::Custom(trimmed.to_string())))
    }
}

/// 生成開始時点のパラメータのスナップショット
///
/// 生成中にコントロールを編集しても、進行中のリクエストには影響しない。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationParameters {
    /// 背景除去済みの商品画像（送信順）
    pub product_images: Vec<ImagePayload>,
    pub concept: String,
    pub background_concept: String,
    pub poster_text: String,
    pub aspect_ratio: AspectRatio,
    pub font_style: Option<String>,
    pub reference_images: Vec<ImagePayload>,
}

impl GenerationParameters {
    pub fn new(product_images: Vec<ImagePayload>, concept: impl Into<String>) -> Self {
        Self {
            product_images,
            concept: concept.into(),
            background_concept: String::new(),
            poster_text: String::new(),
            aspect_ratio: AspectRatio::default(),
            font_style: None,
            reference_images: Vec::new(),
        }
    }
}

/// 空白のみの文字列を未入力として扱う
pub(crate) fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}
