use crate::error::{PosterAiError, Result};
use poster_ai_common::{AspectRatio, FontStyle};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_API_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_IMAGE_MODEL: &str = "gemini-2.5-flash-image-preview";
pub const DEFAULT_TEXT_MODEL: &str = "gemini-2.5-flash";

/// APIキーを探す環境変数（先頭ほど優先）
const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: Option<String>,
    pub image_model: String,
    pub text_model: String,
    pub api_base_url: String,
    pub timeout_seconds: u64,
    pub output_dir: Option<PathBuf>,
    pub default_aspect_ratio: AspectRatio,
    pub default_font: FontStyle,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            image_model: DEFAULT_IMAGE_MODEL.into(),
            text_model: DEFAULT_TEXT_MODEL.into(),
            api_base_url: DEFAULT_API_BASE_URL.into(),
            timeout_seconds: 120,
            output_dir: None,
            default_aspect_ratio: AspectRatio::default(),
            default_font: FontStyle::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| PosterAiError::Config("ホームディレクトリが見つかりません".into()))?;
        Ok(home.join(".config").join("poster-ai").join("config.json"))
    }

    /// APIキーを取得（環境変数を優先）
    pub fn get_api_key(&self) -> Result<String> {
        let from_env = API_KEY_ENV_VARS
            .iter()
            .filter_map(|name| std::env::var(name).ok());
        resolve_api_key(from_env, self.api_key.as_deref())
    }

    pub fn set_api_key(&mut self, key: String) -> Result<()> {
        self.api_key = Some(key);
        self.save()
    }
}

/// 候補を順に見て最初の空でない値を採用
fn resolve_api_key<I>(env_values: I, file_value: Option<&str>) -> Result<String>
where
    I: IntoIterator<Item = String>,
{
    env_values
        .into_iter()
        .chain(file_value.map(str::to_string))
        .map(|key| key.trim().to_string())
        .find(|key| !key.is_empty())
        .ok_or(PosterAiError::MissingApiKey)
}
