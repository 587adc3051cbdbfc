use thiserror::Error;

#[derive(Error, Debug)]
pub enum PosterAiError {
    #[error("設定エラー: {0}")]
    Config(String),

    #[error("APIキーが設定されていません。`poster-ai config --set-api-key YOUR_KEY` または環境変数 GEMINI_API_KEY で設定してください")]
    MissingApiKey,

    #[error("ファイルが見つかりません: {0}")]
    FileNotFound(String),

    #[error("フォルダが見つかりません: {0}")]
    FolderNotFound(String),

    #[error("画像読み込みエラー: {0}")]
    ImageLoad(String),

    #[error("画像変換エラー: {0}")]
    ImageEncode(String),

    #[error("画像が指定されていません")]
    NoImages,

    #[error(transparent)]
    Studio(#[from] poster_ai_common::Error),

    #[error("HTTPクライアント初期化エラー: {0}")]
    Http(String),

    #[error("JSON解析エラー: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("IOエラー: {0}")]
    Io(#[from] std::io::Error),

    #[error("入力エラー: {0}")]
    Prompt(String),
}

impl From<dialoguer::Error> for PosterAiError {
    fn from(e: dialoguer::Error) -> Self {
        PosterAiError::Prompt(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, PosterAiError>;
