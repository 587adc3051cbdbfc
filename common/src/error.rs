//! エラー型定義
//!
//! ユーザーに見せる失敗は2種類だけ:
//! - Validation: リクエスト前の前提条件違反（通信は発生しない）
//! - Generation: 生成サービス呼び出しの失敗、または使える画像/テキストが返らなかった
//!
//! どちらも同じ形式（メッセージのみ）で表示する。

use thiserror::Error;

/// 共通エラー型
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Generation(String),
}

impl Error {
    pub fn validation(message: impl Into<String>) -> Self {
        Error::Validation(message.into())
    }

    pub fn generation(message: impl Into<String>) -> Self {
        Error::Generation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_generation(&self) -> bool {
        matches!(self, Error::Generation(_))
    }

    /// 表示用メッセージ
    pub fn message(&self) -> &str {
        match self {
            Error::Validation(m) | Error::Generation(m) => m,
        }
    }
}

/// Result型エイリアス
pub type Result<T> = std::result::Result<T, Error>;
