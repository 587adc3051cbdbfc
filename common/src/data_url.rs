//! Data URLユーティリティ
//!
//! "data:image/png;base64,iVBOR..." 形式とImagePayloadの相互変換

use crate::error::{Error, Result};
use crate::types::ImagePayload;

/// Data URLからBase64データ部分を抽出
///
/// # Returns
/// Base64エンコードされたデータ部分、または抽出失敗時はNone
pub fn extract_base64_from_data_url(data_url: &str) -> Option<&str> {
    data_url.split_once(',').map(|(_, data)| data)
}

/// Data URLからMIMEタイプを抽出
///
/// "data:" と ";" の間が取れない場合はNone
pub fn extract_mime_type_from_data_url(data_url: &str) -> Option<&str> {
    let (prefix, _) = data_url.split_once(',')?;
    let rest = prefix.strip_prefix("data:")?;
    let (mime, _) = rest.split_once(';')?;
    if mime.is_empty() {
        None
    } else {
        Some(mime)
    }
}

pub fn is_data_url(s: &str) -> bool {
    s.trim_start().starts_with("data:")
}

/// Data URLをImagePayloadに変換
///
/// MIMEタイプかデータ部分のどちらかが欠けていればValidationエラー
pub fn parse_data_url(data_url: &str) -> Result<ImagePayload> {
    let data_url = data_url.trim();
    let mime = extract_mime_type_from_data_url(data_url);
    let data = extract_base64_from_data_url(data_url).filter(|d| !d.is_empty());

    match (mime, data) {
        (Some(mime), Some(data)) => Ok(ImagePayload::new(mime, data)),
        _ => Err(Error::validation("ファイル形式が不正です")),
    }
}
