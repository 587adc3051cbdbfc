//! 保存済みポスターのギャラリー
//!
//! セッション中だけ保持する。同じペイロード（Base64文字列の完全一致）は二重に保存しない。

use crate::error::Result;
use crate::types::ImagePayload;

#[derive(Debug, Clone, Default)]
pub struct Gallery {
    posters: Vec<ImagePayload>,
}

impl Gallery {
    pub fn new() -> Self {
        Self::default()
    }

    /// 保存（既にあれば何もしない）
    ///
    /// # Returns
    /// 追加した場合は true
    pub fn save(&mut self, poster: ImagePayload) -> bool {
        if self.contains(&poster.data) {
            return false;
        }
        self.posters.push(poster);
        true
    }

    /// ドラッグで受け取った生のBase64を保存
    ///
    /// MIMEタイプは付いてこないのでPNGとして扱う。デコードできないデータはValidationエラー。
    /// 受け取った文字列はそのまま比較・保存する（前後の空白除去などは呼び出し側で行う）。
    pub fn accept_drop(&mut self, payload: &str) -> Result<bool> {
        let poster = ImagePayload::png(payload);
        poster.decode()?;
        Ok(self.save(poster))
    }

    /// 指定位置を削除（範囲外なら None）
    pub fn remove(&mut self, index: usize) -> Option<ImagePayload> {
        if index < self.posters.len() {
            Some(self.posters.remove(index))
        } else {
            None
        }
    }

    pub fn contains(&self, data: &str) -> bool {
        self.posters.iter().any(|p| p.data == data)
    }

    pub fn get(&self, index: usize) -> Option<&ImagePayload> {
        self.posters.get(index)
    }

    pub fn posters(&self) -> &[ImagePayload] {
        &self.posters
    }

    pub fn len(&self) -> usize {
        self.posters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.posters.is_empty()
    }
}
