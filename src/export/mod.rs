//! ポスターのダウンロード（PNG保存）

use crate::error::{PosterAiError, Result};
use image::ImageFormat;
use poster_ai_common::ImagePayload;
use sha2::{Digest, Sha256};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use tracing::debug;

/// ファイル名に使うハッシュの桁数
const HASH_PREFIX_LEN: usize = 12;

/// 保存先フォルダの既定値（`<base>/posters-YYYYMMDD-HHMMSS`）
pub fn default_output_dir(base: Option<&Path>) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y%m%d-%H%M%S");
    base.unwrap_or_else(|| Path::new("."))
        .join(format!("posters-{}", stamp))
}

/// PNGのバイト列に変換（PNGならそのまま）
pub fn to_png_bytes(payload: &ImagePayload) -> Result<Vec<u8>> {
    let bytes = payload.decode()?;

    if matches!(image::guess_format(&bytes), Ok(ImageFormat::Png)) {
        return Ok(bytes);
    }

    let img = image::load_from_memory(&bytes)
        .map_err(|e| PosterAiError::ImageEncode(format!("{} を読み込めません: {}", payload.mime_type, e)))?;
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| PosterAiError::ImageEncode(e.to_string()))?;
    Ok(png)
}

/// 内容ハッシュから決まるファイル名
pub fn png_file_name(png: &[u8]) -> String {
    let digest = hex::encode(Sha256::digest(png));
    format!("poster-{}.png", &digest[..HASH_PREFIX_LEN])
}

/// 1枚をPNGで保存
///
/// # Returns
/// 保存したファイルのパス（同じ内容なら同じパスに上書き）
pub fn save_png(payload: &ImagePayload, dir: &Path) -> Result<PathBuf> {
    let png = to_png_bytes(payload)?;
    std::fs::create_dir_all(dir)?;

    let path = dir.join(png_file_name(&png));
    std::fs::write(&path, &png)?;
    debug!(path = %path.display(), bytes = png.len(), "PNG保存");
    Ok(path)
}

/// まとめて保存（順序は入力どおり）
pub fn save_all(posters: &[ImagePayload], dir: &Path) -> Result<Vec<PathBuf>> {
    posters.iter().map(|p| save_png(p, dir)).collect()
}
