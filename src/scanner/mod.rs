//! 画像入力
//!
//! ファイルパス・data: URL・フォルダから SourceImage を読み込む。

use crate::error::{PosterAiError, Result};
use poster_ai_common::data_url::{is_data_url, parse_data_url};
use poster_ai_common::{ImagePayload, SourceImage};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

fn is_image_extension(ext: &str) -> bool {
    IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
}

/// フォルダ直下の画像ファイルをファイル名順に列挙
pub fn scan_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    if !folder.is_dir() {
        return Err(PosterAiError::FolderNotFound(folder.display().to_string()));
    }

    let images: Vec<PathBuf> = WalkDir::new(folder)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| path.is_file())
        .filter(|path| {
            path.extension()
                .map(|ext| is_image_extension(&ext.to_string_lossy()))
                .unwrap_or(false)
        })
        .collect();

    Ok(images)
}

/// バイト列からMIMEタイプを判定（判定できなければ拡張子から）
pub fn detect_mime_type(bytes: &[u8], path: &Path) -> Result<&'static str> {
    let format = image::guess_format(bytes)
        .ok()
        .or_else(|| image::ImageFormat::from_path(path).ok());

    match format {
        Some(image::ImageFormat::Png) => Ok("image/png"),
        Some(image::ImageFormat::Jpeg) => Ok("image/jpeg"),
        Some(image::ImageFormat::WebP) => Ok("image/webp"),
        Some(image::ImageFormat::Gif) => Ok("image/gif"),
        _ => Err(PosterAiError::ImageLoad(format!(
            "対応していない画像形式です: {}",
            path.display()
        ))),
    }
}

/// 画像ファイルを読み込んでBase64化
pub fn load_image_file(path: &Path) -> Result<SourceImage> {
    if !path.is_file() {
        return Err(PosterAiError::FileNotFound(path.display().to_string()));
    }

    let bytes = std::fs::read(path)?;
    let mime_type = detect_mime_type(&bytes, path)?;
    let label = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string());

    Ok(SourceImage::new(label, ImagePayload::from_bytes(mime_type, &bytes)))
}

/// 引数1つを読み込む（data: URL またはファイルパス）
pub fn load_image_arg(arg: &str) -> Result<SourceImage> {
    let arg = arg.trim();
    if is_data_url(arg) {
        let payload = parse_data_url(arg)?;
        let label = format!("inline.{}", payload.mime_type.trim_start_matches("image/"));
        return Ok(SourceImage::new(label, payload));
    }
    load_image_file(Path::new(arg))
}

/// 引数とフォルダから入力画像をまとめて読み込む（引数 → フォルダの順）
pub fn collect_images(args: &[String], folder: Option<&Path>) -> Result<Vec<SourceImage>> {
    let mut images = args
        .iter()
        .map(|arg| load_image_arg(arg))
        .collect::<Result<Vec<_>>>()?;

    if let Some(folder) = folder {
        for path in scan_folder(folder)? {
            images.push(load_image_file(&path)?);
        }
    }

    Ok(images)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::io::Write;
    use tempfile::tempdir;

    const PNG_MAGIC: &[u8] = &[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    #[test]
    fn test_is_image_extension() {
        assert!(is_image_extension("jpg"));
        assert!(is_image_extension("JPG"));
        assert!(is_image_extension("jpeg"));
        assert!(is_image_extension("png"));
        assert!(is_image_extension("webp"));
        assert!(!is_image_extension("txt"));
        assert!(!is_image_extension("pdf"));
    }

    #[test]
    fn test_scan_folder_not_found() {
        let result = scan_folder(Path::new("/nonexistent/folder"));
        assert!(matches!(result, Err(PosterAiError::FolderNotFound(_))));
    }

    #[test]
    fn test_scan_folder_filters_and_sorts() {
        let dir = tempdir().unwrap();
        for name in ["c.jpg", "a.PNG", "b.webp", "readme.txt"] {
            File::create(dir.path().join(name)).unwrap().write_all(b"dummy").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();

        let names: Vec<String> = scan_folder(dir.path())
            .unwrap()
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, vec!["a.PNG", "b.webp", "c.jpg"]);
    }

    #[test]
    fn test_detect_mime_type_prefers_content() {
        let mime = detect_mime_type(PNG_MAGIC, Path::new("mislabelled.jpg")).unwrap();
        assert_eq!(mime, "image/png");

        let mime = detect_mime_type(b"????", Path::new("photo.jpeg")).unwrap();
        assert_eq!(mime, "image/jpeg");

        assert!(detect_mime_type(b"????", Path::new("notes.txt")).is_err());
    }

    #[test]
    fn test_load_image_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("product.png");
        fs::write(&path, PNG_MAGIC).unwrap();

        let source = load_image_file(&path).unwrap();
        assert_eq!(source.label, "product.png");
        assert_eq!(source.image.mime_type, "image/png");
        assert_eq!(source.image.decode().unwrap(), PNG_MAGIC);
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_image_arg("/nonexistent/product.jpg").unwrap_err();
        assert!(matches!(err, PosterAiError::FileNotFound(_)));
    }

    #[test]
    fn test_load_data_url_arg() {
        let source = load_image_arg("data:image/jpeg;base64,/9j/4AAQ").unwrap();
        assert_eq!(source.image, ImagePayload::new("image/jpeg", "/9j/4AAQ"));
        assert_eq!(source.label, "inline.jpeg");
    }

    #[test]
    fn test_collect_images_args_then_folder() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("b.png"), PNG_MAGIC).unwrap();
        fs::write(dir.path().join("a.png"), PNG_MAGIC).unwrap();

        let args = vec!["data:image/png;base64,iVBORw0KGgo=".to_string()];
        let images = collect_images(&args, Some(dir.path())).unwrap();
        let labels: Vec<&str> = images.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["inline.png", "a.png", "b.png"]);
    }
}
