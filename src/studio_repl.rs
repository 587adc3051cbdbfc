//! 対話式スタジオ
//!
//! 1行1コマンドで Studio を操作する。番号は画面表示と同じく1始まり。
//! コマンドの失敗（入力不備・生成失敗）はメッセージを出して続行し、端末の入力エラーだけで終了する。

use crate::error::Result;
use crate::{export, progress, scanner};
use dialoguer::Input;
use poster_ai_common::{
    AspectRatio, Completion, FontStyle, GenerativeBackend, PipelineState,
    PosterClient, SourceSetChanged, Studio,
};
use std::path::{Path, PathBuf};

/// ダウンロード対象
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadTarget {
    /// 選択中のポスター
    Selected,
    /// バッチ内の番号
    Poster(usize),
    /// バッチ全部
    Batch,
    /// ギャラリー全部
    Gallery,
}

/// 対話コマンド
#[derive(Debug, Clone, PartialEq)]
pub enum StudioCommand {
    Add(Vec<String>),
    Remove(usize),
    Reference(Vec<String>),
    Unreference(usize),
    Concept(String),
    Background(String),
    Text(String),
    Font(FontStyle),
    Aspect(AspectRatio),
    Suggest,
    Generate,
    Select(usize),
    Refine(String),
    /// 指定なしなら選択中のポスター
    Save(Option<usize>),
    Unsave(usize),
    /// ドラッグ相当（生のBase64 または data: URL）
    Drop(String),
    Download(DownloadTarget),
    Gallery,
    Status,
    Dismiss,
    Help,
    Quit,
}

const HELP: &str = "\
コマンド:
  add <画像...>        商品画像を追加（背景除去が走る）
  remove <番号>        商品画像を削除
  ref <画像...>        スタイル参考画像を追加
  unref <番号>         参考画像を削除
  concept <文>         コンセプトを設定
  background <文>      背景コンセプトを設定（空で解除）
  text <文>            ポスターの文字を設定（空で解除）
  font <名前|説明>     フォント (default/modern-sans/elegant-serif/playful-script/bold-display/futuristic-tech)
  aspect <比>          アスペクト比 (9:16/1:1/16:9/3:4/4:3)
  suggest              コンセプトを提案
  generate             ポスター6案を生成
  select <番号>        ポスターを選択
  refine <指示>        選択中のポスターを修正
  save [番号]          ギャラリーに保存
  unsave <番号>        ギャラリーから削除
  drop <Base64>        Base64画像をギャラリーに追加
  download [番号|all|gallery]  PNGで保存
  gallery / status / dismiss / help / quit";

/// 1始まりの番号を0始まりに
fn parse_index(arg: &str) -> std::result::Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("番号は1以上の整数で指定してください: {}", arg.trim())),
    }
}

fn parse_paths(rest: &str) -> std::result::Result<Vec<String>, String> {
    let paths: Vec<String> = rest.split_whitespace().map(str::to_string).collect();
    if paths.is_empty() {
        return Err("画像を指定してください".to_string());
    }
    Ok(paths)
}

/// 入力行をコマンドに変換（空行は None）
pub fn parse_command(line: &str) -> std::result::Result<Option<StudioCommand>, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (name, rest) = match line.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (line, ""),
    };

    let command = match name.to_lowercase().as_str() {
        "add" => StudioCommand::Add(parse_paths(rest)?),
        "remove" | "rm" => StudioCommand::Remove(parse_index(rest)?),
        "ref" => StudioCommand::Reference(parse_paths(rest)?),
        "unref" => StudioCommand::Unreference(parse_index(rest)?),
        "concept" => StudioCommand::Concept(rest.to_string()),
        "background" | "bg" => StudioCommand::Background(rest.to_string()),
        "text" => StudioCommand::Text(rest.to_string()),
        "font" => StudioCommand::Font(rest.parse()?),
        "aspect" => StudioCommand::Aspect(rest.parse()?),
        "suggest" => StudioCommand::Suggest,
        "generate" | "gen" => StudioCommand::Generate,
        "select" | "sel" => StudioCommand::Select(parse_index(rest)?),
        "refine" => StudioCommand::Refine(rest.to_string()),
        "save" if rest.is_empty() => StudioCommand::Save(None),
        "save" => StudioCommand::Save(Some(parse_index(rest)?)),
        "unsave" => StudioCommand::Unsave(parse_index(rest)?),
        "drop" if rest.is_empty() => return Err("画像データを指定してください".to_string()),
        "drop" => StudioCommand::Drop(rest.to_string()),
        "download" | "dl" => StudioCommand::Download(match rest.to_lowercase().as_str() {
            "" => DownloadTarget::Selected,
            "all" => DownloadTarget::Batch,
            "gallery" => DownloadTarget::Gallery,
            n => DownloadTarget::Poster(parse_index(n)?),
        }),
        "gallery" => StudioCommand::Gallery,
        "status" | "ls" => StudioCommand::Status,
        "dismiss" => StudioCommand::Dismiss,
        "help" | "?" => StudioCommand::Help,
        "quit" | "exit" | "q" => StudioCommand::Quit,
        other => return Err(format!("不明なコマンドです: {} (help で一覧)", other)),
    };

    Ok(Some(command))
}

/// 対話セッションを実行
pub async fn run_interactive_studio<B: GenerativeBackend>(
    client: &PosterClient<B>,
    mut studio: Studio,
    output_dir: &Path,
) -> Result<()> {
    println!("{}\n", HELP);

    loop {
        let line: String = Input::new()
            .with_prompt("studio")
            .allow_empty(true)
            .interact_text()?;

        let command = match parse_command(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(message) => {
                println!("✖ {}", message);
                continue;
            }
        };

        if command == StudioCommand::Quit {
            break;
        }

        if let Err(e) = execute(client, &mut studio, command, output_dir).await {
            println!("✖ {}", e);
        }
    }

    Ok(())
}

/// 1コマンドを実行
pub async fn execute<B: GenerativeBackend>(
    client: &PosterClient<B>,
    studio: &mut Studio,
    command: StudioCommand,
    output_dir: &Path,
) -> Result<()> {
    match command {
        StudioCommand::Add(args) => {
            let images = scanner::collect_images(&args, None)?;
            let count = images.len();
            let event = studio.add_product_images(images);
            println!("✔ {}枚を追加", count);
            run_removal(client, studio, event).await?;
        }
        StudioCommand::Remove(index) => {
            let event = studio.remove_product_image(index)?;
            println!("✔ 商品画像{}を削除", index + 1);
            run_removal(client, studio, event).await?;
        }
        StudioCommand::Reference(args) => {
            let images = scanner::collect_images(&args, None)?;
            println!("✔ 参考画像を{}枚追加", images.len());
            studio.add_reference_images(images);
        }
        StudioCommand::Unreference(index) => {
            let removed = studio.remove_reference_image(index)?;
            println!("✔ 参考画像を削除: {}", removed.label);
        }
        StudioCommand::Concept(concept) => studio.set_concept(concept),
        StudioCommand::Background(background) => studio.set_background_concept(background),
        StudioCommand::Text(text) => studio.set_poster_text(text),
        StudioCommand::Font(font) => {
            println!("✔ フォント: {}", font.label());
            studio.set_font(font);
        }
        StudioCommand::Aspect(aspect) => {
            println!("✔ アスペクト比: {}", aspect.label());
            studio.set_aspect_ratio(aspect);
        }
        StudioCommand::Suggest => {
            let pb = progress::spinner("コンセプトを考え中...");
            let result = studio.suggest_concept(client).await;
            pb.finish_and_clear();
            if result?.is_applied() {
                println!("✔ コンセプト: {}", studio.controls().concept);
            }
        }
        StudioCommand::Generate => {
            let pb = progress::spinner("ポスター6案を生成中...");
            let result = studio.generate(client).await;
            pb.finish_and_clear();
            if result?.is_applied() {
                println!("✔ {}案を生成しました (select <番号> で選択)", studio.posters().len());
            }
        }
        StudioCommand::Select(index) => {
            studio.select_poster(index)?;
            println!("✔ ポスター{}を選択", index + 1);
        }
        StudioCommand::Refine(instruction) => {
            let pb = progress::spinner("ポスターを修正中...");
            let result = studio.refine(client, &instruction).await;
            pb.finish_and_clear();
            if result?.is_applied() {
                println!("✔ 修正しました");
            }
        }
        StudioCommand::Save(index) => {
            let index = match index.or(studio.selected_index()) {
                Some(index) => index,
                None => {
                    println!("✖ 保存するポスターを選択してください");
                    return Ok(());
                }
            };
            if studio.save_poster(index)? {
                println!("✔ ポスター{}をギャラリーに保存", index + 1);
            } else {
                println!("- 保存済みです");
            }
        }
        StudioCommand::Unsave(index) => {
            studio.remove_saved_poster(index)?;
            println!("✔ ギャラリーから削除");
        }
        StudioCommand::Drop(data) => {
            let data = poster_ai_common::extract_base64_from_data_url(&data).unwrap_or(data.as_str());
            if studio.gallery_mut().accept_drop(data)? {
                println!("✔ ギャラリーに追加");
            } else {
                println!("- 保存済みです");
            }
        }
        StudioCommand::Download(target) => download(studio, target, output_dir)?,
        StudioCommand::Gallery => print_gallery(studio),
        StudioCommand::Status => print_status(studio),
        StudioCommand::Dismiss => studio.dismiss_error(),
        StudioCommand::Help => println!("{}", HELP),
        StudioCommand::Quit => {}
    }

    Ok(())
}

async fn run_removal<B: GenerativeBackend>(
    client: &PosterClient<B>,
    studio: &mut Studio,
    event: SourceSetChanged,
) -> Result<()> {
    let count = match &event {
        SourceSetChanged::Pending(job) => job.images().len(),
        SourceSetChanged::Cleared => return Ok(()),
    };

    let pb = progress::spinner(format!("{}枚の背景を除去中...", count));
    let result = studio.process_product_images(client, event).await;
    pb.finish_and_clear();
    if result? == Completion::Applied {
        println!("✔ 背景除去完了");
    }
    Ok(())
}

fn download(studio: &Studio, target: DownloadTarget, output_dir: &Path) -> Result<()> {
    let posters = match target {
        DownloadTarget::Selected => studio.selected_poster().cloned().into_iter().collect(),
        DownloadTarget::Poster(index) => studio.posters().get(index).cloned().into_iter().collect(),
        DownloadTarget::Batch => studio.posters().to_vec(),
        DownloadTarget::Gallery => studio.gallery().posters().to_vec(),
    };

    if posters.is_empty() {
        println!("✖ 保存するポスターがありません");
        return Ok(());
    }

    let paths: Vec<PathBuf> = export::save_all(&posters, output_dir)?;
    for path in paths {
        println!("✔ 保存: {}", path.display());
    }
    Ok(())
}

fn state_label<T>(state: &PipelineState<T>) -> String {
    match state.error() {
        Some(reason) => format!("{} ({})", state.label(), reason),
        None => state.label().to_string(),
    }
}

fn print_gallery(studio: &Studio) {
    if studio.gallery().is_empty() {
        println!("ギャラリーは空です");
        return;
    }
    for (i, poster) in studio.gallery().posters().iter().enumerate() {
        println!("  {}. {} ({}文字)", i + 1, poster.mime_type, poster.data.len());
    }
}

fn print_status(studio: &Studio) {
    let controls = studio.controls();
    println!("商品画像:");
    for (i, source) in studio.product_images().iter().enumerate() {
        let mark = if i < studio.processed_images().len() { "✔" } else { "-" };
        println!("  {}. {} {}", i + 1, mark, source.label);
    }
    println!("参考画像:");
    for (i, source) in studio.reference_images().iter().enumerate() {
        println!("  {}. {}", i + 1, source.label);
    }
    println!("コンセプト: {}", controls.concept);
    println!("背景: {}", controls.background_concept);
    println!("文字: {}", controls.poster_text);
    println!("フォント: {}", controls.font.label());
    println!("アスペクト比: {}", controls.aspect_ratio.label());
    println!(
        "ポスター: {}案{}",
        studio.posters().len(),
        studio
            .selected_index()
            .map(|i| format!(" (選択: {})", i + 1))
            .unwrap_or_default()
    );
    println!("ギャラリー: {}枚", studio.gallery().len());
    println!(
        "状態: 背景除去={} 生成={} 修正={} 提案={}",
        state_label(studio.removal_state()),
        state_label(studio.generation_state()),
        state_label(studio.refinement_state()),
        state_label(studio.suggestion_state()),
    );
    if let Some(error) = studio.error() {
        println!("エラー: {} (dismiss で消去)", error);
    }
}
