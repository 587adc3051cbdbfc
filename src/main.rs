use clap::Parser;
use poster_ai_common::{Completion, PosterClient, PosterControls, SourceSetChanged, Studio};
use poster_ai_rust::{cli, config, error, export, gemini, logging, progress, scanner, studio_repl};
use cli::{Cli, Commands, ImageInput};
use config::Config;
use error::{PosterAiError, Result};
use gemini::{GeminiBackend, GeminiSettings};
use std::path::PathBuf;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_tracing(cli.verbose);
    let config = Config::load()?;

    match cli.command {
        Commands::RemoveBg { input, output } => {
            println!("✂ poster-ai - 背景除去\n");

            let sources = load_inputs(&input)?;
            let client = build_client(&config)?;

            let pb = progress::spinner(format!("{}枚の背景を除去中...", sources.len()));
            let payloads: Vec<_> = sources.iter().map(|s| s.image.clone()).collect();
            let result = client.remove_backgrounds(&payloads).await;
            pb.finish_and_clear();
            let cutouts = result?;
            println!("✔ 背景除去完了\n");

            let output_dir = resolve_output_dir(output, &config);
            for (source, path) in sources.iter().zip(export::save_all(&cutouts, &output_dir)?) {
                println!("✔ {} → {}", source.label, path.display());
            }
            println!("\n✅ 完了");
        }

        Commands::Generate {
            input,
            concept,
            background,
            text,
            font,
            aspect,
            references,
            refine_index,
            refine,
            output,
        } => {
            println!("🎨 poster-ai - ポスター生成\n");

            let sources = load_inputs(&input)?;
            let reference_images = scanner::collect_images(&references, None)?;
            let client = build_client(&config)?;
            let mut studio = Studio::with_controls(PosterControls {
                concept,
                background_concept: background,
                poster_text: text,
                aspect_ratio: aspect.unwrap_or(config.default_aspect_ratio),
                font: font.unwrap_or_else(|| config.default_font.clone()),
            });
            studio.add_reference_images(reference_images);

            // 1. 背景除去
            println!("[1/3] {}枚の背景を除去中...", sources.len());
            let event = studio.add_product_images(sources);
            process_with_spinner(&client, &mut studio, event).await?;
            println!("✔ 背景除去完了\n");

            // 2. 生成
            println!("[2/3] ポスター6案を生成中...");
            let pb = progress::spinner("生成中...");
            let result = studio.generate(&client).await;
            pb.finish_and_clear();
            result?;
            println!("✔ 生成完了\n");

            // 3. 修正（指定時のみ）
            if let (Some(number), Some(instruction)) = (refine_index, refine) {
                println!("[3/3] ポスター{}を修正中...", number);
                let index = number
                    .checked_sub(1)
                    .ok_or_else(|| poster_ai_common::Error::validation("ポスター番号は1から指定してください"))?;
                studio.select_poster(index)?;
                let pb = progress::spinner("修正中...");
                let result = studio.refine(&client, &instruction).await;
                pb.finish_and_clear();
                result?;
                println!("✔ 修正完了\n");
            }

            let output_dir = resolve_output_dir(output, &config);
            for (i, path) in export::save_all(studio.posters(), &output_dir)?.iter().enumerate() {
                println!(
                    "✔ {}. {} → {}",
                    i + 1,
                    poster_ai_common::VIBE_NAMES[i],
                    path.display()
                );
            }
            println!("\n✅ 完了");
        }

        Commands::Suggest { input } => {
            let sources = load_inputs(&input)?;
            let client = build_client(&config)?;
            let mut studio = Studio::new();

            let event = studio.add_product_images(sources);
            process_with_spinner(&client, &mut studio, event).await?;

            let pb = progress::spinner("コンセプトを考え中...");
            let result = studio.suggest_concept(&client).await;
            pb.finish_and_clear();
            result?;
            println!("{}", studio.controls().concept);
        }

        Commands::Refine { poster, instruction, output } => {
            println!("🖌 poster-ai - ポスター修正\n");

            let source = scanner::load_image_arg(&poster)?;
            let client = build_client(&config)?;

            let pb = progress::spinner("修正中...");
            let result = client.refine(&source.image, &instruction).await;
            pb.finish_and_clear();
            let refined = result?;

            let output_dir = resolve_output_dir(output, &config);
            let path = export::save_png(&refined, &output_dir)?;
            println!("✔ 保存: {}", path.display());
        }

        Commands::Studio { output } => {
            println!("🎨 poster-ai - スタジオ\n");

            let client = build_client(&config)?;
            let studio = Studio::with_controls(PosterControls {
                aspect_ratio: config.default_aspect_ratio,
                font: config.default_font.clone(),
                ..Default::default()
            });
            let output_dir = resolve_output_dir(output, &config);
            println!("ダウンロード先: {}", output_dir.display());
            studio_repl::run_interactive_studio(&client, studio, &output_dir).await?;
        }

        Commands::Config { set_api_key, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ APIキーを設定しました");
            }

            if show {
                println!("設定:");
                println!("  画像モデル: {}", config.image_model);
                println!("  テキストモデル: {}", config.text_model);
                println!("  APIエンドポイント: {}", config.api_base_url);
                println!("  タイムアウト: {}秒", config.timeout_seconds);
                println!("  アスペクト比: {}", config.default_aspect_ratio.label());
                println!("  フォント: {}", config.default_font.label());
                println!(
                    "  出力先: {}",
                    config
                        .output_dir
                        .as_deref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "./posters-日時".to_string())
                );
                println!("  APIキー: {}", if config.get_api_key().is_ok() { "設定済み" } else { "未設定" });
            }
        }
    }

    Ok(())
}

fn build_client(config: &Config) -> Result<PosterClient<GeminiBackend>> {
    let settings = GeminiSettings::from_config(config)?;
    Ok(PosterClient::new(GeminiBackend::new(settings)?))
}

fn load_inputs(input: &ImageInput) -> Result<Vec<poster_ai_common::SourceImage>> {
    let sources = scanner::collect_images(&input.images, input.folder.as_deref())?;
    if sources.is_empty() {
        return Err(PosterAiError::NoImages);
    }
    println!("✔ {}枚の画像を読み込み", sources.len());
    Ok(sources)
}

fn resolve_output_dir(output: Option<PathBuf>, config: &Config) -> PathBuf {
    output.unwrap_or_else(|| export::default_output_dir(config.output_dir.as_deref()))
}

async fn process_with_spinner(
    client: &PosterClient<GeminiBackend>,
    studio: &mut Studio,
    event: SourceSetChanged,
) -> Result<Completion> {
    let pb = progress::spinner("背景を除去中...");
    let result = studio.process_product_images(client, event).await;
    pb.finish_and_clear();
    Ok(result?)
}
