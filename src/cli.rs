use clap::{Args, Parser, Subcommand};
use poster_ai_common::{AspectRatio, FontStyle};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "poster-ai")]
#[command(about = "商品写真からAIでポスターを生成するデザインスタジオ", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// 詳細ログを出力
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// 入力画像の指定
#[derive(Args, Debug, Clone, Default)]
pub struct ImageInput {
    /// 商品画像（ファイルパス または data: URL）
    pub images: Vec<String>,

    /// 画像フォルダ（直下の jpg/jpeg/png/webp を読み込む）
    #[arg(short = 'd', long = "dir")]
    pub folder: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 商品画像の背景を除去してPNGで保存
    RemoveBg {
        #[command(flatten)]
        input: ImageInput,

        /// 出力フォルダ（デフォルト: ./posters-日時）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 背景除去からポスター6案の生成まで一括実行
    Generate {
        #[command(flatten)]
        input: ImageInput,

        /// ポスターのコンセプト
        #[arg(short, long)]
        concept: String,

        /// 背景のコンセプト（省略時はモデルに任せる）
        #[arg(short, long, default_value = "")]
        background: String,

        /// ポスターに入れる文字
        #[arg(short, long, default_value = "")]
        text: String,

        /// フォント（プリセット名 または 任意の説明文）
        #[arg(short, long)]
        font: Option<FontStyle>,

        /// アスペクト比 (9:16/1:1/16:9/3:4/4:3)
        #[arg(short, long)]
        aspect: Option<AspectRatio>,

        /// スタイル参考画像（ファイルパス または data: URL）
        #[arg(short, long = "reference")]
        references: Vec<String>,

        /// 生成後に修正するポスター番号（1〜6）
        #[arg(long, requires = "refine")]
        refine_index: Option<usize>,

        /// 修正内容
        #[arg(long, requires = "refine_index")]
        refine: Option<String>,

        /// 出力フォルダ（デフォルト: ./posters-日時）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 商品画像からコンセプトを提案
    Suggest {
        #[command(flatten)]
        input: ImageInput,
    },

    /// 既存のポスター画像を修正
    Refine {
        /// ポスター画像（ファイルパス または data: URL）
        #[arg(required = true)]
        poster: String,

        /// 修正内容
        #[arg(short, long)]
        instruction: String,

        /// 出力フォルダ（デフォルト: ./posters-日時）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 対話モードでスタジオを起動
    Studio {
        /// ダウンロード先フォルダ（デフォルト: ./posters-日時）
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// 設定を表示/変更
    Config {
        /// APIキーを設定
        #[arg(long)]
        set_api_key: Option<String>,

        /// 設定を表示
        #[arg(long)]
        show: bool,
    },
}
