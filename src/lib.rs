//! Poster AI
//!
//! 商品写真の背景除去・ポスター6案の生成・修正を行うCLI。
//! 状態管理と生成オーケストレーションは poster-ai-common、ここではGemini通信・ファイル入出力・対話UIを持つ。

pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod gemini;
pub mod logging;
pub mod progress;
pub mod scanner;
pub mod studio_repl;
