use tracing_subscriber::EnvFilter;

/// ログ出力を初期化
///
/// RUST_LOG が設定されていればそれに従う。なければ --verbose で debug、通常は warn。
/// 出力先は stderr（stdout は進捗表示と結果に使う）。
pub fn init_tracing(verbose: bool) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            if verbose {
                EnvFilter::try_new("poster_ai_rust=debug,poster_ai_common=debug,warn")
            } else {
                EnvFilter::try_new("warn")
            }
        })
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .compact()
        .try_init();
}
