//! Gemini API の実通信テスト
//!
//! GEMINI_API_KEY が無ければスキップする

use poster_ai_common::PosterClient;
use poster_ai_rust::config::Config;
use poster_ai_rust::gemini::{GeminiBackend, GeminiSettings};

fn live_settings() -> Option<GeminiSettings> {
    let api_key = match std::env::var("GEMINI_API_KEY") {
        Ok(key) if !key.trim().is_empty() => key,
        _ => {
            eprintln!("GEMINI_API_KEY not set; skipping integration test");
            return None;
        }
    };

    let config = Config::default();
    Some(GeminiSettings {
        api_key,
        base_url: config.api_base_url,
        image_model: config.image_model,
        text_model: config.text_model,
        timeout_seconds: config.timeout_seconds,
    })
}

/// 1x1の白PNG
const WHITE_PIXEL_PNG: &str =
    "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAIAAACQd1PeAAAADElEQVR4nGP4//8/AAX+Av4N70a4AAAAAElFTkSuQmCC";

#[tokio::test]
async fn gemini_suggest_concept_integration() {
    let Some(settings) = live_settings() else {
        return;
    };

    let client = PosterClient::new(GeminiBackend::new(settings).expect("client build failed"));
    let image = poster_ai_common::ImagePayload::png(WHITE_PIXEL_PNG);

    let concept = client
        .suggest_concept(&[image])
        .await
        .expect("suggestion request failed");
    assert!(!concept.trim().is_empty());
}
