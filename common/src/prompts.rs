//! プロンプト生成モジュール
//!
//! 生成サービスに送る指示文を組み立てる:
//! - VIBES: バリエーションごとの作風（順序 = バッチ内のインデックス）
//! - build_poster_prompt: ポスター生成用プロンプト
//! - build_refine_prompt: 修正用プロンプト
//!
//! モデルの出力は指示の順序に敏感なので、build_poster_prompt の組み立て順は変えないこと。

use crate::types::{is_blank, GenerationParameters};

/// 作風（6種、固定順）
pub const VIBES: [&str; 6] = [
    "Vibrant and energetic with dynamic lighting and bold colors.",
    "Minimalist and clean with a lot of negative space and simple, elegant typography.",
    "Luxurious and elegant with rich textures, sophisticated typography, and a premium look.",
    "A retro, vintage-inspired design using distressed textures and a muted color palette.",
    "A photorealistic style that blends the product seamlessly into a real-world scene with natural lighting.",
    "A bold, graphic style with strong lines, high-contrast colors, and impactful typography.",
];

/// 作風の短い呼び名（ログ・エラー表示用）
pub const VIBE_NAMES: [&str; 6] = [
    "energetic",
    "minimalist",
    "luxurious",
    "retro",
    "photorealistic",
    "bold-graphic",
];

/// 背景除去の指示
pub const REMOVE_BACKGROUND_PROMPT: &str = "Remove the background from this image completely, leaving only the main subject against a transparent background. Do not add any extra elements, shadows, or reflections.";

/// 参考画像の扱いの指示（参考画像の後ろに付ける）
pub const REFERENCE_STYLE_PROMPT: &str = "Use the additional image(s) provided as a strong stylistic and compositional reference for the new poster.";

/// コンセプト提案の指示
pub const SUGGEST_CONCEPT_PROMPT: &str = "You are a creative director. Based on the provided product image(s), generate a creative and compelling poster concept. The description should be around 100 words, focusing on the theme, mood, and potential taglines. The product is the main subject. Provide only the concept text, without any introductory phrases.";

/// 背景指定がない場合の文
pub const BACKGROUND_FALLBACK_CLAUSE: &str = " The background and surrounding elements should be generated to complement the products and the overall theme.";

/// ポスター生成プロンプト
///
/// 組み立て順:
/// 1. アスペクト比 + 全商品画像を使う指示
/// 2. テーマ
/// 3. 作風
/// 4. 背景（指定があればそのまま、なければ汎用文）
/// 5. 文字入れ（posterText が空白以外のときのみ）
/// 6. 1枚の完成ポスターを出力する指示
///
/// 参考画像と REFERENCE_STYLE_PROMPT はこの文の後ろに別パートとして付く（client側）。
pub fn build_poster_prompt(params: &GenerationParameters, vibe: &str) -> String {
    let mut prompt = format!(
        "Create a professional and visually appealing product poster with a strict {} aspect ratio. It must incorporate ALL of the provided product images as the main subjects.",
        params.aspect_ratio.value()
    );
    prompt.push_str(&format!(
        " The overall theme and concept is: \"{}\".",
        params.concept
    ));
    prompt.push_str(&format!(" The desired artistic vibe is: \"{}\".", vibe));

    if is_blank(&params.background_concept) {
        prompt.push_str(BACKGROUND_FALLBACK_CLAUSE);
    } else {
        prompt.push_str(&format!(
            " For the background, you must strictly adhere to this description: \"{}\".",
            params.background_concept
        ));
    }

    if !is_blank(&params.poster_text) {
        prompt.push_str(&format!(
            " The poster must prominently feature the text: \"{}\".",
            params.poster_text
        ));
        if let Some(font) = params.font_style.as_deref().filter(|f| !is_blank(f)) {
            prompt.push_str(&format!(" The text should be rendered in {}.", font));
        }
        prompt.push_str(" Ensure the text is legible, well-integrated into the design, and complements the overall aesthetic.");
    }

    prompt.push_str(" The final output must be a single, complete poster image.");
    prompt
}

/// 修正プロンプト
pub fn build_refine_prompt(instruction: &str) -> String {
    format!(
        "Refine the provided poster image based on this instruction: \"{}\". Apply the change while maintaining the overall quality and composition. Output only the final, modified image.",
        instruction
    )
}
