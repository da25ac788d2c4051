//! Prompt composition rules
//!
//! Everything here is data-driven keyword matching against enhancement
//! display names: whether a shot needs a human model, which reference
//! image to attach, and what product noun to substitute into the
//! instruction. Rule tables are fixed and exhaustively testable.

use crate::catalog::Gender;

/// Display-name cues meaning "show the product worn by a person"
const MODEL_SHOT_KEYWORDS: &[&str] = &[
    "model",
    "worn",
    "wearing",
    "try on",
    "try-on",
    "on body",
    "lifestyle",
    "mannequin to model",
];

/// Product-type table; first match wins, fallback is generic clothing
const PRODUCT_RULES: &[(&str, &str)] = &[
    ("t-shirt", "t-shirt"),
    ("tshirt", "t-shirt"),
    ("shirt", "shirt"),
    ("dress", "dress"),
    ("gown", "dress"),
    ("jacket", "jacket"),
    ("coat", "jacket"),
    ("pants", "pants"),
    ("trousers", "pants"),
    ("jeans", "pants"),
    ("shoe", "shoes"),
    ("sneaker", "shoes"),
    ("heel", "shoes"),
    ("boot", "shoes"),
    ("bag", "bag"),
    ("purse", "bag"),
    ("watch", "watch"),
    ("necklace", "necklace"),
    ("bracelet", "bracelet"),
];

const DEFAULT_PRODUCT: &str = "clothing";

/// Fixed model-reference images attached as a second input when a
/// model shot is requested
pub const MODEL_REF_FEMALE_STUDIO: &str =
    "https://assets.pixelnova.ai/model-refs/female-studio.png";
pub const MODEL_REF_MALE_STUDIO: &str = "https://assets.pixelnova.ai/model-refs/male-studio.png";
pub const MODEL_REF_FEMALE_LIFESTYLE: &str =
    "https://assets.pixelnova.ai/model-refs/female-lifestyle.png";

/// Style cues selecting the lifestyle reference over the studio one
const LIFESTYLE_KEYWORDS: &[&str] = &["lifestyle", "casual", "street", "outdoor"];

pub fn is_model_shot(display_name: &str) -> bool {
    let name = display_name.to_lowercase();
    MODEL_SHOT_KEYWORDS.iter().any(|k| name.contains(k))
}

pub fn product_noun(display_name: &str) -> &'static str {
    let name = display_name.to_lowercase();
    PRODUCT_RULES
        .iter()
        .find(|(keyword, _)| name.contains(keyword))
        .map(|(_, noun)| *noun)
        .unwrap_or(DEFAULT_PRODUCT)
}

pub fn select_model_reference(display_name: &str, gender: Gender) -> &'static str {
    if gender == Gender::Male {
        return MODEL_REF_MALE_STUDIO;
    }
    let name = display_name.to_lowercase();
    if LIFESTYLE_KEYWORDS.iter().any(|k| name.contains(k)) {
        MODEL_REF_FEMALE_LIFESTYLE
    } else {
        MODEL_REF_FEMALE_STUDIO
    }
}

/// Rewrite a template for a two-image model shot
pub fn rewrite_for_model_shot(template: &str, noun: &str) -> String {
    format!(
        "Show the {noun} from image 1 worn naturally by the model from image 2, \
         keeping the {noun}'s exact design, colors and details. {template}"
    )
}

/// One of these two instructions is always appended; the output is
/// never ambiguous about watermarking.
pub fn watermark_instruction(watermark: Option<&str>) -> String {
    match watermark {
        Some(text) if !text.trim().is_empty() => format!(
            "Add the watermark text \"{}\" at roughly 30% opacity in the top-right corner.",
            text.trim()
        ),
        _ => "Remove any existing watermark, logo or branding text from the image.".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_shot_detection() {
        assert!(is_model_shot("Worn by Model"));
        assert!(is_model_shot("Lifestyle shot"));
        assert!(!is_model_shot("Remove Background"));
    }

    #[test]
    fn test_product_noun_rules() {
        assert_eq!(product_noun("Dress on Model"), "dress");
        assert_eq!(product_noun("Sneaker Lifestyle"), "shoes");
        assert_eq!(product_noun("T-Shirt Mockup"), "t-shirt");
        assert_eq!(product_noun("Worn by Model"), "clothing");
    }

    #[test]
    fn test_model_reference_selection() {
        assert_eq!(
            select_model_reference("Worn by Model", Gender::Male),
            MODEL_REF_MALE_STUDIO
        );
        assert_eq!(
            select_model_reference("Lifestyle shot", Gender::Female),
            MODEL_REF_FEMALE_LIFESTYLE
        );
        assert_eq!(
            select_model_reference("Worn by Model", Gender::Female),
            MODEL_REF_FEMALE_STUDIO
        );
    }

    #[test]
    fn test_watermark_instruction_always_present() {
        let with = watermark_instruction(Some("PixelNova"));
        assert!(with.contains("PixelNova"));
        assert!(with.contains("30%"));

        let without = watermark_instruction(None);
        assert!(without.contains("Remove"));

        let blank = watermark_instruction(Some("   "));
        assert!(blank.contains("Remove"));
    }
}
