// src/contract.rs - Natural-language contract generation
use std::sync::Arc;
use tracing::info;

use crate::llm_client::{with_fallback, LlmClient};
use crate::models::{ContentRef, LicensingTerms, PartyInfo};

const FAILURE_MESSAGE: &str = "Contract generation failed. Please try again.";

pub struct ContractRenderer {
    llm: Arc<LlmClient>,
}

/// Display names for the supported contract languages. Unknown codes pass
/// through as-is so the model still gets something to work with.
fn language_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "hi" => "Hindi (हिन्दी)",
        "ta" => "Tamil (தமிழ்)",
        "te" => "Telugu (తెలుగు)",
        "kn" => "Kannada (ಕನ್ನಡ)",
        "ml" => "Malayalam (മലയാളം)",
        "mr" => "Marathi (मराठी)",
        "gu" => "Gujarati (ગુજરાતી)",
        "pa" => "Punjabi (ਪੰਜਾਬੀ)",
        "bn" => "Bengali (বাংলা)",
        "es" => "Spanish (Español)",
        "fr" => "French (Français)",
        "de" => "German (Deutsch)",
        "zh" => "Chinese (中文)",
        "ja" => "Japanese (日本語)",
        "ko" => "Korean (한국어)",
        "ar" => "Arabic (العربية)",
        "ur" => "Urdu (اردو)",
        other => other,
    }
}

impl ContractRenderer {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// Generates full contract text in the requested language. There is no
    /// structural fallback: on failure the caller gets a fixed failure
    /// message instead of an error.
    pub async fn render(
        &self,
        terms: &LicensingTerms,
        creator_info: &PartyInfo,
        licensee_info: &PartyInfo,
        content_info: &ContentRef,
        language: &str,
    ) -> String {
        info!(
            "📜 Generating contract for \"{}\" in {}",
            content_info.title,
            language_name(language)
        );

        let prompt = build_contract_prompt(terms, creator_info, licensee_info, content_info, language);

        with_fallback(self.llm.generate_text(&prompt), |_| {
            FAILURE_MESSAGE.to_string()
        })
        .await
    }
}

fn build_contract_prompt(
    terms: &LicensingTerms,
    creator_info: &PartyInfo,
    licensee_info: &PartyInfo,
    content_info: &ContentRef,
    language: &str,
) -> String {
    let name = language_name(language);

    format!(
        r#"Generate a professional licensing contract in {name} (language code: {language}).

Terms: {terms}
Creator: {creator}
Licensee: {licensee}
Content: {content}

IMPORTANT:
- Generate the ENTIRE contract in {name} language
- Use proper legal terminology in {name}
- Include all standard licensing clauses
- Make it professional and legally sound
- If {name} uses a specific script (like Devanagari, Tamil, Telugu, etc.), write the contract in that script
- Include: parties, terms, duration, territory, payment terms, usage rights, restrictions, termination clauses, and dispute resolution

Generate the complete contract text in {name}."#,
        terms = serde_json::to_string(terms).unwrap_or_default(),
        creator = serde_json::to_string(creator_info).unwrap_or_default(),
        licensee = serde_json::to_string(licensee_info).unwrap_or_default(),
        content = serde_json::to_string(content_info).unwrap_or_default(),
    )
}
