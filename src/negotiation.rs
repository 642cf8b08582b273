// src/negotiation.rs - Automated licensing negotiation
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::info;

use crate::llm_client::{with_fallback, LlmClient, LlmError};
use crate::models::{
    ContentAnalysis, LicensingTerms, NegotiationResult, TermsRequest, UsageRights,
};

const FALLBACK_REASONING: &str = "Error during negotiation. Please try again.";

pub struct NegotiationEngine {
    llm: Arc<LlmClient>,
}

/// Parse target for the model's negotiation reply. `accepted` stays a raw
/// JSON value: only a literal `true` counts as acceptance, anything else
/// (strings, numbers, absence) is a rejection rather than a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelNegotiation {
    accepted: Option<Value>,
    final_terms: Option<TermsRequest>,
    reasoning: Option<String>,
}

impl NegotiationEngine {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// Settles terms between a creator's offer and a licensee's request.
    /// Never throws to the caller: any failure produces a rejection carrying
    /// the creator's terms unchanged.
    pub async fn negotiate(
        &self,
        creator_terms: &LicensingTerms,
        licensee_request: &TermsRequest,
        analysis: &ContentAnalysis,
    ) -> NegotiationResult {
        info!(
            "🤝 Negotiating: creator asks ${}, licensee offers {}",
            creator_terms.price,
            licensee_request
                .price
                .map(|p| format!("${}", p))
                .unwrap_or_else(|| "nothing specific".to_string())
        );

        let rejection_terms = creator_terms.clone();
        let result = with_fallback(
            self.negotiate_via_model(creator_terms, licensee_request, analysis),
            move |_| NegotiationResult {
                accepted: false,
                final_terms: rejection_terms,
                reasoning: FALLBACK_REASONING.to_string(),
            },
        )
        .await;

        info!(
            "{} Negotiation {}: {}",
            if result.accepted { "✅" } else { "❌" },
            if result.accepted { "accepted" } else { "rejected" },
            result.reasoning
        );

        result
    }

    async fn negotiate_via_model(
        &self,
        creator_terms: &LicensingTerms,
        licensee_request: &TermsRequest,
        analysis: &ContentAnalysis,
    ) -> Result<NegotiationResult, LlmError> {
        let prompt = build_negotiation_prompt(creator_terms, licensee_request, analysis);
        let parsed: ModelNegotiation = self.llm.generate_json(&prompt).await?;
        Ok(resolve(parsed, creator_terms))
    }
}

/// Turns a sparse model reply into a complete result. Each final-terms field
/// is backfilled from the creator's terms independently.
fn resolve(parsed: ModelNegotiation, creator_terms: &LicensingTerms) -> NegotiationResult {
    let proposed = parsed.final_terms.unwrap_or_default();

    let final_terms = LicensingTerms {
        usage_rights: proposed
            .usage_rights
            .as_deref()
            .and_then(UsageRights::parse_lenient)
            .unwrap_or(creator_terms.usage_rights),
        derivatives: proposed.derivatives.unwrap_or(creator_terms.derivatives),
        territory: proposed
            .territory
            .unwrap_or_else(|| creator_terms.territory.clone()),
        duration: proposed
            .duration
            .map(|days| days as u32)
            .unwrap_or(creator_terms.duration),
        price: proposed.price.unwrap_or(creator_terms.price),
    };

    NegotiationResult {
        accepted: matches!(parsed.accepted, Some(Value::Bool(true))),
        final_terms,
        reasoning: parsed
            .reasoning
            .unwrap_or_else(|| "Negotiation completed".to_string()),
    }
}

fn build_negotiation_prompt(
    creator_terms: &LicensingTerms,
    licensee_request: &TermsRequest,
    analysis: &ContentAnalysis,
) -> String {
    let requested_rights = licensee_request
        .usage_rights
        .as_deref()
        .unwrap_or("not specified");
    let requested_price = licensee_request
        .price
        .map(|p| format!("${}", p))
        .unwrap_or_else(|| "not specified".to_string());
    let requested_duration = licensee_request
        .duration
        .map(|d| format!("{} days", d))
        .unwrap_or_else(|| "not specified".to_string());
    let requested_territory = licensee_request
        .territory
        .as_ref()
        .map(|t| t.join(", "))
        .unwrap_or_else(|| "not specified".to_string());

    format!(
        r#"You are an expert IP licensing negotiator. Your role is to facilitate fair agreements between content creators and licensees.

CURRENT SITUATION:
Creator's Initial Terms:
- Usage Rights: {creator_rights}
- Price: ${creator_price}
- Duration: {creator_duration} days
- Territory: {creator_territory}
- Derivatives Allowed: {creator_derivatives}

Licensee's Request:
- Usage Rights: {requested_rights}
- Price: {requested_price}
- Duration: {requested_duration}
- Territory: {requested_territory}

Content Analysis:
- Type: {content_type}
- Quality: {quality}
- Estimated Market Value: ${estimated_value}
- Suggested Commercial Price: ${commercial}
- Suggested Non-Commercial Price: ${non_commercial}
- Suggested Exclusive Price: ${exclusive}

NEGOTIATION GUIDELINES:
1. Consider the content quality and market value when evaluating price requests
2. Allow reasonable price negotiations (within 20-30% of original price is usually acceptable)
3. If licensee requests significantly lower price, suggest a middle ground
4. Consider usage rights: exclusive should cost more than commercial, commercial more than non-commercial
5. Be fair to both parties - don't always favor the creator or licensee
6. If terms are reasonable, accept them. If unreasonable, suggest fair alternatives.

DECISION LOGIC:
- Accept if: Price difference is within 30% and usage rights are compatible
- Negotiate if: Price difference is 30-50% - suggest a middle ground
- Reject if: Price difference is >50% or terms are fundamentally incompatible

Return JSON in this exact format:
{{
  "accepted": boolean,
  "finalTerms": {{
    "usageRights": "commercial|non-commercial|exclusive",
    "price": number,
    "duration": number,
    "territory": ["string"],
    "derivatives": boolean
  }},
  "reasoning": "clear explanation of the negotiation outcome and why"
}}

Return only the JSON object, no other text."#,
        creator_rights = creator_terms.usage_rights,
        creator_price = creator_terms.price,
        creator_duration = creator_terms.duration,
        creator_territory = creator_terms.territory.join(", "),
        creator_derivatives = creator_terms.derivatives,
        content_type = analysis.content_type,
        quality = analysis.quality,
        estimated_value = analysis.estimated_value,
        commercial = analysis.suggested_pricing.commercial,
        non_commercial = analysis.suggested_pricing.non_commercial,
        exclusive = analysis.suggested_pricing.exclusive,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ContentType, QualityTier, SuggestedPricing};

    fn creator_terms() -> LicensingTerms {
        LicensingTerms {
            usage_rights: UsageRights::Commercial,
            derivatives: false,
            territory: vec!["US".to_string(), "EU".to_string()],
            duration: 365,
            price: 200.0,
        }
    }

    fn analysis() -> ContentAnalysis {
        ContentAnalysis {
            content_type: ContentType::Image,
            quality: QualityTier::High,
            duration: None,
            genre: None,
            estimated_value: 500.0,
            suggested_pricing: SuggestedPricing {
                commercial: 500.0,
                non_commercial: 150.0,
                exclusive: 3000.0,
            },
            tags: vec!["photography".to_string()],
        }
    }

    fn dead_engine() -> NegotiationEngine {
        NegotiationEngine::new(Arc::new(LlmClient::new(
            "http://127.0.0.1:9".to_string(),
            "mistral".to_string(),
        )))
    }

    #[tokio::test]
    async fn dead_endpoint_rejects_with_creator_terms_unchanged() {
        let terms = creator_terms();
        let result = dead_engine()
            .negotiate(&terms, &TermsRequest::default(), &analysis())
            .await;

        assert!(!result.accepted);
        assert_eq!(result.final_terms, terms);
        assert_eq!(result.reasoning, FALLBACK_REASONING);
    }

    #[test]
    fn resolve_backfills_every_missing_field() {
        let terms = creator_terms();
        let result = resolve(ModelNegotiation::default(), &terms);

        assert!(!result.accepted);
        assert_eq!(result.final_terms, terms);
        assert_eq!(result.reasoning, "Negotiation completed");
    }

    #[test]
    fn resolve_backfills_fields_independently() {
        let parsed = ModelNegotiation {
            accepted: Some(Value::Bool(true)),
            final_terms: Some(TermsRequest {
                price: Some(180.0),
                duration: Some(180.0),
                ..Default::default()
            }),
            reasoning: Some("Met in the middle on price".to_string()),
        };

        let terms = creator_terms();
        let result = resolve(parsed, &terms);

        assert!(result.accepted);
        assert_eq!(result.final_terms.price, 180.0);
        assert_eq!(result.final_terms.duration, 180);
        // Untouched fields carry over from the creator.
        assert_eq!(result.final_terms.usage_rights, terms.usage_rights);
        assert_eq!(result.final_terms.territory, terms.territory);
        assert_eq!(result.final_terms.derivatives, terms.derivatives);
    }

    #[test]
    fn only_literal_true_counts_as_acceptance() {
        let terms = creator_terms();

        for value in [
            Value::String("true".to_string()),
            Value::String("yes".to_string()),
            Value::Number(1.into()),
            Value::Bool(false),
            Value::Null,
        ] {
            let parsed = ModelNegotiation {
                accepted: Some(value),
                ..Default::default()
            };
            assert!(!resolve(parsed, &terms).accepted);
        }

        let parsed = ModelNegotiation {
            accepted: Some(Value::Bool(true)),
            ..Default::default()
        };
        assert!(resolve(parsed, &terms).accepted);
    }

    #[test]
    fn unknown_usage_rights_fall_back_to_creator_value() {
        let parsed = ModelNegotiation {
            final_terms: Some(TermsRequest {
                usage_rights: Some("perpetual-worldwide".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let terms = creator_terms();
        let result = resolve(parsed, &terms);
        assert_eq!(result.final_terms.usage_rights, UsageRights::Commercial);
    }

    #[test]
    fn malformed_model_json_never_escapes_the_engine() {
        // The lenient parser fails on garbage, which with_fallback converts
        // into a rejection; resolve() is never reached. This pins down the
        // parse side of that contract.
        let garbage: Result<ModelNegotiation, _> =
            crate::llm_client::parse_json_lenient("sorry, I can't help with that");
        assert!(garbage.is_err());
    }
}
