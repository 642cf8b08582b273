// src/pricing.rs - Content analysis and price suggestion
use serde::Deserialize;
use std::sync::Arc;
use tracing::info;

use crate::llm_client::{with_fallback, LlmClient, LlmError};
use crate::models::{AssetMetadata, ContentAnalysis, ContentType, QualityTier, SuggestedPricing};

/// Filename substrings that mark throwaway content.
const LOW_QUALITY_MARKERS: [&str; 4] = ["screenshot", "copy", "temp", "low-res"];

/// Files under this size are assumed low quality when the model is unavailable.
const LOW_QUALITY_SIZE_BYTES: u64 = 100_000;

pub struct PricingEstimator {
    llm: Arc<LlmClient>,
}

/// Parse target for the model's analysis reply. Every field is optional so a
/// sparse reply degrades to table defaults instead of a parse failure.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelAnalysis {
    #[serde(rename = "type")]
    content_type: Option<String>,
    quality: Option<String>,
    duration: Option<f64>,
    genre: Option<String>,
    estimated_value: Option<f64>,
    suggested_pricing: Option<ModelPricing>,
    tags: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct ModelPricing {
    commercial: Option<f64>,
    non_commercial: Option<f64>,
    exclusive: Option<f64>,
}

/// Fixed quality → price lookup used to backfill anything the model leaves out.
pub fn quality_price_table(quality: QualityTier) -> SuggestedPricing {
    match quality {
        QualityTier::Low => SuggestedPricing {
            commercial: 25.0,
            non_commercial: 10.0,
            exclusive: 100.0,
        },
        QualityTier::Medium => SuggestedPricing {
            commercial: 150.0,
            non_commercial: 50.0,
            exclusive: 1000.0,
        },
        QualityTier::High => SuggestedPricing {
            commercial: 500.0,
            non_commercial: 150.0,
            exclusive: 3000.0,
        },
        QualityTier::Professional => SuggestedPricing {
            commercial: 2000.0,
            non_commercial: 500.0,
            exclusive: 10000.0,
        },
    }
}

fn default_estimated_value(quality: QualityTier) -> f64 {
    match quality {
        QualityTier::Low => 20.0,
        QualityTier::Medium => 100.0,
        QualityTier::High => 500.0,
        QualityTier::Professional => 2000.0,
    }
}

impl PricingEstimator {
    pub fn new(llm: Arc<LlmClient>) -> Self {
        Self { llm }
    }

    /// Analyzes content and suggests pricing. Never fails: a dead or
    /// incoherent model degrades to the filename/size heuristic.
    pub async fn analyze(
        &self,
        file_type: &str,
        file_name: &str,
        metadata: Option<&AssetMetadata>,
        file_size: Option<u64>,
    ) -> ContentAnalysis {
        info!("🧠 Analyzing content: {} ({})", file_name, file_type);

        let analysis = with_fallback(
            self.analyze_via_model(file_type, file_name, metadata, file_size),
            |_| self.heuristic_analysis(file_type, file_name, file_size),
        )
        .await;

        info!(
            "✅ Analysis complete: {} quality, estimated ${}",
            analysis.quality, analysis.estimated_value
        );

        analysis
    }

    async fn analyze_via_model(
        &self,
        file_type: &str,
        file_name: &str,
        metadata: Option<&AssetMetadata>,
        file_size: Option<u64>,
    ) -> Result<ContentAnalysis, LlmError> {
        let prompt = build_analysis_prompt(file_type, file_name, metadata, file_size);
        let parsed: ModelAnalysis = self.llm.generate_json(&prompt).await?;
        Ok(finalize(parsed, file_type))
    }

    /// No-model path: quality from filename markers and byte count, prices
    /// straight from the fixed table.
    fn heuristic_analysis(
        &self,
        file_type: &str,
        file_name: &str,
        file_size: Option<u64>,
    ) -> ContentAnalysis {
        let name = file_name.to_lowercase();
        let looks_low = LOW_QUALITY_MARKERS.iter().any(|marker| name.contains(marker))
            || file_size.map_or(false, |size| size < LOW_QUALITY_SIZE_BYTES);

        let quality = if looks_low {
            QualityTier::Low
        } else {
            QualityTier::Medium
        };

        ContentAnalysis {
            content_type: ContentType::from_mime(file_type),
            quality,
            duration: None,
            genre: None,
            estimated_value: default_estimated_value(quality),
            suggested_pricing: quality_price_table(quality),
            tags: Vec::new(),
        }
    }
}

/// Field-by-field backfill of a sparse model reply. Quality defaults to
/// medium; pricing and estimated value come from the fixed tables for
/// whatever tier was settled on.
fn finalize(parsed: ModelAnalysis, file_type: &str) -> ContentAnalysis {
    let quality = parsed
        .quality
        .as_deref()
        .and_then(QualityTier::parse_lenient)
        .unwrap_or(QualityTier::Medium);

    let table = quality_price_table(quality);
    let model_pricing = parsed.suggested_pricing.unwrap_or_default();

    ContentAnalysis {
        content_type: parsed
            .content_type
            .as_deref()
            .and_then(ContentType::parse_lenient)
            .unwrap_or_else(|| ContentType::from_mime(file_type)),
        quality,
        duration: parsed.duration.map(|secs| secs as u32),
        genre: parsed.genre,
        estimated_value: parsed
            .estimated_value
            .unwrap_or_else(|| default_estimated_value(quality)),
        suggested_pricing: SuggestedPricing {
            commercial: model_pricing.commercial.unwrap_or(table.commercial),
            non_commercial: model_pricing.non_commercial.unwrap_or(table.non_commercial),
            exclusive: model_pricing.exclusive.unwrap_or(table.exclusive),
        },
        tags: parsed.tags.unwrap_or_default(),
    }
}

fn build_analysis_prompt(
    file_type: &str,
    file_name: &str,
    metadata: Option<&AssetMetadata>,
    file_size: Option<u64>,
) -> String {
    let size_display = file_size
        .map(|size| format!("{:.2} MB", size as f64 / 1024.0 / 1024.0))
        .unwrap_or_else(|| "unknown".to_string());
    let title = metadata
        .and_then(|m| m.title.as_deref())
        .filter(|t| !t.is_empty())
        .unwrap_or("Not provided");
    let description = metadata
        .and_then(|m| m.description.as_deref())
        .filter(|d| !d.is_empty())
        .unwrap_or("Not provided");

    format!(
        r#"You are an expert IP licensing analyst with deep knowledge of content market values, quality assessment, and fair pricing strategies.

Analyze this content for IP licensing with careful consideration:

FILE INFORMATION:
- File Type: {file_type}
- File Name: {file_name}
- File Size: {size_display}
- Title: {title}
- Description: {description}

ANALYSIS REQUIREMENTS:
1. CONTENT TYPE: Determine if this is music/video/image/other based on file type and metadata
2. QUALITY ASSESSMENT: Evaluate quality as low/medium/high/professional based on:
   - File name patterns (screenshots, low-res, compressed files suggest lower quality)
   - File size relative to type (very small files may be low quality)
   - Title and description quality (professional content has better descriptions)
   - Common indicators of low quality: "screenshot", "copy", "temp", "low-res", "compressed"
3. MARKET VALUE: Estimate realistic market value considering:
   - Content type and quality level
   - Industry standards for similar content
   - Low quality content (screenshots, quick snaps) = $5-50
   - Medium quality (decent photos, basic videos) = $50-500
   - High quality (professional work) = $500-5000
   - Professional/exceptional = $5000+
4. PRICING STRATEGY: Set fair, market-appropriate pricing:
   - Commercial license: Based on quality and market value (typically 1-2x estimated value)
   - Non-commercial: Lower than commercial (typically 20-50% of commercial)
   - Exclusive: Significantly higher (typically 5-10x commercial for high quality, 2-3x for lower quality)
   - Be realistic: Low quality content should NOT be priced at $500+
5. TAGS: Generate relevant tags for discoverability

CRITICAL RULES:
- Low quality content (screenshots, quick photos, basic images) should have commercial pricing of $10-100, NOT $500+
- Only professional, high-quality content should command premium pricing ($500+)
- Consider file size: Very small files often indicate low quality
- File names with "screenshot", "copy", "temp" suggest lower value
- Be conservative and realistic with pricing

Return ONLY valid JSON in this exact format:
{{
  "type": "music|video|image|other",
  "quality": "low|medium|high|professional",
  "duration": number (in seconds, only for audio/video),
  "genre": "string or null",
  "estimatedValue": number (realistic USD value),
  "suggestedPricing": {{
    "commercial": number (fair commercial price in USD),
    "nonCommercial": number (fair non-commercial price in USD),
    "exclusive": number (fair exclusive price in USD)
  }},
  "tags": ["tag1", "tag2", "tag3"]
}}

Return only the JSON object, no other text."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dead_estimator() -> PricingEstimator {
        PricingEstimator::new(Arc::new(LlmClient::new(
            "http://127.0.0.1:9".to_string(),
            "mistral".to_string(),
        )))
    }

    #[test]
    fn price_table_matches_fixed_values() {
        let low = quality_price_table(QualityTier::Low);
        assert_eq!((low.commercial, low.non_commercial, low.exclusive), (25.0, 10.0, 100.0));

        let medium = quality_price_table(QualityTier::Medium);
        assert_eq!((medium.commercial, medium.non_commercial, medium.exclusive), (150.0, 50.0, 1000.0));

        let high = quality_price_table(QualityTier::High);
        assert_eq!((high.commercial, high.non_commercial, high.exclusive), (500.0, 150.0, 3000.0));

        let pro = quality_price_table(QualityTier::Professional);
        assert_eq!((pro.commercial, pro.non_commercial, pro.exclusive), (2000.0, 500.0, 10000.0));
    }

    #[tokio::test]
    async fn screenshot_filename_falls_back_to_low_quality() {
        let analysis = dead_estimator()
            .analyze("image/png", "Screenshot 2024-11-02.png", None, None)
            .await;

        assert_eq!(analysis.quality, QualityTier::Low);
        assert_eq!(analysis.estimated_value, 20.0);
        assert_eq!(analysis.suggested_pricing, quality_price_table(QualityTier::Low));
        assert!(analysis.tags.is_empty());
    }

    #[tokio::test]
    async fn tiny_file_falls_back_to_low_quality() {
        let analysis = dead_estimator()
            .analyze("image/jpeg", "sunset.jpg", None, Some(40_000))
            .await;

        assert_eq!(analysis.quality, QualityTier::Low);
    }

    #[tokio::test]
    async fn ordinary_file_falls_back_to_medium_quality() {
        let analysis = dead_estimator()
            .analyze("video/mp4", "showreel-final.mp4", None, Some(80_000_000))
            .await;

        assert_eq!(analysis.quality, QualityTier::Medium);
        assert_eq!(analysis.estimated_value, 100.0);
        assert_eq!(analysis.content_type, ContentType::Video);
        assert_eq!(analysis.suggested_pricing, quality_price_table(QualityTier::Medium));
    }

    #[test]
    fn finalize_backfills_missing_pricing_from_table() {
        let parsed = ModelAnalysis {
            quality: Some("high".to_string()),
            ..Default::default()
        };

        let analysis = finalize(parsed, "audio/wav");

        assert_eq!(analysis.quality, QualityTier::High);
        assert_eq!(analysis.content_type, ContentType::Music);
        assert_eq!(analysis.estimated_value, 500.0);
        assert_eq!(analysis.suggested_pricing, quality_price_table(QualityTier::High));
    }

    #[test]
    fn finalize_keeps_model_values_when_present() {
        let parsed = ModelAnalysis {
            content_type: Some("image".to_string()),
            quality: Some("professional".to_string()),
            estimated_value: Some(7500.0),
            suggested_pricing: Some(ModelPricing {
                commercial: Some(3000.0),
                non_commercial: None,
                exclusive: Some(15000.0),
            }),
            tags: Some(vec!["editorial".to_string()]),
            ..Default::default()
        };

        let analysis = finalize(parsed, "image/tiff");

        assert_eq!(analysis.estimated_value, 7500.0);
        assert_eq!(analysis.suggested_pricing.commercial, 3000.0);
        // Missing field backfilled from the professional tier.
        assert_eq!(analysis.suggested_pricing.non_commercial, 500.0);
        assert_eq!(analysis.suggested_pricing.exclusive, 15000.0);
        assert_eq!(analysis.tags, vec!["editorial".to_string()]);
    }

    #[test]
    fn finalize_defaults_unknown_quality_to_medium() {
        let parsed = ModelAnalysis {
            quality: Some("stellar".to_string()),
            ..Default::default()
        };

        let analysis = finalize(parsed, "application/zip");

        assert_eq!(analysis.quality, QualityTier::Medium);
        assert_eq!(analysis.content_type, ContentType::Other);
    }
}
