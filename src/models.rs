// src/models.rs
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Music,
    Video,
    Image,
    Other,
}

impl ContentType {
    /// Coarse classification from a MIME type string.
    pub fn from_mime(file_type: &str) -> Self {
        if file_type.contains("audio") {
            ContentType::Music
        } else if file_type.contains("video") {
            ContentType::Video
        } else if file_type.contains("image") {
            ContentType::Image
        } else {
            ContentType::Other
        }
    }

    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "music" => Some(ContentType::Music),
            "video" => Some(ContentType::Video),
            "image" => Some(ContentType::Image),
            "other" => Some(ContentType::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Music => "music",
            ContentType::Video => "video",
            ContentType::Image => "image",
            ContentType::Other => "other",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityTier {
    Low,
    Medium,
    High,
    Professional,
}

impl QualityTier {
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(QualityTier::Low),
            "medium" => Some(QualityTier::Medium),
            "high" => Some(QualityTier::High),
            "professional" => Some(QualityTier::Professional),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityTier::Low => "low",
            QualityTier::Medium => "medium",
            QualityTier::High => "high",
            QualityTier::Professional => "professional",
        }
    }
}

impl fmt::Display for QualityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UsageRights {
    #[serde(rename = "commercial")]
    Commercial,
    #[serde(rename = "non-commercial")]
    NonCommercial,
    #[serde(rename = "exclusive")]
    Exclusive,
}

impl UsageRights {
    pub fn parse_lenient(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "commercial" => Some(UsageRights::Commercial),
            "non-commercial" | "noncommercial" => Some(UsageRights::NonCommercial),
            "exclusive" => Some(UsageRights::Exclusive),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UsageRights::Commercial => "commercial",
            UsageRights::NonCommercial => "non-commercial",
            UsageRights::Exclusive => "exclusive",
        }
    }
}

impl fmt::Display for UsageRights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Price suggestions per license class, in USD.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SuggestedPricing {
    pub commercial: f64,
    pub non_commercial: f64,
    pub exclusive: f64,
}

/// Result of content analysis, fixed at upload time and embedded by value
/// into the owning asset record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentAnalysis {
    #[serde(rename = "type")]
    pub content_type: ContentType,
    pub quality: QualityTier,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub genre: Option<String>,
    pub estimated_value: f64,
    pub suggested_pricing: SuggestedPricing,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Commercial conditions under which content may be used. Appears both as a
/// creator's offered terms (attached to an asset) and as the settled terms of
/// a request or agreement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensingTerms {
    pub usage_rights: UsageRights,
    pub derivatives: bool,
    pub territory: Vec<String>,
    /// License duration in days.
    pub duration: u32,
    pub price: f64,
}

/// A licensee's (possibly partial) counterpart to [`LicensingTerms`]. Every
/// field is optional; this is also the parse target for the negotiation
/// model's `finalTerms` reply, where any field may be missing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TermsRequest {
    pub usage_rights: Option<String>,
    pub derivatives: Option<bool>,
    pub territory: Option<Vec<String>>,
    pub duration: Option<f64>,
    pub price: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NegotiationResult {
    pub accepted: bool,
    pub final_terms: LicensingTerms,
    pub reasoning: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Creator {
    pub id: String,
    pub wallet_address: String,
    pub name: String,
    pub bio: String,
    pub location: String,
    pub language: String,
    /// Epoch milliseconds.
    pub created_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IPAsset {
    pub id: String,
    pub creator_id: String,
    pub token_id: String,
    pub title: String,
    pub description: String,
    pub file_url: String,
    pub file_type: String,
    pub content_hash: String,
    pub analysis: ContentAnalysis,
    pub licensing_terms: LicensingTerms,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Negotiating,
    Accepted,
    Rejected,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensingRequest {
    pub id: String,
    pub ip_asset_id: String,
    pub licensee_address: String,
    pub requested_terms: LicensingTerms,
    pub status: RequestStatus,
    #[serde(default)]
    pub negotiation_history: Vec<NegotiationResult>,
    pub created_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgreementStatus {
    Active,
    Expired,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LicensingAgreement {
    pub id: String,
    pub request_id: String,
    pub ip_asset_id: String,
    pub creator_address: String,
    pub licensee_address: String,
    pub terms: LicensingTerms,
    pub contract_text: String,
    pub contract_hash: String,
    pub status: AgreementStatus,
    pub created_at: i64,
    pub expires_at: i64,
}

/// User-supplied metadata attached to an upload. Only title and description
/// feed the pricing prompt.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetMetadata {
    pub title: Option<String>,
    pub description: Option<String>,
}

/// Party identity as it appears in generated contracts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyInfo {
    pub name: String,
    pub address: String,
}

/// Minimal content reference for contract generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentRef {
    pub title: String,
    pub token_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_rights_wire_names() {
        let json = serde_json::to_string(&UsageRights::NonCommercial).unwrap();
        assert_eq!(json, "\"non-commercial\"");
        let parsed: UsageRights = serde_json::from_str("\"exclusive\"").unwrap();
        assert_eq!(parsed, UsageRights::Exclusive);
    }

    #[test]
    fn content_type_from_mime() {
        assert_eq!(ContentType::from_mime("audio/mpeg"), ContentType::Music);
        assert_eq!(ContentType::from_mime("video/mp4"), ContentType::Video);
        assert_eq!(ContentType::from_mime("image/png"), ContentType::Image);
        assert_eq!(ContentType::from_mime("application/pdf"), ContentType::Other);
    }

    #[test]
    fn quality_parse_is_case_insensitive() {
        assert_eq!(QualityTier::parse_lenient("Professional"), Some(QualityTier::Professional));
        assert_eq!(QualityTier::parse_lenient("LOW"), Some(QualityTier::Low));
        assert_eq!(QualityTier::parse_lenient("studio-grade"), None);
    }

    #[test]
    fn terms_request_tolerates_missing_fields() {
        let partial: TermsRequest = serde_json::from_str(r#"{"price": 120}"#).unwrap();
        assert_eq!(partial.price, Some(120.0));
        assert!(partial.usage_rights.is_none());
        assert!(partial.territory.is_none());
    }
}
