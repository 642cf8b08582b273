// src/main.rs - Marketplace API server
mod contract;
mod llm_client;
mod models;
mod negotiation;
mod pricing;
mod royalty;
mod store;

use axum::{
    body::Bytes,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::contract::ContractRenderer;
use crate::llm_client::LlmClient;
use crate::models::{
    AgreementStatus, AssetMetadata, ContentAnalysis, ContentRef, Creator, IPAsset,
    LicensingAgreement, LicensingRequest, LicensingTerms, NegotiationResult, PartyInfo,
    RequestStatus, TermsRequest,
};
use crate::negotiation::NegotiationEngine;
use crate::pricing::PricingEstimator;
use crate::store::RecordStore;

// Response structures

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[derive(Serialize)]
struct HealthResponse {
    status: String,
    timestamp: String,
    services: ServiceHealth,
}

#[derive(Serialize)]
struct ServiceHealth {
    llm: bool,
}

#[derive(Serialize)]
struct ContractResponse {
    contract: String,
}

#[derive(Serialize)]
struct CreatorResponse {
    creator: Option<Creator>,
}

#[derive(Serialize)]
struct AssetsResponse {
    assets: Vec<IPAsset>,
}

#[derive(Serialize)]
struct RequestsResponse {
    requests: Vec<LicensingRequest>,
}

#[derive(Serialize)]
struct AgreementsResponse {
    agreements: Vec<LicensingAgreement>,
}

#[derive(Serialize)]
struct CreateAssetResponse {
    success: bool,
    asset: IPAsset,
}

#[derive(Serialize)]
struct CreateRequestResponse {
    success: bool,
    request: LicensingRequest,
}

#[derive(Serialize)]
struct CreateAgreementResponse {
    success: bool,
    agreement: LicensingAgreement,
}

#[derive(Serialize)]
struct LicensingFlowResponse {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    request: Option<LicensingRequest>,
    negotiation: NegotiationResult,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    success: bool,
    file_url: String,
    file_name: String,
    file_size: u64,
    file_type: String,
    content_hash: String,
}

// Shared application state

#[derive(Clone)]
struct AppState {
    llm: Arc<LlmClient>,
    estimator: Arc<PricingEstimator>,
    negotiator: Arc<NegotiationEngine>,
    renderer: Arc<ContractRenderer>,
    store: Arc<RecordStore>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ip_licensing_marketplace=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("🚀 Starting IP Licensing Marketplace API");

    // Load configuration from environment
    let llm_url = std::env::var("LLM_URL")
        .unwrap_or_else(|_| "http://localhost:11434".to_string());
    let llm_model = std::env::var("LLM_MODEL")
        .unwrap_or_else(|_| "mistral".to_string());
    let server_port = std::env::var("PORT")
        .unwrap_or_else(|_| "8080".to_string())
        .parse::<u16>()
        .unwrap_or(8080);

    info!("⚙️  Configuration:");
    info!("   LLM URL: {}", llm_url);
    info!("   LLM Model: {}", llm_model);
    info!("   Port: {}", server_port);

    // Initialize services
    let llm = Arc::new(LlmClient::new(llm_url, llm_model));
    let state = AppState {
        estimator: Arc::new(PricingEstimator::new(llm.clone())),
        negotiator: Arc::new(NegotiationEngine::new(llm.clone())),
        renderer: Arc::new(ContractRenderer::new(llm.clone())),
        store: Arc::new(RecordStore::new()),
        llm,
    };

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/analyze", post(analyze_handler))
        .route("/contract", post(contract_handler))
        .route("/negotiate", post(negotiate_handler))
        .route("/creators", get(get_creator_handler).post(create_creator_handler))
        .route("/creators/:address", get(creator_by_address_handler))
        .route("/creators/:address/assets", get(creator_assets_handler))
        .route("/creators/:address/requests", get(creator_requests_handler))
        .route("/creators/:address/agreements", get(creator_agreements_handler))
        .route("/ip-assets", get(list_assets_handler).post(create_asset_handler))
        .route("/licensing", post(licensing_handler))
        .route("/licensing/requests", post(create_request_handler))
        .route("/licensing/agreements", post(create_agreement_handler))
        .route("/upload", post(upload_handler))
        .with_state(state)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("0.0.0.0:{}", server_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    info!("✅ Server listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .expect("Server failed to start");
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn error_response(status: StatusCode, message: &str) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.to_string(),
        }),
    )
}

fn require<T>(value: Option<T>, name: &str) -> Result<T, ApiError> {
    value.ok_or_else(|| error_response(StatusCode::BAD_REQUEST, &format!("{} is required", name)))
}

fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let llm_healthy = state.llm.health_check().await;

    let status = if llm_healthy { "healthy" } else { "degraded" };

    Json(HealthResponse {
        status: status.to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
        services: ServiceHealth { llm: llm_healthy },
    })
}

// AI endpoints

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeRequest {
    file_type: Option<String>,
    file_name: Option<String>,
    metadata: Option<AssetMetadata>,
    file_size: Option<u64>,
}

async fn analyze_handler(
    State(state): State<AppState>,
    Json(body): Json<AnalyzeRequest>,
) -> Result<Json<ContentAnalysis>, ApiError> {
    let file_type = require(body.file_type, "fileType")?;
    let file_name = require(body.file_name, "fileName")?;

    let analysis = state
        .estimator
        .analyze(&file_type, &file_name, body.metadata.as_ref(), body.file_size)
        .await;

    Ok(Json(analysis))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractRequest {
    terms: Option<LicensingTerms>,
    creator_info: Option<PartyInfo>,
    licensee_info: Option<PartyInfo>,
    content_info: Option<ContentRef>,
    language: Option<String>,
}

async fn contract_handler(
    State(state): State<AppState>,
    Json(body): Json<ContractRequest>,
) -> Result<Json<ContractResponse>, ApiError> {
    let terms = require(body.terms, "terms")?;
    let creator_info = require(body.creator_info, "creatorInfo")?;
    let licensee_info = require(body.licensee_info, "licenseeInfo")?;
    let content_info = require(body.content_info, "contentInfo")?;
    let language = body.language.unwrap_or_else(|| "en".to_string());

    let contract = state
        .renderer
        .render(&terms, &creator_info, &licensee_info, &content_info, &language)
        .await;

    Ok(Json(ContractResponse { contract }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct NegotiateRequest {
    creator_terms: Option<LicensingTerms>,
    #[serde(default)]
    licensee_request: TermsRequest,
    content_analysis: Option<ContentAnalysis>,
}

async fn negotiate_handler(
    State(state): State<AppState>,
    Json(body): Json<NegotiateRequest>,
) -> Result<Json<NegotiationResult>, ApiError> {
    let creator_terms = require(body.creator_terms, "creatorTerms")?;
    let content_analysis = require(body.content_analysis, "contentAnalysis")?;

    let result = state
        .negotiator
        .negotiate(&creator_terms, &body.licensee_request, &content_analysis)
        .await;

    Ok(Json(result))
}

// Creator endpoints

#[derive(Deserialize)]
struct CreatorQuery {
    address: Option<String>,
}

async fn get_creator_handler(
    State(state): State<AppState>,
    Query(query): Query<CreatorQuery>,
) -> Result<Json<CreatorResponse>, ApiError> {
    let address = require(query.address, "address")?;

    Ok(Json(CreatorResponse {
        creator: state.store.get_creator_by_address(&address),
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateCreatorRequest {
    id: Option<String>,
    wallet_address: Option<String>,
    name: Option<String>,
    bio: Option<String>,
    location: Option<String>,
    language: Option<String>,
    created_at: Option<i64>,
}

async fn create_creator_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateCreatorRequest>,
) -> Result<Json<CreatorResponse>, ApiError> {
    let creator = state.store.create_creator(Creator {
        id: require(body.id, "id")?,
        wallet_address: require(body.wallet_address, "walletAddress")?,
        name: require(body.name, "name")?,
        bio: body.bio.unwrap_or_default(),
        location: body.location.unwrap_or_default(),
        language: body.language.unwrap_or_else(|| "en".to_string()),
        created_at: body.created_at.unwrap_or_else(now_millis),
    });

    info!("👤 Creator registered: {} ({})", creator.name, creator.wallet_address);

    Ok(Json(CreatorResponse {
        creator: Some(creator),
    }))
}

async fn creator_by_address_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<CreatorResponse> {
    // Id-first lookup so profile pages work with either identifier.
    let creator = state
        .store
        .get_creator(&address)
        .or_else(|| state.store.get_creator_by_address(&address));

    Json(CreatorResponse { creator })
}

async fn creator_assets_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<AssetsResponse> {
    let assets = match state.store.get_creator_by_address(&address) {
        Some(creator) => state.store.get_ip_assets_by_creator(&creator.id),
        None => Vec::new(),
    };

    Json(AssetsResponse { assets })
}

async fn creator_requests_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<RequestsResponse> {
    let requests = match state.store.get_creator_by_address(&address) {
        Some(creator) => state.store.get_licensing_requests_by_creator(&creator.id),
        None => Vec::new(),
    };

    Json(RequestsResponse { requests })
}

async fn creator_agreements_handler(
    State(state): State<AppState>,
    Path(address): Path<String>,
) -> Json<AgreementsResponse> {
    Json(AgreementsResponse {
        agreements: state.store.get_licensing_agreements_by_creator(&address),
    })
}

// IP asset endpoints

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetQuery {
    creator_id: Option<String>,
}

async fn list_assets_handler(
    State(state): State<AppState>,
    Query(query): Query<AssetQuery>,
) -> Json<AssetsResponse> {
    let assets = match query.creator_id {
        Some(creator_id) => state.store.get_ip_assets_by_creator(&creator_id),
        None => state.store.get_all_ip_assets(),
    };

    Json(AssetsResponse { assets })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAssetRequest {
    id: Option<String>,
    creator_id: Option<String>,
    token_id: Option<String>,
    title: Option<String>,
    description: Option<String>,
    file_url: Option<String>,
    file_type: Option<String>,
    content_hash: Option<String>,
    analysis: Option<ContentAnalysis>,
    licensing_terms: Option<LicensingTerms>,
    created_at: Option<i64>,
}

async fn create_asset_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateAssetRequest>,
) -> Result<Json<CreateAssetResponse>, ApiError> {
    let creator_id = require(body.creator_id, "creatorId")?;

    // Tokenization can land before the profile save; register a placeholder
    // creator so the asset is never orphaned on arrival.
    if state.store.get_creator(&creator_id).is_none() {
        warn!("⚠️  Creator {} not found, registering placeholder", creator_id);
        state.store.create_creator(Creator {
            id: creator_id.clone(),
            wallet_address: creator_id.clone(),
            name: "Unknown Creator".to_string(),
            bio: String::new(),
            location: String::new(),
            language: "en".to_string(),
            created_at: now_millis(),
        });
    }

    let asset = state.store.create_ip_asset(IPAsset {
        id: require(body.id, "id")?,
        creator_id,
        token_id: require(body.token_id, "tokenId")?,
        title: require(body.title, "title")?,
        description: body.description.unwrap_or_default(),
        file_url: require(body.file_url, "fileUrl")?,
        file_type: require(body.file_type, "fileType")?,
        content_hash: require(body.content_hash, "contentHash")?,
        analysis: require(body.analysis, "analysis")?,
        licensing_terms: require(body.licensing_terms, "licensingTerms")?,
        created_at: body.created_at.unwrap_or_else(now_millis),
    });

    info!("✅ IP asset created: {} (\"{}\")", asset.id, asset.title);

    Ok(Json(CreateAssetResponse {
        success: true,
        asset,
    }))
}

// Licensing endpoints

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct LicensingFlowRequest {
    ip_asset_id: Option<String>,
    licensee_address: Option<String>,
    #[serde(default)]
    requested_terms: TermsRequest,
}

/// Combined flow: fetch asset, negotiate, and persist a request only when
/// the negotiation accepts.
async fn licensing_handler(
    State(state): State<AppState>,
    Json(body): Json<LicensingFlowRequest>,
) -> Result<Json<LicensingFlowResponse>, ApiError> {
    let ip_asset_id = require(body.ip_asset_id, "ipAssetId")?;
    let licensee_address = require(body.licensee_address, "licenseeAddress")?;

    let asset = state
        .store
        .get_ip_asset(&ip_asset_id)
        .ok_or_else(|| error_response(StatusCode::NOT_FOUND, "Asset not found"))?;

    let negotiation = state
        .negotiator
        .negotiate(&asset.licensing_terms, &body.requested_terms, &asset.analysis)
        .await;

    if !negotiation.accepted {
        return Ok(Json(LicensingFlowResponse {
            success: false,
            request: None,
            negotiation,
        }));
    }

    let request = state.store.create_licensing_request(LicensingRequest {
        id: Uuid::new_v4().to_string(),
        ip_asset_id,
        licensee_address,
        requested_terms: negotiation.final_terms.clone(),
        status: RequestStatus::Accepted,
        negotiation_history: vec![negotiation.clone()],
        created_at: now_millis(),
    });

    info!("✅ Licensing request {} accepted for asset {}", request.id, request.ip_asset_id);

    Ok(Json(LicensingFlowResponse {
        success: true,
        request: Some(request),
        negotiation,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateRequestRequest {
    id: Option<String>,
    ip_asset_id: Option<String>,
    licensee_address: Option<String>,
    requested_terms: Option<LicensingTerms>,
    status: Option<RequestStatus>,
    #[serde(default)]
    negotiation_history: Vec<NegotiationResult>,
    created_at: Option<i64>,
}

async fn create_request_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateRequestRequest>,
) -> Result<Json<CreateRequestResponse>, ApiError> {
    let request = state.store.create_licensing_request(LicensingRequest {
        id: require(body.id, "id")?,
        ip_asset_id: require(body.ip_asset_id, "ipAssetId")?,
        licensee_address: require(body.licensee_address, "licenseeAddress")?,
        requested_terms: require(body.requested_terms, "requestedTerms")?,
        status: body.status.unwrap_or(RequestStatus::Pending),
        negotiation_history: body.negotiation_history,
        created_at: body.created_at.unwrap_or_else(now_millis),
    });

    Ok(Json(CreateRequestResponse {
        success: true,
        request,
    }))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateAgreementRequest {
    id: Option<String>,
    request_id: Option<String>,
    ip_asset_id: Option<String>,
    creator_address: Option<String>,
    licensee_address: Option<String>,
    terms: Option<LicensingTerms>,
    contract_text: Option<String>,
    contract_hash: Option<String>,
    status: Option<AgreementStatus>,
    created_at: Option<i64>,
    expires_at: Option<i64>,
}

async fn create_agreement_handler(
    State(state): State<AppState>,
    Json(body): Json<CreateAgreementRequest>,
) -> Result<Json<CreateAgreementResponse>, ApiError> {
    let terms = require(body.terms, "terms")?;

    let split = royalty::split_revenue_default(terms.price, &terms);
    info!(
        "💰 Royalty split on ${}: creator ${:.2}, licensee ${:.2}, platform ${:.2}",
        terms.price, split.creator, split.licensee, split.platform
    );

    let agreement = state.store.create_licensing_agreement(LicensingAgreement {
        id: require(body.id, "id")?,
        request_id: require(body.request_id, "requestId")?,
        ip_asset_id: require(body.ip_asset_id, "ipAssetId")?,
        creator_address: require(body.creator_address, "creatorAddress")?,
        licensee_address: require(body.licensee_address, "licenseeAddress")?,
        terms,
        contract_text: require(body.contract_text, "contractText")?,
        contract_hash: require(body.contract_hash, "contractHash")?,
        status: body.status.unwrap_or(AgreementStatus::Active),
        created_at: body.created_at.unwrap_or_else(now_millis),
        expires_at: require(body.expires_at, "expiresAt")?,
    });

    info!("✅ Licensing agreement created: {}", agreement.id);

    Ok(Json(CreateAgreementResponse {
        success: true,
        agreement,
    }))
}

// Upload endpoint
//
// No real storage behind this yet: the returned fileUrl is a fabricated
// placeholder reference. The content hash is real so assets created from the
// response carry a verifiable digest.
async fn upload_handler(mut multipart: Multipart) -> Result<Json<UploadResponse>, ApiError> {
    let mut file_bytes: Option<Bytes> = None;
    let mut file_name = String::from("upload.bin");
    let mut file_type = String::from("application/octet-stream");

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error!("Failed to read multipart field: {}", e);
        error_response(StatusCode::BAD_REQUEST, "Invalid multipart data")
    })? {
        let name = field.name().unwrap_or("").to_string();

        if name == "file" {
            if let Some(original) = field.file_name() {
                file_name = original.to_string();
            }
            if let Some(mime) = field.content_type() {
                file_type = mime.to_string();
            }

            file_bytes = Some(field.bytes().await.map_err(|e| {
                error!("Failed to read file bytes: {}", e);
                error_response(StatusCode::BAD_REQUEST, "Failed to read file")
            })?);
        }
    }

    let file_bytes = file_bytes
        .ok_or_else(|| error_response(StatusCode::BAD_REQUEST, "No file provided"))?;

    let content_hash = hex::encode(Sha256::digest(&file_bytes));
    let file_url = format!("ipfs://mock-hash-{}", now_millis());

    info!("📤 Upload staged: {} ({} bytes) → {}", file_name, file_bytes.len(), file_url);

    Ok(Json(UploadResponse {
        success: true,
        file_url,
        file_name,
        file_size: file_bytes.len() as u64,
        file_type,
        content_hash,
    }))
}
