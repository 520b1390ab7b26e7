//! Route handlers. Each one parses its body, calls into the library, and
//! renders the result as JSON.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};

use super::{ApiError, AppState};
use crate::catalog::target_entities;
use crate::compat::{check, Verdict};
use crate::engine::{apply, check_rules, MappingOutcome, MappingRule, RuleReport};
use crate::field::Field;
use crate::fetch::fetch_metadata;

/// Body of the endpoints that operate on a document.
///
/// `metadata` is usually the document's JSON text, but an inline JSON value is
/// accepted too.
#[derive(Debug, Deserialize)]
struct MetadataRequest {
    metadata: Option<Value>,

    #[serde(default, alias = "mappingRules")]
    rules: Option<Vec<MappingRule>>,
}

impl MetadataRequest {
    fn document(&self) -> Result<Value, ApiError> {
        match &self.metadata {
            None | Some(Value::Null) => Err(ApiError::bad_request("No metadata provided")),
            Some(Value::String(text)) if text.trim().is_empty() => {
                Err(ApiError::bad_request("No metadata provided"))
            }
            Some(Value::String(text)) => serde_json::from_str(text)
                .map_err(|e| ApiError::from(crate::Error::MalformedInput(e))),
            Some(inline) => Ok(inline.clone()),
        }
    }

    fn rules(&self) -> Result<&[MappingRule], ApiError> {
        self.rules
            .as_deref()
            .ok_or_else(|| ApiError::bad_request("Missing required fields"))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ValidateRequest {
    source_field: Field,
    target_field: Field,
}

#[derive(Debug, Deserialize)]
struct FetchRequest {
    url: String,
}

fn parse_body<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    serde_json::from_str(body).map_err(|e| ApiError::bad_request(format!("invalid request body: {}", e)))
}

/// Fallback handler for unmatched routes.
pub(crate) async fn handle_not_found() -> impl IntoResponse {
    ApiError::new(StatusCode::NOT_FOUND, "not found")
}

/// GET /health
pub(crate) async fn handle_health() -> impl IntoResponse {
    Json(json!({ "status": "ok", "version": env!("CARGO_PKG_VERSION") }))
}

/// GET /api/target-fields
pub(crate) async fn handle_target_fields() -> impl IntoResponse {
    Json(json!({ "entities": target_entities() }))
}

/// POST /api/metadata/parse
pub(crate) async fn handle_parse(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let request: MetadataRequest = parse_body(&body)?;
    let document = request.document()?;

    let entities = state.analyzer.group_into_entities(&document);
    tracing::info!(entities = entities.len(), "parsed metadata");

    Ok(Json(json!({ "entities": entities })))
}

/// POST /api/metadata/validate
pub(crate) async fn handle_validate(body: String) -> Result<Json<Verdict>, ApiError> {
    let request: ValidateRequest = parse_body(&body)?;
    Ok(Json(check(&request.source_field, &request.target_field)))
}

/// POST /api/metadata/rules/check
pub(crate) async fn handle_check_rules(body: String) -> Result<Json<RuleReport>, ApiError> {
    let request: MetadataRequest = parse_body(&body)?;
    let document = request.document()?;
    Ok(Json(check_rules(&document, request.rules()?)))
}

/// POST /api/metadata/apply
pub(crate) async fn handle_apply(body: String) -> Result<Json<MappingOutcome>, ApiError> {
    let request: MetadataRequest = parse_body(&body)?;
    let document = request.document()?;
    let rules = request.rules()?;

    let outcome = apply(&document, rules);
    tracing::info!(
        rules = rules.len(),
        warnings = outcome.warnings.len(),
        "applied mapping"
    );

    Ok(Json(outcome))
}

/// POST /api/metadata/fetch
pub(crate) async fn handle_fetch(
    State(state): State<AppState>,
    body: String,
) -> Result<Json<Value>, ApiError> {
    let request: FetchRequest = parse_body(&body)?;

    let url = request.url;
    let metadata = tokio::task::spawn_blocking(move || fetch_metadata(&url))
        .await
        .map_err(|e| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?
        .map_err(|e| ApiError::from(crate::Error::Fetch(e)))?;

    let document: Value = serde_json::from_str(&metadata)
        .map_err(|e| ApiError::from(crate::Error::MalformedInput(e)))?;
    let entities = state.analyzer.group_into_entities(&document);

    Ok(Json(json!({ "metadata": metadata, "entities": entities })))
}
