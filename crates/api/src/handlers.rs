use std::path::PathBuf;
use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use extract::{DocumentInput, Entity, EventDocument, ParsedDocument, PipelineOutput, PrecomputedParse, Trigger};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::cache::CacheStats;
use crate::error::ApiError;
use crate::metrics::{MetricsSnapshot, TimedOperation};
use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub parser: String,
    pub llm: String,
}

#[derive(Deserialize)]
pub struct ExtractRequest {
    pub document_id: Option<String>,
    pub text: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    /// Missing triggers are found with the trigger lexicon.
    pub triggers: Option<Vec<Trigger>>,
    /// Bypasses the parser service when present.
    pub parse: Option<ParsedDocument>,
}

#[derive(Deserialize)]
pub struct ExtractFileRequest {
    pub path: String,
    pub document_id: Option<String>,
}

#[derive(Serialize)]
pub struct ExtractFileResponse {
    pub document_id: String,
    pub output_path: String,
    pub events: usize,
    pub entities: usize,
}

#[derive(Serialize)]
pub struct StatsResponse {
    pub metrics: MetricsSnapshot,
    pub cache: CacheStats,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let parser = match &state.config.parser.base_url {
        Some(url) => check_service(&state.http, url).await,
        None => "disabled".to_string(),
    };
    let llm = match &state.config.ollama.base_url {
        Some(url) => check_service(&state.http, &format!("{}/api/tags", url)).await,
        None => "disabled".to_string(),
    };

    Json(HealthResponse {
        status: "ok".to_string(),
        parser,
        llm,
    })
}

async fn check_service(client: &reqwest::Client, url: &str) -> String {
    match client.get(url).send().await {
        Ok(resp) if resp.status().is_success() => "ok".to_string(),
        Ok(resp) => format!("error: status {}", resp.status()),
        Err(e) => format!("error: {}", e),
    }
}

pub async fn extract_document(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractRequest>,
) -> Result<Json<EventDocument>, ApiError> {
    let result = run_extract(&state, req).await;
    state.metrics.record_request(result.is_ok());
    let output = result?;
    Ok(Json(output.document))
}

async fn run_extract(state: &AppState, req: ExtractRequest) -> Result<PipelineOutput, ApiError> {
    let timer = TimedOperation::start();

    let document_id = req
        .document_id
        .unwrap_or_else(|| ingest::generate_doc_id(&req.text));
    let input = DocumentInput {
        document_id,
        text: req.text,
        entities: req.entities,
        triggers: req.triggers.unwrap_or_default(),
    }
    .with_lexicon_triggers(&state.lexicon);

    let output = match req.parse {
        Some(parse) => {
            parse
                .validate()
                .map_err(|e| ApiError::BadRequest(format!("invalid parse: {:#}", e)))?;
            if parse.text != input.text {
                return Err(ApiError::BadRequest("parse text does not match document text".into()));
            }
            state.pipeline_with(PrecomputedParse(parse)).process(input).await
        }
        None => state.pipeline().process(input).await,
    };

    state
        .metrics
        .record_document(timer.elapsed(), &output.document, &output.report);
    Ok(output)
}

pub async fn extract_file(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExtractFileRequest>,
) -> Result<Json<ExtractFileResponse>, ApiError> {
    let result = run_extract_file(&state, req).await;
    state.metrics.record_request(result.is_ok());
    result.map(Json)
}

async fn run_extract_file(state: &AppState, req: ExtractFileRequest) -> Result<ExtractFileResponse, ApiError> {
    let timer = TimedOperation::start();
    let path = PathBuf::from(&req.path);

    if let Some(id) = &req.document_id {
        if !ingest::is_valid_document_id(id) {
            return Err(ApiError::BadRequest(format!("invalid document_id: {:?}", id)));
        }
    }

    if !path.is_file() {
        return Err(ApiError::NotFound(req.path));
    }
    if !ingest::FileReader::is_supported(&path) {
        return Err(ApiError::BadRequest(format!("unsupported file type: {}", req.path)));
    }

    let source = ingest::load_file(&path, req.document_id).await?;
    let input = DocumentInput {
        document_id: source.document_id,
        text: source.text,
        ..Default::default()
    }
    .with_lexicon_triggers(&state.lexicon);

    let output = state.pipeline().process(input).await;
    state
        .metrics
        .record_document(timer.elapsed(), &output.document, &output.report);

    let document = &output.document;
    let written = ingest::write_document(&state.config.server.output_dir, &document.document_id, document).await?;

    info!(
        document_id = %document.document_id,
        events = document.events.len(),
        output = ?written,
        "Extracted events from file"
    );
    if output.report.parse_failed {
        warn!(document_id = %document.document_id, "No basic events: dependency parse failed");
    }

    Ok(ExtractFileResponse {
        document_id: document.document_id.clone(),
        output_path: written.to_string_lossy().to_string(),
        events: document.events.len(),
        entities: document.entities.len(),
    })
}

pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    Json(StatsResponse {
        metrics: state.metrics.snapshot(),
        cache: state.cache.stats(),
    })
}
