mod cache;
mod config;
mod metrics;
mod retry;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

use kg::{
    AliasCorefResolver, CompletionClient, HeuristicEntityExtractor, LlmRelationExtractor,
    OllamaClient, Triple,
};
use nli::LlmNliModel;
use pipeline::{Pipeline, PipelineConfig, PipelineResult};
use store::{GraphStats, GraphSummary, Neo4jStore};

use cache::ResultCache;
use config::AppConfig;
use metrics::Metrics;
use retry::RetryPolicy;

struct AppState {
    config: AppConfig,
    pipeline: Pipeline,
    store: Neo4jStore,
    cache: ResultCache,
    metrics: Arc<Metrics>,
    retry: RetryPolicy,
}

#[derive(Serialize)]
struct HealthResponse {
    ollama: String,
    neo4j: String,
}

#[derive(Deserialize)]
struct EvaluateRequest {
    /// The LLM answer to evaluate
    output: String,
    /// Trusted reference context
    context: String,
}

#[derive(Deserialize)]
struct ConstructRequest {
    text: String,
    #[serde(default)]
    persist: bool,
}

#[derive(Serialize)]
struct ConstructResponse {
    triples: Vec<Triple>,
    persisted: Option<GraphSummary>,
}

#[derive(Serialize)]
struct StatsResponse {
    graph: Option<GraphStats>,
    metrics: metrics::MetricsSnapshot,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let config = AppConfig::from_env();

    // Connect to Neo4j
    let graph = neo4rs::Graph::new(
        &config.neo4j.uri,
        &config.neo4j.user,
        &config.neo4j.password,
    )
    .await
    .expect("Failed to connect to Neo4j");

    let store = Neo4jStore::new(graph);
    store.init_schema().await.expect("Failed to initialize Neo4j schema");

    // One completion client shared by relation extraction, NLI and correction
    let ollama: Arc<dyn CompletionClient> = Arc::new(OllamaClient::new(
        config.ollama.base_url.clone(),
        config.ollama.model.clone(),
        config.ollama.request_timeout_secs,
    ));

    let pipeline = Pipeline::new(
        Arc::new(HeuristicEntityExtractor::new()),
        Arc::new(AliasCorefResolver::new()),
        Arc::new(LlmRelationExtractor::new(ollama.clone())),
        Arc::new(LlmNliModel::new(ollama.clone())),
        ollama,
        PipelineConfig {
            neutral_threshold: config.detector.neutral_threshold,
        },
    );

    let state = Arc::new(AppState {
        cache: ResultCache::new(config.cache.max_entries),
        retry: RetryPolicy::new(&config.retry),
        metrics: Metrics::new(),
        pipeline,
        store,
        config,
    });

    // Build router
    let app = Router::new()
        .route("/health", get(health_check))
        .route("/evaluate", post(evaluate))
        .route("/construct", post(construct))
        .route("/stats", get(get_stats))
        .with_state(state.clone());

    // Start server
    let listener = tokio::net::TcpListener::bind(&state.config.bind_addr)
        .await
        .expect("Failed to bind listener");

    tracing::info!("Server listening on http://{}", state.config.bind_addr);

    axum::serve(listener, app).await.unwrap();
}

async fn health_check(
    State(state): State<Arc<AppState>>,
) -> Result<Json<HealthResponse>, StatusCode> {
    let ollama_status = match reqwest::get(&state.config.ollama.base_url).await {
        Ok(resp) if resp.status().is_success() => "ok".to_string(),
        Ok(resp) => format!("error: status {}", resp.status()),
        Err(e) => format!("error: {}", e),
    };

    let neo4j_status = match state.store.stats().await {
        Ok(_) => "ok".to_string(),
        Err(e) => format!("error: {}", e),
    };

    Ok(Json(HealthResponse {
        ollama: ollama_status,
        neo4j: neo4j_status,
    }))
}

async fn evaluate(
    State(state): State<Arc<AppState>>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<PipelineResult>, StatusCode> {
    if state.config.cache.enabled {
        if let Some(cached) = state.cache.get(&req.output, &req.context) {
            state.metrics.record_cache_hit();
            return Ok(Json(cached));
        }
    }

    let start = Instant::now();

    let result = state
        .retry
        .retry("evaluate", || state.pipeline.run(&req.output, &req.context))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "evaluation failed");
            state.metrics.record_failure();
            StatusCode::INTERNAL_SERVER_ERROR
        })?;

    state.metrics.record_run(
        start.elapsed(),
        result.triples.len(),
        result.hallucinated.len(),
        result.corrected_triples().len(),
    );

    if state.config.cache.enabled {
        state.cache.set(&req.output, &req.context, result.clone());
    }

    Ok(Json(result))
}

async fn construct(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ConstructRequest>,
) -> Result<Json<ConstructResponse>, StatusCode> {
    let triples = state.pipeline.construct(&req.text).await.map_err(|e| {
        tracing::error!(error = %e, "construction failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    let persisted = if req.persist {
        let summary = state.store.store_graph(&triples).await.map_err(|e| {
            tracing::error!(error = %e, "failed to persist graph");
            StatusCode::INTERNAL_SERVER_ERROR
        })?;
        Some(summary)
    } else {
        None
    };

    Ok(Json(ConstructResponse { triples, persisted }))
}

async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let graph = match state.store.stats().await {
        Ok(stats) => Some(stats),
        Err(e) => {
            tracing::warn!(error = %e, "failed to read graph stats");
            None
        }
    };

    Json(StatsResponse {
        graph,
        metrics: state.metrics.snapshot(),
    })
}
