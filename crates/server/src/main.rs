//! Pronunciation Analysis Server Entry Point

use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use pronunciation_analysis::{AnalysisConfig, AnalysisContext, DecisionEngine, PatternTables};
use pronunciation_config::{load_settings, Settings};
use pronunciation_llm::create_reasoner;
use pronunciation_pipeline::{WhisperConfig, WhisperStt};
use pronunciation_rag::{
    create_embedder, ChunkConfig, RecursiveChunker, RuleCorpus, RuleRetriever, VectorDistance,
};
use pronunciation_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Priority: env vars > config/{env}.yaml > config/default.yaml > defaults
    let env = ["PRONUNCIATION_ENV", "APP_ENV", "NODE_ENV"]
        .iter()
        .find_map(|key| std::env::var(key).ok().filter(|v| !v.is_empty()));
    let config = load_settings(env.as_deref()).context("Failed to load configuration")?;

    init_tracing(&config);

    tracing::info!(
        "Starting Pronunciation Analysis Server v{}",
        env!("CARGO_PKG_VERSION")
    );
    tracing::info!(
        environment = config.environment.as_str(),
        config_path = env.as_deref().unwrap_or("default"),
        "Configuration loaded"
    );

    let metrics_handle = if config.observability.metrics_enabled {
        init_metrics()
    } else {
        None
    };

    // Rule corpus and index; the service cannot answer without them
    let rules_path = config.data.rules_path();
    let corpus = RuleCorpus::load(&rules_path)
        .with_context(|| format!("Failed to load rule corpus from {}", rules_path.display()))?;

    let embedder = create_embedder(&config.embedding).context("Failed to create embedder")?;
    let chunker = RecursiveChunker::new(ChunkConfig::from_settings(&config.rag));
    let distance = VectorDistance::from(config.rag.distance);
    let retriever = RuleRetriever::build(corpus.all(), embedder, &chunker, distance)
        .await
        .context("Failed to build rule index")?;

    let (patterns, pattern_source) = PatternTables::load_or_default(config.data.patterns_path());
    tracing::info!(
        source = %pattern_source,
        patterns = patterns.len(),
        "Pattern tables ready"
    );

    let reasoner = create_reasoner(&config.reasoning).context("Failed to create reasoner")?;
    let stt = WhisperStt::new(WhisperConfig::from_settings(&config.transcription))
        .context("Failed to create transcription client")?;

    let context = AnalysisContext::new(Arc::new(retriever), reasoner, patterns).with_config(
        AnalysisConfig {
            top_k: config.rag.top_k,
        },
    );
    let engine = DecisionEngine::new(context).context("Failed to create decision engine")?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "Invalid listen address {}:{}",
                config.server.host, config.server.port
            )
        })?;

    let state = AppState::new(config, engine, Arc::new(stt), corpus.len(), &pattern_source)
        .with_metrics(metrics_handle);

    tracing::info!(
        rules = state.readiness.rules,
        chunks = state.readiness.chunks,
        reasoning_model = %state.readiness.reasoning_model,
        transcription_model = %state.readiness.transcription_model,
        "Initialized application state"
    );

    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating graceful shutdown...");
        }
        _ = terminate => {
            tracing::info!("Received SIGTERM, initiating graceful shutdown...");
        }
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = &config.observability.log_level;
        format!("pronunciation={},tower_http=info", level).into()
    });

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
