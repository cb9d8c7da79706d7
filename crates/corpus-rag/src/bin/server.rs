//! RAG Server binary
//!
//! Run with: cargo run -p corpus-rag --bin corpus-rag-server -- --config rag.toml

use clap::Parser;
use corpus_rag::{
    config::RagConfig,
    orchestrator::QueryOrchestrator,
    providers::{EmbeddingProvider, LlmProvider, OllamaClient, OllamaEmbedder, OllamaLlm},
    retrieval::initialize_index,
    server::RagServer,
};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "corpus-rag-server", version, about = "Question answering over a document folder")]
struct Args {
    /// TOML configuration file (defaults are used when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Delete the persisted index and rebuild it from the corpus
    #[arg(long)]
    rebuild: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "corpus_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = RagConfig::load(args.config.as_deref())?;

    tracing::info!("Configuration loaded");
    tracing::info!("  - Corpus: {}", config.corpus.source_dir.display());
    tracing::info!("  - Index: {}", config.index.path.display());
    tracing::info!("  - Embedding model: {}", config.embeddings.model);
    tracing::info!("  - Generation model: {}", config.generation.model);
    tracing::info!(
        "  - Chunking: {} chars, {} overlap",
        config.chunking.chunk_size,
        config.chunking.chunk_overlap
    );

    let client = Arc::new(OllamaClient::new(&config.ollama)?);
    tracing::info!("Checking Ollama at {}...", client.base_url());
    if client.health_check().await? {
        tracing::info!("Ollama is running");
    } else {
        tracing::warn!("Ollama not available at {}", client.base_url());
        tracing::warn!("  Start it with: ollama serve");
        tracing::warn!(
            "  Pull models: ollama pull {} && ollama pull {}",
            config.embeddings.model,
            config.generation.model
        );
    }

    if args.rebuild && config.index.path.exists() {
        tracing::info!("Removing persisted index at {}", config.index.path.display());
        std::fs::remove_dir_all(&config.index.path)?;
    }

    let embedder: Arc<dyn EmbeddingProvider> =
        Arc::new(OllamaEmbedder::new(Arc::clone(&client), &config.embeddings.model));
    let llm: Arc<dyn LlmProvider> = Arc::new(OllamaLlm::new(client, &config.generation));

    // No serving without a usable index
    let index = initialize_index(&config, embedder).await?;

    let orchestrator = QueryOrchestrator::new(index, llm, &config);
    let server = RagServer::new(config, orchestrator);

    println!("\nServer starting...");
    println!("  Chat:   POST http://{}/chat", server.address());
    println!("  Health: GET  http://{}/health", server.address());
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
