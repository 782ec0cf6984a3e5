use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kgqa::cache::EmbeddingCache;
use kgqa::config::EmbeddingProvider;
use kgqa::embeddings::{Embedder, HashingEmbedder, OpenAIEmbedder};
use kgqa::graph::Direction;
use kgqa::{load_graphml, Config, GraphStore, KgqaError, QueryEngine};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser, Debug)]
#[command(name = "kgqa")]
#[command(about = "Answer questions about characters, their powers, genes and teams")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interpret a question and walk the graph
    Ask {
        /// Question text, e.g. "What powers does Wolverine have?"
        #[arg(required = true)]
        question: Vec<String>,
        /// Print the outcome as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print node and edge counts by kind
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Print every edge touching an entity
    Neighbors {
        #[arg(required = true)]
        name: Vec<String>,
    },
    /// Load configuration and graph, then report counts
    Verify,
}

/// Build the configured embedder, with an LRU cache for remote calls.
fn build_embedder(config: &Config) -> Result<Arc<dyn Embedder>> {
    let embeddings = &config.embeddings;
    match embeddings.provider {
        EmbeddingProvider::Hashing => Ok(Arc::new(HashingEmbedder::new(embeddings.dimensions)?)),
        EmbeddingProvider::Openai => {
            let api_key = std::env::var(&embeddings.api_key_env).with_context(|| {
                format!(
                    "Environment variable {} not set. Set it in your .env file or as an environment variable.",
                    embeddings.api_key_env
                )
            })?;

            let cache = if embeddings.cache_capacity > 0 {
                Some(Arc::new(EmbeddingCache::new(embeddings.cache_capacity)))
            } else {
                None
            };

            Ok(Arc::new(OpenAIEmbedder::new_with_cache(
                api_key,
                embeddings.model.clone(),
                embeddings.batch_size,
                cache,
            )?))
        }
    }
}

fn load_graph(config: &Config) -> Result<Arc<GraphStore>> {
    let graph = load_graphml(config.graph_path())
        .with_context(|| format!("Failed to load graph {}", config.graph_path().display()))?;
    Ok(Arc::new(graph))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = Config::load()?;

    env_logger::Builder::from_env(
        env_logger::Env::default()
            .filter_or("RUST_LOG", config.kgqa.log_level.as_str())
    ).init();

    match args.command.unwrap_or(Command::Verify) {
        Command::Ask { question, json } => run_ask(&config, &question.join(" "), json).await,
        Command::Stats { json } => run_stats(&config, json),
        Command::Neighbors { name } => run_neighbors(&config, &name.join(" ")),
        Command::Verify => run_verify(&config),
    }
}

async fn run_ask(config: &Config, question: &str, json: bool) -> Result<()> {
    let graph = load_graph(config)?;
    let embedder = build_embedder(config)?;
    let engine = QueryEngine::build(graph, embedder, config.recognizer.structured).await?;

    let start = Instant::now();
    let outcome = match engine.answer(question).await {
        Ok(outcome) => outcome,
        Err(err @ KgqaError::EntityNotFound(_)) => {
            eprintln!("Error: {}", err);
            std::process::exit(1);
        }
        Err(err) => return Err(err.into()),
    };
    let duration = start.elapsed();

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }

    let plan = &outcome.plan;
    let chain: Vec<&str> = plan.relation_chain.iter().map(|r| r.as_str()).collect();

    println!("\nQuery: {}", question);
    println!("Plan:");
    println!("  start entity:   {} ({})", plan.start_entity, plan.start_type);
    println!("  intent:         {}", plan.intent);
    println!("  relation chain: {}", chain.join(" -> "));
    println!("  target type:    {}", plan.target_type);
    println!("Type: {}", outcome.query_type);
    if outcome.results.is_empty() {
        println!("Result: (none)");
    } else {
        println!("Result:");
        for name in &outcome.results {
            println!("  - {}", name);
        }
    }
    log::info!("Answered in {:?}", duration);

    Ok(())
}

fn run_stats(config: &Config, json: bool) -> Result<()> {
    let graph = load_graph(config)?;
    let stats = graph.stats();

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("\n=== Graph Statistics ===\n");
    println!("Total nodes: {}", stats.total_nodes);
    println!("Total edges: {}", stats.total_edges);
    println!("\n{:<20} {:>8}", "Node type", "Count");
    println!("{:-<30}", "");
    for (kind, count) in &stats.node_types {
        println!("{:<20} {:>8}", kind.as_str(), count);
    }
    println!("\n{:<20} {:>8}", "Relation", "Count");
    println!("{:-<30}", "");
    for (relation, count) in &stats.edge_types {
        println!("{:<20} {:>8}", relation.as_str(), count);
    }

    Ok(())
}

fn run_neighbors(config: &Config, name: &str) -> Result<()> {
    let graph = load_graph(config)?;
    let entity = graph
        .resolve(name)
        .ok_or_else(|| anyhow::anyhow!("Entity '{}' not found", name))?;

    println!("\n{} ({})", entity, graph.node_type(entity));
    for neighbor in graph.neighbors(entity) {
        let relation = match neighbor.direction {
            Direction::Outgoing => neighbor.relation.to_string(),
            Direction::Incoming => format!("has {}", neighbor.relation),
        };
        println!("  {:<24} {} ({})", relation, neighbor.name, neighbor.kind);
    }

    Ok(())
}

fn run_verify(config: &Config) -> Result<()> {
    log::info!("Starting kgqa v{}", env!("CARGO_PKG_VERSION"));
    log::info!("Graph path: {}", config.graph_path().display());
    log::info!("Embedding provider: {:?}", config.embeddings.provider);

    let graph = load_graph(config)?;
    if graph.is_empty() {
        log::warn!("Graph is empty; every question will fail entity recognition");
    }

    let stats = graph.stats();
    for (kind, count) in &stats.node_types {
        log::info!("✓ {} {} nodes", count, kind);
    }
    for (relation, count) in &stats.edge_types {
        log::info!("✓ {} {} edges", count, relation);
    }
    log::info!(
        "✓ Graph ready: {} nodes, {} edges",
        stats.total_nodes,
        stats.total_edges
    );

    Ok(())
}
