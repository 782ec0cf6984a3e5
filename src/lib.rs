pub mod cache;
pub mod config;
pub mod embeddings;
pub mod error;
pub mod graph;
pub mod query;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::{KgqaError, Result};
pub use graph::{load_graphml, EntityKind, GraphExecutor, GraphStore, RelationKind};
pub use query::{QueryEngine, QueryInterpreter, QueryOutcome, TraversalPlan};
