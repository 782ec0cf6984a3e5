//! Relation-chain traversal over the in-memory graph.

use std::sync::Arc;

use crate::graph::GraphStore;
use crate::query::TraversalPlan;

/// Walks a plan's relation chain over a shared [`GraphStore`].
#[derive(Debug, Clone)]
pub struct GraphExecutor {
    graph: Arc<GraphStore>,
}

impl GraphExecutor {
    pub fn new(graph: Arc<GraphStore>) -> Self {
        Self { graph }
    }

    /// Execute a plan, returning every entity reached by the final hop.
    ///
    /// Each hop expands every entity in the working set along edges of the
    /// hop's relation. Duplicates are kept: an entity reachable along two paths
    /// appears twice. Edge direction is decided once from the plan's start
    /// type (incoming for Power/Team, outgoing otherwise) and applies to every
    /// hop, including hops through intermediate nodes of other kinds.
    pub fn execute(&self, plan: &TraversalPlan) -> Vec<String> {
        let reverse = plan.start_type.traverses_incoming();
        let mut nodes = vec![plan.start_entity.clone()];

        for (hop, relation) in plan.relation_chain.iter().enumerate() {
            let mut next = Vec::new();
            for node in &nodes {
                let reached = if reverse {
                    self.graph.incoming(node, *relation)
                } else {
                    self.graph.outgoing(node, *relation)
                };
                next.extend(reached.into_iter().map(str::to_string));
            }
            log::debug!(
                "Hop {} ({}{}): {} -> {} entities",
                hop + 1,
                if reverse { "reverse " } else { "" },
                relation,
                nodes.len(),
                next.len()
            );
            nodes = next;
            if nodes.is_empty() {
                break;
            }
        }

        nodes
    }
}
