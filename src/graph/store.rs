//! In-memory typed directed multigraph.

use std::collections::{BTreeMap, HashMap};

use serde::Serialize;

use super::{normalize_name, Entity, EntityKind, Relation, RelationKind};

#[derive(Debug, Clone)]
struct Edge {
    source: usize,
    kind: RelationKind,
    target: usize,
}

/// Typed directed multigraph keyed by entity name.
///
/// Built once (bulk load or programmatic assembly) and then shared read-only,
/// usually behind an `Arc`. Node and edge iteration follow insertion order.
#[derive(Debug, Clone, Default)]
pub struct GraphStore {
    nodes: Vec<Entity>,
    index: HashMap<String, usize>,
    edges: Vec<Edge>,
    outgoing: Vec<Vec<usize>>,
    incoming: Vec<Vec<usize>>,
}

/// Which way an edge points relative to the entity being inspected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Outgoing,
    Incoming,
}

/// One edge in an entity's neighborhood.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Neighbor {
    pub name: String,
    pub kind: EntityKind,
    pub relation: RelationKind,
    pub direction: Direction,
}

/// Node and edge counts, overall and per kind.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphStats {
    pub total_nodes: usize,
    pub total_edges: usize,
    pub node_types: BTreeMap<EntityKind, usize>,
    pub edge_types: BTreeMap<RelationKind, usize>,
}

impl GraphStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity, or update the kind of an existing one.
    pub fn add_entity(&mut self, name: &str, kind: EntityKind) {
        self.add_entity_with_metadata(name, kind, BTreeMap::new());
    }

    /// Add an entity with free-form attributes. Attributes merge into any
    /// already present on the entity.
    pub fn add_entity_with_metadata(
        &mut self,
        name: &str,
        kind: EntityKind,
        metadata: BTreeMap<String, String>,
    ) {
        let idx = self.ensure_node(name);
        let entity = &mut self.nodes[idx];
        entity.kind = kind;
        entity.metadata.extend(metadata);
    }

    /// Add a directed edge. Endpoints that do not exist yet are created with
    /// kind `Unknown`.
    pub fn add_relation(&mut self, source: &str, kind: RelationKind, target: &str) {
        let source = self.ensure_node(source);
        let target = self.ensure_node(target);
        let edge_idx = self.edges.len();
        self.edges.push(Edge { source, kind, target });
        self.outgoing[source].push(edge_idx);
        self.incoming[target].push(edge_idx);
    }

    fn ensure_node(&mut self, name: &str) -> usize {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.nodes.len();
        self.nodes.push(Entity {
            name: name.to_string(),
            kind: EntityKind::Unknown,
            metadata: BTreeMap::new(),
        });
        self.index.insert(name.to_string(), idx);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    pub fn entity(&self, name: &str) -> Option<&Entity> {
        self.index.get(name).map(|&idx| &self.nodes[idx])
    }

    /// Kind of the named entity; `Unknown` when it has none or does not exist.
    pub fn node_type(&self, name: &str) -> EntityKind {
        self.entity(name)
            .map(|e| e.kind)
            .unwrap_or(EntityKind::Unknown)
    }

    /// All entities in insertion order.
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.nodes.iter()
    }

    /// All edges in insertion order.
    pub fn relations(&self) -> impl Iterator<Item = Relation> + '_ {
        self.edges.iter().map(move |e| Relation {
            source: self.nodes[e.source].name.clone(),
            kind: e.kind,
            target: self.nodes[e.target].name.clone(),
        })
    }

    /// Targets of `name`'s outgoing edges labeled `kind`, one per edge.
    pub fn outgoing(&self, name: &str, kind: RelationKind) -> Vec<&str> {
        match self.index.get(name) {
            Some(&idx) => self.outgoing[idx]
                .iter()
                .map(|&e| &self.edges[e])
                .filter(|e| e.kind == kind)
                .map(|e| self.nodes[e.target].name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    /// Sources of `name`'s incoming edges labeled `kind`, one per edge.
    pub fn incoming(&self, name: &str, kind: RelationKind) -> Vec<&str> {
        match self.index.get(name) {
            Some(&idx) => self.incoming[idx]
                .iter()
                .map(|&e| &self.edges[e])
                .filter(|e| e.kind == kind)
                .map(|e| self.nodes[e.source].name.as_str())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn stats(&self) -> GraphStats {
        let mut stats = GraphStats {
            total_nodes: self.nodes.len(),
            total_edges: self.edges.len(),
            ..Default::default()
        };
        for node in &self.nodes {
            *stats.node_types.entry(node.kind).or_insert(0) += 1;
        }
        for edge in &self.edges {
            *stats.edge_types.entry(edge.kind).or_insert(0) += 1;
        }
        stats
    }

    /// Immediate neighborhood of an entity: outgoing edges first, then incoming.
    pub fn neighbors(&self, name: &str) -> Vec<Neighbor> {
        let Some(&idx) = self.index.get(name) else {
            return Vec::new();
        };
        let out = self.outgoing[idx].iter().map(|&e| {
            let edge = &self.edges[e];
            (edge.target, edge.kind, Direction::Outgoing)
        });
        let inc = self.incoming[idx].iter().map(|&e| {
            let edge = &self.edges[e];
            (edge.source, edge.kind, Direction::Incoming)
        });
        out.chain(inc)
            .map(|(other, relation, direction)| {
                let entity = &self.nodes[other];
                Neighbor {
                    name: entity.name.clone(),
                    kind: entity.kind,
                    relation,
                    direction,
                }
            })
            .collect()
    }

    /// Find an entity by name ignoring case and dash style.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        if self.contains(name) {
            return self.entity(name).map(|e| e.name.as_str());
        }
        let wanted = normalize_name(name.trim());
        self.nodes
            .iter()
            .find(|e| normalize_name(&e.name) == wanted)
            .map(|e| e.name.as_str())
    }
}
