//! GraphML loader producing a [`GraphStore`].

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use quick_xml::escape::unescape;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::{EntityKind, GraphStore, RelationKind};
use crate::error::{KgqaError, Result};

/// Edge attributes consulted for the relation label, highest priority first.
const RELATION_ATTRIBUTES: [&str; 4] = ["relation", "label", "type", "name"];

/// Node attributes consulted for the entity kind, highest priority first.
const KIND_ATTRIBUTES: [&str; 3] = ["label", "kind", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyDomain {
    Node,
    Edge,
    Graph,
    All,
}

#[derive(Debug, Clone)]
struct KeyDef {
    name: String,
    domain: KeyDomain,
    default: Option<String>,
}

#[derive(Debug)]
enum Element {
    Node {
        id: String,
        attrs: BTreeMap<String, String>,
    },
    Edge {
        source: String,
        target: String,
        attrs: BTreeMap<String, String>,
    },
}

/// Accumulates GraphML elements as the XML events stream past.
#[derive(Debug)]
struct GraphmlBuilder {
    keys: HashMap<String, KeyDef>,
    current_key: Option<String>,
    in_default: bool,
    directed: bool,
    element: Option<Element>,
    data_key: Option<String>,
    text: String,
    nodes: Vec<(String, BTreeMap<String, String>)>,
    edges: Vec<(String, String, BTreeMap<String, String>)>,
}

impl GraphmlBuilder {
    fn new() -> Self {
        Self {
            keys: HashMap::new(),
            current_key: None,
            in_default: false,
            directed: true,
            element: None,
            data_key: None,
            text: String::new(),
            nodes: Vec::new(),
            edges: Vec::new(),
        }
    }

    fn open(&mut self, tag: &str, attrs: HashMap<String, String>) -> Result<()> {
        match tag {
            "key" => {
                let id = required(&attrs, "key", "id")?;
                let name = attrs.get("attr.name").cloned().unwrap_or_else(|| id.clone());
                let domain = match attrs.get("for").map(String::as_str) {
                    Some("node") => KeyDomain::Node,
                    Some("edge") => KeyDomain::Edge,
                    Some("graph") => KeyDomain::Graph,
                    _ => KeyDomain::All,
                };
                self.keys.insert(
                    id.clone(),
                    KeyDef {
                        name,
                        domain,
                        default: None,
                    },
                );
                self.current_key = Some(id);
            }
            "default" if self.current_key.is_some() => {
                self.in_default = true;
                self.text.clear();
            }
            "graph" => {
                if attrs.get("edgedefault").map(String::as_str) == Some("undirected") {
                    self.directed = false;
                }
            }
            "node" => {
                self.element = Some(Element::Node {
                    id: required(&attrs, "node", "id")?,
                    attrs: BTreeMap::new(),
                });
            }
            "edge" => {
                self.element = Some(Element::Edge {
                    source: required(&attrs, "edge", "source")?,
                    target: required(&attrs, "edge", "target")?,
                    attrs: BTreeMap::new(),
                });
            }
            "data" => {
                self.data_key = attrs.get("key").cloned();
                self.text.clear();
            }
            _ => {}
        }
        Ok(())
    }

    fn close(&mut self, tag: &str) {
        match tag {
            "key" => self.current_key = None,
            "default" if self.in_default => {
                if let Some(key) = self.current_key.as_ref().and_then(|id| self.keys.get_mut(id)) {
                    key.default = Some(self.text.clone());
                }
                self.in_default = false;
            }
            "data" => {
                if let Some(key) = self.data_key.take() {
                    let name = self
                        .keys
                        .get(&key)
                        .map(|k| k.name.clone())
                        .unwrap_or(key);
                    match self.element.as_mut() {
                        Some(Element::Node { attrs, .. }) | Some(Element::Edge { attrs, .. }) => {
                            attrs.insert(name, self.text.clone());
                        }
                        // graph-level data
                        None => {}
                    }
                }
            }
            "node" | "edge" => match self.element.take() {
                Some(Element::Node { id, attrs }) => self.nodes.push((id, attrs)),
                Some(Element::Edge {
                    source,
                    target,
                    attrs,
                }) => self.edges.push((source, target, attrs)),
                None => {}
            },
            _ => {}
        }
    }

    fn push_text(&mut self, text: &str) {
        if self.in_default || self.data_key.is_some() {
            self.text.push_str(text);
        }
    }

    fn defaults(&self, domain: KeyDomain) -> Vec<(String, String)> {
        self.keys
            .values()
            .filter(|k| k.domain == domain || k.domain == KeyDomain::All)
            .filter_map(|k| k.default.clone().map(|d| (k.name.clone(), d)))
            .collect()
    }

    fn build(self) -> GraphStore {
        let node_defaults = self.defaults(KeyDomain::Node);
        let edge_defaults = self.defaults(KeyDomain::Edge);
        let mut store = GraphStore::new();

        for (id, mut attrs) in self.nodes {
            apply_defaults(&mut attrs, &node_defaults);
            let kind = resolve_kind(&attrs);
            store.add_entity_with_metadata(&id, kind, attrs);
        }

        for (source, target, mut attrs) in self.edges {
            apply_defaults(&mut attrs, &edge_defaults);
            for endpoint in [&source, &target] {
                if !store.contains(endpoint) {
                    log::warn!("Edge references undeclared node '{}'", endpoint);
                }
            }
            let relation = resolve_relation(&attrs);
            store.add_relation(&source, relation, &target);
            if !self.directed && source != target {
                store.add_relation(&target, relation, &source);
            }
        }

        store
    }
}

fn required(attrs: &HashMap<String, String>, tag: &str, name: &str) -> Result<String> {
    attrs
        .get(name)
        .cloned()
        .ok_or_else(|| KgqaError::Parse(format!("<{}> element without '{}' attribute", tag, name)))
}

fn apply_defaults(attrs: &mut BTreeMap<String, String>, defaults: &[(String, String)]) {
    for (name, value) in defaults {
        attrs.entry(name.clone()).or_insert_with(|| value.clone());
    }
}

/// Kind from the first non-empty kind attribute; an unrecognized value there
/// is `Unknown` even if a later attribute would parse.
fn resolve_kind(attrs: &BTreeMap<String, String>) -> EntityKind {
    KIND_ATTRIBUTES
        .iter()
        .filter_map(|name| attrs.get(*name))
        .find(|value| !value.trim().is_empty())
        .map(|value| EntityKind::from_label(value))
        .unwrap_or(EntityKind::Unknown)
}

fn resolve_relation(attrs: &BTreeMap<String, String>) -> RelationKind {
    let label = RELATION_ATTRIBUTES
        .iter()
        .filter_map(|name| attrs.get(*name))
        .map(|value| value.trim())
        .find(|value| !value.is_empty());

    match label {
        Some(label) => RelationKind::from_label(label).unwrap_or_else(|| {
            log::warn!("Unknown relation label '{}', treating as RELATED_TO", label);
            RelationKind::RelatedTo
        }),
        None => RelationKind::RelatedTo,
    }
}

fn attributes(e: &BytesStart) -> Result<HashMap<String, String>> {
    let mut out = HashMap::new();
    for attr in e.attributes() {
        let attr = attr.map_err(|err| KgqaError::Parse(format!("Invalid attribute: {}", err)))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).to_string();
        let raw = String::from_utf8_lossy(attr.value.as_ref());
        let value = unescape(&raw)
            .map_err(|err| KgqaError::Parse(format!("Invalid attribute value '{}': {}", raw, err)))?;
        out.insert(key, value.into_owned());
    }
    Ok(out)
}

fn local_name(e: &BytesStart) -> String {
    String::from_utf8_lossy(e.local_name().as_ref()).to_string()
}

/// Parse a GraphML document held in memory.
pub fn parse_graphml(content: &str) -> Result<GraphStore> {
    let mut reader = Reader::from_str(content);
    let mut buf = Vec::new();
    let mut builder = GraphmlBuilder::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                builder.open(&local_name(&e), attributes(&e)?)?;
            }
            Ok(Event::Empty(e)) => {
                let tag = local_name(&e);
                builder.open(&tag, attributes(&e)?)?;
                builder.close(&tag);
            }
            Ok(Event::End(e)) => {
                let tag = String::from_utf8_lossy(e.local_name().as_ref()).to_string();
                builder.close(&tag);
            }
            Ok(Event::Text(e)) => {
                builder.push_text(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::CData(e)) => {
                builder.push_text(&String::from_utf8_lossy(e.as_ref()));
            }
            Ok(Event::GeneralRef(e)) => {
                let reference = format!("&{};", String::from_utf8_lossy(e.as_ref()));
                let resolved = unescape(&reference).map_err(|err| {
                    KgqaError::Parse(format!("Unknown entity reference {}: {}", reference, err))
                })?;
                builder.push_text(&resolved);
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(KgqaError::Parse(format!(
                    "GraphML parse error at byte {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
        }
        buf.clear();
    }

    Ok(builder.build())
}

/// Load a GraphML file from disk.
pub fn load_graphml(path: &Path) -> Result<GraphStore> {
    let content = std::fs::read_to_string(path)?;
    let store = parse_graphml(&content).map_err(|e| match e {
        KgqaError::Parse(msg) => KgqaError::Parse(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;
    log::info!(
        "Loaded graph from {}: {} nodes, {} edges",
        path.display(),
        store.node_count(),
        store.edge_count()
    );
    Ok(store)
}
