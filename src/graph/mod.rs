//! Render graph construction: keyword BFS and wildcard overview.
//!
//! A build reads words and connections once, indexes them in memory for the
//! duration of the call, and returns node and edge records ready for display.

mod adjacency;
mod traversal;

pub use traversal::build_graph;

use std::collections::BTreeSet;

use serde::Serialize;

use crate::model::{PosDefinitionPair, RelationKey, Word};

/// Id prefix of "more" placeholder nodes.
pub const PLACEHOLDER_PREFIX: &str = "more:";

/// A displayed word, or a placeholder standing for unexplored neighbors.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderNode {
    pub id: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    pub pos_definitions: Vec<PosDefinitionPair>,
    pub examples: Vec<String>,
    /// BFS distance from the nearest root (0 in wildcard mode).
    pub level: usize,
    pub is_center: bool,
    /// Some connection leads to a word outside the result.
    pub has_more: bool,
    pub is_placeholder: bool,
    /// Owning node of a placeholder.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
}

impl RenderNode {
    fn from_word(word: &Word, level: usize, is_center: bool) -> Self {
        Self {
            id: word.id.clone(),
            label: word.label.clone(),
            phonetic: word.phonetic.clone(),
            pos_definitions: word.pos_definitions.clone(),
            examples: word.examples.clone(),
            level,
            is_center,
            has_more: false,
            is_placeholder: false,
            parent: None,
        }
    }

    fn placeholder(parent: &RenderNode) -> Self {
        Self {
            id: format!("{}{}", PLACEHOLDER_PREFIX, parent.id),
            label: "+".to_string(),
            phonetic: None,
            pos_definitions: Vec::new(),
            examples: Vec::new(),
            level: parent.level + 1,
            is_center: false,
            has_more: false,
            is_placeholder: true,
            parent: Some(parent.id.clone()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderEdge {
    pub id: String,
    pub source: String,
    pub target: String,
    /// `None` only on placeholder edges.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relation: Option<RelationKey>,
    pub is_placeholder: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphData {
    pub nodes: Vec<RenderNode>,
    pub edges: Vec<RenderEdge>,
}

impl GraphData {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&RenderNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Nodes that stand for words (placeholders excluded).
    pub fn word_nodes(&self) -> impl Iterator<Item = &RenderNode> {
        self.nodes.iter().filter(|n| !n.is_placeholder)
    }

    pub fn relation_edges(&self) -> impl Iterator<Item = &RenderEdge> {
        self.edges.iter().filter(|e| !e.is_placeholder)
    }
}

/// Bounds and filters of one build.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub max_depth: usize,
    pub max_nodes: usize,
    /// Relations taken into account. `None` means every relation.
    pub active_relations: Option<BTreeSet<RelationKey>>,
}

impl BuildOptions {
    pub fn new(max_depth: usize, max_nodes: usize) -> Self {
        Self {
            max_depth,
            max_nodes,
            active_relations: None,
        }
    }

    pub fn with_active_relations(mut self, active: BTreeSet<RelationKey>) -> Self {
        self.active_relations = Some(active);
        self
    }
}

/// True for the queries that request the wildcard overview.
pub fn is_wildcard(query: &str) -> bool {
    let query = query.trim();
    query.is_empty() || query == "*"
}
