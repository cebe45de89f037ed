//! Node selection (multi-source BFS or wildcard ranking) and output assembly.

use std::collections::{HashMap, HashSet, VecDeque};

use super::adjacency::Adjacency;
use super::{is_wildcard, BuildOptions, GraphData, RenderEdge, RenderNode};
use crate::model::{Connection, PairingRules, Word};

/// Build the render graph for `query`.
///
/// An empty or `*` query selects up to `max_nodes` words: connected words
/// before isolated ones, then by descending degree, label, and id. Any other
/// query roots a breadth-first search at every word whose label matches it
/// case-insensitively. A query that matches nothing yields an empty graph.
pub fn build_graph(
    words: &[Word],
    connections: &[Connection],
    rules: &PairingRules,
    query: &str,
    options: &BuildOptions,
) -> GraphData {
    let adj = Adjacency::build(words, connections, rules, options.active_relations.as_ref());

    let selected = if is_wildcard(query) {
        select_wildcard(words, &adj, options.max_nodes)
    } else {
        select_keyword(words, &adj, query, options)
    };

    assemble(&adj, selected)
}

fn select_wildcard(words: &[Word], adj: &Adjacency<'_>, max_nodes: usize) -> Vec<RenderNode> {
    let mut ranked: Vec<(&Word, usize)> = words.iter().map(|w| (w, adj.degree(&w.id))).collect();
    ranked.sort_by(|(a, da), (b, db)| {
        (*db > 0)
            .cmp(&(*da > 0))
            .then_with(|| db.cmp(da))
            .then_with(|| a.label.cmp(&b.label))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut seen = HashSet::new();
    ranked
        .into_iter()
        .filter(|(w, _)| seen.insert(w.id.as_str()))
        .take(max_nodes)
        .map(|(w, _)| RenderNode::from_word(w, 0, false))
        .collect()
}

fn select_keyword(words: &[Word], adj: &Adjacency<'_>, query: &str, options: &BuildOptions) -> Vec<RenderNode> {
    let mut roots: Vec<&Word> = words.iter().filter(|w| w.label_matches(query)).collect();
    roots.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));

    let mut levels: HashMap<&str, usize> = HashMap::new();
    let mut selected = Vec::new();
    let mut queue = VecDeque::new();

    for root in roots {
        if selected.len() >= options.max_nodes {
            break;
        }
        if levels.insert(root.id.as_str(), 0).is_none() {
            selected.push(RenderNode::from_word(root, 0, true));
            queue.push_back(root.id.as_str());
        }
    }

    'bfs: while let Some(id) = queue.pop_front() {
        let level = levels.get(id).copied().unwrap_or_default();
        if level >= options.max_depth {
            continue;
        }
        for neighbor in adj.neighbors(id) {
            if levels.contains_key(neighbor.id.as_str()) {
                continue;
            }
            if selected.len() >= options.max_nodes {
                break 'bfs;
            }
            levels.insert(neighbor.id.as_str(), level + 1);
            selected.push(RenderNode::from_word(neighbor, level + 1, false));
            queue.push_back(neighbor.id.as_str());
        }
    }

    selected
}

/// Add edges among the selected nodes, then flag truncated nodes and attach
/// one placeholder node and edge to each.
fn assemble(adj: &Adjacency<'_>, mut nodes: Vec<RenderNode>) -> GraphData {
    let included: HashSet<String> = nodes.iter().map(|n| n.id.clone()).collect();

    let mut edges: Vec<RenderEdge> = adj
        .edges()
        .iter()
        .filter(|e| included.contains(e.source) && included.contains(e.target))
        .map(|e| RenderEdge {
            id: e.id.to_string(),
            source: e.source.to_string(),
            target: e.target.to_string(),
            relation: Some(e.relation.clone()),
            is_placeholder: false,
        })
        .collect();

    let mut placeholders = Vec::new();
    for node in nodes.iter_mut() {
        node.has_more = adj.incident(&node.id).any(|e| !included.contains(e.other(&node.id)));
        if node.has_more {
            let placeholder = RenderNode::placeholder(node);
            edges.push(RenderEdge {
                id: format!("{}-edge", placeholder.id),
                source: node.id.clone(),
                target: placeholder.id.clone(),
                relation: None,
                is_placeholder: true,
            });
            placeholders.push(placeholder);
        }
    }
    nodes.extend(placeholders);

    GraphData { nodes, edges }
}
