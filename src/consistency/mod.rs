//! Keeps paired relations closed over the connection collection.
//!
//! Every function here is a pure edit of an in-memory connection list under
//! one [`PairingRules`] snapshot. Loading and saving belong to the caller.

use std::collections::{BTreeMap, HashSet};

use crate::model::{Connection, Pairing, PairingRules, RelationKey};

/// Editable relations of one word: relation key to target word ids.
pub type RelationMap = BTreeMap<RelationKey, Vec<String>>;

/// What a relation replacement changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplaceReport {
    /// Forward and reverse connections removed before re-creation.
    pub removed: usize,
    pub created: usize,
    pub reverses_created: usize,
    /// Targets whose reverse was not created because the word is missing.
    pub skipped_reverses: Vec<String>,
}

/// Result of a single pairing-aware link.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LinkOutcome {
    /// `None` when an equivalent connection already existed.
    pub created: Option<Connection>,
    pub reverse: Option<Connection>,
}

fn is_captured(conn: &Connection, word_id: &str, rules: &PairingRules) -> bool {
    conn.source == word_id || (conn.target == word_id && rules.is_symmetric(conn.relation.as_str()))
}

/// The other endpoint of a captured connection.
fn other_end<'a>(conn: &'a Connection, word_id: &str) -> &'a str {
    if conn.source == word_id {
        &conn.target
    } else {
        &conn.source
    }
}

fn exists(connections: &[Connection], source: &str, target: &str, relation: &str) -> bool {
    connections.iter().any(|c| c.is(source, target, relation))
}

fn exists_symmetric(connections: &[Connection], a: &str, b: &str, relation: &str) -> bool {
    exists(connections, a, b, relation) || exists(connections, b, a, relation)
}

/// Outgoing relations of `word_id`, plus incoming connections of symmetric
/// relations. Targets keep stored order without duplicates.
pub fn word_relations(connections: &[Connection], rules: &PairingRules, word_id: &str) -> RelationMap {
    let mut map = RelationMap::new();
    for conn in connections.iter().filter(|c| is_captured(c, word_id, rules)) {
        let targets = map.entry(conn.relation.clone()).or_default();
        let other = other_end(conn, word_id);
        if !targets.iter().any(|t| t == other) {
            targets.push(other.to_string());
        }
    }
    map
}

/// Replace every editable relation of `word_id` with `relations`.
///
/// Old forward links and their paired reverses are removed first; new links
/// are created with their reverses unless an identical connection is already
/// present. A reverse whose target is not in `word_ids` is skipped.
pub fn replace_word_relations(
    connections: &mut Vec<Connection>,
    rules: &PairingRules,
    word_ids: &HashSet<&str>,
    word_id: &str,
    relations: &RelationMap,
) -> ReplaceReport {
    let mut report = ReplaceReport::default();

    let old: Vec<(RelationKey, String)> = connections
        .iter()
        .filter(|c| is_captured(c, word_id, rules))
        .map(|c| (c.relation.clone(), other_end(c, word_id).to_string()))
        .collect();

    let before = connections.len();
    connections.retain(|c| !is_captured(c, word_id, rules));

    let stale_reverses: HashSet<(String, RelationKey)> = old
        .iter()
        .filter_map(|(relation, target)| match rules.pairing(relation.as_str()) {
            Pairing::Reverse(reverse) => Some((target.clone(), reverse)),
            _ => None,
        })
        .collect();
    connections.retain(|c| !(c.target == word_id && stale_reverses.contains(&(c.source.clone(), c.relation.clone()))));
    report.removed = before - connections.len();

    for (relation, targets) in relations {
        let pairing = rules.pairing(relation.as_str());
        let mut seen: HashSet<&str> = HashSet::new();
        for target in targets {
            if !seen.insert(target.as_str()) {
                continue;
            }
            let present = match pairing {
                Pairing::Symmetric => exists_symmetric(connections, word_id, target, relation.as_str()),
                _ => exists(connections, word_id, target, relation.as_str()),
            };
            if !present {
                connections.push(Connection::new(word_id, target, relation.clone()));
                report.created += 1;
            }

            let Pairing::Reverse(reverse) = &pairing else {
                continue;
            };
            if !word_ids.contains(target.as_str()) {
                log::warn!(
                    "Skipping reverse '{}' for missing word {} (from {})",
                    reverse,
                    target,
                    word_id
                );
                report.skipped_reverses.push(target.clone());
                continue;
            }
            if !exists(connections, target, word_id, reverse.as_str()) {
                connections.push(Connection::new(target, word_id, reverse.clone()));
                report.reverses_created += 1;
            }
        }
    }

    report
}

/// Link `source` to `target`, creating the paired reverse where the relation
/// has one. Duplicates are a no-op.
pub fn add_connection(
    connections: &mut Vec<Connection>,
    rules: &PairingRules,
    source: &str,
    target: &str,
    relation: &RelationKey,
) -> LinkOutcome {
    let pairing = rules.pairing(relation.as_str());
    let mut outcome = LinkOutcome::default();

    let present = match pairing {
        Pairing::Symmetric => exists_symmetric(connections, source, target, relation.as_str()),
        _ => exists(connections, source, target, relation.as_str()),
    };
    if !present {
        let conn = Connection::new(source, target, relation.clone());
        connections.push(conn.clone());
        outcome.created = Some(conn);
    }

    if let Pairing::Reverse(reverse) = pairing {
        if !exists(connections, target, source, reverse.as_str()) {
            let conn = Connection::new(target, source, reverse);
            connections.push(conn.clone());
            outcome.reverse = Some(conn);
        }
    }
    outcome
}

/// Remove connection `id` and its paired counterpart. Returns the removed
/// connections; empty when `id` is unknown.
pub fn remove_connection(connections: &mut Vec<Connection>, rules: &PairingRules, id: &str) -> Vec<Connection> {
    let Some(pos) = connections.iter().position(|c| c.id == id) else {
        return Vec::new();
    };
    let conn = connections.remove(pos);

    let counterpart = match rules.pairing(conn.relation.as_str()) {
        Pairing::Reverse(reverse) => Some(reverse),
        // A symmetric link stored in both directions is still one link.
        Pairing::Symmetric => Some(conn.relation.clone()),
        Pairing::Unpaired => None,
    };

    let mut removed = vec![conn];
    if let Some(reverse) = counterpart {
        let (source, target) = (removed[0].target.clone(), removed[0].source.clone());
        let mut i = 0;
        while i < connections.len() {
            if connections[i].is(&source, &target, reverse.as_str()) {
                removed.push(connections.remove(i));
            } else {
                i += 1;
            }
        }
    }
    removed
}
