//! Key renames as pure transformations over loaded collections.
//!
//! Persisting the result is a separate step owned by the caller.

use std::collections::HashSet;

use crate::error::{LexgraphError, Result};
use crate::model::{Connection, PosKey, PosType, PosTypeUpdate, RelationKey, RelationType, RelationTypeUpdate, Word};

#[derive(Debug, Clone)]
pub struct RelationRename {
    pub connections: Vec<Connection>,
    pub relation_types: Vec<RelationType>,
    pub connections_rewritten: usize,
    pub pairings_rewritten: usize,
    /// Rewritten connections dropped because `new` already linked the same pair.
    pub duplicates_removed: usize,
    /// False when `old` had no registry record (only references were moved).
    pub record_found: bool,
}

/// Rename relation key `old` to `new`.
///
/// Order: connections first, then every `pair_with == old` pointer (the
/// record's own pointer included, read while its key is still `old`), then
/// the record itself with `updates` applied. Connections that end up
/// repeating an existing `new` link are dropped, keeping the first.
pub fn rename_relation_key(
    old: &RelationKey,
    new: &RelationKey,
    updates: RelationTypeUpdate,
    mut connections: Vec<Connection>,
    mut relation_types: Vec<RelationType>,
) -> Result<RelationRename> {
    if old != new && relation_types.iter().any(|rt| &rt.key == new) {
        return Err(LexgraphError::DuplicateKey(new.to_string()));
    }

    let symmetric = relation_types
        .iter()
        .any(|rt| &rt.key == old && rt.pair_with.as_ref() == Some(old));

    let mut connections_rewritten = 0;
    for conn in connections.iter_mut().filter(|c| &c.relation == old) {
        conn.relation = new.clone();
        connections_rewritten += 1;
    }

    let before = connections.len();
    if connections_rewritten > 0 && old != new {
        let mut seen: HashSet<(String, String)> = HashSet::new();
        connections.retain(|c| {
            if &c.relation != new {
                return true;
            }
            let pair = if symmetric && c.target < c.source {
                (c.target.clone(), c.source.clone())
            } else {
                (c.source.clone(), c.target.clone())
            };
            seen.insert(pair)
        });
    }
    let duplicates_removed = before - connections.len();

    let mut pairings_rewritten = 0;
    for rt in relation_types.iter_mut() {
        if rt.pair_with.as_ref() == Some(old) {
            rt.pair_with = Some(new.clone());
            pairings_rewritten += 1;
        }
    }

    let record_found = match relation_types.iter_mut().find(|rt| &rt.key == old) {
        Some(rt) => {
            updates.apply(rt);
            rt.key = new.clone();
            true
        }
        None => false,
    };

    Ok(RelationRename {
        connections,
        relation_types,
        connections_rewritten,
        pairings_rewritten,
        duplicates_removed,
        record_found,
    })
}

#[derive(Debug, Clone)]
pub struct PosRename {
    pub words: Vec<Word>,
    pub pos_types: Vec<PosType>,
    pub words_rewritten: usize,
    pub record_found: bool,
}

/// Rename part-of-speech key `old` to `new` in every word's pairs, then in
/// the registry record.
pub fn rename_pos_key(
    old: &PosKey,
    new: &PosKey,
    updates: PosTypeUpdate,
    mut words: Vec<Word>,
    mut pos_types: Vec<PosType>,
) -> Result<PosRename> {
    if old != new && pos_types.iter().any(|pt| &pt.key == new) {
        return Err(LexgraphError::DuplicateKey(new.to_string()));
    }

    let mut words_rewritten = 0;
    for word in words.iter_mut() {
        let mut touched = false;
        for pair in word.pos_definitions.iter_mut() {
            if pair.pos.as_ref() == Some(old) {
                pair.pos = Some(new.clone());
                touched = true;
            }
        }
        if touched {
            words_rewritten += 1;
        }
    }

    let record_found = match pos_types.iter_mut().find(|pt| &pt.key == old) {
        Some(pt) => {
            updates.apply(pt);
            pt.key = new.clone();
            true
        }
        None => false,
    };

    Ok(PosRename {
        words,
        pos_types,
        words_rewritten,
        record_found,
    })
}
