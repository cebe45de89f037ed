use std::collections::{BTreeSet, HashMap, HashSet};

use crate::model::{Connection, PairingRules, RelationKey, Word};

/// A connection as the builder sees it: both endpoints exist, its relation is
/// active, and symmetric relations are oriented `source <= target`.
#[derive(Debug, Clone, Copy)]
pub(super) struct Edge<'a> {
    pub id: &'a str,
    pub source: &'a str,
    pub target: &'a str,
    pub relation: &'a RelationKey,
}

impl<'a> Edge<'a> {
    pub fn other(&self, id: &str) -> &'a str {
        if self.source == id {
            self.target
        } else {
            self.source
        }
    }
}

/// Undirected per-build index over words and connections.
pub(super) struct Adjacency<'a> {
    words: HashMap<&'a str, &'a Word>,
    edges: Vec<Edge<'a>>,
    incident: HashMap<&'a str, Vec<usize>>,
}

impl<'a> Adjacency<'a> {
    pub fn build(
        words: &'a [Word],
        connections: &'a [Connection],
        rules: &PairingRules,
        active: Option<&BTreeSet<RelationKey>>,
    ) -> Self {
        let words: HashMap<&str, &Word> = words.iter().map(|w| (w.id.as_str(), w)).collect();
        let mut edges = Vec::new();
        let mut incident: HashMap<&str, Vec<usize>> = HashMap::new();
        let mut seen: HashSet<(&str, &str, &str)> = HashSet::new();
        let mut stale = 0usize;

        for conn in connections {
            if active.map_or(false, |keys| !keys.contains(&conn.relation)) {
                continue;
            }
            let (Some(&source), Some(&target)) = (words.get(conn.source.as_str()), words.get(conn.target.as_str()))
            else {
                stale += 1;
                continue;
            };
            let (source, target) = (source.id.as_str(), target.id.as_str());
            let (source, target) = if rules.is_symmetric(conn.relation.as_str()) && target < source {
                (target, source)
            } else {
                (source, target)
            };
            if !seen.insert((source, target, conn.relation.as_str())) {
                continue;
            }

            let index = edges.len();
            edges.push(Edge {
                id: &conn.id,
                source,
                target,
                relation: &conn.relation,
            });
            incident.entry(source).or_default().push(index);
            if source != target {
                incident.entry(target).or_default().push(index);
            }
        }

        if stale > 0 {
            log::debug!("Skipped {} connection(s) with a missing endpoint", stale);
        }
        Self { words, edges, incident }
    }

    pub fn word(&self, id: &str) -> Option<&'a Word> {
        self.words.get(id).copied()
    }

    pub fn edges(&self) -> &[Edge<'a>] {
        &self.edges
    }

    /// Number of edges touching `id`.
    pub fn degree(&self, id: &str) -> usize {
        self.incident.get(id).map_or(0, Vec::len)
    }

    pub fn incident(&self, id: &str) -> impl Iterator<Item = &Edge<'a>> {
        self.incident
            .get(id)
            .into_iter()
            .flatten()
            .map(move |&index| &self.edges[index])
    }

    /// Distinct neighbors of `id` ordered by label, then id.
    pub fn neighbors(&self, id: &str) -> Vec<&'a Word> {
        let mut out: Vec<&Word> = Vec::new();
        for edge in self.incident(id) {
            let other = edge.other(id);
            if other == id || out.iter().any(|w| w.id == other) {
                continue;
            }
            if let Some(word) = self.word(other) {
                out.push(word);
            }
        }
        out.sort_by(|a, b| a.label.cmp(&b.label).then_with(|| a.id.cmp(&b.id)));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{RelationType, WordDraft};

    fn rel(s: &str) -> RelationKey {
        RelationKey::parse(s).unwrap()
    }

    fn word(id: &str) -> Word {
        Word::from_draft(WordDraft::new(id).with_id(id))
    }

    fn rules() -> PairingRules {
        PairingRules::from_types(&[RelationType::new(rel("synonym"), "Synonym", "#000").symmetric()])
    }

    #[test]
    fn test_symmetric_edges_are_canonical_and_deduplicated() {
        let words = vec![word("dog"), word("pooch")];
        let connections = vec![
            Connection::new("pooch", "dog", rel("synonym")),
            Connection::new("dog", "pooch", rel("synonym")),
        ];
        let adj = Adjacency::build(&words, &connections, &rules(), None);
        assert_eq!(adj.edges().len(), 1);
        assert_eq!(adj.edges()[0].source, "dog");
        assert_eq!(adj.edges()[0].target, "pooch");
        assert_eq!(adj.degree("dog"), 1);
    }

    #[test]
    fn test_stale_and_inactive_connections_are_skipped() {
        let words = vec![word("a"), word("b")];
        let connections = vec![
            Connection::new("a", "ghost", rel("compound")),
            Connection::new("a", "b", rel("antonym")),
            Connection::new("a", "b", rel("synonym")),
        ];
        let active: BTreeSet<RelationKey> = [rel("synonym"), rel("compound")].into_iter().collect();
        let adj = Adjacency::build(&words, &connections, &rules(), Some(&active));
        assert_eq!(adj.edges().len(), 1);
        assert_eq!(adj.edges()[0].relation, "synonym");
    }

    #[test]
    fn test_neighbors_sorted_and_unique() {
        let words = vec![word("hub"), word("b"), word("a")];
        let connections = vec![
            Connection::new("hub", "b", rel("x")),
            Connection::new("a", "hub", rel("y")),
            Connection::new("hub", "a", rel("z")),
            Connection::new("hub", "hub", rel("x")),
        ];
        let adj = Adjacency::build(&words, &connections, &PairingRules::default(), None);
        let ids: Vec<&str> = adj.neighbors("hub").iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
        assert_eq!(adj.degree("hub"), 4);
    }
}
