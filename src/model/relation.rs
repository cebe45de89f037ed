//! Connections, relation types, and pairing rules.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::RelationKey;

/// A directed, typed edge between two words (source --relation--> target).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub source: String,
    pub target: String,
    /// Registry key; may be stale if the type was deleted.
    pub relation: RelationKey,
    pub created_at: DateTime<Utc>,
}

impl Connection {
    pub fn new(source: &str, target: &str, relation: RelationKey) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            source: source.to_string(),
            target: target.to_string(),
            relation,
            created_at: Utc::now(),
        }
    }

    /// True when this connection is exactly `(source, target, relation)`.
    pub fn is(&self, source: &str, target: &str, relation: &str) -> bool {
        self.source == source && self.target == target && self.relation == relation
    }

    /// True when `word_id` is either endpoint.
    pub fn touches(&self, word_id: &str) -> bool {
        self.source == word_id || self.target == word_id
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrowStyle {
    #[default]
    Filled,
    Hollow,
    Line,
    None,
}

fn default_edge_length() -> u32 {
    100
}

fn default_true() -> bool {
    true
}

/// Registry entry describing one kind of relation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationType {
    pub key: RelationKey,
    pub label: String,
    pub color: String,
    #[serde(default)]
    pub line_style: LineStyle,
    #[serde(default)]
    pub arrow_style: ArrowStyle,
    /// Preferred edge length for force-directed layouts.
    #[serde(default = "default_edge_length")]
    pub edge_length: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Another key (asymmetric pair), its own key (symmetric) or none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pair_with: Option<RelationKey>,
    #[serde(default = "default_true")]
    pub default_active: bool,
}

impl RelationType {
    pub fn new(key: RelationKey, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            color: color.into(),
            line_style: LineStyle::default(),
            arrow_style: ArrowStyle::default(),
            edge_length: default_edge_length(),
            description: None,
            pair_with: None,
            default_active: true,
        }
    }

    pub fn paired_with(mut self, pair_with: RelationKey) -> Self {
        self.pair_with = Some(pair_with);
        self
    }

    pub fn symmetric(mut self) -> Self {
        self.pair_with = Some(self.key.clone());
        self
    }

    pub fn is_symmetric(&self) -> bool {
        self.pair_with.as_ref() == Some(&self.key)
    }

    pub fn pairing(&self) -> Pairing {
        match &self.pair_with {
            None => Pairing::Unpaired,
            Some(pair) if pair == &self.key => Pairing::Symmetric,
            Some(pair) => Pairing::Reverse(pair.clone()),
        }
    }
}

/// Partial update of a relation type. The key is changed only through a rename.
#[derive(Debug, Clone, Default)]
pub struct RelationTypeUpdate {
    pub label: Option<String>,
    pub color: Option<String>,
    pub line_style: Option<LineStyle>,
    pub arrow_style: Option<ArrowStyle>,
    pub edge_length: Option<u32>,
    pub description: Option<Option<String>>,
    pub pair_with: Option<Option<RelationKey>>,
    pub default_active: Option<bool>,
}

impl RelationTypeUpdate {
    pub fn apply(self, rt: &mut RelationType) {
        if let Some(label) = self.label {
            rt.label = label;
        }
        if let Some(color) = self.color {
            rt.color = color;
        }
        if let Some(line_style) = self.line_style {
            rt.line_style = line_style;
        }
        if let Some(arrow_style) = self.arrow_style {
            rt.arrow_style = arrow_style;
        }
        if let Some(edge_length) = self.edge_length {
            rt.edge_length = edge_length;
        }
        if let Some(description) = self.description {
            rt.description = description;
        }
        if let Some(pair_with) = self.pair_with {
            rt.pair_with = pair_with;
        }
        if let Some(default_active) = self.default_active {
            rt.default_active = default_active;
        }
    }
}

/// How a relation's reverse is kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pairing {
    /// No automatic reverse.
    Unpaired,
    /// The relation is its own reverse; one stored connection per pair.
    Symmetric,
    /// A separate reverse connection of this relation is kept in lockstep.
    Reverse(RelationKey),
}

/// Snapshot of the registry's pairing map, read once per operation.
#[derive(Debug, Clone, Default)]
pub struct PairingRules {
    rules: HashMap<RelationKey, Pairing>,
}

impl PairingRules {
    pub fn from_types(types: &[RelationType]) -> Self {
        Self {
            rules: types.iter().map(|rt| (rt.key.clone(), rt.pairing())).collect(),
        }
    }

    /// Pairing of `relation`. Keys absent from the registry are unpaired.
    pub fn pairing(&self, relation: &str) -> Pairing {
        self.rules.get(relation).cloned().unwrap_or(Pairing::Unpaired)
    }

    pub fn is_symmetric(&self, relation: &str) -> bool {
        matches!(self.rules.get(relation), Some(Pairing::Symmetric))
    }

    pub fn is_known(&self, relation: &str) -> bool {
        self.rules.contains_key(relation)
    }

    pub fn symmetric_keys(&self) -> BTreeSet<RelationKey> {
        self.rules
            .iter()
            .filter(|(_, pairing)| **pairing == Pairing::Symmetric)
            .map(|(key, _)| key.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(s: &str) -> RelationKey {
        RelationKey::parse(s).unwrap()
    }

    #[test]
    fn test_pairing_variants() {
        let hyper = RelationType::new(key("hypernym"), "Hypernym", "#e74c3c").paired_with(key("hyponym"));
        let syn = RelationType::new(key("synonym"), "Synonym", "#2ecc71").symmetric();
        let compound = RelationType::new(key("compound"), "Compound", "#e67e22");

        assert_eq!(hyper.pairing(), Pairing::Reverse(key("hyponym")));
        assert_eq!(syn.pairing(), Pairing::Symmetric);
        assert!(syn.is_symmetric());
        assert_eq!(compound.pairing(), Pairing::Unpaired);
    }

    #[test]
    fn test_rules_treat_stale_keys_as_unpaired() {
        let rules = PairingRules::from_types(&[RelationType::new(key("synonym"), "Synonym", "#000").symmetric()]);
        assert_eq!(rules.pairing("gone"), Pairing::Unpaired);
        assert!(!rules.is_known("gone"));
        assert!(rules.is_symmetric("synonym"));
        assert_eq!(rules.symmetric_keys().len(), 1);
    }

    #[test]
    fn test_relation_type_defaults_on_deserialize() {
        let json = r##"{"key":"compound","label":"Compound","color":"#e67e22"}"##;
        let rt: RelationType = serde_json::from_str(json).unwrap();
        assert_eq!(rt.edge_length, 100);
        assert!(rt.default_active);
        assert_eq!(rt.arrow_style, ArrowStyle::Filled);
        assert_eq!(rt.pair_with, None);
    }

    #[test]
    fn test_update_can_clear_pairing() {
        let mut rt = RelationType::new(key("synonym"), "Synonym", "#000").symmetric();
        RelationTypeUpdate {
            pair_with: Some(None),
            label: Some("Near synonym".to_string()),
            ..Default::default()
        }
        .apply(&mut rt);
        assert_eq!(rt.pair_with, None);
        assert_eq!(rt.label, "Near synonym");
    }

    #[test]
    fn test_connection_predicates() {
        let conn = Connection::new("dog", "canine", key("hypernym"));
        assert!(conn.is("dog", "canine", "hypernym"));
        assert!(!conn.is("canine", "dog", "hypernym"));
        assert!(conn.touches("canine"));
        assert!(!conn.touches("cat"));
    }
}
