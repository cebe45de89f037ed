//! Word records and their editable parts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::PosKey;

/// One part-of-speech/definition pair. Either side may be missing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosDefinitionPair {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos: Option<PosKey>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub definition: Option<String>,
}

impl PosDefinitionPair {
    pub fn new(pos: Option<PosKey>, definition: Option<&str>) -> Self {
        Self {
            pos,
            definition: definition.map(str::to_string),
        }
    }

    /// True when the pair carries neither a pos nor a definition.
    pub fn is_empty(&self) -> bool {
        self.pos.is_none() && self.definition.as_deref().map_or(true, |d| d.trim().is_empty())
    }
}

/// A lexical entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "StoredWord")]
pub struct Word {
    pub id: String,
    /// Display text. Not unique.
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phonetic: Option<String>,
    #[serde(default)]
    pub pos_definitions: Vec<PosDefinitionPair>,
    #[serde(default)]
    pub examples: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Word {
    /// Create a word from a draft with a fresh UUID and timestamps.
    pub fn from_draft(draft: WordDraft) -> Self {
        let now = Utc::now();
        Self {
            id: draft.id.unwrap_or_else(|| Uuid::new_v4().to_string()),
            label: draft.label,
            phonetic: draft.phonetic,
            pos_definitions: draft.pos_definitions,
            examples: draft.examples,
            created_at: now,
            updated_at: now,
        }
    }

    /// Part-of-speech keys in pair order, skipping pairs without one.
    pub fn pos_list(&self) -> Vec<&PosKey> {
        self.pos_definitions.iter().filter_map(|pd| pd.pos.as_ref()).collect()
    }

    /// Definition of the first pair, if any.
    pub fn primary_definition(&self) -> Option<&str> {
        self.pos_definitions.first().and_then(|pd| pd.definition.as_deref())
    }

    pub fn label_matches(&self, query: &str) -> bool {
        self.label.trim().to_lowercase() == query.trim().to_lowercase()
    }
}

/// Input for creating a word.
#[derive(Debug, Clone, Default)]
pub struct WordDraft {
    /// Caller-chosen id; a UUID v4 is generated when absent.
    pub id: Option<String>,
    pub label: String,
    pub phonetic: Option<String>,
    pub pos_definitions: Vec<PosDefinitionPair>,
    pub examples: Vec<String>,
}

impl WordDraft {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Default::default()
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_phonetic(mut self, phonetic: impl Into<String>) -> Self {
        self.phonetic = Some(phonetic.into());
        self
    }

    pub fn with_pos_definition(mut self, pos: Option<PosKey>, definition: Option<&str>) -> Self {
        self.pos_definitions.push(PosDefinitionPair::new(pos, definition));
        self
    }

    pub fn with_example(mut self, example: impl Into<String>) -> Self {
        self.examples.push(example.into());
        self
    }
}

/// Partial update of a word. `None` leaves a field untouched.
#[derive(Debug, Clone, Default)]
pub struct WordPatch {
    pub label: Option<String>,
    pub phonetic: Option<Option<String>>,
    pub pos_definitions: Option<Vec<PosDefinitionPair>>,
    pub examples: Option<Vec<String>>,
}

impl WordPatch {
    /// Apply the patch and refresh `updated_at`.
    pub fn apply(self, word: &mut Word) {
        if let Some(label) = self.label {
            word.label = label;
        }
        if let Some(phonetic) = self.phonetic {
            word.phonetic = phonetic;
        }
        if let Some(pos_definitions) = self.pos_definitions {
            word.pos_definitions = pos_definitions;
        }
        if let Some(examples) = self.examples {
            word.examples = examples;
        }
        word.updated_at = Utc::now();
    }
}

/// On-disk shape of a word, including the legacy flat `pos`/`definition`
/// fields written before words could carry several pairs.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredWord {
    id: String,
    label: String,
    #[serde(default)]
    phonetic: Option<String>,
    #[serde(default)]
    pos_definitions: Vec<PosDefinitionPair>,
    #[serde(default)]
    examples: Vec<String>,
    #[serde(default)]
    pos: Option<LegacyPos>,
    #[serde(default)]
    definition: Option<String>,
    #[serde(default)]
    created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum LegacyPos {
    One(PosKey),
    Many(Vec<PosKey>),
}

impl From<StoredWord> for Word {
    fn from(stored: StoredWord) -> Self {
        let mut pos_definitions = stored.pos_definitions;
        if pos_definitions.is_empty() && (stored.pos.is_some() || stored.definition.is_some()) {
            let keys = match stored.pos {
                Some(LegacyPos::One(key)) => vec![key],
                Some(LegacyPos::Many(keys)) => keys,
                None => Vec::new(),
            };
            if keys.is_empty() {
                pos_definitions.push(PosDefinitionPair {
                    pos: None,
                    definition: stored.definition,
                });
            } else {
                // The single legacy definition belongs to the first pos.
                let mut definition = stored.definition;
                for key in keys {
                    pos_definitions.push(PosDefinitionPair {
                        pos: Some(key),
                        definition: definition.take(),
                    });
                }
            }
        }

        let created_at = stored.created_at.unwrap_or_default();
        Word {
            id: stored.id,
            label: stored.label,
            phonetic: stored.phonetic,
            pos_definitions,
            examples: stored.examples,
            created_at,
            updated_at: stored.updated_at.unwrap_or(created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_draft_generates_id_and_timestamps() {
        let word = Word::from_draft(WordDraft::new("dog").with_example("The dog barked."));
        assert_eq!(word.id.len(), 36);
        assert_eq!(word.label, "dog");
        assert_eq!(word.created_at, word.updated_at);
        assert_eq!(word.examples, vec!["The dog barked.".to_string()]);
    }

    #[test]
    fn test_patch_refreshes_updated_at() {
        let mut word = Word::from_draft(WordDraft::new("dog").with_id("w1"));
        word.updated_at = DateTime::<Utc>::default();
        WordPatch {
            label: Some("hound".to_string()),
            ..Default::default()
        }
        .apply(&mut word);
        assert_eq!(word.label, "hound");
        assert!(word.updated_at > DateTime::<Utc>::default());
    }

    #[test]
    fn test_serialize_uses_camel_case() {
        let word = Word::from_draft(
            WordDraft::new("dog")
                .with_id("w1")
                .with_pos_definition(Some(PosKey::parse("noun").unwrap()), Some("a canine")),
        );
        let json = serde_json::to_value(&word).unwrap();
        assert!(json.get("posDefinitions").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("phonetic").is_none());
        let back: Word = serde_json::from_value(json).unwrap();
        assert_eq!(back, word);
    }

    #[test]
    fn test_legacy_single_pos_is_migrated() {
        let json = r#"{"id":"dog","label":"dog","pos":"noun","definition":"a domestic canine"}"#;
        let word: Word = serde_json::from_str(json).unwrap();
        assert_eq!(word.pos_definitions.len(), 1);
        assert_eq!(word.pos_definitions[0].pos.as_ref().unwrap(), "noun");
        assert_eq!(word.primary_definition(), Some("a domestic canine"));
        assert_eq!(word.created_at, DateTime::<Utc>::default());
    }

    #[test]
    fn test_legacy_pos_list_attaches_definition_to_first() {
        let json = r#"{"id":"run","label":"run","pos":["verb","noun"],"definition":"move fast"}"#;
        let word: Word = serde_json::from_str(json).unwrap();
        assert_eq!(word.pos_definitions.len(), 2);
        assert_eq!(word.pos_definitions[0].definition.as_deref(), Some("move fast"));
        assert_eq!(word.pos_definitions[1].definition, None);
        let keys: Vec<&str> = word.pos_list().iter().map(|k| k.as_str()).collect();
        assert_eq!(keys, vec!["verb", "noun"]);
    }

    #[test]
    fn test_pair_emptiness() {
        assert!(PosDefinitionPair::default().is_empty());
        assert!(PosDefinitionPair::new(None, Some("  ")).is_empty());
        assert!(!PosDefinitionPair::new(None, Some("x")).is_empty());
    }

    #[test]
    fn test_label_matches_case_insensitive() {
        let word = Word::from_draft(WordDraft::new("Dog"));
        assert!(word.label_matches("dog"));
        assert!(word.label_matches(" DOG "));
        assert!(!word.label_matches("dogs"));
    }
}
