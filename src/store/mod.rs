//! Word/connection store over a key-value backend.
//!
//! Each collection is a JSON array under its own key. This layer knows nothing
//! about pairing rules; it loads, saves, and cascades word deletes.

mod projects;

pub use projects::{Project, ProjectData};

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::db::KvBackend;
use crate::error::{LexgraphError, Result};
use crate::graph::PLACEHOLDER_PREFIX;
use crate::model::{Connection, PosType, RelationType, Word, WordDraft, WordPatch};

/// Storage keys of the persisted collections.
pub mod keys {
    pub const WORDS: &str = "lexgraph.words";
    pub const CONNECTIONS: &str = "lexgraph.connections";
    pub const RELATION_TYPES: &str = "lexgraph.relation_types";
    pub const POS_TYPES: &str = "lexgraph.pos_types";
    pub const PROJECTS: &str = "lexgraph.projects";
    pub const CURRENT_PROJECT: &str = "lexgraph.current_project";
    pub const SEARCH_HISTORY: &str = "lexgraph.search_history";
}

/// Outcome of a cascading word delete.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WordDeletion {
    pub word_removed: bool,
    pub connections_removed: usize,
}

/// Full dump of the working set.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportBundle {
    pub words: Vec<Word>,
    pub connections: Vec<Connection>,
    pub relation_types: Vec<RelationType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pos_types: Option<Vec<PosType>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
}

/// Word ids must not collide with graph placeholder ids.
fn check_word_id(id: &str) -> Result<()> {
    if id.starts_with(PLACEHOLDER_PREFIX) {
        return Err(LexgraphError::InvalidInput(format!(
            "word id '{}' uses the reserved prefix '{}'",
            id, PLACEHOLDER_PREFIX
        )));
    }
    Ok(())
}

pub(crate) fn check_word_ids(words: &[Word]) -> Result<()> {
    words.iter().try_for_each(|w| check_word_id(&w.id))
}

pub struct Store<B: KvBackend> {
    backend: B,
}

impl<B: KvBackend> Store<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Decode the value under `key`. A value that fails to parse is fatal.
    pub(crate) fn load_value<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.backend.get(key)? {
            None => Ok(None),
            Some(bytes) => serde_json::from_slice(&bytes)
                .map(Some)
                .map_err(|source| LexgraphError::CorruptState {
                    key: key.to_string(),
                    source,
                }),
        }
    }

    pub(crate) fn save_value<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec(value)?;
        self.backend.set(key, &bytes)
    }

    pub(crate) fn remove_value(&self, key: &str) -> Result<()> {
        self.backend.delete(key)
    }

    fn load_collection<T: DeserializeOwned>(&self, key: &str) -> Result<Vec<T>> {
        Ok(self.load_value(key)?.unwrap_or_default())
    }

    // ========== Words ==========

    pub fn words(&self) -> Result<Vec<Word>> {
        self.load_collection(keys::WORDS)
    }

    pub fn save_words(&self, words: &[Word]) -> Result<()> {
        self.save_value(keys::WORDS, words)
    }

    pub fn add_word(&self, draft: WordDraft) -> Result<Word> {
        if draft.label.trim().is_empty() {
            return Err(LexgraphError::InvalidInput("word label cannot be empty".to_string()));
        }
        let mut words = self.words()?;
        if let Some(id) = &draft.id {
            check_word_id(id)?;
            if words.iter().any(|w| &w.id == id) {
                return Err(LexgraphError::DuplicateKey(id.clone()));
            }
        }
        let word = Word::from_draft(draft);
        words.push(word.clone());
        self.save_words(&words)?;
        log::debug!("Added word {} ({})", word.label, word.id);
        Ok(word)
    }

    pub fn get_word(&self, id: &str) -> Result<Option<Word>> {
        Ok(self.words()?.into_iter().find(|w| w.id == id))
    }

    /// All words whose label case-insensitively equals `label`.
    pub fn find_words_by_label(&self, label: &str) -> Result<Vec<Word>> {
        Ok(self.words()?.into_iter().filter(|w| w.label_matches(label)).collect())
    }

    /// Apply `patch` to the word. Returns `None` when the word does not exist.
    pub fn update_word(&self, id: &str, patch: WordPatch) -> Result<Option<Word>> {
        let mut words = self.words()?;
        let Some(word) = words.iter_mut().find(|w| w.id == id) else {
            return Ok(None);
        };
        patch.apply(word);
        let updated = word.clone();
        self.save_words(&words)?;
        Ok(Some(updated))
    }

    /// Upsert many words in a single write. Existing ids are replaced in place,
    /// new ids are appended in input order.
    pub fn bulk_replace_words(&self, incoming: Vec<Word>) -> Result<usize> {
        check_word_ids(&incoming)?;
        let mut words = self.words()?;
        let count = incoming.len();
        for word in incoming {
            match words.iter_mut().find(|w| w.id == word.id) {
                Some(existing) => *existing = word,
                None => words.push(word),
            }
        }
        self.save_words(&words)?;
        Ok(count)
    }

    /// Remove the word and every connection that references it.
    pub fn delete_word(&self, id: &str) -> Result<WordDeletion> {
        let mut words = self.words()?;
        let before = words.len();
        words.retain(|w| w.id != id);
        let word_removed = words.len() != before;
        if word_removed {
            self.save_words(&words)?;
        }

        let connections_removed = self.delete_connections_by_word(id)?;
        if word_removed {
            log::info!("Deleted word {} and {} connection(s)", id, connections_removed);
        }
        Ok(WordDeletion {
            word_removed,
            connections_removed,
        })
    }

    // ========== Connections ==========

    pub fn connections(&self) -> Result<Vec<Connection>> {
        self.load_collection(keys::CONNECTIONS)
    }

    pub fn save_connections(&self, connections: &[Connection]) -> Result<()> {
        self.save_value(keys::CONNECTIONS, connections)
    }

    /// Append a connection as-is.
    pub fn insert_connection(&self, connection: Connection) -> Result<Connection> {
        let mut connections = self.connections()?;
        connections.push(connection.clone());
        self.save_connections(&connections)?;
        Ok(connection)
    }

    pub fn get_connection(&self, id: &str) -> Result<Option<Connection>> {
        Ok(self.connections()?.into_iter().find(|c| c.id == id))
    }

    /// Remove one connection by id. Returns whether it existed.
    pub fn delete_connection(&self, id: &str) -> Result<bool> {
        let mut connections = self.connections()?;
        let before = connections.len();
        connections.retain(|c| c.id != id);
        if connections.len() == before {
            return Ok(false);
        }
        self.save_connections(&connections)?;
        Ok(true)
    }

    pub fn delete_connections_by_word(&self, word_id: &str) -> Result<usize> {
        let mut connections = self.connections()?;
        let before = connections.len();
        connections.retain(|c| !c.touches(word_id));
        let removed = before - connections.len();
        if removed > 0 {
            self.save_connections(&connections)?;
        }
        Ok(removed)
    }

    // ========== Registries ==========

    pub fn relation_types(&self) -> Result<Vec<RelationType>> {
        self.load_collection(keys::RELATION_TYPES)
    }

    pub fn save_relation_types(&self, types: &[RelationType]) -> Result<()> {
        self.save_value(keys::RELATION_TYPES, types)
    }

    pub fn pos_types(&self) -> Result<Vec<PosType>> {
        self.load_collection(keys::POS_TYPES)
    }

    pub fn save_pos_types(&self, types: &[PosType]) -> Result<()> {
        self.save_value(keys::POS_TYPES, types)
    }

    // ========== Import / Export ==========

    pub fn export_data(&self) -> Result<ExportBundle> {
        Ok(ExportBundle {
            words: self.words()?,
            connections: self.connections()?,
            relation_types: self.relation_types()?,
            pos_types: Some(self.pos_types()?),
            exported_at: Some(Utc::now()),
        })
    }

    /// Replace the working set. PoS types are kept when the bundle has none.
    pub fn import_data(&self, bundle: &ExportBundle) -> Result<()> {
        check_word_ids(&bundle.words)?;
        self.save_words(&bundle.words)?;
        self.save_connections(&bundle.connections)?;
        self.save_relation_types(&bundle.relation_types)?;
        if let Some(pos_types) = &bundle.pos_types {
            self.save_pos_types(pos_types)?;
        }
        log::info!(
            "Imported {} words, {} connections, {} relation types",
            bundle.words.len(),
            bundle.connections.len(),
            bundle.relation_types.len()
        );
        Ok(())
    }

    pub fn clear_all(&self) -> Result<()> {
        for key in [keys::WORDS, keys::CONNECTIONS, keys::RELATION_TYPES, keys::POS_TYPES] {
            self.backend.delete(key)?;
        }
        Ok(())
    }
}
