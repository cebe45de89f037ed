//! The lexicon: one working set behind the registry, the consistency engine,
//! and the graph builder.
//!
//! Every operation loads what it needs, computes in memory, and writes the
//! changed collections back. Nothing is rolled back if a later write fails.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::config::Config;
use crate::consistency::{self, LinkOutcome, RelationMap, ReplaceReport};
use crate::db::{Db, KvBackend, SqliteKv};
use crate::error::{LexgraphError, Result};
use crate::graph::{build_graph, BuildOptions, GraphData};
use crate::history::{SearchHistory, SearchHistoryItem};
use crate::model::{
    format_pos_definitions, Connection, PosDefinitionLine, PosKey, PosType, PosTypeUpdate, RelationKey, RelationType,
    RelationTypeUpdate, Word, WordDraft, WordPatch,
};
use crate::registry::{PosRegistry, PosRename, RelationRegistry, RelationRename};
use crate::store::{ExportBundle, Project, Store, WordDeletion};

pub struct Lexicon<B: KvBackend> {
    store: Store<B>,
    relations: RelationRegistry,
    history: SearchHistory,
    default_depth: usize,
    default_max_nodes: usize,
    /// Held across every load-modify-save so concurrent callers cannot
    /// overwrite each other's writes.
    write_lock: Mutex<()>,
}

impl Lexicon<SqliteKv> {
    /// Open the SQLite-backed lexicon configured by `config`.
    pub fn open(config: &Config) -> Result<Self> {
        let backend = SqliteKv::open(&Db::new(config.db_path()))?;
        Self::with_config(backend, config)
    }
}

impl<B: KvBackend> Lexicon<B> {
    pub fn new(backend: B, cache_ttl: Duration, history_max_items: usize) -> Result<Self> {
        Ok(Self {
            store: Store::new(backend),
            relations: RelationRegistry::new(cache_ttl),
            history: SearchHistory::new(history_max_items)?,
            default_depth: 2,
            default_max_nodes: 50,
            write_lock: Mutex::new(()),
        })
    }

    pub fn with_config(backend: B, config: &Config) -> Result<Self> {
        let mut lexicon = Self::new(backend, config.cache_ttl(), config.history.max_items)?;
        lexicon.default_depth = config.graph.default_depth;
        lexicon.default_max_nodes = config.graph.default_max_nodes;
        Ok(lexicon)
    }

    fn write_guard(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn store(&self) -> &Store<B> {
        &self.store
    }

    pub fn relations(&self) -> &RelationRegistry {
        &self.relations
    }

    /// Seed empty relation and PoS registries with the built-in catalogs.
    pub fn initialize_defaults(&self) -> Result<()> {
        let _write = self.write_guard();
        self.relations.initialize_defaults(&self.store)?;
        PosRegistry::initialize_defaults(&self.store)?;
        Ok(())
    }

    // ========== Relation types ==========

    pub fn list_relation_types(&self) -> Result<Arc<Vec<RelationType>>> {
        self.relations.list(&self.store)
    }

    pub fn get_relation_type(&self, key: &str) -> Result<Option<RelationType>> {
        self.relations.get(&self.store, key)
    }

    pub fn add_relation_type(&self, relation_type: RelationType) -> Result<()> {
        let _write = self.write_guard();
        self.relations.add(&self.store, relation_type)
    }

    pub fn update_relation_type(&self, key: &str, update: RelationTypeUpdate) -> Result<()> {
        let _write = self.write_guard();
        if !self.relations.update(&self.store, key, update)? {
            return Err(LexgraphError::RelationTypeNotFound(key.to_string()));
        }
        Ok(())
    }

    pub fn delete_relation_type(&self, key: &str) -> Result<bool> {
        let _write = self.write_guard();
        self.relations.delete(&self.store, key)
    }

    pub fn rename_relation_type_key(
        &self,
        old: &RelationKey,
        new: &RelationKey,
        updates: RelationTypeUpdate,
    ) -> Result<RelationRename> {
        let _write = self.write_guard();
        self.relations.rename_key(&self.store, old, new, updates)
    }

    // ========== Parts of speech ==========

    pub fn list_pos_types(&self) -> Result<Vec<PosType>> {
        PosRegistry::list(&self.store)
    }

    pub fn add_pos_type(&self, pos_type: PosType) -> Result<()> {
        let _write = self.write_guard();
        PosRegistry::add(&self.store, pos_type)
    }

    pub fn update_pos_type(&self, key: &str, update: PosTypeUpdate) -> Result<()> {
        let _write = self.write_guard();
        if !PosRegistry::update(&self.store, key, update)? {
            return Err(LexgraphError::PosTypeNotFound(key.to_string()));
        }
        Ok(())
    }

    pub fn delete_pos_type(&self, key: &str) -> Result<bool> {
        let _write = self.write_guard();
        PosRegistry::delete(&self.store, key)
    }

    pub fn rename_pos_key(&self, old: &PosKey, new: &PosKey, updates: PosTypeUpdate) -> Result<PosRename> {
        let _write = self.write_guard();
        PosRegistry::rename_key(&self.store, old, new, updates)
    }

    /// Display lines for a word's pos/definition pairs.
    pub fn pos_definition_lines(&self, word: &Word) -> Result<Vec<PosDefinitionLine>> {
        Ok(format_pos_definitions(&word.pos_definitions, &self.list_pos_types()?))
    }

    // ========== Words ==========

    pub fn words(&self) -> Result<Vec<Word>> {
        self.store.words()
    }

    pub fn add_word(&self, draft: WordDraft) -> Result<Word> {
        let _write = self.write_guard();
        self.store.add_word(draft)
    }

    pub fn get_word(&self, id: &str) -> Result<Option<Word>> {
        self.store.get_word(id)
    }

    pub fn find_words_by_label(&self, label: &str) -> Result<Vec<Word>> {
        self.store.find_words_by_label(label)
    }

    pub fn update_word(&self, id: &str, patch: WordPatch) -> Result<Word> {
        let _write = self.write_guard();
        self.store
            .update_word(id, patch)?
            .ok_or_else(|| LexgraphError::WordNotFound(id.to_string()))
    }

    pub fn bulk_replace_words(&self, words: Vec<Word>) -> Result<usize> {
        let _write = self.write_guard();
        self.store.bulk_replace_words(words)
    }

    /// Delete a word and every connection touching it.
    pub fn delete_word(&self, id: &str) -> Result<WordDeletion> {
        let _write = self.write_guard();
        self.store.delete_word(id)
    }

    fn require_word(&self, words: &[Word], id: &str) -> Result<()> {
        if words.iter().any(|w| w.id == id) {
            Ok(())
        } else {
            Err(LexgraphError::WordNotFound(id.to_string()))
        }
    }

    // ========== Connections ==========

    pub fn connections(&self) -> Result<Vec<Connection>> {
        self.store.connections()
    }

    /// Pairing-aware link. Both words must exist; an existing link is a no-op.
    pub fn add_connection(&self, source: &str, target: &str, relation: &RelationKey) -> Result<LinkOutcome> {
        let _write = self.write_guard();
        let words = self.store.words()?;
        self.require_word(&words, source)?;
        self.require_word(&words, target)?;

        let rules = self.relations.pairing_rules(&self.store)?;
        if !rules.is_known(relation.as_str()) {
            log::warn!("Linking with unregistered relation '{}'", relation);
        }

        let mut connections = self.store.connections()?;
        let outcome = consistency::add_connection(&mut connections, &rules, source, target, relation);
        if outcome.created.is_some() || outcome.reverse.is_some() {
            self.store.save_connections(&connections)?;
        }
        Ok(outcome)
    }

    /// Remove a connection and its paired reverse.
    pub fn delete_connection(&self, id: &str) -> Result<Vec<Connection>> {
        let _write = self.write_guard();
        let rules = self.relations.pairing_rules(&self.store)?;
        let mut connections = self.store.connections()?;
        let removed = consistency::remove_connection(&mut connections, &rules, id);
        if !removed.is_empty() {
            self.store.save_connections(&connections)?;
        }
        Ok(removed)
    }

    /// Current editable relations of a word.
    pub fn word_relations(&self, word_id: &str) -> Result<RelationMap> {
        let rules = self.relations.pairing_rules(&self.store)?;
        Ok(consistency::word_relations(&self.store.connections()?, &rules, word_id))
    }

    /// Replace all editable relations of `word_id` and keep reverses closed.
    pub fn replace_word_relations(&self, word_id: &str, relations: &RelationMap) -> Result<ReplaceReport> {
        let _write = self.write_guard();
        let words = self.store.words()?;
        self.require_word(&words, word_id)?;
        let word_ids: HashSet<&str> = words.iter().map(|w| w.id.as_str()).collect();

        let rules = self.relations.pairing_rules(&self.store)?;
        let mut connections = self.store.connections()?;
        let report = consistency::replace_word_relations(&mut connections, &rules, &word_ids, word_id, relations);
        self.store.save_connections(&connections)?;

        log::debug!(
            "Replaced relations of {}: -{} +{} (+{} reverse)",
            word_id,
            report.removed,
            report.created,
            report.reverses_created
        );
        Ok(report)
    }

    // ========== Graph ==========

    pub fn default_depth(&self) -> usize {
        self.default_depth
    }

    pub fn default_max_nodes(&self) -> usize {
        self.default_max_nodes
    }

    /// Build with the registry's default active relations.
    pub fn build(&self, query: &str, max_depth: usize, max_nodes: usize) -> Result<GraphData> {
        let connections = self.store.connections()?;
        let mut options = BuildOptions::new(max_depth, max_nodes);
        options.active_relations = self.default_active_relations(&connections)?;
        self.build_from(connections, query, &options)
    }

    /// Build with explicit options.
    pub fn build_with(&self, query: &str, options: &BuildOptions) -> Result<GraphData> {
        self.build_from(self.store.connections()?, query, options)
    }

    fn build_from(&self, connections: Vec<Connection>, query: &str, options: &BuildOptions) -> Result<GraphData> {
        let words = self.store.words()?;
        let rules = self.relations.pairing_rules(&self.store)?;
        Ok(build_graph(&words, &connections, &rules, query, options))
    }

    /// Build with configured bounds and record the query in the history.
    pub fn search(&self, query: &str) -> Result<GraphData> {
        let graph = self.build(query, self.default_depth, self.default_max_nodes)?;
        self.record_search(query)?;
        Ok(graph)
    }

    /// Add `query` to the search history. Empty and wildcard queries are skipped.
    pub fn record_search(&self, query: &str) -> Result<bool> {
        let _write = self.write_guard();
        self.history.record(&self.store, query)
    }

    /// `None` when every relation is active. Otherwise the default-active keys
    /// plus any unregistered keys in use, which are never filtered.
    fn default_active_relations(&self, connections: &[Connection]) -> Result<Option<BTreeSet<RelationKey>>> {
        let types = self.relations.list(&self.store)?;
        let mut active = self.relations.default_active_keys(&self.store)?;
        if active.len() == types.len() {
            return Ok(None);
        }
        let known: HashSet<&str> = types.iter().map(|rt| rt.key.as_str()).collect();
        for conn in connections {
            if !known.contains(conn.relation.as_str()) {
                active.insert(conn.relation.clone());
            }
        }
        Ok(Some(active))
    }

    // ========== Search history ==========

    pub fn history(&self) -> Result<Vec<SearchHistoryItem>> {
        self.history.entries(&self.store)
    }

    pub fn remove_history_item(&self, word: &str) -> Result<bool> {
        let _write = self.write_guard();
        self.history.remove(&self.store, word)
    }

    pub fn clear_history(&self) -> Result<()> {
        let _write = self.write_guard();
        self.history.clear(&self.store)
    }

    // ========== Import / export ==========

    pub fn export_data(&self) -> Result<ExportBundle> {
        self.store.export_data()
    }

    pub fn import_data(&self, bundle: &ExportBundle) -> Result<()> {
        let _write = self.write_guard();
        let result = self.store.import_data(bundle);
        self.relations.invalidate();
        result
    }

    pub fn clear_all(&self) -> Result<()> {
        let _write = self.write_guard();
        let result = self.store.clear_all();
        self.relations.invalidate();
        log::info!("Cleared all collections");
        result
    }

    // ========== Projects ==========

    pub fn projects(&self) -> Result<Vec<Project>> {
        self.store.projects()
    }

    pub fn current_project_id(&self) -> Result<Option<String>> {
        self.store.current_project_id()
    }

    pub fn create_project(&self, name: &str, description: Option<&str>) -> Result<Project> {
        let _write = self.write_guard();
        self.store.create_project_from_current(name, description)
    }

    pub fn import_as_project(&self, name: &str, bundle: ExportBundle, description: Option<&str>) -> Result<Project> {
        let _write = self.write_guard();
        self.store.import_as_project(name, bundle, description)
    }

    pub fn switch_to_project(&self, id: &str) -> Result<()> {
        let _write = self.write_guard();
        let result = self.store.switch_to_project(id);
        self.relations.invalidate();
        result
    }

    pub fn has_unsaved_changes(&self) -> Result<bool> {
        self.store.has_unsaved_changes()
    }

    pub fn update_current_project(&self) -> Result<bool> {
        let _write = self.write_guard();
        self.store.update_current_project()
    }

    pub fn rename_project(&self, id: &str, name: &str, description: Option<&str>) -> Result<bool> {
        let _write = self.write_guard();
        self.store.rename_project(id, name, description)
    }

    pub fn delete_project(&self, id: &str) -> Result<bool> {
        let _write = self.write_guard();
        let result = self.store.delete_project(id);
        self.relations.invalidate();
        result
    }

    pub fn export_project(&self, id: &str) -> Result<Option<Project>> {
        self.store.export_project(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKv;
    use crate::model::{Pairing, PosDefinitionPair};
    use tempfile::TempDir;

    fn rel(s: &str) -> RelationKey {
        RelationKey::parse(s).unwrap()
    }

    fn lexicon() -> Lexicon<MemoryKv> {
        let lexicon = Lexicon::new(MemoryKv::new(), Duration::from_secs(60), 10).unwrap();
        lexicon.initialize_defaults().unwrap();
        lexicon
    }

    fn add(lexicon: &Lexicon<MemoryKv>, id: &str) {
        lexicon.add_word(WordDraft::new(id).with_id(id)).unwrap();
    }

    fn relations(entries: &[(&str, &[&str])]) -> RelationMap {
        entries
            .iter()
            .map(|(k, targets)| (rel(k), targets.iter().map(|t| t.to_string()).collect()))
            .collect()
    }

    #[test]
    fn test_dog_canine_scenario() {
        let lexicon = lexicon();
        add(&lexicon, "dog");
        add(&lexicon, "canine");
        lexicon.store().insert_connection(Connection::new("dog", "canine", rel("hypernym"))).unwrap();

        let report = lexicon.replace_word_relations("canine", &relations(&[("hyponym", &["dog"])])).unwrap();
        assert_eq!(report.reverses_created, 0);

        let connections = lexicon.connections().unwrap();
        assert_eq!(connections.len(), 2);
        assert!(connections.iter().any(|c| c.is("canine", "dog", "hyponym")));
        assert!(connections.iter().any(|c| c.is("dog", "canine", "hypernym")));
    }

    #[test]
    fn test_dog_pooch_scenario() {
        let lexicon = lexicon();
        add(&lexicon, "dog");
        add(&lexicon, "pooch");
        lexicon.replace_word_relations("pooch", &relations(&[("synonym", &["dog"])])).unwrap();

        let graph = lexicon.build("dog", 2, 50).unwrap();
        let edges: Vec<_> = graph.relation_edges().collect();
        assert_eq!(edges.len(), 1);
        assert_eq!((edges[0].source.as_str(), edges[0].target.as_str()), ("dog", "pooch"));
    }

    #[test]
    fn test_replace_unknown_word_fails() {
        let lexicon = lexicon();
        let result = lexicon.replace_word_relations("ghost", &RelationMap::new());
        assert!(matches!(result, Err(LexgraphError::WordNotFound(_))));
    }

    #[test]
    fn test_add_and_delete_connection() {
        let lexicon = lexicon();
        add(&lexicon, "dog");
        add(&lexicon, "tail");

        let outcome = lexicon.add_connection("tail", "dog", &rel("holonym")).unwrap();
        assert!(outcome.reverse.is_some());
        assert!(lexicon.add_connection("tail", "dog", &rel("holonym")).unwrap().created.is_none());
        assert!(matches!(
            lexicon.add_connection("tail", "ghost", &rel("holonym")),
            Err(LexgraphError::WordNotFound(_))
        ));

        let view = lexicon.word_relations("dog").unwrap();
        assert_eq!(view, relations(&[("meronym", &["tail"])]));

        let removed = lexicon.delete_connection(&outcome.created.unwrap().id).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(lexicon.connections().unwrap().is_empty());
    }

    #[test]
    fn test_delete_word_cascades() {
        let lexicon = lexicon();
        for id in ["dog", "canine", "pooch"] {
            add(&lexicon, id);
        }
        lexicon
            .replace_word_relations("dog", &relations(&[("hypernym", &["canine"]), ("synonym", &["pooch"])]))
            .unwrap();
        assert_eq!(lexicon.connections().unwrap().len(), 3);

        let deletion = lexicon.delete_word("dog").unwrap();
        assert!(deletion.word_removed);
        assert_eq!(deletion.connections_removed, 3);
        assert!(lexicon.connections().unwrap().iter().all(|c| !c.touches("dog")));

        for query in ["dog", "canine", "pooch", "*"] {
            let graph = lexicon.build(query, 3, 50).unwrap();
            assert!(graph.nodes.iter().all(|n| n.id != "dog" && n.parent.as_deref() != Some("dog")));
            assert!(graph.edges.iter().all(|e| e.source != "dog" && e.target != "dog"));
        }
        assert!(lexicon.build("dog", 3, 50).unwrap().is_empty());
    }

    #[test]
    fn test_rename_relation_key_cascade() {
        let lexicon = lexicon();
        add(&lexicon, "dog");
        add(&lexicon, "canine");
        lexicon.replace_word_relations("dog", &relations(&[("hypernym", &["canine"])])).unwrap();
        // Warm the registry cache so the rename has to invalidate it.
        lexicon.list_relation_types().unwrap();

        lexicon
            .rename_relation_type_key(&rel("hypernym"), &rel("is_a"), RelationTypeUpdate::default())
            .unwrap();

        assert!(lexicon.connections().unwrap().iter().all(|c| c.relation != "hypernym"));
        let hypo = lexicon.get_relation_type("hyponym").unwrap().unwrap();
        assert_eq!(hypo.pairing(), Pairing::Reverse(rel("is_a")));

        // Pairing still closes under the new key.
        add(&lexicon, "animal");
        lexicon.replace_word_relations("canine", &relations(&[("is_a", &["animal"])])).unwrap();
        assert!(lexicon.connections().unwrap().iter().any(|c| c.is("animal", "canine", "hyponym")));
    }

    #[test]
    fn test_default_active_filter_keeps_unregistered_keys() {
        let lexicon = lexicon();
        for id in ["dog", "tail", "pooch", "kennel"] {
            add(&lexicon, id);
        }
        lexicon.add_connection("dog", "tail", &rel("compound")).unwrap();
        lexicon.add_connection("dog", "pooch", &rel("synonym")).unwrap();
        lexicon.add_connection("dog", "kennel", &rel("retired")).unwrap();
        lexicon
            .update_relation_type(
                "compound",
                RelationTypeUpdate {
                    default_active: Some(false),
                    ..Default::default()
                },
            )
            .unwrap();

        let graph = lexicon.build("dog", 1, 50).unwrap();
        let mut ids: Vec<&str> = graph.word_nodes().map(|n| n.id.as_str()).collect();
        ids.sort();
        assert_eq!(ids, vec!["dog", "kennel", "pooch"]);

        let all = lexicon.build_with("dog", &BuildOptions::new(1, 50)).unwrap();
        assert_eq!(all.word_nodes().count(), 4);
    }

    #[test]
    fn test_update_missing_registry_entries() {
        let lexicon = lexicon();
        assert!(matches!(
            lexicon.update_relation_type("nope", RelationTypeUpdate::default()),
            Err(LexgraphError::RelationTypeNotFound(_))
        ));
        assert!(matches!(
            lexicon.update_pos_type("nope", PosTypeUpdate::default()),
            Err(LexgraphError::PosTypeNotFound(_))
        ));
        assert!(matches!(
            lexicon.update_word("nope", WordPatch::default()),
            Err(LexgraphError::WordNotFound(_))
        ));
    }

    #[test]
    fn test_search_records_history() {
        let lexicon = lexicon();
        add(&lexicon, "dog");
        assert_eq!(lexicon.search("dog").unwrap().word_nodes().count(), 1);
        assert!(lexicon.search("*").is_ok());
        assert!(lexicon.search("nothing").unwrap().is_empty());
        let words: Vec<String> = lexicon.history().unwrap().into_iter().map(|i| i.word).collect();
        assert_eq!(words, vec!["nothing", "dog"]);
    }

    #[test]
    fn test_import_invalidates_registry_cache() {
        let lexicon = lexicon();
        add(&lexicon, "dog");
        let bundle = lexicon.export_data().unwrap();
        assert!(lexicon.list_relation_types().unwrap().len() > 1);

        let mut trimmed = bundle.clone();
        trimmed.relation_types.retain(|rt| rt.key == "synonym");
        lexicon.import_data(&trimmed).unwrap();
        assert_eq!(lexicon.list_relation_types().unwrap().len(), 1);

        lexicon.clear_all().unwrap();
        assert!(lexicon.list_relation_types().unwrap().is_empty());
        assert!(lexicon.words().unwrap().is_empty());
    }

    #[test]
    fn test_projects_switch_reloads_registry() {
        let lexicon = lexicon();
        add(&lexicon, "dog");
        let first = lexicon.create_project("first", None).unwrap();

        lexicon.delete_relation_type("compound").unwrap();
        add(&lexicon, "cat");
        assert!(lexicon.has_unsaved_changes().unwrap());

        lexicon.switch_to_project(&first.id).unwrap();
        assert!(lexicon.get_relation_type("compound").unwrap().is_some());
        assert_eq!(lexicon.words().unwrap().len(), 1);
        assert_eq!(lexicon.current_project_id().unwrap(), Some(first.id.clone()));

        assert!(lexicon.delete_project(&first.id).unwrap());
        assert!(lexicon.list_relation_types().unwrap().is_empty());
    }

    #[test]
    fn test_pos_definition_lines() {
        let lexicon = lexicon();
        let word = lexicon
            .add_word(
                WordDraft::new("run")
                    .with_pos_definition(Some(PosKey::parse("verb").unwrap()), Some("move fast"))
                    .with_pos_definition(None, None),
            )
            .unwrap();
        let lines = lexicon.pos_definition_lines(&word).unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].pos_label, "Verb (v.)");
        assert_eq!(lines[0].definition, "move fast");
        assert!(!word.pos_definitions.iter().all(PosDefinitionPair::is_empty));
    }

    #[test]
    fn test_sqlite_backed_lexicon_persists() {
        let temp_dir = TempDir::new().unwrap();
        let mut config = Config::default();
        config.lexgraph.db_path = temp_dir.path().join("lexgraph.db");
        {
            let lexicon = Lexicon::open(&config).unwrap();
            lexicon.initialize_defaults().unwrap();
            lexicon.add_word(WordDraft::new("dog").with_id("dog")).unwrap();
            lexicon.add_word(WordDraft::new("canine").with_id("canine")).unwrap();
            lexicon.add_connection("dog", "canine", &rel("hypernym")).unwrap();
        }
        let lexicon = Lexicon::open(&config).unwrap();
        assert_eq!(lexicon.connections().unwrap().len(), 2);
        assert_eq!(lexicon.build("dog", 1, 10).unwrap().relation_edges().count(), 2);
    }
}
