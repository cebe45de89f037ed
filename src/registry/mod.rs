//! Relation type registry (cached) and part-of-speech registry.

mod defaults;
mod rename;

pub use defaults::{default_pos_types, default_relation_types};
pub use rename::{rename_pos_key, rename_relation_key, PosRename, RelationRename};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::db::KvBackend;
use crate::error::{LexgraphError, Result};
use crate::model::{
    PairingRules, PosKey, PosType, PosTypeUpdate, RelationKey, RelationType, RelationTypeUpdate,
};
use crate::store::Store;

/// Catalog of relation kinds.
///
/// Reads are served from a short-lived cache owned by the registry; every
/// mutating call invalidates it before returning.
pub struct RelationRegistry {
    cache: TtlCache<Vec<RelationType>>,
}

impl RelationRegistry {
    pub fn new(ttl: Duration) -> Self {
        Self {
            cache: TtlCache::new(ttl),
        }
    }

    pub fn list<B: KvBackend>(&self, store: &Store<B>) -> Result<Arc<Vec<RelationType>>> {
        self.cache.get_or_load(|| store.relation_types())
    }

    pub fn get<B: KvBackend>(&self, store: &Store<B>, key: &str) -> Result<Option<RelationType>> {
        Ok(self.list(store)?.iter().find(|rt| rt.key == key).cloned())
    }

    pub fn pairing_rules<B: KvBackend>(&self, store: &Store<B>) -> Result<PairingRules> {
        Ok(PairingRules::from_types(&self.list(store)?))
    }

    /// True when some relation type has `key` and pairs with itself.
    pub fn is_symmetric<B: KvBackend>(&self, store: &Store<B>, key: &str) -> Result<bool> {
        Ok(self.list(store)?.iter().any(|rt| rt.key == key && rt.is_symmetric()))
    }

    pub fn symmetric_keys<B: KvBackend>(&self, store: &Store<B>) -> Result<BTreeSet<RelationKey>> {
        Ok(self.pairing_rules(store)?.symmetric_keys())
    }

    /// Keys of types flagged `default_active`, or every key when none is.
    pub fn default_active_keys<B: KvBackend>(&self, store: &Store<B>) -> Result<BTreeSet<RelationKey>> {
        let types = self.list(store)?;
        let active: BTreeSet<RelationKey> =
            types.iter().filter(|rt| rt.default_active).map(|rt| rt.key.clone()).collect();
        if active.is_empty() {
            return Ok(types.iter().map(|rt| rt.key.clone()).collect());
        }
        Ok(active)
    }

    pub fn invalidate(&self) {
        self.cache.invalidate();
    }

    fn write<B: KvBackend>(&self, store: &Store<B>, types: &[RelationType]) -> Result<()> {
        let result = store.save_relation_types(types);
        self.cache.invalidate();
        result
    }

    /// Insert a new relation type. Fails when the key is taken.
    pub fn add<B: KvBackend>(&self, store: &Store<B>, relation_type: RelationType) -> Result<()> {
        let mut types = store.relation_types()?;
        if types.iter().any(|rt| rt.key == relation_type.key) {
            return Err(LexgraphError::DuplicateKey(relation_type.key.to_string()));
        }
        types.push(relation_type);
        self.write(store, &types)
    }

    /// Insert or replace by key.
    pub fn upsert<B: KvBackend>(&self, store: &Store<B>, relation_type: RelationType) -> Result<()> {
        let mut types = store.relation_types()?;
        match types.iter_mut().find(|rt| rt.key == relation_type.key) {
            Some(existing) => *existing = relation_type,
            None => types.push(relation_type),
        }
        self.write(store, &types)
    }

    /// Apply `update` to the type with `key`. Returns false when absent.
    pub fn update<B: KvBackend>(&self, store: &Store<B>, key: &str, update: RelationTypeUpdate) -> Result<bool> {
        let mut types = store.relation_types()?;
        let Some(rt) = types.iter_mut().find(|rt| rt.key == key) else {
            return Ok(false);
        };
        update.apply(rt);
        self.write(store, &types)?;
        Ok(true)
    }

    /// Remove the type. Connections using the key are left in place and
    /// become stale references.
    pub fn delete<B: KvBackend>(&self, store: &Store<B>, key: &str) -> Result<bool> {
        let mut types = store.relation_types()?;
        let before = types.len();
        types.retain(|rt| rt.key != key);
        if types.len() == before {
            return Ok(false);
        }
        self.write(store, &types)?;
        Ok(true)
    }

    /// Rename a key and cascade it into connections and pairings, then persist.
    pub fn rename_key<B: KvBackend>(
        &self,
        store: &Store<B>,
        old: &RelationKey,
        new: &RelationKey,
        updates: RelationTypeUpdate,
    ) -> Result<RelationRename> {
        let renamed = rename_relation_key(old, new, updates, store.connections()?, store.relation_types()?)?;
        if !renamed.record_found {
            log::warn!("Renaming unregistered relation key '{}'; only references are moved", old);
        }

        store.save_connections(&renamed.connections)?;
        self.write(store, &renamed.relation_types)?;

        log::info!(
            "Renamed relation '{}' -> '{}' ({} connection(s), {} pairing(s), {} duplicate(s) dropped)",
            old,
            new,
            renamed.connections_rewritten,
            renamed.pairings_rewritten,
            renamed.duplicates_removed
        );
        Ok(renamed)
    }

    /// Seed the built-in catalog when the registry is empty. Returns the
    /// registry contents afterwards.
    pub fn initialize_defaults<B: KvBackend>(&self, store: &Store<B>) -> Result<Vec<RelationType>> {
        let existing = store.relation_types()?;
        if !existing.is_empty() {
            return Ok(existing);
        }
        let defaults = default_relation_types();
        self.write(store, &defaults)?;
        log::info!("Initialized {} default relation types", defaults.len());
        Ok(defaults)
    }
}

/// Part-of-speech registry. Only used to resolve display labels.
pub struct PosRegistry;

impl PosRegistry {
    pub fn list<B: KvBackend>(store: &Store<B>) -> Result<Vec<PosType>> {
        store.pos_types()
    }

    pub fn add<B: KvBackend>(store: &Store<B>, pos_type: PosType) -> Result<()> {
        let mut types = store.pos_types()?;
        if types.iter().any(|pt| pt.key == pos_type.key) {
            return Err(LexgraphError::DuplicateKey(pos_type.key.to_string()));
        }
        types.push(pos_type);
        store.save_pos_types(&types)
    }

    pub fn update<B: KvBackend>(store: &Store<B>, key: &str, update: PosTypeUpdate) -> Result<bool> {
        let mut types = store.pos_types()?;
        let Some(pt) = types.iter_mut().find(|pt| pt.key == key) else {
            return Ok(false);
        };
        update.apply(pt);
        store.save_pos_types(&types)?;
        Ok(true)
    }

    pub fn delete<B: KvBackend>(store: &Store<B>, key: &str) -> Result<bool> {
        let mut types = store.pos_types()?;
        let before = types.len();
        types.retain(|pt| pt.key != key);
        if types.len() == before {
            return Ok(false);
        }
        store.save_pos_types(&types)?;
        Ok(true)
    }

    /// Rename a key across every word's pairs, then persist words and registry.
    pub fn rename_key<B: KvBackend>(
        store: &Store<B>,
        old: &PosKey,
        new: &PosKey,
        updates: PosTypeUpdate,
    ) -> Result<PosRename> {
        let renamed = rename_pos_key(old, new, updates, store.words()?, store.pos_types()?)?;
        store.save_words(&renamed.words)?;
        store.save_pos_types(&renamed.pos_types)?;
        log::info!("Renamed part of speech '{}' -> '{}' ({} word(s))", old, new, renamed.words_rewritten);
        Ok(renamed)
    }

    pub fn initialize_defaults<B: KvBackend>(store: &Store<B>) -> Result<Vec<PosType>> {
        let existing = store.pos_types()?;
        if !existing.is_empty() {
            return Ok(existing);
        }
        let defaults = default_pos_types();
        store.save_pos_types(&defaults)?;
        Ok(defaults)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryKv;
    use crate::model::{Connection, PosDefinitionPair, WordDraft};

    fn rel(s: &str) -> RelationKey {
        RelationKey::parse(s).unwrap()
    }

    fn setup() -> (Store<MemoryKv>, RelationRegistry) {
        let store = Store::new(MemoryKv::new());
        let registry = RelationRegistry::new(Duration::from_secs(60));
        registry.initialize_defaults(&store).unwrap();
        (store, registry)
    }

    #[test]
    fn test_initialize_defaults_only_seeds_empty_registry() {
        let (store, registry) = setup();
        registry.delete(&store, "compound").unwrap();
        let types = registry.initialize_defaults(&store).unwrap();
        assert!(types.iter().all(|rt| rt.key != "compound"));
    }

    #[test]
    fn test_symmetric_queries() {
        let (store, registry) = setup();
        assert!(registry.is_symmetric(&store, "synonym").unwrap());
        assert!(!registry.is_symmetric(&store, "hypernym").unwrap());
        assert!(!registry.is_symmetric(&store, "unknown").unwrap());
        let keys = registry.symmetric_keys(&store).unwrap();
        assert!(keys.contains("synonym"));
        assert!(keys.contains("antonym"));
    }

    #[test]
    fn test_mutation_invalidates_cache() {
        let (store, registry) = setup();
        // Warm the cache, then mutate through the registry.
        assert!(registry.get(&store, "meronym").unwrap().is_some());
        registry
            .upsert(&store, RelationType::new(rel("meronym"), "Part of", "#000").symmetric())
            .unwrap();
        assert!(registry.is_symmetric(&store, "meronym").unwrap());

        registry.delete(&store, "meronym").unwrap();
        assert!(registry.get(&store, "meronym").unwrap().is_none());
    }

    #[test]
    fn test_cache_serves_stale_reads_until_ttl_for_external_writes() {
        let (store, registry) = setup();
        let before = registry.list(&store).unwrap().len();
        // Writing behind the registry's back is only visible after invalidation.
        store.save_relation_types(&[]).unwrap();
        assert_eq!(registry.list(&store).unwrap().len(), before);
        registry.invalidate();
        assert!(registry.list(&store).unwrap().is_empty());
    }

    #[test]
    fn test_add_rejects_duplicate_key() {
        let (store, registry) = setup();
        let result = registry.add(&store, RelationType::new(rel("synonym"), "Dup", "#000"));
        assert!(matches!(result, Err(LexgraphError::DuplicateKey(_))));
    }

    #[test]
    fn test_update_missing_type_is_noop() {
        let (store, registry) = setup();
        assert!(!registry.update(&store, "nope", RelationTypeUpdate::default()).unwrap());
        assert!(!registry.delete(&store, "nope").unwrap());
    }

    #[test]
    fn test_rename_key_persists_cascade() {
        let (store, registry) = setup();
        store.insert_connection(Connection::new("dog", "canine", rel("hypernym"))).unwrap();
        store.insert_connection(Connection::new("canine", "dog", rel("hyponym"))).unwrap();
        registry.list(&store).unwrap();

        registry
            .rename_key(&store, &rel("hypernym"), &rel("broader"), RelationTypeUpdate::default())
            .unwrap();

        let connections = store.connections().unwrap();
        assert!(connections.iter().all(|c| c.relation != "hypernym"));
        let hypo = registry.get(&store, "hyponym").unwrap().unwrap();
        assert_eq!(hypo.pair_with.unwrap(), "broader");
        assert!(registry.get(&store, "broader").unwrap().is_some());
        assert!(registry.get(&store, "hypernym").unwrap().is_none());
    }

    #[test]
    fn test_default_active_keys_falls_back_to_all() {
        let (store, registry) = setup();
        let all = registry.default_active_keys(&store).unwrap();
        assert_eq!(all.len(), default_relation_types().len());

        for rt in default_relation_types() {
            registry
                .update(
                    &store,
                    rt.key.as_str(),
                    RelationTypeUpdate {
                        default_active: Some(rt.key == "synonym"),
                        ..Default::default()
                    },
                )
                .unwrap();
        }
        let active = registry.default_active_keys(&store).unwrap();
        assert_eq!(active.len(), 1);
        assert!(active.contains("synonym"));
    }

    #[test]
    fn test_pos_registry_rename_cascades_into_words() {
        let store = Store::new(MemoryKv::new());
        PosRegistry::initialize_defaults(&store).unwrap();
        let noun = PosKey::parse("noun").unwrap();
        store
            .add_word(WordDraft::new("dog").with_id("dog").with_pos_definition(Some(noun.clone()), Some("animal")))
            .unwrap();

        let substantive = PosKey::parse("substantive").unwrap();
        let renamed = PosRegistry::rename_key(&store, &noun, &substantive, PosTypeUpdate::default()).unwrap();
        assert_eq!(renamed.words_rewritten, 1);

        let dog = store.get_word("dog").unwrap().unwrap();
        assert_eq!(
            dog.pos_definitions,
            vec![PosDefinitionPair::new(Some(substantive), Some("animal"))]
        );
        let keys: Vec<String> = PosRegistry::list(&store).unwrap().iter().map(|pt| pt.key.to_string()).collect();
        assert!(keys.contains(&"substantive".to_string()));
        assert!(!keys.contains(&"noun".to_string()));
    }

    #[test]
    fn test_pos_registry_crud() {
        let store = Store::new(MemoryKv::new());
        let adj = PosKey::parse("adj").unwrap();
        PosRegistry::add(&store, PosType::new(adj.clone(), "Adjective")).unwrap();
        assert!(PosRegistry::add(&store, PosType::new(adj, "Again")).is_err());
        assert!(PosRegistry::update(
            &store,
            "adj",
            PosTypeUpdate {
                abbreviation: Some(Some("adj.".to_string())),
                ..Default::default()
            }
        )
        .unwrap());
        assert_eq!(PosRegistry::list(&store).unwrap()[0].display_label(), "Adjective (adj.)");
        assert!(PosRegistry::delete(&store, "adj").unwrap());
        assert!(!PosRegistry::delete(&store, "adj").unwrap());
    }
}
