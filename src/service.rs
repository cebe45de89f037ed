//! Async front for the lexicon.
//!
//! Storage calls run on the blocking pool. Reads wait out a configurable
//! artificial latency first; it carries no ordering meaning.

use std::sync::Arc;
use std::time::Duration;

use tokio::task;

use crate::consistency::{LinkOutcome, RelationMap, ReplaceReport};
use crate::db::KvBackend;
use crate::error::{LexgraphError, Result};
use crate::graph::GraphData;
use crate::lexicon::Lexicon;
use crate::model::{RelationKey, RelationType, Word};
use crate::store::WordDeletion;

pub struct LexiconService<B: KvBackend + 'static> {
    lexicon: Arc<Lexicon<B>>,
    latency: Duration,
}

impl<B: KvBackend + 'static> Clone for LexiconService<B> {
    fn clone(&self) -> Self {
        Self {
            lexicon: Arc::clone(&self.lexicon),
            latency: self.latency,
        }
    }
}

impl<B: KvBackend + 'static> LexiconService<B> {
    pub fn new(lexicon: Lexicon<B>, latency: Duration) -> Self {
        Self {
            lexicon: Arc::new(lexicon),
            latency,
        }
    }

    pub fn lexicon(&self) -> &Lexicon<B> {
        &self.lexicon
    }

    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&Lexicon<B>) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let lexicon = Arc::clone(&self.lexicon);
        task::spawn_blocking(move || f(lexicon.as_ref()))
            .await
            .map_err(|e| LexgraphError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Build with configured bounds and record the query.
    pub async fn search(&self, query: &str) -> Result<GraphData> {
        self.simulate_latency().await;
        let query = query.to_string();
        self.run(move |lexicon| lexicon.search(&query)).await
    }

    pub async fn build(&self, query: &str, max_depth: usize, max_nodes: usize) -> Result<GraphData> {
        self.simulate_latency().await;
        let query = query.to_string();
        self.run(move |lexicon| lexicon.build(&query, max_depth, max_nodes)).await
    }

    pub async fn get_word(&self, id: &str) -> Result<Option<Word>> {
        self.simulate_latency().await;
        let id = id.to_string();
        self.run(move |lexicon| lexicon.get_word(&id)).await
    }

    pub async fn list_relation_types(&self) -> Result<Vec<RelationType>> {
        self.run(|lexicon| Ok(lexicon.list_relation_types()?.as_ref().clone())).await
    }

    pub async fn replace_word_relations(&self, word_id: &str, relations: RelationMap) -> Result<ReplaceReport> {
        let word_id = word_id.to_string();
        self.run(move |lexicon| lexicon.replace_word_relations(&word_id, &relations))
            .await
    }

    pub async fn add_connection(&self, source: &str, target: &str, relation: RelationKey) -> Result<LinkOutcome> {
        let (source, target) = (source.to_string(), target.to_string());
        self.run(move |lexicon| lexicon.add_connection(&source, &target, &relation))
            .await
    }

    pub async fn delete_connection(&self, id: &str) -> Result<usize> {
        let id = id.to_string();
        self.run(move |lexicon| Ok(lexicon.delete_connection(&id)?.len())).await
    }

    pub async fn delete_word(&self, id: &str) -> Result<WordDeletion> {
        let id = id.to_string();
        self.run(move |lexicon| lexicon.delete_word(&id)).await
    }
}
