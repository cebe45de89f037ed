pub mod cache;
pub mod config;
pub mod consistency;
pub mod db;
pub mod error;
pub mod graph;
pub mod history;
pub mod lexicon;
pub mod model;
pub mod registry;
pub mod service;
pub mod store;

pub use config::Config;
pub use error::{LexgraphError, Result};
pub use graph::{build_graph, BuildOptions, GraphData, RenderEdge, RenderNode};
pub use lexicon::Lexicon;
pub use service::LexiconService;
