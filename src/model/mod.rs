//! Persisted records: words, connections, relation types, part-of-speech types.

mod keys;
mod pos;
mod relation;
mod word;

pub use keys::{PosKey, RelationKey};
pub use pos::{format_pos_definitions, PosDefinitionLine, PosType, PosTypeUpdate};
pub use relation::{
    ArrowStyle, Connection, LineStyle, Pairing, PairingRules, RelationType, RelationTypeUpdate,
};
pub use word::{PosDefinitionPair, Word, WordDraft, WordPatch};
