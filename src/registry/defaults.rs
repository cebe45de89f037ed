//! Built-in relation and part-of-speech catalogs used to seed empty registries.

use crate::model::{ArrowStyle, LineStyle, PosKey, PosType, RelationKey, RelationType};

// (key, label, color, line, arrow, pair_with)
const RELATIONS: &[(&str, &str, &str, LineStyle, ArrowStyle, Option<&str>)] = &[
    ("hypernym", "Hypernym", "#e74c3c", LineStyle::Solid, ArrowStyle::Filled, Some("hyponym")),
    ("hyponym", "Hyponym", "#3498db", LineStyle::Solid, ArrowStyle::Filled, Some("hypernym")),
    ("synonym", "Synonym", "#2ecc71", LineStyle::Dashed, ArrowStyle::Line, Some("synonym")),
    ("antonym", "Antonym", "#f39c12", LineStyle::Dotted, ArrowStyle::Line, Some("antonym")),
    ("meronym", "Meronym", "#9b59b6", LineStyle::Solid, ArrowStyle::Hollow, Some("holonym")),
    ("holonym", "Holonym", "#1abc9c", LineStyle::Solid, ArrowStyle::Hollow, Some("meronym")),
    ("compound", "Compound", "#e67e22", LineStyle::Dashed, ArrowStyle::Filled, None),
];

// (key, label, abbreviation, description)
const POS: &[(&str, &str, &str, &str)] = &[
    ("noun", "Noun", "n.", "A person, thing, place, or abstract idea"),
    ("verb", "Verb", "v.", "An action or state"),
    ("adjective", "Adjective", "adj.", "Describes or modifies a noun"),
    ("adverb", "Adverb", "adv.", "Modifies a verb, adjective, or other adverb"),
    ("conjunction", "Conjunction", "conj.", "Joins words, phrases, or clauses"),
    ("preposition", "Preposition", "prep.", "Relates a noun to other words"),
    ("pronoun", "Pronoun", "pron.", "Stands in for a noun or noun phrase"),
    ("interjection", "Interjection", "int.", "Expresses emotion or exclamation"),
    ("verb_transitive", "Transitive verb", "vt.", "A verb that takes an object"),
    ("verb_intransitive", "Intransitive verb", "vi.", "A verb that takes no object"),
];

pub fn default_relation_types() -> Vec<RelationType> {
    RELATIONS
        .iter()
        .filter_map(|(key, label, color, line_style, arrow_style, pair_with)| {
            let key = RelationKey::parse(key).ok()?;
            let mut rt = RelationType::new(key, *label, *color);
            rt.line_style = *line_style;
            rt.arrow_style = *arrow_style;
            rt.pair_with = pair_with.and_then(|p| RelationKey::parse(p).ok());
            Some(rt)
        })
        .collect()
}

pub fn default_pos_types() -> Vec<PosType> {
    POS.iter()
        .filter_map(|(key, label, abbreviation, description)| {
            let mut pt = PosType::new(PosKey::parse(key).ok()?, *label);
            pt.abbreviation = Some(abbreviation.to_string());
            pt.description = Some(description.to_string());
            Some(pt)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Pairing, PairingRules};

    #[test]
    fn test_default_relations_are_complete() {
        let types = default_relation_types();
        assert_eq!(types.len(), RELATIONS.len());

        let rules = PairingRules::from_types(&types);
        assert_eq!(rules.pairing("hypernym"), Pairing::Reverse(RelationKey::parse("hyponym").unwrap()));
        assert_eq!(rules.pairing("holonym"), Pairing::Reverse(RelationKey::parse("meronym").unwrap()));
        assert!(rules.is_symmetric("synonym"));
        assert!(rules.is_symmetric("antonym"));
        assert_eq!(rules.pairing("compound"), Pairing::Unpaired);
    }

    #[test]
    fn test_default_pairs_point_at_existing_keys() {
        let types = default_relation_types();
        for rt in &types {
            if let Some(pair) = &rt.pair_with {
                assert!(types.iter().any(|other| &other.key == pair), "{} pairs with missing {}", rt.key, pair);
            }
        }
    }

    #[test]
    fn test_default_pos_types() {
        let types = default_pos_types();
        assert_eq!(types.len(), POS.len());
        assert_eq!(types[0].display_label(), "Noun (n.)");
    }
}
