//! Part-of-speech registry entries and display helpers.

use serde::{Deserialize, Serialize};

use super::{PosDefinitionPair, PosKey};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PosType {
    pub key: PosKey,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abbreviation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PosType {
    pub fn new(key: PosKey, label: impl Into<String>) -> Self {
        Self {
            key,
            label: label.into(),
            abbreviation: None,
            description: None,
        }
    }

    /// `label (abbr)` when an abbreviation exists, otherwise the label.
    pub fn display_label(&self) -> String {
        match &self.abbreviation {
            Some(abbr) => format!("{} ({})", self.label, abbr),
            None => self.label.clone(),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct PosTypeUpdate {
    pub label: Option<String>,
    pub abbreviation: Option<Option<String>>,
    pub description: Option<Option<String>>,
}

impl PosTypeUpdate {
    pub fn apply(self, pt: &mut PosType) {
        if let Some(label) = self.label {
            pt.label = label;
        }
        if let Some(abbreviation) = self.abbreviation {
            pt.abbreviation = abbreviation;
        }
        if let Some(description) = self.description {
            pt.description = description;
        }
    }
}

/// A pos/definition pair resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PosDefinitionLine {
    pub pos_label: String,
    pub definition: String,
}

/// Resolve pos keys to registry labels. Fully empty pairs are dropped; unknown
/// keys are shown raw and missing parts as `-`.
pub fn format_pos_definitions(pairs: &[PosDefinitionPair], pos_types: &[PosType]) -> Vec<PosDefinitionLine> {
    pairs
        .iter()
        .filter(|pd| !pd.is_empty())
        .map(|pd| {
            let pos_label = match &pd.pos {
                Some(key) => pos_types
                    .iter()
                    .find(|pt| &pt.key == key)
                    .map(PosType::display_label)
                    .unwrap_or_else(|| key.to_string()),
                None => "-".to_string(),
            };
            PosDefinitionLine {
                pos_label,
                definition: pd.definition.clone().unwrap_or_else(|| "-".to_string()),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pos(s: &str) -> PosKey {
        PosKey::parse(s).unwrap()
    }

    #[test]
    fn test_format_resolves_labels() {
        let mut noun = PosType::new(pos("noun"), "Noun");
        noun.abbreviation = Some("n.".to_string());
        let pairs = vec![
            PosDefinitionPair::new(Some(pos("noun")), Some("a dog")),
            PosDefinitionPair::new(Some(pos("slang")), None),
            PosDefinitionPair::new(None, Some("undetermined")),
            PosDefinitionPair::default(),
        ];
        let lines = format_pos_definitions(&pairs, &[noun]);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].pos_label, "Noun (n.)");
        assert_eq!(lines[0].definition, "a dog");
        assert_eq!(lines[1].pos_label, "slang");
        assert_eq!(lines[1].definition, "-");
        assert_eq!(lines[2].pos_label, "-");
    }

    #[test]
    fn test_format_empty() {
        assert!(format_pos_definitions(&[], &[]).is_empty());
    }
}
