//! Persisted intermediate format.
//!
//! One JSON array per line:
//!
//! ```text
//! [title, [[pos, [definitions, synonyms, antonyms, related_terms]], ...]]
//! ```
//!
//! Each group is a list of items and each item the literal source of its
//! tokens. Nothing is normalized here; that happens when the lexicon loads.

use serde::{Deserialize, Serialize};

use crate::classify::{classify, language_sections, PartOfSpeech, PosSection};
use crate::markup::{Document, Node, Section};
use crate::walker::{segment_items, Bullet};

/// Token sources of one item.
pub type RawItem = Vec<String>;

/// `[definitions, synonyms, antonyms, related_terms]`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawGroups(
    pub Vec<RawItem>,
    pub Vec<RawItem>,
    pub Vec<RawItem>,
    pub Vec<RawItem>,
);

impl RawGroups {
    pub fn definitions(&self) -> &[RawItem] {
        &self.0
    }

    pub fn synonyms(&self) -> &[RawItem] {
        &self.1
    }

    pub fn antonyms(&self) -> &[RawItem] {
        &self.2
    }

    pub fn related_terms(&self) -> &[RawItem] {
        &self.3
    }
}

/// `[pos, groups]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawPosEntry(pub PartOfSpeech, pub RawGroups);

/// `[title, [entry, ...]]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawRecord(pub String, pub Vec<RawPosEntry>);

impl RawRecord {
    pub fn title(&self) -> &str {
        &self.0
    }

    pub fn entries(&self) -> &[RawPosEntry] {
        &self.1
    }
}

fn raw_items(nodes: &[Node], bullet: Bullet) -> Vec<RawItem> {
    segment_items(nodes, bullet)
        .into_iter()
        .map(|item| item.iter().map(Node::to_string).collect())
        .collect()
}

/// Items of every relation section in order, concatenated.
fn relation_items(sections: &[Section<'_>]) -> Vec<RawItem> {
    sections
        .iter()
        .flat_map(|section| raw_items(section.body(), Bullet::Bulleted))
        .collect()
}

fn raw_pos_entry(pos_section: &PosSection<'_>) -> RawPosEntry {
    RawPosEntry(
        pos_section.pos,
        RawGroups(
            raw_items(pos_section.section.body(), Bullet::Numbered),
            relation_items(&pos_section.synonyms),
            relation_items(&pos_section.antonyms),
            relation_items(&pos_section.related_terms),
        ),
    )
}

/// Extract the raw record of one page, or `None` if it has no German
/// adjective, verb, adverb or noun section.
pub fn extract_record(title: &str, text: &str) -> Option<RawRecord> {
    let document = Document::parse(text);
    let entries: Vec<RawPosEntry> = language_sections(&document)
        .iter()
        .flat_map(classify)
        .map(|pos_section| raw_pos_entry(&pos_section))
        .collect();

    if entries.is_empty() {
        return None;
    }
    Some(RawRecord(title.to_string(), entries))
}

/// Classify every token of every item back into nodes.
pub fn parse_items(items: &[RawItem]) -> Vec<Vec<Node>> {
    items
        .iter()
        .map(|item| item.iter().map(|token| Node::from_source(token)).collect())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const PAGE: &str = "\
==German==
===Verb===
{{de-verb}}

# to [[run]]
#: {{ux|de|Er läuft.}}
# {{lb|de|of water}} to flow

====Synonyms====
* {{l|de|rennen}}
====Synonyms====
* {{l|de|eilen}}

====Antonyms====
* {{l|de|stehen}}

----

==Dutch==
===Verb===
{{nl-verb}}
# to walk
";

    fn strings(items: &[&[&str]]) -> Vec<RawItem> {
        items
            .iter()
            .map(|item| item.iter().map(|t| t.to_string()).collect())
            .collect()
    }

    #[test]
    fn extracts_raw_groups_for_german_sections() {
        let record = extract_record("laufen", PAGE).expect("record");
        assert_eq!(record.title(), "laufen");
        assert_eq!(record.entries().len(), 1);

        let RawPosEntry(pos, groups) = &record.entries()[0];
        assert_eq!(*pos, PartOfSpeech::Verb);
        assert_eq!(
            groups.definitions(),
            strings(&[
                &["\n", "{{de-verb}}", "\n\n"],
                &["#", " to ", "[[run]]", "\n"],
                &["#", ":", " ", "{{ux|de|Er läuft.}}", "\n"],
                &["#", " ", "{{lb|de|of water}}", " to flow\n\n"],
            ])
            .as_slice()
        );
        // The newline after each heading is an item of its own; the relation
        // normalizer drops it later for lacking a bullet.
        assert_eq!(
            groups.synonyms(),
            strings(&[
                &["\n"],
                &["*", " ", "{{l|de|rennen}}", "\n"],
                &["\n"],
                &["*", " ", "{{l|de|eilen}}", "\n\n"],
            ])
            .as_slice()
        );
        assert_eq!(
            groups.antonyms(),
            strings(&[&["\n"], &["*", " ", "{{l|de|stehen}}", "\n\n", "----", "\n\n"]]).as_slice()
        );
        assert!(groups.related_terms().is_empty());
    }

    #[test]
    fn page_without_german_entries_has_no_record() {
        assert_eq!(extract_record("lopen", "==Dutch==\n===Verb===\n# to walk\n"), None);
        assert_eq!(extract_record("x", "==German==\n===Interjection===\n# ah\n"), None);
    }

    #[test]
    fn serializes_as_nested_arrays() {
        let record = RawRecord(
            "gut".to_string(),
            vec![RawPosEntry(
                PartOfSpeech::Adjective,
                RawGroups(vec![vec!["#".to_string(), " good".to_string()]], vec![], vec![], vec![]),
            )],
        );
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r##"["gut",[["adjective",[[["#"," good"]],[],[],[]]]]]"##);

        let back: RawRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn unknown_part_of_speech_is_rejected() {
        let json = r#"["x",[["pronoun",[[],[],[],[]]]]]"#;
        assert!(serde_json::from_str::<RawRecord>(json).is_err());
    }

    #[test]
    fn parse_items_recovers_nodes() {
        let items = strings(&[&["#", " ", "{{l|en|run}}"]]);
        let nodes = parse_items(&items);
        assert!(nodes[0][0].is_marker('#'));
        assert!(matches!(&nodes[0][2], Node::Template(t) if t.is_for("l", "en")));
    }
}
