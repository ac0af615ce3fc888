//! Assembles one [`WordEntry`] from a headword and its raw item groups.

use serde::Serialize;

use crate::classify::PartOfSpeech;
use crate::markup::{Node, Template};
use crate::normalize::{normalize_definition_item, normalize_relation_item, Fragment, Linker};

/// Grammatical gender as written in `{{de-noun}}`.
///
/// Plural-only nouns (`p`) take the same article as feminine ones; the code is
/// kept on the entry so the two stay distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Masculine,
    Neuter,
    Feminine,
    Plural,
}

impl Gender {
    pub fn from_code(code: &str) -> Option<Gender> {
        match code {
            "m" => Some(Gender::Masculine),
            "n" => Some(Gender::Neuter),
            "f" => Some(Gender::Feminine),
            "p" => Some(Gender::Plural),
            _ => None,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Gender::Masculine => "m",
            Gender::Neuter => "n",
            Gender::Feminine => "f",
            Gender::Plural => "p",
        }
    }

    pub fn article(self) -> &'static str {
        match self {
            Gender::Masculine => "der",
            Gender::Neuter => "das",
            Gender::Feminine | Gender::Plural => "die",
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum EntryError {
    #[error("unknown gender code '{code}' for noun '{word}'")]
    UnknownGender { word: String, code: String },
}

/// One extracted (headword, part of speech) entry, ready for display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WordEntry {
    pub headword: String,
    pub pos: PartOfSpeech,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    pub word: Fragment,
    pub definitions: Vec<Fragment>,
    pub synonyms: Vec<Fragment>,
    pub antonyms: Vec<Fragment>,
    pub related_words: Vec<Fragment>,
}

/// The head-line template of the first item, if it is the one `pos` expects.
fn grammar_marker(first_item: &[Node], pos: PartOfSpeech) -> Option<&Template> {
    match first_item.iter().find(|node| !node.is_blank()) {
        Some(Node::Template(template)) if template.name.starts_with(pos.marker_template()) => {
            Some(template)
        }
        _ => None,
    }
}

fn normalize_relations(items: &[Vec<Node>], linker: &Linker) -> Vec<Fragment> {
    items
        .iter()
        .filter_map(|item| normalize_relation_item(item, linker))
        .collect()
}

/// Build the entry for `word` as `pos`.
///
/// `Ok(None)` when the section has the wrong shape: fewer than two definition
/// items, a first item without the expected `{{de-...}}` head template, or no
/// usable definition left after normalization. A noun whose gender code is
/// not one of `m`, `n`, `f`, `p` is an error.
pub fn build_entry(
    word: &str,
    pos: PartOfSpeech,
    definition_items: &[Vec<Node>],
    synonym_items: &[Vec<Node>],
    antonym_items: &[Vec<Node>],
    related_items: &[Vec<Node>],
    linker: &Linker,
) -> Result<Option<WordEntry>, EntryError> {
    let [first, rest @ ..] = definition_items else {
        return Ok(None);
    };
    if rest.is_empty() {
        return Ok(None);
    }
    let Some(marker) = grammar_marker(first, pos) else {
        return Ok(None);
    };

    let (gender, rendered_word) = match pos {
        PartOfSpeech::Noun => {
            let code = marker.param(1).unwrap_or_default();
            let gender = Gender::from_code(code).ok_or_else(|| EntryError::UnknownGender {
                word: word.to_string(),
                code: code.to_string(),
            })?;
            let html = format!(
                "<i>{}</i> <span class=\"gender-{}\">{}</span>",
                gender.article(),
                gender.code(),
                linker.link(word)
            );
            (Some(gender), Fragment::from_trusted(html))
        }
        PartOfSpeech::Adjective | PartOfSpeech::Verb | PartOfSpeech::Adverb => {
            (None, linker.link(word))
        }
    };

    let definitions: Vec<Fragment> = rest
        .iter()
        .filter_map(|item| normalize_definition_item(item))
        .collect();
    if definitions.is_empty() {
        return Ok(None);
    }

    Ok(Some(WordEntry {
        headword: word.to_string(),
        pos,
        gender,
        word: rendered_word,
        definitions,
        synonyms: normalize_relations(synonym_items, linker),
        antonyms: normalize_relations(antonym_items, linker),
        related_words: normalize_relations(related_items, linker),
    }))
}
