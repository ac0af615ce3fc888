//! Locates part-of-speech and relation sections inside a language section.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::markup::{Document, Section};

/// Language heading whose entries are extracted.
pub const TARGET_LANGUAGE: &str = "German";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartOfSpeech {
    Adjective,
    Verb,
    Adverb,
    Noun,
}

impl PartOfSpeech {
    /// Classification order, also the order entries appear within a record.
    pub const ALL: [PartOfSpeech; 4] = [
        PartOfSpeech::Adjective,
        PartOfSpeech::Verb,
        PartOfSpeech::Adverb,
        PartOfSpeech::Noun,
    ];

    /// Section heading for this part of speech.
    pub fn heading(self) -> &'static str {
        match self {
            PartOfSpeech::Adjective => "Adjective",
            PartOfSpeech::Verb => "Verb",
            PartOfSpeech::Adverb => "Adverb",
            PartOfSpeech::Noun => "Noun",
        }
    }

    /// Prefix of the head-line template a well-formed section starts with.
    pub fn marker_template(self) -> &'static str {
        match self {
            PartOfSpeech::Adjective => "de-adj",
            PartOfSpeech::Verb => "de-verb",
            PartOfSpeech::Adverb => "de-adv",
            PartOfSpeech::Noun => "de-noun",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PartOfSpeech::Adjective => "adjective",
            PartOfSpeech::Verb => "verb",
            PartOfSpeech::Adverb => "adverb",
            PartOfSpeech::Noun => "noun",
        }
    }
}

impl fmt::Display for PartOfSpeech {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for PartOfSpeech {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PartOfSpeech::ALL
            .into_iter()
            .find(|pos| pos.as_str() == s)
            .ok_or_else(|| format!("unknown part of speech '{}'", s))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Synonyms,
    Antonyms,
    RelatedTerms,
}

impl Relation {
    pub fn heading(self) -> &'static str {
        match self {
            Relation::Synonyms => "Synonyms",
            Relation::Antonyms => "Antonyms",
            Relation::RelatedTerms => "Related terms",
        }
    }
}

/// One part-of-speech section and the relation sections nested below it.
///
/// Relation groups are empty, never absent, when the section has none.
#[derive(Debug, Clone)]
pub struct PosSection<'a> {
    pub pos: PartOfSpeech,
    pub section: Section<'a>,
    pub synonyms: Vec<Section<'a>>,
    pub antonyms: Vec<Section<'a>>,
    pub related_terms: Vec<Section<'a>>,
}

impl<'a> PosSection<'a> {
    fn new(pos: PartOfSpeech, section: Section<'a>) -> Self {
        PosSection {
            pos,
            section,
            synonyms: section.sections_titled(Relation::Synonyms.heading()),
            antonyms: section.sections_titled(Relation::Antonyms.heading()),
            related_terms: section.sections_titled(Relation::RelatedTerms.heading()),
        }
    }

    pub fn relation(&self, relation: Relation) -> &[Section<'a>] {
        match relation {
            Relation::Synonyms => &self.synonyms,
            Relation::Antonyms => &self.antonyms,
            Relation::RelatedTerms => &self.related_terms,
        }
    }
}

/// Every section of the page headed exactly by the target language.
pub fn language_sections(document: &Document) -> Vec<Section<'_>> {
    document.root().sections_titled(TARGET_LANGUAGE)
}

/// Find the part-of-speech sections of one language section.
///
/// Sections are grouped by part of speech in [`PartOfSpeech::ALL`] order and
/// keep source order within a group. A label appearing several times (one per
/// etymology, say) yields one `PosSection` per occurrence.
pub fn classify<'a>(language: &Section<'a>) -> Vec<PosSection<'a>> {
    PartOfSpeech::ALL
        .into_iter()
        .flat_map(|pos| {
            language
                .sections_titled(pos.heading())
                .into_iter()
                .map(move |section| PosSection::new(pos, section))
        })
        .collect()
}
