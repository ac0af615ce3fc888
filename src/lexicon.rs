//! Frequency-ordered listings of extracted entries.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use unicode_normalization::UnicodeNormalization;

use crate::classify::PartOfSpeech;
use crate::entry::{build_entry, WordEntry};
use crate::error::LoadError;
use crate::frequency::load_frequency;
use crate::normalize::Linker;
use crate::record::{parse_items, RawPosEntry, RawRecord};

/// Read a record file into a map keyed by NFC title.
///
/// A later record with the same title replaces the earlier one. Blank lines
/// are skipped.
pub fn load_records(reader: impl BufRead) -> Result<HashMap<String, RawRecord>, LoadError> {
    let mut records = HashMap::new();
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let record: RawRecord = serde_json::from_str(&line).map_err(|source| LoadError::Json {
            line: index + 1,
            source,
        })?;
        records.insert(record.title().nfc().collect::<String>(), record);
    }
    tracing::debug!(records = records.len(), "loaded extracted records");
    Ok(records)
}

fn open(path: &Path) -> Result<BufReader<File>, LoadError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| LoadError::Open {
            path: path.to_path_buf(),
            source,
        })
}

/// Entries grouped by part of speech, each group in frequency order.
#[derive(Debug, Default)]
pub struct Lexicon {
    adjectives: Vec<WordEntry>,
    verbs: Vec<WordEntry>,
    adverbs: Vec<WordEntry>,
    nouns: Vec<WordEntry>,
}

impl Lexicon {
    /// Build the listings for every ranked headword that has a record.
    ///
    /// Headwords without a record are never listed. Entries that fail to
    /// build are logged and left out.
    pub fn build(records: &HashMap<String, RawRecord>, ranking: &[String], linker: &Linker) -> Self {
        let mut lexicon = Lexicon::default();
        let mut dropped = 0usize;

        for headword in ranking {
            let key: String = headword.nfc().collect();
            let Some(record) = records.get(&key) else {
                continue;
            };
            for RawPosEntry(pos, groups) in record.entries() {
                let result = build_entry(
                    record.title(),
                    *pos,
                    &parse_items(groups.definitions()),
                    &parse_items(groups.synonyms()),
                    &parse_items(groups.antonyms()),
                    &parse_items(groups.related_terms()),
                    linker,
                );
                match result {
                    Ok(Some(entry)) => lexicon.bucket_mut(*pos).push(entry),
                    Ok(None) => {
                        dropped += 1;
                        tracing::debug!(word = %record.title(), %pos, "section has no usable entry");
                    }
                    Err(e) => {
                        dropped += 1;
                        tracing::warn!(%pos, "dropping entry: {}", e);
                    }
                }
            }
        }

        tracing::info!(
            adjectives = lexicon.adjectives.len(),
            verbs = lexicon.verbs.len(),
            adverbs = lexicon.adverbs.len(),
            nouns = lexicon.nouns.len(),
            dropped,
            "lexicon built"
        );
        lexicon
    }

    /// Load both inputs from readers and build.
    pub fn load(words: impl BufRead, freqs: impl BufRead, linker: &Linker) -> Result<Self, LoadError> {
        let records = load_records(words)?;
        let ranking = load_frequency(freqs)?;
        Ok(Lexicon::build(&records, &ranking, linker))
    }

    pub fn load_files(words_path: &Path, freqs_path: &Path, linker: &Linker) -> Result<Self, LoadError> {
        Lexicon::load(open(words_path)?, open(freqs_path)?, linker)
    }

    fn bucket_mut(&mut self, pos: PartOfSpeech) -> &mut Vec<WordEntry> {
        match pos {
            PartOfSpeech::Adjective => &mut self.adjectives,
            PartOfSpeech::Verb => &mut self.verbs,
            PartOfSpeech::Adverb => &mut self.adverbs,
            PartOfSpeech::Noun => &mut self.nouns,
        }
    }

    pub fn entries(&self, pos: PartOfSpeech) -> &[WordEntry] {
        match pos {
            PartOfSpeech::Adjective => &self.adjectives,
            PartOfSpeech::Verb => &self.verbs,
            PartOfSpeech::Adverb => &self.adverbs,
            PartOfSpeech::Noun => &self.nouns,
        }
    }

    pub fn adjectives(&self) -> &[WordEntry] {
        &self.adjectives
    }

    pub fn verbs(&self) -> &[WordEntry] {
        &self.verbs
    }

    pub fn adverbs(&self) -> &[WordEntry] {
        &self.adverbs
    }

    pub fn nouns(&self) -> &[WordEntry] {
        &self.nouns
    }
}
