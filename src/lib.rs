//! German lexical entries from a Wiktionary dump.
//!
//! Extraction walks each page's markup, keeps the German adjective, verb,
//! adverb and noun sections and stores their raw items as JSON lines. Loading
//! those records with a frequency list normalizes the items into display
//! fragments and lists them per part of speech, most frequent first.

pub mod classify;
pub mod config;
pub mod dump;
pub mod entry;
pub mod error;
pub mod extract;
pub mod frequency;
pub mod lexicon;
pub mod markup;
pub mod normalize;
pub mod parallel;
pub mod record;
pub mod walker;

pub use classify::PartOfSpeech;
pub use config::Config;
pub use dump::{open_dump, PageOutcome, Stats};
pub use entry::{build_entry, EntryError, Gender, WordEntry};
pub use error::{ConfigError, LoadError};
pub use extract::run_sequential;
pub use lexicon::Lexicon;
pub use normalize::{Fragment, Linker};
pub use parallel::{process_channel_pipeline, ParallelConfig};
pub use record::{extract_record, RawRecord};
