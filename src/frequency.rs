use std::collections::HashSet;
use std::io::BufRead;

use unicode_normalization::UnicodeNormalization;

use crate::error::LoadError;

/// Headwords in rank order from a `count headword` list.
///
/// Lines without exactly two whitespace-separated fields are skipped. A
/// headword listed twice keeps its first rank. Headwords come back in NFC.
pub fn load_frequency(reader: impl BufRead) -> Result<Vec<String>, LoadError> {
    let mut ranking = Vec::new();
    let mut seen = HashSet::new();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let fields: Vec<&str> = line.split_whitespace().collect();
        let [_, headword] = fields.as_slice() else {
            tracing::trace!(line = index + 1, "skipping frequency line: {:?}", line);
            continue;
        };

        let headword: String = headword.nfc().collect();
        if seen.insert(headword.clone()) {
            ranking.push(headword);
        }
    }

    tracing::debug!(headwords = ranking.len(), "loaded frequency ranking");
    Ok(ranking)
}
