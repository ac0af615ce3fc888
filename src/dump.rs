//! Streaming access to a Wiktionary XML dump.

use bzip2::read::BzDecoder;
use html_escape::decode_html_entities;
use lazy_static::lazy_static;
use regex::Regex;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use crate::record::{extract_record, RawRecord};

lazy_static! {
    static ref TITLE_PATTERN: Regex = Regex::new(r"<title>([^<]+)</title>").unwrap();
    static ref NS_PATTERN: Regex = Regex::new(r"<ns>(\d+)</ns>").unwrap();
    static ref TEXT_PATTERN: Regex = Regex::new(r"(?s)<text[^>]*>(.+?)</text>").unwrap();
    static ref REDIRECT_PATTERN: Regex = Regex::new(r#"<redirect\s+title="[^"]+""#).unwrap();
}

const READ_CHUNK: usize = 1024 * 1024;
const READER_CAPACITY: usize = 256 * 1024;

/// Title and markup of one main-namespace page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DumpPage {
    pub title: String,
    pub text: String,
}

/// What became of one `<page>` block.
#[derive(Debug, Clone, PartialEq)]
pub enum PageOutcome {
    Record(RawRecord),
    /// Page with no German adjective/verb/adverb/noun section.
    NoEntries,
    Redirect,
    /// Talk, template, category and other non-article namespaces.
    OtherNamespace,
    /// No `<title>` or no `<text>` body.
    Malformed,
}

#[derive(Debug, Default, Clone)]
pub struct Stats {
    pub pages_processed: usize,
    pub records_written: usize,
    pub entries_written: usize,
    pub redirects: usize,
    pub other_namespace: usize,
    pub no_entries: usize,
    pub malformed: usize,
    pub elapsed: Duration,
}

impl Stats {
    /// Count one page outcome. Records are counted by the writer.
    pub fn record_outcome(&mut self, outcome: &PageOutcome) {
        self.pages_processed += 1;
        match outcome {
            PageOutcome::Record(_) => {}
            PageOutcome::NoEntries => self.no_entries += 1,
            PageOutcome::Redirect => self.redirects += 1,
            PageOutcome::OtherNamespace => self.other_namespace += 1,
            PageOutcome::Malformed => self.malformed += 1,
        }
    }
}

/// Open a dump file, decompressing `.bz2` transparently.
pub fn open_dump(path: &Path) -> std::io::Result<Box<dyn BufRead + Send>> {
    let file = File::open(path)?;
    let reader: Box<dyn BufRead + Send> = if path.to_string_lossy().ends_with(".bz2") {
        Box::new(BufReader::with_capacity(READER_CAPACITY, BzDecoder::new(file)))
    } else {
        Box::new(BufReader::with_capacity(READER_CAPACITY, file))
    };
    Ok(reader)
}

/// Feed every complete `<page>...</page>` block to `callback`, in order.
///
/// Only the current chunk and at most one partial page are buffered. Stops
/// early when the callback returns `false`.
pub fn scan_pages(
    mut reader: impl BufRead,
    mut callback: impl FnMut(String) -> bool,
) -> std::io::Result<()> {
    let mut buffer = String::new();
    let mut chunk = vec![0u8; READ_CHUNK];
    let mut pending: Vec<u8> = Vec::new();

    loop {
        let bytes_read = reader.read(&mut chunk)?;
        if bytes_read == 0 {
            break;
        }

        // Chunks can split a multi-byte character; carry the tail over.
        pending.extend_from_slice(&chunk[..bytes_read]);
        let valid = match std::str::from_utf8(&pending) {
            Ok(_) => pending.len(),
            Err(e) if e.error_len().is_none() => e.valid_up_to(),
            Err(_) => pending.len(),
        };
        buffer.push_str(&String::from_utf8_lossy(&pending[..valid]));
        pending.drain(..valid);

        // Extract complete pages
        while let Some(start) = buffer.find("<page>") {
            if let Some(end_offset) = buffer[start..].find("</page>") {
                let end = start + end_offset + "</page>".len();
                let page_xml = buffer[start..end].to_string();
                buffer.drain(..end);

                if !callback(page_xml) {
                    return Ok(());
                }
            } else {
                buffer.drain(..start);
                break;
            }
        }

        if buffer.len() > 10 && !buffer.contains("<page>") {
            let mut keep_from = buffer.len() - 10;
            while !buffer.is_char_boundary(keep_from) {
                keep_from -= 1;
            }
            buffer.drain(..keep_from);
        }
    }

    Ok(())
}

/// Pull title and text out of one `<page>` block.
///
/// Entities are decoded, so the text is the markup as authored.
pub fn parse_page(page_xml: &str) -> Result<DumpPage, PageOutcome> {
    let title = TITLE_PATTERN
        .captures(page_xml)
        .map(|cap| decode_html_entities(&cap[1]).into_owned())
        .ok_or(PageOutcome::Malformed)?;

    if let Some(cap) = NS_PATTERN.captures(page_xml) {
        if &cap[1] != "0" {
            return Err(PageOutcome::OtherNamespace);
        }
    }

    if REDIRECT_PATTERN.is_match(page_xml) {
        return Err(PageOutcome::Redirect);
    }

    let text = TEXT_PATTERN
        .captures(page_xml)
        .map(|cap| decode_html_entities(&cap[1]).into_owned())
        .ok_or(PageOutcome::Malformed)?;

    Ok(DumpPage { title, text })
}

/// Run one `<page>` block through the whole extraction.
pub fn process_page(page_xml: &str) -> PageOutcome {
    let page = match parse_page(page_xml) {
        Ok(page) => page,
        Err(outcome) => return outcome,
    };
    match extract_record(&page.title, &page.text) {
        Some(record) => PageOutcome::Record(record),
        None => {
            tracing::trace!(title = %page.title, "no German entries");
            PageOutcome::NoEntries
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn page(title: &str, ns: u32, text: &str) -> String {
        format!(
            "<page>\n<title>{}</title>\n<ns>{}</ns>\n<id>1</id>\n<revision><text bytes=\"1\" xml:space=\"preserve\">{}</text></revision>\n</page>",
            title, ns, text
        )
    }

    #[test]
    fn scans_pages_in_order() {
        let xml = format!(
            "<mediawiki><siteinfo/>\n{}\n{}\n</mediawiki>",
            page("a", 0, "x"),
            page("b", 0, "y")
        );
        let mut seen = Vec::new();
        scan_pages(Cursor::new(xml), |p| {
            seen.push(parse_page(&p).map(|d| d.title));
            true
        })
        .unwrap();
        assert_eq!(seen, vec![Ok("a".to_string()), Ok("b".to_string())]);
    }

    #[test]
    fn scan_stops_when_callback_declines() {
        let xml = format!("{}{}{}", page("a", 0, "x"), page("b", 0, "y"), page("c", 0, "z"));
        let mut count = 0;
        scan_pages(Cursor::new(xml), |_| {
            count += 1;
            count < 2
        })
        .unwrap();
        assert_eq!(count, 2);
    }

    /// Hands out at most `step` bytes per read.
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        step: usize,
    }

    impl std::io::Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    impl BufRead for Trickle {
        fn fill_buf(&mut self) -> std::io::Result<&[u8]> {
            let end = (self.pos + self.step).min(self.data.len());
            Ok(&self.data[self.pos..end])
        }

        fn consume(&mut self, amt: usize) {
            self.pos += amt;
        }
    }

    #[test]
    fn scan_handles_pages_split_across_reads() {
        let xml = format!("{}{}", page("über", 0, "ä ö ü"), page("b", 0, "y"));
        // Odd step so multi-byte characters straddle reads.
        let reader = Trickle {
            data: xml.into_bytes(),
            pos: 0,
            step: 7,
        };
        let mut titles = Vec::new();
        scan_pages(reader, |p| {
            titles.push(parse_page(&p).unwrap().title);
            true
        })
        .unwrap();
        assert_eq!(titles, vec!["über", "b"]);
    }

    #[test]
    fn entities_are_decoded() {
        let p = page("a&amp;b", 0, "&lt;!-- c --&gt; {{l|de|x}} &quot;q&quot;");
        let parsed = parse_page(&p).unwrap();
        assert_eq!(parsed.title, "a&b");
        assert_eq!(parsed.text, "<!-- c --> {{l|de|x}} \"q\"");
    }

    #[test]
    fn non_article_namespaces_are_skipped() {
        assert_eq!(parse_page(&page("Template:x", 10, "y")), Err(PageOutcome::OtherNamespace));
    }

    #[test]
    fn redirects_are_skipped() {
        let p = "<page><title>a</title><ns>0</ns><redirect title=\"b\" /><text>#REDIRECT [[b]]</text></page>";
        assert_eq!(parse_page(p), Err(PageOutcome::Redirect));
    }

    #[test]
    fn page_without_text_is_malformed() {
        let p = "<page><title>a</title><ns>0</ns><text bytes=\"0\" /></page>";
        assert_eq!(parse_page(p), Err(PageOutcome::Malformed));
        assert_eq!(process_page("<page></page>"), PageOutcome::Malformed);
    }

    #[test]
    fn process_page_extracts_german_record() {
        let text = "==German==\n===Adverb===\n{{de-adv}}\n\n# [[quickly]]\n";
        match process_page(&page("schnell", 0, text)) {
            PageOutcome::Record(record) => assert_eq!(record.title(), "schnell"),
            other => panic!("expected record, got {:?}", other),
        }
        assert_eq!(
            process_page(&page("snel", 0, "==Dutch==\n===Adverb===\n# quickly\n")),
            PageOutcome::NoEntries
        );
    }

    #[test]
    fn stats_count_outcomes() {
        let mut stats = Stats::default();
        stats.record_outcome(&PageOutcome::Redirect);
        stats.record_outcome(&PageOutcome::NoEntries);
        stats.record_outcome(&PageOutcome::OtherNamespace);
        stats.record_outcome(&PageOutcome::Malformed);
        assert_eq!(stats.pages_processed, 4);
        assert_eq!(
            (stats.redirects, stats.no_entries, stats.other_namespace, stats.malformed),
            (1, 1, 1, 1)
        );
    }
}
