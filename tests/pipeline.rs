//! Dump XML through record extraction to ranked listings.

use std::io::Cursor;

use german_words::{
    process_channel_pipeline, run_sequential, Gender, Lexicon, Linker, ParallelConfig, PartOfSpeech,
};
use pretty_assertions::assert_eq;

const LINK: &str = "https://dict.test/?q=";

fn page(title: &str, ns: u32, text: &str) -> String {
    let escaped = text
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    format!(
        "  <page>\n    <title>{}</title>\n    <ns>{}</ns>\n    <revision>\n      <text bytes=\"{}\" xml:space=\"preserve\">{}</text>\n    </revision>\n  </page>\n",
        title,
        ns,
        text.len(),
        escaped
    )
}

fn dump() -> String {
    let laufen = "\
==German==
===Pronunciation===
* {{IPA|de|/ˈlaʊ̯fn̩/}}

===Verb===
{{de-verb}}

# [[run]] {{lb|de|intransitive}} to jog
#: {{ux|de|Er läuft schnell.}}
# {{lb|de|of water}} to [[flow]]
# {{rfdef|de}}

====Synonyms====
* {{l|de|rennen}}
* {{sense|flow}} {{l|de|fließen}}

====Related terms====
* {{l|de|Lauf}}, [[Läufer]]

===Noun===
{{de-noun|g|m}}

# <!-- misplaced --> running
";
    let bank = "\
==German==
===Etymology 1===
====Noun====
{{de-noun|g|f|Bänke}}

# [[bench]]

===Etymology 2===
====Noun====
{{de-noun|g|f|Banken}}

# [[bank]] (financial institution)

=====Antonyms=====
* <b>none</b>
";
    let gehen = "==German==\n===Verb===\n{{de-verb}}\n\n# to [[go]]\n";
    let kaputt = "==German==\n===Noun===\n{{de-noun|g|q}}\n\n# thing\n";
    let english = "==English==\n===Verb===\n{{en-verb}}\n\n# to run\n";

    let mut xml = String::from("<mediawiki xmlns=\"http://www.mediawiki.org/xml/export-0.10/\">\n  <siteinfo>\n    <sitename>Wiktionary</sitename>\n  </siteinfo>\n");
    xml.push_str(&page("laufen", 0, laufen));
    xml.push_str(&page("run", 0, english));
    xml.push_str(&page("Template:de-verb", 10, gehen));
    xml.push_str(&page("Bank", 0, bank));
    xml.push_str(&page("gehen", 0, gehen));
    xml.push_str(&page("Kaputt", 0, kaputt));
    xml.push_str("</mediawiki>\n");
    xml
}

fn extracted() -> Vec<u8> {
    let mut out = Vec::new();
    let stats = run_sequential(Cursor::new(dump()), &mut out, None, true).unwrap();
    assert_eq!(stats.pages_processed, 6);
    assert_eq!(stats.records_written, 4);
    assert_eq!(stats.no_entries, 1);
    assert_eq!(stats.other_namespace, 1);
    out
}

fn lexicon(freqs: &str) -> Lexicon {
    Lexicon::load(Cursor::new(extracted()), Cursor::new(freqs.to_string()), &Linker::new(LINK)).unwrap()
}

fn link(word: &str) -> String {
    format!(
        "<a href=\"{}{}\" target=\"_blank\">{}</a>",
        LINK,
        urlencoding::encode(word),
        word
    )
}

#[test]
fn pipeline_and_sequential_write_the_same_records() {
    let config = ParallelConfig {
        num_workers: 3,
        channel_buffer: 2,
    };
    let mut piped = Vec::new();
    process_channel_pipeline(Cursor::new(dump()), &mut piped, &config, None, true).unwrap();
    assert_eq!(String::from_utf8(piped).unwrap(), String::from_utf8(extracted()).unwrap());
}

#[test]
fn verb_entry_is_fully_normalized() {
    let lexicon = lexicon("900 laufen\n");
    let verbs = lexicon.verbs();
    assert_eq!(verbs.len(), 1);

    let laufen = &verbs[0];
    assert_eq!(laufen.word.as_str(), link("laufen"));
    let definitions: Vec<&str> = laufen.definitions.iter().map(|d| d.as_str()).collect();
    assert_eq!(
        definitions,
        vec!["run <i>(intransitive)</i> to jog", "<i>(of water)</i> to flow"]
    );

    let synonyms: Vec<&str> = laufen.synonyms.iter().map(|s| s.as_str()).collect();
    assert_eq!(
        synonyms,
        vec![link("rennen"), format!("<i>(flow)</i> {}", link("fließen"))]
    );
    assert!(laufen.antonyms.is_empty());
    assert_eq!(laufen.related_words.len(), 1);
}

#[test]
fn each_etymology_gives_its_own_noun_entry() {
    let lexicon = lexicon("50 Bank\n");
    let nouns = lexicon.nouns();
    assert_eq!(nouns.len(), 2);
    assert!(nouns.iter().all(|n| n.gender == Some(Gender::Feminine)));
    assert_eq!(
        nouns[0].word.as_str(),
        format!("<i>die</i> <span class=\"gender-f\">{}</span>", link("Bank"))
    );
    assert_eq!(nouns[1].definitions[0].as_str(), "bank (financial institution)");
    assert_eq!(nouns[1].antonyms.len(), 1);
}

#[test]
fn listings_follow_frequency_rank() {
    let lexicon = lexicon("10 gehen\n9 Kaputt\n8 laufen\n7 Bank\n6 run\n");
    let verbs: Vec<&str> = lexicon.verbs().iter().map(|e| e.headword.as_str()).collect();
    assert_eq!(verbs, vec!["gehen", "laufen"]);

    // Kaputt has an unknown gender code.
    let nouns: Vec<&str> = lexicon.nouns().iter().map(|e| e.headword.as_str()).collect();
    assert_eq!(nouns, vec!["laufen", "Bank", "Bank"]);
    assert_eq!(lexicon.nouns()[0].gender, Some(Gender::Masculine));
    assert_eq!(lexicon.nouns()[0].definitions[0].as_str(), "running");
    assert!(lexicon.entries(PartOfSpeech::Adjective).is_empty());
}

#[test]
fn unranked_headwords_are_not_listed() {
    let lexicon = lexicon("10 gehen\n");
    assert_eq!(lexicon.verbs().len(), 1);
    assert!(lexicon.nouns().is_empty());
    assert!(lexicon.adverbs().is_empty());
}
