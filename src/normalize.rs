//! Turns the raw nodes of one item into display text.
//!
//! Output is a [`Fragment`]: pre-rendered HTML whose structural markup
//! (`<i>`, `<a>`, `<span>`) is generated here while every piece of dictionary
//! text inside it is escaped on the way in.

use html_escape::{decode_html_entities, encode_double_quoted_attribute, encode_text};
use serde::{Serialize, Serializer};
use std::fmt;

use crate::markup::Node;
use crate::walker::Bullet;

/// Default search target for cross-reference links; the word is appended.
pub const DEFAULT_SEARCH_URL: &str =
    "https://www.linguee.de/deutsch-englisch/search?source=auto&query=";

/// Pre-rendered HTML, safe to emit without further escaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment(String);

impl Fragment {
    pub(crate) fn from_trusted(html: String) -> Self {
        Fragment(html)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fragment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for Fragment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Builds outbound cross-reference links.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Linker {
    search_url: String,
}

impl Linker {
    pub fn new(search_url: impl Into<String>) -> Self {
        Linker {
            search_url: search_url.into(),
        }
    }

    /// `<a href="{search_url}{word}" target="_blank">{word}</a>`, with the
    /// word percent-encoded in the href.
    pub fn link(&self, word: &str) -> Fragment {
        let href = format!("{}{}", self.search_url, urlencoding::encode(word));
        Fragment(format!(
            "<a href=\"{}\" target=\"_blank\">{}</a>",
            encode_double_quoted_attribute(&href),
            encode_text(word)
        ))
    }
}

impl Default for Linker {
    fn default() -> Self {
        Linker::new(DEFAULT_SEARCH_URL)
    }
}

/// Escape dictionary text. Entity references already present are decoded
/// first so escaped text passes through unchanged.
fn escape_text(text: &str) -> String {
    encode_text(&decode_html_entities(text)).into_owned()
}

fn italic_parenthesized(text: &str) -> String {
    format!("<i>({})</i>", escape_text(text))
}

// ─────────────────────────────────────────────────────────────────────────────
// Definitions
// ─────────────────────────────────────────────────────────────────────────────

/// An item is usable when, past its leading marker, the first token with
/// visible content is neither a bare `:` nor a bare `*` (nested example and
/// quotation lines).
fn is_usable(item: &[Node]) -> bool {
    item.iter()
        .skip(1)
        .find(|node| !node.is_blank())
        .is_some_and(|node| !(node.is_marker(':') || node.is_marker('*')))
}

fn definition_token(node: &Node) -> Option<String> {
    let token = match node {
        Node::Text(text) => escape_text(text.trim()),
        Node::Link(link) => escape_text(link.text()),
        Node::Template(template) if template.is_for("lb", "de") => {
            let labels: Vec<&str> = template.params[1..]
                .iter()
                .map(|label| label.trim())
                .filter(|label| !label.is_empty())
                .collect();
            if labels.is_empty() {
                return None;
            }
            italic_parenthesized(&labels.join(", "))
        }
        Node::Template(template) if template.is_for("l", "en") => escape_text(template.param(1)?),
        Node::Marker(symbol) => symbol.to_string(),
        Node::Template(_) | Node::Heading(_) | Node::Comment(_) | Node::Rule(_) => return None,
    };
    (!token.is_empty()).then_some(token)
}

/// Join tokens with single spaces, then pull separators back onto the
/// preceding token.
fn join_tokens(tokens: &[String]) -> String {
    tokens
        .join(" ")
        .replace(" ; ", "; ")
        .replace(" , ", ", ")
        .replace(" ( ", "( ")
        .replace(" ) ", ") ")
}

/// Normalize one definition item (`#` marker first).
///
/// Returns `None` for unusable items and for items where no token survives.
pub fn normalize_definition_item(item: &[Node]) -> Option<Fragment> {
    if !is_usable(item) {
        return None;
    }
    let tokens: Vec<String> = item.iter().skip(1).filter_map(definition_token).collect();
    if tokens.is_empty() {
        return None;
    }
    Some(Fragment(join_tokens(&tokens)))
}

// ─────────────────────────────────────────────────────────────────────────────
// Relation lists
// ─────────────────────────────────────────────────────────────────────────────

fn clean_relation_text(text: &str) -> String {
    text.replace('\n', "").replace("----", "").trim().to_string()
}

fn relation_token(node: &Node, linker: &Linker) -> Option<String> {
    let token = match node {
        Node::Template(template) if template.name == "sense" => {
            italic_parenthesized(template.param(0)?)
        }
        Node::Template(template) if template.is_for("l", "de") => {
            linker.link(template.param(1).filter(|w| !w.is_empty())?).0
        }
        Node::Link(link) if !link.text().is_empty() => linker.link(link.text()).0,
        Node::Marker(symbol) => symbol.to_string(),
        Node::Text(text) => {
            let text = clean_relation_text(text);
            if text.is_empty() {
                return None;
            }
            if text.chars().any(char::is_alphanumeric) {
                linker.link(&text).0
            } else {
                escape_text(&text)
            }
        }
        _ => return None,
    };
    Some(token)
}

/// Normalize one synonym/antonym/related-term item (`*` marker first).
///
/// Every surviving word becomes an outbound link; `{{sense|...}}` glosses
/// stay as italic annotations. Items without a leading bullet, or with
/// nothing after it, produce nothing.
pub fn normalize_relation_item(item: &[Node], linker: &Linker) -> Option<Fragment> {
    let (first, rest) = item.split_first()?;
    if !first.is_marker(Bullet::Bulleted.symbol()) {
        return None;
    }
    let tokens: Vec<String> = rest
        .iter()
        .filter_map(|node| relation_token(node, linker))
        .collect();
    if tokens.is_empty() {
        return None;
    }
    Some(Fragment(tokens.join(" ")))
}
