//! Wikitext tokenizer.
//!
//! Turns raw page markup into a flat sequence of [`Node`]s and lets callers
//! navigate it as nested sections. Only the shapes the extractor cares about
//! are recognized: headings, line-start list markers, horizontal rules, links,
//! templates and comments. Everything else is text.
//!
//! The tokenizer is total: malformed markup (an unterminated `{{` or `[[`)
//! degrades to text instead of failing.

use std::fmt;

/// Section heading: `== title ==`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    pub level: usize,
    pub title: String,
    source: String,
}

/// Parsed wikilink: `[[target#anchor|display]]`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Wikilink {
    pub target: String,
    pub anchor: Option<String>,
    pub display: Option<String>,
    source: String,
}

impl Wikilink {
    /// Return display text if present, otherwise target
    pub fn text(&self) -> &str {
        self.display.as_deref().unwrap_or(&self.target)
    }
}

/// Parsed template: `{{name|param1|param2|...}}`
///
/// Parameters are positional as written; named parameters keep their
/// `key=value` text. Nested templates inside a parameter produce no text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    pub name: String,
    pub params: Vec<String>,
    source: String,
}

impl Template {
    pub fn param(&self, index: usize) -> Option<&str> {
        self.params.get(index).map(String::as_str)
    }

    /// True for `{{name|lang|...}}`, e.g. `is_for("lb", "de")`.
    pub fn is_for(&self, name: &str, lang: &str) -> bool {
        self.name == name && self.param(0) == Some(lang)
    }
}

/// One node of a page's markup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Heading(Heading),
    /// A single list-markup character at the start of a line (`#`, `*`, `:`, `;`).
    Marker(char),
    Text(String),
    Link(Wikilink),
    Template(Template),
    /// `<!-- ... -->`, kept verbatim.
    Comment(String),
    /// Horizontal rule (`----`) at the start of a line.
    Rule(String),
}

const LIST_MARKERS: [char; 4] = ['#', '*', ':', ';'];

impl Node {
    /// Classify one token's literal source back into a node.
    ///
    /// Tokens are persisted as their source text; this recovers the node kind
    /// at load time. Anything that does not tokenize to a single node is text.
    pub fn from_source(source: &str) -> Node {
        let mut nodes = WikitextParser::new(source).parse_nodes();
        if nodes.len() == 1 {
            if let Some(node) = nodes.pop() {
                return node;
            }
        }
        Node::Text(source.to_string())
    }

    pub fn is_marker(&self, symbol: char) -> bool {
        matches!(self, Node::Marker(c) if *c == symbol)
    }

    pub fn is_heading(&self) -> bool {
        matches!(self, Node::Heading(_))
    }

    /// Whitespace-only text. Every other node kind carries markup.
    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Text(text) if text.trim().is_empty())
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Heading(heading) => f.write_str(&heading.source),
            Node::Marker(symbol) => write!(f, "{}", symbol),
            Node::Text(text) => f.write_str(text),
            Node::Link(link) => f.write_str(&link.source),
            Node::Template(template) => f.write_str(&template.source),
            Node::Comment(source) | Node::Rule(source) => f.write_str(source),
        }
    }
}

/// A tokenized page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    nodes: Vec<Node>,
}

impl Document {
    pub fn parse(text: &str) -> Self {
        Document {
            nodes: WikitextParser::new(text).parse_nodes(),
        }
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// The whole page as a heading-less section.
    pub fn root(&self) -> Section<'_> {
        Section {
            heading: None,
            body: &self.nodes,
        }
    }
}

/// A heading plus everything up to the next heading of equal or higher level.
///
/// Nested sub-sections are part of the body.
#[derive(Debug, Clone, Copy)]
pub struct Section<'a> {
    heading: Option<&'a Heading>,
    body: &'a [Node],
}

impl<'a> Section<'a> {
    pub fn heading(&self) -> Option<&'a Heading> {
        self.heading
    }

    pub fn title(&self) -> Option<&'a str> {
        self.heading.map(|h| h.title.as_str())
    }

    /// Heading level, 0 for the page root.
    pub fn level(&self) -> usize {
        self.heading.map_or(0, |h| h.level)
    }

    /// Section nodes without the heading node itself.
    pub fn body(&self) -> &'a [Node] {
        self.body
    }

    /// All descendant sections, at any depth, whose heading satisfies `predicate`.
    pub fn sections_where<F>(&self, predicate: F) -> Vec<Section<'a>>
    where
        F: Fn(&Heading) -> bool,
    {
        let body = self.body;
        let mut found = Vec::new();

        for (index, node) in body.iter().enumerate() {
            let Node::Heading(heading) = node else {
                continue;
            };
            if !predicate(heading) {
                continue;
            }
            let start = index + 1;
            let end = body[start..]
                .iter()
                .position(|n| matches!(n, Node::Heading(h) if h.level <= heading.level))
                .map_or(body.len(), |offset| start + offset);
            found.push(Section {
                heading: Some(heading),
                body: &body[start..end],
            });
        }

        found
    }

    /// Descendant sections whose title equals `title` exactly (case-sensitive).
    pub fn sections_titled(&self, title: &str) -> Vec<Section<'a>> {
        self.sections_where(|heading| heading.title == title)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Wikitext Recursive Descent Parser
// ─────────────────────────────────────────────────────────────────────────────

/// Recursive descent tokenizer over page markup.
/// Uses the call stack for template nesting - no explicit depth counters.
struct WikitextParser<'a> {
    text: &'a str,
    pos: usize,
}

impl<'a> WikitextParser<'a> {
    fn new(text: &'a str) -> Self {
        WikitextParser { text, pos: 0 }
    }

    fn rest(&self) -> &'a str {
        &self.text[self.pos..]
    }

    fn starts_with(&self, pattern: &str) -> bool {
        self.rest().starts_with(pattern)
    }

    fn peek_char(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn consume_char(&mut self) -> Option<char> {
        let c = self.peek_char()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn at_line_start(&self) -> bool {
        self.pos == 0 || self.text[..self.pos].ends_with('\n')
    }

    // ─────────────────────────────────────────────────────────────
    // nodes ::= (line-start | inline)*
    // ─────────────────────────────────────────────────────────────
    fn parse_nodes(&mut self) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut text = String::new();

        while !self.at_end() {
            if self.at_line_start() {
                if let Some(heading) = self.parse_heading() {
                    flush_text(&mut text, &mut nodes);
                    nodes.push(Node::Heading(heading));
                    continue;
                }
                if let Some(rule) = self.parse_rule() {
                    flush_text(&mut text, &mut nodes);
                    nodes.push(Node::Rule(rule));
                    continue;
                }
                if LIST_MARKERS.contains(&self.peek_char().unwrap_or(' ')) {
                    flush_text(&mut text, &mut nodes);
                    while let Some(c) = self.peek_char().filter(|c| LIST_MARKERS.contains(c)) {
                        self.consume_char();
                        nodes.push(Node::Marker(c));
                    }
                    continue;
                }
            }

            if self.starts_with("<!--") {
                flush_text(&mut text, &mut nodes);
                let comment = self.parse_comment();
                nodes.push(Node::Comment(comment));
                continue;
            }

            let start = self.pos;
            if self.starts_with("{{") {
                if let Some(template) = self.parse_template() {
                    flush_text(&mut text, &mut nodes);
                    nodes.push(Node::Template(template));
                    continue;
                }
                self.pos = start;
            } else if self.starts_with("[[") {
                if let Some(link) = self.parse_wikilink() {
                    flush_text(&mut text, &mut nodes);
                    nodes.push(Node::Link(link));
                    continue;
                }
                self.pos = start;
            }

            if let Some(c) = self.consume_char() {
                text.push(c);
            }
        }

        flush_text(&mut text, &mut nodes);
        nodes
    }

    // ─────────────────────────────────────────────────────────────
    // heading ::= "="{n} title "="{n} at line start
    // ─────────────────────────────────────────────────────────────
    fn parse_heading(&mut self) -> Option<Heading> {
        if !self.starts_with("=") {
            return None;
        }
        let rest = self.rest();
        let line = rest.split('\n').next().unwrap_or(rest);
        let trimmed = line.trim_end();

        let leading = trimmed.chars().take_while(|&c| c == '=').count();
        let trailing = trimmed.chars().rev().take_while(|&c| c == '=').count();
        let level = leading.min(trailing).min(6);
        if level == 0 || trimmed.len() <= 2 * level {
            return None;
        }

        let title = trimmed[level..trimmed.len() - level].trim();
        if title.is_empty() {
            return None;
        }

        self.pos += line.len();
        Some(Heading {
            level,
            title: title.to_string(),
            source: line.to_string(),
        })
    }

    fn parse_rule(&mut self) -> Option<String> {
        if !self.starts_with("----") {
            return None;
        }
        let len = self.rest().chars().take_while(|&c| c == '-').count();
        let rule = self.rest()[..len].to_string();
        self.pos += len;
        Some(rule)
    }

    fn parse_comment(&mut self) -> String {
        let rest = self.rest();
        let len = rest[4..].find("-->").map_or(rest.len(), |end| 4 + end + 3);
        self.pos += len;
        rest[..len].to_string()
    }

    // ─────────────────────────────────────────────────────────────
    // wikilink ::= "[[" target ("#" anchor)? ("|" display)? "]]"
    // ─────────────────────────────────────────────────────────────
    fn parse_wikilink(&mut self) -> Option<Wikilink> {
        let start = self.pos;
        self.pos += 2; // consume "[["

        let target = self.parse_link_part(&['#', '|', ']'])?;
        let mut anchor = None;
        let mut display = None;

        // Optional: "#" anchor
        if self.starts_with("#") {
            self.pos += 1;
            anchor = Some(self.parse_link_part(&['|', ']'])?);
        }

        // Optional: "|" display
        if self.starts_with("|") {
            self.pos += 1;
            display = Some(self.parse_display()?);
        }

        if !self.starts_with("]]") {
            return None;
        }
        self.pos += 2;

        Some(Wikilink {
            target: target.trim().to_string(),
            anchor: anchor.map(|a| a.trim().to_string()),
            display: display.map(|d| d.trim().to_string()),
            source: self.text[start..self.pos].to_string(),
        })
    }

    fn parse_link_part(&mut self, stops: &[char]) -> Option<String> {
        let mut result = String::new();
        while let Some(c) = self.peek_char() {
            if stops.contains(&c) {
                return Some(result);
            }
            if c == '\n' {
                return None;
            }
            self.consume_char();
            result.push(c);
        }
        None
    }

    fn parse_display(&mut self) -> Option<String> {
        let mut result = String::new();
        while !self.at_end() && !self.starts_with("]]") {
            match self.consume_char() {
                Some('\n') => return None,
                Some(c) => result.push(c),
                None => break,
            }
        }
        Some(result)
    }

    // ─────────────────────────────────────────────────────────────
    // template ::= "{{" param ("|" param)* "}}"
    // ─────────────────────────────────────────────────────────────
    fn parse_template(&mut self) -> Option<Template> {
        let start = self.pos;
        self.pos += 2; // consume "{{"

        let mut params = Vec::new();
        loop {
            params.push(self.parse_template_param()?);
            if self.starts_with("}}") {
                self.pos += 2;
                break;
            }
            if self.starts_with("|") {
                self.pos += 1;
                continue;
            }
            // Ran off the end of the text.
            return None;
        }

        let mut params = params.into_iter();
        let name = params.next().unwrap_or_default();
        Some(Template {
            name,
            params: params.collect(),
            source: self.text[start..self.pos].to_string(),
        })
    }

    // ─────────────────────────────────────────────────────────────
    // param ::= element*  (terminated by | or }})
    // ─────────────────────────────────────────────────────────────
    fn parse_template_param(&mut self) -> Option<String> {
        let mut result = String::new();
        while !self.at_end() && !self.starts_with("|") && !self.starts_with("}}") {
            if self.starts_with("[[") {
                let start = self.pos;
                match self.parse_wikilink() {
                    Some(link) => result.push_str(link.text()),
                    None => {
                        self.pos = start;
                        if let Some(c) = self.consume_char() {
                            result.push(c);
                        }
                    }
                }
            } else if self.starts_with("{{") {
                // Nested templates produce no text for our purposes
                self.parse_template()?;
            } else if self.starts_with("<!--") {
                self.parse_comment();
            } else if let Some(c) = self.consume_char() {
                result.push(c);
            }
        }
        Some(result.trim().to_string())
    }
}

fn flush_text(text: &mut String, nodes: &mut Vec<Node>) {
    if !text.is_empty() {
        nodes.push(Node::Text(std::mem::take(text)));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests for the tokenizer
// ─────────────────────────────────────────────────────────────────────────────
