//! Splits a section body into list items.

use crate::markup::Node;

/// Which list marker delimits items.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bullet {
    /// `#`, used for definitions
    Numbered,
    /// `*`, used for synonym/antonym/related-term lists
    Bulleted,
}

impl Bullet {
    pub fn symbol(self) -> char {
        match self {
            Bullet::Numbered => '#',
            Bullet::Bulleted => '*',
        }
    }
}

/// Segment a section body (heading node already excluded) into items.
///
/// Scanning stops at the first heading. A bare bullet node starts a new item
/// only when the current item already holds something; otherwise it is
/// absorbed into the current, still empty item. Items are contiguous runs of
/// the input, so each one is returned as a sub-slice with its boundary marker
/// (if any) at index 0.
pub fn segment_items(nodes: &[Node], bullet: Bullet) -> Vec<&[Node]> {
    let symbol = bullet.symbol();
    let end = nodes.iter().position(Node::is_heading).unwrap_or(nodes.len());
    let nodes = &nodes[..end];

    let mut items = Vec::new();
    let mut start = 0;
    for (index, node) in nodes.iter().enumerate() {
        if node.is_marker(symbol) && index > start {
            items.push(&nodes[start..index]);
            start = index;
        }
    }
    if start < nodes.len() {
        items.push(&nodes[start..]);
    }

    items
}
