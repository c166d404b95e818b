use crate::error::Origin;
use crate::props::{AttributeMap, StyleMap};

// ── TagKind ───────────────────────────────────────────────────────────────

/// The tag types the layout engine knows how to place.
///
/// Anything else parses fine and ends up as [`TagKind::Unknown`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TagKind {
    Title,
    Text,
    Bullet,
    Quote,
    Author,
    Code,
    Link,
    Image,
    Graph,
    NewLine,
    Footer,
    Attribution,
    Unknown,
}

impl TagKind {
    pub fn from_name(name: &str) -> Self {
        match name {
            "sdtitle"     => Self::Title,
            "sdtext"      => Self::Text,
            "text"        => Self::Text,
            "sdbullet"    => Self::Bullet,
            "sdquote"     => Self::Quote,
            "sdauthor"    => Self::Author,
            "sdcode"      => Self::Code,
            "sdlink"      => Self::Link,
            "sdimage"     => Self::Image,
            "sdgraph"     => Self::Graph,
            "sdnline"     => Self::NewLine,
            "sdfooter"    => Self::Footer,
            "attribution" => Self::Attribution,
            _             => Self::Unknown,
        }
    }

    /// Tags whose content is their attribute map rather than their body.
    #[inline]
    pub fn is_attribute_driven(self) -> bool {
        matches!(self, Self::Graph)
    }

    /// Tags anchored to the bottom margin instead of the flow cursor.
    #[inline]
    pub fn is_fixed_bottom(self) -> bool {
        matches!(self, Self::Footer | Self::Attribution)
    }
}

// ── Content ───────────────────────────────────────────────────────────────

/// What a node carries besides its children.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Content {
    /// Trimmed body text.
    Text(String),
    /// The value of a `src="..."` clause. Body text is dropped.
    Source(String),
    /// The node's content is its [`Node::attributes`] map (e.g. `sdgraph`).
    Attributes,
}

impl Content {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_source(&self) -> Option<&str> {
        match self {
            Self::Source(s) => Some(s),
            _ => None,
        }
    }
}

// ── Node ──────────────────────────────────────────────────────────────────

/// One parsed tag instance.
///
/// ```sdtex
/// (sdquote style={color: #555555})
///     Simplicity is prerequisite for reliability.
///     (sdauthor)Edsger Dijkstra(!sdauthor)
/// (!sdquote)
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    /// Tag name as written: `"sdtitle"`, `"sdbullet"`, or anything unknown.
    pub tag: String,
    pub content: Content,
    /// Effective style: inline keys over the stylesheet default.
    pub style: StyleMap,
    pub attributes: AttributeMap,
    /// Nested tags in document order.
    pub children: Vec<Node>,
    pub origin: Origin,
}

impl Node {
    #[inline]
    pub fn kind(&self) -> TagKind {
        TagKind::from_name(&self.tag)
    }

    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Body text, or `""` for source/attribute content.
    pub fn text(&self) -> &str {
        self.content.as_text().unwrap_or("")
    }

    /// Tree equality that ignores [`Origin`]s.
    pub fn same_structure(&self, other: &Node) -> bool {
        self.tag == other.tag
            && self.content == other.content
            && self.style == other.style
            && self.attributes == other.attributes
            && self.children.len() == other.children.len()
            && self.children.iter().zip(&other.children).all(|(a, b)| a.same_structure(b))
    }
}

// ── Document ──────────────────────────────────────────────────────────────

/// The top-level parse result for a `.sdtex` source: tags in opening order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    pub nodes: Vec<Node>,
}

impl Document {
    pub fn new(nodes: Vec<Node>) -> Self {
        Self { nodes }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-order, depth-first walk over every node with its nesting depth.
    pub fn walk(&self) -> Walk<'_> {
        Walk { stack: self.nodes.iter().rev().map(|n| (0, n)).collect() }
    }

    /// Tree equality that ignores [`Origin`]s.
    pub fn same_structure(&self, other: &Document) -> bool {
        self.nodes.len() == other.nodes.len()
            && self.nodes.iter().zip(&other.nodes).all(|(a, b)| a.same_structure(b))
    }
}

/// Iterator returned by [`Document::walk`].
pub struct Walk<'d> {
    stack: Vec<(usize, &'d Node)>,
}

impl<'d> Iterator for Walk<'d> {
    type Item = (usize, &'d Node);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        self.stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
        Some((depth, node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(tag: &str, children: Vec<Node>) -> Node {
        Node {
            tag: tag.to_string(),
            content: Content::Text(String::new()),
            style: StyleMap::new(),
            attributes: AttributeMap::new(),
            children,
            origin: Origin::default(),
        }
    }

    #[test]
    fn kind_covers_aliases_and_unknown() {
        assert_eq!(TagKind::from_name("text"), TagKind::Text);
        assert_eq!(TagKind::from_name("sdtext"), TagKind::Text);
        assert_eq!(TagKind::from_name("sdnline"), TagKind::NewLine);
        assert_eq!(TagKind::from_name("sdsparkle"), TagKind::Unknown);
        assert!(TagKind::Attribution.is_fixed_bottom());
        assert!(TagKind::Graph.is_attribute_driven());
    }

    #[test]
    fn walk_is_preorder() {
        let doc = Document::new(vec![
            node("a", vec![node("b", vec![node("c", vec![])]), node("d", vec![])]),
            node("e", vec![]),
        ]);
        let order: Vec<(usize, &str)> = doc.walk().map(|(d, n)| (d, n.tag.as_str())).collect();
        assert_eq!(order, vec![(0, "a"), (1, "b"), (2, "c"), (1, "d"), (0, "e")]);
    }

    #[test]
    fn same_structure_ignores_origin() {
        let a = node("a", vec![]);
        let mut b = a.clone();
        b.origin = Origin::new(40, 2);
        assert!(a.same_structure(&b));
        assert_ne!(a, b);
    }
}
