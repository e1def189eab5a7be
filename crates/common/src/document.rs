//! Document store capability and its XML implementation.

use std::borrow::Cow;
use std::fmt;

use roxmltree::{NodeType, ParsingOptions};
use tracing::debug;

use crate::path::StructuralQuery;

/// Read-only access to a loaded hierarchical document.
///
/// Implementations must be safe to query from several threads at once; the
/// document is never mutated after construction.
pub trait DocumentStore: Send + Sync {
    /// Opaque handle to one structural node
    type Node: Copy + Eq + fmt::Debug;

    /// The document exactly as it was loaded
    fn source(&self) -> &[u8];

    /// Top-level nodes in document order
    fn top_level(&self) -> &[Self::Node];

    /// Child nodes in document order
    fn children(&self, node: Self::Node) -> &[Self::Node];

    /// Tag name with any namespace prefix removed
    fn tag_name(&self, node: Self::Node) -> &str;

    /// Standalone textual form of a single node
    fn serialize(&self, node: Self::Node) -> Cow<'_, [u8]>;

    /// Evaluate a compiled query, returning matches in document order
    fn evaluate(&self, query: &StructuralQuery) -> Vec<Self::Node> {
        query.evaluate(self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum DocumentError {
    #[error("failed to parse document: {0}")]
    Parse(#[from] roxmltree::Error),
}

/// Handle to an element in an [`XmlDocument`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

/// A namespace prefix bound to a URI; `None` is the default namespace
#[derive(Debug, Clone, PartialEq, Eq)]
struct Binding {
    prefix: Option<String>,
    uri: String,
}

/// Child content of an element, in document order
#[derive(Debug)]
enum Content {
    Element(NodeId),
    Text(String),
    Comment(String),
    Instruction { target: String, value: Option<String> },
}

#[derive(Debug)]
struct Element {
    /// Local name, prefix stripped
    name: String,
    /// Name as written, prefix kept
    qname: String,
    /// Qualified name and expanded value of each attribute
    attributes: Vec<(String, String)>,
    /// Namespace bindings in scope at this element, `xml` excluded
    scope: Vec<Binding>,
    content: Vec<Content>,
    children: Vec<NodeId>,
}

/// An XML document held as an owned node arena alongside its source text.
///
/// Only elements are addressable; text, comments and processing instructions
/// are kept as element content and come back through serialization. A node
/// serializes as a standalone fragment: namespaces it inherits are declared on
/// its start tag and entity references are expanded, so the fragment parses on
/// its own with the same names and text.
#[derive(Debug)]
pub struct XmlDocument {
    source: String,
    elements: Vec<Element>,
    top_level: Vec<NodeId>,
}

impl XmlDocument {
    /// Parse a document, keeping `source` verbatim.
    pub fn parse(source: impl Into<String>) -> Result<Self, DocumentError> {
        let source = source.into();
        let options = ParsingOptions {
            allow_dtd: true,
            ..ParsingOptions::default()
        };

        let (elements, top_level) = {
            let parsed = roxmltree::Document::parse_with_options(&source, options)?;
            let mut arena = Vec::new();
            let top_level = parsed
                .root()
                .children()
                .filter(roxmltree::Node::is_element)
                .map(|child| build_element(child, &source, &mut arena))
                .collect();
            (arena, top_level)
        };

        debug!(
            elements = elements.len(),
            bytes = source.len(),
            "parsed document"
        );

        Ok(Self {
            source,
            elements,
            top_level,
        })
    }

    /// Number of elements in the document
    pub fn element_count(&self) -> usize {
        self.elements.len()
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    fn element(&self, node: NodeId) -> &Element {
        &self.elements[node.0]
    }

    fn write_element(&self, node: NodeId, inherited: &[Binding], out: &mut String) {
        let element = self.element(node);

        out.push('<');
        out.push_str(&element.qname);
        for binding in element.scope.iter().filter(|b| !inherited.contains(b)) {
            match &binding.prefix {
                Some(prefix) => {
                    out.push_str(" xmlns:");
                    out.push_str(prefix);
                }
                None => out.push_str(" xmlns"),
            }
            out.push_str("=\"");
            escape_attribute(&binding.uri, out);
            out.push('"');
        }
        let had_default = inherited.iter().any(|b| b.prefix.is_none());
        if had_default && !element.scope.iter().any(|b| b.prefix.is_none()) {
            out.push_str(" xmlns=\"\"");
        }
        for (name, value) in &element.attributes {
            out.push(' ');
            out.push_str(name);
            out.push_str("=\"");
            escape_attribute(value, out);
            out.push('"');
        }

        if element.content.is_empty() {
            out.push_str("/>");
            return;
        }
        out.push('>');
        for content in &element.content {
            match content {
                Content::Element(child) => self.write_element(*child, &element.scope, out),
                Content::Text(text) => escape_text(text, out),
                Content::Comment(text) => {
                    out.push_str("<!--");
                    out.push_str(text);
                    out.push_str("-->");
                }
                Content::Instruction { target, value } => {
                    out.push_str("<?");
                    out.push_str(target);
                    if let Some(value) = value {
                        out.push(' ');
                        out.push_str(value);
                    }
                    out.push_str("?>");
                }
            }
        }
        out.push_str("</");
        out.push_str(&element.qname);
        out.push('>');
    }
}

fn build_element(
    node: roxmltree::Node<'_, '_>,
    source: &str,
    arena: &mut Vec<Element>,
) -> NodeId {
    let scope: Vec<Binding> = node
        .namespaces()
        .filter(|ns| ns.uri() != roxmltree::NS_XML_URI)
        .map(|ns| Binding {
            prefix: ns.name().map(str::to_string),
            uri: ns.uri().to_string(),
        })
        .collect();

    let tag = node.tag_name();
    let written = start_tag_name(source, node.range().start);
    let qname = qualify(tag.name(), tag.namespace(), written, &scope, true);
    let attributes = node
        .attributes()
        .map(|attr| {
            let written = source.get(attr.range_qname()).unwrap_or_default();
            let name = qualify(attr.name(), attr.namespace(), written, &scope, false);
            (name, attr.value().to_string())
        })
        .collect();

    let id = NodeId(arena.len());
    arena.push(Element {
        name: tag.name().to_string(),
        qname,
        attributes,
        scope,
        content: Vec::new(),
        children: Vec::new(),
    });

    let mut content = Vec::new();
    let mut children = Vec::new();
    for child in node.children() {
        match child.node_type() {
            NodeType::Element => {
                let child = build_element(child, source, arena);
                children.push(child);
                content.push(Content::Element(child));
            }
            NodeType::Text => {
                content.push(Content::Text(child.text().unwrap_or_default().to_string()))
            }
            NodeType::Comment => {
                content.push(Content::Comment(child.text().unwrap_or_default().to_string()))
            }
            NodeType::PI => {
                if let Some(pi) = child.pi() {
                    content.push(Content::Instruction {
                        target: pi.target.to_string(),
                        value: pi.value.map(str::to_string),
                    });
                }
            }
            NodeType::Root => {}
        }
    }

    let element = &mut arena[id.0];
    element.content = content;
    element.children = children;
    id
}

/// Name in the start tag beginning at `start`
fn start_tag_name(source: &str, start: usize) -> &str {
    source
        .get(start + 1..)
        .and_then(|rest| {
            rest.split(|c: char| c.is_whitespace() || c == '/' || c == '>')
                .next()
        })
        .unwrap_or_default()
}

/// Qualified name for `local` in namespace `uri`, keeping the prefix it was
/// written with when that prefix is bound to `uri`. Attributes never take the
/// default namespace.
fn qualify(
    local: &str,
    uri: Option<&str>,
    written: &str,
    scope: &[Binding],
    element: bool,
) -> String {
    let Some(uri) = uri else {
        return local.to_string();
    };
    if uri == roxmltree::NS_XML_URI {
        return format!("xml:{}", local);
    }

    let written_prefix = written.split_once(':').map(|(prefix, _)| prefix);
    let bound = |b: &&Binding| b.uri == uri && (element || b.prefix.is_some());
    let chosen = scope
        .iter()
        .filter(bound)
        .find(|b| b.prefix.as_deref() == written_prefix)
        .or_else(|| scope.iter().find(bound));

    match chosen.and_then(|b| b.prefix.as_deref()) {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}

fn escape_text(text: &str, out: &mut String) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\r' => out.push_str("&#13;"),
            c => out.push(c),
        }
    }
}

fn escape_attribute(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\n' => out.push_str("&#10;"),
            '\r' => out.push_str("&#13;"),
            '\t' => out.push_str("&#9;"),
            c => out.push(c),
        }
    }
}

impl DocumentStore for XmlDocument {
    type Node = NodeId;

    fn source(&self) -> &[u8] {
        self.source.as_bytes()
    }

    fn top_level(&self) -> &[NodeId] {
        &self.top_level
    }

    fn children(&self, node: NodeId) -> &[NodeId] {
        &self.element(node).children
    }

    fn tag_name(&self, node: NodeId) -> &str {
        &self.element(node).name
    }

    fn serialize(&self, node: NodeId) -> Cow<'_, [u8]> {
        let mut out = String::new();
        self.write_element(node, &[], &mut out);
        Cow::Owned(out.into_bytes())
    }
}
