//! Filesystem path → structural query compilation.
//!
//! A projection path is a slash-delimited sequence of element names, each
//! optionally suffixed with a 1-based occurrence index:
//!
//! ```text
//! /catalog/book[2]/title   <title> under the second <book> under <catalog>
//! /catalog/                every child of <catalog> (listing mode)
//! /                        every top-level element
//! ```
//!
//! Names are compared against the local part of a tag, so `/feed/entry`
//! matches `<atom:entry>` as well as `<entry>`.
//!
//! A tag whose local name itself ends in `[<digits>]` cannot be addressed:
//! the suffix is always read as an occurrence index.

use std::fmt;

use crate::document::DocumentStore;

/// Path separator for projection paths
pub const SEPARATOR: char = '/';

/// One path component: a tag name plus an optional occurrence index.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Segment {
    /// Local tag name to match
    pub name: String,
    /// 1-based position among same-named siblings
    pub index: Option<usize>,
}

impl Segment {
    /// Parse a raw component such as `item` or `item[3]`.
    ///
    /// Anything that is not a well-formed trailing `[<digits>]` stays part of
    /// the name, so `item[x]` is a segment named `item[x]` with no index.
    /// Indices too large to represent saturate and therefore never match.
    pub fn parse(raw: &str) -> Self {
        if let Some((name, index)) = split_index(raw) {
            return Self {
                name: name.to_string(),
                index: Some(index),
            };
        }

        Self {
            name: raw.to_string(),
            index: None,
        }
    }

    /// Whether a node with this local tag name satisfies the name constraint
    pub fn matches(&self, tag: &str) -> bool {
        self.name == tag
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}[{}]", self.name, index),
            None => f.write_str(&self.name),
        }
    }
}

fn split_index(raw: &str) -> Option<(&str, usize)> {
    let body = raw.strip_suffix(']')?;
    let open = body.rfind('[')?;
    let digits = &body[open + 1..];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    // Only overflow can fail here.
    let index = digits.parse::<usize>().unwrap_or(usize::MAX);
    Some((&body[..open], index))
}

/// A parsed projection path.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct StructuralPath {
    segments: Vec<Segment>,
    listing: bool,
}

impl StructuralPath {
    /// Parse a root-relative path. A trailing separator requests a listing.
    pub fn parse(path: &str) -> Self {
        let listing = path.ends_with(SEPARATOR);
        let trimmed = path.trim_matches(SEPARATOR);
        if trimmed.is_empty() {
            return Self {
                segments: Vec::new(),
                listing,
            };
        }

        Self {
            segments: trimmed.split(SEPARATOR).map(Segment::parse).collect(),
            listing,
        }
    }

    /// The same path, addressing the children of the named node
    pub fn into_listing(mut self) -> Self {
        self.listing = true;
        self
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn is_listing(&self) -> bool {
        self.listing
    }

    /// The root path names no element
    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Compile into an evaluable query.
    ///
    /// The root compiles to "all top-level nodes" whether or not listing mode
    /// was requested, since the root's node set and its listing coincide.
    pub fn into_query(self) -> StructuralQuery {
        if self.segments.is_empty() {
            return StructuralQuery {
                steps: vec![Step::AnyChild],
            };
        }

        let mut steps: Vec<Step> = self.segments.into_iter().map(Step::Child).collect();
        if self.listing {
            steps.push(Step::AnyChild);
        }
        StructuralQuery { steps }
    }
}

/// Compile a projection path straight into a query.
pub fn compile(path: &str) -> StructuralQuery {
    StructuralPath::parse(path).into_query()
}

/// Compile a path as a listing request, whether or not it ends in a separator.
pub fn compile_listing(path: &str) -> StructuralQuery {
    StructuralPath::parse(path).into_listing().into_query()
}

/// One selection step, applied to the children of every node in the
/// current context.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// Children matching a segment's name and optional index
    Child(Segment),
    /// Every child regardless of tag
    AnyChild,
}

impl Step {
    fn select<S>(&self, store: &S, candidates: &[S::Node], out: &mut Vec<S::Node>)
    where
        S: DocumentStore + ?Sized,
    {
        match self {
            Step::AnyChild => out.extend_from_slice(candidates),
            Step::Child(segment) => {
                let mut named = candidates
                    .iter()
                    .copied()
                    .filter(|&node| segment.matches(store.tag_name(node)));
                match segment.index {
                    // Positions are 1-based; zero never matches.
                    Some(index) => {
                        if let Some(node) = index.checked_sub(1).and_then(|n| named.nth(n)) {
                            out.push(node);
                        }
                    }
                    None => out.extend(named),
                }
            }
        }
    }
}

/// Compiled form of a [`StructuralPath`].
///
/// Evaluation starts above the top-level elements: the first step selects
/// among them, each later step selects among the children of the previous
/// result, and occurrence indices are counted per parent.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StructuralQuery {
    steps: Vec<Step>,
}

impl StructuralQuery {
    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run the query against a store, returning matches in document order.
    pub fn evaluate<S>(&self, store: &S) -> Vec<S::Node>
    where
        S: DocumentStore + ?Sized,
    {
        let Some((first, rest)) = self.steps.split_first() else {
            return Vec::new();
        };

        let mut current = Vec::new();
        first.select(store, store.top_level(), &mut current);

        for step in rest {
            if current.is_empty() {
                break;
            }
            let mut next = Vec::new();
            for node in current {
                step.select(store, store.children(node), &mut next);
            }
            current = next;
        }

        current
    }
}

/// Renders the query as the equivalent XPath expression, for logs.
impl fmt::Display for StructuralQuery {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for step in &self.steps {
            match step {
                Step::AnyChild => f.write_str("/*")?,
                Step::Child(segment) => {
                    write!(f, "/*[local-name() = '{}']", segment.name)?;
                    if let Some(index) = segment.index {
                        write!(f, "[{}]", index)?;
                    }
                }
            }
        }
        Ok(())
    }
}
