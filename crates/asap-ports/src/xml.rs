//! ACORD XML access port. The 103/121 parser itself is out of scope; this
//! module only defines the tree-navigation contract (`lookup` by dotted
//! path, `attr` for the ACORD `tc` type-code attribute) plus a minimal
//! recursive-descent reader sufficient to walk the well-formed, namespace-
//! free XML the upstream ACORD feeds produce.

use std::collections::BTreeMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum XmlError {
    #[error("malformed XML at byte {0}")]
    Malformed(usize),
    #[error("unexpected end of document")]
    UnexpectedEof,
}

pub type XmlResult<T> = Result<T, XmlError>;

#[derive(Debug, Clone, Default)]
pub struct XmlNode {
    pub tag: String,
    pub attrs: BTreeMap<String, String>,
    pub text: String,
    pub children: Vec<XmlNode>,
}

impl XmlNode {
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    pub fn child(&self, tag: &str) -> Option<&XmlNode> {
        self.children.iter().find(|c| c.tag == tag)
    }
}

/// A parsed ACORD document, navigable by dotted path, e.g.
/// `ACORDInsuredHolding.Policy.ApplicationInfo.ApplicationJurisdiction`.
pub trait XmlDocument: Send + Sync {
    fn lookup(&self, dotted_path: &str) -> Option<&XmlNode>;
}

#[derive(Debug, Clone)]
pub struct ParsedXmlDocument {
    root: XmlNode,
}

impl ParsedXmlDocument {
    pub fn parse(source: &str) -> XmlResult<Self> {
        let mut chars = source.char_indices().peekable();
        skip_prolog(&mut chars);
        let root = parse_element(&mut chars)?;
        Ok(Self { root })
    }
}

impl XmlDocument for ParsedXmlDocument {
    fn lookup(&self, dotted_path: &str) -> Option<&XmlNode> {
        lookup_path(&self.root, dotted_path)
    }
}

impl ParsedXmlDocument {
    pub fn into_root(self) -> XmlNode {
        self.root
    }
}

/// Resolves a dotted path against `root`, tolerating a leading segment
/// that names the root tag itself (`Root.A.B` and `A.B` both work when
/// `root.tag == "Root"`).
pub fn lookup_path<'a>(root: &'a XmlNode, dotted_path: &str) -> Option<&'a XmlNode> {
    let mut segments = dotted_path.split('.');
    let first = segments.next()?;
    let mut node = if root.tag == first { root } else { root.child(first)? };
    for seg in segments {
        node = node.child(seg)?;
    }
    Some(node)
}

fn skip_prolog(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) {
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }
        // Skip an XML declaration or comment if present.
        break;
    }
}

fn parse_element(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> XmlResult<XmlNode> {
    // Find the next '<' that starts a real element (not a declaration).
    loop {
        match chars.peek() {
            Some(&(_, '<')) => {
                chars.next();
                if matches!(chars.peek(), Some(&(_, '?'))) {
                    while !matches!(chars.next(), Some((_, '>')) | None) {}
                    continue;
                }
                break;
            }
            Some(_) => {
                chars.next();
            }
            None => return Err(XmlError::UnexpectedEof),
        }
    }

    let mut tag = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c.is_whitespace() || c == '>' || c == '/' {
            break;
        }
        tag.push(c);
        chars.next();
    }

    let mut attrs = BTreeMap::new();
    loop {
        while matches!(chars.peek(), Some(&(_, c)) if c.is_whitespace()) {
            chars.next();
        }
        match chars.peek() {
            Some(&(_, '>')) => {
                chars.next();
                break;
            }
            Some(&(_, '/')) => {
                chars.next();
                if matches!(chars.next(), Some((_, '>'))) {
                    return Ok(XmlNode { tag, attrs, text: String::new(), children: Vec::new() });
                }
                return Err(XmlError::Malformed(0));
            }
            Some(_) => {
                let (name, value) = parse_attr(chars)?;
                attrs.insert(name, value);
            }
            None => return Err(XmlError::UnexpectedEof),
        }
    }

    let mut text = String::new();
    let mut children = Vec::new();
    loop {
        match chars.peek().copied() {
            Some((_, '<')) => {
                let mut lookahead = chars.clone();
                lookahead.next();
                if matches!(lookahead.peek(), Some(&(_, '/'))) {
                    chars.next();
                    chars.next();
                    let mut closing = String::new();
                    while let Some(&(_, c)) = chars.peek() {
                        if c == '>' {
                            chars.next();
                            break;
                        }
                        closing.push(c);
                        chars.next();
                    }
                    break;
                }
                children.push(parse_element(chars)?);
            }
            Some(_) => {
                let (_, c) = chars.next().unwrap();
                text.push(c);
            }
            None => return Err(XmlError::UnexpectedEof),
        }
    }

    Ok(XmlNode { tag, attrs, text: text.trim().to_string(), children })
}

fn parse_attr(chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>) -> XmlResult<(String, String)> {
    let mut name = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if c == '=' {
            chars.next();
            break;
        }
        name.push(c);
        chars.next();
    }
    let quote = match chars.next() {
        Some((_, q @ ('"' | '\''))) => q,
        _ => return Err(XmlError::Malformed(0)),
    };
    let mut value = String::new();
    loop {
        match chars.next() {
            Some((_, c)) if c == quote => break,
            Some((_, c)) => value.push(c),
            None => return Err(XmlError::UnexpectedEof),
        }
    }
    Ok((name.trim().to_string(), value))
}
