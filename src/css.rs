//! Rule-level stylesheet purging.
//!
//! The stylesheet is split into comments, style rules and at-rules. Style
//! rules keep only the selectors whose classes were seen in the content
//! corpus; grouping at-rules (`@media`, `@supports`, ...) are purged
//! recursively and dropped once empty. Everything the parser does not
//! understand is carried through verbatim.

use indexmap::{IndexMap, IndexSet};
use regex::RegexSet;
use serde::{Deserialize, Serialize};

/// At-rules whose block contains further rules rather than declarations
const GROUPING_AT_RULES: &[&str] = &[
    "media",
    "supports",
    "layer",
    "document",
    "-moz-document",
    "container",
];

/// A parsed piece of a stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Comment(String),
    Rule {
        selectors: String,
        body: String,
    },
    AtRule {
        name: String,
        prelude: String,
        block: Option<AtBlock>,
    },
    /// Text the parser could not make sense of (unbalanced braces etc.)
    Raw(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AtBlock {
    Rules(Vec<Node>),
    Verbatim(String),
}

/// Lookup of class names that were seen in the content corpus
pub trait ClassSet {
    fn contains_class(&self, class: &str) -> bool;
}

impl ClassSet for IndexSet<String> {
    fn contains_class(&self, class: &str) -> bool {
        self.contains(class)
    }
}

impl<V> ClassSet for IndexMap<String, V> {
    fn contains_class(&self, class: &str) -> bool {
        self.contains_key(class)
    }
}

/// Counters describing what a purge removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PurgeStats {
    pub rules_kept: usize,
    pub rules_removed: usize,
    pub selectors_removed: usize,
}

/// Result of purging one stylesheet
#[derive(Debug, Clone)]
pub struct PurgeOutcome {
    pub css: String,
    pub stats: PurgeStats,
}

/// Parse a stylesheet into nodes. Never fails; malformed input ends up in
/// [`Node::Raw`].
pub fn parse(css: &str) -> Vec<Node> {
    let mut parser = Parser { src: css, pos: 0 };
    let (nodes, _) = parser.nodes(false);
    nodes
}

/// Render nodes back to CSS text
pub fn render(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        render_node(node, &mut out);
        out.push('\n');
    }
    out
}

fn render_node(node: &Node, out: &mut String) {
    match node {
        Node::Comment(text) | Node::Raw(text) => out.push_str(text),
        Node::Rule { selectors, body } => {
            out.push_str(selectors);
            out.push_str(" {");
            out.push_str(body);
            out.push('}');
        }
        Node::AtRule {
            name,
            prelude,
            block,
        } => {
            out.push('@');
            out.push_str(name);
            if !prelude.is_empty() {
                out.push(' ');
                out.push_str(prelude);
            }
            match block {
                None => out.push(';'),
                Some(AtBlock::Verbatim(body)) => {
                    out.push_str(" {");
                    out.push_str(body);
                    out.push('}');
                }
                Some(AtBlock::Rules(children)) => {
                    out.push_str(" {\n");
                    for child in children {
                        render_node(child, out);
                        out.push('\n');
                    }
                    out.push('}');
                }
            }
        }
    }
}

/// Remove every rule whose selectors reference only unused classes.
///
/// A selector survives when it matches one of `keep`, references no class,
/// or every class it references is in `used`.
pub fn purge_css<S: ClassSet + ?Sized>(css: &str, used: &S, keep: &RegexSet) -> PurgeOutcome {
    let mut stats = PurgeStats::default();
    let nodes = purge_nodes(parse(css), used, keep, &mut stats);
    PurgeOutcome {
        css: render(&nodes),
        stats,
    }
}

fn purge_nodes<S: ClassSet + ?Sized>(
    nodes: Vec<Node>,
    used: &S,
    keep: &RegexSet,
    stats: &mut PurgeStats,
) -> Vec<Node> {
    let mut kept = Vec::with_capacity(nodes.len());
    for node in nodes {
        match node {
            Node::Rule { selectors, body } => {
                let all = split_selectors(&selectors);
                let total = all.len();
                let surviving: Vec<&str> = all
                    .into_iter()
                    .filter(|selector| selector_is_used(selector, used, keep))
                    .collect();
                stats.selectors_removed += total - surviving.len();
                if surviving.is_empty() {
                    stats.rules_removed += 1;
                    continue;
                }
                stats.rules_kept += 1;
                let selectors = if surviving.len() == total {
                    selectors
                } else {
                    surviving.join(", ")
                };
                kept.push(Node::Rule { selectors, body });
            }
            Node::AtRule {
                name,
                prelude,
                block: Some(AtBlock::Rules(children)),
            } => {
                let children = purge_nodes(children, used, keep, stats);
                if children.iter().all(|c| matches!(c, Node::Comment(_))) {
                    continue;
                }
                kept.push(Node::AtRule {
                    name,
                    prelude,
                    block: Some(AtBlock::Rules(children)),
                });
            }
            other => kept.push(other),
        }
    }
    kept
}

fn selector_is_used<S: ClassSet + ?Sized>(selector: &str, used: &S, keep: &RegexSet) -> bool {
    if keep.is_match(selector) {
        return true;
    }
    selector_classes(selector)
        .iter()
        .all(|class| used.contains_class(class))
}

/// Split a selector list on top-level commas
pub fn split_selectors(list: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    let mut chars = list.char_indices();
    while let Some((i, c)) = chars.next() {
        if let Some(q) = quote {
            if c == '\\' {
                chars.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\\' => {
                chars.next();
            }
            '"' | '\'' => quote = Some(c),
            '(' | '[' => depth += 1,
            ')' | ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                parts.push(list[start..i].trim());
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(list[start..].trim());
    parts.retain(|p| !p.is_empty());
    parts
}

/// Class names a single selector requires, with CSS escapes resolved.
///
/// Classes inside attribute brackets or functional pseudo-classes
/// (`:not(.a)`, `:is(.b)`) are not required.
pub fn selector_classes(selector: &str) -> Vec<String> {
    let chars: Vec<char> = selector.chars().collect();
    let mut classes = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = 0;
    while i < chars.len() {
        let c = chars[i];
        if let Some(q) = quote {
            if c == '\\' {
                i += 1;
            } else if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '\\' => i += 2,
            '"' | '\'' => {
                quote = Some(c);
                i += 1;
            }
            '(' | '[' => {
                depth += 1;
                i += 1;
            }
            ')' | ']' => {
                depth = depth.saturating_sub(1);
                i += 1;
            }
            '.' if depth == 0 => {
                let (name, next) = read_ident(&chars, i + 1);
                if !name.is_empty() {
                    classes.push(name);
                }
                i = next;
            }
            _ => i += 1,
        }
    }
    classes
}

fn read_ident(chars: &[char], mut i: usize) -> (String, usize) {
    let mut name = String::new();
    while i < chars.len() {
        let c = chars[i];
        if c == '\\' {
            i += 1;
            let mut hex = String::new();
            while i < chars.len() && hex.len() < 6 && chars[i].is_ascii_hexdigit() {
                hex.push(chars[i]);
                i += 1;
            }
            if hex.is_empty() {
                if let Some(&escaped) = chars.get(i) {
                    name.push(escaped);
                    i += 1;
                }
            } else {
                let decoded = u32::from_str_radix(&hex, 16)
                    .ok()
                    .and_then(char::from_u32)
                    .unwrap_or(char::REPLACEMENT_CHARACTER);
                name.push(decoded);
                if chars.get(i).is_some_and(|c| c.is_whitespace()) {
                    i += 1;
                }
            }
        } else if c.is_alphanumeric() || c == '-' || c == '_' || !c.is_ascii() {
            name.push(c);
            i += 1;
        } else {
            break;
        }
    }
    (name, i)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    fn skip_whitespace(&mut self) {
        let rest = self.rest();
        self.pos += rest.len() - rest.trim_start().len();
    }

    /// Parse nodes until end of input, or until the closing `}` when
    /// `nested`. The flag reports whether that `}` was found.
    fn nodes(&mut self, nested: bool) -> (Vec<Node>, bool) {
        let mut nodes = Vec::new();
        loop {
            self.skip_whitespace();
            let rest = self.rest();
            if rest.is_empty() {
                return (nodes, !nested);
            }
            if rest.starts_with("/*") {
                let end = rest[2..].find("*/").map_or(rest.len(), |i| i + 4);
                nodes.push(Node::Comment(rest[..end].to_string()));
                self.pos += end;
            } else if rest.starts_with('}') {
                self.pos += 1;
                if nested {
                    return (nodes, true);
                }
                nodes.push(Node::Raw("}".to_string()));
            } else if rest.starts_with('@') {
                nodes.push(self.at_rule());
            } else {
                nodes.push(self.rule());
            }
        }
    }

    fn at_rule(&mut self) -> Node {
        let start = self.pos;
        let rest = &self.rest()[1..];
        let name_len = rest
            .find(|c: char| !(c.is_alphanumeric() || c == '-' || c == '_'))
            .unwrap_or(rest.len());
        let name = rest[..name_len].to_string();
        self.pos += 1 + name_len;

        let Some((prelude_end, terminator)) = scan_until(self.rest(), &[';', '{']) else {
            return self.raw_from(start);
        };
        let prelude = self.rest()[..prelude_end].trim().to_string();
        self.pos += prelude_end + 1;

        if terminator == ';' {
            return Node::AtRule {
                name,
                prelude,
                block: None,
            };
        }

        if GROUPING_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) {
            let (children, closed) = self.nodes(true);
            if !closed {
                return self.raw_from(start);
            }
            Node::AtRule {
                name,
                prelude,
                block: Some(AtBlock::Rules(children)),
            }
        } else {
            match self.block_body() {
                Some(body) => Node::AtRule {
                    name,
                    prelude,
                    block: Some(AtBlock::Verbatim(body)),
                },
                None => self.raw_from(start),
            }
        }
    }

    fn rule(&mut self) -> Node {
        let start = self.pos;
        let Some((selector_end, _)) = scan_until(self.rest(), &['{']) else {
            return self.raw_from(start);
        };
        let selectors = self.rest()[..selector_end].trim().to_string();
        self.pos += selector_end + 1;
        match self.block_body() {
            Some(body) => Node::Rule { selectors, body },
            None => self.raw_from(start),
        }
    }

    /// Read up to the `}` matching an already consumed `{`
    fn block_body(&mut self) -> Option<String> {
        let rest = self.rest();
        let mut depth = 1usize;
        let mut offset = 0;
        loop {
            let (i, c) = scan_until(&rest[offset..], &['{', '}'])?;
            offset += i + 1;
            if c == '{' {
                depth += 1;
            } else {
                depth -= 1;
                if depth == 0 {
                    let body = rest[..offset - 1].to_string();
                    self.pos += offset;
                    return Some(body);
                }
            }
        }
    }

    fn raw_from(&mut self, start: usize) -> Node {
        self.pos = self.src.len();
        Node::Raw(self.src[start..].trim_end().to_string())
    }
}

/// Byte offset of the first of `stops` outside strings, comments and
/// parentheses.
fn scan_until(text: &str, stops: &[char]) -> Option<(usize, char)> {
    let mut quote: Option<char> = None;
    let mut parens = 0usize;
    let mut iter = text.char_indices().peekable();
    while let Some((i, c)) = iter.next() {
        if let Some(q) = quote {
            if c == '\\' {
                iter.next();
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\\' => {
                iter.next();
            }
            '"' | '\'' => quote = Some(c),
            '/' if text[i..].starts_with("/*") => {
                let end = text[i + 2..].find("*/").map(|e| i + 2 + e + 2)?;
                while iter.peek().is_some_and(|&(j, _)| j < end) {
                    iter.next();
                }
            }
            '(' => parens += 1,
            ')' => parens = parens.saturating_sub(1),
            _ if parens == 0 && stops.contains(&c) => return Some((i, c)),
            _ => {}
        }
    }
    None
}
