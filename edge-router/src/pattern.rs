use std::{fmt, str::FromStr};

use regex::Regex;

use crate::{
    error::PatternError,
    params::{Params, WILDCARD},
};

/// Characters a named segment matches.
const VALUE_CHARSET: &str = r"a-zA-Z0-9@.+\-_";

/// A compiled route pattern.
///
/// Syntax:
///
/// - `:name` matches one or more segment-value characters and captures them
///   under `name`;
/// - `*` matches anything (lazily) and captures it under `_`;
/// - `( ... )` makes the enclosed part optional;
/// - `\c` matches the character `c` literally;
/// - everything else matches itself.
///
/// Patterns are anchored: they must match the whole subject.
///
/// ```
/// use edge_router::Pattern;
///
/// let pattern = Pattern::new("/api/users(/:id)").unwrap();
/// let params = pattern.matches("/api/users/10").unwrap();
/// assert_eq!(params.get("id"), Some("10"));
/// assert!(pattern.matches("/api/users").unwrap().is_empty());
/// assert!(pattern.matches("/api/user").is_none());
/// ```
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    names: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Node {
    Static(String),
    Named(String),
    Wildcard,
    Optional(Vec<Node>),
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl Pattern {
    pub fn new(source: &str) -> Result<Self, PatternError> {
        if source.is_empty() {
            return Err(PatternError::Empty);
        }
        if let Some((pos, _)) = source.char_indices().find(|(_, c)| c.is_whitespace()) {
            return Err(PatternError::Whitespace(pos));
        }

        let nodes = Parser { src: source, pos: 0 }.parse()?;
        let mut names = Vec::new();
        let mut re = String::from("^");
        to_regex(&nodes, &mut re, &mut names);
        re.push('$');

        Ok(Self {
            source: source.to_string(),
            regex: Regex::new(&re)?,
            names,
        })
    }

    /// Wraps a hand-written regex. Capture group `n` is reported under
    /// `names[n - 1]`.
    pub fn from_regex<I, N>(regex: Regex, names: I) -> Result<Self, PatternError>
    where
        I: IntoIterator<Item = N>,
        N: Into<String>,
    {
        let names: Vec<String> = names.into_iter().map(Into::into).collect();
        let groups = regex.captures_len() - 1;
        if names.len() != groups {
            return Err(PatternError::NameCount {
                names: names.len(),
                groups,
            });
        }
        Ok(Self {
            source: regex.as_str().to_string(),
            regex,
            names,
        })
    }

    /// Matches `subject` against the pattern.
    ///
    /// Returns `None` when the subject does not match. A match on a pattern
    /// without captures yields empty params.
    pub fn matches(&self, subject: &str) -> Option<Params> {
        let caps = self.regex.captures(subject)?;
        let mut params = Params::new();
        for (i, name) in self.names.iter().enumerate() {
            if let Some(m) = caps.get(i + 1) {
                params.push(name.as_str(), m.as_str());
            }
        }
        Some(params)
    }

    pub fn is_match(&self, subject: &str) -> bool {
        self.regex.is_match(subject)
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Capture names in group order; wildcards appear as `_`.
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl FromStr for Pattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// Conversion used by the registration API, so a route can be given
/// either a pattern string or an already compiled [`Pattern`].
pub trait IntoPattern {
    fn into_pattern(self) -> Result<Pattern, PatternError>;
}

impl IntoPattern for Pattern {
    fn into_pattern(self) -> Result<Pattern, PatternError> {
        Ok(self)
    }
}

impl IntoPattern for &str {
    fn into_pattern(self) -> Result<Pattern, PatternError> {
        Pattern::new(self)
    }
}

impl IntoPattern for String {
    fn into_pattern(self) -> Result<Pattern, PatternError> {
        Pattern::new(&self)
    }
}

impl IntoPattern for &String {
    fn into_pattern(self) -> Result<Pattern, PatternError> {
        Pattern::new(self)
    }
}

impl Parser<'_> {
    fn parse(mut self) -> Result<Vec<Node>, PatternError> {
        let nodes = self.sequence(None)?;
        debug_assert_eq!(self.pos, self.src.len());
        Ok(nodes)
    }

    fn peek(&self) -> Option<char> {
        self.src[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    /// Parses until end of input, or until the `)` closing the group
    /// opened at `open`.
    fn sequence(&mut self, open: Option<usize>) -> Result<Vec<Node>, PatternError> {
        let mut nodes = Vec::new();
        loop {
            let start = self.pos;
            let Some(c) = self.peek() else {
                return match open {
                    Some(at) => Err(PatternError::UnclosedGroup(at)),
                    None => Ok(nodes),
                };
            };
            match c {
                ')' => {
                    if open.is_none() {
                        return Err(PatternError::UnexpectedClose(start));
                    }
                    self.bump();
                    return Ok(nodes);
                }
                '(' => {
                    self.bump();
                    let inner = self.sequence(Some(start))?;
                    if inner.is_empty() {
                        return Err(PatternError::EmptyGroup(start));
                    }
                    nodes.push(Node::Optional(inner));
                }
                '*' => {
                    self.bump();
                    nodes.push(Node::Wildcard);
                }
                ':' => {
                    self.bump();
                    let name = self.name();
                    if name.is_empty() {
                        // a colon not followed by a name is plain text
                        push_static(&mut nodes, ':');
                    } else {
                        nodes.push(Node::Named(name.to_string()));
                    }
                }
                '\\' => {
                    self.bump();
                    let escaped = self.bump().ok_or(PatternError::DanglingEscape(start))?;
                    push_static(&mut nodes, escaped);
                }
                c => {
                    self.bump();
                    push_static(&mut nodes, c);
                }
            }
        }
    }

    fn name(&mut self) -> &str {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if !is_name_char(c) {
                break;
            }
            self.bump();
        }
        &self.src[start..self.pos]
    }
}

/// Segment names are `[a-zA-Z0-9_-]+`.
fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-'
}

fn push_static(nodes: &mut Vec<Node>, c: char) {
    if let Some(Node::Static(s)) = nodes.last_mut() {
        s.push(c);
    } else {
        nodes.push(Node::Static(c.to_string()));
    }
}

fn to_regex(nodes: &[Node], re: &mut String, names: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Static(s) => re.push_str(&regex::escape(s)),
            Node::Named(name) => {
                re.push_str(&format!("([{VALUE_CHARSET}]+)"));
                names.push(name.clone());
            }
            Node::Wildcard => {
                re.push_str("(.*?)");
                names.push(WILDCARD.to_string());
            }
            Node::Optional(inner) => {
                re.push_str("(?:");
                to_regex(inner, re, names);
                re.push_str(")?");
            }
        }
    }
}
