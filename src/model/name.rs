//! Qualified-name algebra.
//!
//! A [`QualifiedName`] is an ordered sequence of identifier tokens
//! (`a::b::C`). Names arriving from the front-end may carry template
//! argument lists and anonymous-namespace markers; construction strips the
//! former at the first top-level `<` and elides the latter entirely, so that
//! equality and prefix matching work token-wise on what remains.

use std::fmt;

use serde::Serialize;

/// An ordered sequence of scope tokens forming a fully-qualified name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct QualifiedName {
    tokens: Vec<String>,
}

/// Anonymous and unnamed scope markers are dropped at construction; the
/// rendered name never contains them.
fn is_anonymous_token(token: &str) -> bool {
    token.is_empty()
        || token.starts_with("(anonymous")
        || token.starts_with("(unnamed")
        || token == "(lambda)"
}

impl QualifiedName {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a name from pre-split tokens, eliding anonymous markers.
    pub fn from_tokens<I, S>(tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut name = Self::new();
        for token in tokens {
            name.push(token);
        }
        name
    }

    /// Parses `a::b::C<T, U>` into `[a, b, C]`.
    ///
    /// Everything from the first `<` that opens a template argument list at
    /// scope depth zero is dropped before splitting on `::`.
    pub fn parse(input: &str) -> Self {
        let truncated = strip_template_arguments(input);
        Self::from_tokens(truncated.split("::").map(str::trim))
    }

    /// Appends a token unless it is an anonymous-scope marker.
    pub fn push(&mut self, token: impl Into<String>) {
        let token = token.into();
        if !is_anonymous_token(token.trim()) {
            self.tokens.push(token.trim().to_string());
        }
    }

    /// Removes and returns the last token.
    pub fn pop_back(&mut self) -> Option<String> {
        self.tokens.pop()
    }

    /// The last token, or the empty string for an empty name.
    pub fn name(&self) -> &str {
        self.tokens.last().map(String::as_str).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// True when `prefix` matches the leading tokens of this name.
    pub fn starts_with(&self, prefix: &QualifiedName) -> bool {
        self.tokens.len() >= prefix.tokens.len()
            && self.tokens[..prefix.tokens.len()] == prefix.tokens[..]
    }

    /// Strips the longest matching prefix of `root`.
    ///
    /// When `root` does not prefix this name the name is returned unchanged.
    pub fn relative_to(&self, root: &QualifiedName) -> QualifiedName {
        if !root.is_empty() && self.starts_with(root) {
            QualifiedName {
                tokens: self.tokens[root.tokens.len()..].to_vec(),
            }
        } else {
            self.clone()
        }
    }

    /// All tokens but the last: the enclosing scope of this name.
    pub fn parent(&self) -> QualifiedName {
        let mut parent = self.clone();
        parent.pop_back();
        parent
    }

    /// Returns a copy with `token` appended.
    pub fn appending(&self, token: impl Into<String>) -> QualifiedName {
        let mut child = self.clone();
        child.push(token);
        child
    }

    /// Returns a copy with all of `tail`'s tokens appended.
    pub fn joined(&self, tail: &QualifiedName) -> QualifiedName {
        let mut joined = self.clone();
        joined.tokens.extend(tail.tokens.iter().cloned());
        joined
    }
}

/// Drops everything from the `<` opening the outermost template argument
/// list. `operator<` and friends are not expected here; the front-end hands
/// us declaration names, not expressions.
fn strip_template_arguments(input: &str) -> &str {
    match input.find('<') {
        Some(idx) => &input[..idx],
        None => input,
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.tokens.join("::"))
    }
}

impl From<&str> for QualifiedName {
    fn from(input: &str) -> Self {
        Self::parse(input)
    }
}

impl From<String> for QualifiedName {
    fn from(input: String) -> Self {
        Self::parse(&input)
    }
}
