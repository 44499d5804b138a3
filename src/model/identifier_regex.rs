//! Identifier patterns: regex terms over name, position and type name.
//!
//! Matching is an unanchored search, so `b2` matches `b21`. Anchor with
//! `^`/`$` inside the pattern when an exact match is wanted.

use std::fmt;

use regex::Regex;

use super::identifier::Identifier;
use super::point::{PointRegex, split_position};
use crate::{Error, Result};

/// Characters that make a token a regular expression rather than a literal.
pub const REGEX_CHARS: &[char] = &['.', '$', '^', '{', '[', '(', '|', ')', '*', '+', '?', '\\'];

/// Pattern text meaning "exactly one arbitrary segment".
pub const WILD_PATTERN: &str = ".+";

/// Pattern text meaning "zero or more segments".
pub const ANY_PATTERN: &str = ".*";

pub fn is_regex(text: &str) -> bool {
    text.contains(REGEX_CHARS)
}

pub(crate) fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// One text term of an [`IdentifierRegex`].
#[derive(Debug, Clone)]
pub enum TextPattern {
    /// Matches any text, and also a missing term.
    Wild,
    Regex(Regex),
}

impl TextPattern {
    pub fn new(pattern: &str) -> Result<Self> {
        if pattern == WILD_PATTERN {
            Ok(TextPattern::Wild)
        } else {
            compile(pattern).map(TextPattern::Regex)
        }
    }

    pub fn is_wild(&self) -> bool {
        matches!(self, TextPattern::Wild)
    }

    pub fn as_str(&self) -> &str {
        match self {
            TextPattern::Wild => WILD_PATTERN,
            TextPattern::Regex(r) => r.as_str(),
        }
    }

    pub fn matches(&self, text: Option<&str>) -> bool {
        match (self, text) {
            (TextPattern::Wild, _) => true,
            (TextPattern::Regex(r), Some(t)) => r.is_match(t),
            (TextPattern::Regex(_), None) => false,
        }
    }

    /// Whether some text could satisfy both patterns. Literal-looking sources
    /// are tried against the other pattern; otherwise sources must agree.
    pub fn pattern_matches(&self, other: &TextPattern) -> bool {
        match (self, other) {
            (TextPattern::Wild, _) | (_, TextPattern::Wild) => true,
            (TextPattern::Regex(a), TextPattern::Regex(b)) => {
                a.as_str() == b.as_str()
                    || (!is_regex(a.as_str()) && b.is_match(a.as_str()))
                    || (!is_regex(b.as_str()) && a.is_match(b.as_str()))
            }
        }
    }
}

impl PartialEq for TextPattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

/// Pattern form of an [`Identifier`]. An absent term matches anything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentifierRegex {
    name: Option<TextPattern>,
    position: Option<PointRegex>,
    type_name: Option<TextPattern>,
}

impl IdentifierRegex {
    pub fn new(name: &str) -> Result<Self> {
        Ok(Self { name: Some(TextPattern::new(name)?), ..Self::default() })
    }

    /// Parse the `name(position):type` form written by `status_report`.
    /// Every term is optional; an empty name leaves the name term absent.
    pub fn parse(text: &str) -> Result<Self> {
        let (rest, type_name) = match text.rsplit_once(':') {
            Some((head, t)) if !t.is_empty() && !t.contains([')', ']']) => (head, Some(t)),
            _ => (text, None),
        };
        let (name, position) = match split_position(rest) {
            Some((name, position)) => (name, Some(position)),
            None => (rest, None),
        };
        let name = if name.is_empty() { None } else { Some(TextPattern::new(name)?) };
        let type_name = type_name.map(TextPattern::new).transpose()?;
        Ok(Self { name, position, type_name })
    }

    pub fn wild() -> Self {
        Self { name: Some(TextPattern::Wild), ..Self::default() }
    }

    pub fn with_position(mut self, position: PointRegex) -> Self {
        self.position = Some(position);
        self
    }

    pub fn with_type_name(mut self, type_name: &str) -> Result<Self> {
        self.type_name = Some(TextPattern::new(type_name)?);
        Ok(self)
    }

    pub fn name(&self) -> Option<&TextPattern> {
        self.name.as_ref()
    }

    pub fn position(&self) -> Option<&PointRegex> {
        self.position.as_ref()
    }

    pub fn type_name(&self) -> Option<&TextPattern> {
        self.type_name.as_ref()
    }

    pub fn is_wild(&self) -> bool {
        self.name.as_ref().is_none_or(TextPattern::is_wild)
            && self.position.as_ref().is_none_or(|p| matches!(p, PointRegex::Wild))
            && self.type_name.as_ref().is_none_or(TextPattern::is_wild)
    }

    /// A segment whose position pattern has no declared count.
    pub fn is_unbounded(&self) -> bool {
        matches!(self.position, Some(PointRegex::Unbounded))
    }

    /// Name and position test; the type term is ignored.
    pub fn matches(&self, identifier: &Identifier) -> bool {
        self.name.as_ref().is_none_or(|n| n.matches(identifier.name()))
            && self.position.as_ref().is_none_or(|p| p.matches(identifier.position()))
    }

    /// Full test, with `type_name` the class name of the identified property.
    pub fn matches_typed(&self, identifier: &Identifier, type_name: Option<&str>) -> bool {
        self.matches(identifier) && self.type_name.as_ref().is_none_or(|t| t.matches(type_name))
    }

    /// Whether some identifier could satisfy both patterns.
    pub fn pattern_matches(&self, other: &IdentifierRegex) -> bool {
        fn both<T>(a: &Option<T>, b: &Option<T>, f: impl Fn(&T, &T) -> bool) -> bool {
            match (a, b) {
                (Some(a), Some(b)) => f(a, b),
                _ => true,
            }
        }
        both(&self.name, &other.name, TextPattern::pattern_matches)
            && both(&self.position, &other.position, PointRegex::pattern_matches)
            && both(&self.type_name, &other.type_name, TextPattern::pattern_matches)
    }

    pub fn status_report(&self) -> String {
        let mut out = self.name.as_ref().map_or_else(String::new, |n| n.as_str().to_string());
        if let Some(p) = &self.position {
            out.push_str(&p.to_string());
        }
        if let Some(t) = &self.type_name {
            out.push(':');
            out.push_str(t.as_str());
        }
        out
    }
}

impl fmt::Display for IdentifierRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_report())
    }
}
