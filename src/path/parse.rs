//! Path literal parser.
//!
//! Accepts the form `status_report()` prints:
//! - a leading `/` for absolute paths,
//! - segments separated by `/`, or by `|` to open a new group,
//! - `Filter:typeof(ClassName)` and `Filter:path(<path>)` segments, each
//!   optionally followed by `(args)`,
//! - `&name` directors and the standard tokens `. .. ~ .* .+ ^ $`.
//!
//! Separators inside parentheses belong to the segment, so nested filter
//! paths and regex groups such as `(in|out)` survive.

use crate::catalog::{Registry, types};
use crate::filter::{FilterArgs, split_include};
use crate::{Error, Result};

use super::{DIRECTORY_SEPARATOR, GROUP_SEPARATOR, Path, PathNode};

const FILTER_TYPE_PREFIX: &str = "Filter:typeof(";
const FILTER_PATH_PREFIX: &str = "Filter:path(";

/// Scanner state: the literal and a byte cursor into it.
struct Parser<'t> {
    text: &'t str,
    pos: usize,
    /// Offset of `text` inside the outermost literal, for error positions.
    base: usize,
}

impl<'t> Parser<'t> {
    fn new(text: &'t str, base: usize) -> Self {
        Self { text, pos: 0, base }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += c.len_utf8();
        Some(c)
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.advance();
            true
        } else {
            false
        }
    }

    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn error(&self, at: usize, message: impl Into<String>) -> Error {
        Error::SyntaxError { position: self.base + at, message: message.into() }
    }

    /// Consume one segment: everything up to a separator outside
    /// parentheses. Returns the segment's start offset and text.
    fn segment(&mut self) -> Result<(usize, &'t str)> {
        let start = self.pos;
        let mut depth = 0usize;
        while let Some(c) = self.peek() {
            match c {
                '(' => depth += 1,
                ')' => {
                    depth = depth.checked_sub(1).ok_or_else(|| self.error(self.pos, "unbalanced ')'"))?;
                }
                DIRECTORY_SEPARATOR | GROUP_SEPARATOR if depth == 0 => break,
                _ => {}
            }
            self.advance();
        }
        if depth != 0 {
            return Err(self.error(start, "unclosed '('"));
        }
        if self.pos == start {
            return Err(self.error(start, "empty path segment"));
        }
        Ok((start, &self.text[start..self.pos]))
    }
}

pub(super) fn parse_path(text: &str, registry: &Registry) -> Result<Path> {
    parse_at(text, 0, registry)
}

fn parse_at(text: &str, base: usize, registry: &Registry) -> Result<Path> {
    let mut p = Parser::new(text, base);
    let mut path = Path::new();
    if p.eat(DIRECTORY_SEPARATOR) {
        path = Path::absolute();
        if p.at_end() {
            return Ok(path);
        }
    }
    let mut boundary = false;
    loop {
        let (start, segment) = p.segment()?;
        let node = parse_segment(segment, base + start, registry)?;
        path = if boundary { path.push_group_node(node) } else { path.push_node(node) };

        if p.at_end() {
            break;
        }
        boundary = p.advance() == Some(GROUP_SEPARATOR);
        if p.at_end() {
            return Err(p.error(p.pos, "path ends with a separator"));
        }
    }
    Ok(path)
}

fn parse_segment(segment: &str, at: usize, registry: &Registry) -> Result<PathNode> {
    if let Some(rest) = segment.strip_prefix(FILTER_TYPE_PREFIX) {
        let (name, tail) = split_parenthesized(rest, at + FILTER_TYPE_PREFIX.len())?;
        let info = registry.find_by_name(name).ok_or_else(|| Error::SyntaxError {
            position: at + FILTER_TYPE_PREFIX.len(),
            message: format!("unknown filter type '{name}'"),
        })?;
        let args_at = at + segment.len() - tail.len();
        let args = match parse_args(tail, args_at)? {
            // Path filters take a nested path literal.
            Some(FilterArgs::Opaque(text)) if info.type_code() == types::PATH_FILTER => {
                Some(path_filter_args(&text, args_at + 1, registry)?)
            }
            other => other,
        };
        return PathNode::filter(info, args);
    }
    if let Some(rest) = segment.strip_prefix(FILTER_PATH_PREFIX) {
        let inner_at = at + FILTER_PATH_PREFIX.len();
        let (inner, tail) = split_parenthesized(rest, inner_at)?;
        let path = parse_at(inner, inner_at, registry)?;
        let args = parse_args(tail, at + segment.len() - tail.len())?;
        return Ok(PathNode::filter_at(path, args));
    }
    PathNode::token(segment)
}

/// Split `text` (just past an opening parenthesis) at its matching close.
fn split_parenthesized(text: &str, at: usize) -> Result<(&str, &str)> {
    let mut depth = 1usize;
    for (i, c) in text.char_indices() {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&text[..i], &text[i + 1..]));
                }
            }
            _ => {}
        }
    }
    Err(Error::SyntaxError { position: at, message: "unclosed '('".into() })
}

fn parse_args(tail: &str, at: usize) -> Result<Option<FilterArgs>> {
    if tail.is_empty() {
        return Ok(None);
    }
    match tail.strip_prefix('(').and_then(|t| t.strip_suffix(')')) {
        Some(args) => Ok(Some(FilterArgs::Opaque(args.to_string()))),
        None => Err(Error::SyntaxError { position: at, message: format!("unexpected '{tail}' after filter") }),
    }
}

/// `<path>[,include|exclude]`
fn path_filter_args(text: &str, at: usize, registry: &Registry) -> Result<FilterArgs> {
    let (literal, include) = split_include(text);
    Ok(FilterArgs::Path { path: parse_at(literal, at, registry)?, include })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::PathNodeKind;

    fn parse(text: &str) -> Result<Path> {
        Path::parse(text, &Registry::standard())
    }

    #[test]
    fn test_round_trip() {
        for literal in [
            "/tmp/PathTest/Filter:typeof(NameFilter)(args)|b..",
            "./a2/b..",
            "./.*/b2.",
            "../~/&InputDirector",
            "/",
            "./cells|.+|in",
            "./Filter:path(/lib/filters/picker)",
            "./Filter:typeof(PathFilter)(./a3/b3.,exclude)",
            "./grid/cell(1,2)",
            "./dst|in(+)",
            "./Filter:typeof(NameFilter)(b2[12],exclude)",
        ] {
            assert_eq!(parse(literal).unwrap().status_report(), literal);
        }
    }

    #[test]
    fn test_kinds_and_groups() {
        let path = parse("/tmp|a.|b").unwrap();
        let kinds: Vec<_> = path.nodes().iter().map(|n| format!("{:?}", n.kind())).collect();
        assert!(kinds[0].starts_with("Absolute"));
        assert!(matches!(path.nodes()[2].kind(), PathNodeKind::Regex(_)));
        assert!(path.nodes()[2].is_group_boundary());
        assert_eq!(path.group_count(), 2);
    }

    #[test]
    fn test_separator_inside_parentheses() {
        let path = parse("./(in|out)put").unwrap();
        assert_eq!(path.len(), 2);
        assert!(matches!(path.nodes()[1].kind(), PathNodeKind::Regex(_)));
    }

    #[test]
    fn test_errors_carry_position() {
        assert!(matches!(parse("./a//b"), Err(Error::SyntaxError { position: 4, .. })));
        assert!(matches!(parse("./a/"), Err(Error::SyntaxError { position: 4, .. })));
        assert!(matches!(parse("./Filter:typeof(Nope)"), Err(Error::SyntaxError { position: 16, .. })));
        assert!(matches!(parse("./Filter:typeof(NameFilter"), Err(Error::SyntaxError { .. })));
        assert!(matches!(parse("./Filter:typeof(Container)"), Err(Error::FilterConstruction(_))));
    }
}
