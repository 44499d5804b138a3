//! Path segments.

use std::sync::{Arc, OnceLock};

use crate::catalog::{ClassTypeInfo, Registry, types};
use crate::filter::{FilterArgs, FilterSpec, GroupOrder};
use crate::model::{Identifier, IdentifierRegex, PointRegex, TextPattern, is_regex, split_position};
use crate::path::Path;
use crate::{Error, Result};

pub const ABSOLUTE: &str = "/";
pub const RELATIVE: &str = ".";
pub const PARENT: &str = "..";
pub const OWNER: &str = "~";
pub const ANY: &str = ".*";
pub const WILD: &str = ".+";
pub const START: &str = "^";
pub const END: &str = "$";
pub const DIRECTOR_PREFIX: char = '&';

#[derive(Debug, Clone)]
pub enum PathNodeKind {
    /// Exact identity lookup.
    Normal(Identifier),
    /// Every visible member whose identity matches.
    Regex(IdentifierRegex),
    /// The model root.
    Absolute,
    /// The current container.
    Relative,
    Parent,
    /// The property that created the path.
    Owner,
    /// Zero or more levels.
    Any,
    /// Exactly one level, any name.
    Wild,
    /// Route through a director; `None` picks it from the access mode.
    Director(Option<Identifier>),
    Filter(FilterSpec),
    Start,
    End,
}

#[derive(Debug, Clone)]
pub struct PathNode {
    pub(crate) kind: PathNodeKind,
    /// Starts a new group (written `|` before the segment).
    pub(crate) group_boundary: bool,
    /// Boundaries crossed between this segment and the tail.
    pub(crate) group_number: u32,
    pub(crate) is_unbounded: bool,
    /// Identifier filter synthesized on first use of a regex segment.
    regex_filter: OnceLock<Option<FilterSpec>>,
}

impl PathNode {
    pub fn new(kind: PathNodeKind) -> Self {
        let is_unbounded = matches!(&kind, PathNodeKind::Regex(r) if r.is_unbounded());
        Self { kind, group_boundary: false, group_number: 0, is_unbounded, regex_filter: OnceLock::new() }
    }

    /// The node a single path token stands for: a standard node, a regex
    /// segment when the text has regex metacharacters, a literal otherwise.
    pub fn token(text: &str) -> Result<PathNode> {
        let kind = match text {
            ABSOLUTE => PathNodeKind::Absolute,
            RELATIVE => PathNodeKind::Relative,
            PARENT => PathNodeKind::Parent,
            OWNER => PathNodeKind::Owner,
            ANY => PathNodeKind::Any,
            WILD => PathNodeKind::Wild,
            START => PathNodeKind::Start,
            END => PathNodeKind::End,
            _ => match text.strip_prefix(DIRECTOR_PREFIX) {
                Some("") => PathNodeKind::Director(None),
                Some(name) => PathNodeKind::Director(Some(Identifier::new(name))),
                None => match split_position(text) {
                    Some((name, PointRegex::Simple(point))) if !is_regex(name) => {
                        PathNodeKind::Normal(match name {
                            "" => Identifier::positioned(point),
                            name => Identifier::with_position(name, point),
                        })
                    }
                    _ if is_regex(text) => PathNodeKind::Regex(IdentifierRegex::parse(text)?),
                    _ => PathNodeKind::Normal(Identifier::new(text)),
                },
            },
        };
        Ok(Self::new(kind))
    }

    pub fn normal(identifier: impl Into<Identifier>) -> Self {
        Self::new(PathNodeKind::Normal(identifier.into()))
    }

    pub fn regex(regex: IdentifierRegex) -> Self {
        Self::new(PathNodeKind::Regex(regex))
    }

    pub fn director(name: Option<Identifier>) -> Self {
        Self::new(PathNodeKind::Director(name))
    }

    pub fn any() -> Self {
        Self::new(PathNodeKind::Any)
    }

    pub fn wild() -> Self {
        Self::new(PathNodeKind::Wild)
    }

    /// A filter segment of a registered filter type.
    pub fn filter(info: Arc<ClassTypeInfo>, args: Option<FilterArgs>) -> Result<Self> {
        if !info.is_filter() {
            return Err(Error::FilterConstruction(format!("{} is not a filter type", info.name())));
        }
        Ok(Self::new(PathNodeKind::Filter(FilterSpec::of_type(info, args))))
    }

    /// A filter segment whose type is named by a constructor at `path`.
    pub fn filter_at(path: Path, args: Option<FilterArgs>) -> Self {
        Self::new(PathNodeKind::Filter(FilterSpec::from_path(path, args)))
    }

    pub fn kind(&self) -> &PathNodeKind {
        &self.kind
    }

    pub fn is_group_boundary(&self) -> bool {
        self.group_boundary
    }

    pub fn group_number(&self) -> u32 {
        self.group_number
    }

    pub fn is_unbounded(&self) -> bool {
        self.is_unbounded
    }

    pub(crate) fn with_boundary(mut self, boundary: bool) -> Self {
        self.group_boundary = boundary;
        self
    }

    /// Segments that can match more than one property.
    pub fn is_multivalued(&self) -> bool {
        matches!(
            self.kind,
            PathNodeKind::Regex(_) | PathNodeKind::Any | PathNodeKind::Wild | PathNodeKind::Filter(_)
        )
    }

    /// The filter a regex segment enumerates through, built once.
    pub(crate) fn regex_filter(&self, registry: &Registry) -> Option<&FilterSpec> {
        let PathNodeKind::Regex(regex) = &self.kind else {
            return None;
        };
        self.regex_filter
            .get_or_init(|| {
                let info = registry.get(types::IDENTIFIER_FILTER)?;
                let args = FilterArgs::Identifier { regex: regex.clone(), include: true };
                Some(FilterSpec::of_type(info, Some(args)))
            })
            .as_ref()
    }

    /// Whether a property identity satisfies this segment, for segment
    /// kinds that name identities.
    pub fn identifier_matches(&self, identifier: &Identifier) -> bool {
        match &self.kind {
            PathNodeKind::Wild => true,
            PathNodeKind::Regex(r) => r.matches(identifier),
            PathNodeKind::Normal(id) => id == identifier,
            _ => false,
        }
    }

    pub fn status_report(&self) -> String {
        match &self.kind {
            PathNodeKind::Normal(id) => id.status_report(),
            PathNodeKind::Regex(r) => r.status_report(),
            PathNodeKind::Absolute => ABSOLUTE.to_string(),
            PathNodeKind::Relative => RELATIVE.to_string(),
            PathNodeKind::Parent => PARENT.to_string(),
            PathNodeKind::Owner => OWNER.to_string(),
            PathNodeKind::Any => ANY.to_string(),
            PathNodeKind::Wild => WILD.to_string(),
            PathNodeKind::Start => START.to_string(),
            PathNodeKind::End => END.to_string(),
            PathNodeKind::Director(name) => {
                format!("{DIRECTOR_PREFIX}{}", name.as_ref().map(Identifier::status_report).unwrap_or_default())
            }
            PathNodeKind::Filter(spec) => spec.status_report(),
        }
    }
}

// ============================================================================
// Filter segment helpers
// ============================================================================

fn filter_info(registry: &Registry, code: crate::catalog::TypeCode) -> Result<Arc<ClassTypeInfo>> {
    registry.get(code).ok_or_else(|| Error::UnknownType(code.to_string()))
}

impl PathNode {
    /// Members whose name matches `regex`.
    pub fn filter_name(registry: &Registry, regex: &str, include: bool) -> Result<Self> {
        let args = FilterArgs::Name { regex: TextPattern::new(regex)?, include };
        Self::filter(filter_info(registry, types::NAME_FILTER)?, Some(args))
    }

    /// Members whose full identity matches `regex`.
    pub fn filter_identifier(registry: &Registry, regex: IdentifierRegex, include: bool) -> Result<Self> {
        let args = FilterArgs::Identifier { regex, include };
        Self::filter(filter_info(registry, types::IDENTIFIER_FILTER)?, Some(args))
    }

    /// Members of (a type derived from) `type_code`.
    pub fn filter_type(registry: &Registry, type_code: crate::catalog::TypeCode, include: bool) -> Result<Self> {
        let args = FilterArgs::Type { type_code, include };
        Self::filter(filter_info(registry, types::TYPE_FILTER)?, Some(args))
    }

    /// Members whose class name matches `regex`.
    pub fn filter_type_name(registry: &Registry, regex: &str, include: bool) -> Result<Self> {
        let args = FilterArgs::TypeName { regex: TextPattern::new(regex)?, include };
        Self::filter(filter_info(registry, types::TYPE_NAME_FILTER)?, Some(args))
    }

    pub fn filter_point(registry: &Registry, regex: PointRegex, include: bool) -> Result<Self> {
        let args = FilterArgs::Point { regex, include };
        Self::filter(filter_info(registry, types::POINT_FILTER)?, Some(args))
    }

    /// Descendants whose absolute path matches `path`.
    pub fn filter_path(registry: &Registry, path: Path, include: bool) -> Result<Self> {
        let args = FilterArgs::Path { path, include };
        Self::filter(filter_info(registry, types::PATH_FILTER)?, Some(args))
    }

    pub fn filter_search(registry: &Registry, regex: IdentifierRegex, search_up: bool, include: bool) -> Result<Self> {
        let args = FilterArgs::Search { regex, search_up, include };
        Self::filter(filter_info(registry, types::SEARCH_FILTER)?, Some(args))
    }

    pub fn filter_group(registry: &Registry, order: GroupOrder) -> Result<Self> {
        Self::filter(filter_info(registry, types::GROUP_FILTER)?, Some(FilterArgs::Group { order }))
    }

    pub fn filter_neighbourhood(registry: &Registry, layers: u32) -> Result<Self> {
        Self::filter(filter_info(registry, types::NEIGHBOURHOOD_FILTER)?, Some(FilterArgs::Neighbourhood { layers }))
    }

    pub fn filter_vacant(registry: &Registry, include: bool) -> Result<Self> {
        Self::filter(filter_info(registry, types::VACANT_FILTER)?, Some(FilterArgs::Vacant { include }))
    }
}

impl From<&str> for PathNode {
    /// Literal segment; use [`PathNode::token`] to recognise standard and
    /// regex tokens.
    fn from(name: &str) -> Self {
        PathNode::normal(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_classification() {
        assert!(matches!(PathNode::token("..").unwrap().kind, PathNodeKind::Parent));
        assert!(matches!(PathNode::token(".*").unwrap().kind, PathNodeKind::Any));
        assert!(matches!(PathNode::token(".+").unwrap().kind, PathNodeKind::Wild));
        assert!(matches!(PathNode::token("b..").unwrap().kind, PathNodeKind::Regex(_)));
        assert!(matches!(PathNode::token("a2").unwrap().kind, PathNodeKind::Normal(_)));
        assert!(matches!(PathNode::token("&InputDirector").unwrap().kind, PathNodeKind::Director(Some(_))));
        assert!(PathNode::token("b[").is_err());
    }

    #[test]
    fn test_positioned_tokens() {
        let PathNodeKind::Normal(id) = PathNode::token("cell(1,2)").unwrap().kind else {
            panic!("expected a literal identifier");
        };
        assert_eq!(id, Identifier::with_position("cell", crate::model::Point::new([1, 2])));
        let open = PathNode::token("in(+)").unwrap();
        assert!(matches!(open.kind, PathNodeKind::Regex(_)));
        assert!(open.is_unbounded());
        assert_eq!(open.status_report(), "in(+)");
    }

    #[test]
    fn test_non_filter_type_rejected() {
        let registry = Registry::standard();
        let container = registry.get(types::CONTAINER).unwrap();
        assert!(matches!(PathNode::filter(container, None), Err(Error::FilterConstruction(_))));
        assert!(PathNode::filter_vacant(&registry, true).is_ok());
    }

    #[test]
    fn test_regex_filter_cached() {
        let registry = Registry::standard();
        let node = PathNode::token("b2.").unwrap();
        let first = node.regex_filter(&registry).map(|s| s as *const FilterSpec);
        let second = node.regex_filter(&registry).map(|s| s as *const FilterSpec);
        assert!(first.is_some());
        assert_eq!(first, second);
        assert!(PathNode::token("b2").unwrap().regex_filter(&registry).is_none());
    }

    #[test]
    fn test_identifier_matches() {
        let id = Identifier::new("b21");
        assert!(PathNode::wild().identifier_matches(&id));
        assert!(PathNode::token("b2.").unwrap().identifier_matches(&id));
        assert!(PathNode::normal("b21").identifier_matches(&id));
        assert!(!PathNode::normal("b22").identifier_matches(&id));
    }
}
