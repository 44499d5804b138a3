//! # Filters
//!
//! A filter is a view container whose members are computed from a source
//! container instead of stored. Filters are created for `Filter:` and regex
//! path segments, filled lazily by [`Model::access_contents`] and released
//! when the segment's enumerator is done with them.
//!
//! | Filter | Keeps |
//! |--------|-------|
//! | `NameFilter` | members whose name matches a regex |
//! | `IdentifierFilter` | members whose identity (and class name) matches |
//! | `TypeFilter` | members of a type or its subtypes |
//! | `TypeNameFilter` | members whose class name matches a regex |
//! | `PointFilter` | members whose position matches a point pattern |
//! | `PathFilter` | descendants whose path matches a path pattern |
//! | `SearchFilter` | matches found walking up, or recursively down |
//! | `NeighbourhoodFilter` | descendants within N levels |
//! | `VacantFilter` | empty containers and null leaves |
//! | `GroupFilter` | everything; orders completed connector groups |
//!
//! Every membership filter takes an `include` flag: `false` keeps the
//! members that do *not* match.

pub mod group;
pub mod identifier;
pub mod name;
pub mod neighbourhood;
pub mod path;
pub mod point;
pub mod search;
pub mod types;

use std::fmt;
use std::sync::Arc;

use crate::catalog::{ClassTypeInfo, TypeCode, types as builtin};
use crate::enumerate::ScopeEnumerator;
use crate::graph::Model;
use crate::model::{
    Container, IdentifierRegex, PointRegex, Property, PropertyId, PropertyKind, PropertyModes, Scope, TextPattern,
};
use crate::path::Path;

pub use group::GroupOrder;

/// Builds a filter's contents from its arguments; `None` rejects them.
pub type FilterFactory = fn(Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>>;

/// Computes the members of a filter view.
pub trait FilterContents: fmt::Debug + Send + Sync {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId>;

    /// Group filters take part in connector group completion.
    fn is_group_filter(&self) -> bool {
        false
    }

    /// Reorder the members of a completed group.
    fn order_group(&self, _model: &Model, _members: &mut Vec<PropertyId>) {}
}

/// Where a filter runs and on whose behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterContext {
    /// Creator of the path that holds the filter segment.
    pub creator: Option<PropertyId>,
    /// Container the segment is evaluated in.
    pub parent: PropertyId,
    /// Container the filter reads from.
    pub source: PropertyId,
    pub requester: Option<PropertyId>,
    pub mode: PropertyModes,
}

impl FilterContext {
    /// Visible members of the source container.
    pub fn visible_members(&self, model: &Model) -> Vec<PropertyId> {
        ScopeEnumerator::new(self.source, self.requester).collect_all(model)
    }

    /// Visible members of the source for which `keep` agrees with `include`.
    pub fn select(&self, model: &Model, include: bool, keep: impl Fn(&Property) -> bool) -> Vec<PropertyId> {
        self.visible_members(model)
            .into_iter()
            .filter(|&id| model.property(id).is_some_and(|p| keep(p) == include))
            .collect()
    }
}

/// A live filter: its contents and the context they are computed in.
#[derive(Debug, Clone)]
pub struct FilterState {
    pub contents: Arc<dyn FilterContents>,
    pub context: FilterContext,
}

/// Constructor arguments of the built-in filters.
#[derive(Debug, Clone)]
pub enum FilterArgs {
    Name { regex: TextPattern, include: bool },
    Identifier { regex: IdentifierRegex, include: bool },
    Type { type_code: TypeCode, include: bool },
    TypeName { regex: TextPattern, include: bool },
    Point { regex: PointRegex, include: bool },
    Path { path: Path, include: bool },
    Search { regex: IdentifierRegex, search_up: bool, include: bool },
    Neighbourhood { layers: u32 },
    Vacant { include: bool },
    Group { order: GroupOrder },
    /// Unparsed text from a path literal; each filter reads it its own way.
    Opaque(String),
}

impl FilterArgs {
    /// Text printed between the parentheses of a path literal.
    ///
    /// Each form parses back through its filter's factory as opaque text.
    pub fn status_report(&self) -> String {
        fn flagged(text: impl fmt::Display, include: bool) -> String {
            if include { text.to_string() } else { format!("{text},{EXCLUDE}") }
        }
        match self {
            FilterArgs::Opaque(text) => text.clone(),
            FilterArgs::Name { regex, include } | FilterArgs::TypeName { regex, include } => {
                flagged(regex.as_str(), *include)
            }
            FilterArgs::Identifier { regex, include } => flagged(regex, *include),
            FilterArgs::Type { type_code, include } => flagged(type_code, *include),
            FilterArgs::Point { regex, include } => flagged(regex, *include),
            FilterArgs::Path { path, include } => flagged(path.status_report(), *include),
            FilterArgs::Search { regex, search_up: true, include } => flagged(format!("{regex},{UP}"), *include),
            FilterArgs::Search { regex, search_up: false, include } => flagged(regex, *include),
            FilterArgs::Neighbourhood { layers } => layers.to_string(),
            FilterArgs::Vacant { include: true } => INCLUDE.to_string(),
            FilterArgs::Vacant { include: false } => EXCLUDE.to_string(),
            FilterArgs::Group { order } => order.as_str().to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum FilterSource {
    Type(Arc<ClassTypeInfo>),
    /// Path to a constructor naming the filter type.
    Path(Path),
}

/// What a `Filter:` path segment constructs.
#[derive(Debug, Clone)]
pub struct FilterSpec {
    pub source: FilterSource,
    pub args: Option<FilterArgs>,
}

impl FilterSpec {
    pub fn of_type(info: Arc<ClassTypeInfo>, args: Option<FilterArgs>) -> Self {
        Self { source: FilterSource::Type(info), args }
    }

    pub fn from_path(path: Path, args: Option<FilterArgs>) -> Self {
        Self { source: FilterSource::Path(path), args }
    }

    pub fn status_report(&self) -> String {
        let head = match &self.source {
            FilterSource::Type(info) => format!("Filter:typeof({})", info.name()),
            FilterSource::Path(path) => format!("Filter:path({})", path.status_report()),
        };
        match &self.args {
            Some(args) => format!("{head}({})", args.status_report()),
            None => head,
        }
    }
}

/// Construct the filter `spec` describes in `ctx` and fill it.
///
/// Failures are logged on the model and yield `None`.
pub fn create_filter(model: &mut Model, spec: &FilterSpec, ctx: FilterContext) -> Option<(PropertyId, FilterState)> {
    let info = match &spec.source {
        FilterSource::Type(info) => Arc::clone(info),
        FilterSource::Path(path) => resolve_constructor(model, path, &ctx)?,
    };
    let Some(factory) = info.factory() else {
        model.log_error(builtin::PATH_NODE, "create_filter", 4, &format!("{} has no factory", info.name()));
        return None;
    };
    let Some(contents) = factory(spec.args.as_ref()) else {
        let text = format!("{} rejected its arguments: {}", info.name(), spec.status_report());
        model.log_error(builtin::PATH_NODE, "create_filter", 5, &text);
        return None;
    };

    let state = FilterState { contents, context: ctx };
    let identity = model.generate_identifier("Filter");
    let level = model.property(ctx.parent).map_or(0, |p| p.level() + 1);
    let view = model.allocate_detached(Property {
        identity,
        type_code: info.type_code(),
        creator: ctx.creator,
        parent: None,
        scope: Scope::Public,
        level,
        order: 0,
        kind: PropertyKind::Filter(state.clone()),
        contents: Some(Container::view()),
    });
    if let Err(e) = model.access_contents(view) {
        tracing::debug!(filter = info.name(), error = %e, "filter refresh failed");
    }
    tracing::trace!(filter = info.name(), %view, members = model.member_count(view), "filter created");
    Some((view, state))
}

fn resolve_constructor(model: &mut Model, path: &Path, ctx: &FilterContext) -> Option<Arc<ClassTypeInfo>> {
    let report = path.status_report();
    let Some(found) = path.get_property(model, ctx.parent, ctx.requester, PropertyModes::NONE) else {
        let text = format!("Filter path did not resolve to an object: {report}");
        model.log_error(builtin::PATH_NODE, "create_filter", 1, &text);
        return None;
    };
    let Some(value) = model.get_value(found) else {
        let text = format!("Filter path property value was null: {report}");
        model.log_error(builtin::PATH_NODE, "create_filter", 2, &text);
        return None;
    };
    match model.property(value).map(Property::kind) {
        Some(PropertyKind::Constructor(code)) => {
            let code = *code;
            let info = model.registry().get(code);
            if info.is_none() {
                model.log_error(builtin::PATH_NODE, "create_filter", 3, &format!("unknown filter type {code}"));
            }
            info
        }
        _ => {
            let text = format!("Filter path property value was not a constructor: {report}");
            model.log_error(builtin::PATH_NODE, "create_filter", 3, &text);
            None
        }
    }
}

pub(crate) const INCLUDE: &str = "include";
pub(crate) const EXCLUDE: &str = "exclude";
pub(crate) const UP: &str = "up";

/// Read an `include` flag from opaque literal text.
pub(crate) fn opaque_include(text: &str) -> bool {
    !matches!(text.trim(), EXCLUDE | "false" | "!")
}

/// Split a trailing `,word` off `text` when `word` is one of `flags`.
pub(crate) fn split_flag<'a>(text: &'a str, flags: &[&str]) -> (&'a str, Option<&'a str>) {
    match text.rsplit_once(',') {
        Some((head, flag)) if flags.contains(&flag.trim()) => (head.trim(), Some(flag.trim())),
        _ => (text.trim(), None),
    }
}

/// `<pattern>[,include|exclude]`
pub(crate) fn split_include(text: &str) -> (&str, bool) {
    let (head, flag) = split_flag(text, &[INCLUDE, EXCLUDE]);
    (head, flag != Some(EXCLUDE))
}
