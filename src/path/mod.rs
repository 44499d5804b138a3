//! # Paths
//!
//! A path is a chain of [`PathNode`] segments describing a set of
//! properties. Segments are appended with `/`; `|` appends and opens a new
//! group, which is how connectors line up matches on their two sides.
//!
//! ```text
//! /tmp/a2/b..          absolute, regex tail
//! ./.*/b2.             relative, any depth
//! ./cells|.+/&Input    one group per cell
//! ```
//!
//! Node chains are shared (`Arc`) and copied on write, so enumerators
//! positioned on a chain never observe later edits.

mod enumerator;
mod node;
mod node_enumerator;
mod parse;

pub use enumerator::{GroupHandler, GroupVerdict, PathEnumerator};
pub use node::{
    ABSOLUTE, ANY, DIRECTOR_PREFIX, END, OWNER, PARENT, PathNode, PathNodeKind, RELATIVE, START, WILD,
};
pub use node_enumerator::PathNodeEnumerator;

use std::fmt;
use std::ops::{BitOr, Div};
use std::sync::Arc;

use crate::catalog::Registry;
use crate::graph::Model;
use crate::model::{PropertyId, PropertyModes};
use crate::Result;

/// Separator between segments.
pub const DIRECTORY_SEPARATOR: char = '/';
/// Separator that also opens a new group.
pub const GROUP_SEPARATOR: char = '|';

#[derive(Debug, Clone, Default)]
pub struct Path {
    nodes: Arc<Vec<PathNode>>,
    creator: Option<PropertyId>,
}

/// How far a path resolves without branching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Prefix {
    /// Every segment resolved to one property; this is the tail's.
    Resolved(PropertyId),
    /// Segment `index` can match several properties; resolution stopped
    /// in `container`.
    Stopped { index: usize, container: PropertyId },
    Failed,
}

impl Path {
    /// A path with no segments.
    pub fn new() -> Self {
        Self::default()
    }

    /// `.`: starts at the container a query is made from.
    pub fn relative() -> Self {
        Self::from_nodes(vec![PathNode::new(PathNodeKind::Relative)])
    }

    /// `/`: starts at the model root.
    pub fn absolute() -> Self {
        Self::from_nodes(vec![PathNode::new(PathNodeKind::Absolute)])
    }

    pub fn from_nodes(nodes: Vec<PathNode>) -> Self {
        let mut path = Self { nodes: Arc::new(nodes), creator: None };
        path.refresh_groups();
        path
    }

    /// Parse the literal form, e.g. `/tmp/PathTest/Filter:typeof(NameFilter)(args)|b..`.
    pub fn parse(text: &str, registry: &Registry) -> Result<Self> {
        parse::parse_path(text, registry)
    }

    /// Set the property `~` segments and filters resolve against.
    pub fn with_creator(mut self, creator: PropertyId) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn creator(&self) -> Option<PropertyId> {
        self.creator
    }

    /// Append a token (`/`).
    pub fn push(self, token: &str) -> Result<Self> {
        Ok(self.push_node(PathNode::token(token)?))
    }

    /// Append a token as the first segment of a new group (`|`).
    pub fn push_group(self, token: &str) -> Result<Self> {
        Ok(self.push_group_node(PathNode::token(token)?))
    }

    pub fn push_node(mut self, node: PathNode) -> Self {
        Arc::make_mut(&mut self.nodes).push(node);
        self.refresh_groups();
        self
    }

    pub fn push_group_node(self, node: PathNode) -> Self {
        self.push_node(node.with_boundary(true))
    }

    pub fn nodes(&self) -> &[PathNode] {
        &self.nodes
    }

    pub(crate) fn shared_nodes(&self) -> &Arc<Vec<PathNode>> {
        &self.nodes
    }

    pub fn node(&self, index: usize) -> Option<&PathNode> {
        self.nodes.get(index)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn is_absolute(&self) -> bool {
        matches!(self.nodes.first().map(PathNode::kind), Some(PathNodeKind::Absolute))
    }

    /// Number of group boundaries in the path.
    pub fn group_count(&self) -> u32 {
        self.nodes.first().map_or(0, PathNode::group_number)
    }

    /// Renumber groups: the tail's group is 0, and each boundary crossed
    /// towards the head adds one.
    fn refresh_groups(&mut self) {
        refresh_groups(Arc::make_mut(&mut self.nodes).as_mut_slice());
    }

    pub fn status_report(&self) -> String {
        status_report(&self.nodes)
    }

    /// The property this path designates when it resolves without
    /// branching, or `None`.
    pub fn get_property(
        &self,
        model: &Model,
        start: PropertyId,
        requester: Option<PropertyId>,
        mode: PropertyModes,
    ) -> Option<PropertyId> {
        match self.resolve_prefix(model, start, requester, mode) {
            Prefix::Resolved(id) => Some(direct_tail(model, id, requester, mode)),
            _ => None,
        }
    }

    pub(crate) fn resolve_prefix(
        &self,
        model: &Model,
        start: PropertyId,
        requester: Option<PropertyId>,
        mode: PropertyModes,
    ) -> Prefix {
        resolve_prefix(&self.nodes, self.creator, model, start, requester, mode, &mut Vec::new())
    }

    // ------------------------------------------------------------------------
    // Literal helpers
    // ------------------------------------------------------------------------

    /// Last segment of a literal path, if non-empty.
    pub fn property_name(text: &str) -> Option<&str> {
        let index = text.rfind([DIRECTORY_SEPARATOR, GROUP_SEPARATOR])?;
        let name = text[index + 1..].trim();
        (!name.is_empty()).then_some(name)
    }

    /// Everything before the last segment of a literal path; `/` when
    /// nothing is left.
    pub fn container_path(text: &str) -> &str {
        match text.rfind([DIRECTORY_SEPARATOR, GROUP_SEPARATOR]) {
            Some(index) if index > 0 => {
                let head = text[..index].trim();
                if head.is_empty() { "/" } else { head }
            }
            _ => "/",
        }
    }
}

pub(crate) fn refresh_groups(nodes: &mut [PathNode]) {
    let mut number = 0;
    for node in nodes.iter_mut().rev() {
        node.group_number = number;
        if node.group_boundary {
            number += 1;
        }
    }
}

pub(crate) fn status_report(nodes: &[PathNode]) -> String {
    let mut out = String::new();
    for (i, node) in nodes.iter().enumerate() {
        if i > 0 {
            if node.group_boundary {
                out.push(GROUP_SEPARATOR);
            } else if !matches!(nodes[i - 1].kind, PathNodeKind::Absolute) {
                out.push(DIRECTORY_SEPARATOR);
            }
        }
        out.push_str(&node.status_report());
    }
    out
}

/// Resolve one single-valued segment in `container`.
pub(crate) fn resolve_single(
    node: &PathNode,
    creator: Option<PropertyId>,
    model: &Model,
    container: PropertyId,
    requester: Option<PropertyId>,
    mode: PropertyModes,
) -> Option<PropertyId> {
    match &node.kind {
        PathNodeKind::Normal(id) => model.get_property(container, id, requester),
        PathNodeKind::Absolute | PathNodeKind::Start => Some(model.root()),
        PathNodeKind::Relative | PathNodeKind::End => Some(container),
        PathNodeKind::Parent => model.property(container)?.parent(),
        PathNodeKind::Owner => creator,
        PathNodeKind::Director(name) => model.direct_to_property(container, name.as_ref(), requester, mode),
        PathNodeKind::Regex(_) | PathNodeKind::Any | PathNodeKind::Wild | PathNodeKind::Filter(_) => None,
    }
}

/// Apply the implicit director of a container at the end of a path, when
/// the mode asks for directing and one routes.
pub(crate) fn direct_tail(
    model: &Model,
    id: PropertyId,
    requester: Option<PropertyId>,
    mode: PropertyModes,
) -> PropertyId {
    if !mode.contains(PropertyModes::DIRECTING) {
        return id;
    }
    match model.get_value(id) {
        Some(v) if model.is_container(v) => model.direct_to_property(v, None, requester, mode).unwrap_or(id),
        _ => id,
    }
}

/// Descend while segments resolve uniquely. `trail` receives the property
/// each resolved segment designates.
pub(crate) fn resolve_prefix(
    nodes: &[PathNode],
    creator: Option<PropertyId>,
    model: &Model,
    start: PropertyId,
    requester: Option<PropertyId>,
    mode: PropertyModes,
    trail: &mut Vec<PropertyId>,
) -> Prefix {
    let mut container = match model.get_value(start) {
        Some(c) => c,
        None => return Prefix::Failed,
    };
    for (index, node) in nodes.iter().enumerate() {
        if node.is_multivalued() {
            return Prefix::Stopped { index, container };
        }
        let Some(found) = resolve_single(node, creator, model, container, requester, mode) else {
            return Prefix::Failed;
        };
        trail.push(found);
        if index + 1 == nodes.len() {
            return Prefix::Resolved(found);
        }
        match model.get_value(found) {
            Some(v) if model.is_container(v) => container = v,
            _ => return Prefix::Failed,
        }
    }
    Prefix::Resolved(container)
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_report())
    }
}

impl Div<PathNode> for Path {
    type Output = Path;

    fn div(self, rhs: PathNode) -> Path {
        self.push_node(rhs.with_boundary(false))
    }
}

impl BitOr<PathNode> for Path {
    type Output = Path;

    fn bitor(self, rhs: PathNode) -> Path {
        self.push_group_node(rhs)
    }
}
