//! Path pattern filter.

use std::sync::Arc;

use super::{FilterArgs, FilterContents, FilterContext};
use crate::enumerate::{ContainerEnumerator, ContainerWalk};
use crate::graph::Model;
use crate::model::{Identifier, PropertyId};
use crate::path::{Path, PathNode, PathNodeKind};

/// Keeps descendants of the source whose path matches a pattern path.
///
/// Absolute patterns are matched against the full path from the root,
/// relative ones against the path below the source. A pattern matching a
/// leading part of the path is enough unless it ends in `$`. Only identity
/// segments (`name`, regex, `.+`, `.*`) take part; a pattern holding
/// anything else matches nothing.
#[derive(Debug)]
pub struct PathFilter {
    path: Path,
    include: bool,
}

impl PathFilter {
    pub fn new(path: Path, include: bool) -> Self {
        Self { path, include }
    }

    /// Typed `Path` arguments only; a literal would need the registry to
    /// parse.
    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        match args? {
            FilterArgs::Path { path, include } => Some(Arc::new(Self::new(path.clone(), *include))),
            _ => None,
        }
    }

    /// Identity segments of the pattern and whether it must match the
    /// whole path.
    fn pattern(&self) -> (&[PathNode], bool) {
        let mut nodes = self.path.nodes();
        if let Some(PathNodeKind::Absolute | PathNodeKind::Relative) = nodes.first().map(PathNode::kind) {
            nodes = &nodes[1..];
        }
        match nodes.split_last() {
            Some((last, head)) if matches!(last.kind(), PathNodeKind::End) => (head, true),
            _ => (nodes, false),
        }
    }
}

impl FilterContents for PathFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        let skip = if self.path.is_absolute() { 0 } else { model.identity_chain(ctx.source).len() };
        let (pattern, whole) = self.pattern();
        let walk = ContainerWalk { include_containers: true, ..ContainerWalk::default() };
        let mut walker = ContainerEnumerator::new(ctx.source, ctx.requester, walk);
        let mut found = Vec::new();
        while let Some(id) = walker.move_next(model) {
            if id == ctx.source {
                continue;
            }
            let chain = model.identity_chain(id);
            let below = chain.get(skip..).unwrap_or_default();
            if match_chain(pattern, below, whole) == self.include {
                found.push(id);
            }
        }
        found
    }
}

/// `.*` spans zero or more identities.
fn match_chain(pattern: &[PathNode], chain: &[Identifier], whole: bool) -> bool {
    let Some((node, rest)) = pattern.split_first() else {
        return !whole || chain.is_empty();
    };
    match node.kind() {
        PathNodeKind::Any => {
            match_chain(rest, chain, whole) || (!chain.is_empty() && match_chain(pattern, &chain[1..], whole))
        }
        PathNodeKind::Normal(_) | PathNodeKind::Regex(_) | PathNodeKind::Wild => match chain.split_first() {
            Some((head, tail)) => node.identifier_matches(head) && match_chain(rest, tail, whole),
            None => false,
        },
        _ => false,
    }
}
