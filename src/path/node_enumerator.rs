//! Candidates of one path segment in one container.

use std::sync::Arc;

use crate::enumerate::ScopeEnumerator;
use crate::filter::{FilterContext, FilterSpec, FilterState, create_filter};
use crate::graph::Model;
use crate::model::{PropertyId, PropertyModes};

use super::{PathNode, PathNodeKind, resolve_single};

#[derive(Debug)]
enum State {
    /// Nothing computed yet; filters are built on the first `move_next`.
    Pending,
    Members(ScopeEnumerator),
    Filtered { view: PropertyId, state: FilterState, members: ScopeEnumerator },
    Single(Option<PropertyId>),
    Done,
}

/// Yields the properties a segment designates inside a container.
///
/// `.+` yields every visible member, regex segments and `Filter:` segments
/// yield the members of a temporary filter view, and every other segment
/// yields at most one property. `.*` is expanded by [`PathEnumerator`]
/// and yields nothing here.
///
/// [`PathEnumerator`]: super::PathEnumerator
#[derive(Debug)]
pub struct PathNodeEnumerator {
    nodes: Arc<Vec<PathNode>>,
    index: usize,
    container: PropertyId,
    creator: Option<PropertyId>,
    requester: Option<PropertyId>,
    mode: PropertyModes,
    state: State,
}

impl PathNodeEnumerator {
    pub fn new(
        nodes: Arc<Vec<PathNode>>,
        index: usize,
        container: PropertyId,
        creator: Option<PropertyId>,
        requester: Option<PropertyId>,
        mode: PropertyModes,
    ) -> Self {
        Self { nodes, index, container, creator, requester, mode, state: State::Pending }
    }

    pub fn node(&self) -> Option<&PathNode> {
        self.nodes.get(self.index)
    }

    pub fn container(&self) -> PropertyId {
        self.container
    }

    /// The group filter behind this segment, if it is one.
    pub fn group_filter(&self) -> Option<&FilterState> {
        match &self.state {
            State::Filtered { state, .. } if state.contents.is_group_filter() => Some(state),
            _ => None,
        }
    }

    pub fn move_next(&mut self, model: &mut Model) -> Option<PropertyId> {
        if matches!(self.state, State::Pending) {
            self.state = self.prime(model);
        }
        match &mut self.state {
            State::Members(members) | State::Filtered { members, .. } => members.move_next(model),
            State::Single(next) => next.take(),
            State::Pending | State::Done => None,
        }
    }

    fn prime(&self, model: &mut Model) -> State {
        let Some(node) = self.nodes.get(self.index) else {
            return State::Done;
        };
        let spec: FilterSpec = match &node.kind {
            PathNodeKind::Wild => return State::Members(ScopeEnumerator::new(self.container, self.requester)),
            PathNodeKind::Any => return State::Done,
            PathNodeKind::Filter(spec) => spec.clone(),
            PathNodeKind::Regex(_) => match node.regex_filter(model.registry()) {
                Some(spec) => spec.clone(),
                None => return State::Done,
            },
            _ => {
                let found = resolve_single(node, self.creator, model, self.container, self.requester, self.mode);
                return State::Single(found);
            }
        };
        let ctx = FilterContext {
            creator: self.creator,
            parent: self.container,
            source: self.container,
            requester: self.requester,
            mode: self.mode,
        };
        match create_filter(model, &spec, ctx) {
            // Scope was checked by the filter against the real container.
            Some((view, state)) => State::Filtered { view, state, members: ScopeEnumerator::new(view, None) },
            None => State::Done,
        }
    }

    /// Free the temporary filter view, if any. The enumerator is spent
    /// afterwards.
    pub fn release(&mut self, model: &mut Model) {
        if let State::Filtered { view, .. } = std::mem::replace(&mut self.state, State::Done) {
            model.release(view);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Registry;
    use crate::model::PropertyDef;
    use crate::path::Path;

    fn drain(m: &mut Model, e: &mut PathNodeEnumerator) -> Vec<PropertyId> {
        let mut out = Vec::new();
        while let Some(id) = e.move_next(m) {
            out.push(id);
        }
        out
    }

    #[test]
    fn test_regex_view_is_released() {
        let mut m = Model::new("m", Arc::new(Registry::standard()));
        let root = m.root();
        let b21 = m.add(root, PropertyDef::leaf("b21", 0)).unwrap();
        m.add(root, PropertyDef::leaf("c", 0)).unwrap();
        let b22 = m.add(root, PropertyDef::leaf("b22", 0)).unwrap();
        let path = Path::relative().push("b2.").unwrap();
        let live = m.live_properties();

        let mut e = PathNodeEnumerator::new(path.shared_nodes().clone(), 1, root, None, None, PropertyModes::NONE);
        assert_eq!(drain(&mut m, &mut e), vec![b21, b22]);
        assert_eq!(m.live_properties(), live + 1);
        e.release(&mut m);
        assert_eq!(m.live_properties(), live);
    }

    #[test]
    fn test_single_and_wild() {
        let mut m = Model::new("m", Arc::new(Registry::standard()));
        let root = m.root();
        let a = m.add(root, PropertyDef::leaf("a", 0)).unwrap();
        let b = m.add(root, PropertyDef::leaf("b", 0)).unwrap();
        let path = Path::relative().push("a").unwrap().push(".+").unwrap();

        let mut single = PathNodeEnumerator::new(path.shared_nodes().clone(), 1, root, None, None, PropertyModes::NONE);
        assert_eq!(drain(&mut m, &mut single), vec![a]);
        let mut wild = PathNodeEnumerator::new(path.shared_nodes().clone(), 2, root, None, None, PropertyModes::NONE);
        assert_eq!(drain(&mut m, &mut wild), vec![a, b]);
    }
}
