//! Path enumeration.
//!
//! A [`PathEnumerator`] keeps a list of frames, one per segment being
//! enumerated in one container. Width-first enumeration works the frame at
//! the front and pushes non-boundary children in front of it, so a group
//! is filled before its siblings are started; depth-first works the frame
//! at the back like a stack.
//!
//! `.*` frames fork in two: a *cut* chain without the `.*` and a *wild*
//! chain with a `.+` inserted before it. The wild chain descends one level
//! and meets the `.*` again, so every depth is tried.
//!
//! A single `.*` yields each match once. Stacked `.*` segments (`./.*/.*/x`)
//! reach the same property through several splits of the depth and yield
//! it once per split.

use std::collections::VecDeque;
use std::sync::Arc;

use crate::connect::group::{self, GroupState};
use crate::filter::FilterState;
use crate::graph::Model;
use crate::model::{PropertyId, PropertyModes};
use crate::Result;

use super::{
    Path, PathNode, PathNodeEnumerator, PathNodeKind, Prefix, direct_tail, refresh_groups, resolve_prefix,
};

/// Outcome of a completion check on an exhausted group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupVerdict {
    Complete,
    /// Keep enumerating the segment that fills the group; `remaining`
    /// caps how many more candidates it may yield.
    Reopen { remaining: Option<usize> },
}

/// Decides whether a group is complete once its segment runs dry.
pub trait GroupHandler {
    fn check_group(&self, model: &mut Model, group: PropertyId, filter: Option<&FilterState>) -> Result<GroupVerdict>;
}

#[derive(Debug)]
struct Frame {
    nodes: Arc<Vec<PathNode>>,
    index: usize,
    container: PropertyId,
    /// Created on first use; `.*` frames never get one.
    members: Option<PathNodeEnumerator>,
    group: PropertyId,
    remaining: Option<usize>,
    /// The frame whose exhaustion ends the group.
    owns_group: bool,
}

impl Frame {
    fn new(
        nodes: Arc<Vec<PathNode>>,
        index: usize,
        container: PropertyId,
        group: PropertyId,
        owns_group: bool,
    ) -> Self {
        Self { nodes, index, container, members: None, group, remaining: None, owns_group }
    }

    fn node(&self) -> Option<&PathNode> {
        self.nodes.get(self.index)
    }

    fn is_tail(&self) -> bool {
        self.index + 1 == self.nodes.len()
    }

    fn release(mut self, model: &mut Model) {
        if let Some(members) = self.members.as_mut() {
            members.release(model);
        }
    }
}

#[derive(Debug)]
pub struct PathEnumerator {
    path: Path,
    start: PropertyId,
    requester: Option<PropertyId>,
    mode: PropertyModes,
    width_first: bool,
    frames: VecDeque<Frame>,
    primed: bool,
    group_root: Option<PropertyId>,
    current: Option<PropertyId>,
}

impl PathEnumerator {
    pub fn new(path: Path, start: PropertyId, requester: Option<PropertyId>, mode: PropertyModes) -> Self {
        Self {
            path,
            start,
            requester,
            mode,
            width_first: false,
            frames: VecDeque::new(),
            primed: false,
            group_root: None,
            current: None,
        }
    }

    pub fn width_first(mut self, width_first: bool) -> Self {
        self.width_first = width_first;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn current(&self) -> Option<PropertyId> {
        self.current
    }

    /// Root of the group tree built so far.
    pub fn group_root(&self) -> Option<PropertyId> {
        self.group_root
    }

    /// Advance to the next match. With a handler, exhausted groups are
    /// checked and may be reopened; a handler error stops the enumeration.
    pub fn move_next(&mut self, model: &mut Model, handler: Option<&dyn GroupHandler>) -> Result<Option<PropertyId>> {
        if !self.primed {
            self.primed = true;
            if let Some(found) = self.prime(model) {
                self.current = Some(found);
                return Ok(self.current);
            }
        }
        self.current = self.advance(model, handler)?;
        Ok(self.current)
    }

    /// Release filter views and the group tree.
    pub fn finish(&mut self, model: &mut Model) {
        while let Some(frame) = self.frames.pop_front() {
            frame.release(model);
        }
        if let Some(root) = self.group_root.take() {
            model.release_group_tree(root);
        }
        self.current = None;
    }

    /// Resolve the unbranching prefix and build the groups it crosses.
    fn prime(&mut self, model: &mut Model) -> Option<PropertyId> {
        let nodes = Arc::clone(self.path.shared_nodes());
        let creator = self.path.creator();
        let mut trail = Vec::new();
        let prefix = resolve_prefix(&nodes, creator, model, self.start, self.requester, self.mode, &mut trail);
        if prefix == Prefix::Failed {
            tracing::trace!(path = %self.path, "path prefix did not resolve");
            return None;
        }

        let root_number = nodes.first().map_or(0, PathNode::group_number);
        let root = GroupState::create(model, None, self.start, root_number, is_unbounded(&nodes, root_number));
        self.group_root = Some(root);
        let mut group = root;
        for (k, &proxy) in trail.iter().enumerate() {
            if let Some(next) = nodes.get(k + 1).filter(|n| n.group_boundary) {
                group::mark(model, group, true, true);
                let number = next.group_number;
                group = GroupState::create(model, Some(group), proxy, number, is_unbounded(&nodes, number));
            }
        }

        match prefix {
            Prefix::Resolved(tail) => {
                let tail = direct_tail(model, tail, self.requester, self.mode);
                model.add_view_member(group, tail);
                group::mark(model, group, true, true);
                Some(tail)
            }
            Prefix::Stopped { index, container } => {
                self.frames.push_back(Frame::new(nodes, index, container, group, true));
                None
            }
            Prefix::Failed => None,
        }
    }

    fn active(&self) -> Option<usize> {
        match self.frames.len() {
            0 => None,
            _ if self.width_first => Some(0),
            n => Some(n - 1),
        }
    }

    fn advance(&mut self, model: &mut Model, handler: Option<&dyn GroupHandler>) -> Result<Option<PropertyId>> {
        while let Some(pos) = self.active() {
            let frame = &mut self.frames[pos];
            let is_any = matches!(frame.node().map(PathNode::kind), Some(PathNodeKind::Any));
            if is_any && !frame.is_tail() {
                if let Some(frame) = self.frames.remove(pos) {
                    self.fork_any(frame);
                }
                continue;
            }

            let candidate = if is_any || frame.remaining == Some(0) {
                None
            } else {
                let (nodes, index, container) = (Arc::clone(&frame.nodes), frame.index, frame.container);
                let (creator, requester, mode) = (self.path.creator(), self.requester, self.mode);
                frame
                    .members
                    .get_or_insert_with(|| PathNodeEnumerator::new(nodes, index, container, creator, requester, mode))
                    .move_next(model)
            };

            let Some(candidate) = candidate else {
                if self.exhaust(model, pos, handler)? {
                    continue;
                }
                if let Some(frame) = self.frames.remove(pos) {
                    frame.release(model);
                }
                continue;
            };

            let frame = &mut self.frames[pos];
            if let Some(r) = frame.remaining.as_mut() {
                *r -= 1;
            }
            if frame.is_tail() {
                let found = direct_tail(model, candidate, self.requester, self.mode);
                model.add_view_member(frame.group, found);
                return Ok(Some(found));
            }
            let Some(container) = model.get_value(candidate).filter(|&v| model.is_container(v)) else {
                continue;
            };
            let (nodes, next_index, parent_group) = (Arc::clone(&frame.nodes), frame.index + 1, frame.group);
            let boundary = nodes[next_index].group_boundary;
            let child = if boundary {
                let number = nodes[next_index].group_number;
                let unbounded = is_unbounded(&nodes, number);
                let group = GroupState::create(model, Some(parent_group), candidate, number, unbounded);
                Frame::new(nodes, next_index, container, group, true)
            } else {
                Frame::new(nodes, next_index, container, parent_group, false)
            };
            if self.width_first && !boundary {
                self.frames.push_front(child);
            } else {
                self.frames.push_back(child);
            }
        }
        Ok(None)
    }

    /// Handle a frame that ran out of candidates. Returns `true` when the
    /// group was reopened and the frame stays.
    fn exhaust(&mut self, model: &mut Model, pos: usize, handler: Option<&dyn GroupHandler>) -> Result<bool> {
        let frame = &mut self.frames[pos];
        if !frame.owns_group {
            return Ok(false);
        }
        group::mark(model, frame.group, true, false);
        let Some(handler) = handler else {
            group::mark(model, frame.group, true, true);
            return Ok(false);
        };
        let filter = frame.members.as_ref().and_then(PathNodeEnumerator::group_filter);
        match handler.check_group(model, frame.group, filter)? {
            GroupVerdict::Complete => {
                group::mark(model, frame.group, true, true);
                Ok(false)
            }
            GroupVerdict::Reopen { remaining } => {
                tracing::trace!(group = %frame.group, ?remaining, "group reopened");
                frame.remaining = remaining;
                Ok(true)
            }
        }
    }

    /// Replace a `.*` frame by its cut and wild chains.
    fn fork_any(&mut self, frame: Frame) {
        let i = frame.index;
        let any = &frame.nodes[i];

        let mut cut: Vec<PathNode> = frame.nodes.as_ref().clone();
        cut.remove(i);
        if any.group_boundary {
            cut[i].group_boundary = true;
        }
        refresh_groups(&mut cut);

        let mut wild: Vec<PathNode> = frame.nodes.as_ref().clone();
        wild[i].group_boundary = false;
        wild.insert(i, PathNode::wild().with_boundary(any.group_boundary));
        refresh_groups(&mut wild);

        let (container, group, owns) = (frame.container, frame.group, frame.owns_group);
        let cut = Frame::new(Arc::new(cut), i, container, group, owns && self.width_first);
        let wild = Frame::new(Arc::new(wild), i, container, group, owns && !self.width_first);
        if self.width_first {
            self.frames.push_front(cut);
            self.frames.push_front(wild);
        } else {
            self.frames.push_back(wild);
            self.frames.push_back(cut);
        }
    }
}

/// Whether any segment of group `number` is unbounded.
fn is_unbounded(nodes: &[PathNode], number: u32) -> bool {
    nodes.iter().any(|n| n.group_number == number && n.is_unbounded)
}
