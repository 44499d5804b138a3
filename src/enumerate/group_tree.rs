//! Breadth-first walk over a group tree built by a connector.

use std::collections::VecDeque;

use crate::graph::Model;
use crate::model::{PropertyId, PropertyKind};

/// Yields the groups of a tree, breadth-first in declaration order.
///
/// With `terminal_only` only groups numbered 0 (those holding matched
/// properties directly) are produced; otherwise every group without
/// sub-groups is.
#[derive(Debug, Clone)]
pub struct GroupTreeEnumerator {
    root: Option<PropertyId>,
    terminal_only: bool,
    queue: VecDeque<PropertyId>,
    started: bool,
}

impl GroupTreeEnumerator {
    pub fn new(root: Option<PropertyId>, terminal_only: bool) -> Self {
        Self { root, terminal_only, queue: VecDeque::new(), started: false }
    }

    pub fn move_next(&mut self, model: &Model) -> Option<PropertyId> {
        if !self.started {
            self.started = true;
            self.queue.extend(self.root);
        }
        while let Some(group) = self.queue.pop_front() {
            let Some(PropertyKind::Group(state)) = model.property(group).map(|p| p.kind()) else {
                continue;
            };
            let subgroups: Vec<_> = model
                .members(group)
                .into_iter()
                .filter(|m| model.property(*m).is_some_and(|p| p.is_group()))
                .collect();
            let is_leaf = subgroups.is_empty();
            self.queue.extend(subgroups);
            let wanted = if self.terminal_only { state.group_number == 0 } else { is_leaf };
            if wanted {
                return Some(group);
            }
        }
        None
    }

    pub fn collect_all(mut self, model: &Model) -> Vec<PropertyId> {
        let mut out = Vec::new();
        while let Some(g) = self.move_next(model) {
            out.push(g);
        }
        out
    }
}
