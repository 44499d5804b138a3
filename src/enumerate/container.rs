//! Recursive walk over a container sub-tree.

use std::collections::VecDeque;

use crate::graph::Model;
use crate::model::PropertyId;

/// What a [`ContainerEnumerator`] yields and in which order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerWalk {
    pub width_first: bool,
    /// Yield containers (the start container included) as they are entered.
    pub include_containers: bool,
    pub include_leaves: bool,
    /// Yield empty containers even when `include_containers` is off.
    pub include_leaf_containers: bool,
    /// Visit each container's members last to first.
    pub reverse: bool,
}

impl Default for ContainerWalk {
    fn default() -> Self {
        Self {
            width_first: false,
            include_containers: false,
            include_leaves: true,
            include_leaf_containers: false,
            reverse: false,
        }
    }
}

#[derive(Debug, Clone)]
struct Cursor {
    container: PropertyId,
    /// Members consumed so far, counted from the walk's end.
    consumed: usize,
}

#[derive(Debug, Clone)]
pub struct ContainerEnumerator {
    start: PropertyId,
    requester: Option<PropertyId>,
    walk: ContainerWalk,
    cursors: VecDeque<Cursor>,
    started: bool,
    current: Option<PropertyId>,
}

impl ContainerEnumerator {
    pub fn new(start: PropertyId, requester: Option<PropertyId>, walk: ContainerWalk) -> Self {
        Self { start, requester, walk, cursors: VecDeque::new(), started: false, current: None }
    }

    pub fn current(&self) -> Option<PropertyId> {
        self.current
    }

    pub fn reset(&mut self) {
        self.cursors.clear();
        self.started = false;
        self.current = None;
    }

    pub fn move_next(&mut self, model: &Model) -> Option<PropertyId> {
        if !self.started {
            self.started = true;
            if model.is_container(self.start) {
                self.cursors.push_back(Cursor { container: self.start, consumed: 0 });
                if self.walk.include_containers {
                    self.current = Some(self.start);
                    return self.current;
                }
            }
        }

        let reverse = self.walk.reverse;
        while let Some(cursor) = self.active() {
            let Some(item) = Self::advance(model, cursor, reverse) else {
                self.retire();
                continue;
            };
            if !model.in_scope(item, self.requester) {
                continue;
            }
            let value = model.get_value(item).filter(|v| model.is_container(*v) && *v == item);
            if let Some(container) = value {
                self.cursors.push_back(Cursor { container, consumed: 0 });
                let empty = model.member_count(container) == 0;
                if self.walk.include_containers || (empty && self.walk.include_leaf_containers) {
                    self.current = Some(item);
                    return self.current;
                }
            } else if self.walk.include_leaves {
                self.current = Some(item);
                return self.current;
            }
        }
        self.current = None;
        None
    }

    fn active(&mut self) -> Option<&mut Cursor> {
        if self.walk.width_first { self.cursors.front_mut() } else { self.cursors.back_mut() }
    }

    fn retire(&mut self) {
        if self.walk.width_first {
            self.cursors.pop_front();
        } else {
            self.cursors.pop_back();
        }
    }

    fn advance(model: &Model, cursor: &mut Cursor, reverse: bool) -> Option<PropertyId> {
        let len = model.member_count(cursor.container);
        if cursor.consumed >= len {
            return None;
        }
        let index = if reverse { len - 1 - cursor.consumed } else { cursor.consumed };
        cursor.consumed += 1;
        model.member_at(cursor.container, index)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Registry;
    use crate::model::PropertyDef;

    /// root/{a/{a1, a2}, b, e/{}}
    fn sample() -> (Model, Vec<PropertyId>) {
        let mut m = Model::new("m", Arc::new(Registry::standard()));
        let root = m.root();
        let a = m.add(root, PropertyDef::container("a")).unwrap();
        let a1 = m.add(a, PropertyDef::leaf("a1", 1)).unwrap();
        let a2 = m.add(a, PropertyDef::leaf("a2", 2)).unwrap();
        let b = m.add(root, PropertyDef::leaf("b", 3)).unwrap();
        let e = m.add(root, PropertyDef::container("e")).unwrap();
        (m, vec![root, a, a1, a2, b, e])
    }

    fn drain(m: &Model, mut e: ContainerEnumerator) -> Vec<PropertyId> {
        let mut out = Vec::new();
        while let Some(id) = e.move_next(m) {
            out.push(id);
        }
        out
    }

    #[test]
    fn test_depth_first_leaves() {
        let (m, ids) = sample();
        let walk = ContainerWalk::default();
        assert_eq!(drain(&m, ContainerEnumerator::new(ids[0], None, walk)), vec![ids[2], ids[3], ids[4]]);
    }

    #[test]
    fn test_width_first_with_containers() {
        let (m, ids) = sample();
        let walk = ContainerWalk { width_first: true, include_containers: true, ..ContainerWalk::default() };
        assert_eq!(
            drain(&m, ContainerEnumerator::new(ids[0], None, walk)),
            vec![ids[0], ids[1], ids[4], ids[5], ids[2], ids[3]]
        );
    }

    #[test]
    fn test_leaf_containers_and_reverse() {
        let (m, ids) = sample();
        let walk = ContainerWalk { include_leaf_containers: true, reverse: true, ..ContainerWalk::default() };
        assert_eq!(drain(&m, ContainerEnumerator::new(ids[0], None, walk)), vec![ids[5], ids[4], ids[3], ids[2]]);
    }
}
