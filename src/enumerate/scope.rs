//! Scope-checked walk over one container's members.

use crate::graph::Model;
use crate::model::{PropertyId, Scope};

/// Yields the members of a container that `requester` may see, in
/// declaration order.
#[derive(Debug, Clone)]
pub struct ScopeEnumerator {
    container: PropertyId,
    requester: Option<PropertyId>,
    index: usize,
    current: Option<PropertyId>,
}

impl ScopeEnumerator {
    pub fn new(container: PropertyId, requester: Option<PropertyId>) -> Self {
        Self { container, requester, index: 0, current: None }
    }

    pub fn container(&self) -> PropertyId {
        self.container
    }

    pub fn current(&self) -> Option<PropertyId> {
        self.current
    }

    pub fn reset(&mut self) {
        self.index = 0;
        self.current = None;
    }

    pub fn move_next(&mut self, model: &Model) -> Option<PropertyId> {
        while let Some(item) = model.member_at(self.container, self.index) {
            self.index += 1;
            if self.visible(model, item) {
                self.current = Some(item);
                return self.current;
            }
        }
        self.current = None;
        None
    }

    /// Drain the remaining members into a vector.
    pub fn collect_all(mut self, model: &Model) -> Vec<PropertyId> {
        let mut out = Vec::new();
        while let Some(id) = self.move_next(model) {
            out.push(id);
        }
        out
    }

    fn visible(&self, model: &Model, item: PropertyId) -> bool {
        let Some(requester) = self.requester else {
            return true;
        };
        let Some(p) = model.property(item) else {
            return false;
        };
        if item == requester {
            return !matches!(p.scope(), Scope::External | Scope::Unrelated);
        }
        let requester_parent = model.property(requester).and_then(|r| r.parent());
        if p.parent().is_some() && p.parent() == requester_parent {
            return !matches!(p.scope(), Scope::Unrelated | Scope::SelfOnly);
        }
        model.in_scope(item, Some(requester))
    }
}
