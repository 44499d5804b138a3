//! Slot storage for properties with free-list reuse.
//!
//! Released slots are reused most-recently-freed first, so a fixed sequence
//! of allocations and releases always hands out the same ids.

use crate::model::{Property, PropertyId};

#[derive(Debug)]
struct Slot {
    data: Option<Property>,
    next_free: Option<u32>,
}

#[derive(Debug, Default)]
pub(crate) struct Arena {
    slots: Vec<Slot>,
    free_head: Option<u32>,
    live: usize,
}

impl Arena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allocate(&mut self, property: Property) -> PropertyId {
        self.live += 1;
        if let Some(index) = self.free_head {
            let slot = &mut self.slots[index as usize];
            self.free_head = slot.next_free.take();
            slot.data = Some(property);
            return PropertyId(index);
        }
        let index = self.slots.len() as u32;
        self.slots.push(Slot { data: Some(property), next_free: None });
        PropertyId(index)
    }

    pub fn release(&mut self, id: PropertyId) -> Option<Property> {
        let slot = self.slots.get_mut(id.0 as usize)?;
        let property = slot.data.take()?;
        slot.next_free = self.free_head;
        self.free_head = Some(id.0);
        self.live -= 1;
        Some(property)
    }

    pub fn get(&self, id: PropertyId) -> Option<&Property> {
        self.slots.get(id.0 as usize)?.data.as_ref()
    }

    pub fn get_mut(&mut self, id: PropertyId) -> Option<&mut Property> {
        self.slots.get_mut(id.0 as usize)?.data.as_mut()
    }

    pub fn live(&self) -> usize {
        self.live
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types;
    use crate::model::{Identifier, PropertyKind, Scope, Value};

    fn leaf(name: &str) -> Property {
        Property {
            identity: Identifier::new(name),
            type_code: types::PROPERTY,
            creator: None,
            parent: None,
            scope: Scope::Public,
            level: 0,
            order: 0,
            kind: PropertyKind::Leaf(Value::Null),
            contents: None,
        }
    }

    #[test]
    fn test_release_then_reuse() {
        let mut arena = Arena::new();
        let a = arena.allocate(leaf("a"));
        let b = arena.allocate(leaf("b"));
        assert_eq!(arena.live(), 2);
        assert!(arena.release(a).is_some());
        assert!(arena.get(a).is_none());
        assert!(arena.release(a).is_none());
        let c = arena.allocate(leaf("c"));
        assert_eq!(c, a);
        assert_eq!(arena.get(c).and_then(|p| p.name()), Some("c"));
        assert_eq!(arena.get(b).and_then(|p| p.name()), Some("b"));
        assert_eq!(arena.live(), 2);
    }
}
