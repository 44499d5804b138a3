//! Member storage of a container property.
//!
//! Three indexes are kept in step: declaration order, identity hash and
//! category. Order stamps increase monotonically per container and are
//! never renumbered on removal, so `ordered` stays sorted by stamp and can
//! be binary searched.

use std::sync::Arc;

use hashbrown::HashMap;
use smallvec::SmallVec;

use super::identifier::Identifier;
use super::property::PropertyId;
use super::scope::ConfigurePhase;
use crate::catalog::{Registry, TypeCode, types};
use crate::graph::Emulator;

/// One entry of a container's declaration-ordered list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
    pub id: PropertyId,
    pub order: u32,
    pub category: TypeCode,
}

#[derive(Debug)]
pub struct Container {
    categories: SmallVec<[TypeCode; 4]>,
    ordered: Vec<Member>,
    hashed: HashMap<Identifier, PropertyId>,
    by_type: HashMap<TypeCode, Vec<PropertyId>>,
    /// Exact runtime type -> accepted category.
    category_cache: HashMap<TypeCode, TypeCode>,
    next_order: u32,
    /// Views (filters, groups) list members that live elsewhere.
    owning: bool,
    pub refresh: bool,
    pub is_composite: bool,
    pub do_emulate: bool,
    pub configure_phase: ConfigurePhase,
    pub emulator: Option<Arc<dyn Emulator>>,
}

impl Container {
    /// An owning container accepting the given categories.
    pub fn new(categories: &[TypeCode]) -> Self {
        Self {
            categories: categories.iter().copied().collect(),
            ordered: Vec::new(),
            hashed: HashMap::new(),
            by_type: HashMap::new(),
            category_cache: HashMap::new(),
            next_order: 0,
            owning: true,
            refresh: false,
            is_composite: true,
            do_emulate: false,
            configure_phase: ConfigurePhase::Unconfigured,
            emulator: None,
        }
    }

    /// A non-owning view whose contents are computed on access.
    pub fn view() -> Self {
        Self {
            owning: false,
            refresh: true,
            is_composite: false,
            ..Self::new(&[types::PROPERTY])
        }
    }

    pub fn is_owning(&self) -> bool {
        self.owning
    }

    pub fn categories(&self) -> &[TypeCode] {
        &self.categories
    }

    /// The declared category `type_code` files under, if any.
    pub fn classify(&mut self, type_code: TypeCode, registry: &Registry) -> Option<TypeCode> {
        if let Some(&category) = self.category_cache.get(&type_code) {
            return Some(category);
        }
        let category = registry.closest_base(type_code, &self.categories)?;
        self.category_cache.insert(type_code, category);
        Some(category)
    }

    /// Append a classified member and return its order stamp.
    ///
    /// Owning containers replace an entry with the same identity in the
    /// hash index; views keep the first one.
    pub(crate) fn insert(&mut self, id: PropertyId, identity: &Identifier, category: TypeCode) -> u32 {
        let order = self.next_order;
        self.next_order += 1;
        self.ordered.push(Member { id, order, category });
        if self.owning {
            self.hashed.insert(identity.clone(), id);
        } else {
            self.hashed.entry(identity.clone()).or_insert(id);
        }
        self.by_type.entry(category).or_default().push(id);
        order
    }

    /// Delete the member stamped `order` from all three indexes.
    pub(crate) fn remove(&mut self, order: u32, identity: &Identifier) -> Option<Member> {
        let index = self.position_of_order(order)?;
        let member = self.ordered.remove(index);
        if self.hashed.get(identity) == Some(&member.id) {
            self.hashed.remove(identity);
        }
        if let Some(bucket) = self.by_type.get_mut(&member.category) {
            bucket.retain(|&id| id != member.id);
            if bucket.is_empty() {
                self.by_type.remove(&member.category);
            }
        }
        Some(member)
    }

    pub(crate) fn clear(&mut self) {
        self.ordered.clear();
        self.hashed.clear();
        self.by_type.clear();
    }

    /// Rearrange members into `ids` order, restamping so stamps stay sorted.
    /// Ids not currently members are ignored; members missing from `ids`
    /// keep their relative order at the end.
    pub(crate) fn reorder(&mut self, ids: &[PropertyId]) {
        let mut rest = std::mem::take(&mut self.ordered);
        let mut sorted = Vec::with_capacity(rest.len());
        for id in ids {
            if let Some(i) = rest.iter().position(|m| m.id == *id) {
                sorted.push(rest.remove(i));
            }
        }
        sorted.extend(rest);
        for (stamp, member) in sorted.iter_mut().enumerate() {
            member.order = stamp as u32;
        }
        self.next_order = sorted.len() as u32;
        self.ordered = sorted;
    }

    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }

    pub fn members(&self) -> &[Member] {
        &self.ordered
    }

    pub fn ids(&self) -> impl Iterator<Item = PropertyId> + '_ {
        self.ordered.iter().map(|m| m.id)
    }

    pub fn member_at(&self, index: usize) -> Option<PropertyId> {
        self.ordered.get(index).map(|m| m.id)
    }

    pub fn get(&self, identity: &Identifier) -> Option<PropertyId> {
        self.hashed.get(identity).copied()
    }

    pub fn category(&self, category: TypeCode) -> Option<&[PropertyId]> {
        self.by_type.get(&category).map(Vec::as_slice)
    }

    pub fn position_of_order(&self, order: u32) -> Option<usize> {
        self.ordered.binary_search_by_key(&order, |m| m.order).ok()
    }

    pub fn by_order(&self, order: u32) -> Option<PropertyId> {
        self.position_of_order(order).map(|i| self.ordered[i].id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> PropertyId {
        PropertyId(n)
    }

    #[test]
    fn test_insert_keeps_three_indexes() {
        let mut c = Container::new(&[types::PROPERTY]);
        let o1 = c.insert(id(1), &Identifier::new("b23"), types::PROPERTY);
        let o2 = c.insert(id(2), &Identifier::new("b21"), types::PROPERTY);
        assert!(o1 < o2);
        assert_eq!(c.ids().collect::<Vec<_>>(), vec![id(1), id(2)]);
        assert_eq!(c.get(&Identifier::new("b21")), Some(id(2)));
        assert_eq!(c.category(types::PROPERTY).map(<[_]>::len), Some(2));
    }

    #[test]
    fn test_remove_does_not_renumber() {
        let mut c = Container::new(&[types::PROPERTY]);
        let names = ["a", "b", "c"];
        let orders: Vec<_> = names
            .iter()
            .enumerate()
            .map(|(i, n)| c.insert(id(i as u32), &Identifier::new(*n), types::PROPERTY))
            .collect();
        assert!(c.remove(orders[1], &Identifier::new("b")).is_some());
        assert_eq!(c.by_order(orders[2]), Some(id(2)));
        assert_eq!(c.by_order(orders[1]), None);
        assert_eq!(c.get(&Identifier::new("b")), None);
        let next = c.insert(id(9), &Identifier::new("d"), types::PROPERTY);
        assert!(next > orders[2]);
    }

    #[test]
    fn test_view_keeps_first_identity() {
        let mut v = Container::view();
        v.insert(id(1), &Identifier::new("in"), types::PROPERTY);
        v.insert(id(2), &Identifier::new("in"), types::PROPERTY);
        assert_eq!(v.len(), 2);
        assert_eq!(v.get(&Identifier::new("in")), Some(id(1)));
    }

    #[test]
    fn test_reorder_restamps() {
        let mut v = Container::view();
        for n in 1..=3 {
            v.insert(id(n), &Identifier::new(format!("p{n}")), types::PROPERTY);
        }
        v.reorder(&[id(3), id(1)]);
        assert_eq!(v.ids().collect::<Vec<_>>(), vec![id(3), id(1), id(2)]);
        assert_eq!(v.by_order(0), Some(id(3)));
    }

    #[test]
    fn test_classify_rejects_unrelated() {
        let registry = Registry::standard();
        let mut c = Container::new(&[types::PAD]);
        assert_eq!(c.classify(types::INPUT_PAD, &registry), Some(types::PAD));
        assert_eq!(c.classify(types::CONTAINER, &registry), None);
    }
}
