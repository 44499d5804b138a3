//! Group trees.
//!
//! A path enumerator files every match into a tree of groups that mirrors
//! the `|` boundaries of the path. A group proxies the property that opened
//! it, lists its matches and sub-groups as members, and carries a key
//! (its index at each level below the root) so the two sides of a
//! connector can be lined up group by group.

use smallvec::SmallVec;

use crate::catalog::types;
use crate::graph::Model;
use crate::model::{Container, Property, PropertyId, PropertyKind, Scope};

pub type GroupKey = SmallVec<[u32; 8]>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupState {
    /// The property whose match opened the group.
    pub proxied: Option<PropertyId>,
    /// Boundaries between this group's segments and the tail; terminal
    /// groups are 0.
    pub group_number: u32,
    /// No further members will be added.
    pub is_complete: bool,
    /// The segment filling the group has run out of candidates.
    pub is_exhausted: bool,
    /// Some segment of the group has no declared count.
    pub is_unbounded: bool,
    pub path_key: GroupKey,
}

impl GroupState {
    /// Allocate a group, as a sub-group of `parent` when given.
    pub fn create(
        model: &mut Model,
        parent: Option<PropertyId>,
        proxied: PropertyId,
        group_number: u32,
        is_unbounded: bool,
    ) -> PropertyId {
        let mut path_key = GroupKey::new();
        if let Some(p) = parent {
            path_key.extend(group_state(model, p).map(|g| g.path_key.iter().copied()).into_iter().flatten());
            path_key.push(subgroups(model, p).len() as u32);
        }
        let (identity, level) = match model.property(proxied) {
            Some(p) => (p.identity().clone(), p.level()),
            None => (model.generate_identifier("Group"), 0),
        };
        let mut contents = Container::view();
        contents.refresh = false;
        let state = GroupState { proxied: Some(proxied), group_number, is_unbounded, path_key, ..Self::default() };
        let id = model.allocate_detached(Property {
            identity,
            type_code: types::GROUP_CONTAINER,
            creator: None,
            parent,
            scope: Scope::Public,
            level,
            order: 0,
            kind: PropertyKind::Group(state),
            contents: Some(contents),
        });
        if let Some(p) = parent {
            model.add_view_member(p, id);
        }
        id
    }
}

pub fn group_state(model: &Model, group: PropertyId) -> Option<&GroupState> {
    match model.property(group)?.kind() {
        PropertyKind::Group(state) => Some(state),
        _ => None,
    }
}

pub(crate) fn group_state_mut(model: &mut Model, group: PropertyId) -> Option<&mut GroupState> {
    match &mut model.property_mut(group)?.kind {
        PropertyKind::Group(state) => Some(state),
        _ => None,
    }
}

pub fn subgroups(model: &Model, group: PropertyId) -> Vec<PropertyId> {
    model.members(group).into_iter().filter(|&m| model.property(m).is_some_and(Property::is_group)).collect()
}

/// Matches filed directly in a group.
pub fn group_members(model: &Model, group: PropertyId) -> Vec<PropertyId> {
    model.members(group).into_iter().filter(|&m| model.property(m).is_some_and(|p| !p.is_group())).collect()
}

/// The group of a tree rooted at `root` with key `key`.
pub fn find_group(model: &Model, root: PropertyId, key: &[u32]) -> Option<PropertyId> {
    key.iter().try_fold(root, |group, &index| subgroups(model, group).get(index as usize).copied())
}

pub(crate) fn mark(model: &mut Model, group: PropertyId, exhausted: bool, complete: bool) {
    if let Some(g) = group_state_mut(model, group) {
        g.is_exhausted |= exhausted;
        g.is_complete |= complete;
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Registry;
    use crate::model::PropertyDef;

    #[test]
    fn test_keys_and_lookup() {
        let mut m = Model::new("m", Arc::new(Registry::standard()));
        let root = m.root();
        let a = m.add(root, PropertyDef::container("a")).unwrap();
        let b = m.add(root, PropertyDef::container("b")).unwrap();
        let leaf = m.add(b, PropertyDef::leaf("x", 1)).unwrap();

        let top = GroupState::create(&mut m, None, root, 1, false);
        let ga = GroupState::create(&mut m, Some(top), a, 0, false);
        let gb = GroupState::create(&mut m, Some(top), b, 0, true);
        m.add_view_member(gb, leaf);

        assert_eq!(group_state(&m, gb).unwrap().path_key.as_slice(), &[1]);
        assert_eq!(find_group(&m, top, &[0]), Some(ga));
        assert_eq!(find_group(&m, top, &[2]), None);
        assert_eq!(group_members(&m, gb), vec![leaf]);
        assert_eq!(subgroups(&m, top), vec![ga, gb]);
        assert_eq!(m.get_value(gb), Some(b));

        let live = m.live_properties();
        m.release_group_tree(top);
        assert_eq!(m.live_properties(), live - 3);
        assert!(m.property(leaf).is_some());
    }
}
