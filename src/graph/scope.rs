//! Visibility checks between a property and a requester.

use super::Model;
use crate::model::{PropertyId, Scope};

impl Model {
    /// Whether `id` is visible to `requester`.
    ///
    /// Public properties and anonymous requests always pass. Otherwise the
    /// property and its ancestors below the branch point with the requester
    /// are checked in turn; a requester in another tree sees nothing that
    /// is not public.
    pub fn in_scope(&self, id: PropertyId, requester: Option<PropertyId>) -> bool {
        let Some(requester) = requester else {
            return true;
        };
        let Some(property) = self.property(id) else {
            return false;
        };
        if property.scope == Scope::Public {
            return true;
        }
        let Some(common) = self.common_ancestor(id, requester) else {
            return false;
        };
        let common_level = self.property(common).map_or(0, |p| p.level);
        let related = common == id || Some(common) == property.parent;
        let requester_parent = self.property(requester).and_then(|p| p.parent);

        let mut checks = if related { 1 } else { property.level.saturating_sub(common_level) };
        let mut current = Some(id);
        while checks > 0 {
            let Some(p) = current.and_then(|c| self.property(c)) else {
                return false;
            };
            let parent = p.parent;
            let allowed = match p.scope {
                Scope::Public => true,
                Scope::External => parent != Some(requester),
                Scope::Unrelated => !related,
                Scope::Protected => related,
                Scope::Private => parent == Some(requester) || (parent.is_some() && parent == requester_parent),
                Scope::SelfOnly => parent == Some(requester),
            };
            if !allowed {
                return false;
            }
            checks -= 1;
            current = parent;
        }
        true
    }

    /// Deepest property that is `a` or an ancestor of `a` and also `b` or an
    /// ancestor of `b`.
    pub fn common_ancestor(&self, a: PropertyId, b: PropertyId) -> Option<PropertyId> {
        let mut pa = a;
        let mut pb = b;
        let mut la = self.property(pa)?.level;
        let mut lb = self.property(pb)?.level;
        while la > lb {
            pa = self.property(pa)?.parent?;
            la -= 1;
        }
        while lb > la {
            pb = self.property(pb)?.parent?;
            lb -= 1;
        }
        while pa != pb {
            pa = self.property(pa)?.parent?;
            pb = self.property(pb)?.parent?;
        }
        Some(pa)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::catalog::Registry;
    use crate::model::{PropertyDef, Scope};
    use crate::Model;

    struct Tree {
        model: Model,
        cell: crate::model::PropertyId,
        inner: crate::model::PropertyId,
        sibling: crate::model::PropertyId,
        outsider: crate::model::PropertyId,
    }

    /// root/{cell/{inner}, sibling, far/{outsider}}
    fn tree() -> Tree {
        let mut model = Model::new("m", Arc::new(Registry::standard()));
        let root = model.root();
        let cell = model.add(root, PropertyDef::container("cell")).unwrap();
        let inner = model.add(cell, PropertyDef::container("inner")).unwrap();
        let sibling = model.add(root, PropertyDef::leaf("sibling", 0)).unwrap();
        let far = model.add(root, PropertyDef::container("far")).unwrap();
        let outsider = model.add(far, PropertyDef::leaf("outsider", 0)).unwrap();
        Tree { model, cell, inner, sibling, outsider }
    }

    fn scoped(t: &mut Tree, scope: Scope) -> crate::model::PropertyId {
        t.model.add(t.cell, PropertyDef::leaf(format!("{scope:?}"), 0).with_scope(scope)).unwrap()
    }

    #[test]
    fn test_public_and_anonymous() {
        let mut t = tree();
        let p = scoped(&mut t, Scope::Public);
        let s = scoped(&mut t, Scope::SelfOnly);
        assert!(t.model.in_scope(p, Some(t.outsider)));
        assert!(t.model.in_scope(s, None));
    }

    #[test]
    fn test_self_only_visible_to_parent() {
        let mut t = tree();
        let s = scoped(&mut t, Scope::SelfOnly);
        assert!(t.model.in_scope(s, Some(t.cell)));
        assert!(!t.model.in_scope(s, Some(t.inner)));
        assert!(!t.model.in_scope(s, Some(t.outsider)));
    }

    #[test]
    fn test_private_visible_to_parent_and_children() {
        let mut t = tree();
        let s = scoped(&mut t, Scope::Private);
        assert!(t.model.in_scope(s, Some(t.cell)));
        assert!(t.model.in_scope(s, Some(t.inner)));
        assert!(!t.model.in_scope(s, Some(t.sibling)));
    }

    #[test]
    fn test_protected_and_unrelated_are_complements() {
        let mut t = tree();
        let prot = scoped(&mut t, Scope::Protected);
        let unrel = scoped(&mut t, Scope::Unrelated);
        for requester in [t.inner, t.cell] {
            assert!(t.model.in_scope(prot, Some(requester)));
            assert!(!t.model.in_scope(unrel, Some(requester)));
        }
        assert!(!t.model.in_scope(prot, Some(t.outsider)));
        assert!(t.model.in_scope(unrel, Some(t.outsider)));
    }

    #[test]
    fn test_external_hidden_from_parent_only() {
        let mut t = tree();
        let e = scoped(&mut t, Scope::External);
        assert!(!t.model.in_scope(e, Some(t.cell)));
        assert!(t.model.in_scope(e, Some(t.outsider)));
    }

    #[test]
    fn test_detached_requester_denied() {
        let mut t = tree();
        let s = scoped(&mut t, Scope::Protected);
        let detached = t.model.add(t.cell, PropertyDef::leaf("gone", 0)).unwrap();
        t.model.remove(t.cell, detached).unwrap();
        assert!(!t.model.in_scope(s, Some(detached)));
        assert_eq!(t.model.common_ancestor(t.inner, t.outsider), Some(t.model.root()));
    }
}
