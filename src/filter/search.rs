//! Search filter.

use std::sync::Arc;

use super::{FilterArgs, FilterContents, FilterContext, UP, split_flag, split_include};
use crate::enumerate::ScopeEnumerator;
use crate::graph::Model;
use crate::model::{IdentifierRegex, PropertyId};

/// Collects matches from the source and beyond it.
///
/// Searching up visits the source, then each ancestor up to the root.
/// Searching down visits the source, then every nested container
/// depth-first. Proxies are matched but not descended.
#[derive(Debug)]
pub struct SearchFilter {
    regex: IdentifierRegex,
    search_up: bool,
    include: bool,
}

impl SearchFilter {
    pub fn new(regex: IdentifierRegex, search_up: bool, include: bool) -> Self {
        Self { regex, search_up, include }
    }

    /// Literal form: `pattern[,up][,exclude]`.
    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let filter = match args? {
            FilterArgs::Search { regex, search_up, include } => Self::new(regex.clone(), *search_up, *include),
            FilterArgs::Opaque(text) => {
                let (rest, include) = split_include(text);
                let (pattern, direction) = split_flag(rest, &[UP, "down"]);
                Self::new(IdentifierRegex::parse(pattern).ok()?, direction == Some(UP), include)
            }
            _ => return None,
        };
        Some(Arc::new(filter))
    }

    fn scan(&self, model: &Model, container: PropertyId, requester: Option<PropertyId>, out: &mut Vec<PropertyId>) {
        let mut members = ScopeEnumerator::new(container, requester);
        while let Some(id) = members.move_next(model) {
            let Some(p) = model.property(id) else { continue };
            if self.regex.matches(p.identity()) == self.include {
                out.push(id);
            }
        }
    }
}

impl FilterContents for SearchFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        let mut out = Vec::new();
        if self.search_up {
            let mut current = Some(ctx.source);
            while let Some(container) = current {
                self.scan(model, container, ctx.requester, &mut out);
                current = model.property(container).and_then(|p| p.parent());
            }
            return out;
        }
        let mut pending = vec![ctx.source];
        while let Some(container) = pending.pop() {
            self.scan(model, container, ctx.requester, &mut out);
            let nested: Vec<_> = ScopeEnumerator::new(container, ctx.requester)
                .collect_all(model)
                .into_iter()
                .filter(|&m| model.get_value(m) == Some(m) && model.is_container(m))
                .collect();
            pending.extend(nested.into_iter().rev());
        }
        out
    }
}
