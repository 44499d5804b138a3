//! Structural filters: nearby descendants and vacant members.

use std::sync::Arc;

use super::{FilterArgs, FilterContents, FilterContext, opaque_include};
use crate::enumerate::ScopeEnumerator;
use crate::graph::Model;
use crate::model::{PropertyId, PropertyKind};

/// Keeps descendants of the source at most `layers` levels down, width
/// first. One layer is the source's own members.
#[derive(Debug)]
pub struct NeighbourhoodFilter {
    layers: u32,
}

impl NeighbourhoodFilter {
    pub fn new(layers: u32) -> Self {
        Self { layers }
    }

    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let layers = match args {
            None => 1,
            Some(FilterArgs::Neighbourhood { layers }) => *layers,
            Some(FilterArgs::Opaque(text)) => text.trim().parse().ok()?,
            Some(_) => return None,
        };
        Some(Arc::new(Self::new(layers)))
    }
}

impl FilterContents for NeighbourhoodFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        let mut out = Vec::new();
        let mut layer = vec![ctx.source];
        for _ in 0..self.layers {
            let mut next = Vec::new();
            for container in layer {
                for m in ScopeEnumerator::new(container, ctx.requester).collect_all(model) {
                    out.push(m);
                    if model.get_value(m) == Some(m) && model.is_container(m) {
                        next.push(m);
                    }
                }
            }
            if next.is_empty() {
                break;
            }
            layer = next;
        }
        out
    }
}

/// Keeps empty containers and leaves holding a vacant value.
#[derive(Debug)]
pub struct VacantFilter {
    include: bool,
}

impl VacantFilter {
    pub fn new(include: bool) -> Self {
        Self { include }
    }

    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let include = match args {
            None => true,
            Some(FilterArgs::Vacant { include }) => *include,
            Some(FilterArgs::Opaque(text)) => opaque_include(text),
            Some(_) => return None,
        };
        Some(Arc::new(Self::new(include)))
    }
}

impl FilterContents for VacantFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        ctx.select(model, self.include, |p| match (&p.kind, p.contents()) {
            (_, Some(c)) => c.is_empty(),
            (PropertyKind::Leaf(v), None) => v.is_vacant(),
            _ => false,
        })
    }
}
