//! Position filter.

use std::sync::Arc;

use super::{FilterArgs, FilterContents, FilterContext, split_include};
use crate::graph::Model;
use crate::model::{PointRegex, PropertyId};

/// Keeps members whose identity position satisfies a [`PointRegex`].
#[derive(Debug)]
pub struct PointFilter {
    regex: PointRegex,
    include: bool,
}

impl PointFilter {
    pub fn new(regex: PointRegex, include: bool) -> Self {
        Self { regex, include }
    }

    /// Only typed `Point` arguments; positions have no literal form.
    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        match args? {
            FilterArgs::Point { regex, include } => Some(Arc::new(Self::new(regex.clone(), *include))),
            FilterArgs::Opaque(text) => {
                let (pattern, include) = split_include(text);
                Some(Arc::new(Self::new(PointRegex::parse(pattern)?, include)))
            }
            _ => None,
        }
    }
}

impl FilterContents for PointFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        ctx.select(model, self.include, |p| self.regex.matches(p.identity().position()))
    }
}
