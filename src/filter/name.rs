//! Name filter.

use std::sync::Arc;

use super::{FilterArgs, FilterContents, FilterContext, split_include};
use crate::graph::Model;
use crate::model::{PropertyId, TextPattern};

/// Keeps members whose name matches `regex`. Unnamed members only match a
/// wild pattern.
#[derive(Debug)]
pub struct NameFilter {
    regex: TextPattern,
    include: bool,
}

impl NameFilter {
    pub fn new(regex: TextPattern, include: bool) -> Self {
        Self { regex, include }
    }

    /// Accepts `Name` arguments, or literal text used as the pattern.
    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let filter = match args? {
            FilterArgs::Name { regex, include } => Self::new(regex.clone(), *include),
            FilterArgs::Opaque(text) => {
                let (pattern, include) = split_include(text);
                Self::new(TextPattern::new(pattern).ok()?, include)
            }
            _ => return None,
        };
        Some(Arc::new(filter))
    }
}

impl FilterContents for NameFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        ctx.select(model, self.include, |p| self.regex.matches(p.name()))
    }
}
