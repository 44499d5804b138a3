//! Filters over the runtime type of members.

use std::sync::Arc;

use super::{FilterArgs, FilterContents, FilterContext, split_include};
use crate::catalog::TypeCode;
use crate::graph::Model;
use crate::model::{PropertyId, TextPattern};

#[derive(Debug, Clone)]
enum TypeTarget {
    Code(TypeCode),
    /// Class name from a path literal, looked up when the filter runs.
    Name(String),
}

/// Keeps members whose type is `type_code` or derives from it.
#[derive(Debug)]
pub struct TypeFilter {
    target: TypeTarget,
    include: bool,
}

impl TypeFilter {
    pub fn new(type_code: TypeCode, include: bool) -> Self {
        Self { target: TypeTarget::Code(type_code), include }
    }

    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let filter = match args? {
            FilterArgs::Type { type_code, include } => Self::new(*type_code, *include),
            FilterArgs::Opaque(text) => {
                let (name, include) = split_include(text);
                if name.is_empty() {
                    return None;
                }
                let target = match TypeCode::parse(name) {
                    Some(code) => TypeTarget::Code(code),
                    None => TypeTarget::Name(name.to_string()),
                };
                Self { target, include }
            }
            _ => return None,
        };
        Some(Arc::new(filter))
    }
}

impl FilterContents for TypeFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        let registry = model.registry();
        let base = match &self.target {
            TypeTarget::Code(code) => *code,
            TypeTarget::Name(name) => match registry.find_by_name(name) {
                Some(info) => info.type_code(),
                None => {
                    tracing::debug!(name = %name, "type filter names an unknown type");
                    return if self.include { Vec::new() } else { ctx.visible_members(model) };
                }
            },
        };
        ctx.select(model, self.include, |p| registry.is_a(p.type_code(), base))
    }
}

/// Keeps members whose class name matches `regex`.
#[derive(Debug)]
pub struct TypeNameFilter {
    regex: TextPattern,
    include: bool,
}

impl TypeNameFilter {
    pub fn new(regex: TextPattern, include: bool) -> Self {
        Self { regex, include }
    }

    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let filter = match args? {
            FilterArgs::TypeName { regex, include } => Self::new(regex.clone(), *include),
            FilterArgs::Opaque(text) => {
                let (pattern, include) = split_include(text);
                Self::new(TextPattern::new(pattern).ok()?, include)
            }
            _ => return None,
        };
        Some(Arc::new(filter))
    }
}

impl FilterContents for TypeNameFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        let registry = model.registry();
        ctx.select(model, self.include, |p| self.regex.matches(Some(&registry.name_of(p.type_code()))))
    }
}
