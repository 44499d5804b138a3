//! Identifier filter: the filter every regex path segment runs through.

use std::sync::Arc;

use super::{FilterArgs, FilterContents, FilterContext, split_include};
use crate::graph::Model;
use crate::model::{IdentifierRegex, PropertyId};

#[derive(Debug)]
pub struct IdentifierFilter {
    regex: IdentifierRegex,
    include: bool,
}

impl IdentifierFilter {
    pub fn new(regex: IdentifierRegex, include: bool) -> Self {
        Self { regex, include }
    }

    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let filter = match args? {
            FilterArgs::Identifier { regex, include } => Self::new(regex.clone(), *include),
            FilterArgs::Opaque(text) => {
                let (pattern, include) = split_include(text);
                Self::new(IdentifierRegex::parse(pattern).ok()?, include)
            }
            _ => return None,
        };
        Some(Arc::new(filter))
    }
}

impl FilterContents for IdentifierFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        let registry = model.registry();
        ctx.select(model, self.include, |p| {
            let type_name = self.regex.type_name().map(|_| registry.name_of(p.type_code()));
            self.regex.matches_typed(p.identity(), type_name.as_deref())
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::catalog::Registry;
    use crate::model::{Point, PointRegex, PropertyDef, PropertyModes};

    #[test]
    fn test_position_and_type_terms() {
        let mut m = Model::new("m", Arc::new(Registry::standard()));
        let root = m.root();
        let c1 = m.add(root, PropertyDef::container("cell").with_position(Point::new([1]))).unwrap();
        let c2 = m.add(root, PropertyDef::leaf("cell", 0).with_position(Point::new([2]))).unwrap();
        m.add(root, PropertyDef::leaf("cell", 0)).unwrap();
        let ctx =
            FilterContext { creator: None, parent: root, source: root, requester: None, mode: PropertyModes::NONE };

        let positioned = IdentifierRegex::new("cell").unwrap().with_position(PointRegex::Unbounded);
        assert_eq!(IdentifierFilter::new(positioned.clone(), true).collect(&m, &ctx), vec![c1, c2]);

        let containers = positioned.with_type_name("^Container$").unwrap();
        assert_eq!(IdentifierFilter::new(containers, true).collect(&m, &ctx), vec![c1]);
    }
}
