//! Group filter: passes members through and orders connector groups.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{FilterArgs, FilterContents, FilterContext};
use crate::graph::Model;
use crate::model::PropertyId;

/// Order applied to a completed group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GroupOrder {
    /// Declaration order of the members.
    #[default]
    Declaration,
    Reverse,
    /// By identity: name, then position.
    ByName,
}

impl GroupOrder {
    pub fn as_str(self) -> &'static str {
        match self {
            GroupOrder::Declaration => "declaration",
            GroupOrder::Reverse => "reverse",
            GroupOrder::ByName => "name",
        }
    }

    fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "" | "declaration" => Some(GroupOrder::Declaration),
            "reverse" => Some(GroupOrder::Reverse),
            "name" => Some(GroupOrder::ByName),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct GroupFilter {
    order: GroupOrder,
}

impl GroupFilter {
    pub fn new(order: GroupOrder) -> Self {
        Self { order }
    }

    pub fn factory(args: Option<&FilterArgs>) -> Option<Arc<dyn FilterContents>> {
        let order = match args {
            None => GroupOrder::Declaration,
            Some(FilterArgs::Group { order }) => *order,
            Some(FilterArgs::Opaque(text)) => GroupOrder::parse(text)?,
            Some(_) => return None,
        };
        Some(Arc::new(Self::new(order)))
    }
}

impl FilterContents for GroupFilter {
    fn collect(&self, model: &Model, ctx: &FilterContext) -> Vec<PropertyId> {
        ctx.visible_members(model)
    }

    fn is_group_filter(&self) -> bool {
        true
    }

    fn order_group(&self, model: &Model, members: &mut Vec<PropertyId>) {
        let order_of = |id: PropertyId| model.property(id).map_or(u32::MAX, |p| p.order());
        match self.order {
            GroupOrder::Declaration => members.sort_by_key(|&id| order_of(id)),
            GroupOrder::Reverse => {
                members.sort_by_key(|&id| order_of(id));
                members.reverse();
            }
            GroupOrder::ByName => members.sort_by(|&a, &b| match (model.property(a), model.property(b)) {
                (Some(pa), Some(pb)) => pa.identity().compare_to(pb.identity()),
                _ => a.cmp(&b),
            }),
        }
    }
}
