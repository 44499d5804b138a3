//! Translators reorder paired terminal groups before they are wired.

use std::fmt;
use std::sync::Arc;

use crate::graph::Model;
use crate::model::PropertyId;

pub trait Translator: fmt::Debug + Send + Sync {
    /// Reorder the members of a To group and its From co-group.
    fn order_group(&self, model: &Model, to: &mut Vec<PropertyId>, from: &mut Vec<PropertyId>);

    fn name(&self) -> &str;
}

/// Reverses the From side, so the first input meets the last output.
#[derive(Debug, Default, Clone, Copy)]
pub struct ReverseTranslator;

impl Translator for ReverseTranslator {
    fn order_group(&self, _model: &Model, _to: &mut Vec<PropertyId>, from: &mut Vec<PropertyId>) {
        from.reverse();
    }

    fn name(&self) -> &str {
        "ReverseTranslator"
    }
}

type OrderFn = dyn Fn(&Model, &mut Vec<PropertyId>, &mut Vec<PropertyId>) + Send + Sync;

/// Applies a caller-supplied ordering.
#[derive(Clone)]
pub struct GenericTranslator {
    order: Arc<OrderFn>,
}

impl GenericTranslator {
    pub fn new(order: impl Fn(&Model, &mut Vec<PropertyId>, &mut Vec<PropertyId>) + Send + Sync + 'static) -> Self {
        Self { order: Arc::new(order) }
    }
}

impl fmt::Debug for GenericTranslator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GenericTranslator")
    }
}

impl Translator for GenericTranslator {
    fn order_group(&self, model: &Model, to: &mut Vec<PropertyId>, from: &mut Vec<PropertyId>) {
        (self.order)(model, to, from);
    }

    fn name(&self) -> &str {
        "GenericTranslator"
    }
}
