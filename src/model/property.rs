//! The universal graph node.
//!
//! Properties live in the [`Model`](crate::Model) arena and refer to each
//! other by [`PropertyId`]. `parent` and `creator` are plain handles used
//! for traversal only; the arena owns every property.

use std::cell::OnceCell;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::container::Container;
use super::identifier::Identifier;
use super::point::Point;
use super::scope::Scope;
use super::value::Value;
use crate::catalog::{TypeCode, types};
use crate::connect::Connector;
use crate::connect::group::GroupState;
use crate::filter::FilterState;
use crate::graph::{Converter, Distributor};
use crate::path::Path;

/// Arena handle of a property.
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PropertyId(pub u32);

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// What an alias stands for.
#[derive(Debug, Clone)]
pub enum AliasTarget {
    Property(PropertyId),
    /// Re-resolved on every access, from the alias' creator.
    Path(Path),
}

/// A wire recorded on an input pad.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputConnection {
    pub source: PropertyId,
    pub connector: Option<PropertyId>,
}

/// Coarse classification used by the configure phases.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Leaf,
    Container,
    Proxy,
    Pad,
    Director,
    Constructor,
    Connector,
    Distributor,
    Converter,
    Filter,
    Group,
}

pub enum PropertyKind {
    Leaf(Value),
    Container,
    Alias(AliasTarget),
    /// Proxy to a path destination, resolved once on first access.
    Link { path: Path, resolved: OnceCell<Option<PropertyId>> },
    /// Routes lookups made through it to the target property.
    Director(PropertyId),
    /// Names a filter type so `Filter:path(..)` segments can construct it.
    Constructor(TypeCode),
    InputPad(Vec<InputConnection>),
    OutputPad,
    Connector(Box<Connector>),
    Distributor(Arc<dyn Distributor>),
    Converter(Arc<dyn Converter>),
    Filter(FilterState),
    Group(GroupState),
}

impl fmt::Debug for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyKind::Leaf(v) => f.debug_tuple("Leaf").field(v).finish(),
            PropertyKind::Container => f.write_str("Container"),
            PropertyKind::Alias(t) => f.debug_tuple("Alias").field(t).finish(),
            PropertyKind::Link { path, .. } => f.debug_tuple("Link").field(&path.status_report()).finish(),
            PropertyKind::Director(t) => f.debug_tuple("Director").field(t).finish(),
            PropertyKind::Constructor(t) => f.debug_tuple("Constructor").field(t).finish(),
            PropertyKind::InputPad(c) => f.debug_tuple("InputPad").field(&c.len()).finish(),
            PropertyKind::OutputPad => f.write_str("OutputPad"),
            PropertyKind::Connector(c) => f.debug_tuple("Connector").field(c).finish(),
            PropertyKind::Distributor(d) => f.debug_tuple("Distributor").field(d).finish(),
            PropertyKind::Converter(c) => f.debug_tuple("Converter").field(c).finish(),
            PropertyKind::Filter(s) => f.debug_tuple("Filter").field(s).finish(),
            PropertyKind::Group(g) => f.debug_tuple("Group").field(g).finish(),
        }
    }
}

impl PropertyKind {
    /// Type code used when the definition does not name one.
    pub fn default_type(&self) -> TypeCode {
        match self {
            PropertyKind::Leaf(_) => types::PROPERTY,
            PropertyKind::Container => types::CONTAINER,
            PropertyKind::Alias(_) => types::ALIAS,
            PropertyKind::Link { .. } => types::LINK,
            PropertyKind::Director(_) => types::DIRECTOR,
            PropertyKind::Constructor(_) => types::CONSTRUCTOR,
            PropertyKind::InputPad(_) => types::INPUT_PAD,
            PropertyKind::OutputPad => types::OUTPUT_PAD,
            PropertyKind::Connector(_) => types::CONNECTOR,
            PropertyKind::Distributor(_) => types::DISTRIBUTOR,
            PropertyKind::Converter(_) => types::CONVERTER,
            PropertyKind::Filter(_) => types::FILTER,
            PropertyKind::Group(_) => types::GROUP_CONTAINER,
        }
    }
}

#[derive(Debug)]
pub struct Property {
    pub(crate) identity: Identifier,
    pub(crate) type_code: TypeCode,
    pub(crate) creator: Option<PropertyId>,
    pub(crate) parent: Option<PropertyId>,
    pub(crate) scope: Scope,
    pub(crate) level: u32,
    pub(crate) order: u32,
    pub(crate) kind: PropertyKind,
    pub(crate) contents: Option<Container>,
}

impl Property {
    pub fn identity(&self) -> &Identifier {
        &self.identity
    }

    pub fn name(&self) -> Option<&str> {
        self.identity.name()
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    pub fn creator(&self) -> Option<PropertyId> {
        self.creator
    }

    pub fn parent(&self) -> Option<PropertyId> {
        self.parent
    }

    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// Depth below the model root (the root is level 0).
    pub fn level(&self) -> u32 {
        self.level
    }

    pub fn order(&self) -> u32 {
        self.order
    }

    pub fn kind(&self) -> &PropertyKind {
        &self.kind
    }

    pub fn contents(&self) -> Option<&Container> {
        self.contents.as_ref()
    }

    pub fn value(&self) -> Option<&Value> {
        match &self.kind {
            PropertyKind::Leaf(v) => Some(v),
            _ => None,
        }
    }

    pub fn is_container(&self) -> bool {
        self.contents.is_some()
    }

    pub fn is_proxied(&self) -> bool {
        matches!(
            self.kind,
            PropertyKind::Alias(_) | PropertyKind::Link { .. } | PropertyKind::Group(_)
        )
    }

    pub fn is_filter(&self) -> bool {
        matches!(self.kind, PropertyKind::Filter(_))
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, PropertyKind::Group(_))
    }

    pub fn is_input_pad(&self) -> bool {
        matches!(self.kind, PropertyKind::InputPad(_))
    }

    pub fn is_output_pad(&self) -> bool {
        matches!(self.kind, PropertyKind::OutputPad)
    }

    pub fn is_director(&self) -> bool {
        matches!(self.kind, PropertyKind::Director(_))
    }

    pub fn input_connections(&self) -> &[InputConnection] {
        match &self.kind {
            PropertyKind::InputPad(c) => c,
            _ => &[],
        }
    }

    pub fn class_kind(&self) -> ClassKind {
        match &self.kind {
            PropertyKind::Leaf(_) => ClassKind::Leaf,
            PropertyKind::Container => ClassKind::Container,
            PropertyKind::Alias(_) | PropertyKind::Link { .. } => ClassKind::Proxy,
            PropertyKind::Director(_) => ClassKind::Director,
            PropertyKind::Constructor(_) => ClassKind::Constructor,
            PropertyKind::InputPad(_) | PropertyKind::OutputPad => ClassKind::Pad,
            PropertyKind::Connector(_) => ClassKind::Connector,
            PropertyKind::Distributor(_) => ClassKind::Distributor,
            PropertyKind::Converter(_) => ClassKind::Converter,
            PropertyKind::Filter(_) => ClassKind::Filter,
            PropertyKind::Group(_) => ClassKind::Group,
        }
    }
}

// ============================================================================
// Definitions (builder for Model::add)
// ============================================================================

/// Everything needed to create a property, minus its placement.
#[derive(Debug)]
pub struct PropertyDef {
    pub(crate) identity: Identifier,
    pub(crate) type_code: Option<TypeCode>,
    pub(crate) scope: Scope,
    pub(crate) creator: Option<PropertyId>,
    pub(crate) kind: PropertyKind,
    pub(crate) contents: Option<Container>,
}

impl PropertyDef {
    pub fn new(identity: impl Into<Identifier>, kind: PropertyKind) -> Self {
        Self {
            identity: identity.into(),
            type_code: None,
            scope: Scope::Public,
            creator: None,
            kind,
            contents: None,
        }
    }

    pub fn leaf(name: impl Into<Identifier>, value: impl Into<Value>) -> Self {
        Self::new(name, PropertyKind::Leaf(value.into()))
    }

    /// A container accepting any property.
    pub fn container(name: impl Into<Identifier>) -> Self {
        Self::new(name, PropertyKind::Container).accepting(&[types::PROPERTY])
    }

    pub fn alias(name: impl Into<Identifier>, target: PropertyId) -> Self {
        Self::new(name, PropertyKind::Alias(AliasTarget::Property(target)))
    }

    pub fn alias_path(name: impl Into<Identifier>, path: Path) -> Self {
        Self::new(name, PropertyKind::Alias(AliasTarget::Path(path)))
    }

    pub fn link(name: impl Into<Identifier>, path: Path) -> Self {
        Self::new(name, PropertyKind::Link { path, resolved: OnceCell::new() })
    }

    pub fn director(name: impl Into<Identifier>, target: PropertyId) -> Self {
        Self::new(name, PropertyKind::Director(target))
    }

    pub fn constructor(name: impl Into<Identifier>, filter_type: TypeCode) -> Self {
        Self::new(name, PropertyKind::Constructor(filter_type))
    }

    pub fn input_pad(name: impl Into<Identifier>) -> Self {
        Self::new(name, PropertyKind::InputPad(Vec::new()))
    }

    pub fn output_pad(name: impl Into<Identifier>) -> Self {
        Self::new(name, PropertyKind::OutputPad)
    }

    pub fn connector(name: impl Into<Identifier>, connector: Connector) -> Self {
        Self::new(name, PropertyKind::Connector(Box::new(connector)))
    }

    pub fn distributor(name: impl Into<Identifier>, distributor: Arc<dyn Distributor>) -> Self {
        Self::new(name, PropertyKind::Distributor(distributor))
    }

    pub fn converter(name: impl Into<Identifier>, converter: Arc<dyn Converter>) -> Self {
        Self::new(name, PropertyKind::Converter(converter))
    }

    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    pub fn with_type(mut self, type_code: TypeCode) -> Self {
        self.type_code = Some(type_code);
        self
    }

    pub fn with_creator(mut self, creator: PropertyId) -> Self {
        self.creator = Some(creator);
        self
    }

    pub fn with_position(mut self, position: Point) -> Self {
        let name = self.identity.name().map(str::to_string);
        self.identity = match name {
            Some(n) => Identifier::with_position(n, position),
            None => Identifier::positioned(position),
        };
        self
    }

    /// Make this a container accepting `categories`.
    pub fn accepting(mut self, categories: &[TypeCode]) -> Self {
        self.contents = Some(Container::new(categories));
        self
    }

    /// Composite containers are descended by the configure phases.
    pub fn composite(mut self, is_composite: bool) -> Self {
        if let Some(c) = self.contents.as_mut() {
            c.is_composite = is_composite;
        }
        self
    }

    pub fn emulated(mut self, emulator: Arc<dyn crate::graph::Emulator>) -> Self {
        if let Some(c) = self.contents.as_mut() {
            c.do_emulate = true;
            c.emulator = Some(emulator);
        }
        self
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code.unwrap_or_else(|| self.kind.default_type())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_types() {
        assert_eq!(PropertyDef::input_pad("in").type_code(), types::INPUT_PAD);
        assert_eq!(PropertyDef::container("c").type_code(), types::CONTAINER);
        assert_eq!(PropertyDef::leaf("x", 1).with_type(types::PAD).type_code(), types::PAD);
    }

    #[test]
    fn test_position_keeps_name() {
        let def = PropertyDef::leaf("cell", 0).with_position(Point::new([2, 3]));
        assert_eq!(def.identity.to_string(), "cell(2,3)");
    }

    #[test]
    fn test_container_flag_follows_contents() {
        let def = PropertyDef::container("box").composite(false);
        assert!(def.contents.as_ref().is_some_and(|c| !c.is_composite));
        assert!(PropertyDef::leaf("x", 1).contents.is_none());
    }
}
