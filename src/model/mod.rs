//! # Property Model
//!
//! Plain data types of the hierarchy: identities and their patterns, leaf
//! values, scopes and modes, property records and container storage.
//!
//! Nothing here walks the hierarchy; that is [`Model`](crate::Model)'s job.

pub mod container;
pub mod identifier;
pub mod identifier_regex;
pub mod point;
pub mod property;
pub mod scope;
pub mod value;

pub use container::{Container, Member};
pub use identifier::{Identifier, super_fast_hash};
pub use identifier_regex::{IdentifierRegex, TextPattern, ANY_PATTERN, WILD_PATTERN, is_regex};
pub use point::{Point, PointRegex, PointStatus, split_position};
pub use property::{
    AliasTarget, ClassKind, InputConnection, Property, PropertyDef, PropertyId, PropertyKind,
};
pub use scope::{ConfigurePhase, PropertyModes, ResolutionModes, Scope};
pub use value::Value;
