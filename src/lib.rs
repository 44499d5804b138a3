//! # topograph: hierarchical property models, path queries and connector wiring
//!
//! A model is a tree of named properties. Containers hold members, aliases
//! and directors stand in for other properties, pads carry connections, and
//! connectors wire output pads to input pads by path.
//!
//! ## Design Principles
//!
//! 1. **Arena-owned**: the [`Model`] owns every property; everything else
//!    holds [`PropertyId`] handles
//! 2. **Paths are values**: a [`Path`] parses once and resolves anywhere
//! 3. **Filters are views**: filter segments compute members on demand and
//!    are released when the query moves on
//! 4. **Errors are logged, not thrown**: configuration problems land in the
//!    model's error stack; only programming errors surface as [`Error`]
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use topograph::{Model, Path, PropertyDef, Registry};
//!
//! # fn example() -> topograph::Result<()> {
//! let mut model = Model::new("demo", Arc::new(Registry::standard()));
//! let root = model.root();
//! let a = model.add(root, PropertyDef::container("a1"))?;
//! model.add(a, PropertyDef::leaf("b11", 1))?;
//! model.add(a, PropertyDef::leaf("b12", 2))?;
//!
//! let path = Path::parse("./a./b1.", model.registry())?;
//! let found = model.query(&path, root, None, topograph::PropertyModes::NONE);
//! let paths: Vec<_> = found.iter().map(|&id| model.path_of(id)).collect();
//! assert_eq!(paths, ["/a1/b11", "/a1/b12"]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! | Module | Contents |
//! |--------|----------|
//! | `catalog` | type codes, class registry, catalogue error codes |
//! | `model` | identifiers, patterns, property and container types |
//! | `graph` | the [`Model`] arena, scope rules, error stack, configure/run |
//! | `enumerate` | member, container and group-tree walks |
//! | `path` | path syntax, resolution and multi-match enumeration |
//! | `filter` | filter views built from path segments |
//! | `connect` | connectors, group trees, translators and transducers |

// ============================================================================
// Modules
// ============================================================================

pub mod catalog;
pub mod config;
pub mod connect;
pub mod enumerate;
pub mod filter;
pub mod graph;
pub mod model;
pub mod path;

// ============================================================================
// Re-exports: Model
// ============================================================================

pub use graph::{ErrorContext, ErrorMessage, Model};
pub use model::{
    Identifier, IdentifierRegex, Point, PointRegex, Property, PropertyDef, PropertyId, PropertyKind, PropertyModes,
    ResolutionModes, Scope, Value,
};

// ============================================================================
// Re-exports: Catalogue and configuration
// ============================================================================

pub use catalog::{CatalogueCode, ClassTypeInfo, Registry, TypeCode};
pub use config::ModelConfig;

// ============================================================================
// Re-exports: Paths, filters and connectors
// ============================================================================

pub use connect::{Connector, ConnectorPattern, Terminus};
pub use filter::{FilterArgs, FilterSpec};
pub use path::{Path, PathEnumerator, PathNode};

// ============================================================================
// Error Types
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Path syntax error at position {position}: {message}")]
    SyntaxError { position: usize, message: String },

    #[error("Invalid regex '{pattern}': {message}")]
    InvalidRegex { pattern: String, message: String },

    #[error("Type already registered: {0}")]
    DuplicateType(String),

    #[error("Unknown type: {0}")]
    UnknownType(String),

    #[error("Unknown property: {0}")]
    UnknownProperty(PropertyId),

    #[error("Not a container: {0}")]
    NotAContainer(PropertyId),

    #[error("{member} is not a member of {container}")]
    NotAMember { container: PropertyId, member: PropertyId },

    #[error("Container {container} accepts no {type_name}")]
    CategoryRejected { container: String, type_name: String },

    #[error("Filter construction failed: {0}")]
    FilterConstruction(String),

    #[error("Incomplete group: {0}")]
    IncompleteGroup(String),

    #[error("Re-entrant enumeration of the {0}-path")]
    Reentrancy(String),

    #[error("Configure failed with {0} logged errors")]
    ConfigureFailed(usize),

    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
