//! # Enumerators
//!
//! Cursor-style walks over the hierarchy. None of them borrow the model
//! between steps: every `move_next` takes it again, and positions are
//! indexes into declaration order, so members appended behind the cursor
//! are still visited.

mod container;
mod group_tree;
mod scope;

pub use container::{ContainerEnumerator, ContainerWalk};
pub use group_tree::GroupTreeEnumerator;
pub use scope::ScopeEnumerator;
