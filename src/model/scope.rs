//! Visibility scopes, access modes and resolution phases.

use std::fmt;
use std::ops::{BitAnd, BitOr, BitOrAssign};

use serde::{Deserialize, Serialize};

/// Visibility of a property to requesters elsewhere in the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Scope {
    /// Visible to everyone.
    #[default]
    Public,
    /// Hidden from its own parent, visible to everyone else.
    External,
    /// Visible only to requesters outside the parent's sub-tree.
    Unrelated,
    /// Visible only to requesters inside the parent's sub-tree.
    Protected,
    /// Visible to the parent and its children.
    Private,
    /// Visible to the parent only.
    SelfOnly,
}

macro_rules! flag_set {
    ($(#[$meta:meta])* $name:ident { $($(#[$fmeta:meta])* $flag:ident = $value:expr),* $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
        pub struct $name(pub u32);

        impl $name {
            $($(#[$fmeta])* pub const $flag: $name = $name($value);)*

            pub const fn bits(self) -> u32 {
                self.0
            }

            pub const fn contains(self, other: $name) -> bool {
                self.0 & other.0 == other.0
            }

            pub const fn intersects(self, other: $name) -> bool {
                self.0 & other.0 != 0
            }

            pub const fn is_empty(self) -> bool {
                self.0 == 0
            }

            pub const fn without(self, other: $name) -> $name {
                $name(self.0 & !other.0)
            }
        }

        impl BitOr for $name {
            type Output = $name;
            fn bitor(self, rhs: $name) -> $name {
                $name(self.0 | rhs.0)
            }
        }

        impl BitOrAssign for $name {
            fn bitor_assign(&mut self, rhs: $name) {
                self.0 |= rhs.0;
            }
        }

        impl BitAnd for $name {
            type Output = $name;
            fn bitand(self, rhs: $name) -> $name {
                $name(self.0 & rhs.0)
            }
        }
    };
}

flag_set! {
    /// How a property is being accessed.
    PropertyModes {
        NONE = 0,
        IS_IO = 1,
        INPUT = 2,
        WRITING = 4,
        /// Resolve containers through their directors.
        DIRECTING = 8,
        PRODUCING = 16,
        TRAVERSING = 8,
        ALL_OUTPUT = 1 | 4 | 8 | 16,
        ALL_INPUT = 2 | 1 | 4 | 8 | 16,
    }
}

flag_set! {
    /// When a connector terminus is resolved.
    ResolutionModes {
        NONE = 0,
        NOW = 1,
        FINAL = 2,
        DYNAMIC = 4,
        ALL = 1 | 2 | 4,
    }
}

impl fmt::Display for ResolutionModes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = [(Self::NOW, "Now"), (Self::FINAL, "Final"), (Self::DYNAMIC, "Dynamic")];
        let parts: Vec<_> = names.iter().filter(|(m, _)| self.contains(*m)).map(|(_, n)| *n).collect();
        if parts.is_empty() {
            write!(f, "None")
        } else {
            write!(f, "{}", parts.join("|"))
        }
    }
}

/// Configuration progress of a container, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum ConfigurePhase {
    #[default]
    Unconfigured,
    DistributorsNow,
    ConnectorsNow,
    ConvertersNow,
    ConnectorsFinal,
    ConvertersFinal,
    Configured,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_composition() {
        assert!(PropertyModes::ALL_INPUT.contains(PropertyModes::INPUT));
        assert!(PropertyModes::ALL_OUTPUT.contains(PropertyModes::DIRECTING));
        assert!(!PropertyModes::ALL_OUTPUT.contains(PropertyModes::INPUT));
        assert_eq!(PropertyModes::TRAVERSING, PropertyModes::DIRECTING);
    }

    #[test]
    fn test_resolution_display() {
        assert_eq!(ResolutionModes::NONE.to_string(), "None");
        assert_eq!((ResolutionModes::NOW | ResolutionModes::FINAL).to_string(), "Now|Final");
        assert!(ResolutionModes::ALL.intersects(ResolutionModes::DYNAMIC));
    }

    #[test]
    fn test_phase_order() {
        assert!(ConfigurePhase::DistributorsNow < ConfigurePhase::ConnectorsNow);
        assert!(ConfigurePhase::ConvertersNow < ConfigurePhase::ConnectorsFinal);
    }
}
