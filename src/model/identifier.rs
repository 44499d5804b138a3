//! Property identity: an optional name plus an optional position.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::point::Point;

/// Paul Hsieh's SuperFastHash over `data`.
pub fn super_fast_hash(data: &[u8]) -> u32 {
    if data.is_empty() {
        return 0;
    }
    let get16 = |b: &[u8]| u32::from(b[0]) | (u32::from(b[1]) << 8);

    let mut hash = data.len() as u32;
    let mut chunks = data.chunks_exact(4);
    for chunk in &mut chunks {
        hash = hash.wrapping_add(get16(&chunk[0..2]));
        let tmp = (get16(&chunk[2..4]) << 11) ^ hash;
        hash = (hash << 16) ^ tmp;
        hash = hash.wrapping_add(hash >> 11);
    }

    // Bytes are sign-extended, as the reference implementation reads them
    // through `signed char`.
    let rem = chunks.remainder();
    match rem.len() {
        3 => {
            hash = hash.wrapping_add(get16(&rem[0..2]));
            hash ^= hash << 16;
            hash ^= ((rem[2] as i8 as i32) << 18) as u32;
            hash = hash.wrapping_add(hash >> 11);
        }
        2 => {
            hash = hash.wrapping_add(get16(&rem[0..2]));
            hash ^= hash << 11;
            hash = hash.wrapping_add(hash >> 17);
        }
        1 => {
            hash = hash.wrapping_add(rem[0] as i8 as i32 as u32);
            hash ^= hash << 10;
            hash = hash.wrapping_add(hash >> 1);
        }
        _ => {}
    }

    hash ^= hash << 3;
    hash = hash.wrapping_add(hash >> 5);
    hash ^= hash << 4;
    hash = hash.wrapping_add(hash >> 17);
    hash ^= hash << 25;
    hash = hash.wrapping_add(hash >> 6);
    hash
}

/// Name and/or position of a property within its container.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identifier {
    name: Option<String>,
    position: Option<Point>,
    hash: u32,
}

impl Identifier {
    pub fn new(name: impl Into<String>) -> Self {
        Self::build(Some(name.into()), None)
    }

    pub fn with_position(name: impl Into<String>, position: Point) -> Self {
        Self::build(Some(name.into()), Some(position))
    }

    pub fn positioned(position: Point) -> Self {
        Self::build(None, Some(position))
    }

    /// `prefix` followed by `counter`, e.g. `pad7`.
    pub fn generate(prefix: &str, counter: u64) -> Self {
        Self::new(format!("{prefix}{counter}"))
    }

    fn build(name: Option<String>, position: Option<Point>) -> Self {
        let name_hash = name.as_deref().map_or(0, |n| super_fast_hash(n.as_bytes()));
        let position_hash = position.as_ref().map_or(0, Point::hash_code);
        Self { name, position, hash: name_hash ^ position_hash }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn position(&self) -> Option<&Point> {
        self.position.as_ref()
    }

    pub fn hash_code(&self) -> u32 {
        self.hash
    }

    /// Orders by name, then by position; a term absent on either side is
    /// skipped.
    pub fn compare_to(&self, other: &Identifier) -> Ordering {
        let by_name = match (&self.name, &other.name) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => Ordering::Equal,
        };
        by_name.then_with(|| match (&self.position, &other.position) {
            (Some(a), Some(b)) => a.cmp(b),
            _ => Ordering::Equal,
        })
    }

    pub fn status_report(&self) -> String {
        match (&self.name, &self.position) {
            (Some(n), Some(p)) => format!("{n}{p}"),
            (Some(n), None) => n.clone(),
            (None, Some(p)) => p.to_string(),
            (None, None) => String::new(),
        }
    }
}

impl PartialEq for Identifier {
    fn eq(&self, other: &Self) -> bool {
        self.hash == other.hash && self.name == other.name && self.position == other.position
    }
}

impl Eq for Identifier {}

impl Hash for Identifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u32(self.hash);
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.status_report())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::new(name)
    }
}

impl From<String> for Identifier {
    fn from(name: String) -> Self {
        Identifier::new(name)
    }
}
