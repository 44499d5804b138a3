//! Positions and position patterns.

use std::fmt;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Integer coordinates attached to an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Point(pub SmallVec<[i64; 3]>);

impl Point {
    pub fn new(coords: impl IntoIterator<Item = i64>) -> Self {
        Point(coords.into_iter().collect())
    }

    pub fn dims(&self) -> usize {
        self.0.len()
    }

    /// Parse the `(1,-2)` form written by `Display`.
    pub fn parse(text: &str) -> Option<Self> {
        let inner = text.trim().strip_prefix('(')?.strip_suffix(')')?;
        if inner.trim().is_empty() {
            return None;
        }
        inner.split(',').map(|c| c.trim().parse().ok()).collect::<Option<SmallVec<[i64; 3]>>>().map(Point)
    }

    pub fn coords(&self) -> &[i64] {
        &self.0
    }

    /// Hash folded into identifier hashes.
    pub fn hash_code(&self) -> u32 {
        self.0.iter().fold(self.0.len() as u32, |h, &c| {
            let c = (c as u64 ^ (c as u64 >> 32)) as u32;
            h.rotate_left(5) ^ c.wrapping_mul(0x9e37_79b9)
        })
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, c) in self.0.iter().enumerate() {
            if i > 0 { write!(f, ",")?; }
            write!(f, "{c}")?;
        }
        write!(f, ")")
    }
}

/// Classification of a [`PointRegex`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PointStatus {
    Simple,
    Multivalued,
    Wild,
    Unbounded,
}

/// Pattern over positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointRegex {
    /// Exactly this point.
    Simple(Point),
    /// Every point inside the inclusive box `min..=max`.
    Range { min: Point, max: Point },
    /// Any position, including none.
    Wild,
    /// Any present position, with no declared count. A path segment carrying
    /// this pattern is unbounded for group sizing.
    Unbounded,
}

impl PointRegex {
    pub fn status(&self) -> PointStatus {
        match self {
            PointRegex::Simple(_) => PointStatus::Simple,
            PointRegex::Range { .. } => PointStatus::Multivalued,
            PointRegex::Wild => PointStatus::Wild,
            PointRegex::Unbounded => PointStatus::Unbounded,
        }
    }

    /// Parse the forms written by `Display`: `(*)`, `(+)`, `(1,2)` and
    /// `(0,0)..(2,2)`.
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim() {
            "(*)" => Some(PointRegex::Wild),
            "(+)" => Some(PointRegex::Unbounded),
            text => match text.split_once("..") {
                Some((min, max)) => Some(PointRegex::Range { min: Point::parse(min)?, max: Point::parse(max)? }),
                None => Point::parse(text).map(PointRegex::Simple),
            },
        }
    }

    pub fn matches(&self, position: Option<&Point>) -> bool {
        let Some(p) = position else {
            return matches!(self, PointRegex::Wild);
        };
        match self {
            PointRegex::Simple(q) => p == q,
            PointRegex::Range { min, max } => within(p, min, max),
            PointRegex::Wild | PointRegex::Unbounded => true,
        }
    }

    /// Whether some position could satisfy both patterns.
    pub fn pattern_matches(&self, other: &PointRegex) -> bool {
        use PointRegex::*;
        match (self, other) {
            (Wild | Unbounded, _) | (_, Wild | Unbounded) => true,
            (Simple(a), Simple(b)) => a == b,
            (Simple(p), Range { min, max }) | (Range { min, max }, Simple(p)) => within(p, min, max),
            (Range { min: a0, max: a1 }, Range { min: b0, max: b1 }) => {
                a0.dims() == b0.dims()
                    && a0.0.iter().zip(&b1.0).all(|(lo, hi)| lo <= hi)
                    && b0.0.iter().zip(&a1.0).all(|(lo, hi)| lo <= hi)
            }
        }
    }
}

/// Split a trailing position pattern off a segment token, so `in(+)` yields
/// `("in", Unbounded)`. A trailing group that is not a position pattern is
/// left in place.
pub fn split_position(text: &str) -> Option<(&str, PointRegex)> {
    let open = text.rfind('(')?;
    if let Some(open) = text[..open].strip_suffix("..").and_then(|head| head.rfind('(')) {
        if let Some(range) = PointRegex::parse(&text[open..]) {
            return Some((&text[..open], range));
        }
    }
    PointRegex::parse(&text[open..]).map(|p| (&text[..open], p))
}

fn within(p: &Point, min: &Point, max: &Point) -> bool {
    p.dims() == min.dims()
        && p.dims() == max.dims()
        && p.0.iter().zip(&min.0).zip(&max.0).all(|((c, lo), hi)| lo <= c && c <= hi)
}

impl fmt::Display for PointRegex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PointRegex::Simple(p) => write!(f, "{p}"),
            PointRegex::Range { min, max } => write!(f, "{min}..{max}"),
            PointRegex::Wild => write!(f, "(*)"),
            PointRegex::Unbounded => write!(f, "(+)"),
        }
    }
}
