//! Class catalogue: compact type codes, ancestry queries and name lookup.
//!
//! Every property carries a [`TypeCode`]: a library id and a class id packed
//! into one integer. The low bits of the same layout hold a per-class
//! "statement" index, which turns a [`CatalogueCode`] into a stable,
//! printable error code.
//!
//! ```text
//!  30        24 23              12 11               0
//! +------------+------------------+------------------+
//! |  library   |      class       |    statement     |
//! +------------+------------------+------------------+
//! ```
//!
//! The [`Registry`] replaces process-wide type tables: it is built once,
//! shared through an `Arc`, and handed to each [`Model`](crate::Model).

pub mod types;

use std::fmt;
use std::sync::Arc;

use hashbrown::HashMap;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::filter::FilterFactory;
use crate::{Error, Result};

// ============================================================================
// Catalogue codes
// ============================================================================

/// One of the three packed fields of a catalogue code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CatalogueField {
    Library,
    Class,
    Statement,
}

impl CatalogueField {
    pub const fn max(self) -> u32 {
        match self {
            CatalogueField::Library => 0x7f,
            CatalogueField::Class => 0xfff,
            CatalogueField::Statement => 0xfff,
        }
    }

    pub const fn start_bit(self) -> u32 {
        match self {
            CatalogueField::Library => 24,
            CatalogueField::Class => 12,
            CatalogueField::Statement => 0,
        }
    }

    /// Out-of-range values collapse to zero rather than bleeding into the
    /// neighbouring field.
    const fn saturate(self, value: u32) -> u32 {
        if value > self.max() { 0 } else { value }
    }
}

/// Packed `(library, class, statement)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CatalogueCode(pub u32);

impl CatalogueCode {
    pub const fn new(library_id: u32, class_id: u32, statement: u32) -> Self {
        let l = CatalogueField::Library.saturate(library_id);
        let c = CatalogueField::Class.saturate(class_id);
        let s = CatalogueField::Statement.saturate(statement);
        CatalogueCode(
            (l << CatalogueField::Library.start_bit())
                | (c << CatalogueField::Class.start_bit())
                | (s << CatalogueField::Statement.start_bit()),
        )
    }

    pub const fn field(self, field: CatalogueField) -> u32 {
        (self.0 >> field.start_bit()) & field.max()
    }

    pub const fn with_field(self, field: CatalogueField, value: u32) -> Self {
        let mask = field.max() << field.start_bit();
        let value = field.saturate(value) << field.start_bit();
        CatalogueCode((self.0 & !mask) | value)
    }

    /// The type part of the code, with the statement cleared.
    pub const fn type_code(self) -> TypeCode {
        TypeCode(self.with_field(CatalogueField::Statement, 0).0)
    }
}

impl fmt::Display for CatalogueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            self.field(CatalogueField::Library),
            self.field(CatalogueField::Class),
            self.field(CatalogueField::Statement)
        )
    }
}

/// Packed `(library, class)` identity of a property type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeCode(pub u32);

impl TypeCode {
    pub const fn pack(library_id: u32, class_id: u32) -> Self {
        CatalogueCode::new(library_id, class_id, 0).type_code()
    }

    /// Parse the `library:class` form written by `Display`.
    pub fn parse(text: &str) -> Option<Self> {
        let (library, class) = text.trim().split_once(':')?;
        Some(Self::pack(library.parse().ok()?, class.parse().ok()?))
    }

    pub const fn library_id(self) -> u32 {
        CatalogueCode(self.0).field(CatalogueField::Library)
    }

    pub const fn class_id(self) -> u32 {
        CatalogueCode(self.0).field(CatalogueField::Class)
    }

    /// Error code for statement `index` of this class.
    pub const fn statement(self, index: u32) -> CatalogueCode {
        CatalogueCode(self.0).with_field(CatalogueField::Statement, index)
    }
}

impl fmt::Display for TypeCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.library_id(), self.class_id())
    }
}

// ============================================================================
// ClassTypeInfo
// ============================================================================

/// Runtime description of one property class.
#[derive(Debug, Clone)]
pub struct ClassTypeInfo {
    name: String,
    class_id: u32,
    library_id: u32,
    type_code: TypeCode,
    base: Option<TypeCode>,
    /// Ancestors, nearest first. Filled in by [`Registry::register`].
    ancestors: SmallVec<[TypeCode; 8]>,
    is_filter: bool,
    factory: Option<FilterFactory>,
}

impl ClassTypeInfo {
    pub fn new(name: impl Into<String>, class_id: u32, library_id: u32) -> Self {
        Self {
            name: name.into(),
            class_id,
            library_id,
            type_code: TypeCode::pack(library_id, class_id),
            base: None,
            ancestors: SmallVec::new(),
            is_filter: false,
            factory: None,
        }
    }

    pub fn with_base(mut self, base: TypeCode) -> Self {
        self.base = Some(base);
        self
    }

    pub fn with_factory(mut self, factory: FilterFactory) -> Self {
        self.factory = Some(factory);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn class_id(&self) -> u32 {
        self.class_id
    }

    pub fn library_id(&self) -> u32 {
        self.library_id
    }

    pub fn type_code(&self) -> TypeCode {
        self.type_code
    }

    pub fn base(&self) -> Option<TypeCode> {
        self.base
    }

    pub fn ancestors(&self) -> &[TypeCode] {
        &self.ancestors
    }

    pub fn is_filter(&self) -> bool {
        self.is_filter
    }

    pub fn factory(&self) -> Option<FilterFactory> {
        self.factory
    }

    /// How many inheritance steps separate `self` from `base`:
    /// `Some(0)` for the same type, `None` when `base` is not an ancestor.
    pub fn distance_from(&self, base: TypeCode) -> Option<u32> {
        if base == self.type_code {
            return Some(0);
        }
        self.ancestors
            .iter()
            .position(|&code| code == base)
            .map(|index| index as u32 + 1)
    }

    pub fn is_a(&self, base: TypeCode) -> bool {
        self.distance_from(base).is_some()
    }

    pub fn catalogue_code(&self, statement: u32) -> CatalogueCode {
        CatalogueCode::new(self.library_id, self.class_id, statement)
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
struct Catalogue {
    by_name: HashMap<String, Arc<ClassTypeInfo>>,
    by_code: HashMap<TypeCode, Arc<ClassTypeInfo>>,
}

/// The class catalogue. Lookups are by name or by type code.
#[derive(Default)]
pub struct Registry {
    table: RwLock<Catalogue>,
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry").field("types", &self.len()).finish()
    }
}

impl Registry {
    /// An empty catalogue.
    pub fn new() -> Self {
        Self::default()
    }

    /// A catalogue holding every built-in type.
    pub fn standard() -> Self {
        let registry = Self::new();
        for info in types::builtin() {
            // The built-in table is ordered bases-first and has unique codes.
            if let Err(e) = registry.register(info) {
                tracing::warn!(error = %e, "built-in type registration failed");
            }
        }
        registry
    }

    /// Add a type. Its base, when given, must already be registered.
    pub fn register(&self, mut info: ClassTypeInfo) -> Result<TypeCode> {
        let mut table = self.table.write();
        if table.by_name.contains_key(&info.name) || table.by_code.contains_key(&info.type_code) {
            return Err(Error::DuplicateType(info.name));
        }

        info.ancestors.clear();
        if let Some(base) = info.base {
            let base_info = table
                .by_code
                .get(&base)
                .ok_or_else(|| Error::UnknownType(base.to_string()))?;
            info.ancestors.push(base);
            info.ancestors.extend(base_info.ancestors.iter().copied());
            info.is_filter = base_info.is_filter || base == types::FILTER;
        }
        if info.type_code == types::FILTER {
            info.is_filter = true;
        }

        let code = info.type_code;
        tracing::trace!(name = %info.name, %code, "registered type");
        let info = Arc::new(info);
        table.by_name.insert(info.name.clone(), Arc::clone(&info));
        table.by_code.insert(code, info);
        Ok(code)
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<ClassTypeInfo>> {
        self.table.read().by_name.get(name).cloned()
    }

    pub fn get(&self, code: TypeCode) -> Option<Arc<ClassTypeInfo>> {
        self.table.read().by_code.get(&code).cloned()
    }

    pub fn name_of(&self, code: TypeCode) -> String {
        self.get(code)
            .map(|info| info.name.clone())
            .unwrap_or_else(|| code.to_string())
    }

    pub fn len(&self) -> usize {
        self.table.read().by_code.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Inheritance steps from `derived` up to `base`; `None` when unrelated
    /// in that direction or either type is unknown.
    pub fn ancestor_distance(&self, base: TypeCode, derived: TypeCode) -> Option<u32> {
        if base == derived {
            return Some(0);
        }
        self.get(derived)?.distance_from(base)
    }

    pub fn is_a(&self, derived: TypeCode, base: TypeCode) -> bool {
        self.ancestor_distance(base, derived).is_some()
    }

    /// The member of `available` that `candidate` derives from most closely.
    pub fn closest_base(&self, candidate: TypeCode, available: &[TypeCode]) -> Option<TypeCode> {
        let info = self.get(candidate)?;
        available
            .iter()
            .filter_map(|&base| info.distance_from(base).map(|d| (d, base)))
            .min_by_key(|&(d, _)| d)
            .map(|(_, base)| base)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn chain() -> (Registry, TypeCode, TypeCode, TypeCode) {
        let registry = Registry::new();
        let a = registry.register(ClassTypeInfo::new("A", 10, 2)).unwrap();
        let b = registry.register(ClassTypeInfo::new("B", 11, 2).with_base(a)).unwrap();
        let c = registry.register(ClassTypeInfo::new("C", 12, 2).with_base(b)).unwrap();
        (registry, a, b, c)
    }

    #[test]
    fn test_type_code_parses_its_display_form() {
        let code = types::INPUT_PAD;
        assert_eq!(TypeCode::parse(&code.to_string()), Some(code));
        assert_eq!(TypeCode::parse("InputPad"), None);
    }

    #[test]
    fn test_ancestor_distance() {
        let (registry, a, b, c) = chain();
        assert_eq!(registry.ancestor_distance(a, c), Some(2));
        assert_eq!(registry.ancestor_distance(b, c), Some(1));
        assert_eq!(registry.ancestor_distance(c, c), Some(0));
        assert_eq!(registry.ancestor_distance(c, a), None);
    }

    #[test]
    fn test_closest_base_prefers_nearest() {
        let (registry, a, b, c) = chain();
        assert_eq!(registry.closest_base(c, &[a, b]), Some(b));
        assert_eq!(registry.closest_base(b, &[c]), None);
    }

    #[test]
    fn test_duplicate_and_missing_base() {
        let (registry, a, _, _) = chain();
        assert!(matches!(
            registry.register(ClassTypeInfo::new("A", 99, 2)),
            Err(Error::DuplicateType(_))
        ));
        let orphan = ClassTypeInfo::new("Orphan", 50, 2).with_base(TypeCode::pack(3, 3));
        assert!(matches!(registry.register(orphan), Err(Error::UnknownType(_))));
        assert_eq!(registry.find_by_name("A").map(|i| i.type_code()), Some(a));
    }

    #[test]
    fn test_standard_filters_flagged() {
        let registry = Registry::standard();
        let name_filter = registry.find_by_name("NameFilter").unwrap();
        assert!(name_filter.is_filter());
        assert!(name_filter.factory().is_some());
        assert!(!registry.find_by_name("Container").unwrap().is_filter());
        assert_eq!(registry.ancestor_distance(types::PROPERTY, types::GROUP_FILTER), Some(3));
    }

    #[test]
    fn test_out_of_range_fields_saturate_to_zero() {
        let code = CatalogueCode::new(0x80, 5, 0x1000);
        assert_eq!(code.field(CatalogueField::Library), 0);
        assert_eq!(code.field(CatalogueField::Class), 5);
        assert_eq!(code.field(CatalogueField::Statement), 0);
        assert_eq!(code.to_string(), "0.5.0");
    }

    proptest! {
        #[test]
        fn prop_fields_survive_packing(l in 0u32..=0x7f, c in 0u32..=0xfff, s in 0u32..=0xfff) {
            let code = CatalogueCode::new(l, c, s);
            prop_assert_eq!(code.field(CatalogueField::Library), l);
            prop_assert_eq!(code.field(CatalogueField::Class), c);
            prop_assert_eq!(code.field(CatalogueField::Statement), s);
            prop_assert_eq!(code.type_code(), TypeCode::pack(l, c));
        }

        #[test]
        fn prop_with_field_touches_one_field(
            l in 0u32..=0x7f,
            c in 0u32..=0xfff,
            s in 0u32..=0xfff,
            v in 0u32..=0xfff,
        ) {
            let code = CatalogueCode::new(l, c, s).with_field(CatalogueField::Statement, v);
            prop_assert_eq!(code.field(CatalogueField::Library), l);
            prop_assert_eq!(code.field(CatalogueField::Class), c);
            prop_assert_eq!(code.field(CatalogueField::Statement), v);
        }
    }
}
