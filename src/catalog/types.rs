//! Built-in type codes (library 1).

use super::{ClassTypeInfo, TypeCode};
use crate::filter;

pub const STANDARD_LIBRARY: u32 = 1;

const fn std_type(class_id: u32) -> TypeCode {
    TypeCode::pack(STANDARD_LIBRARY, class_id)
}

pub const PROPERTY: TypeCode = std_type(1);
pub const CONTAINER: TypeCode = std_type(2);
pub const MODEL: TypeCode = std_type(3);
pub const ALIAS: TypeCode = std_type(4);
pub const LINK: TypeCode = std_type(5);
pub const PATH: TypeCode = std_type(6);
pub const PATH_NODE: TypeCode = std_type(7);

pub const FILTER: TypeCode = std_type(100);
pub const GROUP_FILTER: TypeCode = std_type(101);
pub const IDENTIFIER_FILTER: TypeCode = std_type(102);
pub const NAME_FILTER: TypeCode = std_type(103);
pub const NEIGHBOURHOOD_FILTER: TypeCode = std_type(104);
pub const PATH_FILTER: TypeCode = std_type(105);
pub const POINT_FILTER: TypeCode = std_type(106);
pub const SEARCH_FILTER: TypeCode = std_type(107);
pub const TYPE_FILTER: TypeCode = std_type(108);
pub const TYPE_NAME_FILTER: TypeCode = std_type(109);
pub const VACANT_FILTER: TypeCode = std_type(110);

pub const CONNECTOR: TypeCode = std_type(200);
pub const GROUP_CONTAINER: TypeCode = std_type(201);
pub const CONVERTER: TypeCode = std_type(202);
pub const DISTRIBUTOR: TypeCode = std_type(203);
pub const DIRECTOR: TypeCode = std_type(204);
pub const CONSTRUCTOR: TypeCode = std_type(220);
pub const REVERSE_TRANSLATOR: TypeCode = std_type(251);
pub const TRANSLATOR: TypeCode = std_type(252);

pub const PAD: TypeCode = std_type(300);
pub const OUTPUT_PAD: TypeCode = std_type(301);
pub const INPUT_PAD: TypeCode = std_type(302);

/// The built-in table, bases before derived types.
pub(crate) fn builtin() -> Vec<ClassTypeInfo> {
    let t = |name: &str, code: TypeCode| ClassTypeInfo::new(name, code.class_id(), STANDARD_LIBRARY);
    vec![
        t("Property", PROPERTY),
        t("Container", CONTAINER).with_base(PROPERTY),
        t("Model", MODEL).with_base(CONTAINER),
        t("Alias", ALIAS).with_base(PROPERTY),
        t("Link", LINK).with_base(CONTAINER),
        t("Path", PATH),
        t("PathNode", PATH_NODE),
        t("Filter", FILTER).with_base(CONTAINER),
        t("GroupFilter", GROUP_FILTER)
            .with_base(FILTER)
            .with_factory(filter::group::GroupFilter::factory),
        t("IdentifierFilter", IDENTIFIER_FILTER)
            .with_base(FILTER)
            .with_factory(filter::identifier::IdentifierFilter::factory),
        t("NameFilter", NAME_FILTER)
            .with_base(FILTER)
            .with_factory(filter::name::NameFilter::factory),
        t("NeighbourhoodFilter", NEIGHBOURHOOD_FILTER)
            .with_base(FILTER)
            .with_factory(filter::neighbourhood::NeighbourhoodFilter::factory),
        t("PathFilter", PATH_FILTER)
            .with_base(FILTER)
            .with_factory(filter::path::PathFilter::factory),
        t("PointFilter", POINT_FILTER)
            .with_base(FILTER)
            .with_factory(filter::point::PointFilter::factory),
        t("SearchFilter", SEARCH_FILTER)
            .with_base(FILTER)
            .with_factory(filter::search::SearchFilter::factory),
        t("TypeFilter", TYPE_FILTER)
            .with_base(FILTER)
            .with_factory(filter::types::TypeFilter::factory),
        t("TypeNameFilter", TYPE_NAME_FILTER)
            .with_base(FILTER)
            .with_factory(filter::types::TypeNameFilter::factory),
        t("VacantFilter", VACANT_FILTER)
            .with_base(FILTER)
            .with_factory(filter::neighbourhood::VacantFilter::factory),
        t("Connector", CONNECTOR).with_base(PROPERTY),
        t("GroupContainer", GROUP_CONTAINER).with_base(CONTAINER),
        t("Converter", CONVERTER).with_base(CONTAINER),
        t("Distributor", DISTRIBUTOR).with_base(PROPERTY),
        t("Director", DIRECTOR).with_base(PROPERTY),
        t("Constructor", CONSTRUCTOR).with_base(PROPERTY),
        t("Translator", TRANSLATOR).with_base(PROPERTY),
        t("ReverseTranslator", REVERSE_TRANSLATOR).with_base(TRANSLATOR),
        t("Pad", PAD).with_base(PROPERTY),
        t("OutputPad", OUTPUT_PAD).with_base(PAD),
        t("InputPad", INPUT_PAD).with_base(PAD),
    ]
}
