//! End-to-end tests for filter segments in path literals.
//!
//! Filters are written as `Filter:typeof(Name)(args)` or
//! `Filter:path(<constructor path>)(args)` segments and evaluated by
//! `Model::query`, which must leave no filter views behind.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use topograph::catalog::types;
use topograph::{
    Connector, ConnectorPattern, Model, ModelConfig, Path, PropertyDef, PropertyId, PropertyModes, Registry,
};

/// tmp/{a1,a2,a3}/{bN1,bN2,bN3}, plus tmp/empty and tmp/pads/{in0,out0}.
fn sample() -> (Model, PropertyId) {
    let mut m = Model::with_config("m", Arc::new(Registry::standard()), ModelConfig::default().with_echo_errors(false));
    let root = m.root();
    let tmp = m.add(root, PropertyDef::container("tmp")).unwrap();
    for a in 1..=3 {
        let ai = m.add(tmp, PropertyDef::container(format!("a{a}"))).unwrap();
        for b in 1..=3 {
            m.add(ai, PropertyDef::leaf(format!("b{a}{b}"), a * 10 + b)).unwrap();
        }
    }
    m.add(tmp, PropertyDef::container("empty")).unwrap();
    let pads = m.add(tmp, PropertyDef::container("pads")).unwrap();
    m.add(pads, PropertyDef::input_pad("in0")).unwrap();
    m.add(pads, PropertyDef::output_pad("out0")).unwrap();
    (m, tmp)
}

/// Names found by `text` from `start`; also checks no view leaked.
fn names(m: &mut Model, text: &str, start: PropertyId) -> Vec<String> {
    let path = Path::parse(text, m.registry()).unwrap();
    let live = m.live_properties();
    let found = m.query(&path, start, None, PropertyModes::NONE);
    assert_eq!(m.live_properties(), live, "views leaked by {text}");
    found.into_iter().map(|id| m.property(id).unwrap().identity().to_string()).collect()
}

// ============================================================================
// 1. Membership filters
// ============================================================================

#[test]
fn test_name_filter_include_and_exclude() {
    let (mut m, tmp) = sample();
    assert_eq!(names(&mut m, "./a2/Filter:typeof(NameFilter)(b2[12])", tmp), ["b21", "b22"]);
    assert_eq!(names(&mut m, "./a2/Filter:typeof(NameFilter)(b21,exclude)", tmp), ["b22", "b23"]);
}

#[test]
fn test_filter_in_the_middle_of_a_path() {
    let (mut m, tmp) = sample();
    assert_eq!(names(&mut m, "./Filter:typeof(NameFilter)(a[13])/b.3", tmp), ["b13", "b33"]);
}

#[test]
fn test_type_filters() {
    let (mut m, tmp) = sample();
    assert_eq!(names(&mut m, "./pads/Filter:typeof(TypeFilter)(InputPad)", tmp), ["in0"]);
    assert_eq!(names(&mut m, "./pads/Filter:typeof(TypeFilter)(Pad)", tmp), ["in0", "out0"]);
    assert_eq!(names(&mut m, "./pads/Filter:typeof(TypeNameFilter)(Output)", tmp), ["out0"]);
}

#[test]
fn test_vacant_filter() {
    let (mut m, tmp) = sample();
    assert_eq!(names(&mut m, "./Filter:typeof(VacantFilter)", tmp), ["empty"]);
}

#[test]
fn test_neighbourhood_filter_counts_layers() {
    let (mut m, tmp) = sample();
    // Five containers directly below tmp, nine leaves and two pads one level further.
    assert_eq!(names(&mut m, "./Filter:typeof(NeighbourhoodFilter)(1)", tmp).len(), 5);
    assert_eq!(names(&mut m, "./Filter:typeof(NeighbourhoodFilter)(2)", tmp).len(), 16);
}

#[test]
fn test_search_filter_finds_nested_member() {
    let (mut m, tmp) = sample();
    assert_eq!(names(&mut m, "./Filter:typeof(SearchFilter)(b32)", tmp), ["b32"]);
}

#[test]
fn test_path_filter_matches_descendants() {
    let (mut m, tmp) = sample();
    assert_eq!(names(&mut m, "./Filter:typeof(PathFilter)(./a3/b3[23])", tmp), ["b32", "b33"]);
}

// ============================================================================
// 2. Constructor paths
// ============================================================================

#[test]
fn test_filter_built_from_constructor_path() {
    let (mut m, tmp) = sample();
    let root = m.root();
    let lib = m.add(root, PropertyDef::container("lib")).unwrap();
    m.add(lib, PropertyDef::constructor("by_name", types::NAME_FILTER)).unwrap();
    assert_eq!(names(&mut m, "./a1/Filter:path(/lib/by_name)(b13)", tmp), ["b13"]);
}

#[test]
fn test_unresolved_constructor_is_logged() {
    let (mut m, tmp) = sample();
    assert!(names(&mut m, "./a1/Filter:path(/lib/missing)", tmp).is_empty());
    let codes: Vec<_> = m.errors().entries().map(|e| e.code).collect();
    assert_eq!(codes, vec![types::PATH_NODE.statement(1)]);
}

// ============================================================================
// 3. Group filters under a connector
// ============================================================================

#[test]
fn test_group_filter_reorders_connector_group() {
    let (mut m, _) = sample();
    let root = m.root();
    let dst = m.add(root, PropertyDef::container("dst")).unwrap();
    let src = m.add(root, PropertyDef::container("src")).unwrap();
    let ins: Vec<_> = (0..3).map(|k| m.add(dst, PropertyDef::input_pad(format!("in{k}"))).unwrap()).collect();
    let outs: Vec<_> = (0..3).map(|k| m.add(src, PropertyDef::output_pad(format!("out{k}"))).unwrap()).collect();

    let to = Path::parse("./dst/Filter:typeof(GroupFilter)(reverse)", m.registry()).unwrap();
    let from = Path::parse("./src/out.", m.registry()).unwrap();
    m.add(root, PropertyDef::connector("wire", Connector::new(to, from, ConnectorPattern::OneToOne))).unwrap();

    m.configure().unwrap();
    let source =
        |pad: PropertyId| m.property(pad).unwrap().input_connections().iter().map(|c| c.source).collect::<Vec<_>>();
    assert_eq!(source(ins[2]), vec![outs[0]]);
    assert_eq!(source(ins[0]), vec![outs[2]]);
}
