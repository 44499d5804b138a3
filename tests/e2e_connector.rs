//! End-to-end tests for connector wiring.
//!
//! Connectors are declared as model members and applied by
//! `Model::configure()`, which resolves them in the `Now` and `Final`
//! phases. Results are read back from the input pads' connection lists.

use std::sync::Arc;

use parking_lot::Mutex;
use pretty_assertions::assert_eq;
use topograph::catalog::types;
use topograph::connect::{GenericTranslator, PadLink, ReverseTranslator, Transducer, TransducerFactory};
use topograph::graph::Distributor;
use topograph::{
    Connector, ConnectorPattern, Error, Model, ModelConfig, Path, Point, PropertyDef, PropertyId, Registry,
    ResolutionModes, Terminus,
};

fn model() -> Model {
    Model::with_config("m", Arc::new(Registry::standard()), ModelConfig::default().with_echo_errors(false))
}

/// `dst/in0..` input pads and `src/out0..` output pads under the root.
fn pads(m: &mut Model, ins: usize, outs: usize) -> (Vec<PropertyId>, Vec<PropertyId>) {
    let root = m.root();
    let dst = m.add(root, PropertyDef::container("dst")).unwrap();
    let src = m.add(root, PropertyDef::container("src")).unwrap();
    let i = (0..ins).map(|k| m.add(dst, PropertyDef::input_pad(format!("in{k}"))).unwrap()).collect();
    let o = (0..outs).map(|k| m.add(src, PropertyDef::output_pad(format!("out{k}"))).unwrap()).collect();
    (i, o)
}

fn connector(m: &Model, to: &str, from: &str, pattern: ConnectorPattern) -> Connector {
    Connector::new(Path::parse(to, m.registry()).unwrap(), Path::parse(from, m.registry()).unwrap(), pattern)
}

fn declare(m: &mut Model, connector: Connector) -> PropertyId {
    let root = m.root();
    m.add(root, PropertyDef::connector("wire", connector)).unwrap()
}

fn sources(m: &Model, pad: PropertyId) -> Vec<PropertyId> {
    m.property(pad).unwrap().input_connections().iter().map(|c| c.source).collect()
}

// ============================================================================
// 1. Patterns
// ============================================================================

#[test]
fn test_one_to_one_through_configure() {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 3, 3);
    let c = connector(&m, "./dst/in.", "./src/out.", ConnectorPattern::OneToOne);
    let wire = declare(&mut m, c);

    m.configure().unwrap();
    for k in 0..3 {
        assert_eq!(sources(&m, ins[k]), vec![outs[k]]);
        let connection = &m.property(ins[k]).unwrap().input_connections()[0];
        assert_eq!(connection.connector, Some(wire));
    }
}

#[test]
fn test_one_to_one_uneven_sides() {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 3, 2);
    let c = connector(&m, "./dst/in.", "./src/out.", ConnectorPattern::OneToOne);
    declare(&mut m, c);

    m.configure().unwrap();
    assert_eq!(sources(&m, ins[0]), vec![outs[0]]);
    assert_eq!(sources(&m, ins[1]), vec![outs[1]]);
    assert!(sources(&m, ins[2]).is_empty());
}

#[test]
fn test_fan_in_and_star_wire_every_pair() {
    for pattern in [ConnectorPattern::FanIn, ConnectorPattern::Star] {
        let mut m = model();
        let (ins, outs) = pads(&mut m, 2, 3);
        let c = connector(&m, "./dst/in.", "./src/out.", pattern);
        declare(&mut m, c);

        m.configure().unwrap();
        for &pad in &ins {
            assert_eq!(sources(&m, pad), outs, "{pattern:?}");
        }
    }
}

#[test]
fn test_fan_out_wires_every_pair() {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 3, 2);
    let c = connector(&m, "./dst/in.", "./src/out.", ConnectorPattern::FanOut);
    declare(&mut m, c);

    m.configure().unwrap();
    for &pad in &ins {
        assert_eq!(sources(&m, pad), outs);
    }
}

// ============================================================================
// 2. Groups
// ============================================================================

/// `dst/d{1,2}/in{0,1}` and `src/s{1,2}/out{0,1}`.
fn grouped(m: &mut Model) -> (Vec<Vec<PropertyId>>, Vec<Vec<PropertyId>>) {
    let root = m.root();
    let dst = m.add(root, PropertyDef::container("dst")).unwrap();
    let src = m.add(root, PropertyDef::container("src")).unwrap();
    let mut ins = Vec::new();
    let mut outs = Vec::new();
    for g in 1..=2 {
        let d = m.add(dst, PropertyDef::container(format!("d{g}"))).unwrap();
        let s = m.add(src, PropertyDef::container(format!("s{g}"))).unwrap();
        ins.push((0..2).map(|k| m.add(d, PropertyDef::input_pad(format!("in{k}"))).unwrap()).collect());
        outs.push((0..2).map(|k| m.add(s, PropertyDef::output_pad(format!("out{k}"))).unwrap()).collect());
    }
    (ins, outs)
}

#[test]
fn test_fan_in_stays_within_paired_groups() {
    let mut m = model();
    let (ins, outs) = grouped(&mut m);
    let c = connector(&m, "./dst/d.|in.", "./src/s.|out.", ConnectorPattern::FanIn);
    declare(&mut m, c);

    m.configure().unwrap();
    for g in 0..2 {
        for &pad in &ins[g] {
            assert_eq!(sources(&m, pad), outs[g]);
        }
    }
}

#[test]
fn test_ungrouped_path_spans_containers() {
    let mut m = model();
    let (ins, outs) = grouped(&mut m);
    let c = connector(&m, "./dst/d./in.", "./src/s./out.", ConnectorPattern::FanIn);
    declare(&mut m, c);

    m.configure().unwrap();
    let every: Vec<_> = outs.iter().flatten().copied().collect();
    assert_eq!(sources(&m, ins[1][0]), every);
}

// ============================================================================
// 3. Translators and transducers
// ============================================================================

#[test]
fn test_reverse_translator() {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 3, 3);
    let c = connector(&m, "./dst/in.", "./src/out.", ConnectorPattern::OneToOne)
        .with_translator(Arc::new(ReverseTranslator));
    declare(&mut m, c);

    m.configure().unwrap();
    assert_eq!(sources(&m, ins[0]), vec![outs[2]]);
    assert_eq!(sources(&m, ins[2]), vec![outs[0]]);
}

#[test]
fn test_generic_translator_rotates_outputs() {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 3, 3);
    let rotate = GenericTranslator::new(|_, _to, from| from.rotate_left(1));
    let c = connector(&m, "./dst/in.", "./src/out.", ConnectorPattern::OneToOne).with_translator(Arc::new(rotate));
    declare(&mut m, c);

    m.configure().unwrap();
    assert_eq!(sources(&m, ins[0]), vec![outs[1]]);
    assert_eq!(sources(&m, ins[1]), vec![outs[2]]);
    assert_eq!(sources(&m, ins[2]), vec![outs[0]]);
}

#[derive(Debug, Default)]
struct Recorder(Arc<Mutex<Vec<(PropertyId, PropertyId)>>>);

#[derive(Debug)]
struct Recording(Arc<Mutex<Vec<(PropertyId, PropertyId)>>>);

impl TransducerFactory for Recorder {
    fn create(&self, _model: &Model, link: &PadLink) -> Option<Box<dyn Transducer>> {
        // Even-numbered pads get a transducer, the rest a direct wire.
        (link.to_pad.0 % 2 == 0).then(|| Box::new(Recording(Arc::clone(&self.0))) as Box<dyn Transducer>)
    }
}

impl Transducer for Recording {
    fn apply(&self, _model: &mut Model, link: &PadLink) -> topograph::Result<()> {
        self.0.lock().push((link.to_pad, link.from_pad));
        Ok(())
    }
}

#[test]
fn test_transducer_replaces_direct_wire() {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 2, 2);
    let recorder = Recorder::default();
    let seen = Arc::clone(&recorder.0);
    let c = connector(&m, "./dst/in.", "./src/out.", ConnectorPattern::OneToOne).with_transducer(Arc::new(recorder));
    declare(&mut m, c);

    m.configure().unwrap();
    let handled = seen.lock().clone();
    for k in 0..2 {
        let by_transducer = handled.contains(&(ins[k], outs[k]));
        assert_eq!(sources(&m, ins[k]).is_empty(), by_transducer);
    }
    assert_eq!(handled.len() + ins.iter().map(|&p| sources(&m, p).len()).sum::<usize>(), 2);
}

/// Hands every pairing to a [`Recording`], so the log shows wiring order.
#[derive(Debug, Default)]
struct RecordAll(Arc<Mutex<Vec<(PropertyId, PropertyId)>>>);

impl TransducerFactory for RecordAll {
    fn create(&self, _model: &Model, _link: &PadLink) -> Option<Box<dyn Transducer>> {
        Some(Box::new(Recording(Arc::clone(&self.0))))
    }
}

fn wiring_order(pattern: ConnectorPattern) -> (Vec<(PropertyId, PropertyId)>, Vec<PropertyId>, Vec<PropertyId>) {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 2, 2);
    let recorder = RecordAll::default();
    let seen = Arc::clone(&recorder.0);
    let c = connector(&m, "./dst/in.", "./src/out.", pattern).with_transducer(Arc::new(recorder));
    declare(&mut m, c);

    m.configure().unwrap();
    let order = seen.lock().clone();
    (order, ins, outs)
}

#[test]
fn test_fan_in_iterates_to_pads_outermost() {
    let (order, i, o) = wiring_order(ConnectorPattern::FanIn);
    assert_eq!(order, vec![(i[0], o[0]), (i[0], o[1]), (i[1], o[0]), (i[1], o[1])]);
}

#[test]
fn test_fan_out_iterates_from_pads_outermost() {
    let (order, i, o) = wiring_order(ConnectorPattern::FanOut);
    assert_eq!(order, vec![(i[0], o[0]), (i[1], o[0]), (i[0], o[1]), (i[1], o[1])]);
}

// ============================================================================
// 4. Errors and resolution modes
// ============================================================================

#[test]
fn test_pad_mismatch_fails_configure() {
    let mut m = model();
    let (ins, _) = pads(&mut m, 2, 2);
    let c = connector(&m, "./src/out.", "./dst/in.", ConnectorPattern::OneToOne);
    declare(&mut m, c);

    let err = m.configure().unwrap_err();
    assert!(matches!(err, topograph::Error::ConfigureFailed(2)));
    assert!(m.errors().entries().all(|e| e.code == types::CONNECTOR.statement(1)));
    assert!(sources(&m, ins[0]).is_empty());
}

#[test]
fn test_final_only_connector_waits_for_final_phase() {
    let mut m = model();
    let (ins, outs) = pads(&mut m, 1, 1);
    let to = Terminus::new(ResolutionModes::FINAL, Path::parse("./dst/in.", m.registry()).unwrap());
    let from = Terminus::new(ResolutionModes::FINAL, Path::parse("./src/out.", m.registry()).unwrap());
    let wire = declare(&mut m, Connector::with_termini(to, from, ConnectorPattern::OneToOne));

    m.configure().unwrap();
    assert_eq!(sources(&m, ins[0]), vec![outs[0]]);
    let topograph::PropertyKind::Connector(c) = m.property(wire).unwrap().kind() else {
        panic!("not a connector");
    };
    assert!(c.resolved().contains(ResolutionModes::FINAL));
    assert!(!c.needs_resolving(ResolutionModes::FINAL));
}

#[test]
fn test_apply_leaves_no_temporaries() {
    let mut m = model();
    grouped(&mut m);
    let c = connector(&m, "./dst/d.|in.", "./src/s.|out.", ConnectorPattern::OneToOne);
    let wire = declare(&mut m, c);
    let live = m.live_properties();
    let root = m.root();

    Connector::apply(&mut m, wire, ResolutionModes::NOW, root).unwrap();
    assert_eq!(m.live_properties(), live);
    assert_eq!(m.current_connector(), None);
}

// ============================================================================
// 5. Group completion
// ============================================================================

fn positioned_pad(k: usize) -> PropertyDef {
    PropertyDef::input_pad("in").with_position(Point::new([k as i64]))
}

fn input_pads(m: &Model, container: PropertyId) -> Vec<PropertyId> {
    m.members(container).into_iter().filter(|&id| m.property(id).is_some_and(|p| p.is_input_pad())).collect()
}

#[test]
fn test_unbounded_group_short_of_its_co_group_aborts() {
    let mut m = model();
    let root = m.root();
    let dst = m.add(root, PropertyDef::container("dst")).unwrap();
    let src = m.add(root, PropertyDef::container("src")).unwrap();
    for k in 0..2 {
        m.add(dst, positioned_pad(k)).unwrap();
    }
    for k in 0..3 {
        m.add(src, PropertyDef::output_pad(format!("out{k}"))).unwrap();
    }
    let c = connector(&m, "./dst/in(+)", "./src/out.", ConnectorPattern::OneToOne);
    let wire = declare(&mut m, c);
    let live = m.live_properties();

    let err = Connector::apply(&mut m, wire, ResolutionModes::NOW, root).unwrap_err();
    assert!(matches!(err, Error::IncompleteGroup(_)));
    let logged: Vec<_> = m.errors().entries().map(|e| (e.code, e.message.clone())).collect();
    assert_eq!(logged.len(), 1);
    assert_eq!(logged[0].0, types::CONNECTOR.statement(2));
    assert!(logged[0].1.starts_with("Connector.CheckComplete."));
    assert!(input_pads(&m, dst).iter().all(|&p| sources(&m, p).is_empty()));
    assert_eq!(m.live_properties(), live);
}

/// Adds `0..count` positioned input pads to its container.
#[derive(Debug)]
struct PositionedPads(usize);

impl Distributor for PositionedPads {
    fn apply(&self, model: &mut Model, _mode: ResolutionModes, container: PropertyId) -> topograph::Result<()> {
        for k in 0..self.0 {
            model.add(container, positioned_pad(k))?;
        }
        Ok(())
    }
}

#[test]
fn test_unbounded_group_grown_by_distributor_completes() {
    let mut m = model();
    let root = m.root();
    let dst = m.add(root, PropertyDef::container("dst")).unwrap();
    let src = m.add(root, PropertyDef::container("src")).unwrap();
    let outs: Vec<_> = (0..3).map(|k| m.add(src, PropertyDef::output_pad(format!("out{k}"))).unwrap()).collect();
    m.add(dst, PropertyDef::distributor("grow", Arc::new(PositionedPads(3)))).unwrap();
    let c = connector(&m, "./dst/in(+)", "./src/out.", ConnectorPattern::OneToOne);
    declare(&mut m, c);

    m.configure().unwrap();
    let wired: Vec<_> = input_pads(&m, dst).into_iter().map(|p| sources(&m, p)).collect();
    assert_eq!(wired, vec![vec![outs[0]], vec![outs[1]], vec![outs[2]]]);
    assert!(m.errors().is_empty());
}

// ============================================================================
// 6. Re-entrancy
// ============================================================================

#[test]
fn test_advancing_a_side_mid_enumeration_aborts() {
    let mut m = model();
    grouped(&mut m);
    // The From side nests one group level deeper than the To side.
    let root = m.root();
    let deep = m.add(root, PropertyDef::container("deep")).unwrap();
    for s in 1..=2 {
        let sg = m.add(deep, PropertyDef::container(format!("s{s}"))).unwrap();
        for t in 1..=2 {
            let tg = m.add(sg, PropertyDef::container(format!("t{t}"))).unwrap();
            m.add(tg, PropertyDef::output_pad("out0")).unwrap();
        }
    }
    let c = connector(&m, "./dst/d.|in.", "./deep/s.|t.|out.", ConnectorPattern::OneToOne);
    let wire = declare(&mut m, c);
    let live = m.live_properties();

    let err = Connector::apply(&mut m, wire, ResolutionModes::NOW, root).unwrap_err();
    assert!(matches!(err, Error::Reentrancy(ref side) if side == "To"));
    assert!(m.errors().entries().any(|e| e.code == types::CONNECTOR.statement(4)));
    assert_eq!(m.live_properties(), live);
    assert_eq!(m.current_connector(), None);
}
