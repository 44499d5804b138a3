//! End-to-end tests for the configure and run lifecycle.
//!
//! Distributors add structure, connectors wire it and converters see the
//! result, all driven by `Model::configure()`. `Model::run()` then steps
//! emulated containers.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use pretty_assertions::assert_eq;
use topograph::catalog::types;
use topograph::graph::{Converter, Distributor, Emulator};
use topograph::model::ConfigurePhase;
use topograph::{
    Connector, ConnectorPattern, Error, Model, ModelConfig, Path, PropertyDef, PropertyId, Registry, ResolutionModes,
};

fn model() -> Model {
    Model::with_config("m", Arc::new(Registry::standard()), ModelConfig::default().with_echo_errors(false))
}

/// Adds `count` input pads to the container it is applied in.
#[derive(Debug)]
struct PadMaker {
    count: usize,
}

impl Distributor for PadMaker {
    fn apply(&self, model: &mut Model, _mode: ResolutionModes, container: PropertyId) -> topograph::Result<()> {
        for k in 0..self.count {
            model.add(container, PropertyDef::input_pad(format!("in{k}")))?;
        }
        Ok(())
    }
}

/// Records how many wires its container's pads hold, per mode.
#[derive(Debug, Default)]
struct WireCounter(Rc<RefCell<Vec<(String, usize)>>>);

impl Converter for WireCounter {
    fn apply(&self, model: &mut Model, mode: ResolutionModes, container: PropertyId) -> topograph::Result<()> {
        let dst = model.child(container, "dst").ok_or(Error::NotAContainer(container))?;
        let wires = model
            .members(dst)
            .into_iter()
            .filter_map(|id| model.property(id))
            .map(|p| p.input_connections().len())
            .sum();
        self.0.borrow_mut().push((mode.to_string(), wires));
        Ok(())
    }
}

#[derive(Debug)]
struct Broken;

impl Converter for Broken {
    fn apply(&self, _model: &mut Model, _mode: ResolutionModes, container: PropertyId) -> topograph::Result<()> {
        Err(Error::NotAContainer(container))
    }
}

// ============================================================================
// 1. Phases
// ============================================================================

#[test]
fn test_distributed_pads_are_wired_before_converters_run() {
    let mut m = model();
    let root = m.root();
    let dst = m.add(root, PropertyDef::container("dst")).unwrap();
    let src = m.add(root, PropertyDef::container("src")).unwrap();
    for k in 0..3 {
        m.add(src, PropertyDef::output_pad(format!("out{k}"))).unwrap();
    }
    m.add(dst, PropertyDef::distributor("maker", Arc::new(PadMaker { count: 3 }))).unwrap();
    let to = Path::parse("./dst/in.", m.registry()).unwrap();
    let from = Path::parse("./src/out.", m.registry()).unwrap();
    m.add(root, PropertyDef::connector("wire", Connector::new(to, from, ConnectorPattern::OneToOne))).unwrap();
    let counter = WireCounter::default();
    let seen = Rc::clone(&counter.0);
    m.add(root, PropertyDef::converter("count", Arc::new(counter))).unwrap();

    m.configure().unwrap();
    assert_eq!(m.configure_phase(), ConfigurePhase::Configured);
    let seen = seen.borrow();
    assert_eq!(seen.len(), 2);
    assert!(seen.iter().all(|(_, wires)| *wires == 3));
}

#[test]
fn test_failing_converter_fails_configure() {
    let mut m = model();
    let root = m.root();
    m.add(root, PropertyDef::converter("broken", Arc::new(Broken))).unwrap();

    let err = m.configure().unwrap_err();
    assert!(matches!(err, Error::ConfigureFailed(n) if n > 0));
    assert_eq!(m.errors().exit_code, 1);
    assert!(matches!(m.configure(), Err(Error::ConfigureFailed(_))));
}

#[test]
fn test_connectors_in_non_composite_containers_are_skipped() {
    let mut m = model();
    let root = m.root();
    let sealed = m.add(root, PropertyDef::container("sealed").composite(false)).unwrap();
    let dst = m.add(sealed, PropertyDef::container("dst")).unwrap();
    let src = m.add(sealed, PropertyDef::container("src")).unwrap();
    let pad = m.add(dst, PropertyDef::input_pad("in0")).unwrap();
    m.add(src, PropertyDef::output_pad("out0")).unwrap();
    let to = Path::parse("./dst/in.", m.registry()).unwrap();
    let from = Path::parse("./src/out.", m.registry()).unwrap();
    m.add(sealed, PropertyDef::connector("wire", Connector::new(to, from, ConnectorPattern::OneToOne))).unwrap();

    m.configure().unwrap();
    assert!(m.property(pad).unwrap().input_connections().is_empty());
}

// ============================================================================
// 2. Emulation
// ============================================================================

#[derive(Debug)]
struct Ticker(Rc<RefCell<Vec<u64>>>);

impl Emulator for Ticker {
    fn update(&self, model: &mut Model, _container: PropertyId) -> topograph::Result<()> {
        self.0.borrow_mut().push(model.epoch_time());
        Ok(())
    }
}

#[test]
fn test_run_steps_emulated_containers() {
    let ticks = Rc::new(RefCell::new(Vec::new()));
    let mut m = model();
    let root = m.root();
    m.add(root, PropertyDef::container("sim").emulated(Arc::new(Ticker(Rc::clone(&ticks))))).unwrap();

    m.configure().unwrap();
    m.run(3).unwrap();
    assert_eq!(*ticks.borrow(), vec![1, 2, 3]);
}

#[test]
fn test_run_without_emulation_only_advances_time() {
    let ticks = Rc::new(RefCell::new(Vec::new()));
    let config = ModelConfig::from_json(r#"{"emulate_on_run": false, "echo_errors": false}"#).unwrap();
    let mut m = Model::with_config("m", Arc::new(Registry::standard()), config);
    let root = m.root();
    m.add(root, PropertyDef::container("sim").emulated(Arc::new(Ticker(Rc::clone(&ticks))))).unwrap();

    m.run(5).unwrap();
    assert_eq!(m.epoch_time(), 5);
    assert!(ticks.borrow().is_empty());
}

// ============================================================================
// 3. Error stack
// ============================================================================

#[test]
fn test_error_stack_keeps_newest_entries() {
    let config = ModelConfig::default().with_error_stack_depth(2).with_echo_errors(false);
    let mut m = Model::with_config("m", Arc::new(Registry::standard()), config);
    for k in 1..=3 {
        m.log_error(types::CONNECTOR, "Sample", k, &format!("entry {k}"));
    }
    assert_eq!(m.errors().count(), 2);
    assert_eq!(m.errors().dropped(), 1);
    let messages: Vec<_> = m.errors().entries().map(|e| e.message.clone()).collect();
    assert_eq!(messages, ["Connector.Sample.entry 2", "Connector.Sample.entry 3"]);
    let latest = m.errors().code_to_message(types::CONNECTOR.statement(3)).unwrap();
    assert_eq!(latest.message, "Connector.Sample.entry 3");
}

#[test]
fn test_config_rejects_bad_json() {
    assert!(matches!(ModelConfig::from_json("{not json"), Err(Error::Config(_))));
}
