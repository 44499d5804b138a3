//! # Connectors
//!
//! A connector wires output pads to input pads. Its To path selects input
//! pads and its From path output pads; both are enumerated width-first
//! from the container the connector is applied in, filing matches into
//! group trees. Terminal groups of the two trees are then paired in order
//! and wired according to the connector's pattern:
//!
//! | Pattern | Wires per group pair (`m` To, `n` From) |
//! |---------|------------------------------------------|
//! | `OneToOne` | `min(m, n)`, zipped in order |
//! | `FanIn` | `m * n`, To outer |
//! | `FanOut` | `m * n`, From outer |
//! | `Star` | as `FanIn` |
//!
//! While the trees are built each side checks its groups against the
//! other side's (see [`GroupHandler`]), advancing the other enumerator
//! when the co-group is not finished yet.
//!
//! Logged statements: 1 pad mismatch, 2 incomplete group, 3 missing
//! co-group, 4 re-entrant enumeration.

pub mod group;
pub mod guard;
pub mod transducer;
pub mod translator;

pub use group::{GroupKey, GroupState};
pub use guard::ReentrancyGuard;
pub use transducer::{PadLink, Transducer, TransducerFactory};
pub use translator::{GenericTranslator, ReverseTranslator, Translator};

use std::cell::{Cell, RefCell};
use std::sync::Arc;

use hashbrown::HashMap;

use crate::catalog::types;
use crate::enumerate::GroupTreeEnumerator;
use crate::filter::FilterState;
use crate::graph::Model;
use crate::model::{InputConnection, PropertyId, PropertyKind, PropertyModes, ResolutionModes};
use crate::path::{GroupHandler, GroupVerdict, Path, PathEnumerator};
use crate::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectorPattern {
    #[default]
    OneToOne,
    FanIn,
    FanOut,
    Star,
}

/// One end of a connector: a path and the modes it is resolved in.
#[derive(Debug, Clone)]
pub struct Terminus {
    pub mode: ResolutionModes,
    pub path: Path,
}

impl Terminus {
    pub fn new(mode: ResolutionModes, path: Path) -> Self {
        Self { mode, path }
    }
}

#[derive(Debug, Clone)]
pub struct Connector {
    pub to: Terminus,
    pub from: Terminus,
    pub pattern: ConnectorPattern,
    pub translator: Option<Arc<dyn Translator>>,
    pub transducer: Option<Arc<dyn TransducerFactory>>,
    /// Modes this connector has already been applied in.
    resolved: ResolutionModes,
}

impl Connector {
    /// A connector resolved `Now` on both ends.
    pub fn new(to: Path, from: Path, pattern: ConnectorPattern) -> Self {
        Self::with_termini(Terminus::new(ResolutionModes::NOW, to), Terminus::new(ResolutionModes::NOW, from), pattern)
    }

    pub fn with_termini(to: Terminus, from: Terminus, pattern: ConnectorPattern) -> Self {
        Self { to, from, pattern, translator: None, transducer: None, resolved: ResolutionModes::NONE }
    }

    pub fn with_translator(mut self, translator: Arc<dyn Translator>) -> Self {
        self.translator = Some(translator);
        self
    }

    pub fn with_transducer(mut self, transducer: Arc<dyn TransducerFactory>) -> Self {
        self.transducer = Some(transducer);
        self
    }

    pub fn resolved(&self) -> ResolutionModes {
        self.resolved
    }

    /// Whether applying in `mode` would do anything.
    pub fn needs_resolving(&self, mode: ResolutionModes) -> bool {
        (self.to.mode.intersects(mode) || self.from.mode.intersects(mode)) && !self.resolved.contains(mode)
    }

    pub fn status_report(&self) -> String {
        let translator = self.translator.as_ref().map_or("None", |t| t.name());
        format!(
            "Connector(To={}, From={}, Pattern={:?}, Translator={translator})",
            self.to.path, self.from.path, self.pattern
        )
    }

    /// Apply the connector property `id` in `container`.
    ///
    /// Failures are logged on the model and also returned; the wires made
    /// before a failure stay.
    pub fn apply(model: &mut Model, id: PropertyId, mode: ResolutionModes, container: PropertyId) -> Result<()> {
        let connector = match model.get(id)?.kind() {
            PropertyKind::Connector(c) => c.as_ref().clone(),
            _ => return Err(Error::UnknownProperty(id)),
        };
        if !connector.needs_resolving(mode) {
            tracing::trace!(%id, %mode, "connector already resolved");
            return Ok(());
        }
        if let Some(PropertyKind::Connector(c)) = model.property_mut(id).map(|p| &mut p.kind) {
            c.resolved |= mode;
        }

        tracing::debug!(%id, %mode, connector = %connector.status_report(), "applying connector");
        model.push_current_connector(id);
        let run = ConnectorRun::new(&connector, id, mode, container);
        let result = run.resolve(model);
        model.pop_current_connector();
        result
    }
}

// ============================================================================
// One application
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Side {
    To,
    From,
}

impl Side {
    fn other(self) -> Side {
        match self {
            Side::To => Side::From,
            Side::From => Side::To,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Side::To => "To",
            Side::From => "From",
        }
    }
}

struct ConnectorRun<'c> {
    connector: &'c Connector,
    id: PropertyId,
    mode: ResolutionModes,
    container: PropertyId,
    to: ReentrancyGuard<PathEnumerator>,
    from: ReentrancyGuard<PathEnumerator>,
    to_root: Cell<Option<PropertyId>>,
    from_root: Cell<Option<PropertyId>>,
    /// Member count of each group at its last reopening.
    reopened: RefCell<HashMap<PropertyId, usize>>,
}

/// The [`GroupHandler`] one side's enumerator reports to.
struct SideHandler<'r, 'c> {
    run: &'r ConnectorRun<'c>,
    side: Side,
}

impl GroupHandler for SideHandler<'_, '_> {
    fn check_group(&self, model: &mut Model, group: PropertyId, filter: Option<&FilterState>) -> Result<GroupVerdict> {
        self.run.check_group(model, self.side, group, filter)
    }
}

impl<'c> ConnectorRun<'c> {
    fn new(connector: &'c Connector, id: PropertyId, mode: ResolutionModes, container: PropertyId) -> Self {
        let requester = Some(container);
        let to = PathEnumerator::new(connector.to.path.clone(), container, requester, PropertyModes::ALL_INPUT);
        let from = PathEnumerator::new(connector.from.path.clone(), container, requester, PropertyModes::ALL_OUTPUT);
        Self {
            connector,
            id,
            mode,
            container,
            to: ReentrancyGuard::new(to.width_first(true)),
            from: ReentrancyGuard::new(from.width_first(true)),
            to_root: Cell::new(None),
            from_root: Cell::new(None),
            reopened: RefCell::new(HashMap::new()),
        }
    }

    fn guard(&self, side: Side) -> &ReentrancyGuard<PathEnumerator> {
        match side {
            Side::To => &self.to,
            Side::From => &self.from,
        }
    }

    fn root_cell(&self, side: Side) -> &Cell<Option<PropertyId>> {
        match side {
            Side::To => &self.to_root,
            Side::From => &self.from_root,
        }
    }

    /// Build both group trees, then translate and wire, releasing the
    /// enumerators whatever happens.
    fn resolve(self, model: &mut Model) -> Result<()> {
        let built = self.drain(model, Side::To).and_then(|()| self.drain(model, Side::From));
        let result = built.and_then(|()| {
            let to_root = self.to_root.get();
            let from_root = self.from_root.get();
            self.apply_translators(model, to_root, from_root);
            self.connect_group_trees(model, to_root, from_root)
        });
        let ConnectorRun { to, from, .. } = self;
        to.into_inner().finish(model);
        from.into_inner().finish(model);
        result
    }

    fn drain(&self, model: &mut Model, side: Side) -> Result<()> {
        while self.invoke(model, side)?.is_some() {}
        Ok(())
    }

    /// Advance one side's enumerator.
    fn invoke(&self, model: &mut Model, side: Side) -> Result<Option<PropertyId>> {
        let Some(mut enumerator) = self.guard(side).lock() else {
            let text =
                format!("Re-entrant enumeration of the {}-path: {}", side.label(), self.connector.status_report());
            model.log_error(types::CONNECTOR, "InvokeEnumerator", 4, &text);
            return Err(Error::Reentrancy(side.label().to_string()));
        };
        let handler = SideHandler { run: self, side };
        let next = enumerator.move_next(model, Some(&handler));
        self.root_cell(side).set(enumerator.group_root());
        next
    }

    /// Root of `side`'s tree, advancing it until it has one.
    fn tree_root(&self, model: &mut Model, side: Side) -> Result<Option<PropertyId>> {
        while self.root_cell(side).get().is_none() {
            if self.invoke(model, side)?.is_none() {
                break;
            }
        }
        Ok(self.root_cell(side).get())
    }

    /// The co-group of `key` on `side`, advancing that side until the
    /// group exists and has been exhausted. Needing to advance a side that
    /// is mid-enumeration is a re-entrancy error.
    fn co_group(&self, model: &mut Model, side: Side, key: &[u32]) -> Result<Option<PropertyId>> {
        let Some(root) = self.tree_root(model, side)? else {
            return Ok(None);
        };
        loop {
            let found = group::find_group(model, root, key);
            let settled = found.and_then(|g| group::group_state(model, g)).is_some_and(|g| g.is_exhausted);
            if settled || self.invoke(model, side)?.is_none() {
                return Ok(found);
            }
        }
    }

    fn check_group(
        &self,
        model: &mut Model,
        side: Side,
        group: PropertyId,
        filter: Option<&FilterState>,
    ) -> Result<GroupVerdict> {
        if self.root_cell(side).get().is_none() {
            self.root_cell(side).set(Some(tree_root_of(model, group)));
        }
        let Some(state) = group::group_state(model, group).cloned() else {
            return Ok(GroupVerdict::Complete);
        };
        let count = model.member_count(group);

        match self.co_group(model, side.other(), &state.path_key)? {
            None => {
                let text = format!(
                    "Unable to fetch co-group for connector: {}, {}-path.",
                    self.connector.status_report(),
                    side.other().label()
                );
                model.log_error(types::CONNECTOR, "GetGroup", 3, &text);
            }
            Some(co) => {
                let co_count = model.member_count(co);
                if count < co_count {
                    let previous = self.reopened.borrow_mut().insert(group, count);
                    match previous {
                        None => return Ok(GroupVerdict::Reopen { remaining: Some(co_count - count) }),
                        Some(last) if state.is_unbounded && last < count => {
                            return Ok(GroupVerdict::Reopen { remaining: Some(co_count - count) });
                        }
                        Some(_) if state.is_unbounded => {
                            let text = format!(
                                "Unable to complete group for connector: {}, {}-path.",
                                self.connector.status_report(),
                                side.label()
                            );
                            model.log_error(types::CONNECTOR, "CheckComplete", 2, &text);
                            return Err(Error::IncompleteGroup(text));
                        }
                        Some(_) => {}
                    }
                }
            }
        }

        if let Some(filter) = filter {
            let mut members = model.members(group);
            filter.contents.order_group(model, &mut members);
            reorder(model, group, &members);
        }
        tracing::trace!(%group, side = side.label(), count, "group complete");
        Ok(GroupVerdict::Complete)
    }

    fn apply_translators(&self, model: &mut Model, to_root: Option<PropertyId>, from_root: Option<PropertyId>) {
        let Some(translator) = self.connector.translator.as_ref() else { return };
        for (to_group, from_group) in terminal_pairs(model, to_root, from_root) {
            let mut to = group::group_members(model, to_group);
            let mut from = group::group_members(model, from_group);
            translator.order_group(model, &mut to, &mut from);
            reorder(model, to_group, &to);
            reorder(model, from_group, &from);
        }
    }

    fn connect_group_trees(
        &self,
        model: &mut Model,
        to_root: Option<PropertyId>,
        from_root: Option<PropertyId>,
    ) -> Result<()> {
        for (to_group, from_group) in terminal_pairs(model, to_root, from_root) {
            let to: Vec<_> =
                group::group_members(model, to_group).into_iter().filter_map(|m| model.get_value(m)).collect();
            let from: Vec<_> =
                group::group_members(model, from_group).into_iter().filter_map(|m| model.get_value(m)).collect();
            match self.connector.pattern {
                ConnectorPattern::OneToOne => {
                    if to.len() != from.len() {
                        tracing::debug!(to = to.len(), from = from.len(), "one-to-one groups differ in size");
                    }
                    for (&t, &f) in to.iter().zip(&from) {
                        self.add_connection(model, "ConnectGroupsOneToOne", t, f)?;
                    }
                }
                ConnectorPattern::FanIn | ConnectorPattern::Star => {
                    for &t in &to {
                        for &f in &from {
                            self.add_connection(model, "ConnectGroupsFanIn", t, f)?;
                        }
                    }
                }
                ConnectorPattern::FanOut => {
                    for &f in &from {
                        for &t in &to {
                            self.add_connection(model, "ConnectGroupsFanOut", t, f)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }

    /// Wire one pairing. A pairing that is not input-to-output is logged
    /// and skipped.
    fn add_connection(&self, model: &mut Model, method: &str, to_pad: PropertyId, from_pad: PropertyId) -> Result<()> {
        let is_input = model.property(to_pad).is_some_and(|p| p.is_input_pad());
        let is_output = model.property(from_pad).is_some_and(|p| p.is_output_pad());
        if !(is_input && is_output) {
            let text = format!(
                "Path terminus not derived from Pad for connector: {}, To={}, From={}.",
                self.connector.status_report(),
                model.type_name(to_pad).unwrap_or_default(),
                model.type_name(from_pad).unwrap_or_default()
            );
            model.log_error(types::CONNECTOR, method, 1, &text);
            return Ok(());
        }

        let link = PadLink { mode: self.mode, container: self.container, connector: self.id, to_pad, from_pad };
        if let Some(transducer) = self.connector.transducer.as_ref().and_then(|f| f.create(model, &link)) {
            tracing::trace!(%to_pad, %from_pad, "pairing handed to transducer");
            return transducer.apply(model, &link);
        }
        if let Some(PropertyKind::InputPad(connections)) = model.property_mut(to_pad).map(|p| &mut p.kind) {
            connections.push(InputConnection { source: from_pad, connector: Some(self.id) });
        }
        tracing::trace!(%to_pad, %from_pad, "wired");
        Ok(())
    }
}

fn tree_root_of(model: &Model, group: PropertyId) -> PropertyId {
    let mut current = group;
    while let Some(parent) = model.property(current).and_then(|p| p.parent()) {
        current = parent;
    }
    current
}

/// Terminal groups of both trees, paired in order; the shorter tree ends
/// the pairing.
fn terminal_pairs(
    model: &Model,
    to_root: Option<PropertyId>,
    from_root: Option<PropertyId>,
) -> Vec<(PropertyId, PropertyId)> {
    let to = GroupTreeEnumerator::new(to_root, true).collect_all(model);
    let from = GroupTreeEnumerator::new(from_root, true).collect_all(model);
    if to.len() != from.len() {
        tracing::debug!(to = to.len(), from = from.len(), "terminal group counts differ");
    }
    to.into_iter().zip(from).collect()
}

fn reorder(model: &mut Model, group: PropertyId, members: &[PropertyId]) {
    if let Some(contents) = model.contents_mut(group) {
        contents.reorder(members);
    }
}
