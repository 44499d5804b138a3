//! Configure phases and emulation.
//!
//! `configure()` walks the hierarchy once per phase, children before
//! parents, applying distributors, connectors and converters in
//! declaration order. Properties added while a phase is running are
//! reported back through [`Model::added_property`] so operators inserted
//! mid-walk still run exactly once.

use std::fmt;
use std::sync::Arc;

use super::Model;
use crate::catalog::TypeCode;
use crate::connect::Connector;
use crate::model::{ClassKind, ConfigurePhase, PropertyId, PropertyKind, ResolutionModes};
use crate::{Error, Result};

/// Adds structure to a container during the `DistributorsNow` phase (or
/// later, when inserted mid-walk).
pub trait Distributor: fmt::Debug {
    fn apply(&self, model: &mut Model, mode: ResolutionModes, container: PropertyId) -> Result<()>;
}

/// Transforms a container once its connectors have been resolved.
pub trait Converter: fmt::Debug {
    fn apply(&self, model: &mut Model, mode: ResolutionModes, container: PropertyId) -> Result<()>;
}

/// Per-epoch behaviour of a container flagged `do_emulate`.
pub trait Emulator: fmt::Debug {
    fn update(&self, model: &mut Model, container: PropertyId) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Operators {
    Distributors,
    Connectors,
    Converters,
    DistributorsAndConnectors,
    All,
}

impl Operators {
    fn accepts(self, kind: ClassKind) -> bool {
        match self {
            Operators::Distributors => kind == ClassKind::Distributor,
            Operators::Connectors => kind == ClassKind::Connector,
            Operators::Converters => kind == ClassKind::Converter,
            Operators::DistributorsAndConnectors => matches!(kind, ClassKind::Distributor | ClassKind::Connector),
            Operators::All => matches!(kind, ClassKind::Distributor | ClassKind::Connector | ClassKind::Converter),
        }
    }

    /// Phase-wise walks descend before applying; mixed walks apply in a
    /// single declaration-order pass.
    fn single_pass(self) -> bool {
        matches!(self, Operators::DistributorsAndConnectors | Operators::All)
    }
}

impl Model {
    /// Run every configure phase over the whole model.
    ///
    /// Refuses to start when errors are already logged. Individual operator
    /// failures are logged and do not stop the walk; the call fails at the
    /// end if anything was logged.
    pub fn configure(&mut self) -> Result<()> {
        if !self.errors().is_empty() {
            return Err(Error::ConfigureFailed(self.errors().count()));
        }
        let root = self.root();
        self.listening = true;

        let phases = [
            (ConfigurePhase::DistributorsNow, ResolutionModes::NOW, Operators::Distributors),
            (ConfigurePhase::ConnectorsNow, ResolutionModes::NOW, Operators::Connectors),
            (ConfigurePhase::ConvertersNow, ResolutionModes::NOW, Operators::Converters),
            (ConfigurePhase::ConnectorsFinal, ResolutionModes::FINAL, Operators::Connectors),
            (ConfigurePhase::ConvertersFinal, ResolutionModes::FINAL, Operators::Converters),
        ];
        for (phase, mode, operators) in phases {
            tracing::debug!(?phase, %mode, "configure phase");
            self.phase = phase;
            self.resolution_mode = mode;
            self.apply_operators(root, operators);
        }

        self.listening = false;
        self.phase = ConfigurePhase::Configured;
        let errors = self.errors().count();
        tracing::info!(errors, "configure finished");
        if errors > 0 {
            self.errors_mut().exit_code = 1;
            return Err(Error::ConfigureFailed(errors));
        }
        Ok(())
    }

    /// Advance the model `epochs` times, updating every emulated container.
    pub fn run(&mut self, epochs: u64) -> Result<()> {
        if !self.config().emulate_on_run {
            self.epoch_time += epochs;
            return Ok(());
        }
        for _ in 0..epochs {
            self.epoch_time += 1;
            let root = self.root();
            self.update_emulated(root)?;
        }
        Ok(())
    }

    fn update_emulated(&mut self, container: PropertyId) -> Result<()> {
        let mut index = 0;
        while let Some(member) = self.member_at(container, index) {
            index += 1;
            let Some(value) = self.get_value(member) else { continue };
            let Some(contents) = self.contents(value) else { continue };
            let emulator = contents.emulator.clone().filter(|_| contents.do_emulate);
            let descend = contents.is_composite;
            if let Some(emulator) = emulator {
                emulator.update(self, value)?;
            }
            if descend && value == member {
                self.update_emulated(value)?;
            }
        }
        Ok(())
    }

    fn apply_operators(&mut self, container: PropertyId, operators: Operators) {
        if operators.single_pass() {
            self.apply_in_order(container, operators);
        } else {
            let mut index = 0;
            while let Some(member) = self.member_at(container, index) {
                index += 1;
                if let Some(child) = self.composite_child(member) {
                    self.apply_operators(child, operators);
                }
            }
            let mut index = 0;
            while let Some(member) = self.member_at(container, index) {
                index += 1;
                if self.property(member).is_some_and(|p| operators.accepts(p.class_kind())) {
                    self.apply_operator(member, container);
                }
            }
        }
        let phase = self.phase;
        if let Some(c) = self.contents_mut(container) {
            c.configure_phase = phase;
        }
    }

    fn apply_in_order(&mut self, container: PropertyId, operators: Operators) {
        let mut index = 0;
        while let Some(member) = self.member_at(container, index) {
            index += 1;
            let kind = self.property(member).map(|p| p.class_kind());
            if kind.is_some_and(|k| operators.accepts(k)) {
                self.apply_operator(member, container);
            } else if let Some(child) = self.composite_child(member) {
                self.apply_in_order(child, operators);
            }
        }
    }

    /// The member itself when it is a composite container owned here.
    fn composite_child(&self, member: PropertyId) -> Option<PropertyId> {
        let value = self.get_value(member)?;
        let contents = self.contents(value)?;
        (contents.is_composite && contents.is_owning()).then_some(value)
    }

    fn apply_operator(&mut self, operator: PropertyId, container: PropertyId) {
        let mode = self.resolution_mode;
        let Some(p) = self.property(operator) else { return };
        let type_code = p.type_code;
        let result = match &p.kind {
            PropertyKind::Distributor(d) => {
                let d = Arc::clone(d);
                d.apply(self, mode, container)
            }
            PropertyKind::Converter(c) => {
                let c = Arc::clone(c);
                c.apply(self, mode, container)
            }
            PropertyKind::Connector(_) => {
                // Connectors log their own failures.
                if let Err(e) = Connector::apply(self, operator, mode, container) {
                    tracing::debug!(%operator, error = %e, "connector aborted");
                }
                Ok(())
            }
            _ => Ok(()),
        };
        if let Err(e) = result {
            self.report_operator_failure(type_code, &e);
        }
    }

    fn report_operator_failure(&mut self, type_code: TypeCode, error: &Error) {
        self.log_error(type_code, "apply", 1, &error.to_string());
    }

    /// Listener hook: `child` was just added to `parent` while configuring.
    pub(crate) fn added_property(&mut self, parent: PropertyId, child: PropertyId) {
        let Some(value) = self.get_value(child) else { return };
        let Some(parent_phase) = self.contents(parent).map(|c| c.configure_phase) else { return };
        let kind = self.property(value).map(|p| p.class_kind());
        let phase = self.phase;

        match phase {
            ConfigurePhase::DistributorsNow => {
                if parent_phase < phase {
                    return;
                }
                if kind == Some(ClassKind::Distributor) {
                    self.apply_operator(value, parent);
                } else if let Some(c) = self.composite_child(value) {
                    self.apply_operators(c, Operators::Distributors);
                }
            }
            ConfigurePhase::ConnectorsNow
            | ConfigurePhase::ConnectorsFinal
            | ConfigurePhase::ConvertersNow
            | ConfigurePhase::ConvertersFinal => {
                if parent_phase == ConfigurePhase::Unconfigured {
                    return;
                }
                if kind == Some(ClassKind::Distributor) {
                    self.apply_operator(value, parent);
                    return;
                }
                let saved = self.resolution_mode;
                if parent_phase < phase {
                    if saved == ResolutionModes::NOW {
                        return;
                    }
                    self.resolution_mode = ResolutionModes::NOW;
                }
                let converters = matches!(phase, ConfigurePhase::ConvertersNow | ConfigurePhase::ConvertersFinal);
                match kind {
                    Some(ClassKind::Connector) => self.apply_operator(value, parent),
                    Some(ClassKind::Converter) if converters => self.apply_operator(value, parent),
                    _ => {
                        if let Some(c) = self.composite_child(value) {
                            let operators =
                                if converters { Operators::All } else { Operators::DistributorsAndConnectors };
                            self.apply_operators(c, operators);
                        }
                    }
                }
                self.resolution_mode = saved;
            }
            ConfigurePhase::Unconfigured | ConfigurePhase::Configured => {}
        }
    }
}
