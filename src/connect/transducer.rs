//! Transducers replace a direct wire between two pads.

use std::fmt;

use crate::graph::Model;
use crate::model::{PropertyId, ResolutionModes};
use crate::Result;

/// One To/From pairing a connector is about to wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PadLink {
    pub mode: ResolutionModes,
    /// Container the connector is applied in.
    pub container: PropertyId,
    pub connector: PropertyId,
    pub to_pad: PropertyId,
    pub from_pad: PropertyId,
}

/// Decides per pairing whether a transducer handles it.
pub trait TransducerFactory: fmt::Debug + Send + Sync {
    /// `None` leaves the pairing to a direct wire.
    fn create(&self, model: &Model, link: &PadLink) -> Option<Box<dyn Transducer>>;
}

pub trait Transducer: fmt::Debug {
    fn apply(&self, model: &mut Model, link: &PadLink) -> Result<()>;
}
