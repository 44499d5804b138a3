//! # Model
//!
//! The arena that owns every property of one hierarchy, plus the
//! operations that read or reshape it: adding and removing members, proxy
//! resolution, scope checks, director routing and lazy filter refresh.
//!
//! The model is single-threaded. Enumerators hold no borrows between
//! steps; they take the model on every `move_next` call, so the hierarchy
//! may grow between steps (see [`ScopeEnumerator`](crate::enumerate::ScopeEnumerator)).

pub(crate) mod arena;
pub mod errors;
mod lifecycle;
mod scope;

pub use errors::{ErrorContext, ErrorMessage};
pub use lifecycle::{Converter, Distributor, Emulator};

use std::sync::Arc;

use smallvec::SmallVec;

use crate::catalog::{CatalogueCode, Registry, TypeCode, types};
use crate::config::ModelConfig;
use crate::model::{
    AliasTarget, ConfigurePhase, Container, Identifier, Property, PropertyDef, PropertyId,
    PropertyKind, PropertyModes, ResolutionModes, Scope,
};
use crate::path::{Path, PathEnumerator};
use crate::{Error, Result};

use arena::Arena;

/// Names a container is asked for when routed without an explicit director.
pub const INPUT_DIRECTOR: &str = "InputDirector";
pub const OUTPUT_DIRECTOR: &str = "OutputDirector";
pub const DEFAULT_DIRECTOR: &str = "DefaultDirector";
pub const INPUT_NAME: &str = "input";
pub const OUTPUT_NAME: &str = "output";
pub const DEFAULT_NAME: &str = "default";

/// Order stamps from the root down to a property.
pub type OrderId = SmallVec<[u32; 8]>;

pub struct Model {
    registry: Arc<Registry>,
    config: ModelConfig,
    arena: Arena,
    root: PropertyId,
    errors: ErrorContext,
    pub(crate) phase: ConfigurePhase,
    pub(crate) resolution_mode: ResolutionModes,
    pub(crate) listening: bool,
    connector_stack: Vec<PropertyId>,
    epoch_time: u64,
    generated: u64,
}

impl std::fmt::Debug for Model {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Model")
            .field("root", &self.root)
            .field("properties", &self.arena.live())
            .field("phase", &self.phase)
            .field("errors", &self.errors.count())
            .finish()
    }
}

// ============================================================================
// Construction and accessors
// ============================================================================

impl Model {
    pub fn new(name: &str, registry: Arc<Registry>) -> Self {
        Self::with_config(name, registry, ModelConfig::default())
    }

    pub fn with_config(name: &str, registry: Arc<Registry>, config: ModelConfig) -> Self {
        let mut arena = Arena::new();
        let root = arena.allocate(Property {
            identity: Identifier::new(name),
            type_code: types::MODEL,
            creator: None,
            parent: None,
            scope: Scope::Public,
            level: 0,
            order: 0,
            kind: PropertyKind::Container,
            contents: Some(Container::new(&[types::PROPERTY])),
        });
        let errors = ErrorContext::new(config.error_stack_depth).with_echo(config.echo_errors);
        tracing::debug!(model = name, "model created");
        Self {
            registry,
            config,
            arena,
            root,
            errors,
            phase: ConfigurePhase::Unconfigured,
            resolution_mode: ResolutionModes::NONE,
            listening: false,
            connector_stack: Vec::new(),
            epoch_time: 0,
            generated: 0,
        }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    pub fn root(&self) -> PropertyId {
        self.root
    }

    pub fn errors(&self) -> &ErrorContext {
        &self.errors
    }

    pub fn errors_mut(&mut self) -> &mut ErrorContext {
        &mut self.errors
    }

    pub fn epoch_time(&self) -> u64 {
        self.epoch_time
    }

    pub fn configure_phase(&self) -> ConfigurePhase {
        self.phase
    }

    /// Number of properties currently held by the arena.
    pub fn live_properties(&self) -> usize {
        self.arena.live()
    }

    pub fn property(&self, id: PropertyId) -> Option<&Property> {
        self.arena.get(id)
    }

    pub fn get(&self, id: PropertyId) -> Result<&Property> {
        self.arena.get(id).ok_or(Error::UnknownProperty(id))
    }

    pub(crate) fn property_mut(&mut self, id: PropertyId) -> Option<&mut Property> {
        self.arena.get_mut(id)
    }

    pub fn contents(&self, id: PropertyId) -> Option<&Container> {
        self.arena.get(id)?.contents.as_ref()
    }

    pub(crate) fn contents_mut(&mut self, id: PropertyId) -> Option<&mut Container> {
        self.arena.get_mut(id)?.contents.as_mut()
    }

    pub fn is_container(&self, id: PropertyId) -> bool {
        self.contents(id).is_some()
    }

    /// Class name of a property's type.
    pub fn type_name(&self, id: PropertyId) -> Option<String> {
        self.property(id).map(|p| self.registry.name_of(p.type_code))
    }

    /// A fresh identifier `prefix<N>`, unique within this model.
    pub fn generate_identifier(&mut self, prefix: &str) -> Identifier {
        self.generated += 1;
        Identifier::generate(prefix, self.generated)
    }

    /// Log an engine error under `type_code`'s class and statement `index`.
    pub fn log_error(&mut self, type_code: TypeCode, method: &str, index: u32, text: &str) -> CatalogueCode {
        let class = self.registry.name_of(type_code);
        self.errors.log(type_code.statement(index), &class, method, text)
    }

    pub fn status_report(&self) -> String {
        let name = self.property(self.root).map(|p| p.identity.status_report()).unwrap_or_default();
        format!("Model(Identity={name})")
    }

    /// `Type(Identity=name, Level=n, Members=m)` for one property.
    pub fn property_report(&self, id: PropertyId) -> String {
        let Some(p) = self.property(id) else {
            return format!("Null({id})");
        };
        let class = self.registry.name_of(p.type_code);
        match &p.contents {
            Some(c) => format!("{class}(Identity={}, Level={}, Members={})", p.identity, p.level, c.len()),
            None => format!("{class}(Identity={}, Level={})", p.identity, p.level),
        }
    }
}

// ============================================================================
// Membership
// ============================================================================

impl Model {
    /// Create a property from `def` inside `parent`.
    ///
    /// Rejected when `parent` declares no category the property's type
    /// derives from. A member with the same identity is replaced and freed
    /// together with the members it owns; its id must not be used again.
    pub fn add(&mut self, parent: PropertyId, def: PropertyDef) -> Result<PropertyId> {
        let type_code = def.type_code();
        if self.registry.get(type_code).is_none() {
            return Err(Error::UnknownType(type_code.to_string()));
        }
        let (parent_level, parent_name) = {
            let p = self.get(parent)?;
            (p.level, p.identity.status_report())
        };

        let registry = Arc::clone(&self.registry);
        let container = self.contents_mut(parent).ok_or(Error::NotAContainer(parent))?;
        let category = container.classify(type_code, &registry).ok_or_else(|| Error::CategoryRejected {
            container: parent_name,
            type_name: registry.name_of(type_code),
        })?;
        let previous = container.get(&def.identity);
        if let Some(old) = previous {
            tracing::debug!(%parent, %old, identity = %def.identity, "replacing member");
            self.detach(parent, old)?;
            self.release_owned_tree(old);
        }

        let identity = def.identity.clone();
        let id = self.arena.allocate(Property {
            identity: def.identity,
            type_code,
            creator: def.creator.or(Some(parent)),
            parent: Some(parent),
            scope: def.scope,
            level: parent_level + 1,
            order: 0,
            kind: def.kind,
            contents: def.contents,
        });
        let order = self
            .contents_mut(parent)
            .map(|c| c.insert(id, &identity, category))
            .ok_or(Error::NotAContainer(parent))?;
        if let Some(p) = self.property_mut(id) {
            p.order = order;
        }
        tracing::trace!(%parent, %id, %identity, order, "added property");

        if self.listening {
            self.added_property(parent, id);
        }
        Ok(id)
    }

    /// Add a member to a view without reparenting it.
    pub(crate) fn add_view_member(&mut self, view: PropertyId, member: PropertyId) {
        let Some(identity) = self.property(member).map(|p| p.identity.clone()) else {
            return;
        };
        if let Some(c) = self.contents_mut(view) {
            c.insert(member, &identity, types::PROPERTY);
        }
    }

    /// Allocate a property outside the hierarchy (filter views, groups).
    pub(crate) fn allocate_detached(&mut self, property: Property) -> PropertyId {
        self.arena.allocate(property)
    }

    /// Take `child` out of `parent`'s indexes. The property stays allocated
    /// but is detached from the hierarchy.
    pub fn remove(&mut self, parent: PropertyId, child: PropertyId) -> Result<()> {
        self.detach(parent, child)
    }

    fn detach(&mut self, parent: PropertyId, child: PropertyId) -> Result<()> {
        let (order, identity) = {
            let p = self.get(child)?;
            (p.order, p.identity.clone())
        };
        let container = self.contents_mut(parent).ok_or(Error::NotAContainer(parent))?;
        container.remove(order, &identity).ok_or(Error::NotAMember { container: parent, member: child })?;
        if let Some(p) = self.property_mut(child) {
            if p.parent == Some(parent) {
                p.parent = None;
            }
        }
        Ok(())
    }

    /// Free a temporary property and, for views, nothing else: members of a
    /// view are owned elsewhere.
    pub(crate) fn release(&mut self, id: PropertyId) {
        if self.arena.release(id).is_some() {
            tracing::trace!(%id, "released property");
        }
    }

    /// Free `id` and every property it owns below it.
    fn release_owned_tree(&mut self, id: PropertyId) {
        let mut pending = vec![id];
        while let Some(owner) = pending.pop() {
            if let Some(c) = self.contents(owner) {
                pending.extend(c.ids().filter(|&m| self.property(m).is_some_and(|p| p.parent == Some(owner))));
            }
            self.release(owner);
        }
    }

    /// Free a group tree rooted at `id`; group members that are not groups
    /// are left alone.
    pub(crate) fn release_group_tree(&mut self, id: PropertyId) {
        let mut pending = vec![id];
        while let Some(g) = pending.pop() {
            let Some(p) = self.property(g) else { continue };
            if !p.is_group() {
                continue;
            }
            if let Some(c) = &p.contents {
                pending.extend(c.ids().filter(|&m| self.property(m).is_some_and(Property::is_group)));
            }
            self.release(g);
        }
    }

    pub fn member_count(&self, container: PropertyId) -> usize {
        self.contents(container).map_or(0, Container::len)
    }

    pub fn member_at(&self, container: PropertyId, index: usize) -> Option<PropertyId> {
        self.contents(container)?.member_at(index)
    }

    /// Snapshot of a container's members in declaration order.
    pub fn members(&self, container: PropertyId) -> Vec<PropertyId> {
        self.contents(container).map(|c| c.ids().collect()).unwrap_or_default()
    }

    /// Exact-identity lookup, subject to the member's scope.
    pub fn get_property(
        &self,
        container: PropertyId,
        identifier: &Identifier,
        requester: Option<PropertyId>,
    ) -> Option<PropertyId> {
        let id = self.contents(container)?.get(identifier)?;
        self.in_scope(id, requester).then_some(id)
    }

    /// Lookup by a plain name.
    pub fn child(&self, container: PropertyId, name: &str) -> Option<PropertyId> {
        self.contents(container)?.get(&Identifier::new(name))
    }

    pub fn get_category(&self, container: PropertyId, category: TypeCode) -> Option<&[PropertyId]> {
        self.contents(container)?.category(category)
    }

    /// Recompute a lazily filled container if it is marked for refresh.
    /// Must be called before reading a container that may be a filter.
    pub fn access_contents(&mut self, container: PropertyId) -> Result<()> {
        let needs_refresh = self.contents(container).is_some_and(|c| c.refresh);
        if needs_refresh {
            self.refresh_contents(container)?;
            if let Some(c) = self.contents_mut(container) {
                c.refresh = false;
            }
        }
        Ok(())
    }

    fn refresh_contents(&mut self, container: PropertyId) -> Result<()> {
        let state = match self.property(container).map(|p| &p.kind) {
            Some(PropertyKind::Filter(state)) => state.clone(),
            _ => return Ok(()),
        };
        let members = state.contents.collect(self, &state.context);
        if let Some(c) = self.contents_mut(container) {
            c.clear();
        }
        for m in members {
            self.add_view_member(container, m);
        }
        Ok(())
    }
}

// ============================================================================
// Proxies, ordering and routing
// ============================================================================

impl Model {
    /// The property a handle stands for: proxies are followed, anything
    /// else is returned as is. `None` for dangling or cyclic proxies.
    pub fn get_value(&self, id: PropertyId) -> Option<PropertyId> {
        let mut current = id;
        for _ in 0..=self.config.max_proxy_depth {
            let p = self.property(current)?;
            current = match &p.kind {
                PropertyKind::Alias(AliasTarget::Property(target)) => *target,
                PropertyKind::Alias(AliasTarget::Path(path)) => self.resolve_proxy_path(p, path)?,
                PropertyKind::Link { path, resolved } => (*resolved.get_or_init(|| self.resolve_proxy_path(p, path)))?,
                PropertyKind::Group(g) => g.proxied?,
                _ => return Some(current),
            };
        }
        tracing::debug!(%id, "proxy chain too deep");
        None
    }

    fn resolve_proxy_path(&self, proxy: &Property, path: &Path) -> Option<PropertyId> {
        let start = proxy.parent?;
        path.get_property(self, start, proxy.creator, PropertyModes::NONE)
    }

    /// Whether `id` (through proxies) is a container.
    pub fn value_is_container(&self, id: PropertyId) -> bool {
        self.get_value(id).is_some_and(|v| self.is_container(v))
    }

    /// Order stamps from the root's child down to `id`.
    pub fn get_order_id(&self, id: PropertyId) -> OrderId {
        let mut chain = OrderId::new();
        let mut current = self.property(id);
        while let Some(p) = current {
            let Some(parent) = p.parent else { break };
            chain.push(p.order);
            current = self.property(parent);
        }
        chain.reverse();
        chain
    }

    pub fn property_by_order_id(&self, container: PropertyId, order_id: &[u32]) -> Option<PropertyId> {
        let mut current = container;
        for &order in order_id {
            let c = self.contents(self.get_value(current)?)?;
            current = c.by_order(order)?;
        }
        Some(current)
    }

    /// Identities from the root's child down to `id`.
    pub fn identity_chain(&self, id: PropertyId) -> Vec<Identifier> {
        let mut chain = Vec::new();
        let mut current = self.property(id);
        while let Some(p) = current {
            let Some(parent) = p.parent else { break };
            chain.push(p.identity.clone());
            current = self.property(parent);
        }
        chain.reverse();
        chain
    }

    /// Absolute path literal of a property, e.g. `/tmp/a2/b21`.
    pub fn path_of(&self, id: PropertyId) -> String {
        let chain = self.identity_chain(id);
        if chain.is_empty() {
            return "/".to_string();
        }
        chain.iter().map(|i| format!("/{i}")).collect()
    }

    /// Route through `container`'s director.
    ///
    /// Without an explicit name the director is picked from the mode
    /// (`InputDirector`/`OutputDirector`/`DefaultDirector`); when no
    /// director routes, a plain member named `input`/`output`/`default` is
    /// used. Containers found this way are routed recursively.
    pub fn direct_to_property(
        &self,
        container: PropertyId,
        name: Option<&Identifier>,
        requester: Option<PropertyId>,
        mode: PropertyModes,
    ) -> Option<PropertyId> {
        let mut current = container;
        for _ in 0..=self.config.max_proxy_depth {
            let director_name = match name.and_then(Identifier::name) {
                Some(n) if !n.is_empty() => n,
                _ if mode.intersects(PropertyModes::IS_IO) => {
                    if mode.intersects(PropertyModes::INPUT) {
                        INPUT_DIRECTOR
                    } else {
                        OUTPUT_DIRECTOR
                    }
                }
                _ => DEFAULT_DIRECTOR,
            };
            let routed = self
                .get_property(current, &Identifier::new(director_name), requester)
                .and_then(|d| match self.property(d).map(|p| &p.kind) {
                    Some(PropertyKind::Director(target)) => Some(*target),
                    _ => None,
                });
            let found = routed.or_else(|| {
                let fallback = if mode.intersects(PropertyModes::IS_IO) {
                    if mode.intersects(PropertyModes::INPUT) { INPUT_NAME } else { OUTPUT_NAME }
                } else {
                    DEFAULT_NAME
                };
                self.get_property(current, &Identifier::new(fallback), requester)
            })?;
            match self.get_value(found) {
                Some(v) if self.is_container(v) && v != current => current = v,
                _ => return Some(found),
            }
        }
        None
    }

    /// Find `identifier` in `container` or, searching up, its ancestors;
    /// searching down, in nested containers depth-first.
    pub fn find_property(
        &self,
        container: PropertyId,
        identifier: &Identifier,
        requester: Option<PropertyId>,
        search_up: bool,
    ) -> Option<PropertyId> {
        if search_up {
            let mut current = Some(container);
            while let Some(c) = current {
                if let Some(found) = self.get_property(c, identifier, requester) {
                    return Some(found);
                }
                current = self.property(c)?.parent;
            }
            return None;
        }
        if let Some(found) = self.get_property(container, identifier, requester) {
            return Some(found);
        }
        self.members(container).into_iter().find_map(|m| {
            let v = self.get_value(m)?;
            if v == m && self.is_container(v) {
                self.find_property(v, identifier, requester, false)
            } else {
                None
            }
        })
    }

    // ------------------------------------------------------------------------
    // Current connector stack
    // ------------------------------------------------------------------------

    pub fn push_current_connector(&mut self, connector: PropertyId) {
        self.connector_stack.push(connector);
    }

    pub fn pop_current_connector(&mut self) -> Option<PropertyId> {
        let popped = self.connector_stack.pop();
        if popped.is_none() {
            tracing::debug!("pop_current_connector on an empty stack");
        }
        popped
    }

    pub fn current_connector(&self) -> Option<PropertyId> {
        self.connector_stack.last().copied()
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Every property `path` matches, starting at `start`.
    pub fn query(
        &mut self,
        path: &Path,
        start: PropertyId,
        requester: Option<PropertyId>,
        mode: PropertyModes,
    ) -> Vec<PropertyId> {
        let mut enumerator = PathEnumerator::new(path.clone(), start, requester, mode)
            .width_first(self.config.width_first_queries);
        let mut results = Vec::new();
        loop {
            match enumerator.move_next(self, None) {
                Ok(Some(id)) => results.push(id),
                Ok(None) => break,
                Err(e) => {
                    tracing::debug!(error = %e, "query stopped");
                    break;
                }
            }
        }
        enumerator.finish(self);
        results
    }

    /// Names of the properties `path` matches, for quick inspection.
    pub fn query_names(&mut self, path: &Path, start: PropertyId) -> Vec<String> {
        self.query(path, start, None, PropertyModes::TRAVERSING)
            .into_iter()
            .filter_map(|id| self.property(id).map(|p| p.identity.status_report()))
            .collect()
    }
}
