use std::collections::HashSet;
use std::rc::{Rc, Weak};

use glam::Vec3;
use slotmap::SlotMap;

use crate::error::{Result, SceneError};
use crate::rendering::backend::RenderBackend;
use crate::scene_graph::connector::{Connector, ConnectorKey, Endpoint};
use crate::scene_graph::geometry::{Geometry, GeometryKey, TransformNode, TransformNodeKey};
use crate::scene_graph::ids::IdGenerator;
use crate::scene_graph::primitive::{
    PositionUpdate, Primitive, PrimitiveKey, PrimitiveKind, Shape, ShapeParams,
};

/// Registry of primitives and connectors, and the only place that mutates
/// them.
///
/// For every primitive `P` and connector `C`, `C` is in `P.connectors()`
/// exactly when `C.from()` or `C.to()` is `P`, and every bound end of a
/// connector sits at its primitive's position. Each public operation keeps
/// both properties and checks its inputs before touching any state.
pub struct Scene<B: RenderBackend> {
    pub(super) backend: B,
    pub(super) ids: IdGenerator,
    pub(super) primitives: SlotMap<PrimitiveKey, Primitive>,
    pub(super) connectors: SlotMap<ConnectorKey, Connector>,
    pub(super) geometries: SlotMap<GeometryKey, Geometry>,
    pub(super) transform_nodes: SlotMap<TransformNodeKey, TransformNode>,
    alive: Rc<()>,
}

impl<B: RenderBackend> Scene<B> {
    pub fn new(backend: B) -> Self {
        Self::with_ids(backend, IdGenerator::new())
    }

    pub fn with_ids(backend: B, ids: IdGenerator) -> Self {
        Self {
            backend,
            ids,
            primitives: SlotMap::with_key(),
            connectors: SlotMap::with_key(),
            geometries: SlotMap::with_key(),
            transform_nodes: SlotMap::with_key(),
            alive: Rc::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub(crate) fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Weak handle that stops upgrading once this scene is dropped.
    pub(crate) fn liveness(&self) -> Weak<()> {
        Rc::downgrade(&self.alive)
    }

    pub fn primitive(&self, key: PrimitiveKey) -> Option<&Primitive> {
        self.primitives.get(key)
    }

    pub fn connector(&self, key: ConnectorKey) -> Option<&Connector> {
        self.connectors.get(key)
    }

    pub fn primitive_by_id(&self, id: &str) -> Option<PrimitiveKey> {
        self.primitives
            .iter()
            .find(|(_, primitive)| primitive.id == id)
            .map(|(key, _)| key)
    }

    pub fn connector_by_id(&self, id: &str) -> Option<ConnectorKey> {
        self.connectors
            .iter()
            .find(|(_, connector)| connector.id == id)
            .map(|(key, _)| key)
    }

    pub fn primitives(&self) -> impl Iterator<Item = (PrimitiveKey, &Primitive)> {
        self.primitives.iter()
    }

    pub fn connectors(&self) -> impl Iterator<Item = (ConnectorKey, &Connector)> {
        self.connectors.iter()
    }

    pub fn primitive_count(&self) -> usize {
        self.primitives.len()
    }

    pub fn connector_count(&self) -> usize {
        self.connectors.len()
    }

    pub fn geometry(&self, key: GeometryKey) -> Option<&Geometry> {
        self.geometries.get(key)
    }

    pub fn geometry_count(&self) -> usize {
        self.geometries.len()
    }

    pub fn transform_nodes(&self) -> impl Iterator<Item = &TransformNode> {
        self.transform_nodes.values()
    }

    pub fn roots(&self) -> impl Iterator<Item = PrimitiveKey> + '_ {
        self.primitives
            .iter()
            .filter(|(_, primitive)| primitive.parent.is_none())
            .map(|(key, _)| key)
    }

    fn get_primitive(&self, key: PrimitiveKey) -> Result<&Primitive> {
        self.primitives
            .get(key)
            .ok_or_else(|| SceneError::primitive_not_found(key))
    }

    fn get_connector(&self, key: ConnectorKey) -> Result<&Connector> {
        self.connectors
            .get(key)
            .ok_or_else(|| SceneError::connector_not_found(key))
    }

    pub fn create_primitive(
        &mut self,
        kind: PrimitiveKind,
        params: &ShapeParams,
    ) -> Result<PrimitiveKey> {
        let shape = Shape::resolve(kind, params)?;
        let id = self.ids.next(kind.name());
        let drawable = self.backend.create_shape(&shape, params.position);

        let mut primitive = Primitive::new(id, kind, params.position);
        primitive.drawable = Some(drawable);
        let key = self.primitives.insert(primitive);

        log::debug!("Created {} {:?} at {}", kind, key, params.position);
        Ok(key)
    }

    pub fn move_by(&mut self, key: PrimitiveKey, delta: Vec3) -> Result<()> {
        let target = self.get_primitive(key)?.position + delta;
        self.set_position(key, target)
    }

    /// Moves to `target` exactly; missing components keep their current value.
    pub fn move_to(&mut self, key: PrimitiveKey, target: impl Into<PositionUpdate>) -> Result<()> {
        let target = target.into().resolve(self.get_primitive(key)?.position);
        self.set_position(key, target)
    }

    fn set_position(&mut self, key: PrimitiveKey, position: Vec3) -> Result<()> {
        let primitive = self
            .primitives
            .get_mut(key)
            .ok_or_else(|| SceneError::primitive_not_found(key))?;

        primitive.position = position;
        if let Some(drawable) = primitive.drawable {
            self.backend.place(drawable, position);
        }

        let attached = primitive.connectors.clone();
        for connector in attached {
            self.resync_connector(connector)?;
        }

        Ok(())
    }

    /// Pulls bound ends to their primitives and recreates the drawable.
    pub fn resync_connector(&mut self, key: ConnectorKey) -> Result<()> {
        let connector = self
            .connectors
            .get_mut(key)
            .ok_or_else(|| SceneError::connector_not_found(key))?;

        for endpoint in [Endpoint::From, Endpoint::To] {
            let bound = connector
                .binding(endpoint)
                .and_then(|primitive| self.primitives.get(primitive));

            if let Some(primitive) = bound {
                connector.set_point(endpoint, primitive.position);
            }
        }

        let fresh = self.backend.create_polyline(&connector.points);
        let stale = std::mem::replace(&mut connector.drawable, fresh);
        self.backend.release(stale);

        Ok(())
    }

    /// Creates a connector with both ends free.
    pub fn create_connector(&mut self, start: Vec3, end: Vec3) -> ConnectorKey {
        let id = self.ids.next("line");
        let drawable = self.backend.create_polyline(&[start, end]);
        let key = self.connectors.insert(Connector::new(id, start, end, drawable));

        log::debug!("Created connector {:?} from {} to {}", key, start, end);
        key
    }

    pub fn connect(
        &mut self,
        primitive: PrimitiveKey,
        connector: ConnectorKey,
        endpoint: Endpoint,
    ) -> Result<()> {
        let position = self.get_primitive(primitive)?.position;
        let previous = self.get_connector(connector)?.binding(endpoint);

        if let Some(old) = previous.filter(|&old| old != primitive) {
            let still_bound = self.connectors[connector].binding(endpoint.other()) == Some(old);
            if !still_bound {
                if let Some(old) = self.primitives.get_mut(old) {
                    old.detach(connector);
                }
            }
            log::debug!("Rebinding {:?} {:?} from {:?}", connector, endpoint, old);
        }

        let record = &mut self.connectors[connector];
        record.set_binding(endpoint, Some(primitive));
        record.set_point(endpoint, position);
        self.primitives[primitive].attach(connector);

        self.resync_connector(connector)
    }

    /// Clears the bindings of `connector` that point at `primitive`, leaving
    /// the affected ends frozen where they are. Returns whether anything
    /// changed.
    fn unbind(&mut self, primitive: PrimitiveKey, connector: ConnectorKey) -> bool {
        let Some(record) = self.connectors.get_mut(connector) else {
            return false;
        };
        let position = self.primitives.get(primitive).map(|p| p.position);

        let mut changed = false;
        for endpoint in [Endpoint::From, Endpoint::To] {
            if record.binding(endpoint) == Some(primitive) {
                record.set_binding(endpoint, None);
                if let Some(position) = position {
                    record.set_point(endpoint, position);
                }
                changed = true;
            }
        }

        if let Some(owner) = self.primitives.get_mut(primitive) {
            if owner.has_connector(connector) {
                owner.detach(connector);
                changed = true;
            }
        }

        changed
    }

    /// Detaches `connector` from `primitive`. Does nothing if the two are not
    /// bound.
    pub fn disconnect(&mut self, primitive: PrimitiveKey, connector: ConnectorKey) -> Result<()> {
        self.get_primitive(primitive)?;
        self.get_connector(connector)?;

        if !self.unbind(primitive, connector) {
            return Ok(());
        }

        log::debug!("Disconnected {:?} from {:?}", connector, primitive);
        self.resync_connector(connector)
    }

    pub fn disconnect_all(&mut self, primitive: PrimitiveKey) -> Result<()> {
        let attached = self.get_primitive(primitive)?.connectors.clone();
        for connector in attached {
            self.disconnect(primitive, connector)?;
        }
        Ok(())
    }

    /// Creates a connector running from `from` to `to`. Both may be the same
    /// primitive.
    pub fn add_connector(&mut self, from: PrimitiveKey, to: PrimitiveKey) -> Result<ConnectorKey> {
        let start = self.get_primitive(from)?.position;
        let end = self.get_primitive(to)?.position;

        let connector = self.create_connector(start, end);
        self.connect(from, connector, Endpoint::From)?;
        self.connect(to, connector, Endpoint::To)?;
        Ok(connector)
    }

    /// Unbinds each end from its own primitive, then disposes the connector.
    pub fn remove_connector(&mut self, connector: ConnectorKey) -> Result<()> {
        let record = self.get_connector(connector)?;
        let (from, to) = (record.from, record.to);

        if let Some(from) = from {
            self.unbind(from, connector);
        }
        if let Some(to) = to {
            self.unbind(to, connector);
        }

        if let Some(record) = self.connectors.remove(connector) {
            self.backend.release(record.drawable);
        }

        log::debug!("Removed connector {:?}", connector);
        Ok(())
    }

    pub fn remove_all_connectors_on(&mut self, primitive: PrimitiveKey) -> Result<()> {
        let attached = self.get_primitive(primitive)?.connectors.clone();
        for connector in attached {
            self.remove_connector(connector)?;
        }
        Ok(())
    }

    /// Removes `key` and everything parented under it. Attached connectors
    /// are detached and left in the scene.
    pub fn remove_primitive(&mut self, key: PrimitiveKey) -> Result<()> {
        self.get_primitive(key)?;

        for doomed in self.subtree_post_order(key) {
            self.disconnect_all(doomed)?;

            let Some(primitive) = self.primitives.remove(doomed) else {
                continue;
            };

            if let Some(parent) = primitive.parent.and_then(|p| self.primitives.get_mut(p)) {
                parent.children.retain(|&child| child != doomed);
            }
            if let Some(drawable) = primitive.drawable {
                self.backend.release(drawable);
            }
            if let Some(geometry) = primitive.geometry {
                self.release_geometry(geometry);
            }
            self.transform_nodes.retain(|_, node| node.owner != doomed);

            log::debug!("Removed {} {}", primitive.kind, primitive.id);
        }

        Ok(())
    }

    /// Frees a geometry once no primitive refers to it.
    fn release_geometry(&mut self, geometry: GeometryKey) {
        let in_use = self
            .primitives
            .values()
            .any(|primitive| primitive.geometry == Some(geometry));
        if !in_use {
            self.geometries.remove(geometry);
        }
    }

    fn subtree_post_order(&self, key: PrimitiveKey) -> Vec<PrimitiveKey> {
        let mut order = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = vec![(key, false)];

        while let Some((current, expanded)) = stack.pop() {
            if expanded {
                order.push(current);
                continue;
            }
            if !visited.insert(current) {
                continue;
            }

            stack.push((current, true));
            if let Some(primitive) = self.primitives.get(current) {
                for &child in &primitive.children {
                    stack.push((child, false));
                }
            }
        }

        order
    }

    /// Walks up to the parentless ancestor of `key`.
    pub fn root(&self, key: PrimitiveKey) -> Result<PrimitiveKey> {
        let mut visited = HashSet::new();
        let mut current = key;

        loop {
            let primitive = self.get_primitive(current)?;
            if !visited.insert(current) {
                return Err(SceneError::Cycle(primitive.id.clone()));
            }

            match primitive.parent {
                Some(parent) => current = parent,
                None => return Ok(current),
            }
        }
    }

    /// Sets the parent of a primitive and updates child relationships.
    ///
    /// Positions are not relative to the parent: moving a parent leaves its
    /// children where they are.
    pub fn set_parent(&mut self, child: PrimitiveKey, parent: Option<PrimitiveKey>) -> Result<()> {
        let child_id = self.get_primitive(child)?.id.clone();

        if let Some(parent) = parent {
            self.get_primitive(parent)?;
            if parent == child || self.is_ancestor(child, parent)? {
                return Err(SceneError::Cycle(child_id));
            }
        }

        let old_parent = self.primitives[child].parent;
        if let Some(old_parent) = old_parent {
            if let Some(old_parent) = self.primitives.get_mut(old_parent) {
                old_parent.children.retain(|&id| id != child);
            }
        }

        self.primitives[child].parent = parent;
        if let Some(parent) = parent {
            self.primitives[parent].children.push(child);
        }

        Ok(())
    }

    fn is_ancestor(&self, ancestor: PrimitiveKey, of: PrimitiveKey) -> Result<bool> {
        let mut visited = HashSet::new();
        let mut current = self.get_primitive(of)?.parent;

        while let Some(key) = current {
            if key == ancestor {
                return Ok(true);
            }
            if !visited.insert(key) {
                return Err(SceneError::Cycle(self.get_primitive(key)?.id.clone()));
            }
            current = self.get_primitive(key)?.parent;
        }

        Ok(false)
    }

    /// Drops every connector and primitive, releasing their drawables.
    pub fn clear(&mut self) {
        for (_, connector) in self.connectors.drain() {
            self.backend.release(connector.drawable);
        }
        for (_, primitive) in self.primitives.drain() {
            if let Some(drawable) = primitive.drawable {
                self.backend.release(drawable);
            }
        }
        self.geometries.clear();
        self.transform_nodes.clear();
    }
}
