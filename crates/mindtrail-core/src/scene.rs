//! Scene adapter: the live, hit-testable view of the diagram.
//!
//! The scene mirrors the document graph and additionally holds ephemeral
//! entities (drag previews) that never reach the document.

use crate::graph::{EdgeId, Graph, NodeId, Rgba};
use kurbo::{Line, Point, Rect, Size, Vec2};
use std::collections::HashMap;

/// Role of an interaction handle attached to a node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleRole {
    /// Drag from here to create a connected child node.
    Add,
    /// Click to pick the node color.
    Color,
}

/// A handle of a specific node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandleRef {
    pub node: NodeId,
    pub role: HandleRole,
}

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    None,
    Node(NodeId),
    Handle(HandleRef),
}

/// Non-owning reference to a scene entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityRef {
    Node(NodeId),
    Edge(EdgeId),
}

/// A node as shown in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneNode {
    pub id: NodeId,
    /// Top-left corner in world coordinates.
    pub position: Point,
    pub size: Size,
    pub color: Rgba,
    pub opacity: f64,
    pub visible: bool,
    pub handles_visible: bool,
    /// Ephemeral nodes are never hit-tested and never persisted.
    pub ephemeral: bool,
}

impl SceneNode {
    pub fn new(id: NodeId, position: Point, size: Size) -> Self {
        Self {
            id,
            position,
            size,
            color: Rgba::white(),
            opacity: 1.0,
            visible: true,
            handles_visible: true,
            ephemeral: false,
        }
    }

    /// A translucent node without handles, shown only during a gesture.
    pub fn preview(id: NodeId, position: Point, size: Size, opacity: f64) -> Self {
        Self {
            opacity,
            handles_visible: false,
            ephemeral: true,
            ..Self::new(id, position, size)
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position, self.size)
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// World position of one of this node's handles.
    pub fn handle_position(&self, role: HandleRole) -> Point {
        let bounds = self.bounds();
        match role {
            HandleRole::Add => Point::new(bounds.center().x, bounds.y1),
            HandleRole::Color => Point::new(bounds.x1, bounds.y0),
        }
    }
}

/// An edge as shown in the scene.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    /// Center-to-center segment, recomputed when an endpoint moves.
    pub line: Line,
    pub opacity: f64,
    pub visible: bool,
    pub ephemeral: bool,
}

impl SceneEdge {
    pub fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        Self {
            id,
            source,
            target,
            line: Line::new(Point::ZERO, Point::ZERO),
            opacity: 1.0,
            visible: true,
            ephemeral: false,
        }
    }

    pub fn preview(id: EdgeId, source: NodeId, target: NodeId, opacity: f64) -> Self {
        Self {
            opacity,
            ephemeral: true,
            ..Self::new(id, source, target)
        }
    }
}

/// Entity handed to [`SceneAdapter::add_entity`].
#[derive(Debug, Clone, PartialEq)]
pub enum SceneEntity {
    Node(SceneNode),
    Edge(SceneEdge),
}

/// Operations the interaction core performs on the scene.
pub trait SceneAdapter {
    /// Topmost node or handle under a world position.
    fn hit_test(&self, position: Point) -> HitTarget;

    /// Whether any persistent node is present.
    fn has_nodes(&self) -> bool;

    fn contains(&self, entity: EntityRef) -> bool;

    /// Top-left corner of a node, or the start of an edge.
    fn position(&self, entity: EntityRef) -> Option<Point>;

    fn handle_position(&self, handle: HandleRef) -> Option<Point>;

    fn add_entity(&mut self, entity: SceneEntity) -> EntityRef;

    /// Removing a node also removes the edges attached to it.
    fn remove_entity(&mut self, entity: EntityRef) -> bool;

    /// Moving a node also updates the geometry of its edges.
    fn set_position(&mut self, entity: EntityRef, position: Point);

    fn set_visible(&mut self, entity: EntityRef, visible: bool);

    fn set_opacity(&mut self, entity: EntityRef, opacity: f64);

    fn set_color(&mut self, entity: EntityRef, color: Rgba);

    fn set_handles_visible(&mut self, node: NodeId, visible: bool);

    /// Bring a node to the front of the draw order.
    fn raise(&mut self, node: NodeId);

    fn update_edge_geometry(&mut self, edge: EdgeId);

    /// Replace every persistent entity with the content of `graph`.
    fn load_graph(&mut self, graph: &Graph);
}

/// In-memory scene.
#[derive(Debug, Clone)]
pub struct Scene {
    nodes: HashMap<NodeId, SceneNode>,
    edges: HashMap<EdgeId, SceneEdge>,
    /// Node draw order (back to front).
    z_order: Vec<NodeId>,
    node_size: Size,
    handle_radius: f64,
}

impl Scene {
    pub fn new(node_size: Size, handle_radius: f64) -> Self {
        Self {
            nodes: HashMap::new(),
            edges: HashMap::new(),
            z_order: Vec::new(),
            node_size,
            handle_radius,
        }
    }

    pub fn from_config(config: &crate::config::EditorConfig) -> Self {
        Self::new(config.node_size(), config.handle_radius)
    }

    pub fn node(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    pub fn edge(&self, id: EdgeId) -> Option<&SceneEdge> {
        self.edges.get(&id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &SceneNode> {
        self.z_order.iter().filter_map(|id| self.nodes.get(id))
    }

    pub fn edges(&self) -> impl Iterator<Item = &SceneEdge> {
        self.edges.values()
    }

    pub fn z_order(&self) -> &[NodeId] {
        &self.z_order
    }

    /// Number of preview nodes and edges currently in the scene.
    pub fn ephemeral_count(&self) -> usize {
        self.nodes.values().filter(|n| n.ephemeral).count()
            + self.edges.values().filter(|e| e.ephemeral).count()
    }

    fn hit_handle(&self, handle: Point, point: Point) -> bool {
        let d: Vec2 = point - handle;
        d.hypot2() <= self.handle_radius * self.handle_radius
    }

    fn edge_line(&self, edge: &SceneEdge) -> Option<Line> {
        let source = self.nodes.get(&edge.source)?;
        let target = self.nodes.get(&edge.target)?;
        Some(Line::new(source.center(), target.center()))
    }

    fn refresh_edges_of(&mut self, node: NodeId) {
        let attached: Vec<EdgeId> = self
            .edges
            .values()
            .filter(|e| e.source == node || e.target == node)
            .map(|e| e.id)
            .collect();
        for id in attached {
            self.update_edge_geometry(id);
        }
    }
}

impl SceneAdapter for Scene {
    fn hit_test(&self, position: Point) -> HitTarget {
        // Front to back for selection priority
        for id in self.z_order.iter().rev() {
            let Some(node) = self.nodes.get(id) else {
                continue;
            };
            if node.ephemeral || !node.visible {
                continue;
            }
            if node.handles_visible {
                for role in [HandleRole::Add, HandleRole::Color] {
                    if self.hit_handle(node.handle_position(role), position) {
                        return HitTarget::Handle(HandleRef { node: *id, role });
                    }
                }
            }
            if node.bounds().contains(position) {
                return HitTarget::Node(*id);
            }
        }
        HitTarget::None
    }

    fn has_nodes(&self) -> bool {
        self.nodes.values().any(|n| !n.ephemeral)
    }

    fn contains(&self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Node(id) => self.nodes.contains_key(&id),
            EntityRef::Edge(id) => self.edges.contains_key(&id),
        }
    }

    fn position(&self, entity: EntityRef) -> Option<Point> {
        match entity {
            EntityRef::Node(id) => self.nodes.get(&id).map(|n| n.position),
            EntityRef::Edge(id) => self.edges.get(&id).map(|e| e.line.p0),
        }
    }

    fn handle_position(&self, handle: HandleRef) -> Option<Point> {
        self.nodes
            .get(&handle.node)
            .map(|n| n.handle_position(handle.role))
    }

    fn add_entity(&mut self, entity: SceneEntity) -> EntityRef {
        match entity {
            SceneEntity::Node(node) => {
                let id = node.id;
                self.nodes.insert(id, node);
                self.z_order.retain(|&z| z != id);
                self.z_order.push(id);
                EntityRef::Node(id)
            }
            SceneEntity::Edge(mut edge) => {
                let id = edge.id;
                if let Some(line) = self.edge_line(&edge) {
                    edge.line = line;
                }
                self.edges.insert(id, edge);
                EntityRef::Edge(id)
            }
        }
    }

    fn remove_entity(&mut self, entity: EntityRef) -> bool {
        match entity {
            EntityRef::Node(id) => {
                self.z_order.retain(|&z| z != id);
                self.edges.retain(|_, e| e.source != id && e.target != id);
                self.nodes.remove(&id).is_some()
            }
            EntityRef::Edge(id) => self.edges.remove(&id).is_some(),
        }
    }

    fn set_position(&mut self, entity: EntityRef, position: Point) {
        match entity {
            EntityRef::Node(id) => {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.position = position;
                    self.refresh_edges_of(id);
                }
            }
            EntityRef::Edge(_) => {
                log::debug!("Edge positions follow their nodes; ignoring set_position");
            }
        }
    }

    fn set_visible(&mut self, entity: EntityRef, visible: bool) {
        match entity {
            EntityRef::Node(id) => {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.visible = visible;
                }
            }
            EntityRef::Edge(id) => {
                if let Some(edge) = self.edges.get_mut(&id) {
                    edge.visible = visible;
                }
            }
        }
    }

    fn set_opacity(&mut self, entity: EntityRef, opacity: f64) {
        let opacity = opacity.clamp(0.0, 1.0);
        match entity {
            EntityRef::Node(id) => {
                if let Some(node) = self.nodes.get_mut(&id) {
                    node.opacity = opacity;
                }
            }
            EntityRef::Edge(id) => {
                if let Some(edge) = self.edges.get_mut(&id) {
                    edge.opacity = opacity;
                }
            }
        }
    }

    fn set_color(&mut self, entity: EntityRef, color: Rgba) {
        if let EntityRef::Node(id) = entity {
            if let Some(node) = self.nodes.get_mut(&id) {
                node.color = color;
            }
        }
    }

    fn set_handles_visible(&mut self, node: NodeId, visible: bool) {
        if let Some(node) = self.nodes.get_mut(&node) {
            node.handles_visible = visible;
        }
    }

    fn raise(&mut self, node: NodeId) {
        if self.nodes.contains_key(&node) {
            self.z_order.retain(|&z| z != node);
            self.z_order.push(node);
        }
    }

    fn update_edge_geometry(&mut self, edge: EdgeId) {
        let line = match self.edges.get(&edge) {
            Some(e) => self.edge_line(e),
            None => return,
        };
        if let (Some(line), Some(e)) = (line, self.edges.get_mut(&edge)) {
            e.line = line;
        }
    }

    fn load_graph(&mut self, graph: &Graph) {
        self.nodes.retain(|_, n| n.ephemeral);
        self.edges.retain(|_, e| e.ephemeral);
        let nodes = &self.nodes;
        self.z_order.retain(|id| nodes.contains_key(id));

        for node in &graph.nodes {
            let mut scene_node = SceneNode::new(node.id, node.position, self.node_size);
            scene_node.color = node.color;
            self.add_entity(SceneEntity::Node(scene_node));
        }
        for edge in &graph.edges {
            self.add_entity(SceneEntity::Edge(SceneEdge::new(
                edge.id,
                edge.source,
                edge.target,
            )));
        }
    }
}
