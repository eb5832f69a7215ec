//! Mind map graph: the persistent content of a document.

use kurbo::{Point, Rect, Size};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a node.
pub type NodeId = Uuid;

/// Unique identifier for an edge.
pub type EdgeId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for Rgba {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<Rgba> for Color {
    fn from(color: Rgba) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// A node of the mind map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    /// Top-left corner in world coordinates.
    pub position: Point,
    /// Fill color.
    pub color: Rgba,
    /// Label text.
    #[serde(default)]
    pub text: String,
    /// Label color, `None` for the default text color.
    #[serde(default)]
    pub text_color: Option<Rgba>,
}

impl Node {
    /// Create a new node at the given position.
    pub fn new(position: Point) -> Self {
        Self {
            id: Uuid::new_v4(),
            position,
            color: Rgba::white(),
            text: String::new(),
            text_color: None,
        }
    }
}

/// A directed parent-to-child connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
}

/// All nodes and edges of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Graph {
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
    pub background_color: Rgba,
}

impl Default for Graph {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            edges: Vec::new(),
            background_color: Rgba::white(),
        }
    }
}

impl Graph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node and return its ID.
    pub fn add_node(&mut self, node: Node) -> NodeId {
        let id = node.id;
        self.nodes.push(node);
        id
    }

    /// Connect two existing nodes.
    ///
    /// Returns `None` for unknown endpoints, self loops and duplicates.
    pub fn add_edge(&mut self, source: NodeId, target: NodeId) -> Option<EdgeId> {
        if source == target || !self.contains(source) || !self.contains(target) {
            return None;
        }
        if self
            .edges
            .iter()
            .any(|e| e.source == source && e.target == target)
        {
            return None;
        }
        let id = Uuid::new_v4();
        self.edges.push(Edge { id, source, target });
        Some(id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.iter().any(|n| n.id == id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.iter_mut().find(|n| n.id == id)
    }

    /// Edges leaving the given node.
    pub fn edges_from(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.source == id)
    }

    /// Edges arriving at the given node.
    pub fn edges_to(&self, id: NodeId) -> impl Iterator<Item = &Edge> {
        self.edges.iter().filter(move |e| e.target == id)
    }

    /// A node without children.
    pub fn is_leaf(&self, id: NodeId) -> bool {
        self.contains(id) && self.edges_from(id).next().is_none()
    }

    /// A node with exactly one parent and exactly one child.
    pub fn is_in_between(&self, id: NodeId) -> bool {
        self.edges_to(id).count() == 1 && self.edges_from(id).count() == 1
    }

    /// Remove a node and every edge touching it.
    ///
    /// An in-between node's parent is reconnected to its child so the
    /// branch stays attached.
    pub fn remove_node(&mut self, id: NodeId) -> Option<Node> {
        let index = self.nodes.iter().position(|n| n.id == id)?;
        let bridge = if self.is_in_between(id) {
            let parent = self.edges_to(id).next().map(|e| e.source);
            let child = self.edges_from(id).next().map(|e| e.target);
            parent.zip(child)
        } else {
            None
        };

        let node = self.nodes.remove(index);
        self.edges.retain(|e| e.source != id && e.target != id);

        if let Some((parent, child)) = bridge {
            self.add_edge(parent, child);
        }
        Some(node)
    }

    /// Bounding box of all node bodies.
    pub fn bounds(&self, node_size: Size) -> Option<Rect> {
        self.nodes
            .iter()
            .map(|n| Rect::from_origin_size(n.position, node_size))
            .reduce(|acc, r| acc.union(r))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
