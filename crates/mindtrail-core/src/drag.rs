//! Pointer drag gestures: scrolling, moving nodes, creating child nodes.
//!
//! A gesture starts on a primary press, is updated by pointer moves and
//! ends on release or cancellation. Only one gesture can be active.

use crate::config::EditorConfig;
use crate::error::Fault;
use crate::graph::{EdgeId, NodeId};
use crate::input::MouseButton;
use crate::scene::{
    EntityRef, HandleRef, HandleRole, HitTarget, SceneAdapter, SceneEdge, SceneEntity, SceneNode,
};
use kurbo::{Point, Size, Vec2};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of the active gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DragAction {
    #[default]
    Idle,
    Scroll,
    MoveNode,
    CreateNode,
}

/// Cursor change requested from the UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CursorRequest {
    ClosedHand,
    /// Back to the platform default.
    Restore,
}

/// Work the controller hands back to its owner.
#[derive(Debug, Clone, PartialEq)]
pub enum DragRequest {
    SaveUndoPoint,
    SelectNode(NodeId),
    OpenNodeContextMenu { node: NodeId, position: Point },
    OpenBackgroundContextMenu { position: Point },
    /// Let the user pick a color for the node.
    SetNodeColor(NodeId),
    SetPanning(bool),
    /// Write the final position of a moved node to the document.
    CommitNodePosition { node: NodeId, position: Point },
    CreateChildNode { parent: NodeId, position: Point },
}

/// Outcome of one pointer event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DragResponse {
    pub cursor: Option<CursorRequest>,
    pub requests: Vec<DragRequest>,
}

impl DragResponse {
    fn with_requests(requests: Vec<DragRequest>) -> Self {
        Self {
            cursor: None,
            requests,
        }
    }

    fn restore(requests: Vec<DragRequest>) -> Self {
        Self {
            cursor: Some(CursorRequest::Restore),
            requests,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.is_none() && self.requests.is_empty()
    }
}

/// Translucent node following the pointer during node creation.
///
/// Owned by the session and consumed when the gesture ends.
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewNode {
    id: NodeId,
}

/// Edge from the source node to the [`PreviewNode`].
#[derive(Debug, PartialEq, Eq)]
pub struct PreviewEdge {
    id: EdgeId,
}

impl PreviewNode {
    pub fn id(&self) -> NodeId {
        self.id
    }
}

impl PreviewEdge {
    pub fn id(&self) -> EdgeId {
        self.id
    }
}

/// Preview node and edge always exist together.
#[derive(Debug, PartialEq, Eq)]
pub struct Preview {
    node: PreviewNode,
    edge: PreviewEdge,
}

impl Preview {
    fn spawn<S: SceneAdapter>(
        scene: &mut S,
        source: NodeId,
        position: Point,
        size: Size,
        opacity: f64,
    ) -> Self {
        let node = PreviewNode { id: Uuid::new_v4() };
        let edge = PreviewEdge { id: Uuid::new_v4() };
        let preview_node = SceneNode::preview(node.id, position, size, opacity);
        let preview_edge = SceneEdge::preview(edge.id, source, node.id, opacity);
        scene.add_entity(SceneEntity::Node(preview_node));
        scene.add_entity(SceneEntity::Edge(preview_edge));
        log::trace!("Drag preview {} spawned from {}", node.id, source);
        Self { node, edge }
    }

    fn follow<S: SceneAdapter>(&self, scene: &mut S, position: Point) {
        scene.set_position(EntityRef::Node(self.node.id), position);
        scene.update_edge_geometry(self.edge.id);
    }

    fn release<S: SceneAdapter>(self, scene: &mut S) {
        scene.remove_entity(EntityRef::Edge(self.edge.id));
        scene.remove_entity(EntityRef::Node(self.node.id));
        log::trace!("Drag preview {} released", self.node.id);
    }
}

/// State of the current gesture.
///
/// Fields exist only for the gestures that use them, so an idle session
/// carries no source, offset or preview.
#[derive(Debug, Default, PartialEq)]
pub enum DragSession {
    #[default]
    Idle,
    Scroll,
    MoveNode {
        node: NodeId,
        /// Pointer position minus node position at press time.
        offset: Vec2,
        pointer: Point,
    },
    CreateNode {
        source: NodeId,
        /// Pointer position minus handle position at press time.
        offset: Vec2,
        pointer: Point,
        /// Spawned on the first pointer move.
        preview: Option<Preview>,
    },
}

impl DragSession {
    pub fn action(&self) -> DragAction {
        match self {
            DragSession::Idle => DragAction::Idle,
            DragSession::Scroll => DragAction::Scroll,
            DragSession::MoveNode { .. } => DragAction::MoveNode,
            DragSession::CreateNode { .. } => DragAction::CreateNode,
        }
    }

    pub fn is_active(&self) -> bool {
        !matches!(self, DragSession::Idle)
    }

    /// Node the gesture started on.
    pub fn source_entity(&self) -> Option<NodeId> {
        match self {
            DragSession::MoveNode { node, .. } => Some(*node),
            DragSession::CreateNode { source, .. } => Some(*source),
            _ => None,
        }
    }

    pub fn source_offset(&self) -> Vec2 {
        match self {
            DragSession::MoveNode { offset, .. } | DragSession::CreateNode { offset, .. } => {
                *offset
            }
            _ => Vec2::ZERO,
        }
    }

    pub fn preview_node(&self) -> Option<NodeId> {
        match self {
            DragSession::CreateNode { preview: Some(p), .. } => Some(p.node.id()),
            _ => None,
        }
    }

    pub fn preview_edge(&self) -> Option<EdgeId> {
        match self {
            DragSession::CreateNode { preview: Some(p), .. } => Some(p.edge.id()),
            _ => None,
        }
    }
}

/// Turns pointer events into scene updates and [`DragRequest`]s.
#[derive(Debug)]
pub struct DragController {
    session: DragSession,
    node_size: Size,
    preview_opacity: f64,
}

impl Default for DragController {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl DragController {
    pub fn new(config: &EditorConfig) -> Self {
        Self {
            session: DragSession::Idle,
            node_size: config.node_size(),
            preview_opacity: config.preview_opacity.clamp(0.0, 1.0),
        }
    }

    pub fn session(&self) -> &DragSession {
        &self.session
    }

    pub fn action(&self) -> DragAction {
        self.session.action()
    }

    pub fn is_active(&self) -> bool {
        self.session.is_active()
    }

    /// Handle a button press at `position` over `hit`.
    pub fn on_pointer_down<S: SceneAdapter>(
        &mut self,
        button: MouseButton,
        position: Point,
        hit: HitTarget,
        scene: &mut S,
    ) -> DragResponse {
        if self.session.is_active() {
            self.ignore("down");
            return DragResponse::default();
        }

        match (button, hit) {
            (MouseButton::Right, HitTarget::Node(node)) => DragResponse::with_requests(vec![
                DragRequest::SelectNode(node),
                DragRequest::OpenNodeContextMenu { node, position },
            ]),
            (MouseButton::Right, HitTarget::None) => {
                let request = DragRequest::OpenBackgroundContextMenu { position };
                DragResponse::with_requests(vec![request])
            }
            (MouseButton::Left, HitTarget::None) => {
                if !scene.has_nodes() {
                    return DragResponse::default();
                }
                self.session = DragSession::Scroll;
                log::debug!("Drag started: {:?}", DragAction::Scroll);
                DragResponse::with_requests(vec![DragRequest::SetPanning(true)])
            }
            (MouseButton::Left, HitTarget::Node(node)) => {
                let Some(node_position) = scene.position(EntityRef::Node(node)) else {
                    return DragResponse::default();
                };
                scene.raise(node);
                self.session = DragSession::MoveNode {
                    node,
                    offset: position - node_position,
                    pointer: position,
                };
                log::debug!("Drag started: {:?} on {}", DragAction::MoveNode, node);
                DragResponse {
                    cursor: Some(CursorRequest::ClosedHand),
                    requests: vec![DragRequest::SaveUndoPoint],
                }
            }
            (
                MouseButton::Left,
                HitTarget::Handle(HandleRef {
                    node,
                    role: HandleRole::Add,
                }),
            ) => {
                let Some(handle_position) = scene.handle_position(HandleRef {
                    node,
                    role: HandleRole::Add,
                }) else {
                    return DragResponse::default();
                };
                self.session = DragSession::CreateNode {
                    source: node,
                    offset: position - handle_position,
                    pointer: position,
                    preview: None,
                };
                log::debug!("Drag started: {:?} from {}", DragAction::CreateNode, node);
                DragResponse {
                    cursor: Some(CursorRequest::ClosedHand),
                    requests: vec![DragRequest::SaveUndoPoint],
                }
            }
            (
                MouseButton::Left,
                HitTarget::Handle(HandleRef {
                    node,
                    role: HandleRole::Color,
                }),
            ) => DragResponse::with_requests(vec![
                DragRequest::SelectNode(node),
                DragRequest::SetNodeColor(node),
            ]),
            _ => DragResponse::default(),
        }
    }

    /// Handle pointer motion while a button may be held.
    pub fn on_pointer_move<S: SceneAdapter>(
        &mut self,
        position: Point,
        scene: &mut S,
    ) -> DragResponse {
        let node_size = self.node_size;
        let opacity = self.preview_opacity;
        match &mut self.session {
            DragSession::Idle => {
                log::trace!(
                    "{}",
                    Fault::IllegalDragTransition {
                        event: "move",
                        action: DragAction::Idle,
                    }
                );
            }
            // Panning is applied by the owner from screen deltas.
            DragSession::Scroll => {}
            DragSession::MoveNode { node, offset, pointer } => {
                if !scene.contains(EntityRef::Node(*node)) {
                    lost_source(*node, DragAction::MoveNode);
                    return DragResponse::default();
                }
                *pointer = position;
                scene.set_position(EntityRef::Node(*node), position - *offset);
            }
            DragSession::CreateNode {
                source,
                offset,
                pointer,
                preview,
            } => {
                if !scene.contains(EntityRef::Node(*source)) {
                    lost_source(*source, DragAction::CreateNode);
                    return DragResponse::default();
                }
                *pointer = position;
                let target = position - *offset;
                match preview {
                    Some(preview) => preview.follow(scene, target),
                    None => {
                        let spawned = Preview::spawn(scene, *source, target, node_size, opacity);
                        spawned.follow(scene, target);
                        scene.set_handles_visible(*source, false);
                        *preview = Some(spawned);
                    }
                }
            }
        }
        DragResponse::default()
    }

    /// Finish the active gesture.
    pub fn on_pointer_up<S: SceneAdapter>(&mut self, scene: &mut S) -> DragResponse {
        match std::mem::take(&mut self.session) {
            DragSession::Idle => {
                self.ignore("up");
                DragResponse::default()
            }
            DragSession::Scroll => {
                log::debug!("Drag finished: {:?}", DragAction::Scroll);
                DragResponse::restore(vec![DragRequest::SetPanning(false)])
            }
            DragSession::MoveNode { node, offset, pointer } => {
                log::debug!("Drag finished: {:?} on {}", DragAction::MoveNode, node);
                DragResponse::restore(commit_move(scene, node, pointer - offset))
            }
            DragSession::CreateNode {
                source,
                offset,
                pointer,
                preview,
            } => {
                if let Some(preview) = preview {
                    preview.release(scene);
                }
                if !scene.contains(EntityRef::Node(source)) {
                    lost_source(source, DragAction::CreateNode);
                    return DragResponse::restore(Vec::new());
                }
                scene.set_handles_visible(source, true);
                log::debug!("Drag finished: {:?} from {}", DragAction::CreateNode, source);
                DragResponse::restore(vec![DragRequest::CreateChildNode {
                    parent: source,
                    position: pointer - offset,
                }])
            }
        }
    }

    /// Abort the active gesture without creating anything. Safe to call
    /// repeatedly.
    pub fn cancel<S: SceneAdapter>(&mut self, scene: &mut S) -> DragResponse {
        let session = std::mem::take(&mut self.session);
        if session.is_active() {
            log::info!("{}", Fault::InterruptedDrag { action: session.action() });
        }
        match session {
            DragSession::Idle => DragResponse::default(),
            DragSession::Scroll => DragResponse::restore(vec![DragRequest::SetPanning(false)]),
            // The node already sits at its dragged position in the scene.
            DragSession::MoveNode { node, offset, pointer } => {
                DragResponse::restore(commit_move(scene, node, pointer - offset))
            }
            DragSession::CreateNode { source, preview, .. } => {
                if let Some(preview) = preview {
                    preview.release(scene);
                }
                if scene.contains(EntityRef::Node(source)) {
                    scene.set_handles_visible(source, true);
                }
                DragResponse::restore(Vec::new())
            }
        }
    }

    fn ignore(&self, event: &'static str) {
        log::trace!(
            "{}",
            Fault::IllegalDragTransition {
                event,
                action: self.session.action(),
            }
        );
    }
}

fn commit_move<S: SceneAdapter>(scene: &S, node: NodeId, position: Point) -> Vec<DragRequest> {
    if scene.contains(EntityRef::Node(node)) {
        vec![DragRequest::CommitNodePosition { node, position }]
    } else {
        lost_source(node, DragAction::MoveNode);
        Vec::new()
    }
}

fn lost_source(node: NodeId, action: DragAction) {
    log::warn!("{}", Fault::ContractViolation { node, action });
}
