//! Document model: owns the graph, modification tracking, undo history and
//! persistence.

use crate::config::EditorConfig;
use crate::error::{DocumentError, DocumentResult};
use crate::graph::{Graph, Node, NodeId, Rgba};
use kurbo::{Point, Size};
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// Maximum number of undo states to keep.
const MAX_UNDO_HISTORY: usize = 50;

/// Current on-disk format version.
const FILE_FORMAT_VERSION: u32 = 1;

/// Operations the interaction core needs from a document.
pub trait DocumentModel {
    /// Whether there are unsaved changes.
    fn is_modified(&self) -> bool;

    /// Whether `save` can run without asking for a file name.
    fn can_be_saved(&self) -> bool;

    /// File the document was last opened from or saved to.
    fn file_name(&self) -> Option<&Path>;

    /// Current content.
    fn graph(&self) -> &Graph;

    /// Replace the content with a fresh, unmodified document.
    fn new_document(&mut self);

    fn open(&mut self, path: &Path) -> DocumentResult<()>;

    fn save(&mut self) -> DocumentResult<()>;

    fn save_as(&mut self, path: &Path) -> DocumentResult<()>;

    fn is_undoable(&self) -> bool;

    fn is_redoable(&self) -> bool;

    /// Record the current content so the next change can be undone.
    fn save_undo_point(&mut self);

    fn undo(&mut self) -> bool;

    fn redo(&mut self) -> bool;

    /// Create a floating node.
    fn create_node(&mut self, position: Point) -> NodeId;

    /// Create a node connected to `parent` by a new edge.
    fn create_child_node(&mut self, parent: NodeId, position: Point) -> DocumentResult<NodeId>;

    /// Only leaves and in-between nodes may be deleted interactively.
    fn can_delete_node(&self, id: NodeId) -> bool;

    fn delete_node(&mut self, id: NodeId) -> DocumentResult<()>;

    fn set_node_position(&mut self, id: NodeId, position: Point) -> DocumentResult<()>;

    fn set_node_color(&mut self, id: NodeId, color: Rgba) -> DocumentResult<()>;

    fn set_background_color(&mut self, color: Rgba);
}

/// Serialized document layout.
#[derive(Debug, Serialize, Deserialize)]
struct DocumentFile {
    version: u32,
    graph: Graph,
}

/// The mind map document.
#[derive(Debug, Clone)]
pub struct MindMap {
    graph: Graph,
    file_name: Option<PathBuf>,
    modified: bool,
    undo_stack: Vec<Graph>,
    redo_stack: Vec<Graph>,
    node_size: Size,
    file_extension: String,
}

impl Default for MindMap {
    fn default() -> Self {
        Self::new(&EditorConfig::default())
    }
}

impl MindMap {
    /// Create a new document with a single root node.
    pub fn new(config: &EditorConfig) -> Self {
        let mut mind_map = Self {
            graph: Graph::new(),
            file_name: None,
            modified: false,
            undo_stack: Vec::new(),
            redo_stack: Vec::new(),
            node_size: config.node_size(),
            file_extension: config.file_extension.clone(),
        };
        mind_map.new_document();
        mind_map
    }

    /// Append the document extension unless the path already carries it.
    fn with_extension(&self, path: &Path) -> PathBuf {
        let has_extension = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case(self.file_extension.as_str()))
            .unwrap_or(false);
        if has_extension {
            return path.to_path_buf();
        }
        let mut name = OsString::from(path.as_os_str());
        name.push(".");
        name.push(&self.file_extension);
        PathBuf::from(name)
    }

    fn write_to(&self, path: &Path) -> DocumentResult<()> {
        let file = DocumentFile {
            version: FILE_FORMAT_VERSION,
            graph: self.graph.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| DocumentError::Serialization(e.to_string()))?;
        fs::write(path, json)
            .map_err(|e| DocumentError::Io(format!("Failed to write {}: {}", path.display(), e)))
    }

    fn read_from(path: &Path) -> DocumentResult<Graph> {
        if !path.exists() {
            return Err(DocumentError::NotFound(path.to_path_buf()));
        }
        let json = fs::read_to_string(path)
            .map_err(|e| DocumentError::Io(format!("Failed to read {}: {}", path.display(), e)))?;
        let file: DocumentFile = serde_json::from_str(&json).map_err(|e| {
            DocumentError::Serialization(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        if file.version > FILE_FORMAT_VERSION {
            return Err(DocumentError::Serialization(format!(
                "Unsupported format version {} in {}",
                file.version,
                path.display()
            )));
        }
        Ok(file.graph)
    }

    fn node_mut(&mut self, id: NodeId) -> DocumentResult<&mut Node> {
        self.graph
            .node_mut(id)
            .ok_or(DocumentError::NodeNotFound(id))
    }
}

impl DocumentModel for MindMap {
    fn is_modified(&self) -> bool {
        self.modified
    }

    fn can_be_saved(&self) -> bool {
        self.file_name.is_some()
    }

    fn file_name(&self) -> Option<&Path> {
        self.file_name.as_deref()
    }

    fn graph(&self) -> &Graph {
        &self.graph
    }

    fn new_document(&mut self) {
        let mut graph = Graph::new();
        let origin = Point::new(-self.node_size.width / 2.0, -self.node_size.height / 2.0);
        graph.add_node(Node::new(origin));

        self.graph = graph;
        self.file_name = None;
        self.modified = false;
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    fn open(&mut self, path: &Path) -> DocumentResult<()> {
        let graph = Self::read_from(path)?;
        self.graph = graph;
        self.file_name = Some(path.to_path_buf());
        self.modified = false;
        self.undo_stack.clear();
        self.redo_stack.clear();
        log::info!("Opened mind map {}", path.display());
        Ok(())
    }

    fn save(&mut self) -> DocumentResult<()> {
        let path = self.file_name.clone().ok_or(DocumentError::NoFileName)?;
        self.write_to(&path)?;
        self.modified = false;
        log::info!("Saved mind map to {}", path.display());
        Ok(())
    }

    fn save_as(&mut self, path: &Path) -> DocumentResult<()> {
        let path = self.with_extension(path);
        self.write_to(&path)?;
        log::info!("Saved mind map as {}", path.display());
        self.file_name = Some(path);
        self.modified = false;
        Ok(())
    }

    fn is_undoable(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    fn is_redoable(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    fn save_undo_point(&mut self) {
        self.undo_stack.push(self.graph.clone());
        self.redo_stack.clear();
        if self.undo_stack.len() > MAX_UNDO_HISTORY {
            self.undo_stack.remove(0);
        }
    }

    fn undo(&mut self) -> bool {
        match self.undo_stack.pop() {
            Some(snapshot) => {
                let current = std::mem::replace(&mut self.graph, snapshot);
                self.redo_stack.push(current);
                self.modified = true;
                true
            }
            None => false,
        }
    }

    fn redo(&mut self) -> bool {
        match self.redo_stack.pop() {
            Some(snapshot) => {
                let current = std::mem::replace(&mut self.graph, snapshot);
                self.undo_stack.push(current);
                self.modified = true;
                true
            }
            None => false,
        }
    }

    fn create_node(&mut self, position: Point) -> NodeId {
        self.modified = true;
        self.graph.add_node(Node::new(position))
    }

    fn create_child_node(&mut self, parent: NodeId, position: Point) -> DocumentResult<NodeId> {
        if !self.graph.contains(parent) {
            return Err(DocumentError::NodeNotFound(parent));
        }
        let id = self.graph.add_node(Node::new(position));
        self.graph.add_edge(parent, id);
        self.modified = true;
        Ok(id)
    }

    fn can_delete_node(&self, id: NodeId) -> bool {
        self.graph.is_leaf(id) || self.graph.is_in_between(id)
    }

    fn delete_node(&mut self, id: NodeId) -> DocumentResult<()> {
        self.graph
            .remove_node(id)
            .ok_or(DocumentError::NodeNotFound(id))?;
        self.modified = true;
        Ok(())
    }

    fn set_node_position(&mut self, id: NodeId, position: Point) -> DocumentResult<()> {
        self.node_mut(id)?.position = position;
        self.modified = true;
        Ok(())
    }

    fn set_node_color(&mut self, id: NodeId, color: Rgba) -> DocumentResult<()> {
        self.node_mut(id)?.color = color;
        self.modified = true;
        Ok(())
    }

    fn set_background_color(&mut self, color: Rgba) {
        self.graph.background_color = color;
        self.modified = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn root(doc: &MindMap) -> NodeId {
        doc.graph().nodes[0].id
    }

    #[test]
    fn test_new_document_has_root_and_is_clean() {
        let doc = MindMap::default();
        assert_eq!(doc.graph().len(), 1);
        assert!(!doc.is_modified());
        assert!(!doc.can_be_saved());
        assert!(!doc.is_undoable());
    }

    #[test]
    fn test_create_child_node_marks_modified() {
        let mut doc = MindMap::default();
        let parent = root(&doc);
        let child = doc
            .create_child_node(parent, Point::new(0.0, 200.0))
            .unwrap();

        assert!(doc.is_modified());
        assert_eq!(doc.graph().len(), 2);
        assert_eq!(doc.graph().edges_to(child).count(), 1);
    }

    #[test]
    fn test_create_child_of_missing_parent() {
        let mut doc = MindMap::default();
        let result = doc.create_child_node(uuid::Uuid::new_v4(), Point::ZERO);
        assert!(matches!(result, Err(DocumentError::NodeNotFound(_))));
        assert_eq!(doc.graph().len(), 1);
    }

    #[test]
    fn test_undo_redo() {
        let mut doc = MindMap::default();
        doc.save_undo_point();
        doc.create_node(Point::new(300.0, 0.0));
        assert!(doc.is_undoable());

        assert!(doc.undo());
        assert_eq!(doc.graph().len(), 1);
        assert!(doc.is_redoable());

        assert!(doc.redo());
        assert_eq!(doc.graph().len(), 2);

        doc.save_undo_point();
        assert!(!doc.is_redoable());
    }

    #[test]
    fn test_undo_history_is_bounded() {
        let mut doc = MindMap::default();
        for _ in 0..(MAX_UNDO_HISTORY + 10) {
            doc.save_undo_point();
        }
        assert_eq!(doc.undo_stack.len(), MAX_UNDO_HISTORY);
    }

    #[test]
    fn test_save_without_file_name_fails() {
        let mut doc = MindMap::default();
        doc.create_node(Point::ZERO);
        assert!(matches!(doc.save(), Err(DocumentError::NoFileName)));
        assert!(doc.is_modified());
    }

    #[test]
    fn test_save_as_then_open() {
        let dir = tempdir().unwrap();
        let mut doc = MindMap::default();
        let parent = root(&doc);
        doc.create_child_node(parent, Point::new(0.0, 150.0)).unwrap();

        doc.save_as(&dir.path().join("ideas")).unwrap();
        let saved = dir.path().join("ideas.mtrail");
        assert!(saved.exists());
        assert_eq!(doc.file_name(), Some(saved.as_path()));
        assert!(!doc.is_modified());
        assert!(doc.can_be_saved());

        let mut other = MindMap::default();
        other.open(&saved).unwrap();
        assert_eq!(other.graph(), doc.graph());
        assert!(!other.is_modified());
    }

    #[test]
    fn test_node_text_survives_save_and_open() {
        let dir = tempdir().unwrap();
        let mut doc = MindMap::default();
        let id = root(&doc);
        let node = doc.graph.node_mut(id).unwrap();
        node.text = "Central idea".to_string();
        node.text_color = Some(Rgba::new(200, 30, 30, 255));

        let path = dir.path().join("labels.mtrail");
        doc.save_as(&path).unwrap();
        let mut other = MindMap::default();
        other.open(&path).unwrap();

        let node = other.graph().node(id).unwrap();
        assert_eq!(node.text, "Central idea");
        assert_eq!(node.text_color, Some(Rgba::new(200, 30, 30, 255)));
    }

    #[test]
    fn test_save_as_keeps_existing_extension() {
        let dir = tempdir().unwrap();
        let mut doc = MindMap::default();
        doc.save_as(&dir.path().join("map.MTRAIL")).unwrap();
        assert!(dir.path().join("map.MTRAIL").exists());
    }

    #[test]
    fn test_failed_open_keeps_document() {
        let dir = tempdir().unwrap();
        let broken = dir.path().join("broken.mtrail");
        fs::write(&broken, "not json").unwrap();

        let mut doc = MindMap::default();
        doc.create_node(Point::ZERO);
        let before = doc.graph().clone();

        assert!(matches!(
            doc.open(&broken),
            Err(DocumentError::Serialization(_))
        ));
        assert!(matches!(
            doc.open(&dir.path().join("missing.mtrail")),
            Err(DocumentError::NotFound(_))
        ));
        assert_eq!(doc.graph(), &before);
        assert!(doc.is_modified());
    }

    #[test]
    fn test_delete_rules() {
        let mut doc = MindMap::default();
        let parent = root(&doc);
        let child = doc.create_child_node(parent, Point::ZERO).unwrap();
        doc.create_child_node(parent, Point::ZERO).unwrap();

        assert!(!doc.can_delete_node(parent));
        assert!(doc.can_delete_node(child));
        doc.delete_node(child).unwrap();
        assert!(doc.delete_node(child).is_err());
    }
}
