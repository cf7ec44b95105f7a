//! Pane splitter: nested horizontal/vertical arrangement of containers.
//!
//! The tree lives in an arena; every node records its parent so the active
//! splitter is found by walking up from the focused leaf. Splitting wraps the
//! single active leaf in a new nested splitter and never reflows the rest of
//! the tree.
//!
//! Invariants:
//! * The root is always a splitter (possibly empty).
//! * A container appears in at most one leaf.
//! * A nested splitter that loses its last child is removed from its parent,
//!   cascading upwards; the root is kept.

use crate::layout::{Layout, LayoutRegion};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Children side by side.
    Horizontal,
    /// Children stacked.
    Vertical,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct NodeId(usize);

#[derive(Clone, Debug)]
enum Node<C> {
    Leaf {
        container: C,
        parent: NodeId,
    },
    Split {
        orientation: Orientation,
        children: Vec<NodeId>,
        parent: Option<NodeId>,
    },
}

/// Structural view of the tree for inspection and tests.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PaneShape<C> {
    Leaf(C),
    Split(Orientation, Vec<PaneShape<C>>),
}

#[derive(Clone, Debug)]
pub struct PaneSplitter<C> {
    nodes: Vec<Option<Node<C>>>,
    root: NodeId,
    focus: Option<C>,
}

impl<C: Copy + PartialEq + std::fmt::Debug> PaneSplitter<C> {
    pub fn new(orientation: Orientation) -> Self {
        Self {
            nodes: vec![Some(Node::Split {
                orientation,
                children: Vec::new(),
                parent: None,
            })],
            root: NodeId(0),
            focus: None,
        }
    }

    fn node(&self, id: NodeId) -> Option<&Node<C>> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node<C>> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    fn alloc(&mut self, node: Node<C>) -> NodeId {
        if let Some(free) = self.nodes.iter().position(Option::is_none) {
            self.nodes[free] = Some(node);
            NodeId(free)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    fn children(&self, id: NodeId) -> &[NodeId] {
        match self.node(id) {
            Some(Node::Split { children, .. }) => children,
            _ => &[],
        }
    }

    fn orientation_of(&self, id: NodeId) -> Option<Orientation> {
        match self.node(id) {
            Some(Node::Split { orientation, .. }) => Some(*orientation),
            _ => None,
        }
    }

    fn leaf_of(&self, container: C) -> Option<NodeId> {
        self.nodes.iter().enumerate().find_map(|(i, n)| match n {
            Some(Node::Leaf { container: c, .. }) if *c == container => Some(NodeId(i)),
            _ => None,
        })
    }

    fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        match self.node(id)? {
            Node::Leaf { parent, .. } => Some(*parent),
            Node::Split { parent, .. } => *parent,
        }
    }

    fn set_parent(&mut self, id: NodeId, new_parent: NodeId) {
        match self.node_mut(id) {
            Some(Node::Leaf { parent, .. }) => *parent = new_parent,
            Some(Node::Split { parent, .. }) => *parent = Some(new_parent),
            None => {}
        }
    }

    pub fn is_empty(&self) -> bool {
        self.children(self.root).is_empty()
    }

    pub fn contains(&self, container: C) -> bool {
        self.leaf_of(container).is_some()
    }

    /// Containers in depth-first order.
    pub fn containers(&self) -> Vec<C> {
        let mut out = Vec::new();
        self.collect_leaves(self.root, &mut out);
        out
    }

    fn collect_leaves(&self, id: NodeId, out: &mut Vec<C>) {
        match self.node(id) {
            Some(Node::Leaf { container, .. }) => out.push(*container),
            Some(Node::Split { children, .. }) => {
                for &child in children {
                    self.collect_leaves(child, out);
                }
            }
            None => {}
        }
    }

    /// Record which container holds input focus (`None`: focus is elsewhere).
    pub fn set_focus(&mut self, container: Option<C>) {
        self.focus = container;
    }

    pub fn focus(&self) -> Option<C> {
        self.focus
    }

    /// Splitter directly holding the active container, or the root.
    fn active_splitter(&self) -> NodeId {
        self.active_container()
            .and_then(|c| self.leaf_of(c))
            .and_then(|leaf| self.parent_of(leaf))
            .unwrap_or(self.root)
    }

    /// The focused container when it is in the tree. Otherwise the last
    /// direct container of the last nested splitter in depth-first order, or
    /// the root's last direct container when nothing is nested.
    pub fn active_container(&self) -> Option<C> {
        if let Some(c) = self.focus.filter(|c| self.contains(*c)) {
            return Some(c);
        }
        let mut splitters = Vec::new();
        self.collect_splitters(self.root, &mut splitters);
        let holder = splitters.last().copied().unwrap_or(self.root);
        self.last_direct_container(holder)
    }

    fn collect_splitters(&self, id: NodeId, out: &mut Vec<NodeId>) {
        for &child in self.children(id) {
            if let Some(Node::Split { .. }) = self.node(child) {
                out.push(child);
                self.collect_splitters(child, out);
            }
        }
    }

    fn last_direct_container(&self, id: NodeId) -> Option<C> {
        self.children(id).iter().rev().find_map(|&child| match self.node(child) {
            Some(Node::Leaf { container, .. }) => Some(*container),
            _ => None,
        })
    }

    /// Add `container` next to the active one.
    ///
    /// When the active splitter has fewer than two children or already runs
    /// in `orientation`, the container is appended (and the splitter takes
    /// `orientation`). Otherwise the active container is wrapped together
    /// with the new one in a nested splitter of `orientation` that takes its
    /// slot.
    pub fn add_container(&mut self, container: C, orientation: Orientation) {
        if self.contains(container) {
            return;
        }
        let splitter = self.active_splitter();
        let count = self.children(splitter).len();
        let same = self.orientation_of(splitter) == Some(orientation);

        if count < 2 || same {
            let leaf = self.alloc(Node::Leaf {
                container,
                parent: splitter,
            });
            if let Some(Node::Split {
                orientation: o,
                children,
                ..
            }) = self.node_mut(splitter)
            {
                children.push(leaf);
                *o = orientation;
            }
            debug!(target: "pane.splitter", ?container, ?orientation, children = count + 1, "container_appended");
            return;
        }

        let old = self
            .active_container()
            .filter(|c| self.leaf_of(*c).and_then(|l| self.parent_of(l)) == Some(splitter));
        let Some(old_leaf) = old.and_then(|c| self.leaf_of(c)) else {
            // only nested splitters here; nothing to wrap
            let leaf = self.alloc(Node::Leaf {
                container,
                parent: splitter,
            });
            if let Some(Node::Split { children, .. }) = self.node_mut(splitter) {
                children.push(leaf);
            }
            return;
        };

        let nested = self.alloc(Node::Split {
            orientation,
            children: Vec::new(),
            parent: Some(splitter),
        });
        let new_leaf = self.alloc(Node::Leaf {
            container,
            parent: nested,
        });
        self.set_parent(old_leaf, nested);
        if let Some(Node::Split { children, .. }) = self.node_mut(nested) {
            children.extend([old_leaf, new_leaf]);
        }
        if let Some(Node::Split { children, .. }) = self.node_mut(splitter)
            && let Some(slot) = children.iter_mut().find(|c| **c == old_leaf)
        {
            *slot = nested;
        }
        debug!(target: "pane.splitter", ?container, ?orientation, wrapped = ?old, "container_split");
    }

    /// Remove a destroyed container. Empty nested splitters are removed up
    /// the chain. Returns false when the container was not in the tree.
    pub fn remove_container(&mut self, container: C) -> bool {
        let Some(leaf) = self.leaf_of(container) else {
            return false;
        };
        if self.focus == Some(container) {
            self.focus = None;
        }
        let mut child = leaf;
        let mut parent = self.parent_of(leaf);
        self.nodes[leaf.0] = None;
        while let Some(p) = parent {
            let now_empty = match self.node_mut(p) {
                Some(Node::Split { children, .. }) => {
                    children.retain(|c| *c != child);
                    children.is_empty()
                }
                _ => false,
            };
            if !now_empty || p == self.root {
                break;
            }
            debug!(target: "pane.splitter", "nested_splitter_emptied");
            parent = self.parent_of(p);
            self.nodes[p.0] = None;
            child = p;
        }
        true
    }

    pub fn shape(&self) -> PaneShape<C> {
        self.shape_of(self.root)
    }

    fn shape_of(&self, id: NodeId) -> PaneShape<C> {
        match self.node(id) {
            Some(Node::Leaf { container, .. }) => PaneShape::Leaf(*container),
            Some(Node::Split {
                orientation,
                children,
                ..
            }) => PaneShape::Split(
                *orientation,
                children.iter().map(|c| self.shape_of(*c)).collect(),
            ),
            None => PaneShape::Split(Orientation::Horizontal, Vec::new()),
        }
    }

    /// Regions for every container when the root covers `area`. Each child
    /// of a splitter gets `extent / count` cells along the split axis.
    pub fn layout(&self, area: LayoutRegion) -> Layout<C> {
        let mut panes = Vec::new();
        self.layout_node(self.root, area, &mut panes);
        Layout::new(panes)
    }

    fn layout_node(&self, id: NodeId, area: LayoutRegion, out: &mut Vec<(C, LayoutRegion)>) {
        match self.node(id) {
            Some(Node::Leaf { container, .. }) => out.push((*container, area)),
            Some(Node::Split {
                orientation,
                children,
                ..
            }) => {
                if children.is_empty() {
                    return;
                }
                let n = children.len() as u16;
                for (i, &child) in children.iter().enumerate() {
                    let i = i as u16;
                    let region = match orientation {
                        Orientation::Horizontal => {
                            let share = area.width / n;
                            LayoutRegion::new(area.x + i * share, area.y, share, area.height)
                        }
                        Orientation::Vertical => {
                            let share = area.height / n;
                            LayoutRegion::new(area.x, area.y + i * share, area.width, share)
                        }
                    };
                    self.layout_node(child, region, out);
                }
            }
            None => {}
        }
    }
}
