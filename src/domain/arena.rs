use std::ops::ControlFlow;

use generational_arena::{Arena, Index};
use serde_json::Value;
use termtree::Tree;
use tracing::{debug, error, instrument, warn};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::info::{relation_signature, NodeInfo, RelationKey, RelationKind, StartInfo};
use crate::domain::node::{Forest, TreeNode};
use crate::domain::traverse::{node_info_at, Stop};

/// Tree node in the arena-based hierarchy structure.
#[derive(Debug)]
pub struct ArenaNode<T> {
    /// Payload of this node
    pub data: T,
    /// Index of parent node in the arena, None for root nodes
    pub parent: Option<Index>,
    /// Indices of child nodes in the arena, in sibling order
    pub children: Vec<Index>,
    /// Metadata from the last [`TreeArena::annotate`] run
    pub info: Option<NodeInfo>,
}

/// Arena-based forest.
///
/// Uses generational arena for memory-safe node references and O(1) lookups.
/// Unlike JSON trees, node metadata lives in a slot next to the payload, keyed
/// by the node's stable [`Index`], so annotating never touches `data`.
#[derive(Debug)]
pub struct TreeArena<T> {
    /// Arena storage for all tree nodes
    arena: Arena<ArenaNode<T>>,
    /// Root nodes in insertion order
    roots: Vec<Index>,
}

impl<T> Default for TreeArena<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> TreeArena<T> {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            roots: Vec::new(),
        }
    }

    /// Insert `data` as last child of `parent`, or as a new root.
    ///
    /// A parent index that is no longer in the arena makes the node a root.
    #[instrument(level = "trace", skip(self, data))]
    pub fn insert_node(&mut self, data: T, parent: Option<Index>) -> Index {
        let parent = parent.filter(|idx| {
            let known = self.arena.contains(*idx);
            if !known {
                warn!("insert_node: unknown parent {:?}, inserting as root", idx);
            }
            known
        });
        let node = ArenaNode {
            data,
            parent,
            children: Vec::new(),
            info: None,
        };
        let node_idx = self.arena.insert(node);

        match parent.and_then(|idx| self.arena.get_mut(idx)) {
            Some(parent) => parent.children.push(node_idx),
            None => self.roots.push(node_idx),
        }

        node_idx
    }

    pub fn get_node(&self, idx: Index) -> Option<&ArenaNode<T>> {
        self.arena.get(idx)
    }

    pub fn get_node_mut(&mut self, idx: Index) -> Option<&mut ArenaNode<T>> {
        self.arena.get_mut(idx)
    }

    /// First root, None for empty trees.
    pub fn root(&self) -> Option<Index> {
        self.roots.first().copied()
    }

    pub fn roots(&self) -> &[Index] {
        &self.roots
    }

    pub fn len(&self) -> usize {
        self.arena.len()
    }

    pub fn is_empty(&self) -> bool {
        self.arena.is_empty()
    }

    pub fn info(&self, idx: Index) -> Option<&NodeInfo> {
        self.get_node(idx).and_then(|node| node.info.as_ref())
    }

    pub fn iter(&self) -> TreeIterator<'_, T> {
        TreeIterator::new(self)
    }

    pub fn iter_postorder(&self) -> PostOrderIterator<'_, T> {
        PostOrderIterator::new(self)
    }

    #[instrument(level = "debug", skip(self))]
    pub fn depth(&self) -> usize {
        self.roots
            .iter()
            .map(|&root| self.calculate_depth(root))
            .max()
            .unwrap_or(0)
    }

    fn calculate_depth(&self, node_idx: Index) -> usize {
        if let Some(node) = self.get_node(node_idx) {
            1 + node
                .children
                .iter()
                .map(|&child| self.calculate_depth(child))
                .max()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Collects all leaf nodes (nodes with no children) in pre-order.
    #[instrument(level = "debug", skip(self))]
    pub fn leaf_nodes(&self) -> Vec<Index> {
        self.iter()
            .filter(|(_, node)| node.children.is_empty())
            .map(|(idx, _)| idx)
            .collect()
    }

    /// Injecting traversal over the arena.
    ///
    /// Computes the same metadata as [`each`](crate::domain::traverse::each)
    /// and stores it in each node's `info` slot. With a field relation key,
    /// `relation_of(data, field)` supplies the relation entry of a node.
    /// Returns `Break` when `visit` stopped the walk.
    #[instrument(level = "debug", skip(self, relation_of, visit))]
    pub fn annotate<V, F>(
        &mut self,
        start: Option<&StartInfo>,
        relation_of: V,
        mut visit: F,
    ) -> ControlFlow<()>
    where
        V: Fn(&T, &str) -> Value,
        F: FnMut(Index, &ArenaNode<T>, &mut Stop),
    {
        let inherited = start.map(StartInfo::resolve).unwrap_or_default();
        let roots = self.roots.clone();
        let mut stop = Stop::default();
        let flow = self.annotate_list(&roots, &inherited, &relation_of, &mut stop, &mut visit);
        if flow.is_break() {
            debug!("annotate: stopped by callback");
        }
        flow
    }

    fn annotate_list<V, F>(
        &mut self,
        list: &[Index],
        inherited: &NodeInfo,
        relation_of: &V,
        stop: &mut Stop,
        visit: &mut F,
    ) -> ControlFlow<()>
    where
        V: Fn(&T, &str) -> Value,
        F: FnMut(Index, &ArenaNode<T>, &mut Stop),
    {
        let siblings = list.len();
        for (index, &idx) in list.iter().enumerate() {
            let Some(node) = self.arena.get_mut(idx) else {
                continue;
            };
            let entry = match &inherited.relation_key {
                RelationKey::Index => Value::from(index),
                RelationKey::Field(field) => relation_of(&node.data, field),
            };
            let info = node_info_at(inherited, index, siblings, entry, node.children.len());
            let next = info.descend();
            node.info = Some(info);

            visit(idx, node, stop);
            stop.flow()?;

            let children = node.children.clone();
            if !children.is_empty() {
                self.annotate_list(&children, &next, relation_of, stop, visit)?;
            }
        }
        ControlFlow::Continue(())
    }

    /// First node in pre-order whose chain of `kind` stringifies like `chain`.
    ///
    /// Only annotated nodes can match.
    pub fn find_by_relation(&self, kind: RelationKind, chain: &[Value]) -> Option<Index> {
        let target = relation_signature(chain);
        self.iter()
            .find(|(_, node)| {
                node.info
                    .as_ref()
                    .is_some_and(|info| info.signature(kind) == target)
            })
            .map(|(idx, _)| idx)
    }

    /// Indices from the root down to the node addressed by `chain`.
    ///
    /// Arena counterpart of
    /// [`relation_to_tree`](crate::domain::reconstruct::relation_to_tree):
    /// parent links make a single lookup enough.
    #[instrument(level = "debug", skip(self))]
    pub fn path_to(&self, kind: RelationKind, chain: &[Value]) -> TreeResult<Vec<Index>> {
        if chain.is_empty() {
            error!("path_to: relation must not be empty");
            return Err(TreeError::invalid_input("relation chain is empty"));
        }
        let Some(target) = self.find_by_relation(kind, chain) else {
            let prefix = relation_signature(chain);
            error!("path_to: no node matches [{}]", prefix);
            return Err(TreeError::NoMatch { prefix });
        };

        let mut path = vec![target];
        let mut current = self.get_node(target).and_then(|node| node.parent);
        while let Some(idx) = current {
            path.push(idx);
            current = self.get_node(idx).and_then(|node| node.parent);
        }
        path.reverse();
        Ok(path)
    }

    /// Render the forest; several roots hang below a `.` node.
    pub fn to_tree_string<L>(&self, label: L) -> Tree<String>
    where
        L: Fn(&T) -> String,
    {
        fn build_tree<T, L: Fn(&T) -> String>(
            arena: &TreeArena<T>,
            node_idx: Index,
            label: &L,
        ) -> Option<Tree<String>> {
            let node = arena.get_node(node_idx)?;
            let leaves: Vec<_> = node
                .children
                .iter()
                .filter_map(|&child| build_tree(arena, child, label))
                .collect();
            Some(Tree::new(label(&node.data)).with_leaves(leaves))
        }

        let mut trees: Vec<_> = self
            .roots
            .iter()
            .filter_map(|&root| build_tree(self, root, &label))
            .collect();
        match trees.len() {
            0 => Tree::new("Empty tree".to_string()),
            1 => trees.remove(0),
            _ => Tree::new(".".to_string()).with_leaves(trees),
        }
    }
}

impl TreeArena<Value> {
    /// Build an arena from a JSON forest.
    ///
    /// Node payloads are the nodes' own fields without the children field.
    #[instrument(level = "debug", skip(root))]
    pub fn from_value(root: &Value, children_key: &str) -> TreeResult<Self> {
        let Some(list) = root.roots() else {
            error!("from_value: root must not be empty");
            return Err(TreeError::invalid_input("root is absent"));
        };
        let mut tree = TreeArena::new();
        for node in list {
            tree.insert_subtree(node, None, children_key);
        }
        debug!("from_value: {} nodes", tree.len());
        Ok(tree)
    }

    fn insert_subtree(&mut self, node: &Value, parent: Option<Index>, children_key: &str) {
        let idx = self.insert_node(node.detached(children_key), parent);
        for child in node.children(children_key).unwrap_or_default() {
            self.insert_subtree(child, Some(idx), children_key);
        }
    }
}

/// Pre-order iterator over all roots.
pub struct TreeIterator<'a, T> {
    arena: &'a TreeArena<T>,
    stack: Vec<Index>,
}

impl<'a, T> TreeIterator<'a, T> {
    fn new(arena: &'a TreeArena<T>) -> Self {
        let stack = arena.roots.iter().rev().copied().collect();
        Self { arena, stack }
    }
}

impl<'a, T> Iterator for TreeIterator<'a, T> {
    type Item = (Index, &'a ArenaNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(current_idx) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                // Push children in reverse order for left-to-right traversal
                self.stack.extend(node.children.iter().rev().copied());
                return Some((current_idx, node));
            }
        }
        None
    }
}

pub struct PostOrderIterator<'a, T> {
    arena: &'a TreeArena<T>,
    stack: Vec<(Index, bool)>,
}

impl<'a, T> PostOrderIterator<'a, T> {
    fn new(arena: &'a TreeArena<T>) -> Self {
        let stack = arena.roots.iter().rev().map(|&idx| (idx, false)).collect();
        Self { arena, stack }
    }
}

impl<'a, T> Iterator for PostOrderIterator<'a, T> {
    type Item = (Index, &'a ArenaNode<T>);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((current_idx, visited)) = self.stack.pop() {
            if let Some(node) = self.arena.get_node(current_idx) {
                if !visited {
                    self.stack.push((current_idx, true));
                    for &child in node.children.iter().rev() {
                        self.stack.push((child, false));
                    }
                } else {
                    return Some((current_idx, node));
                }
            }
        }
        None
    }
}
