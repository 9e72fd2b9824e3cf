//! Depth-first traversals.
//!
//! [`parse`] and [`parse_mut`] walk a forest without computing anything.
//! [`each`] computes a [`NodeInfo`] for every visited node and attaches it
//! to the node in place before the callback sees it.
//!
//! Both kinds honor [`Stop`]: once the callback requests it, the whole walk
//! ends. Pending siblings at every open level are abandoned, not only the
//! current list.

use std::ops::ControlFlow;

use serde_json::Value;
use tracing::{debug, error, trace};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::info::{NodeInfo, RelationKey, StartInfo};
use crate::domain::node::{Forest, TreeNode};

/// Handle passed to visit callbacks to end a traversal early.
#[derive(Debug, Default)]
pub struct Stop {
    requested: bool,
}

impl Stop {
    /// Request the traversal to end after the current callback returns.
    /// Calling it again has no further effect.
    pub fn stop(&mut self) {
        self.requested = true;
    }

    pub fn is_stopped(&self) -> bool {
        self.requested
    }

    pub(crate) fn flow(&self) -> ControlFlow<()> {
        if self.requested {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

fn absent_root(operation: &str) -> TreeError {
    error!("{}: root must not be empty", operation);
    TreeError::invalid_input("root is absent")
}

/// Plain pre-order walk, no metadata.
///
/// Children are read from the field `children_key`, usually
/// [`DEFAULT_CHILDREN_KEY`](crate::domain::info::DEFAULT_CHILDREN_KEY).
pub fn parse<N, R, F>(root: &R, children_key: &str, mut on_visit: F) -> TreeResult<()>
where
    N: TreeNode,
    R: Forest<N> + ?Sized,
    F: FnMut(&N, &mut Stop),
{
    let list = root.roots().ok_or_else(|| absent_root("parse"))?;
    debug!("parse: roots={} children_key={}", list.len(), children_key);
    let mut stop = Stop::default();
    let _ = parse_list(list, children_key, &mut stop, &mut on_visit);
    Ok(())
}

fn parse_list<N, F>(list: &[N], key: &str, stop: &mut Stop, on_visit: &mut F) -> ControlFlow<()>
where
    N: TreeNode,
    F: FnMut(&N, &mut Stop),
{
    for node in list {
        on_visit(node, stop);
        stop.flow()?;
        if let Some(children) = node.children(key).filter(|c| !c.is_empty()) {
            parse_list(children, key, stop, on_visit)?;
        }
    }
    ControlFlow::Continue(())
}

/// Like [`parse`], but the callback may edit nodes. Children are looked up
/// after the callback returns, so edits to them are seen by the walk.
pub fn parse_mut<N, R, F>(root: &mut R, children_key: &str, mut on_visit: F) -> TreeResult<()>
where
    N: TreeNode,
    R: Forest<N> + ?Sized,
    F: FnMut(&mut N, &mut Stop),
{
    let list = root.roots_mut().ok_or_else(|| absent_root("parse_mut"))?;
    debug!("parse_mut: roots={} children_key={}", list.len(), children_key);
    let mut stop = Stop::default();
    let _ = parse_list_mut(list, children_key, &mut stop, &mut on_visit);
    Ok(())
}

fn parse_list_mut<N, F>(
    list: &mut [N],
    key: &str,
    stop: &mut Stop,
    on_visit: &mut F,
) -> ControlFlow<()>
where
    N: TreeNode,
    F: FnMut(&mut N, &mut Stop),
{
    for node in list.iter_mut() {
        on_visit(node, stop);
        stop.flow()?;
        if let Some(children) = node.children_mut(key).filter(|c| !c.is_empty()) {
            parse_list_mut(children, key, stop, on_visit)?;
        }
    }
    ControlFlow::Continue(())
}

/// Pre-order walk that injects a [`NodeInfo`] into every visited node.
///
/// `start` is the starting configuration; unset fields take their defaults
/// (root level 1, index based relations, children under `"children"`).
/// Nodes are mutated in place and any previous metadata is overwritten;
/// callers needing the untouched tree must copy it first.
pub fn each<N, R, F>(root: &mut R, start: Option<&StartInfo>, mut on_visit: F) -> TreeResult<()>
where
    N: TreeNode,
    R: Forest<N> + ?Sized,
    F: FnMut(&mut N, &mut Stop),
{
    let list = root.roots_mut().ok_or_else(|| absent_root("each"))?;
    let inherited = start.map(StartInfo::resolve).unwrap_or_default();
    debug!(
        "each: roots={} level={} children_key={} relation_key={}",
        list.len(),
        inherited.level,
        inherited.children_key,
        inherited.relation_key
    );
    let mut stop = Stop::default();
    if each_list(list, &inherited, &mut stop, &mut on_visit).is_break() {
        debug!("each: stopped by callback");
    }
    Ok(())
}

fn each_list<N, F>(
    list: &mut [N],
    inherited: &NodeInfo,
    stop: &mut Stop,
    on_visit: &mut F,
) -> ControlFlow<()>
where
    N: TreeNode,
    F: FnMut(&mut N, &mut Stop),
{
    let key = inherited.children_key.as_str();
    let siblings = list.len();
    for (index, node) in list.iter_mut().enumerate() {
        let entry = match &inherited.relation_key {
            RelationKey::Index => Value::from(index),
            RelationKey::Field(field) => node.relation_value(field),
        };
        let info = node_info_at(inherited, index, siblings, entry, node.children_len(key));
        trace!("each: visit {:?}", info.index_relation);
        let next = info.descend();
        node.set_node_info(info);

        on_visit(node, stop);
        stop.flow()?;

        if let Some(children) = node.children_mut(key).filter(|c| !c.is_empty()) {
            each_list(children, &next, stop, on_visit)?;
        }
    }
    ControlFlow::Continue(())
}

/// Metadata of the `index`-th of `siblings` nodes sharing `inherited`.
pub(crate) fn node_info_at(
    inherited: &NodeInfo,
    index: usize,
    siblings: usize,
    relation_entry: Value,
    children_len: usize,
) -> NodeInfo {
    let is_level_end = index + 1 == siblings;

    let mut relation = inherited.relation.clone();
    relation.push(relation_entry);
    let mut index_relation = inherited.index_relation.clone();
    index_relation.push(index);
    let mut is_level_end_relation = inherited.is_level_end_relation.clone();
    is_level_end_relation.push(is_level_end);

    NodeInfo {
        index,
        level: inherited.level,
        relation,
        index_relation,
        children_key: inherited.children_key.clone(),
        relation_key: inherited.relation_key.clone(),
        is_level_end,
        is_level_end_relation,
        peers: siblings.saturating_sub(1),
        children_len,
    }
}
