//! Path reconstruction: rebuild the single root-to-node branch addressed by
//! a known relation chain.

use serde_json::Value;
use tracing::{debug, error};

use crate::domain::error::{TreeError, TreeResult};
use crate::domain::info::{relation_signature, RelationKind, StartInfo};
use crate::domain::node::{Forest, TreeNode};
use crate::domain::traverse::each;

/// Options of [`relation_to_tree`].
#[derive(Debug, Clone, Default)]
pub struct ReconstructOptions {
    /// Chain of each node the relation is compared with
    pub relation_kind: RelationKind,
    /// Keep the injected metadata on the returned nodes
    pub keep_node_info: bool,
    /// Starting configuration of the injecting traversals, e.g. a custom
    /// relation key when matching on [`RelationKind::Relation`]
    pub start: Option<StartInfo>,
}

impl ReconstructOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn relation_kind(mut self, kind: RelationKind) -> Self {
        self.relation_kind = kind;
        self
    }

    pub fn keep_node_info(mut self, keep: bool) -> Self {
        self.keep_node_info = keep;
        self
    }

    pub fn start(mut self, start: StartInfo) -> Self {
        self.start = Some(start);
        self
    }
}

/// Build the minimal tree holding exactly the path described by `relation`.
///
/// Prefixes of `relation` are resolved from the longest down to the root
/// entry. Each one runs a full injecting traversal over `root` and copies the
/// first node whose selected chain stringifies like the prefix; the copy's
/// children become the one-node list built for the next longer prefix, or
/// `[]` for the target itself. The returned root therefore has exactly one
/// child per level.
///
/// `root` is annotated in place as a side effect of the traversals.
///
/// # Errors
///
/// * [`TreeError::InvalidInput`] when the root is absent or `relation` is empty.
/// * [`TreeError::NoMatch`] when some prefix addresses no node. No partial
///   branch is returned in that case.
pub fn relation_to_tree<N, R>(
    root: &mut R,
    relation: &[Value],
    options: &ReconstructOptions,
) -> TreeResult<N>
where
    N: TreeNode,
    R: Forest<N> + ?Sized,
{
    if root.roots().is_none() {
        error!("relation_to_tree: root must not be empty");
        return Err(TreeError::invalid_input("root is absent"));
    }
    if relation.is_empty() {
        error!("relation_to_tree: relation must not be empty");
        return Err(TreeError::invalid_input("relation chain is empty"));
    }

    let children_key = options
        .start
        .as_ref()
        .map(StartInfo::resolve)
        .unwrap_or_default()
        .children_key;
    let kind = options.relation_kind;
    debug!(
        "relation_to_tree: relation={} kind={} keep_node_info={}",
        relation_signature(relation),
        kind,
        options.keep_node_info
    );

    let mut branch: Option<N> = None;
    for depth in (1..=relation.len()).rev() {
        let target = relation_signature(&relation[..depth]);
        let mut found: Option<N> = None;

        each(&mut *root, options.start.as_ref(), |node: &mut N, stop| {
            let matches = node
                .node_info()
                .is_some_and(|info| info.signature(kind) == target);
            if !matches {
                return;
            }
            let mut copy = node.detached(&children_key);
            copy.set_children(&children_key, branch.take().into_iter().collect());
            if !options.keep_node_info {
                copy.remove_node_info();
            }
            found = Some(copy);
            stop.stop();
        })?;

        match found {
            Some(node) => branch = Some(node),
            None => {
                error!("relation_to_tree: no node matches [{}]", target);
                return Err(TreeError::NoMatch { prefix: target });
            }
        }
    }

    branch.ok_or_else(|| TreeError::invalid_input("relation chain is empty"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn given_index_chain_when_reconstructing_then_returns_single_branch() {
        let mut tree = json!({
            "id": "A",
            "children": [
                {"id": "B", "children": [{"id": "C"}, {"id": "D"}]}
            ]
        });
        let chain = [json!(0), json!(0), json!(1)];

        let branch: Value = relation_to_tree(&mut tree, &chain, &ReconstructOptions::new()).unwrap();

        assert_eq!(
            branch,
            json!({"id": "A", "children": [{"id": "B", "children": [{"id": "D", "children": []}]}]})
        );
    }

    #[test]
    fn given_empty_chain_when_reconstructing_then_reports_invalid_input() {
        let mut tree = json!({"id": "A"});
        let result: TreeResult<Value> = relation_to_tree(&mut tree, &[], &ReconstructOptions::new());
        assert!(matches!(result, Err(TreeError::InvalidInput { .. })));
    }

    #[test]
    fn given_unknown_chain_when_reconstructing_then_reports_no_match() {
        let mut tree = json!({"id": "A", "children": [{"id": "B"}]});
        let chain = [json!(0), json!(4)];
        let result: TreeResult<Value> = relation_to_tree(&mut tree, &chain, &ReconstructOptions::new());
        assert_eq!(
            result,
            Err(TreeError::NoMatch {
                prefix: "0,4".to_string()
            })
        );
    }
}
