//! Integration tests for path reconstruction from relation chains.

use rstest::rstest;
use serde_json::{json, Value};

use rstree::domain::{
    each, relation_to_tree, ReconstructOptions, RelationKind, StartInfo, TreeError, TreeNode,
    TreeResult, NODE_INFO_FIELD,
};
use rstree::util::testing::{init_test_setup, sample_forest, sample_tree};

#[ctor::ctor]
fn init() {
    init_test_setup();
}

/// Follow the single child of every level and collect the `key` values.
fn branch_values(branch: &Value, key: &str) -> Vec<Value> {
    let mut values = vec![branch[key].clone()];
    let mut current = branch;
    while let Some(children) = current.children("children") {
        match children {
            [] => break,
            [only] => {
                values.push(only[key].clone());
                current = only;
            }
            _ => panic!("branch has more than one child per level: {}", current),
        }
    }
    values
}

#[test]
fn given_index_chain_when_reconstructing_then_returns_only_that_path() {
    let mut doc = sample_tree();
    let branch: Value =
        relation_to_tree(&mut doc, &[json!(0), json!(0), json!(1)], &ReconstructOptions::new())
            .unwrap();

    assert_eq!(
        branch,
        json!({
            "name": "A",
            "children": [{
                "name": "B",
                "children": [{"name": "D", "children": []}]
            }]
        })
    );
}

#[test]
fn given_every_node_when_reconstructing_its_index_chain_then_branch_ends_at_it() {
    let mut annotated = sample_forest();
    let mut chains = Vec::new();
    each(&mut annotated, None, |node: &mut Value, _| {
        let info = node.node_info().unwrap();
        chains.push((info.index_relation, node["id"].clone()));
    })
    .unwrap();
    assert_eq!(chains.len(), 6);

    for (chain, id) in chains {
        let chain: Vec<Value> = chain.into_iter().map(Value::from).collect();
        let mut doc = sample_forest();
        let branch: Value = relation_to_tree(&mut doc, &chain, &ReconstructOptions::new()).unwrap();

        let ids = branch_values(&branch, "id");
        assert_eq!(ids.len(), chain.len());
        assert_eq!(ids.last(), Some(&id));
        assert!(!branch.to_string().contains(NODE_INFO_FIELD));
    }
}

#[rstest]
#[case(json!(["0", "0", "1"]))]
#[case(json!([0.0, 0, 1]))]
fn given_chain_that_stringifies_alike_when_reconstructing_then_matches(#[case] chain: Value) {
    let chain = chain.as_array().cloned().unwrap_or_default();
    let mut doc = sample_tree();
    let branch: Value = relation_to_tree(&mut doc, &chain, &ReconstructOptions::new()).unwrap();
    assert_eq!(branch_values(&branch, "name"), [json!("A"), json!("B"), json!("D")]);
}

#[test]
fn given_keep_node_info_when_reconstructing_then_branch_carries_metadata() {
    let mut doc = sample_tree();
    let options = ReconstructOptions::new().keep_node_info(true);
    let branch: Value = relation_to_tree(&mut doc, &[json!(0), json!(0)], &options).unwrap();

    let root_info = branch.node_info().unwrap();
    assert_eq!(root_info.level, 1);
    let b = &branch["children"][0];
    let b_info = b.node_info().unwrap();
    assert_eq!(b_info.index_relation, vec![0, 0]);
    assert_eq!(b_info.children_len, 2);
    assert_eq!(b["children"], json!([]));
}

#[test]
fn given_relation_kind_with_key_when_reconstructing_then_matches_field_values() {
    let mut doc = sample_forest();
    let options = ReconstructOptions::new()
        .relation_kind(RelationKind::Relation)
        .start(StartInfo::new().with_relation_key("id"));

    let branch: Value =
        relation_to_tree(&mut doc, &[json!("us"), json!("ny")], &options).unwrap();

    assert_eq!(
        branch,
        json!({"id": "us", "children": [{"id": "ny", "children": []}]})
    );
}

#[test]
fn given_relation_kind_without_key_when_reconstructing_then_relation_equals_indices() {
    let mut doc = sample_forest();
    let options = ReconstructOptions::new().relation_kind(RelationKind::Relation);
    let branch: Value = relation_to_tree(&mut doc, &[json!(1), json!(0)], &options).unwrap();
    assert_eq!(branch_values(&branch, "id"), [json!("us"), json!("ny")]);
}

#[test]
fn given_root_chain_when_reconstructing_then_returns_root_without_children() {
    let mut doc = sample_forest();
    let branch: Value = relation_to_tree(&mut doc, &[json!(1)], &ReconstructOptions::new()).unwrap();
    assert_eq!(branch, json!({"id": "us", "children": []}));
}

#[test]
fn given_reconstruction_when_done_then_source_tree_keeps_its_shape() {
    let mut doc = sample_tree();
    let _: Value =
        relation_to_tree(&mut doc, &[json!(0), json!(0), json!(0)], &ReconstructOptions::new())
            .unwrap();

    // Annotated as a side effect, children untouched
    assert_eq!(doc["children"][0]["children"].as_array().map(Vec::len), Some(2));
    assert!(doc.get(NODE_INFO_FIELD).is_some());
}

#[test]
fn given_duplicate_relation_values_when_reconstructing_then_first_in_pre_order_wins() {
    let mut doc = json!([
        {"id": "x", "name": "first", "children": [{"id": "y", "name": "first-y"}]},
        {"id": "x", "name": "second", "children": [{"id": "y", "name": "second-y"}]}
    ]);
    let options = ReconstructOptions::new()
        .relation_kind(RelationKind::Relation)
        .start(StartInfo::new().with_relation_key("id"));

    let branch: Value = relation_to_tree(&mut doc, &[json!("x"), json!("y")], &options).unwrap();

    assert_eq!(
        branch,
        json!({
            "id": "x",
            "name": "first",
            "children": [{"id": "y", "name": "first-y", "children": []}]
        })
    );
}

// ============================================================
// failures
// ============================================================

#[rstest]
#[case(json!([0, 4]), "0,4")]
#[case(json!([3]), "3")]
#[case(json!([0, 0, 1, 0]), "0,0,1,0")]
fn given_chain_to_missing_node_when_reconstructing_then_reports_deepest_prefix(
    #[case] chain: Value,
    #[case] prefix: &str,
) {
    let chain = chain.as_array().cloned().unwrap_or_default();
    let mut doc = sample_tree();
    let result: TreeResult<Value> = relation_to_tree(&mut doc, &chain, &ReconstructOptions::new());
    assert_eq!(
        result,
        Err(TreeError::NoMatch {
            prefix: prefix.to_string()
        })
    );
}

#[test]
fn given_unknown_field_value_when_reconstructing_then_no_match() {
    let mut doc = sample_forest();
    let options = ReconstructOptions::new()
        .relation_kind(RelationKind::Relation)
        .start(StartInfo::new().with_relation_key("id"));
    let result: TreeResult<Value> = relation_to_tree(&mut doc, &[json!("eu"), json!("it")], &options);
    assert!(matches!(result, Err(TreeError::NoMatch { .. })));
}

#[test]
fn given_absent_root_when_reconstructing_then_reports_invalid_input() {
    let mut doc = Value::Null;
    let result: TreeResult<Value> =
        relation_to_tree(&mut doc, &[json!(0)], &ReconstructOptions::new());
    assert!(matches!(result, Err(TreeError::InvalidInput { .. })));
}
