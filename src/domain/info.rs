//! Node metadata: the record injected into every visited node, the partial
//! starting configuration of a traversal and the relation chain helpers.

use std::fmt;
use std::str::FromStr;

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Default name of the field holding child nodes.
pub const DEFAULT_CHILDREN_KEY: &str = "children";

/// Reserved relation key meaning "use the positional index".
pub const INDEX_RELATION_KEY: &str = "index";

/// Field under which JSON nodes carry their [`NodeInfo`].
pub const NODE_INFO_FIELD: &str = "nodeInfo";

/// Source of the entries of [`NodeInfo::relation`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RelationKey {
    /// Positional index among siblings
    #[default]
    Index,
    /// Value of the named field on each node
    Field(String),
}

impl RelationKey {
    pub fn is_index(&self) -> bool {
        matches!(self, RelationKey::Index)
    }
}

impl From<String> for RelationKey {
    fn from(key: String) -> Self {
        if key == INDEX_RELATION_KEY {
            RelationKey::Index
        } else {
            RelationKey::Field(key)
        }
    }
}

impl From<&str> for RelationKey {
    fn from(key: &str) -> Self {
        RelationKey::from(key.to_string())
    }
}

impl From<RelationKey> for String {
    fn from(key: RelationKey) -> Self {
        match key {
            RelationKey::Index => INDEX_RELATION_KEY.to_string(),
            RelationKey::Field(name) => name,
        }
    }
}

impl fmt::Display for RelationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKey::Index => f.write_str(INDEX_RELATION_KEY),
            RelationKey::Field(name) => f.write_str(name),
        }
    }
}

/// Which chain of a [`NodeInfo`] a relation is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RelationKind {
    Relation,
    #[default]
    IndexRelation,
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RelationKind::Relation => f.write_str("relation"),
            RelationKind::IndexRelation => f.write_str("indexRelation"),
        }
    }
}

impl FromStr for RelationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "relation" => Ok(RelationKind::Relation),
            "indexRelation" | "index-relation" => Ok(RelationKind::IndexRelation),
            other => Err(format!(
                "unknown relation field '{}', expected 'relation' or 'indexRelation'",
                other
            )),
        }
    }
}

/// Metadata computed by the injecting traversal for one node.
///
/// `relation`, `index_relation` and `is_level_end_relation` always hold
/// exactly `level` entries once a traversal has visited the node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    /// Position among siblings (0-based)
    pub index: usize,
    /// Depth, root level = 1
    pub level: usize,
    /// Key values from the root down to this node
    pub relation: Vec<Value>,
    /// Positional indices from the root down to this node
    pub index_relation: Vec<usize>,
    pub children_key: String,
    pub relation_key: RelationKey,
    /// Last sibling at its level
    pub is_level_end: bool,
    pub is_level_end_relation: Vec<bool>,
    /// Sibling count excluding self
    #[serde(default)]
    pub peers: usize,
    /// Number of direct children
    #[serde(default)]
    pub children_len: usize,
}

impl Default for NodeInfo {
    fn default() -> Self {
        StartInfo::default().resolve()
    }
}

impl NodeInfo {
    /// Read a [`NodeInfo`] back from its JSON form, `None` if it does not fit.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn to_value(&self) -> Value {
        // Derived Serialize on plain data never fails
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Stringified form of the chain selected by `kind`, see [`relation_signature`].
    pub fn signature(&self, kind: RelationKind) -> String {
        match kind {
            RelationKind::Relation => relation_signature(&self.relation),
            RelationKind::IndexRelation => self.index_relation.iter().join(","),
        }
    }

    /// Starting configuration for the children of this node.
    pub(crate) fn descend(&self) -> NodeInfo {
        NodeInfo {
            index: 0,
            level: self.level + 1,
            relation: self.relation.clone(),
            index_relation: self.index_relation.clone(),
            children_key: self.children_key.clone(),
            relation_key: self.relation_key.clone(),
            is_level_end: self.is_level_end,
            is_level_end_relation: self.is_level_end_relation.clone(),
            peers: 0,
            children_len: 0,
        }
    }
}

/// Partially specified starting configuration of an injecting traversal.
///
/// Every missing field falls back to its default independently, which lets
/// a caller resume a traversal in the middle of a tree with partial context.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StartInfo {
    pub index: Option<usize>,
    pub level: Option<usize>,
    pub relation: Option<Vec<Value>>,
    pub index_relation: Option<Vec<usize>>,
    pub children_key: Option<String>,
    pub relation_key: Option<RelationKey>,
    pub is_level_end: Option<bool>,
    pub is_level_end_relation: Option<Vec<bool>>,
}

impl StartInfo {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a loosely typed JSON object, keeping only well-typed fields.
    ///
    /// Fields that are absent or of the wrong type are left unset so that
    /// [`StartInfo::resolve`] replaces them with their defaults. Non-objects
    /// yield an empty start.
    pub fn from_value(value: &Value) -> Self {
        let field = |name: &str| value.get(name);
        let non_empty_str = |name: &str| {
            field(name)
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
        };
        Self {
            index: field("index").and_then(as_usize),
            level: field("level").and_then(as_usize),
            relation: field("relation").and_then(Value::as_array).cloned(),
            index_relation: field("indexRelation")
                .and_then(Value::as_array)
                .and_then(|items| items.iter().map(as_usize).collect()),
            children_key: non_empty_str("childrenKey"),
            relation_key: non_empty_str("relationKey").map(RelationKey::from),
            is_level_end: field("isLevelEnd").and_then(Value::as_bool),
            is_level_end_relation: field("isLevelEndRelation")
                .and_then(Value::as_array)
                .and_then(|items| items.iter().map(Value::as_bool).collect()),
        }
    }

    pub fn with_level(mut self, level: usize) -> Self {
        self.level = Some(level);
        self
    }

    pub fn with_relation(mut self, relation: Vec<Value>) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn with_index_relation(mut self, index_relation: Vec<usize>) -> Self {
        self.index_relation = Some(index_relation);
        self
    }

    pub fn with_is_level_end_relation(mut self, flags: Vec<bool>) -> Self {
        self.is_level_end_relation = Some(flags);
        self
    }

    pub fn with_children_key(mut self, key: impl Into<String>) -> Self {
        self.children_key = Some(key.into());
        self
    }

    pub fn with_relation_key(mut self, key: impl Into<RelationKey>) -> Self {
        self.relation_key = Some(key.into());
        self
    }

    /// Apply the defaults to every unset field.
    pub fn resolve(&self) -> NodeInfo {
        NodeInfo {
            index: self.index.unwrap_or(0),
            level: self.level.unwrap_or(1),
            relation: self.relation.clone().unwrap_or_default(),
            index_relation: self.index_relation.clone().unwrap_or_default(),
            children_key: self
                .children_key
                .clone()
                .unwrap_or_else(|| DEFAULT_CHILDREN_KEY.to_string()),
            relation_key: self.relation_key.clone().unwrap_or_default(),
            is_level_end: self.is_level_end.unwrap_or(true),
            is_level_end_relation: self.is_level_end_relation.clone().unwrap_or_default(),
            peers: 0,
            children_len: 0,
        }
    }
}

/// Non-negative whole numbers, including floats such as `2.0`.
fn as_usize(value: &Value) -> Option<usize> {
    if let Some(n) = value.as_u64() {
        return usize::try_from(n).ok();
    }
    value
        .as_f64()
        .filter(|f| *f >= 0.0 && f.fract() == 0.0 && *f <= usize::MAX as f64)
        .map(|f| f as usize)
}

/// Stringify a relation chain the way relation chains are compared.
///
/// Elements are joined with `,`; strings are taken raw, `null` prints empty
/// and nested arrays are flattened. `[0, 0, 1]` and `["0", "0", "1"]`
/// therefore share `"0,0,1"`. Numbers print in their shortest form,
/// integral floats without a fraction, and magnitudes from `1e21` up or
/// below `1e-6` in exponent form (`1e+21`, `1e-7`).
pub fn relation_signature(chain: &[Value]) -> String {
    chain.iter().map(signature_part).join(",")
}

fn signature_part(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
            (Some(i), _, _) => i.to_string(),
            (_, Some(u), _) => u.to_string(),
            (_, _, Some(f)) => format_float(f),
            _ => n.to_string(),
        },
        Value::String(s) => s.clone(),
        Value::Array(items) => relation_signature(items),
        Value::Object(_) => "[object Object]".to_string(),
    }
}

fn format_float(f: f64) -> String {
    if f == 0.0 {
        return "0".to_string();
    }
    let magnitude = f.abs();
    if !(1e-6..1e21).contains(&magnitude) {
        let exp = format!("{:e}", f);
        return match exp.split_once('e') {
            Some((mantissa, power)) if !power.starts_with('-') => {
                format!("{}e+{}", mantissa, power)
            }
            _ => exp,
        };
    }
    f.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn given_empty_start_when_resolving_then_applies_all_defaults() {
        let info = StartInfo::new().resolve();
        assert_eq!(info.index, 0);
        assert_eq!(info.level, 1);
        assert!(info.relation.is_empty());
        assert!(info.index_relation.is_empty());
        assert_eq!(info.children_key, "children");
        assert_eq!(info.relation_key, RelationKey::Index);
        assert!(info.is_level_end);
        assert!(info.is_level_end_relation.is_empty());
    }

    #[test]
    fn given_wrongly_typed_fields_when_reading_start_then_falls_back_per_field() {
        let start = StartInfo::from_value(&json!({
            "index": "3",
            "level": 2,
            "relation": "nope",
            "indexRelation": [0, "x"],
            "childrenKey": "",
            "relationKey": "id",
            "isLevelEnd": 1,
            "isLevelEndRelation": [true]
        }));
        let info = start.resolve();
        assert_eq!(info.index, 0);
        assert_eq!(info.level, 2);
        assert!(info.relation.is_empty());
        assert!(info.index_relation.is_empty());
        assert_eq!(info.children_key, "children");
        assert_eq!(info.relation_key, RelationKey::Field("id".into()));
        assert!(info.is_level_end);
        assert_eq!(info.is_level_end_relation, vec![true]);
    }

    #[rstest]
    #[case(json!({"level": 2.0, "index": 3.0}), 2, 3)]
    #[case(json!({"level": 2.5, "index": -1.0}), 1, 0)]
    #[case(json!({"level": -2, "index": 4}), 1, 4)]
    fn given_numeric_start_fields_when_reading_then_whole_numbers_are_kept(
        #[case] input: Value,
        #[case] level: usize,
        #[case] index: usize,
    ) {
        let info = StartInfo::from_value(&input).resolve();
        assert_eq!(info.level, level);
        assert_eq!(info.index, index);
    }

    #[test]
    fn given_node_info_when_serialized_then_uses_camel_case_and_index_sentinel() {
        let info = NodeInfo::default();
        let value = info.to_value();
        assert_eq!(value["relationKey"], json!("index"));
        assert_eq!(value["childrenKey"], json!("children"));
        assert_eq!(value["isLevelEnd"], json!(true));
        assert_eq!(NodeInfo::from_value(&value), Some(info));
    }

    #[rstest]
    #[case(json!([0, 0, 1]), "0,0,1")]
    #[case(json!(["a", "b"]), "a,b")]
    #[case(json!([1.0, 2.5]), "1,2.5")]
    #[case(json!([null, true]), ",true")]
    #[case(json!([[1, 2], 3]), "1,2,3")]
    #[case(json!([]), "")]
    #[case(json!([1e21, 0.1]), "1e+21,0.1")]
    #[case(json!([1.5e300, -2e21]), "1.5e+300,-2e+21")]
    #[case(json!([1e-7, 0.000001]), "1e-7,0.000001")]
    #[case(json!([1e20, -0.0]), "100000000000000000000,0")]
    fn given_chain_when_stringified_then_matches_join_form(
        #[case] chain: Value,
        #[case] expected: &str,
    ) {
        let items = chain.as_array().cloned().unwrap_or_default();
        assert_eq!(relation_signature(&items), expected);
    }

    #[rstest]
    #[case("relation", RelationKind::Relation)]
    #[case("indexRelation", RelationKind::IndexRelation)]
    fn given_relation_field_name_when_parsing_then_returns_kind(
        #[case] input: &str,
        #[case] expected: RelationKind,
    ) {
        assert_eq!(input.parse::<RelationKind>(), Ok(expected));
        assert_eq!(expected.to_string(), input);
    }

    #[test]
    fn given_unknown_relation_field_when_parsing_then_errors() {
        assert!("children".parse::<RelationKind>().is_err());
    }
}
