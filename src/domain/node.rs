//! Node model: the capability a value needs to take part in a traversal,
//! and forest normalization of traversal roots.

use serde_json::{Map, Value};

use crate::domain::info::{NodeInfo, NODE_INFO_FIELD};

/// Capability-based tree node.
///
/// A node only has to expose its children (under a configurable field name),
/// the value used for relation chains, and a slot for its [`NodeInfo`].
/// Typed nodes are free to ignore the key arguments.
pub trait TreeNode: Sized {
    /// Child nodes stored under `key`, `None` when there is no such field.
    fn children(&self, key: &str) -> Option<&[Self]>;

    fn children_mut(&mut self, key: &str) -> Option<&mut [Self]>;

    /// Value of the field `key`, `Value::Null` when missing.
    fn relation_value(&self, key: &str) -> Value;

    fn node_info(&self) -> Option<NodeInfo>;

    /// Attach `info`, replacing whatever was attached before.
    fn set_node_info(&mut self, info: NodeInfo);

    fn remove_node_info(&mut self);

    /// Copy of the node's own fields, without the children stored under `children_key`.
    fn detached(&self, children_key: &str) -> Self;

    fn set_children(&mut self, key: &str, children: Vec<Self>);

    /// Number of direct children, 0 for leaves.
    fn children_len(&self, key: &str) -> usize {
        self.children(key).map_or(0, <[Self]>::len)
    }
}

/// JSON objects are nodes; their children live in an array field and their
/// metadata under `"nodeInfo"`. Scalars behave as leaves without a metadata slot.
impl TreeNode for Value {
    fn children(&self, key: &str) -> Option<&[Self]> {
        self.get(key)?.as_array().map(Vec::as_slice)
    }

    fn children_mut(&mut self, key: &str) -> Option<&mut [Self]> {
        self.get_mut(key)?.as_array_mut().map(Vec::as_mut_slice)
    }

    fn relation_value(&self, key: &str) -> Value {
        self.get(key).cloned().unwrap_or(Value::Null)
    }

    fn node_info(&self) -> Option<NodeInfo> {
        self.get(NODE_INFO_FIELD).and_then(NodeInfo::from_value)
    }

    fn set_node_info(&mut self, info: NodeInfo) {
        if let Some(map) = self.as_object_mut() {
            map.insert(NODE_INFO_FIELD.to_string(), info.to_value());
        }
    }

    fn remove_node_info(&mut self) {
        if let Some(map) = self.as_object_mut() {
            map.remove(NODE_INFO_FIELD);
        }
    }

    fn detached(&self, children_key: &str) -> Self {
        match self {
            Value::Object(map) => Value::Object(
                map.iter()
                    .filter(|(k, _)| k.as_str() != children_key)
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect::<Map<String, Value>>(),
            ),
            other => other.clone(),
        }
    }

    fn set_children(&mut self, key: &str, children: Vec<Self>) {
        if let Some(map) = self.as_object_mut() {
            map.insert(key.to_string(), Value::Array(children));
        }
    }
}

/// A traversal root: a single node or an ordered list of sibling nodes.
///
/// `None` from the accessors means the root is absent.
pub trait Forest<N> {
    fn roots(&self) -> Option<&[N]>;

    fn roots_mut(&mut self) -> Option<&mut [N]>;
}

impl<N: TreeNode> Forest<N> for [N] {
    fn roots(&self) -> Option<&[N]> {
        Some(self)
    }

    fn roots_mut(&mut self) -> Option<&mut [N]> {
        Some(self)
    }
}

impl<N: TreeNode> Forest<N> for Vec<N> {
    fn roots(&self) -> Option<&[N]> {
        Some(self.as_slice())
    }

    fn roots_mut(&mut self) -> Option<&mut [N]> {
        Some(self.as_mut_slice())
    }
}

impl<N: TreeNode, F: Forest<N>> Forest<N> for Option<F> {
    fn roots(&self) -> Option<&[N]> {
        self.as_ref().and_then(Forest::roots)
    }

    fn roots_mut(&mut self) -> Option<&mut [N]> {
        self.as_mut().and_then(Forest::roots_mut)
    }
}

/// An array is a list of roots, `null` is an absent root, anything else is a
/// single root node.
impl Forest<Value> for Value {
    fn roots(&self) -> Option<&[Value]> {
        match self {
            Value::Null => None,
            Value::Array(items) => Some(items.as_slice()),
            single => Some(std::slice::from_ref(single)),
        }
    }

    fn roots_mut(&mut self) -> Option<&mut [Value]> {
        match self {
            Value::Null => None,
            Value::Array(items) => Some(items.as_mut_slice()),
            single => Some(std::slice::from_mut(single)),
        }
    }
}
