//! Domain layer: the tree engine
//!
//! This layer is independent of external concerns (no I/O, no CLI, no config loading).

pub mod arena;
pub mod error;
pub mod info;
pub mod node;
pub mod reconstruct;
pub mod traverse;

pub use arena::{ArenaNode, TreeArena};
pub use error::{TreeError, TreeResult};
pub use info::{
    relation_signature, NodeInfo, RelationKey, RelationKind, StartInfo, DEFAULT_CHILDREN_KEY,
    INDEX_RELATION_KEY, NODE_INFO_FIELD,
};
pub use node::{Forest, TreeNode};
pub use reconstruct::{relation_to_tree, ReconstructOptions};
pub use traverse::{each, parse, parse_mut, Stop};
