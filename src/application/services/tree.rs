//! Tree document service
//!
//! Loads JSON tree documents and runs the traversal engine over them.

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult, IoResultExt, JsonResultExt};
use crate::config::Settings;
use crate::domain::{
    each, parse, relation_to_tree, ReconstructOptions, StartInfo, TreeArena, TreeNode,
};
use crate::infrastructure::traits::FileSystem;

/// Service running tree operations on JSON documents.
pub struct TreeService {
    fs: Arc<dyn FileSystem>,
    settings: Arc<Settings>,
}

impl TreeService {
    /// Create a new tree service.
    pub fn new(fs: Arc<dyn FileSystem>, settings: Arc<Settings>) -> Self {
        Self { fs, settings }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Read and parse a JSON tree document.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self, path: &Path) -> ApplicationResult<Value> {
        if !self.fs.is_file(path) {
            return Err(ApplicationError::InvalidDocument {
                path: path.to_path_buf(),
                message: "file not found".into(),
            });
        }
        let content = self
            .fs
            .read_to_string(path)
            .with_path_context("read tree", path)?;
        serde_json::from_str::<Value>(&content).with_document_context(path)
    }

    /// Write a document as JSON, honoring the `pretty` setting.
    #[instrument(level = "debug", skip(self, doc))]
    pub fn save(&self, path: &Path, doc: &Value) -> ApplicationResult<()> {
        let content = self.to_json(doc)?;
        self.fs
            .ensure_parent(path)
            .with_path_context("create parent of", path)?;
        self.fs
            .write(path, &content)
            .with_path_context("write tree", path)
    }

    pub fn to_json(&self, doc: &Value) -> ApplicationResult<String> {
        let rendered = if self.settings.pretty {
            serde_json::to_string_pretty(doc)
        } else {
            serde_json::to_string(doc)
        };
        rendered.map_err(|e| ApplicationError::OperationFailed {
            context: "serialize tree".into(),
            source: Box::new(e),
        })
    }

    /// Visited nodes in pre-order, each without its children.
    pub fn walk(&self, doc: &Value) -> ApplicationResult<Vec<Value>> {
        let key = self.settings.children_key.as_str();
        let mut visited = Vec::new();
        parse(doc, key, |node: &Value, _| visited.push(node.detached(key)))?;
        debug!("walk: visited {} nodes", visited.len());
        Ok(visited)
    }

    /// Inject node metadata into the whole document.
    ///
    /// `start` fields left unset fall back to the configured keys, then to
    /// the engine defaults.
    pub fn annotate(&self, doc: &mut Value, start: &StartInfo) -> ApplicationResult<usize> {
        let start = self.with_configured_keys(start);
        let mut visited = 0;
        each(doc, Some(&start), |_: &mut Value, _| visited += 1)?;
        debug!("annotate: {} nodes", visited);
        Ok(visited)
    }

    /// Rebuild the single branch addressed by `chain`.
    pub fn reconstruct(
        &self,
        doc: &mut Value,
        chain: &[Value],
        options: &ReconstructOptions,
    ) -> ApplicationResult<Value> {
        let start = self.with_configured_keys(&options.start.clone().unwrap_or_default());
        let options = options.clone().start(start);
        let branch = relation_to_tree(doc, chain, &options)?;
        Ok(branch)
    }

    /// Text rendering of the document, one line per node.
    ///
    /// Labels come from `label_key`; nodes without it print as compact JSON.
    pub fn render(&self, doc: &Value, label_key: &str) -> ApplicationResult<String> {
        let tree = TreeArena::from_value(doc, &self.settings.children_key)?;
        let rendered = tree.to_tree_string(|data| node_label(data, label_key));
        Ok(rendered.to_string())
    }

    fn with_configured_keys(&self, start: &StartInfo) -> StartInfo {
        let configured = self.settings.start_info();
        StartInfo {
            children_key: start.children_key.clone().or(configured.children_key),
            relation_key: start.relation_key.clone().or(configured.relation_key),
            ..start.clone()
        }
    }
}

fn node_label(data: &Value, label_key: &str) -> String {
    match data.get(label_key) {
        Some(Value::String(label)) => label.clone(),
        Some(other) => other.to_string(),
        None => data.to_string(),
    }
}

/// Parse a relation chain given on the command line.
///
/// Accepts a JSON array (`[0, 0, 1]`, `["a", "b"]`) or a comma separated
/// list (`0,0,1`) whose items are read as JSON scalars, falling back to
/// plain strings.
pub fn parse_relation_chain(text: &str) -> ApplicationResult<Vec<Value>> {
    let text = text.trim();
    if text.starts_with('[') {
        return match serde_json::from_str::<Value>(text) {
            Ok(Value::Array(items)) if !items.is_empty() => Ok(items),
            Ok(_) => Err(ApplicationError::InvalidRelation(
                "expected a non-empty array".into(),
            )),
            Err(e) => Err(ApplicationError::InvalidRelation(e.to_string())),
        };
    }
    if text.is_empty() {
        return Err(ApplicationError::InvalidRelation("chain is empty".into()));
    }
    Ok(text
        .split(',')
        .map(str::trim)
        .map(|item| {
            serde_json::from_str::<Value>(item)
                .ok()
                .filter(|v| !v.is_array() && !v.is_object())
                .unwrap_or_else(|| Value::String(item.to_string()))
        })
        .collect())
}
