//! JSON tree descriptions
//!
//! A string is a text node. An object is an element with a required `tag`,
//! optional `attributes` and optional `children` (an array, or a single
//! string/number). Numbers in child position become text; `null` and
//! booleans are dropped.

use arbor_engine::{h, PropMap, VNode, Value};
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum TreeJsonError {
    #[error("{path}: element is missing a string \"tag\"")]
    MissingTag { path: String },

    #[error("{path}: \"attributes\" must be an object")]
    InvalidAttributes { path: String },

    #[error("{path}: expected a string or an element object, found {found}")]
    InvalidNode { path: String, found: &'static str },

    #[error("{path}: the root must be a single node")]
    EmptyRoot { path: String },
}

fn kind_of(json: &serde_json::Value) -> &'static str {
    match json {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

/// Read and convert the tree stored at `path`
pub fn load_tree(path: &Path) -> anyhow::Result<VNode> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("Cannot read {}: {}", path.display(), e))?;
    let json: serde_json::Value = serde_json::from_str(&content)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path.display(), e))?;
    Ok(parse_tree(&json)?)
}

pub fn parse_tree(json: &serde_json::Value) -> Result<VNode, TreeJsonError> {
    parse_node(json, "root")?.ok_or_else(|| TreeJsonError::EmptyRoot {
        path: "root".to_string(),
    })
}

fn parse_node(json: &serde_json::Value, path: &str) -> Result<Option<VNode>, TreeJsonError> {
    match json {
        serde_json::Value::String(text) => Ok(Some(VNode::text(text.clone()))),
        serde_json::Value::Number(n) => Ok(Some(VNode::text(
            Value::Number(n.as_f64().unwrap_or(0.0)).to_text().unwrap_or_default(),
        ))),
        serde_json::Value::Null | serde_json::Value::Bool(_) => Ok(None),
        serde_json::Value::Object(object) => {
            let tag = object
                .get("tag")
                .and_then(serde_json::Value::as_str)
                .ok_or_else(|| TreeJsonError::MissingTag {
                    path: path.to_string(),
                })?;

            let attributes = match object.get("attributes") {
                None | Some(serde_json::Value::Null) => PropMap::new(),
                Some(serde_json::Value::Object(map)) => map
                    .iter()
                    .map(|(name, value)| (name.clone(), Value::from(value.clone())))
                    .collect(),
                Some(_) => {
                    return Err(TreeJsonError::InvalidAttributes {
                        path: path.to_string(),
                    })
                }
            };

            let children = match object.get("children") {
                None | Some(serde_json::Value::Null) => Vec::new(),
                Some(serde_json::Value::Array(items)) => {
                    let mut children = Vec::with_capacity(items.len());
                    for (index, item) in items.iter().enumerate() {
                        let child_path = format!("{}.children[{}]", path, index);
                        children.extend(parse_node(item, &child_path)?);
                    }
                    children
                }
                Some(single) => parse_node(single, &format!("{}.children", path))?
                    .into_iter()
                    .collect(),
            };

            Ok(Some(h(tag, attributes, children)))
        }
        serde_json::Value::Array(_) => Err(TreeJsonError::InvalidNode {
            path: path.to_string(),
            found: kind_of(json),
        }),
    }
}
