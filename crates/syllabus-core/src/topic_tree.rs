//! Syllabus loading and traversal.

use std::path::Path;

use crate::error::{Error, Result};
use crate::types::{Document, Topic};

/// Parses a syllabus: a JSON array of root topics, or a single root object.
pub fn load_syllabus(json: &str) -> Result<Vec<Topic>> {
    let value: serde_json::Value = serde_json::from_str(json).map_err(|e| Error::json("syllabus", e))?;
    let roots = if value.is_array() {
        serde_json::from_value::<Vec<Topic>>(value)
    } else {
        serde_json::from_value::<Topic>(value).map(|t| vec![t])
    };
    roots.map_err(|e| Error::json("syllabus", e))
}

/// Reads the syllabus file, returning the raw JSON alongside the parsed tree.
/// The raw text is embedded verbatim into every batch artifact.
pub fn read_syllabus(path: &Path) -> Result<(String, Vec<Topic>)> {
    let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let topics = load_syllabus(&json)?;
    Ok((json, topics))
}

/// Leaf topics in depth-first order; inner nodes are never included.
pub fn flatten(tree: &[Topic]) -> Vec<&Topic> {
    let mut leaves = Vec::new();
    collect_leaves(tree, &mut leaves);
    leaves
}

fn collect_leaves<'a>(topics: &'a [Topic], out: &mut Vec<&'a Topic>) {
    for topic in topics {
        if topic.is_leaf() {
            out.push(topic);
        } else {
            collect_leaves(&topic.children, out);
        }
    }
}

/// Page `page` of the posts attached directly to each leaf, `per_topic` per leaf.
pub fn attached_page(leaves: &[&Topic], page: usize, per_topic: usize) -> Vec<Document> {
    let start = page.saturating_mul(per_topic);
    leaves
        .iter()
        .flat_map(|t| t.documents.iter().skip(start).take(per_topic))
        .cloned()
        .collect()
}
