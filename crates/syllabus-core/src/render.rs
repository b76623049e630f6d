//! Artifact rendering and sinks.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::error::{Error, Result};
use crate::traits::{ArtifactSink, TemplateRenderer};

/// Replaces every `$key$` occurrence with the payload value for `key`.
/// Placeholders without a payload entry are left untouched. The template is
/// scanned once, so inserted values are never substituted again.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaceholderRenderer;

impl TemplateRenderer for PlaceholderRenderer {
    fn render(&self, template: &str, payload: &BTreeMap<String, String>) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(start) = rest.find('$') {
            out.push_str(&rest[..start]);
            let after = &rest[start + 1..];
            match after.find('$').and_then(|end| payload.get(&after[..end]).map(|v| (end, v))) {
                Some((end, value)) => {
                    out.push_str(value);
                    rest = &after[end + 1..];
                }
                None => {
                    out.push('$');
                    rest = after;
                }
            }
        }
        out.push_str(rest);
        out
    }
}

pub fn read_template(path: &Path) -> Result<String> {
    fs::read_to_string(path).map_err(|e| Error::io(path, e))
}

/// Writes each artifact as a file in one directory.
#[derive(Debug)]
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| Error::io(&dir, e))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

impl ArtifactSink for DirectorySink {
    fn emit(&mut self, name: &str, content: &str) -> anyhow::Result<()> {
        let path = self.dir.join(name);
        fs::write(&path, content).with_context(|| format!("writing artifact {}", path.display()))
    }
}

/// Keeps artifacts in memory, in emission order.
#[derive(Debug, Default, Clone)]
pub struct MemorySink {
    pub artifacts: Vec<(String, String)>,
}

impl MemorySink {
    pub fn new() -> Self { Self::default() }

    pub fn names(&self) -> Vec<&str> {
        self.artifacts.iter().map(|(n, _)| n.as_str()).collect()
    }
}

impl ArtifactSink for MemorySink {
    fn emit(&mut self, name: &str, content: &str) -> anyhow::Result<()> {
        self.artifacts.push((name.to_string(), content.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::batcher::{BatchEmitter, BatchSettings};
    use crate::types::{Batch, Document, WeightScheme};

    #[test]
    fn replaces_known_placeholders_only() {
        let mut payload = BTreeMap::new();
        payload.insert("posts".to_string(), "[1,2]".to_string());
        let out = PlaceholderRenderer.render("var p = $posts$; var s = $syllabus$;", &payload);
        assert_eq!(out, "var p = [1,2]; var s = $syllabus$;");
    }

    #[test]
    fn replaces_every_occurrence() {
        let mut payload = BTreeMap::new();
        payload.insert("batch_id".to_string(), "7".to_string());
        assert_eq!(PlaceholderRenderer.render("$batch_id$-$batch_id$", &payload), "7-7");
    }

    #[test]
    fn inserted_values_are_not_rescanned() {
        let mut payload = BTreeMap::new();
        payload.insert("posts".to_string(), r#"[{"body":"echo $syllabus$ and $weight_scheme$"}]"#.to_string());
        payload.insert("syllabus".to_string(), r#"[{"name":"S"}]"#.to_string());
        payload.insert("weight_scheme".to_string(), "title-only".to_string());
        let out = PlaceholderRenderer.render("P=$posts$;S=$syllabus$;W=$weight_scheme$", &payload);
        assert_eq!(out, r#"P=[{"body":"echo $syllabus$ and $weight_scheme$"}];S=[{"name":"S"}];W=title-only"#);
    }

    #[test]
    fn emitted_posts_keep_placeholder_text_in_bodies() {
        let settings = BatchSettings::default();
        let emitter = BatchEmitter::new(&PlaceholderRenderer, "P=$posts$", r#"[{"name":"S"}]"#, &settings);
        let batch = Batch { id: 0, documents: vec![Document::new(1, "t", "echo $syllabus$ and $weight_scheme$")] };
        let mut sink = MemorySink::new();
        emitter.emit(&batch, &WeightScheme::new(1.0, 0.0, 0.0).named("title-only"), &mut sink).expect("emit");

        let json = sink.artifacts[0].1.strip_prefix("P=").expect("prefix");
        let docs: Vec<Document> = serde_json::from_str(json).expect("posts stay valid JSON");
        assert_eq!(docs[0].body, "echo $syllabus$ and $weight_scheme$");
    }

    #[test]
    fn lone_dollar_signs_pass_through() {
        let mut payload = BTreeMap::new();
        payload.insert("batch_id".to_string(), "3".to_string());
        assert_eq!(PlaceholderRenderer.render("costs $5, batch $batch_id$ $", &payload), "costs $5, batch 3 $");
    }

    #[test]
    fn directory_sink_writes_files() {
        let tmp = tempfile::tempdir().expect("tmp");
        let mut sink = DirectorySink::create(tmp.path().join("hits")).expect("sink");
        sink.emit("hit0.html", "<html/>").expect("emit");
        let written = fs::read_to_string(sink.dir().join("hit0.html")).expect("read");
        assert_eq!(written, "<html/>");
    }
}
