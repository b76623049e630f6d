//! Layered configuration and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g. `APP_BATCHING__CAPACITY`).
//! Provides helpers to expand `~` and `${VAR}` and to resolve relative paths
//! against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::batcher::BatchSettings;
use crate::bm25f::Bm25Params;
use crate::error::{Error, Result};
use crate::selector::SelectionSettings;
use crate::types::WeightScheme;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> anyhow::Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.validate_for_env(env_name)?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self {
        Self { figment }
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        if let "prod" | "production" = env {
            // Production runs must not silently fall back to the sample corpus.
            let corpus: String = self.get("data.corpus")?;
            if corpus == DataSettings::default().corpus {
                return Err(Error::InvalidConfig(format!("data.corpus is still the sample path '{corpus}' in production")).into());
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSettings {
    pub syllabus: String,
    pub template: String,
    pub corpus: String,
    pub output_dir: String,
    pub manifest: String,
}

impl Default for DataSettings {
    fn default() -> Self {
        Self {
            syllabus: "res/syllabus.json".to_string(),
            template: "res/hit.html".to_string(),
            corpus: "res/corpus.json".to_string(),
            output_dir: "hits".to_string(),
            manifest: "hits/batches.input".to_string(),
        }
    }
}

/// Paths from `DataSettings`, expanded and resolved against a base directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataPaths {
    pub syllabus: PathBuf,
    pub template: PathBuf,
    pub corpus: PathBuf,
    pub output_dir: PathBuf,
    pub manifest: PathBuf,
}

impl DataSettings {
    pub fn resolve(&self, base: &Path) -> DataPaths {
        DataPaths {
            syllabus: resolve_with_base(base, &self.syllabus),
            template: resolve_with_base(base, &self.template),
            corpus: resolve_with_base(base, &self.corpus),
            output_dir: resolve_with_base(base, &self.output_dir),
            manifest: resolve_with_base(base, &self.manifest),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScorerBackend {
    Bm25f,
    Tantivy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoringSettings {
    pub backend: ScorerBackend,
    pub k1: f64,
    pub title_b: f64,
    pub body_b: f64,
    pub answer_b: f64,
    /// Where the tantivy backend persists its index; in memory when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index_dir: Option<String>,
}

impl ScoringSettings {
    pub fn params(&self) -> Bm25Params {
        Bm25Params { k1: self.k1, title_b: self.title_b, body_b: self.body_b, answer_b: self.answer_b }
    }
}

impl Default for ScoringSettings {
    fn default() -> Self {
        let p = Bm25Params::default();
        Self { backend: ScorerBackend::Bm25f, k1: p.k1, title_b: p.title_b, body_b: p.body_b, answer_b: p.answer_b, index_dir: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VendorSettings {
    pub budget: f64,
}

impl Default for VendorSettings {
    fn default() -> Self {
        Self { budget: 10.0 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub data: DataSettings,
    pub selection: SelectionSettings,
    pub batching: BatchSettings,
    pub scoring: ScoringSettings,
    pub weight_schemes: Vec<WeightScheme>,
    pub vendor: VendorSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data: DataSettings::default(),
            selection: SelectionSettings::default(),
            batching: BatchSettings::default(),
            scoring: ScoringSettings::default(),
            weight_schemes: vec![
                WeightScheme::new(0.6, 0.3, 0.1).named("title-body-answer"),
                WeightScheme::new(1.0, 0.0, 0.0).named("title-only"),
            ],
            vendor: VendorSettings::default(),
        }
    }
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.batching.capacity == 0 {
            return Err(Error::InvalidConfig("batching.capacity must be at least 1".into()));
        }
        if self.selection.per_topic == 0 {
            return Err(Error::InvalidConfig("selection.per_topic must be at least 1".into()));
        }
        if self.weight_schemes.is_empty() {
            return Err(Error::InvalidConfig("at least one weight scheme is required".into()));
        }
        if let Some(bad) = self.weight_schemes.iter().find(|w| !w.is_valid()) {
            return Err(Error::InvalidConfig(format!("weight scheme '{}' has a negative or non-finite weight", bad.label())));
        }
        let s = &self.scoring;
        if !(s.k1.is_finite() && s.k1 >= 0.0) {
            return Err(Error::InvalidConfig(format!("scoring.k1 must be >= 0, got {}", s.k1)));
        }
        for (name, b) in [("title_b", s.title_b), ("body_b", s.body_b), ("answer_b", s.answer_b)] {
            if !(0.0..=1.0).contains(&b) {
                return Err(Error::InvalidConfig(format!("scoring.{name} must be within [0, 1], got {b}")));
            }
        }
        Ok(())
    }

    /// Configured schemes, or only those whose label is in `labels` (config order kept).
    pub fn schemes_named(&self, labels: &[String]) -> Result<Vec<WeightScheme>> {
        if labels.is_empty() {
            return Ok(self.weight_schemes.clone());
        }
        if let Some(missing) = labels.iter().find(|l| !self.weight_schemes.iter().any(|w| &w.label() == *l)) {
            return Err(Error::NotFound(format!("weight scheme '{missing}'")));
        }
        Ok(self.weight_schemes.iter().filter(|w| labels.contains(&w.label())).cloned().collect())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    // Expand env vars first
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    // Expand ~ at start
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_from(toml: &str) -> Config {
        Config::from_figment(Figment::from(Serialized::defaults(Settings::default())).merge(Toml::string(toml)))
    }

    #[test]
    fn test_config_defaults() {
        let settings = Settings::default();
        assert!(settings.validate().is_ok());
        assert_eq!(settings.selection.per_topic, 5);
        assert_eq!(settings.selection.over_fetch, 40);
        assert_eq!(settings.batching.capacity, 52);
        assert_eq!(settings.weight_schemes.len(), 2);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let settings = config_from(
            r#"
            [selection]
            per_topic = 2
            [batching]
            capacity = 3
            [scoring]
            backend = "tantivy"
            [[weight_schemes]]
            title = 0.0
            body = 1.0
            answer = 0.0
            "#,
        )
        .settings()
        .expect("settings");
        assert_eq!(settings.selection.per_topic, 2);
        assert_eq!(settings.selection.over_fetch, 40, "untouched keys keep defaults");
        assert_eq!(settings.batching.capacity, 3);
        assert_eq!(settings.batching.artifact_prefix, "hit");
        assert_eq!(settings.scoring.backend, ScorerBackend::Tantivy);
        assert_eq!(settings.weight_schemes, vec![WeightScheme::new(0.0, 1.0, 0.0)]);
    }

    #[test]
    fn test_get_sub_tree() {
        let config = config_from("[batching]\ncapacity = 9\n");
        let capacity: usize = config.get("batching.capacity").expect("capacity");
        assert_eq!(capacity, 9);
        assert!(config.get::<usize>("batching.missing").is_err());
    }

    #[test]
    fn test_validation_logic() {
        let mut settings = Settings::default();
        settings.batching.capacity = 0;
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.weight_schemes = vec![WeightScheme::new(-1.0, 0.0, 0.0)];
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.weight_schemes.clear();
        assert!(settings.validate().is_err());

        let mut settings = Settings::default();
        settings.scoring.body_b = 1.5;
        assert!(settings.validate().is_err());
    }

    #[test]
    fn test_invalid_toml_fails_settings() {
        assert!(config_from("[batching]\ncapacity = 0\n").settings().is_err());
    }

    #[test]
    fn test_schemes_named_keeps_config_order() {
        let settings = Settings::default();
        let picked = settings
            .schemes_named(&["title-only".to_string(), "title-body-answer".to_string()])
            .expect("schemes");
        let labels: Vec<String> = picked.iter().map(WeightScheme::label).collect();
        assert_eq!(labels, vec!["title-body-answer", "title-only"]);
        assert!(settings.schemes_named(&["nope".to_string()]).is_err());
        assert_eq!(settings.schemes_named(&[]).expect("all schemes"), settings.weight_schemes);
    }

    #[test]
    fn test_resolve_paths() {
        let paths = DataSettings::default().resolve(Path::new("/srv/syllabus"));
        assert_eq!(paths.syllabus, PathBuf::from("/srv/syllabus/res/syllabus.json"));
        assert_eq!(resolve_with_base(Path::new("/srv"), "/abs/corpus.json"), PathBuf::from("/abs/corpus.json"));
    }
}
