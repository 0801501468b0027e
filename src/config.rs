use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RankfuseError, Result};
use crate::expansion::ExpansionMethod;
use crate::fusion::{FusionMethod, FusionParams};
use crate::topics::TopicFormat;

pub const PROJECT_CONFIG_FILE: &str = "rankfuse.toml";

/// Environment lookup; swapped out in tests.
pub type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub fusion: FusionConfig,
    #[serde(default)]
    pub expansion: ExpansionConfig,
    #[serde(default)]
    pub topics: TopicsConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    /// Defaults, then the global and project files (or only `explicit_path`
    /// / `RANKFUSE_CONFIG` when given), then `RANKFUSE_*` overrides.
    pub fn load(explicit_path: Option<&Path>, project_root: &Path) -> Result<Self> {
        Self::load_with_env(explicit_path, project_root, &|key: &str| std::env::var(key).ok())
    }

    pub fn load_with_env(
        explicit_path: Option<&Path>,
        project_root: &Path,
        env: EnvLookup<'_>,
    ) -> Result<Self> {
        let mut config = Self::default();

        let explicit = explicit_path
            .map(PathBuf::from)
            .or_else(|| env("RANKFUSE_CONFIG").map(PathBuf::from));

        if let Some(path) = explicit {
            if !path.exists() {
                return Err(RankfuseError::NotFound {
                    kind: "config file",
                    path,
                });
            }
            if let Some(patch) = Self::load_patch(&path)? {
                config.merge_patch(patch);
            }
        } else {
            if let Some(global) = Self::load_global()? {
                config.merge_patch(global);
            }
            if let Some(project) = Self::load_patch(&project_root.join(PROJECT_CONFIG_FILE))? {
                config.merge_patch(project);
            }
        }

        config.apply_env_overrides(env)?;
        config.validate()?;

        Ok(config)
    }

    /// Global config path, if the platform has a config directory.
    pub fn global_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("rankfuse/config.toml"))
    }

    fn load_global() -> Result<Option<ConfigPatch>> {
        match Self::global_path() {
            Some(path) => Self::load_patch(&path),
            None => Ok(None),
        }
    }

    fn load_patch(path: &Path) -> Result<Option<ConfigPatch>> {
        if !path.exists() {
            return Ok(None);
        }

        let raw = std::fs::read_to_string(path)
            .map_err(|err| RankfuseError::Config(format!("read config {}: {err}", path.display())))?;
        let is_yaml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml"));
        let patch = if is_yaml {
            serde_yaml::from_str(&raw)
                .map_err(|err| RankfuseError::Config(format!("parse config {}: {err}", path.display())))?
        } else {
            toml::from_str(&raw)
                .map_err(|err| RankfuseError::Config(format!("parse config {}: {err}", path.display())))?
        };
        tracing::debug!(path = %path.display(), "loaded config file");
        Ok(Some(patch))
    }

    fn merge_patch(&mut self, patch: ConfigPatch) {
        if let Some(patch) = patch.fusion {
            self.fusion.merge(patch);
        }
        if let Some(patch) = patch.expansion {
            self.expansion.merge(patch);
        }
        if let Some(patch) = patch.topics {
            self.topics.merge(patch);
        }
        if let Some(patch) = patch.output {
            self.output.merge(patch);
        }
    }

    fn apply_env_overrides(&mut self, env: EnvLookup<'_>) -> Result<()> {
        if let Some(value) = env_string(env, "RANKFUSE_FUSION_METHOD") {
            self.fusion.method = value;
        }
        if let Some(value) = env_parse(env, "RANKFUSE_RRF_K")? {
            self.fusion.rrf_k = value;
        }
        if let Some(value) = env_parse(env, "RANKFUSE_ALPHA")? {
            self.fusion.alpha = value;
        }
        if let Some(values) = env_list(env, "RANKFUSE_WEIGHTS") {
            self.fusion.weights = values
                .iter()
                .map(|value| parse_value("RANKFUSE_WEIGHTS", value))
                .collect::<Result<Vec<f64>>>()?;
        }
        if let Some(value) = env_parse(env, "RANKFUSE_TOP_K")? {
            self.fusion.top_k = value;
        }

        if let Some(value) = env_string(env, "RANKFUSE_EXPANSION_METHOD") {
            self.expansion.method = value;
        }
        if let Some(value) = env_parse(env, "RANKFUSE_FB_DOCS")? {
            self.expansion.fb_docs = value;
        }
        if let Some(value) = env_parse(env, "RANKFUSE_FB_TERMS")? {
            self.expansion.fb_terms = value;
        }
        if let Some(value) = env_parse(env, "RANKFUSE_ORIGINAL_QUERY_WEIGHT")? {
            self.expansion.original_query_weight = value;
        }
        if let Some(value) = env_string(env, "RANKFUSE_LANGUAGE") {
            self.expansion.language = value;
        }

        if let Some(value) = env_bool(env, "RANKFUSE_USE_DESC") {
            self.topics.use_desc = value;
        }
        if let Some(value) = env_bool(env, "RANKFUSE_USE_NARR") {
            self.topics.use_narr = value;
        }

        if let Some(value) = env_string(env, "RANKFUSE_RUNS_DIR") {
            self.output.runs_dir = PathBuf::from(value);
        }
        if let Some(value) = env_string(env, "RANKFUSE_TOPIC_FORMAT") {
            self.output.topic_format = value;
        }

        Ok(())
    }

    /// Reject values no command could use, naming the key and value.
    pub fn validate(&self) -> Result<()> {
        let fusion = &self.fusion;
        if !FusionMethod::NAMES.contains(&fusion.method.to_lowercase().as_str()) {
            return Err(invalid("fusion.method", &fusion.method, &FusionMethod::NAMES.join("|")));
        }
        if !fusion.rrf_k.is_finite() || fusion.rrf_k < 0.0 {
            return Err(invalid("fusion.rrf_k", fusion.rrf_k, "a non-negative number"));
        }
        if !(0.0..=1.0).contains(&fusion.alpha) {
            return Err(invalid("fusion.alpha", fusion.alpha, "a value in [0, 1]"));
        }
        if fusion.top_k == 0 {
            return Err(invalid("fusion.top_k", fusion.top_k, "at least 1"));
        }

        let expansion = &self.expansion;
        if ExpansionMethod::from_str(&expansion.method).is_err() {
            return Err(invalid(
                "expansion.method",
                &expansion.method,
                &ExpansionMethod::NAMES.join("|"),
            ));
        }
        if !(0.0..=1.0).contains(&expansion.original_query_weight) {
            return Err(invalid(
                "expansion.original_query_weight",
                expansion.original_query_weight,
                "a value in [0, 1]",
            ));
        }

        if TopicFormat::from_str(&self.output.topic_format).is_err() {
            return Err(invalid("output.topic_format", &self.output.topic_format, "simple|xml"));
        }
        Ok(())
    }

    /// Fusion knobs; an empty weight list means uniform weights.
    pub fn fusion_params(&self) -> FusionParams {
        FusionParams {
            rrf_k: self.fusion.rrf_k,
            alpha: self.fusion.alpha,
            weights: (!self.fusion.weights.is_empty()).then(|| self.fusion.weights.clone()),
        }
    }

    pub fn fusion_method(&self) -> Result<FusionMethod> {
        FusionMethod::from_name(&self.fusion.method, &self.fusion_params())
    }

    pub fn expansion_method(&self) -> Result<ExpansionMethod> {
        self.expansion.method.parse()
    }

    pub fn topic_format(&self) -> Result<TopicFormat> {
        self.output.topic_format.parse()
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|err| RankfuseError::Serialization(err.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusionConfig {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub rrf_k: f64,
    #[serde(default)]
    pub alpha: f64,
    /// Linear weights, one per run. Empty means `1/N` each.
    #[serde(default)]
    pub weights: Vec<f64>,
    /// Results kept per query when writing a run.
    #[serde(default)]
    pub top_k: usize,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            method: "rrf".to_string(),
            rrf_k: crate::fusion::DEFAULT_RRF_K,
            alpha: crate::fusion::DEFAULT_ALPHA,
            weights: Vec::new(),
            top_k: 1000,
        }
    }
}

impl FusionConfig {
    fn merge(&mut self, patch: FusionPatch) {
        if let Some(value) = patch.method {
            self.method = value;
        }
        if let Some(value) = patch.rrf_k {
            self.rrf_k = value;
        }
        if let Some(value) = patch.alpha {
            self.alpha = value;
        }
        if let Some(value) = patch.weights {
            self.weights = value;
        }
        if let Some(value) = patch.top_k {
            self.top_k = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpansionConfig {
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub fb_docs: usize,
    #[serde(default)]
    pub fb_terms: usize,
    #[serde(default)]
    pub original_query_weight: f64,
    /// Analyzer language; also selects `<corpus>/<language>/` directories.
    #[serde(default)]
    pub language: String,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            method: "rm3".to_string(),
            fb_docs: crate::expansion::DEFAULT_FB_DOCS,
            fb_terms: crate::expansion::DEFAULT_FB_TERMS,
            original_query_weight: crate::expansion::DEFAULT_ORIGINAL_QUERY_WEIGHT,
            language: "en".to_string(),
        }
    }
}

impl ExpansionConfig {
    fn merge(&mut self, patch: ExpansionPatch) {
        if let Some(value) = patch.method {
            self.method = value;
        }
        if let Some(value) = patch.fb_docs {
            self.fb_docs = value;
        }
        if let Some(value) = patch.fb_terms {
            self.fb_terms = value;
        }
        if let Some(value) = patch.original_query_weight {
            self.original_query_weight = value;
        }
        if let Some(value) = patch.language {
            self.language = value;
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TopicsConfig {
    #[serde(default)]
    pub use_desc: bool,
    #[serde(default)]
    pub use_narr: bool,
}

impl TopicsConfig {
    fn merge(&mut self, patch: TopicsPatch) {
        if let Some(value) = patch.use_desc {
            self.use_desc = value;
        }
        if let Some(value) = patch.use_narr {
            self.use_narr = value;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where fused runs land when no `--output` is given.
    #[serde(default)]
    pub runs_dir: PathBuf,
    #[serde(default)]
    pub topic_format: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            runs_dir: PathBuf::from("runs"),
            topic_format: "simple".to_string(),
        }
    }
}

impl OutputConfig {
    fn merge(&mut self, patch: OutputPatch) {
        if let Some(value) = patch.runs_dir {
            self.runs_dir = value;
        }
        if let Some(value) = patch.topic_format {
            self.topic_format = value;
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigPatch {
    pub fusion: Option<FusionPatch>,
    pub expansion: Option<ExpansionPatch>,
    pub topics: Option<TopicsPatch>,
    pub output: Option<OutputPatch>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FusionPatch {
    pub method: Option<String>,
    pub rrf_k: Option<f64>,
    pub alpha: Option<f64>,
    pub weights: Option<Vec<f64>>,
    pub top_k: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ExpansionPatch {
    pub method: Option<String>,
    pub fb_docs: Option<usize>,
    pub fb_terms: Option<usize>,
    pub original_query_weight: Option<f64>,
    pub language: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TopicsPatch {
    pub use_desc: Option<bool>,
    pub use_narr: Option<bool>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct OutputPatch {
    pub runs_dir: Option<PathBuf>,
    pub topic_format: Option<String>,
}

fn invalid(key: &str, value: impl std::fmt::Display, expected: &str) -> RankfuseError {
    RankfuseError::Config(format!("invalid {key} value {value} (expected {expected})"))
}

fn parse_value<T>(key: &str, value: &str) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|err| RankfuseError::Config(format!("invalid {key} value {value}: {err}")))
}

fn env_string(env: EnvLookup<'_>, key: &str) -> Option<String> {
    env(key)
}

fn env_bool(env: EnvLookup<'_>, key: &str) -> Option<bool> {
    env(key).map(|value| {
        matches!(
            value.to_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        )
    })
}

fn env_parse<T>(env: EnvLookup<'_>, key: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env(key) {
        Some(value) => parse_value(key, &value).map(Some),
        None => Ok(None),
    }
}

fn env_list(env: EnvLookup<'_>, key: &str) -> Option<Vec<String>> {
    env(key).map(|value| {
        value
            .split(',')
            .map(str::trim)
            .filter(|entry| !entry.is_empty())
            .map(str::to_string)
            .collect()
    })
}
