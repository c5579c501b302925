//! Layered configuration and path helpers.
//!
//! Uses Figment to merge `docqa.toml` + `docqa.<env>.toml` + `APP_*` env vars
//! (`__` separates nesting levels, e.g. `APP_CHUNKING__MAX_CHARS=800`).
//! Every field has a default so an empty environment yields a working setup.

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load_for_env(dir: &Path, env_name: &str) -> Result<Self> {
        let mut figment = Figment::new().merge(Toml::file(dir.join("docqa.toml")));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("docqa.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("docqa.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("docqa.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment, env_name: env_name.to_string() })
    }

    pub fn env_name(&self) -> &str { &self.env_name }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::config(format!("Failed to get '{}': {}", key, e)))
    }

    /// Extracts and validates the typed settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self.figment.extract().map_err(|e| Error::config(e.to_string()))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub chunking: ChunkingSettings,
    pub embedding: EmbeddingSettings,
    pub generation: GenerationSettings,
    pub store: StoreSettings,
    pub retrieval: RetrievalSettings,
    pub retry: RetrySettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        if self.chunking.max_chars <= self.chunking.overlap {
            return Err(Error::config(format!(
                "chunking.max_chars ({}) must be greater than chunking.overlap ({})",
                self.chunking.max_chars, self.chunking.overlap
            )));
        }
        if self.retrieval.k == 0 {
            return Err(Error::config("retrieval.k must be at least 1"));
        }
        if self.retry.max_attempts == 0 {
            return Err(Error::config("retry.max_attempts must be at least 1"));
        }
        if self.embedding.dim == 0 {
            return Err(Error::config("embedding.dim must be at least 1"));
        }
        if self.store.collection.trim().is_empty() {
            return Err(Error::config("store.collection must not be empty"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub max_chars: usize,
    pub overlap: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self { Self { max_chars: 1000, overlap: 200 } }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingBackend {
    OpenAi,
    Local,
    Fake,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingBackend,
    pub model: String,
    pub api_base: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub timeout_secs: u64,
    /// Vector width used by the fake provider and for new collections.
    pub dim: usize,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingBackend::OpenAi,
            model: "text-embedding-3-large".to_string(),
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            dim: 3072,
        }
    }
}

/// Which retrieval results end up in the completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextStrategy {
    /// Only the prompt built from the nearest result is sent.
    Nearest,
    /// Prompts for every result are sent together, nearest first.
    Joined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationSettings {
    pub model: String,
    pub temperature: f32,
    pub context: ContextStrategy,
    pub api_base: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            model: "gpt-4o".to_string(),
            temperature: 0.0,
            context: ContextStrategy::Nearest,
            api_base: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Lance,
    Memory,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    pub uri: String,
    pub collection: String,
}

impl StoreSettings {
    pub fn resolved_uri(&self) -> PathBuf { expand_path(&self.uri) }
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self { backend: StoreBackend::Lance, uri: "~/.docqa/lancedb".to_string(), collection: "documents".to_string() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { k: 5 } }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self { Self { max_attempts: 3, base_delay_ms: 250, max_delay_ms: 4000 } }
}

/// True when `APP_USE_FAKE_EMBEDDINGS` is `1` or `true`.
pub fn fake_embeddings_forced() -> bool {
    env::var("APP_USE_FAKE_EMBEDDINGS")
        .ok()
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_without_any_files() {
        Jail::expect_with(|jail| {
            let cfg = Config::load_for_env(jail.directory(), "dev").map_err(|e| e.to_string())?;
            let s = cfg.settings().map_err(|e| e.to_string())?;
            assert_eq!(s, Settings::default());
            assert_eq!(s.chunking.max_chars, 1000);
            assert_eq!(s.chunking.overlap, 200);
            assert_eq!(s.retrieval.k, 5);
            assert_eq!(s.generation.temperature, 0.0);
            assert_eq!(s.generation.context, ContextStrategy::Nearest);
            Ok(())
        });
    }

    #[test]
    fn env_file_then_env_vars_override() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "docqa.toml",
                r#"
                [chunking]
                max_chars = 500
                overlap = 50

                [store]
                backend = "memory"
                collection = "vashon"
                "#,
            )?;
            jail.create_file("docqa.test.toml", "[retrieval]\nk = 3\n")?;
            jail.set_env("APP_GENERATION__CONTEXT", "joined");
            jail.set_env("APP_CHUNKING__OVERLAP", "100");
            let cfg = Config::load_for_env(jail.directory(), "test").map_err(|e| e.to_string())?;
            let s = cfg.settings().map_err(|e| e.to_string())?;
            assert_eq!(s.chunking, ChunkingSettings { max_chars: 500, overlap: 100 });
            assert_eq!(s.store.backend, StoreBackend::Memory);
            assert_eq!(s.store.collection, "vashon");
            assert_eq!(s.retrieval.k, 3);
            assert_eq!(s.generation.context, ContextStrategy::Joined);
            let k: usize = cfg.get("retrieval.k").map_err(|e| e.to_string())?;
            assert_eq!(k, 3);
            Ok(())
        });
    }

    #[test]
    fn invalid_chunking_is_a_configuration_error() {
        Jail::expect_with(|jail| {
            jail.create_file("docqa.toml", "[chunking]\nmax_chars = 100\noverlap = 100\n")?;
            let cfg = Config::load_for_env(jail.directory(), "dev").map_err(|e| e.to_string())?;
            let err = cfg.settings().unwrap_err();
            assert_eq!(err.kind(), crate::error::ErrorKind::Configuration);
            Ok(())
        });
    }

    #[test]
    fn resolve_relative_and_absolute_paths() {
        let base = Path::new("/srv/docqa");
        assert_eq!(resolve_with_base(base, "data/lance"), PathBuf::from("/srv/docqa/data/lance"));
        assert_eq!(resolve_with_base(base, "/var/lance"), PathBuf::from("/var/lance"));
    }
}
