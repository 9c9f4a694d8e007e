//! Configuration management for the IoT RAG service
//!
//! Supports loading configuration from:
//! - Environment variables (prefixed with APP__)
//! - Configuration files (config/default, config/{APP_ENV}, config/local)
//! - Legacy deployment variables (OLLAMA_HOST, NEO4J_*, API_*)
//! - Default values

use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,

    /// Document index configuration
    pub index: IndexConfig,

    /// Embedding service configuration
    pub embedding: EmbeddingConfig,

    /// Text generation configuration
    pub llm: LlmConfig,

    /// Concept graph configuration
    pub graph: GraphConfig,

    /// Observability configuration
    pub observability: ObservabilityConfig,

    /// Rate limiting configuration
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to
    pub host: String,

    /// Port to listen on
    pub port: u16,

    /// Request timeout in seconds (must exceed the generation timeout)
    pub request_timeout_secs: u64,

    /// Maximum concurrent requests
    pub max_concurrent_requests: usize,

    /// Maximum upload size in bytes
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Directory the index is built from
    pub docs_dir: String,

    /// File extensions eligible for indexing (without the dot)
    pub extensions: Vec<String>,

    /// Maximum chunk size in characters
    pub chunk_size: usize,

    /// Chunks shorter than this are dropped unless they are the only chunk
    pub min_chunk_size: usize,

    /// Number of passages retrieved when the caller does not say
    pub default_top_k: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Embedding provider: ollama, openai, mock
    pub provider: String,

    /// API key for embedding service
    pub api_key: Option<String>,

    /// API base URL
    pub api_base: Option<String>,

    /// Model to use
    pub model: String,

    /// Embedding dimension (used by the mock provider)
    pub dimension: usize,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Batch size for embedding requests
    pub batch_size: usize,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Generation provider: ollama, openai, mock
    pub provider: String,

    /// API base URL
    pub base_url: String,

    /// API key (openai only)
    pub api_key: Option<String>,

    /// Model name
    pub model: String,

    /// Sampling temperature
    pub temperature: f32,

    /// Upper bound on a single generation call
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Graph backend: neo4j, memory
    pub backend: String,

    /// Neo4j HTTP endpoint
    pub uri: String,

    /// Neo4j user
    pub user: String,

    /// Neo4j password
    pub password: String,

    /// Neo4j database name
    pub database: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Largest traversal depth a caller may request
    pub max_traversal_depth: u32,

    /// Seed the starter IoT graph on startup
    pub seed_on_startup: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (debug, info, warn, error)
    pub log_level: String,

    /// Enable JSON logging
    pub json_logging: bool,

    /// Metrics port (0 to disable)
    pub metrics_port: u16,

    /// Service name for logs
    pub service_name: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Requests per second (global)
    pub requests_per_second: u32,

    /// Burst capacity
    pub burst: u32,

    /// Enable rate limiting
    pub enabled: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            request_timeout_secs: 150,
            max_concurrent_requests: 64,
            max_upload_bytes: 10 * 1024 * 1024,
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            docs_dir: "app/data/docs".to_string(),
            extensions: vec!["txt".to_string(), "md".to_string(), "pdf".to_string()],
            chunk_size: 1024,
            min_chunk_size: 32,
            default_top_k: 3,
        }
    }
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            api_key: None,
            api_base: None,
            model: "all-minilm".to_string(),
            dimension: 384,
            timeout_secs: 30,
            batch_size: 32,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "ollama".to_string(),
            base_url: "http://localhost:11434".to_string(),
            api_key: None,
            model: "llama2".to_string(),
            temperature: 0.7,
            timeout_secs: 120,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            backend: "neo4j".to_string(),
            uri: "http://localhost:7474".to_string(),
            user: "neo4j".to_string(),
            password: String::new(),
            database: "neo4j".to_string(),
            timeout_secs: 30,
            max_traversal_depth: 5,
            seed_on_startup: true,
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logging: true,
            metrics_port: 9090,
            service_name: "iotrag".to_string(),
        }
    }
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 20,
            burst: 40,
            enabled: true,
        }
    }
}

impl AppConfig {
    /// Load configuration from environment and files
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".to_string());

        let builder = Config::builder()
            // Load base config file
            .add_source(File::with_name("config/default").required(false))
            // Load environment-specific config
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            // Load local overrides
            .add_source(File::with_name("config/local").required(false))
            // Load from environment variables with APP__ prefix
            // e.g., APP__SERVER__PORT=8081
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = apply_legacy_env(builder, |key| std::env::var(key).ok())?.build()?;

        config.try_deserialize()
    }

    /// Load from a specific config file
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name(path))
            .add_source(
                Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    /// Get request timeout as Duration
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.server.request_timeout_secs)
    }

    /// Get generation timeout as Duration
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.llm.timeout_secs)
    }
}

/// Unprefixed deployment variables, mapped onto config keys.
const LEGACY_ENV: &[(&str, &[&str])] = &[
    ("OLLAMA_HOST", &["llm.base_url", "embedding.api_base"]),
    ("NEO4J_URI", &["graph.uri"]),
    ("NEO4J_USER", &["graph.user"]),
    ("NEO4J_PASSWORD", &["graph.password"]),
    ("API_HOST", &["server.host"]),
    ("API_PORT", &["server.port"]),
];

fn apply_legacy_env<B, F>(
    mut builder: config::ConfigBuilder<B>,
    lookup: F,
) -> Result<config::ConfigBuilder<B>, ConfigError>
where
    B: config::builder::BuilderState,
    F: Fn(&str) -> Option<String>,
{
    for (var, keys) in LEGACY_ENV {
        let value = lookup(var);
        for key in keys.iter() {
            builder = builder.set_override_option(*key, value.clone())?;
        }
    }
    Ok(builder)
}
