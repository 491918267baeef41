use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub bind_addr: String,
    pub ollama: OllamaConfig,
    pub neo4j: Neo4jConfig,
    pub detector: DetectorConfig,
    pub retry: RetryConfig,
    pub cache: CacheConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Neo4jConfig {
    pub uri: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Inclusive neutral-probability cutoff for flagging unsupported triples
    pub neutral_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    pub max_retries: usize,
    pub initial_backoff_ms: u64,
    pub max_backoff_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub max_entries: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            ollama: OllamaConfig {
                base_url: "http://localhost:11434".to_string(),
                model: "llama3".to_string(),
                request_timeout_secs: 60,
            },
            neo4j: Neo4jConfig {
                uri: "bolt://localhost:7687".to_string(),
                user: "neo4j".to_string(),
                password: "yourpassword".to_string(),
            },
            detector: DetectorConfig {
                neutral_threshold: 0.5,
            },
            retry: RetryConfig {
                max_retries: 3,
                initial_backoff_ms: 1000,
                max_backoff_ms: 10000,
            },
            cache: CacheConfig {
                enabled: true,
                max_entries: 10000,
            },
        }
    }
}

impl AppConfig {
    /// Defaults with environment overrides. Config stays a binary concern;
    /// the library crates only ever see constructed values.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(addr) = std::env::var("GRAPHCHECK_BIND_ADDR") {
            config.bind_addr = addr;
        }
        if let Ok(url) = std::env::var("GRAPHCHECK_OLLAMA_URL") {
            config.ollama.base_url = url;
        }
        if let Ok(model) = std::env::var("GRAPHCHECK_OLLAMA_MODEL") {
            config.ollama.model = model;
        }
        if let Ok(uri) = std::env::var("GRAPHCHECK_NEO4J_URI") {
            config.neo4j.uri = uri;
        }
        if let Ok(user) = std::env::var("GRAPHCHECK_NEO4J_USER") {
            config.neo4j.user = user;
        }
        if let Ok(password) = std::env::var("GRAPHCHECK_NEO4J_PASSWORD") {
            config.neo4j.password = password;
        }
        if let Ok(threshold) = std::env::var("GRAPHCHECK_NEUTRAL_THRESHOLD") {
            if let Ok(value) = threshold.parse() {
                config.detector.neutral_threshold = value;
            }
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_threshold() {
        let config = AppConfig::default();
        assert!((config.detector.neutral_threshold - 0.5).abs() < f32::EPSILON);
        assert!(config.cache.enabled);
    }
}
