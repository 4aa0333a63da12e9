use anyhow::{bail, Context, Result};

/// Where records and blobs live.
#[derive(Debug, Clone)]
pub enum StorageConfig {
    /// Redis for record metadata, S3 / MinIO for blobs.
    Remote {
        redis_url: String,
        kv_namespace: String,
        s3_bucket: String,
        s3_endpoint: String,
        aws_access_key_id: String,
        aws_secret_access_key: String,
    },
    /// Process-local stores; everything is lost on restart.
    Memory,
}

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub session_tokens: Vec<String>,
    pub auth_redirect: String,
    pub port: u16,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let storage = match optional_env("STORAGE_BACKEND", "remote").as_str() {
            "remote" => StorageConfig::Remote {
                redis_url: require_env("REDIS_URL")?,
                kv_namespace: optional_env("KV_NAMESPACE", "resume-vault"),
                s3_bucket: require_env("S3_BUCKET")?,
                s3_endpoint: require_env("S3_ENDPOINT")?,
                aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
                aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            },
            "memory" => StorageConfig::Memory,
            other => bail!("STORAGE_BACKEND must be 'remote' or 'memory', got '{other}'"),
        };

        let session_tokens = parse_tokens(&require_env("SESSION_TOKENS")?);
        if session_tokens.is_empty() {
            bail!("SESSION_TOKENS must contain at least one token");
        }

        Ok(Config {
            storage,
            session_tokens,
            auth_redirect: optional_env("AUTH_REDIRECT", "/auth"),
            port: optional_env("PORT", "8080")
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: optional_env("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn optional_env(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Splits a comma-separated token list, dropping blanks.
fn parse_tokens(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(String::from)
        .collect()
}
