use anyhow::{Context, Result};

const DEFAULT_AI_GATEWAY_URL: &str = "https://ai.gateway.lovable.dev/v1/chat/completions";

/// Application configuration loaded from environment variables.
/// Startup fails if required variables are missing or malformed.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: String,
    pub s3_endpoint: String,
    pub s3_region: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub ai_gateway_url: String,
    pub ai_gateway_api_key: String,
    pub buckets: Buckets,
    pub signed_url_ttl_secs: u64,
    pub recommendation_cache_ttl_secs: u64,
    pub port: u16,
    pub rust_log: String,
}

/// Storage bucket names. Rows store object keys relative to these buckets.
#[derive(Debug, Clone)]
pub struct Buckets {
    pub application_videos: String,
    pub audition_videos: String,
    pub forum_attachments: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            redis_url: require_env("REDIS_URL")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            s3_region: env_or("S3_REGION", "us-east-1"),
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            ai_gateway_url: env_or("AI_GATEWAY_URL", DEFAULT_AI_GATEWAY_URL),
            ai_gateway_api_key: require_env("AI_GATEWAY_API_KEY")?,
            buckets: Buckets {
                application_videos: env_or("APPLICATION_VIDEOS_BUCKET", "application-videos"),
                audition_videos: env_or("AUDITION_VIDEOS_BUCKET", "audition-videos"),
                forum_attachments: env_or("FORUM_ATTACHMENTS_BUCKET", "forum-attachments"),
            },
            signed_url_ttl_secs: parse_env("SIGNED_URL_TTL_SECS", 3600)?,
            recommendation_cache_ttl_secs: parse_env("RECOMMENDATION_CACHE_TTL_SECS", 900)?,
            port: parse_env("PORT", 8080)?,
            rust_log: env_or("RUST_LOG", "info"),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: u64 = parse_env("CASTING_API_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("CASTING_API_TEST_BAD_PORT", "eighty");
        let result: Result<u16> = parse_env("CASTING_API_TEST_BAD_PORT", 8080);
        assert!(result.is_err());
        std::env::remove_var("CASTING_API_TEST_BAD_PORT");
    }

    #[test]
    fn test_parse_env_trims_whitespace() {
        std::env::set_var("CASTING_API_TEST_TTL", " 120 ");
        let value: u64 = parse_env("CASTING_API_TEST_TTL", 0).unwrap();
        assert_eq!(value, 120);
        std::env::remove_var("CASTING_API_TEST_TTL");
    }
}
