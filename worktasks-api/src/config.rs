/// Configuration management for the API server
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `API_CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: `*`)
/// - `API_PRODUCTION`: Enables HSTS (default: false)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_EXPIRY_MINUTES`: Token lifetime (default: 60)
/// - `SEED_ADMIN_EMAIL` / `SEED_ADMIN_PASSWORD`: Initial admin for an empty database
///
/// A `.env` file is loaded first when present.

use chrono::Duration;
use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,

    /// Absent unless both seed variables are set
    pub seed_admin: Option<SeedAdmin>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,
    pub cors_origins: Vec<String>,

    /// Production mode turns on HSTS
    pub production: bool,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Generate with `openssl rand -hex 32`
    pub secret: String,

    pub expiry_minutes: i64,
}

impl JwtConfig {
    pub fn expiry(&self) -> Duration {
        Duration::minutes(self.expiry_minutes)
    }
}

#[derive(Clone)]
pub struct SeedAdmin {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for SeedAdmin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SeedAdmin")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl Config {
    /// Loads configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds configuration from any key lookup
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host = lookup("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = lookup("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let cors_origins: Vec<String> = lookup("API_CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = match lookup("API_PRODUCTION") {
            Some(value) => parse_bool(&value)
                .ok_or_else(|| anyhow::anyhow!("API_PRODUCTION must be true or false"))?,
            None => false,
        };

        let database_url = lookup("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = lookup("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let jwt_secret = lookup("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expiry_minutes = lookup("JWT_EXPIRY_MINUTES")
            .unwrap_or_else(|| "60".to_string())
            .parse::<i64>()
            .map_err(|e| anyhow::anyhow!("JWT_EXPIRY_MINUTES is invalid: {}", e))?;

        if expiry_minutes <= 0 {
            anyhow::bail!("JWT_EXPIRY_MINUTES must be positive");
        }

        let seed_admin = match (lookup("SEED_ADMIN_EMAIL"), lookup("SEED_ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(SeedAdmin { email, password }),
            (None, None) => None,
            _ => anyhow::bail!("SEED_ADMIN_EMAIL and SEED_ADMIN_PASSWORD must be set together"),
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                cors_origins,
                production,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expiry_minutes,
            },
            seed_admin,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin is allowed
    pub fn cors_permissive(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("JWT_SECRET", SECRET),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(config.cors_permissive());
        assert!(!config.api.production);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expiry(), Duration::minutes(60));
        assert!(config.seed_admin.is_none());
    }

    #[test]
    fn test_explicit_values() {
        let config = Config::from_lookup(lookup_from(&[
            ("API_HOST", "127.0.0.1"),
            ("API_PORT", "3000"),
            ("API_CORS_ORIGINS", "https://a.example, https://b.example"),
            ("API_PRODUCTION", "true"),
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("JWT_SECRET", SECRET),
            ("JWT_EXPIRY_MINUTES", "15"),
            ("SEED_ADMIN_EMAIL", "admin@example.com"),
            ("SEED_ADMIN_PASSWORD", "123456"),
        ]))
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:3000");
        assert_eq!(
            config.api.cors_origins,
            vec!["https://a.example".to_string(), "https://b.example".to_string()]
        );
        assert!(!config.cors_permissive());
        assert!(config.api.production);
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.jwt.expiry_minutes, 15);
        assert_eq!(config.seed_admin.unwrap().email, "admin@example.com");
    }

    #[test]
    fn test_required_and_invalid_values() {
        assert!(Config::from_lookup(lookup_from(&[("JWT_SECRET", SECRET)])).is_err());
        assert!(Config::from_lookup(lookup_from(&[("DATABASE_URL", "x")])).is_err());
        assert!(Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", "short"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", SECRET),
            ("API_PORT", "not-a-port"),
        ]))
        .is_err());
        assert!(Config::from_lookup(lookup_from(&[
            ("DATABASE_URL", "x"),
            ("JWT_SECRET", SECRET),
            ("SEED_ADMIN_EMAIL", "admin@example.com"),
        ]))
        .is_err());
    }

    #[test]
    fn test_seed_password_is_redacted() {
        let seed = SeedAdmin {
            email: "admin@example.com".to_string(),
            password: "hunter22".to_string(),
        };
        assert!(!format!("{:?}", seed).contains("hunter22"));
    }
}
