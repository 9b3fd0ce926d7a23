/// Configuration management for the API server
///
/// This module loads configuration from environment variables (and a `.env`
/// file when present) into a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `API_HOST` / `API_PORT`: Bind address (default: 0.0.0.0:8080)
/// - `APP_ENV`: `production` or `development` (default: development)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any (default: `*`)
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `JWT_SECRET`: Token signing secret, at least 32 characters (required)
/// - `JWT_EXPIRES_IN_HOURS`: Token lifetime (default: 168)
/// - `STORAGE_DIR`, `STORAGE_PUBLIC_URL`, `STORAGE_SIGNING_KEY`: Attachment
///   storage; uploads are disabled without `STORAGE_DIR`
/// - `MAIL_RELAY_URL`, `MAIL_RELAY_TOKEN`, `MAIL_FROM`: Assignment emails;
///   disabled without `MAIL_RELAY_URL`
/// - `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_NAME`: Admin account seeded at
///   startup when email and password are both set
///
/// # Example
///
/// ```no_run
/// use taskhub_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use taskhub_shared::auth::jwt::DEFAULT_TOKEN_TTL_HOURS;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,

    /// `None` when attachment storage is not configured
    pub storage: Option<StorageConfig>,

    /// `None` when email is not configured
    pub mail: Option<MailSettings>,

    pub admin: Option<AdminSeed>,
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Production mode hides internal error details and enables HSTS
    pub production: bool,

    pub cors_origins: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for JWT signing
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    /// Generate with: `openssl rand -hex 32`
    pub secret: String,

    pub expires_in_hours: i64,
}

#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding attachment blobs
    pub dir: PathBuf,

    /// Base URL clients use to reach `/files/...`
    pub public_url: String,

    /// HMAC key for download links; falls back to the JWT secret
    pub signing_key: String,
}

#[derive(Debug, Clone)]
pub struct MailSettings {
    pub relay_url: String,
    pub token: Option<String>,
    pub from: String,
}

#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from `key = value` pairs
    pub fn from_map(vars: &HashMap<String, String>) -> anyhow::Result<Self> {
        Self::from_lookup(|key| vars.get(key).cloned())
    }

    fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| anyhow::anyhow!("API_PORT is invalid: {}", e))?;

        let production = matches!(var("APP_ENV").as_deref(), Some("production"));

        let cors_origins = var("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["*".to_string()]);

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()
            .map_err(|e| anyhow::anyhow!("DATABASE_MAX_CONNECTIONS is invalid: {}", e))?;

        let jwt_secret = var("JWT_SECRET")
            .ok_or_else(|| anyhow::anyhow!("JWT_SECRET environment variable is required"))?;

        if jwt_secret.len() < 32 {
            anyhow::bail!("JWT_SECRET must be at least 32 characters long");
        }

        let expires_in_hours = match var("JWT_EXPIRES_IN_HOURS") {
            Some(raw) => raw
                .parse::<i64>()
                .map_err(|e| anyhow::anyhow!("JWT_EXPIRES_IN_HOURS is invalid: {}", e))?,
            None => DEFAULT_TOKEN_TTL_HOURS,
        };
        if expires_in_hours <= 0 {
            anyhow::bail!("JWT_EXPIRES_IN_HOURS must be positive");
        }

        let storage = var("STORAGE_DIR").map(|dir| StorageConfig {
            dir: PathBuf::from(dir),
            public_url: var("STORAGE_PUBLIC_URL").unwrap_or_else(|| format!("http://{}:{}", host, port)),
            signing_key: var("STORAGE_SIGNING_KEY").unwrap_or_else(|| jwt_secret.clone()),
        });

        let mail = var("MAIL_RELAY_URL").map(|relay_url| MailSettings {
            relay_url,
            token: var("MAIL_RELAY_TOKEN"),
            from: var("MAIL_FROM").unwrap_or_else(|| "TaskHub <noreply@taskhub.local>".to_string()),
        });

        let admin = match (var("ADMIN_EMAIL"), var("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                name: var("ADMIN_NAME").unwrap_or_else(|| "Administrator".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            api: ApiConfig {
                host,
                port,
                production,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            jwt: JwtConfig {
                secret: jwt_secret,
                expires_in_hours,
            },
            storage,
            mail,
            admin,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn required() -> Vec<(&'static str, &'static str)> {
        vec![
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("JWT_SECRET", "test-secret-key-at-least-32-bytes-long"),
        ]
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_map(&vars(&required())).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:8080");
        assert!(!config.api.production);
        assert_eq!(config.api.cors_origins, vec!["*"]);
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.jwt.expires_in_hours, 168);
        assert!(config.storage.is_none());
        assert!(config.mail.is_none());
        assert!(config.admin.is_none());
    }

    #[test]
    fn test_short_jwt_secret_rejected() {
        let err = Config::from_map(&vars(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("JWT_SECRET", "too-short"),
        ]))
        .unwrap_err();

        assert!(err.to_string().contains("at least 32 characters"));
    }

    #[test]
    fn test_missing_database_url_rejected() {
        let err = Config::from_map(&vars(&[("JWT_SECRET", "test-secret-key-at-least-32-bytes-long")]))
            .unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_optional_sections() {
        let mut pairs = required();
        pairs.extend([
            ("APP_ENV", "production"),
            ("API_PORT", "9000"),
            ("CORS_ORIGINS", "https://a.example, https://b.example"),
            ("STORAGE_DIR", "/var/lib/taskhub"),
            ("MAIL_RELAY_URL", "https://mail.example/send"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "changeme123"),
        ]);
        let config = Config::from_map(&vars(&pairs)).unwrap();

        assert!(config.api.production);
        assert_eq!(config.api.cors_origins.len(), 2);

        let storage = config.storage.unwrap();
        assert_eq!(storage.public_url, "http://0.0.0.0:9000");
        assert_eq!(storage.signing_key, config.jwt.secret);

        let mail = config.mail.unwrap();
        assert!(mail.token.is_none());

        let admin = config.admin.unwrap();
        assert_eq!(admin.name, "Administrator");
    }

    #[test]
    fn test_admin_seed_needs_password() {
        let mut pairs = required();
        pairs.push(("ADMIN_EMAIL", "root@example.com"));
        let config = Config::from_map(&vars(&pairs)).unwrap();
        assert!(config.admin.is_none());
    }
}
