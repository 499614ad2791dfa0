use anyhow::anyhow;
use anyhow::Result;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".into(), port: 8080, worker_threads: Some(4) }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,
    #[serde(default = "default_idle_timeout")]
    pub idle_timeout_secs: u64,
    #[serde(default = "default_max_lifetime")]
    pub max_lifetime_secs: u64,
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_secs: u64,
    #[serde(default)]
    pub sqlx_logging: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            max_connections: default_max_connections(),
            min_connections: default_min_connections(),
            connect_timeout_secs: default_connect_timeout(),
            idle_timeout_secs: default_idle_timeout(),
            max_lifetime_secs: default_max_lifetime(),
            acquire_timeout_secs: default_acquire_timeout(),
            sqlx_logging: false,
        }
    }
}

/// Token signing and password hashing parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(default)]
    pub jwt_signing_key: String,
    #[serde(default = "default_jwt_algorithm")]
    pub jwt_algorithm: String,
    #[serde(default = "default_jwt_expiration_hours")]
    pub jwt_expiration_hours: i64,
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_argon2_memory_kib")]
    pub argon2_memory_kib: u32,
    #[serde(default = "default_argon2_iterations")]
    pub argon2_iterations: u32,
    #[serde(default = "default_argon2_parallelism")]
    pub argon2_parallelism: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_signing_key: String::new(),
            jwt_algorithm: default_jwt_algorithm(),
            jwt_expiration_hours: default_jwt_expiration_hours(),
            min_password_length: default_min_password_length(),
            argon2_memory_kib: default_argon2_memory_kib(),
            argon2_iterations: default_argon2_iterations(),
            argon2_parallelism: default_argon2_parallelism(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrationConfig {
    #[serde(default = "default_transaction_timeout")]
    pub transaction_timeout_secs: u64,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self { transaction_timeout_secs: default_transaction_timeout() }
    }
}

fn default_max_connections() -> u32 { 10 }
fn default_min_connections() -> u32 { 2 }
fn default_connect_timeout() -> u64 { 30 }
fn default_idle_timeout() -> u64 { 600 }
fn default_max_lifetime() -> u64 { 3600 }
fn default_acquire_timeout() -> u64 { 30 }
fn default_jwt_algorithm() -> String { "HS256".into() }
fn default_jwt_expiration_hours() -> i64 { 72 }
fn default_min_password_length() -> usize { 8 }
fn default_argon2_memory_kib() -> u32 { 19 * 1024 }
fn default_argon2_iterations() -> u32 { 2 }
fn default_argon2_parallelism() -> u32 { 1 }
fn default_transaction_timeout() -> u64 { 10 }

const HMAC_ALGORITHMS: [&str; 3] = ["HS256", "HS384", "HS512"];

pub fn load_default() -> Result<AppConfig> {
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    parse(&content)
}

pub fn parse(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    /// Load `config.toml` (or `CONFIG_PATH`), falling back to defaults when the
    /// file is absent, then fill secrets from the environment and validate.
    pub fn load_and_validate() -> Result<Self> {
        let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let mut cfg = if std::path::Path::new(&path).exists() {
            load_from_file(&path)?
        } else {
            AppConfig::default()
        };
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.server.normalize()?;
        self.database.normalize_from_env();
        self.database.validate()?;
        self.auth.normalize_from_env();
        self.auth.validate()?;
        self.registration.validate()?;
        Ok(())
    }
}

impl ServerConfig {
    fn normalize(&mut self) -> Result<()> {
        if self.host.trim().is_empty() {
            self.host = "127.0.0.1".to_string();
        }
        if self.port == 0 {
            return Err(anyhow!("server.port must be within 1..=65535"));
        }
        match self.worker_threads {
            Some(0) | None => self.worker_threads = Some(4),
            Some(_) => {}
        }
        Ok(())
    }
}

impl DatabaseConfig {
    pub fn normalize_from_env(&mut self) {
        if self.url.trim().is_empty() {
            if let Ok(url) = std::env::var("DATABASE_URL") {
                self.url = url;
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.url.trim().is_empty() {
            return Err(anyhow!("database.url is empty; set it in config.toml or DATABASE_URL"));
        }
        let lower = self.url.to_lowercase();
        if !(lower.starts_with("postgresql://") || lower.starts_with("postgres://")) {
            return Err(anyhow!("database.url must start with postgresql:// or postgres://"));
        }
        if self.min_connections == 0 {
            return Err(anyhow!("database.min_connections must be >= 1"));
        }
        if self.max_connections < self.min_connections {
            return Err(anyhow!("database.max_connections must be >= min_connections"));
        }
        if self.connect_timeout_secs == 0 || self.acquire_timeout_secs == 0 {
            return Err(anyhow!("database timeouts must be positive seconds"));
        }
        Ok(())
    }
}

impl AuthConfig {
    pub fn normalize_from_env(&mut self) {
        if self.jwt_signing_key.trim().is_empty() {
            if let Ok(key) = std::env::var("JWT_SIGNING_KEY") {
                self.jwt_signing_key = key;
            }
        }
        self.jwt_algorithm = self.jwt_algorithm.trim().to_uppercase();
    }

    pub fn validate(&self) -> Result<()> {
        if self.jwt_signing_key.trim().is_empty() {
            return Err(anyhow!("auth.jwt_signing_key is empty; set it in config.toml or JWT_SIGNING_KEY"));
        }
        if !HMAC_ALGORITHMS.contains(&self.jwt_algorithm.as_str()) {
            return Err(anyhow!("auth.jwt_algorithm must be one of {:?}", HMAC_ALGORITHMS));
        }
        if self.jwt_expiration_hours <= 0 {
            return Err(anyhow!("auth.jwt_expiration_hours must be positive"));
        }
        if self.min_password_length == 0 || self.min_password_length > 128 {
            return Err(anyhow!("auth.min_password_length must be within 1..=128"));
        }
        if self.argon2_iterations == 0 || self.argon2_parallelism == 0 {
            return Err(anyhow!("auth.argon2_iterations and argon2_parallelism must be >= 1"));
        }
        if self.argon2_memory_kib < 8 * self.argon2_parallelism {
            return Err(anyhow!("auth.argon2_memory_kib must be >= 8 * argon2_parallelism"));
        }
        Ok(())
    }
}

impl RegistrationConfig {
    pub fn validate(&self) -> Result<()> {
        if self.transaction_timeout_secs == 0 {
            return Err(anyhow!("registration.transaction_timeout_secs must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> AppConfig {
        let mut cfg = AppConfig::default();
        cfg.database.url = "postgres://u:p@localhost/dir".into();
        cfg.auth.jwt_signing_key = "k".repeat(32);
        cfg
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg = parse("[server]\nhost = \"0.0.0.0\"\nport = 9000\n").unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.auth.jwt_algorithm, "HS256");
        assert_eq!(cfg.auth.jwt_expiration_hours, 72);
        assert_eq!(cfg.auth.min_password_length, 8);
        assert_eq!(cfg.registration.transaction_timeout_secs, 10);
        assert_eq!(cfg.database.max_connections, 10);
    }

    #[test]
    fn auth_section_parses() {
        let cfg = parse(
            "[auth]\njwt_signing_key = \"abc\"\njwt_algorithm = \"hs512\"\njwt_expiration_hours = 1\n",
        )
        .unwrap();
        assert_eq!(cfg.auth.jwt_signing_key, "abc");
        assert_eq!(cfg.auth.jwt_expiration_hours, 1);
    }

    #[test]
    fn valid_config_passes() {
        let mut cfg = valid();
        assert!(cfg.normalize_and_validate().is_ok());
        assert_eq!(cfg.server.worker_threads, Some(4));
    }

    #[test]
    fn rejects_non_hmac_algorithm() {
        let mut cfg = valid();
        cfg.auth.jwt_algorithm = "RS256".into();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn algorithm_is_case_normalized() {
        let mut cfg = valid();
        cfg.auth.jwt_algorithm = " hs384 ".into();
        cfg.normalize_and_validate().unwrap();
        assert_eq!(cfg.auth.jwt_algorithm, "HS384");
    }

    #[test]
    fn rejects_non_postgres_url() {
        let mut cfg = valid();
        cfg.database.url = "mysql://localhost/dir".into();
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_zero_transaction_timeout() {
        let mut cfg = valid();
        cfg.registration.transaction_timeout_secs = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }

    #[test]
    fn rejects_non_positive_ttl() {
        let mut cfg = valid();
        cfg.auth.jwt_expiration_hours = 0;
        assert!(cfg.normalize_and_validate().is_err());
    }
}
