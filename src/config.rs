//! Application configuration loaded from environment variables.
//!
//! Store endpoints and credentials come only from the environment (or a
//! local `.env` file); nothing is baked into the binary.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Which document store backend to talk to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    Appwrite,
    Firestore,
    /// In-process store, useful for local dry runs.
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "appwrite" => Ok(StoreBackend::Appwrite),
            "firestore" => Ok(StoreBackend::Firestore),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(()),
        }
    }
}

/// Appwrite project credentials.
#[derive(Clone)]
pub struct AppwriteConfig {
    /// API root, e.g. `https://<region>.cloud.appwrite.io/v1`
    pub endpoint: String,
    pub project_id: String,
    /// Server API key with documents.read / documents.write scopes
    pub api_key: String,
}

impl fmt::Debug for AppwriteConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppwriteConfig")
            .field("endpoint", &self.endpoint)
            .field("project_id", &self.project_id)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

/// Database and collection identifiers, shared by every backend.
#[derive(Debug, Clone)]
pub struct CollectionIds {
    pub database_id: String,
    pub users: String,
    pub messages: String,
}

impl Default for CollectionIds {
    fn default() -> Self {
        Self {
            database_id: "ucera_main_db".to_string(),
            users: "users".to_string(),
            messages: "messages".to_string(),
        }
    }
}

/// Settings for the incomplete-user sweep.
#[derive(Debug, Clone)]
pub struct SweepConfig {
    /// Minimum record age before incompleteness makes it deletable
    pub grace_period: Duration,
    /// Records requested per listing call
    pub page_size: u32,
    /// Upper bound on listing calls per run; 1 keeps the single-page ceiling
    pub max_pages: u32,
    /// Deletions in flight at once; 1 deletes sequentially
    pub delete_concurrency: usize,
    /// Timeout applied to every individual store call
    pub request_timeout: Duration,
    /// Re-fetch each candidate right before deleting it
    pub recheck_before_delete: bool,
    /// Report candidates without deleting them
    pub dry_run: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            grace_period: Duration::from_secs(3 * 60),
            page_size: 100,
            max_pages: 1,
            delete_concurrency: 1,
            request_timeout: Duration::from_secs(10),
            recheck_before_delete: false,
            dry_run: false,
        }
    }
}

/// Settings for the typing-indicator sweep.
#[derive(Debug, Clone)]
pub struct TypingSweepConfig {
    /// Indicators younger than this are left alone; zero removes all
    pub max_age: Duration,
    pub page_size: u32,
}

impl Default for TypingSweepConfig {
    fn default() -> Self {
        Self {
            max_age: Duration::ZERO,
            page_size: 1000,
        }
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_backend: StoreBackend,
    /// Present when `store_backend` is Appwrite
    pub appwrite: Option<AppwriteConfig>,
    /// GCP project ID (Firestore backend)
    pub gcp_project_id: String,
    pub collections: CollectionIds,
    /// Server port
    pub port: u16,
    /// Bearer token the scheduler must present on `/tasks/*`
    pub scheduler_token: Option<String>,
    pub sweep: SweepConfig,
    pub typing: TypingSweepConfig,
    /// Whether the one-shot binary also sweeps typing indicators
    pub sweep_typing_indicators: bool,
}

impl Config {
    /// Config for tests: in-memory store, known scheduler token.
    pub fn test_default() -> Self {
        Self {
            store_backend: StoreBackend::Memory,
            appwrite: None,
            gcp_project_id: "test-project".to_string(),
            collections: CollectionIds::default(),
            port: 8080,
            scheduler_token: Some("test_scheduler_token".to_string()),
            sweep: SweepConfig::default(),
            typing: TypingSweepConfig::default(),
            sweep_typing_indicators: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        let store_backend = match vars.get("STORE_BACKEND") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "STORE_BACKEND",
                value: raw,
            })?,
            None => StoreBackend::Appwrite,
        };

        let appwrite = if store_backend == StoreBackend::Appwrite {
            Some(AppwriteConfig {
                endpoint: vars
                    .require("APPWRITE_ENDPOINT")?
                    .trim_end_matches('/')
                    .to_string(),
                project_id: vars.require("APPWRITE_PROJECT_ID")?,
                api_key: vars.require("APPWRITE_API_KEY")?,
            })
        } else {
            None
        };

        let gcp_project_id = if store_backend == StoreBackend::Firestore {
            vars.require("GCP_PROJECT_ID")?
        } else {
            vars.get("GCP_PROJECT_ID")
                .unwrap_or_else(|| "local-dev".to_string())
        };

        let defaults = CollectionIds::default();
        let collections = CollectionIds {
            database_id: vars
                .get("APPWRITE_DATABASE_ID")
                .unwrap_or(defaults.database_id),
            users: vars.get("USERS_COLLECTION_ID").unwrap_or(defaults.users),
            messages: vars
                .get("MESSAGES_COLLECTION_ID")
                .unwrap_or(defaults.messages),
        };

        let grace_minutes: u64 = vars.parse("SWEEP_GRACE_PERIOD_MINUTES", 3)?;
        let grace_secs = grace_minutes
            .checked_mul(60)
            .ok_or_else(|| ConfigError::Invalid {
                var: "SWEEP_GRACE_PERIOD_MINUTES",
                value: grace_minutes.to_string(),
            })?;

        let sweep_defaults = SweepConfig::default();
        let sweep = SweepConfig {
            grace_period: Duration::from_secs(grace_secs),
            page_size: vars.parse_nonzero("SWEEP_PAGE_SIZE", sweep_defaults.page_size)?,
            max_pages: vars.parse_nonzero("SWEEP_MAX_PAGES", sweep_defaults.max_pages)?,
            delete_concurrency: vars
                .parse_nonzero("SWEEP_DELETE_CONCURRENCY", sweep_defaults.delete_concurrency)?,
            request_timeout: Duration::from_secs(
                vars.parse_nonzero("SWEEP_REQUEST_TIMEOUT_SECS", 10u64)?,
            ),
            recheck_before_delete: vars.parse_bool("SWEEP_RECHECK_BEFORE_DELETE", false)?,
            dry_run: vars.parse_bool("SWEEP_DRY_RUN", false)?,
        };

        let typing = TypingSweepConfig {
            max_age: Duration::from_secs(vars.parse("TYPING_MAX_AGE_SECS", 0u64)?),
            page_size: vars.parse_nonzero("TYPING_PAGE_SIZE", 1000u32)?,
        };

        Ok(Self {
            store_backend,
            appwrite,
            gcp_project_id,
            collections,
            port: vars.parse("PORT", 8080u16)?,
            scheduler_token: vars
                .get("SCHEDULER_TOKEN")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            sweep,
            typing,
            sweep_typing_indicators: vars.parse_bool("SWEEP_TYPING_INDICATORS", false)?,
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, name: &str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn require(&self, name: &'static str) -> Result<String, ConfigError> {
        self.get(name)
            .map(|v| v.trim().to_string())
            .ok_or(ConfigError::Missing(name))
    }

    fn parse<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.get(name) {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: name,
                value: raw,
            }),
            None => Ok(default),
        }
    }

    fn parse_nonzero<T>(&self, name: &'static str, default: T) -> Result<T, ConfigError>
    where
        T: FromStr + PartialEq + Default + ToString,
    {
        let value = self.parse(name, default)?;
        if value == T::default() {
            return Err(ConfigError::Invalid {
                var: name,
                value: value.to_string(),
            });
        }
        Ok(value)
    }

    fn parse_bool(&self, name: &'static str, default: bool) -> Result<bool, ConfigError> {
        match self.get(name) {
            Some(raw) => match raw.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => Ok(true),
                "0" | "false" | "no" | "off" => Ok(false),
                _ => Err(ConfigError::Invalid {
                    var: name,
                    value: raw,
                }),
            },
            None => Ok(default),
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {var}: {value:?}")]
    Invalid { var: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_config_appwrite_defaults() {
        let config = load(&[
            ("APPWRITE_ENDPOINT", "https://example.appwrite.io/v1/"),
            ("APPWRITE_PROJECT_ID", "proj"),
            ("APPWRITE_API_KEY", "secret"),
        ])
        .expect("Config should load");

        assert_eq!(config.store_backend, StoreBackend::Appwrite);
        let appwrite = config.appwrite.expect("appwrite config");
        assert_eq!(appwrite.endpoint, "https://example.appwrite.io/v1");
        assert_eq!(config.collections.database_id, "ucera_main_db");
        assert_eq!(config.sweep.grace_period, Duration::from_secs(180));
        assert_eq!(config.sweep.page_size, 100);
        assert_eq!(config.sweep.max_pages, 1);
        assert_eq!(config.sweep.delete_concurrency, 1);
        assert!(!config.sweep.dry_run);
        assert_eq!(config.typing.max_age, Duration::ZERO);
        assert_eq!(config.port, 8080);
        assert!(config.scheduler_token.is_none());
    }

    #[test]
    fn test_config_missing_api_key() {
        let err = load(&[
            ("APPWRITE_ENDPOINT", "https://example.appwrite.io/v1"),
            ("APPWRITE_PROJECT_ID", "proj"),
        ])
        .unwrap_err();
        assert!(matches!(err, ConfigError::Missing("APPWRITE_API_KEY")));
    }

    #[test]
    fn test_config_memory_backend_needs_no_credentials() {
        let config = load(&[
            ("STORE_BACKEND", "memory"),
            ("SWEEP_GRACE_PERIOD_MINUTES", "10"),
            ("SWEEP_MAX_PAGES", "5"),
            ("SWEEP_DRY_RUN", "true"),
        ])
        .unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert!(config.appwrite.is_none());
        assert_eq!(config.sweep.grace_period, Duration::from_secs(600));
        assert_eq!(config.sweep.max_pages, 5);
        assert!(config.sweep.dry_run);
    }

    #[test]
    fn test_config_rejects_bad_values() {
        let err = load(&[("STORE_BACKEND", "memory"), ("SWEEP_PAGE_SIZE", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "SWEEP_PAGE_SIZE",
                ..
            }
        ));

        let err = load(&[("STORE_BACKEND", "memory"), ("SWEEP_DRY_RUN", "maybe")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "SWEEP_DRY_RUN", .. }));

        let err = load(&[
            ("STORE_BACKEND", "memory"),
            ("SWEEP_GRACE_PERIOD_MINUTES", "999999999999999999"),
        ])
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "SWEEP_GRACE_PERIOD_MINUTES",
                ..
            }
        ));

        let err = load(&[("STORE_BACKEND", "mongo")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: "STORE_BACKEND", .. }));
    }

    #[test]
    fn test_firestore_requires_project() {
        let err = load(&[("STORE_BACKEND", "firestore")]).unwrap_err();
        assert!(matches!(err, ConfigError::Missing("GCP_PROJECT_ID")));
    }
}
