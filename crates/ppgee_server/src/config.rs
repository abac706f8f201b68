//! Environment-driven server configuration.

use ppgee_core::auth::{AuthError, CredentialVerifier, TotpVerifier};
use ppgee_core::store::{
    DocumentStore, MemoryDocumentStore, SqliteDocumentStore, StoreResult,
    DEFAULT_MAX_BATCH_WRITES,
};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: String,
    /// `None` selects the in-memory store.
    pub db_path: Option<PathBuf>,
    pub log_level: String,
    /// File logging is enabled only when set.
    pub log_dir: Option<String>,
    /// Base32 TOTP secret for `/api/login`.
    pub admin_otp_secret: Option<String>,
    pub batch_limit: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            db_path: None,
            log_level: ppgee_core::default_log_level().to_string(),
            log_dir: None,
            admin_otp_secret: None,
            batch_limit: DEFAULT_MAX_BATCH_WRITES,
        }
    }
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the config from any variable source; blank values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let var = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            bind_addr: var("PPGEE_BIND_ADDR").unwrap_or(defaults.bind_addr),
            db_path: var("PPGEE_DB_PATH").map(PathBuf::from),
            log_level: var("PPGEE_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_dir: var("PPGEE_LOG_DIR"),
            admin_otp_secret: var("PPGEE_ADMIN_OTP_SECRET"),
            batch_limit: var("PPGEE_BATCH_LIMIT")
                .and_then(|value| value.parse::<usize>().ok())
                .unwrap_or(defaults.batch_limit)
                .clamp(1, DEFAULT_MAX_BATCH_WRITES),
        }
    }

    /// Opens the configured document store.
    pub fn open_store(&self) -> StoreResult<Arc<dyn DocumentStore>> {
        let store: Arc<dyn DocumentStore> = match &self.db_path {
            Some(path) => {
                Arc::new(SqliteDocumentStore::open(path)?.with_max_batch_writes(self.batch_limit))
            }
            None => Arc::new(MemoryDocumentStore::with_max_batch_writes(self.batch_limit)),
        };
        Ok(store)
    }

    /// Login verifier, or `None` when no secret is configured.
    pub fn verifier(&self) -> Result<Option<Arc<dyn CredentialVerifier>>, AuthError> {
        match &self.admin_otp_secret {
            Some(secret) => {
                let verifier: Arc<dyn CredentialVerifier> =
                    Arc::new(TotpVerifier::from_base32(secret)?);
                Ok(Some(verifier))
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ServerConfig, DEFAULT_BIND_ADDR};
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config(vars: &[(&str, &str)]) -> ServerConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_select_memory_store_and_no_login() {
        let config = config(&[]);
        assert_eq!(config.bind_addr, DEFAULT_BIND_ADDR);
        assert_eq!(config.db_path, None);
        assert_eq!(config.batch_limit, 500);
        assert!(config.verifier().expect("verifier").is_none());
        assert_eq!(config.open_store().expect("store").backend_name(), "memory");
    }

    #[test]
    fn reads_overrides_and_clamps_batch_limit() {
        let config = config(&[
            ("PPGEE_BIND_ADDR", "0.0.0.0:9000"),
            ("PPGEE_DB_PATH", "/var/lib/ppgee/ppgee.db"),
            ("PPGEE_BATCH_LIMIT", "5000"),
            ("PPGEE_LOG_DIR", "  "),
        ]);
        assert_eq!(config.bind_addr, "0.0.0.0:9000");
        assert_eq!(config.db_path, Some(PathBuf::from("/var/lib/ppgee/ppgee.db")));
        assert_eq!(config.batch_limit, 500);
        assert_eq!(config.log_dir, None);

        assert_eq!(config_batch("0"), 1);
        assert_eq!(config_batch("abc"), 500);
    }

    #[test]
    fn invalid_otp_secret_is_reported() {
        let config = config(&[("PPGEE_ADMIN_OTP_SECRET", "???")]);
        assert!(config.verifier().is_err());
    }

    fn config_batch(value: &str) -> usize {
        config(&[("PPGEE_BATCH_LIMIT", value)]).batch_limit
    }
}
