//! Environment-driven configuration for the `petvideos` binary.
//!
//! Every setting has a default except the remote engine, which is enabled
//! only when `PETVIDEOS_DECISION_ENDPOINT` is set.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use petvideos_authz::{AuthzConfig, HttpEngineConfig};
use petvideos_db::DbConfig;

/// Process configuration sourced from environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub db: DbConfig,
    pub authz: AuthzConfig,
    /// Remote decision engine. `None` runs the embedded Cedar engine.
    pub engine: Option<HttpEngineConfig>,
    pub seed: bool,
    /// User pool the seeded sample users belong to.
    pub user_pool_id: String,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let var = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());
        let parse = |key: &str, default: u64| -> Result<u64> {
            match lookup(key) {
                Some(raw) => u64::from_str(&raw).with_context(|| format!("parse {key}")),
                None => Ok(default),
            }
        };

        let db_defaults = DbConfig::default();
        let db = DbConfig {
            url: var("PETVIDEOS_DB_URL", &db_defaults.url),
            namespace: var("PETVIDEOS_DB_NAMESPACE", &db_defaults.namespace),
            database: var("PETVIDEOS_DB_DATABASE", &db_defaults.database),
            username: var("PETVIDEOS_DB_USER", &db_defaults.username),
            password: var("PETVIDEOS_DB_PASSWORD", &db_defaults.password),
        };

        let defaults = AuthzConfig::default();
        let policy_store_id = lookup("POLICY_STORE_ID")
            .filter(|id| !id.is_empty())
            .ok_or_else(|| anyhow!("POLICY_STORE_ID must be set"))?;
        let root_directory = match lookup("PETVIDEOS_ROOT_DIRECTORY") {
            Some(name) if name.is_empty() => None,
            Some(name) => Some(name),
            None => defaults.root_directory.clone(),
        };
        let max_depth = parse("PETVIDEOS_MAX_DEPTH", defaults.max_depth as u64)?;
        let store_timeout = Duration::from_millis(parse(
            "PETVIDEOS_STORE_TIMEOUT_MS",
            defaults.store_timeout.as_millis() as u64,
        )?);
        let decision_timeout = Duration::from_millis(parse(
            "PETVIDEOS_DECISION_TIMEOUT_MS",
            defaults.decision_timeout.as_millis() as u64,
        )?);

        let authz = AuthzConfig {
            policy_store_id,
            root_directory,
            max_depth: usize::try_from(max_depth).context("PETVIDEOS_MAX_DEPTH out of range")?,
            store_timeout,
            decision_timeout,
            ..defaults
        };

        let engine = lookup("PETVIDEOS_DECISION_ENDPOINT").map(|endpoint| HttpEngineConfig {
            endpoint,
            bearer_token: lookup("PETVIDEOS_DECISION_TOKEN"),
            timeout: decision_timeout,
        });

        let seed = matches!(
            lookup("PETVIDEOS_SEED").as_deref(),
            Some("1" | "true" | "yes")
        );

        Ok(Self {
            db,
            authz,
            engine,
            seed,
            user_pool_id: var("PETVIDEOS_USER_POOL_ID", "local"),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn load(vars: &[(&str, &str)]) -> Result<ServerConfig> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ServerConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_with_only_policy_store() {
        let config = load(&[("POLICY_STORE_ID", "ps-1")]).unwrap();
        assert_eq!(config.authz.policy_store_id, "ps-1");
        assert_eq!(config.authz.max_depth, 32);
        assert_eq!(config.authz.root_directory.as_deref(), Some("petVideosDirectory"));
        assert_eq!(config.db.namespace, "petvideos");
        assert!(config.engine.is_none());
        assert!(!config.seed);
    }

    #[test]
    fn policy_store_is_required() {
        assert!(load(&[]).is_err());
        assert!(load(&[("POLICY_STORE_ID", "")]).is_err());
    }

    #[test]
    fn overrides_are_applied() {
        let config = load(&[
            ("POLICY_STORE_ID", "ps-1"),
            ("PETVIDEOS_MAX_DEPTH", "4"),
            ("PETVIDEOS_STORE_TIMEOUT_MS", "250"),
            ("PETVIDEOS_ROOT_DIRECTORY", ""),
            ("PETVIDEOS_DECISION_ENDPOINT", "http://pdp:9000/check"),
            ("PETVIDEOS_SEED", "true"),
        ])
        .unwrap();
        assert_eq!(config.authz.max_depth, 4);
        assert_eq!(config.authz.store_timeout, Duration::from_millis(250));
        assert_eq!(config.authz.root_directory, None);
        assert_eq!(
            config.engine.map(|e| e.endpoint).as_deref(),
            Some("http://pdp:9000/check")
        );
        assert!(config.seed);
    }

    #[test]
    fn bad_numbers_are_rejected() {
        let err = load(&[("POLICY_STORE_ID", "ps-1"), ("PETVIDEOS_MAX_DEPTH", "deep")]).unwrap_err();
        assert!(err.to_string().contains("PETVIDEOS_MAX_DEPTH"));
    }
}
