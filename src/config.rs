use crate::error::AppError;
use figment::{
    Figment,
    providers::{Env, Serialized},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Environment variables read into [`Config`]. Anything else in the
/// process environment is ignored.
const ENV_KEYS: [&str; 6] = [
    "DATABASE_URL",
    "HOST",
    "PORT",
    "APP_ENV",
    "LOGLEVEL",
    "BASE_DIR",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum AppEnv {
    #[serde(alias = "dev")]
    Development,
    #[default]
    #[serde(alias = "prod")]
    Production,
}

impl AppEnv {
    pub fn is_debug(self) -> bool {
        matches!(self, AppEnv::Development)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// External connection string; `None` or blank selects the local database.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub app_env: AppEnv,
    /// Default tracing filter, overridden by `RUST_LOG`.
    pub loglevel: String,
    /// Directory holding `instance/denuncias.db` for the local backend.
    pub base_dir: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "0.0.0.0".to_string(),
            port: 5000,
            app_env: AppEnv::Production,
            loglevel: "info".to_string(),
            base_dir: PathBuf::from("."),
        }
    }
}

impl Config {
    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default())).merge(Env::raw().only(&ENV_KEYS))
    }

    /// Load from the process environment on top of the defaults.
    pub fn load() -> Result<Self, AppError> {
        Ok(Self::figment().extract()?)
    }

    /// Tracing filter to use when `RUST_LOG` is unset. Development mode
    /// raises the default `info` level to `debug`.
    pub fn default_filter(&self) -> String {
        if self.app_env.is_debug() && self.loglevel == "info" {
            "debug,tower_http=debug".to_string()
        } else {
            self.loglevel.clone()
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// The connection string, treating a blank value as absent.
    pub fn external_database_url(&self) -> Option<&str> {
        self.database_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn env_overrides_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "8080");
            jail.set_env("APP_ENV", "development");
            jail.set_env("DATABASE_URL", "postgres://u:p@db:5432/app");
            jail.set_env("BASE_DIR", "/srv/denuncias");

            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.port, 8080);
            assert_eq!(cfg.app_env, AppEnv::Development);
            assert_eq!(
                cfg.external_database_url(),
                Some("postgres://u:p@db:5432/app")
            );
            assert_eq!(cfg.base_dir, PathBuf::from("/srv/denuncias"));
            Ok(())
        });
    }

    #[test]
    fn blank_database_url_counts_as_absent() {
        Jail::expect_with(|jail| {
            jail.set_env("DATABASE_URL", "   ");
            let cfg: Config = Config::figment().extract()?;
            assert_eq!(cfg.external_database_url(), None);
            Ok(())
        });
    }

    #[test]
    fn invalid_port_is_an_error() {
        Jail::expect_with(|jail| {
            jail.set_env("PORT", "not-a-port");
            assert!(Config::figment().extract::<Config>().is_err());
            Ok(())
        });
    }

    #[test]
    fn load_reports_bad_values_as_config_error() {
        Jail::expect_with(|jail| {
            jail.set_env("APP_ENV", "staging");
            let err = Config::load().expect_err("unknown APP_ENV must be rejected");
            assert!(matches!(err, AppError::Config(_)));
            Ok(())
        });
    }

    #[test]
    fn development_raises_default_filter() {
        let cfg = Config {
            app_env: AppEnv::Development,
            ..Config::default()
        };
        assert!(cfg.default_filter().starts_with("debug"));
        assert_eq!(Config::default().default_filter(), "info");
    }
}
