use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub local_store_path: PathBuf,
    pub assets_dir: PathBuf,
    pub seed_demo: bool,
}

#[derive(Debug, thiserror::Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    key: &'static str,
    message: String,
}

impl Config {
    /// Reads `.env` (if any) and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(Self {
            database_url: try_load("DATABASE_URL", "sqlite://sponsorhub.db")?,
            port: try_load("PORT", "3000")?,
            local_store_path: try_load("LOCAL_STORE_PATH", "local_store.json")?,
            assets_dir: try_load("ASSETS_DIR", "assets")?,
            seed_demo: try_load("SEED_DEMO", "true")?,
        })
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    env::var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError {
                key,
                message: e.to_string(),
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_key_uses_default() {
        let port: u16 = try_load("SPONSORHUB_TEST_UNSET_PORT", "3000").unwrap();
        assert_eq!(port, 3000);
    }

    #[test]
    fn malformed_default_is_reported_with_key() {
        let err = try_load::<u16>("SPONSORHUB_TEST_UNSET_PORT", "not-a-port").unwrap_err();
        assert!(err.to_string().contains("SPONSORHUB_TEST_UNSET_PORT"));
    }
}
