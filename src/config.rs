use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use tracing::{info, warn};

const DEFAULT_PORT: &str = "8080";
const DEFAULT_DATABASE_PATH: &str = "data/planner.db";

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, String> {
        Ok(Self {
            port: try_load("PORT", DEFAULT_PORT)?,
            database_path: try_load("APP_DATABASE_PATH", DEFAULT_DATABASE_PATH)?,
        })
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> Result<T, String>
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    raw.parse().map_err(|e| {
        warn!("invalid {key} value {raw:?}: {e}");
        format!("invalid {key} value: {e}")
    })
}
