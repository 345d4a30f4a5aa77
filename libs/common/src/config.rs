//! Layered configuration loading

use crate::{Error, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Load configuration from multiple sources
///
/// Priority (highest to lowest):
/// 1. Environment variables prefixed with `{APP}_` (`__` separates nesting,
///    e.g. `FLEETCTL_ANALYSIS__TOP_N=50`)
/// 2. Explicit config file, if given (must exist)
/// 3. App-specific file (`config/{app}.toml` / `.yaml`)
/// 4. Default config file (`config/default.toml` / `.yaml` / `.json`)
/// 5. `T::default()`
pub fn load_config<T>(app_name: &str, explicit: Option<&Path>) -> Result<T>
where
    T: for<'de> Deserialize<'de> + Serialize + Default,
{
    let mut figment = Figment::from(Serialized::defaults(T::default()))
        .merge(Toml::file("config/default.toml"))
        .merge(Yaml::file("config/default.yaml"))
        .merge(Json::file("config/default.json"))
        .merge(Toml::file(format!("config/{}.toml", app_name)))
        .merge(Yaml::file(format!("config/{}.yaml", app_name)));

    if let Some(path) = explicit {
        if !path.exists() {
            return Err(Error::config(format!(
                "Config file not found: {}",
                path.display()
            )));
        }
        figment = figment.merge(file_provider(path)?);
        debug!("Using config file {}", path.display());
    }

    figment = figment.merge(Env::prefixed(&format!("{}_", env_prefix(app_name))).split("__"));

    figment
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration: {}", e)))
}

/// Load configuration from a specific file only
pub fn load_config_from_file<T, P>(path: P) -> Result<T>
where
    T: for<'de> Deserialize<'de>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    Figment::new()
        .merge(file_provider(path)?)
        .extract()
        .map_err(|e| Error::Config(format!("Failed to load configuration from file: {}", e)))
}

fn file_provider(path: &Path) -> Result<Figment> {
    let extension = path
        .extension()
        .and_then(|s| s.to_str())
        .ok_or_else(|| Error::config("Config file must have an extension"))?;

    match extension {
        "toml" => Ok(Figment::from(Toml::file(path))),
        "yaml" | "yml" => Ok(Figment::from(Yaml::file(path))),
        "json" => Ok(Figment::from(Json::file(path))),
        _ => Err(Error::Config(format!(
            "Unsupported config file format: {}",
            extension
        ))),
    }
}

/// `fleet-ctl` -> `FLEET_CTL`
fn env_prefix(app_name: &str) -> String {
    app_name.replace('-', "_").to_uppercase()
}
