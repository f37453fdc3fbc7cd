use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{bail, Context};
use serde::Deserialize;
use url::Url;

pub const SETTINGS_FILE: &str = "cart.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub store_url: String,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            store_url: "http://localhost:3000".into(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FileSettings {
    store_url: Option<String>,
}

/// Defaults, then the settings file, then the environment. An explicitly
/// named file must exist; the default one is optional.
pub fn load_settings(config_path: Option<&Path>) -> anyhow::Result<ClientSettings> {
    let mut settings = ClientSettings::default();

    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(SETTINGS_FILE));
    match fs::read_to_string(&path) {
        Ok(raw) => apply_file_settings(&mut settings, &raw)
            .with_context(|| format!("invalid settings file '{}'", path.display()))?,
        Err(err) if config_path.is_some() => {
            return Err(err).with_context(|| format!("failed to read '{}'", path.display()));
        }
        Err(_) => {}
    }
    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    settings.store_url = validate_store_url(&settings.store_url)?;

    Ok(settings)
}

pub(crate) fn apply_file_settings(settings: &mut ClientSettings, raw: &str) -> anyhow::Result<()> {
    let file_cfg: FileSettings = toml::from_str(raw)?;
    if let Some(v) = file_cfg.store_url {
        settings.store_url = v;
    }
    Ok(())
}

pub(crate) fn apply_env_overrides(
    settings: &mut ClientSettings,
    var: impl Fn(&str) -> Option<String>,
) {
    if let Some(v) = var("CART_STORE_URL") {
        settings.store_url = v;
    }
    if let Some(v) = var("APP__STORE_URL") {
        settings.store_url = v;
    }
}

/// Accepts absolute http(s) URLs only; returns them without a trailing slash.
pub fn validate_store_url(raw: &str) -> anyhow::Result<String> {
    let url = Url::parse(raw.trim()).with_context(|| format!("invalid store url '{raw}'"))?;
    if !matches!(url.scheme(), "http" | "https") {
        bail!("store url must start with http:// or https://, got '{raw}'");
    }
    if url.host_str().is_none() {
        bail!("store url '{raw}' has no host");
    }
    Ok(url.as_str().trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_to_local_store() {
        assert_eq!(ClientSettings::default().store_url, "http://localhost:3000");
    }

    #[test]
    fn env_overrides_file() {
        let mut settings = ClientSettings::default();
        apply_file_settings(&mut settings, r#"store_url = "http://files:3000""#).expect("parse");
        assert_eq!(settings.store_url, "http://files:3000");

        let vars = HashMap::from([("APP__STORE_URL", "http://env:4000")]);
        apply_env_overrides(&mut settings, |key| vars.get(key).map(|v| v.to_string()));
        assert_eq!(settings.store_url, "http://env:4000");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = std::env::temp_dir().join("cart_terminal_missing_settings.toml");
        assert!(load_settings(Some(&missing)).is_err());
    }

    #[test]
    fn validates_store_url() {
        assert_eq!(
            validate_store_url("http://localhost:3000/").expect("valid"),
            "http://localhost:3000"
        );
        assert!(validate_store_url("ftp://localhost").is_err());
        assert!(validate_store_url("localhost:3000").is_err());
    }
}
