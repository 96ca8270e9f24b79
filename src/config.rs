use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Name of the optional config file inside the documents folder.
pub const CONFIG_FILE: &str = "folios.toml";

pub const DEFAULT_BIND: &str = "127.0.0.1:7332";

/// Contents of `folios.toml`. Every section is optional.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub fields: BTreeMap<String, FieldConfig>,
    #[serde(default)]
    pub server: ServerConfig,
}

/// Curated filter values for one metadata field.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct FieldConfig {
    #[serde(default)]
    pub values: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

impl Config {
    /// Fields that carry a curated `values` list.
    pub fn configured_fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.fields
            .iter()
            .filter_map(|(name, f)| f.values.as_deref().map(|v| (name.as_str(), v)))
    }
}

/// Pick the documents folder: the CLI flag wins over `FOLIOS_PATH`.
pub fn resolve_documents_path(cli: Option<PathBuf>, env: Option<String>) -> Result<PathBuf> {
    if let Some(path) = cli.filter(|p| !p.as_os_str().is_empty()) {
        return Ok(path);
    }
    if let Some(path) = env.filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    bail!(
        "No documents folder specified.\n\n\
         Please provide the path to your documents folder using either:\n  \
         --folios-path /path/to/documents\n  \
         FOLIOS_PATH=/path/to/documents environment variable"
    )
}

/// Load `folios.toml` from the documents folder.
///
/// A missing file yields the default config; a file that exists but fails to
/// parse or validate is an error.
pub fn load_config(documents_dir: &Path) -> Result<Config> {
    let path = documents_dir.join(CONFIG_FILE);
    if !path.is_file() {
        return Ok(Config::default());
    }

    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

    if config.server.bind.parse::<SocketAddr>().is_err() {
        bail!(
            "server.bind must be a socket address (host:port), got '{}'",
            config.server.bind
        );
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cli_flag_wins_over_env() {
        let path = resolve_documents_path(Some("/cli".into()), Some("/env".into())).unwrap();
        assert_eq!(path, PathBuf::from("/cli"));
    }

    #[test]
    fn test_env_used_without_flag() {
        let path = resolve_documents_path(None, Some("/env".into())).unwrap();
        assert_eq!(path, PathBuf::from("/env"));
    }

    #[test]
    fn test_missing_path_names_both_sources() {
        let err = resolve_documents_path(None, Some(String::new())).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("No documents folder specified"));
        assert!(msg.contains("--folios-path"));
        assert!(msg.contains("FOLIOS_PATH"));
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert!(config.fields.is_empty());
        assert_eq!(config.server.bind, DEFAULT_BIND);
    }

    #[test]
    fn test_loads_field_values() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            r#"
[fields.status]
values = ["Draft", "In Review", "Approved", "Withdrawn"]

[fields.department]
values = ["Engineering", "HR", "Finance"]

[fields.owner]
description = "no values here"

[server]
bind = "0.0.0.0:9000"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        let configured: Vec<(&str, &[String])> = config.configured_fields().collect();
        assert_eq!(configured.len(), 2);
        assert_eq!(configured[0].0, "department");
        assert_eq!(configured[0].1, ["Engineering", "HR", "Finance"]);
        assert_eq!(configured[1].0, "status");
        assert_eq!(
            configured[1].1,
            ["Draft", "In Review", "Approved", "Withdrawn"]
        );
        assert!(config.fields.contains_key("owner"));
        assert_eq!(config.server.bind, "0.0.0.0:9000");
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join(CONFIG_FILE), "invalid [ toml syntax").unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn test_invalid_bind_is_an_error() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join(CONFIG_FILE),
            "[server]\nbind = \"not-an-address\"\n",
        )
        .unwrap();
        let err = load_config(tmp.path()).unwrap_err();
        assert!(err.to_string().contains("server.bind"));
    }
}
