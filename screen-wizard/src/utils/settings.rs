// Runtime settings
// Defaults, then an optional settings.toml, then SCREEN_WIZARD__* environment variables.

use crate::utils::logging::mask_sensitive;
use crate::utils::path_resolver::default_settings_file;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const ENV_PREFIX: &str = "SCREEN_WIZARD";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiSettings {
    pub base_url: String,
    pub screens_path: String,
    pub timeout_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bearer_token: Option<String>,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            screens_path: "/api/screens".to_string(),
            timeout_secs: 30,
            bearer_token: None,
        }
    }
}

impl ApiSettings {
    /// `{base_url}{screens_path}` as a parsed URL.
    pub fn screens_endpoint(&self) -> Result<url::Url> {
        let base = self.base_url.trim_end_matches('/');
        let path = self.screens_path.trim_start_matches('/');
        let joined = format!("{}/{}", base, path);
        url::Url::parse(&joined).with_context(|| format!("Invalid registration endpoint: {}", joined))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingSettings {
    pub level: String,
    /// Mirror log lines to stdout. Ignored while the terminal UI owns the screen.
    pub stdout: bool,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            stdout: false,
        }
    }
}

impl LoggingSettings {
    pub fn level_filter(&self) -> log::LevelFilter {
        self.level
            .trim()
            .parse()
            .unwrap_or(log::LevelFilter::Info)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub api: ApiSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load with the default settings file location.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let file = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => default_settings_file(),
        };
        Self::load_from(file, explicit.is_some())
    }

    /// An explicitly requested file must exist; the default one is optional.
    pub fn load_from(file: Option<PathBuf>, required: bool) -> Result<Self> {
        let defaults = Settings::default();
        let mut builder = config::Config::builder()
            .set_default("api.base_url", defaults.api.base_url)?
            .set_default("api.screens_path", defaults.api.screens_path)?
            .set_default("api.timeout_secs", defaults.api.timeout_secs)?
            .set_default("logging.level", defaults.logging.level)?
            .set_default("logging.stdout", defaults.logging.stdout)?;

        if let Some(path) = &file {
            builder = builder.add_source(
                config::File::from(path.as_path())
                    .format(config::FileFormat::Toml)
                    .required(required),
            );
        }

        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let settings: Settings = builder
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")?;

        settings.api.screens_endpoint()?;
        if settings.api.timeout_secs == 0 {
            anyhow::bail!("api.timeout_secs must be greater than 0");
        }
        Ok(settings)
    }

    /// Effective settings as TOML with the bearer token masked.
    pub fn to_toml(&self) -> Result<String> {
        let mut shown = self.clone();
        shown.api.bearer_token = shown.api.bearer_token.as_deref().map(mask_sensitive);
        toml::to_string_pretty(&shown).context("Failed to render settings")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_settings(contents: &str) -> tempfile::NamedTempFile {
        let mut f = tempfile::Builder::new()
            .suffix(".toml")
            .tempfile()
            .expect("temp file");
        f.write_all(contents.as_bytes()).expect("write");
        f
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let s = Settings::load_from(None, false).expect("defaults");
        assert_eq!(s.api.base_url, "http://localhost:8080");
        assert_eq!(s.api.timeout_secs, 30);
        assert_eq!(s.logging.level_filter(), log::LevelFilter::Info);
        assert_eq!(
            s.api.screens_endpoint().expect("endpoint").as_str(),
            "http://localhost:8080/api/screens"
        );
    }

    #[test]
    fn file_overrides_defaults() {
        let f = write_settings(
            r#"
[api]
base_url = "https://console.example.com/"
timeout_secs = 5
bearer_token = "abcdefghijklmnop"

[logging]
level = "debug"
"#,
        );
        let s = Settings::load_from(Some(f.path().to_path_buf()), true).expect("load");
        assert_eq!(s.api.timeout_secs, 5);
        assert_eq!(s.api.screens_path, "/api/screens", "unset keys keep defaults");
        assert_eq!(s.logging.level_filter(), log::LevelFilter::Debug);
        assert_eq!(
            s.api.screens_endpoint().expect("endpoint").as_str(),
            "https://console.example.com/api/screens"
        );
    }

    #[test]
    fn missing_required_file_is_an_error() {
        let dir = tempfile::tempdir().expect("dir");
        let missing = dir.path().join("nope.toml");
        assert!(Settings::load_from(Some(missing.clone()), true).is_err());
        assert!(Settings::load_from(Some(missing), false).is_ok());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let f = write_settings("[api]\ntimeout_secs = 0\n");
        assert!(Settings::load_from(Some(f.path().to_path_buf()), true).is_err());
    }

    #[test]
    fn to_toml_masks_token() {
        let mut s = Settings::default();
        s.api.bearer_token = Some("abcdefghijklmnop".to_string());
        let rendered = s.to_toml().expect("toml");
        assert!(rendered.contains("abcd...mnop"), "rendered: {}", rendered);
        assert!(!rendered.contains("efghijkl"), "token leaked: {}", rendered);
    }
}
