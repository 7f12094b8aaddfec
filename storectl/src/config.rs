use anyhow::{Context, Result, anyhow};
use libstore::{enrich::Policy, geocode::ProviderSettings};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::{
    path::{Path, PathBuf},
    time::Duration,
};
use tracing::debug;

/// Environment variable consulted for the geocoding API key when the configuration has none
pub(crate) const API_KEY_VAR: &str = "MAP_API_KEY";

const DEFAULT_DATA_FILE: &str = "store_data.csv";
const CONFIG_FILE_NAME: &str = "config.yaml";

fn default_data_file() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_FILE)
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct GeocoderConfig {
    #[serde(default)]
    pub(crate) api_key: Option<SecretString>,
    #[serde(default)]
    pub(crate) api_key_file: Option<PathBuf>,
    #[serde(default)]
    pub(crate) user_agent: Option<String>,
    #[serde(default)]
    pub(crate) google_endpoint: Option<String>,
    #[serde(default)]
    pub(crate) nominatim_endpoint: Option<String>,
}

impl PartialEq for GeocoderConfig {
    fn eq(&self, other: &Self) -> bool {
        self.api_key.as_ref().map(|k| k.expose_secret())
            == other.api_key.as_ref().map(|k| k.expose_secret())
            && self.api_key_file == other.api_key_file
            && self.user_agent == other.user_agent
            && self.google_endpoint == other.google_endpoint
            && self.nominatim_endpoint == other.nominatim_endpoint
    }
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields, default)]
pub(crate) struct PolicyConfig {
    pub(crate) lookup_timeout_secs: u64,
    pub(crate) request_delay_ms: u64,
    pub(crate) cooldown_ms: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        let policy = Policy::default();
        Self {
            lookup_timeout_secs: policy.lookup_timeout.as_secs(),
            request_delay_ms: policy.request_delay.as_millis() as u64,
            cooldown_ms: policy.cooldown.as_millis() as u64,
        }
    }
}

impl From<&PolicyConfig> for Policy {
    fn from(value: &PolicyConfig) -> Self {
        Policy {
            lookup_timeout: Duration::from_secs(value.lookup_timeout_secs),
            request_delay: Duration::from_millis(value.request_delay_ms),
            cooldown: Duration::from_millis(value.cooldown_ms),
        }
    }
}

#[derive(Debug, Deserialize, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    #[serde(default = "default_data_file")]
    pub(crate) data_file: PathBuf,
    #[serde(default)]
    pub(crate) geocoder: GeocoderConfig,
    #[serde(default)]
    pub(crate) policy: PolicyConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            geocoder: Default::default(),
            policy: Default::default(),
        }
    }
}

/// The location of the configuration file if none is given on the command line
pub(crate) fn default_config_file() -> Result<PathBuf> {
    let project_dirs = directories::ProjectDirs::from("org", "storemap", "storemap")
        .ok_or_else(|| anyhow!("Cannot find default project config directory"))?;
    Ok(project_dirs.config_dir().join(CONFIG_FILE_NAME))
}

impl Config {
    fn parse(contents: &str) -> Result<Self> {
        // an empty yaml document is not a mapping
        if contents.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(contents).with_context(|| "Couldn't parse configuration")
    }

    /// Load the configuration from `path`, or from the default location if no path is given.
    ///
    /// A missing file at the default location just means that the defaults are used.
    pub(crate) async fn load(path: Option<&Path>) -> Result<Self> {
        let (path, required) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (default_config_file()?, false),
        };
        debug!(?path, "Trying to load configuration");
        match tokio::fs::read_to_string(&path).await {
            Ok(contents) => Self::parse(&contents)
                .with_context(|| format!("Invalid configuration file '{}'", path.display())),
            Err(e) if !required && e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No configuration file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(anyhow::Error::from(e).context(format!(
                "Failed to read configuration file '{}'",
                path.display()
            ))),
        }
    }

    /// Look up the geocoding API key.
    ///
    /// The key from the configuration file wins, then the contents of `api_key_file`, then the
    /// `MAP_API_KEY` environment variable. Having no key at all is not an error.
    pub(crate) async fn api_key(&self) -> Result<Option<SecretString>> {
        if let Some(key) = &self.geocoder.api_key
            && !key.expose_secret().is_empty()
        {
            debug!("Using geocoding API key from configuration");
            return Ok(Some(key.clone()));
        }
        if let Some(keyfile) = &self.geocoder.api_key_file {
            debug!("Looking up geocoding API key from file '{}'", keyfile.display());
            let key = tokio::fs::read_to_string(keyfile).await.with_context(|| {
                format!(
                    "Failed to read geocoding API key from file '{}'",
                    keyfile.display()
                )
            })?;
            return Ok(Some(key.trim().into()));
        }
        match std::env::var(API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => {
                debug!("Using geocoding API key from environment variable {API_KEY_VAR}");
                Ok(Some(key.trim().into()))
            }
            _ => Ok(None),
        }
    }

    pub(crate) fn provider_settings(&self) -> ProviderSettings {
        let defaults = ProviderSettings::default();
        ProviderSettings {
            timeout: Duration::from_secs(self.policy.lookup_timeout_secs),
            user_agent: self.geocoder.user_agent.clone().unwrap_or(defaults.user_agent),
            google_endpoint: self
                .geocoder
                .google_endpoint
                .clone()
                .unwrap_or(defaults.google_endpoint),
            nominatim_endpoint: self
                .geocoder
                .nominatim_endpoint
                .clone()
                .unwrap_or(defaults.nominatim_endpoint),
        }
    }

    pub(crate) fn policy(&self) -> Policy {
        Policy::from(&self.policy)
    }
}
