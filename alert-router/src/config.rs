use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use thiserror::Error;
use url::Url;

/// Query parameters attached to every forwarded request of one config,
/// ordered by key so the encoded query string is stable.
pub type ParamMap = BTreeMap<String, String>;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("Port cannot be 0")]
    InvalidPort,

    #[error("missing required key `prometheusAlertUrl`")]
    MissingBaseUrl,

    #[error("invalid `prometheusAlertUrl`: {0}")]
    InvalidBaseUrl(#[from] url::ParseError),

    #[error("missing required key `config`")]
    MissingEntries,
}

#[derive(Error, Debug)]
pub enum ConfigLoadError {
    #[error("failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid config: {0}")]
    Validation(#[from] ValidationError),
}

/// Network listener configuration
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct Listener {
    /// Host address to bind to (e.g., "0.0.0.0" or "127.0.0.1")
    pub host: String,
    /// Port number to listen on
    pub port: u16,
}

impl Default for Listener {
    fn default() -> Self {
        Listener {
            host: "0.0.0.0".into(),
            port: 8080,
        }
    }
}

impl Listener {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.port == 0 {
            return Err(ValidationError::InvalidPort);
        }
        Ok(())
    }
}

/// The config file exactly as written, before validation.
#[derive(Debug, Deserialize)]
struct ConfigFile {
    #[serde(rename = "prometheusAlertUrl", default)]
    base_url: String,
    #[serde(rename = "config", default, deserialize_with = "deserialize_entries")]
    entries: Option<HashMap<String, ParamMap>>,
}

/// Forwarding configuration: where alert groups go and which query
/// parameters each named config adds.
#[derive(Clone, Debug, PartialEq)]
pub struct ForwardingConfig {
    /// Downstream endpoint every alert group is posted to
    pub base_url: Url,
    /// Maps config names (the `config` query parameter of `/alert`) to their
    /// query parameters
    pub entries: HashMap<String, ParamMap>,
}

impl ForwardingConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigLoadError> {
        let yaml = fs::read_to_string(path)?;
        Self::from_yaml(&yaml)
    }

    /// Parses and validates a config document. Nothing is returned unless both
    /// required keys are present.
    pub fn from_yaml(yaml: &str) -> Result<Self, ConfigLoadError> {
        let file: ConfigFile = serde_yaml::from_str(yaml)?;

        if file.base_url.trim().is_empty() {
            return Err(ValidationError::MissingBaseUrl.into());
        }
        let base_url = Url::parse(file.base_url.trim()).map_err(ValidationError::from)?;
        let entries = file.entries.ok_or(ValidationError::MissingEntries)?;

        Ok(ForwardingConfig { base_url, entries })
    }
}

// Parameter values are flat strings, but YAML scalars such as `at: 123` or
// `enabled: true` are accepted and kept in their textual form.
fn deserialize_entries<'de, D>(
    deserializer: D,
) -> Result<Option<HashMap<String, ParamMap>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<HashMap<String, Option<BTreeMap<String, serde_yaml::Value>>>> =
        Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let mut entries = HashMap::with_capacity(raw.len());
    for (name, params) in raw {
        let mut converted = ParamMap::new();
        for (key, value) in params.unwrap_or_default() {
            let value = match value {
                serde_yaml::Value::Null => String::new(),
                serde_yaml::Value::Bool(b) => b.to_string(),
                serde_yaml::Value::Number(n) => n.to_string(),
                serde_yaml::Value::String(s) => s,
                _ => {
                    return Err(D::Error::custom(format!(
                        "config `{name}`: value of `{key}` must be a scalar"
                    )));
                }
            };
            converted.insert(key, value);
        }
        entries.insert(name, converted);
    }

    Ok(Some(entries))
}
