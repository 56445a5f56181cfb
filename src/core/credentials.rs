use crate::core::error::ConfigError;
use crate::core::settings::CredentialSettings;
use std::fmt;
use std::path::PathBuf;

/// API key for the distance matrix service. Never printed in full.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn parse(raw: &str, origin: &str) -> Result<Self, ConfigError> {
        let key = raw.trim();

        if key.is_empty() {
            return Err(ConfigError::MalformedCredential {
                origin: origin.to_string(),
                reason: "key is empty".to_string(),
            });
        }

        if key.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(ConfigError::MalformedCredential {
                origin: origin.to_string(),
                reason: "key contains whitespace".to_string(),
            });
        }

        Ok(Self(key.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let visible: String = self.0.chars().take(4).collect();
        write!(f, "ApiKey({visible}…)")
    }
}

pub trait CredentialProvider: Send + Sync {
    fn describe(&self) -> String;
    fn api_key(&self) -> Result<ApiKey, ConfigError>;
}

pub struct FileCredentials {
    path: PathBuf,
}

impl FileCredentials {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl CredentialProvider for FileCredentials {
    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }

    fn api_key(&self) -> Result<ApiKey, ConfigError> {
        let content = std::fs::read_to_string(&self.path).map_err(|e| {
            ConfigError::MissingCredential(format!(
                "failed to read {}: {}",
                self.path.display(),
                e
            ))
        })?;

        ApiKey::parse(&content, &self.describe())
    }
}

pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl CredentialProvider for EnvCredentials {
    fn describe(&self) -> String {
        format!("environment variable {}", self.var)
    }

    fn api_key(&self) -> Result<ApiKey, ConfigError> {
        let value = std::env::var(&self.var).map_err(|_| {
            ConfigError::MissingCredential(format!("{} is not set", self.var))
        })?;

        ApiKey::parse(&value, &self.describe())
    }
}

/// Picks the key file when one is configured, the environment otherwise.
pub fn from_settings(settings: &CredentialSettings) -> Box<dyn CredentialProvider> {
    match &settings.api_key_file {
        Some(path) => Box::new(FileCredentials::new(path.clone())),
        None => Box::new(EnvCredentials::new(settings.api_key_env.clone())),
    }
}
