use crate::core::error::ConfigError;
use crate::routes::{PlanMode, DEFAULT_MAX_BATCH};
use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "https://maps.googleapis.com/maps/api/distancematrix/json";
pub const DEFAULT_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";

/// Distance Matrix rejects requests with more than 25 destinations.
pub const MAX_DESTINATIONS_PER_REQUEST: usize = 25;

pub const MAX_POLL_INTERVAL_MINUTES: u64 = 24 * 60;
pub const MAX_CALL_SPACING_SECONDS: f64 = 3600.0;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub daily_start_hour: u32,
    pub run_duration_hours: f64,
    pub poll_interval_minutes: u64,
    pub max_batch_size: usize,
    pub max_run_days: u32,
    pub min_call_spacing_seconds: f64,
    pub join_open_window: bool,
    pub output_dir: PathBuf,
    pub api: ApiSettings,
    pub credentials: CredentialSettings,
    pub sources: Vec<SourceSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            daily_start_hour: 6,
            run_duration_hours: 4.0,
            poll_interval_minutes: 10,
            max_batch_size: DEFAULT_MAX_BATCH,
            max_run_days: 365,
            min_call_spacing_seconds: 0.25,
            join_open_window: false,
            output_dir: PathBuf::from("data"),
            api: ApiSettings::default(),
            credentials: CredentialSettings::default(),
            sources: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    pub endpoint: String,
    pub mode: String,
    pub timeout_seconds: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            mode: "driving".to_string(),
            timeout_seconds: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CredentialSettings {
    pub api_key_file: Option<PathBuf>,
    pub api_key_env: String,
}

impl Default for CredentialSettings {
    fn default() -> Self {
        Self {
            api_key_file: None,
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    pub name: String,
    pub path: PathBuf,
    #[serde(default)]
    pub folder: Option<PathBuf>,
    #[serde(default)]
    pub header: bool,
    #[serde(default)]
    pub mode: PlanMode,
}

impl SourceSettings {
    pub fn folder(&self) -> PathBuf {
        self.folder
            .clone()
            .unwrap_or_else(|| PathBuf::from(&self.name))
    }
}

impl Settings {
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("rush-hour").join("config.toml"))
    }

    /// Loads from `path`, or from the default location when none is given.
    ///
    /// Relative paths inside the file are resolved against the file's own
    /// directory, so the process working directory never matters.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (
                Self::config_path().ok_or_else(|| ConfigError::Invalid {
                    field: "config",
                    reason: "could not determine config directory".to_string(),
                })?,
                false,
            ),
        };

        if !explicit && !path.exists() {
            tracing::info!(?path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;

        let mut settings: Settings =
            toml::from_str(&content).map_err(|source| ConfigError::Parse {
                path: path.clone(),
                source,
            })?;

        if let Some(base) = path.parent() {
            settings.resolve_paths(base);
        }

        tracing::info!(?path, sources = settings.sources.len(), "Loaded config");
        Ok(settings)
    }

    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |p: &Path| {
            if p.is_relative() {
                base.join(p)
            } else {
                p.to_path_buf()
            }
        };

        self.output_dir = resolve(&self.output_dir);
        if let Some(file) = &self.credentials.api_key_file {
            self.credentials.api_key_file = Some(resolve(file));
        }
        for source in &mut self.sources {
            source.path = resolve(&source.path);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.daily_start_hour > 23 {
            return Err(invalid(
                "daily_start_hour",
                format!("must be between 0 and 23, got {}", self.daily_start_hour),
            ));
        }
        if !(self.run_duration_hours > 0.0 && self.run_duration_hours <= 24.0) {
            return Err(invalid(
                "run_duration_hours",
                format!("must be in (0, 24], got {}", self.run_duration_hours),
            ));
        }
        if self.poll_interval_minutes == 0 || self.poll_interval_minutes > MAX_POLL_INTERVAL_MINUTES {
            return Err(invalid(
                "poll_interval_minutes",
                format!(
                    "must be between 1 and {}, got {}",
                    MAX_POLL_INTERVAL_MINUTES, self.poll_interval_minutes
                ),
            ));
        }
        if self.max_batch_size == 0 || self.max_batch_size > MAX_DESTINATIONS_PER_REQUEST {
            return Err(invalid(
                "max_batch_size",
                format!(
                    "must be between 1 and {}, got {}",
                    MAX_DESTINATIONS_PER_REQUEST, self.max_batch_size
                ),
            ));
        }
        if self.max_run_days == 0 {
            return Err(invalid("max_run_days", "must be positive".to_string()));
        }
        if !(0.0..=MAX_CALL_SPACING_SECONDS).contains(&self.min_call_spacing_seconds) {
            return Err(invalid(
                "min_call_spacing_seconds",
                format!(
                    "must be between 0 and {}, got {}",
                    MAX_CALL_SPACING_SECONDS, self.min_call_spacing_seconds
                ),
            ));
        }
        if self.api.timeout_seconds == 0 {
            return Err(invalid("api.timeout_seconds", "must be positive".to_string()));
        }
        if self.sources.is_empty() {
            return Err(invalid(
                "sources",
                "at least one [[sources]] entry is required".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for source in &self.sources {
            if source.name.trim().is_empty() {
                return Err(invalid("sources.name", "must not be empty".to_string()));
            }
            if !names.insert(source.name.as_str()) {
                return Err(invalid(
                    "sources.name",
                    format!("duplicate source name {:?}", source.name),
                ));
            }
        }

        Ok(())
    }

    pub fn window_start(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.daily_start_hour, 0, 0).unwrap_or(NaiveTime::MIN)
    }

    // The duration accessors saturate rather than panic on values that
    // `validate` would have rejected.

    pub fn run_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.run_duration_hours * 3600.0).unwrap_or(Duration::ZERO)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_minutes.saturating_mul(60))
    }

    pub fn min_call_spacing(&self) -> Duration {
        Duration::try_from_secs_f64(self.min_call_spacing_seconds).unwrap_or(Duration::ZERO)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_seconds)
    }

    pub fn source_output_dir(&self, source: &SourceSettings) -> PathBuf {
        self.output_dir.join(source.folder())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
