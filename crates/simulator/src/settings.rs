//! Simulator settings
//!
//! Defaults overridden by `FAIRQUEUE_*` environment variables. Nested keys
//! use a double underscore, e.g. `FAIRQUEUE_LIMITS__COOLDOWN_SECONDS=30`.

use config::{Config, ConfigError, Environment};
use fairqueue_core::application::Settings as EngineSettings;
use fairqueue_core::domain::QueueConfigPatch;
use serde::Deserialize;
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "~/.fairqueue/queue.db";
const DEFAULT_QUEUE: &str = "default";

#[derive(Debug, Clone, Deserialize)]
pub struct SimSettings {
    /// File path (`~` expanded) or a full `sqlite:` URL
    pub database_url: String,
    /// `json` or `pretty`
    pub log_format: String,
    pub queue_id: String,
    #[serde(default)]
    pub engine: EngineSettings,
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub limits: SeedLimits,
}

/// Shape of the randomized run
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SimulationSettings {
    pub min_participants: u32,
    pub max_participants: u32,
    pub min_submissions: u32,
    pub max_submissions: u32,
    pub min_duration_secs: u64,
    pub max_duration_secs: u64,
    /// Plays before the late joiner shows up
    pub late_joiner_after: usize,
    /// Fixed RNG seed for reproducible runs
    pub seed: Option<u64>,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            min_participants: 4,
            max_participants: 8,
            min_submissions: 2,
            max_submissions: 4,
            min_duration_secs: 90,
            max_duration_secs: 210,
            late_joiner_after: 5,
            seed: None,
        }
    }
}

/// Per-queue limits written to the config store before the run.
/// Unset fields leave the stored value alone, `0` clears it.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedLimits {
    pub entry_duration_max_seconds: Option<u64>,
    pub entry_duration_min_seconds: Option<u64>,
    pub cooldown_seconds: Option<u64>,
    pub submission_max_quantity: Option<u64>,
    pub queue_duration_seconds: Option<u64>,
}

impl SeedLimits {
    pub fn to_patch(&self) -> QueueConfigPatch {
        let field = |v: Option<u64>| v.map(|n| Some(n).filter(|&n| n > 0));
        QueueConfigPatch {
            entry_duration_max_seconds: field(self.entry_duration_max_seconds),
            entry_duration_min_seconds: field(self.entry_duration_min_seconds),
            cooldown_seconds: field(self.cooldown_seconds),
            submission_max_quantity: field(self.submission_max_quantity),
            queue_duration_seconds: field(self.queue_duration_seconds),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.to_patch() == QueueConfigPatch::default()
    }
}

impl SimSettings {
    /// Load from defaults and the process environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_env(Environment::default())
    }

    fn from_env(env: Environment) -> Result<Self, ConfigError> {
        Config::builder()
            .set_default("database_url", DEFAULT_DB_PATH)?
            .set_default("log_format", "pretty")?
            .set_default("queue_id", DEFAULT_QUEUE)?
            .add_source(
                env.prefix("FAIRQUEUE")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()
    }

    /// sqlx URL plus the directory that has to exist for a file database
    pub fn resolve_database(&self) -> (String, Option<PathBuf>) {
        if self.database_url.starts_with("sqlite:") {
            return (self.database_url.clone(), None);
        }

        let path = PathBuf::from(shellexpand::tilde(&self.database_url).into_owned());
        let dir = path.parent().map(PathBuf::from);
        (format!("sqlite://{}", path.display()), dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> SimSettings {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        SimSettings::from_env(Environment::default().source(Some(source))).unwrap()
    }

    #[test]
    fn test_defaults() {
        let settings = load(&[]);
        assert_eq!(settings.queue_id, "default");
        assert_eq!(settings.log_format, "pretty");
        assert_eq!(settings.engine, EngineSettings::default());
        assert_eq!(settings.simulation.min_participants, 4);
        assert_eq!(settings.simulation.late_joiner_after, 5);
        assert!(settings.limits.is_empty());
    }

    #[test]
    fn test_env_overrides() {
        let settings = load(&[
            ("FAIRQUEUE_LOG_FORMAT", "json"),
            ("FAIRQUEUE_QUEUE_ID", "guild-42"),
            ("FAIRQUEUE_SIMULATION__SEED", "7"),
            ("FAIRQUEUE_LIMITS__COOLDOWN_SECONDS", "30"),
            ("FAIRQUEUE_ENGINE__HISTORY_RETENTION_MS", "1000"),
        ]);
        assert_eq!(settings.log_format, "json");
        assert_eq!(settings.queue_id, "guild-42");
        assert_eq!(settings.simulation.seed, Some(7));
        assert_eq!(settings.engine.history_retention_ms, 1000);
        assert_eq!(
            settings.limits.to_patch().cooldown_seconds,
            Some(Some(30))
        );
    }

    #[test]
    fn test_zero_limit_clears() {
        let limits = SeedLimits {
            queue_duration_seconds: Some(0),
            ..Default::default()
        };
        assert_eq!(limits.to_patch().queue_duration_seconds, Some(None));
        assert!(!limits.is_empty());
    }

    #[test]
    fn test_resolve_database() {
        let mut settings = load(&[]);
        settings.database_url = "sqlite::memory:".to_string();
        assert_eq!(
            settings.resolve_database(),
            ("sqlite::memory:".to_string(), None)
        );

        settings.database_url = "/var/lib/fairqueue/queue.db".to_string();
        let (url, dir) = settings.resolve_database();
        assert_eq!(url, "sqlite:///var/lib/fairqueue/queue.db");
        assert_eq!(dir, Some(PathBuf::from("/var/lib/fairqueue")));
    }
}
