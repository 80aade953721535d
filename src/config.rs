// Configuration loading and parsing (config/optimizer.toml).

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub roster: RosterConfig,
    pub stacking: StackingConfig,
    pub db_path: String,
    /// Hard deadline for a single optimization request, enforced at the
    /// binary boundary.
    pub request_timeout_secs: u64,
}

// ---------------------------------------------------------------------------
// optimizer.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire optimizer.toml file.
#[derive(Debug, Clone, Deserialize)]
struct OptimizerFile {
    slate: SlateSection,
    roster: RosterConfig,
    stacking: StackingConfig,
}

#[derive(Debug, Clone, Deserialize)]
struct SlateSection {
    db_path: String,
    #[serde(default = "default_timeout_secs")]
    request_timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

/// Default roster shape for the contest type. A request may override the
/// slot list and cap; these are the site defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RosterConfig {
    /// Slot labels to fill, e.g. ["P","P","C","1B","2B","3B","SS","OF","OF","OF"].
    /// Slots of the same label are interchangeable.
    pub slots: Vec<String>,
    pub salary_cap: u32,
}

/// Stack strategy tables: slate-size suggestions plus the label -> size-pair
/// requirements map.
#[derive(Debug, Clone, Deserialize)]
pub struct StackingConfig {
    /// Checked in order; the first entry whose `max_games` is >= the slate's
    /// game count wins. The last entry acts as the catch-all when its
    /// `max_games` is large enough.
    pub suggestions: Vec<StackSuggestion>,
    /// Label -> [primary_size, secondary_size].
    pub requirements: HashMap<String, [usize; 2]>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackSuggestion {
    pub max_games: u32,
    pub label: String,
    pub rationale: String,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/optimizer.toml` relative to
/// the given `base_dir`.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let path = base_dir.join("config").join("optimizer.toml");
    let text = read_file(&path)?;
    let file: OptimizerFile = toml::from_str(&text).map_err(|e| ConfigError::ParseError {
        path: path.clone(),
        source: e,
    })?;

    let config = Config {
        roster: file.roster,
        stacking: file.stacking,
        db_path: file.slate.db_path,
        request_timeout_secs: file.slate.request_timeout_secs,
    };

    validate(&config)?;

    Ok(config)
}

/// Convenience wrapper: loads config relative to the current working directory.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate(config: &Config) -> Result<(), ConfigError> {
    if config.roster.slots.is_empty() {
        return Err(ConfigError::ValidationError {
            field: "roster.slots".into(),
            message: "must contain at least one slot".into(),
        });
    }

    if config.roster.salary_cap == 0 {
        return Err(ConfigError::ValidationError {
            field: "roster.salary_cap".into(),
            message: "must be greater than 0".into(),
        });
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::ValidationError {
            field: "slate.request_timeout_secs".into(),
            message: "must be greater than 0".into(),
        });
    }

    for (label, sizes) in &config.stacking.requirements {
        if sizes[0] == 0 || sizes[1] == 0 {
            return Err(ConfigError::ValidationError {
                field: format!("stacking.requirements.{label}"),
                message: "stack sizes must be greater than 0".into(),
            });
        }
    }

    // Every suggested label must have a requirements entry, otherwise a
    // "suggested" request would resolve to an unusable strategy.
    for suggestion in &config.stacking.suggestions {
        if !config.stacking.requirements.contains_key(&suggestion.label) {
            return Err(ConfigError::ValidationError {
                field: "stacking.suggestions".into(),
                message: format!(
                    "suggested label `{}` has no stacking.requirements entry",
                    suggestion.label
                ),
            });
        }
    }

    Ok(())
}
