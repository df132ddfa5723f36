use std::path::PathBuf;

/// A configuration or data-integrity error.
///
/// These are defects in the lookup tables or in operation data, not runtime
/// conditions. Callers are expected to reject the computation rather than
/// fall back to a default.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A string did not name a member of one of the fixed enumerations.
    #[error("unknown {kind} '{value}'")]
    UnknownVariant { kind: &'static str, value: String },

    /// A difficulty level has no base XP entry.
    #[error("difficulty table has no entry for '{0}'")]
    MissingDifficulty(String),

    /// A priority level has no bonus entry.
    #[error("priority table has no entry for '{0}'")]
    MissingPriority(String),

    /// The rank ladder is malformed (empty, not starting at 0, unordered, duplicated).
    #[error("invalid rank ladder: {0}")]
    InvalidLadder(String),

    /// A numeric setting is out of its allowed range.
    #[error("invalid setting '{field}': {message}")]
    InvalidSetting { field: &'static str, message: String },

    #[error("error reading config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error parsing config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("error serializing config: {0}")]
    Serialize(#[from] toml::ser::Error),
}

impl ConfigError {
    /// Serialize to a JSON object for machine-readable error output.
    pub fn to_json_value(&self) -> serde_json::Value {
        let kind = match self {
            ConfigError::UnknownVariant { .. } => "unknown_variant",
            ConfigError::MissingDifficulty(_) => "missing_difficulty",
            ConfigError::MissingPriority(_) => "missing_priority",
            ConfigError::InvalidLadder(_) => "invalid_ladder",
            ConfigError::InvalidSetting { .. } => "invalid_setting",
            ConfigError::Io { .. } => "io",
            ConfigError::Parse(_) => "parse",
            ConfigError::Serialize(_) => "serialize",
        };
        serde_json::json!({
            "kind": kind,
            "message": self.to_string(),
        })
    }
}
