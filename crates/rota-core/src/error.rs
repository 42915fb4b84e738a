use thiserror::Error;

/// Problems in the weight configuration or availability snapshot.
///
/// These are fatal at load time; a reload that produces one leaves the running
/// configuration in place.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("failed to parse {what}: {message}")]
    Parse { what: &'static str, message: String },

    #[error("skill '{skill}' has no base weight")]
    MissingBaseWeight { skill: String },

    #[error("{what} '{key}' must be finite and non-negative, got {value}")]
    InvalidWeight {
        what: &'static str,
        key: String,
        value: f64,
    },

    #[error("{kind} fallback chain is cyclic through '{node}'")]
    CyclicFallback { kind: &'static str, node: String },

    #[error("worker '{worker}' has {field} {value}; modifiers must be finite and positive")]
    InvalidModifier {
        worker: String,
        field: &'static str,
        value: f64,
    },

    #[error("special task '{task}' is invalid: {reason}")]
    InvalidTask { task: String, reason: String },

    #[error("balancer setting '{field}' is invalid: {value}")]
    InvalidSetting { field: &'static str, value: f64 },

    #[error("duplicate worker id '{0}'")]
    DuplicateWorker(String),

    #[error("shift window references unknown worker '{0}'")]
    UnknownWorker(String),

    #[error("shift window for '{worker}' in '{modality}' does not end after it starts")]
    InvalidWindow { worker: String, modality: String },
}

/// Errors surfaced by the assignment engine.
///
/// Running out of candidates is not an error; see [`crate::Balancer::select_and_commit`].
#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("unknown special task '{0}'")]
    UnknownTask(String),

    #[error("engine state lock poisoned")]
    Poisoned,
}
