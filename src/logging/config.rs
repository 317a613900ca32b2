//! Logger configuration: severity levels, runtime mode, and the builder
//! handed to [`Registry::initialize`](crate::logging::Registry::initialize).

use serde::{Deserialize, Serialize};

// ── RuntimeMode ──────────────────────────────────────────────────────────────

/// Deployment mode, passed explicitly at construction time.
///
/// The mode decides defaults only — app metadata on records, request/response
/// logging in the middleware. All three default to on in `Production` and off
/// in `Development`, where per-request log lines are noise. Nothing in kiroku
/// reads environment variables to guess this; if you want env-driven
/// behaviour, resolve it in `main` and pass the result in.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RuntimeMode {
    #[default]
    Development,
    Production,
}

impl RuntimeMode {
    pub fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

// ── Level ────────────────────────────────────────────────────────────────────

/// Record severity, ordered least to most severe.
///
/// `tracing` tops out at `ERROR`, so `Fatal` emits as an `ERROR` event; the
/// record itself still says `"fatal"`.
#[derive(Clone, Copy, Debug, Default, Eq, Ord, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info  => "info",
            Self::Warn  => "warn",
            Self::Error => "error",
            Self::Fatal => "fatal",
        }
    }

    pub(crate) fn tracing_level(self) -> tracing::Level {
        match self {
            Self::Trace => tracing::Level::TRACE,
            Self::Debug => tracing::Level::DEBUG,
            Self::Info  => tracing::Level::INFO,
            Self::Warn  => tracing::Level::WARN,
            Self::Error | Self::Fatal => tracing::Level::ERROR,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── LoggerConfig ─────────────────────────────────────────────────────────────

/// Configuration for one structured logger. Immutable once handed to
/// [`Registry::initialize`](crate::logging::Registry::initialize).
///
/// ```rust
/// use kiroku::logging::{Level, LoggerConfig, RuntimeMode};
///
/// let config = LoggerConfig::new("checkout")
///     .version("1.4.2")
///     .level(Level::Debug)
///     .mode(RuntimeMode::Production);
/// assert_eq!(config.display_name(), "checkout@1.4.2");
/// ```
#[derive(Clone, Debug)]
pub struct LoggerConfig {
    name: String,
    version: Option<String>,
    level: Level,
    mode: RuntimeMode,
    include_app_metadata: Option<bool>,
}

impl LoggerConfig {
    /// Starts a config for a logger called `name`. The name is required and
    /// validated (non-empty) at initialization, not here.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: None,
            level: Level::default(),
            mode: RuntimeMode::default(),
            include_app_metadata: None,
        }
    }

    /// Application version, folded into the display name as `name@version`.
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Minimum severity emitted. Defaults to [`Level::Info`].
    pub fn level(mut self, level: Level) -> Self {
        self.level = level;
        self
    }

    /// Deployment mode. Defaults to [`RuntimeMode::Development`].
    pub fn mode(mut self, mode: RuntimeMode) -> Self {
        self.mode = mode;
        self
    }

    /// Force app metadata (`app: {name, version, fullName}`) on or off for
    /// every record, overriding the mode-derived default.
    pub fn include_app_metadata(mut self, on: bool) -> Self {
        self.include_app_metadata = Some(on);
        self
    }

    /// `name`, or `name@version` when a version was supplied.
    pub fn display_name(&self) -> String {
        match &self.version {
            Some(v) => format!("{}@{}", self.name, v),
            None => self.name.clone(),
        }
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn version_str(&self) -> Option<&str> { self.version.as_deref() }
    pub fn min_level(&self) -> Level { self.level }
    pub fn runtime_mode(&self) -> RuntimeMode { self.mode }

    /// The resolved metadata switch: explicit override, else on only in
    /// production.
    pub fn app_metadata_enabled(&self) -> bool {
        self.include_app_metadata
            .unwrap_or(self.mode.is_production())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_folds_in_the_version() {
        assert_eq!(LoggerConfig::new("api").display_name(), "api");
        assert_eq!(
            LoggerConfig::new("api").version("2.0.1").display_name(),
            "api@2.0.1"
        );
    }

    #[test]
    fn app_metadata_defaults_follow_the_mode() {
        assert!(!LoggerConfig::new("api").app_metadata_enabled());
        assert!(
            LoggerConfig::new("api")
                .mode(RuntimeMode::Production)
                .app_metadata_enabled()
        );
        // an explicit override beats the mode, both ways
        assert!(
            LoggerConfig::new("api")
                .include_app_metadata(true)
                .app_metadata_enabled()
        );
        assert!(
            !LoggerConfig::new("api")
                .mode(RuntimeMode::Production)
                .include_app_metadata(false)
                .app_metadata_enabled()
        );
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(Level::Trace < Level::Debug);
        assert!(Level::Info < Level::Warn);
        assert!(Level::Error < Level::Fatal);
    }
}
