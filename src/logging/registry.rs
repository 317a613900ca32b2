//! Holder of the application's one configured logger.
//!
//! A [`Registry`] is an explicitly constructed value — build it in `main`,
//! initialize it, and hand clones to whatever needs logging. There is no
//! hidden global and no transparent proxy standing in for an uninitialized
//! logger: [`Registry::get`] returns a `Result`, and the error names the
//! missing precondition.
//!
//! Initialization ordinarily happens exactly once, at startup, before the
//! server accepts traffic. Calling [`initialize`](Registry::initialize) again
//! replaces the stored logger; handles already cloned out keep their old
//! configuration.

use std::sync::{Arc, RwLock};

use super::config::LoggerConfig;
use super::logger::{Logger, Sink, TracingSink};
use crate::error::Error;

/// Process-level registry for the configured [`Logger`]. Clone freely — all
/// clones share one slot.
#[derive(Clone, Default)]
pub struct Registry {
    slot: Arc<RwLock<Option<Logger>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates `config`, builds the logger, stores it (replacing any prior
    /// instance), and returns a handle.
    ///
    /// Fails with [`Error::Configuration`] when the name is empty — a logger
    /// with no name would produce records nobody can attribute.
    pub fn initialize(&self, config: LoggerConfig) -> Result<Logger, Error> {
        self.initialize_with_sink(config, Arc::new(TracingSink))
    }

    /// [`initialize`](Registry::initialize) with a custom [`Sink`] instead of
    /// the default `tracing` emission.
    pub fn initialize_with_sink(
        &self,
        config: LoggerConfig,
        sink: Arc<dyn Sink>,
    ) -> Result<Logger, Error> {
        if config.name().is_empty() {
            return Err(Error::Configuration(
                "a name must be specified for the logger".to_owned(),
            ));
        }

        let logger = Logger::from_config(&config, sink);
        *self.slot.write().expect("logger slot poisoned") = Some(logger.clone());
        Ok(logger)
    }

    /// The current logger, or [`Error::Uninitialized`] if
    /// [`initialize`](Registry::initialize) has never succeeded.
    pub fn get(&self) -> Result<Logger, Error> {
        self.slot
            .read()
            .expect("logger slot poisoned")
            .clone()
            .ok_or(Error::Uninitialized)
    }
}
