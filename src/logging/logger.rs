//! The structured logger: field-carrying records, child loggers, sinks.
//!
//! A [`Logger`] emits [`Record`]s — a severity, a message, and a JSON object
//! of fields — through a [`Sink`]. The default sink forwards to [`tracing`],
//! so whatever subscriber the host application installed (pretty console,
//! JSON, OTLP) sees every record. Persistence, rotation, and shipping are the
//! subscriber's job, not this module's.

use std::sync::Arc;

use serde_json::{Map, Value};

use super::config::{Level, LoggerConfig, RuntimeMode};

// ── Record ───────────────────────────────────────────────────────────────────

/// One structured log record, as handed to the [`Sink`].
#[derive(Clone, Debug, serde::Serialize)]
pub struct Record {
    /// The emitting logger's display name (`name` or `name@version`).
    pub name: String,
    pub level: Level,
    pub message: String,
    /// Merged fields: app metadata, then child-logger fields, then the
    /// call-site fields — later layers win on key collision.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

// ── Sink ─────────────────────────────────────────────────────────────────────

/// Where finished records go.
pub trait Sink: Send + Sync + 'static {
    fn emit(&self, record: &Record);
}

/// The default sink: one `tracing` event per record, at the mapped level,
/// with the fields serialized as a single JSON value.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl Sink for TracingSink {
    fn emit(&self, record: &Record) {
        // `tracing` macros need a const level, hence the match.
        let fields = serde_json::to_string(&record.fields)
            .unwrap_or_else(|_| String::from("{}"));
        match record.level.tracing_level() {
            tracing::Level::TRACE => tracing::trace!(
                target: "kiroku",
                logger = %record.name, level = %record.level, fields = %fields,
                "{}", record.message
            ),
            tracing::Level::DEBUG => tracing::debug!(
                target: "kiroku",
                logger = %record.name, level = %record.level, fields = %fields,
                "{}", record.message
            ),
            tracing::Level::INFO => tracing::info!(
                target: "kiroku",
                logger = %record.name, level = %record.level, fields = %fields,
                "{}", record.message
            ),
            tracing::Level::WARN => tracing::warn!(
                target: "kiroku",
                logger = %record.name, level = %record.level, fields = %fields,
                "{}", record.message
            ),
            tracing::Level::ERROR => tracing::error!(
                target: "kiroku",
                logger = %record.name, level = %record.level, fields = %fields,
                "{}", record.message
            ),
        }
    }
}

/// Captures records in memory so tests can assert on what was (not) emitted.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct MemorySink {
    records: std::sync::Mutex<Vec<Record>>,
}

#[cfg(test)]
impl MemorySink {
    pub(crate) fn records(&self) -> Vec<Record> {
        self.records.lock().unwrap().clone()
    }

    pub(crate) fn messages(&self) -> Vec<String> {
        self.records().into_iter().map(|r| r.message).collect()
    }
}

#[cfg(test)]
impl Sink for MemorySink {
    fn emit(&self, record: &Record) {
        self.records.lock().unwrap().push(record.clone());
    }
}

// ── Logger ───────────────────────────────────────────────────────────────────

/// A structured logger handle.
///
/// Cheap to clone — configuration and sink live behind one `Arc`; only the
/// fixed-field map is per-handle. A handle is read-only after construction,
/// so sharing it across concurrent requests needs no locking.
#[derive(Clone)]
pub struct Logger {
    shared: Arc<Shared>,
    /// Fixed fields this handle merges into every record it emits.
    fields: Map<String, Value>,
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("display_name", &self.shared.display_name)
            .field("level", &self.shared.level)
            .field("mode", &self.shared.mode)
            .field("app_metadata", &self.shared.app_metadata)
            .field("fields", &self.fields)
            .finish_non_exhaustive()
    }
}

struct Shared {
    display_name: String,
    level: Level,
    mode: RuntimeMode,
    app_metadata: Option<Value>,
    sink: Arc<dyn Sink>,
}

impl Logger {
    pub(crate) fn from_config(config: &LoggerConfig, sink: Arc<dyn Sink>) -> Self {
        let app_metadata = config.app_metadata_enabled().then(|| {
            let mut app = Map::new();
            app.insert("name".to_owned(), Value::from(config.name()));
            if let Some(version) = config.version_str() {
                app.insert("version".to_owned(), Value::from(version));
            }
            app.insert("fullName".to_owned(), Value::from(config.display_name()));
            Value::Object(app)
        });

        Self {
            shared: Arc::new(Shared {
                display_name: config.display_name(),
                level: config.min_level(),
                mode: config.runtime_mode(),
                app_metadata,
                sink,
            }),
            fields: Map::new(),
        }
    }

    /// The configured display name (`name` or `name@version`).
    pub fn name(&self) -> &str {
        &self.shared.display_name
    }

    pub(crate) fn runtime_mode(&self) -> RuntimeMode {
        self.shared.mode
    }

    /// Derives a child logger: same config and sink, with `fields` merged
    /// into every record the child emits. Children may nest; the closest
    /// layer wins on key collision.
    ///
    /// `fields` is a JSON object (build it with [`serde_json::json!`]).
    pub fn child(&self, fields: Value) -> Logger {
        let mut merged = self.fields.clone();
        merged.extend(into_fields(fields));
        Logger { shared: Arc::clone(&self.shared), fields: merged }
    }

    pub fn trace(&self, fields: Value, message: &str) { self.log(Level::Trace, fields, message) }
    pub fn debug(&self, fields: Value, message: &str) { self.log(Level::Debug, fields, message) }
    pub fn info(&self, fields: Value, message: &str)  { self.log(Level::Info, fields, message) }
    pub fn warn(&self, fields: Value, message: &str)  { self.log(Level::Warn, fields, message) }
    pub fn error(&self, fields: Value, message: &str) { self.log(Level::Error, fields, message) }
    pub fn fatal(&self, fields: Value, message: &str) { self.log(Level::Fatal, fields, message) }

    /// Emits one record, unless `level` is below the configured minimum.
    pub fn log(&self, level: Level, fields: Value, message: &str) {
        if level < self.shared.level {
            return;
        }

        let mut merged = Map::new();
        if let Some(app) = &self.shared.app_metadata {
            merged.insert("app".to_owned(), app.clone());
        }
        merged.extend(self.fields.clone());
        merged.extend(into_fields(fields));

        let record = Record {
            name: self.shared.display_name.clone(),
            level,
            message: message.to_owned(),
            fields: merged,
        };
        self.shared.sink.emit(&record);
    }
}

/// Fields arrive as a [`Value`] for `json!` ergonomics. Objects are taken
/// as-is, `null` means "no fields", anything else lands under a `data` key.
fn into_fields(fields: Value) -> Map<String, Value> {
    match fields {
        Value::Object(map) => map,
        Value::Null => Map::new(),
        other => {
            let mut map = Map::new();
            map.insert("data".to_owned(), other);
            map
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn capture(config: LoggerConfig) -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let logger = Logger::from_config(&config, sink.clone());
        (logger, sink)
    }

    #[test]
    fn child_fields_ride_along_on_every_record() {
        let (logger, sink) = capture(LoggerConfig::new("api"));
        let child = logger.child(json!({"requestId": "r-1"}));

        child.info(json!({"step": "validate"}), "checking");
        child.info(Value::Null, "done");

        let records = sink.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].fields["requestId"], "r-1");
        assert_eq!(records[0].fields["step"], "validate");
        assert_eq!(records[1].fields["requestId"], "r-1");
    }

    #[test]
    fn call_site_fields_win_over_child_fields() {
        let (logger, sink) = capture(LoggerConfig::new("api"));
        let child = logger.child(json!({"stage": "outer"}));
        child.info(json!({"stage": "inner"}), "override");
        assert_eq!(sink.records()[0].fields["stage"], "inner");
    }

    #[test]
    fn records_below_the_minimum_level_are_dropped() {
        let (logger, sink) = capture(LoggerConfig::new("api").level(Level::Warn));
        logger.info(Value::Null, "quiet");
        logger.debug(Value::Null, "quieter");
        logger.error(Value::Null, "loud");
        assert_eq!(sink.messages(), ["loud"]);
    }

    #[test]
    fn app_metadata_is_attached_only_when_enabled() {
        let (logger, sink) = capture(
            LoggerConfig::new("api")
                .version("3.1.0")
                .mode(RuntimeMode::Production),
        );
        logger.info(Value::Null, "hello");
        let app = &sink.records()[0].fields["app"];
        assert_eq!(app["name"], "api");
        assert_eq!(app["version"], "3.1.0");
        assert_eq!(app["fullName"], "api@3.1.0");

        let (logger, sink) = capture(LoggerConfig::new("api"));
        logger.info(Value::Null, "hello");
        assert!(!sink.records()[0].fields.contains_key("app"));
    }

    #[test]
    fn non_object_fields_land_under_a_data_key() {
        let (logger, sink) = capture(LoggerConfig::new("api"));
        logger.info(json!([1, 2, 3]), "odd but allowed");
        assert_eq!(sink.records()[0].fields["data"], json!([1, 2, 3]));
    }

    #[test]
    fn display_name_is_exposed_on_the_handle() {
        let (logger, _) = capture(LoggerConfig::new("api").version("0.9"));
        assert_eq!(logger.name(), "api@0.9");
    }
}
