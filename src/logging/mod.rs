//! Structured, correlation-aware logging.
//!
//! Three pieces, composed in one request pipeline:
//!
//! - [`Registry`] — explicitly constructed holder of the application's one
//!   configured [`Logger`]. Initialize it at startup, before the server
//!   accepts traffic; [`Registry::get`] fails fast with a descriptive error
//!   until then.
//! - [`Logger`] — emits structured records (JSON fields + severity +
//!   message) and derives child loggers that stamp fixed fields onto every
//!   record. Default emission goes through [`tracing`]; swap the [`Sink`]
//!   to redirect it.
//! - [`RequestLogger`] — the middleware. Correlation and request
//!   identifiers, response timing, `X-*` headers, and a per-request child
//!   logger on the [`Context`](crate::Context), with optional
//!   `"HTTP Request"` / `"HTTP Response"` records.
//!
//! ```text
//! inbound request
//!     → RequestLogger: ids, headers, ctx.log, ["HTTP Request"]
//!     → your middleware / handler  (ctx.log() is already correlated)
//!     → RequestLogger: timing, X-Response-Time, ["HTTP Response"]
//! outbound response
//! ```
//!
//! What this module does not do — by design: log persistence, rotation,
//! shipping, and aggregation belong to the `tracing` subscriber the host
//! application installs. kiroku produces the records; the subscriber owns
//! their fate.

pub mod serializers;

mod config;
mod logger;
mod middleware;
mod registry;

pub use config::{Level, LoggerConfig, RuntimeMode};
pub use logger::{Logger, Record, Sink, TracingSink};
pub use middleware::{
    RequestLogger, X_CORRELATION_ID, X_POWERED_BY, X_REQUEST_ID, X_RESPONSE_TIME,
};
pub use registry::Registry;

#[cfg(test)]
pub(crate) use logger::MemorySink;
