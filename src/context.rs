//! Per-request context.
//!
//! One [`Context`] is created per inbound request and owned by that request's
//! handling scope — middleware and handler pass it along by value, and it is
//! dropped when the response is sent. Nothing in it is shared between
//! concurrent requests.

use crate::logging::Logger;
use crate::request::Request;

/// Everything a middleware or handler gets to see about one request.
///
/// The two logging fields start out `None`. The request-logging middleware
/// fills both in before it invokes the rest of the chain, so any handler
/// running behind it can rely on them; a handler mounted without that
/// middleware sees `None` rather than a silently-null logger.
pub struct Context {
    request: Request,
    correlation_id: Option<String>,
    log: Option<Logger>,
}

impl Context {
    pub(crate) fn new(request: Request) -> Self {
        Self { request, correlation_id: None, log: None }
    }

    pub fn request(&self) -> &Request { &self.request }

    /// The correlation identifier for this request — shared across every hop
    /// of a distributed call, unlike the hop-local request id.
    pub fn correlation_id(&self) -> Option<&str> {
        self.correlation_id.as_deref()
    }

    /// The request-scoped child logger, pre-populated with `requestId` and
    /// `correlationId` fields. Emit through this and every record you log is
    /// already correlated:
    ///
    /// ```rust,ignore
    /// if let Some(log) = ctx.log() {
    ///     log.info(json!({"user": id}), "user loaded");
    /// }
    /// ```
    pub fn log(&self) -> Option<&Logger> {
        self.log.as_ref()
    }

    /// Attaches a correlation id for downstream handlers. Called by the
    /// request-logging middleware; available to custom middleware too.
    pub fn set_correlation_id(&mut self, id: impl Into<String>) {
        self.correlation_id = Some(id.into());
    }

    /// Attaches a request-scoped logger for downstream handlers.
    pub fn set_log(&mut self, logger: Logger) {
        self.log = Some(logger);
    }
}
