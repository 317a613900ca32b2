//! The request-logging middleware.
//!
//! Wraps the downstream chain with correlation identifiers, timing, and
//! (optionally) one structured record per request and per response:
//!
//! - **`X-Request-ID`** — freshly generated UUID v4, unique to this hop.
//! - **`X-Correlation-ID`** — taken from the inbound header when present,
//!   freshly generated otherwise, so one identifier threads through every
//!   hop of a distributed call.
//! - **`X-Response-Time`** — elapsed handling time in decimal seconds.
//! - **`X-Powered-By`** — the configured logger name.
//!
//! Downstream handlers get a child logger on the context (`ctx.log()`) with
//! `requestId` and `correlationId` already merged in, whether or not the
//! per-request records are enabled.
//!
//! A failure from the downstream chain propagates unchanged: no response
//! record, no timing header, no translation. If the host aborts a request
//! mid-flight (client disconnect), the post-await steps never run — the
//! request simply leaves no response record.

use std::time::Instant;

use serde_json::json;
use uuid::Uuid;

use super::logger::Logger;
use super::serializers;
use crate::context::Context;
use crate::handler::BoxFuture;
use crate::middleware::{Middleware, Next};

/// Inbound header consulted for a cross-hop correlation identifier.
pub const X_CORRELATION_ID: &str = "x-correlation-id";
/// Outbound header carrying the hop-local request identifier.
pub const X_REQUEST_ID: &str = "x-request-id";
/// Outbound header naming the configured application.
pub const X_POWERED_BY: &str = "x-powered-by";
/// Outbound header carrying elapsed handling time in decimal seconds.
pub const X_RESPONSE_TIME: &str = "x-response-time";

/// Structured request/response logging around the rest of the chain.
///
/// ```rust,ignore
/// let registry = Registry::new();
/// let logger = registry.initialize(LoggerConfig::new("api").mode(RuntimeMode::Production))?;
///
/// let app = Router::new()
///     .layer(RequestLogger::new(logger))
///     .on(Method::GET, "/users/{id}", get_user);
/// ```
pub struct RequestLogger {
    logger: Logger,
    log_requests: bool,
    log_responses: bool,
}

impl RequestLogger {
    /// Builds the middleware around an initialized [`Logger`].
    ///
    /// Per-request and per-response records default to on in production and
    /// off in development; the identifiers, headers, and child logger are
    /// unconditional.
    pub fn new(logger: Logger) -> Self {
        let verbose = logger.runtime_mode().is_production();
        Self { logger, log_requests: verbose, log_responses: verbose }
    }

    /// Emit an `"HTTP Request"` record as each request arrives.
    pub fn log_requests(mut self, on: bool) -> Self {
        self.log_requests = on;
        self
    }

    /// Emit an `"HTTP Response"` record as each response leaves.
    pub fn log_responses(mut self, on: bool) -> Self {
        self.log_responses = on;
        self
    }
}

impl Middleware for RequestLogger {
    fn handle(&self, mut ctx: Context, next: Next) -> BoxFuture {
        let logger = self.logger.clone();
        let log_requests = self.log_requests;
        let log_responses = self.log_responses;

        Box::pin(async move {
            let start = Instant::now();

            let request_id = Uuid::new_v4().to_string();
            // An empty inbound value counts as absent: a hop that sends the
            // header with nothing in it must not break the correlation chain.
            let correlation_id = ctx
                .request()
                .header(X_CORRELATION_ID)
                .filter(|v| !v.is_empty())
                .map(str::to_owned)
                .unwrap_or_else(|| Uuid::new_v4().to_string());

            // The response serializer reports the originating request line.
            let method = ctx.request().method().clone();
            let url = ctx.request().uri().clone();

            ctx.set_correlation_id(correlation_id.clone());

            // Attached before the downstream runs, even with request records
            // off — nested handlers rely on ctx.log() being correlated.
            let log = logger.child(json!({
                "requestId": request_id,
                "correlationId": correlation_id,
            }));
            ctx.set_log(log.clone());

            if log_requests {
                log.info(
                    json!({
                        "request": serializers::request(ctx.request()),
                        "requestId": request_id,
                    }),
                    "HTTP Request",
                );
            }

            // A downstream failure propagates unchanged; everything past
            // this `?` is success-path only.
            let mut response = next.run(ctx).await?;

            // Millisecond-resolution report from a nanosecond-capable clock:
            // truncate to whole milliseconds, then express as seconds.
            let seconds = start.elapsed().as_millis() as f64 / 1000.0;
            response.set_response_time(seconds);
            response.set_header(X_POWERED_BY, logger.name());
            response.set_header(X_REQUEST_ID, &request_id);
            response.set_header(X_CORRELATION_ID, &correlation_id);
            response.set_header(X_RESPONSE_TIME, &seconds.to_string());

            if log_responses {
                log.info(
                    json!({"response": serializers::response(&method, &url, &response)}),
                    "HTTP Response",
                );
            }

            Ok(response)
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use http::Method;
    use serde_json::Value;

    use super::*;
    use crate::error::Error;
    use crate::handler::Handler;
    use crate::logging::MemorySink;
    use crate::logging::{LoggerConfig, Registry};
    use crate::middleware::BoxedMiddleware;
    use crate::request::Request;
    use crate::response::Response;

    fn capture() -> (Logger, Arc<MemorySink>) {
        let sink = Arc::new(MemorySink::default());
        let logger = Registry::new()
            .initialize_with_sink(LoggerConfig::new("svc").version("1.0"), sink.clone())
            .unwrap();
        (logger, sink)
    }

    async fn run(
        mw: RequestLogger,
        req: Request,
        handler: impl Handler,
    ) -> Result<Response, Error> {
        let next = Next::new(
            Arc::from(Vec::<BoxedMiddleware>::new()),
            handler.into_boxed_handler(),
        );
        mw.handle(Context::new(req), next).await
    }

    async fn ok(_ctx: Context) -> Result<Response, Error> {
        Ok(Response::text("ok"))
    }

    #[tokio::test]
    async fn inbound_correlation_id_is_echoed_exactly() {
        let (logger, _) = capture();
        let seen = Arc::new(Mutex::new(None::<String>));
        let seen_in_handler = Arc::clone(&seen);

        let req = Request::test(Method::GET, "/", &[("X-Correlation-ID", "abc-123")]);
        let res = run(
            RequestLogger::new(logger),
            req,
            move |ctx: Context| {
                let seen = Arc::clone(&seen_in_handler);
                async move {
                    *seen.lock().unwrap() = ctx.correlation_id().map(str::to_owned);
                    Ok(Response::text("ok"))
                }
            },
        )
        .await
        .unwrap();

        assert_eq!(res.header(X_CORRELATION_ID), Some("abc-123"));
        assert_eq!(seen.lock().unwrap().as_deref(), Some("abc-123"));
    }

    #[tokio::test]
    async fn absent_or_empty_correlation_header_gets_a_fresh_uuid() {
        let (logger, _) = capture();

        let res = run(
            RequestLogger::new(logger.clone()),
            Request::test(Method::GET, "/", &[]),
            ok,
        )
        .await
        .unwrap();
        let first = res.header(X_CORRELATION_ID).unwrap().to_owned();
        let parsed = Uuid::parse_str(&first).expect("a valid uuid");
        assert_eq!(parsed.get_version_num(), 4);

        // empty string counts as absent, and each generation is fresh
        let res = run(
            RequestLogger::new(logger),
            Request::test(Method::GET, "/", &[("x-correlation-id", "")]),
            ok,
        )
        .await
        .unwrap();
        let second = res.header(X_CORRELATION_ID).unwrap();
        Uuid::parse_str(second).expect("a valid uuid");
        assert_ne!(first, second);
    }

    #[tokio::test]
    async fn request_ids_differ_even_when_correlation_ids_match() {
        let (logger, _) = capture();
        let inbound = &[("x-correlation-id", "abc-123")];

        let res1 = run(
            RequestLogger::new(logger.clone()),
            Request::test(Method::GET, "/", inbound),
            ok,
        )
        .await
        .unwrap();
        let res2 = run(
            RequestLogger::new(logger),
            Request::test(Method::GET, "/", inbound),
            ok,
        )
        .await
        .unwrap();

        assert_eq!(res1.header(X_CORRELATION_ID), res2.header(X_CORRELATION_ID));
        assert_ne!(res1.header(X_REQUEST_ID), res2.header(X_REQUEST_ID));
    }

    #[tokio::test]
    async fn response_time_reflects_a_measurable_delay() {
        let (logger, _) = capture();

        let res = run(
            RequestLogger::new(logger),
            Request::test(Method::GET, "/", &[]),
            |_ctx: Context| async move {
                tokio::time::sleep(std::time::Duration::from_millis(50)).await;
                Ok(Response::text("slow"))
            },
        )
        .await
        .unwrap();

        let reported: f64 = res.header(X_RESPONSE_TIME).unwrap().parse().unwrap();
        assert!(reported >= 0.05, "expected >= 0.05s, got {reported}");
        assert_eq!(res.response_time(), Some(reported));
    }

    #[tokio::test]
    async fn powered_by_carries_the_configured_name() {
        let (logger, _) = capture();
        let res = run(
            RequestLogger::new(logger),
            Request::test(Method::GET, "/", &[]),
            ok,
        )
        .await
        .unwrap();
        assert_eq!(res.header(X_POWERED_BY), Some("svc@1.0"));
    }

    #[tokio::test]
    async fn enabled_logging_emits_one_record_each_way() {
        let (logger, sink) = capture();

        run(
            RequestLogger::new(logger).log_requests(true).log_responses(true),
            Request::test(Method::GET, "/users/7", &[("accept", "application/json")]),
            ok,
        )
        .await
        .unwrap();

        assert_eq!(sink.messages(), ["HTTP Request", "HTTP Response"]);

        let records = sink.records();
        let request = &records[0].fields["request"];
        assert_eq!(request["method"], "GET");
        assert_eq!(request["url"], "/users/7");
        Uuid::parse_str(records[0].fields["requestId"].as_str().unwrap())
            .expect("requestId is a uuid");

        let response = &records[1].fields["response"];
        assert_eq!(response["status"], 200);
        assert_eq!(response["method"], "GET");
        assert!(response["responseTime"].is_f64() || response["responseTime"].is_u64());
        // both records carry the correlation fields from the child logger
        for record in &records {
            assert!(record.fields["requestId"].is_string());
            assert!(record.fields["correlationId"].is_string());
        }
    }

    #[tokio::test]
    async fn disabled_logging_still_populates_ctx_log() {
        let (logger, sink) = capture();

        // development defaults: both record kinds off
        run(
            RequestLogger::new(logger),
            Request::test(Method::GET, "/", &[]),
            |ctx: Context| async move {
                ctx.log()
                    .expect("middleware attaches a logger")
                    .info(Value::Null, "from handler");
                Ok(Response::text("ok"))
            },
        )
        .await
        .unwrap();

        assert_eq!(sink.messages(), ["from handler"]);
        let record = &sink.records()[0];
        assert!(record.fields["requestId"].is_string());
        assert!(record.fields["correlationId"].is_string());
    }

    #[tokio::test]
    async fn downstream_failure_propagates_and_suppresses_the_response_record() {
        let (logger, sink) = capture();

        let err = run(
            RequestLogger::new(logger).log_requests(true).log_responses(true),
            Request::test(Method::GET, "/", &[]),
            |_ctx: Context| async move { Err::<Response, _>(Error::handler("boom")) },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, Error::Handler(_)));
        assert_eq!(err.to_string(), "boom");
        // the request record went out; the response record must not have
        assert_eq!(sink.messages(), ["HTTP Request"]);
    }
}
