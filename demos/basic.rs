//! Minimal kiroku example — JSON endpoints behind the request-logging middleware.
//!
//! Run with:
//!   RUST_LOG=info cargo run --example basic
//!
//! Try:
//!   curl -i http://localhost:3000/users/42
//!   curl -i -H 'x-correlation-id: abc-123' http://localhost:3000/users/42
//!   curl -i -X POST http://localhost:3000/users -d '{"name":"alice"}'
//!   curl -i http://localhost:3000/flaky
//!
//! Every response carries X-Request-ID, X-Correlation-ID, X-Response-Time
//! and X-Powered-By. Send your own x-correlation-id and watch it come back.

use http::{Method, StatusCode};
use kiroku::logging::{LoggerConfig, Registry, RequestLogger, RuntimeMode, serializers};
use kiroku::{Context, Error, Response, Router, Server};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt::init();

    // Initialize the registry before the server accepts a single request.
    let registry = Registry::new();
    let logger = registry.initialize(
        LoggerConfig::new("basic-demo")
            .version(env!("CARGO_PKG_VERSION"))
            .mode(RuntimeMode::Development),
    )?;

    let app = Router::new()
        // development mode defaults both record kinds off; turn them on so
        // the demo has something to show
        .layer(RequestLogger::new(logger).log_requests(true).log_responses(true))
        .on(Method::GET,  "/users/{id}", get_user)
        .on(Method::POST, "/users",      create_user)
        .on(Method::GET,  "/flaky",      flaky);

    Server::bind("0.0.0.0:3000").serve(app).await
}

// GET /users/{id}
//
// ctx.log() is the per-request child logger — requestId and correlationId
// are already on it, so this one line is fully correlated.
async fn get_user(ctx: Context) -> Result<Response, Error> {
    let id = ctx.request().param("id").unwrap_or("unknown");
    if let Some(log) = ctx.log() {
        log.info(json!({"user": id}), "user requested");
    }
    Ok(Response::json(format!(r#"{{"id":"{id}","name":"alice"}}"#).into_bytes()))
}

// POST /users
//
// A malformed body is an application outcome (400), not a chain failure —
// log it through the error serializer and answer normally.
async fn create_user(ctx: Context) -> Result<Response, Error> {
    match serde_json::from_slice::<serde_json::Value>(ctx.request().body()) {
        Ok(_) => Ok(Response::builder()
            .status(StatusCode::CREATED)
            .header("location", "/users/99")
            .json(r#"{"id":"99","name":"new_user"}"#.to_owned().into_bytes())),
        Err(e) => {
            if let Some(log) = ctx.log() {
                log.warn(json!({"err": serializers::error(&e)}), "rejecting malformed body");
            }
            Ok(Response::status(StatusCode::BAD_REQUEST))
        }
    }
}

// GET /flaky
//
// A real failure: the error unwinds through the middleware (no "HTTP
// Response" record, no X-Response-Time) and the server answers 500.
async fn flaky(_ctx: Context) -> Result<Response, Error> {
    Err(Error::handler("upstream timed out"))
}
