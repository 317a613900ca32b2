//! # kiroku
//!
//! A minimal HTTP framework whose one batteries-included feature is
//! structured request logging. Nothing more. Nothing less.
//!
//! ## The contract
//!
//! nginx handles TLS, rate limiting, slow clients, and body-size limits.
//! kiroku does not — by design. What kiroku *does* own is the part most
//! frameworks bolt on last: every request gets a correlation identifier, a
//! hop-local request identifier, millisecond timing, and a child logger
//! pre-stamped with those fields — before your handler runs a single line.
//!
//! - Radix-tree routing — O(path-length) lookup via [`matchit`]
//! - Koa-style middleware — a [`Middleware`] wraps the chain, awaits
//!   [`Next::run`], and sees the response (or failure) on the way out
//! - Structured logging — [`logging::Registry`], child loggers,
//!   correlation-id propagation, `X-Request-ID` / `X-Response-Time` headers
//! - Graceful shutdown — SIGTERM / Ctrl-C, drains in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use http::Method;
//! use kiroku::logging::{LoggerConfig, Registry, RequestLogger, RuntimeMode};
//! use kiroku::{Context, Error, Response, Router, Server};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Error> {
//!     let registry = Registry::new();
//!     let logger = registry.initialize(
//!         LoggerConfig::new("users-api")
//!             .version(env!("CARGO_PKG_VERSION"))
//!             .mode(RuntimeMode::Production),
//!     )?;
//!
//!     let app = Router::new()
//!         .layer(RequestLogger::new(logger))
//!         .on(Method::GET, "/users/{id}", get_user);
//!
//!     Server::bind("0.0.0.0:3000").serve(app).await
//! }
//!
//! async fn get_user(ctx: Context) -> Result<Response, Error> {
//!     let id = ctx.request().param("id").unwrap_or("unknown");
//!     if let Some(log) = ctx.log() {
//!         // requestId + correlationId are already on this logger
//!         log.info(json!({"user": id}), "user requested");
//!     }
//!     Ok(Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes()))
//! }
//! ```
//!
//! Every response from that server carries `X-Request-ID`,
//! `X-Correlation-ID`, `X-Response-Time`, and `X-Powered-By: users-api@…`;
//! an inbound `X-Correlation-ID` is reused, so one identifier follows a call
//! across service hops.

mod context;
mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod logging;
pub mod middleware;

pub use context::Context;
pub use error::Error;
pub use handler::{BoxFuture, Handler};
pub use middleware::{Middleware, Next};
pub use request::Request;
pub use response::{ContentType, IntoResponse, Response};
pub use router::Router;
pub use server::Server;
