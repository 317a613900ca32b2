//! HTTP server and graceful shutdown.
//!
//! # Graceful shutdown and Kubernetes
//!
//! When Kubernetes terminates a pod it sends **SIGTERM** and waits
//! `terminationGracePeriodSeconds` (default 30 s) before sending SIGKILL.
//!
//! The server reacts by:
//! 1. Immediately stopping `listener.accept()` — no new connections are made.
//! 2. Letting every in-flight connection task run to completion.
//! 3. Returning from [`Server::serve`], which lets `main` exit cleanly.
//!
//! Set `terminationGracePeriodSeconds` in your pod spec to a value longer
//! than your slowest request. 30 s is a reasonable default for most APIs.
//!
//! A request cancelled by the client mid-flight simply drops its connection
//! task; middleware post-processing (timing, response records) never runs
//! for it. That is the documented trade-off, not an accident.

use std::net::SocketAddr;
use std::sync::Arc;

use http::StatusCode;
use http_body_util::BodyExt;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::context::Context;
use crate::error::Error;
use crate::middleware::{BoxedMiddleware, Next};
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;

/// The HTTP server.
pub struct Server {
    addr: SocketAddr,
}

impl Server {
    /// Configures the server to bind to `addr` when [`serve`](Server::serve)
    /// is called.
    ///
    /// # Panics
    ///
    /// Panics if `addr` is not a valid `host:port` string.
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use kiroku::Server;
    /// let server = Server::bind("0.0.0.0:3000");
    /// ```
    pub fn bind(addr: &str) -> Self {
        let addr: SocketAddr = addr.parse().expect("invalid socket address");
        Self { addr }
    }

    /// Starts accepting connections and dispatching them through `router`.
    ///
    /// Initialize your logger [`Registry`](crate::logging::Registry) before
    /// calling this — the middleware stack is already built by now, and a
    /// request must never race logger initialization.
    ///
    /// Returns only after a full graceful shutdown (SIGTERM or Ctrl-C,
    /// followed by all in-flight requests completing).
    pub async fn serve(self, router: Router) -> Result<(), Error> {
        let listener = TcpListener::bind(self.addr).await?;

        // The middleware stack is shared by every request; snapshot it into
        // an Arc'd slice once so per-request chains are clone-only.
        let stack: Arc<[BoxedMiddleware]> = Arc::from(router.middleware().to_vec());

        // Wrap router in Arc so it can be shared across concurrent connection
        // tasks without copying the entire routing table.
        let router = Arc::new(router);

        info!(addr = %self.addr, "kiroku listening");

        // JoinSet tracks every spawned connection task so we can wait for
        // them all to finish during graceful shutdown.
        let mut tasks = tokio::task::JoinSet::new();

        // Pin the shutdown future so we can poll it in a loop.
        // Futures in Rust must not move in memory after the first poll — that
        // is what `Pin` enforces. `tokio::pin!` pins the future on the stack.
        let shutdown = shutdown_signal();
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                // `biased` makes select! check arms top-to-bottom instead of
                // randomly. We check shutdown first so a SIGTERM immediately
                // stops accepting new connections, even if more are queued.
                biased;

                () = &mut shutdown => {
                    info!(in_flight = tasks.len(), "shutdown signal received, draining connections");
                    break;
                }

                res = listener.accept() => {
                    let (stream, remote_addr) = match res {
                        Ok(v) => v,
                        Err(e) => {
                            error!("accept error: {e}");
                            continue;
                        }
                    };

                    let router = Arc::clone(&router);
                    let stack = Arc::clone(&stack);
                    // TokioIo adapts tokio's AsyncRead/AsyncWrite to the hyper
                    // IO traits.
                    let io = TokioIo::new(stream);

                    tasks.spawn(async move {
                        // `service_fn` turns a plain async function into a
                        // hyper `Service`. The closure is called once per
                        // request on the connection, not once per connection.
                        let svc = service_fn(move |req| {
                            let router = Arc::clone(&router);
                            let stack = Arc::clone(&stack);
                            async move { dispatch(router, stack, req).await }
                        });

                        // `auto::Builder` transparently handles both HTTP/1.1
                        // and HTTP/2 — whatever the client negotiates.
                        if let Err(e) = ConnBuilder::new(TokioExecutor::new())
                            .serve_connection(io, svc)
                            .await
                        {
                            error!(peer = %remote_addr, "connection error: {e}");
                        }
                    });
                }

                // Reap finished connection tasks so the JoinSet does not grow
                // without bound on long-running servers.
                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        // Drain: wait for every in-flight connection to finish before we return.
        while tasks.join_next().await.is_some() {}

        info!("kiroku stopped");
        Ok(())
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Core hot path: routes one request through the middleware chain and
/// produces one response.
///
/// The error type is [`Infallible`](std::convert::Infallible) — every failure
/// is handled here (404, 400, 500) so hyper never sees an error. This is the
/// error-handling layer middleware propagates into: a chain failure is logged
/// and mapped to `500 Internal Server Error`, untranslated until this point.
async fn dispatch(
    router: Arc<Router>,
    stack: Arc<[BoxedMiddleware]>,
    req: hyper::Request<hyper::body::Incoming>,
) -> Result<http::Response<http_body_util::Full<bytes::Bytes>>, std::convert::Infallible> {
    let (parts, body) = req.into_parts();

    let body = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            error!("body read error: {e}");
            return Ok(Response::status(StatusCode::BAD_REQUEST).into_inner());
        }
    };

    let Some((handler, params)) = router.lookup(&parts.method, parts.uri.path()) else {
        return Ok(Response::status(StatusCode::NOT_FOUND).into_inner());
    };

    let ctx = Context::new(Request::new(parts, body, params));
    let next = Next::new(stack, handler);

    let response = match next.run(ctx).await {
        Ok(response) => response,
        Err(e) => {
            error!(error = %e, "request failed");
            Response::status(StatusCode::INTERNAL_SERVER_ERROR)
        }
    };

    Ok(response.into_inner())
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on the first shutdown signal the process receives.
///
/// On Unix this listens for both **SIGTERM** (sent by `kubectl` and the
/// Kubernetes control plane) and **SIGINT** (Ctrl-C, for local dev).
/// On Windows only Ctrl-C is available.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let sigterm = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    // `pending()` is a future that never resolves — on non-Unix platforms
    // the SIGTERM arm is effectively disabled.
    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c   => {}
        () = sigterm  => {}
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::logging::MemorySink;
    use crate::logging::{LoggerConfig, Registry, RequestLogger};

    // Mirrors dispatch() without a socket: lookup, chain, error mapping.
    async fn roundtrip(
        router: Router,
        req: http::Request<String>,
    ) -> http::Response<http_body_util::Full<bytes::Bytes>> {
        let stack: Arc<[BoxedMiddleware]> = Arc::from(router.middleware().to_vec());
        let (parts, body) = req.into_parts();
        let body = bytes::Bytes::from(body);

        let Some((handler, params)) = router.lookup(&parts.method, parts.uri.path()) else {
            return Response::status(StatusCode::NOT_FOUND).into_inner();
        };
        let ctx = Context::new(Request::new(parts, body, params));
        match Next::new(stack, handler).run(ctx).await {
            Ok(response) => response.into_inner(),
            Err(_) => Response::status(StatusCode::INTERNAL_SERVER_ERROR).into_inner(),
        }
    }

    #[tokio::test]
    async fn the_full_pipeline_stamps_correlation_headers() {
        let sink = Arc::new(MemorySink::default());
        let logger = Registry::new()
            .initialize_with_sink(LoggerConfig::new("pipeline"), sink.clone())
            .unwrap();

        let router = Router::new()
            .layer(RequestLogger::new(logger))
            .on(Method::GET, "/users/{id}", |ctx: Context| async move {
                let id = ctx.request().param("id").unwrap_or("unknown").to_owned();
                Ok(Response::json(format!(r#"{{"id":"{id}"}}"#).into_bytes()))
            });

        let req = http::Request::builder()
            .method(Method::GET)
            .uri("/users/42")
            .header("x-correlation-id", "abc-123")
            .body(String::new())
            .unwrap();

        let res = roundtrip(router, req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["x-correlation-id"], "abc-123");
        assert!(res.headers().contains_key("x-request-id"));
        assert!(res.headers().contains_key("x-response-time"));
        assert_eq!(res.headers()["x-powered-by"], "pipeline");
    }

    #[tokio::test]
    async fn unrouted_paths_fall_through_to_404() {
        let router = Router::new();
        let req = http::Request::builder()
            .method(Method::GET)
            .uri("/missing")
            .body(String::new())
            .unwrap();
        let res = roundtrip(router, req).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
    }
}
