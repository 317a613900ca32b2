//! Middleware layer.
//!
//! Middleware intercepts requests and responses and is the right place for
//! cross-cutting concerns: structured request logging, correlation-id
//! injection, and authentication-header inspection.
//!
//! A middleware wraps the rest of the chain. It sees the [`Context`] before
//! the handler does, decides when (and whether) to call [`Next::run`], and
//! sees the outcome — success or failure — on the way back out:
//!
//! ```text
//! request ──▶ middleware A ──▶ middleware B ──▶ handler
//!                 │                 │              │
//! response ◀──────┴─────────◀──────┴───────◀──────┘
//! ```
//!
//! Registration order is execution order: the first `.layer(…)` on the router
//! is the outermost wrapper. An `Err` from anywhere inside the chain unwinds
//! through every outer middleware unchanged — middleware that wants to skip
//! its post-processing on failure simply uses `?` on `next.run(ctx).await`.
//!
//! The built-in request-logging middleware lives in
//! [`logging`](crate::logging); write your own with [`from_fn`] or by
//! implementing [`Middleware`] on a struct.

use std::future::Future;
use std::sync::Arc;

use crate::context::Context;
use crate::error::Error;
use crate::handler::{BoxFuture, BoxedHandler};
use crate::response::Response;

// ── Middleware trait ──────────────────────────────────────────────────────────

/// A link in the request-handling chain.
///
/// Same type-erasure scheme as [`Handler`](crate::Handler): implementations
/// are stored as `Arc<dyn Middleware>` and cost one Arc clone plus one
/// vtable call per request.
pub trait Middleware: Send + Sync + 'static {
    /// Handles one request. Call `next.run(ctx)` to invoke the rest of the
    /// chain; skip it to short-circuit with your own response.
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture;
}

pub(crate) type BoxedMiddleware = Arc<dyn Middleware>;

// ── Next ─────────────────────────────────────────────────────────────────────

/// The not-yet-run remainder of the chain: the middleware registered after
/// the current one, then the routed handler.
///
/// Consumed by [`run`](Next::run) — a middleware cannot invoke its downstream
/// twice, which keeps "one request, one downstream invocation" a type-level
/// guarantee instead of a convention.
pub struct Next {
    stack: Arc<[BoxedMiddleware]>,
    index: usize,
    handler: BoxedHandler,
}

impl Next {
    pub(crate) fn new(stack: Arc<[BoxedMiddleware]>, handler: BoxedHandler) -> Self {
        Self { stack, index: 0, handler }
    }

    /// Invokes the rest of the chain and resolves to its outcome.
    pub fn run(mut self, ctx: Context) -> BoxFuture {
        match self.stack.get(self.index) {
            Some(mw) => {
                let mw = Arc::clone(mw);
                self.index += 1;
                mw.handle(ctx, self)
            }
            None => self.handler.call(ctx),
        }
    }
}

// ── Function middleware ───────────────────────────────────────────────────────

/// Wraps an `async fn(Context, Next) -> Result<Response, Error>` as a
/// [`Middleware`], for the common case where a struct is ceremony:
///
/// ```rust,ignore
/// let app = Router::new()
///     .layer(middleware::from_fn(|ctx, next| async move {
///         let mut res = next.run(ctx).await?;
///         res.set_header("server", "kiroku");
///         Ok(res)
///     }))
///     .on(Method::GET, "/", index);
/// ```
pub fn from_fn<F, Fut>(f: F) -> impl Middleware
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    FnMiddleware(f)
}

struct FnMiddleware<F>(F);

impl<F, Fut> Middleware for FnMiddleware<F>
where
    F: Fn(Context, Next) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Response, Error>> + Send + 'static,
{
    fn handle(&self, ctx: Context, next: Next) -> BoxFuture {
        Box::pin((self.0)(ctx, next))
    }
}
