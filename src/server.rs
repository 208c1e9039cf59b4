//! HTTP server, per-connection limits and graceful shutdown.
//!
//! On SIGTERM or Ctrl-C the server:
//! 1. stops calling `listener.accept()`;
//! 2. tells every open connection to shut down gracefully: requests already
//!    in flight finish and are answered, idle keep-alive connections close
//!    at once;
//! 3. returns from [`Server::serve`] once every connection task has ended.
//!
//! Each connection is bounded by the [`Config`] timeouts: the request head must
//! arrive within `read_timeout`, a handler must answer within `write_timeout`,
//! and a keep-alive connection with nothing in flight is closed after
//! `idle_timeout`.

use std::convert::Infallible;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Incoming;
use hyper::service::service_fn;
use hyper_util::rt::{TokioExecutor, TokioIo, TokioTimer};
use hyper_util::server::conn::auto::Builder as ConnBuilder;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio::time::Instant;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::envelope::error_response;
use crate::error::Error;
use crate::method::Method;
use crate::request::Request;
use crate::response::Response;
use crate::router::Router;
use crate::status::Status;

/// The HTTP server.
pub struct Server {
    config: Config,
}

impl Server {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Binds `config.addr` and serves `router` until SIGTERM or Ctrl-C,
    /// then drains in-flight connections.
    pub async fn serve<S>(self, router: Router<S>) -> Result<(), Error>
    where
        S: Send + Sync + 'static,
    {
        let listener = TcpListener::bind(self.config.addr).await?;
        self.serve_with_shutdown(listener, router, shutdown_signal()).await
    }

    /// Serves on an already-bound `listener` until `signal` resolves.
    pub async fn serve_with_shutdown<S>(
        self,
        listener: TcpListener,
        router: Router<S>,
        signal: impl Future<Output = ()>,
    ) -> Result<(), Error>
    where
        S: Send + Sync + 'static,
    {
        let router = Arc::new(router);
        let config = Arc::new(self.config);
        let (shutdown, draining) = watch::channel(false);

        info!(addr = %listener.local_addr()?, "folio listening");

        let mut tasks = tokio::task::JoinSet::new();

        tokio::pin!(signal);

        loop {
            tokio::select! {
                // Shutdown wins over a queued accept.
                biased;

                () = &mut signal => {
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

                    tasks.spawn(serve_connection(
                        stream,
                        remote_addr,
                        Arc::clone(&router),
                        Arc::clone(&config),
                        draining.clone(),
                    ));
                }

                Some(_) = tasks.join_next(), if !tasks.is_empty() => {}
            }
        }

        shutdown.send_replace(true);
        while tasks.join_next().await.is_some() {}

        info!("folio stopped");
        Ok(())
    }
}

// ── Connection ────────────────────────────────────────────────────────────────

async fn serve_connection<S>(
    stream: TcpStream,
    remote_addr: SocketAddr,
    router: Arc<Router<S>>,
    config: Arc<Config>,
    mut draining: watch::Receiver<bool>,
) where
    S: Send + Sync + 'static,
{
    let activity = Arc::new(Activity::new());
    let write_timeout = config.write_timeout;

    let svc = {
        let activity = Arc::clone(&activity);
        service_fn(move |req| {
            let router = Arc::clone(&router);
            let activity = Arc::clone(&activity);
            async move {
                let _busy = activity.busy();
                Ok::<_, Infallible>(dispatch(&router, req, remote_addr, write_timeout).await)
            }
        })
    };

    let mut builder = ConnBuilder::new(TokioExecutor::new());
    builder
        .http1()
        .timer(TokioTimer::new())
        .header_read_timeout(config.read_timeout)
        .max_buf_size(config.max_header_bytes);

    let conn = builder.serve_connection(TokioIo::new(stream), svc);
    tokio::pin!(conn);

    let res = tokio::select! {
        res = conn.as_mut() => res,
        () = activity.idle_for(config.idle_timeout) => {
            debug!(peer = %remote_addr, "closing idle connection");
            conn.as_mut().graceful_shutdown();
            conn.await
        }
        _ = draining.changed() => {
            debug!(peer = %remote_addr, "closing connection for shutdown");
            conn.as_mut().graceful_shutdown();
            conn.await
        }
    };

    if let Err(e) = res {
        error!(peer = %remote_addr, "connection error: {e}");
    }
}

/// Tracks whether a connection is doing anything.
struct Activity {
    epoch: Instant,
    in_flight: AtomicUsize,
    /// Milliseconds after `epoch` at which the last request started or ended.
    last_ms: AtomicU64,
}

impl Activity {
    fn new() -> Self {
        Self { epoch: Instant::now(), in_flight: AtomicUsize::new(0), last_ms: AtomicU64::new(0) }
    }

    fn touch(&self) {
        self.last_ms.store(self.epoch.elapsed().as_millis() as u64, Ordering::Relaxed);
    }

    fn busy(self: &Arc<Self>) -> Busy {
        self.in_flight.fetch_add(1, Ordering::AcqRel);
        self.touch();
        Busy(Arc::clone(self))
    }

    /// Resolves once no request has been in flight for `timeout`.
    async fn idle_for(&self, timeout: Duration) {
        loop {
            let last = Duration::from_millis(self.last_ms.load(Ordering::Relaxed));
            let quiet = self.epoch.elapsed().saturating_sub(last);
            let wait = if self.in_flight.load(Ordering::Acquire) > 0 {
                timeout
            } else if quiet >= timeout {
                return;
            } else {
                timeout - quiet
            };
            tokio::time::sleep(wait).await;
        }
    }
}

struct Busy(Arc<Activity>);

impl Drop for Busy {
    fn drop(&mut self) {
        self.0.touch();
        self.0.in_flight.fetch_sub(1, Ordering::AcqRel);
    }
}

// ── Request dispatch ──────────────────────────────────────────────────────────

/// Routes one request and produces one response. Every failure becomes a
/// response, so hyper never sees an error.
async fn dispatch<S>(
    router: &Router<S>,
    req: hyper::Request<Incoming>,
    remote_addr: SocketAddr,
    write_timeout: Duration,
) -> http::Response<Full<Bytes>> {
    let Ok(method) = Method::try_from(req.method()) else {
        let msg = format!("method {} not allowed", req.method());
        return error_response(Status::MethodNotAllowed, msg).into_inner();
    };

    let work = async {
        let (parts, body) = req.into_parts();
        let body = match body.collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) => {
                warn!(peer = %remote_addr, "failed to read request body: {e}");
                return error_response(Status::BadRequest, "failed to read request body");
            }
        };

        let headers = parts.headers.iter()
            .filter_map(|(name, value)| {
                value.to_str().ok().map(|v| (name.as_str().to_owned(), v.to_owned()))
            })
            .collect();

        let req = Request::new(method, parts.uri.path(), headers, body, Some(remote_addr));
        router.dispatch(req).await
    };

    let response: Response = match tokio::time::timeout(write_timeout, work).await {
        Ok(res) => res,
        Err(_) => {
            warn!(peer = %remote_addr, %method, "request timed out");
            error_response(Status::ServiceUnavailable, "request timed out")
        }
    };

    response.into_inner()
}

// ── Shutdown signal ───────────────────────────────────────────────────────────

/// Resolves on SIGTERM (Unix) or Ctrl-C. A handler that cannot be installed
/// is logged and never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("failed to install Ctrl-C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c  => {}
        () = sigterm => {}
    }
}
