use crate::upstream::{Upstream, UpstreamError};
use async_trait::async_trait;
use http::StatusCode;
use http_body_util::Full;
use hyper::body::Bytes;
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use std::convert::Infallible;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::net::TcpListener;
use url::Url;

/// Always returns the same body after a fixed delay.
pub struct StaticUpstream {
    body: &'static str,
    delay: Duration,
    calls: AtomicUsize,
    completed: AtomicUsize,
}

impl StaticUpstream {
    pub fn new(body: &'static str, delay: Duration) -> Self {
        Self {
            body,
            delay,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
        }
    }

    /// Calls started
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Calls that returned their body
    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upstream for StaticUpstream {
    async fn fetch(&self) -> Result<Bytes, UpstreamError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.completed.fetch_add(1, Ordering::SeqCst);
        Ok(Bytes::from_static(self.body.as_bytes()))
    }
}

/// Fails every call whose sequence number is a multiple of `fail_every`.
pub struct FlakyUpstream {
    body: &'static str,
    fail_every: usize,
    calls: AtomicUsize,
}

impl FlakyUpstream {
    pub fn new(body: &'static str, fail_every: usize) -> Self {
        Self {
            body,
            fail_every,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Upstream for FlakyUpstream {
    async fn fetch(&self) -> Result<Bytes, UpstreamError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst);
        if n % self.fail_every == 0 {
            return Err(UpstreamError::Status(StatusCode::SERVICE_UNAVAILABLE));
        }
        Ok(Bytes::from_static(self.body.as_bytes()))
    }
}

/// Panics on every `panic_every`-th call (1-based).
pub struct PanickingUpstream {
    body: &'static str,
    panic_every: usize,
    calls: AtomicUsize,
}

impl PanickingUpstream {
    pub fn new(body: &'static str, panic_every: usize) -> Self {
        Self {
            body,
            panic_every,
            calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Upstream for PanickingUpstream {
    async fn fetch(&self) -> Result<Bytes, UpstreamError> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if n % self.panic_every == 0 {
            panic!("upstream call {n} panicked");
        }
        Ok(Bytes::from_static(self.body.as_bytes()))
    }
}

/// In-process HTTP data service bound to an ephemeral port.
pub struct MockUpstream {
    port: u16,
    hits: Arc<AtomicUsize>,
}

impl MockUpstream {
    pub async fn start(status: StatusCode, body: &'static str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to address");
        let port = listener.local_addr().unwrap().port();
        let hits = Arc::new(AtomicUsize::new(0));

        let server_hits = hits.clone();
        tokio::spawn(async move {
            loop {
                let (stream, _) = listener.accept().await.unwrap();
                let io = TokioIo::new(stream);
                let hits = server_hits.clone();

                tokio::spawn(async move {
                    let service = service_fn(move |_req: Request<hyper::body::Incoming>| {
                        let hits = hits.clone();
                        async move {
                            hits.fetch_add(1, Ordering::SeqCst);
                            tokio::time::sleep(delay).await;
                            let mut response = Response::new(Full::new(Bytes::from_static(
                                body.as_bytes(),
                            )));
                            *response.status_mut() = status;
                            Ok::<_, Infallible>(response)
                        }
                    });

                    let _ = hyper_util::server::conn::auto::Builder::new(TokioExecutor::new())
                        .serve_connection(io, service)
                        .await;
                });
            }
        });

        Self { port, hits }
    }

    pub fn url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}/data", self.port)).unwrap()
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// A URL nothing listens on: the port is bound once and released.
pub async fn unreachable_url() -> Url {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    Url::parse(&format!("http://127.0.0.1:{port}/data")).unwrap()
}
