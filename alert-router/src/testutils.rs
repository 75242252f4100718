use crate::forwarder::{ForwardError, Forwarder};
use async_trait::async_trait;
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full};
use hyper::body::{Body, Bytes, Frame, Incoming};
use hyper::service::service_fn;
use hyper::{Request, Response};
use hyper_util::rt::{TokioExecutor, TokioIo};
use hyper_util::server::conn::auto::Builder;
use parking_lot::Mutex;
use std::convert::Infallible;
use std::io::Write;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::net::TcpListener;
use url::Url;

pub fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut tmp = tempfile::NamedTempFile::new().expect("create temp file");
    write!(tmp, "{}", yaml).expect("write yaml");
    tmp
}

pub fn rewrite_config(tmp: &tempfile::NamedTempFile, yaml: &str) {
    std::fs::write(tmp.path(), yaml).expect("rewrite yaml");
}

/// A port nothing listens on.
pub async fn unused_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

#[derive(Clone, Debug)]
pub struct ReceivedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub content_type: Option<String>,
    pub body: Bytes,
}

/// Local HTTP server standing in for the downstream alert receiver.
pub struct Downstream {
    port: u16,
    received: Arc<Mutex<Vec<ReceivedRequest>>>,
}

impl Downstream {
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://127.0.0.1:{}/prometheusalert", self.port)).unwrap()
    }

    pub fn url_with_query(&self, query: &str) -> Url {
        let mut url = self.url();
        url.set_query(Some(query));
        url
    }

    pub fn received(&self) -> Vec<ReceivedRequest> {
        self.received.lock().clone()
    }
}

/// Starts a server that records every request and answers with `status`.
pub async fn start_downstream(status: StatusCode) -> Downstream {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to address");
    let port = listener.local_addr().unwrap().port();
    let received = Arc::new(Mutex::new(Vec::new()));

    let sink = received.clone();
    tokio::spawn(async move {
        loop {
            let (stream, _) = listener.accept().await.unwrap();
            let io = TokioIo::new(stream);
            let sink = sink.clone();

            tokio::spawn(async move {
                let service = service_fn(move |req: Request<Incoming>| {
                    let sink = sink.clone();
                    async move {
                        let (parts, body) = req.into_parts();
                        let body = body
                            .collect()
                            .await
                            .map(|collected| collected.to_bytes())
                            .unwrap_or_default();

                        sink.lock().push(ReceivedRequest {
                            method: parts.method,
                            path: parts.uri.path().to_string(),
                            query: parts.uri.query().map(String::from),
                            content_type: parts
                                .headers
                                .get(http::header::CONTENT_TYPE)
                                .and_then(|v| v.to_str().ok())
                                .map(String::from),
                            body,
                        });

                        let mut response = Response::new(Full::new(Bytes::from_static(b"ok")));
                        *response.status_mut() = status;
                        Ok::<_, Infallible>(response)
                    }
                });

                let _ = Builder::new(TokioExecutor::new())
                    .serve_connection(io, service)
                    .await;
            });
        }
    });

    Downstream { port, received }
}

/// Forwarder that records calls instead of sending them. Fails the call with
/// index `fail_at`, if set.
#[derive(Default)]
pub struct RecordingForwarder {
    calls: Mutex<Vec<(Url, serde_json::Value)>>,
    fail_at: Option<usize>,
}

impl RecordingForwarder {
    pub fn failing_at(index: usize) -> Self {
        RecordingForwarder {
            calls: Mutex::new(Vec::new()),
            fail_at: Some(index),
        }
    }

    pub fn calls(&self) -> Vec<(Url, serde_json::Value)> {
        self.calls.lock().clone()
    }
}

#[async_trait]
impl Forwarder for RecordingForwarder {
    async fn forward(&self, url: &Url, body: Bytes) -> Result<StatusCode, ForwardError> {
        let index = {
            let mut calls = self.calls.lock();
            let value = serde_json::from_slice(&body).expect("forwarded body is JSON");
            calls.push((url.clone(), value));
            calls.len() - 1
        };

        if self.fail_at == Some(index) {
            return Err(ForwardError::RequestFailed(
                url.to_string(),
                "connection refused".into(),
            ));
        }
        Ok(StatusCode::OK)
    }
}

/// Request body whose first read fails.
pub struct FailingBody;

impl Body for FailingBody {
    type Data = Bytes;
    type Error = std::io::Error;

    fn poll_frame(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
    ) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        Poll::Ready(Some(Err(std::io::Error::new(
            std::io::ErrorKind::ConnectionReset,
            "connection reset by peer",
        ))))
    }
}
