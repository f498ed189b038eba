use std::{convert::Infallible, net::SocketAddr, sync::Arc, thread};

use bytes::Bytes;
use hyper::{
    header::{HeaderMap, HeaderValue},
    service::{make_service_fn, service_fn},
    Body, Request, Response, Server, StatusCode,
};
use magic_sdk::Session;
use parking_lot::Mutex;
use tokio::sync::oneshot;

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path_and_query: String,
    pub headers: HeaderMap,
    pub body: Bytes,
}

/// HTTP server on an ephemeral port that answers every request with the same
/// status, headers and body, and records what it received.
pub struct MockServer {
    pub url: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    shutdown_tx: Option<oneshot::Sender<()>>,
}

impl MockServer {
    pub fn start(status: StatusCode, body: impl Into<Bytes>) -> Self {
        Self::start_with_headers(status, &[], body)
    }

    #[allow(dead_code)]
    pub fn start_with_headers(
        status: StatusCode,
        headers: &'static [(&'static str, &'static str)],
        body: impl Into<Bytes>,
    ) -> Self {
        init_tracing();

        let body: Bytes = body.into();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&requests);
        let (port_tx, port_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

        thread::spawn(move || {
            let rt = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .unwrap();
            rt.block_on(async move {
                let make_svc = make_service_fn(move |_conn| {
                    let recorded = Arc::clone(&recorded);
                    let body = body.clone();
                    async move {
                        Ok::<_, Infallible>(service_fn(move |req: Request<Body>| {
                            let recorded = Arc::clone(&recorded);
                            let body = body.clone();
                            async move {
                                let (parts, req_body) = req.into_parts();
                                let req_body = hyper::body::to_bytes(req_body).await?;
                                recorded.lock().push(RecordedRequest {
                                    method: parts.method.to_string(),
                                    path_and_query: parts
                                        .uri
                                        .path_and_query()
                                        .map(ToString::to_string)
                                        .unwrap_or_default(),
                                    headers: parts.headers,
                                    body: req_body,
                                });
                                let mut resp = Response::new(Body::from(body));
                                *resp.status_mut() = status;
                                for &(name, value) in headers {
                                    resp.headers_mut()
                                        .append(name, HeaderValue::from_static(value));
                                }
                                Ok::<_, hyper::Error>(resp)
                            }
                        }))
                    }
                });

                let addr = SocketAddr::from(([127, 0, 0, 1], 0));
                let server = Server::bind(&addr).serve(make_svc);
                let _ = port_tx.send(server.local_addr().port());
                let server = server.with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                });
                if let Err(err) = server.await {
                    panic!("mock server error: {err}");
                }
            });
        });

        let port = port_rx.blocking_recv().unwrap();
        Self {
            url: format!("http://127.0.0.1:{port}"),
            requests,
            shutdown_tx: Some(shutdown_tx),
        }
    }

    pub fn json(value: &serde_json::Value) -> Self {
        Self::start(StatusCode::OK, serde_json::to_vec(value).unwrap())
    }

    pub fn session(&self, namespace: &str) -> Session {
        Session::new(&self.url, namespace).unwrap()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn single_request(&self) -> RecordedRequest {
        let requests = self.requests();
        assert_eq!(requests.len(), 1, "expected exactly one request");
        requests.into_iter().next().unwrap()
    }
}

impl Drop for MockServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// A base URL nothing is listening on.
#[allow(dead_code)]
pub fn closed_url() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);
    format!("http://127.0.0.1:{port}")
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}
